use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applicants::spec::{
    ApplicantEntry, CvData, ProcessingStatus, ProfileFields, Source, SourceData,
};
use crate::pkg::internal::orchestrator::{Orchestrator, ProcessOutcome};
use crate::pkg::internal::poller::PollConfig;
use crate::pkg::internal::sources::github::GithubScanOptions;
use crate::pkg::internal::sources::{Processors, analysis, linkedin};
use crate::pkg::internal::store::RecordStore;
use crate::prelude::{Error, Result};

/// Terminal per-source outcome surfaced to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub status: ProcessingStatus,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IngestReport {
    pub applicant: ApplicantEntry,
    pub reports: Vec<SourceReport>,
}

/// Launches every applicable source concurrently and aggregates the settled
/// outcomes into one completion decision. CV is mandatory; LinkedIn and
/// GitHub failures stay per-field; analysis never blocks completion.
#[derive(Clone)]
pub struct IngestCoordinator {
    store: Arc<dyn RecordStore>,
    orchestrator: Orchestrator,
    processors: Processors,
    poll_config: PollConfig,
    priority_threshold: i32,
}

impl IngestCoordinator {
    pub fn new(
        store: Arc<dyn RecordStore>,
        processors: Processors,
        poll_config: PollConfig,
        priority_threshold: i32,
    ) -> Self {
        let orchestrator = Orchestrator::new(store.clone());
        IngestCoordinator {
            store,
            orchestrator,
            processors,
            poll_config,
            priority_threshold,
        }
    }

    /// Runs one source through the claim protocol to a definitive terminal
    /// response. Also the entry point for user-triggered retries.
    pub async fn process_source(&self, id: Uuid, source: Source) -> Result<SourceReport> {
        match source {
            Source::Cv => {
                let cv = self.processors.cv.clone();
                let outcome = self
                    .orchestrator
                    .claim_and_process::<CvData, _, _>(id, source, move |snapshot| async move {
                        if snapshot.cv_file_path.trim().is_empty() {
                            return Err(Error::Precondition("applicant has no cv file".into()));
                        }
                        cv.process(&snapshot.cv_file_path).await
                    })
                    .await?;
                Ok(Self::report(source, outcome))
            }
            Source::Linkedin => {
                let jobs = self.processors.linkedin.clone();
                let config = self.poll_config.clone();
                let outcome = self
                    .orchestrator
                    .claim_and_process(id, source, move |snapshot: ApplicantEntry| async move {
                        let url = snapshot.linkedin_url.clone().ok_or_else(|| {
                            Error::Precondition("applicant has no linkedin url".into())
                        })?;
                        linkedin::scrape_profile(jobs, &url, &config).await
                    })
                    .await?;
                Ok(Self::report(source, outcome))
            }
            Source::Github => {
                let github = self.processors.github.clone();
                let outcome = self
                    .orchestrator
                    .claim_and_process(id, source, move |snapshot: ApplicantEntry| async move {
                        let url = snapshot.github_url.clone().ok_or_else(|| {
                            Error::Precondition("applicant has no github url".into())
                        })?;
                        github.process(&url, &GithubScanOptions::default()).await
                    })
                    .await?;
                Ok(Self::report(source, outcome))
            }
            Source::Analysis => {
                let analyzer = self.processors.analyzer.clone();
                let outcome = self
                    .orchestrator
                    .claim_and_process(id, source, move |snapshot: ApplicantEntry| async move {
                        match analyzer.analyze(&snapshot).await {
                            Ok(verdict) => Ok(verdict),
                            Err(err) => {
                                tracing::warn!(
                                    applicant = %snapshot.id,
                                    error = %err,
                                    "analysis failed, substituting neutral fallback"
                                );
                                Ok(analysis::fallback_analysis(&err.to_string()))
                            }
                        }
                    })
                    .await?;
                Ok(Self::report(source, outcome))
            }
        }
    }

    pub async fn ingest(&self, id: Uuid) -> Result<IngestReport> {
        let applicant = self.store.get_applicant(id).await?.ok_or(Error::NotFound)?;
        if applicant.cv_file_path.trim().is_empty() {
            return Err(Error::Precondition("cv input is required".into()));
        }

        let enrich = applicant.priority >= self.priority_threshold;
        let mut sources = vec![Source::Cv];
        for (source, input) in [
            (Source::Linkedin, &applicant.linkedin_url),
            (Source::Github, &applicant.github_url),
        ] {
            match input {
                None => {
                    self.store
                        .set_source_status(id, source, ProcessingStatus::NotProvided)
                        .await?;
                }
                Some(_) if !enrich => {
                    tracing::info!(
                        applicant = %id,
                        source = %source,
                        priority = applicant.priority,
                        "skipping enrichment for low-priority applicant"
                    );
                    self.store
                        .set_source_status(id, source, ProcessingStatus::Skipped)
                        .await?;
                }
                Some(_) => sources.push(source),
            }
        }

        // settle all: an optional source failing must not cancel its siblings
        let mut set = JoinSet::new();
        for source in sources {
            let this = self.clone();
            set.spawn(async move { (source, this.process_source(id, source).await) });
        }
        let mut reports = Vec::new();
        let mut cv_result: Option<Result<SourceReport>> = None;
        while let Some(joined) = set.join_next().await {
            let (source, result) = joined
                .map_err(|err| Error::Processor(format!("ingestion task failed: {}", err)))?;
            if source == Source::Cv {
                cv_result = Some(result);
                continue;
            }
            match result {
                Ok(report) => reports.push(report),
                Err(err) => {
                    tracing::warn!(applicant = %id, source = %source, error = %err, "source did not settle");
                    reports.push(SourceReport {
                        source,
                        status: ProcessingStatus::Error,
                        error: Some(err.to_string()),
                    });
                }
            }
        }

        let cv_report = cv_result.ok_or_else(|| Error::Processor("cv task never settled".into()))??;
        let cv_ok = cv_report.status == ProcessingStatus::Ready;
        reports.insert(0, cv_report);

        if !cv_ok {
            tracing::warn!(applicant = %id, "cv processing failed, ingestion failed");
            let applicant = self.store.get_applicant(id).await?.ok_or(Error::NotFound)?;
            return Ok(IngestReport { applicant, reports });
        }

        self.merge_profile(id).await?;

        match self.process_source(id, Source::Analysis).await {
            Ok(report) => reports.push(report),
            Err(err) => {
                tracing::warn!(applicant = %id, error = %err, "analysis did not settle");
            }
        }

        let applicant = self.store.get_applicant(id).await?.ok_or(Error::NotFound)?;
        Ok(IngestReport { applicant, reports })
    }

    /// Derives name/email/role from the CV output, first non-empty wins.
    async fn merge_profile(&self, id: Uuid) -> Result<()> {
        let entry = self.store.get_applicant(id).await?.ok_or(Error::NotFound)?;
        if let Some(SourceData::Ready { data }) = entry.source_data(Source::Cv) {
            if let Ok(cv) = serde_json::from_value::<CvData>(data.clone()) {
                self.store
                    .update_profile(
                        id,
                        ProfileFields {
                            name: non_empty(cv.name),
                            email: non_empty(cv.email),
                            role: non_empty(cv.role),
                        },
                    )
                    .await?;
            }
        }
        Ok(())
    }

    fn report<T>(source: Source, outcome: ProcessOutcome<T>) -> SourceReport {
        match outcome {
            ProcessOutcome::Processed(_) | ProcessOutcome::AlreadyReady(_) => SourceReport {
                source,
                status: ProcessingStatus::Ready,
                error: None,
            },
            ProcessOutcome::Failed { message, terminal } => SourceReport {
                source,
                status: terminal,
                error: Some(message),
            },
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct IngestJob {
    pub applicant_id: Uuid,
}

/// Handle for handing ingestion work to the worker; the request handler
/// never fires-and-forgets a task itself.
#[derive(Clone)]
pub struct IngestHandle {
    tx: mpsc::Sender<IngestJob>,
}

impl IngestHandle {
    pub async fn enqueue(&self, applicant_id: Uuid) -> Result<()> {
        self.tx
            .send(IngestJob { applicant_id })
            .await
            .map_err(|_| Error::Processor("ingest worker is not running".into()))
    }
}

pub fn spawn_worker(coordinator: IngestCoordinator, queue_depth: usize) -> IngestHandle {
    let (tx, mut rx) = mpsc::channel::<IngestJob>(queue_depth);
    tokio::spawn(async move {
        while let Some(job) = rx.recv().await {
            match coordinator.ingest(job.applicant_id).await {
                Ok(report) => tracing::info!(
                    applicant = %job.applicant_id,
                    status = ?report.applicant.status,
                    "ingestion settled"
                ),
                Err(err) => tracing::error!(
                    applicant = %job.applicant_id,
                    error = %err,
                    "ingestion failed"
                ),
            }
        }
    });
    IngestHandle { tx }
}
