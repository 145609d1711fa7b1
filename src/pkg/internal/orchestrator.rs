use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::pkg::internal::adaptors::applicants::spec::{
    ApplicantEntry, ProcessingStatus, Source, SourceData,
};
use crate::pkg::internal::store::RecordStore;
use crate::prelude::{Error, Result};

/// Definitive terminal result for one (applicant, source) invocation. The
/// caller never gets a "still processing, check back" answer for its own
/// call; a concurrent second caller gets `Error::Conflict` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessOutcome<T> {
    /// This invocation ran the processor and persisted the result.
    Processed(T),
    /// The source was already `ready`; stored data returned, no processor run.
    AlreadyReady(T),
    /// The processor failed; a terminal status and error payload were written.
    Failed {
        message: String,
        terminal: ProcessingStatus,
    },
}

#[derive(Clone)]
pub struct Orchestrator {
    store: Arc<dyn RecordStore>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Orchestrator { store }
    }

    /// Claims exclusive ownership of one (applicant, source) unit of work,
    /// runs the processor, and writes exactly one terminal status.
    ///
    /// The claim is a single conditional update; while the processor runs,
    /// nothing but the claimed status field is held. A processor `Timeout`
    /// terminates the source as `not_provided`, any other processor error
    /// as `error` with the message and timestamp recorded.
    pub async fn claim_and_process<T, F, Fut>(
        &self,
        id: Uuid,
        source: Source,
        processor: F,
    ) -> Result<ProcessOutcome<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce(ApplicantEntry) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let snapshot = self.store.get_applicant(id).await?.ok_or(Error::NotFound)?;
        if snapshot.source_status(source) == ProcessingStatus::Ready {
            return Ok(ProcessOutcome::AlreadyReady(Self::stored(&snapshot, source)?));
        }

        if !self.store.claim_source(id, source).await? {
            // claim lost; re-read and resolve deterministically
            let current = self.store.get_applicant(id).await?.ok_or(Error::NotFound)?;
            return match current.source_status(source) {
                ProcessingStatus::Processing => Err(Error::Conflict),
                ProcessingStatus::Ready => {
                    Ok(ProcessOutcome::AlreadyReady(Self::stored(&current, source)?))
                }
                other => Err(Error::Processor(format!(
                    "claim on {} refused in state {:?}",
                    source, other
                ))),
            };
        }
        tracing::debug!(applicant = %id, source = %source, "claimed unit of work");

        match processor(snapshot).await {
            Ok(output) => {
                let data = SourceData::Ready {
                    data: serde_json::to_value(&output)?,
                };
                self.store
                    .complete_source(id, source, ProcessingStatus::Ready, Some(data))
                    .await?;
                Ok(ProcessOutcome::Processed(output))
            }
            Err(err) => {
                let terminal = match err {
                    Error::Timeout => ProcessingStatus::NotProvided,
                    _ => ProcessingStatus::Error,
                };
                let message = err.to_string();
                let data = SourceData::Failed {
                    error: message.clone(),
                    processed_at: Utc::now(),
                };
                self.store.complete_source(id, source, terminal, Some(data)).await?;
                tracing::warn!(
                    applicant = %id,
                    source = %source,
                    error = %message,
                    "source processing failed"
                );
                Ok(ProcessOutcome::Failed { message, terminal })
            }
        }
    }

    fn stored<T: DeserializeOwned>(entry: &ApplicantEntry, source: Source) -> Result<T> {
        match entry.source_data(source) {
            Some(SourceData::Ready { data }) => Ok(serde_json::from_value(data.clone())?),
            _ => Err(Error::Processor(format!(
                "{} is marked ready but holds no data",
                source
            ))),
        }
    }
}
