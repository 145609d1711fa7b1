use std::sync::Arc;
use std::time::Duration;

use sqlx::{PgPool, Pool, Postgres, postgres::PgPoolOptions};

use crate::conf::Settings;
use crate::pkg::internal::directory::{DirectorySync, HttpDirectoryClient, SyncSettings};
use crate::pkg::internal::ingest::{self, IngestCoordinator, IngestHandle};
use crate::pkg::internal::poller::PollConfig;
use crate::pkg::internal::sources::Processors;
use crate::pkg::internal::sources::analysis::HttpAnalyzer;
use crate::pkg::internal::sources::cv::HttpCvProcessor;
use crate::pkg::internal::sources::github::HttpGithubProcessor;
use crate::pkg::internal::sources::linkedin::HttpLinkedInJobs;
use crate::pkg::internal::store::{CandidateCache, PgStore, RecordStore};
use crate::prelude::Result;

pub fn db_pool(settings: &Settings) -> Result<Pool<Postgres>> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.database_pool_max_connections)
        .connect_lazy(&settings.database_url)?;
    Ok(pool)
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub db_pool: Arc<PgPool>,
    pub store: Arc<PgStore>,
    pub coordinator: IngestCoordinator,
    pub ingest: IngestHandle,
    pub sync: Arc<DirectorySync>,
    pub http: reqwest::Client,
}

impl AppState {
    pub async fn new(settings: Settings) -> Result<AppState> {
        let settings = Arc::new(settings);
        let db_pool = Arc::new(db_pool(&settings)?);
        let store = Arc::new(PgStore::new(db_pool.clone()));
        let http = reqwest::Client::new();

        let processors = Processors {
            cv: Arc::new(HttpCvProcessor::new(http.clone(), &settings.cv_processor_url)),
            github: Arc::new(HttpGithubProcessor::new(
                http.clone(),
                &settings.github_scanner_url,
            )),
            linkedin: Arc::new(HttpLinkedInJobs::new(
                http.clone(),
                &settings.linkedin_scraper_url,
            )),
            analyzer: Arc::new(HttpAnalyzer::new(http.clone(), &settings.analysis_url)),
        };
        let poll_config = PollConfig {
            max_attempts: settings.poll_max_attempts,
            interval: Duration::from_millis(settings.poll_interval_ms),
        };
        let coordinator = IngestCoordinator::new(
            store.clone() as Arc<dyn RecordStore>,
            processors,
            poll_config,
            settings.enrichment_priority_threshold,
        );
        let ingest = ingest::spawn_worker(coordinator.clone(), settings.ingest_queue_depth as usize);

        let directory = Arc::new(HttpDirectoryClient::new(
            http.clone(),
            &settings.directory_url,
            &settings.directory_api_key,
        ));
        let sync = Arc::new(DirectorySync::new(
            store.clone() as Arc<dyn CandidateCache>,
            directory,
            SyncSettings::from(settings.as_ref()),
        ));

        Ok(AppState {
            settings,
            db_pool,
            store,
            coordinator,
            ingest,
            sync,
            http,
        })
    }
}
