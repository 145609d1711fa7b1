use std::sync::Arc;

use crate::conf::Settings;
use crate::pkg::internal::directory::{
    DirectorySync, HttpDirectoryClient, SyncMode, SyncSettings,
};
use crate::pkg::internal::store::{CandidateCache, PgStore};
use crate::pkg::server::state::db_pool;
use crate::prelude::Result;

/// One-shot directory sync from the command line.
pub async fn run(settings: &Settings, user: &str, full: bool) -> Result<()> {
    let pool = Arc::new(db_pool(settings)?);
    let store = Arc::new(PgStore::new(pool));
    let client = Arc::new(HttpDirectoryClient::new(
        reqwest::Client::new(),
        &settings.directory_url,
        &settings.directory_api_key,
    ));
    let sync = DirectorySync::new(
        store as Arc<dyn CandidateCache>,
        client,
        SyncSettings::from(settings),
    );

    let mode = if full { SyncMode::Full } else { SyncMode::Incremental };
    let report = sync.sync(user, mode).await?;
    tracing::info!(
        user,
        mode = ?report.mode,
        fetched = report.fetched,
        inserted = report.inserted,
        deleted = report.deleted,
        "directory sync finished"
    );
    Ok(())
}
