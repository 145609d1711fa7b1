use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub service_name: String,
    pub listen_port: String,
    pub database_url: String,
    pub database_pool_max_connections: u32,
    pub upload_dir: String,
    //source processor endpoints
    pub cv_processor_url: String,
    pub github_scanner_url: String,
    pub linkedin_scraper_url: String,
    pub analysis_url: String,
    //external candidate directory
    pub directory_url: String,
    pub directory_api_key: String,
    pub directory_page_limit: u32,
    pub directory_full_sync_cap: u32,
    pub cache_freshness_secs: i64,
    //processing knobs
    pub poll_interval_ms: u64,
    pub poll_max_attempts: u32,
    pub enrichment_priority_threshold: i32,
    pub ingest_queue_depth: u32,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let conf = Config::builder()
            .set_default("service_name", "intake")?
            .set_default("listen_port", "8000")?
            .set_default("database_pool_max_connections", 5_i64)?
            .set_default("upload_dir", "uploads")?
            .set_default("directory_page_limit", 50_i64)?
            .set_default("directory_full_sync_cap", 500_i64)?
            .set_default("cache_freshness_secs", 3600_i64)?
            .set_default("poll_interval_ms", 5000_i64)?
            .set_default("poll_max_attempts", 36_i64)?
            .set_default("enrichment_priority_threshold", 20_i64)?
            .set_default("ingest_queue_depth", 64_i64)?
            .add_source(Environment::default())
            .build()?;
        let s: Settings = conf.try_deserialize()?;
        Ok(s)
    }
}
