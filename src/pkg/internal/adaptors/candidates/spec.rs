use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One mirrored record from the external candidate directory. At most one
/// row per (user, external id); refreshed in place by the sync engine.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CandidateCacheEntry {
    pub id: i32,
    pub user_id: String,
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub resume_handle: Option<String>,
    pub resume_url: Option<String>,
    pub applicant_id: Option<Uuid>,
    pub last_synced_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewCacheEntry {
    pub external_id: String,
    pub name: String,
    pub email: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    pub resume_handle: Option<String>,
    pub resume_url: Option<String>,
}
