use std::future::Future;
use std::time::Duration;

use serde_json::Value;

use crate::prelude::Result;

/// Bounds for one polling session against an external long-running job.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        // ~3 minutes end to end
        PollConfig {
            max_attempts: 36,
            interval: Duration::from_millis(5000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExternalJobStatus {
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for ExternalJobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExternalJobStatus::Running => f.write_str("running"),
            ExternalJobStatus::Completed => f.write_str("completed"),
            ExternalJobStatus::Failed => f.write_str("failed"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobStart {
    pub job_id: String,
    /// The external service reused a previously captured result.
    pub is_existing: bool,
}

#[derive(Debug, Clone)]
pub struct JobCheck {
    pub status: ExternalJobStatus,
    pub data: Option<Value>,
}

/// Terminal result of a polling session. Timeout is distinct from
/// not-accessible so the caller can pick `not_provided` over `error`.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Completed(Value),
    /// The reused snapshot turned out to hold no data.
    EmptySnapshot,
    /// The job failed, or completed with an empty payload (treated the same).
    NotAccessible,
    TimedOut,
}

/// Starts the external job and polls until a terminal status or until the
/// attempt budget runs out. Never re-submits the job; retrying is the
/// caller's decision.
pub async fn run_to_completion<S, SF, C, CF>(
    start: S,
    check: C,
    config: &PollConfig,
) -> Result<PollOutcome>
where
    S: FnOnce() -> SF,
    SF: Future<Output = Result<JobStart>>,
    C: Fn(String, bool) -> CF,
    CF: Future<Output = Result<JobCheck>>,
{
    let job = start().await?;

    if job.is_existing {
        tracing::debug!(job_id = %job.job_id, "reusing existing job result");
        let checked = check(job.job_id, true).await?;
        return Ok(match checked.data.filter(has_payload) {
            Some(data) => PollOutcome::Completed(data),
            None => PollOutcome::EmptySnapshot,
        });
    }

    let mut last_status: Option<ExternalJobStatus> = None;
    for attempt in 1..=config.max_attempts {
        let checked = check(job.job_id.clone(), false).await?;
        // change-only logging keeps 36 polls from producing 36 lines
        if last_status.as_ref() != Some(&checked.status) {
            tracing::info!(
                job_id = %job.job_id,
                attempt,
                status = %checked.status,
                "external job status changed"
            );
            last_status = Some(checked.status.clone());
        }
        match checked.status {
            ExternalJobStatus::Completed => {
                return Ok(match checked.data.filter(has_payload) {
                    Some(data) => PollOutcome::Completed(data),
                    None => PollOutcome::NotAccessible,
                });
            }
            ExternalJobStatus::Failed => return Ok(PollOutcome::NotAccessible),
            ExternalJobStatus::Running => {
                if attempt < config.max_attempts {
                    tokio::time::sleep(config.interval).await;
                }
            }
        }
    }
    Ok(PollOutcome::TimedOut)
}

fn has_payload(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}
