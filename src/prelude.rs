use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid input: {0}")]
    Precondition(String),
    #[error("unit of work is already being processed")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("processor failed: {0}")]
    Processor(String),
    #[error("external job timed out")]
    Timeout,
    #[error("source not accessible: {0}")]
    NotAccessible(String),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            Error::Precondition(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::Conflict => StatusCode::CONFLICT,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Timeout => StatusCode::GATEWAY_TIMEOUT,
            Error::NotAccessible(_) => StatusCode::BAD_GATEWAY,
            Error::Processor(_)
            | Error::Database(_)
            | Error::Migrate(_)
            | Error::Http(_)
            | Error::Json(_)
            | Error::Config(_)
            | Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
