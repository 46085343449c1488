use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankingError>;

#[derive(Debug, Error)]
pub enum RankingError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),

    /// Distance service unreachable, non-success status, timeout or unparseable body.
    #[error("External lookup failed: {0}")]
    ExternalLookup(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<redis::RedisError> for RankingError {
    fn from(err: redis::RedisError) -> Self {
        RankingError::Storage(err.to_string())
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for RankingError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        HttpResponse::build(code).json(ErrorResponse {
            error: self.to_string(),
            code: code.as_u16(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            RankingError::InvalidInput(_) | RankingError::InvalidRadius(_) => {
                StatusCode::BAD_REQUEST
            }
            RankingError::ExternalLookup(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
