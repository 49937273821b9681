use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use thiserror::Error;

/// Error taxonomy shared by all handlers. Each variant carries the message
/// returned to the client as `{"error": "..."}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    InvalidRequest(String),

    #[error("{0}")]
    Unavailable(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("Payment verification failed: {0}")]
    Verification(String),

    #[error("Invalid credentials")]
    Unauthorized,

    #[error("{0}")]
    Provider(String),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[derive(serde::Serialize)]
struct ErrorResponse {
    error: String,
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InvalidRequest(_) | ApiError::Verification(_) => StatusCode::BAD_REQUEST,
            ApiError::Unavailable(_) | ApiError::InvalidState(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Provider(_) | ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{}", self);
        }
        HttpResponse::build(self.status_code()).json(ErrorResponse {
            error: self.to_string(),
        })
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(e: validator::ValidationErrors) -> Self {
        ApiError::InvalidRequest(e.to_string())
    }
}
