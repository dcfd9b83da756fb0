use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid request")]
    Validation(Vec<String>),
    #[error("sender {0:?} is not a participant")]
    UnknownSender(String),
    #[error("participant {0:?} not found")]
    NotFound(String),
    #[error("the name {0:?} is already taken")]
    Conflict(String),
    #[error("missing header: {0}")]
    MissingHeader(&'static str),
    #[error("no participant given in the {0} header")]
    Anonymous(&'static str),
    #[error(transparent)]
    Store(anyhow::Error),
}

impl AppError {
    pub fn invalid(detail: impl Into<String>) -> Self {
        Self::Validation(vec![detail.into()])
    }

    pub fn status(&self) -> StatusCode {
        use AppError::*;
        match self {
            Validation(_) | UnknownSender(_) => StatusCode::UNPROCESSABLE_ENTITY,
            NotFound(_) | Anonymous(_) => StatusCode::NOT_FOUND,
            Conflict(_) => StatusCode::CONFLICT,
            MissingHeader(_) => StatusCode::BAD_REQUEST,
            Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            AppError::Validation(details) => json!({
                "message": self.to_string(),
                "details": details,
            }),
            AppError::Store(err) => {
                tracing::error!(error = %err, "store error");
                json!({ "message": err.to_string() })
            }
            _ => json!({ "message": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

macro_rules! apperr_impl {
    ($E:ty) => {
        impl From<$E> for AppError {
            fn from(err: $E) -> Self {
                Self::Store(anyhow::Error::from(err))
            }
        }
    };
}

apperr_impl!(anyhow::Error);
apperr_impl!(sqlx::Error);
apperr_impl!(uuid::Error);
apperr_impl!(time::error::Format);
