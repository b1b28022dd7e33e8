use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use warbler_db::StoreError;
use warbler_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Same body whether the actor is anonymous or simply not allowed.
    #[error("Access unauthorized.")]
    Unauthorized,

    #[error("Invalid credentials.")]
    InvalidCredentials,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found.")]
    NotFound(&'static str),

    /// A body that failed to parse. Handlers surface it only after the
    /// authorization check.
    #[error("{}", .0.body_text())]
    Rejection(#[from] JsonRejection),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Rejection(rejection) => rejection.status(),
            Self::Store(StoreError::UniquenessViolation(_)) => StatusCode::CONFLICT,
            Self::Store(StoreError::Validation(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Store(StoreError::ReferentialIntegrity(_)) => StatusCode::NOT_FOUND,
            Self::Store(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::Store(StoreError::ReferentialIntegrity(_)) => "User not found.".to_string(),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                error!("Request failed: {}", self);
                "Internal server error.".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Runs blocking database or hashing work off the async runtime.
pub(crate) async fn blocking<F, T>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await.map_err(|e| {
        error!("spawn_blocking join error: {}", e);
        ApiError::Internal(format!("blocking task failed: {e}"))
    })?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let conflict = ApiError::from(StoreError::UniquenessViolation("users.username".into()));
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let invalid = ApiError::from(StoreError::Validation("too long".into()));
        assert_eq!(invalid.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let orphan = ApiError::from(StoreError::ReferentialIntegrity("fk".into()));
        assert_eq!(orphan.status(), StatusCode::NOT_FOUND);

        let poisoned = ApiError::from(StoreError::LockPoisoned("boom".into()));
        assert_eq!(poisoned.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn json_rejection_keeps_its_status() {
        use axum::extract::rejection::MissingJsonContentType;

        let err = ApiError::from(JsonRejection::from(MissingJsonContentType::default()));
        assert_eq!(err.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }

    #[test]
    fn unauthorized_message_is_uniform() {
        assert_eq!(ApiError::Unauthorized.to_string(), "Access unauthorized.");
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
    }
}
