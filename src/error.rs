use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::favorites::StoreError;
use crate::tmdb::TmdbError;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    InvalidInput(String),

    #[error(transparent)]
    Tmdb(#[from] TmdbError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::Tmdb(TmdbError::MissingApiKey) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Tmdb(TmdbError::NotFound(_)) => StatusCode::NOT_FOUND,
            // Only client and server errors pass through; anything else is a bad gateway.
            AppError::Tmdb(TmdbError::Upstream { status, .. }) => StatusCode::from_u16(*status)
                .ok()
                .filter(|s| s.is_client_error() || s.is_server_error())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            AppError::Tmdb(TmdbError::Http(_)) | AppError::Tmdb(TmdbError::Decode(_)) => {
                StatusCode::BAD_GATEWAY
            }
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_error_kinds_to_statuses() {
        assert_eq!(
            AppError::InvalidInput("missing id".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(TmdbError::MissingApiKey).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(TmdbError::NotFound("/movie/9".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(TmdbError::Upstream {
                status: 401,
                body: "bad key".into()
            })
            .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::from(TmdbError::Upstream {
                status: 42,
                body: String::new()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn non_error_upstream_statuses_become_bad_gateway() {
        for code in [101u16, 204, 304, 307] {
            let err = AppError::from(TmdbError::Upstream {
                status: code,
                body: String::new(),
            });
            assert_eq!(err.status(), StatusCode::BAD_GATEWAY, "status {code}");
        }
        let err = AppError::from(TmdbError::Upstream {
            status: 503,
            body: String::new(),
        });
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
