//! HTTP mapping for [`EmoRecError`].

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

use crate::error::EmoRecError;

impl EmoRecError {
    /// Status code a handler failing with this error responds with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            EmoRecError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EmoRecError::NotFound(_) => StatusCode::NOT_FOUND,
            EmoRecError::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
            EmoRecError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            EmoRecError::SpotifyAuth(_)
            | EmoRecError::ApiError(_)
            | EmoRecError::RequestError(_) => StatusCode::BAD_GATEWAY,
            EmoRecError::EmbeddingError(_)
            | EmoRecError::ParseError(_)
            | EmoRecError::ImageError(_)
            | EmoRecError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EmoRecError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let detail = self.to_string();

        if status.is_server_error() {
            error!("Request failed ({}): {}", status, detail);
        } else {
            warn!("Request rejected ({}): {}", status, detail);
        }

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            EmoRecError::InvalidRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(EmoRecError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
        assert_eq!(EmoRecError::QuotaExceeded.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(
            EmoRecError::ServiceUnavailable("spotify".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(EmoRecError::ApiError("x".into()).status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            EmoRecError::EmbeddingError("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_has_detail() {
        let response = EmoRecError::NotFound("tracks/abc".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["detail"], "Not found: tracks/abc");
    }
}
