use crate::utils::error::{ErrorKind, PickerError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorKind::SessionNotFound | ErrorKind::NoCandidatesFound => StatusCode::NOT_FOUND,
        ErrorKind::Busy => StatusCode::CONFLICT,
        ErrorKind::LocationUnavailable => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::ProviderError => StatusCode::BAD_GATEWAY,
        ErrorKind::GeocodeFailed
        | ErrorKind::Config
        | ErrorKind::Io
        | ErrorKind::Serialization => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for PickerError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let status = status_for(kind);

        if status.is_server_error() {
            tracing::error!("❌ {} (Category: {:?})", self, self.category());
        }

        // 設定與系統錯誤不回傳細節
        let details = match kind {
            ErrorKind::ProviderError | ErrorKind::InvalidInput | ErrorKind::NoCandidatesFound => {
                Some(self.to_string())
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.user_friendly_message(),
            details,
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            PickerError::NoCandidatesFound { radius_km: 1 }
                .into_response()
                .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(PickerError::Busy.into_response().status(), StatusCode::CONFLICT);
        assert_eq!(
            PickerError::provider("boom").into_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            PickerError::invalid_input("lat", "x", "bad").into_response().status(),
            StatusCode::BAD_REQUEST
        );
    }
}
