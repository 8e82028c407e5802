//! API error type with structured JSON responses.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::error::{LlmError, UserFriendlyError, XtractError};
use xtract_utils::redaction::redact_error_message;

/// Error response body: `{"error": {"code": .., "message": .., "retryable": ..}}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
    /// The same request may succeed if sent again (provider transport, quota,
    /// outage or timeout). The server itself never retries.
    pub retryable: bool,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Extraction(#[from] XtractError),

    #[error("Invalid request body: {0}")]
    BadBody(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadBody(rejection.body_text())
    }
}

impl ApiError {
    /// HTTP status and stable error code
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::BadBody(_) => (StatusCode::BAD_REQUEST, "MALFORMED_INPUT"),
            Self::Extraction(err) => match err {
                XtractError::MalformedInput(_) => (StatusCode::BAD_REQUEST, "MALFORMED_INPUT"),
                XtractError::UnknownTemplate { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "UNKNOWN_TEMPLATE")
                }
                XtractError::Llm(LlmError::Timeout { .. }) => {
                    (StatusCode::GATEWAY_TIMEOUT, "PROVIDER_TIMEOUT")
                }
                XtractError::Llm(LlmError::Misconfiguration(_)) | XtractError::Config(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "MISCONFIGURED")
                }
                XtractError::Llm(_) => (StatusCode::BAD_GATEWAY, "PROVIDER_ERROR"),
                XtractError::Prompt(_) | XtractError::Io(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL")
                }
            },
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Extraction(XtractError::Llm(err)) if err.is_transient())
    }

    fn message(&self) -> String {
        match self {
            Self::BadBody(detail) => detail.clone(),
            Self::Extraction(err) => {
                let mut message = err.user_message();
                if let Some(context) = err.context() {
                    message.push_str(". ");
                    message.push_str(&context);
                }
                message
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = redact_error_message(&self.message());
        let retryable = self.retryable();

        if status.is_server_error() {
            tracing::error!(code, error = %redact_error_message(&self.to_string()), "Request failed");
        } else {
            tracing::debug!(code, error = %message, "Request rejected");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code,
                message,
                retryable,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn status(err: XtractError) -> StatusCode {
        ApiError::from(err).status_and_code().0
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status(XtractError::MalformedInput("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(XtractError::UnknownTemplate {
                template: "x".into(),
                available: vec![],
            }),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status(XtractError::Llm(LlmError::ProviderQuota("429".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(XtractError::Llm(LlmError::InvalidResponse("no choices".into()))),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status(XtractError::Llm(LlmError::Timeout {
                duration: Duration::from_secs(60)
            })),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            status(XtractError::Llm(LlmError::Misconfiguration("no key".into()))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::BadBody("EOF".into()).status_and_code(),
            (StatusCode::BAD_REQUEST, "MALFORMED_INPUT")
        );
    }

    #[test]
    fn test_retryable_only_for_transient_provider_failures() {
        let retryable = |err: XtractError| ApiError::from(err).retryable();

        assert!(retryable(XtractError::Llm(LlmError::ProviderQuota("429".into()))));
        assert!(retryable(XtractError::Llm(LlmError::ProviderOutage("503".into()))));
        assert!(retryable(XtractError::Llm(LlmError::Transport("reset".into()))));
        assert!(retryable(XtractError::Llm(LlmError::Timeout {
            duration: Duration::from_secs(60)
        })));

        assert!(!retryable(XtractError::Llm(LlmError::ProviderAuth("401".into()))));
        assert!(!retryable(XtractError::Llm(LlmError::InvalidResponse("empty".into()))));
        assert!(!retryable(XtractError::MalformedInput("x".into())));
        assert!(!ApiError::BadBody("EOF".into()).retryable());
    }

    #[test]
    fn test_unknown_template_message_lists_templates() {
        let err = ApiError::from(XtractError::UnknownTemplate {
            template: "soap_fr".into(),
            available: vec!["soap_en".into()],
        });
        let message = err.message();
        assert!(message.contains("soap_fr"));
        assert!(message.contains("soap_en"));
    }
}
