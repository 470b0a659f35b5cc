//! HTTP error mapping.
//!
//! # Responsibility
//! - Own the table from `ServiceError` and extractor rejections to status
//!   codes and response bodies.
//!
//! # Invariants
//! - Not-found responses use the `{status, error, message}` shape.
//! - Every other client error is a 400 problem body.
//! - Store failures never leak their cause to the client.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use roster_core::model::validation::MSG_INVALID_CONTENT;
use roster_core::{FieldViolation, ServiceError};
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error("malformed request body: {0}")]
    Body(#[from] JsonRejection),
    #[error("malformed query: {0}")]
    Query(#[from] QueryRejection),
}

/// RFC 7807 style body used for 400 and 500 responses.
#[derive(Debug, Serialize)]
struct ProblemBody {
    #[serde(rename = "type")]
    kind: &'static str,
    title: &'static str,
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<Vec<FieldViolation>>,
}

impl ProblemBody {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            kind: "about:blank",
            title: status.canonical_reason().unwrap_or("Error"),
            status: status.as_u16(),
            detail: detail.into(),
            error: None,
        }
    }

    fn with_violations(mut self, violations: Vec<FieldViolation>) -> Self {
        self.error = Some(violations);
        self
    }
}

#[derive(Debug, Serialize)]
struct NotFoundBody {
    status: u16,
    error: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let bad_request = StatusCode::BAD_REQUEST;
        match self {
            Self::Service(err @ ServiceError::NotFound(_)) => {
                let status = StatusCode::NOT_FOUND;
                let body = NotFoundBody {
                    status: status.as_u16(),
                    error: "Not Found",
                    message: err.to_string(),
                };
                (status, Json(body)).into_response()
            }
            Self::Service(ServiceError::ValidationFailed(detail)) => {
                let body = ProblemBody::new(bad_request, MSG_INVALID_CONTENT)
                    .with_violations(detail.violations);
                (bad_request, Json(body)).into_response()
            }
            Self::Service(ServiceError::Conflict(message))
            | Self::Service(ServiceError::BusinessRuleViolation(message)) => {
                (bad_request, Json(ProblemBody::new(bad_request, message))).into_response()
            }
            Self::Service(ServiceError::StoreUnavailable(err)) => {
                error!("event=http_error module=api status=error error_code=store_unavailable error={err}");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                let body = ProblemBody::new(status, "Record store unavailable.");
                (status, Json(body)).into_response()
            }
            Self::Body(rejection) => {
                warn!("event=http_reject module=api status=rejected reason=body");
                (bad_request, Json(ProblemBody::new(bad_request, rejection.body_text())))
                    .into_response()
            }
            Self::Query(rejection) => {
                warn!("event=http_reject module=api status=rejected reason=query");
                (bad_request, Json(ProblemBody::new(bad_request, rejection.body_text())))
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ApiError;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;
    use roster_core::{ErrorDetail, FieldViolation, RepoError, ServiceError};
    use serde_json::Value;

    async fn render(error: ApiError) -> (StatusCode, Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn not_found_uses_status_error_message_shape() {
        let (status, body) =
            render(ServiceError::NotFound("nonexist@mail.com".to_string()).into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);
        assert_eq!(body["error"], "Not Found");
        assert_eq!(body["message"], "User with email nonexist@mail.com not found");
    }

    #[tokio::test]
    async fn validation_failure_lists_field_errors() {
        let detail = ErrorDetail::invalid_content(vec![FieldViolation::new(
            "email",
            "person",
            "must not be blank",
        )]);
        let (status, body) = render(ServiceError::ValidationFailed(detail).into()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["type"], "about:blank");
        assert_eq!(body["title"], "Bad Request");
        assert_eq!(body["status"], 400);
        assert_eq!(body["detail"], "Invalid request content.");
        assert_eq!(body["error"][0]["field"], "email");
        assert_eq!(body["error"][0]["objectName"], "person");
        assert_eq!(body["error"][0]["message"], "must not be blank");
    }

    #[tokio::test]
    async fn business_rule_and_conflict_are_bad_request_problems() {
        let (status, body) = render(
            ServiceError::BusinessRuleViolation("toDate must be after fromDate".to_string())
                .into(),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "toDate must be after fromDate");
        assert!(body.get("error").is_none());

        let (status, body) =
            render(ServiceError::Conflict("User with id a@x.com already exists.".to_string()).into())
                .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "User with id a@x.com already exists.");
    }

    #[tokio::test]
    async fn store_failure_hides_cause() {
        let err = ServiceError::StoreUnavailable(RepoError::Worker("disk on fire".to_string()));
        let (status, body) = render(err.into()).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["status"], 500);
        assert!(!body.to_string().contains("disk on fire"));
    }
}
