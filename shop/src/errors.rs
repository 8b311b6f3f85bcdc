// petalcart/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use petalflow::FlowError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Payment Error: {0}")]
  Payment(String),

  #[error("Payment Gateway Error: {0}")]
  Gateway(String),

  #[error("Email Provider Error: {0}")]
  Email(String),

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Migration Error: {0}")]
  Migration(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Outbound HTTP Error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("I/O Error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Workflow Error: {source}")]
  Workflow {
    #[from]
    source: FlowError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(db_err) => AppError::Sqlx(db_err),
        Err(other) => AppError::Internal(other.to_string()),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Payment(_) => StatusCode::PAYMENT_REQUIRED,
      AppError::Gateway(_) | AppError::Email(_) | AppError::Http(_) => StatusCode::BAD_GATEWAY,
      AppError::Config(_)
      | AppError::Migration(_)
      | AppError::Sqlx(_)
      | AppError::Io(_)
      | AppError::Workflow { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    tracing::error!(application_error = %self, "Responding with error");
    let status = self.status_code();
    let body = match self {
      AppError::Validation(m) | AppError::NotFound(m) | AppError::Payment(m) => json!({"error": m}),
      AppError::Gateway(m) => json!({"error": "Payment provider error", "detail": m}),
      AppError::Email(m) => json!({"error": "Email service error", "detail": m}),
      AppError::Http(e) => json!({"error": "Upstream service unreachable", "detail": e.to_string()}),
      AppError::Config(m) => json!({"error": "Configuration issue", "detail": m}),
      AppError::Migration(m) => json!({"error": "Schema migration failed", "detail": m}),
      AppError::Sqlx(_) => json!({"error": "Database operation failed"}),
      AppError::Io(_) => json!({"error": "File access failed"}),
      AppError::Workflow { source } => {
        tracing::error!(flow_error = ?source, "Workflow error details");
        json!({"error": "Workflow processing error", "detail": source.to_string()})
      }
      AppError::Internal(m) => json!({"error": "An internal error occurred", "detail": m}),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn anyhow_round_trip_keeps_the_original_variant() {
    let wrapped = anyhow::Error::new(AppError::Validation("amount is required".into()));
    match AppError::from(wrapped) {
      AppError::Validation(m) => assert_eq!(m, "amount is required"),
      other => panic!("unexpected variant: {:?}", other),
    }
  }

  #[test]
  fn flow_errors_become_workflow_errors() {
    let missing = FlowError::HandlerMissing { step_name: "notify".into() };
    let app_err: AppError = missing.into();
    assert!(matches!(app_err, AppError::Workflow { .. }));
    assert_eq!(app_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
  }

  #[test]
  fn status_codes_follow_the_error_kind() {
    assert_eq!(AppError::Validation("x".into()).status_code(), StatusCode::BAD_REQUEST);
    assert_eq!(AppError::NotFound("x".into()).status_code(), StatusCode::NOT_FOUND);
    assert_eq!(AppError::Gateway("x".into()).status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(AppError::Email("x".into()).status_code(), StatusCode::BAD_GATEWAY);
    assert_eq!(
      AppError::Sqlx(sqlx::Error::RowNotFound).status_code(),
      StatusCode::INTERNAL_SERVER_ERROR
    );
  }
}
