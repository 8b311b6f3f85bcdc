// petalcart/src/models/custom_request.rs

use crate::errors::{AppError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MAX_MESSAGE_LEN: usize = 2000;

/// A customer enquiry ("custom request") row.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomRequest {
  pub id: i32,
  pub user_name: Option<String>,
  pub user_email: Option<String>,
  pub user_phone: Option<String>,
  pub message: Option<String>,
  pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomRequest {
  pub user_name: Option<String>,
  pub user_email: Option<String>,
  pub user_phone: Option<String>,
  pub message: String,
}

impl NewCustomRequest {
  /// Trims every field, turns blanks into `None` and checks the rest.
  pub fn normalized(self) -> Result<Self> {
    let tidy = |v: Option<String>| v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
    let message = self.message.trim().to_string();
    if message.is_empty() {
      return Err(AppError::Validation("message is required".to_string()));
    }
    if message.chars().count() > MAX_MESSAGE_LEN {
      return Err(AppError::Validation(format!(
        "message must be at most {} characters",
        MAX_MESSAGE_LEN
      )));
    }
    let user_email = tidy(self.user_email);
    if let Some(email) = &user_email {
      if !email.contains('@') {
        return Err(AppError::Validation("userEmail is not a valid email address".to_string()));
      }
    }
    Ok(Self {
      user_name: tidy(self.user_name),
      user_email,
      user_phone: tidy(self.user_phone),
      message,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn request(email: Option<&str>, message: &str) -> NewCustomRequest {
    NewCustomRequest {
      user_name: Some("  Asha ".to_string()),
      user_email: email.map(str::to_string),
      user_phone: Some("   ".to_string()),
      message: message.to_string(),
    }
  }

  #[test]
  fn normalization_trims_and_drops_blanks() {
    let cleaned = request(Some(" asha@example.com "), "  Need 50 white roses  ").normalized().unwrap();
    assert_eq!(cleaned.user_name.as_deref(), Some("Asha"));
    assert_eq!(cleaned.user_email.as_deref(), Some("asha@example.com"));
    assert_eq!(cleaned.user_phone, None);
    assert_eq!(cleaned.message, "Need 50 white roses");
  }

  #[test]
  fn blank_message_and_bad_email_are_rejected() {
    assert!(matches!(request(None, "   ").normalized(), Err(AppError::Validation(_))));
    assert!(matches!(
      request(Some("not-an-email"), "hello").normalized(),
      Err(AppError::Validation(_))
    ));
    assert!(request(None, &"x".repeat(MAX_MESSAGE_LEN + 1)).normalized().is_err());
  }
}
