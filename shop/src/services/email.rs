// petalcart/src/services/email.rs

//! Transactional email through the hosted provider's HTTP API.

use crate::config::AppConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmailAddress {
  pub email: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
}

impl EmailAddress {
  pub fn new(email: impl Into<String>, name: Option<String>) -> Self {
    Self {
      email: email.into(),
      name,
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
  pub from: EmailAddress,
  pub to: EmailAddress,
  pub subject: String,
  pub html: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentEmail {
  pub status: u16,
  pub message_id: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
  fn name(&self) -> &'static str;

  async fn send(&self, message: &EmailMessage) -> Result<SentEmail>;
}

pub fn mailer_from_config(config: &AppConfig) -> Result<Arc<dyn EmailSender>> {
  match &config.email_api_key {
    Some(api_key) => Ok(Arc::new(BrevoMailer::new(
      api_key.clone(),
      &config.email_base_url,
      config.http_timeout,
    )?)),
    None => {
      warn!("No email API key configured; emails are recorded by the mock mailer.");
      Ok(Arc::new(MockMailer::default()))
    }
  }
}

pub struct BrevoMailer {
  client: reqwest::Client,
  base_url: String,
  api_key: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
  sender: &'a EmailAddress,
  to: [&'a EmailAddress; 1],
  subject: &'a str,
  html_content: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
  #[serde(default)]
  message_id: Option<String>,
}

impl BrevoMailer {
  pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      api_key,
    })
  }

  fn send_url(&self) -> String {
    format!("{}/v3/smtp/email", self.base_url)
  }
}

#[async_trait]
impl EmailSender for BrevoMailer {
  fn name(&self) -> &'static str {
    "brevo"
  }

  #[instrument(name = "email::send", skip(self, message), fields(to = %message.to.email, subject = %message.subject), err(Display))]
  async fn send(&self, message: &EmailMessage) -> Result<SentEmail> {
    let body = SendRequest {
      sender: &message.from,
      to: [&message.to],
      subject: &message.subject,
      html_content: &message.html,
    };
    let resp = self
      .client
      .post(self.send_url())
      .header("api-key", &self.api_key)
      .header(reqwest::header::ACCEPT, "application/json")
      .json(&body)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let text = resp.text().await.unwrap_or_default();
      error!(%status, body = %text, "Email provider rejected the message.");
      return Err(AppError::Email(format!("{}: {}", status, text)));
    }

    let parsed = resp
      .json::<SendResponse>()
      .await
      .map_err(|e| AppError::Email(format!("Invalid send response: {}", e)))?;
    let message_id = parsed.message_id.unwrap_or_default();
    info!(%message_id, "Email accepted by provider.");
    Ok(SentEmail {
      status: status.as_u16(),
      message_id,
    })
  }
}

/// Keeps every message in memory instead of sending it.
///
/// A subject containing `fail_test` fails, for exercising error paths.
#[derive(Debug, Default)]
pub struct MockMailer {
  sent: Mutex<Vec<EmailMessage>>,
}

impl MockMailer {
  pub fn sent(&self) -> Vec<EmailMessage> {
    self.sent.lock().clone()
  }
}

#[async_trait]
impl EmailSender for MockMailer {
  fn name(&self) -> &'static str {
    "mock"
  }

  #[instrument(name = "email_mock::send", skip(self, message), fields(to = %message.to.email, subject = %message.subject), err(Display))]
  async fn send(&self, message: &EmailMessage) -> Result<SentEmail> {
    if message.subject.to_lowercase().contains("fail_test") {
      warn!("Simulated email failure.");
      return Err(AppError::Email("Simulated email send failure".to_string()));
    }
    let message_id = format!("<mock_{}@petalcart.local>", uuid::Uuid::new_v4().simple());
    self.sent.lock().push(message.clone());
    info!(%message_id, "Mock email recorded.");
    Ok(SentEmail {
      status: 201,
      message_id,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn message(subject: &str) -> EmailMessage {
    EmailMessage {
      from: EmailAddress::new("orders@petalcart.local", Some("PetalCart".to_string())),
      to: EmailAddress::new("asha@example.com", None),
      subject: subject.to_string(),
      html: "<p>Hello</p>".to_string(),
    }
  }

  #[tokio::test]
  async fn mock_mailer_records_messages() {
    let mailer = MockMailer::default();
    let sent = mailer.send(&message("Order Confirmation")).await.unwrap();
    assert_eq!(sent.status, 201);
    assert!(sent.message_id.starts_with("<mock_"));
    assert_eq!(mailer.sent(), vec![message("Order Confirmation")]);
  }

  #[tokio::test]
  async fn mock_mailer_fails_on_request() {
    let mailer = MockMailer::default();
    let err = mailer.send(&message("FAIL_TEST please")).await.unwrap_err();
    assert!(matches!(err, AppError::Email(_)));
    assert!(mailer.sent().is_empty());
  }

  #[test]
  fn request_body_uses_provider_field_names() {
    let msg = message("Hi");
    let body = SendRequest {
      sender: &msg.from,
      to: [&msg.to],
      subject: &msg.subject,
      html_content: &msg.html,
    };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["sender"]["name"], "PetalCart");
    assert_eq!(json["to"][0]["email"], "asha@example.com");
    assert!(json["to"][0].get("name").is_none());
    assert_eq!(json["htmlContent"], "<p>Hello</p>");
  }
}
