// petalcart/src/services/payment.rs

//! Payment-order creation against the hosted gateway.

use crate::config::{AppConfig, GatewayCredentials};
use crate::errors::{AppError, Result};
use crate::models::{GatewayOrder, NewGatewayOrder};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Short label used in logs and the health output.
  fn name(&self) -> &'static str;

  /// Creates a payment order. One request, no retries.
  async fn create_order(&self, order: &NewGatewayOrder) -> Result<GatewayOrder>;
}

/// Picks the real gateway when credentials are configured, the mock otherwise.
pub fn gateway_from_config(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>> {
  match &config.gateway {
    Some(credentials) => Ok(Arc::new(RazorpayGateway::new(
      credentials.clone(),
      &config.gateway_base_url,
      config.http_timeout,
    )?)),
    None => {
      warn!("No payment gateway credentials configured; using the mock gateway.");
      Ok(Arc::new(MockPaymentGateway::default()))
    }
  }
}

pub struct RazorpayGateway {
  client: reqwest::Client,
  base_url: String,
  credentials: GatewayCredentials,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorBody {
  error: GatewayErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GatewayErrorDetail {
  #[serde(default)]
  code: Option<String>,
  #[serde(default)]
  description: Option<String>,
}

impl RazorpayGateway {
  pub fn new(credentials: GatewayCredentials, base_url: &str, timeout: Duration) -> Result<Self> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;
    Ok(Self {
      client,
      base_url: base_url.trim_end_matches('/').to_string(),
      credentials,
    })
  }

  fn orders_url(&self) -> String {
    format!("{}/v1/orders", self.base_url)
  }
}

#[async_trait]
impl PaymentGateway for RazorpayGateway {
  fn name(&self) -> &'static str {
    "razorpay"
  }

  #[instrument(
    name = "payment::create_order",
    skip(self, order),
    fields(amount = order.amount, currency = %order.currency, receipt = %order.receipt),
    err(Display)
  )]
  async fn create_order(&self, order: &NewGatewayOrder) -> Result<GatewayOrder> {
    let resp = self
      .client
      .post(self.orders_url())
      .basic_auth(&self.credentials.key_id, Some(&self.credentials.key_secret))
      .json(order)
      .send()
      .await?;

    let status = resp.status();
    if !status.is_success() {
      let body = resp.text().await.unwrap_or_default();
      error!(%status, %body, "Payment gateway rejected the order.");
      let message = match serde_json::from_str::<GatewayErrorBody>(&body) {
        Ok(parsed) => format!(
          "{} {}: {}",
          status.as_u16(),
          parsed.error.code.unwrap_or_default(),
          parsed.error.description.unwrap_or_default()
        ),
        Err(_) => format!("{}: {}", status, body),
      };
      return Err(AppError::Gateway(message));
    }

    let created = resp
      .json::<GatewayOrder>()
      .await
      .map_err(|e| AppError::Gateway(format!("Invalid order response: {}", e)))?;
    info!(order_id = %created.id, status = %created.status, "Payment order created.");
    Ok(created)
  }
}

/// In-process gateway used without credentials and in tests.
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
  created: Mutex<Vec<GatewayOrder>>,
}

impl MockPaymentGateway {
  /// Orders created so far, oldest first.
  pub fn created_orders(&self) -> Vec<GatewayOrder> {
    self.created.lock().clone()
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  fn name(&self) -> &'static str {
    "mock"
  }

  #[instrument(name = "payment_mock::create_order", skip(self, order), fields(amount = order.amount), err(Display))]
  async fn create_order(&self, order: &NewGatewayOrder) -> Result<GatewayOrder> {
    if order.amount == 0 {
      return Err(AppError::Payment("Amount must be greater than zero".to_string()));
    }
    let created = GatewayOrder {
      id: format!("order_mock_{}", uuid::Uuid::new_v4().simple()),
      entity: "order".to_string(),
      amount: order.amount,
      currency: order.currency.clone(),
      receipt: Some(order.receipt.clone()),
      status: "created".to_string(),
      created_at: chrono::Utc::now().timestamp(),
    };
    info!(order_id = %created.id, "Mock payment order created.");
    self.created.lock().push(created.clone());
    Ok(created)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::collections::BTreeMap;

  fn new_order(amount: u64) -> NewGatewayOrder {
    NewGatewayOrder {
      amount,
      currency: "INR".to_string(),
      receipt: "rcpt_test".to_string(),
      notes: BTreeMap::new(),
    }
  }

  #[tokio::test]
  async fn mock_gateway_echoes_the_request() {
    let gateway = MockPaymentGateway::default();
    let order = gateway.create_order(&new_order(1500)).await.unwrap();
    assert!(order.id.starts_with("order_mock_"));
    assert_eq!(order.amount, 1500);
    assert_eq!(order.currency, "INR");
    assert_eq!(order.receipt.as_deref(), Some("rcpt_test"));
    assert_eq!(order.status, "created");
    assert_eq!(gateway.created_orders().len(), 1);
  }

  #[tokio::test]
  async fn mock_gateway_rejects_zero_amount() {
    let gateway = MockPaymentGateway::default();
    let err = gateway.create_order(&new_order(0)).await.unwrap_err();
    assert!(matches!(err, AppError::Payment(_)));
    assert!(gateway.created_orders().is_empty());
  }

  #[test]
  fn orders_url_has_no_double_slash() {
    let gateway = RazorpayGateway::new(
      GatewayCredentials {
        key_id: "rzp_test".to_string(),
        key_secret: "secret".to_string(),
      },
      "https://api.razorpay.com/",
      Duration::from_secs(5),
    )
    .unwrap();
    assert_eq!(gateway.orders_url(), "https://api.razorpay.com/v1/orders");
    assert_eq!(gateway.name(), "razorpay");
  }
}
