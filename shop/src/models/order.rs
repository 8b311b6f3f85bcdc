// petalcart/src/models/order.rs

//! Payloads for payment-order creation and order notifications.

use crate::errors::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const DEFAULT_CURRENCY: &str = "INR";
/// Gateway limits: receipt length and number of note entries.
pub const MAX_RECEIPT_LEN: usize = 40;
pub const MAX_NOTES: usize = 15;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub name: String,
  pub quantity: u32,
  /// Unit price in whole currency units.
  pub price: i64,
}

impl LineItem {
  /// `None` when the product does not fit in an `i64`.
  pub fn line_total(&self) -> Option<i64> {
    self.price.checked_mul(i64::from(self.quantity))
  }

  fn validate(&self) -> Result<()> {
    if self.name.trim().is_empty() || self.quantity == 0 {
      return Err(AppError::Validation(
        "every item needs a name and a quantity of at least 1".to_string(),
      ));
    }
    if self.price < 0 {
      return Err(AppError::Validation(format!("price of '{}' must not be negative", self.name)));
    }
    if self.line_total().is_none() {
      return Err(AppError::Validation(format!("price of '{}' is too large", self.name)));
    }
    Ok(())
  }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
  pub recipient_name: Option<String>,
  pub phone: Option<String>,
  pub address: Option<String>,
  pub city: Option<String>,
  pub pincode: Option<String>,
  pub date: Option<String>,
  pub time_slot: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
  pub name: Option<String>,
  pub email: String,
  pub phone: Option<String>,
}

/// Body of `POST /api/payment/create-order`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  /// Minor units, as the gateway expects.
  pub amount: Option<i64>,
  pub currency: Option<String>,
  pub receipt: Option<String>,
  #[serde(default)]
  pub notes: BTreeMap<String, String>,
  pub order_details: Option<serde_json::Value>,
  pub delivery_details: Option<DeliveryDetails>,
  #[serde(default)]
  pub order_items: Vec<LineItem>,
}

/// What is actually sent to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewGatewayOrder {
  pub amount: u64,
  pub currency: String,
  pub receipt: String,
  pub notes: BTreeMap<String, String>,
}

/// Order object returned by the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayOrder {
  pub id: String,
  #[serde(default = "default_entity")]
  pub entity: String,
  pub amount: u64,
  pub currency: String,
  pub receipt: Option<String>,
  pub status: String,
  #[serde(default)]
  pub created_at: i64,
}

fn default_entity() -> String {
  "order".to_string()
}

impl CreateOrderRequest {
  /// Checks required fields and shapes the gateway request.
  pub fn to_gateway_order(&self) -> Result<NewGatewayOrder> {
    let amount = match self.amount {
      None => return Err(AppError::Validation("amount is required".to_string())),
      Some(a) if a <= 0 => return Err(AppError::Validation("amount must be greater than zero".to_string())),
      Some(a) => a as u64,
    };

    let currency = self
      .currency
      .as_deref()
      .map(str::trim)
      .filter(|c| !c.is_empty())
      .unwrap_or(DEFAULT_CURRENCY)
      .to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
      return Err(AppError::Validation(format!("currency '{}' is not a 3-letter code", currency)));
    }

    let receipt = match self.receipt.as_deref().map(str::trim).filter(|r| !r.is_empty()) {
      Some(r) if r.chars().count() > MAX_RECEIPT_LEN => {
        return Err(AppError::Validation(format!(
          "receipt must be at most {} characters",
          MAX_RECEIPT_LEN
        )))
      }
      Some(r) => r.to_string(),
      None => generate_receipt(),
    };

    if self.notes.len() > MAX_NOTES {
      return Err(AppError::Validation(format!("at most {} notes are allowed", MAX_NOTES)));
    }
    for item in &self.order_items {
      item.validate()?;
    }

    let mut notes = self.notes.clone();
    let mut add_note = |key: &str, value: String| {
      if notes.len() < MAX_NOTES {
        notes.entry(key.to_string()).or_insert(value);
      }
    };
    if !self.order_items.is_empty() {
      add_note("item_count", self.order_items.len().to_string());
    }
    if let Some(delivery) = &self.delivery_details {
      if let Some(city) = &delivery.city {
        add_note("delivery_city", city.clone());
      }
      if let Some(date) = &delivery.date {
        add_note("delivery_date", date.clone());
      }
    }

    Ok(NewGatewayOrder {
      amount,
      currency,
      receipt,
      notes,
    })
  }
}

/// `rcpt_` plus the first 20 hex digits of a fresh UUID.
pub fn generate_receipt() -> String {
  let id = uuid::Uuid::new_v4().simple().to_string();
  format!("rcpt_{}", &id[..20])
}

/// Body of `POST /api/orders/confirmation`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderNotification {
  pub order_id: String,
  pub customer: CustomerContact,
  #[serde(default)]
  pub items: Vec<LineItem>,
  pub total: i64,
  pub currency: Option<String>,
  pub delivery: Option<DeliveryDetails>,
}

impl OrderNotification {
  pub fn validate(&self) -> Result<()> {
    if self.order_id.trim().is_empty() {
      return Err(AppError::Validation("orderId is required".to_string()));
    }
    let email = self.customer.email.trim();
    if email.is_empty() || !email.contains('@') {
      return Err(AppError::Validation("customer.email must be a valid email address".to_string()));
    }
    if self.items.is_empty() {
      return Err(AppError::Validation("items must not be empty".to_string()));
    }
    let mut sum: i64 = 0;
    for item in &self.items {
      item.validate()?;
      sum = item
        .line_total()
        .and_then(|total| sum.checked_add(total))
        .ok_or_else(|| AppError::Validation("item prices are too large".to_string()))?;
    }
    if self.total < 0 {
      return Err(AppError::Validation("total must not be negative".to_string()));
    }
    Ok(())
  }

  pub fn currency(&self) -> &str {
    self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY)
  }

  pub fn customer_name(&self) -> &str {
    self
      .customer
      .name
      .as_deref()
      .map(str::trim)
      .filter(|n| !n.is_empty())
      .unwrap_or("Valued Customer")
  }
}
