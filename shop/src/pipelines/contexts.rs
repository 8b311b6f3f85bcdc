// petalcart/src/pipelines/contexts.rs

//! Run contexts for the shop's pipelines. Handlers receive these wrapped in
//! `petalflow::Shared`.

use crate::models::{CreateOrderRequest, GatewayOrder, NewGatewayOrder, OrderNotification};
use crate::services::SentEmail;
use crate::state::AppState;

/// Context for `POST /api/payment/create-order`.
#[derive(Clone)]
pub struct CheckoutCtx {
  pub app_state: AppState,
  pub request: CreateOrderRequest,
  /// Set by `validate_order_request`.
  pub gateway_request: Option<NewGatewayOrder>,
  /// Set by `create_gateway_order`.
  pub order: Option<GatewayOrder>,
}

impl CheckoutCtx {
  pub fn new(app_state: AppState, request: CreateOrderRequest) -> Self {
    Self {
      app_state,
      request,
      gateway_request: None,
      order: None,
    }
  }
}

/// Outcome of one email send within a run.
#[derive(Debug, Clone, Default)]
pub enum Delivery {
  #[default]
  NotAttempted,
  Sent(SentEmail),
  Failed(String),
}

impl Delivery {
  pub fn is_sent(&self) -> bool {
    matches!(self, Delivery::Sent(_))
  }

  pub fn message_id(&self) -> Option<&str> {
    match self {
      Delivery::Sent(sent) => Some(sent.message_id.as_str()),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      Delivery::Failed(reason) => Some(reason.as_str()),
      _ => None,
    }
  }
}

/// Context for `POST /api/orders/confirmation`.
#[derive(Clone)]
pub struct NotificationCtx {
  pub app_state: AppState,
  pub notification: OrderNotification,
  pub customer_email: Delivery,
  pub admin_email: Delivery,
}

impl NotificationCtx {
  pub fn new(app_state: AppState, notification: OrderNotification) -> Self {
    Self {
      app_state,
      notification,
      customer_email: Delivery::NotAttempted,
      admin_email: Delivery::NotAttempted,
    }
  }
}
