// petalcart/src/web/handlers/notification_handlers.rs

use actix_web::{web, HttpResponse};
use petalflow::Shared;
use serde_json::json;
use tracing::{info, instrument};

use crate::errors::AppError;
use crate::models::OrderNotification;
use crate::pipelines::contexts::NotificationCtx;
use crate::state::AppState;

/// Sends the customer confirmation and the admin alert for a paid order.
///
/// Email failures do not fail the request; the response says which emails went out.
#[instrument(name = "handler::order_confirmation", skip(app_state, payload), fields(order_id = %payload.order_id))]
pub async fn order_confirmation_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<OrderNotification>,
) -> Result<HttpResponse, AppError> {
  let ctx = Shared::new(NotificationCtx::new(app_state.get_ref().clone(), payload.into_inner()));
  app_state.flows.run(ctx.clone()).await?;

  let guard = ctx.read();
  info!(
    customer_sent = guard.customer_email.is_sent(),
    admin_sent = guard.admin_email.is_sent(),
    "Order confirmation handled."
  );
  let errors: Vec<&str> = [guard.customer_email.error(), guard.admin_email.error()]
    .into_iter()
    .flatten()
    .collect();
  Ok(HttpResponse::Ok().json(json!({
      "success": true,
      "orderId": guard.notification.order_id,
      "customerEmailSent": guard.customer_email.is_sent(),
      "adminEmailSent": guard.admin_email.is_sent(),
      "customerMessageId": guard.customer_email.message_id(),
      "adminMessageId": guard.admin_email.message_id(),
      "errors": errors,
  })))
}
