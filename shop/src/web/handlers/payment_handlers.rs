// petalcart/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use petalflow::{RunOutcome, Shared};
use serde_json::json;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::CreateOrderRequest;
use crate::pipelines::contexts::CheckoutCtx;
use crate::state::AppState;

#[instrument(
    name = "handler::create_payment_order",
    skip(app_state, payload),
    fields(amount = ?payload.amount, currency = ?payload.currency)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx = Shared::new(CheckoutCtx::new(app_state.get_ref().clone(), payload.into_inner()));

  match app_state.flows.run(ctx.clone()).await? {
    RunOutcome::Completed => {
      let order = ctx.read().order.clone().ok_or_else(|| {
        warn!("Checkout pipeline completed without a gateway order.");
        AppError::Internal("Order creation finished without an order.".to_string())
      })?;
      info!(order_id = %order.id, "Payment order created.");
      Ok(HttpResponse::Ok().json(json!({
          "success": true,
          "order": order
      })))
    }
    RunOutcome::Halted => Err(AppError::Internal(
      "Order creation was halted before an order was created.".to_string(),
    )),
  }
}
