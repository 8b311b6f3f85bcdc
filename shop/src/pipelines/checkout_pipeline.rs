// petalcart/src/pipelines/checkout_pipeline.rs
use crate::errors::{AppError, Result};
use crate::pipelines::contexts::CheckoutCtx;
use petalflow::{FlowRegistry, Pipeline, Shared, StepControl};
use tracing::info;

pub const STEPS: [&str; 3] = ["validate_order_request", "create_gateway_order", "log_order_summary"];

pub fn build_checkout_pipeline() -> Result<Pipeline<CheckoutCtx, AppError>> {
  let mut p = Pipeline::<CheckoutCtx, AppError>::new(&[
    (STEPS[0], false, None),
    (STEPS[1], false, None),
    (STEPS[2], true, None),
  ]);

  // Step 1: shape the gateway request; any problem is a 400.
  p.on("validate_order_request", |ctx: Shared<CheckoutCtx>| {
    Box::pin(async move {
      let gateway_request = ctx.read().request.to_gateway_order()?;
      info!(
        amount = gateway_request.amount,
        currency = %gateway_request.currency,
        receipt = %gateway_request.receipt,
        "Order request validated."
      );
      ctx.write().gateway_request = Some(gateway_request);
      Ok::<_, AppError>(StepControl::Continue)
    })
  })?;

  // Step 2: one call to the gateway.
  p.on("create_gateway_order", |ctx: Shared<CheckoutCtx>| {
    Box::pin(async move {
      let (payments, gateway_request) = {
        let guard = ctx.read();
        (guard.app_state.payments.clone(), guard.gateway_request.clone())
      };
      let gateway_request = gateway_request
        .ok_or_else(|| AppError::Internal("Gateway request was not prepared".to_string()))?;

      let order = payments.create_order(&gateway_request).await?;
      if order.amount != gateway_request.amount {
        return Err(AppError::Gateway(format!(
          "Gateway returned amount {} for a request of {}",
          order.amount, gateway_request.amount
        )));
      }
      ctx.write().order = Some(order);
      Ok(StepControl::Continue)
    })
  })?;

  p.on("log_order_summary", |ctx: Shared<CheckoutCtx>| {
    Box::pin(async move {
      let guard = ctx.read();
      if let Some(order) = &guard.order {
        info!(
          order_id = %order.id,
          amount = order.amount,
          currency = %order.currency,
          items = guard.request.order_items.len(),
          "Payment order ready."
        );
      }
      Ok::<_, AppError>(StepControl::Continue)
    })
  })?;

  Ok(p)
}

pub fn register_checkout_pipeline(registry: &FlowRegistry<AppError>) -> Result<()> {
  registry.register(build_checkout_pipeline()?);
  Ok(())
}
