// petalcart/src/pipelines/notification_pipeline.rs

//! Order notification emails. The two send steps are optional and never fail
//! the run: a provider error is logged and recorded on the context so the
//! caller can report which emails went out.

use crate::errors::{AppError, Result};
use crate::pipelines::contexts::{Delivery, NotificationCtx};
use crate::services::templates::{self, RenderedEmail};
use crate::services::{EmailAddress, EmailMessage};
use crate::state::AppState;
use petalflow::{FlowRegistry, Pipeline, Shared, StepControl};
use tracing::{info, warn};

pub const STEPS: [&str; 3] = ["validate_notification", "send_customer_confirmation", "send_admin_alert"];

async fn deliver(state: &AppState, to: EmailAddress, email: RenderedEmail) -> Delivery {
  let message = EmailMessage {
    from: state.sender(),
    to,
    subject: email.subject,
    html: email.html,
  };
  match state.mailer.send(&message).await {
    Ok(sent) => Delivery::Sent(sent),
    Err(e) => {
      warn!(error = %e, to = %message.to.email, "Email could not be sent.");
      Delivery::Failed(e.to_string())
    }
  }
}

pub fn build_notification_pipeline() -> Result<Pipeline<NotificationCtx, AppError>> {
  let mut p = Pipeline::<NotificationCtx, AppError>::new(&[
    (STEPS[0], false, None),
    (STEPS[1], true, None),
    (STEPS[2], true, None),
  ]);

  p.on("validate_notification", |ctx: Shared<NotificationCtx>| {
    Box::pin(async move {
      ctx.read().notification.validate()?;
      Ok::<_, AppError>(StepControl::Continue)
    })
  })?;

  p.on("send_customer_confirmation", |ctx: Shared<NotificationCtx>| {
    Box::pin(async move {
      let (state, to, email) = {
        let guard = ctx.read();
        let n = &guard.notification;
        let to = EmailAddress::new(n.customer.email.trim(), Some(n.customer_name().to_string()));
        (guard.app_state.clone(), to, templates::order_confirmation(n))
      };
      let outcome = deliver(&state, to, email).await;
      ctx.write().customer_email = outcome;
      Ok::<_, AppError>(StepControl::Continue)
    })
  })?;

  p.on("send_admin_alert", |ctx: Shared<NotificationCtx>| {
    Box::pin(async move {
      let (state, email) = {
        let guard = ctx.read();
        (guard.app_state.clone(), templates::admin_order_alert(&guard.notification))
      };
      let to = EmailAddress::new(state.config.admin_email.clone(), Some("PetalCart Admin".to_string()));
      let outcome = deliver(&state, to, email).await;
      ctx.write().admin_email = outcome;
      Ok::<_, AppError>(StepControl::Continue)
    })
  })?;

  p.after("send_admin_alert", |ctx: Shared<NotificationCtx>| {
    Box::pin(async move {
      let guard = ctx.read();
      info!(
        order_id = %guard.notification.order_id,
        customer_sent = guard.customer_email.is_sent(),
        admin_sent = guard.admin_email.is_sent(),
        "Order notifications processed."
      );
      Ok::<_, AppError>(StepControl::Continue)
    })
  })?;

  Ok(p)
}

pub fn register_notification_pipeline(registry: &FlowRegistry<AppError>) -> Result<()> {
  registry.register(build_notification_pipeline()?);
  Ok(())
}
