// petalcart/src/pipelines/mod.rs

//! Step pipelines behind the checkout and order-notification endpoints.

use crate::errors::{AppError, Result};
use petalflow::FlowRegistry;

pub mod contexts;

pub mod checkout_pipeline;
pub mod notification_pipeline;

/// Registers every pipeline. Called once while building `AppState`.
pub fn register_all_pipelines(registry: &FlowRegistry<AppError>) -> Result<()> {
  checkout_pipeline::register_checkout_pipeline(registry)?;
  notification_pipeline::register_notification_pipeline(registry)?;
  tracing::debug!("Application pipelines registered.");
  Ok(())
}
