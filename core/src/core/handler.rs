// petalflow/src/core/handler.rs

//! The boxed handler type stored by a pipeline.

use crate::core::control::StepControl;
use crate::core::shared::Shared;
use std::future::Future;
use std::pin::Pin;

/// A step handler: an async function over the shared run context.
///
/// Handlers receive a clone of the run's [`Shared`] context. Lock guards taken
/// from it must be dropped before the handler awaits anything.
pub type Handler<Ctx, Err> = Box<
  dyn Fn(Shared<Ctx>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>> + Send + Sync,
>;
