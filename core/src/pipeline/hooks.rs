// petalflow/src/pipeline/hooks.rs

//! Registration of `before`, `on` and `after` handlers.

use crate::core::control::StepControl;
use crate::core::handler::Handler;
use crate::core::shared::Shared;
use crate::error::{FlowError, FlowResult};
use crate::pipeline::definition::Pipeline;
use std::collections::HashMap;
use std::future::Future;
use tracing::{event, Level};

#[derive(Debug, Clone, Copy)]
enum Phase {
  Before,
  On,
  After,
}

impl<Ctx, Err> Pipeline<Ctx, Err>
where
  Ctx: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Adds a handler that runs before the step's `on` handlers.
  ///
  /// The handler's own error type only needs to convert into the pipeline's `Err`.
  pub fn before<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(Shared<Ctx>) -> F + Send + Sync + 'static,
  ) -> FlowResult<()>
  where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.attach(Phase::Before, step_name, handler_fn)
  }

  /// Adds a main handler for the step.
  pub fn on<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(Shared<Ctx>) -> F + Send + Sync + 'static,
  ) -> FlowResult<()>
  where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.attach(Phase::On, step_name, handler_fn)
  }

  /// Adds a handler that runs after the step's `on` handlers.
  pub fn after<F, HandlerErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(Shared<Ctx>) -> F + Send + Sync + 'static,
  ) -> FlowResult<()>
  where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.attach(Phase::After, step_name, handler_fn)
  }

  /// Adds an already boxed handler, e.g. one built by a helper function.
  pub fn on_boxed(&mut self, step_name: &str, handler: Handler<Ctx, Err>) -> FlowResult<()> {
    self.position_of(step_name)?;
    self.on.entry(step_name.to_string()).or_default().push(handler);
    Ok(())
  }

  fn attach<F, HandlerErr>(
    &mut self,
    phase: Phase,
    step_name: &str,
    handler_fn: impl Fn(Shared<Ctx>) -> F + Send + Sync + 'static,
  ) -> FlowResult<()>
  where
    F: Future<Output = Result<StepControl, HandlerErr>> + Send + 'static,
    HandlerErr: Into<Err> + Send + Sync + 'static,
  {
    self.position_of(step_name)?;
    let handler: Handler<Ctx, Err> = Box::new(move |ctx| {
      let fut = handler_fn(ctx);
      Box::pin(async move { fut.await.map_err(Into::into) })
    });
    self.table_mut(phase).entry(step_name.to_string()).or_default().push(handler);
    event!(Level::TRACE, step_name, ?phase, "Handler attached.");
    Ok(())
  }

  fn table_mut(&mut self, phase: Phase) -> &mut HashMap<String, Vec<Handler<Ctx, Err>>> {
    match phase {
      Phase::Before => &mut self.before,
      Phase::On => &mut self.on,
      Phase::After => &mut self.after,
    }
  }
}
