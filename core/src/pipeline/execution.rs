// petalflow/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps and their handlers in order.

use crate::core::control::{RunOutcome, StepControl};
use crate::core::handler::Handler;
use crate::core::shared::Shared;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<Ctx, Err> Pipeline<Ctx, Err>
where
  Ctx: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx`.
  ///
  /// Returns `Ok(Completed)` when all steps ran, `Ok(Halted)` when a handler
  /// asked to stop, and `Err` on the first handler failure. A required step
  /// with no handlers at all fails with [`FlowError::HandlerMissing`].
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<Ctx>(),
      num_steps = self.steps.len(),
    ),
    err(Display)
  )]
  pub async fn run(&self, ctx: Shared<Ctx>) -> Result<RunOutcome, Err> {
    event!(Level::DEBUG, "Run starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if step_def.should_skip(&ctx) {
        event!(parent: &step_span, Level::INFO, "Step skipped by its skip_if predicate.");
        continue;
      }

      let phases = [
        ("before", self.before.get(step_name)),
        ("on", self.on.get(step_name)),
        ("after", self.after.get(step_name)),
      ];
      let has_handlers = phases.iter().any(|(_, hs)| hs.map_or(false, |v| !v.is_empty()));

      if !has_handlers {
        if step_def.optional {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(parent: &step_span, Level::ERROR, "Required step has no handlers.");
        return Err(Err::from(FlowError::HandlerMissing {
          step_name: step_def.name.clone(),
        }));
      }

      for (phase, handlers) in phases {
        let Some(handlers) = handlers else { continue };
        if run_phase(phase, handlers, &ctx).instrument(step_span.clone()).await? == StepControl::Halt {
          event!(parent: &step_span, Level::INFO, phase, "Run halted by a handler.");
          return Ok(RunOutcome::Halted);
        }
      }
      event!(parent: &step_span, Level::DEBUG, "Step finished.");
    }

    event!(Level::DEBUG, "Run completed.");
    Ok(RunOutcome::Completed)
  }
}

async fn run_phase<Ctx, Err>(
  phase: &'static str,
  handlers: &[Handler<Ctx, Err>],
  ctx: &Shared<Ctx>,
) -> Result<StepControl, Err>
where
  Ctx: 'static + Send + Sync,
  Err: std::error::Error + Send + Sync + 'static,
{
  for (handler_idx, handler) in handlers.iter().enumerate() {
    let handler_span = span!(Level::DEBUG, "step_handler", phase, handler_index = handler_idx);
    match handler(ctx.clone()).instrument(handler_span).await {
      Ok(StepControl::Continue) => {}
      Ok(StepControl::Halt) => return Ok(StepControl::Halt),
      Err(e) => {
        event!(Level::ERROR, error = %e, phase, "Handler failed.");
        return Err(e);
      }
    }
  }
  Ok(StepControl::Continue)
}
