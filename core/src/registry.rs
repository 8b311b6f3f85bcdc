// petalflow/src/registry.rs

//! `FlowRegistry<AppErr>`: one pipeline per context type, dispatched by type.

use crate::core::control::RunOutcome;
use crate::core::shared::Shared;
use crate::error::FlowError;
use crate::pipeline::definition::Pipeline;

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

/// Type-erased view of a registered pipeline.
#[async_trait]
trait ErasedRunner<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  /// `ctx` must hold a `Shared<Ctx>` for the pipeline's own `Ctx`.
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<RunOutcome, AppErr>;
}

struct Registered<Ctx, HandlerErr, AppErr>
where
  Ctx: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  pipeline: Pipeline<Ctx, HandlerErr>,
  _app_err: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<Ctx, HandlerErr, AppErr> ErasedRunner<AppErr> for Registered<Ctx, HandlerErr, AppErr>
where
  Ctx: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<FlowError> + Send + Sync + 'static,
{
  async fn run_erased(&self, ctx: Box<dyn Any + Send>) -> Result<RunOutcome, AppErr> {
    let typed = match ctx.downcast::<Shared<Ctx>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected_type = std::any::type_name::<Shared<Ctx>>().to_string();
        event!(Level::ERROR, %expected_type, "Context type mismatch at dispatch.");
        return Err(AppErr::from(FlowError::TypeMismatch {
          location: "FlowRegistry::run".to_string(),
          expected_type,
        }));
      }
    };
    self.pipeline.run(typed).await.map_err(AppErr::from)
  }
}

/// Registry of pipelines keyed by their context type.
///
/// `AppErr` is what [`FlowRegistry::run`] returns; it must absorb both the
/// engine's [`FlowError`] and every registered pipeline's handler error.
pub struct FlowRegistry<AppErr = FlowError>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  runners: RwLock<HashMap<TypeId, Arc<dyn ErasedRunner<AppErr>>>>,
}

impl<AppErr> Default for FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> FlowRegistry<AppErr>
where
  AppErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      runners: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` for its context type, replacing any earlier one.
  pub fn register<Ctx, HandlerErr>(&self, pipeline: Pipeline<Ctx, HandlerErr>)
  where
    Ctx: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<FlowError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(
      Level::DEBUG,
      context_type = %std::any::type_name::<Ctx>(),
      steps = ?pipeline.step_names(),
      "Registering pipeline."
    );
    let runner = Registered::<Ctx, HandlerErr, AppErr> {
      pipeline,
      _app_err: PhantomData,
    };
    self.runners.write().insert(TypeId::of::<Ctx>(), Arc::new(runner));
  }

  pub fn is_registered<Ctx: 'static>(&self) -> bool {
    self.runners.read().contains_key(&TypeId::of::<Ctx>())
  }

  /// Runs the pipeline registered for `Ctx`.
  #[instrument(name = "FlowRegistry::run", skip_all, fields(context_type = %std::any::type_name::<Ctx>()))]
  pub async fn run<Ctx>(&self, ctx: Shared<Ctx>) -> Result<RunOutcome, AppErr>
  where
    Ctx: 'static + Send + Sync,
  {
    let runner = self.runners.read().get(&TypeId::of::<Ctx>()).cloned();
    let runner = runner.ok_or_else(|| {
      let context_type = std::any::type_name::<Ctx>().to_string();
      event!(Level::ERROR, %context_type, "No pipeline registered.");
      AppErr::from(FlowError::NotRegistered { context_type })
    })?;

    runner.run_erased(Box::new(ctx)).await
  }
}
