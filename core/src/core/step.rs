// petalflow/src/core/step.rs

use super::Shared;

/// Predicate deciding, right before a step runs, whether to skip it.
pub type SkipIf<Ctx> = std::sync::Arc<dyn Fn(&Ctx) -> bool + Send + Sync + 'static>;

/// One named step of a pipeline.
#[derive(Clone)]
pub struct StepDef<Ctx: 'static + Send + Sync> {
  pub name: String,
  pub optional: bool,
  pub skip_if: Option<SkipIf<Ctx>>,
}

impl<Ctx: 'static + Send + Sync> StepDef<Ctx> {
  pub(crate) fn should_skip(&self, ctx: &Shared<Ctx>) -> bool {
    match &self.skip_if {
      Some(pred) => pred(&ctx.read()),
      None => false,
    }
  }
}

impl<Ctx: 'static + Send + Sync> std::fmt::Debug for StepDef<Ctx> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("optional", &self.optional)
      .field("has_skip_if", &self.skip_if.is_some())
      .finish()
  }
}
