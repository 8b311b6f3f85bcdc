// petalflow/src/pipeline/definition.rs

//! `Pipeline<Ctx, Err>` and the methods that change its list of steps.

use crate::core::handler::Handler;
use crate::core::step::{SkipIf, StepDef};
use crate::error::{FlowError, FlowResult};
use std::collections::HashMap;

/// An ordered list of named steps over a context type `Ctx`.
///
/// Handlers return `Result<StepControl, Err>`. `Err` must be constructible from
/// [`FlowError`] so that engine failures (a required step without handlers)
/// surface through the same error type as handler failures.
pub struct Pipeline<Ctx, Err>
where
  Ctx: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef<Ctx>>,
  pub(crate) before: HashMap<String, Vec<Handler<Ctx, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<Ctx, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<Ctx, Err>>>,
}

impl<Ctx, Err> Pipeline<Ctx, Err>
where
  Ctx: 'static + Send + Sync,
  Err: std::error::Error + From<FlowError> + Send + Sync + 'static,
{
  /// Declares a pipeline from `(name, optional, skip_if)` triples.
  pub fn new(step_defs: &[(&str, bool, Option<SkipIf<Ctx>>)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(name, optional, skip_if)| StepDef {
        name: (*name).to_string(),
        optional: *optional,
        skip_if: skip_if.clone(),
      })
      .collect();

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
    }
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub(crate) fn position_of(&self, step_name: &str) -> FlowResult<usize> {
    self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .ok_or_else(|| FlowError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  fn ensure_new_name(&self, step_name: &str) -> FlowResult<()> {
    if self.steps.iter().any(|s| s.name == step_name) {
      return Err(FlowError::Internal(format!(
        "step '{}' is already declared",
        step_name
      )));
    }
    Ok(())
  }

  pub fn insert_before(
    &mut self,
    existing_step: &str,
    new_step: impl Into<String>,
    optional: bool,
    skip_if: Option<SkipIf<Ctx>>,
  ) -> FlowResult<()> {
    let idx = self.position_of(existing_step)?;
    let name = new_step.into();
    self.ensure_new_name(&name)?;
    self.steps.insert(idx, StepDef { name, optional, skip_if });
    Ok(())
  }

  pub fn insert_after(
    &mut self,
    existing_step: &str,
    new_step: impl Into<String>,
    optional: bool,
    skip_if: Option<SkipIf<Ctx>>,
  ) -> FlowResult<()> {
    let idx = self.position_of(existing_step)?;
    let name = new_step.into();
    self.ensure_new_name(&name)?;
    self.steps.insert(idx + 1, StepDef { name, optional, skip_if });
    Ok(())
  }

  /// Removes a step and every handler attached to it. Unknown names are a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Ok(idx) = self.position_of(step_name) {
      self.steps.remove(idx);
      self.before.remove(step_name);
      self.on.remove(step_name);
      self.after.remove(step_name);
    }
  }

  pub fn set_optional(&mut self, step_name: &str, optional: bool) -> FlowResult<()> {
    let idx = self.position_of(step_name)?;
    self.steps[idx].optional = optional;
    Ok(())
  }

  pub fn set_skip_if(&mut self, step_name: &str, skip_if: Option<SkipIf<Ctx>>) -> FlowResult<()> {
    let idx = self.position_of(step_name)?;
    self.steps[idx].skip_if = skip_if;
    Ok(())
  }
}
