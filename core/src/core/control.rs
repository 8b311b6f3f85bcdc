// petalflow/src/core/control.rs

//! Signals for controlling a run and the outcome of a finished run.

/// Returned by every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Keep going with the remaining handlers and steps.
  Continue,
  /// Stop right here. No further handlers in this step or later steps run.
  Halt,
}

/// Outcome of a run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
  /// Every step that was not skipped ran to the end.
  Completed,
  /// A handler returned [`StepControl::Halt`].
  Halted,
}

impl RunOutcome {
  pub fn is_completed(self) -> bool {
    matches!(self, RunOutcome::Completed)
  }
}
