// tests/common/mod.rs
#![allow(dead_code)]

use once_cell::sync::Lazy;
use petalflow::{FlowError, Handler, Shared, StepControl};
use tracing::Level;

/// Context used across the engine tests: a bouquet being put together.
#[derive(Clone, Debug, Default)]
pub struct BouquetCtx {
  pub stems: i32,
  pub notes: String,
  pub trail: Vec<String>,
  pub halt_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("engine error: {0}")]
  Flow(String),

  #[error("handler failed: {0}")]
  Handler(String),
}

impl From<FlowError> for TestError {
  fn from(fe: FlowError) -> Self {
    TestError::Flow(format!("{:?}", fe))
  }
}

/// Handler that adds a stem, appends `note` and records `label` in the trail.
/// Halts when `halt_at` names this label.
pub fn add_stem(label: &'static str, note: &'static str) -> Handler<BouquetCtx, TestError> {
  Box::new(move |ctx: Shared<BouquetCtx>| {
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.stems += 1;
      guard.notes.push_str(note);
      guard.trail.push(label.to_string());
      tracing::debug!(target: "test_handlers", label, stems = guard.stems, "stem added");
      if guard.halt_at.as_deref() == Some(label) {
        return Ok(StepControl::Halt);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn failing(label: &'static str, message: &'static str) -> Handler<BouquetCtx, TestError> {
  Box::new(move |ctx: Shared<BouquetCtx>| {
    Box::pin(async move {
      ctx.write().trail.push(label.to_string());
      tracing::warn!(target: "test_handlers", label, "failing with '{}'", message);
      Err(TestError::Handler(message.to_string()))
    })
  })
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
