// tests/error_handling_tests.rs
mod common;
use common::*;
use petalflow::{FlowError, Pipeline, Shared, StepControl};
use serial_test::serial;

#[tokio::test]
#[serial]
async fn pipeline_can_use_flow_error_directly() {
  setup_tracing();
  let mut pipeline = Pipeline::<BouquetCtx, FlowError>::new(&[("task", false, None)]);
  pipeline
    .on("task", |ctx: Shared<BouquetCtx>| {
      Box::pin(async move {
        ctx.write().stems = 1;
        Ok::<StepControl, FlowError>(StepControl::Continue)
      })
    })
    .unwrap();

  let ctx = Shared::new(BouquetCtx::default());
  assert!(pipeline.run(ctx.clone()).await.is_ok());
  assert_eq!(ctx.read().stems, 1);

  let mut failing = Pipeline::<BouquetCtx, FlowError>::new(&[("fail_task", false, None)]);
  failing
    .on("fail_task", |_ctx| {
      Box::pin(async move { Err::<StepControl, _>(FlowError::Internal("deliberate".to_string())) })
    })
    .unwrap();
  match failing.run(Shared::new(BouquetCtx::default())).await {
    Err(FlowError::Internal(s)) => assert_eq!(s, "deliberate"),
    other => panic!("expected FlowError::Internal, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn anyhow_errors_from_handlers_become_handler_variant() {
  setup_tracing();
  let mut pipeline = Pipeline::<BouquetCtx, FlowError>::new(&[("task", false, None)]);
  pipeline
    .on("task", |_ctx| {
      Box::pin(async move { Err::<StepControl, _>(anyhow::anyhow!("florist unavailable")) })
    })
    .unwrap();

  match pipeline.run(Shared::new(BouquetCtx::default())).await {
    Err(FlowError::Handler { source }) => assert_eq!(source.to_string(), "florist unavailable"),
    other => panic!("expected FlowError::Handler, got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn shared_context_can_be_taken_back_after_the_run() {
  setup_tracing();
  let mut pipeline = Pipeline::<BouquetCtx, TestError>::new(&[("greens", false, None)]);
  pipeline.on_boxed("greens", add_stem("greens", "G")).unwrap();

  let ctx = Shared::new(BouquetCtx::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let extra = ctx.clone();
  let ctx = match ctx.try_into_inner() {
    None => extra,
    Some(_) => panic!("context should still be shared"),
  };
  let inner = ctx.try_into_inner().expect("last clone should unwrap");
  assert_eq!(inner.notes, "G");
}
