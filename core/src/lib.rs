// petalflow/src/lib.rs

//! petalflow: a small asynchronous step-pipeline engine.
//!
//! A pipeline is an ordered list of named steps. Each step can carry
//! `before`, `on` and `after` handlers that receive the shared run context
//! and decide whether the run continues or halts:
//!  - Steps run strictly in declaration order, one handler at a time.
//!  - A handler returning [`StepControl::Halt`] ends the run early.
//!  - Optional steps without handlers are skipped; required ones are an error.
//!  - Steps can be skipped at run time with a `skip_if` predicate.
//!  - A [`FlowRegistry`] keeps one pipeline per context type and dispatches by type.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::control::{RunOutcome, StepControl};
pub use crate::core::handler::Handler;
pub use crate::core::shared::Shared;
pub use crate::core::step::{SkipIf, StepDef};

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{FlowError, FlowResult};

pub use crate::registry::FlowRegistry;

/*
    Typical use:
    1. Define a context struct for the flow, e.g. `CheckoutCtx`.
    2. Declare `Pipeline::<CheckoutCtx, AppError>::new(&[("validate", false, None), ...])`.
    3. Attach handlers with `.on("validate", |ctx: Shared<CheckoutCtx>| Box::pin(async move { ... }))`.
    4. Register it: `registry.register(pipeline)`.
    5. Run: `registry.run(Shared::new(ctx)).await`, then read results back out of the `Shared`.
*/
