//! Iterative multi-stage code review loop.
//!
//! This crate implements a fixed pipeline of five analysis stages (parser,
//! detector, explainer, guide, refiner) plus a controller, looped over an
//! append-only transcript until a configured cycle limit is reached. The
//! architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (state record, controller,
//!   invariants). No I/O, fully testable in isolation.
//! - **[`stages`]**: The content stages; pluggable behind the [`stages::Stage`]
//!   trait so deterministic fakes can replace the text-generation backend.
//! - **[`io`]**: Side-effecting operations (config, HTTP generation,
//!   transcript artifacts). Isolated to enable mocking in tests.
//!
//! [`session`] coordinates core logic with the stages to implement one
//! end-to-end review session.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod samples;
pub mod session;
pub mod stages;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
