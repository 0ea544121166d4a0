//! Load test of the MediCare Call API.
//!
//! A run refreshes the session once, then every VU repeatedly walks the [`journey`] of
//! read endpoints with a pause after each call and a random pause after each pass. Latency
//! and error-rate thresholds decide whether the run passes.

pub mod client;
pub mod config;
pub mod error;
pub mod journey;
pub mod payload;
pub mod scenario;
pub mod session;
pub mod setup;

pub use client::{ApiClient, IterationState, RequestResult};
pub use config::Cli;
pub use error::{SetupError, StepError};
pub use journey::{Endpoint, Journey, Step, JOURNEY};
pub use scenario::{medicall_journey, run, run_iteration, IterationContext, IterationReport};
pub use session::SessionContext;
pub use setup::refresh_session;
