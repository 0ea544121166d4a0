//! A small load testing host.
//!
//! Scenarios are async functions annotated with [`#[scenario]`](loadrun_macros::scenario); each
//! virtual user (VU) calls the function in a loop. HTTP calls or other units of work are wrapped
//! with [`#[transaction]`](loadrun_macros::transaction) so their latency and outcome are recorded,
//! and responses are asserted with [`check`].
//!
//! ```no_run
//! use loadrun::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let stats = my_scenario()
//!         .stages(vec![
//!             Stage::new(Duration::from_secs(60), 50),
//!             Stage::new(Duration::from_secs(60), 0),
//!         ].into())
//!         .await
//!         .unwrap();
//!     println!("{stats}");
//! }
//!
//! #[scenario]
//! async fn my_scenario() {
//!     let _ = my_call().await;
//! }
//!
//! #[transaction]
//! async fn my_call() -> Result<(), std::io::Error> {
//!     Ok(())
//! }
//! ```

extern crate self as loadrun;

pub mod scenario;
#[doc(hidden)]
pub mod transaction;

pub(crate) mod measurement;
pub(crate) mod sampler;
pub(crate) mod thresholds;

pub use loadrun_core as core;
pub use loadrun_macros::{scenario, transaction};
pub use scenario::Scenario;
pub use transaction::{check, current_vu};

pub mod prelude {
    pub use crate::scenario::{ConfigurableScenario, RunResult};
    pub use crate::transaction::{check, current_vu};
    pub use loadrun_core::{
        ConfigError, LoadProfile, RunStatistics, Stage, ThresholdMetric, Thresholds,
    };
    pub use loadrun_macros::{scenario, transaction};
}
