mod config;
mod constants;
mod metrics;
mod profile;
mod stats;
mod threshold;

pub use config::*;
pub use constants::*;
pub use metrics::*;
pub use profile::*;
pub use stats::*;
pub use threshold::*;
