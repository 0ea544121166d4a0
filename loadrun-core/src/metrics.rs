/// Metric names for a single transaction, produced by `#[transaction]`.
#[derive(Copy, Clone, Debug)]
pub struct TransactionLabels {
    pub name: &'static str,
    pub success: &'static str,
    pub error: &'static str,
    pub latency: &'static str,
}

/// Counter of checks, labelled with `check` and `result`.
pub const CHECKS_METRIC: &str = "loadrun_checks";

/// Counter of completed iterations.
pub const ITERATIONS_METRIC: &str = "loadrun_iterations";

/// Gauge of running VUs.
pub const VUS_METRIC: &str = "loadrun_vus";

#[macro_export]
macro_rules! generate_labels {
    ($base_name:expr) => {
        ::loadrun::core::TransactionLabels {
            name: stringify!($base_name),
            success: concat!("loadrun_", stringify!($base_name), "_success"),
            error: concat!("loadrun_", stringify!($base_name), "_error"),
            latency: concat!("loadrun_", stringify!($base_name), "_latency"),
        }
    };
}
