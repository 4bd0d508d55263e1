pub mod log;
pub mod metrics;

pub use self::log::TaskLog;
pub use self::metrics::{MetricsSnapshot, PollMetrics};
