//! Logging facilities for Horizon Storage.
//!
//! Horizon Storage uses the `tracing` crate for instrumentation. To see logs,
//! install a tracing subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt::init();
//!
//!     // Your application code...
//! }
//! ```
//!
//! Every event is emitted with one of the [`targets`], so a filter directive
//! such as `horizon_storage::memory=trace` narrows output to one subsystem.

/// Span names used throughout Horizon Storage for tracing.
pub mod span_names {
    /// A storage transaction, from start to delivery.
    pub const TRANSACTION: &str = "horizon_storage::transaction";
    /// Replay of deferred datasource updates.
    pub const DEFERRED_APPLY: &str = "horizon_storage::deferred_apply";
    /// Diff computation.
    pub const DIFF: &str = "horizon_storage::diff";
}

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core plumbing target.
    pub const CORE: &str = "horizon_storage_core";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_storage_core::signal";
    /// Anomaly reporting target.
    pub const ANOMALY: &str = "horizon_storage_core::anomaly";
    /// Generic storage target.
    pub const STORAGE: &str = "horizon_storage";
    /// Update dispatch and delivery target.
    pub const UPDATE: &str = "horizon_storage::update";
    /// Memory storage target.
    pub const MEMORY: &str = "horizon_storage::memory";
    /// Diffing and accumulation target.
    pub const DIFF: &str = "horizon_storage::diff";
    /// Change-feed adapters target.
    pub const FEED: &str = "horizon_storage::feed";
}

/// A guard that keeps a tracing span entered until dropped.
///
/// Useful for timing a group of storage operations.
#[derive(Debug)]
pub struct PerfSpan {
    #[allow(dead_code)]
    span: tracing::span::EnteredSpan,
}

impl PerfSpan {
    /// Create a new performance span.
    ///
    /// The span will be active until the guard is dropped.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!(target: "horizon_storage::perf", "perf", operation = name);
        Self {
            span: span.entered(),
        }
    }
}

/// Macros for common tracing patterns.
///
/// These are thin wrappers around the `tracing` macros with consistent
/// target naming.
#[macro_export]
macro_rules! storage_trace {
    ($($arg:tt)*) => {
        tracing::trace!(target: "horizon_storage", $($arg)*)
    };
}

#[macro_export]
macro_rules! storage_debug {
    ($($arg:tt)*) => {
        tracing::debug!(target: "horizon_storage", $($arg)*)
    };
}

#[macro_export]
macro_rules! storage_warn {
    ($($arg:tt)*) => {
        tracing::warn!(target: "horizon_storage", $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perf_span() {
        let _span = PerfSpan::new("test_operation");
    }

    #[test]
    fn test_targets_share_prefix() {
        for target in [targets::UPDATE, targets::MEMORY, targets::DIFF, targets::FEED] {
            assert!(target.starts_with(targets::STORAGE));
        }
        assert!(targets::SIGNAL.starts_with(targets::CORE));
    }
}
