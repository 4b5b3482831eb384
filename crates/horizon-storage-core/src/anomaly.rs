//! Non-fatal anomaly reporting.
//!
//! An anomaly is a recoverable condition that most likely indicates a caller
//! mistake, for example removing an item that is not stored. Anomalies never
//! change control flow: the operation that detected one carries on (or turns
//! into a no-op) and the anomaly is handed to an [`AnomalyHandler`].
//!
//! By default a handler logs every anomaly's [`Anomaly::debug_description`]
//! at `warn` level. Additional actions can be attached through
//! [`AnomalyHandler::connect`], and anomalies can be silenced individually or
//! by predicate.
//!
//! ```
//! use horizon_storage_core::{Anomaly, AnomalyHandler};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum QueueAnomaly {
//!     Overflow(usize),
//! }
//!
//! impl Anomaly for QueueAnomaly {
//!     fn debug_description(&self) -> String {
//!         match self {
//!             QueueAnomaly::Overflow(n) => format!("queue overflow by {n}"),
//!         }
//!     }
//! }
//!
//! let handler = AnomalyHandler::<QueueAnomaly>::new();
//! handler.silence_anomalies(|a| matches!(a, QueueAnomaly::Overflow(n) if *n < 3));
//! assert!(!handler.report_anomaly(QueueAnomaly::Overflow(1)));
//! assert!(handler.report_anomaly(QueueAnomaly::Overflow(5)));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;

use crate::logging::targets;
use crate::signal::{ConnectionId, Signal};

/// A recoverable diagnostic condition.
pub trait Anomaly: fmt::Debug + Clone + PartialEq + Send + Sync + 'static {
    /// Human-readable description of the anomaly.
    fn debug_description(&self) -> String;
}

type SilencePredicate<A> = Box<dyn Fn(&A) -> bool + Send + Sync>;

/// Routes anomalies to logging and to connected actions.
pub struct AnomalyHandler<A: Anomaly> {
    /// Emitted for every anomaly that is not silenced.
    pub anomaly_reported: Signal<A>,
    silenced: RwLock<Vec<SilencePredicate<A>>>,
    log_reports: AtomicBool,
}

impl<A: Anomaly> Default for AnomalyHandler<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A: Anomaly> AnomalyHandler<A> {
    /// Create a handler that logs anomalies and silences nothing.
    pub fn new() -> Self {
        Self {
            anomaly_reported: Signal::new(),
            silenced: RwLock::new(Vec::new()),
            log_reports: AtomicBool::new(true),
        }
    }

    /// Attach an action invoked for every anomaly that is not silenced.
    pub fn connect<F>(&self, action: F) -> ConnectionId
    where
        F: Fn(&A) + Send + Sync + 'static,
    {
        self.anomaly_reported.connect(action)
    }

    /// Enable or disable the built-in `warn` log line.
    pub fn set_logging_enabled(&self, enabled: bool) {
        self.log_reports.store(enabled, Ordering::SeqCst);
    }

    /// Silence every future report equal to `anomaly`.
    pub fn silence_anomaly(&self, anomaly: A) {
        self.silence_anomalies(move |reported| *reported == anomaly);
    }

    /// Silence every future report for which `predicate` returns `true`.
    pub fn silence_anomalies<F>(&self, predicate: F)
    where
        F: Fn(&A) -> bool + Send + Sync + 'static,
    {
        self.silenced.write().push(Box::new(predicate));
    }

    /// Drop every silencing rule.
    pub fn clear_silenced(&self) {
        self.silenced.write().clear();
    }

    /// Check whether `anomaly` would be silenced.
    pub fn is_silenced(&self, anomaly: &A) -> bool {
        self.silenced.read().iter().any(|predicate| predicate(anomaly))
    }

    /// Report an anomaly.
    ///
    /// Returns `true` if the anomaly was delivered, `false` if it was silenced.
    pub fn report_anomaly(&self, anomaly: A) -> bool {
        if self.is_silenced(&anomaly) {
            tracing::trace!(target: targets::ANOMALY, ?anomaly, "anomaly silenced");
            return false;
        }
        if self.log_reports.load(Ordering::SeqCst) {
            tracing::warn!(target: targets::ANOMALY, "{}", anomaly.debug_description());
        }
        self.anomaly_reported.emit(anomaly);
        true
    }
}

impl<A: Anomaly> fmt::Debug for AnomalyHandler<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnomalyHandler")
            .field("actions", &self.anomaly_reported.connection_count())
            .field("silencing_rules", &self.silenced.read().len())
            .finish()
    }
}
