//! Core plumbing for Horizon Storage.
//!
//! This crate provides the framework-agnostic pieces that the storage crate
//! is built on:
//!
//! - **Signal/Slot System**: Type-safe notification fan-out
//! - **Anomaly Reporting**: A non-fatal diagnostic channel with silencing
//! - **Logging**: Tracing targets, span names and a timing guard
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_storage_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```

pub mod anomaly;
pub mod logging;
pub mod signal;

pub use anomaly::{Anomaly, AnomalyHandler};
pub use logging::PerfSpan;
pub use signal::{ConnectionId, Signal};
