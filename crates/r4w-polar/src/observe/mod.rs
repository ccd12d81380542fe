//! # Observability
//!
//! Construction code reports through `tracing` events only:
//!
//! | Level | Event |
//! |-------|-------|
//! | `debug` | per-estimator block size, SNR and distinct score count |
//! | `info` | Bhattacharyya domain selected by the combiner |
//! | `warn` | Gaussian Approximation fallbacks, combiner resolution loss |
//!
//! Nothing is printed unless a subscriber is installed; binaries call
//! [`init_logging`] once at startup.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat, LogLevel};
