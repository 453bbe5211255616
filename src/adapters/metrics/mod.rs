//! Metrics Adapters
//!
//! Prometheus run counters exported through the node-exporter
//! textfile collector.

pub mod prometheus;

pub use prometheus::RunMetrics;
