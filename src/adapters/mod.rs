//! Adapters Layer - Hexagonal Architecture Outer Ring
//!
//! Implements the port traits defined in `crate::ports` with concrete
//! external dependencies (subprocesses, file I/O). Each sub-module
//! groups adapters by infrastructure concern.
//!
//! Adapter categories:
//! - `process`: `brew` and `gh` CLI invocation
//! - `persistence`: snapshots, checkpoint and list files
//! - `metrics`: Prometheus run counters

pub mod metrics;
pub mod persistence;
pub mod process;
