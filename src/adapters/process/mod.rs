//! Process Adapters - External CLI Tools
//!
//! Implements the package manager and attestation ports by spawning
//! `brew` and `gh` through a shared, timed `ProcessRunner`.

pub mod brew;
pub mod gh;
pub mod runner;

pub use brew::BrewCli;
pub use gh::GhAttestation;
pub use runner::{CommandError, ProcessRunner};
