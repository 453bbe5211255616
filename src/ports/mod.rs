//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the use cases require from the
//! outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `PackageManager`: formula catalog, bottle verify/fetch/cache lookup
//! - `AttestationVerifier`: build provenance checks on bottle files

pub mod attestation;
pub mod package_manager;

pub use attestation::AttestationVerifier;
pub use package_manager::{BottleFetch, BottleRef, CommandOutput, PackageManager};
