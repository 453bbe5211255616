//! Domain layer - bottle, formula and provenance models.
//!
//! Pure parsing and bookkeeping: nothing here spawns a process or
//! touches the filesystem. Adapters feed raw tool output in, use cases
//! act on what comes out.

pub mod attestation;
pub mod checkpoint;
pub mod formula;
pub mod platform;
pub mod tag_list;
pub mod tarball;

// Re-export core types for convenience
pub use attestation::{AttestationOutcome, BottleAttestation};
pub use checkpoint::LineWindow;
pub use formula::{BottleFile, BottleTag, FormulaRecord};
pub use platform::OsArch;
pub use tag_list::{TagLine, TagLineError};
