//! Use Cases Layer - Pipeline Steps
//!
//! Orchestrates domain logic with port interfaces. Each use case is one
//! step of the operator pipeline and one CLI subcommand.
//!
//! Use cases:
//! - `FormulaFetcher`: catalog → bottle metadata snapshot
//! - `VerificationScanner`: parallel sweep for unverified formulae
//! - `filter_unverified`: snapshot subset from a name list
//! - `TarballFinder`: cached tarballs of failing bottle tags
//! - `BatchDownloader`: resumable tag-list downloads for signing
//! - `Attestor`: build provenance checks on bottles

pub mod attest;
pub mod download_batch;
pub mod fetch_formulae;
pub mod filter_unverified;
pub mod scan_unverified;
pub mod unverified_tarballs;

pub use attest::{AttestReport, AttestRequest, Attestor};
pub use download_batch::{BatchDownloader, BatchReport};
pub use fetch_formulae::{FetchReport, FormulaFetcher};
pub use filter_unverified::{filter_unverified, FilterReport};
pub use scan_unverified::{ScanReport, VerificationScanner};
pub use unverified_tarballs::{TarballFinder, UnverifiedTarballs};
