//! Build-provenance attestation results.
//!
//! `gh attestation verify --format json` prints an array of verification
//! results. Any entry means the bottle carries a valid attestation from
//! the signing repository.

use serde::{Deserialize, Serialize};

/// Default repository whose workflow signs core bottles.
pub const DEFAULT_SIGNING_REPO: &str = "Homebrew/homebrew-core";

/// Outcome of checking a single bottle's attestation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AttestationOutcome {
    /// At least one attestation verified against the signing repository.
    Verified {
        attestations: Vec<serde_json::Value>,
    },
    /// The verifier ran cleanly but returned no attestations.
    Unverified,
    /// The verifier exited non-zero (no attestation, or tool failure).
    CommandFailed { exit_code: Option<i32> },
    /// The verifier's stdout was not a JSON array.
    MalformedOutput { message: String },
}

impl AttestationOutcome {
    /// Interpret the verifier's exit code and stdout.
    pub fn from_output(success: bool, exit_code: Option<i32>, stdout: &str) -> Self {
        if !success {
            return Self::CommandFailed { exit_code };
        }

        match serde_json::from_str::<Vec<serde_json::Value>>(stdout) {
            Ok(attestations) if attestations.is_empty() => Self::Unverified,
            Ok(attestations) => Self::Verified { attestations },
            Err(e) => Self::MalformedOutput {
                message: format!("Failed to parse JSON: {e}"),
            },
        }
    }

    /// Stable snake_case label, matching the serialized `status` tag.
    pub const fn status(&self) -> &'static str {
        match self {
            Self::Verified { .. } => "verified",
            Self::Unverified => "unverified",
            Self::CommandFailed { .. } => "command_failed",
            Self::MalformedOutput { .. } => "malformed_output",
        }
    }

    pub const fn is_verified(&self) -> bool {
        matches!(self, Self::Verified { .. })
    }
}

impl std::fmt::Display for AttestationOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Verified { attestations } => {
                write!(f, "verified ({} attestation(s))", attestations.len())
            }
            Self::Unverified => write!(f, "unverified"),
            Self::CommandFailed { exit_code: Some(code) } => {
                write!(f, "command failed with status {code}")
            }
            Self::CommandFailed { exit_code: None } => {
                write!(f, "command terminated by signal")
            }
            Self::MalformedOutput { message } => write!(f, "malformed output: {message}"),
        }
    }
}

/// Attestation result for one bottle file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BottleAttestation {
    /// Formula the bottle belongs to, when resolved through the package manager.
    pub formula: Option<String>,
    /// Bottle tag used to resolve the bottle, if any.
    pub bottle_tag: Option<String>,
    /// Simulated OS the bottle was fetched for, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    /// Simulated CPU architecture the bottle was fetched for, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arch: Option<String>,
    /// Local path of the bottle tarball that was checked.
    pub path: String,
    pub outcome: AttestationOutcome,
}
