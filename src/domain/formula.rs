//! Formula records and bottle metadata.
//!
//! A `FormulaRecord` is the unit every pipeline step reads and writes:
//! the formula's full name plus, when bottled, the per-tag file metadata
//! reported by `brew info --json --variations`.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

/// Platform/architecture identifier of a bottle (e.g. `arm64_sonoma`).
pub type BottleTag = String;

/// Download metadata for one bottle tag.
///
/// Fields `brew` adds in future releases land in `extra`. Missing and
/// unknown keys both survive a read/write cycle untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BottleFile {
    /// Cellar the bottle was built for (`:any`, `:any_skip_relocation`, or a path).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cellar: Option<String>,
    /// Download URL of the bottle tarball.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// SHA-256 of the bottle tarball.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Any other keys present in the source JSON.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A formula as persisted in the snapshot files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormulaRecord {
    /// Fully qualified formula name.
    pub name: String,
    /// Bottle files keyed by bottle tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bottles: Option<BTreeMap<BottleTag, BottleFile>>,
}

impl FormulaRecord {
    /// Bottle tags this formula ships, in sorted order.
    pub fn bottle_tags(&self) -> impl Iterator<Item = &str> {
        self.bottles
            .iter()
            .flat_map(|files| files.keys())
            .map(String::as_str)
    }
}

// Shape of the subset of `brew info --json` we care about.

#[derive(Debug, Deserialize)]
struct BrewInfoFormula {
    full_name: String,
    #[serde(default)]
    tap: Option<String>,
    #[serde(default)]
    bottle: Option<BrewInfoBottle>,
}

#[derive(Debug, Deserialize)]
struct BrewInfoBottle {
    #[serde(default)]
    stable: Option<BrewInfoStable>,
}

#[derive(Debug, Deserialize)]
struct BrewInfoStable {
    #[serde(default)]
    files: Option<BTreeMap<BottleTag, BottleFile>>,
}

/// Extract bottle records from `brew info --json --variations` output.
///
/// Formulae outside `tap` (when given) and formulae without stable bottle
/// files are dropped.
///
/// # Errors
/// Returns the parse error if `json` is not a JSON array of formula objects.
pub fn extract_records(
    json: &str,
    tap: Option<&str>,
) -> Result<Vec<FormulaRecord>, serde_json::Error> {
    let formulae: Vec<BrewInfoFormula> = serde_json::from_str(json)?;

    Ok(formulae
        .into_iter()
        .filter(|f| tap.is_none_or(|t| f.tap.as_deref() == Some(t)))
        .filter_map(|f| {
            let files = f.bottle?.stable?.files?;
            Some(FormulaRecord {
                name: f.full_name,
                bottles: Some(files),
            })
        })
        .collect())
}

/// Keep the records whose name appears in `names`, in their original order.
pub fn filter_by_names(
    records: &[FormulaRecord],
    names: &HashSet<String>,
) -> Vec<FormulaRecord> {
    records
        .iter()
        .filter(|r| names.contains(&r.name))
        .cloned()
        .collect()
}
