//! Operating system and CPU architecture selection for bottle downloads.
//!
//! `--os` and `--arch` pick which platform's bottle the package manager
//! fetches. Either may be `all`, which expands to every known value;
//! combinations that never ship bottles are then dropped.

use std::sync::LazyLock;

use regex::Regex;

/// Selector value that expands to every known OS or architecture.
pub const ALL: &str = "all";

/// Every OS a bottle can be simulated for, newest macOS first.
pub const OS_OPTIONS: [&str; 8] = [
    "tahoe", "sequoia", "sonoma", "ventura", "monterey", "big_sur", "catalina", "linux",
];

/// Every CPU architecture a bottle can be simulated for.
pub const ARCH_OPTIONS: [&str; 2] = ["intel", "arm"];

/// macOS releases that predate ARM hardware.
const PRE_ARM_MACOS: [&str; 1] = ["catalina"];

/// One OS/architecture pair; `None` means the host's own value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct OsArch {
    pub os: Option<String>,
    pub arch: Option<String>,
}

impl OsArch {
    /// Whether bottles can exist for this pair. Host values always pass.
    pub fn is_valid(&self) -> bool {
        match (self.os.as_deref(), self.arch.as_deref()) {
            (Some(os), Some("arm")) => os != "linux" && !PRE_ARM_MACOS.contains(&os),
            _ => true,
        }
    }
}

fn expand(selector: Option<&str>, options: &[&str]) -> Vec<Option<String>> {
    match selector {
        None => vec![None],
        Some(ALL) => options.iter().map(|o| Some((*o).to_string())).collect(),
        Some(value) => vec![Some(value.to_string())],
    }
}

/// Every OS/architecture pair selected by `os` and `arch`.
///
/// With neither given this is the single host pair. Invalid pairs are
/// dropped only when one side was `all`; an explicit pair is passed
/// through for the package manager to judge.
pub fn os_arch_combinations(os: Option<&str>, arch: Option<&str>) -> Vec<OsArch> {
    let skip_invalid = os == Some(ALL) || arch == Some(ALL);
    let archs = expand(arch, &ARCH_OPTIONS);

    expand(os, &OS_OPTIONS)
        .into_iter()
        .flat_map(|os| {
            archs.iter().map(move |arch| OsArch {
                os: os.clone(),
                arch: arch.clone(),
            })
        })
        .filter(|pair| !skip_invalid || pair.is_valid())
        .collect()
}

static UNAVAILABLE_BOTTLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)bottle for tag \S+ is unavailable|no bottle available")
        .expect("static unavailable-bottle pattern")
});

/// Whether package manager output reports that no bottle exists for the
/// requested tag.
pub fn reports_unavailable_bottle(output: &str) -> bool {
    UNAVAILABLE_BOTTLE.is_match(output)
}
