//! Bottle tarball path scraping.
//!
//! `brew verify` prints the cached bottle path it fetched. These helpers
//! pull that path out of stdout and turn it into the artifact glob the
//! signing workflow uploads.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

/// Any whitespace-free token ending in `.tar.gz`.
static CACHED_TARBALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+\.tar\.gz").expect("static tarball pattern"));

/// Same, but anchored on a leading `/` so relative noise is skipped.
static ABSOLUTE_TARBALL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/[^\s]+\.tar\.gz").expect("static tarball pattern"));

/// First tarball-looking token in `output`.
pub fn first_cached_tarball(output: &str) -> Option<&str> {
    CACHED_TARBALL.find(output).map(|m| m.as_str())
}

/// First absolute tarball path in `output`.
pub fn first_absolute_tarball(output: &str) -> Option<&str> {
    ABSOLUTE_TARBALL.find(output).map(|m| m.as_str())
}

/// Every tarball-looking token in `output`, in order of appearance.
pub fn all_cached_tarballs(output: &str) -> Vec<&str> {
    CACHED_TARBALL.find_iter(output).map(|m| m.as_str()).collect()
}

/// Directory holding `tarball`, as a display string.
///
/// A bare file name has an empty parent; that is returned as-is so the
/// resulting glob stays relative to the working directory.
pub fn containing_folder(tarball: &str) -> String {
    Path::new(tarball)
        .parent()
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

/// Glob matching every tarball in `folder`.
pub fn artifact_glob(folder: &str) -> String {
    format!("{folder}/*.tar.gz")
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERIFY_STDOUT: &str = "\
==> Fetching wget
==> Downloading https://ghcr.io/v2/homebrew/core/wget/manifests/1.24.5
Already downloaded: /Users/op/Library/Caches/Homebrew/downloads/abc--wget--1.24.5.arm64_sonoma.bottle.tar.gz
/Users/op/Library/Caches/Homebrew/wget--1.24.5.arm64_sonoma.bottle.tar.gz
";

    #[test]
    fn test_first_cached_tarball() {
        assert_eq!(
            first_cached_tarball(VERIFY_STDOUT),
            Some("/Users/op/Library/Caches/Homebrew/downloads/abc--wget--1.24.5.arm64_sonoma.bottle.tar.gz")
        );
    }

    #[test]
    fn test_no_tarball() {
        assert_eq!(first_cached_tarball("Error: no bottle available"), None);
        assert_eq!(first_absolute_tarball("wget.tar.gz is relative"), None);
    }

    #[test]
    fn test_absolute_skips_relative_prefix() {
        let out = "see foo.tar.gz then /tmp/cache/foo.tar.gz";
        assert_eq!(first_cached_tarball(out), Some("foo.tar.gz"));
        assert_eq!(first_absolute_tarball(out), Some("/tmp/cache/foo.tar.gz"));
    }

    #[test]
    fn test_all_cached_tarballs() {
        assert_eq!(all_cached_tarballs(VERIFY_STDOUT).len(), 2);
    }

    #[test]
    fn test_artifact_glob_from_tarball() {
        let tarball = first_cached_tarball(VERIFY_STDOUT).unwrap();
        let folder = containing_folder(tarball);
        assert_eq!(folder, "/Users/op/Library/Caches/Homebrew/downloads");
        assert_eq!(
            artifact_glob(&folder),
            "/Users/op/Library/Caches/Homebrew/downloads/*.tar.gz"
        );
    }

    #[test]
    fn test_containing_folder_of_bare_name() {
        assert_eq!(containing_folder("wget.tar.gz"), "");
    }
}
