//! Property-Based Tests - Domain Layer Invariants
//!
//! Uses `proptest` to check the line window, tag-list parsing and
//! tarball scraping across random inputs.

use std::collections::{BTreeMap, HashSet};

use proptest::prelude::*;

use bottle_audit::domain::checkpoint::LineWindow;
use bottle_audit::domain::formula::{filter_by_names, FormulaRecord};
use bottle_audit::domain::tag_list::{TagLine, TagLineError};
use bottle_audit::domain::tarball::{
    all_cached_tarballs, artifact_glob, containing_folder, first_absolute_tarball,
    first_cached_tarball,
};

// ── Line Window Properties ──────────────────────────────────

proptest! {
    /// A window never yields more than `num_lines` lines.
    #[test]
    fn window_slice_bounded_by_batch_size(
        len in 0usize..200,
        start in 0usize..300,
        num_lines in 0usize..50,
    ) {
        let lines: Vec<usize> = (0..len).collect();
        let window = LineWindow::new(start, num_lines);
        let slice = window.slice(&lines);
        prop_assert!(slice.len() <= num_lines);
        prop_assert_eq!(window.end - window.start, num_lines);
    }

    /// The slice starts exactly at the checkpoint line when it is in range.
    #[test]
    fn window_slice_starts_at_checkpoint(
        len in 1usize..200,
        start_frac in 0.0f64..1.0,
        num_lines in 1usize..50,
    ) {
        let lines: Vec<usize> = (0..len).collect();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let start = ((len as f64) * start_frac) as usize;
        let window = LineWindow::new(start, num_lines);
        let slice = window.slice(&lines);
        prop_assert!(!window.is_exhausted(len));
        prop_assert_eq!(slice[0], start);
    }

    /// Consecutive windows tile the list without gaps or overlaps.
    #[test]
    fn consecutive_windows_cover_list(len in 0usize..120, num_lines in 1usize..20) {
        let lines: Vec<usize> = (0..len).collect();
        let mut seen = Vec::new();
        let mut start = 0;
        loop {
            let window = LineWindow::new(start, num_lines);
            if window.is_exhausted(len) {
                break;
            }
            seen.extend_from_slice(window.slice(&lines));
            start = window.end;
        }
        prop_assert_eq!(seen, lines);
    }
}

// ── Tag List Properties ─────────────────────────────────────

proptest! {
    /// Two whitespace-free tokens always parse, whatever the padding.
    #[test]
    fn tag_line_pair_parses(
        formula in "[a-z0-9@+._-]{1,24}",
        tag in "[a-z0-9_]{1,20}",
        lead in "[ \t]{0,3}",
        sep in "[ \t]{1,3}",
        trail in "[ \t\r]{0,3}",
    ) {
        let line = TagLine::parse(&format!("{lead}{formula}{sep}{tag}{trail}")).unwrap();
        prop_assert_eq!(&line.formula, &formula);
        prop_assert_eq!(&line.bottle_tag, &tag);
        prop_assert_eq!(TagLine::parse(&line.to_string()).unwrap(), line);
    }

    /// Any other field count is rejected with the count found.
    #[test]
    fn tag_line_wrong_field_count_rejected(
        fields in prop::collection::vec("[a-z]{1,8}", 1..6)
            .prop_filter("pairs are valid", |f| f.len() != 2),
    ) {
        let result = TagLine::parse(&fields.join(" "));
        prop_assert_eq!(result, Err(TagLineError::FieldCount { found: fields.len() }));
    }
}

// ── Tarball Scraping Properties ─────────────────────────────

proptest! {
    /// Scraping arbitrary output never panics and every hit is a tarball.
    #[test]
    fn scraped_tokens_are_tarballs(output in "\\PC{0,200}") {
        for token in all_cached_tarballs(&output) {
            prop_assert!(token.ends_with(".tar.gz"));
            prop_assert!(!token.chars().any(char::is_whitespace));
        }
        if let Some(path) = first_absolute_tarball(&output) {
            prop_assert!(path.starts_with('/'));
            prop_assert!(path.ends_with(".tar.gz"));
        }
    }

    /// A cache path embedded in log noise is recovered with its folder.
    #[test]
    fn embedded_cache_path_recovered(
        dirs in prop::collection::vec("[a-zA-Z0-9_-]{1,12}", 1..5),
        file in "[a-z0-9-]{1,16}",
        noise in "[a-zA-Z =>:]{0,40}",
    ) {
        let folder = format!("/{}", dirs.join("/"));
        let tarball = format!("{folder}/{file}.bottle.tar.gz");
        let output = format!("{noise}\n==> Downloading {tarball}\n{noise}");

        prop_assert_eq!(first_cached_tarball(&output), Some(tarball.as_str()));
        prop_assert_eq!(first_absolute_tarball(&output), Some(tarball.as_str()));
        prop_assert_eq!(containing_folder(&tarball), folder.clone());
        prop_assert_eq!(artifact_glob(&folder), format!("{folder}/*.tar.gz"));
    }
}

// ── Snapshot Filtering Properties ───────────────────────────

proptest! {
    /// Filtering keeps input order and only named records.
    #[test]
    fn filter_by_names_is_ordered_subset(
        all in prop::collection::btree_set("[a-z]{1,6}", 0..30),
        pick in prop::collection::vec(any::<bool>(), 30),
    ) {
        let records: Vec<FormulaRecord> = all
            .iter()
            .map(|name| FormulaRecord { name: name.clone(), bottles: Some(BTreeMap::new()) })
            .collect();
        let names: HashSet<String> = all
            .iter()
            .zip(&pick)
            .filter(|(_, keep)| **keep)
            .map(|(name, _)| name.clone())
            .collect();

        let filtered = filter_by_names(&records, &names);
        prop_assert_eq!(filtered.len(), names.len());

        let expected: Vec<&String> = all.iter().filter(|n| names.contains(*n)).collect();
        let got: Vec<&String> = filtered.iter().map(|r| &r.name).collect();
        prop_assert_eq!(got, expected);
    }
}
