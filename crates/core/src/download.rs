//! Locates the browser's freshly downloaded export and gives it a stable
//! name.
//!
//! The export lands on disk with a volatile, timestamp-bearing name some
//! time after the UI click, so resolution is a bounded poll over the
//! download directory rather than a single scan.

use std::path::{Path, PathBuf};
use std::time::Duration;

use regex_lite::Regex;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::error::{EkosError, Result};

/// Volatile name Ekos gives exported files.
pub const DEFAULT_EXPORT_PATTERN: &str = r"Export_\d{14}_\.csv";

#[derive(Debug, Clone)]
pub struct ResolveOptions {
    /// How long to keep polling for a matching file.
    pub timeout: Duration,
    /// Delay between directory scans.
    pub poll_interval: Duration,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ResolveOptions {
    /// Scan the directory exactly once and fail immediately on no match.
    pub fn one_shot() -> Self {
        Self {
            timeout: Duration::ZERO,
            ..Self::default()
        }
    }
}

/// Polls `dir` until an entry whose name matches `pattern` (anchored at the
/// start of the name) appears, renames it to `target_name` in place, and
/// returns the new path. Fails with [`EkosError::ArtifactNotFound`] once
/// the deadline passes.
///
/// When several entries match, the first one in directory-listing order is
/// renamed and the rest are left untouched; that order is OS-dependent.
pub async fn resolve(
    dir: &Path,
    pattern: &str,
    target_name: &str,
    opts: &ResolveOptions,
) -> Result<PathBuf> {
    let matcher = Regex::new(pattern).map_err(|e| EkosError::Pattern(e.to_string()))?;
    let deadline = Instant::now() + opts.timeout;

    loop {
        if let Some(found) = find_match(dir, &matcher)? {
            let target = dir.join(target_name);
            std::fs::rename(&found, &target)?;
            info!(
                target = "ekos",
                from = %found.display(),
                to = %target.display(),
                "artifact renamed"
            );
            return Ok(target);
        }

        if Instant::now() >= deadline {
            break;
        }
        debug!(target = "ekos", dir = %dir.display(), "no matching artifact yet");
        tokio::time::sleep(opts.poll_interval).await;
    }

    Err(EkosError::ArtifactNotFound {
        pattern: pattern.to_string(),
        dir: dir.to_path_buf(),
    })
}

/// Single scan of `dir` for an entry whose name matches from offset zero.
fn find_match(dir: &Path, matcher: &Regex) -> Result<Option<PathBuf>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if matcher.find(name).is_some_and(|m| m.start() == 0) {
            return Ok(Some(entry.path()));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATTERN: &str = r"Export_\d{14}\.csv";

    fn touch(dir: &Path, name: &str) {
        std::fs::write(dir.join(name), "a,b\n1,2\n").unwrap();
    }

    #[tokio::test]
    async fn renames_matching_entry_and_returns_new_path() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "Export_20240101120000.csv");

        let path = resolve(tmp.path(), PATTERN, "Weekly.csv", &ResolveOptions::one_shot())
            .await
            .unwrap();

        assert_eq!(path, tmp.path().join("Weekly.csv"));
        assert!(path.is_file());
        assert!(!tmp.path().join("Export_20240101120000.csv").exists());
    }

    #[tokio::test]
    async fn empty_directory_fails_with_artifact_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve(tmp.path(), PATTERN, "Weekly.csv", &ResolveOptions::one_shot())
            .await
            .unwrap_err();
        assert!(matches!(err, EkosError::ArtifactNotFound { .. }));
    }

    #[tokio::test]
    async fn non_matching_entries_fail_with_artifact_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "notes.txt");
        touch(tmp.path(), "Export_partial.csv");

        let err = resolve(tmp.path(), PATTERN, "Weekly.csv", &ResolveOptions::one_shot())
            .await
            .unwrap_err();
        assert!(matches!(err, EkosError::ArtifactNotFound { .. }));
    }

    #[tokio::test]
    async fn match_must_start_at_the_beginning_of_the_name() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "Re-Export_20240101120000.csv");

        let err = resolve(tmp.path(), PATTERN, "Weekly.csv", &ResolveOptions::one_shot())
            .await
            .unwrap_err();
        assert!(matches!(err, EkosError::ArtifactNotFound { .. }));
    }

    // Known limitation: with several matches, which entry gets renamed
    // depends on directory-listing order. We only guarantee exactly one is
    // consumed and the others are left alone.
    #[tokio::test]
    async fn multiple_matches_consume_exactly_one_entry() {
        let tmp = tempfile::tempdir().unwrap();
        touch(tmp.path(), "Export_20240101120000.csv");
        touch(tmp.path(), "Export_20240202130000.csv");

        let path = resolve(tmp.path(), PATTERN, "Weekly.csv", &ResolveOptions::one_shot())
            .await
            .unwrap();
        assert!(path.is_file());

        let survivors: Vec<_> = std::fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with("Export_"))
            .collect();
        assert_eq!(survivors.len(), 1);
    }

    #[tokio::test]
    async fn polling_picks_up_a_late_arriving_file() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();

        let writer = tokio::spawn({
            let dir = dir.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(150)).await;
                std::fs::write(dir.join("Export_20240101120000.csv"), "a,b\n").unwrap();
            }
        });

        let opts = ResolveOptions {
            timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
        };
        let path = resolve(&dir, PATTERN, "Weekly.csv", &opts).await.unwrap();
        writer.await.unwrap();
        assert_eq!(path, dir.join("Weekly.csv"));
    }

    #[tokio::test]
    async fn invalid_pattern_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let err = resolve(tmp.path(), r"Export_(\d{14}", "Weekly.csv", &ResolveOptions::one_shot())
            .await
            .unwrap_err();
        assert!(matches!(err, EkosError::Pattern(_)));
    }
}
