//! Recursive patch pass over a distribution tree.
//!
//! Sibling entries of a directory are processed in parallel on the rayon
//! pool, and all of them finish before the directory call returns. Failures
//! are isolated: a file that cannot be read or written is logged and counted,
//! and a directory that cannot be listed only loses its own subtree.

use crate::patch::PatchRuleSet;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error};

/// File name suffixes the patch pass rewrites.
pub const PATCHABLE_SUFFIXES: &[&str] = &[".css", ".js"];

/// Error patching a single file.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    /// Rewritten on disk
    Patched,
    /// Eligible but no rule matched
    Unchanged,
    /// Extension not eligible
    Ignored,
}

/// Per-file counts for one patch pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchSummary {
    pub patched: usize,
    pub unchanged: usize,
    pub ignored: usize,
    pub failed: usize,
}

impl PatchSummary {
    fn from_outcome(outcome: FileOutcome) -> Self {
        let mut summary = Self::default();
        match outcome {
            FileOutcome::Patched => summary.patched = 1,
            FileOutcome::Unchanged => summary.unchanged = 1,
            FileOutcome::Ignored => summary.ignored = 1,
        }
        summary
    }

    fn failure() -> Self {
        Self { failed: 1, ..Self::default() }
    }

    /// Combine two summaries.
    pub fn merge(self, other: Self) -> Self {
        Self {
            patched: self.patched + other.patched,
            unchanged: self.unchanged + other.unchanged,
            ignored: self.ignored + other.ignored,
            failed: self.failed + other.failed,
        }
    }

    /// Total entries visited.
    pub fn total(&self) -> usize {
        self.patched + self.unchanged + self.ignored + self.failed
    }
}

/// Check if a file is eligible for patching.
///
/// Matches on the file name suffix, case-sensitively, so a file named just
/// `.css` is eligible too.
pub fn is_patchable(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| PATCHABLE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)))
        .unwrap_or(false)
}

/// Rewrites eligible files in a tree with a rule set.
#[derive(Debug, Clone, Copy)]
pub struct PlatformPatcher<'a> {
    rules: &'a PatchRuleSet,
}

impl<'a> PlatformPatcher<'a> {
    pub fn new(rules: &'a PatchRuleSet) -> Self {
        Self { rules }
    }

    /// Patch every eligible file under `root`.
    pub fn patch(&self, root: &Path) -> PatchSummary {
        self.patch_dir(root)
    }

    fn patch_dir(&self, dir: &Path) -> PatchSummary {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error!(dir = %dir.display(), error = %e, "failed to list directory");
                return PatchSummary::failure();
            }
        };

        let mut failures = PatchSummary::default();
        let children: Vec<PathBuf> = entries
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry.path()),
                Err(e) => {
                    error!(dir = %dir.display(), error = %e, "failed to read directory entry");
                    failures.failed += 1;
                    None
                }
            })
            .collect();

        children
            .par_iter()
            .map(|child| self.patch_entry(child))
            .reduce(PatchSummary::default, PatchSummary::merge)
            .merge(failures)
    }

    fn patch_entry(&self, path: &Path) -> PatchSummary {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => self.patch_dir(path),
            Ok(_) => match self.patch_file(path) {
                Ok(outcome) => PatchSummary::from_outcome(outcome),
                Err(e) => {
                    error!(error = %e, "failed to patch file");
                    PatchSummary::failure()
                }
            },
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to stat entry");
                PatchSummary::failure()
            }
        }
    }

    /// Patch a single file in place.
    ///
    /// The file is only written when at least one rule changed its content.
    pub fn patch_file(&self, path: &Path) -> Result<FileOutcome, PatchError> {
        if !is_patchable(path) {
            return Ok(FileOutcome::Ignored);
        }

        let text = fs::read_to_string(path)
            .map_err(|source| PatchError::Read { path: path.to_path_buf(), source })?;

        let patched = self.rules.apply(&text);
        if patched == text.as_str() {
            return Ok(FileOutcome::Unchanged);
        }

        fs::write(path, patched.as_bytes())
            .map_err(|source| PatchError::Write { path: path.to_path_buf(), source })?;
        debug!(path = %path.display(), "patched");
        Ok(FileOutcome::Patched)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(path: &Path, content: &[u8]) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_is_patchable() {
        assert!(is_patchable(Path::new("styles/main.css")));
        assert!(is_patchable(Path::new("main.js")));
        assert!(!is_patchable(Path::new("manifest.json")));
        assert!(!is_patchable(Path::new("main.ts")));
        assert!(!is_patchable(Path::new("MAIN.CSS")));
        assert!(!is_patchable(Path::new("noextension")));
        assert!(!is_patchable(Path::new("theme.scss")));
    }

    #[test]
    fn test_is_patchable_bare_suffix_names() {
        assert!(is_patchable(Path::new(".css")));
        assert!(is_patchable(Path::new("assets/.js")));
        assert!(!is_patchable(Path::new(".json")));
    }

    #[test]
    fn test_patch_file_rewrites_bare_suffix_name() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join(".css");
        fs::write(&file, "a{-webkit-box-flex:1}").unwrap();

        let rules = PatchRuleSet::firefox();
        let outcome = PlatformPatcher::new(&rules).patch_file(&file).unwrap();

        assert_eq!(outcome, FileOutcome::Patched);
        assert_eq!(fs::read_to_string(&file).unwrap(), "a{-moz-box-flex:1}");
    }

    #[test]
    fn test_patch_file_rewrites_css() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.css");
        fs::write(&file, "p{white-space:nowrap}").unwrap();

        let rules = PatchRuleSet::firefox();
        let outcome = PlatformPatcher::new(&rules).patch_file(&file).unwrap();

        assert_eq!(outcome, FileOutcome::Patched);
        assert_eq!(fs::read_to_string(&file).unwrap(), "p{white-space:pre}");
    }

    #[test]
    fn test_patch_file_ignores_other_extensions() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("page.html");
        fs::write(&file, "<p style=\"white-space:nowrap\">").unwrap();

        let rules = PatchRuleSet::firefox();
        let outcome = PlatformPatcher::new(&rules).patch_file(&file).unwrap();

        assert_eq!(outcome, FileOutcome::Ignored);
        assert_eq!(fs::read_to_string(&file).unwrap(), "<p style=\"white-space:nowrap\">");
    }

    #[test]
    fn test_patch_file_unchanged() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("main.js");
        fs::write(&file, "console.log('hi');").unwrap();

        let rules = PatchRuleSet::firefox();
        let outcome = PlatformPatcher::new(&rules).patch_file(&file).unwrap();
        assert_eq!(outcome, FileOutcome::Unchanged);
    }

    #[test]
    fn test_patch_file_invalid_utf8() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("binary.js");
        fs::write(&file, [0xff, 0xfe, 0x00]).unwrap();

        let rules = PatchRuleSet::firefox();
        let err = PlatformPatcher::new(&rules).patch_file(&file).unwrap_err();
        assert!(matches!(err, PatchError::Read { .. }));
    }

    #[test]
    fn test_patch_tree_counts_and_isolates_failures() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("main.js"), b"el.style.whiteSpace='nowrap'");
        write(&root.join("styles/main.css"), b"::-webkit-slider-thumb{}");
        write(&root.join("styles/deep/plain.css"), b"a{color:red}");
        write(&root.join("styles/deep/bad.css"), &[0xc3, 0x28]);
        write(&root.join("manifest.json"), b"{\"nowrap\": true}");
        write(&root.join("icons/icon.png"), &[0x89, b'P', b'N', b'G']);

        let rules = PatchRuleSet::firefox();
        let summary = PlatformPatcher::new(&rules).patch(root);

        assert_eq!(
            summary,
            PatchSummary { patched: 2, unchanged: 1, ignored: 2, failed: 1 }
        );
        assert_eq!(summary.total(), 6);
        assert_eq!(fs::read_to_string(root.join("main.js")).unwrap(), "el.style.whiteSpace='pre'");
        assert_eq!(
            fs::read_to_string(root.join("styles/main.css")).unwrap(),
            "::-moz-range-thumb{}"
        );
        assert_eq!(fs::read_to_string(root.join("manifest.json")).unwrap(), "{\"nowrap\": true}");
    }

    #[test]
    fn test_patch_missing_root() {
        let temp = TempDir::new().unwrap();
        let rules = PatchRuleSet::firefox();
        let summary = PlatformPatcher::new(&rules).patch(&temp.path().join("missing"));
        assert_eq!(summary.failed, 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_directory_link_only_fails_itself() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        write(&root.join("a/one.css"), b"p{white-space:nowrap}");
        write(&root.join("b/two.js"), b"s='nowrap'");
        write(&root.join("b/deeper/three.css"), b"::-webkit-scrollbar{}");
        std::os::unix::fs::symlink(root.join("missing"), root.join("b/gone")).unwrap();

        let rules = PatchRuleSet::firefox();
        let summary = PlatformPatcher::new(&rules).patch(root);

        assert_eq!(summary, PatchSummary { patched: 3, unchanged: 0, ignored: 0, failed: 1 });
        assert_eq!(fs::read_to_string(root.join("a/one.css")).unwrap(), "p{white-space:pre}");
        assert_eq!(
            fs::read_to_string(root.join("b/deeper/three.css")).unwrap(),
            "::-moz-scrollbar{}"
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_directory_skips_only_its_subtree() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let locked = root.join("locked");
        write(&root.join("ok.css"), b"p{white-space:nowrap}");
        write(&root.join("open/sub.js"), b"'nowrap'");
        write(&locked.join("inner.css"), b"p{white-space:nowrap}");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits are not enforced for root.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let rules = PatchRuleSet::firefox();
        let summary = PlatformPatcher::new(&rules).patch(root);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(summary, PatchSummary { patched: 2, unchanged: 0, ignored: 0, failed: 1 });
        assert_eq!(fs::read_to_string(root.join("open/sub.js")).unwrap(), "'pre'");
        assert_eq!(
            fs::read_to_string(locked.join("inner.css")).unwrap(),
            "p{white-space:nowrap}"
        );
    }

    #[test]
    fn test_patch_wide_tree() {
        let temp = TempDir::new().unwrap();
        for dir in 0..8 {
            for file in 0..16 {
                write(
                    &temp.path().join(format!("d{}/f{}.css", dir, file)),
                    b".x{-webkit-box-flex:1}",
                );
            }
        }

        let rules = PatchRuleSet::firefox();
        let summary = PlatformPatcher::new(&rules).patch(temp.path());

        assert_eq!(summary.patched, 128);
        assert_eq!(
            fs::read_to_string(temp.path().join("d7/f15.css")).unwrap(),
            ".x{-moz-box-flex:1}"
        );
    }

    #[test]
    fn test_summary_merge() {
        let a = PatchSummary { patched: 1, unchanged: 2, ignored: 3, failed: 4 };
        let b = PatchSummary { patched: 10, unchanged: 20, ignored: 30, failed: 40 };
        assert_eq!(a.merge(b), PatchSummary { patched: 11, unchanged: 22, ignored: 33, failed: 44 });
    }
}
