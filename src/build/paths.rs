//! Resolved directory layout and process-wide build flags.

use crate::build::DistributionTarget;
use crate::config::BuilderConfig;
use std::path::{Path, PathBuf};

/// File name of the compiled stylesheet inside the build styles directory.
pub const STYLE_OUTPUT_NAME: &str = "main.css";

/// File name of the bundled script inside the build root.
pub const BUNDLE_OUTPUT_NAME: &str = "main.js";

/// Flags parsed once from the command line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildFlags {
    /// Minify the bundle
    pub production: bool,
    /// Build once and exit instead of watching
    pub run_once: bool,
}

/// Absolute locations of every directory and entry file the pipeline touches.
///
/// Derived once from a base directory and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSet {
    base_dir: PathBuf,
    extension_dir: PathBuf,
    entry_script: PathBuf,
    stylesheet: PathBuf,
    watch_root: PathBuf,
    build_root: PathBuf,
    build_styles: PathBuf,
    temp_root: PathBuf,
    targets: Vec<DistributionTarget>,
}

impl PathSet {
    /// Derive the layout from a base directory and a loaded configuration.
    pub fn from_config(base_dir: &Path, config: &BuilderConfig) -> Self {
        let resolve = |path: &Path| resolve_path(base_dir, path);
        let build_root = resolve(&config.paths.build);

        let targets = config
            .targets
            .iter()
            .map(|t| DistributionTarget {
                name: t.name.clone(),
                output_root: resolve(&t.out),
                needs_patch: t.patch,
            })
            .collect();

        Self {
            base_dir: base_dir.to_path_buf(),
            extension_dir: resolve(&config.paths.extension),
            entry_script: resolve(&config.paths.entry),
            stylesheet: resolve(&config.paths.styles),
            watch_root: resolve(&config.paths.watch),
            build_styles: build_root.join("styles"),
            build_root,
            temp_root: resolve(&config.paths.temp),
            targets,
        }
    }

    /// Derive the default layout from a base directory.
    pub fn new(base_dir: &Path) -> Self {
        Self::from_config(base_dir, &BuilderConfig::default())
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Raw payload tree copied into the build root.
    pub fn extension_dir(&self) -> &Path {
        &self.extension_dir
    }

    pub fn entry_script(&self) -> &Path {
        &self.entry_script
    }

    pub fn stylesheet(&self) -> &Path {
        &self.stylesheet
    }

    pub fn watch_root(&self) -> &Path {
        &self.watch_root
    }

    pub fn build_root(&self) -> &Path {
        &self.build_root
    }

    pub fn build_styles(&self) -> &Path {
        &self.build_styles
    }

    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Where the compiled stylesheet is written.
    pub fn style_output(&self) -> PathBuf {
        self.build_styles.join(STYLE_OUTPUT_NAME)
    }

    /// Where the bundled script is written.
    pub fn bundle_output(&self) -> PathBuf {
        self.build_root.join(BUNDLE_OUTPUT_NAME)
    }

    /// All distribution targets, in fan-out order.
    pub fn targets(&self) -> &[DistributionTarget] {
        &self.targets
    }

    /// Targets that go through the patch pass.
    pub fn patch_targets(&self) -> impl Iterator<Item = &DistributionTarget> {
        self.targets.iter().filter(|t| t.needs_patch)
    }
}

/// Resolve a path relative to the base directory.
///
/// Absolute paths are returned unchanged.
pub fn resolve_path(base_dir: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;

    #[test]
    fn test_default_layout() {
        let paths = PathSet::new(Path::new("/project"));

        assert_eq!(paths.base_dir(), Path::new("/project"));
        assert_eq!(paths.extension_dir(), Path::new("/project/src/extension"));
        assert_eq!(paths.entry_script(), Path::new("/project/src/main/main.ts"));
        assert_eq!(paths.stylesheet(), Path::new("/project/src/main/styles/main.scss"));
        assert_eq!(paths.watch_root(), Path::new("/project/src/main"));
        assert_eq!(paths.build_root(), Path::new("/project/build"));
        assert_eq!(paths.build_styles(), Path::new("/project/build/styles"));
        assert_eq!(paths.temp_root(), Path::new("/project/temp"));
    }

    #[test]
    fn test_output_files() {
        let paths = PathSet::new(Path::new("/project"));
        assert_eq!(paths.style_output(), PathBuf::from("/project/build/styles/main.css"));
        assert_eq!(paths.bundle_output(), PathBuf::from("/project/build/main.js"));
    }

    #[test]
    fn test_default_targets() {
        let paths = PathSet::new(Path::new("/project"));
        let targets = paths.targets();

        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0], DistributionTarget::verbatim("chromium", "/project/dist/chromium"));
        assert_eq!(targets[1], DistributionTarget::patched("firefox", "/project/dist/firefox"));

        let patched: Vec<_> = paths.patch_targets().map(|t| t.name.as_str()).collect();
        assert_eq!(patched, vec!["firefox"]);
    }

    #[test]
    fn test_absolute_config_paths_kept() {
        let mut config = BuilderConfig::default();
        config.paths.build = PathBuf::from("/var/tmp/ext-build");
        config.targets = vec![TargetConfig {
            name: "edge".to_string(),
            out: PathBuf::from("/srv/edge"),
            patch: false,
        }];

        let paths = PathSet::from_config(Path::new("/project"), &config);
        assert_eq!(paths.build_root(), Path::new("/var/tmp/ext-build"));
        assert_eq!(paths.build_styles(), Path::new("/var/tmp/ext-build/styles"));
        assert_eq!(paths.targets()[0].output_root(), Path::new("/srv/edge"));
        assert_eq!(paths.patch_targets().count(), 0);
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/project");
        assert_eq!(resolve_path(base, Path::new("/other")), PathBuf::from("/other"));
        assert_eq!(resolve_path(base, Path::new("a/b")), PathBuf::from("/project/a/b"));
    }

    #[test]
    fn test_flags_default_off() {
        let flags = BuildFlags::default();
        assert!(!flags.production);
        assert!(!flags.run_once);
    }
}
