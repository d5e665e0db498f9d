//! Configuration schema types for `extbuild.toml`
//!
//! Defines the project layout, payload filter, external tool names and
//! distribution targets. Every section is optional; the defaults describe the
//! standard extension layout:
//!
//! ```text
//! src/extension/          raw payload (manifest, background, content scripts)
//! src/main/main.ts        bundle entry
//! src/main/styles/        stylesheet entry (main.scss)
//! build/                  compiled output
//! dist/chromium/          unpatched distribution
//! dist/firefox/           patched distribution
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Source and working directory layout section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Raw extension payload copied verbatim into the build root
    #[serde(default = "default_extension")]
    pub extension: PathBuf,
    /// Script entry point handed to the bundler
    #[serde(default = "default_entry")]
    pub entry: PathBuf,
    /// Stylesheet entry point handed to the style compiler
    #[serde(default = "default_styles")]
    pub styles: PathBuf,
    /// Directory watched for changes in watch mode
    #[serde(default = "default_watch")]
    pub watch: PathBuf,
    /// Build output root
    #[serde(default = "default_build")]
    pub build: PathBuf,
    /// Scratch root, created for the duration of a build
    #[serde(default = "default_temp")]
    pub temp: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            entry: default_entry(),
            styles: default_styles(),
            watch: default_watch(),
            build: default_build(),
            temp: default_temp(),
        }
    }
}

fn default_extension() -> PathBuf {
    PathBuf::from("src/extension")
}

fn default_entry() -> PathBuf {
    PathBuf::from("src/main/main.ts")
}

fn default_styles() -> PathBuf {
    PathBuf::from("src/main/styles/main.scss")
}

fn default_watch() -> PathBuf {
    PathBuf::from("src/main")
}

fn default_build() -> PathBuf {
    PathBuf::from("build")
}

fn default_temp() -> PathBuf {
    PathBuf::from("temp")
}

/// Payload copy section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadConfig {
    /// Top-level payload entries starting with this prefix are not copied
    #[serde(default = "default_exclude_prefix")]
    pub exclude_prefix: String,
}

impl Default for PayloadConfig {
    fn default() -> Self {
        Self { exclude_prefix: default_exclude_prefix() }
    }
}

fn default_exclude_prefix() -> String {
    "External_Modules".to_string()
}

/// External tool executables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Sass compiler executable
    #[serde(default = "default_sass")]
    pub sass: String,
    /// esbuild executable
    #[serde(default = "default_esbuild")]
    pub esbuild: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self { sass: default_sass(), esbuild: default_esbuild() }
    }
}

fn default_sass() -> String {
    "sass".to_string()
}

fn default_esbuild() -> String {
    "esbuild".to_string()
}

/// A single distribution target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Target name (e.g. "firefox")
    pub name: String,
    /// Output root for this distribution
    pub out: PathBuf,
    /// Whether the vendor-prefix patch pass runs over this tree
    #[serde(default)]
    pub patch: bool,
}

fn default_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig {
            name: "chromium".to_string(),
            out: PathBuf::from("dist/chromium"),
            patch: false,
        },
        TargetConfig { name: "firefox".to_string(), out: PathBuf::from("dist/firefox"), patch: true },
    ]
}

/// Complete extbuild.toml configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Directory layout
    #[serde(default)]
    pub paths: PathsConfig,
    /// Payload copy settings
    #[serde(default)]
    pub payload: PayloadConfig,
    /// External tool names
    #[serde(default)]
    pub tools: ToolsConfig,
    /// Distribution targets, in fan-out order
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            payload: PayloadConfig::default(),
            tools: ToolsConfig::default(),
            targets: default_targets(),
        }
    }
}

/// Configuration validation error
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    /// Path to the invalid field (e.g., "targets.firefox.out")
    pub field: String,
    /// Error message
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "extbuild.toml: '{}' {}", self.field, self.message)
    }
}

impl BuilderConfig {
    /// Validate the configuration and return any errors.
    ///
    /// Relative paths are checked against each other only; use
    /// [`validate_in`](Self::validate_in) to also check them against the
    /// directory they resolve from.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        self.validate_in(Path::new(""))
    }

    /// Validate the configuration with relative paths resolved against
    /// `base_dir`.
    ///
    /// The build, temp and target roots are wiped on every build, so none of
    /// them may overlap each other, the base directory or a source path.
    pub fn validate_in(&self, base_dir: &Path) -> Vec<ConfigValidationError> {
        let mut errors = Vec::new();

        if self.payload.exclude_prefix.is_empty() {
            errors.push(ConfigValidationError {
                field: "payload.exclude_prefix".to_string(),
                message: "must be a non-empty string".to_string(),
            });
        }

        if self.targets.is_empty() {
            errors.push(ConfigValidationError {
                field: "targets".to_string(),
                message: "must contain at least one distribution target".to_string(),
            });
        }

        let mut names = HashSet::new();
        for (i, target) in self.targets.iter().enumerate() {
            if target.name.is_empty() {
                errors.push(ConfigValidationError {
                    field: format!("targets[{}].name", i),
                    message: "must be a non-empty string".to_string(),
                });
            } else if !names.insert(target.name.as_str()) {
                errors.push(ConfigValidationError {
                    field: format!("targets.{}", target.name),
                    message: "is defined more than once".to_string(),
                });
            }
        }

        self.validate_roots(base_dir, &mut errors);
        errors
    }

    fn validate_roots(&self, base_dir: &Path, errors: &mut Vec<ConfigValidationError>) {
        let resolve = |path: &Path| normalize_path(&base_dir.join(path));
        let base = normalize_path(base_dir);

        let mut roots = vec![
            ("paths.build".to_string(), resolve(&self.paths.build)),
            ("paths.temp".to_string(), resolve(&self.paths.temp)),
        ];
        roots.extend(
            self.targets.iter().map(|t| (format!("targets.{}.out", t.name), resolve(&t.out))),
        );

        let sources = [
            ("paths.extension", resolve(&self.paths.extension), true),
            ("paths.watch", resolve(&self.paths.watch), true),
            ("paths.entry", resolve(&self.paths.entry), false),
            ("paths.styles", resolve(&self.paths.styles), false),
        ];

        for (i, (field, root)) in roots.iter().enumerate() {
            if base.starts_with(root) {
                errors.push(ConfigValidationError {
                    field: field.clone(),
                    message: "must not be the project directory or one of its parents"
                        .to_string(),
                });
                continue;
            }

            for (source_field, source, is_dir) in &sources {
                if source.starts_with(root) {
                    errors.push(ConfigValidationError {
                        field: field.clone(),
                        message: format!("must not contain {}", source_field),
                    });
                } else if *is_dir && root.starts_with(source) {
                    errors.push(ConfigValidationError {
                        field: field.clone(),
                        message: format!("must not be inside {}", source_field),
                    });
                }
            }

            for (other_field, other) in roots[..i].iter().filter(|(_, o)| !base.starts_with(o)) {
                let message = if root == other {
                    format!("is the same directory as {}", other_field)
                } else if root.starts_with(other) {
                    format!("must not be inside {}", other_field)
                } else if other.starts_with(root) {
                    format!("must not contain {}", other_field)
                } else {
                    continue;
                };
                errors.push(ConfigValidationError { field: field.clone(), message });
            }
        }
    }

    /// Check if validation passed
    pub fn is_valid(&self) -> bool {
        self.validate().is_empty()
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component where there is one.
///
/// The filesystem is not consulted, so paths that do not exist yet (and
/// symlinks) are compared as written.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}
