//! Script bundling stage.
//!
//! Bundles exactly one entry script and its static import graph into a single
//! output file. Unlike the style stage, a bundling failure aborts the build.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Command, ExitStatus};
use thiserror::Error;

/// Error bundling the entry script.
#[derive(Debug, Error)]
pub enum BundleError {
    /// The bundler executable could not be started
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The bundler exited with a failure status
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed { program: String, status: ExitStatus, stderr: String },
    /// The bundler reported success but no output file exists
    #[error("bundler produced no output at {}", .0.display())]
    MissingOutput(PathBuf),
    /// Any other bundler failure
    #[error("{0}")]
    Other(String),
}

/// Target runtime for the bundle.
///
/// Extensions only ever run in the browser.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Platform {
    #[default]
    Browser,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Browser => "browser",
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options handed to a [`Bundler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleOptions {
    /// Entry script
    pub entry: PathBuf,
    /// Output file
    pub outfile: PathBuf,
    /// Inline the static import graph
    pub bundle: bool,
    /// Target runtime
    pub platform: Platform,
    /// Minify the output
    pub minify: bool,
}

impl BundleOptions {
    /// Options for a browser bundle of `entry` written to `outfile`.
    pub fn browser(entry: impl Into<PathBuf>, outfile: impl Into<PathBuf>, minify: bool) -> Self {
        Self {
            entry: entry.into(),
            outfile: outfile.into(),
            bundle: true,
            platform: Platform::Browser,
            minify,
        }
    }
}

/// Bundles an entry script into an output file on disk.
pub trait Bundler: Send + Sync {
    fn bundle(&self, options: &BundleOptions) -> Result<(), BundleError>;
}

/// Runs the external `esbuild` executable.
#[derive(Debug, Clone)]
pub struct EsbuildCli {
    program: String,
}

impl EsbuildCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Command-line arguments for a set of options.
    pub fn args(options: &BundleOptions) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![options.entry.clone().into_os_string()];
        if options.bundle {
            args.push("--bundle".into());
        }
        args.push(format!("--platform={}", options.platform).into());

        let mut outfile = OsString::from("--outfile=");
        outfile.push(&options.outfile);
        args.push(outfile);

        if options.minify {
            args.push("--minify".into());
        }
        args
    }
}

impl Default for EsbuildCli {
    fn default() -> Self {
        Self::new("esbuild")
    }
}

impl Bundler for EsbuildCli {
    fn bundle(&self, options: &BundleOptions) -> Result<(), BundleError> {
        let output = Command::new(&self.program)
            .args(Self::args(options))
            .output()
            .map_err(|source| BundleError::Spawn { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(BundleError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !options.outfile.is_file() {
            return Err(BundleError::MissingOutput(options.outfile.clone()));
        }
        Ok(())
    }
}
