//! Stylesheet compilation stage.
//!
//! Compiles exactly one stylesheet entry into compressed CSS and writes it to
//! the build styles directory. Failures here are recovered by the pipeline:
//! a broken stylesheet does not stop the bundle from being built.

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

use crate::config::ToolsConfig;

/// Error compiling or writing a stylesheet.
#[derive(Debug, Error)]
pub enum StyleError {
    /// The compiler executable could not be started
    #[error("failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The compiler exited with a failure status
    #[error("'{program}' exited with {status}: {stderr}")]
    Failed { program: String, status: ExitStatus, stderr: String },
    /// The compiler produced non-UTF-8 output
    #[error("compiler output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    /// The stylesheet entry could not be read
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// CSS parse or print error
    #[error("invalid CSS in {}: {message}", path.display())]
    Css { path: PathBuf, message: String },
    /// The compiled stylesheet could not be written
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Compiles a stylesheet entry file into compressed CSS text.
pub trait StyleCompiler: Send + Sync {
    fn compile(&self, entry: &Path) -> Result<String, StyleError>;
}

/// Runs the external `sass` executable.
#[derive(Debug, Clone)]
pub struct SassCli {
    program: String,
}

impl SassCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Arguments passed to the compiler for an entry file.
    pub fn args(entry: &Path) -> Vec<std::ffi::OsString> {
        vec!["--style=compressed".into(), "--no-source-map".into(), entry.as_os_str().to_owned()]
    }
}

impl Default for SassCli {
    fn default() -> Self {
        Self::new("sass")
    }
}

impl StyleCompiler for SassCli {
    fn compile(&self, entry: &Path) -> Result<String, StyleError> {
        let output = Command::new(&self.program)
            .args(Self::args(entry))
            .output()
            .map_err(|source| StyleError::Spawn { program: self.program.clone(), source })?;

        if !output.status.success() {
            return Err(StyleError::Failed {
                program: self.program.clone(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8(output.stdout)?)
    }
}

/// Minifies plain CSS entries in-process.
#[derive(Debug, Clone, Copy, Default)]
pub struct LightningCss;

impl StyleCompiler for LightningCss {
    fn compile(&self, entry: &Path) -> Result<String, StyleError> {
        let source = fs::read_to_string(entry)
            .map_err(|source| StyleError::Read { path: entry.to_path_buf(), source })?;
        let css_error =
            |message: String| StyleError::Css { path: entry.to_path_buf(), message };

        let options = ParserOptions {
            filename: entry.display().to_string(),
            ..ParserOptions::default()
        };
        let mut sheet =
            StyleSheet::parse(&source, options).map_err(|e| css_error(e.to_string()))?;
        sheet.minify(MinifyOptions::default()).map_err(|e| css_error(e.to_string()))?;

        let printed = sheet
            .to_css(PrinterOptions { minify: true, ..PrinterOptions::default() })
            .map_err(|e| css_error(e.to_string()))?;
        Ok(printed.code)
    }
}

/// Pick a compiler for a stylesheet entry.
///
/// Plain `.css` entries are minified in-process; anything else goes through
/// the sass executable named in the tools config.
pub fn compiler_for(entry: &Path, tools: &ToolsConfig) -> Box<dyn StyleCompiler> {
    match entry.extension().and_then(|e| e.to_str()) {
        Some("css") => Box::new(LightningCss),
        _ => Box::new(SassCli::new(tools.sass.clone())),
    }
}

/// Compile `entry` and write the CSS to `output`.
///
/// Returns the number of bytes written.
pub fn build_styles(
    compiler: &dyn StyleCompiler,
    entry: &Path,
    output: &Path,
) -> Result<usize, StyleError> {
    let css = compiler.compile(entry)?;
    fs::write(output, &css)
        .map_err(|source| StyleError::Write { path: output.to_path_buf(), source })?;
    Ok(css.len())
}
