//! Command-line interface implementation

use clap::Parser;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::error;

use crate::build::{BuildContext, BuildFlags, BuildPipeline};
use crate::config::load_config;
use crate::logging;
use crate::watch::{Mode, WatchController};

/// Exit codes
pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;

/// extbuild - Build a browser extension into per-engine distribution folders
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "extbuild")]
#[command(about = "Build a browser extension into per-engine distribution folders")]
#[command(version)]
pub struct Cli {
    /// Minify the bundled script
    #[arg(long)]
    pub production: bool,

    /// Build once and exit instead of watching for changes
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    pub fn flags(&self) -> BuildFlags {
        BuildFlags { production: self.production, run_once: self.once }
    }
}

/// Run the CLI
pub fn run() -> ExitCode {
    logging::init();
    let cli = Cli::parse();

    let base_dir = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            error!("Cannot determine working directory: {}", e);
            return ExitCode::from(EXIT_ERROR);
        }
    };

    ExitCode::from(run_in(&cli, &base_dir))
}

/// Run the CLI against an explicit base directory, returning the exit code.
pub fn run_in(cli: &Cli, base_dir: &Path) -> u8 {
    let config = match load_config(base_dir) {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading config: {}", e);
            return EXIT_ERROR;
        }
    };

    let context = BuildContext::from_config(base_dir, &config, cli.flags());
    let pipeline = Arc::new(BuildPipeline::with_tools(context, &config.tools));
    let controller = WatchController::new(pipeline);

    match controller.mode() {
        Mode::Once => match controller.run_once() {
            Some(report) if report.is_success() => EXIT_SUCCESS,
            _ => EXIT_ERROR,
        },
        Mode::Watch => match controller.watch() {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                error!("{}", e);
                EXIT_ERROR
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CONFIG_FILE_NAME;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_parse_no_flags() {
        let cli = Cli::try_parse_from(["extbuild"]).unwrap();
        assert_eq!(cli, Cli::default());
        assert_eq!(cli.flags(), BuildFlags::default());
    }

    #[test]
    fn test_parse_flags_any_order() {
        let a = Cli::try_parse_from(["extbuild", "--production", "--once"]).unwrap();
        let b = Cli::try_parse_from(["extbuild", "--once", "--production"]).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.flags(), BuildFlags { production: true, run_once: true });
    }

    #[test]
    fn test_parse_rejects_unknown_flag() {
        assert!(Cli::try_parse_from(["extbuild", "--watch"]).is_err());
    }

    #[test]
    fn test_invalid_config_exits_with_error() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join(CONFIG_FILE_NAME), "targets = []\n").unwrap();

        let cli = Cli { production: false, once: true };
        assert_eq!(run_in(&cli, temp.path()), EXIT_ERROR);
    }

    #[test]
    fn test_once_with_missing_bundler_exits_with_error() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("src/extension")).unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[tools]\nsass = \"extbuild-missing-sass\"\nesbuild = \"extbuild-missing-esbuild\"\n",
        )
        .unwrap();

        let cli = Cli { production: false, once: true };
        assert_eq!(run_in(&cli, temp.path()), EXIT_ERROR);
        assert!(!temp.path().join("temp").exists());
    }

    #[test]
    fn test_watch_missing_root_exits_with_error() {
        let temp = TempDir::new().unwrap();
        let cli = Cli::default();
        assert_eq!(run_in(&cli, temp.path()), EXIT_ERROR);
    }

    #[test]
    fn test_target_over_sources_is_rejected_before_staging() {
        let temp = TempDir::new().unwrap();
        let manifest = temp.path().join("src/extension/manifest.json");
        fs::create_dir_all(manifest.parent().unwrap()).unwrap();
        fs::write(&manifest, "{}").unwrap();
        fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "[[targets]]\nname = \"all\"\nout = \"src\"\n",
        )
        .unwrap();

        let cli = Cli { production: false, once: true };
        assert_eq!(run_in(&cli, temp.path()), EXIT_ERROR);
        assert_eq!(fs::read_to_string(&manifest).unwrap(), "{}");
        assert!(!temp.path().join("build").exists());
    }
}

