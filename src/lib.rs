//! extbuild - Build orchestrator for cross-browser extensions
//!
//! This library provides functionality to:
//! - Stage an extension payload and compile its stylesheet and script entry
//! - Fan the build out into one distribution tree per browser engine
//! - Patch vendor-prefixed syntax in trees that target a different engine
//! - Rebuild on every change under a watched source directory

pub mod build;
pub mod cli;
pub mod config;
pub mod logging;
pub mod patch;
pub mod watch;
