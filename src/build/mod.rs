//! Build pipeline module for extbuild
//!
//! Compiles an extension source tree into one distribution tree per browser
//! engine family.
//!
//! # Overview
//!
//! A build consists of:
//! - **Staging**: wipe and recreate the working directories
//! - **Payload**: copy the raw extension files into the build root
//! - **Styles / Bundle**: run the stylesheet compiler and the script bundler
//! - **Fan-out**: replicate the build root into every distribution target
//! - **Patch**: rewrite vendor-prefixed syntax in the targets that need it
//!
//! # Example
//!
//! ```ignore
//! use extbuild::build::{BuildContext, BuildFlags, BuildPipeline};
//! use extbuild::config::load_config;
//!
//! let config = load_config(&base_dir)?;
//! let context = BuildContext::from_config(&base_dir, &config, BuildFlags::default());
//! let pipeline = BuildPipeline::with_tools(context, &config.tools);
//!
//! if let Some(report) = pipeline.run() {
//!     println!("{}", report.summary());
//! }
//! ```

pub mod bundle;
pub mod context;
pub mod fanout;
pub mod lock;
pub mod paths;
pub mod pipeline;
pub mod result;
pub mod staging;
pub mod style;
pub mod target;

pub use bundle::*;
pub use context::*;
pub use fanout::*;
pub use lock::*;
pub use paths::*;
pub use pipeline::*;
pub use result::*;
pub use staging::*;
pub use style::*;
pub use target::*;
