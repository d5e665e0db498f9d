//! Platform patch pass.
//!
//! Adapts a distribution tree to a different rendering engine's vendor-prefix
//! conventions by folding an ordered rule set over every eligible file.
//!
//! # Example
//!
//! ```ignore
//! use extbuild::patch::{PatchRuleSet, PlatformPatcher};
//!
//! let rules = PatchRuleSet::firefox();
//! let summary = PlatformPatcher::new(&rules).patch(Path::new("dist/firefox"));
//! println!("patched {} files", summary.patched);
//! ```

pub mod rules;
pub mod walker;

pub use rules::*;
pub use walker::*;
