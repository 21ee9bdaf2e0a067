//! # pbxgraft Template
//!
//! Prepares the files of an app extension before they are grafted into the
//! Xcode project.
//!
//! ## Features
//!
//! - **Substitution**: literal placeholder tokens such as
//!   `__BUNDLE_IDENTIFIER__` replaced with resolved values
//! - **Preferences**: values from `KEY=VALUE` arguments or `config.xml`,
//!   and the host app's identity from its `Info.plist`
//! - **Staging**: template folder copy and discovery of the staged files
//!

// ============================================================================
// Modules
// ============================================================================

pub mod preferences;
pub mod staging;
pub mod substitution;

// ============================================================================
// Re-exports
// ============================================================================

pub use preferences::{BUNDLE_SUFFIX, HostPlist, Preferences, placeholders};
pub use staging::{CopySummary, copy_template_dir, discover_extension_files, preprocess_in_place};
pub use substitution::{Substitution, lookup, missing_values, substitute};
