//! # pbxgraft Core
//!
//! Core types, traits, and error handling for pbxgraft.
//!
//! This crate provides the foundational building blocks used throughout
//! the workspace, including:
//!
//! - **Types**: `ObjectId`, product types, file categories
//! - **Traits**: `Validatable` and `Named`
//! - **Errors**: Unified error handling with `PbxError` and `PbxResult`
//!

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use error::{PbxError, PbxResult};
pub use traits::{Named, Validatable};
pub use types::{FileCategory, ObjectId, ProductType, last_known_file_type};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
