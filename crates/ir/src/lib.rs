//! # pbxgraft IR
//!
//! The object graph of an Xcode `project.pbxproj` file.
//!
//! A project file is a dictionary of objects keyed by 24-character ids,
//! with references between objects written as ids. This crate parses that
//! text into a [`ProjectGraph`], edits it, and writes it back in Xcode's
//! own layout.
//!
//! ## Core Concepts
//!
//! - **Object**: One entry of the `objects` dictionary, identified by its id
//!   and typed by its `isa` (`PBXNativeTarget`, `PBXGroup`, ...)
//! - **Group tree**: `PBXGroup` objects rooted at the project's main group;
//!   file references hang off groups
//! - **Build phase**: An ordered list of build files belonging to a target
//! - **Raw text**: Objects keep the text they were parsed from until they
//!   are edited, so untouched objects are written back unchanged
//!
//! ## Example
//!
//! ```rust,no_run
//! use pbxgraft_ir::prelude::*;
//!
//! # fn main() -> PbxResult<()> {
//! let path = "platforms/ios/HelloCordova.xcodeproj/project.pbxproj";
//! let mut graph = load_project(path)?;
//! graph.add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")?;
//! graph.find_or_create_group("ShareExtension", "CustomTemplate")?;
//! save_project(&graph, path)?;
//! # Ok(())
//! # }
//! ```

// Module declarations
pub mod mutation;
pub mod objects;
pub mod parser;
pub mod plist;
pub mod project;
pub mod serialization;
pub mod validation;

// Re-export commonly used types at crate root
pub use mutation::{AddedFile, EMBED_EXTENSIONS_PHASE, ExtensionFile, FileBatchReport};
pub use objects::{
    BuildConfiguration, BuildFile, BuildPhase, ConfigurationList, FileReference, Group, GroupKind,
    ObjectData, OtherObject, PbxObject, PhaseKind, Project, Target, TargetKind,
};
pub use parser::parse;
pub use plist::{Dict, Value};
pub use project::ProjectGraph;
pub use serialization::{
    PROJECT_BUNDLE_EXTENSION, PROJECT_FILE_NAME, backup_project, find_project_file,
    is_project_bundle, load_project, project_name, save_project, serialize, write_atomic,
};
pub use validation::{
    ValidationError, ValidationErrorCode, ValidationResult, ValidationRule, ValidationWarning,
    ValidationWarningCode, Validator, orphan_objects,
};

// Re-export core types that are commonly used with IR
pub use pbxgraft_core::{
    FileCategory, Named, ObjectId, PbxError, PbxResult, ProductType, Validatable,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// Prelude Module
// ============================================================================

/// Convenient re-exports for common usage
pub mod prelude {
    pub use crate::{
        // Files
        ExtensionFile,
        FileBatchReport,
        FileCategory,
        // Errors
        PbxError,
        PbxResult,
        // Graph
        ObjectId,
        PhaseKind,
        ProductType,
        ProjectGraph,
        // IO
        load_project,
        parse,
        save_project,
        serialize,
    };
}
