//! Core traits for pbxgraft
//!
//! Behaviors shared by the graph container and its objects: integrity
//! validation and the display names used for lookups and reference
//! comments.

use crate::error::PbxResult;

// ============================================================================
// Validatable Trait
// ============================================================================

/// Trait for types that can be validated
///
/// Types implementing this trait can check their internal consistency
/// and return an error describing the first violated invariant.
///
/// # Example
///
/// ```rust,ignore
/// use pbxgraft_core::{PbxError, PbxResult, Validatable};
///
/// struct Group {
///     children: Vec<String>,
/// }
///
/// impl Validatable for Group {
///     fn validate(&self) -> PbxResult<()> {
///         let mut seen = std::collections::HashSet::new();
///         for child in &self.children {
///             if !seen.insert(child) {
///                 return Err(PbxError::integrity(format!("duplicate child {}", child)));
///             }
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Validatable {
    /// Validate the current state of the object
    ///
    /// Returns `Ok(())` if valid, or a `PbxError` describing the problem.
    fn validate(&self) -> PbxResult<()>;

    /// Check if the object is valid without returning error details
    fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Get all validation errors (for types that can have multiple errors)
    fn validation_errors(&self) -> Vec<String> {
        match self.validate() {
            Ok(()) => vec![],
            Err(e) => vec![e.to_string()],
        }
    }
}

// ============================================================================
// Named Trait
// ============================================================================

/// Trait for graph objects that carry a human-readable name
///
/// Names are fixed at creation; lookups by name are exact and
/// case-sensitive.
pub trait Named {
    /// Get the name, if the object has one
    fn display_name(&self) -> Option<&str>;

    /// Check if the name matches exactly
    fn name_matches(&self, other: &str) -> bool {
        self.display_name() == Some(other)
    }
}

// ============================================================================
// Tests
// ============================================================================
