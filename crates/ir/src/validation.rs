//! Integrity rules for project graphs
//!
//! The parser runs [`ReferencesRule`] on every graph it builds. The full
//! [`Validator`] also checks the group tree and file bookkeeping, and backs
//! the [`Validatable`] impl of [`ProjectGraph`].

use crate::objects::ObjectData;
use crate::project::ProjectGraph;
use pbxgraft_core::{ObjectId, PbxError, PbxResult, Validatable};
use std::collections::{HashMap, HashSet};

// ============================================================================
// ValidationResult
// ============================================================================

/// Result of a validation operation
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the validation passed
    pub valid: bool,

    /// List of errors (empty if valid)
    pub errors: Vec<ValidationError>,

    /// List of warnings (non-fatal issues)
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    /// Create a successful validation result
    pub fn ok() -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create a failed validation result with an error
    pub fn error(error: ValidationError) -> Self {
        Self {
            valid: false,
            errors: vec![error],
            warnings: Vec::new(),
        }
    }

    /// Add an error to the result
    pub fn add_error(&mut self, error: ValidationError) {
        self.valid = false;
        self.errors.push(error);
    }

    /// Add a warning to the result
    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    /// Merge another validation result into this one
    pub fn merge(&mut self, other: ValidationResult) {
        if !other.valid {
            self.valid = false;
        }
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert to PbxResult (fails if any errors)
    pub fn to_result(self) -> PbxResult<()> {
        if self.valid {
            Ok(())
        } else {
            let msg = self
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            Err(PbxError::integrity(msg))
        }
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

// ============================================================================
// ValidationError / ValidationWarning
// ============================================================================

/// A violated invariant
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: ValidationErrorCode,
    pub message: String,
    /// Object the error is about, e.g. `PBXGroup 29B97314FDCFA39411CA2CEA`
    pub path: Option<String>,
}

impl ValidationError {
    pub fn new(code: ValidationErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] {}", path, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorCode {
    MissingRootObject,
    DanglingReference,
    WrongReferenceKind,
    GroupCycle,
    DuplicateChild,
    DuplicatePath,
    UnreachableFile,
}

/// A suspicious but loadable state
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub code: ValidationWarningCode,
    pub message: String,
    pub path: Option<String>,
}

impl ValidationWarning {
    pub fn new(code: ValidationWarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(path) = &self.path {
            write!(f, "[{}] Warning: {}", path, self.message)
        } else {
            write!(f, "Warning: {}", self.message)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationWarningCode {
    DuplicateTargetName,
    OrphanObject,
}

// ============================================================================
// ValidationRule Trait
// ============================================================================

/// Trait for validation rules
pub trait ValidationRule {
    /// Get the rule name
    fn name(&self) -> &'static str;

    /// Get the rule description
    fn description(&self) -> &'static str;

    /// Validate a graph and return the result
    fn validate(&self, graph: &ProjectGraph) -> ValidationResult;
}

// ============================================================================
// Validator
// ============================================================================

/// Graph validator that runs multiple validation rules
#[derive(Default)]
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create a validator with every built-in rule
    pub fn with_default_rules() -> Self {
        let mut validator = Self::new();
        validator.add_rule(Box::new(ReferencesRule));
        validator.add_rule(Box::new(GroupTreeRule));
        validator.add_rule(Box::new(FilePathsRule));
        validator.add_rule(Box::new(BuildFilesRule));
        validator.add_rule(Box::new(TargetNamesRule));
        validator
    }

    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Validate a graph with all rules
    pub fn validate(&self, graph: &ProjectGraph) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for rule in &self.rules {
            result.merge(rule.validate(graph));
        }
        result
    }

    /// Validate and return Result
    pub fn validate_result(&self, graph: &ProjectGraph) -> PbxResult<()> {
        self.validate(graph).to_result()
    }
}

impl Validatable for ProjectGraph {
    fn validate(&self) -> PbxResult<()> {
        Validator::with_default_rules().validate_result(self)
    }

    fn validation_errors(&self) -> Vec<String> {
        Validator::with_default_rules()
            .validate(self)
            .errors
            .iter()
            .map(ToString::to_string)
            .collect()
    }
}

fn object_path(graph: &ProjectGraph, id: &ObjectId) -> String {
    match graph.object(id.as_str()) {
        Some(object) => format!("{} {}", object.isa(), id),
        None => id.to_string(),
    }
}

// ============================================================================
// Built-in Validation Rules
// ============================================================================

/// Rule: every modeled reference resolves to an object of the expected kind
pub struct ReferencesRule;

impl ValidationRule for ReferencesRule {
    fn name(&self) -> &'static str {
        "references"
    }

    fn description(&self) -> &'static str {
        "Every reference names an existing object of the expected kind"
    }

    fn validate(&self, graph: &ProjectGraph) -> ValidationResult {
        let mut result = ValidationResult::ok();

        if graph.project().is_err() {
            result.add_error(ValidationError::new(
                ValidationErrorCode::MissingRootObject,
                format!("rootObject {} does not name a PBXProject", graph.root_object()),
            ));
        }

        for object in graph.objects() {
            for (field, target, kind) in object.data().references() {
                match graph.object(target.as_str()) {
                    None => result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DanglingReference,
                            format!("{} references undefined object {}", field, target),
                        )
                        .with_path(object_path(graph, object.id())),
                    ),
                    Some(referenced) if !kind.accepts(referenced.data()) => result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::WrongReferenceKind,
                            format!(
                                "{} references {} ({}), expected {}",
                                field,
                                target,
                                referenced.isa(),
                                kind.describe()
                            ),
                        )
                        .with_path(object_path(graph, object.id())),
                    ),
                    Some(_) => {}
                }
            }
        }
        result
    }
}

/// Rule: the group tree is acyclic and children are listed once
pub struct GroupTreeRule;

impl ValidationRule for GroupTreeRule {
    fn name(&self) -> &'static str {
        "group_tree"
    }

    fn description(&self) -> &'static str {
        "Groups form a tree rooted at the main group without duplicate children"
    }

    fn validate(&self, graph: &ProjectGraph) -> ValidationResult {
        let mut result = ValidationResult::ok();

        for object in graph.objects() {
            let Some(group) = object.data().as_group() else {
                continue;
            };
            let mut seen = HashSet::new();
            for child in &group.children {
                if !seen.insert(child) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DuplicateChild,
                            format!("child {} is listed more than once", child),
                        )
                        .with_path(object_path(graph, object.id())),
                    );
                }
            }
        }

        let Some(main_group) = graph.main_group() else {
            return result;
        };
        // Depth-first walk keeping the current path to spot back edges.
        let mut on_path: Vec<&ObjectId> = Vec::new();
        let mut stack: Vec<(&ObjectId, usize)> = vec![(main_group, 0)];
        let mut done: HashSet<&ObjectId> = HashSet::new();
        while let Some((id, next_child)) = stack.pop() {
            if next_child == 0 {
                on_path.push(id);
            }
            let children: Vec<&ObjectId> = graph
                .group(id.as_str())
                .map(|g| g.children.iter().filter(|c| graph.group(c.as_str()).is_some()).collect())
                .unwrap_or_default();
            match children.get(next_child) {
                Some(&child) => {
                    stack.push((id, next_child + 1));
                    if on_path.contains(&child) {
                        result.add_error(
                            ValidationError::new(
                                ValidationErrorCode::GroupCycle,
                                format!("group {} is its own ancestor", child),
                            )
                            .with_path(object_path(graph, id)),
                        );
                    } else if !done.contains(child) {
                        stack.push((child, 0));
                    }
                }
                None => {
                    on_path.pop();
                    done.insert(id);
                }
            }
        }

        let reachable: HashSet<&ObjectId> = graph.groups_preorder().into_iter().collect();
        for object in graph.objects() {
            if object.data().as_group().is_some() && !reachable.contains(object.id()) {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::OrphanObject,
                        "group is not reachable from the main group",
                    )
                    .with_path(object_path(graph, object.id())),
                );
            }
        }
        result
    }
}

/// Rule: a group holds at most one file reference per path
pub struct FilePathsRule;

impl ValidationRule for FilePathsRule {
    fn name(&self) -> &'static str {
        "file_paths"
    }

    fn description(&self) -> &'static str {
        "One file reference per path per group"
    }

    fn validate(&self, graph: &ProjectGraph) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for object in graph.objects() {
            let Some(group) = object.data().as_group() else {
                continue;
            };
            let mut paths: HashMap<&str, &ObjectId> = HashMap::new();
            for child in &group.children {
                let Some(path) = graph
                    .file_reference(child.as_str())
                    .and_then(|f| f.path.as_deref())
                else {
                    continue;
                };
                if let Some(first) = paths.insert(path, child) {
                    result.add_error(
                        ValidationError::new(
                            ValidationErrorCode::DuplicatePath,
                            format!("'{}' is referenced by both {} and {}", path, first, child),
                        )
                        .with_path(object_path(graph, object.id())),
                    );
                }
            }
        }
        result
    }
}

/// Rule: every build file's file is reachable from the group tree
pub struct BuildFilesRule;

impl ValidationRule for BuildFilesRule {
    fn name(&self) -> &'static str {
        "build_files"
    }

    fn description(&self) -> &'static str {
        "Files compiled or copied by a phase appear in the group tree"
    }

    fn validate(&self, graph: &ProjectGraph) -> ValidationResult {
        let mut result = ValidationResult::ok();
        for object in graph.objects() {
            let Some(build_file) = object.data().as_build_file() else {
                continue;
            };
            let file = build_file.file_ref.as_str();
            if graph.file_reference(file).is_some() && !graph.is_reachable(file) {
                result.add_error(
                    ValidationError::new(
                        ValidationErrorCode::UnreachableFile,
                        format!("file {} is not in any group", file),
                    )
                    .with_path(object_path(graph, object.id())),
                );
            }
        }
        result
    }
}

/// Rule: target names are unique
pub struct TargetNamesRule;

impl ValidationRule for TargetNamesRule {
    fn name(&self) -> &'static str {
        "target_names"
    }

    fn description(&self) -> &'static str {
        "Target names are unique, so lookups by name are unambiguous"
    }

    fn validate(&self, graph: &ProjectGraph) -> ValidationResult {
        let mut result = ValidationResult::ok();
        let mut seen = HashSet::new();
        for (id, target) in graph.targets() {
            if !seen.insert(target.name.as_str()) {
                result.add_warning(
                    ValidationWarning::new(
                        ValidationWarningCode::DuplicateTargetName,
                        format!("another target is already named '{}'", target.name),
                    )
                    .with_path(object_path(graph, id)),
                );
            }
        }
        result
    }
}

/// Objects nothing refers to, other than the root object
pub fn orphan_objects(graph: &ProjectGraph) -> Vec<&ObjectId> {
    let mut referenced: HashSet<&str> = HashSet::new();
    referenced.insert(graph.root_object().as_str());
    for object in graph.objects() {
        for (_, target, _) in object.data().references() {
            referenced.insert(target.as_str());
        }
        if let ObjectData::Other(other) = object.data() {
            for value in other.fields.values() {
                if let Some(s) = value.as_str() {
                    referenced.insert(s);
                }
            }
        }
    }
    graph
        .objects()
        .filter(|o| !referenced.contains(o.id().as_str()))
        .map(|o| o.id())
        .collect()
}

// ============================================================================
// Tests
// ============================================================================
