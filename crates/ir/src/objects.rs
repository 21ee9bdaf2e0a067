//! Typed project objects
//!
//! Each entry of the `objects` dictionary becomes a [`PbxObject`] whose
//! [`ObjectData`] is a typed variant when the `isa` is one the graph works
//! with, and [`ObjectData::Other`] otherwise. Fields a variant does not
//! model are kept in its `extra` dictionary and written back unchanged.

use crate::plist::{Dict, Value};
use pbxgraft_core::{Named, ObjectId, PbxError, PbxResult};
use serde::Serialize;

// ============================================================================
// Kinds
// ============================================================================

/// Kind of target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Native,
    Aggregate,
    Legacy,
}

impl TargetKind {
    pub fn isa(&self) -> &'static str {
        match self {
            TargetKind::Native => "PBXNativeTarget",
            TargetKind::Aggregate => "PBXAggregateTarget",
            TargetKind::Legacy => "PBXLegacyTarget",
        }
    }

    fn from_isa(isa: &str) -> Option<Self> {
        match isa {
            "PBXNativeTarget" => Some(TargetKind::Native),
            "PBXAggregateTarget" => Some(TargetKind::Aggregate),
            "PBXLegacyTarget" => Some(TargetKind::Legacy),
            _ => None,
        }
    }
}

/// Kind of group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKind {
    Group,
    VariantGroup,
}

impl GroupKind {
    pub fn isa(&self) -> &'static str {
        match self {
            GroupKind::Group => "PBXGroup",
            GroupKind::VariantGroup => "PBXVariantGroup",
        }
    }

    fn from_isa(isa: &str) -> Option<Self> {
        match isa {
            "PBXGroup" => Some(GroupKind::Group),
            "PBXVariantGroup" => Some(GroupKind::VariantGroup),
            _ => None,
        }
    }
}

/// Kind of build phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseKind {
    Sources,
    Resources,
    Frameworks,
    Headers,
    CopyFiles,
    ShellScript,
    Rez,
}

impl PhaseKind {
    pub fn isa(&self) -> &'static str {
        match self {
            PhaseKind::Sources => "PBXSourcesBuildPhase",
            PhaseKind::Resources => "PBXResourcesBuildPhase",
            PhaseKind::Frameworks => "PBXFrameworksBuildPhase",
            PhaseKind::Headers => "PBXHeadersBuildPhase",
            PhaseKind::CopyFiles => "PBXCopyFilesBuildPhase",
            PhaseKind::ShellScript => "PBXShellScriptBuildPhase",
            PhaseKind::Rez => "PBXRezBuildPhase",
        }
    }

    /// Name Xcode shows for a phase without an explicit `name`
    pub fn default_name(&self) -> &'static str {
        match self {
            PhaseKind::Sources => "Sources",
            PhaseKind::Resources => "Resources",
            PhaseKind::Frameworks => "Frameworks",
            PhaseKind::Headers => "Headers",
            PhaseKind::CopyFiles => "CopyFiles",
            PhaseKind::ShellScript => "ShellScript",
            PhaseKind::Rez => "Rez",
        }
    }

    fn from_isa(isa: &str) -> Option<Self> {
        [
            PhaseKind::Sources,
            PhaseKind::Resources,
            PhaseKind::Frameworks,
            PhaseKind::Headers,
            PhaseKind::CopyFiles,
            PhaseKind::ShellScript,
            PhaseKind::Rez,
        ]
        .into_iter()
        .find(|kind| kind.isa() == isa)
    }
}

// ============================================================================
// Typed Objects
// ============================================================================

/// The `PBXProject` root object
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub main_group: ObjectId,
    pub targets: Vec<ObjectId>,
    pub build_configuration_list: ObjectId,
    pub product_ref_group: Option<ObjectId>,
    pub extra: Dict,
}

/// A buildable target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Target {
    pub kind: TargetKind,
    pub name: String,
    pub product_name: Option<String>,
    pub product_type: Option<String>,
    pub build_phases: Vec<ObjectId>,
    pub build_configuration_list: ObjectId,
    pub product_reference: Option<ObjectId>,
    pub dependencies: Vec<ObjectId>,
    pub extra: Dict,
}

/// A folder of the project navigator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub kind: GroupKind,
    pub name: Option<String>,
    pub path: Option<String>,
    pub children: Vec<ObjectId>,
    pub source_tree: String,
    pub extra: Dict,
}

/// An ordered list of build files processed one way
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildPhase {
    pub kind: PhaseKind,
    pub name: Option<String>,
    pub files: Vec<ObjectId>,
    pub extra: Dict,
}

impl BuildPhase {
    /// Name shown in Xcode and in reference comments
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.kind.default_name())
    }
}

/// A file on disk (or a built product)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReference {
    pub name: Option<String>,
    pub path: Option<String>,
    pub last_known_file_type: Option<String>,
    pub explicit_file_type: Option<String>,
    pub source_tree: String,
    pub extra: Dict,
}

/// Membership of a file in a build phase
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildFile {
    pub file_ref: ObjectId,
    pub extra: Dict,
}

/// A named set of build settings
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfiguration {
    pub name: String,
    pub build_settings: Dict,
    pub extra: Dict,
}

/// The configurations of a project or target
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigurationList {
    pub build_configurations: Vec<ObjectId>,
    pub default_configuration_name: Option<String>,
    pub extra: Dict,
}

/// An object the graph does not model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OtherObject {
    pub isa: String,
    pub fields: Dict,
}

impl OtherObject {
    /// String value of a top-level field
    pub fn string_field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

// ============================================================================
// ObjectData
// ============================================================================

/// Payload of a project object, one variant per kind
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "object", rename_all = "snake_case")]
pub enum ObjectData {
    Project(Project),
    Target(Target),
    Group(Group),
    BuildPhase(BuildPhase),
    FileReference(FileReference),
    BuildFile(BuildFile),
    BuildConfiguration(BuildConfiguration),
    ConfigurationList(ConfigurationList),
    Other(OtherObject),
}

impl ObjectData {
    /// The `isa` written for this object
    pub fn isa(&self) -> &str {
        match self {
            ObjectData::Project(_) => "PBXProject",
            ObjectData::Target(t) => t.kind.isa(),
            ObjectData::Group(g) => g.kind.isa(),
            ObjectData::BuildPhase(p) => p.kind.isa(),
            ObjectData::FileReference(_) => "PBXFileReference",
            ObjectData::BuildFile(_) => "PBXBuildFile",
            ObjectData::BuildConfiguration(_) => "XCBuildConfiguration",
            ObjectData::ConfigurationList(_) => "XCConfigurationList",
            ObjectData::Other(o) => &o.isa,
        }
    }

    /// Interpret the field dictionary of object `id`
    pub fn from_fields(id: &str, mut dict: Dict) -> PbxResult<Self> {
        let isa = match dict.remove("isa") {
            Some(Value::String(isa)) => isa,
            Some(_) => {
                return Err(PbxError::format(format!("object {} has a non-string isa", id)));
            }
            None => return Err(PbxError::format(format!("object {} has no isa", id))),
        };
        let mut fields = Fields {
            id,
            isa: &isa,
            dict,
        };

        let data = if isa == "PBXProject" {
            ObjectData::Project(Project {
                main_group: fields.id("mainGroup")?,
                targets: fields.id_list("targets")?,
                build_configuration_list: fields.id("buildConfigurationList")?,
                product_ref_group: fields.optional_id("productRefGroup")?,
                extra: Dict::new(),
            })
        } else if let Some(kind) = TargetKind::from_isa(&isa) {
            let build_phases = match kind {
                TargetKind::Native => fields.id_list("buildPhases")?,
                _ => fields.optional_id_list("buildPhases")?.unwrap_or_default(),
            };
            ObjectData::Target(Target {
                kind,
                name: fields.string("name")?,
                product_name: fields.optional_string("productName")?,
                product_type: fields.optional_string("productType")?,
                build_phases,
                build_configuration_list: fields.id("buildConfigurationList")?,
                product_reference: fields.optional_id("productReference")?,
                dependencies: fields.optional_id_list("dependencies")?.unwrap_or_default(),
                extra: Dict::new(),
            })
        } else if let Some(kind) = GroupKind::from_isa(&isa) {
            ObjectData::Group(Group {
                kind,
                name: fields.optional_string("name")?,
                path: fields.optional_string("path")?,
                children: fields.id_list("children")?,
                source_tree: fields
                    .optional_string("sourceTree")?
                    .unwrap_or_else(|| "<group>".to_string()),
                extra: Dict::new(),
            })
        } else if let Some(kind) = PhaseKind::from_isa(&isa) {
            ObjectData::BuildPhase(BuildPhase {
                kind,
                name: fields.optional_string("name")?,
                files: fields.id_list("files")?,
                extra: Dict::new(),
            })
        } else if isa == "PBXFileReference" {
            let name = fields.optional_string("name")?;
            let path = fields.optional_string("path")?;
            if name.is_none() && path.is_none() {
                return Err(fields.missing("path"));
            }
            ObjectData::FileReference(FileReference {
                name,
                path,
                last_known_file_type: fields.optional_string("lastKnownFileType")?,
                explicit_file_type: fields.optional_string("explicitFileType")?,
                source_tree: fields.string("sourceTree")?,
                extra: Dict::new(),
            })
        } else if isa == "PBXBuildFile" && fields.dict.contains_key("fileRef") {
            ObjectData::BuildFile(BuildFile {
                file_ref: fields.id("fileRef")?,
                extra: Dict::new(),
            })
        } else if isa == "XCBuildConfiguration" {
            ObjectData::BuildConfiguration(BuildConfiguration {
                name: fields.string("name")?,
                build_settings: fields.optional_dict("buildSettings")?.unwrap_or_default(),
                extra: Dict::new(),
            })
        } else if isa == "XCConfigurationList" {
            ObjectData::ConfigurationList(ConfigurationList {
                build_configurations: fields.id_list("buildConfigurations")?,
                default_configuration_name: fields.optional_string("defaultConfigurationName")?,
                extra: Dict::new(),
            })
        } else {
            return Ok(ObjectData::Other(OtherObject {
                isa: isa.clone(),
                fields: fields.dict,
            }));
        };

        Ok(data.with_extra(fields.dict))
    }

    fn with_extra(mut self, rest: Dict) -> Self {
        if let Some(extra) = self.extra_mut() {
            *extra = rest;
        }
        self
    }

    /// Unmodeled fields of a typed variant
    pub fn extra(&self) -> Option<&Dict> {
        match self {
            ObjectData::Project(o) => Some(&o.extra),
            ObjectData::Target(o) => Some(&o.extra),
            ObjectData::Group(o) => Some(&o.extra),
            ObjectData::BuildPhase(o) => Some(&o.extra),
            ObjectData::FileReference(o) => Some(&o.extra),
            ObjectData::BuildFile(o) => Some(&o.extra),
            ObjectData::BuildConfiguration(o) => Some(&o.extra),
            ObjectData::ConfigurationList(o) => Some(&o.extra),
            ObjectData::Other(_) => None,
        }
    }

    pub(crate) fn extra_mut(&mut self) -> Option<&mut Dict> {
        match self {
            ObjectData::Project(o) => Some(&mut o.extra),
            ObjectData::Target(o) => Some(&mut o.extra),
            ObjectData::Group(o) => Some(&mut o.extra),
            ObjectData::BuildPhase(o) => Some(&mut o.extra),
            ObjectData::FileReference(o) => Some(&mut o.extra),
            ObjectData::BuildFile(o) => Some(&mut o.extra),
            ObjectData::BuildConfiguration(o) => Some(&mut o.extra),
            ObjectData::ConfigurationList(o) => Some(&mut o.extra),
            ObjectData::Other(_) => None,
        }
    }

    /// The full field dictionary, `isa` included
    pub fn to_fields(&self) -> Dict {
        let mut dict = match self {
            ObjectData::Other(o) => o.fields.clone(),
            _ => self.extra().cloned().unwrap_or_default(),
        };
        dict.insert("isa".to_string(), Value::string(self.isa()));

        match self {
            ObjectData::Project(p) => {
                put_id(&mut dict, "mainGroup", &p.main_group);
                put_ids(&mut dict, "targets", &p.targets);
                put_id(&mut dict, "buildConfigurationList", &p.build_configuration_list);
                put_opt_id(&mut dict, "productRefGroup", p.product_ref_group.as_ref());
            }
            ObjectData::Target(t) => {
                put_str(&mut dict, "name", &t.name);
                put_opt_str(&mut dict, "productName", t.product_name.as_deref());
                put_opt_str(&mut dict, "productType", t.product_type.as_deref());
                put_ids(&mut dict, "buildPhases", &t.build_phases);
                put_id(&mut dict, "buildConfigurationList", &t.build_configuration_list);
                put_opt_id(&mut dict, "productReference", t.product_reference.as_ref());
                put_ids(&mut dict, "dependencies", &t.dependencies);
            }
            ObjectData::Group(g) => {
                put_opt_str(&mut dict, "name", g.name.as_deref());
                put_opt_str(&mut dict, "path", g.path.as_deref());
                put_ids(&mut dict, "children", &g.children);
                put_str(&mut dict, "sourceTree", &g.source_tree);
            }
            ObjectData::BuildPhase(p) => {
                put_opt_str(&mut dict, "name", p.name.as_deref());
                put_ids(&mut dict, "files", &p.files);
            }
            ObjectData::FileReference(f) => {
                put_opt_str(&mut dict, "name", f.name.as_deref());
                put_opt_str(&mut dict, "path", f.path.as_deref());
                put_opt_str(&mut dict, "lastKnownFileType", f.last_known_file_type.as_deref());
                put_opt_str(&mut dict, "explicitFileType", f.explicit_file_type.as_deref());
                put_str(&mut dict, "sourceTree", &f.source_tree);
            }
            ObjectData::BuildFile(b) => {
                put_id(&mut dict, "fileRef", &b.file_ref);
            }
            ObjectData::BuildConfiguration(c) => {
                put_str(&mut dict, "name", &c.name);
                dict.insert(
                    "buildSettings".to_string(),
                    Value::Dict(c.build_settings.clone()),
                );
            }
            ObjectData::ConfigurationList(l) => {
                put_ids(&mut dict, "buildConfigurations", &l.build_configurations);
                put_opt_str(
                    &mut dict,
                    "defaultConfigurationName",
                    l.default_configuration_name.as_deref(),
                );
            }
            ObjectData::Other(_) => {}
        }
        dict
    }

    /// Modeled references with the kind each one must resolve to
    pub(crate) fn references(&self) -> Vec<(&'static str, &ObjectId, RefKind)> {
        let mut refs = Vec::new();
        match self {
            ObjectData::Project(p) => {
                refs.push(("mainGroup", &p.main_group, RefKind::Group));
                refs.extend(p.targets.iter().map(|id| ("targets", id, RefKind::Target)));
                refs.push((
                    "buildConfigurationList",
                    &p.build_configuration_list,
                    RefKind::ConfigurationList,
                ));
                if let Some(id) = &p.product_ref_group {
                    refs.push(("productRefGroup", id, RefKind::Group));
                }
            }
            ObjectData::Target(t) => {
                refs.extend(
                    t.build_phases
                        .iter()
                        .map(|id| ("buildPhases", id, RefKind::BuildPhase)),
                );
                refs.push((
                    "buildConfigurationList",
                    &t.build_configuration_list,
                    RefKind::ConfigurationList,
                ));
                if let Some(id) = &t.product_reference {
                    refs.push(("productReference", id, RefKind::FileReference));
                }
                refs.extend(t.dependencies.iter().map(|id| ("dependencies", id, RefKind::Any)));
            }
            ObjectData::Group(g) => {
                refs.extend(g.children.iter().map(|id| ("children", id, RefKind::GroupMember)));
            }
            ObjectData::BuildPhase(p) => {
                refs.extend(p.files.iter().map(|id| ("files", id, RefKind::BuildFile)));
            }
            ObjectData::BuildFile(b) => {
                refs.push(("fileRef", &b.file_ref, RefKind::BuildFileSource));
            }
            ObjectData::ConfigurationList(l) => {
                refs.extend(
                    l.build_configurations
                        .iter()
                        .map(|id| ("buildConfigurations", id, RefKind::BuildConfiguration)),
                );
            }
            ObjectData::FileReference(_)
            | ObjectData::BuildConfiguration(_)
            | ObjectData::Other(_) => {}
        }
        refs
    }

    /// Comment Xcode writes next to the object, when it can be derived
    /// from the object alone
    pub fn default_comment(&self) -> Option<String> {
        match self {
            ObjectData::Project(_) => Some("Project object".to_string()),
            ObjectData::BuildFile(_) | ObjectData::ConfigurationList(_) => None,
            ObjectData::Other(o) => Some(o.isa.clone()),
            _ => self.display_name().map(str::to_string),
        }
    }

    pub fn as_target(&self) -> Option<&Target> {
        match self {
            ObjectData::Target(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match self {
            ObjectData::Group(g) => Some(g),
            _ => None,
        }
    }

    pub fn as_build_phase(&self) -> Option<&BuildPhase> {
        match self {
            ObjectData::BuildPhase(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_file_reference(&self) -> Option<&FileReference> {
        match self {
            ObjectData::FileReference(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_build_file(&self) -> Option<&BuildFile> {
        match self {
            ObjectData::BuildFile(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_build_configuration(&self) -> Option<&BuildConfiguration> {
        match self {
            ObjectData::BuildConfiguration(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_configuration_list(&self) -> Option<&ConfigurationList> {
        match self {
            ObjectData::ConfigurationList(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_other(&self) -> Option<&OtherObject> {
        match self {
            ObjectData::Other(o) => Some(o),
            _ => None,
        }
    }
}

impl Named for ObjectData {
    fn display_name(&self) -> Option<&str> {
        match self {
            ObjectData::Target(t) => Some(t.name.as_str()),
            ObjectData::Group(g) => g.name.as_deref().or(g.path.as_deref()),
            ObjectData::BuildPhase(p) => Some(p.display_name()),
            ObjectData::FileReference(f) => f.name.as_deref().or(f.path.as_deref()),
            ObjectData::BuildConfiguration(c) => Some(c.name.as_str()),
            ObjectData::Other(o) => o.string_field("name"),
            ObjectData::Project(_) | ObjectData::BuildFile(_) | ObjectData::ConfigurationList(_) => {
                None
            }
        }
    }
}

// ============================================================================
// Reference Kinds
// ============================================================================

/// What a modeled reference is allowed to point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RefKind {
    Group,
    /// Child of a group: a group, a file, or an unmodeled reference kind
    GroupMember,
    Target,
    BuildPhase,
    /// A build file; those without `fileRef` are kept unmodeled
    BuildFile,
    /// File of a build file: a file, a group, or an unmodeled reference kind
    BuildFileSource,
    FileReference,
    BuildConfiguration,
    ConfigurationList,
    Any,
}

impl RefKind {
    pub(crate) fn accepts(&self, data: &ObjectData) -> bool {
        match self {
            RefKind::Group => matches!(data, ObjectData::Group(_)),
            RefKind::GroupMember | RefKind::BuildFileSource => matches!(
                data,
                ObjectData::Group(_) | ObjectData::FileReference(_) | ObjectData::Other(_)
            ),
            RefKind::Target => matches!(data, ObjectData::Target(_)),
            RefKind::BuildPhase => matches!(data, ObjectData::BuildPhase(_)),
            RefKind::BuildFile => match data {
                ObjectData::BuildFile(_) => true,
                ObjectData::Other(o) => o.isa == "PBXBuildFile",
                _ => false,
            },
            RefKind::FileReference => matches!(data, ObjectData::FileReference(_)),
            RefKind::BuildConfiguration => matches!(data, ObjectData::BuildConfiguration(_)),
            RefKind::ConfigurationList => matches!(data, ObjectData::ConfigurationList(_)),
            RefKind::Any => true,
        }
    }

    pub(crate) fn describe(&self) -> &'static str {
        match self {
            RefKind::Group => "a group",
            RefKind::GroupMember => "a group member",
            RefKind::Target => "a target",
            RefKind::BuildPhase => "a build phase",
            RefKind::BuildFile => "a build file",
            RefKind::BuildFileSource => "a file or group",
            RefKind::FileReference => "a file reference",
            RefKind::BuildConfiguration => "a build configuration",
            RefKind::ConfigurationList => "a configuration list",
            RefKind::Any => "an object",
        }
    }
}

// ============================================================================
// PbxObject
// ============================================================================

/// An object of the project graph
///
/// Equality compares the id and the data only; the display comment and the
/// source text it was parsed from are presentation.
#[derive(Debug, Clone, Serialize)]
pub struct PbxObject {
    id: ObjectId,
    #[serde(skip_serializing_if = "Option::is_none")]
    comment: Option<String>,
    #[serde(flatten)]
    data: ObjectData,
    #[serde(skip)]
    raw: Option<String>,
}

impl PbxObject {
    /// Create a new object, with the comment derived from its data
    pub fn new(id: ObjectId, data: ObjectData) -> Self {
        Self {
            id,
            comment: data.default_comment(),
            data,
            raw: None,
        }
    }

    /// Create an object as parsed from text
    pub(crate) fn parsed(
        id: ObjectId,
        data: ObjectData,
        comment: Option<String>,
        raw: Option<String>,
    ) -> Self {
        Self {
            id,
            comment,
            data,
            raw,
        }
    }

    /// Replace the display comment
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn id(&self) -> &ObjectId {
        &self.id
    }

    pub fn data(&self) -> &ObjectData {
        &self.data
    }

    pub fn isa(&self) -> &str {
        self.data.isa()
    }

    /// Stored display comment
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Source text, present while the object is untouched
    pub fn raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Mutable data; the object is regenerated when written
    pub(crate) fn data_mut(&mut self) -> &mut ObjectData {
        self.raw = None;
        &mut self.data
    }
}

impl PartialEq for PbxObject {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.data == other.data
    }
}

// ============================================================================
// Field Helpers
// ============================================================================

struct Fields<'a> {
    id: &'a str,
    isa: &'a str,
    dict: Dict,
}

impl Fields<'_> {
    fn missing(&self, key: &str) -> PbxError {
        PbxError::format(format!(
            "{} {} is missing required field '{}'",
            self.isa, self.id, key
        ))
    }

    fn wrong_type(&self, key: &str, expected: &str) -> PbxError {
        PbxError::format(format!(
            "{} {}: field '{}' must be {}",
            self.isa, self.id, key, expected
        ))
    }

    fn optional_string(&mut self, key: &str) -> PbxResult<Option<String>> {
        match self.dict.remove(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(_) => Err(self.wrong_type(key, "a string")),
        }
    }

    fn string(&mut self, key: &str) -> PbxResult<String> {
        self.optional_string(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_id(&mut self, key: &str) -> PbxResult<Option<ObjectId>> {
        Ok(self.optional_string(key)?.map(ObjectId::from))
    }

    fn id(&mut self, key: &str) -> PbxResult<ObjectId> {
        self.optional_id(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_id_list(&mut self, key: &str) -> PbxResult<Option<Vec<ObjectId>>> {
        match self.dict.remove(key) {
            None => Ok(None),
            Some(Value::Array(items)) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(ObjectId::from(s)),
                    _ => Err(self.wrong_type(key, "a list of object ids")),
                })
                .collect::<PbxResult<Vec<_>>>()
                .map(Some),
            Some(_) => Err(self.wrong_type(key, "a list")),
        }
    }

    fn id_list(&mut self, key: &str) -> PbxResult<Vec<ObjectId>> {
        self.optional_id_list(key)?.ok_or_else(|| self.missing(key))
    }

    fn optional_dict(&mut self, key: &str) -> PbxResult<Option<Dict>> {
        match self.dict.remove(key) {
            None => Ok(None),
            Some(Value::Dict(dict)) => Ok(Some(dict)),
            Some(_) => Err(self.wrong_type(key, "a dictionary")),
        }
    }
}

fn put_str(dict: &mut Dict, key: &str, value: &str) {
    dict.insert(key.to_string(), Value::string(value));
}

fn put_opt_str(dict: &mut Dict, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        put_str(dict, key, value);
    }
}

fn put_id(dict: &mut Dict, key: &str, id: &ObjectId) {
    put_str(dict, key, id.as_str());
}

fn put_opt_id(dict: &mut Dict, key: &str, id: Option<&ObjectId>) {
    if let Some(id) = id {
        put_id(dict, key, id);
    }
}

fn put_ids(dict: &mut Dict, key: &str, ids: &[ObjectId]) {
    dict.insert(
        key.to_string(),
        Value::string_array(ids.iter().map(ObjectId::as_str)),
    );
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plist::parse_value;
    use pretty_assertions::assert_eq;

    fn dict(text: &str) -> Dict {
        parse_value(text).unwrap().as_dict().unwrap().clone()
    }

    #[test]
    fn test_native_target_fields() {
        let fields = dict(
            r#"{
                isa = PBXNativeTarget;
                buildConfigurationList = L1;
                buildPhases = (P1, P2);
                buildRules = ();
                dependencies = ();
                name = HelloCordova;
                productName = HelloCordova;
                productReference = F1;
                productType = "com.apple.product-type.application";
            }"#,
        );
        let data = ObjectData::from_fields("T1", fields.clone()).unwrap();
        let target = data.as_target().unwrap();
        assert_eq!(target.kind, TargetKind::Native);
        assert_eq!(target.name, "HelloCordova");
        assert_eq!(target.build_phases, vec![ObjectId::from("P1"), ObjectId::from("P2")]);
        assert_eq!(target.extra.len(), 1);
        assert!(target.extra.contains_key("buildRules"));
        assert_eq!(data.to_fields(), fields);
    }

    #[test]
    fn test_missing_isa() {
        let err = ObjectData::from_fields("X1", dict("{ name = Foo; }")).unwrap_err();
        assert_eq!(err.to_string(), "Malformed project file: object X1 has no isa");
    }

    #[test]
    fn test_missing_required_field() {
        let err = ObjectData::from_fields("T1", dict("{ isa = PBXNativeTarget; name = A; }"))
            .unwrap_err();
        assert!(err.to_string().contains("missing required field 'buildPhases'"));
    }

    #[test]
    fn test_wrong_field_type() {
        let err = ObjectData::from_fields("G1", dict("{ isa = PBXGroup; children = X; }"))
            .unwrap_err();
        assert!(err.to_string().contains("field 'children' must be a list"));
    }

    #[test]
    fn test_build_file_without_file_ref_is_unmodeled() {
        let data = ObjectData::from_fields(
            "B1",
            dict("{ isa = PBXBuildFile; productRef = R1; }"),
        )
        .unwrap();
        assert_eq!(data.isa(), "PBXBuildFile");
        assert!(data.as_other().is_some());
        assert!(RefKind::BuildFile.accepts(&data));
    }

    #[test]
    fn test_unknown_isa_round_trips() {
        let fields = dict(
            "{ isa = PBXContainerItemProxy; containerPortal = P; proxyType = 1; remoteGlobalIDString = T; remoteInfo = Ext; }",
        );
        let data = ObjectData::from_fields("C1", fields.clone()).unwrap();
        assert_eq!(data.as_other().unwrap().string_field("remoteInfo"), Some("Ext"));
        assert_eq!(data.to_fields(), fields);
        assert_eq!(data.default_comment().as_deref(), Some("PBXContainerItemProxy"));
    }

    #[test]
    fn test_file_reference_names() {
        let data = ObjectData::from_fields(
            "F1",
            dict(r#"{ isa = PBXFileReference; lastKnownFileType = sourcecode.c.objc; path = ShareViewController.m; sourceTree = "<group>"; }"#),
        )
        .unwrap();
        assert_eq!(data.display_name(), Some("ShareViewController.m"));
        assert_eq!(data.default_comment().as_deref(), Some("ShareViewController.m"));
    }

    #[test]
    fn test_phase_default_name() {
        let data = ObjectData::from_fields(
            "P1",
            dict("{ isa = PBXResourcesBuildPhase; buildActionMask = 2147483647; files = (); }"),
        )
        .unwrap();
        assert_eq!(data.display_name(), Some("Resources"));
    }

    #[test]
    fn test_equality_ignores_presentation() {
        let data = ObjectData::from_fields("G1", dict("{ isa = PBXGroup; children = (); name = A; }"))
            .unwrap();
        let parsed = PbxObject::parsed(
            ObjectId::from("G1"),
            data.clone(),
            Some("A".to_string()),
            Some("G1 /* A */ = {...};".to_string()),
        );
        let fresh = PbxObject::new(ObjectId::from("G1"), data).with_comment("other");
        assert_eq!(parsed, fresh);
    }

    #[test]
    fn test_data_mut_clears_raw() {
        let data = ObjectData::from_fields("G1", dict("{ isa = PBXGroup; children = (); }"))
            .unwrap();
        let mut object =
            PbxObject::parsed(ObjectId::from("G1"), data, None, Some("raw".to_string()));
        assert_eq!(object.raw(), Some("raw"));
        object.data_mut();
        assert_eq!(object.raw(), None);
    }
}
