//! Graph mutations
//!
//! Every operation here is idempotent: running the same sequence twice
//! against a project leaves it as the first run did. Lookups by name are
//! exact and case-sensitive; when two groups share a name, the first one in
//! a pre-order walk from the main group wins.
//!
//! Operations check everything that can fail before touching the graph, so
//! an error leaves the graph as it was.

use crate::objects::{
    BuildConfiguration, BuildFile, BuildPhase, ConfigurationList, FileReference, Group, GroupKind,
    ObjectData, OtherObject, PhaseKind, Target, TargetKind,
};
use crate::plist::{Dict, Value};
use crate::project::ProjectGraph;
use pbxgraft_core::{
    FileCategory, Named, ObjectId, PbxError, PbxResult, ProductType, last_known_file_type,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the copy-files phase embedding app extensions into their host
pub const EMBED_EXTENSIONS_PHASE: &str = "Embed App Extensions";

/// `dstSubfolderSpec` of the PlugIns folder of an app bundle
const PLUGINS_SUBFOLDER_SPEC: &str = "13";

const BUILD_ACTION_MASK: &str = "2147483647";

// ============================================================================
// Extension Files
// ============================================================================

/// A file staged for registration in the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionFile {
    /// File name, as registered in the group
    pub name: String,

    /// Location on disk
    pub path: PathBuf,

    /// Extension with its leading dot, empty when the name has none
    pub extension: String,
}

impl ExtensionFile {
    /// Describe the file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = Path::new(&name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default();
        Self {
            name,
            path,
            extension,
        }
    }

    /// How the file takes part in the build
    pub fn category(&self) -> FileCategory {
        FileCategory::from_extension(&self.extension)
    }
}

/// A file registered by [`ProjectGraph::add_files`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddedFile {
    pub name: String,
    pub file_ref: ObjectId,
    pub category: FileCategory,
}

/// Outcome of registering a batch of files
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileBatchReport {
    /// Files registered (or found already registered)
    pub added: Vec<AddedFile>,

    /// Files skipped because they do not exist on disk
    pub missing: Vec<PathBuf>,
}

impl FileBatchReport {
    /// Whether every file of the batch was registered
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// One [`PbxError::MissingFile`] per skipped file
    pub fn errors(&self) -> Vec<PbxError> {
        self.missing
            .iter()
            .cloned()
            .map(PbxError::MissingFile)
            .collect()
    }

    /// Number of registered files of a category
    pub fn count(&self, category: FileCategory) -> usize {
        self.added.iter().filter(|f| f.category == category).count()
    }
}

// ============================================================================
// Targets
// ============================================================================

impl ProjectGraph {
    /// Id of the first target named `name`, in the project's target order
    pub fn find_target(&self, name: &str) -> Option<ObjectId> {
        self.targets()
            .into_iter()
            .find(|(_, target)| target.name == name)
            .map(|(id, _)| id.clone())
    }

    /// Create a native target, or return the existing one with that name
    ///
    /// A new target gets an empty `Sources` phase and an empty `Resources`
    /// phase, a configuration list with the same configuration names as the
    /// project's, and a product reference in the products group. An app
    /// extension is also embedded into the host application target, which
    /// then depends on it.
    pub fn add_target(
        &mut self,
        name: &str,
        product_type: ProductType,
        product_name: &str,
    ) -> PbxResult<ObjectId> {
        if let Some(existing) = self.find_target(name) {
            debug!(target = name, "Target already present");
            return Ok(existing);
        }

        let project = self.project()?.clone();
        let configuration_names = self.configuration_names(&project.build_configuration_list)?;
        let host = self.host_target();

        let sources = self.new_phase(PhaseKind::Sources, None, Dict::new());
        let resources = self.new_phase(PhaseKind::Resources, None, Dict::new());

        let configurations = configuration_names
            .names
            .iter()
            .map(|config| {
                self.add_object(ObjectData::BuildConfiguration(BuildConfiguration {
                    name: config.clone(),
                    build_settings: target_build_settings(name, product_name, product_type),
                    extra: Dict::new(),
                }))
            })
            .collect();
        let configuration_list = self.add_object(ObjectData::ConfigurationList(ConfigurationList {
            build_configurations: configurations,
            default_configuration_name: configuration_names.default,
            extra: Dict::from([(
                "defaultConfigurationIsVisible".to_string(),
                Value::string("0"),
            )]),
        }));

        let product = self.add_object(ObjectData::FileReference(FileReference {
            name: None,
            path: Some(product_type.product_file_name(product_name)),
            last_known_file_type: None,
            explicit_file_type: Some(product_type.explicit_file_type().to_string()),
            source_tree: "BUILT_PRODUCTS_DIR".to_string(),
            extra: Dict::from([("includeInIndex".to_string(), Value::string("0"))]),
        }));
        if let Some(products) = self.products_group().cloned() {
            if let Some(group) = self.group_mut(products.as_str()) {
                group.children.push(product.clone());
            }
        }

        let target = self.add_object(ObjectData::Target(Target {
            kind: TargetKind::Native,
            name: name.to_string(),
            product_name: Some(product_name.to_string()),
            product_type: Some(product_type.identifier().to_string()),
            build_phases: vec![sources, resources],
            build_configuration_list: configuration_list,
            product_reference: Some(product.clone()),
            dependencies: Vec::new(),
            extra: Dict::from([("buildRules".to_string(), Value::Array(Vec::new()))]),
        }));
        self.project_mut()?.targets.push(target.clone());

        if product_type.is_extension() {
            match host {
                Some(host) => self.embed_in_host(&host, &target, &product, name),
                None => warn!(target = name, "No host application to embed the extension into"),
            }
        }

        info!(
            target = name,
            product_type = %product_type,
            id = %target,
            "Created target"
        );
        Ok(target)
    }

    /// First application target, else the first target
    fn host_target(&self) -> Option<ObjectId> {
        let targets = self.targets();
        targets
            .iter()
            .find(|(_, t)| {
                t.product_type
                    .as_deref()
                    .and_then(|p| p.parse::<ProductType>().ok())
                    == Some(ProductType::Application)
            })
            .or_else(|| targets.first())
            .map(|(id, _)| (*id).clone())
    }

    fn configuration_names(&self, list: &ObjectId) -> PbxResult<ConfigurationNames> {
        let configuration_list = self.configuration_list(list.as_str()).ok_or_else(|| {
            PbxError::integrity(format!("project configuration list {} is missing", list))
        })?;
        let mut names: Vec<String> = self
            .configurations_of(list.as_str())
            .into_iter()
            .map(|(_, config)| config.name.clone())
            .collect();
        if names.is_empty() {
            names = vec!["Debug".to_string(), "Release".to_string()];
        }
        Ok(ConfigurationNames {
            names,
            default: configuration_list.default_configuration_name.clone(),
        })
    }

    fn new_phase(&mut self, kind: PhaseKind, name: Option<&str>, mut extra: Dict) -> ObjectId {
        extra.insert(
            "buildActionMask".to_string(),
            Value::string(BUILD_ACTION_MASK),
        );
        extra.insert(
            "runOnlyForDeploymentPostprocessing".to_string(),
            Value::string("0"),
        );
        self.add_object(ObjectData::BuildPhase(BuildPhase {
            kind,
            name: name.map(str::to_string),
            files: Vec::new(),
            extra,
        }))
    }

    /// Copy the extension product into the host and make the host depend on
    /// the extension target
    fn embed_in_host(&mut self, host: &ObjectId, target: &ObjectId, product: &ObjectId, name: &str) {
        let Some(host_target) = self.target(host.as_str()).cloned() else {
            return;
        };

        let existing = host_target.build_phases.iter().find(|id| {
            self.build_phase(id.as_str()).is_some_and(|p| {
                p.kind == PhaseKind::CopyFiles && p.name.as_deref() == Some(EMBED_EXTENSIONS_PHASE)
            })
        });
        let phase = match existing {
            Some(phase) => phase.clone(),
            None => {
                let phase = self.new_phase(
                    PhaseKind::CopyFiles,
                    Some(EMBED_EXTENSIONS_PHASE),
                    Dict::from([
                        ("dstPath".to_string(), Value::string("")),
                        (
                            "dstSubfolderSpec".to_string(),
                            Value::string(PLUGINS_SUBFOLDER_SPEC),
                        ),
                    ]),
                );
                if let Some(host_target) = self.target_mut(host.as_str()) {
                    host_target.build_phases.push(phase.clone());
                }
                phase
            }
        };

        let mut attributes = Dict::new();
        attributes.insert(
            "ATTRIBUTES".to_string(),
            Value::string_array(["RemoveHeadersOnCopy"]),
        );
        let embedded = self.add_object(ObjectData::BuildFile(BuildFile {
            file_ref: product.clone(),
            extra: Dict::from([("settings".to_string(), Value::Dict(attributes))]),
        }));
        if let Some(phase) = self.build_phase_mut(phase.as_str()) {
            phase.files.push(embedded);
        }

        let root = self.root_object().clone();
        let proxy = self.add_object(ObjectData::Other(OtherObject {
            isa: "PBXContainerItemProxy".to_string(),
            fields: Dict::from([
                ("containerPortal".to_string(), Value::string(root.as_str())),
                ("proxyType".to_string(), Value::string("1")),
                (
                    "remoteGlobalIDString".to_string(),
                    Value::string(target.as_str()),
                ),
                ("remoteInfo".to_string(), Value::string(name)),
            ]),
        }));
        let dependency = self.add_object(ObjectData::Other(OtherObject {
            isa: "PBXTargetDependency".to_string(),
            fields: Dict::from([
                ("target".to_string(), Value::string(target.as_str())),
                ("targetProxy".to_string(), Value::string(proxy.as_str())),
            ]),
        }));
        if let Some(host_target) = self.target_mut(host.as_str()) {
            host_target.dependencies.push(dependency);
        }

        debug!(host = %host_target.name, extension = name, "Embedded extension into host");
    }

    /// Remove a target and everything that exists only for it
    ///
    /// Removes the target, its build phases and their build files, its
    /// configuration list and configurations, its product reference (with
    /// the build files embedding it), the dependencies and proxies pointing
    /// at it, and its `TargetAttributes` entry. File references of its
    /// sources stay in their groups. Returns `false` when no target has that
    /// name.
    pub fn remove_target(&mut self, name: &str) -> bool {
        let Some(id) = self.find_target(name) else {
            debug!(target = name, "Target not present, nothing to remove");
            return false;
        };
        let Some(target) = self.target(id.as_str()).cloned() else {
            return false;
        };

        let mut doomed = vec![id.clone()];
        for phase in &target.build_phases {
            if let Some(p) = self.build_phase(phase.as_str()) {
                doomed.extend(p.files.iter().cloned());
            }
            doomed.push(phase.clone());
        }
        doomed.extend(
            self.configurations_of(target.build_configuration_list.as_str())
                .into_iter()
                .map(|(config, _)| config.clone()),
        );
        doomed.push(target.build_configuration_list.clone());
        doomed.extend(target.product_reference.iter().cloned());

        let removed = self.remove_cascade(doomed);
        info!(target = name, objects = removed, "Removed target");
        true
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Id of the first group (in pre-order from the main group) whose name,
    /// or path when it has no name, is `name`
    pub fn find_group(&self, name: &str) -> Option<ObjectId> {
        self.groups_preorder()
            .into_iter()
            .find(|id| {
                self.object(id.as_str())
                    .is_some_and(|o| o.data().name_matches(name))
            })
            .cloned()
    }

    /// Return the group named `name`, creating it under `parent_name` when
    /// no group has that name
    ///
    /// An existing group is returned where it is, even when it lives under
    /// another parent. Fails with [`PbxError::MissingParent`] when the group
    /// must be created and no group is named `parent_name`.
    pub fn find_or_create_group(&mut self, name: &str, parent_name: &str) -> PbxResult<ObjectId> {
        if let Some(existing) = self.find_group(name) {
            debug!(group = name, "Group already present");
            return Ok(existing);
        }

        let parent = self
            .find_group(parent_name)
            .ok_or_else(|| PbxError::missing_parent(parent_name, name))?;

        let group = self.add_object(ObjectData::Group(Group {
            kind: GroupKind::Group,
            name: Some(name.to_string()),
            path: Some(name.to_string()),
            children: Vec::new(),
            source_tree: "<group>".to_string(),
            extra: Dict::new(),
        }));
        if let Some(parent_group) = self.group_mut(parent.as_str()) {
            parent_group.children.push(group.clone());
        }

        info!(group = name, parent = parent_name, "Created group");
        Ok(group)
    }

    /// Remove a group, its subtree, and every build file of a file in it
    ///
    /// Returns `false` when no group has that name. The main group is never
    /// removed.
    pub fn remove_group(&mut self, name: &str) -> bool {
        let Some(id) = self.find_group(name) else {
            debug!(group = name, "Group not present, nothing to remove");
            return false;
        };
        if self.main_group() == Some(&id) {
            warn!(group = name, "Refusing to remove the main group");
            return false;
        }

        let (groups, files) = self.subtree(id.as_str());
        let build_files: Vec<ObjectId> = self
            .objects()
            .filter(|o| {
                o.data().as_build_file().is_some_and(|b| {
                    files.contains(&b.file_ref) || groups.contains(&b.file_ref)
                })
            })
            .map(|o| o.id().clone())
            .collect();

        let doomed = build_files
            .into_iter()
            .chain(files)
            .chain(groups)
            .collect::<Vec<_>>();
        let removed = self.remove_cascade(doomed);
        info!(group = name, objects = removed, "Removed group");
        true
    }

    // ========================================================================
    // Files
    // ========================================================================

    /// Register a file in `group` and wire it into `target`
    ///
    /// Source files get a build file in the target's `Sources` phase,
    /// resources one in its `Resources` phase; config files are only added
    /// to the group. A file reference with the same path in the group is
    /// reused, and a phase never gets two build files for the same file.
    pub fn add_file(
        &mut self,
        target: &str,
        group: &str,
        file: &ExtensionFile,
    ) -> PbxResult<ObjectId> {
        if self.target(target).is_none() {
            return Err(PbxError::TargetNotFound(target.to_string()));
        }
        let existing = self
            .group(group)
            .ok_or_else(|| PbxError::GroupNotFound(group.to_string()))?
            .children
            .iter()
            .find(|child| {
                self.file_reference(child.as_str())
                    .is_some_and(|f| f.path.as_deref() == Some(file.name.as_str()))
            })
            .cloned();

        let file_ref = match existing {
            Some(file_ref) => file_ref,
            None => {
                let file_ref = self.add_object(ObjectData::FileReference(FileReference {
                    name: None,
                    path: Some(file.name.clone()),
                    last_known_file_type: Some(last_known_file_type(&file.extension).to_string()),
                    explicit_file_type: None,
                    source_tree: "<group>".to_string(),
                    extra: Dict::new(),
                }));
                if let Some(group) = self.group_mut(group) {
                    group.children.push(file_ref.clone());
                }
                file_ref
            }
        };

        let category = file.category();
        let phase_kind = match category {
            FileCategory::Source => Some(PhaseKind::Sources),
            FileCategory::Resource => Some(PhaseKind::Resources),
            FileCategory::Config => None,
        };
        if let Some(kind) = phase_kind {
            let phase = self.phase_for(target, kind);
            let already_built = self.build_phase(phase.as_str()).is_some_and(|p| {
                p.files.iter().any(|bf| {
                    self.build_file(bf.as_str())
                        .is_some_and(|b| b.file_ref == file_ref)
                })
            });
            if !already_built {
                let build_file = self.add_object(ObjectData::BuildFile(BuildFile {
                    file_ref: file_ref.clone(),
                    extra: Dict::new(),
                }));
                if let Some(phase) = self.build_phase_mut(phase.as_str()) {
                    phase.files.push(build_file);
                }
            }
        }

        debug!(
            file = %file.name,
            category = category.display_name(),
            "Registered file"
        );
        Ok(file_ref)
    }

    /// First phase of `kind` in the target, created when missing
    fn phase_for(&mut self, target: &str, kind: PhaseKind) -> ObjectId {
        let existing = self.target(target).and_then(|t| {
            t.build_phases
                .iter()
                .find(|id| self.build_phase(id.as_str()).is_some_and(|p| p.kind == kind))
                .cloned()
        });
        if let Some(phase) = existing {
            return phase;
        }
        let phase = self.new_phase(kind, None, Dict::new());
        if let Some(target) = self.target_mut(target) {
            target.build_phases.push(phase.clone());
        }
        phase
    }

    /// Register a batch of files
    ///
    /// A file missing on disk is recorded in the report and skipped; the
    /// rest of the batch is still registered.
    pub fn add_files(
        &mut self,
        target: &str,
        group: &str,
        files: &[ExtensionFile],
    ) -> PbxResult<FileBatchReport> {
        if self.target(target).is_none() {
            return Err(PbxError::TargetNotFound(target.to_string()));
        }
        if self.group(group).is_none() {
            return Err(PbxError::GroupNotFound(group.to_string()));
        }

        let mut report = FileBatchReport::default();
        for file in files {
            if !file.path.exists() {
                warn!(path = %file.path.display(), "Skipping missing file");
                report.missing.push(file.path.clone());
                continue;
            }
            let file_ref = self.add_file(target, group, file)?;
            report.added.push(AddedFile {
                name: file.name.clone(),
                file_ref,
                category: file.category(),
            });
        }

        info!(
            sources = report.count(FileCategory::Source),
            resources = report.count(FileCategory::Resource),
            configs = report.count(FileCategory::Config),
            missing = report.missing.len(),
            "Registered files"
        );
        Ok(report)
    }

    // ========================================================================
    // Build Settings
    // ========================================================================

    /// Set `key` to `value` in every configuration of `target`
    ///
    /// Returns the number of configurations the target has. Configurations
    /// already holding the value are left untouched.
    pub fn set_build_setting(&mut self, target: &str, key: &str, value: &str) -> PbxResult<usize> {
        let list = self
            .target(target)
            .ok_or_else(|| PbxError::TargetNotFound(target.to_string()))?
            .build_configuration_list
            .clone();
        let configurations: Vec<(ObjectId, bool)> = self
            .configurations_of(list.as_str())
            .into_iter()
            .map(|(id, config)| {
                let current = config.build_settings.get(key).and_then(Value::as_str);
                (id.clone(), current == Some(value))
            })
            .collect();

        for (id, up_to_date) in &configurations {
            if *up_to_date {
                continue;
            }
            if let Some(config) = self.build_configuration_mut(id.as_str()) {
                config
                    .build_settings
                    .insert(key.to_string(), Value::string(value));
            }
        }

        debug!(key, value, configurations = configurations.len(), "Set build setting");
        Ok(configurations.len())
    }

    /// Value of a build setting in one configuration of a target
    pub fn build_setting(&self, target: &str, configuration: &str, key: &str) -> Option<&str> {
        let list = &self.target(target)?.build_configuration_list;
        self.configurations_of(list.as_str())
            .into_iter()
            .find(|(_, c)| c.name == configuration)
            .and_then(|(_, c)| c.build_settings.get(key))
            .and_then(Value::as_str)
    }
}

struct ConfigurationNames {
    names: Vec<String>,
    default: Option<String>,
}

/// Target-level settings of a freshly created target
fn target_build_settings(name: &str, product_name: &str, product_type: ProductType) -> Dict {
    let mut settings = Dict::new();
    settings.insert("PRODUCT_NAME".to_string(), Value::string(product_name));
    settings.insert(
        "INFOPLIST_FILE".to_string(),
        Value::string(format!("{0}/{0}-Info.plist", name)),
    );
    settings.insert("SKIP_INSTALL".to_string(), Value::string("YES"));
    let runpath = if product_type.is_extension() {
        "$(inherited) @executable_path/Frameworks @executable_path/../../Frameworks"
    } else {
        "$(inherited) @executable_path/Frameworks"
    };
    settings.insert(
        "LD_RUNPATH_SEARCH_PATHS".to_string(),
        Value::string(runpath),
    );
    settings
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pbxgraft_core::Validatable;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    /// New project with a `CustomTemplate` group under the main group and
    /// an application target
    fn cordova_like() -> ProjectGraph {
        let mut graph = ProjectGraph::new("HelloCordova");
        let template = graph.add_object(ObjectData::Group(Group {
            kind: GroupKind::Group,
            name: Some("CustomTemplate".to_string()),
            path: None,
            children: Vec::new(),
            source_tree: "<group>".to_string(),
            extra: Dict::new(),
        }));
        let main = graph.main_group().cloned().unwrap();
        graph.group_mut(main.as_str()).unwrap().children.push(template);
        graph
            .add_target("HelloCordova", ProductType::Application, "HelloCordova")
            .unwrap();
        graph
    }

    fn file(name: &str) -> ExtensionFile {
        ExtensionFile::new(format!("ShareExtension/{}", name))
    }

    #[test]
    fn test_extension_file() {
        let f = ExtensionFile::new("/tmp/ShareExtension/ShareViewController.m");
        assert_eq!(f.name, "ShareViewController.m");
        assert_eq!(f.extension, ".m");
        assert_eq!(f.category(), FileCategory::Source);
        assert_eq!(ExtensionFile::new("Makefile").extension, "");
    }

    #[test]
    fn test_add_target_creates_structure() {
        let mut graph = cordova_like();
        let id = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let target = graph.target(id.as_str()).unwrap().clone();

        let kinds: Vec<PhaseKind> = target
            .build_phases
            .iter()
            .map(|p| graph.build_phase(p.as_str()).unwrap().kind)
            .collect();
        assert_eq!(kinds, vec![PhaseKind::Sources, PhaseKind::Resources]);

        let names: Vec<&str> = graph
            .configurations_of(target.build_configuration_list.as_str())
            .into_iter()
            .map(|(_, c)| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Debug", "Release"]);
        assert_eq!(
            graph.build_setting(id.as_str(), "Release", "INFOPLIST_FILE"),
            Some("ShareExtension/ShareExtension-Info.plist")
        );

        let product = graph
            .file_reference(target.product_reference.as_ref().unwrap().as_str())
            .unwrap();
        assert_eq!(product.path.as_deref(), Some("ShareExtension.appex"));
        assert_eq!(product.source_tree, "BUILT_PRODUCTS_DIR");
        assert!(graph.is_reachable(target.product_reference.as_ref().unwrap().as_str()));
        assert_eq!(
            graph
                .comment_for(target.build_configuration_list.as_str())
                .as_deref(),
            Some("Build configuration list for PBXNativeTarget \"ShareExtension\"")
        );
    }

    #[test]
    fn test_add_target_is_idempotent() {
        let mut graph = cordova_like();
        let first = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let count = graph.len();
        let second = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.len(), count);
        assert_eq!(graph.targets().len(), 2);
    }

    #[test]
    fn test_extension_is_embedded_into_host() {
        let mut graph = cordova_like();
        let host = graph.find_target("HelloCordova").unwrap();
        let ext = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();

        let host_target = graph.target(host.as_str()).unwrap();
        let embed = host_target
            .build_phases
            .iter()
            .filter_map(|p| graph.build_phase(p.as_str()))
            .find(|p| p.display_name() == EMBED_EXTENSIONS_PHASE)
            .unwrap();
        assert_eq!(embed.kind, PhaseKind::CopyFiles);
        assert_eq!(embed.files.len(), 1);
        assert_eq!(host_target.dependencies.len(), 1);

        let dependency = graph.other(host_target.dependencies[0].as_str()).unwrap();
        assert_eq!(dependency.isa, "PBXTargetDependency");
        assert_eq!(dependency.string_field("target"), Some(ext.as_str()));
        assert_eq!(
            graph.comment_for(embed.files[0].as_str()).as_deref(),
            Some("ShareExtension.appex in Embed App Extensions")
        );
    }

    #[test]
    fn test_find_target_prefers_first_in_target_order() {
        let mut graph = cordova_like();
        let first = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let second = graph
            .add_target("Other", ProductType::AppExtension, "Other")
            .unwrap();
        graph.target_mut(second.as_str()).unwrap().name = "ShareExtension".to_string();

        assert_eq!(graph.find_target("ShareExtension"), Some(first.clone()));

        // Follows the project's list, not the id order
        let targets = &mut graph.project_mut().unwrap().targets;
        let a = targets.iter().position(|id| *id == first).unwrap();
        let b = targets.iter().position(|id| *id == second).unwrap();
        targets.swap(a, b);
        assert_eq!(graph.find_target("ShareExtension"), Some(second));
    }

    #[test]
    fn test_find_or_create_group_is_idempotent() {
        let mut graph = cordova_like();
        let parent = graph.find_group("CustomTemplate").unwrap();
        let first = graph
            .find_or_create_group("ShareExtension", "CustomTemplate")
            .unwrap();
        let children = graph.group(parent.as_str()).unwrap().children.len();
        let second = graph
            .find_or_create_group("ShareExtension", "CustomTemplate")
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.group(parent.as_str()).unwrap().children.len(), children);
        assert_eq!(
            graph.group(first.as_str()).unwrap().path.as_deref(),
            Some("ShareExtension")
        );
    }

    #[test]
    fn test_missing_parent_leaves_graph_unchanged() {
        let mut graph = cordova_like();
        let before = graph.clone();
        let err = graph
            .find_or_create_group("ShareExtension", "NoSuchGroup")
            .unwrap_err();
        assert!(matches!(err, PbxError::MissingParent { .. }));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_find_group_prefers_first_in_preorder() {
        let mut graph = cordova_like();
        let a = graph.find_or_create_group("A", "CustomTemplate").unwrap();
        let nested = graph.find_or_create_group("Nested", "A").unwrap();
        // A second "Nested" directly under the products group, created by hand
        let products = graph.products_group().cloned().unwrap();
        let other = graph.add_object(ObjectData::Group(Group {
            kind: GroupKind::Group,
            name: Some("Nested".to_string()),
            path: None,
            children: Vec::new(),
            source_tree: "<group>".to_string(),
            extra: Dict::new(),
        }));
        graph.group_mut(products.as_str()).unwrap().children.push(other.clone());

        // Main group children: Products, CustomTemplate; Products comes first
        assert_eq!(graph.find_group("Nested"), Some(other));
        assert_ne!(graph.find_group("Nested"), Some(nested));
        assert_eq!(graph.find_group("A"), Some(a));
    }

    #[test]
    fn test_add_file_classification() {
        let mut graph = cordova_like();
        let target = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let group = graph
            .find_or_create_group("ShareExtension", "CustomTemplate")
            .unwrap();

        let header = graph.add_file(target.as_str(), group.as_str(), &file("Foo.h")).unwrap();
        let plist = graph
            .add_file(target.as_str(), group.as_str(), &file("Info.plist"))
            .unwrap();
        let icon = graph.add_file(target.as_str(), group.as_str(), &file("icon.png")).unwrap();

        let phase_files = |kind: PhaseKind| -> Vec<ObjectId> {
            let t = graph.target(target.as_str()).unwrap();
            t.build_phases
                .iter()
                .filter_map(|p| graph.build_phase(p.as_str()))
                .filter(|p| p.kind == kind)
                .flat_map(|p| p.files.iter())
                .map(|bf| graph.build_file(bf.as_str()).unwrap().file_ref.clone())
                .collect()
        };
        assert_eq!(phase_files(PhaseKind::Sources), vec![header]);
        assert_eq!(phase_files(PhaseKind::Resources), vec![icon]);

        let plist_build_files = graph
            .objects()
            .filter_map(|o| o.data().as_build_file())
            .filter(|b| b.file_ref == plist)
            .count();
        assert_eq!(plist_build_files, 0);
        assert_eq!(graph.group(group.as_str()).unwrap().children.len(), 3);
    }

    #[test]
    fn test_add_file_reuses_reference() {
        let mut graph = cordova_like();
        let target = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let group = graph
            .find_or_create_group("ShareExtension", "CustomTemplate")
            .unwrap();

        let first = graph
            .add_file(target.as_str(), group.as_str(), &file("ShareViewController.m"))
            .unwrap();
        let count = graph.len();
        let second = graph
            .add_file(target.as_str(), group.as_str(), &file("ShareViewController.m"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(graph.len(), count);
    }

    #[test]
    fn test_add_file_unknown_target() {
        let mut graph = cordova_like();
        let group = graph.find_group("CustomTemplate").unwrap();
        let before = graph.clone();
        let err = graph
            .add_file("NOPE", group.as_str(), &file("Foo.m"))
            .unwrap_err();
        assert!(matches!(err, PbxError::TargetNotFound(_)));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_add_files_reports_missing() {
        let dir = TempDir::new().unwrap();
        let present = dir.path().join("ShareViewController.m");
        std::fs::write(&present, "@implementation X @end").unwrap();
        let absent = dir.path().join("gone.png");

        let mut graph = cordova_like();
        let target = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let group = graph
            .find_or_create_group("ShareExtension", "CustomTemplate")
            .unwrap();

        let report = graph
            .add_files(
                target.as_str(),
                group.as_str(),
                &[ExtensionFile::new(&present), ExtensionFile::new(&absent)],
            )
            .unwrap();
        assert_eq!(report.added.len(), 1);
        assert_eq!(report.missing, vec![absent.clone()]);
        assert!(!report.is_complete());
        assert!(matches!(report.errors()[0], PbxError::MissingFile(_)));
        assert!(!report.errors()[0].is_fatal());
    }

    #[test]
    fn test_remove_target_leaves_no_dangling_references() {
        let mut graph = cordova_like();
        let base = graph.clone();
        let target = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let group = graph
            .find_or_create_group("ShareExtension", "CustomTemplate")
            .unwrap();
        let source = graph
            .add_file(target.as_str(), group.as_str(), &file("ShareViewController.m"))
            .unwrap();

        assert!(graph.remove_target("ShareExtension"));
        assert!(graph.find_target("ShareExtension").is_none());
        assert!(!graph.contains(target.as_str()));
        for object in graph.objects() {
            let fields = object.data().to_fields();
            let text = format!("{:?}", fields);
            assert!(!text.contains(target.as_str()), "{} still references target", object.id());
        }
        // Source file references stay
        assert!(graph.file_reference(source.as_str()).is_some());

        let host = graph.find_target("HelloCordova").unwrap();
        assert!(graph.target(host.as_str()).unwrap().dependencies.is_empty());
        assert!(Validatable::is_valid(&graph));

        // Only the emptied embed phase of the host is left over
        assert!(graph.remove_group("ShareExtension"));
        assert_eq!(graph.len(), base.len() + 1);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut graph = cordova_like();
        let before = graph.clone();
        assert!(!graph.remove_target("ShareExtension"));
        assert!(!graph.remove_group("ShareExtension"));
        assert_eq!(graph, before);
    }

    #[test]
    fn test_remove_group_drops_build_files() {
        let mut graph = cordova_like();
        let target = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();
        let group = graph
            .find_or_create_group("ShareExtension", "CustomTemplate")
            .unwrap();
        let source = graph
            .add_file(target.as_str(), group.as_str(), &file("ShareViewController.m"))
            .unwrap();

        assert!(graph.remove_group("ShareExtension"));
        assert!(graph.find_group("ShareExtension").is_none());
        assert!(!graph.contains(source.as_str()));
        let sources = graph.target(target.as_str()).unwrap().build_phases[0].clone();
        assert!(graph.build_phase(sources.as_str()).unwrap().files.is_empty());
        let parent = graph.find_group("CustomTemplate").unwrap();
        assert!(graph.group(parent.as_str()).unwrap().children.is_empty());
    }

    #[test]
    fn test_set_build_setting() {
        let mut graph = cordova_like();
        let target = graph
            .add_target("ShareExtension", ProductType::AppExtension, "ShareExtension")
            .unwrap();

        let touched = graph
            .set_build_setting(target.as_str(), "CODE_SIGN_IDENTITY", "iPhone Developer")
            .unwrap();
        assert_eq!(touched, 2);
        for config in ["Debug", "Release"] {
            assert_eq!(
                graph.build_setting(target.as_str(), config, "CODE_SIGN_IDENTITY"),
                Some("iPhone Developer")
            );
        }

        graph
            .set_build_setting(target.as_str(), "CODE_SIGN_IDENTITY", "iPhone Distribution")
            .unwrap();
        assert_eq!(
            graph.build_setting(target.as_str(), "Debug", "CODE_SIGN_IDENTITY"),
            Some("iPhone Distribution")
        );

        let err = graph.set_build_setting("NOPE", "A", "B").unwrap_err();
        assert!(matches!(err, PbxError::TargetNotFound(_)));
    }
}
