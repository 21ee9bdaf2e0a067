//! The project graph
//!
//! `ProjectGraph` owns every object of a project file, keyed by id, together
//! with the top-level keys that surround the `objects` dictionary. Public
//! access is read-only; objects are created and removed by the mutation
//! methods in [`crate::mutation`], which go through the crate-private
//! primitives below.

use crate::objects::{
    BuildConfiguration, BuildFile, BuildPhase, ConfigurationList, FileReference, Group, GroupKind,
    ObjectData, OtherObject, PbxObject, Project, Target,
};
use crate::plist::{DEFAULT_HEADER, Dict, Value};
use pbxgraft_core::{Named, ObjectId, PbxError, PbxResult};
use std::collections::{BTreeMap, HashMap, HashSet};

// ============================================================================
// ProjectGraph
// ============================================================================

/// Root container for a parsed `project.pbxproj`
#[derive(Debug, Clone)]
pub struct ProjectGraph {
    /// Text preceding the root dictionary
    header: String,

    /// Top-level keys other than `objects` and `rootObject`
    top_level: Dict,

    /// All objects, keyed by id
    objects: BTreeMap<ObjectId, PbxObject>,

    /// Id of the `PBXProject` object
    root_object: ObjectId,

    /// Ids removed during this session; never minted again
    retired: HashSet<ObjectId>,
}

impl PartialEq for ProjectGraph {
    fn eq(&self, other: &Self) -> bool {
        self.root_object == other.root_object
            && self.top_level == other.top_level
            && self.objects == other.objects
    }
}

impl ProjectGraph {
    /// Create an empty project: a main group holding a `Products` group and
    /// a project configuration list with `Debug` and `Release`
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let mut graph = Self {
            header: DEFAULT_HEADER.to_string(),
            top_level: Dict::new(),
            objects: BTreeMap::new(),
            root_object: ObjectId::new(""),
            retired: HashSet::new(),
        };
        graph
            .top_level
            .insert("archiveVersion".to_string(), Value::string("1"));
        graph
            .top_level
            .insert("classes".to_string(), Value::Dict(Dict::new()));
        graph
            .top_level
            .insert("objectVersion".to_string(), Value::string("46"));

        let products = graph.add_object(ObjectData::Group(Group {
            kind: GroupKind::Group,
            name: Some("Products".to_string()),
            path: None,
            children: Vec::new(),
            source_tree: "<group>".to_string(),
            extra: Dict::new(),
        }));
        let main_group = graph.add_object(ObjectData::Group(Group {
            kind: GroupKind::Group,
            name: None,
            path: None,
            children: vec![products.clone()],
            source_tree: "<group>".to_string(),
            extra: Dict::new(),
        }));

        let configurations = ["Debug", "Release"]
            .into_iter()
            .map(|config| {
                graph.add_object(ObjectData::BuildConfiguration(BuildConfiguration {
                    name: config.to_string(),
                    build_settings: Dict::from([(
                        "SDKROOT".to_string(),
                        Value::string("iphoneos"),
                    )]),
                    extra: Dict::new(),
                }))
            })
            .collect();
        let list = graph.add_object_with_comment(
            ObjectData::ConfigurationList(ConfigurationList {
                build_configurations: configurations,
                default_configuration_name: Some("Release".to_string()),
                extra: Dict::from([(
                    "defaultConfigurationIsVisible".to_string(),
                    Value::string("0"),
                )]),
            }),
            format!("Build configuration list for PBXProject \"{}\"", name),
        );

        let mut extra = Dict::new();
        extra.insert("attributes".to_string(), Value::Dict(Dict::new()));
        extra.insert(
            "compatibilityVersion".to_string(),
            Value::string("Xcode 3.2"),
        );
        extra.insert("developmentRegion".to_string(), Value::string("en"));
        extra.insert("hasScannedForEncodings".to_string(), Value::string("0"));
        extra.insert("knownRegions".to_string(), Value::string_array(["en"]));
        extra.insert("projectDirPath".to_string(), Value::string(""));
        extra.insert("projectRoot".to_string(), Value::string(""));

        graph.root_object = graph.add_object(ObjectData::Project(Project {
            main_group,
            targets: Vec::new(),
            build_configuration_list: list,
            product_ref_group: Some(products),
            extra,
        }));
        graph
    }

    /// Assemble a graph from parsed parts
    pub(crate) fn from_parts(
        header: String,
        top_level: Dict,
        objects: BTreeMap<ObjectId, PbxObject>,
        root_object: ObjectId,
    ) -> Self {
        Self {
            header,
            top_level,
            objects,
            root_object,
            retired: HashSet::new(),
        }
    }

    // ========================================================================
    // Read Access
    // ========================================================================

    /// Text preceding the root dictionary
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Top-level keys other than `objects` and `rootObject`
    pub fn top_level(&self) -> &Dict {
        &self.top_level
    }

    /// Id of the `PBXProject` object
    pub fn root_object(&self) -> &ObjectId {
        &self.root_object
    }

    /// The `PBXProject` object
    pub fn project(&self) -> PbxResult<&Project> {
        match self.objects.get(&self.root_object).map(PbxObject::data) {
            Some(ObjectData::Project(project)) => Ok(project),
            _ => Err(PbxError::integrity(format!(
                "root object {} is not a PBXProject",
                self.root_object
            ))),
        }
    }

    /// Get an object by id
    pub fn object(&self, id: &str) -> Option<&PbxObject> {
        self.objects.get(id)
    }

    /// Check whether an id is in use
    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    /// All objects, ordered by id
    pub fn objects(&self) -> impl Iterator<Item = &PbxObject> {
        self.objects.values()
    }

    /// Number of objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the graph holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn data(&self, id: &str) -> Option<&ObjectData> {
        self.objects.get(id).map(PbxObject::data)
    }

    pub fn target(&self, id: &str) -> Option<&Target> {
        self.data(id).and_then(ObjectData::as_target)
    }

    pub fn group(&self, id: &str) -> Option<&Group> {
        self.data(id).and_then(ObjectData::as_group)
    }

    pub fn build_phase(&self, id: &str) -> Option<&BuildPhase> {
        self.data(id).and_then(ObjectData::as_build_phase)
    }

    pub fn file_reference(&self, id: &str) -> Option<&FileReference> {
        self.data(id).and_then(ObjectData::as_file_reference)
    }

    pub fn build_file(&self, id: &str) -> Option<&BuildFile> {
        self.data(id).and_then(ObjectData::as_build_file)
    }

    pub fn build_configuration(&self, id: &str) -> Option<&BuildConfiguration> {
        self.data(id).and_then(ObjectData::as_build_configuration)
    }

    pub fn configuration_list(&self, id: &str) -> Option<&ConfigurationList> {
        self.data(id).and_then(ObjectData::as_configuration_list)
    }

    pub fn other(&self, id: &str) -> Option<&OtherObject> {
        self.data(id).and_then(ObjectData::as_other)
    }

    /// Targets in the project's order
    pub fn targets(&self) -> Vec<(&ObjectId, &Target)> {
        let Ok(project) = self.project() else {
            return Vec::new();
        };
        project
            .targets
            .iter()
            .filter_map(|id| self.target(id.as_str()).map(|t| (id, t)))
            .collect()
    }

    /// Build configurations of a configuration list, in list order
    pub fn configurations_of(&self, list: &str) -> Vec<(&ObjectId, &BuildConfiguration)> {
        self.configuration_list(list)
            .map(|l| {
                l.build_configurations
                    .iter()
                    .filter_map(|id| self.build_configuration(id.as_str()).map(|c| (id, c)))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Group Tree
    // ========================================================================

    /// Id of the project's main group
    pub fn main_group(&self) -> Option<&ObjectId> {
        self.project().ok().map(|p| &p.main_group)
    }

    /// Id of the group holding built products
    pub fn products_group(&self) -> Option<&ObjectId> {
        let project = self.project().ok()?;
        if let Some(id) = &project.product_ref_group {
            return Some(id);
        }
        self.group(project.main_group.as_str())?
            .children
            .iter()
            .find(|id| {
                self.data(id.as_str())
                    .is_some_and(|d| d.as_group().is_some() && d.name_matches("Products"))
            })
    }

    /// Every group reachable from the main group, in pre-order
    ///
    /// Children are visited in their stored order, so name lookups that take
    /// the first match are stable across runs.
    pub fn groups_preorder(&self) -> Vec<&ObjectId> {
        let mut order = Vec::new();
        let Some(root) = self.main_group() else {
            return order;
        };
        let mut visited = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(group) = self.group(id.as_str()) else {
                continue;
            };
            order.push(id);
            for child in group.children.iter().rev() {
                if self.group(child.as_str()).is_some() {
                    stack.push(child);
                }
            }
        }
        order
    }

    /// First group (in pre-order) whose children include `child`
    pub fn parent_group(&self, child: &str) -> Option<&ObjectId> {
        self.groups_preorder().into_iter().find(|id| {
            self.group(id.as_str())
                .is_some_and(|g| g.children.iter().any(|c| c.as_str() == child))
        })
    }

    /// Groups and file references of the subtree rooted at `group`
    pub fn subtree(&self, group: &str) -> (Vec<ObjectId>, Vec<ObjectId>) {
        let mut groups = Vec::new();
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut stack = vec![ObjectId::from(group)];
        while let Some(id) = stack.pop() {
            if !seen.insert(id.clone()) {
                continue;
            }
            match self.data(id.as_str()) {
                Some(ObjectData::Group(g)) => {
                    stack.extend(g.children.iter().cloned());
                    groups.push(id);
                }
                Some(ObjectData::FileReference(_)) => files.push(id),
                _ => {}
            }
        }
        (groups, files)
    }

    /// Whether `file` is a descendant of the main group
    pub fn is_reachable(&self, file: &str) -> bool {
        self.groups_preorder().into_iter().any(|id| {
            self.group(id.as_str())
                .is_some_and(|g| g.children.iter().any(|c| c.as_str() == file))
        })
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Comment written after references to `id`
    ///
    /// Builds a [`CommentIndex`] for one lookup; use [`Self::comment_index`]
    /// when many comments are needed.
    pub fn comment_for(&self, id: &str) -> Option<String> {
        self.comment_index().comment(id)
    }

    /// Index of the build-file phases and configuration-list owners that
    /// reference comments depend on
    pub fn comment_index(&self) -> CommentIndex<'_> {
        let mut phases = HashMap::new();
        let mut list_owners = HashMap::new();
        for object in self.objects.values() {
            match object.data() {
                ObjectData::BuildPhase(phase) => {
                    for file in &phase.files {
                        phases.entry(file.as_str()).or_insert(phase);
                    }
                }
                ObjectData::Target(t) => {
                    list_owners
                        .entry(t.build_configuration_list.as_str())
                        .or_insert_with(|| {
                            format!(
                                "Build configuration list for {} \"{}\"",
                                t.kind.isa(),
                                t.name
                            )
                        });
                }
                ObjectData::Project(p) => {
                    list_owners
                        .entry(p.build_configuration_list.as_str())
                        .or_insert_with(|| "Build configuration list for PBXProject".to_string());
                }
                _ => {}
            }
        }
        CommentIndex {
            graph: self,
            phases,
            list_owners,
        }
    }

    // ========================================================================
    // Mutation Primitives
    // ========================================================================

    /// Mint an id unused by any live or retired object
    pub(crate) fn mint_id(&self) -> ObjectId {
        ObjectId::mint_unique(|id| self.objects.contains_key(id) || self.retired.contains(id))
    }

    /// Insert a new object under a fresh id
    pub(crate) fn add_object(&mut self, data: ObjectData) -> ObjectId {
        let id = self.mint_id();
        self.objects
            .insert(id.clone(), PbxObject::new(id.clone(), data));
        id
    }

    /// Insert a new object with an explicit display comment
    pub(crate) fn add_object_with_comment(
        &mut self,
        data: ObjectData,
        comment: impl Into<String>,
    ) -> ObjectId {
        let id = self.mint_id();
        self.objects.insert(
            id.clone(),
            PbxObject::new(id.clone(), data).with_comment(comment),
        );
        id
    }

    /// Mutable data of an object; the object will be regenerated on write
    pub(crate) fn data_mut(&mut self, id: &str) -> Option<&mut ObjectData> {
        self.objects.get_mut(id).map(PbxObject::data_mut)
    }

    pub(crate) fn project_mut(&mut self) -> PbxResult<&mut Project> {
        let root = self.root_object.clone();
        match self.data_mut(root.as_str()) {
            Some(ObjectData::Project(project)) => Ok(project),
            _ => Err(PbxError::integrity(format!(
                "root object {} is not a PBXProject",
                root
            ))),
        }
    }

    pub(crate) fn target_mut(&mut self, id: &str) -> Option<&mut Target> {
        match self.data_mut(id)? {
            ObjectData::Target(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn group_mut(&mut self, id: &str) -> Option<&mut Group> {
        match self.data_mut(id)? {
            ObjectData::Group(g) => Some(g),
            _ => None,
        }
    }

    pub(crate) fn build_phase_mut(&mut self, id: &str) -> Option<&mut BuildPhase> {
        match self.data_mut(id)? {
            ObjectData::BuildPhase(p) => Some(p),
            _ => None,
        }
    }

    pub(crate) fn build_configuration_mut(&mut self, id: &str) -> Option<&mut BuildConfiguration> {
        match self.data_mut(id)? {
            ObjectData::BuildConfiguration(c) => Some(c),
            _ => None,
        }
    }

    /// Remove objects and purge every reference to them
    ///
    /// List entries and dictionary keys naming a removed id are dropped.
    /// Build files whose file is removed, and unmodeled objects with a
    /// top-level field naming a removed id (container proxies, target
    /// dependencies), are removed in turn until nothing references a
    /// removed id. Returns the number of objects removed.
    pub(crate) fn remove_cascade(&mut self, ids: impl IntoIterator<Item = ObjectId>) -> usize {
        let mut pending: Vec<ObjectId> = ids.into_iter().collect();
        let mut removed_count = 0;

        while !pending.is_empty() {
            let mut batch = HashSet::new();
            for id in pending.drain(..) {
                if self.objects.remove(&id).is_some() {
                    self.retired.insert(id.clone());
                    batch.insert(id);
                }
            }
            if batch.is_empty() {
                break;
            }
            removed_count += batch.len();

            let holders: Vec<ObjectId> = self
                .objects
                .values()
                .filter(|o| mentions_fields(&o.data().to_fields(), &batch))
                .map(|o| o.id().clone())
                .collect();

            for id in holders {
                if self.is_dependent(id.as_str(), &batch) {
                    pending.push(id);
                } else if let Some(data) = self.data_mut(id.as_str()) {
                    scrub_object(data, &batch);
                }
            }
        }
        removed_count
    }

    /// Whether an object cannot exist without one of `removed`
    fn is_dependent(&self, id: &str, removed: &HashSet<ObjectId>) -> bool {
        match self.data(id) {
            Some(ObjectData::BuildFile(b)) => removed.contains(&b.file_ref),
            Some(ObjectData::Other(o)) => o
                .fields
                .values()
                .any(|v| v.as_str().is_some_and(|s| removed.contains(s))),
            _ => false,
        }
    }
}

// ============================================================================
// Reference Scrubbing
// ============================================================================

fn mentions(value: &Value, removed: &HashSet<ObjectId>) -> bool {
    match value {
        Value::String(s) => removed.contains(s.as_str()),
        Value::Array(items) => items.iter().any(|v| mentions(v, removed)),
        Value::Dict(dict) => mentions_fields(dict, removed),
    }
}

fn mentions_fields(dict: &Dict, removed: &HashSet<ObjectId>) -> bool {
    dict.iter()
        .any(|(k, v)| removed.contains(k.as_str()) || mentions(v, removed))
}

fn scrub_value(value: &mut Value, removed: &HashSet<ObjectId>) {
    match value {
        Value::String(_) => {}
        Value::Array(items) => {
            items.retain(|v| !v.as_str().is_some_and(|s| removed.contains(s)));
            items.iter_mut().for_each(|v| scrub_value(v, removed));
        }
        Value::Dict(dict) => scrub_dict(dict, removed),
    }
}

fn scrub_dict(dict: &mut Dict, removed: &HashSet<ObjectId>) {
    dict.retain(|k, v| {
        !removed.contains(k.as_str()) && !v.as_str().is_some_and(|s| removed.contains(s))
    });
    dict.values_mut().for_each(|v| scrub_value(v, removed));
}

fn scrub_ids(ids: &mut Vec<ObjectId>, removed: &HashSet<ObjectId>) {
    ids.retain(|id| !removed.contains(id));
}

fn scrub_object(data: &mut ObjectData, removed: &HashSet<ObjectId>) {
    match data {
        ObjectData::Project(p) => {
            scrub_ids(&mut p.targets, removed);
            if p.product_ref_group.as_ref().is_some_and(|id| removed.contains(id)) {
                p.product_ref_group = None;
            }
        }
        ObjectData::Target(t) => {
            scrub_ids(&mut t.build_phases, removed);
            scrub_ids(&mut t.dependencies, removed);
            if t.product_reference.as_ref().is_some_and(|id| removed.contains(id)) {
                t.product_reference = None;
            }
        }
        ObjectData::Group(g) => scrub_ids(&mut g.children, removed),
        ObjectData::BuildPhase(p) => scrub_ids(&mut p.files, removed),
        ObjectData::ConfigurationList(l) => scrub_ids(&mut l.build_configurations, removed),
        ObjectData::BuildConfiguration(c) => scrub_dict(&mut c.build_settings, removed),
        ObjectData::FileReference(_) | ObjectData::BuildFile(_) => {}
        ObjectData::Other(o) => scrub_dict(&mut o.fields, removed),
    }
    if let Some(extra) = data.extra_mut() {
        scrub_dict(extra, removed);
    }
}

// ============================================================================
// Comments
// ============================================================================

/// Reference comments of a graph, computed from one pass over its objects
pub struct CommentIndex<'a> {
    graph: &'a ProjectGraph,
    phases: HashMap<&'a str, &'a BuildPhase>,
    list_owners: HashMap<&'a str, String>,
}

impl CommentIndex<'_> {
    /// Comment written after references to `id`
    pub fn comment(&self, id: &str) -> Option<String> {
        let object = self.graph.objects.get(id)?;
        if let Some(comment) = object.comment() {
            return Some(comment.to_string());
        }
        match object.data() {
            ObjectData::BuildFile(build_file) => {
                let file = self.comment(build_file.file_ref.as_str())?;
                match self.phases.get(id) {
                    Some(phase) => Some(format!("{} in {}", file, phase.display_name())),
                    None => Some(file),
                }
            }
            ObjectData::ConfigurationList(_) => Some(
                self.list_owners
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| "Build configuration list".to_string()),
            ),
            data => data.default_comment(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
