//! Object graph to project text, and project file IO
//!
//! Objects that were parsed and never obtained mutably are written from
//! their original text, so a file that went through parse and serialize
//! without edits comes out byte-for-byte the same when it was in Xcode's
//! layout to begin with.

use crate::objects::PbxObject;
use crate::parser::parse;
use crate::plist::{Value, Writer};
use crate::project::ProjectGraph;
use pbxgraft_core::{PbxError, PbxResult};
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

// ============================================================================
// Constants
// ============================================================================

/// Name of the project file inside an `.xcodeproj` bundle
pub const PROJECT_FILE_NAME: &str = "project.pbxproj";

/// Extension of project bundles
pub const PROJECT_BUNDLE_EXTENSION: &str = "xcodeproj";

/// Objects Xcode writes on a single line
const SINGLE_LINE_ISAS: &[&str] = &["PBXBuildFile", "PBXFileReference"];

// ============================================================================
// Serialize
// ============================================================================

/// Render a graph in Xcode's layout
pub fn serialize(graph: &ProjectGraph) -> String {
    let comments = graph.comment_index();
    let lookup = |s: &str| comments.comment(s);
    let mut w = Writer::new(&lookup);

    if !graph.header().is_empty() {
        w.raw(graph.header());
        w.raw("\n");
    }
    w.raw("{\n");

    let mut keys: Vec<&str> = graph
        .top_level()
        .keys()
        .map(String::as_str)
        .chain(["objects", "rootObject"])
        .collect();
    keys.sort_unstable();

    for key in keys {
        match key {
            "objects" => write_objects(&mut w, graph),
            "rootObject" => {
                w.indent(1);
                w.key("rootObject");
                w.raw(" = ");
                w.string(graph.root_object().as_str());
                w.raw(";\n");
            }
            other => {
                if let Some(value) = graph.top_level().get(other) {
                    w.indent(1);
                    w.entry(other, value, 1);
                    w.raw("\n");
                }
            }
        }
    }

    w.raw("}\n");
    w.finish()
}

fn write_objects(w: &mut Writer<'_>, graph: &ProjectGraph) {
    w.indent(1);
    w.key("objects");
    w.raw(" = {\n");

    let mut sections: BTreeMap<&str, Vec<&PbxObject>> = BTreeMap::new();
    for object in graph.objects() {
        sections.entry(object.isa()).or_default().push(object);
    }

    for (isa, objects) in sections {
        w.raw("\n/* Begin ");
        w.raw(isa);
        w.raw(" section */\n");
        for object in objects {
            write_object(w, object);
        }
        w.raw("/* End ");
        w.raw(isa);
        w.raw(" section */\n");
    }

    w.indent(1);
    w.raw("};\n");
}

fn write_object(w: &mut Writer<'_>, object: &PbxObject) {
    w.indent(2);
    if let Some(raw) = object.raw() {
        w.raw(raw);
        w.raw("\n");
        return;
    }

    let mut fields = object.data().to_fields();
    let isa = fields.remove("isa").unwrap_or_else(|| Value::string(object.isa()));

    w.string(object.id().as_str());
    w.raw(" = ");
    if SINGLE_LINE_ISAS.contains(&object.isa()) {
        w.raw("{");
        w.inline_entry("isa", &isa);
        w.raw(" ");
        for (key, value) in &fields {
            w.inline_entry(key, value);
            w.raw(" ");
        }
        w.raw("};\n");
    } else {
        w.raw("{\n");
        w.indent(3);
        w.entry("isa", &isa, 3);
        w.raw("\n");
        for (key, value) in &fields {
            w.indent(3);
            w.entry(key, value, 3);
            w.raw("\n");
        }
        w.indent(2);
        w.raw("};\n");
    }
}

// ============================================================================
// Load Functions
// ============================================================================

/// Load a project from a `project.pbxproj` file
pub fn load_project(path: impl AsRef<Path>) -> PbxResult<ProjectGraph> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(PbxError::ProjectNotFound(path.to_path_buf()));
    }

    let text = std::fs::read_to_string(path).map_err(|e| PbxError::FileRead {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let graph = parse(&text)?;
    tracing::debug!(path = %path.display(), objects = graph.len(), "Loaded project");
    Ok(graph)
}

/// Find the `project.pbxproj` of the first `.xcodeproj` bundle in `dir`
pub fn find_project_file(dir: impl AsRef<Path>) -> PbxResult<PathBuf> {
    let dir = dir.as_ref();
    let entries = std::fs::read_dir(dir).map_err(|_| PbxError::ProjectNotFound(dir.to_path_buf()))?;

    let mut bundles: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| is_project_bundle(path))
        .collect();
    bundles.sort();

    bundles
        .into_iter()
        .map(|bundle| bundle.join(PROJECT_FILE_NAME))
        .find(|file| file.is_file())
        .ok_or_else(|| PbxError::ProjectNotFound(dir.to_path_buf()))
}

/// Check if a path is an `.xcodeproj` bundle
pub fn is_project_bundle(path: impl AsRef<Path>) -> bool {
    let path = path.as_ref();
    path.is_dir()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(PROJECT_BUNDLE_EXTENSION))
}

/// Name of the app a project file belongs to (`HelloCordova` for
/// `HelloCordova.xcodeproj/project.pbxproj`)
pub fn project_name(path: impl AsRef<Path>) -> Option<String> {
    path.as_ref()
        .parent()?
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
}

// ============================================================================
// Save Functions
// ============================================================================

/// Save a project to a file
///
/// The text is written to a temporary file in the same directory and moved
/// over the original, so readers never see a partial file. Nothing is
/// written when the file already holds the same text. Returns whether the
/// file was written.
pub fn save_project(graph: &ProjectGraph, path: impl AsRef<Path>) -> PbxResult<bool> {
    let path = path.as_ref();
    let text = serialize(graph);

    if std::fs::read_to_string(path).is_ok_and(|existing| existing == text) {
        tracing::debug!(path = %path.display(), "Project unchanged, not writing");
        return Ok(false);
    }

    write_atomic(path, &text)?;
    tracing::info!(path = %path.display(), bytes = text.len(), "Saved project");
    Ok(true)
}

/// Replace the contents of `path` through a temporary sibling file
pub fn write_atomic(path: &Path, text: &str) -> PbxResult<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if !parent.exists() {
        std::fs::create_dir_all(&parent).map_err(|e| PbxError::DirectoryCreate {
            path: parent.clone(),
            message: e.to_string(),
        })?;
    }

    let write_error = |e: std::io::Error| PbxError::FileWrite {
        path: path.to_path_buf(),
        message: e.to_string(),
    };

    let mut temp = tempfile::NamedTempFile::new_in(&parent).map_err(write_error)?;
    temp.write_all(text.as_bytes()).map_err(write_error)?;
    temp.as_file().sync_all().map_err(write_error)?;
    temp.persist(path).map_err(|e| write_error(e.error))?;
    Ok(())
}

/// Create a backup of a project file before overwriting
pub fn backup_project(path: impl AsRef<Path>) -> PbxResult<Option<PathBuf>> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(None);
    }

    let mut backup = path.as_os_str().to_owned();
    backup.push(".backup");
    let backup_path = PathBuf::from(backup);

    std::fs::copy(path, &backup_path).map_err(|e| PbxError::FileWrite {
        path: backup_path.clone(),
        message: format!("Failed to create backup: {}", e),
    })?;

    Ok(Some(backup_path))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::{FileReference, ObjectData};
    use crate::plist::Dict;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_new_project_round_trip() {
        let graph = ProjectGraph::new("App");
        let text = serialize(&graph);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, graph);
        assert_eq!(serialize(&parsed), text);
    }

    #[test]
    fn test_round_trip_with_comment_terminator_in_names() {
        let mut graph = ProjectGraph::new("App");
        graph
            .add_target("Ext */ x", pbxgraft_core::ProductType::AppExtension, "Ext")
            .unwrap();
        graph.find_or_create_group("Group */ y", "Products").unwrap();

        let text = serialize(&graph);
        assert!(text.contains("/* Ext (*)/ x */"));
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, graph);
        assert_eq!(serialize(&parsed), text);
    }

    #[test]
    fn test_layout() {
        let graph = ProjectGraph::new("App");
        let text = serialize(&graph);
        assert!(text.starts_with("// !$*UTF8*$!\n{\n\tarchiveVersion = 1;\n\tclasses = {\n\t};\n"));
        assert!(text.contains("\tobjects = {\n\n/* Begin PBXGroup section */\n"));
        assert!(text.contains("/* End PBXGroup section */\n\n/* Begin PBXProject section */\n"));
        assert!(text.contains("/* End XCConfigurationList section */\n\t};\n\trootObject = "));
        assert!(text.ends_with(" /* Project object */;\n}\n"));
        assert!(text.contains("\t\t\tisa = XCConfigurationList;\n"));
        assert!(text.contains("/* Build configuration list for PBXProject \"App\" */"));
    }

    #[test]
    fn test_file_reference_single_line() {
        let mut graph = ProjectGraph::new("App");
        let id = graph.add_object(ObjectData::FileReference(FileReference {
            name: None,
            path: Some("ShareViewController.m".to_string()),
            last_known_file_type: Some("sourcecode.c.objc".to_string()),
            explicit_file_type: None,
            source_tree: "<group>".to_string(),
            extra: Dict::new(),
        }));
        let text = serialize(&graph);
        let expected = format!(
            "\t\t{} /* ShareViewController.m */ = {{isa = PBXFileReference; lastKnownFileType = sourcecode.c.objc; path = ShareViewController.m; sourceTree = \"<group>\"; }};\n",
            id
        );
        assert!(text.contains(&expected), "{}", text);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let err = load_project("/nonexistent/App.xcodeproj/project.pbxproj").unwrap_err();
        assert!(matches!(err, PbxError::ProjectNotFound(_)));
    }

    #[test]
    fn test_save_and_load_project() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("App.xcodeproj").join(PROJECT_FILE_NAME);
        let graph = ProjectGraph::new("App");

        assert!(save_project(&graph, &path).unwrap());
        let loaded = load_project(&path).unwrap();
        assert_eq!(loaded, graph);

        // Same text: no second write
        assert!(!save_project(&loaded, &path).unwrap());
    }

    #[test]
    fn test_find_project_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            find_project_file(dir.path()),
            Err(PbxError::ProjectNotFound(_))
        ));

        let bundle = dir.path().join("HelloCordova.xcodeproj");
        std::fs::create_dir_all(&bundle).unwrap();
        std::fs::write(bundle.join(PROJECT_FILE_NAME), "").unwrap();
        std::fs::create_dir_all(dir.path().join("CordovaLib")).unwrap();

        let found = find_project_file(dir.path()).unwrap();
        assert_eq!(found, bundle.join(PROJECT_FILE_NAME));
        assert_eq!(project_name(&found).as_deref(), Some("HelloCordova"));
    }

    #[test]
    fn test_backup_project() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(PROJECT_FILE_NAME);
        std::fs::write(&path, "content").unwrap();

        let backup = backup_project(&path).unwrap().unwrap();
        assert_eq!(backup, dir.path().join("project.pbxproj.backup"));
        assert_eq!(std::fs::read_to_string(backup).unwrap(), "content");
    }

    #[test]
    fn test_backup_nonexistent() {
        let result = backup_project("/nonexistent/project.pbxproj").unwrap();
        assert!(result.is_none());
    }
}
