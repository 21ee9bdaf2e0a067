//! Project text to object graph

use crate::objects::{ObjectData, PbxObject};
use crate::plist::{Value, parse_document};
use crate::project::ProjectGraph;
use crate::validation::{ReferencesRule, ValidationRule};
use pbxgraft_core::{ObjectId, PbxError, PbxResult};
use std::collections::BTreeMap;

/// Parse the text of a `project.pbxproj` file
///
/// Fails with [`PbxError::Format`] when the text is not well formed, when
/// `objects` or `rootObject` is missing, when an object lacks its `isa` or a
/// field its kind requires, or when a modeled reference does not resolve to
/// an object of the expected kind.
pub fn parse(text: &str) -> PbxResult<ProjectGraph> {
    let mut document = parse_document(text)?;

    let objects = match document.root.remove("objects") {
        Some(Value::Dict(objects)) => objects,
        Some(_) => return Err(PbxError::format("'objects' must be a dictionary")),
        None => return Err(PbxError::format("missing 'objects' dictionary")),
    };
    let root_object = match document.root.remove("rootObject") {
        Some(Value::String(id)) => ObjectId::from(id),
        Some(_) => return Err(PbxError::format("'rootObject' must be an object id")),
        None => return Err(PbxError::format("missing 'rootObject'")),
    };

    let mut graph_objects = BTreeMap::new();
    for (id, value) in objects {
        let Value::Dict(fields) = value else {
            return Err(PbxError::format(format!("object {} is not a dictionary", id)));
        };
        let data = ObjectData::from_fields(&id, fields)?;
        let raw = document.object_text(text, &id).map(str::to_string);
        let comment = raw.as_deref().and_then(|raw| header_comment(raw, &id));
        let id = ObjectId::from(id);
        graph_objects.insert(id.clone(), PbxObject::parsed(id, data, comment, raw));
    }

    let graph = ProjectGraph::from_parts(
        document.header,
        document.root,
        graph_objects,
        root_object,
    );

    if let Some(error) = ReferencesRule.validate(&graph).errors.into_iter().next() {
        return Err(PbxError::format(error.to_string()));
    }

    tracing::debug!(objects = graph.len(), "Parsed project graph");
    Ok(graph)
}

/// Comment between an object's id and its `=`
fn header_comment(raw: &str, id: &str) -> Option<String> {
    let rest = raw.strip_prefix(id)?.trim_start();
    let body = rest.strip_prefix("/*")?;
    let end = body.find("*/")?;
    Some(body[..end].trim().to_string())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const MINIMAL: &str = r#"// !$*UTF8*$!
{
	archiveVersion = 1;
	classes = {
	};
	objectVersion = 46;
	objects = {

/* Begin PBXGroup section */
		G00000000000000000000001 = {
			isa = PBXGroup;
			children = (
			);
			sourceTree = "<group>";
		};
/* End PBXGroup section */

/* Begin PBXProject section */
		P00000000000000000000001 /* Project object */ = {
			isa = PBXProject;
			buildConfigurationList = L00000000000000000000001 /* Build configuration list for PBXProject "App" */;
			mainGroup = G00000000000000000000001;
			targets = (
			);
		};
/* End PBXProject section */

/* Begin XCBuildConfiguration section */
		C00000000000000000000001 /* Debug */ = {
			isa = XCBuildConfiguration;
			buildSettings = {
			};
			name = Debug;
		};
/* End XCBuildConfiguration section */

/* Begin XCConfigurationList section */
		L00000000000000000000001 /* Build configuration list for PBXProject "App" */ = {
			isa = XCConfigurationList;
			buildConfigurations = (
				C00000000000000000000001 /* Debug */,
			);
			defaultConfigurationName = Debug;
		};
/* End XCConfigurationList section */
	};
	rootObject = P00000000000000000000001 /* Project object */;
}
"#;

    #[test]
    fn test_parse_minimal_project() {
        let graph = parse(MINIMAL).unwrap();
        assert_eq!(graph.len(), 4);
        assert_eq!(graph.header(), "// !$*UTF8*$!");
        assert_eq!(graph.root_object().as_str(), "P00000000000000000000001");
        assert_eq!(graph.top_level().len(), 3);

        let list = graph.object("L00000000000000000000001").unwrap();
        assert_eq!(
            list.comment(),
            Some("Build configuration list for PBXProject \"App\"")
        );
        assert!(list.raw().unwrap().starts_with("L00000000000000000000001 /* Build"));
        assert!(list.raw().unwrap().ends_with("};"));
        assert_eq!(graph.object("G00000000000000000000001").unwrap().comment(), None);
    }

    #[test]
    fn test_dangling_reference_is_format_error() {
        let text = MINIMAL.replace(
            "mainGroup = G00000000000000000000001;",
            "mainGroup = G00000000000000000000009;",
        );
        let err = parse(&text).unwrap_err();
        assert!(matches!(err, PbxError::Format(_)));
        assert!(err.to_string().contains("G00000000000000000000009"));
    }

    #[test]
    fn test_wrong_reference_kind_is_format_error() {
        let text = MINIMAL.replace(
            "mainGroup = G00000000000000000000001;",
            "mainGroup = C00000000000000000000001;",
        );
        let err = parse(&text).unwrap_err();
        assert!(err.to_string().contains("expected a group"));
    }

    #[test]
    fn test_missing_root_object() {
        let text = MINIMAL.replace(
            "\trootObject = P00000000000000000000001 /* Project object */;\n",
            "",
        );
        let err = parse(&text).unwrap_err();
        assert_eq!(err.to_string(), "Malformed project file: missing 'rootObject'");
    }

    #[test]
    fn test_root_object_must_be_project() {
        let text = MINIMAL.replace(
            "rootObject = P00000000000000000000001",
            "rootObject = G00000000000000000000001",
        );
        assert!(parse(&text).is_err());
    }

    #[test]
    fn test_object_without_isa() {
        let text = MINIMAL.replace("\t\t\tisa = PBXGroup;\n", "");
        let err = parse(&text).unwrap_err();
        assert!(err.to_string().contains("has no isa"));
    }

    #[test]
    fn test_truncated_text() {
        let truncated = &MINIMAL[..MINIMAL.len() / 2];
        let err = parse(truncated).unwrap_err();
        assert!(matches!(err, PbxError::Format(_)));
    }

    #[test]
    fn test_header_comment() {
        assert_eq!(
            header_comment("AB /* Foo.m in Sources */ = {isa = PBXBuildFile; };", "AB"),
            Some("Foo.m in Sources".to_string())
        );
        assert_eq!(header_comment("AB = {isa = PBXGroup; };", "AB"), None);
    }
}
