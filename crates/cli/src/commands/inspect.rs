//! Inspect command - show what the Xcode project contains

use anyhow::Result;
use clap::Args;
use colored::Colorize;
use pbxgraft_ir::{Named, ObjectId, ProjectGraph, Validator};
use serde::Serialize;

use super::{hook_context, load_graph};
use crate::GlobalOptions;

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Project summary
#[derive(Debug, Serialize)]
pub struct ProjectSummary {
    pub name: String,
    pub root_object: ObjectId,
    pub objects: usize,
    pub targets: Vec<TargetSummary>,
    pub groups: Option<GroupNode>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct TargetSummary {
    pub id: ObjectId,
    pub name: String,
    pub product_type: Option<String>,
    pub phases: Vec<PhaseSummary>,
}

#[derive(Debug, Serialize)]
pub struct PhaseSummary {
    pub id: ObjectId,
    pub name: String,
    pub files: usize,
}

/// A group with its subgroups; file references are only counted
#[derive(Debug, Serialize)]
pub struct GroupNode {
    pub id: ObjectId,
    pub name: String,
    pub files: usize,
    pub children: Vec<GroupNode>,
}

impl ProjectSummary {
    /// Summarize a loaded graph
    pub fn from_graph(name: impl Into<String>, graph: &ProjectGraph) -> Self {
        let targets = graph
            .targets()
            .into_iter()
            .map(|(id, target)| TargetSummary {
                id: id.clone(),
                name: target.name.clone(),
                product_type: target.product_type.clone(),
                phases: target
                    .build_phases
                    .iter()
                    .filter_map(|phase_id| {
                        graph.build_phase(phase_id.as_str()).map(|phase| PhaseSummary {
                            id: phase_id.clone(),
                            name: phase.display_name().to_string(),
                            files: phase.files.len(),
                        })
                    })
                    .collect(),
            })
            .collect();

        let mut visited = Vec::new();
        let groups = graph
            .main_group()
            .and_then(|main| group_node(graph, main, &mut visited));

        let validation = Validator::with_default_rules().validate(graph);

        Self {
            name: name.into(),
            root_object: graph.root_object().clone(),
            objects: graph.len(),
            targets,
            groups,
            errors: validation.errors.iter().map(ToString::to_string).collect(),
            warnings: validation.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

fn group_node(graph: &ProjectGraph, id: &ObjectId, visited: &mut Vec<ObjectId>) -> Option<GroupNode> {
    if visited.contains(id) {
        return None;
    }
    visited.push(id.clone());

    let group = graph.group(id.as_str())?;
    let name = graph
        .object(id.as_str())
        .and_then(|o| o.data().display_name().map(str::to_string))
        .unwrap_or_else(|| id.to_string());

    let mut files = 0;
    let mut children = Vec::new();
    for child in &group.children {
        if graph.group(child.as_str()).is_some() {
            children.extend(group_node(graph, child, visited));
        } else {
            files += 1;
        }
    }

    Some(GroupNode {
        id: id.clone(),
        name,
        files,
        children,
    })
}

/// Execute the inspect command
pub fn execute(args: InspectArgs, global: GlobalOptions) -> Result<()> {
    let ctx = hook_context(&global, &[], global.hook_config())?;
    let graph = load_graph(&ctx)?;
    let summary = ProjectSummary::from_graph(&ctx.project_name, &graph);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{}", format!("{}.xcodeproj", summary.name).bold());
    println!("  {} objects", summary.objects);

    println!();
    println!("{}", "Targets".bold());
    for target in &summary.targets {
        println!(
            "  {} {}",
            target.name.green(),
            target.product_type.as_deref().unwrap_or("").dimmed()
        );
        for phase in &target.phases {
            println!("    {} ({} files)", phase.name, phase.files);
        }
    }

    if let Some(root) = &summary.groups {
        println!();
        println!("{}", "Groups".bold());
        print_group(root, 1);
    }

    if !summary.errors.is_empty() || !summary.warnings.is_empty() {
        println!();
        for error in &summary.errors {
            println!("  {} {}", "✗".red(), error);
        }
        for warning in &summary.warnings {
            println!("  {} {}", "!".yellow(), warning);
        }
    }
    Ok(())
}

fn print_group(node: &GroupNode, depth: usize) {
    let indent = "  ".repeat(depth);
    if node.files > 0 {
        println!("{}{}/ ({} files)", indent, node.name, node.files);
    } else {
        println!("{}{}/", indent, node.name);
    }
    for child in &node.children {
        print_group(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{cordova_project, parse_global};
    use pbxgraft_ir::load_project;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_summary_of_fixture() {
        let dir = cordova_project();
        let graph = load_project(
            dir.path()
                .join("platforms/ios/HelloCordova.xcodeproj/project.pbxproj"),
        )
        .unwrap();

        let summary = ProjectSummary::from_graph("HelloCordova", &graph);
        assert_eq!(summary.targets.len(), 1);
        assert_eq!(summary.targets[0].name, "HelloCordova");
        assert_eq!(
            summary.targets[0]
                .phases
                .iter()
                .map(|p| p.name.as_str())
                .collect::<Vec<_>>(),
            vec!["Copy www directory", "Resources", "Sources", "Frameworks"]
        );
        assert!(summary.errors.is_empty());

        let root = summary.groups.unwrap();
        assert_eq!(root.name, "CustomTemplate");
        assert!(root.children.iter().any(|g| g.name == "Products"));
    }

    #[test]
    fn test_summary_serializes() {
        let dir = cordova_project();
        let graph = load_project(
            dir.path()
                .join("platforms/ios/HelloCordova.xcodeproj/project.pbxproj"),
        )
        .unwrap();

        let json = serde_json::to_value(ProjectSummary::from_graph("HelloCordova", &graph)).unwrap();
        assert_eq!(json["name"], "HelloCordova");
        assert_eq!(json["root_object"], "29B97313FDCFA39411CA2CEA");
        assert_eq!(json["targets"][0]["name"], "HelloCordova");
    }

    #[test]
    fn test_execute() {
        let dir = cordova_project();
        execute(InspectArgs { json: true }, parse_global(dir.path(), &[])).unwrap();
    }
}
