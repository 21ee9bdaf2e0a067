//! Hook command implementations

pub mod add;
pub mod copy;
pub mod inspect;
pub mod remove;

use anyhow::{Context, Result};
use pbxgraft_ir::{ProjectGraph, backup_project, load_project, save_project};

use crate::config::HookConfig;
use crate::context::HookContext;
use crate::{GlobalOptions, report};

/// Resolve the hook context from the global options
pub fn hook_context(
    global: &GlobalOptions,
    preferences: &[String],
    config: HookConfig,
) -> Result<HookContext> {
    HookContext::resolve(
        global.project_root.clone(),
        global.ios_dir.clone(),
        preferences,
        config,
    )
}

/// Load the project file of a context
pub fn load_graph(ctx: &HookContext) -> Result<ProjectGraph> {
    load_project(&ctx.project_file)
        .with_context(|| format!("Failed to load {}", ctx.project_file.display()))
}

/// Write the graph back unless this is a dry run
///
/// Returns whether the file was written.
pub fn write_graph(ctx: &HookContext, graph: &ProjectGraph) -> Result<bool> {
    if ctx.config.dry_run {
        report::detail(format!(
            "dry run, {} left untouched",
            ctx.display_path(&ctx.project_file)
        ));
        return Ok(false);
    }

    if ctx.config.backup {
        if let Some(backup) = backup_project(&ctx.project_file)? {
            report::detail(format!("backup written to {}", ctx.display_path(&backup)));
        }
    }

    let written = save_project(graph, &ctx.project_file)
        .with_context(|| format!("Failed to write {}", ctx.project_file.display()))?;
    if !written {
        report::detail("project already up to date");
    }
    Ok(written)
}
