//! Remove command - take the extension back out of the Xcode project

use anyhow::Result;
use clap::Args;

use super::{hook_context, load_graph, write_graph};
use crate::{GlobalOptions, report};

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Preferences as KEY=VALUE, overriding config.xml
    #[arg(value_name = "KEY=VALUE")]
    pub preferences: Vec<String>,
}

/// Execute the remove command
pub fn execute(args: RemoveArgs, global: GlobalOptions) -> Result<()> {
    let ctx = hook_context(&global, &args.preferences, global.hook_config())?;
    let name = ctx.config.extension_name.clone();

    report::step(format!("Removing {} from the Xcode project", name));
    let mut graph = load_graph(&ctx)?;

    let group_removed = graph.remove_group(&name);
    let target_removed = graph.remove_target(&name);
    if !group_removed && !target_removed {
        report::success(format!("{} is not part of {}", name, ctx.project_name));
        return Ok(());
    }

    write_graph(&ctx, &graph)?;
    report::success(format!("Removed {} from {}", name, ctx.project_name));
    Ok(())
}
