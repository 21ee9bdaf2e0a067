//! Add command - graft the staged extension into the Xcode project

use anyhow::{Context, Result};
use clap::Args;
use pbxgraft_core::{FileCategory, ProductType};
use pbxgraft_ir::ExtensionFile;
use pbxgraft_template::preferences::{BUNDLE_IDENTIFIER, CODE_SIGN_IDENTITY, PROVISIONING_PROFILE};
use pbxgraft_template::{Substitution, discover_extension_files, lookup, preprocess_in_place};

use super::{hook_context, load_graph, write_graph};
use crate::{GlobalOptions, report};

/// Arguments for the add command
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Product type of the extension target (short name or identifier)
    #[arg(long, default_value = "app_extension")]
    pub product_type: ProductType,

    /// Preferences as KEY=VALUE, overriding config.xml
    #[arg(value_name = "KEY=VALUE")]
    pub preferences: Vec<String>,
}

/// Execute the add command
pub fn execute(args: AddArgs, global: GlobalOptions) -> Result<()> {
    let config = global.hook_config().with_product_type(args.product_type);
    let ctx = hook_context(&global, &args.preferences, config)?;
    let name = ctx.config.extension_name.clone();

    report::step(format!("Adding {} to the Xcode project", name));

    // Parse before touching the staged files so a broken project leaves
    // everything as it was.
    let mut graph = load_graph(&ctx)?;

    let extension_dir = ctx.extension_dir();
    let files = discover_extension_files(&extension_dir).with_context(|| {
        format!(
            "Missing extension folder {}, run `pbxgraft copy` first",
            extension_dir.display()
        )
    })?;

    let substitutions = ctx.substitutions()?;
    if !ctx.config.dry_run {
        for path in preprocess_in_place(&files, &substitutions)? {
            report::detail(format!("preprocessed {}", ctx.display_path(&path)));
        }
    }

    let target = graph.add_target(&name, ctx.config.product_type, &name)?;
    let group = graph
        .find_or_create_group(&name, &ctx.config.parent_group)
        .with_context(|| format!("Cannot place the {} group", name))?;
    let batch = graph.add_files(target.as_str(), group.as_str(), &files)?;

    for (key, value) in extension_build_settings(&name, &files, &substitutions) {
        graph.set_build_setting(target.as_str(), key, &value)?;
        tracing::debug!(key, value = %value, "Applied build setting");
    }

    report::detail(format!(
        "{} source files, {} resources, {} config files",
        batch.count(FileCategory::Source),
        batch.count(FileCategory::Resource),
        batch.count(FileCategory::Config)
    ));
    for err in batch.errors() {
        if err.is_fatal() {
            return Err(err.into());
        }
        report::warning(err);
    }

    write_graph(&ctx, &graph)?;
    report::success(format!("Added {} to {}", name, ctx.project_name));
    Ok(())
}

/// Build settings derived from the staged files and the resolved placeholders
///
/// Signing settings are only set when a value was resolved.
pub fn extension_build_settings(
    name: &str,
    files: &[ExtensionFile],
    substitutions: &[Substitution],
) -> Vec<(&'static str, String)> {
    let mut settings = Vec::new();
    if let Some(bundle_id) = lookup(substitutions, BUNDLE_IDENTIFIER) {
        settings.push(("PRODUCT_BUNDLE_IDENTIFIER", bundle_id.to_string()));
    }
    if let Some(identity) = lookup(substitutions, CODE_SIGN_IDENTITY) {
        settings.push(("CODE_SIGN_IDENTITY", identity.to_string()));
    }
    if let Some(profile) = lookup(substitutions, PROVISIONING_PROFILE) {
        settings.push(("PROVISIONING_PROFILE", profile.to_string()));
    }
    if let Some(entitlements) = files.iter().find(|f| f.extension == ".entitlements") {
        settings.push((
            "CODE_SIGN_ENTITLEMENTS",
            format!("{}/{}", name, entitlements.name),
        ));
    }
    settings
}
