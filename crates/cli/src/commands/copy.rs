//! Copy command - stage the extension template in the iOS platform folder

use anyhow::{Context, Result};
use clap::Args;
use pbxgraft_template::{copy_template_dir, missing_values};
use std::path::PathBuf;

use super::hook_context;
use crate::{GlobalOptions, report};

/// Arguments for the copy command
#[derive(Args, Debug)]
pub struct CopyArgs {
    /// Template folder (defaults to plugins/<plugin>/src/ios/<name>)
    #[arg(long)]
    pub template: Option<PathBuf>,

    /// Plugin shipping the template
    #[arg(long, default_value = crate::config::DEFAULT_PLUGIN_ID)]
    pub plugin_id: String,

    /// Preferences as KEY=VALUE, overriding config.xml
    #[arg(value_name = "KEY=VALUE")]
    pub preferences: Vec<String>,
}

/// Execute the copy command
pub fn execute(args: CopyArgs, global: GlobalOptions) -> Result<()> {
    let config = global.hook_config().with_plugin_id(&args.plugin_id);
    let ctx = hook_context(&global, &args.preferences, config)?;
    let template = args.template.clone().unwrap_or_else(|| ctx.template_dir());

    report::step(format!(
        "Copying {} files to the iOS project",
        ctx.config.extension_name
    ));

    let substitutions = ctx.substitutions()?;
    for token in missing_values(&substitutions) {
        report::warning(format!("no value for {}, it will be left empty", token));
    }

    if ctx.config.dry_run {
        report::detail(format!(
            "would copy {} into {}",
            template.display(),
            ctx.ios_dir.display()
        ));
        return Ok(());
    }

    let summary = copy_template_dir(&template, &ctx.ios_dir, &substitutions).with_context(
        || format!("Missing extension project folder in {}", template.display()),
    )?;

    report::success(format!(
        "Copied {} files to {} ({} with placeholders)",
        summary.files,
        ctx.display_path(&summary.destination),
        summary.substituted
    ));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::testing::{cordova_project, parse_global};

    fn copy_args() -> CopyArgs {
        CopyArgs {
            template: None,
            plugin_id: crate::config::DEFAULT_PLUGIN_ID.to_string(),
            preferences: vec!["DISPLAY_NAME=Hello Share".to_string()],
        }
    }

    #[test]
    fn test_copy_substitutes_placeholders() {
        let dir = cordova_project();
        let staged = dir.path().join("platforms/ios/ShareExtension");
        std::fs::remove_dir_all(&staged).unwrap();

        execute(copy_args(), parse_global(dir.path(), &[])).unwrap();

        let plist = std::fs::read_to_string(staged.join("ShareExtension-Info.plist")).unwrap();
        assert!(plist.contains("<string>Hello Share</string>"));
        assert!(plist.contains("<string>io.cordova.hello.shareextension</string>"));
        let source = std::fs::read_to_string(staged.join("ShareViewController.m")).unwrap();
        assert!(source.contains("@\"hellocordova\""));
    }

    #[test]
    fn test_copy_dry_run() {
        let dir = cordova_project();
        let staged = dir.path().join("platforms/ios/ShareExtension");
        std::fs::remove_dir_all(&staged).unwrap();

        execute(copy_args(), parse_global(dir.path(), &["--dry-run"])).unwrap();
        assert!(!staged.exists());
    }

    #[test]
    fn test_copy_missing_template() {
        let dir = cordova_project();
        let args = CopyArgs {
            template: Some(dir.path().join("nowhere")),
            ..copy_args()
        };

        let err = execute(args, parse_global(dir.path(), &[])).unwrap_err();
        assert!(err.to_string().contains("Missing extension project folder"));
    }
}
