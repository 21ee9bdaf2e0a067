//! Resolved locations and preferences of one hook run

use crate::config::HookConfig;
use anyhow::{Context, Result};
use pbxgraft_ir::{find_project_file, project_name};
use pbxgraft_template::{HostPlist, Preferences, Substitution, placeholders};
use std::path::{Path, PathBuf};

/// Everything a command needs to know about the Cordova project it runs in
#[derive(Debug, Clone)]
pub struct HookContext {
    /// Root of the Cordova project (holds `config.xml`)
    pub project_root: PathBuf,

    /// iOS platform folder (holds the `.xcodeproj` bundle)
    pub ios_dir: PathBuf,

    /// The `project.pbxproj` file
    pub project_file: PathBuf,

    /// App name, taken from the `.xcodeproj` bundle name
    pub project_name: String,

    pub preferences: Preferences,
    pub config: HookConfig,
}

impl HookContext {
    /// Locate the project and load preferences
    ///
    /// `ios_dir` defaults to `<project_root>/platforms/ios`.
    pub fn resolve(
        project_root: impl Into<PathBuf>,
        ios_dir: Option<PathBuf>,
        preferences: &[String],
        config: HookConfig,
    ) -> Result<Self> {
        let project_root = project_root.into();
        let ios_dir = ios_dir.unwrap_or_else(|| project_root.join("platforms").join("ios"));

        let project_file = find_project_file(&ios_dir).with_context(|| {
            format!("Could not find an .xcodeproj folder in {}", ios_dir.display())
        })?;
        let project_name = project_name(&project_file)
            .with_context(|| format!("Cannot name the project at {}", project_file.display()))?;

        let preferences = Preferences::from_args(preferences)
            .load_config_xml(project_root.join("config.xml"))
            .context("Failed to read config.xml")?;

        tracing::debug!(
            ios_dir = %ios_dir.display(),
            project = %project_name,
            "Resolved hook context"
        );

        Ok(Self {
            project_root,
            ios_dir,
            project_file,
            project_name,
            preferences,
            config,
        })
    }

    /// Staged extension folder: `<ios>/<name>`
    pub fn extension_dir(&self) -> PathBuf {
        self.ios_dir.join(&self.config.extension_name)
    }

    /// Template folder shipped by the plugin:
    /// `<root>/plugins/<plugin>/src/ios/<name>`
    pub fn template_dir(&self) -> PathBuf {
        self.project_root
            .join("plugins")
            .join(&self.config.plugin_id)
            .join("src")
            .join("ios")
            .join(&self.config.extension_name)
    }

    /// Host app `Info.plist`
    pub fn host_plist_path(&self) -> PathBuf {
        HostPlist::path_for(&self.ios_dir, &self.project_name)
    }

    /// Placeholder values for this project
    ///
    /// A missing host plist leaves the values it would provide unresolved.
    pub fn substitutions(&self) -> Result<Vec<Substitution>> {
        let plist_path = self.host_plist_path();
        let host = if plist_path.exists() {
            HostPlist::load(&plist_path)?
        } else {
            tracing::warn!(path = %plist_path.display(), "Host Info.plist not found");
            HostPlist::default()
        };
        Ok(placeholders(&self.preferences, &host, &self.project_name))
    }

    /// Path relative to the iOS folder, for display
    pub fn display_path<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.ios_dir).unwrap_or(path).display()
    }
}
