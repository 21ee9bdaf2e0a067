//! Hook configuration

use pbxgraft_core::ProductType;

/// Name of the extension folder, target and group
pub const DEFAULT_EXTENSION_NAME: &str = "ShareExtension";

/// Group of a Cordova project that receives the extension group
pub const DEFAULT_PARENT_GROUP: &str = "CustomTemplate";

/// Id of the Cordova plugin shipping the extension template
pub const DEFAULT_PLUGIN_ID: &str = "cc.fovea.cordova.openwith";

/// Settings shared by every hook command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookConfig {
    /// Name of the staged folder, the target and the group
    pub extension_name: String,

    /// Group the extension group is created under
    pub parent_group: String,

    /// Product type of the extension target
    pub product_type: ProductType,

    /// Plugin whose `src/ios/<name>` folder holds the template
    pub plugin_id: String,

    /// Report what would change without writing anything
    pub dry_run: bool,

    /// Keep a `.backup` copy of the project file before overwriting it
    pub backup: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            extension_name: DEFAULT_EXTENSION_NAME.to_string(),
            parent_group: DEFAULT_PARENT_GROUP.to_string(),
            product_type: ProductType::AppExtension,
            plugin_id: DEFAULT_PLUGIN_ID.to_string(),
            dry_run: false,
            backup: false,
        }
    }
}

impl HookConfig {
    /// Create a configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the extension name
    pub fn with_extension_name(mut self, name: impl Into<String>) -> Self {
        self.extension_name = name.into();
        self
    }

    /// Set the parent group
    pub fn with_parent_group(mut self, group: impl Into<String>) -> Self {
        self.parent_group = group.into();
        self
    }

    /// Set the product type
    pub fn with_product_type(mut self, product_type: ProductType) -> Self {
        self.product_type = product_type;
        self
    }

    /// Set the plugin id
    pub fn with_plugin_id(mut self, plugin_id: impl Into<String>) -> Self {
        self.plugin_id = plugin_id.into();
        self
    }

    /// Do not write anything
    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }

    /// Back up the project file before overwriting it
    pub fn with_backup(mut self) -> Self {
        self.backup = true;
        self
    }
}
