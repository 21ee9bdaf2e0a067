//! Preference resolution
//!
//! A preference is looked up in the `KEY=VALUE` arguments given on the
//! command line first, then in the `<preference name="KEY" value="..."/>`
//! elements of the host's `config.xml`.

use crate::substitution::Substitution;
use pbxgraft_core::{PbxError, PbxResult};
use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Suffix appended to the host bundle identifier for the extension
pub const BUNDLE_SUFFIX: &str = ".shareextension";

// Placeholder tokens found in extension templates
pub const DISPLAY_NAME: &str = "__DISPLAY_NAME__";
pub const BUNDLE_IDENTIFIER: &str = "__BUNDLE_IDENTIFIER__";
pub const BUNDLE_SHORT_VERSION_STRING: &str = "__BUNDLE_SHORT_VERSION_STRING__";
pub const BUNDLE_VERSION: &str = "__BUNDLE_VERSION__";
pub const URL_SCHEME: &str = "__URL_SCHEME__";
pub const GROUP_IDENTIFIER: &str = "__GROUP_IDENTIFIER__";
pub const CODE_SIGN_IDENTITY: &str = "__CODE_SIGN_IDENTITY__";
pub const PROVISIONING_PROFILE: &str = "__PROVISIONING_PROFILE__";

// ============================================================================
// Preferences
// ============================================================================

/// Preferences from the command line and `config.xml`
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    overrides: BTreeMap<String, String>,
    config_xml: Option<String>,
}

impl Preferences {
    /// Create an empty set of preferences
    pub fn new() -> Self {
        Self::default()
    }

    /// Collect `KEY=VALUE` arguments; arguments without `=` are ignored
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut preferences = Self::new();
        for arg in args {
            if let Some((key, value)) = arg.as_ref().split_once('=') {
                if !key.is_empty() {
                    preferences.set(key, value);
                }
            }
        }
        preferences
    }

    /// Use the text of a `config.xml`
    pub fn with_config_xml(mut self, text: impl Into<String>) -> Self {
        let text = text.into();
        // Anything before the first tag (a BOM, stray output) is dropped
        let start = text.find('<').unwrap_or(text.len());
        self.config_xml = Some(text[start..].to_string());
        self
    }

    /// Read `config.xml`; a missing file leaves the preferences unchanged
    pub fn load_config_xml(self, path: impl AsRef<Path>) -> PbxResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config.xml, skipping");
            return Ok(self);
        }
        let text = std::fs::read_to_string(path).map_err(|e| PbxError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(self.with_config_xml(text))
    }

    /// Set a command-line value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.overrides.insert(key.into(), value.into());
    }

    /// Resolve a preference; empty values count as absent
    pub fn get(&self, key: &str) -> Option<String> {
        if let Some(value) = self.overrides.get(key).filter(|v| !v.is_empty()) {
            return Some(value.clone());
        }
        self.config_xml
            .as_deref()
            .and_then(|xml| preference_value(xml, key))
    }
}

/// `value` of the first `<preference name="KEY" value="..."/>`, matching the
/// name case-insensitively
fn preference_value(config_xml: &str, name: &str) -> Option<String> {
    let pattern = format!(r#"(?i)name="{}" value="(.*?)""#, regex::escape(name));
    let re = Regex::new(&pattern).ok()?;
    re.captures(config_xml)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

// ============================================================================
// Host Info.plist
// ============================================================================

/// Identity of the host application, read from its `Info.plist`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostPlist {
    pub bundle_identifier: Option<String>,
    pub short_version: Option<String>,
    pub version: Option<String>,
}

impl HostPlist {
    /// Extract the bundle keys from the text of an XML property list
    pub fn parse(text: &str) -> Self {
        Self {
            bundle_identifier: plist_string(text, "CFBundleIdentifier"),
            short_version: plist_string(text, "CFBundleShortVersionString"),
            version: plist_string(text, "CFBundleVersion"),
        }
    }

    /// Read a host `Info.plist`
    pub fn load(path: impl AsRef<Path>) -> PbxResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| PbxError::FileRead {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(Self::parse(&text))
    }

    /// Location of the host plist: `<ios>/<App>/<App>-Info.plist`
    pub fn path_for(ios_dir: impl AsRef<Path>, project_name: &str) -> PathBuf {
        ios_dir
            .as_ref()
            .join(project_name)
            .join(format!("{}-Info.plist", project_name))
    }
}

fn plist_string(text: &str, key: &str) -> Option<String> {
    let pattern = format!(
        r"(?s)<key>\s*{}\s*</key>\s*(?:<string>(.*?)</string>|<string\s*/>)",
        regex::escape(key)
    );
    let re = Regex::new(&pattern).ok()?;
    let value = re.captures(text)?.get(1)?.as_str().trim();
    let value = match value
        .strip_prefix("<![CDATA[")
        .and_then(|v| v.strip_suffix("]]>"))
    {
        Some(cdata) => cdata.to_string(),
        None => unescape_xml(value),
    };
    Some(value).filter(|v| !v.is_empty())
}

/// Resolve the predefined XML entities
fn unescape_xml(text: &str) -> String {
    if !text.contains('&') {
        return text.to_string();
    }
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

// ============================================================================
// Placeholder List
// ============================================================================

/// Placeholder values for an extension of `project_name`
///
/// Each value comes from a preference when one is set, otherwise from the
/// host plist, otherwise from the project name where that makes sense.
pub fn placeholders(
    preferences: &Preferences,
    host: &HostPlist,
    project_name: &str,
) -> Vec<Substitution> {
    let bundle_identifier = preferences
        .get("IOS_BUNDLE_IDENTIFIER")
        .or_else(|| host.bundle_identifier.clone())
        .map(|id| format!("{}{}", id, BUNDLE_SUFFIX));

    vec![
        Substitution::new(
            DISPLAY_NAME,
            Some(
                preferences
                    .get("DISPLAY_NAME")
                    .unwrap_or_else(|| project_name.to_string()),
            ),
        ),
        Substitution::new(BUNDLE_IDENTIFIER, bundle_identifier),
        Substitution::new(BUNDLE_SHORT_VERSION_STRING, host.short_version.clone()),
        Substitution::new(BUNDLE_VERSION, host.version.clone()),
        Substitution::new(URL_SCHEME, preferences.get("IOS_URL_SCHEME")),
        Substitution::new(GROUP_IDENTIFIER, preferences.get("IOS_GROUP_IDENTIFIER")),
        Substitution::new(CODE_SIGN_IDENTITY, preferences.get("IOS_CODE_SIGN_IDENTITY")),
        Substitution::new(
            PROVISIONING_PROFILE,
            preferences.get("IOS_PROVISIONING_PROFILE"),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution::lookup;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    const CONFIG_XML: &str = r#"<?xml version='1.0' encoding='utf-8'?>
<widget id="io.cordova.hellocordova" version="1.0.0" xmlns="http://www.w3.org/ns/widgets">
    <name>HelloCordova</name>
    <preference name="DisplayName" value="Hello" />
    <preference name="IOS_URL_SCHEME" value="hellocordova" />
    <preference name="IOS_GROUP_IDENTIFIER" value="" />
</widget>
"#;

    const INFO_PLIST: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<plist version="1.0">
<dict>
	<key>CFBundleIdentifier</key>
	<string>io.cordova.hellocordova</string>
	<key>CFBundleShortVersionString</key>
	<string>1.2.0</string>
	<key>CFBundleVersion</key>
	<string>12</string>
</dict>
</plist>
"#;

    #[test]
    fn test_command_line_overrides_config_xml() {
        let prefs = Preferences::from_args(["IOS_URL_SCHEME=fromargs", "ignored"])
            .with_config_xml(CONFIG_XML);
        assert_eq!(prefs.get("IOS_URL_SCHEME").as_deref(), Some("fromargs"));
    }

    #[test]
    fn test_empty_override_falls_back() {
        let prefs = Preferences::from_args(["IOS_URL_SCHEME=", "DISPLAY_NAME="])
            .with_config_xml(CONFIG_XML);
        assert_eq!(prefs.get("IOS_URL_SCHEME").as_deref(), Some("hellocordova"));
        assert_eq!(prefs.get("DISPLAY_NAME"), None);

        let subs = placeholders(&prefs, &HostPlist::default(), "HelloCordova");
        assert_eq!(lookup(&subs, DISPLAY_NAME), Some("HelloCordova"));
        assert_eq!(lookup(&subs, URL_SCHEME), Some("hellocordova"));
    }

    #[test]
    fn test_config_xml_lookup() {
        let prefs = Preferences::new().with_config_xml(format!("\u{feff}{}", CONFIG_XML));
        assert_eq!(prefs.get("ios_url_scheme").as_deref(), Some("hellocordova"));
        assert_eq!(prefs.get("DISPLAYNAME").as_deref(), Some("Hello"));
        // Empty value counts as absent
        assert_eq!(prefs.get("IOS_GROUP_IDENTIFIER"), None);
        assert_eq!(prefs.get("IOS_BUNDLE_IDENTIFIER"), None);
    }

    #[test]
    fn test_argument_value_may_contain_equals() {
        let prefs = Preferences::from_args(["IOS_PROVISIONING_PROFILE=a=b"]);
        assert_eq!(prefs.get("IOS_PROVISIONING_PROFILE").as_deref(), Some("a=b"));
    }

    #[test]
    fn test_missing_config_xml_is_not_an_error() {
        let dir = TempDir::new().unwrap();
        let prefs = Preferences::new()
            .load_config_xml(dir.path().join("config.xml"))
            .unwrap();
        assert_eq!(prefs.get("IOS_URL_SCHEME"), None);
    }

    #[test]
    fn test_host_plist() {
        let host = HostPlist::parse(INFO_PLIST);
        assert_eq!(host.bundle_identifier.as_deref(), Some("io.cordova.hellocordova"));
        assert_eq!(host.short_version.as_deref(), Some("1.2.0"));
        assert_eq!(host.version.as_deref(), Some("12"));

        assert_eq!(
            HostPlist::path_for("/p/platforms/ios", "HelloCordova"),
            PathBuf::from("/p/platforms/ios/HelloCordova/HelloCordova-Info.plist")
        );
    }

    #[test]
    fn test_host_plist_empty_and_cdata_values() {
        let host = HostPlist::parse(
            "<dict>\n\t<key>CFBundleIdentifier</key>\n\t<string><![CDATA[io.cordova.a&b]]></string>\n\
             \t<key>CFBundleShortVersionString</key>\n\t<string/>\n\
             \t<key>CFBundleVersion</key>\n\t<string>1 &amp; 2</string>\n</dict>",
        );
        assert_eq!(host.bundle_identifier.as_deref(), Some("io.cordova.a&b"));
        assert_eq!(host.short_version, None);
        assert_eq!(host.version.as_deref(), Some("1 & 2"));
    }

    #[test]
    fn test_placeholders() {
        let prefs = Preferences::new().with_config_xml(CONFIG_XML);
        let subs = placeholders(&prefs, &HostPlist::parse(INFO_PLIST), "HelloCordova");

        let tokens: Vec<&str> = subs.iter().map(|s| s.token.as_str()).collect();
        assert_eq!(
            tokens,
            vec![
                DISPLAY_NAME,
                BUNDLE_IDENTIFIER,
                BUNDLE_SHORT_VERSION_STRING,
                BUNDLE_VERSION,
                URL_SCHEME,
                GROUP_IDENTIFIER,
                CODE_SIGN_IDENTITY,
                PROVISIONING_PROFILE,
            ]
        );
        assert_eq!(lookup(&subs, DISPLAY_NAME), Some("HelloCordova"));
        assert_eq!(
            lookup(&subs, BUNDLE_IDENTIFIER),
            Some("io.cordova.hellocordova.shareextension")
        );
        assert_eq!(lookup(&subs, URL_SCHEME), Some("hellocordova"));
        assert_eq!(lookup(&subs, GROUP_IDENTIFIER), None);
    }

    #[test]
    fn test_bundle_identifier_preference_wins() {
        let prefs = Preferences::from_args(["IOS_BUNDLE_IDENTIFIER=com.example.app"]);
        let subs = placeholders(&prefs, &HostPlist::parse(INFO_PLIST), "HelloCordova");
        assert_eq!(
            lookup(&subs, BUNDLE_IDENTIFIER),
            Some("com.example.app.shareextension")
        );

        let subs = placeholders(&Preferences::new(), &HostPlist::default(), "HelloCordova");
        assert_eq!(lookup(&subs, BUNDLE_IDENTIFIER), None);
    }
}
