//! Core types used throughout pbxgraft
//!
//! This module contains the identifier type shared by every graph object and
//! the small classification enums (product types, file categories) that the
//! graph mutator and the hook driver agree on.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

// ============================================================================
// Object Identifiers
// ============================================================================

/// Opaque identifier of an object in the project graph
///
/// Minted identifiers are 24 uppercase hex characters, the shape Xcode
/// writes. Parsed identifiers are taken verbatim since other tools do not
/// always follow that shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Length of a minted identifier
    pub const LEN: usize = 24;

    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mint a fresh identifier from random UUIDv4 bits
    pub fn mint() -> Self {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        Self(hex[..Self::LEN].to_string())
    }

    /// Mint an identifier that `is_taken` does not reject
    pub fn mint_unique(is_taken: impl Fn(&ObjectId) -> bool) -> Self {
        loop {
            let id = Self::mint();
            if !is_taken(&id) {
                return id;
            }
        }
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier has the shape Xcode mints (24 uppercase hex)
    pub fn is_canonical(&self) -> bool {
        self.0.len() == Self::LEN
            && self
                .0
                .chars()
                .all(|c| c.is_ascii_digit() || ('A'..='F').contains(&c))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ObjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ObjectId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

// ============================================================================
// Product Types
// ============================================================================

/// Kind of product a native target builds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    Application,
    AppExtension,
    Bundle,
    CommandLineTool,
    DynamicLibrary,
    Framework,
    StaticLibrary,
    UnitTestBundle,
    WatchApp,
    WatchExtension,
}

impl ProductType {
    /// All product types
    pub fn all() -> &'static [ProductType] {
        &[
            ProductType::Application,
            ProductType::AppExtension,
            ProductType::Bundle,
            ProductType::CommandLineTool,
            ProductType::DynamicLibrary,
            ProductType::Framework,
            ProductType::StaticLibrary,
            ProductType::UnitTestBundle,
            ProductType::WatchApp,
            ProductType::WatchExtension,
        ]
    }

    /// Short name accepted on the command line
    pub fn short_name(&self) -> &'static str {
        match self {
            ProductType::Application => "application",
            ProductType::AppExtension => "app_extension",
            ProductType::Bundle => "bundle",
            ProductType::CommandLineTool => "command_line_tool",
            ProductType::DynamicLibrary => "dynamic_library",
            ProductType::Framework => "framework",
            ProductType::StaticLibrary => "static_library",
            ProductType::UnitTestBundle => "unit_test_bundle",
            ProductType::WatchApp => "watch_app",
            ProductType::WatchExtension => "watch_extension",
        }
    }

    /// Value of the `productType` field
    pub fn identifier(&self) -> &'static str {
        match self {
            ProductType::Application => "com.apple.product-type.application",
            ProductType::AppExtension => "com.apple.product-type.app-extension",
            ProductType::Bundle => "com.apple.product-type.bundle",
            ProductType::CommandLineTool => "com.apple.product-type.tool",
            ProductType::DynamicLibrary => "com.apple.product-type.library.dynamic",
            ProductType::Framework => "com.apple.product-type.framework",
            ProductType::StaticLibrary => "com.apple.product-type.library.static",
            ProductType::UnitTestBundle => "com.apple.product-type.bundle.unit-test",
            ProductType::WatchApp => "com.apple.product-type.application.watchapp",
            ProductType::WatchExtension => "com.apple.product-type.watchkit-extension",
        }
    }

    /// `explicitFileType` of the product file reference
    pub fn explicit_file_type(&self) -> &'static str {
        match self {
            ProductType::Application | ProductType::WatchApp => "wrapper.application",
            ProductType::AppExtension | ProductType::WatchExtension => "wrapper.app-extension",
            ProductType::Bundle | ProductType::UnitTestBundle => "wrapper.cfbundle",
            ProductType::CommandLineTool => "compiled.mach-o.executable",
            ProductType::DynamicLibrary => "compiled.mach-o.dylib",
            ProductType::Framework => "wrapper.framework",
            ProductType::StaticLibrary => "archive.ar",
        }
    }

    /// File name of the built product
    pub fn product_file_name(&self, product_name: &str) -> String {
        match self {
            ProductType::Application | ProductType::WatchApp => format!("{}.app", product_name),
            ProductType::AppExtension | ProductType::WatchExtension => {
                format!("{}.appex", product_name)
            }
            ProductType::Bundle => format!("{}.bundle", product_name),
            ProductType::UnitTestBundle => format!("{}.xctest", product_name),
            ProductType::CommandLineTool => product_name.to_string(),
            ProductType::DynamicLibrary => format!("lib{}.dylib", product_name),
            ProductType::Framework => format!("{}.framework", product_name),
            ProductType::StaticLibrary => format!("lib{}.a", product_name),
        }
    }

    /// Whether the product gets embedded into the host application
    pub fn is_extension(&self) -> bool {
        matches!(self, ProductType::AppExtension | ProductType::WatchExtension)
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl FromStr for ProductType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().trim_matches('"');
        ProductType::all()
            .iter()
            .copied()
            .find(|t| t.short_name() == s || t.identifier() == s)
            .ok_or_else(|| format!("unknown product type '{}'", s))
    }
}

// ============================================================================
// File Categories
// ============================================================================

/// How a file participates in a target's build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    /// Compiled: wired into the Sources phase
    Source,
    /// Referenced by build settings only: no build phase
    Config,
    /// Copied into the product: wired into the Resources phase
    Resource,
}

impl FileCategory {
    /// Classify a file by its extension (with or without the leading dot)
    pub fn from_extension(extension: &str) -> Self {
        let ext = extension.trim_start_matches('.').to_ascii_lowercase();
        match ext.as_str() {
            "h" | "hh" | "hpp" | "m" | "mm" | "c" | "cc" | "cpp" | "swift" => FileCategory::Source,
            "plist" | "entitlements" | "xcconfig" => FileCategory::Config,
            _ => FileCategory::Resource,
        }
    }

    /// Display name for reports
    pub fn display_name(&self) -> &'static str {
        match self {
            FileCategory::Source => "source",
            FileCategory::Config => "config",
            FileCategory::Resource => "resource",
        }
    }
}

/// `lastKnownFileType` Xcode records for a file extension
pub fn last_known_file_type(extension: &str) -> &'static str {
    let ext = extension.trim_start_matches('.').to_ascii_lowercase();
    match ext.as_str() {
        "h" | "hh" | "hpp" => "sourcecode.c.h",
        "m" => "sourcecode.c.objc",
        "mm" => "sourcecode.cpp.objcpp",
        "c" => "sourcecode.c.c",
        "cc" | "cpp" => "sourcecode.cpp.cpp",
        "swift" => "sourcecode.swift",
        "plist" => "text.plist.xml",
        "entitlements" => "text.plist.entitlements",
        "xcconfig" => "text.xcconfig",
        "storyboard" => "file.storyboard",
        "xib" => "file.xib",
        "strings" => "text.plist.strings",
        "xcassets" => "folder.assetcatalog",
        "png" => "image.png",
        "jpg" | "jpeg" => "image.jpeg",
        "json" => "text.json",
        "framework" => "wrapper.framework",
        "a" => "archive.ar",
        _ => "text",
    }
}

// ============================================================================
// Tests
// ============================================================================
