//! Extension folder staging
//!
//! The extension template is copied into the iOS platform folder with its
//! placeholders substituted, and the staged folder is listed to decide which
//! files the project should reference.

use crate::substitution::{Substitution, substitute};
use pbxgraft_core::{FileCategory, PbxError, PbxResult};
use pbxgraft_ir::ExtensionFile;
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Whether a file name is a dotfile (`.DS_Store`, `.gitkeep`)
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// List the entries of a staged extension folder, sorted by name
///
/// Only the top level is listed: a folder such as `Assets.xcassets` is
/// referenced as a single resource. Dotfiles are skipped.
pub fn discover_extension_files(dir: impl AsRef<Path>) -> PbxResult<Vec<ExtensionFile>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(PbxError::FileRead {
            path: dir.to_path_buf(),
            message: "extension folder does not exist".to_string(),
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| PbxError::FileRead {
            path: dir.to_path_buf(),
            message: e.to_string(),
        })?;
        let name = entry.file_name().to_string_lossy();
        if is_hidden(&name) {
            continue;
        }
        files.push(ExtensionFile::new(entry.path()));
    }

    tracing::debug!(dir = %dir.display(), files = files.len(), "Discovered extension files");
    Ok(files)
}

/// Summary of a template copy
#[derive(Debug, Clone, Default, Serialize)]
pub struct CopySummary {
    /// Folder the template was copied to
    pub destination: PathBuf,

    /// Files written
    pub files: usize,

    /// Files whose text changed through substitution
    pub substituted: usize,
}

/// Copy the folder `source` into `parent` (as `parent/<source name>`),
/// substituting placeholders in every text file
///
/// Existing files are overwritten; files that are not UTF-8 are copied as
/// they are. Dotfiles are skipped.
pub fn copy_template_dir(
    source: impl AsRef<Path>,
    parent: impl AsRef<Path>,
    substitutions: &[Substitution],
) -> PbxResult<CopySummary> {
    let source = source.as_ref();
    if !source.is_dir() {
        return Err(PbxError::FileRead {
            path: source.to_path_buf(),
            message: "missing extension template folder".to_string(),
        });
    }
    let folder_name = source
        .file_name()
        .ok_or_else(|| PbxError::internal(format!("{} has no folder name", source.display())))?;
    let destination = parent.as_ref().join(folder_name);

    let mut summary = CopySummary {
        destination: destination.clone(),
        ..CopySummary::default()
    };

    let walker = WalkDir::new(source)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(&e.file_name().to_string_lossy()));
    for entry in walker {
        let entry = entry.map_err(|e| PbxError::FileRead {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| PbxError::internal(e.to_string()))?;
        let target = destination.join(relative);

        if entry.file_type().is_dir() {
            create_dir(&target)?;
            continue;
        }

        if let Some(dir) = target.parent() {
            create_dir(dir)?;
        }
        if copy_file(entry.path(), &target, substitutions)? {
            summary.substituted += 1;
        }
        summary.files += 1;
    }

    tracing::info!(
        source = %source.display(),
        destination = %destination.display(),
        files = summary.files,
        "Copied extension template"
    );
    Ok(summary)
}

/// Copy one file, substituting when it is text; returns whether the text
/// changed
fn copy_file(source: &Path, target: &Path, substitutions: &[Substitution]) -> PbxResult<bool> {
    let bytes = std::fs::read(source).map_err(|e| PbxError::FileRead {
        path: source.to_path_buf(),
        message: e.to_string(),
    })?;
    let (contents, changed) = match String::from_utf8(bytes) {
        Ok(text) => {
            let rendered = substitute(&text, substitutions);
            let changed = rendered != text;
            (rendered.into_bytes(), changed)
        }
        Err(binary) => (binary.into_bytes(), false),
    };
    std::fs::write(target, contents).map_err(|e| PbxError::FileWrite {
        path: target.to_path_buf(),
        message: e.to_string(),
    })?;
    Ok(changed)
}

fn create_dir(path: &Path) -> PbxResult<()> {
    std::fs::create_dir_all(path).map_err(|e| PbxError::DirectoryCreate {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Substitute placeholders in the staged config files (plists,
/// entitlements, xcconfigs), rewriting only the files that change
///
/// Returns the files rewritten.
pub fn preprocess_in_place(
    files: &[ExtensionFile],
    substitutions: &[Substitution],
) -> PbxResult<Vec<PathBuf>> {
    let mut rewritten = Vec::new();
    for file in files {
        if file.category() != FileCategory::Config || !file.path.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&file.path).map_err(|e| PbxError::FileRead {
            path: file.path.clone(),
            message: e.to_string(),
        })?;
        let rendered = substitute(&text, substitutions);
        if rendered == text {
            continue;
        }
        std::fs::write(&file.path, rendered).map_err(|e| PbxError::FileWrite {
            path: file.path.clone(),
            message: e.to_string(),
        })?;
        tracing::debug!(file = %file.name, "Substituted placeholders");
        rewritten.push(file.path.clone());
    }
    Ok(rewritten)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write(path: &Path, contents: &[u8]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    fn template(root: &Path) -> PathBuf {
        let source = root.join("src").join("ios").join("ShareExtension");
        write(
            &source.join("ShareExtension-Info.plist"),
            b"<string>__BUNDLE_IDENTIFIER__</string>",
        );
        write(&source.join("ShareViewController.m"), b"// __DISPLAY_NAME__");
        write(&source.join("icon.png"), &[0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]);
        write(&source.join("Assets.xcassets").join("Contents.json"), b"{}");
        write(&source.join(".DS_Store"), b"junk");
        source
    }

    #[test]
    fn test_copy_template_dir() {
        let dir = TempDir::new().unwrap();
        let source = template(dir.path());
        let ios = dir.path().join("platforms").join("ios");
        std::fs::create_dir_all(&ios).unwrap();

        let subs = [
            Substitution::resolved("__BUNDLE_IDENTIFIER__", "io.example.shareextension"),
            Substitution::resolved("__DISPLAY_NAME__", "Hello"),
        ];
        let summary = copy_template_dir(&source, &ios, &subs).unwrap();

        let staged = ios.join("ShareExtension");
        assert_eq!(summary.destination, staged);
        assert_eq!(summary.files, 4);
        assert_eq!(summary.substituted, 2);
        assert_eq!(
            std::fs::read_to_string(staged.join("ShareExtension-Info.plist")).unwrap(),
            "<string>io.example.shareextension</string>"
        );
        assert_eq!(
            std::fs::read(staged.join("icon.png")).unwrap(),
            vec![0x89, 0x50, 0x4e, 0x47, 0xff, 0xfe]
        );
        assert!(staged.join("Assets.xcassets").join("Contents.json").is_file());
        assert!(!staged.join(".DS_Store").exists());
    }

    #[test]
    fn test_copy_missing_template() {
        let dir = TempDir::new().unwrap();
        let err = copy_template_dir(dir.path().join("nope"), dir.path(), &[]).unwrap_err();
        assert!(err.to_string().contains("missing extension template folder"));
    }

    #[test]
    fn test_discover_extension_files() {
        let dir = TempDir::new().unwrap();
        let source = template(dir.path());

        let files = discover_extension_files(&source).unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Assets.xcassets",
                "ShareExtension-Info.plist",
                "ShareViewController.m",
                "icon.png",
            ]
        );
        assert_eq!(files[0].category(), FileCategory::Resource);
        assert_eq!(files[1].category(), FileCategory::Config);
        assert_eq!(files[2].category(), FileCategory::Source);
    }

    #[test]
    fn test_preprocess_in_place_touches_config_files_only() {
        let dir = TempDir::new().unwrap();
        let source = template(dir.path());
        let files = discover_extension_files(&source).unwrap();
        let subs = [
            Substitution::resolved("__BUNDLE_IDENTIFIER__", "io.example.shareextension"),
            Substitution::resolved("__DISPLAY_NAME__", "Hello"),
        ];

        let rewritten = preprocess_in_place(&files, &subs).unwrap();
        assert_eq!(rewritten, vec![source.join("ShareExtension-Info.plist")]);
        assert_eq!(
            std::fs::read_to_string(source.join("ShareViewController.m")).unwrap(),
            "// __DISPLAY_NAME__"
        );

        // Nothing left to substitute
        assert!(preprocess_in_place(&files, &subs).unwrap().is_empty());
    }
}
