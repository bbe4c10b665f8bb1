//! File enumeration and per-file metadata views.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use consign_model::{DeliveryPackage, Metadata, PackageItem};

/// Files delivered for one item source.
///
/// A regular file yields itself. A directory yields its immediate regular-file children sorted by
/// name; subdirectories are not descended into.
///
/// # Errors
///
/// Returns the IO error raised while reading the directory.
pub fn resolve_files(source: &Path) -> io::Result<Vec<PathBuf>> {
    if !source.is_dir() {
        return Ok(vec![source.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(source)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Metadata view for one file: the item's metadata plus derived keys.
///
/// Derived keys (`filename`, `file_stem`, `file_ext`, `source_file`, `package_name`,
/// `client_config`) replace item keys of the same name.
#[must_use]
pub fn file_metadata(item: &PackageItem, file: &Path, package: &DeliveryPackage) -> Metadata {
    let text = |value: Option<&std::ffi::OsStr>| {
        value
            .map(|part| part.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let mut metadata = item.metadata.clone();
    metadata.insert("filename".into(), text(file.file_name()));
    metadata.insert("file_stem".into(), text(file.file_stem()));
    metadata.insert("file_ext".into(), text(file.extension()));
    metadata.insert("source_file".into(), file.to_string_lossy().into_owned());
    metadata.insert("package_name".into(), package.package_name.clone());
    metadata.insert("client_config".into(), package.client_config.clone());
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use consign_test_support::fixtures::{DeliveryWorkspace, PackageBuilder};

    #[test]
    fn directory_yields_sorted_direct_children() -> Result<()> {
        let workspace = DeliveryWorkspace::new()?;
        let folder = workspace.write_sequence("plates", "bg", "dpx", [3, 1, 2])?;
        workspace.write_source("plates/nested/skip.txt", "nested")?;

        let files = resolve_files(&folder)?;
        let names: Vec<_> = files
            .iter()
            .filter_map(|path| path.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["bg.0001.dpx", "bg.0002.dpx", "bg.0003.dpx"]);
        Ok(())
    }

    #[test]
    fn file_yields_itself_and_empty_dir_yields_nothing() -> Result<()> {
        let workspace = DeliveryWorkspace::new()?;
        let file = workspace.write_source("notes.txt", "x")?;
        assert_eq!(resolve_files(&file)?, [file]);

        let empty = workspace.sources().join("empty");
        fs::create_dir_all(&empty)?;
        assert!(resolve_files(&empty)?.is_empty());
        Ok(())
    }

    #[test]
    fn derived_keys_override_item_metadata() {
        let item = PackageItem::new("/src/plates", "{{ filename }}")
            .with_metadata("filename", "stale")
            .with_metadata("shot", "sh010");
        let package = PackageBuilder::new("PKG").push(item.clone()).build();

        let metadata = file_metadata(&item, Path::new("/src/plates/bg.0001.dpx"), &package);
        assert_eq!(metadata["filename"], "bg.0001.dpx");
        assert_eq!(metadata["file_stem"], "bg.0001");
        assert_eq!(metadata["file_ext"], "dpx");
        assert_eq!(metadata["source_file"], "/src/plates/bg.0001.dpx");
        assert_eq!(metadata["package_name"], "PKG");
        assert_eq!(metadata["client_config"], "standard");
        assert_eq!(metadata["shot"], "sh010");

        let bare = file_metadata(&item, Path::new("/src/README"), &package);
        assert_eq!(bare["file_ext"], "");
    }
}
