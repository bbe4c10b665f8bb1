//! Temporary delivery workspaces and package builders.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use consign_model::{DeliveryPackage, PackageItem, ProcessMethod};
use tempfile::TempDir;

/// A temporary directory split into a `sources/` tree and a `deliveries/` root.
#[derive(Debug)]
pub struct DeliveryWorkspace {
    dir: TempDir,
}

impl DeliveryWorkspace {
    /// Create a fresh workspace.
    ///
    /// # Errors
    ///
    /// Returns an error if the temporary directories cannot be created.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix("consign-workspace-")
            .tempdir()
            .context("failed to create temporary workspace")?;
        fs::create_dir_all(dir.path().join("sources")).context("failed to create sources dir")?;
        fs::create_dir_all(dir.path().join("deliveries"))
            .context("failed to create deliveries dir")?;
        Ok(Self { dir })
    }

    /// Workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Directory holding source files.
    #[must_use]
    pub fn sources(&self) -> PathBuf {
        self.dir.path().join("sources")
    }

    /// Delivery root handed to the engine.
    #[must_use]
    pub fn deliveries(&self) -> PathBuf {
        self.dir.path().join("deliveries")
    }

    /// Write a source file relative to `sources/`, creating parents.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn write_source(&self, relative: &str, contents: &str) -> Result<PathBuf> {
        let path = self.sources().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Write `<prefix>.<frame>.<ext>` files for each frame into `sources/<dir>`.
    ///
    /// Frames are zero-padded to four digits.
    ///
    /// # Errors
    ///
    /// Returns an error if any frame cannot be written.
    pub fn write_sequence(
        &self,
        dir: &str,
        prefix: &str,
        ext: &str,
        frames: impl IntoIterator<Item = u32>,
    ) -> Result<PathBuf> {
        let folder = self.sources().join(dir);
        fs::create_dir_all(&folder)
            .with_context(|| format!("failed to create {}", folder.display()))?;
        for frame in frames {
            let path = folder.join(format!("{prefix}.{frame:04}.{ext}"));
            fs::write(&path, format!("frame {frame}"))
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
        Ok(folder)
    }

    /// Sorted list of every path (files, directories, links) below `dir`, relative to it.
    ///
    /// Used to assert that an operation left a tree untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read.
    pub fn tree(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        if dir.exists() {
            collect(dir, dir, &mut entries)?;
        }
        entries.sort();
        Ok(entries)
    }
}

fn collect(base: &Path, dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let entry = entry?;
        let path = entry.path();
        out.push(path.strip_prefix(base)?.to_path_buf());
        if entry.file_type()?.is_dir() {
            collect(base, &path, out)?;
        }
    }
    Ok(())
}

/// Builder for [`DeliveryPackage`] values in tests.
#[derive(Debug, Clone)]
pub struct PackageBuilder {
    package: DeliveryPackage,
}

impl PackageBuilder {
    /// Start a package named `name` with the `standard` client configuration.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            package: DeliveryPackage {
                package_name: name.to_string(),
                client_config: "standard".to_string(),
                items: Vec::new(),
                callbacks: std::collections::BTreeMap::new(),
                destination_root: None,
                dry_run: false,
            },
        }
    }

    /// Append an item using the default strategy.
    #[must_use]
    pub fn item(self, source: impl Into<PathBuf>, template: &str) -> Self {
        self.push(PackageItem::new(source, template))
    }

    /// Append an item using `method`.
    #[must_use]
    pub fn item_with(self, source: impl Into<PathBuf>, template: &str, method: &[&str]) -> Self {
        self.push(
            PackageItem::new(source, template)
                .with_process_method(ProcessMethod::chain(method.iter().copied())),
        )
    }

    /// Append a fully built item.
    #[must_use]
    pub fn push(mut self, item: PackageItem) -> Self {
        self.package.items.push(item);
        self
    }

    /// Deliver under `root` instead of the configured root.
    #[must_use]
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.package.destination_root = Some(root.into());
        self
    }

    /// Toggle dry run.
    #[must_use]
    pub const fn dry_run(mut self, dry_run: bool) -> Self {
        self.package.dry_run = dry_run;
        self
    }

    /// Attach a callback with its configuration.
    #[must_use]
    pub fn callback(mut self, name: &str, config: consign_model::CallbackConfig) -> Self {
        self.package.callbacks.insert(name.to_string(), config);
        self
    }

    /// Finish the package.
    #[must_use]
    pub fn build(self) -> DeliveryPackage {
        self.package
    }
}
