//! Catalog files on disk.

use std::{
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::catalog::Catalog;

/// File extension used when listing saved catalogs.
pub const DEFAULT_EXTENSION: &str = "lib";

/// A catalog file found in the store directory.
#[derive(Debug, Clone)]
pub struct StoreEntry {
    /// Absolute or root-relative path of the file.
    pub path: PathBuf,
    /// Library name read from the file's first record.
    pub name: String,
    /// Publications held in the file.
    pub publications: usize,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

/// Reads and writes catalog files beneath a root directory.
///
/// Each operation opens its file, performs a single decode or encode pass,
/// and closes it before returning, on success or failure.
#[derive(Debug, Clone)]
pub struct CatalogStore {
    root: PathBuf,
    extension: String,
}

impl CatalogStore {
    /// Create a store resolving relative names against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// Use a different extension for [`CatalogStore::entries`].
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into().trim_start_matches('.').to_string();
        self
    }

    /// Directory relative names are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a user-supplied file name to a path. Absolute paths pass through.
    pub fn resolve(&self, name: impl AsRef<Path>) -> PathBuf {
        let name = name.as_ref();
        if name.is_absolute() {
            name.to_path_buf()
        } else {
            self.root.join(name)
        }
    }

    /// Decode the catalog stored under `name`.
    pub fn open(&self, name: impl AsRef<Path>) -> Result<Catalog> {
        let path = self.resolve(name);
        let file =
            File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
        let catalog = Catalog::read_from(BufReader::new(file))
            .with_context(|| format!("failed to read catalog {}", path.display()))?;
        info!(path = %path.display(), name = %catalog.name(), "opened catalog");
        Ok(catalog)
    }

    /// Encode `catalog` to `name`, replacing any existing file only once the
    /// new contents are fully written.
    pub fn save(&self, catalog: &Catalog, name: impl AsRef<Path>) -> Result<PathBuf> {
        let path = self.resolve(name);
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

        let mut staged = NamedTempFile::new_in(&dir)
            .with_context(|| format!("failed to stage a file in {}", dir.display()))?;
        {
            let mut writer = BufWriter::new(staged.as_file_mut());
            catalog
                .write_to(&mut writer)
                .with_context(|| format!("failed to write catalog {}", path.display()))?;
            writer
                .flush()
                .with_context(|| format!("failed to write catalog {}", path.display()))?;
        }
        let permissions = match fs::metadata(&path) {
            Ok(existing) => Some(existing.permissions()),
            Err(_) => new_file_permissions(),
        };
        if let Some(permissions) = permissions {
            staged
                .as_file()
                .set_permissions(permissions)
                .with_context(|| format!("failed to set permissions for {}", path.display()))?;
        }
        staged
            .persist(&path)
            .with_context(|| format!("failed to replace {}", path.display()))?;

        info!(path = %path.display(), name = %catalog.name(), "saved catalog");
        Ok(path)
    }

    /// Catalog files in the root directory, most recently modified first.
    ///
    /// Files that fail to decode are logged and left out.
    pub fn entries(&self) -> Result<Vec<StoreEntry>> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut entries = Vec::new();
        for entry in fs::read_dir(&self.root)
            .with_context(|| format!("failed to read {}", self.root.display()))?
        {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(self.extension.as_str()) {
                continue;
            }

            let modified = entry.metadata()?.modified()?;
            match self.open(&path) {
                Ok(catalog) => entries.push(StoreEntry {
                    name: catalog.name().to_string(),
                    publications: catalog.publications().len(),
                    modified: DateTime::<Utc>::from(modified),
                    path,
                }),
                Err(err) => warn!("Skipping unreadable catalog {}: {err:#}", path.display()),
            }
        }

        entries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(entries)
    }
}

/// Mode for a catalog written where no file existed. Staged files start at
/// 0600, which would otherwise leak onto the saved catalog.
#[cfg(unix)]
fn new_file_permissions() -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;
    Some(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn new_file_permissions() -> Option<fs::Permissions> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patron, Publication};
    use tempfile::tempdir;

    fn sample() -> Result<Catalog> {
        let mut catalog = Catalog::new("Branch");
        catalog.add_publication(Publication::new("Dune", "Herbert", 1965)?);
        catalog.add_publication(Publication::video("Alien", "Scott", 1979, 117)?);
        catalog.add_patron(Patron::new("Ada", "ada@example.com"));
        catalog.check_out(1, 0)?;
        Ok(catalog)
    }

    #[test]
    fn save_then_open_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let store = CatalogStore::new(dir.path());
        let catalog = sample()?;

        let path = store.save(&catalog, "branch.lib")?;
        assert_eq!(path, dir.path().join("branch.lib"));
        assert!(fs::read_to_string(&path)?.starts_with("Branch\n2\npublication\n"));

        let reopened = store.open("branch.lib")?;
        assert_eq!(reopened, catalog);
        Ok(())
    }

    #[test]
    fn save_overwrites_existing_file() -> Result<()> {
        let dir = tempdir()?;
        let store = CatalogStore::new(dir.path());
        fs::write(dir.path().join("old.lib"), "stale contents that are much longer\n")?;

        store.save(&Catalog::new("Fresh"), "old.lib")?;
        assert_eq!(fs::read_to_string(dir.path().join("old.lib"))?, "Fresh\n0\n0\n");
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_file_permissions() -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir()?;
        let store = CatalogStore::new(dir.path());
        let shared = dir.path().join("shared.lib");
        fs::write(&shared, "Old\n0\n0\n")?;
        fs::set_permissions(&shared, fs::Permissions::from_mode(0o664))?;

        store.save(&Catalog::new("Shared"), "shared.lib")?;
        assert_eq!(fs::metadata(&shared)?.permissions().mode() & 0o777, 0o664);

        let fresh = store.save(&Catalog::new("Fresh"), "fresh.lib")?;
        assert_eq!(fs::metadata(&fresh)?.permissions().mode() & 0o777, 0o644);
        Ok(())
    }

    #[test]
    fn save_creates_nested_directories() -> Result<()> {
        let dir = tempdir()?;
        let store = CatalogStore::new(dir.path());
        let path = store.save(&Catalog::new("Nested"), "a/b/c.lib")?;
        assert!(path.is_file());
        Ok(())
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let store = CatalogStore::new("/srv/library");
        assert_eq!(store.resolve("main.lib"), PathBuf::from("/srv/library/main.lib"));
        assert_eq!(store.resolve("/tmp/x.lib"), PathBuf::from("/tmp/x.lib"));
    }

    #[test]
    fn open_errors_name_the_path() -> Result<()> {
        let dir = tempdir()?;
        let store = CatalogStore::new(dir.path());

        let missing = store.open("missing.lib").unwrap_err();
        assert!(format!("{missing:#}").contains("missing.lib"));

        fs::write(dir.path().join("broken.lib"), "Broken\nlots\n")?;
        let broken = store.open("broken.lib").unwrap_err();
        let message = format!("{broken:#}");
        assert!(message.contains("broken.lib"));
        assert!(message.contains("publication count"));
        Ok(())
    }

    #[test]
    fn entries_list_readable_catalogs_only() -> Result<()> {
        let dir = tempdir()?;
        let store = CatalogStore::new(dir.path()).with_extension(".lib");
        store.save(&sample()?, "good.lib")?;
        fs::write(dir.path().join("bad.lib"), "Bad\n1\nvideo\n")?;
        fs::write(dir.path().join("notes.txt"), "not a catalog")?;

        let entries = store.entries()?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Branch");
        assert_eq!(entries[0].publications, 2);
        Ok(())
    }

    #[test]
    fn entries_of_missing_root_are_empty() -> Result<()> {
        let store = CatalogStore::new("/definitely/not/here");
        assert!(store.entries()?.is_empty());
        Ok(())
    }
}
