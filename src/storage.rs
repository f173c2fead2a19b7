// Key/value storage backends
//
// A `Storage` is the local-storage area the task snapshot lives in: string
// keys mapped to string values, read once at startup and rewritten after
// every mutation.

use eyre::{Context, Result, eyre};
use fs2::FileExt;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CURRENT_VERSION: u32 = 1;
const LOCK_FILE: &str = ".lock";

/// String key/value storage with local-storage semantics
pub trait Storage {
    /// Value stored under `key`, or `None` when absent
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing an absent key is not an error
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set_item(key, value)
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        (**self).remove_item(key)
    }
}

/// Validate a storage key
///
/// Keys double as file names for `FileStorage`, so they are restricted to
/// alphanumerics plus `_` and `-`.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(eyre!("Storage key cannot be empty"));
    }
    if key.len() > 64 {
        return Err(eyre!("Storage key too long: {} (max 64 chars)", key));
    }
    if !key.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(eyre!("Invalid storage key: {} (must be alphanumeric with _/-)", key));
    }
    Ok(())
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Volatile storage, lost when dropped
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        self.items.remove(key);
        Ok(())
    }
}

// ============================================================================
// File backend
// ============================================================================

/// One `<key>.json` file per key inside a directory
#[derive(Debug)]
pub struct FileStorage {
    base_path: PathBuf,
}

impl FileStorage {
    /// Open or create file storage rooted at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();

        fs::create_dir_all(&base_path)
            .with_context(|| format!("Failed to create storage directory: {}", base_path.display()))?;

        let storage = Self { base_path };
        storage.write_version()?;

        debug!(path = ?storage.base_path, "Opened file storage");
        Ok(storage)
    }

    /// Get the base path of this storage
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Path of the file holding `key`
    pub fn item_path(&self, key: &str) -> PathBuf {
        self.base_path.join(format!("{}.json", key))
    }

    /// Write version file
    fn write_version(&self) -> Result<()> {
        let version_path = self.base_path.join(".version");
        if !version_path.exists() {
            fs::write(&version_path, CURRENT_VERSION.to_string())
                .with_context(|| format!("Failed to write version file: {}", version_path.display()))?;
        }
        Ok(())
    }

    fn lock_file(&self) -> Result<File> {
        OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.base_path.join(LOCK_FILE))
            .context("Failed to open storage lock file")
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        validate_key(key)?;
        let path = self.item_path(key);

        let lock = self.lock_file()?;
        lock.lock_shared().context("Failed to acquire shared storage lock")?;

        if !path.exists() {
            return Ok(None);
        }

        let value = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage item: {}", path.display()))?;

        // Lock is automatically released when the lock file is dropped
        Ok(Some(value))
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.item_path(key);
        let tmp_path = self.base_path.join(format!(".{}.json.tmp", key));

        let lock = self.lock_file()?;
        lock.lock_exclusive().context("Failed to acquire storage lock")?;

        if let Err(e) = write_replacing(&tmp_path, &path, value) {
            // Leave no partial temp file behind
            let _ = fs::remove_file(&tmp_path);
            return Err(e);
        }

        debug!(key, bytes = value.len(), "Wrote storage item");
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        validate_key(key)?;
        let path = self.item_path(key);

        let lock = self.lock_file()?;
        lock.lock_exclusive().context("Failed to acquire storage lock")?;

        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to remove storage item: {}", path.display()))?;
            info!(key, "Removed storage item");
        }

        Ok(())
    }
}

/// Write `value` to `tmp_path`, flush it, then rename it over `path`
fn write_replacing(tmp_path: &Path, path: &Path, value: &str) -> Result<()> {
    let mut file = File::create(tmp_path)
        .with_context(|| format!("Failed to create temporary file: {}", tmp_path.display()))?;
    file.write_all(value.as_bytes())
        .with_context(|| format!("Failed to write temporary file: {}", tmp_path.display()))?;
    file.sync_all()?; // Ensure data is flushed to disk before the rename
    drop(file);

    fs::rename(tmp_path, path).with_context(|| format!("Failed to replace storage item: {}", path.display()))
}
