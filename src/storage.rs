// Persisted client-side key-value state (session token, theme).
//
// Every read and write holds an exclusive lock on a sidecar `.lock` file and
// writes go through `atomic_write`, so a concurrent login write and logout
// clear can never leave a torn value behind.
use crate::context::SharedContext;
use anyhow::{Context, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Key holding the bearer token issued by the backend.
pub const TOKEN_KEY: &str = "token";
/// Key holding the preferred color theme.
pub const THEME_KEY: &str = "theme";

type Items = BTreeMap<String, String>;

/// File-backed equivalent of browser local storage.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    ctx: SharedContext,
}

impl LocalStorage {
    pub fn new(ctx: SharedContext) -> Self {
        Self { ctx }
    }

    fn path(&self) -> Result<PathBuf> {
        self.ctx.get_local_storage_path()
    }

    fn get_lock_path(file_path: &Path) -> PathBuf {
        let mut lock_path = file_path.to_path_buf();
        if let Some(ext) = file_path.extension() {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".lock");
            lock_path.set_extension(new_ext);
        } else {
            lock_path.set_extension("lock");
        }
        lock_path
    }

    /// Runs `f` while holding an exclusive lock associated with `file_path`.
    pub fn with_lock<F, T>(file_path: &Path, f: F) -> Result<T>
    where
        F: FnOnce() -> Result<T>,
    {
        let lock_path = Self::get_lock_path(file_path);
        let file = fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file {:?}", lock_path))?;

        file.lock_exclusive()?;
        let result = f();
        file.unlock()?;
        result
    }

    /// Atomic write: Write to .tmp file then rename
    pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(path: P, contents: C) -> Result<()> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, contents)?;
        fs::rename(tmp_path, path)?;
        Ok(())
    }

    // Caller must hold the lock.
    fn read_items(path: &Path) -> Result<Items> {
        if !path.exists() {
            return Ok(Items::new());
        }
        let json = fs::read_to_string(path)?;
        match serde_json::from_str::<Items>(&json) {
            Ok(items) => Ok(items),
            Err(e) => {
                log::warn!(
                    "Local storage at {} is unreadable ({}); treating it as empty",
                    path.display(),
                    e
                );
                Ok(Items::new())
            }
        }
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        let path = self.path()?;
        Self::with_lock(&path, || Ok(Self::read_items(&path)?.remove(key)))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.update(|items| {
            items.insert(key.to_string(), value.to_string());
        })
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.update(|items| {
            items.remove(key);
        })
    }

    /// Read-modify-write of the whole store under a single lock.
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Items),
    {
        let path = self.path()?;
        Self::with_lock(&path, || {
            let mut items = Self::read_items(&path)?;
            f(&mut items);
            let json = serde_json::to_string_pretty(&items)?;
            Self::atomic_write(&path, json)?;
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AppContext, TestContext};
    use std::sync::Arc;

    fn storage() -> (Arc<TestContext>, LocalStorage) {
        let ctx = Arc::new(TestContext::new());
        let storage = LocalStorage::new(ctx.clone());
        (ctx, storage)
    }

    #[test]
    fn test_set_get_remove() {
        let (_ctx, storage) = storage();

        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);

        storage.set_item(TOKEN_KEY, "abc.def.ghi").unwrap();
        storage.set_item(THEME_KEY, "dark").unwrap();
        assert_eq!(
            storage.get_item(TOKEN_KEY).unwrap().as_deref(),
            Some("abc.def.ghi")
        );

        storage.remove_item(TOKEN_KEY).unwrap();
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);
        // Other keys are untouched.
        assert_eq!(storage.get_item(THEME_KEY).unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_overwrite_replaces_value() {
        let (_ctx, storage) = storage();
        storage.set_item(TOKEN_KEY, "first").unwrap();
        storage.set_item(TOKEN_KEY, "second").unwrap();
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_corrupt_file_reads_as_empty_and_is_repaired() {
        let (ctx, storage) = storage();
        let path = ctx.get_local_storage_path().unwrap();
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(storage.get_item(TOKEN_KEY).unwrap(), None);

        storage.set_item(TOKEN_KEY, "fresh").unwrap();
        assert_eq!(storage.get_item(TOKEN_KEY).unwrap().as_deref(), Some("fresh"));
    }

    #[test]
    fn test_no_tmp_file_left_behind() {
        let (ctx, storage) = storage();
        storage.set_item(TOKEN_KEY, "t").unwrap();
        let path = ctx.get_local_storage_path().unwrap();
        assert!(path.exists());
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_lock_path_keeps_original_extension() {
        let lock = LocalStorage::get_lock_path(Path::new("/tmp/local_storage.json"));
        assert_eq!(lock, PathBuf::from("/tmp/local_storage.json.lock"));
    }
}
