//! Offline article cache: a bounded, persistent store of transformed
//! documents keyed by article title.
//!
//! The whole store is serialized as one JSON blob and written back through a
//! [`StorageBackend`] on every mutation. Capacity is enforced on insert of a
//! genuinely new title only: the oldest entries (by save timestamp) are
//! evicted one at a time until the new entry fits. Re-saving an existing
//! title refreshes its timestamp and never evicts anything.
//!
//! A corrupt persisted blob resets the store to empty with a warning — cache
//! corruption is never fatal. A failed persist (storage quota) rolls the
//! in-memory state back to what it was before the call and surfaces the
//! error to the caller.

use anyhow::{Context, Result};
use chrono::Utc;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::CachedArticle;

/// Default capacity of the offline store.
pub const MAX_CACHED_ARTICLES: usize = 50;

/// Persistence seam for the serialized store. The file-backed implementation
/// is the production path; tests inject an in-memory backend with write
/// failure injection.
pub trait StorageBackend: Send + Sync {
    /// Read the persisted blob, `None` if nothing was ever written.
    fn load(&self) -> Result<Option<String>>;
    /// Replace the persisted blob atomically from the caller's view.
    fn persist(&self, blob: &str) -> Result<()>;
}

/// JSON-file storage under a configurable path.
pub struct FileStorage {
    path: PathBuf,
}

impl FileStorage {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }
}

impl StorageBackend for FileStorage {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let blob = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cache file: {}", self.path.display()))?;
        Ok(Some(blob))
    }

    fn persist(&self, blob: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create cache directory: {}", parent.display())
            })?;
        }
        std::fs::write(&self.path, blob)
            .with_context(|| format!("Failed to write cache file: {}", self.path.display()))
    }
}

/// In-memory storage for tests; `fail_writes` simulates quota exhaustion.
#[derive(Default)]
pub struct MemoryStorage {
    blob: Mutex<Option<String>>,
    fail_writes: std::sync::atomic::AtomicBool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_blob(blob: &str) -> Self {
        Self {
            blob: Mutex::new(Some(blob.to_string())),
            fail_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes
            .store(fail, std::sync::atomic::Ordering::SeqCst);
    }
}

impl StorageBackend for MemoryStorage {
    fn load(&self) -> Result<Option<String>> {
        Ok(self.blob.lock().unwrap().clone())
    }

    fn persist(&self, blob: &str) -> Result<()> {
        if self.fail_writes.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("storage quota exceeded");
        }
        *self.blob.lock().unwrap() = Some(blob.to_string());
        Ok(())
    }
}

/// The bounded offline store. The mutex covers the whole
/// read-modify-evict-persist sequence, so concurrent savers never observe a
/// torn intermediate state.
pub struct OfflineCache<S: StorageBackend> {
    entries: Mutex<HashMap<String, CachedArticle>>,
    storage: S,
    max_entries: usize,
}

impl<S: StorageBackend> OfflineCache<S> {
    /// Open the cache, hydrating from persisted state. An unparseable blob
    /// starts the store empty with a warning rather than failing.
    pub fn open(storage: S, max_entries: usize) -> Self {
        let entries = match storage.load() {
            Ok(Some(blob)) => match serde_json::from_str::<HashMap<String, CachedArticle>>(&blob) {
                Ok(entries) => entries,
                Err(e) => {
                    eprintln!("Warning: offline cache is corrupt, starting empty: {}", e);
                    HashMap::new()
                }
            },
            Ok(None) => HashMap::new(),
            Err(e) => {
                eprintln!("Warning: could not read offline cache, starting empty: {}", e);
                HashMap::new()
            }
        };
        Self {
            entries: Mutex::new(entries),
            storage,
            max_entries,
        }
    }

    pub fn with_default_capacity(storage: S) -> Self {
        Self::open(storage, MAX_CACHED_ARTICLES)
    }

    /// Upsert an article. Existing titles are replaced in place with a fresh
    /// timestamp and never trigger eviction; a new title at capacity evicts
    /// the oldest entries first, one per missing slot.
    pub fn save(&self, title: &str, content: &str, images: Vec<String>) -> Result<()> {
        self.save_with_timestamp(title, content, images, Utc::now().timestamp_millis())
    }

    /// [`save`](Self::save) with an explicit timestamp; used when restoring
    /// an exported store and by tests that need a fixed eviction order.
    pub fn save_with_timestamp(
        &self,
        title: &str,
        content: &str,
        images: Vec<String>,
        timestamp: i64,
    ) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();

        // Mutate a copy so a failed persist leaves the live map untouched.
        let mut next = entries.clone();
        if !next.contains_key(title) {
            while next.len() >= self.max_entries {
                let oldest = next
                    .values()
                    .min_by_key(|e| (e.timestamp, e.title.clone()))
                    .map(|e| e.title.clone());
                match oldest {
                    Some(victim) => {
                        next.remove(&victim);
                    }
                    None => break,
                }
            }
        }
        next.insert(
            title.to_string(),
            CachedArticle {
                title: title.to_string(),
                content: content.to_string(),
                timestamp,
                images,
            },
        );

        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    /// Delete by title. Absent titles are a no-op, not an error.
    pub fn remove(&self, title: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if !entries.contains_key(title) {
            return Ok(());
        }
        let mut next = entries.clone();
        next.remove(title);
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    pub fn get(&self, title: &str) -> Option<CachedArticle> {
        self.entries.lock().unwrap().get(title).cloned()
    }

    pub fn has(&self, title: &str) -> bool {
        self.entries.lock().unwrap().contains_key(title)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    /// Empty the whole store in one operation.
    pub fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        let next = HashMap::new();
        self.persist(&next)?;
        *entries = next;
        Ok(())
    }

    /// Byte size of the serialized store. Informational (storage-quota UI);
    /// plays no part in eviction decisions.
    pub fn size_bytes(&self) -> usize {
        let entries = self.entries.lock().unwrap();
        serde_json::to_string(&*entries).map(|s| s.len()).unwrap_or(0)
    }

    /// All entries, most recently saved first.
    pub fn list(&self) -> Vec<CachedArticle> {
        let entries = self.entries.lock().unwrap();
        let mut list: Vec<CachedArticle> = entries.values().cloned().collect();
        list.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(a.title.cmp(&b.title)));
        list
    }

    fn persist(&self, entries: &HashMap<String, CachedArticle>) -> Result<()> {
        let blob = serde_json::to_string(entries).context("Failed to serialize offline cache")?;
        self.storage.persist(&blob)
    }
}
