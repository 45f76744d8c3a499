//! In-memory manifest store
//!
//! [`MemoryManifest`] keeps rows in path order and pages them the way the
//! file-backed store does, with a small default page so tests cross page
//! boundaries without building huge trees.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Mutex;

use redirector_core::{ManifestEntry, ManifestStore, Result, ScanPage};

/// In-memory [`ManifestStore`] that counts writes
#[derive(Debug)]
pub struct MemoryManifest {
    rows: Mutex<BTreeMap<String, ManifestEntry>>,
    writes: Mutex<usize>,
    page_size: usize,
}

impl Default for MemoryManifest {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryManifest {
    /// Empty store with a page size of 3
    pub fn new() -> Self {
        Self::with_page_size(3)
    }

    /// # Panics
    ///
    /// Panics if `page_size` is zero.
    pub fn with_page_size(page_size: usize) -> Self {
        assert!(page_size > 0, "MemoryManifest: page size must be positive");
        Self {
            rows: Mutex::new(BTreeMap::new()),
            writes: Mutex::new(0),
            page_size,
        }
    }

    /// Insert rows directly, bypassing the write counter
    pub fn seed<I>(&self, entries: I)
    where
        I: IntoIterator<Item = ManifestEntry>,
    {
        let mut rows = self.rows.lock().expect("MemoryManifest: lock poisoned");
        for entry in entries {
            rows.insert(entry.path.clone(), entry);
        }
    }

    /// Every row in path order
    pub fn entries(&self) -> Vec<ManifestEntry> {
        self.rows
            .lock()
            .expect("MemoryManifest: lock poisoned")
            .values()
            .cloned()
            .collect()
    }

    /// Every stored path in order
    pub fn paths(&self) -> Vec<String> {
        self.entries().into_iter().map(|e| e.path).collect()
    }

    /// Number of puts and deletes since construction
    pub fn writes(&self) -> usize {
        *self.writes.lock().expect("MemoryManifest: lock poisoned")
    }

    fn count_write(&self) {
        *self.writes.lock().expect("MemoryManifest: lock poisoned") += 1;
    }
}

impl ManifestStore for MemoryManifest {
    fn put(&self, entry: &ManifestEntry) -> Result<()> {
        self.count_write();
        self.rows
            .lock()
            .expect("MemoryManifest: lock poisoned")
            .insert(entry.path.clone(), entry.clone());
        Ok(())
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.count_write();
        self.rows
            .lock()
            .expect("MemoryManifest: lock poisoned")
            .remove(path);
        Ok(())
    }

    fn get(&self, path: &str) -> Result<Option<ManifestEntry>> {
        Ok(self
            .rows
            .lock()
            .expect("MemoryManifest: lock poisoned")
            .get(path)
            .cloned())
    }

    fn scan_page(&self, cursor: Option<&str>) -> Result<ScanPage> {
        let rows = self.rows.lock().expect("MemoryManifest: lock poisoned");
        let start = match cursor {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        let mut range = rows.range((start, Bound::Unbounded));
        let items: Vec<ManifestEntry> = range
            .by_ref()
            .take(self.page_size)
            .map(|(_, entry)| entry.clone())
            .collect();
        let next_cursor = match range.next() {
            Some(_) => items.last().map(|e| e.path.clone()),
            None => None,
        };

        Ok(ScanPage { items, next_cursor })
    }
}
