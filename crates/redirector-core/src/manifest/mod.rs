//! Manifest storage
//!
//! The manifest maps a logical path to the download URL of a public file.
//! Stores implement the raw key-value operations in [`ManifestStore`];
//! [`Manifest`] layers the file-oriented operations and cursor-following
//! scan on top.

mod file_store;

pub use file_store::{DEFAULT_SCAN_PAGE_SIZE, FileManifestStore};

use crate::model::{ManifestEntry, RemoteObject};
use crate::path::resolve_path;
use crate::publicity::is_effectively_public;
use crate::{Error, Result};

/// One page returned by [`ManifestStore::scan_page`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub items: Vec<ManifestEntry>,
    /// Opaque cursor for the next page, `None` on the last page
    pub next_cursor: Option<String>,
}

/// Key-value store holding manifest rows keyed by path
///
/// Every put and delete is a single atomic write against the store.
pub trait ManifestStore {
    /// Insert or overwrite the entry at `entry.path`.
    fn put(&self, entry: &ManifestEntry) -> Result<()>;

    /// Remove the entry at `path`. Removing a missing path is not an error.
    fn delete(&self, path: &str) -> Result<()>;

    fn get(&self, path: &str) -> Result<Option<ManifestEntry>>;

    /// One page of entries starting after `cursor` (or at the start).
    fn scan_page(&self, cursor: Option<&str>) -> Result<ScanPage>;
}

/// File-oriented view over a [`ManifestStore`]
pub struct Manifest<'a, S: ?Sized> {
    store: &'a S,
    root_id: &'a str,
}

impl<'a, S: ManifestStore + ?Sized> Manifest<'a, S> {
    pub fn new(store: &'a S, root_id: &'a str) -> Self {
        Self { store, root_id }
    }

    pub fn put(&self, entry: &ManifestEntry) -> Result<()> {
        self.store.put(entry)
    }

    pub fn delete(&self, path: &str) -> Result<()> {
        self.store.delete(path)
    }

    pub fn get(&self, path: &str) -> Result<Option<ManifestEntry>> {
        self.store.get(path)
    }

    /// Stored download URL for `path`, if any
    pub fn download_url(&self, path: &str) -> Result<Option<String>> {
        Ok(self.store.get(path)?.map(|entry| entry.download_url))
    }

    /// Build the manifest row for a public file.
    ///
    /// # Errors
    ///
    /// [`Error::NotPublic`] if the file is not effectively public,
    /// [`Error::MissingDownloadUrl`] if its link has no download URL, or
    /// any path resolution error.
    pub fn entry_for(&self, file: &RemoteObject) -> Result<ManifestEntry> {
        if !is_effectively_public(file)? {
            return Err(Error::NotPublic {
                id: file.id.clone(),
            });
        }
        let download_url = file
            .shared_link()?
            .and_then(|link| link.download_url.clone())
            .ok_or_else(|| Error::MissingDownloadUrl {
                id: file.id.clone(),
            })?;

        Ok(ManifestEntry {
            path: resolve_path(file, self.root_id)?,
            object_id: file.id.clone(),
            download_url,
        })
    }

    /// Upsert the row for a public file and return it
    pub fn put_file(&self, file: &RemoteObject) -> Result<ManifestEntry> {
        let entry = self.entry_for(file)?;
        self.store.put(&entry)?;
        Ok(entry)
    }

    /// Remove whatever row sits at the file's current path
    pub fn delete_file(&self, file: &RemoteObject) -> Result<String> {
        let path = resolve_path(file, self.root_id)?;
        self.store.delete(&path)?;
        Ok(path)
    }

    /// Lazily iterate every entry, following continuation cursors.
    pub fn scan(&self) -> ManifestScan<'a, S> {
        ManifestScan {
            store: self.store,
            buffer: Vec::new().into_iter(),
            cursor: None,
            done: false,
        }
    }
}

/// Iterator returned by [`Manifest::scan`]
pub struct ManifestScan<'a, S: ?Sized> {
    store: &'a S,
    buffer: std::vec::IntoIter<ManifestEntry>,
    cursor: Option<String>,
    done: bool,
}

impl<S: ManifestStore + ?Sized> Iterator for ManifestScan<'_, S> {
    type Item = Result<ManifestEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(entry) = self.buffer.next() {
                return Some(Ok(entry));
            }
            if self.done {
                return None;
            }

            match self.store.scan_page(self.cursor.as_deref()) {
                Ok(page) => {
                    self.done = page.next_cursor.is_none();
                    self.cursor = page.next_cursor;
                    self.buffer = page.items.into_iter();
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}
