//! TOML-file backed manifest store
//!
//! The whole table lives in one TOML file. Reads take a shared advisory
//! lock on a sidecar `.lock` file; writes hold the exclusive lock across
//! read-modify-write and replace the table with write-to-temp-then-rename.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use serde::{Deserialize, Serialize};

use super::{ManifestStore, ScanPage};
use crate::model::ManifestEntry;
use crate::{Error, Result};

/// Entries returned per scan page unless configured otherwise
pub const DEFAULT_SCAN_PAGE_SIZE: usize = 100;

const TABLE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Row {
    object_id: String,
    download_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Table {
    /// Table format version for forward compatibility
    version: String,
    #[serde(default)]
    entries: BTreeMap<String, Row>,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            version: TABLE_VERSION.to_string(),
            entries: BTreeMap::new(),
        }
    }
}

/// Manifest store persisted as a single TOML file
#[derive(Debug, Clone)]
pub struct FileManifestStore {
    path: PathBuf,
    page_size: usize,
}

impl FileManifestStore {
    /// Open (or lazily create) the table at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            page_size: DEFAULT_SCAN_PAGE_SIZE,
        }
    }

    /// Entries per scan page. Zero is treated as one.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn open_lock(&self) -> Result<File> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        Ok(OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?)
    }

    fn read_table(&self) -> Result<Table> {
        if !self.path.exists() {
            return Ok(Table::default());
        }
        let content = fs::read_to_string(&self.path)?;
        let table: Table = toml::from_str(&content)?;
        if table.version != TABLE_VERSION {
            return Err(Error::ManifestStore {
                message: format!(
                    "{} has table version {}, expected {TABLE_VERSION}",
                    self.path.display(),
                    table.version
                ),
            });
        }
        Ok(table)
    }

    fn write_table(&self, table: &Table) -> Result<()> {
        let content = toml::to_string_pretty(table)?;

        // Temp file in the same directory keeps the rename on one filesystem
        let temp_name = format!(
            ".{}.{}.tmp",
            self.path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_default(),
            std::process::id()
        );
        let temp_path = self.path.with_file_name(temp_name);

        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        temp_file.write_all(content.as_bytes())?;
        temp_file.sync_all()?;

        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn read_locked(&self) -> Result<Table> {
        let lock = self.open_lock()?;
        lock.lock_shared().map_err(|_| Error::LockFailed {
            path: self.path.clone(),
        })?;
        // Lock released when `lock` is dropped
        self.read_table()
    }

    fn update(&self, apply: impl FnOnce(&mut Table)) -> Result<()> {
        let lock = self.open_lock()?;
        lock.lock_exclusive().map_err(|_| Error::LockFailed {
            path: self.path.clone(),
        })?;

        let mut table = self.read_table()?;
        apply(&mut table);
        self.write_table(&table)
    }
}

impl ManifestStore for FileManifestStore {
    fn put(&self, entry: &ManifestEntry) -> Result<()> {
        self.update(|table| {
            table.entries.insert(
                entry.path.clone(),
                Row {
                    object_id: entry.object_id.clone(),
                    download_url: entry.download_url.clone(),
                },
            );
        })
    }

    fn delete(&self, path: &str) -> Result<()> {
        self.update(|table| {
            table.entries.remove(path);
        })
    }

    fn get(&self, path: &str) -> Result<Option<ManifestEntry>> {
        let table = self.read_locked()?;
        Ok(table
            .entries
            .get(path)
            .map(|row| ManifestEntry::new(path, &row.object_id, &row.download_url)))
    }

    fn scan_page(&self, cursor: Option<&str>) -> Result<ScanPage> {
        use std::ops::Bound;

        let table = self.read_locked()?;
        let lower = match cursor {
            Some(after) => Bound::Excluded(after.to_string()),
            None => Bound::Unbounded,
        };

        let mut rows = table.entries.range((lower, Bound::Unbounded));
        let items: Vec<ManifestEntry> = rows
            .by_ref()
            .take(self.page_size)
            .map(|(path, row)| ManifestEntry::new(path, &row.object_id, &row.download_url))
            .collect();

        let next_cursor = if rows.next().is_some() {
            items.last().map(|entry| entry.path.clone())
        } else {
            None
        };

        Ok(ScanPage { items, next_cursor })
    }
}
