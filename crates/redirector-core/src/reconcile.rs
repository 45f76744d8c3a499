//! Full reconciliation sweep
//!
//! The sweep is the authoritative way to bring the manifest in line with
//! the remote tree:
//!
//! 1. Walk the whole managed folder, seeded with the root's own public flag
//! 2. Correct each file's shared link and manifest row
//! 3. Scan the manifest and delete every row whose `(object id, path)` pair
//!    was not seen during the walk
//!
//! A sweep that fails midway leaves the manifest stale but consistent; the
//! next sweep finishes the job.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::correction::{FileOutcome, correct_file};
use crate::manifest::{Manifest, ManifestStore};
use crate::publicity::is_effectively_public;
use crate::remote::{OBJECT_FIELDS, RemoteStore};
use crate::walker::{ITEM_PAGE_LIMIT, TreeWalker};
use crate::{Error, Result};

/// Summary of one sweep
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Files reached by the walk
    pub files_seen: usize,
    pub published: usize,
    pub withdrawn: usize,
    pub links_created: usize,
    pub links_removed: usize,
    /// Files that have no manifest path
    pub skipped: usize,
    /// Manifest rows inspected by the orphan pass
    pub rows_scanned: usize,
    pub orphans_deleted: usize,
}

impl SweepReport {
    fn started() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            files_seen: 0,
            published: 0,
            withdrawn: 0,
            links_created: 0,
            links_removed: 0,
            skipped: 0,
            rows_scanned: 0,
            orphans_deleted: 0,
        }
    }

    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Published { link_created, .. } => {
                self.published += 1;
                self.links_created += usize::from(*link_created);
            }
            FileOutcome::Withdrawn { link_removed, .. } => {
                self.withdrawn += 1;
                self.links_removed += usize::from(*link_removed);
            }
        }
    }
}

/// Runs full sweeps of one managed folder
pub struct Reconciler<'a, R: ?Sized, S: ?Sized> {
    remote: &'a R,
    store: &'a S,
    root_id: &'a str,
    page_size: usize,
}

impl<'a, R, S> Reconciler<'a, R, S>
where
    R: RemoteStore + ?Sized,
    S: ManifestStore + ?Sized,
{
    pub fn new(remote: &'a R, store: &'a S, root_id: &'a str) -> Self {
        Self {
            remote,
            store,
            root_id,
            page_size: ITEM_PAGE_LIMIT,
        }
    }

    /// Override the remote listing page size
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Run one full sweep.
    ///
    /// # Errors
    ///
    /// Any remote or manifest failure aborts the sweep and is returned.
    pub fn run(&self) -> Result<SweepReport> {
        let mut report = SweepReport::started();
        let manifest = Manifest::new(self.store, self.root_id);

        let root = self
            .remote
            .get_folder(self.root_id, OBJECT_FIELDS)?
            .ok_or_else(|| {
                Error::remote(
                    Some(404),
                    format!("managed folder {} not found", self.root_id),
                )
            })?;
        let root_public = is_effectively_public(&root)?;

        tracing::info!(root_id = self.root_id, root_public, "Checking files in remote store");
        let mut observed: HashSet<(String, String)> = HashSet::new();

        let walker = TreeWalker::new(self.remote).with_page_size(self.page_size);
        for walked in walker.walk(self.root_id, root_public) {
            let walked = walked?;
            report.files_seen += 1;

            let outcome = match correct_file(
                self.remote,
                &manifest,
                self.root_id,
                walked.file,
                walked.public,
            ) {
                Ok(outcome) => outcome,
                Err(Error::RootLevelObject { id, name }) => {
                    tracing::warn!(%id, %name, "File sits directly in the managed folder; skipping");
                    report.skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            if let FileOutcome::Published { entry, .. } = &outcome {
                observed.insert((entry.object_id.clone(), entry.path.clone()));
            }
            report.record(&outcome);
        }
        tracing::info!(files = report.files_seen, "Processed files");

        tracing::info!("Checking manifest for stale rows");
        let mut stale = Vec::new();
        for entry in manifest.scan() {
            let entry = entry?;
            report.rows_scanned += 1;
            if !observed.contains(&(entry.object_id.clone(), entry.path.clone())) {
                stale.push(entry.path);
            }
        }

        // Deleting after the scan keeps the store's cursors valid
        for path in &stale {
            tracing::debug!(path = %path, "Deleting stale row");
            manifest.delete(path)?;
        }
        report.orphans_deleted = stale.len();
        report.finished_at = Utc::now();

        tracing::info!(
            rows = report.rows_scanned,
            deleted = report.orphans_deleted,
            "Processed manifest rows"
        );
        Ok(report)
    }
}
