//! Per-file correction shared by the sweep and the event processor

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::manifest::{Manifest, ManifestStore};
use crate::model::{ManifestEntry, RemoteObject};
use crate::path::resolve_path;
use crate::publicity::is_effectively_public;
use crate::remote::{LinkChange, RemoteStore, align_shared_link};

/// Result of correcting one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FileOutcome {
    /// File is public and its row was upserted
    Published {
        entry: ManifestEntry,
        link_created: bool,
    },
    /// File is not public and any row at its path was deleted
    Withdrawn { path: String, link_removed: bool },
}

impl FileOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, FileOutcome::Published { .. })
    }
}

/// Align the file's shared link with `desired_public`, then upsert or delete
/// its manifest row.
///
/// The path is resolved before any remote mutation, so a file that cannot
/// be keyed (see [`crate::Error::RootLevelObject`]) is left untouched.
pub fn correct_file<R, S>(
    remote: &R,
    manifest: &Manifest<'_, S>,
    root_id: &str,
    file: RemoteObject,
    desired_public: bool,
) -> Result<FileOutcome>
where
    R: RemoteStore + ?Sized,
    S: ManifestStore + ?Sized,
{
    let path = resolve_path(&file, root_id)?;
    let (file, change) = align_shared_link(remote, file, desired_public)?;

    if is_effectively_public(&file)? {
        let entry = manifest.put_file(&file)?;
        tracing::debug!(path = %entry.path, id = %file.id, "Published");
        Ok(FileOutcome::Published {
            entry,
            link_created: change == LinkChange::Created,
        })
    } else {
        manifest.delete(&path)?;
        tracing::debug!(path = %path, id = %file.id, "Withdrawn");
        Ok(FileOutcome::Withdrawn {
            path,
            link_removed: change == LinkChange::Removed,
        })
    }
}
