//! Snapshots of remote objects and manifest rows
//!
//! A [`RemoteObject`] is whatever the remote store returned for one fetch.
//! The engine never mutates one in place: shared-link mutations hand back a
//! fresh snapshot, and callers re-fetch to observe their own changes.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Kind of a node in the remote tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    File,
    Folder,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::File => "file",
            ObjectKind::Folder => "folder",
        }
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One folder in an object's ancestor chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    pub id: String,
    pub name: String,
}

impl PathEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Effective access level of a shared link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Access {
    Open,
    Company,
    Collaborators,
    #[serde(other)]
    Other,
}

/// Effective permission granted by a shared link
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    CanDownload,
    CanPreview,
    CanEdit,
    #[serde(other)]
    Other,
}

/// A shared link as reported by the remote store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedLink {
    pub access: Access,
    pub permission: Permission,
    /// Direct download URL; folders never carry one
    pub download_url: Option<String>,
}

impl SharedLink {
    /// Whether the link grants open, downloadable access
    pub fn is_open_download(&self) -> bool {
        self.access == Access::Open && self.permission == Permission::CanDownload
    }
}

/// Sharing state as present on a fetched snapshot
///
/// Listing and fetch calls take a field projection; when the projection
/// omits the shared link the state is [`LinkState::NotFetched`] and reading
/// it fails with [`Error::IncompleteObject`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    NotFetched,
    Absent,
    Present(SharedLink),
}

/// Snapshot of a file or folder in the remote store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub id: String,
    pub name: String,
    pub kind: ObjectKind,
    /// Ancestors ordered from the top of the store down to the direct parent
    pub ancestors: Vec<PathEntry>,
    pub link: LinkState,
}

impl RemoteObject {
    /// Own shared link, or [`Error::IncompleteObject`] if the snapshot
    /// was fetched without it.
    pub fn shared_link(&self) -> Result<Option<&SharedLink>> {
        match &self.link {
            LinkState::NotFetched => Err(Error::IncompleteObject {
                id: self.id.clone(),
            }),
            LinkState::Absent => Ok(None),
            LinkState::Present(link) => Ok(Some(link)),
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == ObjectKind::File
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ObjectKind::Folder
    }
}

/// One row of the manifest: logical path to download URL
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Primary key
    pub path: String,
    pub object_id: String,
    pub download_url: String,
}

impl ManifestEntry {
    pub fn new(
        path: impl Into<String>,
        object_id: impl Into<String>,
        download_url: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            object_id: object_id.into(),
            download_url: download_url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object(link: LinkState) -> RemoteObject {
        RemoteObject {
            id: "42".to_string(),
            name: "a.dat".to_string(),
            kind: ObjectKind::File,
            ancestors: Vec::new(),
            link,
        }
    }

    #[test]
    fn unfetched_link_is_incomplete() {
        let err = object(LinkState::NotFetched).shared_link().unwrap_err();
        assert!(matches!(err, Error::IncompleteObject { ref id } if id == "42"));
    }

    #[test]
    fn absent_link_reads_as_none() {
        assert!(object(LinkState::Absent).shared_link().unwrap().is_none());
    }

    #[test]
    fn unknown_access_levels_deserialize_as_other() {
        let access: Access = serde_json::from_str("\"enterprise\"").unwrap();
        assert_eq!(access, Access::Other);
        let permission: Permission = serde_json::from_str("\"can_download\"").unwrap();
        assert_eq!(permission, Permission::CanDownload);
    }
}
