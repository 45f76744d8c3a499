//! JSON shapes returned by the Box API and their conversion into
//! [`RemoteObject`] snapshots

use redirector_core::{
    Access, ItemPage, LinkState, ObjectKind, PathEntry, Permission, RemoteObject, SharedLink,
};
use serde::{Deserialize, Deserializer};

use crate::{Error, Result};

/// A file, folder or web link as returned by fetch and listing calls
#[derive(Debug, Deserialize)]
pub(crate) struct WireItem {
    #[serde(rename = "type")]
    pub kind: String,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path_collection: Option<PathCollection>,
    /// Outer `None`: field not returned. Inner `None`: explicitly `null`.
    #[serde(default, deserialize_with = "present")]
    pub shared_link: Option<Option<WireLink>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathCollection {
    pub entries: Vec<PathRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PathRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireLink {
    #[serde(default)]
    pub access: Option<Access>,
    #[serde(default)]
    pub effective_access: Option<Access>,
    #[serde(default)]
    pub effective_permission: Option<Permission>,
    #[serde(default)]
    pub permissions: Option<WirePermissions>,
    #[serde(default)]
    pub download_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct WirePermissions {
    #[serde(default)]
    pub can_download: bool,
    #[serde(default)]
    pub can_preview: bool,
}

/// Body of `GET /folders/{id}/items`
#[derive(Debug, Deserialize)]
pub(crate) struct WireItemPage {
    #[serde(default)]
    pub entries: Vec<WireItem>,
}

fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl WireLink {
    fn into_shared_link(self) -> SharedLink {
        let access = self
            .effective_access
            .or(self.access)
            .unwrap_or(Access::Other);

        let permission = self.effective_permission.unwrap_or_else(|| {
            let permissions = self.permissions.unwrap_or_default();
            if permissions.can_download {
                Permission::CanDownload
            } else if permissions.can_preview {
                Permission::CanPreview
            } else {
                Permission::Other
            }
        });

        SharedLink {
            access,
            permission,
            download_url: self.download_url,
        }
    }
}

impl WireItem {
    fn object_kind(&self) -> Option<ObjectKind> {
        match self.kind.as_str() {
            "file" => Some(ObjectKind::File),
            "folder" => Some(ObjectKind::Folder),
            _ => None,
        }
    }

    /// Convert to a snapshot; `Ok(None)` for entries that are neither file
    /// nor folder.
    pub fn into_object(self) -> Result<Option<RemoteObject>> {
        let Some(kind) = self.object_kind() else {
            tracing::trace!(id = %self.id, kind = %self.kind, "Ignoring entry");
            return Ok(None);
        };

        let name = self
            .name
            .ok_or_else(|| Error::Unexpected(format!("{} {} has no name", self.kind, self.id)))?;

        let ancestors = self
            .path_collection
            .map(|paths| {
                paths
                    .entries
                    .into_iter()
                    .map(|p| PathEntry::new(p.id, p.name))
                    .collect()
            })
            .unwrap_or_default();

        let link = match self.shared_link {
            None => LinkState::NotFetched,
            Some(None) => LinkState::Absent,
            Some(Some(link)) => LinkState::Present(link.into_shared_link()),
        };

        Ok(Some(RemoteObject {
            id: self.id,
            name,
            kind,
            ancestors,
            link,
        }))
    }

    /// Convert an entity returned for a typed fetch
    pub fn into_expected(self, expected: ObjectKind) -> Result<RemoteObject> {
        let kind = self.kind.clone();
        let id = self.id.clone();
        match self.into_object()? {
            Some(object) if object.kind == expected => Ok(object),
            _ => Err(Error::Unexpected(format!(
                "expected a {expected} for {id}, got a {kind}"
            ))),
        }
    }
}

impl WireItemPage {
    pub fn into_page(self) -> Result<ItemPage> {
        let entries = self.entries.len();
        let mut items = Vec::with_capacity(entries);
        for item in self.entries {
            if let Some(object) = item.into_object()? {
                items.push(object);
            }
        }
        Ok(ItemPage { items, entries })
    }
}
