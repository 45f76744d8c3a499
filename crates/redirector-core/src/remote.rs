//! Remote content store abstraction
//!
//! The engine talks to the remote tree only through [`RemoteStore`]. All
//! calls block until the store answers.

use crate::model::{ObjectKind, RemoteObject};
use crate::{Error, Result};

/// Field projection requested for every fetch and listing
pub const OBJECT_FIELDS: &[&str] = &["name", "path_collection", "shared_link"];

/// One page of a folder listing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemPage {
    /// Files and folders on the page
    pub items: Vec<RemoteObject>,
    /// Raw entries the page covered, counting ones that are neither file
    /// nor folder. Paging offsets advance by this.
    pub entries: usize,
}

impl ItemPage {
    /// Page where every entry is a file or folder
    pub fn of(items: Vec<RemoteObject>) -> Self {
        Self {
            entries: items.len(),
            items,
        }
    }
}

/// Access to a hierarchical content store whose nodes carry shared links
pub trait RemoteStore {
    /// Fetch a file by id. `Ok(None)` when the store reports it missing.
    fn get_file(&self, id: &str, fields: &[&str]) -> Result<Option<RemoteObject>>;

    /// Fetch a folder by id. `Ok(None)` when the store reports it missing.
    fn get_folder(&self, id: &str, fields: &[&str]) -> Result<Option<RemoteObject>>;

    /// One page of a folder's direct children covering at most `limit`
    /// entries starting at `offset`. A page covering fewer than `limit`
    /// entries is the last one.
    fn list_folder_items(
        &self,
        folder_id: &str,
        limit: usize,
        offset: usize,
        fields: &[&str],
    ) -> Result<ItemPage>;

    /// Create an open, downloadable shared link; returns the updated object.
    fn create_shared_link(&self, object: &RemoteObject) -> Result<RemoteObject>;

    /// Remove the object's shared link. The returned flag carries no state,
    /// re-fetch to observe the result.
    fn remove_shared_link(&self, object: &RemoteObject) -> Result<bool>;
}

/// Fetch an object of the given kind with the full field projection
pub fn fetch<R: RemoteStore + ?Sized>(
    remote: &R,
    kind: ObjectKind,
    id: &str,
) -> Result<Option<RemoteObject>> {
    match kind {
        ObjectKind::File => remote.get_file(id, OBJECT_FIELDS),
        ObjectKind::Folder => remote.get_folder(id, OBJECT_FIELDS),
    }
}

/// What [`align_shared_link`] did to the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkChange {
    Unchanged,
    Created,
    Removed,
}

/// Bring an object's own shared link in line with the desired public state.
///
/// Returns the canonical post-mutation snapshot together with what changed.
pub fn align_shared_link<R: RemoteStore + ?Sized>(
    remote: &R,
    object: RemoteObject,
    desired_public: bool,
) -> Result<(RemoteObject, LinkChange)> {
    let actual_public = crate::publicity::is_effectively_public(&object)?;

    if desired_public && !actual_public {
        tracing::debug!(id = %object.id, name = %object.name, "Creating shared link");
        let updated = remote.create_shared_link(&object)?;
        Ok((updated, LinkChange::Created))
    } else if !desired_public && actual_public {
        tracing::debug!(id = %object.id, name = %object.name, "Removing shared link");
        if !remote.remove_shared_link(&object)? {
            return Err(Error::remote(
                None,
                format!("removing shared link of {} was refused", object.id),
            ));
        }
        let refreshed = fetch(remote, object.kind, &object.id)?.ok_or_else(|| {
            Error::remote(
                Some(404),
                format!("{} disappeared after its shared link was removed", object.id),
            )
        })?;
        Ok((refreshed, LinkChange::Removed))
    } else {
        Ok((object, LinkChange::Unchanged))
    }
}
