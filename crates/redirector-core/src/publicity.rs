//! Public visibility rules
//!
//! An object is effectively public when its own shared link grants open
//! access with download permission. A file is public by inheritance when
//! any folder between it and the managed root (inclusive) is effectively
//! public.

use std::collections::HashMap;

use crate::Result;
use crate::model::RemoteObject;
use crate::path::root_index;
use crate::remote::{OBJECT_FIELDS, RemoteStore};

/// Whether the object's own shared link grants open, downloadable access.
///
/// # Errors
///
/// Returns [`crate::Error::IncompleteObject`] if the object was fetched
/// without its shared link.
pub fn is_effectively_public(object: &RemoteObject) -> Result<bool> {
    Ok(object
        .shared_link()?
        .is_some_and(|link| link.is_open_download()))
}

/// Per-invocation memo of ancestor folder publicity, keyed by folder id.
///
/// Build one per sweep or event and drop it afterwards.
#[derive(Debug, Default)]
pub struct AncestorCache {
    folders: HashMap<String, bool>,
}

impl AncestorCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.folders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    fn lookup<R: RemoteStore + ?Sized>(&mut self, remote: &R, folder_id: &str) -> Result<bool> {
        if let Some(public) = self.folders.get(folder_id) {
            return Ok(*public);
        }

        // A folder that vanished since the snapshot was taken grants nothing
        let public = match remote.get_folder(folder_id, OBJECT_FIELDS)? {
            Some(folder) => is_effectively_public(&folder)?,
            None => {
                tracing::debug!(folder_id, "Ancestor folder not found");
                false
            }
        };
        self.folders.insert(folder_id.to_string(), public);
        Ok(public)
    }
}

/// Whether any ancestor from the direct parent up to the managed root is
/// effectively public. Stops at the first public ancestor.
///
/// # Errors
///
/// Returns [`crate::Error::OutsideManagedRoot`] if the managed root is not
/// in the object's ancestor chain, or any remote error from fetching an
/// ancestor.
pub fn is_public_by_inheritance<R: RemoteStore + ?Sized>(
    remote: &R,
    object: &RemoteObject,
    root_id: &str,
    cache: &mut AncestorCache,
) -> Result<bool> {
    let start = root_index(object, root_id)?;

    for entry in object.ancestors[start..].iter().rev() {
        if cache.lookup(remote, &entry.id)? {
            tracing::debug!(id = %object.id, ancestor = %entry.id, "Public by inheritance");
            return Ok(true);
        }
    }

    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Access, LinkState, ObjectKind, PathEntry, Permission, SharedLink};
    use crate::remote::ItemPage;
    use crate::Error;
    use rstest::rstest;
    use std::cell::RefCell;

    fn link(access: Access, permission: Permission) -> LinkState {
        LinkState::Present(SharedLink {
            access,
            permission,
            download_url: Some("https://example.test/d/1".to_string()),
        })
    }

    fn object(
        id: &str,
        kind: ObjectKind,
        ancestors: &[(&str, &str)],
        link: LinkState,
    ) -> RemoteObject {
        RemoteObject {
            id: id.to_string(),
            name: format!("name-{id}"),
            kind,
            ancestors: ancestors.iter().map(|(i, n)| PathEntry::new(*i, *n)).collect(),
            link,
        }
    }

    /// Folder lookup table that counts fetches
    struct Folders {
        folders: Vec<RemoteObject>,
        fetches: RefCell<Vec<String>>,
    }

    impl RemoteStore for Folders {
        fn get_file(&self, _id: &str, _fields: &[&str]) -> Result<Option<RemoteObject>> {
            Ok(None)
        }

        fn get_folder(&self, id: &str, _fields: &[&str]) -> Result<Option<RemoteObject>> {
            self.fetches.borrow_mut().push(id.to_string());
            Ok(self.folders.iter().find(|f| f.id == id).cloned())
        }

        fn list_folder_items(&self, _: &str, _: usize, _: usize, _: &[&str]) -> Result<ItemPage> {
            Ok(ItemPage::default())
        }

        fn create_shared_link(&self, object: &RemoteObject) -> Result<RemoteObject> {
            Ok(object.clone())
        }

        fn remove_shared_link(&self, _object: &RemoteObject) -> Result<bool> {
            Ok(true)
        }
    }

    const CHAIN: &[(&str, &str)] = &[("0", "All Files"), ("5", "R"), ("6", "S"), ("7", "T")];

    fn folders(public: &[&str]) -> Folders {
        let folders = CHAIN
            .iter()
            .enumerate()
            .map(|(i, (id, _))| {
                let state = if public.contains(id) {
                    link(Access::Open, Permission::CanDownload)
                } else {
                    LinkState::Absent
                };
                object(id, ObjectKind::Folder, &CHAIN[..i], state)
            })
            .collect();
        Folders {
            folders,
            fetches: RefCell::new(Vec::new()),
        }
    }

    #[rstest]
    #[case(Access::Open, Permission::CanDownload, true)]
    #[case(Access::Company, Permission::CanDownload, false)]
    #[case(Access::Collaborators, Permission::CanDownload, false)]
    #[case(Access::Open, Permission::CanPreview, false)]
    #[case(Access::Open, Permission::CanEdit, false)]
    #[case(Access::Other, Permission::Other, false)]
    fn only_open_download_is_public(
        #[case] access: Access,
        #[case] permission: Permission,
        #[case] expected: bool,
    ) {
        let file = object("1", ObjectKind::File, CHAIN, link(access, permission));
        assert_eq!(is_effectively_public(&file).unwrap(), expected);
    }

    #[test]
    fn unshared_object_is_not_public() {
        let file = object("1", ObjectKind::File, CHAIN, LinkState::Absent);
        assert!(!is_effectively_public(&file).unwrap());
    }

    #[test]
    fn summary_object_is_incomplete() {
        let file = object("1", ObjectKind::File, CHAIN, LinkState::NotFetched);
        assert!(matches!(
            is_effectively_public(&file),
            Err(Error::IncompleteObject { .. })
        ));
    }

    #[test]
    fn nearest_public_ancestor_short_circuits() {
        let remote = folders(&["7", "5"]);
        let file = object("1", ObjectKind::File, CHAIN, LinkState::Absent);
        let mut cache = AncestorCache::new();

        assert!(is_public_by_inheritance(&remote, &file, "5", &mut cache).unwrap());
        assert_eq!(*remote.fetches.borrow(), vec!["7".to_string()]);
    }

    #[test]
    fn managed_root_counts_as_ancestor() {
        let remote = folders(&["5"]);
        let file = object("1", ObjectKind::File, CHAIN, LinkState::Absent);
        let mut cache = AncestorCache::new();

        assert!(is_public_by_inheritance(&remote, &file, "5", &mut cache).unwrap());
        assert_eq!(*remote.fetches.borrow(), vec!["7", "6", "5"]);
    }

    #[test]
    fn folders_above_root_are_ignored() {
        let remote = folders(&["0"]);
        let file = object("1", ObjectKind::File, CHAIN, LinkState::Absent);
        let mut cache = AncestorCache::new();

        assert!(!is_public_by_inheritance(&remote, &file, "5", &mut cache).unwrap());
        assert!(!remote.fetches.borrow().contains(&"0".to_string()));
    }

    #[test]
    fn cache_avoids_refetching_for_siblings() {
        let remote = folders(&[]);
        let first = object("1", ObjectKind::File, CHAIN, LinkState::Absent);
        let second = object("2", ObjectKind::File, CHAIN, LinkState::Absent);
        let mut cache = AncestorCache::new();

        assert!(!is_public_by_inheritance(&remote, &first, "5", &mut cache).unwrap());
        assert!(!is_public_by_inheritance(&remote, &second, "5", &mut cache).unwrap());
        assert_eq!(remote.fetches.borrow().len(), 3);
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn missing_ancestor_is_not_public() {
        let mut remote = folders(&[]);
        remote.folders.retain(|f| f.id != "6");
        let file = object("1", ObjectKind::File, CHAIN, LinkState::Absent);
        let mut cache = AncestorCache::new();

        assert!(!is_public_by_inheritance(&remote, &file, "5", &mut cache).unwrap());
    }
}
