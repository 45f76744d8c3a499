//! In-memory remote tree
//!
//! [`FakeRemote`] holds a tree rooted at "All Files" (id `0`) and answers
//! [`RemoteStore`] calls the way the real store does: listings are paged by
//! offset, the field projection decides whether shared links are reported,
//! and missing objects come back as `None`. Every call is recorded.

use std::collections::{BTreeMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use redirector_core::{
    Access, Error, ItemPage, LinkState, ObjectKind, PathEntry, Permission, RemoteObject,
    RemoteStore, Result, SharedLink,
};

/// Id of the top of the tree
pub const TOP_ID: &str = "0";

/// A recorded call against the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    GetFile(String),
    GetFolder(String),
    List { folder_id: String, offset: usize },
    CreateLink(String),
    RemoveLink(String),
}

impl Call {
    /// Whether this call changes remote state
    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::CreateLink(_) | Call::RemoveLink(_))
    }
}

#[derive(Debug, Clone)]
struct Node {
    name: String,
    kind: ObjectKind,
    parent: Option<String>,
    link: Option<SharedLink>,
    seq: u64,
}

#[derive(Debug, Default)]
struct Tree {
    nodes: BTreeMap<String, Node>,
    next_seq: u64,
    next_id: u64,
    failing: HashSet<String>,
    refusing_unshare: HashSet<String>,
    vanish_on_unshare: HashSet<String>,
}

/// In-memory [`RemoteStore`] with call recording
#[derive(Debug)]
pub struct FakeRemote {
    tree: Mutex<Tree>,
    calls: Mutex<Vec<Call>>,
}

impl Default for FakeRemote {
    fn default() -> Self {
        Self::new()
    }
}

/// Download URL handed out for a shared file
pub fn download_url_for(id: &str) -> String {
    format!("https://dl.example.test/shared/{id}")
}

impl FakeRemote {
    /// A tree holding only the "All Files" top folder.
    pub fn new() -> Self {
        let mut tree = Tree {
            next_id: 1000,
            ..Tree::default()
        };
        tree.nodes.insert(
            TOP_ID.to_string(),
            Node {
                name: "All Files".to_string(),
                kind: ObjectKind::Folder,
                parent: None,
                link: None,
                seq: 0,
            },
        );
        Self {
            tree: Mutex::new(tree),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn tree(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().expect("FakeRemote: tree lock poisoned")
    }

    fn record(&self, call: Call) {
        self.calls
            .lock()
            .expect("FakeRemote: call log poisoned")
            .push(call);
    }

    fn insert(&self, parent: &str, id: Option<&str>, name: &str, kind: ObjectKind) -> String {
        let mut tree = self.tree();
        assert!(
            tree.nodes.contains_key(parent),
            "FakeRemote: parent {parent} does not exist"
        );
        let id = match id {
            Some(id) => id.to_string(),
            None => {
                tree.next_id += 1;
                tree.next_id.to_string()
            }
        };
        tree.next_seq += 1;
        let seq = tree.next_seq;
        let previous = tree.nodes.insert(
            id.clone(),
            Node {
                name: name.to_string(),
                kind,
                parent: Some(parent.to_string()),
                link: None,
                seq,
            },
        );
        assert!(previous.is_none(), "FakeRemote: duplicate id {id}");
        id
    }

    /// Add a folder with a chosen id
    pub fn add_folder_with_id(&self, parent: &str, id: &str, name: &str) -> String {
        self.insert(parent, Some(id), name, ObjectKind::Folder)
    }

    /// Add a folder with a generated id
    pub fn add_folder(&self, parent: &str, name: &str) -> String {
        self.insert(parent, None, name, ObjectKind::Folder)
    }

    /// Add a file with a chosen id
    pub fn add_file_with_id(&self, parent: &str, id: &str, name: &str) -> String {
        self.insert(parent, Some(id), name, ObjectKind::File)
    }

    /// Add a file with a generated id
    pub fn add_file(&self, parent: &str, name: &str) -> String {
        self.insert(parent, None, name, ObjectKind::File)
    }

    /// Give an object an open, downloadable link
    pub fn share(&self, id: &str) {
        self.share_as(id, Access::Open, Permission::CanDownload);
    }

    /// Give an object a link with arbitrary access and permission
    pub fn share_as(&self, id: &str, access: Access, permission: Permission) {
        let mut tree = self.tree();
        let node = tree
            .nodes
            .get_mut(id)
            .unwrap_or_else(|| panic!("FakeRemote: no object {id}"));
        node.link = Some(make_link(id, node.kind, access, permission));
    }

    /// Drop an object's link
    pub fn unshare(&self, id: &str) {
        if let Some(node) = self.tree().nodes.get_mut(id) {
            node.link = None;
        }
    }

    /// Remove an object and everything below it, as trashing does
    pub fn trash(&self, id: &str) {
        let mut tree = self.tree();
        let mut doomed = vec![id.to_string()];
        let mut i = 0;
        while i < doomed.len() {
            let current = doomed[i].clone();
            doomed.extend(
                tree.nodes
                    .iter()
                    .filter(|(_, n)| n.parent.as_deref() == Some(current.as_str()))
                    .map(|(child, _)| child.clone()),
            );
            i += 1;
        }
        for id in doomed {
            tree.nodes.remove(&id);
        }
    }

    /// Re-parent an object
    pub fn move_to(&self, id: &str, new_parent: &str) {
        let mut tree = self.tree();
        assert!(tree.nodes.contains_key(new_parent), "FakeRemote: no folder {new_parent}");
        let node = tree
            .nodes
            .get_mut(id)
            .unwrap_or_else(|| panic!("FakeRemote: no object {id}"));
        node.parent = Some(new_parent.to_string());
    }

    /// Make every call that names `id` fail with a server error
    pub fn fail_on(&self, id: &str) {
        self.tree().failing.insert(id.to_string());
    }

    /// Make link removal on `id` answer `false` and leave the link in place
    pub fn refuse_unshare(&self, id: &str) {
        self.tree().refusing_unshare.insert(id.to_string());
    }

    /// Make link removal on `id` succeed, then drop the object before it
    /// can be fetched again
    pub fn vanish_on_unshare(&self, id: &str) {
        self.tree().vanish_on_unshare.insert(id.to_string());
    }

    /// Whether the object currently has an open, downloadable link
    pub fn is_shared(&self, id: &str) -> bool {
        self.tree()
            .nodes
            .get(id)
            .and_then(|n| n.link.as_ref())
            .is_some_and(SharedLink::is_open_download)
    }

    /// Every call made so far
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("FakeRemote: call log poisoned").clone()
    }

    /// Calls that changed remote state
    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().expect("FakeRemote: call log poisoned").clear();
    }

    fn check_failing(tree: &Tree, id: &str) -> Result<()> {
        if tree.failing.contains(id) {
            return Err(Error::remote(Some(500), format!("injected failure for {id}")));
        }
        Ok(())
    }

    fn snapshot(tree: &Tree, id: &str, fields: &[&str]) -> Option<RemoteObject> {
        let node = tree.nodes.get(id)?;

        let mut ancestors = Vec::new();
        let mut parent = node.parent.clone();
        while let Some(parent_id) = parent {
            let Some(p) = tree.nodes.get(&parent_id) else {
                break;
            };
            ancestors.push(PathEntry::new(parent_id.clone(), p.name.clone()));
            parent = p.parent.clone();
        }
        ancestors.reverse();

        let link = if !fields.contains(&"shared_link") {
            LinkState::NotFetched
        } else {
            match &node.link {
                Some(link) => LinkState::Present(link.clone()),
                None => LinkState::Absent,
            }
        };

        Some(RemoteObject {
            id: id.to_string(),
            name: node.name.clone(),
            kind: node.kind,
            ancestors,
            link,
        })
    }

    fn get_kind(
        &self,
        id: &str,
        kind: ObjectKind,
        fields: &[&str],
    ) -> Result<Option<RemoteObject>> {
        let tree = self.tree();
        Self::check_failing(&tree, id)?;
        match tree.nodes.get(id) {
            Some(node) if node.kind == kind => Ok(Self::snapshot(&tree, id, fields)),
            _ => Ok(None),
        }
    }
}

fn make_link(id: &str, kind: ObjectKind, access: Access, permission: Permission) -> SharedLink {
    SharedLink {
        access,
        permission,
        download_url: (kind == ObjectKind::File).then(|| download_url_for(id)),
    }
}

impl RemoteStore for FakeRemote {
    fn get_file(&self, id: &str, fields: &[&str]) -> Result<Option<RemoteObject>> {
        self.record(Call::GetFile(id.to_string()));
        self.get_kind(id, ObjectKind::File, fields)
    }

    fn get_folder(&self, id: &str, fields: &[&str]) -> Result<Option<RemoteObject>> {
        self.record(Call::GetFolder(id.to_string()));
        self.get_kind(id, ObjectKind::Folder, fields)
    }

    fn list_folder_items(
        &self,
        folder_id: &str,
        limit: usize,
        offset: usize,
        fields: &[&str],
    ) -> Result<ItemPage> {
        self.record(Call::List {
            folder_id: folder_id.to_string(),
            offset,
        });
        let tree = self.tree();
        Self::check_failing(&tree, folder_id)?;
        if !tree.nodes.contains_key(folder_id) {
            return Err(Error::remote(Some(404), format!("folder {folder_id} not found")));
        }

        let mut children: Vec<(&String, &Node)> = tree
            .nodes
            .iter()
            .filter(|(_, n)| n.parent.as_deref() == Some(folder_id))
            .collect();
        children.sort_by_key(|(_, n)| n.seq);

        Ok(ItemPage::of(
            children
                .into_iter()
                .skip(offset)
                .take(limit)
                .filter_map(|(id, _)| Self::snapshot(&tree, id, fields))
                .collect(),
        ))
    }

    fn create_shared_link(&self, object: &RemoteObject) -> Result<RemoteObject> {
        self.record(Call::CreateLink(object.id.clone()));
        let mut tree = self.tree();
        Self::check_failing(&tree, &object.id)?;
        let node = tree
            .nodes
            .get_mut(&object.id)
            .ok_or_else(|| Error::remote(Some(404), format!("{} not found", object.id)))?;
        node.link = Some(make_link(&object.id, node.kind, Access::Open, Permission::CanDownload));
        Self::snapshot(&tree, &object.id, redirector_core::OBJECT_FIELDS)
            .ok_or_else(|| Error::remote(Some(404), format!("{} not found", object.id)))
    }

    fn remove_shared_link(&self, object: &RemoteObject) -> Result<bool> {
        self.record(Call::RemoveLink(object.id.clone()));
        let mut tree = self.tree();
        Self::check_failing(&tree, &object.id)?;
        if tree.refusing_unshare.contains(&object.id) {
            return Ok(false);
        }
        if tree.vanish_on_unshare.contains(&object.id) {
            tree.nodes.remove(&object.id);
            return Ok(true);
        }
        match tree.nodes.get_mut(&object.id) {
            Some(node) => {
                node.link = None;
                Ok(true)
            }
            None => Err(Error::remote(Some(404), format!("{} not found", object.id))),
        }
    }
}
