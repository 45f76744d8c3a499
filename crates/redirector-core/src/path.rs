//! Manifest key resolution
//!
//! A file's manifest path is the slash-joined chain of folder names strictly
//! below the managed root, followed by the file's own name. Files sitting
//! directly in the managed root have no path.

use crate::model::RemoteObject;
use crate::{Error, Result};

/// Compute the manifest path of `object` relative to `root_id`.
///
/// # Errors
///
/// - [`Error::OutsideManagedRoot`] if `root_id` is not an ancestor
/// - [`Error::RootLevelObject`] if the object's parent is the root itself
pub fn resolve_path(object: &RemoteObject, root_id: &str) -> Result<String> {
    let below_root = ancestors_below_root(object, root_id)?;

    if below_root.is_empty() {
        return Err(Error::RootLevelObject {
            id: object.id.clone(),
            name: object.name.clone(),
        });
    }

    let mut tokens: Vec<&str> = below_root.iter().map(|e| e.name.as_str()).collect();
    tokens.push(&object.name);
    Ok(tokens.join("/"))
}

/// Index of the managed root within the object's ancestor chain
pub(crate) fn root_index(object: &RemoteObject, root_id: &str) -> Result<usize> {
    object
        .ancestors
        .iter()
        .position(|entry| entry.id == root_id)
        .ok_or_else(|| Error::OutsideManagedRoot {
            id: object.id.clone(),
            root_id: root_id.to_string(),
        })
}

fn ancestors_below_root<'a>(
    object: &'a RemoteObject,
    root_id: &str,
) -> Result<&'a [crate::model::PathEntry]> {
    let start = root_index(object, root_id)? + 1;
    Ok(&object.ancestors[start..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LinkState, ObjectKind, PathEntry};
    use proptest::prelude::*;

    const ROOT: &str = "5";

    fn file_under(names: &[&str]) -> RemoteObject {
        let mut ancestors = vec![PathEntry::new("0", "All Files"), PathEntry::new(ROOT, "R")];
        for (i, name) in names.iter().enumerate() {
            ancestors.push(PathEntry::new(format!("f{i}"), *name));
        }
        RemoteObject {
            id: "100".to_string(),
            name: "a.dat".to_string(),
            kind: ObjectKind::File,
            ancestors,
            link: LinkState::Absent,
        }
    }

    #[test]
    fn joins_names_below_root() {
        assert_eq!(resolve_path(&file_under(&["S"]), ROOT).unwrap(), "S/a.dat");
        assert_eq!(
            resolve_path(&file_under(&["S", "T", "U"]), ROOT).unwrap(),
            "S/T/U/a.dat"
        );
    }

    #[test]
    fn root_level_file_is_rejected() {
        let err = resolve_path(&file_under(&[]), ROOT).unwrap_err();
        assert!(
            matches!(err, Error::RootLevelObject { ref name, .. } if name == "a.dat"),
            "expected RootLevelObject, got {err:?}"
        );
    }

    #[test]
    fn object_outside_root_is_rejected() {
        let mut file = file_under(&["S"]);
        file.ancestors.retain(|e| e.id != ROOT);
        let err = resolve_path(&file, ROOT).unwrap_err();
        assert!(matches!(err, Error::OutsideManagedRoot { .. }));
    }

    #[test]
    fn names_with_spaces_are_kept_verbatim() {
        let mut file = file_under(&["My Folder"]);
        file.name = "file with spaces.dat".to_string();
        assert_eq!(
            resolve_path(&file, ROOT).unwrap(),
            "My Folder/file with spaces.dat"
        );
    }

    proptest! {
        #[test]
        fn path_has_one_segment_per_folder_plus_file(
            names in prop::collection::vec("[a-zA-Z0-9 ._-]{1,12}", 1..6)
        ) {
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let path = resolve_path(&file_under(&refs), ROOT).unwrap();
            let segments: Vec<&str> = path.split('/').collect();
            prop_assert_eq!(segments.len(), names.len() + 1);
            prop_assert_eq!(segments[..names.len()].to_vec(), refs);
            prop_assert_eq!(*segments.last().unwrap(), "a.dat");
        }
    }
}
