//! Shared-link alignment against the in-memory remote

use pretty_assertions::assert_eq;
use redirector_core::{
    Error, LinkChange, LinkState, ObjectKind, RemoteObject, align_shared_link, fetch,
};
use redirector_test_utils::{Call, FakeRemote};

/// `All Files / R (5) / S (10) / a.dat (100)`, the file shared
fn shared_file() -> (FakeRemote, RemoteObject) {
    let remote = FakeRemote::new();
    remote.add_folder_with_id("0", "5", "R");
    remote.add_folder_with_id("5", "10", "S");
    remote.add_file_with_id("10", "100", "a.dat");
    remote.share("100");
    let file = fetch(&remote, ObjectKind::File, "100").unwrap().unwrap();
    remote.clear_calls();
    (remote, file)
}

#[test]
fn test_removal_returns_refetched_snapshot() {
    let (remote, file) = shared_file();

    let (updated, change) = align_shared_link(&remote, file, false).unwrap();

    assert_eq!(change, LinkChange::Removed);
    assert_eq!(updated.link, LinkState::Absent);
    assert!(!remote.is_shared("100"));
    assert_eq!(
        remote.calls(),
        vec![Call::RemoveLink("100".into()), Call::GetFile("100".into())]
    );
}

#[test]
fn test_refused_removal_is_a_remote_error() {
    let (remote, file) = shared_file();
    remote.refuse_unshare("100");

    let error = align_shared_link(&remote, file, false).unwrap_err();

    assert!(
        matches!(error, Error::RemoteApi { status: None, .. }),
        "unexpected error: {error:?}"
    );
    assert!(remote.is_shared("100"));
    assert_eq!(remote.calls(), vec![Call::RemoveLink("100".into())]);
}

#[test]
fn test_object_vanishing_before_refetch_is_not_found() {
    let (remote, file) = shared_file();
    remote.vanish_on_unshare("100");

    let error = align_shared_link(&remote, file, false).unwrap_err();

    assert!(
        matches!(error, Error::RemoteApi { status: Some(404), .. }),
        "unexpected error: {error:?}"
    );
}

#[test]
fn test_matching_state_makes_no_calls() {
    let (remote, file) = shared_file();

    let (updated, change) = align_shared_link(&remote, file.clone(), true).unwrap();

    assert_eq!(change, LinkChange::Unchanged);
    assert_eq!(updated, file);
    assert!(remote.calls().is_empty());
}

#[test]
fn test_creation_uses_returned_object() {
    let (remote, _) = shared_file();
    remote.unshare("100");
    let file = fetch(&remote, ObjectKind::File, "100").unwrap().unwrap();
    remote.clear_calls();

    let (updated, change) = align_shared_link(&remote, file, true).unwrap();

    assert_eq!(change, LinkChange::Created);
    assert!(matches!(updated.link, LinkState::Present(_)));
    assert_eq!(remote.calls(), vec![Call::CreateLink("100".into())]);
}
