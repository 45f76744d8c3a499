//! Router tests over the in-memory remote and manifest

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use pretty_assertions::assert_eq;
use redirector_core::webhook::sign;
use redirector_core::{
    ItemPage, ManifestEntry, ObjectKind, RemoteObject, RemoteStore, Result, SigningKeys,
};
use redirector_server::{
    AppState, Error, PRIMARY_SIGNATURE_HEADER, SECONDARY_SIGNATURE_HEADER, router,
};
use redirector_test_utils::{EventShape, FakeRemote, MemoryManifest, download_url_for, event_body};
use serde_json::Value;
use tower::ServiceExt;

const ROOT: &str = "5";
const KEY: &[u8] = b"primary-key";

struct Harness {
    app: Router,
    remote: Arc<FakeRemote>,
    store: Arc<MemoryManifest>,
}

/// `All Files / R (5) / S (10) / a.dat (100)`, nothing shared
fn harness() -> Harness {
    let remote = Arc::new(FakeRemote::new());
    remote.add_folder_with_id("0", ROOT, "R");
    remote.add_folder_with_id(ROOT, "10", "S");
    remote.add_file_with_id("10", "100", "a.dat");
    let store = Arc::new(MemoryManifest::new());

    let state = AppState::new(
        remote.clone(),
        store.clone(),
        ROOT,
        SigningKeys::new(KEY).with_secondary(b"secondary-key".to_vec()),
    );

    Harness {
        app: router(state),
        remote,
        store,
    }
}

fn webhook_request(body: Vec<u8>, signature_header: &str, key: &[u8]) -> Request<Body> {
    let signature = sign(key, &body);
    Request::builder()
        .method("POST")
        .uri("/webhook")
        .header(header::CONTENT_TYPE, "application/json")
        .header(signature_header, signature)
        .body(Body::from(body))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

mod webhook {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_signed_event_is_applied() {
        let h = harness();
        h.remote.share("100");
        let body = event_body("SHARED_LINK.CREATED", ObjectKind::File, "100", EventShape::Nested);

        let response = h
            .app
            .oneshot(webhook_request(body, PRIMARY_SIGNATURE_HEADER, KEY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["outcome"], "single_file_corrected");
        assert_eq!(json["trigger"], "SHARED_LINK.CREATED");
        assert_eq!(json["file"]["state"], "published");
        assert_eq!(h.store.paths(), vec!["S/a.dat"]);
    }

    #[tokio::test]
    async fn test_secondary_header_is_read() {
        let h = harness();
        h.remote.share("10");
        let body = event_body("SHARED_LINK.CREATED", ObjectKind::Folder, "10", EventShape::Nested);

        let response = h
            .app
            .oneshot(webhook_request(body, SECONDARY_SIGNATURE_HEADER, b"secondary-key"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["outcome"], "subtree_corrected");
        assert!(h.remote.is_shared("100"));
    }

    #[tokio::test]
    async fn test_bad_signature_is_acknowledged_but_rejected() {
        let h = harness();
        let body = event_body("FILE.MOVED", ObjectKind::File, "100", EventShape::Flat);

        let response = h
            .app
            .oneshot(webhook_request(body, PRIMARY_SIGNATURE_HEADER, b"not-the-key"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["outcome"], "rejected");
        assert!(h.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_unhandled_trigger_is_ignored() {
        let h = harness();
        let body = event_body("COMMENT.CREATED", ObjectKind::File, "100", EventShape::Flat);

        let response = h
            .app
            .oneshot(webhook_request(body, PRIMARY_SIGNATURE_HEADER, KEY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["outcome"], "ignored");
    }

    #[tokio::test]
    async fn test_malformed_event_is_a_bad_request() {
        let h = harness();

        let response = h
            .app
            .oneshot(webhook_request(b"{oops".to_vec(), PRIMARY_SIGNATURE_HEADER, KEY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"].as_str().unwrap().contains("invalid event body"));
    }

    #[tokio::test]
    async fn test_remote_failure_is_a_server_error() {
        let h = harness();
        h.remote.fail_on("100");
        let body = event_body("FILE.RESTORED", ObjectKind::File, "100", EventShape::Flat);

        let response = h
            .app
            .oneshot(webhook_request(body, PRIMARY_SIGNATURE_HEADER, KEY))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}

mod sync {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_sync_returns_report() {
        let h = harness();
        h.remote.share("10");
        h.store
            .seed([ManifestEntry::new("gone.dat", "x", "https://old")]);

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["files_seen"], 1);
        assert_eq!(json["links_created"], 1);
        assert_eq!(json["orphans_deleted"], 1);
        assert_eq!(h.store.paths(), vec!["S/a.dat"]);
    }

    /// Remote whose first folder fetch parks until the test releases it
    struct GatedRemote {
        inner: FakeRemote,
        gated: AtomicBool,
        entered: Barrier,
        release: Barrier,
    }

    impl GatedRemote {
        fn new(inner: FakeRemote) -> Self {
            Self {
                inner,
                gated: AtomicBool::new(true),
                entered: Barrier::new(2),
                release: Barrier::new(2),
            }
        }
    }

    impl RemoteStore for GatedRemote {
        fn get_file(&self, id: &str, fields: &[&str]) -> Result<Option<RemoteObject>> {
            self.inner.get_file(id, fields)
        }

        fn get_folder(&self, id: &str, fields: &[&str]) -> Result<Option<RemoteObject>> {
            if self.gated.swap(false, Ordering::SeqCst) {
                self.entered.wait();
                self.release.wait();
            }
            self.inner.get_folder(id, fields)
        }

        fn list_folder_items(
            &self,
            folder_id: &str,
            limit: usize,
            offset: usize,
            fields: &[&str],
        ) -> Result<ItemPage> {
            self.inner.list_folder_items(folder_id, limit, offset, fields)
        }

        fn create_shared_link(&self, object: &RemoteObject) -> Result<RemoteObject> {
            self.inner.create_shared_link(object)
        }

        fn remove_shared_link(&self, object: &RemoteObject) -> Result<bool> {
            self.inner.remove_shared_link(object)
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_concurrent_sweep_is_a_conflict() {
        let tree = FakeRemote::new();
        tree.add_folder_with_id("0", ROOT, "R");
        tree.add_folder_with_id(ROOT, "10", "S");
        tree.add_file_with_id("10", "100", "a.dat");
        tree.share("100");
        let remote = Arc::new(GatedRemote::new(tree));
        let store = Arc::new(MemoryManifest::new());
        let state = AppState::new(remote.clone(), store.clone(), ROOT, SigningKeys::new(KEY));

        let running = thread::spawn({
            let state = state.clone();
            move || state.run_sweep()
        });
        remote.entered.wait();

        assert!(matches!(state.run_sweep(), Err(Error::SweepInProgress)));

        let response = router(state.clone())
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/sync")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(
            json_body(response).await["error"]
                .as_str()
                .unwrap()
                .contains("already running")
        );

        remote.release.wait();
        let report = running.join().unwrap().unwrap();
        assert_eq!(report.files_seen, 1);
        assert_eq!(store.paths(), vec!["S/a.dat"]);

        // Lock is free again once the first sweep finishes
        assert!(state.run_sweep().is_ok());
    }

    #[tokio::test]
    async fn test_sync_requires_post() {
        let h = harness();

        let response = h
            .app
            .oneshot(Request::builder().uri("/sync").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}

mod files {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_known_path_redirects() {
        let h = harness();
        h.store.seed([ManifestEntry::new(
            "S/a.dat",
            "100",
            download_url_for("100"),
        )]);

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/files/S/a.dat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers()[header::LOCATION],
            download_url_for("100").as_str()
        );
    }

    #[tokio::test]
    async fn test_unknown_path_is_not_found() {
        let h = harness();

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/files/S/missing.dat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_encoded_names_are_decoded() {
        let h = harness();
        h.store
            .seed([ManifestEntry::new("S/my file.dat", "101", "https://dl/101")]);

        let response = h
            .app
            .oneshot(
                Request::builder()
                    .uri("/files/S/my%20file.dat")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
    }
}

#[tokio::test]
async fn test_health() {
    let h = harness();

    let response = h
        .app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"ok");
}
