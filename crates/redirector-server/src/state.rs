//! Shared state behind every route

use std::sync::{Arc, Mutex, TryLockError};

use redirector_box::BoxClient;
use redirector_core::{
    Config, Delivery, EventProcessor, FileManifestStore, ITEM_PAGE_LIMIT, Manifest, ManifestStore,
    Outcome, Reconciler, RemoteStore, SigningKeys, SweepReport,
};

use crate::{Error, Result};

pub type SharedRemote = Arc<dyn RemoteStore + Send + Sync>;
pub type SharedManifest = Arc<dyn ManifestStore + Send + Sync>;

/// Engine handles plus the sweep lock. Cheap to clone.
///
/// All methods block; call them from `spawn_blocking`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    remote: SharedRemote,
    store: SharedManifest,
    root_id: String,
    keys: SigningKeys,
    item_page_size: usize,
    sweep_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        remote: SharedRemote,
        store: SharedManifest,
        root_id: impl Into<String>,
        keys: SigningKeys,
    ) -> Self {
        Self::with_item_page_size(remote, store, root_id, keys, ITEM_PAGE_LIMIT)
    }

    pub fn with_item_page_size(
        remote: SharedRemote,
        store: SharedManifest,
        root_id: impl Into<String>,
        keys: SigningKeys,
        item_page_size: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                remote,
                store,
                root_id: root_id.into(),
                keys,
                item_page_size,
                sweep_lock: Mutex::new(()),
            }),
        }
    }

    /// Wire the Box client and file-backed manifest named by `config`.
    ///
    /// The blocking HTTP client must be built outside the async runtime.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;
        let token = config.remote.access_token.clone().unwrap_or_default();
        let remote = BoxClient::new(config.remote.api_base.clone(), token)?;
        let store = FileManifestStore::new(&config.manifest.path)
            .with_page_size(config.manifest.page_size);

        tracing::info!(
            root_id = %config.managed_folder_id,
            api_base = %remote.api_base(),
            manifest = %config.manifest.path.display(),
            "Configured engine"
        );

        Ok(Self::new(
            Arc::new(remote),
            Arc::new(store),
            config.managed_folder_id.clone(),
            config.signing_keys()?,
        ))
    }

    pub fn root_id(&self) -> &str {
        &self.inner.root_id
    }

    /// Verify and apply one change event
    pub fn handle_delivery(&self, delivery: &Delivery) -> redirector_core::Result<Outcome> {
        let inner = &*self.inner;
        EventProcessor::new(&*inner.remote, &*inner.store, &inner.root_id, &inner.keys)
            .with_page_size(inner.item_page_size)
            .handle(delivery)
    }

    /// Run a full sweep unless one is already running.
    ///
    /// # Errors
    ///
    /// [`Error::SweepInProgress`] if another sweep holds the lock.
    pub fn run_sweep(&self) -> Result<SweepReport> {
        let inner = &*self.inner;
        let _guard = match inner.sweep_lock.try_lock() {
            Ok(guard) => guard,
            Err(TryLockError::WouldBlock) => return Err(Error::SweepInProgress),
            // The lock guards no data
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let report = Reconciler::new(&*inner.remote, &*inner.store, &inner.root_id)
            .with_page_size(inner.item_page_size)
            .run()?;

        tracing::info!(
            files = report.files_seen,
            published = report.published,
            withdrawn = report.withdrawn,
            links_created = report.links_created,
            orphans_deleted = report.orphans_deleted,
            "Sweep finished"
        );
        Ok(report)
    }

    /// Stored download URL for a manifest path
    pub fn lookup(&self, path: &str) -> redirector_core::Result<Option<String>> {
        Manifest::new(&*self.inner.store, &self.inner.root_id).download_url(path)
    }
}
