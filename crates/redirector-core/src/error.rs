//! Error types for redirector-core

use std::path::PathBuf;

/// Result type for redirector-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling the manifest
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Object sits directly in the managed root, so it has no manifest path
    #[error("{name} ({id}) sits directly in the managed root and has no manifest path")]
    RootLevelObject { id: String, name: String },

    /// Managed root does not appear in the object's ancestor chain
    #[error("{id} is not inside managed folder {root_id}")]
    OutsideManagedRoot { id: String, root_id: String },

    /// Object was fetched without its shared link summary
    #[error("cannot read sharing state of {id}: object was fetched without its shared link")]
    IncompleteObject { id: String },

    /// Object is public but its shared link carries no download URL
    #[error("shared link of {id} has no download URL")]
    MissingDownloadUrl { id: String },

    /// Attempt to publish an object that is not effectively public
    #[error("cannot publish {id}: it is not shared publicly")]
    NotPublic { id: String },

    /// Change event payload could not be interpreted
    #[error("malformed change event: {reason}")]
    MalformedEvent { reason: String },

    /// Remote content store rejected a call
    #[error("remote API error (status {status:?}): {message}")]
    RemoteApi { status: Option<u16>, message: String },

    /// Manifest store failure
    #[error("manifest store error: {message}")]
    ManifestStore { message: String },

    /// Invalid or incomplete configuration
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Lock acquisition on a file-backed store failed
    #[error("lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    // Transparent wrappers for underlying crate errors
    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// TOML deserialization error
    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),
}

impl Error {
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedEvent {
            reason: reason.into(),
        }
    }

    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            status,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Whether this error is the malformed-payload kind, which callers
    /// report differently from infrastructure failures.
    pub fn is_malformed_event(&self) -> bool {
        matches!(self, Self::MalformedEvent { .. })
    }
}
