//! Change event payloads and trigger routing
//!
//! Sharing triggers nest their subject under `source.item`, lifecycle
//! triggers put it directly under `source`. Which handler runs is decided by
//! the `(trigger, subject kind)` pair via [`Trigger::route`].

use serde::Deserialize;

use crate::model::ObjectKind;
use crate::{Error, Result};

/// Triggers this service acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    SharedLinkCreated,
    SharedLinkUpdated,
    SharedLinkDeleted,
    FileTrashed,
    FileRestored,
    FileMoved,
    FolderTrashed,
    FolderRestored,
    FolderMoved,
}

/// Handling branch for a routed event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    SingleFile,
    Subtree,
}

impl Trigger {
    pub const ALL: [Trigger; 9] = [
        Trigger::SharedLinkCreated,
        Trigger::SharedLinkUpdated,
        Trigger::SharedLinkDeleted,
        Trigger::FileTrashed,
        Trigger::FileRestored,
        Trigger::FileMoved,
        Trigger::FolderTrashed,
        Trigger::FolderRestored,
        Trigger::FolderMoved,
    ];

    /// Parse a wire trigger name; `None` for triggers this service ignores
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::SharedLinkCreated => "SHARED_LINK.CREATED",
            Trigger::SharedLinkUpdated => "SHARED_LINK.UPDATED",
            Trigger::SharedLinkDeleted => "SHARED_LINK.DELETED",
            Trigger::FileTrashed => "FILE.TRASHED",
            Trigger::FileRestored => "FILE.RESTORED",
            Trigger::FileMoved => "FILE.MOVED",
            Trigger::FolderTrashed => "FOLDER.TRASHED",
            Trigger::FolderRestored => "FOLDER.RESTORED",
            Trigger::FolderMoved => "FOLDER.MOVED",
        }
    }

    /// Routing table. `None` marks a pair the event source never sends.
    pub fn route(&self, kind: ObjectKind) -> Option<Route> {
        use ObjectKind::{File, Folder};
        use Trigger::*;

        match (self, kind) {
            (SharedLinkCreated | SharedLinkUpdated | SharedLinkDeleted, File) => {
                Some(Route::SingleFile)
            }
            (SharedLinkCreated | SharedLinkUpdated | SharedLinkDeleted, Folder) => {
                Some(Route::Subtree)
            }
            (FileTrashed | FileRestored | FileMoved, File) => Some(Route::SingleFile),
            (FolderTrashed | FolderRestored | FolderMoved, Folder) => Some(Route::Subtree),
            (FileTrashed | FileRestored | FileMoved, Folder) => None,
            (FolderTrashed | FolderRestored | FolderMoved, File) => None,
        }
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl serde::Serialize for Trigger {
    fn serialize<S: serde::Serializer>(
        &self,
        serializer: S,
    ) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Trigger {
    fn deserialize<D: serde::Deserializer<'de>>(
        deserializer: D,
    ) -> std::result::Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Trigger::parse(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown trigger {name}")))
    }
}

/// Subject of an event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: String,
    pub kind: ObjectKind,
}

/// Parsed envelope of a change event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Trigger name exactly as delivered
    pub trigger: String,
    /// Id of the webhook registration, when the sender included it
    pub webhook_id: Option<String>,
    source: Option<Source>,
}

impl Envelope {
    /// Parse the outer envelope. The subject is only checked by
    /// [`Envelope::subject`], so ignored triggers never fail on it.
    pub fn parse(body: &[u8]) -> Result<Self> {
        let raw: RawEnvelope = serde_json::from_slice(body)
            .map_err(|e| Error::malformed(format!("invalid event body: {e}")))?;

        Ok(Self {
            trigger: raw.trigger,
            webhook_id: raw.webhook.map(|webhook| webhook.id),
            source: raw.source,
        })
    }

    /// Subject id and kind from either payload shape.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedEvent`] if neither `source.item.{id,type}` nor
    /// `source.{id,type}` is present, or the type is not a file or folder.
    pub fn subject(&self) -> Result<Subject> {
        let reference = match &self.source {
            Some(Source::Nested { item }) => item,
            Some(Source::Flat(reference)) => reference,
            None => return Err(Error::malformed("missing subject id")),
        };

        let kind = match reference.kind.as_str() {
            "file" => ObjectKind::File,
            "folder" => ObjectKind::Folder,
            other => {
                return Err(Error::malformed(format!(
                    "unsupported subject type {other:?}"
                )));
            }
        };

        Ok(Subject {
            id: reference.id.clone(),
            kind,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawEnvelope {
    trigger: String,
    #[serde(default)]
    webhook: Option<WebhookRef>,
    #[serde(default, deserialize_with = "lenient_source")]
    source: Option<Source>,
}

#[derive(Debug, Deserialize)]
struct WebhookRef {
    id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum Source {
    Nested { item: SubjectRef },
    Flat(SubjectRef),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
struct SubjectRef {
    id: String,
    #[serde(rename = "type")]
    kind: String,
}

/// Accept any `source` value; shapes that match neither variant become
/// `None` and are reported when the subject is read.
fn lenient_source<'de, D>(deserializer: D) -> std::result::Result<Option<Source>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}
