//! Incremental correction driven by change events
//!
//! Each delivery moves through
//! `Received -> SignatureChecked -> TriggerClassified` and ends in one of
//! the [`Outcome`] variants. Benign conditions (bad signature, ignored
//! trigger, missing object) all end in an outcome rather than an error so
//! the event source never retries them.
//!
//! A moved file gets a row at its new path, but the row at its old path is
//! left for the next full sweep to delete.

use serde::{Deserialize, Serialize};

use super::event::{Envelope, Route, Subject, Trigger};
use super::signature::{Signatures, SigningKeys};
use crate::correction::{FileOutcome, correct_file};
use crate::manifest::{Manifest, ManifestStore};
use crate::model::ObjectKind;
use crate::publicity::{AncestorCache, is_effectively_public, is_public_by_inheritance};
use crate::remote::{RemoteStore, fetch};
use crate::walker::{ITEM_PAGE_LIMIT, TreeWalker};
use crate::{Error, Result};

/// One inbound delivery: the raw body exactly as received plus its
/// signature headers
#[derive(Debug, Clone, Default)]
pub struct Delivery {
    pub body: Vec<u8>,
    pub signatures: Signatures,
}

impl Delivery {
    pub fn new(body: impl Into<Vec<u8>>, signatures: Signatures) -> Self {
        Self {
            body: body.into(),
            signatures,
        }
    }
}

/// Why an event was acknowledged without a correction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Subject no longer exists (trashed or deleted)
    NotFound,
    /// Subject lives outside the managed folder
    OutsideManagedRoot,
    /// File sits directly in the managed folder
    RootLevel,
}

/// Terminal state of one delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Signature did not verify; nothing was touched
    Rejected,
    /// Trigger is not one this service handles
    Ignored { trigger: String },
    Skipped {
        trigger: Trigger,
        id: String,
        reason: SkipReason,
    },
    SingleFileCorrected {
        trigger: Trigger,
        file: FileOutcome,
    },
    SubtreeCorrected {
        trigger: Trigger,
        folder_id: String,
        files: Vec<FileOutcome>,
    },
}

/// Applies change events to the remote store and manifest
pub struct EventProcessor<'a, R: ?Sized, S: ?Sized> {
    remote: &'a R,
    store: &'a S,
    root_id: &'a str,
    keys: &'a SigningKeys,
    page_size: usize,
}

impl<'a, R, S> EventProcessor<'a, R, S>
where
    R: RemoteStore + ?Sized,
    S: ManifestStore + ?Sized,
{
    pub fn new(remote: &'a R, store: &'a S, root_id: &'a str, keys: &'a SigningKeys) -> Self {
        Self {
            remote,
            store,
            root_id,
            keys,
            page_size: ITEM_PAGE_LIMIT,
        }
    }

    /// Override the remote listing page size used for subtree corrections
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Handle one delivery.
    ///
    /// # Errors
    ///
    /// [`Error::MalformedEvent`] for an unusable payload or a
    /// `(trigger, kind)` pair outside the routing table; remote and manifest
    /// failures propagate unchanged. Everything else is an [`Outcome`].
    pub fn handle(&self, delivery: &Delivery) -> Result<Outcome> {
        if !self.keys.verify(&delivery.body, &delivery.signatures) {
            tracing::error!(
                bytes = delivery.body.len(),
                "Received change event with invalid signature"
            );
            return Ok(Outcome::Rejected);
        }

        let envelope = Envelope::parse(&delivery.body)?;
        let Some(trigger) = Trigger::parse(&envelope.trigger) else {
            tracing::info!(trigger = %envelope.trigger, "Trigger is not handled");
            return Ok(Outcome::Ignored {
                trigger: envelope.trigger,
            });
        };

        let subject = envelope.subject()?;
        tracing::info!(
            %trigger,
            webhook_id = envelope.webhook_id.as_deref().unwrap_or("-"),
            kind = %subject.kind,
            id = %subject.id,
            "Received trigger"
        );

        match trigger.route(subject.kind) {
            Some(Route::SingleFile) => self.correct_single_file(trigger, subject),
            Some(Route::Subtree) => self.correct_subtree(trigger, subject),
            None => Err(Error::malformed(format!(
                "{trigger} is never sent for a {}",
                subject.kind
            ))),
        }
    }

    fn correct_single_file(&self, trigger: Trigger, subject: Subject) -> Result<Outcome> {
        let Some(file) = fetch(self.remote, ObjectKind::File, &subject.id)? else {
            // The old path is unknown; the next sweep removes its row
            tracing::warn!(id = %subject.id, "File is missing (trashed or deleted)");
            return Ok(skipped(trigger, subject.id, SkipReason::NotFound));
        };

        let mut cache = AncestorCache::new();
        let inherited =
            match is_public_by_inheritance(self.remote, &file, self.root_id, &mut cache) {
                Ok(inherited) => inherited,
                Err(Error::OutsideManagedRoot { .. }) => {
                    tracing::warn!(id = %subject.id, "File is outside the managed folder");
                    return Ok(skipped(trigger, subject.id, SkipReason::OutsideManagedRoot));
                }
                Err(e) => return Err(e),
            };
        let desired = inherited || is_effectively_public(&file)?;

        let manifest = Manifest::new(self.store, self.root_id);
        match correct_file(self.remote, &manifest, self.root_id, file, desired) {
            Ok(file) => Ok(Outcome::SingleFileCorrected { trigger, file }),
            Err(Error::RootLevelObject { id, .. }) => {
                tracing::warn!(%id, "File sits directly in the managed folder; skipping");
                Ok(skipped(trigger, id, SkipReason::RootLevel))
            }
            Err(e) => Err(e),
        }
    }

    fn correct_subtree(&self, trigger: Trigger, subject: Subject) -> Result<Outcome> {
        let Some(folder) = fetch(self.remote, ObjectKind::Folder, &subject.id)? else {
            // Trashed folders cannot be listed; the next sweep cleans up
            tracing::warn!(id = %subject.id, "Folder is missing (trashed or deleted)");
            return Ok(skipped(trigger, subject.id, SkipReason::NotFound));
        };

        let folder_public = if folder.id == self.root_id {
            is_effectively_public(&folder)?
        } else {
            let mut cache = AncestorCache::new();
            match is_public_by_inheritance(self.remote, &folder, self.root_id, &mut cache) {
                Ok(inherited) => inherited || is_effectively_public(&folder)?,
                Err(Error::OutsideManagedRoot { .. }) => {
                    tracing::warn!(id = %subject.id, "Folder is outside the managed folder");
                    return Ok(skipped(trigger, subject.id, SkipReason::OutsideManagedRoot));
                }
                Err(e) => return Err(e),
            }
        };

        let manifest = Manifest::new(self.store, self.root_id);
        let walker = TreeWalker::new(self.remote).with_page_size(self.page_size);
        let mut files = Vec::new();

        for walked in walker.walk(&folder.id, folder_public) {
            let walked = walked?;
            match correct_file(self.remote, &manifest, self.root_id, walked.file, walked.public) {
                Ok(outcome) => files.push(outcome),
                Err(Error::RootLevelObject { id, name }) => {
                    tracing::warn!(%id, %name, "File sits directly in the managed folder; skipping");
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(folder_id = %folder.id, files = files.len(), "Corrected subtree");
        Ok(Outcome::SubtreeCorrected {
            trigger,
            folder_id: folder.id,
            files,
        })
    }
}

fn skipped(trigger: Trigger, id: String, reason: SkipReason) -> Outcome {
    Outcome::Skipped { trigger, id, reason }
}
