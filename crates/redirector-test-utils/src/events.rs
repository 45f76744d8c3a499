//! Change event payloads and signed deliveries

use redirector_core::webhook::sign;
use redirector_core::{Delivery, ObjectKind, Signatures};
use serde_json::json;

/// Where the subject sits in the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventShape {
    /// `source.item.{id,type}`, as sharing triggers send it
    Nested,
    /// `source.{id,type}`, as lifecycle triggers send it
    Flat,
}

/// Serialized event body for `trigger` naming object `id`
pub fn event_body(trigger: &str, kind: ObjectKind, id: &str, shape: EventShape) -> Vec<u8> {
    let subject = json!({ "id": id, "type": kind.as_str() });
    let source = match shape {
        EventShape::Nested => json!({ "id": "link-1", "type": "shared_link", "item": subject }),
        EventShape::Flat => subject,
    };

    let body = json!({
        "type": "webhook_event",
        "id": "evt-1",
        "trigger": trigger,
        "webhook": { "id": "wh-1", "type": "webhook" },
        "created_at": "2026-01-01T00:00:00-08:00",
        "source": source,
    });
    serde_json::to_vec(&body).unwrap_or_else(|e| panic!("event_body: {e}"))
}

/// Delivery with caller-provided signatures
pub fn delivery(body: impl Into<Vec<u8>>, signatures: Signatures) -> Delivery {
    Delivery::new(body, signatures)
}

/// Delivery signed with `key` in the primary header
pub fn signed_delivery(body: impl Into<Vec<u8>>, key: &[u8]) -> Delivery {
    let body = body.into();
    let signature = sign(key, &body);
    Delivery::new(body, Signatures::primary(signature))
}
