//! HTTP routes
//!
//! | Route               | Effect                                         |
//! |---------------------|------------------------------------------------|
//! | `POST /webhook`     | verify and apply one change event              |
//! | `POST /sync`        | run a full sweep, return its report            |
//! | `GET /files/{path}` | 302 to the stored download URL, or 404         |
//! | `GET /health`       | liveness                                       |

use axum::Router;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use redirector_core::{Delivery, Outcome, Signatures, SweepReport};

use crate::Result;
use crate::state::AppState;

pub const PRIMARY_SIGNATURE_HEADER: &str = "box-signature-primary";
pub const SECONDARY_SIGNATURE_HEADER: &str = "box-signature-secondary";

/// Build the service router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/webhook", post(webhook))
        .route("/sync", post(sync))
        .route("/files/{*path}", get(redirect))
        .route("/health", get(health))
        .with_state(state)
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

fn signatures(headers: &HeaderMap) -> Signatures {
    Signatures {
        primary: header_value(headers, PRIMARY_SIGNATURE_HEADER),
        secondary: header_value(headers, SECONDARY_SIGNATURE_HEADER),
    }
}

/// POST /webhook
///
/// Every [`Outcome`] is acknowledged with 200 so the sender does not retry.
async fn webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Outcome>> {
    let delivery = Delivery::new(body.to_vec(), signatures(&headers));
    let outcome = tokio::task::spawn_blocking(move || state.handle_delivery(&delivery)).await??;
    Ok(Json(outcome))
}

/// POST /sync
async fn sync(State(state): State<AppState>) -> Result<Json<SweepReport>> {
    let report = tokio::task::spawn_blocking(move || state.run_sweep()).await??;
    Ok(Json(report))
}

/// GET /files/{*path}
async fn redirect(State(state): State<AppState>, Path(path): Path<String>) -> Result<Response> {
    let lookup_path = path.clone();
    let url = tokio::task::spawn_blocking(move || state.lookup(&lookup_path)).await??;

    Ok(match url {
        Some(url) => {
            tracing::debug!(%path, "Redirecting");
            (StatusCode::FOUND, [(header::LOCATION, url)]).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    })
}

/// GET /health
async fn health() -> &'static str {
    "ok"
}
