//! Blocking Box API client

use std::time::Duration;

use redirector_core::{ItemPage, OBJECT_FIELDS, ObjectKind, RemoteObject, RemoteStore};
use reqwest::StatusCode;
use reqwest::blocking::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::wire::{WireItem, WireItemPage};
use crate::{Error, Result};

/// Default API root
pub const DEFAULT_API_BASE: &str = "https://api.box.com/2.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Box content API client authenticated with a bearer token
#[derive(Clone)]
pub struct BoxClient {
    http: Client,
    api_base: String,
    token: String,
}

impl std::fmt::Debug for BoxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoxClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

fn collection(kind: ObjectKind) -> &'static str {
    match kind {
        ObjectKind::File => "files",
        ObjectKind::Folder => "folders",
    }
}

impl BoxClient {
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("redirector/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token: token.into(),
        })
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path)
    }

    /// Send a request. `Ok(None)` on 404, an error on any other failure.
    fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Option<T>> {
        let response = request.bearer_auth(&self.token).send()?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            tracing::debug!(status = status.as_u16(), body = %body, "Box API error");
            return Err(Error::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes()?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn fetch_object(
        &self,
        kind: ObjectKind,
        id: &str,
        fields: &[&str],
    ) -> Result<Option<RemoteObject>> {
        let request = self
            .http
            .get(self.url(&format!("{}/{id}", collection(kind))))
            .query(&[("fields", fields.join(","))]);

        match self.send::<WireItem>(request)? {
            Some(item) => Ok(Some(item.into_expected(kind)?)),
            None => Ok(None),
        }
    }

    fn list_items(
        &self,
        folder_id: &str,
        limit: usize,
        offset: usize,
        fields: &[&str],
    ) -> Result<ItemPage> {
        let request = self
            .http
            .get(self.url(&format!("folders/{folder_id}/items")))
            .query(&[
                ("fields", fields.join(",")),
                ("limit", limit.to_string()),
                ("offset", offset.to_string()),
            ]);

        let page = self
            .send::<WireItemPage>(request)?
            .ok_or_else(|| Error::Status {
                status: 404,
                body: format!("folder {folder_id} not found"),
            })?;
        page.into_page()
    }

    fn update_link(&self, object: &RemoteObject, link: serde_json::Value) -> Result<RemoteObject> {
        let request = self
            .http
            .put(self.url(&format!("{}/{}", collection(object.kind), object.id)))
            .query(&[("fields", OBJECT_FIELDS.join(","))])
            .json(&json!({ "shared_link": link }));

        let item = self.send::<WireItem>(request)?.ok_or_else(|| Error::Status {
            status: 404,
            body: format!("{} {} not found", object.kind, object.id),
        })?;
        item.into_expected(object.kind)
    }
}

/// Request body granting open, downloadable access
pub fn open_download_link() -> serde_json::Value {
    json!({
        "access": "open",
        "permissions": { "can_download": true }
    })
}

impl RemoteStore for BoxClient {
    fn get_file(&self, id: &str, fields: &[&str]) -> redirector_core::Result<Option<RemoteObject>> {
        Ok(self.fetch_object(ObjectKind::File, id, fields)?)
    }

    fn get_folder(
        &self,
        id: &str,
        fields: &[&str],
    ) -> redirector_core::Result<Option<RemoteObject>> {
        Ok(self.fetch_object(ObjectKind::Folder, id, fields)?)
    }

    fn list_folder_items(
        &self,
        folder_id: &str,
        limit: usize,
        offset: usize,
        fields: &[&str],
    ) -> redirector_core::Result<ItemPage> {
        Ok(self.list_items(folder_id, limit, offset, fields)?)
    }

    fn create_shared_link(&self, object: &RemoteObject) -> redirector_core::Result<RemoteObject> {
        tracing::info!(id = %object.id, name = %object.name, "Creating shared link");
        Ok(self.update_link(object, open_download_link())?)
    }

    fn remove_shared_link(&self, object: &RemoteObject) -> redirector_core::Result<bool> {
        tracing::info!(id = %object.id, name = %object.name, "Removing shared link");
        let updated = self.update_link(object, serde_json::Value::Null)?;
        Ok(updated.shared_link()?.is_none())
    }
}
