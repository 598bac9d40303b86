//! HTTP implementation of the record store contract.
//!
//! All capabilities live behind one base endpoint; the `path` query
//! parameter selects the resource (`statistics`, `phone-records`, `users`).

use reqwest::header;
use reqwest::{Client, Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::Config;
use crate::error::{PhonedeskError, Result};
use crate::types::{BotUser, PhoneRecord, Statistics};

use super::{
    NewRecord, RecordStore, RecordUpdate, SearchTerm, StoreResult, TransportError,
    UserStatusChange,
};

const PATH_STATISTICS: &str = "statistics";
const PATH_RECORDS: &str = "phone-records";
const PATH_USERS: &str = "users";

/// Record store reached over HTTP with JSON bodies.
#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: Url,
}

impl HttpRecordStore {
    /// Create a store client from configuration
    ///
    /// Uses the configured request and connect timeouts; the core itself
    /// imposes none.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| PhonedeskError::Config(format!("cannot build HTTP client: {e}")))?;
        Self::with_client(client, &config.api_base_url())
    }

    /// Create a store client with an existing reqwest client
    pub fn with_client(client: Client, base_url: &str) -> Result<Self> {
        let base_url = Url::parse(base_url.trim()).map_err(|e| {
            PhonedeskError::Config(format!("invalid api.base_url '{base_url}': {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(PhonedeskError::Config(format!(
                "api.base_url must use http or https, got '{}'",
                base_url.scheme()
            )));
        }
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the endpoint URL for a resource with extra query parameters.
    ///
    /// Spaces are sent as `%20`, never `+`.
    pub(crate) fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("path", path);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }
        // A literal '+' is already escaped as %2B, so any '+' left is a space
        let query = url.query().map(|q| q.replace('+', "%20"));
        url.set_query(query.as_deref());
        url
    }

    fn list_url(&self, path: &str, search: &SearchTerm) -> Url {
        match search.as_query() {
            Some(term) => self.endpoint(path, &[("search", term)]),
            None => self.endpoint(path, &[]),
        }
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!("{method} {url}");
        self.client.request(method, url)
    }

    fn json_request<B: Serialize>(&self, method: Method, url: Url, body: &B) -> RequestBuilder {
        self.request(method, url)
            .header(
                header::CONTENT_TYPE,
                header::HeaderValue::from_static("application/json"),
            )
            .json(body)
    }

    /// Send a request and check the status; the body is left unread.
    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> StoreResult<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            tracing::warn!("{operation}: request failed: {e}");
            TransportError::from_reqwest(operation, e)
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("{operation}: store answered {status}");
            return Err(TransportError::with_status(operation, status));
        }
        Ok(response)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> StoreResult<T> {
        let response = self.send(operation, request).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| TransportError::from_reqwest(operation, e))
    }

    /// Like `fetch`, but a `null` body means the target id is gone.
    async fn fetch_entity<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> StoreResult<T> {
        self.fetch::<Option<T>>(operation, request)
            .await?
            .ok_or_else(|| TransportError::missing_entity(operation))
    }
}

impl RecordStore for HttpRecordStore {
    async fn statistics(&self) -> StoreResult<Statistics> {
        let url = self.endpoint(PATH_STATISTICS, &[]);
        self.fetch("fetch statistics", self.request(Method::GET, url))
            .await
    }

    async fn list(&self, search: &SearchTerm) -> StoreResult<Vec<PhoneRecord>> {
        let url = self.list_url(PATH_RECORDS, search);
        self.fetch("fetch phone records", self.request(Method::GET, url))
            .await
    }

    async fn create(&self, record: &NewRecord) -> StoreResult<PhoneRecord> {
        let url = self.endpoint(PATH_RECORDS, &[]);
        self.fetch_entity(
            "add phone record",
            self.json_request(Method::POST, url, record),
        )
        .await
    }

    async fn update(&self, update: &RecordUpdate) -> StoreResult<PhoneRecord> {
        let url = self.endpoint(PATH_RECORDS, &[]);
        self.fetch_entity(
            "update phone record",
            self.json_request(Method::PUT, url, update),
        )
        .await
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let id = id.to_string();
        let url = self.endpoint(PATH_RECORDS, &[("id", id.as_str())]);
        let request = self.request(Method::DELETE, url).header(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );
        self.send("delete phone record", request).await?;
        Ok(())
    }

    async fn list_users(&self, search: &SearchTerm) -> StoreResult<Vec<BotUser>> {
        let url = self.list_url(PATH_USERS, search);
        self.fetch("fetch users", self.request(Method::GET, url))
            .await
    }

    async fn set_user_status(&self, change: UserStatusChange) -> StoreResult<BotUser> {
        let url = self.endpoint(PATH_USERS, &[]);
        self.fetch_entity(
            "update user status",
            self.json_request(Method::PUT, url, &change),
        )
        .await
    }
}
