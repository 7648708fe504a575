//! The ZPA management API client.

use futures_util::{Stream, StreamExt};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, instrument};
use zpa_core::{ApiStatus, ApiVersion, Page, ZpaError, ZpaResult};

use crate::config::ZpaConfig;
use crate::session::{Session, TokenResponse};

/// Records fetched per page when walking a paginated list.
const DEFAULT_PAGE_SIZE: u32 = 500;

/// Client for the ZPA management API.
///
/// Holds the signin session and scopes every request to the configured
/// customer. All calls are blocking awaits issued one at a time; shared use
/// across tasks is safe because the only mutable state is the token slot.
pub struct ZpaClient {
    http: reqwest::Client,
    base_url: String,
    customer_id: String,
    config: ZpaConfig,
    session: RwLock<Option<Session>>,
}

impl ZpaClient {
    /// Create a client and authenticate against the signin endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ZpaError::Config`] for incomplete configuration and
    /// [`ZpaError::Auth`] when the platform rejects the credentials.
    pub async fn connect(config: ZpaConfig) -> ZpaResult<Self> {
        config.validate()?;
        let base_url = config.resolve_base_url()?;
        let http = reqwest::Client::builder().build()?;

        let client = Self {
            http,
            base_url,
            customer_id: config.customer_id.clone(),
            config,
            session: RwLock::new(None),
        };
        client.signin().await?;
        Ok(client)
    }

    /// Authenticate and store the bearer token.
    async fn signin(&self) -> ZpaResult<()> {
        let url = format!("{}/signin", self.base_url);
        let response = self
            .http
            .post(&url)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
            ])
            .send()
            .await?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ZpaError::Auth { status, body });
        }

        let token: TokenResponse = response.json().await?;
        debug!("signed in to {}", self.base_url);
        *self.session.write() = Some(Session::from_response(token));
        Ok(())
    }

    /// Current bearer token, refreshing the session when it has expired.
    async fn bearer(&self) -> ZpaResult<String> {
        let fresh = {
            let guard = self.session.read();
            guard
                .as_ref()
                .filter(|session| !session.is_expired())
                .map(|session| session.access_token().to_string())
        };
        if let Some(token) = fresh {
            return Ok(token);
        }
        self.signin().await?;
        let guard = self.session.read();
        guard
            .as_ref()
            .map(|session| session.access_token().to_string())
            .ok_or_else(|| ZpaError::Config("Signin produced no session".into()))
    }

    fn endpoint(&self, path: &str, version: ApiVersion) -> String {
        format!(
            "{}/{}/admin/customers/{}/{}",
            self.base_url,
            version.prefix(),
            self.customer_id,
            path
        )
    }

    /// GET a resource document (v1 endpoint).
    pub async fn get(&self, path: &str) -> ZpaResult<Value> {
        self.get_versioned(path, ApiVersion::V1).await
    }

    /// GET a resource document from a specific schema version.
    #[instrument(skip(self))]
    pub async fn get_versioned(&self, path: &str, version: ApiVersion) -> ZpaResult<Value> {
        let token = self.bearer().await?;
        let response = self
            .http
            .get(self.endpoint(path, version))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await?;
        if !(200..=299).contains(&status) {
            return Err(ZpaError::RemoteRejected { status, body });
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }

    /// POST a document, returning the created resource inline.
    ///
    /// # Errors
    ///
    /// A non-2xx answer is a [`ZpaError::RemoteRejected`] carrying the
    /// verbatim status and body.
    #[instrument(skip(self, body))]
    pub async fn post(&self, path: &str, body: &Value, version: ApiVersion) -> ZpaResult<Value> {
        let token = self.bearer().await?;
        let response = self
            .http
            .post(self.endpoint(path, version))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        if !(200..=299).contains(&status) {
            return Err(ZpaError::RemoteRejected { status, body: text });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    /// PUT a document. The status is surfaced, not interpreted.
    #[instrument(skip(self, body))]
    pub async fn put(&self, path: &str, body: &Value, version: ApiVersion) -> ZpaResult<ApiStatus> {
        let token = self.bearer().await?;
        let response = self
            .http
            .put(self.endpoint(path, version))
            .bearer_auth(token)
            .json(body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ApiStatus { status, body })
    }

    /// PUT with no request body (positional endpoints).
    #[instrument(skip(self))]
    pub async fn put_empty(&self, path: &str, version: ApiVersion) -> ZpaResult<ApiStatus> {
        let token = self.bearer().await?;
        let response = self
            .http
            .put(self.endpoint(path, version))
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Ok(ApiStatus { status, body })
    }

    /// DELETE a resource, returning the response status code.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> ZpaResult<u16> {
        let token = self.bearer().await?;
        let response = self
            .http
            .delete(self.endpoint(path, ApiVersion::V1))
            .bearer_auth(token)
            .send()
            .await?;
        Ok(response.status().as_u16())
    }

    /// Lazily walk a paginated list endpoint, yielding one record at a time.
    ///
    /// Pages are fetched on demand; iteration stops at the server-reported
    /// page count or at the first empty page.
    pub fn stream_pages<'a>(
        &'a self,
        path: &'a str,
        version: ApiVersion,
    ) -> impl Stream<Item = ZpaResult<Value>> + 'a {
        async_stream::try_stream! {
            let mut page = 1u64;
            loop {
                let token = self.bearer().await?;
                let url = format!(
                    "{}?page={page}&pagesize={DEFAULT_PAGE_SIZE}",
                    self.endpoint(path, version)
                );
                let response = self.http.get(url).bearer_auth(token).send().await?;
                let status = response.status().as_u16();
                let body = response.text().await?;
                if !(200..=299).contains(&status) {
                    Err(ZpaError::RemoteRejected { status, body })?;
                    break;
                }
                let parsed: Page = serde_json::from_str(&body)?;
                if parsed.list.is_empty() {
                    break;
                }
                for record in parsed.list {
                    yield record;
                }
                if page >= parsed.total_pages {
                    break;
                }
                page += 1;
            }
        }
    }

    /// Fetch every record of a paginated list endpoint.
    pub async fn get_paginated(&self, path: &str, version: ApiVersion) -> ZpaResult<Vec<Value>> {
        let stream = self.stream_pages(path, version);
        futures_util::pin_mut!(stream);
        let mut records = Vec::new();
        while let Some(record) = stream.next().await {
            records.push(record?);
        }
        Ok(records)
    }
}

impl std::fmt::Debug for ZpaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZpaClient")
            .field("base_url", &self.base_url)
            .field("customer_id", &self.customer_id)
            .finish_non_exhaustive()
    }
}
