//! HTTP client for the widget library and storage presigning endpoints.
//!
//! Endpoints, relative to the configured base URL:
//!
//! - `GET  apps/{app}/widgets/{widget}[?version=x.y.z]` returns a widget definition.
//! - `POST apps/{app}/storage/presign` with `{"paths": [...]}` returns the
//!   resolved assets, either as a bare array or wrapped in `{"assets": [...]}`.

use std::sync::Arc;

use async_trait::async_trait;
use builder_core::{AssetResolver, ResolvedAsset, ServiceError, WidgetDefinition, WidgetRef, WidgetService};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Errors that can occur when talking to the builder API.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The base URL provided is invalid.
    #[error("invalid API URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed (connection, timeout, etc.).
    #[error("API request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// JSON parsing failed.
    #[error("failed to parse API payload: {0}")]
    Json(#[from] serde_json::Error),
    /// The server answered with a non-success status.
    #[error("API returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly empty.
        body: String,
    },
}

impl From<url::ParseError> for ClientError {
    fn from(e: url::ParseError) -> Self {
        Self::InvalidUrl(e.to_string())
    }
}

impl From<ClientError> for ServiceError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Status { status, body } if status == StatusCode::NOT_FOUND.as_u16() => {
                Self::NotFound(body)
            }
            ClientError::Json(e) => Self::UnexpectedResponse(e.to_string()),
            other => Self::Request(other.to_string()),
        }
    }
}

/// Builder API client. Cheap to clone.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<InnerClient>,
}

struct InnerClient {
    http: Client,
    base: Url,
    token: Option<String>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base", &self.inner.base.as_str())
            .field("authenticated", &self.inner.token.is_some())
            .finish()
    }
}

impl ApiClient {
    /// Create a client for `base_url`, optionally sending a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the URL is malformed or cannot
    /// carry a path. Returns [`ClientError::Http`] if the HTTP client fails
    /// to build.
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, ClientError> {
        let base = Url::parse(base_url)?;
        if base.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(format!("{base_url} cannot be a base URL")));
        }

        let http = Client::builder()
            .user_agent(concat!("surface-builder/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(InnerClient { http, base, token }),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base
    }

    /// URL of a widget definition.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the base URL cannot carry a path.
    pub fn widget_url(&self, widget: &WidgetRef) -> Result<Url, ClientError> {
        let mut url = self.endpoint(&["apps", &widget.app_id, "widgets", &widget.widget_id])?;
        if let Some(version) = widget.version {
            url.query_pairs_mut()
                .append_pair("version", &version.to_string());
        }
        Ok(url)
    }

    /// URL of the presign endpoint for `app_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidUrl`] if the base URL cannot carry a path.
    pub fn presign_url(&self, app_id: &str) -> Result<Url, ClientError> {
        self.endpoint(&["apps", app_id, "storage", "presign"])
    }

    /// Fetch a widget definition.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the body is not a widget definition.
    pub async fn fetch_widget(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ClientError> {
        let url = self.widget_url(widget)?;
        tracing::debug!(%url, "GET widget");
        let response = self.authorize(self.inner.http.get(url)).send().await?;
        read_json(response).await
    }

    /// Exchange storage paths for signed URLs.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails, the server answers with a
    /// non-success status, or the body cannot be parsed.
    pub async fn presign(&self, app_id: &str, paths: &[String]) -> Result<Vec<ResolvedAsset>, ClientError> {
        let url = self.presign_url(app_id)?;
        tracing::debug!(%url, count = paths.len(), "POST presign");
        let response = self
            .authorize(self.inner.http.post(url))
            .json(&PresignRequest { paths })
            .send()
            .await?;
        let body: PresignResponse = read_json(response).await?;
        Ok(body.into_assets())
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ClientError> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| ClientError::InvalidUrl(format!("{} cannot be a base URL", self.inner.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.inner.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

async fn read_json<T>(response: Response) -> Result<T, ClientError>
where
    for<'de> T: Deserialize<'de>,
{
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = status.as_u16(), "API request rejected");
        return Err(ClientError::Status {
            status: status.as_u16(),
            body,
        });
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[async_trait]
impl WidgetService for ApiClient {
    async fn get_widget(&self, widget: &WidgetRef) -> Result<WidgetDefinition, ServiceError> {
        self.fetch_widget(widget).await.map_err(ServiceError::from)
    }
}

#[async_trait]
impl AssetResolver for ApiClient {
    async fn resolve(&self, app_id: &str, paths: &[String]) -> Result<Vec<ResolvedAsset>, ServiceError> {
        self.presign(app_id, paths).await.map_err(ServiceError::from)
    }
}

#[derive(Debug, Serialize)]
struct PresignRequest<'a> {
    paths: &'a [String],
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PresignResponse {
    Bare(Vec<ResolvedAsset>),
    Wrapped { assets: Vec<ResolvedAsset> },
}

impl PresignResponse {
    fn into_assets(self) -> Vec<ResolvedAsset> {
        match self {
            Self::Bare(assets) | Self::Wrapped { assets } => assets,
        }
    }
}
