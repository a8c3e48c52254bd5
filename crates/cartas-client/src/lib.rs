//! Typed client for the correspondence REST API.
//!
//! [`ApiClient`] wraps a shared `reqwest::Client`. A client created with
//! [`ApiClient::with_token`] attaches `Authorization: Bearer <token>` to every
//! request. Every call returns `Result<_, ApiError>`; error responses surface
//! the API's `message` field.

pub mod auth;
pub mod cache;
pub mod cards;
pub mod error;
pub mod files;
pub mod resources;

use std::sync::Arc;
use std::time::Duration;

use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

pub use cache::QueryCache;
pub use error::ApiError;
pub use files::download_url;
pub use resources::{
    Areas, Cartas, Destinatarios, Empresas, Resource, Roles, SubAreas, Temas, Usuarios,
};

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Largest page requested when walking every page of a resource.
const LIST_ALL_LIMIT: u32 = 100;
/// Guard against an API that never reports a last page.
const LIST_ALL_MAX_PAGES: u32 = 500;

#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.trim().trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::Config(format!(
                "la URL del API debe empezar con http:// o https://: {base_url}"
            )));
        }

        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http,
            base_url: Arc::from(base_url),
            token: None,
        })
    }

    /// A client sharing this one's connection pool that authenticates as
    /// the holder of `token`.
    pub fn with_token(&self, token: &str) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(Arc::from(token)),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!("{} {}", method, path);
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send and decode a JSON body.
    pub(crate) async fn send<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        let res = check(builder.send().await?).await?;
        let bytes = res.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Send and discard whatever body comes back.
    pub(crate) async fn send_empty(&self, builder: RequestBuilder) -> Result<(), ApiError> {
        check(builder.send().await?).await?;
        Ok(())
    }

    pub(crate) async fn fetch_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &PageQuery,
    ) -> Result<cartas_types::api::Paginated<T>, ApiError> {
        self.send(self.request(Method::GET, path).query(&query.params()))
            .await
    }

    /// Every item behind a paginated endpoint, following `last_page`.
    pub(crate) async fn fetch_all<T: DeserializeOwned>(
        &self,
        path: &str,
        base: &PageQuery,
    ) -> Result<Vec<T>, ApiError> {
        let mut items = Vec::new();
        let mut page = 1;
        loop {
            let query = PageQuery {
                page,
                limit: LIST_ALL_LIMIT,
                ..base.clone()
            };
            let batch = self.fetch_page::<T>(path, &query).await?;
            let done = batch.data.is_empty() || page >= batch.meta.last_page;
            items.extend(batch.data);
            if done {
                break;
            }
            if page >= LIST_ALL_MAX_PAGES {
                warn!("{} reported more than {} pages, stopping", path, LIST_ALL_MAX_PAGES);
                break;
            }
            page += 1;
        }
        Ok(items)
    }
}

/// Turn a non-success response into an [`ApiError`].
async fn check(res: Response) -> Result<Response, ApiError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let url = res.url().path().to_string();
    let body = res.text().await.unwrap_or_default();
    let err = ApiError::from_status(status, &body);
    warn!("API {} {} failed: {}", status.as_u16(), url, err);
    Err(err)
}

/// Query parameters understood by every paginated endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
    pub search: Option<String>,
    pub search_by: Option<String>,
    pub filters: Vec<(String, String)>,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::new(1, 10)
    }
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self {
            page: page.max(1),
            limit: limit.max(1),
            search: None,
            search_by: None,
            filters: Vec::new(),
        }
    }

    /// Blank terms are dropped so an empty search box does not filter.
    pub fn search(mut self, term: Option<&str>, by: Option<&str>) -> Self {
        self.search = term.map(str::trim).filter(|t| !t.is_empty()).map(str::to_string);
        self.search_by = by.map(str::trim).filter(|b| !b.is_empty()).map(str::to_string);
        self
    }

    pub fn filter(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.trim().is_empty() {
            self.filters.push((key.to_string(), value));
        }
        self
    }

    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ];
        if let Some(search) = &self.search {
            params.push(("search".to_string(), search.clone()));
            if let Some(by) = &self.search_by {
                params.push(("searchBy".to_string(), by.clone()));
            }
        }
        params.extend(self.filters.iter().cloned());
        params
    }

    /// Stable cache key for this query under `path`.
    pub fn cache_key(&self, path: &str) -> String {
        let params: Vec<String> = self
            .params()
            .into_iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        format!("{}?{}", path, params.join("&"))
    }
}
