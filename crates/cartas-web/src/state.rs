use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use cartas_client::{ApiClient, ApiError, QueryCache, Resource};

use crate::session::SessionStore;

pub type SharedState = Arc<AppState>;

/// Settings the dashboard needs beyond the API client.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// Base URL stored file references are resolved against.
    pub files_url: String,
    pub page_size: u32,
    pub cache_ttl: Duration,
    pub secure_cookies: bool,
}

pub struct AppState {
    /// Unauthenticated client; sessions derive their own with `with_token`.
    pub api: ApiClient,
    pub cache: QueryCache,
    pub sessions: SessionStore,
    pub files_url: String,
    pub page_size: u32,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(api: ApiClient, config: WebConfig) -> Self {
        Self {
            api,
            cache: QueryCache::new(config.cache_ttl),
            sessions: SessionStore::new(config.cache_ttl),
            files_url: config.files_url,
            page_size: config.page_size.max(1),
            secure_cookies: config.secure_cookies,
        }
    }

    /// Every record of `R`, from the cache while fresh. Catalogs read the
    /// same for every user, so these keys are not scoped to a session.
    pub async fn all<R: Resource>(&self, api: &ApiClient) -> Result<Vec<R::Item>, ApiError> {
        self.cache
            .get_or_fetch(&format!("{}#all", R::PATH), || api.list_all::<R>())
            .await
    }

    /// Drop cached data of `R` after a mutation.
    pub async fn invalidate<R: Resource>(&self) {
        self.cache.invalidate_prefix(R::PATH).await;
    }
}

/// `<option>` entry for select boxes.
#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl ToString, label: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            label: label.into(),
        }
    }
}
