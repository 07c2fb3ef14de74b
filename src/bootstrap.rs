// Bootstrap - resolve API configuration and wire the stores
//
// One API client is built and injected, together with the feedback sinks,
// into every store.

use std::path::PathBuf;
use std::sync::Arc;

use reqwest::Url;

use crate::api::{BillsApi, IncomeApi, SystemApi};
use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::feedback::Feedback;
use crate::http::HttpApi;
use crate::store::{BillStore, IncomeStore, SystemStore, UnifiedStore};

/// Where to look for runtime configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigSource {
    /// A local copy of environment.json
    File(PathBuf),
    /// An origin serving /env/environment.json
    Origin(Url),
}

/// Resolve runtime API configuration.
///
/// A file source yields `None` (default client) when the file is absent or
/// unusable. An origin source yields `None` for a document without API
/// settings, and falls back to port 7080 on the origin's host only when the
/// request itself fails.
pub async fn resolve_config(source: &ConfigSource) -> Option<ApiConfig> {
    match source {
        ConfigSource::File(path) => ApiConfig::load_file(path),
        ConfigSource::Origin(origin) => match ApiConfig::fetch(origin).await {
            Ok(config) => config,
            Err(e) => {
                let fallback = ApiConfig::fallback_for(origin);
                tracing::info!(base = fallback.base_url(), error = %e, "using development API default");
                Some(fallback)
            }
        },
    }
}

/// Every store, sharing one API client
pub struct Stores<A> {
    pub bills: BillStore<A>,
    pub income: IncomeStore<A>,
    pub system: SystemStore<A>,
    pub unified: UnifiedStore<A>,
    api: Arc<A>,
}

impl<A> Stores<A> {
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }
}

/// Inject one API value and the feedback sinks into every store
pub fn install<A>(api: Arc<A>, feedback: Feedback) -> Stores<A>
where
    A: BillsApi + IncomeApi + SystemApi,
{
    Stores {
        bills: BillStore::new(Arc::clone(&api), feedback.clone()),
        income: IncomeStore::new(Arc::clone(&api), feedback.clone()),
        system: SystemStore::new(Arc::clone(&api), feedback.clone()),
        unified: UnifiedStore::new(Arc::clone(&api), feedback),
        api,
    }
}

/// Build the HTTP client from `config` (or the default) and install it
pub fn connect(config: Option<&ApiConfig>, feedback: Feedback) -> ApiResult<Stores<HttpApi>> {
    let api = match config {
        Some(config) => HttpApi::new(config)?,
        None => HttpApi::new(&ApiConfig::default())?,
    };
    tracing::debug!(api = ?api, "stores connected");
    Ok(install(Arc::new(api), feedback))
}
