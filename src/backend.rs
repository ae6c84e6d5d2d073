use std::time::Duration;

use async_trait::async_trait;
use snafu::{OptionExt, ResultExt};

use crate::{
    error::{ApiSnafu, ConfigSnafu, DecodeSnafu, Result, TransportSnafu},
    params::WireParams,
    response::ResponseEnvelope,
};

/// Fetches one page of records for a model.
///
/// The table only depends on this trait, so hosts that already have a data
/// layer implement it directly and skip [`HttpBackend`].
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn query(&self, model_name: &str, params: &WireParams) -> Result<ResponseEnvelope>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl BackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// will read some env keys if exists.
    ///
    /// env **`TABULAR_API_URL`** to specific the collection root, default is **`http://localhost:3000/api`**
    ///
    /// env **`TABULAR_REQUEST_TIMEOUT_SECS`** to config the request timeout, default is **`30`**
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        if let Ok(base_url) = std::env::var("TABULAR_API_URL") {
            config.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("TABULAR_REQUEST_TIMEOUT_SECS") {
            let secs = timeout.trim().parse::<u64>().ok().context(ConfigSnafu {
                key: "TABULAR_REQUEST_TIMEOUT_SECS",
                value: timeout.clone(),
            })?;
            config.timeout = Duration::from_secs(secs);
        }
        tracing::info!(
            "backend at {} with timeout {:?}",
            config.base_url,
            config.timeout
        );
        Ok(config)
    }
}

/// [`QueryBackend`] over http: `GET {base_url}/{model_name}?page[limit]=..`
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl HttpBackend {
    pub fn new(config: BackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context(TransportSnafu)?;
        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self> {
        Self::new(BackendConfig::from_env()?)
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn collection_url(&self, model_name: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            model_name.trim_start_matches('/')
        )
    }
}

#[async_trait]
impl QueryBackend for HttpBackend {
    async fn query(&self, model_name: &str, params: &WireParams) -> Result<ResponseEnvelope> {
        let url = self.collection_url(model_name);
        let pairs = params.to_query_pairs();
        tracing::debug!("GET {url} with {pairs:?}");
        let response = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/vnd.api+json")
            .query(&pairs)
            .send()
            .await
            .context(TransportSnafu)?;
        let status = response.status();
        let body = response.bytes().await.context(TransportSnafu)?;

        if !status.is_success() {
            // error bodies that are not json:api still surface as a failure
            let errors = serde_json::from_slice::<ResponseEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.errors)
                .unwrap_or_default();
            tracing::warn!("{url} answered {status} with {} error(s)", errors.len());
            return ApiSnafu {
                status: status.as_u16(),
                errors,
            }
            .fail();
        }
        serde_json::from_slice(&body).context(DecodeSnafu)
    }
}
