pub mod http;
pub mod mock;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::pagination::ShapeError;

pub use http::{HttpApiOptions, HttpClientApi};
pub use mock::{MockCall, MockClientApi};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("unexpected response from {url}: {message}")]
    Format { url: String, message: String },

    #[error("unexpected response from {url}: {source}")]
    Shape {
        url: String,
        #[source]
        source: ShapeError,
    },

    #[error("cannot build endpoint for {path}")]
    InvalidEndpoint { path: String },
}

impl FetchError {
    // Transport failures and non-2xx statuses share one bucket for callers.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Status { .. })
    }
}

#[derive(Debug, Error)]
pub enum ApiSetupError {
    #[error("invalid base URL: {url}")]
    InvalidBaseUrl { url: String },

    #[error("invalid header '{header}', expected 'Key: Value'")]
    InvalidHeader { header: String },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },
}

/// Backend for the roster screen. Every method returns the decoded JSON body
/// of a 2xx response; shape checks belong to the caller.
#[async_trait]
pub trait ClientApi: Send + Sync {
    /// `GET /api/clients?page={page}&size={size}`
    async fn list_clients(&self, page: u32, size: u32) -> Result<Value, FetchError>;

    /// `POST /api/client/{id}/predict`
    async fn predict(&self, id: &str) -> Result<Value, FetchError>;

    /// `POST /api/client/{id}/shap`
    async fn attribution(&self, id: &str) -> Result<Value, FetchError>;
}
