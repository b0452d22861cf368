use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::debug;

use super::{ApiSetupError, ClientApi, FetchError};

#[derive(Clone, Debug)]
pub struct HttpApiOptions {
    pub base_url: String,
    pub timeout_seconds: u64,
    pub proxy: Option<String>,
    pub header: Option<String>,
}

impl Default for HttpApiOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            timeout_seconds: 30,
            proxy: None,
            header: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpClientApi {
    client: reqwest::Client,
    base: Url,
}

impl HttpClientApi {
    pub fn new(options: &HttpApiOptions) -> Result<Self, ApiSetupError> {
        let base = Url::parse(options.base_url.trim()).map_err(|_| ApiSetupError::InvalidBaseUrl {
            url: options.base_url.clone(),
        })?;
        if base.cannot_be_a_base() {
            return Err(ApiSetupError::InvalidBaseUrl {
                url: options.base_url.clone(),
            });
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            HeaderValue::from_static("application/json"),
        );
        if let Some(raw) = options.header.as_deref().filter(|h| !h.trim().is_empty()) {
            let (key, value) = parse_header(raw)?;
            headers.append(key, value);
        }

        // timeout 0 leaves failure signalling to the transport
        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10));
        if options.timeout_seconds > 0 {
            builder = builder.timeout(Duration::from_secs(options.timeout_seconds));
        }

        if let Some(proxy) = options.proxy.as_deref().filter(|p| !p.trim().is_empty()) {
            let proxy_cfg = reqwest::Proxy::all(proxy).map_err(|e| ApiSetupError::ProxySetup {
                proxy: proxy.to_string(),
                source: e,
            })?;
            builder = builder.proxy(proxy_cfg);
        }

        let client = builder
            .build()
            .map_err(|e| ApiSetupError::HttpClientBuild { source: e })?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, FetchError> {
        let mut url = self.base.clone();
        {
            let mut path = url.path_segments_mut().map_err(|_| FetchError::InvalidEndpoint {
                path: segments.join("/"),
            })?;
            path.pop_if_empty();
            path.extend(segments);
        }
        Ok(url)
    }

    async fn send_json(&self, method: Method, url: Url) -> Result<Value, FetchError> {
        let url_str = url.to_string();
        debug!(%method, url = %url_str, "sending request");
        let resp = self
            .client
            .request(method, url)
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url_str.clone(),
                source: e,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        let body = resp.bytes().await.map_err(|e| FetchError::Network {
            url: url_str.clone(),
            source: e,
        })?;
        serde_json::from_slice::<Value>(&body).map_err(|e| FetchError::Format {
            url: url_str,
            message: format!("body is not JSON: {e}"),
        })
    }
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), ApiSetupError> {
    let invalid = || ApiSetupError::InvalidHeader {
        header: raw.to_string(),
    };
    let (key, value) = raw.split_once(':').ok_or_else(invalid)?;
    let key = HeaderName::from_str(key.trim()).map_err(|_| invalid())?;
    let value = HeaderValue::from_str(value.trim()).map_err(|_| invalid())?;
    Ok((key, value))
}

#[async_trait]
impl ClientApi for HttpClientApi {
    async fn list_clients(&self, page: u32, size: u32) -> Result<Value, FetchError> {
        let mut url = self.endpoint(&["api", "clients"])?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());
        self.send_json(Method::GET, url).await
    }

    async fn predict(&self, id: &str) -> Result<Value, FetchError> {
        let url = self.endpoint(&["api", "client", id, "predict"])?;
        self.send_json(Method::POST, url).await
    }

    async fn attribution(&self, id: &str) -> Result<Value, FetchError> {
        let url = self.endpoint(&["api", "client", id, "shap"])?;
        self.send_json(Method::POST, url).await
    }
}
