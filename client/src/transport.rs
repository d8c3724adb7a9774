//! Transport seam between result views and the remote API.
//!
//! Views only need two calls: a paginated GET returning a JSON array plus the
//! `Content-Range` header, and a create/update/delete call.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_RANGE, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde_json::Value;
use strum_macros::{AsRefStr, Display};

use crate::config::ClientConfig;
use crate::errors::ClientError;

/// One page of records as returned by the server.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<Value>,
    pub content_range: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Verb {
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutateResponse {
    Json(Value),
    Bytes(Vec<u8>),
    Empty,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// GET `url` (path plus rendered query string) with extra query `params`.
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<Page, ClientError>;

    async fn mutate(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<MutateResponse, ClientError>;
}

pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .field("client", &"<reqwest::Client>")
            .finish()
    }
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                ClientError::invalid_input(format!("Invalid header name {:?}: {}", name, e))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                ClientError::invalid_input(format!("Invalid value for header {}: {}", name, e))
            })?;
            headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path.trim_start_matches('/'))
    }

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if !status.is_client_error() && !status.is_server_error() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        tracing::debug!("Request failed with {}: {}", status, body);
        Err(ClientError::Remote {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<Page, ClientError> {
        let url = self.url(url);
        tracing::debug!("GET {} {:?}", url, params);

        let response = self.client.get(&url).query(params).send().await?;
        let response = Self::error_for_status(response).await?;

        let content_range = match response.headers().get(CONTENT_RANGE) {
            Some(value) => Some(
                value
                    .to_str()
                    .map_err(|e| ClientError::Decode(format!("Invalid Content-Range: {}", e)))?
                    .to_string(),
            ),
            None => None,
        };

        let body: Value = response.json().await?;
        let Value::Array(records) = body else {
            return Err(ClientError::Decode(format!(
                "Expected a JSON array from {}, got {}",
                url, body
            )));
        };

        Ok(Page {
            records,
            content_range,
        })
    }

    async fn mutate(
        &self,
        verb: Verb,
        path: &str,
        payload: Option<&Value>,
    ) -> Result<MutateResponse, ClientError> {
        let url = self.url(path);
        tracing::debug!("{} {}", verb, url);

        let method = match verb {
            Verb::Post => Method::POST,
            Verb::Put => Method::PUT,
            Verb::Patch => Method::PATCH,
            Verb::Delete => Method::DELETE,
        };
        let mut request = self.client.request(method, &url);
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = Self::error_for_status(request.send().await?).await?;
        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("json"));

        let bytes = response.bytes().await?;
        if bytes.is_empty() {
            return Ok(MutateResponse::Empty);
        }
        if is_json {
            return Ok(MutateResponse::Json(serde_json::from_slice(&bytes)?));
        }
        Ok(MutateResponse::Bytes(bytes.to_vec()))
    }
}
