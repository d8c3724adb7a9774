//! Fluent object graph over the remote API.
//!
//! `client.namespace("v1").collection("orders").resource(42).action("cancel")`
//! addresses `v1/orders/42/cancel` without hand-built URLs.

use std::fmt::Display;
use std::sync::Arc;

use rql::{Expr, Value as RqlValue};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::errors::ClientError;
use crate::result_view::ResultView;
use crate::transport::{HttpTransport, MutateResponse, Transport, Verb};

fn join_path(base: &str, segment: &str) -> String {
    let segment = segment.trim_matches('/');
    if base.is_empty() {
        segment.to_string()
    } else {
        format!("{}/{}", base, segment)
    }
}

#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    config: ClientConfig,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.config.endpoint)
            .field("page_size", &self.config.page_size)
            .finish()
    }
}

impl Client {
    /// Client talking HTTP to `config.endpoint`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config
            .validate()
            .map_err(|e| ClientError::invalid_input(format!("{:#}", e)))?;
        let transport = HttpTransport::new(&config)?;
        Ok(Self::with_transport(Arc::new(transport), config))
    }

    pub fn with_transport(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn namespace(&self, name: &str) -> Namespace {
        Namespace {
            transport: Arc::clone(&self.transport),
            path: join_path("", name),
            page_size: self.config.page_size,
        }
    }

    /// Collection at the API root, outside any namespace.
    pub fn collection(&self, name: &str) -> Collection {
        self.namespace("").collection(name)
    }
}

#[derive(Clone)]
pub struct Namespace {
    transport: Arc<dyn Transport>,
    path: String,
    page_size: usize,
}

impl Namespace {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn namespace(&self, name: &str) -> Namespace {
        Namespace {
            transport: Arc::clone(&self.transport),
            path: join_path(&self.path, name),
            page_size: self.page_size,
        }
    }

    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            transport: Arc::clone(&self.transport),
            path: join_path(&self.path, name),
            page_size: self.page_size,
        }
    }
}

#[derive(Clone)]
pub struct Collection {
    transport: Arc<dyn Transport>,
    path: String,
    page_size: usize,
}

impl Collection {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Unfiltered view over the whole collection.
    pub fn view(&self) -> ResultView {
        ResultView::new(Arc::clone(&self.transport), self.path.clone())
            .with_page_size(self.page_size)
    }

    pub fn filter(&self, expr: Expr) -> ResultView {
        self.view().filter(expr)
    }

    pub fn filter_by<K, V, I>(&self, lookups: I) -> Result<ResultView, ClientError>
    where
        K: AsRef<str>,
        V: Into<RqlValue>,
        I: IntoIterator<Item = (K, V)>,
    {
        self.view().filter_by(lookups)
    }

    pub async fn create(&self, payload: &Value) -> Result<MutateResponse, ClientError> {
        self.transport
            .mutate(Verb::Post, &self.path, Some(payload))
            .await
    }

    pub fn resource(&self, id: impl Display) -> Resource {
        Resource {
            transport: Arc::clone(&self.transport),
            path: join_path(&self.path, &id.to_string()),
            page_size: self.page_size,
        }
    }

    /// Collection-level action such as `orders/export`.
    pub fn action(&self, name: &str) -> Action {
        Action {
            transport: Arc::clone(&self.transport),
            path: join_path(&self.path, name),
        }
    }
}

#[derive(Clone)]
pub struct Resource {
    transport: Arc<dyn Transport>,
    path: String,
    page_size: usize,
}

impl Resource {
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Partial update (`PATCH`).
    pub async fn update(&self, payload: &Value) -> Result<MutateResponse, ClientError> {
        self.transport
            .mutate(Verb::Patch, &self.path, Some(payload))
            .await
    }

    /// Full replacement (`PUT`).
    pub async fn replace(&self, payload: &Value) -> Result<MutateResponse, ClientError> {
        self.transport
            .mutate(Verb::Put, &self.path, Some(payload))
            .await
    }

    pub async fn delete(&self) -> Result<MutateResponse, ClientError> {
        self.transport.mutate(Verb::Delete, &self.path, None).await
    }

    pub fn action(&self, name: &str) -> Action {
        Action {
            transport: Arc::clone(&self.transport),
            path: join_path(&self.path, name),
        }
    }

    /// Nested collection, e.g. `orders/42/items`.
    pub fn collection(&self, name: &str) -> Collection {
        Collection {
            transport: Arc::clone(&self.transport),
            path: join_path(&self.path, name),
            page_size: self.page_size,
        }
    }
}

#[derive(Clone)]
pub struct Action {
    transport: Arc<dyn Transport>,
    path: String,
}

impl Action {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub async fn call(&self, payload: Option<&Value>) -> Result<MutateResponse, ClientError> {
        self.transport.mutate(Verb::Post, &self.path, payload).await
    }
}
