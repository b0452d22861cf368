//! Scriptable in-memory backend.
//!
//! Responses are registered per page or per client id; every call is
//! recorded. A response can be held back behind a gate so tests can decide
//! the order in which concurrent calls resolve.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Notify;

use super::{ClientApi, FetchError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    List { page: u32, size: u32 },
    Predict(String),
    Attribution(String),
}

// Ok(body) or Err(http status)
type Scripted = Result<Value, u16>;

#[derive(Default)]
pub struct MockClientApi {
    pages: Mutex<HashMap<u32, Scripted>>,
    predictions: Mutex<HashMap<String, Scripted>>,
    attributions: Mutex<HashMap<String, Scripted>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    calls: Mutex<Vec<MockCall>>,
}

impl MockClientApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(self, page: u32, body: Value) -> Self {
        lock(&self.pages).insert(page, Ok(body));
        self
    }

    pub fn with_page_status(self, page: u32, status: u16) -> Self {
        lock(&self.pages).insert(page, Err(status));
        self
    }

    pub fn with_prediction(self, id: &str, body: Value) -> Self {
        lock(&self.predictions).insert(id.to_string(), Ok(body));
        self
    }

    pub fn with_prediction_status(self, id: &str, status: u16) -> Self {
        lock(&self.predictions).insert(id.to_string(), Err(status));
        self
    }

    pub fn with_attribution(self, id: &str, body: Value) -> Self {
        lock(&self.attributions).insert(id.to_string(), Ok(body));
        self
    }

    pub fn with_attribution_status(self, id: &str, status: u16) -> Self {
        lock(&self.attributions).insert(id.to_string(), Err(status));
        self
    }

    /// Holds every call for `key` (`"page:N"`, `"predict:ID"` or
    /// `"shap:ID"`) until the returned handle is notified.
    pub fn hold(&self, key: &str) -> Arc<Notify> {
        lock(&self.gates)
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Notify::new()))
            .clone()
    }

    pub fn calls(&self) -> Vec<MockCall> {
        lock(&self.calls).clone()
    }

    async fn pass_gate(&self, key: &str) {
        let gate = lock(&self.gates).get(key).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn resolve(scripted: Option<Scripted>, url: String) -> Result<Value, FetchError> {
    match scripted {
        Some(Ok(body)) => Ok(body),
        Some(Err(status)) => Err(FetchError::Status { url, status }),
        None => Err(FetchError::Status { url, status: 404 }),
    }
}

#[async_trait]
impl ClientApi for MockClientApi {
    async fn list_clients(&self, page: u32, size: u32) -> Result<Value, FetchError> {
        lock(&self.calls).push(MockCall::List { page, size });
        self.pass_gate(&format!("page:{page}")).await;
        let scripted = lock(&self.pages).get(&page).cloned();
        resolve(scripted, format!("/api/clients?page={page}&size={size}"))
    }

    async fn predict(&self, id: &str) -> Result<Value, FetchError> {
        lock(&self.calls).push(MockCall::Predict(id.to_string()));
        self.pass_gate(&format!("predict:{id}")).await;
        let scripted = lock(&self.predictions).get(id).cloned();
        resolve(scripted, format!("/api/client/{id}/predict"))
    }

    async fn attribution(&self, id: &str) -> Result<Value, FetchError> {
        lock(&self.calls).push(MockCall::Attribution(id.to_string()));
        self.pass_gate(&format!("shap:{id}")).await;
        let scripted = lock(&self.attributions).get(id).cloned();
        resolve(scripted, format!("/api/client/{id}/shap"))
    }
}
