use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::ClientError;
use crate::transport::{MutateResponse, Page, Transport, Verb};

#[derive(Debug, Clone, PartialEq)]
pub struct FetchCall {
    pub url: String,
    pub limit: usize,
    pub offset: usize,
    pub search: Option<String>,
}

/// In-memory collection that serves `limit`/`offset` pages and records calls.
pub struct RecordingTransport {
    records: Vec<Value>,
    max_page: Option<usize>,
    send_range: bool,
    claimed_count: Option<u64>,
    fail_at_offset: Option<usize>,
    fetches: Mutex<Vec<FetchCall>>,
    mutations: Mutex<Vec<(Verb, String, Option<Value>)>>,
}

pub fn make_records(count: usize) -> Vec<Value> {
    (0..count)
        .map(|i| json!({"id": i, "name": format!("item-{}", i), "owner": {"name": format!("user-{}", i % 3)}}))
        .collect()
}

impl RecordingTransport {
    pub fn new(count: usize) -> Self {
        Self::with_records(make_records(count))
    }

    pub fn with_records(records: Vec<Value>) -> Self {
        Self {
            records,
            max_page: None,
            send_range: true,
            claimed_count: None,
            fail_at_offset: None,
            fetches: Mutex::new(Vec::new()),
            mutations: Mutex::new(Vec::new()),
        }
    }

    /// Caps every page below the requested limit, like servers with a maximum page size.
    pub fn max_page(mut self, max: usize) -> Self {
        self.max_page = Some(max);
        self
    }

    pub fn without_range(mut self) -> Self {
        self.send_range = false;
        self
    }

    /// Reports `count` in range headers regardless of the real record count.
    pub fn claim_count(mut self, count: u64) -> Self {
        self.claimed_count = Some(count);
        self
    }

    pub fn fail_at(mut self, offset: usize) -> Self {
        self.fail_at_offset = Some(offset);
        self
    }

    pub fn fetches(&self) -> Vec<FetchCall> {
        self.fetches.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<(Verb, String, Option<Value>)> {
        self.mutations.lock().unwrap().clone()
    }
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.as_str())
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn fetch(&self, url: &str, params: &[(String, String)]) -> Result<Page, ClientError> {
        let limit: usize = param(params, "limit").unwrap().parse().unwrap();
        let offset: usize = param(params, "offset").unwrap().parse().unwrap();
        self.fetches.lock().unwrap().push(FetchCall {
            url: url.to_string(),
            limit,
            offset,
            search: param(params, "search").map(str::to_string),
        });

        if self.fail_at_offset == Some(offset) {
            return Err(ClientError::Remote {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        let take = self.max_page.map_or(limit, |max| limit.min(max));
        let start = offset.min(self.records.len());
        let end = (offset + take).min(self.records.len());
        let records = self.records[start..end].to_vec();

        let count = self.claimed_count.unwrap_or(self.records.len() as u64);
        let content_range = self.send_range.then(|| {
            format!(
                "items {}-{}/{}",
                offset,
                offset as i64 + records.len() as i64 - 1,
                count
            )
        });

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
        self.mutations
            .lock()
            .unwrap()
            .push((verb, path.to_string(), payload.cloned()));
        Ok(match (verb, payload) {
            (Verb::Delete, _) | (_, None) => MutateResponse::Empty,
            (_, Some(payload)) => MutateResponse::Json(payload.clone()),
        })
    }
}
