//! Scripted search backend for unit tests.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::client::{RawResponse, SearchBackend};
use crate::error::FetchError;

type Responder = dyn Fn(&str, &str, &str) -> Result<RawResponse, FetchError> + Send + Sync;

/// One recorded request.
#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub key: String,
    pub cx: String,
    pub query: String,
}

/// Backend that answers from a closure and records every call.
pub(crate) struct ScriptedBackend {
    responder: Box<Responder>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedBackend {
    pub(crate) fn new<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&str, &str, &str) -> Result<RawResponse, FetchError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub(crate) fn queried(&self, query: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c.query == query)
    }
}

#[async_trait]
impl SearchBackend for ScriptedBackend {
    async fn search(&self, key: &str, cx: &str, query: &str) -> Result<RawResponse, FetchError> {
        self.calls.lock().unwrap().push(Call {
            key: key.to_string(),
            cx: cx.to_string(),
            query: query.to_string(),
        });
        (self.responder)(key, cx, query)
    }
}

pub(crate) fn ok_count(count: u64) -> RawResponse {
    RawResponse::new(
        200,
        format!(r#"{{"searchInformation":{{"totalResults":"{count}"}}}}"#),
    )
}

pub(crate) fn status_only(status: u16) -> RawResponse {
    RawResponse::new(status, "")
}

pub(crate) fn error_400(message: &str) -> RawResponse {
    raw(
        400,
        &format!(r#"{{"error":{{"code":400,"errors":[{{"message":"{message}"}}]}}}}"#),
    )
}

pub(crate) fn raw(status: u16, body: &str) -> RawResponse {
    RawResponse::new(status, body)
}
