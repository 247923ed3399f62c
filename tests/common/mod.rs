#![allow(dead_code)]

use std::{
    collections::VecDeque,
    env,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{SystemTime, UNIX_EPOCH},
};

use futures_util::future::BoxFuture;
use http::{HeaderMap, HeaderValue, StatusCode};

use oss::{Client, Error, RawResponse, Result, Transport, api::RequestDescriptor};

static BUCKET_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Records every request and answers from a queue of scripted responses.
#[derive(Default)]
pub(crate) struct MockTransport {
    requests: Mutex<Vec<RequestDescriptor>>,
    responses: Mutex<VecDeque<RawResponse>>,
}

impl MockTransport {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn respond(&self, status: StatusCode, body: &str) {
        self.respond_with_headers(status, HeaderMap::new(), body);
    }

    pub(crate) fn respond_with_headers(&self, status: StatusCode, headers: HeaderMap, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(RawResponse::new(status, headers, body.to_string()));
    }

    pub(crate) fn requests(&self) -> Vec<RequestDescriptor> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn last_request(&self) -> RequestDescriptor {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

impl Transport for MockTransport {
    fn send(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<RawResponse>> {
        self.requests.lock().unwrap().push(request);
        let response = self.responses.lock().unwrap().pop_front();
        Box::pin(async move {
            response.ok_or_else(|| Error::transport("no scripted response left", None))
        })
    }
}

pub(crate) fn mock_client() -> (Client, Arc<MockTransport>) {
    let transport = MockTransport::new();
    (Client::with_transport(transport.clone()), transport)
}

pub(crate) fn request_id_headers(id: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("x-oss-request-id", HeaderValue::from_static(id));
    headers
}

pub(crate) fn body_text(request: &RequestDescriptor) -> String {
    request
        .body
        .as_ref()
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default()
}

/// Live-service settings, or `None` when `OSS_TEST_ENDPOINT` is unset.
pub(crate) fn live_client() -> Result<Option<Client>> {
    let Ok(endpoint) = env::var("OSS_TEST_ENDPOINT") else {
        return Ok(None);
    };

    Client::builder(&endpoint)?
        .addressing_style(oss::AddressingStyle::Auto)
        .build()
        .map(Some)
}

pub(crate) fn unique_bucket(prefix: &str) -> String {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    let n = BUCKET_COUNTER.fetch_add(1, Ordering::Relaxed);
    format!("{prefix}{now}-{n}")
}
