use std::time::Duration;

use bytes::Bytes;
use futures_util::future::BoxFuture;
use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::{api::RequestDescriptor, error::Result};

pub(crate) mod http_transport;
#[cfg(feature = "rustls")]
pub(crate) mod tls;

/// Sends a built request and returns the raw response.
///
/// The client hands every operation's [`RequestDescriptor`] to a transport by
/// value. Implementations own addressing, signing, retries and timeouts; a
/// non-2xx status is *not* an error at this level, the caller compares it with
/// [`RequestDescriptor::expected_statuses`].
pub trait Transport: Send + Sync {
    fn send(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<RawResponse>>;
}

/// Status, headers and fully buffered body of a response.
#[derive(Clone, Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }
}

/// Hook for request signing in the default HTTP transport.
///
/// Called once per request, after the URL is resolved and before the first
/// attempt; retries reuse the signed headers.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, method: &Method, url: &Url, headers: &mut HeaderMap, body: &[u8])
    -> Result<()>;
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct RetryConfig {
    pub(crate) max_attempts: u32,
    pub(crate) base_delay: Duration,
    pub(crate) max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Exponential backoff with full jitter, capped at `max_delay`.
pub(crate) fn backoff_delay(config: RetryConfig, attempt: u32) -> Duration {
    let attempt = attempt.saturating_sub(1);
    let factor = 1u32 << attempt.min(16);
    let millis = config
        .base_delay
        .as_millis()
        .saturating_mul(u128::from(factor));
    let capped = millis.min(config.max_delay.as_millis());

    Duration::from_millis(jitter_millis(capped) as u64)
}

fn jitter_millis(max_millis: u128) -> u128 {
    if max_millis <= 1 {
        return max_millis;
    }

    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::SystemTime::UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u128)
        .unwrap_or(0);

    nanos % max_millis
}
