use std::{sync::Arc, time::Duration};

#[cfg(feature = "metrics")]
use std::time::Instant;

use futures_util::future::BoxFuture;
use http::{HeaderMap, StatusCode};
#[cfg(feature = "tracing")]
use tracing::Instrument as _;
use url::Url;

use crate::{
    api::RequestDescriptor,
    client::AddressingStyle,
    error::{Error, Result},
    transport::{RawResponse, RequestSigner, RetryConfig, Transport, backoff_delay},
    util,
};

/// Default [`Transport`] backed by `reqwest`.
pub(crate) struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
    addressing: AddressingStyle,
    retry: RetryConfig,
    signer: Option<Arc<dyn RequestSigner>>,
}

impl HttpTransport {
    pub(crate) fn new(
        endpoint: Url,
        addressing: AddressingStyle,
        retry: RetryConfig,
        user_agent: Option<String>,
        timeout: Option<Duration>,
        signer: Option<Arc<dyn RequestSigner>>,
    ) -> Result<Self> {
        #[cfg(feature = "rustls")]
        crate::transport::tls::ensure_rustls_crypto_provider();

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        builder = builder.user_agent(user_agent.unwrap_or_else(default_user_agent));
        let client = builder
            .build()
            .map_err(|e| Error::transport("failed to build HTTP client", Some(Box::new(e))))?;

        Ok(Self {
            client,
            endpoint,
            addressing,
            retry,
            signer,
        })
    }

    async fn send_with_retry(&self, request: &RequestDescriptor) -> Result<RawResponse> {
        let query = util::encode::query_string(request.subresource.iter(), &request.query);
        let url = util::url::resolve_url(
            &self.endpoint,
            request.bucket.as_deref(),
            &query,
            self.addressing,
        )?;

        let mut headers = request.headers.clone();
        if let Some(signer) = &self.signer {
            signer.sign(
                &request.method,
                &url,
                &mut headers,
                request.body.as_deref().unwrap_or_default(),
            )?;
        }

        let method = &request.method;
        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            #[cfg(feature = "metrics")]
            metrics::counter!("oss_http_attempts_total", "method" => method_label(method))
                .increment(1);
            #[cfg(feature = "metrics")]
            let start = Instant::now();

            let fut = self.attempt(request, url.clone(), headers.clone());
            #[cfg(feature = "tracing")]
            let fut = fut.instrument(tracing::debug_span!(
                "oss.http",
                method = %method,
                host = url.host_str().unwrap_or(""),
                path = url.path(),
                attempt,
            ));

            match fut.await {
                Ok(resp) => {
                    #[cfg(feature = "metrics")]
                    {
                        metrics::counter!(
                            "oss_http_responses_total",
                            "method" => method_label(method),
                            "class" => status_class(resp.status),
                        )
                        .increment(1);
                        metrics::histogram!(
                            "oss_http_request_duration_seconds",
                            "method" => method_label(method),
                        )
                        .record(start.elapsed().as_secs_f64());
                    }

                    if should_retry_status(resp.status) && attempt < max_attempts {
                        #[cfg(feature = "metrics")]
                        metrics::counter!(
                            "oss_http_retries_total",
                            "method" => method_label(method),
                            "reason" => "status"
                        )
                        .increment(1);
                        #[cfg(feature = "tracing")]
                        tracing::debug!(status = %resp.status, attempt, "retrying request");
                        tokio::time::sleep(retry_delay(self.retry, attempt, &resp)).await;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < max_attempts && should_retry_error(&err) {
                        #[cfg(feature = "metrics")]
                        metrics::counter!(
                            "oss_http_retries_total",
                            "method" => method_label(method),
                            "reason" => "transport"
                        )
                        .increment(1);
                        #[cfg(feature = "tracing")]
                        tracing::debug!(error = %err, attempt, "retrying request");
                        tokio::time::sleep(backoff_delay(self.retry, attempt)).await;
                        continue;
                    }
                    #[cfg(feature = "metrics")]
                    metrics::counter!(
                        "oss_http_errors_total",
                        "method" => method_label(method),
                        "kind" => "transport"
                    )
                    .increment(1);
                    let message = if err.is_timeout() {
                        "request timed out"
                    } else {
                        "request failed"
                    };
                    return Err(Error::transport(message, Some(Box::new(err))));
                }
            }
        }

        #[cfg(feature = "metrics")]
        metrics::counter!(
            "oss_http_errors_total",
            "method" => method_label(method),
            "kind" => "exhausted"
        )
        .increment(1);
        Err(Error::transport("request failed after retries", None))
    }

    async fn attempt(
        &self,
        request: &RequestDescriptor,
        url: Url,
        headers: HeaderMap,
    ) -> std::result::Result<RawResponse, reqwest::Error> {
        let mut req = self
            .client
            .request(request.method.clone(), url)
            .headers(headers);
        if let Some(body) = &request.body {
            req = req.body(body.clone());
        }
        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes().await?;
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: RequestDescriptor) -> BoxFuture<'_, Result<RawResponse>> {
        Box::pin(async move {
            match request.cancellation.clone() {
                Some(token) => tokio::select! {
                    biased;
                    _ = token.cancelled() => Err(Error::transport("request cancelled", None)),
                    result = self.send_with_retry(&request) => result,
                },
                None => self.send_with_retry(&request).await,
            }
        })
    }
}

fn retry_delay(config: RetryConfig, attempt: u32, resp: &RawResponse) -> Duration {
    if resp.status == StatusCode::TOO_MANY_REQUESTS
        && let Some(retry_after) = resp
            .headers
            .get(http::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
    {
        return Duration::from_secs(retry_after).min(config.max_delay);
    }
    backoff_delay(config, attempt)
}

fn should_retry_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_connect() || err.is_timeout() || err.is_request() || err.is_body()
}

#[cfg(feature = "metrics")]
fn status_class(status: StatusCode) -> &'static str {
    if status.is_informational() {
        "1xx"
    } else if status.is_success() {
        "2xx"
    } else if status.is_redirection() {
        "3xx"
    } else if status.is_client_error() {
        "4xx"
    } else if status.is_server_error() {
        "5xx"
    } else {
        "other"
    }
}

#[cfg(feature = "metrics")]
fn method_label(method: &http::Method) -> &'static str {
    match method.as_str() {
        "GET" => "GET",
        "PUT" => "PUT",
        "DELETE" => "DELETE",
        "POST" => "POST",
        _ => "OTHER",
    }
}

fn default_user_agent() -> String {
    format!("oss/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(test)]
mod tests {
    use http::HeaderValue;

    use super::*;

    #[test]
    fn retries_throttling_and_server_errors_only() {
        assert!(should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!should_retry_status(StatusCode::NOT_FOUND));
        assert!(!should_retry_status(StatusCode::NO_CONTENT));
    }

    #[test]
    fn retry_after_is_honored_up_to_the_cap() {
        let config = RetryConfig::default();
        let mut headers = HeaderMap::new();
        headers.insert(http::header::RETRY_AFTER, HeaderValue::from_static("1"));
        let resp = RawResponse::new(StatusCode::TOO_MANY_REQUESTS, headers, Vec::new());
        assert_eq!(retry_delay(config, 1, &resp), Duration::from_secs(1));

        let mut headers = HeaderMap::new();
        headers.insert(http::header::RETRY_AFTER, HeaderValue::from_static("60"));
        let resp = RawResponse::new(StatusCode::TOO_MANY_REQUESTS, headers, Vec::new());
        assert_eq!(retry_delay(config, 1, &resp), config.max_delay);
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits_the_request() {
        let transport = HttpTransport::new(
            Url::parse("http://127.0.0.1:9").unwrap(),
            AddressingStyle::Path,
            RetryConfig::default(),
            None,
            None,
            None,
        )
        .unwrap();

        let token = tokio_util::sync::CancellationToken::new();
        token.cancel();
        let options = crate::api::RequestOptions::default().cancellation(token);
        let request = crate::api::request::bucket_request(
            http::Method::GET,
            Some("my-bucket"),
            "acl",
            &options,
        );

        let err = transport.send(request).await.unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert_eq!(err.to_string(), "transport error: request cancelled");
    }
}
