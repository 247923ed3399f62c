use std::{fmt, sync::Arc, time::Duration};

#[cfg(feature = "tracing")]
use tracing::Instrument as _;
use url::Url;

use crate::{
    api::{self, RequestDescriptor, response::Response},
    error::{Error, Result},
    transport::{
        RequestSigner, RetryConfig, Transport, http_transport::HttpTransport,
    },
    util,
};

/// How the bucket name is placed in the request URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AddressingStyle {
    /// Virtual-hosted style unless the endpoint or bucket name rules it out.
    #[default]
    Auto,
    /// `https://endpoint/bucket/`
    Path,
    /// `https://bucket.endpoint/`
    VirtualHosted,
}

/// Bucket-level client.
///
/// Cloning is cheap; clones share the transport but each keeps its own
/// default bucket.
#[derive(Clone)]
pub struct Client {
    transport: Arc<dyn Transport>,
    bucket: Option<String>,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("bucket", &self.bucket)
            .finish_non_exhaustive()
    }
}

impl Client {
    pub fn builder(endpoint: impl AsRef<str>) -> Result<ClientBuilder> {
        ClientBuilder::new(endpoint.as_ref())
    }

    /// Wraps an existing transport with no default bucket.
    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            bucket: None,
        }
    }

    pub fn buckets(&self) -> api::BucketsService {
        api::BucketsService::new(self.clone())
    }

    /// Returns the default bucket, if one was set.
    pub fn bucket(&self) -> Option<&str> {
        self.bucket.as_deref()
    }

    /// Sets the default bucket used by operations that take no bucket name.
    pub fn set_bucket(&mut self, name: impl Into<String>) -> Result<&mut Self> {
        let name = name.into();
        util::bucket_name::check_bucket_name(&name)?;
        self.bucket = Some(name);
        Ok(self)
    }

    /// Owned form of [`set_bucket`](Self::set_bucket).
    pub fn use_bucket(mut self, name: impl Into<String>) -> Result<Self> {
        self.set_bucket(name)?;
        Ok(self)
    }

    pub(crate) async fn execute(&self, request: RequestDescriptor) -> Result<Response> {
        let expected = request.expected_statuses.clone();
        let xml_response = request.xml_response;

        #[cfg(feature = "tracing")]
        let span = tracing::info_span!(
            "oss.request",
            method = %request.method,
            bucket = request.bucket.as_deref().unwrap_or(""),
            subresource = ?request.subresource,
        );

        let fut = async move {
            let raw = self.transport.send(request).await?;
            api::response::check(raw, &expected, xml_response)
        };
        #[cfg(feature = "tracing")]
        let fut = fut.instrument(span);

        fut.await
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    endpoint: Url,
    addressing: AddressingStyle,
    retry: RetryConfig,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    signer: Option<Arc<dyn RequestSigner>>,
    transport: Option<Arc<dyn Transport>>,
    bucket: Option<String>,
}

impl ClientBuilder {
    fn new(endpoint: &str) -> Result<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|_| Error::invalid_argument("endpoint must be a valid absolute URL"))?;

        if endpoint.scheme() != "http" && endpoint.scheme() != "https" {
            return Err(Error::invalid_argument(
                "endpoint scheme must be http or https",
            ));
        }
        if endpoint.host_str().is_none() {
            return Err(Error::invalid_argument("endpoint must include host"));
        }
        if endpoint.query().is_some() || endpoint.fragment().is_some() {
            return Err(Error::invalid_argument(
                "endpoint must not include query or fragment",
            ));
        }
        if endpoint.path() != "/" && !endpoint.path().is_empty() {
            return Err(Error::invalid_argument("endpoint must not include a path"));
        }

        Ok(Self {
            endpoint,
            addressing: AddressingStyle::Auto,
            retry: RetryConfig::default(),
            timeout: None,
            user_agent: None,
            signer: None,
            transport: None,
            bucket: None,
        })
    }

    /// Reads `OSS_ENDPOINT` (required) and `OSS_BUCKET` (optional).
    pub fn from_env() -> Result<Self> {
        let endpoint = std::env::var("OSS_ENDPOINT")
            .map_err(|_| Error::invalid_argument("OSS_ENDPOINT is not set"))?;
        let mut builder = Self::new(&endpoint)?;
        if let Ok(bucket) = std::env::var("OSS_BUCKET")
            && !bucket.is_empty()
        {
            builder.bucket = Some(bucket);
        }
        Ok(builder)
    }

    pub fn addressing_style(mut self, style: AddressingStyle) -> Self {
        self.addressing = style;
        self
    }

    /// Client-wide timeout; per-call timeouts are set on each request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts.max(1);
        self
    }

    pub fn base_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.base_delay = delay;
        self
    }

    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.retry.max_delay = delay;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn signer(mut self, signer: Arc<dyn RequestSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Replaces the default HTTP transport. Endpoint, retry and signer
    /// settings are then up to the given transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Default bucket for operations called without an explicit name.
    pub fn bucket(mut self, name: impl Into<String>) -> Self {
        self.bucket = Some(name.into());
        self
    }

    pub fn build(self) -> Result<Client> {
        if let Some(bucket) = &self.bucket {
            util::bucket_name::check_bucket_name(bucket)?;
        }

        let transport: Arc<dyn Transport> = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::new(
                self.endpoint,
                self.addressing,
                self.retry,
                self.user_agent,
                self.timeout,
                self.signer,
            )?),
        };

        Ok(Client {
            transport,
            bucket: self.bucket,
        })
    }
}
