use std::{collections::BTreeMap, time::Duration};

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::{error::Result, util};

/// Query sub-resources selecting a bucket facet (`?acl`, `?tagging=k1,k2`).
///
/// A bare name is the same as a mapping to the empty string.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubResource(BTreeMap<String, String>);

impl SubResource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Adds every entry of `other`, overwriting duplicate names.
    pub fn merge(&mut self, other: SubResource) {
        self.0.extend(other.0);
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::collections::btree_map::Iter<'_, String, String> {
        self.0.iter()
    }
}

impl From<&str> for SubResource {
    fn from(name: &str) -> Self {
        let mut sub = Self::new();
        if !name.is_empty() {
            sub.insert(name, "");
        }
        sub
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for SubResource {
    fn from((name, value): (K, V)) -> Self {
        let mut sub = Self::new();
        sub.insert(name, value);
        sub
    }
}

impl<'a> IntoIterator for &'a SubResource {
    type Item = (&'a String, &'a String);
    type IntoIter = std::collections::btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-call options passed through to the transport.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    pub(crate) timeout: Option<Duration>,
    pub(crate) cancellation: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

/// Everything a transport needs to perform one bucket-level call.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: Method,
    /// `None` for service-scoped calls such as listing buckets.
    pub bucket: Option<String>,
    pub subresource: SubResource,
    /// Plain query parameters. Never contains `subres`.
    pub query: BTreeMap<String, String>,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
    pub timeout: Option<Duration>,
    pub cancellation: Option<CancellationToken>,
    /// Statuses treated as success; anything else becomes `Error::RequestFailed`.
    pub expected_statuses: Vec<StatusCode>,
    /// Whether a successful body should be decoded as XML.
    pub xml_response: bool,
}

/// Builds the descriptor shared by every bucket operation.
///
/// Defaults to expecting `200 OK` with no body to decode.
pub(crate) fn bucket_request(
    method: Method,
    bucket: Option<&str>,
    subresource: impl Into<SubResource>,
    options: &RequestOptions,
) -> RequestDescriptor {
    RequestDescriptor {
        method,
        bucket: bucket.map(str::to_string),
        subresource: subresource.into(),
        query: BTreeMap::new(),
        headers: HeaderMap::new(),
        body: None,
        timeout: options.timeout,
        cancellation: options.cancellation.clone(),
        expected_statuses: vec![StatusCode::OK],
        xml_response: false,
    }
}

impl RequestDescriptor {
    /// Adds plain query parameters.
    ///
    /// A `subres` entry names an extra sub-resource and is merged into
    /// [`subresource`](Self::subresource) instead of being sent as-is.
    pub(crate) fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        for (key, value) in query {
            if key == "subres" {
                self.subresource.merge(SubResource::from(value.as_str()));
            } else {
                self.query.insert(key, value);
            }
        }
        self
    }

    pub(crate) fn with_subresource(mut self, subresource: SubResource) -> Self {
        self.subresource.merge(subresource);
        self
    }

    pub(crate) fn with_header(mut self, name: &'static str, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Attaches an XML body with its content type and Content-MD5.
    pub(crate) fn xml_body(mut self, body: Bytes) -> Result<Self> {
        self.headers.insert(
            http::header::CONTENT_TYPE,
            HeaderValue::from_static("application/xml"),
        );
        self.headers.insert(
            "content-md5",
            util::md5::content_md5_header_value(&body)?,
        );
        self.body = Some(body);
        Ok(self)
    }

    pub(crate) fn expect(mut self, statuses: &[StatusCode]) -> Self {
        self.expected_statuses = statuses.to_vec();
        self
    }

    pub(crate) fn xml_response(mut self) -> Self {
        self.xml_response = true;
        self
    }
}
