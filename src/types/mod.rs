//! Shared request and response types.

use std::collections::BTreeMap;

use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::normalize::OneOrMany;

/// Key/value tags attached to a bucket.
pub type TagSet = BTreeMap<String, String>;

/// Status line and headers of the response an output was built from.
#[derive(Clone, Debug)]
pub struct ResponseMeta {
    /// HTTP status returned by the service.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Service request id (`x-oss-request-id`), if provided.
    pub request_id: Option<String>,
}

/// Bucket owner metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Owner {
    /// Owner id, if provided.
    pub id: Option<String>,
    /// Owner display name, if provided.
    pub display_name: Option<String>,
}

/// Output from listing buckets.
#[derive(Debug)]
pub struct ListBucketsOutput {
    /// Buckets returned in the response; `None` when the response carried no
    /// `<Buckets>` element at all.
    pub buckets: Option<Vec<Bucket>>,
    /// Owner of the listed buckets.
    pub owner: Owner,
    /// Whether more buckets are available past `next_marker`.
    pub is_truncated: bool,
    /// Marker to resume listing from, if truncated.
    pub next_marker: Option<String>,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Bucket listing entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bucket {
    /// Bucket name.
    pub name: String,
    /// Region (`Location`), if provided.
    pub region: Option<String>,
    /// Creation date, if provided.
    pub creation_date: Option<String>,
    /// Storage class, if provided.
    ///
    /// Listings carry this once as `StorageClass`; there is no separate
    /// capitalized duplicate on this type.
    pub storage_class: Option<String>,
    /// Tags reported with the entry.
    pub tag: TagSet,
}

/// Output from a get bucket location request.
#[derive(Debug)]
pub struct GetBucketLocationOutput {
    /// Region the bucket lives in, e.g. `oss-cn-hangzhou`.
    pub location: String,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a get bucket info request.
///
/// The info document is large and service-specific, so it is returned as
/// the decoded XML tree rooted at `<Bucket>`.
#[derive(Debug)]
pub struct GetBucketInfoOutput {
    /// Decoded `<Bucket>` element.
    pub bucket: Value,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a create bucket request.
#[derive(Debug)]
pub struct CreateBucketOutput {
    /// Bucket name echoed in the `Location` header.
    pub bucket: Option<String>,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a delete bucket request.
#[derive(Debug)]
pub struct DeleteBucketOutput {
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Canned bucket ACL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BucketAcl {
    /// Only the owner may read or write.
    Private,
    /// Anyone may read.
    PublicRead,
    /// Anyone may read or write.
    PublicReadWrite,
    /// Value not known to this client.
    Other(String),
}

impl BucketAcl {
    /// Returns the wire value for this ACL.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Private => "private",
            Self::PublicRead => "public-read",
            Self::PublicReadWrite => "public-read-write",
            Self::Other(v) => v.as_str(),
        }
    }

    pub(crate) fn parse(value: String) -> Self {
        match value.as_str() {
            "private" => Self::Private,
            "public-read" => Self::PublicRead,
            "public-read-write" => Self::PublicReadWrite,
            _ => Self::Other(value),
        }
    }
}

/// Output from a put bucket ACL request.
#[derive(Debug)]
pub struct PutBucketAclOutput {
    /// Bucket name echoed in the `Location` header.
    pub bucket: Option<String>,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a get bucket ACL request.
#[derive(Debug)]
pub struct GetBucketAclOutput {
    /// Grants on the bucket.
    pub acl: Vec<BucketAcl>,
    /// Bucket owner.
    pub owner: Owner,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from enabling bucket access logging.
#[derive(Debug)]
pub struct PutBucketLoggingOutput {
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a get bucket logging request.
#[derive(Debug)]
pub struct GetBucketLoggingOutput {
    /// Whether access logging is enabled.
    pub enable: bool,
    /// Log object prefix, if configured.
    pub prefix: Option<String>,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from disabling bucket access logging.
#[derive(Debug)]
pub struct DeleteBucketLoggingOutput {
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Bucket CORS rule.
///
/// Field names follow the service's element names with a lowercase first
/// letter, so a rule echoed by [`get_cors`](crate::api::BucketsService::get_cors)
/// maps onto the same shape it was written with. Elements this client does
/// not model are kept in [`extra`](Self::extra) under their lowercased names
/// and are not written back by `put_cors`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorsRule {
    /// Allowed origins. Must not be empty.
    #[serde(default, deserialize_with = "one_or_many")]
    pub allowed_origin: Vec<String>,
    /// Allowed methods. Must not be empty.
    #[serde(default, deserialize_with = "one_or_many")]
    pub allowed_method: Vec<String>,
    /// Allowed request headers.
    #[serde(default, deserialize_with = "one_or_many")]
    pub allowed_header: Vec<String>,
    /// Response headers exposed to the browser.
    #[serde(default, deserialize_with = "one_or_many")]
    pub expose_header: Vec<String>,
    /// Preflight cache time in seconds.
    #[serde(default, deserialize_with = "optional_u32")]
    pub max_age_seconds: Option<u32>,
    /// Any other rule element returned by the service.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl CorsRule {
    /// Creates a rule from its required origin and method lists.
    ///
    /// Each argument may be a single string or a list of strings.
    pub fn new(allowed_origin: impl Into<OneOrMany>, allowed_method: impl Into<OneOrMany>) -> Self {
        Self {
            allowed_origin: allowed_origin.into().into_vec(),
            allowed_method: allowed_method.into().into_vec(),
            ..Self::default()
        }
    }

    /// Sets the allowed request headers.
    pub fn allowed_header(mut self, value: impl Into<OneOrMany>) -> Self {
        self.allowed_header = value.into().into_vec();
        self
    }

    /// Sets the exposed response headers.
    pub fn expose_header(mut self, value: impl Into<OneOrMany>) -> Self {
        self.expose_header = value.into().into_vec();
        self
    }

    /// Sets the preflight cache time.
    pub fn max_age_seconds(mut self, value: u32) -> Self {
        self.max_age_seconds = Some(value);
        self
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    OneOrMany::deserialize(deserializer).map(OneOrMany::into_vec)
}

fn optional_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom("MaxAgeSeconds out of range")),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .trim()
            .parse::<u32>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "unexpected MaxAgeSeconds value: {other}"
        ))),
    }
}

/// Output from updating bucket CORS rules.
#[derive(Debug)]
pub struct PutBucketCorsOutput {
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a get bucket CORS request.
#[derive(Debug)]
pub struct GetBucketCorsOutput {
    /// CORS rules; empty when none are configured.
    pub rules: Vec<CorsRule>,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from deleting bucket CORS rules.
#[derive(Debug)]
pub struct DeleteBucketCorsOutput {
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from updating the bucket referer policy.
#[derive(Debug)]
pub struct PutBucketRefererOutput {
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from resetting the bucket referer policy.
pub type DeleteBucketRefererOutput = PutBucketRefererOutput;

/// Output from a get bucket referer request.
#[derive(Debug)]
pub struct GetBucketRefererOutput {
    /// Whether requests without a `Referer` header are allowed.
    pub allow_empty: bool,
    /// Allowed referers; `None` when the list is empty.
    pub referers: Option<Vec<String>>,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a put bucket tags request.
#[derive(Debug)]
pub struct PutBucketTagsOutput {
    /// HTTP status returned by the service.
    pub status: StatusCode,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a get bucket tags request.
#[derive(Debug)]
pub struct GetBucketTagsOutput {
    /// Tags attached to the bucket.
    pub tag: TagSet,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Output from a delete bucket tags request.
#[derive(Debug)]
pub struct DeleteBucketTagsOutput {
    /// HTTP status returned by the service.
    pub status: StatusCode,
    /// Raw response metadata.
    pub res: ResponseMeta,
}

/// Storage class for new buckets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StorageClass {
    /// Standard storage.
    Standard,
    /// Infrequent access.
    InfrequentAccess,
    /// Archive storage.
    Archive,
    /// Cold archive storage.
    ColdArchive,
    /// Custom class.
    Other(String),
}

impl StorageClass {
    /// Returns the wire value for this storage class.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => "Standard",
            Self::InfrequentAccess => "IA",
            Self::Archive => "Archive",
            Self::ColdArchive => "ColdArchive",
            Self::Other(v) => v.as_str(),
        }
    }
}

/// Data redundancy type for new buckets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataRedundancyType {
    /// Locally redundant storage.
    Lrs,
    /// Zone-redundant storage.
    Zrs,
    /// Custom type.
    Other(String),
}

impl DataRedundancyType {
    /// Returns the wire value for this redundancy type.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Lrs => "LRS",
            Self::Zrs => "ZRS",
            Self::Other(v) => v.as_str(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct XmlError {
    #[serde(rename = "Code")]
    pub(crate) code: Option<String>,
    #[serde(rename = "Message")]
    pub(crate) message: Option<String>,
    #[serde(rename = "RequestId")]
    pub(crate) request_id: Option<String>,
    #[serde(rename = "HostId")]
    pub(crate) host_id: Option<String>,
}
