use std::{collections::BTreeMap, time::Duration};

use http::{HeaderValue, Method, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::{
    api::{
        RequestDescriptor, RequestOptions, SubResource,
        request::bucket_request,
        response,
    },
    client::Client,
    error::{Error, Result},
    types::{
        BucketAcl, CorsRule, CreateBucketOutput, DataRedundancyType, DeleteBucketCorsOutput,
        DeleteBucketLoggingOutput, DeleteBucketOutput, DeleteBucketRefererOutput,
        DeleteBucketTagsOutput, GetBucketAclOutput, GetBucketCorsOutput, GetBucketInfoOutput,
        GetBucketLocationOutput, GetBucketLoggingOutput, GetBucketRefererOutput,
        GetBucketTagsOutput, ListBucketsOutput, PutBucketAclOutput, PutBucketCorsOutput,
        PutBucketLoggingOutput, PutBucketRefererOutput, PutBucketTagsOutput, StorageClass, TagSet,
    },
    util::{
        self,
        bucket_name::{check_bucket_name, check_new_bucket_name},
        headers::OSS_ACL,
    },
};

const MAX_TAGS: usize = 20;
const MAX_TAG_KEY_LEN: usize = 64;
const MAX_TAG_VALUE_LEN: usize = 128;

/// Bucket-level operations.
///
/// Every operation takes the bucket name explicitly and validates it before
/// anything is sent. Use [`default_bucket`](Self::default_bucket) to pick up
/// the client's default.
#[derive(Clone)]
pub struct BucketsService {
    client: Client,
}

impl BucketsService {
    pub(crate) fn new(client: Client) -> Self {
        Self { client }
    }

    /// The client's default bucket.
    pub fn default_bucket(&self) -> Result<String> {
        self.client
            .bucket()
            .map(str::to_string)
            .ok_or_else(|| Error::invalid_argument("no default bucket is set on the client"))
    }

    pub fn list(&self) -> ListBucketsRequest {
        ListBucketsRequest {
            client: self.client.clone(),
            query: BTreeMap::new(),
            subresource: SubResource::new(),
            options: RequestOptions::default(),
        }
    }

    pub fn get_location(&self, bucket: impl Into<String>) -> GetBucketLocationRequest {
        GetBucketLocationRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn get_info(&self, bucket: impl Into<String>) -> GetBucketInfoRequest {
        GetBucketInfoRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn create(&self, bucket: impl Into<String>) -> CreateBucketRequest {
        CreateBucketRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            acl: None,
            storage_class: None,
            data_redundancy_type: None,
            options: RequestOptions::default(),
        }
    }

    pub fn delete(&self, bucket: impl Into<String>) -> DeleteBucketRequest {
        DeleteBucketRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn put_acl(&self, bucket: impl Into<String>, acl: BucketAcl) -> PutBucketAclRequest {
        PutBucketAclRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            acl,
            options: RequestOptions::default(),
        }
    }

    pub fn get_acl(&self, bucket: impl Into<String>) -> GetBucketAclRequest {
        GetBucketAclRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    /// Enables access logging, written into the bucket itself unless
    /// [`target_bucket`](PutBucketLoggingRequest::target_bucket) is set.
    pub fn put_logging(&self, bucket: impl Into<String>) -> PutBucketLoggingRequest {
        PutBucketLoggingRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            target_bucket: None,
            prefix: None,
            options: RequestOptions::default(),
        }
    }

    pub fn get_logging(&self, bucket: impl Into<String>) -> GetBucketLoggingRequest {
        GetBucketLoggingRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn delete_logging(&self, bucket: impl Into<String>) -> DeleteBucketLoggingRequest {
        DeleteBucketLoggingRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn put_cors(&self, bucket: impl Into<String>, rules: Vec<CorsRule>) -> PutBucketCorsRequest {
        PutBucketCorsRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            rules,
            options: RequestOptions::default(),
        }
    }

    pub fn get_cors(&self, bucket: impl Into<String>) -> GetBucketCorsRequest {
        GetBucketCorsRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn delete_cors(&self, bucket: impl Into<String>) -> DeleteBucketCorsRequest {
        DeleteBucketCorsRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    pub fn put_referer(
        &self,
        bucket: impl Into<String>,
        allow_empty: bool,
    ) -> PutBucketRefererRequest {
        PutBucketRefererRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            allow_empty,
            referers: None,
            options: RequestOptions::default(),
        }
    }

    pub fn get_referer(&self, bucket: impl Into<String>) -> GetBucketRefererRequest {
        GetBucketRefererRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    /// Resets the referer policy: empty referers allowed, no list.
    pub fn delete_referer(&self, bucket: impl Into<String>) -> DeleteBucketRefererRequest {
        DeleteBucketRefererRequest {
            inner: self.put_referer(bucket, true),
        }
    }

    pub fn put_tags(&self, bucket: impl Into<String>, tags: TagSet) -> PutBucketTagsRequest {
        PutBucketTagsRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            tags,
            options: RequestOptions::default(),
        }
    }

    pub fn get_tags(&self, bucket: impl Into<String>) -> GetBucketTagsRequest {
        GetBucketTagsRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            options: RequestOptions::default(),
        }
    }

    /// Deletes all tags, or only [`keys`](DeleteBucketTagsRequest::keys).
    pub fn delete_tags(&self, bucket: impl Into<String>) -> DeleteBucketTagsRequest {
        DeleteBucketTagsRequest {
            client: self.client.clone(),
            bucket: bucket.into(),
            keys: None,
            options: RequestOptions::default(),
        }
    }
}

macro_rules! request_options {
    ($($request:ty),+ $(,)?) => {$(
        impl $request {
            /// Per-call timeout passed to the transport.
            pub fn timeout(mut self, timeout: Duration) -> Self {
                self.options = self.options.timeout(timeout);
                self
            }

            /// Aborts the call with a transport error once `token` is cancelled.
            pub fn cancellation(mut self, token: CancellationToken) -> Self {
                self.options = self.options.cancellation(token);
                self
            }
        }
    )+};
}

request_options!(
    ListBucketsRequest,
    GetBucketLocationRequest,
    GetBucketInfoRequest,
    CreateBucketRequest,
    DeleteBucketRequest,
    PutBucketAclRequest,
    GetBucketAclRequest,
    PutBucketLoggingRequest,
    GetBucketLoggingRequest,
    DeleteBucketLoggingRequest,
    PutBucketCorsRequest,
    GetBucketCorsRequest,
    DeleteBucketCorsRequest,
    PutBucketRefererRequest,
    GetBucketRefererRequest,
    PutBucketTagsRequest,
    GetBucketTagsRequest,
    DeleteBucketTagsRequest,
);

pub struct ListBucketsRequest {
    client: Client,
    query: BTreeMap<String, String>,
    subresource: SubResource,
    options: RequestOptions,
}

impl ListBucketsRequest {
    pub fn prefix(self, prefix: impl Into<String>) -> Self {
        self.param("prefix", prefix)
    }

    pub fn marker(self, marker: impl Into<String>) -> Self {
        self.param("marker", marker)
    }

    pub fn max_keys(self, max_keys: u32) -> Self {
        self.param("max-keys", max_keys.to_string())
    }

    /// Adds a raw query parameter. The key `subres` names an extra
    /// sub-resource rather than a parameter.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    pub fn subresource(mut self, subresource: impl Into<SubResource>) -> Self {
        self.subresource.merge(subresource.into());
        self
    }

    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        Ok(bucket_request(Method::GET, None, SubResource::new(), &self.options)
            .with_subresource(self.subresource.clone())
            .with_query(self.query.clone())
            .xml_response())
    }

    pub async fn send(self) -> Result<ListBucketsOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::list_buckets(resp)
    }
}

pub struct GetBucketLocationRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl GetBucketLocationRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::GET, Some(self.bucket.as_str()), "location", &self.options)
                .xml_response(),
        )
    }

    pub async fn send(self) -> Result<GetBucketLocationOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::bucket_location(resp)
    }
}

pub struct GetBucketInfoRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl GetBucketInfoRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::GET, Some(self.bucket.as_str()), "bucketInfo", &self.options)
                .xml_response(),
        )
    }

    pub async fn send(self) -> Result<GetBucketInfoOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::bucket_info(resp)
    }
}

pub struct CreateBucketRequest {
    client: Client,
    bucket: String,
    acl: Option<BucketAcl>,
    storage_class: Option<StorageClass>,
    data_redundancy_type: Option<DataRedundancyType>,
    options: RequestOptions,
}

impl CreateBucketRequest {
    pub fn acl(mut self, acl: BucketAcl) -> Self {
        self.acl = Some(acl);
        self
    }

    pub fn storage_class(mut self, storage_class: StorageClass) -> Self {
        self.storage_class = Some(storage_class);
        self
    }

    pub fn data_redundancy_type(mut self, value: DataRedundancyType) -> Self {
        self.data_redundancy_type = Some(value);
        self
    }

    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_new_bucket_name(&self.bucket)?;
        let mut request = bucket_request(Method::PUT, Some(self.bucket.as_str()), "", &self.options);
        if let Some(acl) = &self.acl {
            request = request.with_header(OSS_ACL, acl_header(acl)?);
        }
        if self.storage_class.is_some() || self.data_redundancy_type.is_some() {
            request = request.xml_body(util::xml::encode_create_bucket_configuration(
                self.storage_class.as_ref(),
                self.data_redundancy_type.as_ref(),
            )?)?;
        }
        Ok(request)
    }

    pub async fn send(self) -> Result<CreateBucketOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(CreateBucketOutput {
            bucket: util::headers::location_bucket(&resp.headers),
            res: resp.meta(),
        })
    }
}

pub struct DeleteBucketRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl DeleteBucketRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::DELETE, Some(self.bucket.as_str()), "", &self.options)
                .expect(&[StatusCode::OK, StatusCode::NO_CONTENT]),
        )
    }

    pub async fn send(self) -> Result<DeleteBucketOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(DeleteBucketOutput { res: resp.meta() })
    }
}

pub struct PutBucketAclRequest {
    client: Client,
    bucket: String,
    acl: BucketAcl,
    options: RequestOptions,
}

impl PutBucketAclRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::PUT, Some(self.bucket.as_str()), "acl", &self.options)
                .with_header(OSS_ACL, acl_header(&self.acl)?),
        )
    }

    pub async fn send(self) -> Result<PutBucketAclOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(PutBucketAclOutput {
            bucket: util::headers::location_bucket(&resp.headers),
            res: resp.meta(),
        })
    }
}

fn acl_header(acl: &BucketAcl) -> Result<HeaderValue> {
    HeaderValue::from_str(acl.as_str())
        .map_err(|_| Error::invalid_argument(format!("invalid acl value {:?}", acl.as_str())))
}

pub struct GetBucketAclRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl GetBucketAclRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(bucket_request(Method::GET, Some(self.bucket.as_str()), "acl", &self.options).xml_response())
    }

    pub async fn send(self) -> Result<GetBucketAclOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::bucket_acl(resp)
    }
}

pub struct PutBucketLoggingRequest {
    client: Client,
    bucket: String,
    target_bucket: Option<String>,
    prefix: Option<String>,
    options: RequestOptions,
}

impl PutBucketLoggingRequest {
    /// Key prefix for log objects. An empty prefix is omitted.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn target_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.target_bucket = Some(bucket.into());
        self
    }

    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        let target = self.target_bucket.as_deref().unwrap_or(&self.bucket);
        check_bucket_name(target)?;

        bucket_request(Method::PUT, Some(self.bucket.as_str()), "logging", &self.options)
            .xml_body(util::xml::encode_bucket_logging(
                target,
                self.prefix.as_deref(),
            )?)
    }

    pub async fn send(self) -> Result<PutBucketLoggingOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(PutBucketLoggingOutput { res: resp.meta() })
    }
}

pub struct GetBucketLoggingRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl GetBucketLoggingRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::GET, Some(self.bucket.as_str()), "logging", &self.options)
                .xml_response(),
        )
    }

    pub async fn send(self) -> Result<GetBucketLoggingOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::bucket_logging(resp)
    }
}

pub struct DeleteBucketLoggingRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl DeleteBucketLoggingRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::DELETE, Some(self.bucket.as_str()), "logging", &self.options)
                .expect(&[StatusCode::NO_CONTENT, StatusCode::OK]),
        )
    }

    pub async fn send(self) -> Result<DeleteBucketLoggingOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(DeleteBucketLoggingOutput { res: resp.meta() })
    }
}

pub struct PutBucketCorsRequest {
    client: Client,
    bucket: String,
    rules: Vec<CorsRule>,
    options: RequestOptions,
}

impl PutBucketCorsRequest {
    pub fn rule(mut self, rule: CorsRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        bucket_request(Method::PUT, Some(self.bucket.as_str()), "cors", &self.options)
            .xml_body(util::xml::encode_bucket_cors(&self.rules)?)
    }

    pub async fn send(self) -> Result<PutBucketCorsOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(PutBucketCorsOutput { res: resp.meta() })
    }
}

pub struct GetBucketCorsRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl GetBucketCorsRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(bucket_request(Method::GET, Some(self.bucket.as_str()), "cors", &self.options).xml_response())
    }

    pub async fn send(self) -> Result<GetBucketCorsOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::bucket_cors(resp)
    }
}

pub struct DeleteBucketCorsRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl DeleteBucketCorsRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::DELETE, Some(self.bucket.as_str()), "cors", &self.options)
                .expect(&[StatusCode::NO_CONTENT]),
        )
    }

    pub async fn send(self) -> Result<DeleteBucketCorsOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(DeleteBucketCorsOutput { res: resp.meta() })
    }
}

pub struct PutBucketRefererRequest {
    client: Client,
    bucket: String,
    allow_empty: bool,
    referers: Option<Vec<String>>,
    options: RequestOptions,
}

impl PutBucketRefererRequest {
    /// Allowed referers; `*` and `?` wildcards are interpreted by the service.
    pub fn referers<I, S>(mut self, referers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.referers = Some(referers.into_iter().map(Into::into).collect());
        self
    }

    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        bucket_request(Method::PUT, Some(self.bucket.as_str()), "referer", &self.options).xml_body(
            util::xml::encode_bucket_referer(self.allow_empty, self.referers.as_deref())?,
        )
    }

    pub async fn send(self) -> Result<PutBucketRefererOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(PutBucketRefererOutput { res: resp.meta() })
    }
}

pub struct GetBucketRefererRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl GetBucketRefererRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::GET, Some(self.bucket.as_str()), "referer", &self.options)
                .xml_response(),
        )
    }

    pub async fn send(self) -> Result<GetBucketRefererOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::bucket_referer(resp)
    }
}

/// A [`PutBucketRefererRequest`] fixed to `allow_empty = true` and no list.
pub struct DeleteBucketRefererRequest {
    inner: PutBucketRefererRequest,
}

impl DeleteBucketRefererRequest {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.inner = self.inner.timeout(timeout);
        self
    }

    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.inner = self.inner.cancellation(token);
        self
    }

    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        self.inner.descriptor()
    }

    pub async fn send(self) -> Result<DeleteBucketRefererOutput> {
        self.inner.send().await
    }
}

pub struct PutBucketTagsRequest {
    client: Client,
    bucket: String,
    tags: TagSet,
    options: RequestOptions,
}

impl PutBucketTagsRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        check_tags(&self.tags)?;
        bucket_request(Method::PUT, Some(self.bucket.as_str()), "tagging", &self.options)
            .xml_body(util::xml::encode_bucket_tagging(&self.tags)?)
    }

    pub async fn send(self) -> Result<PutBucketTagsOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(PutBucketTagsOutput {
            status: resp.status,
            res: resp.meta(),
        })
    }
}

fn check_tags(tags: &TagSet) -> Result<()> {
    if tags.is_empty() {
        return Err(Error::invalid_argument("tags must not be empty"));
    }
    if tags.len() > MAX_TAGS {
        return Err(Error::invalid_argument(format!(
            "a bucket can have at most {MAX_TAGS} tags"
        )));
    }
    for (key, value) in tags {
        let key_len = key.chars().count();
        if key_len == 0 || key_len > MAX_TAG_KEY_LEN {
            return Err(Error::invalid_argument(format!(
                "tag key {key:?} must be 1-{MAX_TAG_KEY_LEN} characters"
            )));
        }
        if value.chars().count() > MAX_TAG_VALUE_LEN {
            return Err(Error::invalid_argument(format!(
                "tag value for {key:?} must be at most {MAX_TAG_VALUE_LEN} characters"
            )));
        }
    }
    Ok(())
}

pub struct GetBucketTagsRequest {
    client: Client,
    bucket: String,
    options: RequestOptions,
}

impl GetBucketTagsRequest {
    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        Ok(
            bucket_request(Method::GET, Some(self.bucket.as_str()), "tagging", &self.options)
                .xml_response(),
        )
    }

    pub async fn send(self) -> Result<GetBucketTagsOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        response::bucket_tags(resp)
    }
}

pub struct DeleteBucketTagsRequest {
    client: Client,
    bucket: String,
    keys: Option<Vec<String>>,
    options: RequestOptions,
}

impl DeleteBucketTagsRequest {
    /// Deletes only these tag keys instead of the whole tag set.
    ///
    /// An empty list is rejected with [`Error::InvalidArgument`] rather than
    /// falling back to deleting every tag; leave `keys` unset for that.
    pub fn keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys = Some(keys.into_iter().map(Into::into).collect());
        self
    }

    pub fn descriptor(&self) -> Result<RequestDescriptor> {
        check_bucket_name(&self.bucket)?;
        let subresource = match &self.keys {
            Some(keys) if keys.is_empty() => {
                return Err(Error::invalid_argument("tag keys must not be empty"));
            }
            Some(keys) => SubResource::from(("tagging", keys.join(","))),
            None => SubResource::from("tagging"),
        };

        Ok(
            bucket_request(Method::DELETE, Some(self.bucket.as_str()), subresource, &self.options)
                .expect(&[StatusCode::NO_CONTENT]),
        )
    }

    pub async fn send(self) -> Result<DeleteBucketTagsOutput> {
        let resp = self.client.execute(self.descriptor()?).await?;
        Ok(DeleteBucketTagsOutput {
            status: resp.status,
            res: resp.meta(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> BucketsService {
        Client::builder("https://oss-cn-hangzhou.aliyuncs.com")
            .unwrap()
            .build()
            .unwrap()
            .buckets()
    }

    #[test]
    fn delete_tags_with_keys_joins_them() {
        let desc = service()
            .delete_tags("my-bucket")
            .keys(["k1", "k2"])
            .descriptor()
            .unwrap();
        assert_eq!(desc.method, Method::DELETE);
        assert_eq!(desc.subresource.get("tagging"), Some("k1,k2"));
        assert_eq!(desc.expected_statuses, vec![StatusCode::NO_CONTENT]);

        let all = service().delete_tags("my-bucket").descriptor().unwrap();
        assert_eq!(all.subresource.get("tagging"), Some(""));

        let err = service()
            .delete_tags("my-bucket")
            .keys(Vec::<String>::new())
            .descriptor()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn delete_referer_matches_put_referer_reset() {
        let svc = service();
        let deleted = svc.delete_referer("my-bucket").descriptor().unwrap();
        let reset = svc.put_referer("my-bucket", true).descriptor().unwrap();
        assert_eq!(deleted.method, reset.method);
        assert_eq!(deleted.subresource, reset.subresource);
        assert_eq!(deleted.headers, reset.headers);
        assert_eq!(deleted.body, reset.body);
        assert_eq!(deleted.expected_statuses, reset.expected_statuses);
    }

    #[test]
    fn logging_targets_the_bucket_by_default() {
        let desc = service()
            .put_logging("my-bucket")
            .prefix("logs/")
            .descriptor()
            .unwrap();
        let body = String::from_utf8(desc.body.unwrap().to_vec()).unwrap();
        assert!(body.contains("<TargetBucket>my-bucket</TargetBucket>"));
        assert!(body.contains("<TargetPrefix>logs/</TargetPrefix>"));

        let desc = service()
            .put_logging("my-bucket")
            .target_bucket("log-sink")
            .descriptor()
            .unwrap();
        let body = String::from_utf8(desc.body.unwrap().to_vec()).unwrap();
        assert!(body.contains("<TargetBucket>log-sink</TargetBucket>"));
        assert!(!body.contains("TargetPrefix"));
    }

    #[test]
    fn list_query_keeps_subres_out_of_params() {
        let desc = service()
            .list()
            .prefix("logs-")
            .max_keys(10)
            .param("subres", "regionList")
            .descriptor()
            .unwrap();
        assert_eq!(desc.bucket, None);
        assert_eq!(desc.query.get("max-keys").map(String::as_str), Some("10"));
        assert!(!desc.query.contains_key("subres"));
        assert_eq!(desc.subresource.get("regionList"), Some(""));
        assert!(desc.xml_response);
    }

    #[test]
    fn create_sets_acl_header_and_configuration() {
        let desc = service()
            .create("new-bucket")
            .acl(BucketAcl::PublicRead)
            .storage_class(StorageClass::Archive)
            .descriptor()
            .unwrap();
        assert_eq!(desc.headers.get(OSS_ACL).unwrap(), "public-read");
        assert!(desc.headers.contains_key("content-md5"));
        let body = String::from_utf8(desc.body.unwrap().to_vec()).unwrap();
        assert!(body.contains("<StorageClass>Archive</StorageClass>"));

        let plain = service().create("new-bucket").descriptor().unwrap();
        assert!(plain.body.is_none());

        assert!(service().create("new_bucket").descriptor().is_err());
    }

    #[test]
    fn tag_limits_are_enforced() {
        let too_many: TagSet = (0..=MAX_TAGS)
            .map(|i| (format!("k{i}"), "v".to_string()))
            .collect();
        assert!(check_tags(&too_many).is_err());
        assert!(check_tags(&TagSet::new()).is_err());

        let long_key = TagSet::from([("k".repeat(65), "v".to_string())]);
        assert!(check_tags(&long_key).is_err());
        let long_value = TagSet::from([("k".to_string(), "v".repeat(129))]);
        assert!(check_tags(&long_value).is_err());

        let ok = TagSet::from([("env".to_string(), String::new())]);
        assert!(check_tags(&ok).is_ok());
    }

    #[test]
    fn default_bucket_requires_client_setting() {
        assert!(service().default_bucket().is_err());

        let client = Client::builder("https://oss-cn-hangzhou.aliyuncs.com")
            .unwrap()
            .bucket("photos")
            .build()
            .unwrap();
        assert_eq!(client.buckets().default_bucket().unwrap(), "photos");
    }
}
