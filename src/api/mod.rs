mod buckets;
pub(crate) mod request;
pub(crate) mod response;

pub use buckets::{
    BucketsService, CreateBucketRequest, DeleteBucketCorsRequest, DeleteBucketLoggingRequest,
    DeleteBucketRefererRequest, DeleteBucketRequest, DeleteBucketTagsRequest, GetBucketAclRequest,
    GetBucketCorsRequest, GetBucketInfoRequest, GetBucketLocationRequest, GetBucketLoggingRequest,
    GetBucketRefererRequest, GetBucketTagsRequest, ListBucketsRequest, PutBucketAclRequest,
    PutBucketCorsRequest, PutBucketLoggingRequest, PutBucketRefererRequest, PutBucketTagsRequest,
};
pub use request::{RequestDescriptor, RequestOptions, SubResource};
