use http::{HeaderMap, header::AsHeaderName};

pub(crate) const OSS_ACL: &str = "x-oss-acl";
pub(crate) const OSS_REQUEST_ID: &str = "x-oss-request-id";

pub(crate) fn header_string<N>(headers: &HeaderMap, name: N) -> Option<String>
where
    N: AsHeaderName,
{
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string())
}

/// Bucket name echoed back in a `Location: /bucket` header.
pub(crate) fn location_bucket(headers: &HeaderMap) -> Option<String> {
    header_string(headers, http::header::LOCATION)
        .map(|v| v.strip_prefix('/').map(str::to_string).unwrap_or(v))
        .filter(|v| !v.is_empty())
}
