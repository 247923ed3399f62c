use http::{HeaderMap, StatusCode};
use serde_json::Value;

use crate::{
    error::{Error, Result},
    normalize::{list_or_empty, lower_first_keys, non_empty_text, one_or_many, text},
    transport::RawResponse,
    types::{
        Bucket, BucketAcl, CorsRule, GetBucketAclOutput, GetBucketCorsOutput,
        GetBucketInfoOutput, GetBucketLocationOutput, GetBucketLoggingOutput,
        GetBucketRefererOutput, GetBucketTagsOutput, ListBucketsOutput, Owner, ResponseMeta,
        TagSet,
    },
    util::{self, headers::OSS_REQUEST_ID},
};

const BODY_SNIPPET_LIMIT: usize = 4096;

/// A response whose status matched the operation's expected set.
#[derive(Debug)]
pub(crate) struct Response {
    pub(crate) status: StatusCode,
    pub(crate) headers: HeaderMap,
    /// Decoded XML tree, or `Null` when the operation has no XML response.
    pub(crate) data: Value,
}

impl Response {
    pub(crate) fn meta(&self) -> ResponseMeta {
        ResponseMeta {
            status: self.status,
            headers: self.headers.clone(),
            request_id: util::headers::header_string(&self.headers, OSS_REQUEST_ID),
        }
    }
}

/// Checks the status against the expected set and decodes the body if asked to.
pub(crate) fn check(
    raw: RawResponse,
    expected_statuses: &[StatusCode],
    xml_response: bool,
) -> Result<Response> {
    if !expected_statuses.contains(&raw.status) {
        return Err(request_failed(raw));
    }

    let data = if xml_response {
        let body = std::str::from_utf8(&raw.body)
            .map_err(|e| Error::decode("response body is not UTF-8", Some(Box::new(e))))?;
        util::xml::parse_xml(body)?
    } else {
        Value::Null
    };

    Ok(Response {
        status: raw.status,
        headers: raw.headers,
        data,
    })
}

/// Builds the error for a response outside the expected statuses.
pub(crate) fn request_failed(raw: RawResponse) -> Error {
    let body = String::from_utf8_lossy(&raw.body);
    let header_request_id = util::headers::header_string(&raw.headers, OSS_REQUEST_ID);
    let parsed = util::xml::parse_error_xml(&body).unwrap_or_default();
    let body_snippet = (!body.is_empty()).then(|| snippet(&body, BODY_SNIPPET_LIMIT));

    Error::RequestFailed {
        status: raw.status,
        code: parsed.code,
        message: parsed.message,
        request_id: parsed.request_id.or(header_request_id),
        host_id: parsed.host_id,
        headers: raw.headers,
        body_snippet,
    }
}

fn snippet(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

// An empty element decodes to "" and reads the same as a missing one.
fn present(value: Option<&Value>) -> Option<Value> {
    match value? {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(other.clone()),
    }
}

fn owner(value: Option<&Value>) -> Owner {
    Owner {
        id: text(value.and_then(|v| v.get("ID"))),
        display_name: text(value.and_then(|v| v.get("DisplayName"))),
    }
}

/// Collects `Key`/`Value` pairs from `Tagging.TagSet.Tag`, `TagSet.Tag` or `Tag`.
pub(crate) fn format_tag(node: &Value) -> TagSet {
    let tags = node
        .pointer("/Tagging/TagSet/Tag")
        .or_else(|| node.pointer("/TagSet/Tag"))
        .or_else(|| node.get("Tag"));

    list_or_empty(present(tags))
        .iter()
        .filter_map(|tag| {
            let key = text(tag.get("Key"))?;
            Some((key, text(tag.get("Value")).unwrap_or_default()))
        })
        .collect()
}

pub(crate) fn list_buckets(resp: Response) -> Result<ListBucketsOutput> {
    let res = resp.meta();
    let data = &resp.data;

    let buckets = match present(data.get("Buckets")) {
        Some(node) => {
            let entries = match node.get("Bucket") {
                Some(inner) => present(Some(inner)),
                None => Some(node),
            };
            Some(
                list_or_empty(entries)
                    .iter()
                    .map(bucket_entry)
                    .collect::<Result<Vec<_>>>()?,
            )
        }
        None => None,
    };

    Ok(ListBucketsOutput {
        buckets,
        owner: owner(data.get("Owner")),
        is_truncated: text(data.get("IsTruncated")).as_deref() == Some("true"),
        next_marker: non_empty_text(data.get("NextMarker")),
        res,
    })
}

fn bucket_entry(item: &Value) -> Result<Bucket> {
    let name = text(item.get("Name"))
        .ok_or_else(|| Error::decode("bucket entry is missing Name", None))?;

    Ok(Bucket {
        name,
        region: text(item.get("Location")),
        creation_date: text(item.get("CreationDate")),
        storage_class: text(item.get("StorageClass")),
        tag: format_tag(item),
    })
}

pub(crate) fn bucket_location(resp: Response) -> Result<GetBucketLocationOutput> {
    let res = resp.meta();
    let location = text(Some(&resp.data))
        .ok_or_else(|| Error::decode("LocationConstraint is not a text element", None))?;
    Ok(GetBucketLocationOutput { location, res })
}

pub(crate) fn bucket_info(resp: Response) -> Result<GetBucketInfoOutput> {
    let res = resp.meta();
    let bucket = resp
        .data
        .get("Bucket")
        .cloned()
        .ok_or_else(|| Error::decode("BucketInfo is missing Bucket", None))?;
    Ok(GetBucketInfoOutput { bucket, res })
}

pub(crate) fn bucket_acl(resp: Response) -> Result<GetBucketAclOutput> {
    let res = resp.meta();
    let data = &resp.data;

    let acl = list_or_empty(present(data.pointer("/AccessControlList/Grant")))
        .iter()
        .filter_map(|grant| text(Some(grant)))
        .map(BucketAcl::parse)
        .collect();

    Ok(GetBucketAclOutput {
        acl,
        owner: owner(data.get("Owner")),
        res,
    })
}

pub(crate) fn bucket_logging(resp: Response) -> Result<GetBucketLoggingOutput> {
    let res = resp.meta();
    let enabled = present(resp.data.get("LoggingEnabled"));

    Ok(GetBucketLoggingOutput {
        enable: enabled.is_some(),
        prefix: enabled
            .as_ref()
            .and_then(|node| non_empty_text(node.get("TargetPrefix"))),
        res,
    })
}

pub(crate) fn bucket_cors(resp: Response) -> Result<GetBucketCorsOutput> {
    let res = resp.meta();

    let rules = list_or_empty(present(resp.data.get("CORSRule")))
        .into_iter()
        .map(|rule| {
            serde_json::from_value::<CorsRule>(lower_first_keys(rule))
                .map_err(|e| Error::decode("invalid CORSRule", Some(Box::new(e))))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(GetBucketCorsOutput { rules, res })
}

pub(crate) fn bucket_referer(resp: Response) -> Result<GetBucketRefererOutput> {
    let res = resp.meta();
    let data = &resp.data;

    let referers = one_or_many(present(data.pointer("/RefererList/Referer")))
        .map(|items| items.iter().filter_map(|r| text(Some(r))).collect());

    Ok(GetBucketRefererOutput {
        allow_empty: text(data.get("AllowEmptyReferer")).as_deref() == Some("true"),
        referers,
        res,
    })
}

pub(crate) fn bucket_tags(resp: Response) -> Result<GetBucketTagsOutput> {
    let res = resp.meta();
    Ok(GetBucketTagsOutput {
        tag: format_tag(&resp.data),
        res,
    })
}
