#![allow(clippy::result_large_err)]

mod common;

use std::time::Duration;

use http::{HeaderMap, HeaderValue, Method, StatusCode};
use tokio_util::sync::CancellationToken;

use oss::{BucketAcl, CorsRule, Error, TagSet};

use common::{body_text, mock_client, request_id_headers};

#[tokio::test]
async fn invalid_bucket_names_never_reach_the_transport() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();
    let tags = TagSet::from([("env".to_string(), "prod".to_string())]);
    let rules = || vec![CorsRule::new("*", "GET")];

    macro_rules! assert_rejected {
        ($name:expr, $op:literal, $call:expr) => {
            match $call.await {
                Err(Error::InvalidArgument { .. }) => {}
                other => panic!("{} on {:?}: {:?}", $op, $name, other.map(|_| ())),
            }
        };
    }

    for name in ["ab", "-leading", "trailing-", "Upper", "has.dot"] {
        assert_rejected!(name, "get_location", buckets.get_location(name).send());
        assert_rejected!(name, "get_info", buckets.get_info(name).send());
        assert_rejected!(name, "create", buckets.create(name).send());
        assert_rejected!(name, "delete", buckets.delete(name).send());
        assert_rejected!(
            name,
            "put_acl",
            buckets.put_acl(name, BucketAcl::PublicRead).send()
        );
        assert_rejected!(name, "get_acl", buckets.get_acl(name).send());
        assert_rejected!(name, "put_logging", buckets.put_logging(name).send());
        assert_rejected!(name, "get_logging", buckets.get_logging(name).send());
        assert_rejected!(name, "delete_logging", buckets.delete_logging(name).send());
        assert_rejected!(name, "put_cors", buckets.put_cors(name, rules()).send());
        assert_rejected!(name, "get_cors", buckets.get_cors(name).send());
        assert_rejected!(name, "delete_cors", buckets.delete_cors(name).send());
        assert_rejected!(name, "put_referer", buckets.put_referer(name, true).send());
        assert_rejected!(name, "get_referer", buckets.get_referer(name).send());
        assert_rejected!(name, "delete_referer", buckets.delete_referer(name).send());
        assert_rejected!(name, "put_tags", buckets.put_tags(name, tags.clone()).send());
        assert_rejected!(name, "get_tags", buckets.get_tags(name).send());
        assert_rejected!(name, "delete_tags", buckets.delete_tags(name).send());
    }

    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn list_buckets_sends_query_and_normalizes_single_bucket() {
    let (client, transport) = mock_client();
    transport.respond_with_headers(
        StatusCode::OK,
        request_id_headers("list-1"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult>
  <Prefix>my-</Prefix>
  <Owner><ID>51264</ID><DisplayName>51264</DisplayName></Owner>
  <Buckets>
    <Bucket>
      <CreationDate>2024-05-20T09:45:10.000Z</CreationDate>
      <Location>oss-cn-hangzhou</Location>
      <Name>my-bucket</Name>
      <StorageClass>IA</StorageClass>
    </Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#,
    );

    let out = client
        .buckets()
        .list()
        .prefix("my-")
        .max_keys(5)
        .send()
        .await
        .unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(request.bucket, None);
    assert_eq!(request.query.get("prefix").map(String::as_str), Some("my-"));
    assert_eq!(request.query.get("max-keys").map(String::as_str), Some("5"));
    assert!(request.subresource.is_empty());

    let buckets = out.buckets.unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!(buckets[0].name, "my-bucket");
    assert_eq!(buckets[0].storage_class.as_deref(), Some("IA"));
    assert_eq!(out.owner.id.as_deref(), Some("51264"));
    assert_eq!(out.res.request_id.as_deref(), Some("list-1"));
}

#[tokio::test]
async fn put_cors_rejects_incomplete_rules_before_sending() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();

    let missing_origin = CorsRule::new(Vec::<String>::new(), "GET");
    let err = buckets
        .put_cors("my-bucket", vec![missing_origin])
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    let missing_method = CorsRule::new("*", Vec::<String>::new());
    let err = buckets
        .put_cors("my-bucket", vec![missing_method])
        .send()
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidArgument { .. }));

    assert!(buckets.put_cors("my-bucket", Vec::new()).send().await.is_err());
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn put_and_get_cors() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();

    transport.respond(StatusCode::OK, "");
    buckets
        .put_cors("my-bucket", Vec::new())
        .rule(
            CorsRule::new("*", ["GET", "HEAD"])
                .allowed_header("Authorization")
                .max_age_seconds(100),
        )
        .send()
        .await
        .unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::PUT);
    assert_eq!(request.subresource.get("cors"), Some(""));
    assert_eq!(
        request.headers.get(http::header::CONTENT_TYPE).unwrap(),
        "application/xml"
    );
    let body = body_text(&request);
    assert!(body.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(body.contains("<AllowedMethod>GET</AllowedMethod><AllowedMethod>HEAD</AllowedMethod>"));
    assert!(body.contains("<AllowedHeader>Authorization</AllowedHeader>"));

    transport.respond(
        StatusCode::OK,
        "<CORSConfiguration>\
           <CORSRule><AllowedOrigin>*</AllowedOrigin><AllowedMethod>GET</AllowedMethod>\
           <AllowedHeader>Authorization</AllowedHeader><MaxAgeSeconds>100</MaxAgeSeconds></CORSRule>\
           <CORSRule><AllowedOrigin>https://a.example</AllowedOrigin>\
           <AllowedOrigin>https://b.example</AllowedOrigin><AllowedMethod>PUT</AllowedMethod></CORSRule>\
         </CORSConfiguration>",
    );
    let out = buckets.get_cors("my-bucket").send().await.unwrap();
    assert_eq!(out.rules.len(), 2);
    assert_eq!(out.rules[0].allowed_method, vec!["GET"]);
    assert_eq!(out.rules[0].max_age_seconds, Some(100));
    assert_eq!(
        out.rules[1].allowed_origin,
        vec!["https://a.example", "https://b.example"]
    );
    assert_eq!(out.rules[1].max_age_seconds, None);
}

#[tokio::test]
async fn delete_referer_sends_the_reset_policy() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();

    transport.respond(StatusCode::OK, "");
    buckets.delete_referer("my-bucket").send().await.unwrap();
    transport.respond(StatusCode::OK, "");
    buckets.put_referer("my-bucket", true).send().await.unwrap();

    let sent = transport.requests();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].method, sent[1].method);
    assert_eq!(sent[0].bucket, sent[1].bucket);
    assert_eq!(sent[0].subresource, sent[1].subresource);
    assert_eq!(sent[0].headers, sent[1].headers);
    assert_eq!(sent[0].body, sent[1].body);
    assert!(body_text(&sent[0]).contains("<RefererList/>"));
}

#[tokio::test]
async fn get_referer_normalizes_a_single_entry() {
    let (client, transport) = mock_client();
    transport.respond(
        StatusCode::OK,
        "<RefererConfiguration><AllowEmptyReferer>true</AllowEmptyReferer>\
         <RefererList><Referer>https://*.example.com</Referer></RefererList>\
         </RefererConfiguration>",
    );

    let out = client.buckets().get_referer("my-bucket").send().await.unwrap();
    assert!(out.allow_empty);
    assert_eq!(out.referers, Some(vec!["https://*.example.com".to_string()]));
}

#[tokio::test]
async fn delete_tags_by_key_expects_no_content() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();

    transport.respond(StatusCode::NO_CONTENT, "");
    let out = buckets
        .delete_tags("my-bucket")
        .keys(["k1", "k2"])
        .send()
        .await
        .unwrap();
    assert_eq!(out.status, StatusCode::NO_CONTENT);

    let request = transport.last_request();
    assert_eq!(request.method, Method::DELETE);
    assert_eq!(request.subresource.get("tagging"), Some("k1,k2"));
    assert_eq!(request.expected_statuses, vec![StatusCode::NO_CONTENT]);

    transport.respond(StatusCode::OK, "");
    let err = buckets.delete_tags("my-bucket").send().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::OK));
}

#[tokio::test]
async fn put_and_get_tags() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();

    let tags = TagSet::from([
        ("env".to_string(), "prod".to_string()),
        ("team".to_string(), "storage".to_string()),
    ]);
    transport.respond(StatusCode::OK, "");
    let out = buckets.put_tags("my-bucket", tags.clone()).send().await.unwrap();
    assert_eq!(out.status, StatusCode::OK);
    assert!(body_text(&transport.last_request()).contains("<Key>env</Key><Value>prod</Value>"));

    transport.respond(
        StatusCode::OK,
        "<Tagging><TagSet>\
           <Tag><Key>env</Key><Value>prod</Value></Tag>\
           <Tag><Key>team</Key><Value>storage</Value></Tag>\
         </TagSet></Tagging>",
    );
    let out = buckets.get_tags("my-bucket").send().await.unwrap();
    assert_eq!(out.tag, tags);
}

#[tokio::test]
async fn logging_round_trip() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();

    transport.respond(StatusCode::OK, "");
    buckets
        .put_logging("my-bucket")
        .prefix("logs/")
        .send()
        .await
        .unwrap();
    let body = body_text(&transport.last_request());
    assert!(body.contains("<TargetBucket>my-bucket</TargetBucket>"));
    assert!(body.contains("<TargetPrefix>logs/</TargetPrefix>"));

    transport.respond(
        StatusCode::OK,
        "<BucketLoggingStatus><LoggingEnabled><TargetBucket>my-bucket</TargetBucket>\
         <TargetPrefix>logs/</TargetPrefix></LoggingEnabled></BucketLoggingStatus>",
    );
    let out = buckets.get_logging("my-bucket").send().await.unwrap();
    assert!(out.enable);
    assert_eq!(out.prefix.as_deref(), Some("logs/"));

    transport.respond(StatusCode::OK, "<BucketLoggingStatus/>");
    let out = buckets.get_logging("my-bucket").send().await.unwrap();
    assert!(!out.enable);
    assert_eq!(out.prefix, None);

    transport.respond(StatusCode::NO_CONTENT, "");
    buckets.delete_logging("my-bucket").send().await.unwrap();
    transport.respond(StatusCode::OK, "");
    buckets.delete_logging("my-bucket").send().await.unwrap();
}

#[tokio::test]
async fn put_acl_reads_bucket_from_location() {
    let (client, transport) = mock_client();
    let mut headers = HeaderMap::new();
    headers.insert(http::header::LOCATION, HeaderValue::from_static("/my-bucket"));
    transport.respond_with_headers(StatusCode::OK, headers, "");

    let out = client
        .buckets()
        .put_acl("my-bucket", BucketAcl::PublicReadWrite)
        .send()
        .await
        .unwrap();
    assert_eq!(out.bucket.as_deref(), Some("my-bucket"));

    let request = transport.last_request();
    assert_eq!(request.subresource.get("acl"), Some(""));
    assert_eq!(
        request.headers.get("x-oss-acl").unwrap(),
        "public-read-write"
    );
}

#[tokio::test]
async fn unexpected_status_surfaces_service_error() {
    let (client, transport) = mock_client();
    transport.respond_with_headers(
        StatusCode::NOT_FOUND,
        request_id_headers("hdr-id"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Error>
  <Code>NoSuchBucket</Code>
  <Message>The specified bucket does not exist.</Message>
  <RequestId>5C3D9175B6FC201293AD</RequestId>
  <HostId>my-bucket.oss-cn-hangzhou.aliyuncs.com</HostId>
</Error>"#,
    );

    let err = client.buckets().get_location("my-bucket").send().await.unwrap_err();
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.code(), Some("NoSuchBucket"));
    assert_eq!(err.request_id(), Some("5C3D9175B6FC201293AD"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn delete_bucket_accepts_ok_and_no_content() {
    let (client, transport) = mock_client();
    let buckets = client.buckets();

    transport.respond(StatusCode::NO_CONTENT, "");
    buckets.delete("my-bucket").send().await.unwrap();
    transport.respond(StatusCode::OK, "");
    buckets.delete("my-bucket").send().await.unwrap();

    transport.respond(StatusCode::OK, "");
    assert!(buckets.delete_cors("my-bucket").send().await.is_err());
}

#[tokio::test]
async fn default_bucket_round_trip() {
    let (mut client, transport) = mock_client();
    client.set_bucket("photos").unwrap();
    assert_eq!(client.bucket(), Some("photos"));

    transport.respond(
        StatusCode::OK,
        "<LocationConstraint>oss-cn-shanghai</LocationConstraint>",
    );
    let buckets = client.buckets();
    let out = buckets
        .get_location(buckets.default_bucket().unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(out.location, "oss-cn-shanghai");
    assert_eq!(transport.last_request().bucket.as_deref(), Some("photos"));
}

#[tokio::test]
async fn options_are_passed_to_the_transport() {
    let (client, transport) = mock_client();
    let token = CancellationToken::new();

    transport.respond(
        StatusCode::OK,
        "<BucketInfo><Bucket><Name>my-bucket</Name></Bucket></BucketInfo>",
    );
    let out = client
        .buckets()
        .get_info("my-bucket")
        .timeout(Duration::from_secs(3))
        .cancellation(token)
        .send()
        .await
        .unwrap();
    assert_eq!(out.bucket["Name"], "my-bucket");

    let request = transport.last_request();
    assert_eq!(request.timeout, Some(Duration::from_secs(3)));
    assert!(request.cancellation.is_some());
    assert_eq!(request.subresource.get("bucketInfo"), Some(""));
}
