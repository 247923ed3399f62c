use bytes::Bytes;
use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event},
};
use serde_json::{Map, Value, map::Entry};

use crate::{
    error::Error,
    types::{self, CorsRule, DataRedundancyType, StorageClass, TagSet},
};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Decodes an XML document into an untyped tree.
///
/// The root element is unwrapped, attributes are dropped, an element with
/// only text (or nothing) becomes a string, an element with children becomes
/// an object, and repeated sibling elements become an array. A single child
/// is never wrapped in an array; use [`one_or_many`](crate::normalize::one_or_many)
/// where a list is expected.
pub fn parse_xml(body: &str) -> Result<Value, Error> {
    let mut reader = Reader::from_str(body);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<Frame> = Vec::new();
    let mut root: Option<Value> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| Error::decode("failed to parse XML response", Some(Box::new(e))))?;

        match event {
            Event::Start(e) => stack.push(Frame::new(element_name(&e)?)),
            Event::Empty(e) => {
                let name = element_name(&e)?;
                attach(&mut stack, &mut root, name, Value::String(String::new()))?;
            }
            Event::Text(t) => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::decode("invalid XML text", Some(Box::new(e))))?;
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&text);
                }
            }
            Event::CData(c) => {
                if let Some(frame) = stack.last_mut() {
                    frame.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::End(_) => {
                let frame = stack
                    .pop()
                    .ok_or_else(|| Error::decode("unbalanced XML end tag", None))?;
                let (name, value) = frame.finish();
                attach(&mut stack, &mut root, name, value)?;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::decode("XML document ended inside an element", None));
    }
    root.ok_or_else(|| Error::decode("XML document has no root element", None))
}

struct Frame {
    name: String,
    text: String,
    children: Vec<(String, Value)>,
}

impl Frame {
    fn new(name: String) -> Self {
        Self {
            name,
            text: String::new(),
            children: Vec::new(),
        }
    }

    fn finish(self) -> (String, Value) {
        if self.children.is_empty() {
            return (self.name, Value::String(self.text));
        }

        let mut map = Map::new();
        for (key, value) in self.children {
            match map.entry(key) {
                Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                Entry::Occupied(mut slot) => match slot.get_mut() {
                    Value::Array(items) => items.push(value),
                    first => {
                        let first = first.take();
                        slot.insert(Value::Array(vec![first, value]));
                    }
                },
            }
        }
        (self.name, Value::Object(map))
    }
}

fn element_name(e: &BytesStart<'_>) -> Result<String, Error> {
    std::str::from_utf8(e.local_name().as_ref())
        .map(str::to_string)
        .map_err(|e| Error::decode("XML element name is not UTF-8", Some(Box::new(e))))
}

fn attach(
    stack: &mut [Frame],
    root: &mut Option<Value>,
    name: String,
    value: Value,
) -> Result<(), Error> {
    match stack.last_mut() {
        Some(parent) => parent.children.push((name, value)),
        None if root.is_none() => *root = Some(value),
        None => return Err(Error::decode("XML document has multiple roots", None)),
    }
    Ok(())
}

pub(crate) fn parse_error_xml(body: &str) -> Option<types::XmlError> {
    if body.trim().is_empty() {
        return None;
    }

    quick_xml::de::from_str::<types::XmlError>(body).ok()
}

fn with_declaration(xml: &str) -> Bytes {
    let mut out = String::with_capacity(XML_DECLARATION.len() + xml.len());
    out.push_str(XML_DECLARATION);
    out.push_str(xml);
    Bytes::from(out)
}

pub(crate) fn encode_bucket_logging(
    target_bucket: &str,
    target_prefix: Option<&str>,
) -> Result<Bytes, Error> {
    #[derive(serde::Serialize)]
    #[serde(rename = "BucketLoggingStatus")]
    struct XmlOut<'a> {
        #[serde(rename = "LoggingEnabled")]
        logging_enabled: XmlLoggingEnabled<'a>,
    }

    #[derive(serde::Serialize)]
    struct XmlLoggingEnabled<'a> {
        #[serde(rename = "TargetBucket")]
        target_bucket: &'a str,
        #[serde(rename = "TargetPrefix", skip_serializing_if = "Option::is_none")]
        target_prefix: Option<&'a str>,
    }

    let xml = quick_xml::se::to_string(&XmlOut {
        logging_enabled: XmlLoggingEnabled {
            target_bucket,
            target_prefix: target_prefix.filter(|p| !p.is_empty()),
        },
    })
    .map_err(|e| {
        Error::decode(
            "failed to encode BucketLoggingStatus XML",
            Some(Box::new(e)),
        )
    })?;
    Ok(with_declaration(&xml))
}

pub(crate) fn encode_bucket_cors(rules: &[CorsRule]) -> Result<Bytes, Error> {
    if rules.is_empty() {
        return Err(Error::invalid_argument(
            "bucket cors configuration must include at least one rule",
        ));
    }
    for rule in rules {
        if rule.allowed_origin.is_empty() {
            return Err(Error::invalid_argument("cors rule requires allowed_origin"));
        }
        if rule.allowed_method.is_empty() {
            return Err(Error::invalid_argument("cors rule requires allowed_method"));
        }
    }

    #[derive(serde::Serialize)]
    #[serde(rename = "CORSConfiguration")]
    struct XmlOut<'a> {
        #[serde(rename = "CORSRule")]
        rules: Vec<XmlRuleOut<'a>>,
    }

    #[derive(serde::Serialize)]
    struct XmlRuleOut<'a> {
        #[serde(rename = "AllowedOrigin")]
        allowed_origin: &'a [String],
        #[serde(rename = "AllowedMethod")]
        allowed_method: &'a [String],
        #[serde(rename = "AllowedHeader", skip_serializing_if = "no_values")]
        allowed_header: &'a [String],
        #[serde(rename = "ExposeHeader", skip_serializing_if = "no_values")]
        expose_header: &'a [String],
        #[serde(rename = "MaxAgeSeconds", skip_serializing_if = "Option::is_none")]
        max_age_seconds: Option<u32>,
    }

    let xml = quick_xml::se::to_string(&XmlOut {
        rules: rules
            .iter()
            .map(|r| XmlRuleOut {
                allowed_origin: &r.allowed_origin,
                allowed_method: &r.allowed_method,
                allowed_header: &r.allowed_header,
                expose_header: &r.expose_header,
                max_age_seconds: r.max_age_seconds,
            })
            .collect(),
    })
    .map_err(|e| Error::decode("failed to encode CORSConfiguration XML", Some(Box::new(e))))?;
    Ok(with_declaration(&xml))
}

fn no_values(values: &&[String]) -> bool {
    values.is_empty()
}

/// Encodes the referer policy.
///
/// An empty or missing list is still written as `<RefererList/>`: the
/// service reads a missing element differently from an empty one.
pub(crate) fn encode_bucket_referer(
    allow_empty: bool,
    referers: Option<&[String]>,
) -> Result<Bytes, Error> {
    let mut writer = Writer::new(Vec::new());
    write_referer_configuration(&mut writer, allow_empty, referers).map_err(|e| {
        Error::decode(
            "failed to encode RefererConfiguration XML",
            Some(Box::new(e)),
        )
    })?;

    let xml = String::from_utf8(writer.into_inner())
        .map_err(|e| Error::decode("encoded referer XML is not UTF-8", Some(Box::new(e))))?;
    Ok(with_declaration(&xml))
}

fn write_referer_configuration(
    writer: &mut Writer<Vec<u8>>,
    allow_empty: bool,
    referers: Option<&[String]>,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new("RefererConfiguration")))?;
    write_text_element(
        writer,
        "AllowEmptyReferer",
        if allow_empty { "true" } else { "false" },
    )?;

    match referers.filter(|r| !r.is_empty()) {
        Some(referers) => {
            writer.write_event(Event::Start(BytesStart::new("RefererList")))?;
            for referer in referers {
                write_text_element(writer, "Referer", referer)?;
            }
            writer.write_event(Event::End(BytesEnd::new("RefererList")))?;
        }
        None => writer.write_event(Event::Empty(BytesStart::new("RefererList")))?,
    }

    writer.write_event(Event::End(BytesEnd::new("RefererConfiguration")))?;
    Ok(())
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

pub(crate) fn encode_bucket_tagging(tags: &TagSet) -> Result<Bytes, Error> {
    #[derive(serde::Serialize)]
    #[serde(rename = "Tagging")]
    struct XmlOut<'a> {
        #[serde(rename = "TagSet")]
        tag_set: XmlTagSet<'a>,
    }

    #[derive(serde::Serialize)]
    struct XmlTagSet<'a> {
        #[serde(rename = "Tag")]
        tags: Vec<XmlTag<'a>>,
    }

    #[derive(serde::Serialize)]
    struct XmlTag<'a> {
        #[serde(rename = "Key")]
        key: &'a str,
        #[serde(rename = "Value")]
        value: &'a str,
    }

    let xml = quick_xml::se::to_string(&XmlOut {
        tag_set: XmlTagSet {
            tags: tags
                .iter()
                .map(|(key, value)| XmlTag { key, value })
                .collect(),
        },
    })
    .map_err(|e| Error::decode("failed to encode Tagging XML", Some(Box::new(e))))?;
    Ok(with_declaration(&xml))
}

pub(crate) fn encode_create_bucket_configuration(
    storage_class: Option<&StorageClass>,
    data_redundancy_type: Option<&DataRedundancyType>,
) -> Result<Bytes, Error> {
    #[derive(serde::Serialize)]
    #[serde(rename = "CreateBucketConfiguration")]
    struct XmlOut<'a> {
        #[serde(rename = "StorageClass", skip_serializing_if = "Option::is_none")]
        storage_class: Option<&'a str>,
        #[serde(rename = "DataRedundancyType", skip_serializing_if = "Option::is_none")]
        data_redundancy_type: Option<&'a str>,
    }

    let xml = quick_xml::se::to_string(&XmlOut {
        storage_class: storage_class.map(StorageClass::as_str),
        data_redundancy_type: data_redundancy_type.map(DataRedundancyType::as_str),
    })
    .map_err(|e| {
        Error::decode(
            "failed to encode CreateBucketConfiguration XML",
            Some(Box::new(e)),
        )
    })?;
    Ok(with_declaration(&xml))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn text(bytes: Bytes) -> String {
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[test]
    fn parses_nested_elements_and_unwraps_root() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://doc.oss-cn-hangzhou.aliyuncs.com">
  <Owner>
    <ID>512</ID>
    <DisplayName>owner</DisplayName>
  </Owner>
  <Buckets>
    <Bucket>
      <Name>bucket-a</Name>
    </Bucket>
    <Bucket>
      <Name>bucket-b</Name>
    </Bucket>
  </Buckets>
</ListAllMyBucketsResult>"#;

        let tree = parse_xml(xml).unwrap();
        assert_eq!(tree["Owner"], json!({"ID": "512", "DisplayName": "owner"}));
        assert_eq!(
            tree["Buckets"]["Bucket"],
            json!([{"Name": "bucket-a"}, {"Name": "bucket-b"}])
        );
    }

    #[test]
    fn single_child_stays_scalar() {
        let tree = parse_xml("<A><B><C>x</C></B></A>").unwrap();
        assert_eq!(tree, json!({"B": {"C": "x"}}));
    }

    #[test]
    fn text_only_root_becomes_string() {
        let tree = parse_xml(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<LocationConstraint>oss-cn-hangzhou</LocationConstraint>"#,
        )
        .unwrap();
        assert_eq!(tree, json!("oss-cn-hangzhou"));
    }

    #[test]
    fn empty_elements_become_empty_strings() {
        let tree = parse_xml("<R><A/><B></B><C>a &amp; b</C></R>").unwrap();
        assert_eq!(tree, json!({"A": "", "B": "", "C": "a & b"}));
    }

    #[test]
    fn rejects_truncated_documents() {
        assert!(matches!(
            parse_xml("<R><A>x</A>"),
            Err(Error::Decode { .. })
        ));
        assert!(matches!(parse_xml(""), Err(Error::Decode { .. })));
    }

    #[test]
    fn parses_error_document() {
        let parsed = parse_error_xml(
            "<Error><Code>NoSuchBucket</Code><Message>missing</Message>\
             <RequestId>abc</RequestId><HostId>h</HostId></Error>",
        )
        .unwrap();
        assert_eq!(parsed.code.as_deref(), Some("NoSuchBucket"));
        assert_eq!(parsed.request_id.as_deref(), Some("abc"));
        assert!(parse_error_xml("  ").is_none());
    }

    #[test]
    fn encodes_logging_with_and_without_prefix() {
        let xml = text(encode_bucket_logging("logs", Some("access/")).unwrap());
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.ends_with(
            "<BucketLoggingStatus><LoggingEnabled><TargetBucket>logs</TargetBucket>\
             <TargetPrefix>access/</TargetPrefix></LoggingEnabled></BucketLoggingStatus>"
        ));

        let xml = text(encode_bucket_logging("logs", Some("")).unwrap());
        assert!(!xml.contains("TargetPrefix"));
    }

    #[test]
    fn encodes_cors_rules_with_repeated_elements() {
        let rules = vec![
            CorsRule::new(["https://a.example", "https://b.example"], "GET")
                .expose_header("ETag")
                .max_age_seconds(60),
        ];
        let xml = text(encode_bucket_cors(&rules).unwrap());
        assert!(xml.contains(
            "<CORSRule><AllowedOrigin>https://a.example</AllowedOrigin>\
             <AllowedOrigin>https://b.example</AllowedOrigin>\
             <AllowedMethod>GET</AllowedMethod>"
        ));
        assert!(xml.contains("<ExposeHeader>ETag</ExposeHeader>"));
        assert!(xml.contains("<MaxAgeSeconds>60</MaxAgeSeconds></CORSRule>"));
        assert!(!xml.contains("AllowedHeader"));
    }

    #[test]
    fn cors_rules_require_origin_and_method() {
        let missing_method = vec![CorsRule::new("*", Vec::<String>::new())];
        assert!(matches!(
            encode_bucket_cors(&missing_method),
            Err(Error::InvalidArgument { .. })
        ));
        let missing_origin = vec![CorsRule::new(Vec::<String>::new(), "GET")];
        assert!(encode_bucket_cors(&missing_origin).is_err());
        assert!(encode_bucket_cors(&[]).is_err());
    }

    #[test]
    fn encodes_referer_list_and_escapes_text() {
        let referers = vec!["https://a.example/*".to_string(), "x&y".to_string()];
        let xml = text(encode_bucket_referer(false, Some(&referers)).unwrap());
        assert!(xml.ends_with(
            "<RefererConfiguration><AllowEmptyReferer>false</AllowEmptyReferer>\
             <RefererList><Referer>https://a.example/*</Referer><Referer>x&amp;y</Referer>\
             </RefererList></RefererConfiguration>"
        ));
    }

    #[test]
    fn empty_referer_list_stays_present() {
        let absent = text(encode_bucket_referer(true, None).unwrap());
        let empty = text(encode_bucket_referer(true, Some(&[])).unwrap());
        assert_eq!(absent, empty);
        assert!(absent.ends_with(
            "<RefererConfiguration><AllowEmptyReferer>true</AllowEmptyReferer>\
             <RefererList/></RefererConfiguration>"
        ));
    }

    #[test]
    fn encodes_tag_set() {
        let tags = TagSet::from([
            ("env".to_string(), "prod".to_string()),
            ("team".to_string(), "storage".to_string()),
        ]);
        let xml = text(encode_bucket_tagging(&tags).unwrap());
        assert!(xml.contains(
            "<Tagging><TagSet><Tag><Key>env</Key><Value>prod</Value></Tag>\
             <Tag><Key>team</Key><Value>storage</Value></Tag></TagSet></Tagging>"
        ));
    }

    #[test]
    fn encodes_create_bucket_configuration() {
        let xml = text(
            encode_create_bucket_configuration(
                Some(&StorageClass::InfrequentAccess),
                Some(&DataRedundancyType::Zrs),
            )
            .unwrap(),
        );
        assert!(xml.contains(
            "<CreateBucketConfiguration><StorageClass>IA</StorageClass>\
             <DataRedundancyType>ZRS</DataRedundancyType></CreateBucketConfiguration>"
        ));
    }
}
