fn is_unreserved(byte: u8) -> bool {
    matches!(byte, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~')
}

/// Percent-encodes everything outside the RFC 3986 unreserved set.
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for &b in input.as_bytes() {
        if is_unreserved(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Joins sub-resources and plain query parameters into one query string.
///
/// Sub-resources with an empty value are emitted as a bare key (`?acl`),
/// which is how the service expects them. Keys are sorted so the same
/// descriptor always yields the same URL.
pub(crate) fn query_string<'a, I, J>(subresources: I, params: J) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
    J: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut items = subresources
        .into_iter()
        .map(|(k, v)| (percent_encode(k), (!v.is_empty()).then(|| percent_encode(v))))
        .chain(
            params
                .into_iter()
                .map(|(k, v)| (percent_encode(k), Some(percent_encode(v)))),
        )
        .collect::<Vec<_>>();

    items.sort();

    let mut out = String::new();
    for (idx, (k, v)) in items.into_iter().enumerate() {
        if idx > 0 {
            out.push('&');
        }
        out.push_str(&k);
        if let Some(v) = v {
            out.push('=');
            out.push_str(&v);
        }
    }
    out
}
