use crate::error::Error;

/// Validates a bucket name for requests against an existing bucket.
///
/// Names are 3-63 bytes of lowercase letters, digits, `-` and `_`, and may
/// not start or end with `-`.
pub(crate) fn check_bucket_name(name: &str) -> Result<(), Error> {
    check(name, false)
}

/// Stricter form used when creating a bucket: `_` is not allowed.
pub(crate) fn check_new_bucket_name(name: &str) -> Result<(), Error> {
    check(name, true)
}

fn check(name: &str, create: bool) -> Result<(), Error> {
    let bytes = name.as_bytes();
    if bytes.len() < 3 || bytes.len() > 63 {
        return Err(invalid(name));
    }

    let edge_ok = |b: u8| b.is_ascii_lowercase() || b.is_ascii_digit() || (!create && b == b'_');
    let inner_ok = |b: u8| edge_ok(b) || b == b'-';

    let first = bytes[0];
    let last = bytes[bytes.len() - 1];
    if !edge_ok(first) || !edge_ok(last) {
        return Err(invalid(name));
    }
    if !bytes[1..bytes.len() - 1].iter().all(|&b| inner_ok(b)) {
        return Err(invalid(name));
    }

    Ok(())
}

fn invalid(name: &str) -> Error {
    Error::invalid_argument(format!(
        "bucket name {name:?} must be 3-63 characters of lowercase letters, digits, '-' or '_'"
    ))
}
