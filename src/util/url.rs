use std::net::IpAddr;

use url::Url;

use crate::{client::AddressingStyle, error::Error};

/// Builds the request URL for a service- or bucket-scoped call.
pub(crate) fn resolve_url(
    base_url: &Url,
    bucket: Option<&str>,
    query: &str,
    addressing: AddressingStyle,
) -> Result<Url, Error> {
    let mut url = base_url.clone();
    url.set_query((!query.is_empty()).then_some(query));

    let Some(bucket) = bucket else {
        url.set_path("/");
        return Ok(url);
    };

    let host = base_url
        .host_str()
        .ok_or_else(|| Error::invalid_argument("endpoint must include host"))?;

    match resolve_addressing_style(host, bucket, addressing) {
        AddressingStyle::Path => {
            url.set_path(&format!("/{bucket}/"));
        }
        AddressingStyle::VirtualHosted => {
            if !is_dns_compatible_bucket(bucket) {
                return Err(Error::invalid_argument(
                    "bucket is not DNS compatible for virtual-hosted-style",
                ));
            }
            url.set_path("/");
            url.set_host(Some(&format!("{bucket}.{host}")))
                .map_err(|_| Error::invalid_argument("invalid endpoint host"))?;
        }
        AddressingStyle::Auto => {
            return Err(Error::invalid_argument(
                "internal error: auto addressing style must be resolved",
            ));
        }
    }

    Ok(url)
}

fn resolve_addressing_style(host: &str, bucket: &str, addressing: AddressingStyle) -> AddressingStyle {
    match addressing {
        AddressingStyle::Path | AddressingStyle::VirtualHosted => addressing,
        AddressingStyle::Auto => {
            if host == "localhost" || host.parse::<IpAddr>().is_ok() {
                return AddressingStyle::Path;
            }
            if !is_dns_compatible_bucket(bucket) {
                return AddressingStyle::Path;
            }
            AddressingStyle::VirtualHosted
        }
    }
}

// Underscores pass bucket-name validation but are not valid in a hostname label.
fn is_dns_compatible_bucket(bucket: &str) -> bool {
    !bucket.is_empty()
        && bucket
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}
