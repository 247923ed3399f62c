//! A lean bucket-management client for OSS-style object storage services.
//!
//! ## Quick start
//!
//! ```no_run
//! # async fn demo() -> Result<(), oss::Error> {
//! use oss::{Client, CorsRule};
//!
//! let client = Client::builder("https://oss-cn-hangzhou.aliyuncs.com")?
//!     .bucket("my-bucket")
//!     .build()?;
//! let buckets = client.buckets();
//!
//! let listed = buckets.list().prefix("my-").send().await?;
//! for bucket in listed.buckets.unwrap_or_default() {
//!     println!("{} ({:?})", bucket.name, bucket.region);
//! }
//!
//! buckets
//!     .put_cors(buckets.default_bucket()?, vec![CorsRule::new("*", ["GET", "HEAD"])])
//!     .send()
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Design
//!
//! Each operation builds a [`RequestDescriptor`](api::RequestDescriptor), hands
//! it to a [`Transport`], and normalizes the XML answer into typed output. The
//! default transport is `reqwest`; request signing plugs in through
//! [`RequestSigner`].

#[cfg(all(
    feature = "rustls",
    feature = "native-tls",
    not(feature = "allow-both-tls")
))]
compile_error!("Enable only one of: rustls, native-tls.");

/// Service entry points and request builders.
pub mod api;
/// Helpers for the untyped XML tree.
pub mod normalize;
/// Shared request/response types.
pub mod types;

mod client;
mod error;
mod transport;
mod util;

pub use client::{AddressingStyle, Client, ClientBuilder};
pub use error::{Error, Result};
pub use transport::{RawResponse, RequestSigner, Transport};
pub use types::{BucketAcl, CorsRule, DataRedundancyType, StorageClass, TagSet};
