//! # ddns-provider
//!
//! A DNS provider abstraction and record-reconciliation library for dynamic
//! DNS: point a record at a value, and the crate works out whether that
//! means resolving a zone, creating a record, or updating one in place.
//!
//! ## Supported Providers
//!
//! | Provider | Feature Flag | Auth Method |
//! |----------|--------------|-------------|
//! | [Aliyun DNS](https://www.aliyun.com/product/dns) | `alidns` | RPC HMAC-SHA1 query signing |
//! | [Cloudflare](https://www.cloudflare.com/) | `cloudflare` | Bearer token or email + API key |
//! | [DNSPod (legacy)](https://www.dnspod.cn/) | `dnspod` | `login_token` form field |
//! | [Huawei Cloud DNS](https://www.huaweicloud.com/product/dns.html) | `huaweidns` | SDK-HMAC-SHA256 |
//! | [Tencent Cloud DNSPod](https://cloud.tencent.com/product/dns) | `tencentcloud` | TC3-HMAC-SHA256 |
//! | [No-IP](https://www.noip.com/) | `noip` | HTTP Basic |
//!
//! ## Feature Flags
//!
//! - **`all-providers`** *(default)* — every provider above; or pick them
//!   individually with the per-provider flags.
//! - **`native-tls`** *(default)* / **`rustls`** — TLS backend selection.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use ddns_provider::{Credentials, RecordRequest, create_provider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = create_provider("cloudflare", Credentials::new("", "api-token"))?;
//!
//!     // creates the record if missing, updates it otherwise
//!     let request = RecordRequest::new("www.example.com", "192.0.2.1").ttl(300);
//!     let changed = provider.set_record(&request).await?;
//!     println!("applied: {changed}");
//!     Ok(())
//! }
//! ```
//!
//! ## Domain expressions
//!
//! A domain is written as `[sub{~|+}]main[#zone_id[#record_id]]`:
//! `sub~example.co.uk` pins the registrable root for exotic TLDs,
//! `www.example.com#z123` skips zone resolution, and a second `#` segment
//! pins the record id. `@` addresses the zone apex.
//!
//! ## Error Handling
//!
//! Operations return [`Result<T, DnsError>`](DnsError). A provider that
//! answers but refuses (a structured error under HTTP 200) is a soft
//! failure: `set_record` returns `Ok(false)`. Authentication, HTTP, and
//! network failures are `Err`, and nothing is retried internally — retry
//! policy belongs to the caller.

mod cache;
mod config;
pub mod domain;
mod error;
mod factory;
mod http;
mod providers;
pub mod reconciler;
mod signature;
mod traits;
mod utils;

pub use cache::ZoneCache;
pub use config::{Credentials, Settings};
pub use domain::DomainExpression;
pub use error::{DnsError, Result};
pub use factory::{create_provider, create_provider_from_settings, supported_providers};
pub use signature::{hmac_sha256_authorization, rpc_signature, tc3_authorization};
pub use traits::{DnsProvider, MANAGED_MARKER, RecordOps, RecordRequest};
pub use utils::mask::Masker;

#[cfg(feature = "alidns")]
pub use providers::AlidnsProvider;

#[cfg(feature = "cloudflare")]
pub use providers::CloudflareProvider;

#[cfg(feature = "dnspod")]
pub use providers::DnspodProvider;

#[cfg(feature = "huaweidns")]
pub use providers::HuaweidnsProvider;

#[cfg(feature = "noip")]
pub use providers::NoipProvider;

#[cfg(feature = "tencentcloud")]
pub use providers::TencentcloudProvider;
