//! Provider registry.

use crate::config::Credentials;
use crate::error::{DnsError, Result};
use crate::traits::DnsProvider;

#[cfg(feature = "alidns")]
use crate::providers::AlidnsProvider;
#[cfg(feature = "cloudflare")]
use crate::providers::CloudflareProvider;
#[cfg(feature = "dnspod")]
use crate::providers::DnspodProvider;
#[cfg(feature = "huaweidns")]
use crate::providers::HuaweidnsProvider;
#[cfg(feature = "noip")]
use crate::providers::NoipProvider;
#[cfg(feature = "tencentcloud")]
use crate::providers::TencentcloudProvider;

/// Canonical keys of the providers compiled into this build.
pub fn supported_providers() -> Vec<&'static str> {
    vec![
        #[cfg(feature = "alidns")]
        "alidns",
        #[cfg(feature = "cloudflare")]
        "cloudflare",
        #[cfg(feature = "dnspod")]
        "dnspod",
        #[cfg(feature = "huaweidns")]
        "huaweidns",
        #[cfg(feature = "noip")]
        "noip",
        #[cfg(feature = "tencentcloud")]
        "tencentcloud",
    ]
}

/// Create a provider from its configuration key.
///
/// Keys are matched case-insensitively and common aliases are accepted:
/// `aliyun` for `alidns`, `dnspod_cn` for `dnspod`, `tencent`/`qcloud` for
/// `tencentcloud`, `huawei`/`huaweicloud` for `huaweidns`, and `no-ip` for
/// `noip`. An unknown key is a [`DnsError::Config`] error listing the
/// providers compiled into this build.
pub fn create_provider(name: &str, credentials: Credentials) -> Result<Box<dyn DnsProvider>> {
    let key = name.trim().to_ascii_lowercase();
    match key.as_str() {
        #[cfg(feature = "alidns")]
        "alidns" | "aliyun" => Ok(Box::new(AlidnsProvider::new(credentials)?)),
        #[cfg(feature = "cloudflare")]
        "cloudflare" => Ok(Box::new(CloudflareProvider::new(credentials)?)),
        #[cfg(feature = "dnspod")]
        "dnspod" | "dnspod_cn" => Ok(Box::new(DnspodProvider::new(credentials)?)),
        #[cfg(feature = "huaweidns")]
        "huaweidns" | "huawei" | "huaweicloud" => {
            Ok(Box::new(HuaweidnsProvider::new(credentials)?))
        }
        #[cfg(feature = "noip")]
        "noip" | "no-ip" => Ok(Box::new(NoipProvider::new(credentials)?)),
        #[cfg(feature = "tencentcloud")]
        "tencentcloud" | "tencent" | "qcloud" => {
            Ok(Box::new(TencentcloudProvider::new(credentials)?))
        }
        _ => Err(DnsError::config(format!(
            "unknown DNS provider '{name}' (supported: {})",
            supported_providers().join(", ")
        ))),
    }
}

/// Create a provider straight from loader settings.
pub fn create_provider_from_settings(
    settings: &crate::config::Settings,
) -> Result<Box<dyn DnsProvider>> {
    create_provider(&settings.dns, Credentials::from_settings(settings))
}
