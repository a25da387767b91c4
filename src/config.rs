//! Configuration for trusting reverse proxies.
//!
//! Configuration is read once, at startup, from the environment:
//!
//! | Variable | Format | Effect |
//! |---|---|---|
//! | `TRUSTED_PROXIES` | comma-separated IPs/CIDRs | proxies whose forwarded headers are trusted; empty trusts nobody |
//! | `TRUST_PROXY_HEADERS` | comma-separated categories | which forwarded headers to apply; empty means `proto,host` |
//! | `COOKIE_SECURE` | boolean | whether cookies are always marked `Secure`; see [`SecureCookies`] |
//!
//! Never set `TRUSTED_PROXIES` to `0.0.0.0/0` in production, only include
//! the addresses of the actual reverse proxies.

use std::fmt;

use serde::Deserialize;
use thiserror::Error;

use crate::headers::HeaderAllowList;
use crate::network::NetworkSet;
use crate::view::RequestView;

/// An error reading configuration from the environment.
#[derive(Debug, Error)]
#[error("unable to read proxy configuration from the environment: {source}")]
pub struct ConfigError {
    #[from]
    source: envy::Error,
}

/// Intermediate structure for deserializing environment variables.
///
/// Environment variable `TRUSTED_PROXIES` deserializes in to struct member `trusted_proxies`.
#[derive(Debug, Default, Deserialize)]
struct EnvConfig {
    trusted_proxies: Option<String>,
    trust_proxy_headers: Option<String>,
    cookie_secure: Option<String>,
}

impl EnvConfig {
    fn apply(self) -> ProxyTrustConfig {
        let mut config = ProxyTrustConfig::new(
            self.trusted_proxies.as_deref().unwrap_or_default(),
            self.trust_proxy_headers.as_deref().unwrap_or_default(),
        );

        if let Some(value) = self.cookie_secure {
            config.secure_cookies = SecureCookies::parse(&value);
        }

        tracing::debug!(
            proxies = config.proxies.len(),
            headers = %config.headers,
            secure_cookies = %config.secure_cookies,
            "loaded trusted proxy configuration"
        );

        config
    }
}

/// Whether cookies set by the service must carry the `Secure` attribute.
///
/// Read from a boolean; a missing or unreadable value is treated as
/// [`SecureCookies::Always`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SecureCookies {
    /// Always mark cookies `Secure`.
    #[default]
    Always,

    /// Only mark cookies `Secure` when the request was seen as secure.
    WhenSecure,
}

impl SecureCookies {
    /// Parse a boolean configuration value.
    ///
    /// Accepts `1`, `t`, `true` and their false counterparts, ignoring
    /// ASCII case. Anything else falls back to [`SecureCookies::Always`]
    /// with a warning.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        let is = |word: &str| value.eq_ignore_ascii_case(word);

        if value == "1" || is("t") || is("true") {
            SecureCookies::Always
        } else if value == "0" || is("f") || is("false") {
            SecureCookies::WhenSecure
        } else {
            tracing::warn!(%value, "invalid COOKIE_SECURE value, cookies will be marked secure");
            SecureCookies::Always
        }
    }

    /// Whether a cookie set in response to this request should be `Secure`.
    pub fn for_request(self, view: &RequestView) -> bool {
        match self {
            SecureCookies::Always => true,
            SecureCookies::WhenSecure => view.is_secure(),
        }
    }
}

impl fmt::Display for SecureCookies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecureCookies::Always => f.write_str("always"),
            SecureCookies::WhenSecure => f.write_str("when-secure"),
        }
    }
}

/// Immutable trusted proxy configuration, shared by all requests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProxyTrustConfig {
    /// Networks whose forwarded headers are trusted.
    pub proxies: NetworkSet,

    /// Forwarded header categories applied from trusted proxies.
    pub headers: HeaderAllowList,

    /// Cookie security for downstream stages.
    pub secure_cookies: SecureCookies,
}

impl ProxyTrustConfig {
    /// Build configuration from the raw proxy and header lists.
    pub fn new(proxies: &str, headers: &str) -> Self {
        Self {
            proxies: NetworkSet::parse(proxies),
            headers: HeaderAllowList::parse(headers),
            secure_cookies: SecureCookies::default(),
        }
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let parsed: EnvConfig = envy::from_env()?;
        Ok(parsed.apply())
    }

    /// Read configuration from the process environment, with every variable
    /// name prefixed by `prefix` (e.g. `APP_TRUSTED_PROXIES`).
    pub fn from_env_prefixed(prefix: &str) -> Result<Self, ConfigError> {
        let parsed: EnvConfig = envy::prefixed(prefix).from_env()?;
        Ok(parsed.apply())
    }

    /// Read configuration from explicit environment-style pairs.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let parsed: EnvConfig = envy::from_iter(vars)?;
        Ok(parsed.apply())
    }
}
