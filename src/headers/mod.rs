//! Forwarded request headers.
//!
//! The de-facto `X-Forwarded-*` family, plus `X-Real-IP`, as set by
//! reverse proxies such as nginx in front of the service.

use std::borrow::Cow;

pub mod allow;
pub(crate) mod parser;

pub use allow::{HeaderAllowList, HeaderCategory};

/// The `X-Real-IP` header, a single address set by the proxy directly in front of the service.
pub const X_REAL_IP: http::HeaderName = http::header::HeaderName::from_static("x-real-ip");

/// The `X-Forwarded-For` header, a comma-separated chain of addresses where the first
/// entry is the originating client.
pub const X_FORWARDED_FOR: http::HeaderName =
    http::header::HeaderName::from_static("x-forwarded-for");

/// The `X-Forwarded-Host` header, the original host requested by the client in the `Host` HTTP request header.
pub const X_FORWARDED_HOST: http::HeaderName =
    http::header::HeaderName::from_static("x-forwarded-host");

/// The `X-Forwarded-Proto` header, the protocol (HTTP or HTTPS) that a client used to connect to the proxy.
pub const X_FORWARDED_PROTO: http::HeaderName =
    http::header::HeaderName::from_static("x-forwarded-proto");

/// The `X-Forwarded-Port` header, the port the client connected to on the proxy.
pub const X_FORWARDED_PORT: http::HeaderName =
    http::header::HeaderName::from_static("x-forwarded-port");

/// The only `X-Forwarded-Proto` value which upgrades a request to a secure scheme.
pub const SECURE_PROTO: &str = "https";

/// Read a header as a string, ignoring values with opaque bytes.
pub(crate) fn header_str<'h>(headers: &'h http::HeaderMap, name: &http::HeaderName) -> Option<&'h str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Read a non-empty header as a string, replacing opaque bytes rather than ignoring the value.
pub(crate) fn header_lossy<'h>(
    headers: &'h http::HeaderMap,
    name: &http::HeaderName,
) -> Option<Cow<'h, str>> {
    headers
        .get(name)
        .filter(|value| !value.is_empty())
        .map(|value| String::from_utf8_lossy(value.as_bytes()))
}
