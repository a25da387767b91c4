//! Apply forwarded metadata from a trusted proxy to a request.

use std::net::IpAddr;

use crate::client::ClientAddr;
use crate::headers::{
    header_str, HeaderAllowList, HeaderCategory, SECURE_PROTO, X_FORWARDED_HOST,
    X_FORWARDED_PORT, X_FORWARDED_PROTO,
};
use crate::network::Trust;
use crate::view::{set_host, set_port, set_secure};

/// Rewrite the effective scheme and host of a request from its forwarded headers.
///
/// Nothing is changed unless `trust` is [`Trust::Trusted`]. When trusted, each
/// header is only applied if its category is in `allowed`:
///
/// - `proto`: `X-Forwarded-Proto: https` sets the scheme to `https` and marks
///   TLS presence with [`ForwardedTls`](crate::ForwardedTls). Any other value is ignored.
/// - `host`: a non-empty `X-Forwarded-Host` replaces the `Host` header and the
///   URI authority, verbatim.
/// - `port`: a numeric `X-Forwarded-Port` replaces the URI authority port.
/// - `for`: the resolved `client` address is recorded as a [`ClientAddr`] extension.
pub fn apply_forwarded<B>(
    request: &mut http::Request<B>,
    trust: Trust,
    allowed: &HeaderAllowList,
    client: &str,
) {
    if !trust.is_trusted() {
        return;
    }

    if allowed.allows(&HeaderCategory::Proto)
        && header_str(request.headers(), &X_FORWARDED_PROTO) == Some(SECURE_PROTO)
    {
        set_secure(request);
    }

    if allowed.allows(&HeaderCategory::Host) {
        if let Some(host) = request
            .headers()
            .get(X_FORWARDED_HOST)
            .filter(|host| !host.is_empty())
            .cloned()
        {
            set_host(request, host);
        }
    }

    if allowed.allows(&HeaderCategory::Port) {
        if let Some(port) = header_str(request.headers(), &X_FORWARDED_PORT)
            .and_then(|port| port.trim().parse::<u16>().ok())
        {
            set_port(request, port);
        }
    }

    if allowed.allows(&HeaderCategory::For) {
        if let Ok(ip) = client.parse::<IpAddr>() {
            request.extensions_mut().insert(ClientAddr(ip));
        }
    }
}
