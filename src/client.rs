//! Best-guess originating address of a request.
//!
//! The address is derived, in order of precedence, from:
//!
//! 1. `X-Real-IP`, a single address set by the proxy directly in front of the service.
//! 2. The first entry of `X-Forwarded-For`, the originating client by convention.
//! 3. The transport peer address, without its port.
//!
//! The result is not validated; deciding whether it is a real IP address
//! (and whether it is trusted) is left to [`NetworkSet::evaluate`](crate::NetworkSet::evaluate).

use std::fmt;
use std::net::IpAddr;

use hyperdriver::info::ConnectionInfo;

use crate::headers::parser::first_entry;
use crate::headers::{header_lossy, X_FORWARDED_FOR, X_REAL_IP};

/// The client address, as resolved for a trusted request.
///
/// Inserted into the request extensions when the `for` category is allowed
/// and the resolved address is a valid IP address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientAddr(pub IpAddr);

impl ClientAddr {
    /// The client IP address.
    pub fn ip(&self) -> IpAddr {
        self.0
    }
}

impl fmt::Display for ClientAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Resolve the client address from request headers and the transport peer address.
///
/// The first non-empty header wins, even when its value is not a valid
/// address. Opaque bytes are replaced, so such a value never parses as an IP.
///
/// `peer` is expected as `host:port` or `[ipv6]:port`. When it cannot be
/// split, it is returned unmodified.
pub fn resolve_client_addr(headers: &http::HeaderMap, peer: &str) -> String {
    if let Some(ip) = header_lossy(headers, &X_REAL_IP) {
        return ip.into_owned();
    }

    if let Some(chain) = header_lossy(headers, &X_FORWARDED_FOR) {
        return first_entry(&chain).unwrap_or_default().to_owned();
    }

    match split_host_port(peer) {
        Some(host) => host.to_owned(),
        None => peer.to_owned(),
    }
}

/// Split off the host of a `host:port` pair, removing IPv6 brackets.
///
/// Returns `None` when the address is not in either form.
fn split_host_port(addr: &str) -> Option<&str> {
    if let Some(rest) = addr.strip_prefix('[') {
        let (host, port) = rest.split_once(']')?;
        let port = port.strip_prefix(':')?;
        if host.contains(['[', ']']) || port.contains(['[', ']', ':']) {
            return None;
        }
        return Some(host);
    }

    let (host, port) = addr.rsplit_once(':')?;
    if host.contains([':', '[', ']']) || port.contains(']') {
        return None;
    }

    Some(host)
}

/// The transport peer address of a request, rendered as `host:port`.
///
/// Read from the [`ConnectionInfo`] extension added by the server. Requests
/// without connection info, or from a non-TCP transport, yield an empty string,
/// which never resolves to a trusted address.
pub fn peer_addr<B>(request: &http::Request<B>) -> String {
    match request.extensions().get::<ConnectionInfo>() {
        Some(info) => match info.remote_addr.clone().canonical().tcp() {
            Some(remote) => remote.to_string(),
            None => String::new(),
        },
        None => {
            tracing::trace!("No connection info found in request extensions");
            String::new()
        }
    }
}
