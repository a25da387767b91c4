//! The parts of a request that forwarded metadata may change.
//!
//! Downstream stages (handlers, cookie security, canonical URL generation)
//! read the effective scheme, host and TLS presence of a request. After the
//! [`TrustedProxy`](crate::TrustedProxy) middleware runs, these reflect the
//! client-facing request when the request came through a trusted proxy, and
//! the request as received otherwise.

use http::uri::{Authority, PathAndQuery, Scheme};

use crate::headers::header_str;

/// Marks a request as having arrived over TLS at a trusted proxy.
///
/// This is only a presence flag: TLS was terminated upstream and nothing about
/// the handshake (cipher, certificates) is known or verified here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ForwardedTls;

/// A snapshot of the effective scheme, host and TLS presence of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestView {
    scheme: Option<Scheme>,
    authority: Option<Authority>,
    host: Option<http::HeaderValue>,
    tls: bool,
}

impl RequestView {
    /// Capture the view of a request.
    pub fn new<B>(request: &http::Request<B>) -> Self {
        Self {
            scheme: request.uri().scheme().cloned(),
            authority: request.uri().authority().cloned(),
            host: request.headers().get(http::header::HOST).cloned(),
            tls: request.extensions().get::<ForwardedTls>().is_some(),
        }
    }

    /// The scheme of the request URI, if it is in absolute form.
    pub fn scheme(&self) -> Option<&Scheme> {
        self.scheme.as_ref()
    }

    /// The authority of the request URI, if it is in absolute form.
    pub fn authority(&self) -> Option<&Authority> {
        self.authority.as_ref()
    }

    /// The `Host` header of the request.
    pub fn host(&self) -> Option<&http::HeaderValue> {
        self.host.as_ref()
    }

    /// Whether TLS presence was set from forwarded metadata.
    pub fn tls(&self) -> bool {
        self.tls
    }

    /// Whether the request should be treated as having arrived securely.
    pub fn is_secure(&self) -> bool {
        self.tls || self.scheme.as_ref() == Some(&Scheme::HTTPS)
    }
}

impl<B> From<&http::Request<B>> for RequestView {
    fn from(request: &http::Request<B>) -> Self {
        Self::new(request)
    }
}

/// Rebuild the request URI in absolute form, applying `update` to its parts.
///
/// Missing parts are filled in first: the scheme defaults to `http`, the
/// authority comes from the `Host` header and the path defaults to `/`.
/// If the result is not a valid URI, the request URI is left unchanged.
fn rebuild_uri<B, F>(request: &mut http::Request<B>, update: F)
where
    F: FnOnce(&mut http::uri::Parts),
{
    let mut parts = request.uri().clone().into_parts();

    if parts.authority.is_none() {
        parts.authority = header_str(request.headers(), &http::header::HOST)
            .and_then(|host| host.parse::<Authority>().ok());
    }
    if parts.scheme.is_none() {
        parts.scheme = Some(Scheme::HTTP);
    }
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }

    update(&mut parts);

    match http::Uri::from_parts(parts) {
        Ok(uri) => *request.uri_mut() = uri,
        Err(error) => {
            tracing::debug!(uri = %request.uri(), %error, "unable to rebuild request uri");
        }
    }
}

/// Mark a request as secure: `https` scheme and TLS presence set.
///
/// An origin-form URI with no `Host` header cannot be made absolute, so its
/// scheme stays unset and only [`ForwardedTls`] records the secure request.
pub(crate) fn set_secure<B>(request: &mut http::Request<B>) {
    rebuild_uri(request, |parts| parts.scheme = Some(Scheme::HTTPS));
    request.extensions_mut().insert(ForwardedTls);
}

/// Replace the `Host` header and the URI authority with `host`, verbatim.
///
/// The `Host` header is always replaced. The URI authority is only replaced
/// when `host` is also a valid URI authority.
pub(crate) fn set_host<B>(request: &mut http::Request<B>, host: http::HeaderValue) {
    let authority = host
        .to_str()
        .ok()
        .and_then(|host| host.parse::<Authority>().ok());

    request.headers_mut().insert(http::header::HOST, host);

    match authority {
        Some(authority) => rebuild_uri(request, |parts| parts.authority = Some(authority)),
        None => {
            tracing::debug!("forwarded host is not a valid uri authority");
        }
    }
}

/// Replace the port of the URI authority.
pub(crate) fn set_port<B>(request: &mut http::Request<B>, port: u16) {
    rebuild_uri(request, |parts| {
        if let Some(authority) = &parts.authority {
            let host = authority.host();
            let with_port = if host.contains(':') && !host.starts_with('[') {
                format!("[{host}]:{port}")
            } else {
                format!("{host}:{port}")
            };
            if let Ok(authority) = with_port.parse::<Authority>() {
                parts.authority = Some(authority);
            }
        }
    });
}
