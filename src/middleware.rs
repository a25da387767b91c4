//! Middleware to apply forwarded headers from trusted proxies.
//!
//! When a service sits behind a reverse proxy, the original client-facing
//! protocol and host are only available from headers like `X-Forwarded-Proto`
//! and `X-Forwarded-Host`. Any client can send those headers, so they are
//! only applied when the request comes from a configured proxy address.
//!
//! The middleware never rejects a request: untrusted requests continue to
//! the inner service exactly as they were received.

use std::sync::Arc;

use crate::apply::apply_forwarded;
use crate::client::{peer_addr, resolve_client_addr};
use crate::config::ProxyTrustConfig;

/// Layer to apply forwarded headers from trusted proxies.
#[derive(Debug, Clone, Default)]
pub struct TrustedProxyLayer {
    config: Arc<ProxyTrustConfig>,
}

impl TrustedProxyLayer {
    /// Create a new `TrustedProxyLayer` with the given configuration.
    pub fn new(config: impl Into<Arc<ProxyTrustConfig>>) -> Self {
        Self {
            config: config.into(),
        }
    }

    /// The configuration shared by services created from this layer.
    pub fn config(&self) -> &ProxyTrustConfig {
        &self.config
    }
}

impl From<ProxyTrustConfig> for TrustedProxyLayer {
    fn from(config: ProxyTrustConfig) -> Self {
        Self::new(config)
    }
}

impl<S> tower::layer::Layer<S> for TrustedProxyLayer {
    type Service = TrustedProxy<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TrustedProxy {
            inner,
            config: self.config.clone(),
        }
    }
}

/// Middleware to apply forwarded headers from trusted proxies.
#[derive(Debug, Clone)]
pub struct TrustedProxy<S> {
    inner: S,
    config: Arc<ProxyTrustConfig>,
}

impl<S> TrustedProxy<S> {
    /// Create a new `TrustedProxy` middleware.
    pub fn new(inner: S, config: impl Into<Arc<ProxyTrustConfig>>) -> Self {
        Self {
            inner,
            config: config.into(),
        }
    }

    /// Create a new `TrustedProxyLayer` with the given configuration.
    pub fn layer(config: impl Into<Arc<ProxyTrustConfig>>) -> TrustedProxyLayer {
        TrustedProxyLayer::new(config)
    }

    /// The trusted proxy configuration.
    pub fn config(&self) -> &ProxyTrustConfig {
        &self.config
    }

    /// Get a reference to the inner service.
    pub fn service(&self) -> &S {
        &self.inner
    }

    /// Unwrap the inner service
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Resolve the client, decide trust and apply forwarded headers to a request.
    pub fn apply<B>(&self, req: &mut http::Request<B>) {
        let peer = peer_addr(req);
        let client = resolve_client_addr(req.headers(), &peer);
        let trust = self.config.proxies.evaluate(&client);

        tracing::trace!(%client, %trust, "resolved request source");

        apply_forwarded(req, trust, &self.config.headers, &client);
    }
}

impl<S, B> tower::Service<http::Request<B>> for TrustedProxy<S>
where
    S: tower::Service<http::Request<B>>,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(
        &mut self,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: http::Request<B>) -> Self::Future {
        self.apply(&mut req);
        self.inner.call(req)
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, SocketAddr};

    use hyperdriver::info::{BraidAddr, ConnectionInfo};
    use tower::layer::Layer;
    use tower::ServiceExt;

    use super::*;
    use crate::headers::{X_FORWARDED_FOR, X_FORWARDED_HOST, X_FORWARDED_PROTO, X_REAL_IP};
    use crate::view::RequestView;

    fn connection_info(remote: &str) -> ConnectionInfo {
        ConnectionInfo::<BraidAddr> {
            local_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 80).into(),
            remote_addr: remote.parse::<SocketAddr>().unwrap().into(),
        }
    }

    fn request(remote: &str) -> http::Request<()> {
        let mut request = http::Request::get("http://localhost/test")
            .header(http::header::HOST, "localhost")
            .header(X_FORWARDED_PROTO, "https")
            .header(X_FORWARDED_HOST, "example.com")
            .body(())
            .unwrap();
        request.extensions_mut().insert(connection_info(remote));
        request
    }

    async fn process(config: ProxyTrustConfig, request: http::Request<()>) -> http::Request<()> {
        let service = TrustedProxy::new(
            tower::service_fn(|req: http::Request<()>| async { Ok::<_, ()>(req) }),
            config,
        );

        service.oneshot(request).await.unwrap()
    }

    #[tokio::test]
    async fn trusted_ip_with_https() {
        let config = ProxyTrustConfig::new("127.0.0.1", "proto,host");

        let response = process(config, request("127.0.0.1:12345")).await;
        let view = RequestView::new(&response);

        assert_eq!(view.scheme(), Some(&http::uri::Scheme::HTTPS));
        assert!(view.tls());
        assert_eq!(response.headers()[http::header::HOST], "example.com");
        assert_eq!(response.uri(), "https://example.com/test");
    }

    #[tokio::test]
    async fn untrusted_ip_ignored() {
        let config = ProxyTrustConfig::new("127.0.0.1", "proto,host");

        let mut incoming = request("192.168.1.100:54321");
        incoming
            .headers_mut()
            .insert(X_FORWARDED_HOST, "malicious.com".parse().unwrap());
        let before = RequestView::new(&incoming);

        let response = process(config, incoming).await;

        assert_eq!(RequestView::new(&response), before);
        assert!(!RequestView::new(&response).tls());
        assert_eq!(response.headers()[http::header::HOST], "localhost");
    }

    #[tokio::test]
    async fn cidr_range() {
        let config = ProxyTrustConfig::new("192.168.1.0/24", "proto");

        let response = process(config, request("192.168.1.50:12345")).await;
        assert_eq!(response.uri().scheme(), Some(&http::uri::Scheme::HTTPS));
    }

    #[tokio::test]
    async fn selective_headers() {
        let config = ProxyTrustConfig::new("127.0.0.1", "proto");

        let response = process(config, request("127.0.0.1:12345")).await;

        assert_eq!(response.uri(), "https://localhost/test");
        assert_eq!(response.headers()[http::header::HOST], "localhost");
    }

    #[tokio::test]
    async fn no_configuration() {
        let response = process(ProxyTrustConfig::default(), request("127.0.0.1:12345")).await;

        assert_eq!(response.uri(), "http://localhost/test");
        assert!(!RequestView::new(&response).tls());
    }

    #[tokio::test]
    async fn multiple_proxies() {
        for (remote, trusted) in [
            ("127.0.0.1:12345", true),
            ("10.0.0.1:12345", true),
            ("192.168.1.1:12345", false),
        ] {
            let config = ProxyTrustConfig::new("127.0.0.1,10.0.0.1", "proto");
            let response = process(config, request(remote)).await;

            assert_eq!(
                RequestView::new(&response).is_secure(),
                trusted,
                "request from {remote}"
            );
        }
    }

    #[tokio::test]
    async fn real_ip_header_decides_trust() {
        let config = ProxyTrustConfig::new("127.0.0.1", "");

        // The real IP header takes precedence over the peer address.
        let mut spoofed = request("192.168.1.100:54321");
        spoofed
            .headers_mut()
            .insert(X_REAL_IP, "127.0.0.1".parse().unwrap());
        let response = process(config.clone(), spoofed).await;
        assert!(RequestView::new(&response).is_secure());

        // The first forwarded address is the one evaluated, not the peer.
        let mut forwarded = request("127.0.0.1:12345");
        forwarded
            .headers_mut()
            .insert(X_FORWARDED_FOR, "203.0.113.1, 127.0.0.1".parse().unwrap());
        let response = process(config, forwarded).await;
        assert!(!RequestView::new(&response).is_secure());
    }

    #[tokio::test]
    async fn opaque_forwarding_headers_are_not_skipped() {
        let config = ProxyTrustConfig::new("127.0.0.1", "proto,host");

        let mut forwarded = request("127.0.0.1:1");
        forwarded.headers_mut().insert(
            X_FORWARDED_FOR,
            http::HeaderValue::from_bytes(b"203.0.113.1, \xff").unwrap(),
        );
        let before = RequestView::new(&forwarded);
        let response = process(config.clone(), forwarded).await;
        assert_eq!(RequestView::new(&response), before);

        let mut real_ip = request("127.0.0.1:1");
        real_ip
            .headers_mut()
            .insert(X_REAL_IP, http::HeaderValue::from_bytes(b"\xff").unwrap());
        real_ip
            .headers_mut()
            .insert(X_FORWARDED_FOR, "127.0.0.1".parse().unwrap());
        let response = process(config, real_ip).await;
        assert!(!RequestView::new(&response).is_secure());
    }

    #[tokio::test]
    async fn missing_connection_info_is_untrusted() {
        let config = ProxyTrustConfig::new("127.0.0.1", "proto,host");

        let request = http::Request::get("http://localhost/test")
            .header(X_FORWARDED_PROTO, "https")
            .body(())
            .unwrap();
        let response = process(config, request).await;

        assert_eq!(response.uri(), "http://localhost/test");
    }

    #[tokio::test]
    async fn ipv6_peer() {
        let config = ProxyTrustConfig::new("::1", "proto");

        let response = process(config, request("[::1]:8080")).await;
        assert!(RequestView::new(&response).is_secure());
    }

    #[tokio::test]
    async fn layer_shares_config() {
        let layer = TrustedProxyLayer::new(ProxyTrustConfig::new("127.0.0.1", "host"));
        assert_eq!(layer.config().proxies.len(), 1);

        let service =
            layer.layer(tower::service_fn(|req: http::Request<()>| async { Ok::<_, ()>(req) }));
        assert_eq!(service.config(), layer.config());

        let response = service.oneshot(request("127.0.0.1:1")).await.unwrap();
        assert_eq!(response.uri(), "http://example.com/test");
    }
}
