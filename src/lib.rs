//! # Trusted Proxy
//!
//! `trusted_proxy` decides whether forwarded request metadata can be trusted
//! when a `hyper` service runs behind one or more reverse proxies.
//!
//! Only requests whose resolved client address falls inside a configured set
//! of proxy networks have their `X-Forwarded-Proto` and `X-Forwarded-Host`
//! (and optionally `X-Forwarded-Port` and `X-Forwarded-For`) applied to the
//! effective scheme and host of the request. Everyone else is passed through
//! untouched, so a client can never upgrade or downgrade the scheme, or
//! replace the host, seen by downstream security decisions.
//!
//! ```no_run
//! use trusted_proxy::{ProxyTrustConfig, TrustedProxyLayer};
//!
//! # fn main() -> Result<(), trusted_proxy::ConfigError> {
//! let layer = TrustedProxyLayer::new(ProxyTrustConfig::from_env()?);
//! # let _ = layer;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod apply;
pub mod client;
pub mod config;
pub mod headers;
pub mod middleware;
pub mod network;
pub mod view;

pub use apply::apply_forwarded;
pub use client::{peer_addr, resolve_client_addr, ClientAddr};
pub use config::{ConfigError, ProxyTrustConfig, SecureCookies};
pub use headers::{HeaderAllowList, HeaderCategory};
pub use middleware::{TrustedProxy, TrustedProxyLayer};
pub use network::{NetworkSet, Trust};
pub use view::{ForwardedTls, RequestView};
