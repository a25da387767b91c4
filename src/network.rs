//! Trusted proxy networks.
//!
//! A [`NetworkSet`] is the administrator-configured list of networks whose
//! requests may carry forwarded metadata. It is parsed once, never mutated,
//! and shared by every request.

use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use ipnetwork::IpNetwork;

use crate::headers::parser::comma_list;

/// Whether a request source may supply forwarded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trust {
    /// The source is a configured proxy.
    Trusted,

    /// The source is anyone else, or could not be identified.
    Untrusted,
}

impl Trust {
    /// Check if the source is trusted.
    pub fn is_trusted(self) -> bool {
        matches!(self, Trust::Trusted)
    }
}

impl From<bool> for Trust {
    fn from(trusted: bool) -> Self {
        if trusted {
            Trust::Trusted
        } else {
            Trust::Untrusted
        }
    }
}

impl fmt::Display for Trust {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trust::Trusted => f.write_str("trusted"),
            Trust::Untrusted => f.write_str("untrusted"),
        }
    }
}

/// An immutable set of trusted networks.
///
/// The default set is empty, and an empty set trusts nobody.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct NetworkSet {
    networks: Vec<IpNetwork>,
}

/// Normalize a bare address to a host-only prefix.
fn host_prefix(entry: &str) -> String {
    if entry.contains('/') {
        entry.to_owned()
    } else if entry.contains(':') {
        format!("{entry}/128")
    } else {
        format!("{entry}/32")
    }
}

impl NetworkSet {
    /// Create a set from already parsed networks.
    pub fn new<I>(networks: I) -> Self
    where
        I: IntoIterator<Item = IpNetwork>,
    {
        Self {
            networks: networks.into_iter().collect(),
        }
    }

    /// Parse a comma-separated list of addresses and CIDR blocks.
    ///
    /// Bare addresses are treated as a single host (`/32` or `/128`). Entries
    /// which do not parse are dropped with a warning; this never fails.
    pub fn parse(list: &str) -> Self {
        let mut networks = Vec::new();

        for entry in comma_list(list) {
            if entry.is_empty() {
                continue;
            }

            match host_prefix(entry).parse::<IpNetwork>() {
                Ok(network) => networks.push(network),
                Err(error) => {
                    tracing::warn!(%entry, %error, "ignoring invalid trusted proxy entry");
                }
            }
        }

        Self { networks }
    }

    /// The configured networks, in configuration order.
    pub fn networks(&self) -> &[IpNetwork] {
        &self.networks
    }

    /// The number of configured networks.
    pub fn len(&self) -> usize {
        self.networks.len()
    }

    /// Whether the set trusts nobody.
    pub fn is_empty(&self) -> bool {
        self.networks.is_empty()
    }

    /// Check if an address falls inside any of the networks.
    ///
    /// IPv4-mapped IPv6 addresses are compared as IPv4.
    pub fn contains(&self, ip: IpAddr) -> bool {
        let ip = ip.to_canonical();
        self.networks.iter().any(|network| network.contains(ip))
    }

    /// Decide whether a resolved client address is a trusted proxy.
    ///
    /// The address is not required to be valid: anything which does not
    /// parse as an IP literal is untrusted, as is every address when the set
    /// is empty.
    pub fn evaluate(&self, address: &str) -> Trust {
        if self.networks.is_empty() {
            return Trust::Untrusted;
        }

        match address.parse::<IpAddr>() {
            Ok(ip) => self.contains(ip).into(),
            Err(_) => Trust::Untrusted,
        }
    }
}

impl FromStr for NetworkSet {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl FromIterator<IpNetwork> for NetworkSet {
    fn from_iter<T: IntoIterator<Item = IpNetwork>>(iter: T) -> Self {
        Self::new(iter)
    }
}
