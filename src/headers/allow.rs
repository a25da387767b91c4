//! Which forwarded headers may be applied from a trusted proxy.

use std::fmt;
use std::str::FromStr;

use super::parser::comma_list;

/// A category of forwarded metadata.
///
/// Categories name a kind of information rather than a literal header,
/// so `proto` covers `X-Forwarded-Proto`, `host` covers `X-Forwarded-Host`
/// and so on. Unrecognized names are kept as [`HeaderCategory::Other`] and
/// never match anything.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HeaderCategory {
    /// The forwarded protocol.
    Proto,

    /// The forwarded host.
    Host,

    /// The forwarded port.
    Port,

    /// The forwarded client address.
    For,

    /// A category this crate does not act upon.
    Other(Box<str>),
}

impl HeaderCategory {
    /// The configuration name of this category.
    pub fn as_str(&self) -> &str {
        match self {
            HeaderCategory::Proto => "proto",
            HeaderCategory::Host => "host",
            HeaderCategory::Port => "port",
            HeaderCategory::For => "for",
            HeaderCategory::Other(name) => name,
        }
    }
}

impl fmt::Display for HeaderCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for HeaderCategory {
    fn from(name: &str) -> Self {
        match name {
            "proto" => HeaderCategory::Proto,
            "host" => HeaderCategory::Host,
            "port" => HeaderCategory::Port,
            "for" => HeaderCategory::For,
            other => HeaderCategory::Other(other.into()),
        }
    }
}

impl FromStr for HeaderCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(s.into())
    }
}

/// The set of forwarded header categories which are applied
/// when a request arrives from a trusted proxy.
///
/// Order and duplicates are preserved as configured; only membership matters.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeaderAllowList {
    categories: Vec<HeaderCategory>,
}

impl HeaderAllowList {
    /// Create an allow list from explicit categories.
    pub fn new<I>(categories: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<HeaderCategory>,
    {
        Self {
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a comma-separated list of category names.
    ///
    /// An empty string yields the default list, `proto,host`.
    pub fn parse(list: &str) -> Self {
        if list.is_empty() {
            return Self::default();
        }

        Self::new(comma_list(list))
    }

    /// Check whether a category is allowed.
    pub fn allows(&self, category: &HeaderCategory) -> bool {
        self.categories.contains(category)
    }

    /// Iterate over the configured categories.
    pub fn iter(&self) -> impl Iterator<Item = &HeaderCategory> {
        self.categories.iter()
    }

    /// The number of configured entries, counting duplicates.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Whether no category is allowed at all.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

impl Default for HeaderAllowList {
    fn default() -> Self {
        Self {
            categories: vec![HeaderCategory::Proto, HeaderCategory::Host],
        }
    }
}

impl fmt::Display for HeaderAllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for category in self.iter() {
            if !first {
                f.write_str(",")?;
            }
            first = false;
            write!(f, "{category}")?;
        }
        Ok(())
    }
}

impl FromStr for HeaderAllowList {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}
