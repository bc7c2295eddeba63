//! Page location and origin
//!
//! `Location` stands in for `window.location`: the URL a page is served
//! from. `Origin` is its `scheme://host[:port]` prefix.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::{NavError, Result};

/// Scheme, host and optional non-default port
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl Origin {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: Option<u16>) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.host)?;
        if let Some(port) = self.port {
            write!(f, ":{port}")?;
        }
        Ok(())
    }
}

/// The URL of the page being processed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    url: Url,
}

impl Location {
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input).map_err(|e| NavError::InvalidLocation {
            url: input.to_string(),
            reason: e.to_string(),
        })?;
        Self::from_url(url)
    }

    /// Only URLs with a host have an origin worth injecting against
    pub fn from_url(url: Url) -> Result<Self> {
        if url.host_str().is_none() {
            return Err(NavError::InvalidLocation {
                url: url.to_string(),
                reason: "URL has no host".to_string(),
            });
        }
        Ok(Self { url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn pathname(&self) -> &str {
        self.url.path()
    }

    /// The port is `None` when absent or equal to the scheme default,
    /// matching `window.location.port` being empty in that case.
    pub fn origin(&self) -> Origin {
        Origin::new(
            self.url.scheme(),
            self.url.host_str().unwrap_or_default(),
            self.url.port(),
        )
    }

    /// Absolute URL of `path` on this page's origin
    pub fn resolve_path(&self, path: &str) -> Result<Url> {
        let joined = format!("{}{}", self.origin(), path);
        Url::parse(&joined).map_err(|e| NavError::InvalidLocation {
            url: joined,
            reason: e.to_string(),
        })
    }
}

impl FromStr for Location {
    type Err = NavError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.url, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_without_port() {
        let location = Location::parse("https://shop.test/products?id=1#top").unwrap();
        assert_eq!(location.origin().to_string(), "https://shop.test");
        assert_eq!(location.pathname(), "/products");
    }

    #[test]
    fn test_origin_with_port() {
        let location = Location::parse("http://localhost:3000/a/b").unwrap();
        let origin = location.origin();
        assert_eq!(origin.port(), Some(3000));
        assert_eq!(origin.to_string(), "http://localhost:3000");
    }

    #[test]
    fn test_default_port_is_elided() {
        let location = Location::parse("https://site.example:443/").unwrap();
        assert_eq!(location.origin().to_string(), "https://site.example");

        let location = Location::parse("http://site.example:80/x").unwrap();
        assert_eq!(location.origin().to_string(), "http://site.example");
    }

    #[test]
    fn test_origin_display_from_parts() {
        assert_eq!(Origin::new("https", "a.test", None).to_string(), "https://a.test");
        assert_eq!(
            Origin::new("http", "a.test", Some(8080)).to_string(),
            "http://a.test:8080"
        );
    }

    #[test]
    fn test_ipv6_host() {
        let location = Location::parse("http://[::1]:8080/").unwrap();
        assert_eq!(location.origin().to_string(), "http://[::1]:8080");
    }

    #[test]
    fn test_resolve_path() {
        let location = Location::parse("https://site.example:8443/products/42").unwrap();
        assert_eq!(
            location.resolve_path("/nav.html").unwrap().as_str(),
            "https://site.example:8443/nav.html"
        );
    }

    #[test]
    fn test_rejects_hostless_and_garbage() {
        assert!(matches!(
            Location::parse("data:text/html,hi"),
            Err(NavError::InvalidLocation { .. })
        ));
        assert!(matches!(
            "not a url".parse::<Location>(),
            Err(NavError::InvalidLocation { .. })
        ));
    }
}
