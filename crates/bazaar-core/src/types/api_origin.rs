//! API origin type.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

use crate::error::{Error, InvalidInputError};

/// Path prefix under which the storefront API is mounted.
pub const API_PREFIX: &str = "/api";

/// A validated network origin for the storefront API.
///
/// The origin may or may not already include the [`API_PREFIX`]; call sites
/// pass paths either way and [`ApiOrigin::endpoint`] removes the duplicate.
///
/// # Example
///
/// ```
/// use bazaar_core::ApiOrigin;
///
/// let origin = ApiOrigin::new("https://shop.example.com/api").unwrap();
/// assert_eq!(origin.endpoint("/api/products"), "https://shop.example.com/api/products");
/// assert_eq!(origin.endpoint("products"), "https://shop.example.com/api/products");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ApiOrigin(Url);

impl ApiOrigin {
    /// Create a new origin from a string, validating the format.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is not absolute, uses plain HTTP for a
    /// non-local host, or carries a query or fragment.
    pub fn new(s: impl AsRef<str>) -> Result<Self, Error> {
        let s = s.as_ref();
        let url = Url::parse(s).map_err(|e| InvalidInputError::ApiOrigin {
            value: s.to_string(),
            reason: e.to_string(),
        })?;

        Self::validate(&url, s)?;

        // Normalize: remove trailing slashes from the path
        let mut normalized = url;
        let trimmed = normalized.path().trim_end_matches('/').to_string();
        normalized.set_path(&trimmed);

        Ok(Self(normalized))
    }

    /// Returns the origin as a string without a trailing slash.
    pub fn as_str(&self) -> &str {
        self.0.as_str().trim_end_matches('/')
    }

    /// Returns the host portion of the origin.
    pub fn host(&self) -> Option<&str> {
        self.0.host_str()
    }

    /// Whether the origin path already ends in [`API_PREFIX`].
    pub fn has_api_prefix(&self) -> bool {
        self.0.path().trim_end_matches('/').ends_with(API_PREFIX)
    }

    /// Normalize a request path against this origin.
    ///
    /// Guarantees exactly one leading `/`, and strips one redundant
    /// [`API_PREFIX`] when the origin already ends in it.
    pub fn normalize_path(&self, path: &str) -> String {
        let path = format!("/{}", path.trim_start_matches('/'));

        if self.has_api_prefix() {
            if path == API_PREFIX {
                return "/".to_string();
            }
            if let Some(rest) = path.strip_prefix(API_PREFIX)
                && (rest.starts_with('/') || rest.starts_with('?'))
            {
                return if rest.starts_with('?') {
                    format!("/{}", rest)
                } else {
                    rest.to_string()
                };
            }
        }

        path
    }

    /// Build the absolute URL for a request path.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.as_str(), self.normalize_path(path))
    }

    /// Validate URL requirements.
    fn validate(url: &Url, original: &str) -> Result<(), Error> {
        let scheme = url.scheme();
        let is_localhost = matches!(
            url.host_str(),
            Some("localhost") | Some("127.0.0.1") | Some("[::1]")
        );

        if scheme != "https" && !(scheme == "http" && is_localhost) {
            return Err(InvalidInputError::ApiOrigin {
                value: original.to_string(),
                reason: "must use HTTPS (HTTP allowed only for localhost)".to_string(),
            }
            .into());
        }

        if url.host_str().is_none() {
            return Err(InvalidInputError::ApiOrigin {
                value: original.to_string(),
                reason: "must have a host".to_string(),
            }
            .into());
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(InvalidInputError::ApiOrigin {
                value: original.to_string(),
                reason: "must not carry a query or fragment".to_string(),
            }
            .into());
        }

        Ok(())
    }
}

impl fmt::Display for ApiOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiOrigin {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for ApiOrigin {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ApiOrigin {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiOrigin::new(&s).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for ApiOrigin {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_https_origin() {
        let origin = ApiOrigin::new("https://shop.example.com").unwrap();
        assert_eq!(origin.host(), Some("shop.example.com"));
        assert!(!origin.has_api_prefix());
    }

    #[test]
    fn valid_localhost_http() {
        let origin = ApiOrigin::new("http://localhost:8080/api").unwrap();
        assert_eq!(origin.host(), Some("localhost"));
        assert!(origin.has_api_prefix());
    }

    #[test]
    fn strips_duplicated_prefix_once() {
        let origin = ApiOrigin::new("https://shop.example.com/api").unwrap();
        assert_eq!(
            origin.endpoint("/api/products"),
            "https://shop.example.com/api/products"
        );
        assert_eq!(
            origin.endpoint("/api/api/products"),
            "https://shop.example.com/api/api/products"
        );
    }

    #[test]
    fn adds_single_leading_separator() {
        let origin = ApiOrigin::new("https://shop.example.com/api/").unwrap();
        assert_eq!(origin.normalize_path("products"), "/products");
        assert_eq!(origin.normalize_path("//products"), "/products");
        assert_eq!(origin.normalize_path(""), "/");
    }

    #[test]
    fn keeps_prefix_when_origin_lacks_it() {
        let origin = ApiOrigin::new("https://shop.example.com").unwrap();
        assert_eq!(
            origin.endpoint("/api/products"),
            "https://shop.example.com/api/products"
        );
    }

    #[test]
    fn prefix_lookalikes_are_not_stripped() {
        let origin = ApiOrigin::new("https://shop.example.com/api").unwrap();
        assert_eq!(origin.normalize_path("/apiary/hives"), "/apiary/hives");
        assert_eq!(origin.normalize_path("/api"), "/");
        assert_eq!(origin.normalize_path("/api?page=2"), "/?page=2");
    }

    #[test]
    fn invalid_http_non_localhost() {
        assert!(ApiOrigin::new("http://shop.example.com").is_err());
    }

    #[test]
    fn invalid_relative_url() {
        assert!(ApiOrigin::new("/api/products").is_err());
    }

    #[test]
    fn rejects_query_strings() {
        assert!(ApiOrigin::new("https://shop.example.com/api?x=1").is_err());
    }
}
