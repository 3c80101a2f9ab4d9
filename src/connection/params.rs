//! Connection URL parsing.
//!
//! This module splits a connection URL of the form
//! `jdbc:<scheme>://<host>[:<port>][/path][?param=value&...]` into the parts
//! the wrapper needs: scheme, host, port and decoded query parameters.

use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// Prefix every connection URL handled by the wrapper starts with.
pub const URL_PREFIX: &str = "jdbc:";

/// Structured view of a connection URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUrl {
    scheme: String,
    host: Option<String>,
    port: Option<u16>,
    query: BTreeMap<String, String>,
}

impl ParsedUrl {
    /// Parse a connection URL.
    ///
    /// Returns `None` when the URL is empty, does not start with
    /// [`URL_PREFIX`], or the remainder is not a valid URI.
    ///
    /// # Example
    ///
    /// ```
    /// use iam_auth_driver::connection::ParsedUrl;
    ///
    /// let parsed = ParsedUrl::parse("jdbc:iammysql://db.example:3306/app?awsRegion=us-east-1").unwrap();
    /// assert_eq!(parsed.scheme(), "iammysql");
    /// assert_eq!(parsed.host(), Some("db.example"));
    /// assert_eq!(parsed.port(), Some(3306));
    /// assert_eq!(parsed.query_param("awsRegion"), Some("us-east-1"));
    ///
    /// assert!(ParsedUrl::parse("mysql://db.example").is_none());
    /// ```
    pub fn parse(url: &str) -> Option<Self> {
        let remainder = url.strip_prefix(URL_PREFIX)?;
        if remainder.is_empty() {
            return None;
        }

        let uri = match Url::parse(remainder) {
            Ok(uri) => uri,
            Err(e) => {
                debug!(error = %e, "Connection URL is not a valid URI");
                return None;
            }
        };

        let host = uri
            .host_str()
            .filter(|host| !host.is_empty())
            .map(str::to_string);

        // The url crate lowercases schemes; keep the text as written
        let scheme = remainder.get(..uri.scheme().len())?.to_string();

        Some(Self {
            scheme,
            host,
            port: uri.port(),
            query: parse_query_string(uri.query()),
        })
    }

    /// URL scheme following the prefix as written, e.g. `iammysql`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Database host, if the URL has an authority component.
    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    /// Explicit port, if present in the URL.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Decoded query parameters.
    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    /// Look up a single decoded query parameter.
    pub fn query_param(&self, key: &str) -> Option<&str> {
        self.query.get(key).map(String::as_str)
    }
}

/// Decode a raw query string into a parameter map.
///
/// Pairs without `=` are skipped, as are pairs that do not decode to valid
/// UTF-8. Keys use form decoding (`+` is a space). A literal `+` in a value is
/// kept as `+` because secret access keys may contain it. When a key repeats,
/// the last value wins.
///
/// # Example
///
/// ```
/// use iam_auth_driver::connection::parse_query_string;
///
/// let params = parse_query_string(Some("awsSecretAccessKey=ab+cd%2Fef&flag"));
/// assert_eq!(params.get("awsSecretAccessKey").map(String::as_str), Some("ab+cd/ef"));
/// assert!(!params.contains_key("flag"));
/// ```
pub fn parse_query_string(query: Option<&str>) -> BTreeMap<String, String> {
    let mut params = BTreeMap::new();

    let Some(query) = query else {
        return params;
    };

    for pair in query.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };

        let key = match urlencoding::decode(&key.replace('+', " ")) {
            Ok(key) => key.into_owned(),
            Err(e) => {
                debug!(error = %e, "Skipping query parameter with undecodable key");
                continue;
            }
        };
        let value = match urlencoding::decode(&value.replace('+', "%2B")) {
            Ok(value) => value.into_owned(),
            Err(e) => {
                debug!(key = %key, error = %e, "Skipping query parameter with undecodable value");
                continue;
            }
        };

        params.insert(key, value);
    }

    params
}

/// Replace the scheme segment `wrapper_scheme` after [`URL_PREFIX`] with
/// `delegate_scheme`.
///
/// URLs not starting with `jdbc:<wrapper_scheme>` have the first occurrence of
/// `wrapper_scheme` replaced instead.
pub(crate) fn rewrite_scheme(url: &str, wrapper_scheme: &str, delegate_scheme: &str) -> String {
    match url
        .strip_prefix(URL_PREFIX)
        .and_then(|rest| rest.strip_prefix(wrapper_scheme))
    {
        Some(rest) => format!("{}{}{}", URL_PREFIX, delegate_scheme, rest),
        None => url.replacen(wrapper_scheme, delegate_scheme, 1),
    }
}
