//! URI parsing.
//!
//! Backends are addressed by RFC 3986 generic-syntax URIs:
//!
//! ```text
//! scheme:[//[userinfo@]host[:port]]path[?query][#fragment]
//! ```
//!
//! `RawUri::parse` splits a URI into borrowed subslices of the input. It
//! performs no percent-decoding; re-encoding and decoding of escapes is the
//! caller's responsibility.

use std::fmt;

use crate::error::{Error, Result};

/// The scheme reserved for addressing plugin-loaded backends:
/// `rbh:<plugin>[:<fsname>]`.
pub const RBH_SCHEME: &str = "rbh";

/// The authority component of a URI: `[userinfo@]host[:port]`.
///
/// Every field may be empty; an empty authority (`scheme:///path`) parses to
/// a default `Authority` and is distinct from an absent one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Authority<'a> {
    pub userinfo: Option<&'a str>,
    pub host: Option<&'a str>,
    pub port: Option<&'a str>,
}

/// A URI split into its generic-syntax components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawUri<'a> {
    pub scheme: &'a str,
    pub authority: Option<Authority<'a>>,
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub fragment: Option<&'a str>,
}

fn is_scheme_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
}

fn parse_authority(string: &str) -> Authority<'_> {
    // string = [userinfo@]host[:port]
    let (userinfo, rest) = match string.find('@') {
        Some(at) => (Some(&string[..at]), &string[at + 1..]),
        None => (None, string),
    };

    // rest = host[:port]
    let (host, port) = match rest.rfind(':') {
        Some(colon) => (&rest[..colon], Some(&rest[colon + 1..])),
        None => (rest, None),
    };

    Authority {
        userinfo,
        host: if host.is_empty() { None } else { Some(host) },
        port,
    }
}

impl<'a> RawUri<'a> {
    /// Split `string` into URI components.
    ///
    /// # Errors
    /// Returns `invalid-input` if the scheme is malformed (it must start
    /// with a letter and contain only `[A-Za-z0-9+-.]`) or the `:`
    /// terminating it is missing.
    pub fn parse(string: &'a str) -> Result<Self> {
        if !string.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(Error::invalid_input(format!(
                "URI scheme must start with a letter: {string:?}"
            )));
        }

        let colon = string
            .find(|c: char| !is_scheme_char(c))
            .filter(|&i| string[i..].starts_with(':'))
            .ok_or_else(|| {
                Error::invalid_input(format!("URI has no scheme terminator: {string:?}"))
            })?;
        let scheme: &str = &string[..colon];
        let rest: &str = &string[colon + 1..];

        // rest = [//authority]path[?query][#fragment]
        let (rest, fragment) = match rest.rfind('#') {
            Some(hash) => (&rest[..hash], Some(&rest[hash + 1..])),
            None => (rest, None),
        };

        // rest = [//authority]path[?query]
        let (rest, query) = match rest.rfind('?') {
            Some(mark) => (&rest[..mark], Some(&rest[mark + 1..])),
            None => (rest, None),
        };

        // rest = [//authority]path
        let Some(after) = rest.strip_prefix("//") else {
            return Ok(RawUri {
                scheme,
                authority: None,
                path: rest,
                query,
                fragment,
            });
        };

        // after = [userinfo@]host[:port]path, path empty or starting with '/'
        let (authority, path) = match after.find('/') {
            Some(slash) => (&after[..slash], &after[slash..]),
            None => (after, ""),
        };

        Ok(RawUri {
            scheme,
            authority: Some(parse_authority(authority)),
            path,
            query,
            fragment,
        })
    }
}

impl fmt::Display for RawUri<'_> {
    /// Reassemble the URI. The output is parse-equivalent to the string the
    /// components came from.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.scheme)?;
        if let Some(authority) = &self.authority {
            write!(f, "//")?;
            if let Some(userinfo) = authority.userinfo {
                write!(f, "{userinfo}@")?;
            }
            if let Some(host) = authority.host {
                write!(f, "{host}")?;
            }
            if let Some(port) = authority.port {
                write!(f, ":{port}")?;
            }
        }
        write!(f, "{}", self.path)?;
        if let Some(query) = self.query {
            write!(f, "?{query}")?;
        }
        if let Some(fragment) = self.fragment {
            write!(f, "#{fragment}")?;
        }
        Ok(())
    }
}
