//! Parsed SIP URI.
//!
//! Field slices point into the bytes the URI was parsed from, which in turn
//! belong to the owning header or start line.

use bytes::Bytes;

use crate::types::value::Param;

/// A parsed `sip:`/`sips:` URI (other schemes are carried opaquely in
/// `host`).
///
/// `sip:user:password@host:port;uri-parameters?headers`
#[derive(Debug, Clone, Default)]
pub struct SipUri {
    pub scheme: Bytes,
    pub user: Option<Bytes>,
    pub password: Option<Bytes>,
    /// Host name, IPv4 literal, or bracketed IPv6 literal.
    pub host: Bytes,
    pub port: Option<u16>,
    pub params: Vec<Param>,
    /// The `?`-introduced header part, verbatim.
    pub headers: Option<Bytes>,
}

impl SipUri {
    pub fn is_sip(&self) -> bool {
        self.scheme.eq_ignore_ascii_case(b"sip") || self.scheme.eq_ignore_ascii_case(b"sips")
    }

    /// Case-insensitive URI parameter presence check.
    pub fn has_param(&self, name: &[u8]) -> bool {
        self.params.iter().any(|p| p.is_named(name))
    }

    /// URI parameter value; `Some(None)` for a flag parameter.
    pub fn param(&self, name: &[u8]) -> Option<Option<&Bytes>> {
        self.params
            .iter()
            .find(|p| p.is_named(name))
            .map(|p| p.value.as_ref())
    }

    /// Whether this URI names a loose router (`;lr`), RFC 3261
    /// Section 19.1.1.
    pub fn is_loose_router(&self) -> bool {
        self.has_param(b"lr")
    }
}
