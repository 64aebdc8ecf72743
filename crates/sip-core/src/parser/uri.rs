//! The SIP URI grammar (RFC 3261 Section 19.1/25.1).
//!
//! `sip:user:password@host:port;uri-parameters?headers`
//!
//! The address grammars feed every angle-quoted or bare URI through here; a
//! failure marks the owning header value bad rather than failing the whole
//! header. Non-SIP schemes (`tel:`, `http:`, ...) are accepted and carried
//! opaquely.

use bytes::Bytes;
use nom::bytes::complete::{tag, take_while1};

use crate::error::{Error, Result};
use crate::parser::params::parse_params;
use crate::parser::scan::trim;
use crate::types::uri::SipUri;

fn is_scheme_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b'+' | b'-' | b'.')
}

fn scheme(input: &[u8]) -> crate::parser::ParseResult<&[u8]> {
    let (rest, s) = take_while1(is_scheme_char)(input)?;
    let (rest, _) = tag(b":")(rest)?;
    Ok((rest, s))
}

/// Parses `input` (a subslice of `base`) into a [`SipUri`].
pub fn parse_uri(base: &Bytes, input: &[u8]) -> Result<SipUri> {
    let input = trim(input);
    let (rest, scheme_bytes) =
        scheme(input).map_err(|_| Error::InvalidUri("missing scheme".into()))?;
    if scheme_bytes.is_empty() || !scheme_bytes[0].is_ascii_alphabetic() {
        return Err(Error::InvalidUri("bad scheme".into()));
    }

    let mut uri = SipUri {
        scheme: base.slice_ref(scheme_bytes),
        ..SipUri::default()
    };

    if !uri.is_sip() {
        // Opaque absolute URI; keep the body in `host`.
        if rest.is_empty() {
            return Err(Error::InvalidUri("empty URI body".into()));
        }
        uri.host = base.slice_ref(rest);
        return Ok(uri);
    }

    // Separate the ?headers part first
    let (core, headers) = match rest.iter().position(|&b| b == b'?') {
        Some(q) => (&rest[..q], Some(&rest[q + 1..])),
        None => (rest, None),
    };
    uri.headers = headers.map(|h| base.slice_ref(h));

    // Then the ;parameters
    let (core, param_part) = match core.iter().position(|&b| b == b';') {
        Some(s) => (&core[..s], Some(&core[s..])),
        None => (core, None),
    };
    if let Some(params) = param_part {
        let list = parse_params(base, params);
        if !list.ok {
            return Err(Error::InvalidUri("malformed uri parameters".into()));
        }
        uri.params = list.params;
    }

    // userinfo
    let hostport = match core.iter().rposition(|&b| b == b'@') {
        Some(at) => {
            let userinfo = &core[..at];
            match userinfo.iter().position(|&b| b == b':') {
                Some(colon) => {
                    uri.user = Some(base.slice_ref(&userinfo[..colon]));
                    uri.password = Some(base.slice_ref(&userinfo[colon + 1..]));
                }
                None => uri.user = Some(base.slice_ref(userinfo)),
            }
            &core[at + 1..]
        }
        None => core,
    };

    // host [":" port]
    let (host, port) = if hostport.first() == Some(&b'[') {
        let close = hostport
            .iter()
            .position(|&b| b == b']')
            .ok_or_else(|| Error::InvalidUri("unterminated IPv6 literal".into()))?;
        let host = &hostport[..close + 1];
        let rest = &hostport[close + 1..];
        match rest.split_first() {
            None => (host, None),
            Some((&b':', p)) => (host, Some(p)),
            Some(_) => return Err(Error::InvalidUri("garbage after IPv6 literal".into())),
        }
    } else {
        match hostport.iter().position(|&b| b == b':') {
            Some(colon) => (&hostport[..colon], Some(&hostport[colon + 1..])),
            None => (hostport, None),
        }
    };

    if host.is_empty() || !(host[0].is_ascii_alphanumeric() || host[0] == b'[') {
        return Err(Error::InvalidUri("bad host".into()));
    }
    uri.host = base.slice_ref(host);

    if let Some(port) = port {
        if port.is_empty() || !port.iter().all(|b| b.is_ascii_digit()) {
            return Err(Error::InvalidUri("bad port".into()));
        }
        let n: u32 = std::str::from_utf8(port)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| Error::InvalidUri("bad port".into()))?;
        let n = u16::try_from(n).map_err(|_| Error::InvalidUri("port out of range".into()))?;
        uri.port = Some(n);
    }

    Ok(uri)
}
