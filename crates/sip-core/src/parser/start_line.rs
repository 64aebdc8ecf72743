//! Start-line parsing (RFC 3261 Section 7.1/7.2).
//!
//! A line that begins with a SIP version token is a status line; otherwise
//! it must begin with a known method token:
//!
//! `Request-Line  = Method SP Request-URI SP SIP-Version`
//! `Status-Line   = SIP-Version SP Status-Code SP Reason-Phrase`

use bytes::Bytes;
use nom::bytes::complete::{tag, tag_no_case, take_while1};
use nom::combinator::recognize;
use nom::sequence::pair;

use crate::error::{Error, Result};
use crate::parser::scan::{atoi, trim, trim_start};
use crate::parser::uri::parse_uri;
use crate::parser::whitespace::is_ws;
use crate::types::method::Method;
use crate::types::uri::SipUri;

/// Request line of a SIP request.
#[derive(Debug, Clone)]
pub struct RequestLine {
    pub method: Method,
    pub uri_str: Bytes,
    pub uri: SipUri,
    pub version: Bytes,
}

/// Status line of a SIP response.
#[derive(Debug, Clone)]
pub struct ResponseLine {
    pub version: Bytes,
    pub code: u16,
    pub phrase: Option<Bytes>,
}

/// The parsed first line of a message; the request-or-response
/// discriminator for everything downstream.
#[derive(Debug, Clone)]
pub enum StartLine {
    Request(RequestLine),
    Response(ResponseLine),
}

impl StartLine {
    pub fn is_request(&self) -> bool {
        matches!(self, StartLine::Request(_))
    }
}

/// `SIP/2.0` (any digits[.digits] version accepted).
fn sip_version(input: &[u8]) -> crate::parser::ParseResult<&[u8]> {
    recognize(pair(
        pair(tag_no_case(b"SIP"), tag(b"/")),
        take_while1(|b: u8| b.is_ascii_digit() || b == b'.'),
    ))(input)
}

/// Parses the start line; `line` must be a subslice of `base` with the
/// terminating CRLF already removed.
pub fn parse_start_line(base: &Bytes, line: &[u8]) -> Result<StartLine> {
    let line = trim(line);
    if line.is_empty() {
        return Err(Error::InvalidStartLine);
    }

    if let Ok((rest, version)) = sip_version(line) {
        // Status line
        let (code, rest) = atoi(rest).ok_or(Error::InvalidStartLine)?;
        if !(100..=700).contains(&code) {
            return Err(Error::InvalidStartLine);
        }
        let phrase = trim(rest);
        return Ok(StartLine::Response(ResponseLine {
            version: base.slice_ref(version),
            code: code as u16,
            phrase: (!phrase.is_empty()).then(|| base.slice_ref(phrase)),
        }));
    }

    // Request line
    let method_end = line.iter().position(|&b| is_ws(b)).ok_or(Error::InvalidStartLine)?;
    let method = Method::from_token(&line[..method_end]).ok_or(Error::InvalidStartLine)?;

    let rest = trim_start(&line[method_end..]);
    let uri_end = rest.iter().position(|&b| is_ws(b)).ok_or(Error::InvalidStartLine)?;
    let uri_str = &rest[..uri_end];
    if uri_str.is_empty() {
        return Err(Error::InvalidStartLine);
    }
    let uri = parse_uri(base, uri_str).map_err(|_| Error::InvalidStartLine)?;

    let rest = trim_start(&rest[uri_end..]);
    let (_, version) = sip_version(rest).map_err(|_| Error::InvalidStartLine)?;

    Ok(StartLine::Request(RequestLine {
        method,
        uri_str: base.slice_ref(uri_str),
        uri,
        version: base.slice_ref(version),
    }))
}
