//! The shared address grammar for Contact, From, To, Route and
//! Record-Route (RFC 3261 Section 20.10/20.20/20.30/20.39).
//!
//! `[ display-name | "display name" ] ( <uri> | uri ) *( ";" param )`
//!
//! With angle brackets the parameters belong to the header value; without
//! them the value is a bare addr-spec. The enclosed URI is validated with
//! the URI grammar and the result stashed on the value; a failed URI marks
//! the value bad but leaves the other values intact.

use bytes::Bytes;

use crate::parser::params::parse_params;
use crate::parser::scan::{find_separator, find_unquoted, split_values, trim, trim_start};
use crate::parser::token::quoted_string;
use crate::parser::uri::parse_uri;
use crate::types::value::{AddrValue, HeaderValue, ParsedHeader, ValueData, ValueState};

pub fn parse_addr(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let values = split_values(region)
        .into_iter()
        .map(|seg| parse_addr_value(base, seg))
        .collect();
    ParsedHeader { values }
}

fn parse_addr_value(base: &Bytes, seg: &[u8]) -> HeaderValue {
    let raw = base.slice_ref(seg);
    match parse_addr_fields(base, seg) {
        Some((addr, params, ok)) => {
            let bad_uri = addr.parsed_uri.is_none();
            let value = HeaderValue::new(raw, ValueData::Addr(addr), params);
            if !ok || bad_uri {
                value.set_state(ValueState::Bad);
            }
            value
        }
        None => HeaderValue::bad(raw),
    }
}

type AddrFields = (AddrValue, Vec<crate::types::value::Param>, bool);

fn parse_addr_fields(base: &Bytes, seg: &[u8]) -> Option<AddrFields> {
    let Some(lt) = find_unquoted(seg, b'<') else {
        return parse_bare_addr(base, seg);
    };

    // Display name, optionally quoted, before the '<'
    let before = trim(&seg[..lt]);
    let display = if before.is_empty() {
        None
    } else if before[0] == b'"' {
        let (_, content) = quoted_string(before).ok()?;
        Some(base.slice_ref(content))
    } else {
        Some(base.slice_ref(before))
    };

    let after_lt = &seg[lt + 1..];
    let gt = after_lt.iter().position(|&b| b == b'>')?;
    let uri = trim(&after_lt[..gt]);
    // "<>" and shorter cannot hold a URI
    if uri.len() <= 2 {
        return None;
    }
    let list = parse_params(base, trim_start(&after_lt[gt + 1..]));

    let addr = AddrValue {
        display,
        uri: base.slice_ref(uri),
        parsed_uri: parse_uri(base, uri).ok(),
    };
    Some((addr, list.params, list.ok))
}

/// A value with no angle brackets is a bare addr-spec; anything after a
/// `;` is a header parameter (RFC 3261 Section 20.10).
fn parse_bare_addr(base: &Bytes, seg: &[u8]) -> Option<AddrFields> {
    let end = find_separator(seg, b";");
    let uri = trim(&seg[..end]);
    if uri.is_empty() {
        return None;
    }
    let list = parse_params(base, trim_start(&seg[end..]));
    let addr = AddrValue {
        display: None,
        uri: base.slice_ref(uri),
        parsed_uri: parse_uri(base, uri).ok(),
    };
    Some((addr, list.params, list.ok))
}
