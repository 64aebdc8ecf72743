//! The Via header grammar (RFC 3261 Section 20.42).
//!
//! `Via: SIP / 2.0 / UDP host [ ":" port ] *( ";" param ) *( "," ... )`
//!
//! The parser is forgiving per value: a hop that does not parse is marked
//! bad and the scan continues with the next comma-separated hop.

use bytes::Bytes;
use nom::bytes::complete::{tag_no_case, take_while1};
use nom::sequence::terminated;

use crate::parser::params::parse_params;
use crate::parser::scan::{atoi, find_separator, split_values, trim_start};
use crate::parser::whitespace::is_ws;
use crate::types::value::{HeaderValue, ParsedHeader, ValueData, ValueState, ViaValue};

pub fn parse_via(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let values = split_values(region)
        .into_iter()
        .map(|seg| parse_via_value(base, seg))
        .collect();
    ParsedHeader { values }
}

fn protocol_name(input: &[u8]) -> crate::parser::ParseResult<&[u8]> {
    terminated(tag_no_case(b"SIP"), tag_no_case(b"/"))(input)
}

fn version(input: &[u8]) -> crate::parser::ParseResult<&[u8]> {
    take_while1(|b: u8| b.is_ascii_digit() || b == b'.')(input)
}

fn parse_via_value(base: &Bytes, seg: &[u8]) -> HeaderValue {
    let raw = base.slice_ref(seg);
    match parse_via_fields(base, seg) {
        Some((via, params, params_ok)) => {
            let value = HeaderValue::new(raw, ValueData::Via(via), params);
            if !params_ok {
                value.set_state(ValueState::Bad);
            }
            value
        }
        None => HeaderValue::bad(raw),
    }
}

fn parse_via_fields(
    base: &Bytes,
    seg: &[u8],
) -> Option<(ViaValue, Vec<crate::types::value::Param>, bool)> {
    let (rest, name) = protocol_name(seg).ok()?;
    let (rest, ver) = version(rest).ok()?;
    let rest = rest.strip_prefix(b"/")?;
    let rest = trim_start(rest);

    let transport_end = rest.iter().position(|&b| is_ws(b))?;
    let transport = &rest[..transport_end];
    let rest = trim_start(&rest[transport_end..]);

    // Sent-by host; IPv6 literals keep their brackets
    let (host, rest) = if rest.first() == Some(&b'[') {
        let close = rest.iter().position(|&b| b == b']')?;
        (&rest[..close + 1], &rest[close + 1..])
    } else {
        let end = find_separator(rest, b";:");
        (&rest[..end], &rest[end..])
    };
    if host.is_empty() || !(host[0].is_ascii_alphanumeric() || host[0] == b'[') {
        return None;
    }

    let rest = trim_start(rest);
    let (port, rest) = match rest.split_first() {
        Some((&b':', after)) => {
            let (num, after) = atoi(after)?;
            (Some(u16::try_from(num).ok()?), after)
        }
        _ => (None, rest),
    };

    let list = parse_params(base, trim_start(rest));
    let via = ViaValue {
        protocol_name: base.slice_ref(name),
        protocol_version: base.slice_ref(ver),
        transport: base.slice_ref(transport),
        sent_by_host: base.slice_ref(host),
        sent_by_port: port,
    };
    Some((via, list.params, list.ok))
}
