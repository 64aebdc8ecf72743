//! The CSeq header grammar (RFC 3261 Section 20.16): `1*DIGIT LWS Method`.

use bytes::Bytes;

use crate::parser::scan::{atoi, trim, trim_start};
use crate::parser::whitespace::is_ws;
use crate::types::method::Method;
use crate::types::value::{HeaderValue, ParsedHeader, ValueData};

pub fn parse_cseq(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let raw = base.slice_ref(trim(region));
    let value = match parse_fields(region) {
        Some((num, method)) => HeaderValue::new(raw, ValueData::CSeq { num, method }, Vec::new()),
        None => HeaderValue::bad(raw),
    };
    ParsedHeader { values: vec![value] }
}

fn parse_fields(region: &[u8]) -> Option<(u32, Method)> {
    let (num, rest) = atoi(region)?;
    let rest = trim_start(rest);
    let end = rest
        .iter()
        .position(|&b| is_ws(b))
        .unwrap_or(rest.len());
    let method = Method::from_token(&rest[..end])?;
    Some((num, method))
}
