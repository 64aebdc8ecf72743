//! The RAck header grammar (RFC 3262 Section 7.2):
//! `response-num LWS CSeq-num LWS Method`. A response number of zero is
//! rejected.

use bytes::Bytes;

use crate::parser::scan::{atoi, trim, trim_start};
use crate::parser::whitespace::is_ws;
use crate::types::method::Method;
use crate::types::value::{HeaderValue, ParsedHeader, ValueData};

pub fn parse_rack(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let raw = base.slice_ref(trim(region));
    let value = match parse_fields(region) {
        Some((resp, cseq, method)) => {
            HeaderValue::new(raw, ValueData::RAck { resp, cseq, method }, Vec::new())
        }
        None => HeaderValue::bad(raw),
    };
    ParsedHeader { values: vec![value] }
}

fn parse_fields(region: &[u8]) -> Option<(u32, u32, Method)> {
    let (resp, rest) = atoi(region)?;
    if resp == 0 {
        return None;
    }
    let (cseq, rest) = atoi(rest)?;
    let rest = trim_start(rest);
    let end = rest
        .iter()
        .position(|&b| is_ws(b))
        .unwrap_or(rest.len());
    let method = Method::from_token(&rest[..end])?;
    Some((resp, cseq, method))
}
