//! The Retry-After header grammar (RFC 3261 Section 20.33):
//! `delta-seconds [ comment ] *( ";" param )` where comment is
//! parenthesized free text.

use bytes::Bytes;

use crate::parser::params::parse_params;
use crate::parser::scan::{atoi, trim, trim_start};
use crate::types::value::{HeaderValue, ParsedHeader, ValueData, ValueState};

pub fn parse_retry_after(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let raw = base.slice_ref(trim(region));
    let Some((num, rest)) = atoi(region) else {
        return ParsedHeader { values: vec![HeaderValue::bad(raw)] };
    };

    let rest = trim_start(rest);
    let (comment, rest) = match rest.split_first() {
        Some((&b'(', inner)) => match inner.iter().position(|&b| b == b')') {
            Some(close) => (
                Some(base.slice_ref(&inner[..close])),
                trim_start(&inner[close + 1..]),
            ),
            None => {
                return ParsedHeader { values: vec![HeaderValue::bad(raw)] };
            }
        },
        _ => (None, rest),
    };

    let list = parse_params(base, rest);
    let value = HeaderValue::new(raw, ValueData::IntStr { num, comment }, list.params);
    if !list.ok {
        value.set_state(ValueState::Bad);
    }
    ParsedHeader { values: vec![value] }
}
