//! The Timestamp header grammar (RFC 3261 Section 20.38):
//! `1*DIGIT [ "." *DIGIT ] [ LWS delay ]`. The timestamp and the optional
//! delay are kept as slices; no float conversion is done here.

use bytes::Bytes;

use crate::parser::scan::{trim, trim_start};
use crate::parser::whitespace::is_ws;
use crate::types::value::{HeaderValue, ParsedHeader, ValueData};

pub fn parse_timestamp(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let raw = base.slice_ref(trim(region));
    let rest = trim_start(region);
    if rest.is_empty() {
        return ParsedHeader { values: vec![HeaderValue::bad(raw)] };
    }
    let end = rest.iter().position(|&b| is_ws(b)).unwrap_or(rest.len());
    let stamp = &rest[..end];
    let delay = trim(&rest[end..]);

    let data = if delay.is_empty() {
        ValueData::Str(base.slice_ref(stamp))
    } else {
        ValueData::Pair {
            first: base.slice_ref(stamp),
            second: base.slice_ref(delay),
        }
    };
    ParsedHeader { values: vec![HeaderValue::new(raw, data, Vec::new())] }
}
