//! The Allow header grammar (RFC 3261 Section 20.5): a comma-separated
//! list of method tokens. A token outside the method table marks that
//! value bad.

use bytes::Bytes;

use crate::parser::scan::split_values;
use crate::types::method::Method;
use crate::types::value::{HeaderValue, ParsedHeader, ValueData};

pub fn parse_allow(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let values = split_values(region)
        .into_iter()
        .map(|seg| {
            let raw = base.slice_ref(seg);
            match Method::from_token(seg) {
                Some(method) => HeaderValue::new(raw, ValueData::Method(method), Vec::new()),
                None => HeaderValue::bad(raw),
            }
        })
        .collect();
    ParsedHeader { values }
}
