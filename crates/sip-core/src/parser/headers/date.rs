//! The Date header grammar (RFC 3261 Section 20.17):
//! `wkday "," SP 2DIGIT SP month SP 4DIGIT SP time SP "GMT"`.

use bytes::Bytes;

use crate::parser::scan::{atoi, trim, trim_start};
use crate::parser::whitespace::is_ws;
use crate::types::value::{DateValue, HeaderValue, ParsedHeader, ValueData};

pub fn parse_date(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let raw = base.slice_ref(trim(region));
    let value = match parse_fields(base, region) {
        Some(date) => HeaderValue::new(raw, ValueData::Date(date), Vec::new()),
        None => HeaderValue::bad(raw),
    };
    ParsedHeader { values: vec![value] }
}

fn next_word<'a>(rest: &'a [u8]) -> Option<(&'a [u8], &'a [u8])> {
    let rest = trim_start(rest);
    if rest.is_empty() {
        return None;
    }
    let end = rest.iter().position(|&b| is_ws(b)).unwrap_or(rest.len());
    Some((&rest[..end], &rest[end..]))
}

fn parse_fields(base: &Bytes, region: &[u8]) -> Option<DateValue> {
    let comma = region.iter().position(|&b| b == b',')?;
    let weekday = trim(&region[..comma]);
    if weekday.is_empty() {
        return None;
    }
    let rest = &region[comma + 1..];

    let (day, rest) = atoi(rest)?;
    let (month, rest) = next_word(rest)?;
    let (year, rest) = atoi(rest)?;
    let (time, rest) = next_word(rest)?;
    let (timezone, _) = next_word(rest)?;

    Some(DateValue {
        weekday: base.slice_ref(weekday),
        day,
        month: base.slice_ref(month),
        year,
        time: base.slice_ref(time),
        timezone: base.slice_ref(timezone),
    })
}
