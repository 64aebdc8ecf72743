//! The Warning header grammar (RFC 3261 Section 20.43):
//! `warn-code SP warn-agent SP warn-text` where warn-code is three digits
//! and warn-text is quoted. Values are comma-separated and individually
//! tolerated.

use bytes::Bytes;

use crate::parser::scan::{atoi, split_values, trim_end, trim_start};
use crate::types::value::{HeaderValue, ParsedHeader, ValueData};

pub fn parse_warning(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let values = split_values(region)
        .into_iter()
        .map(|seg| parse_warning_value(base, seg))
        .collect();
    ParsedHeader { values }
}

fn parse_warning_value(base: &Bytes, seg: &[u8]) -> HeaderValue {
    let raw = base.slice_ref(seg);
    match parse_fields(base, seg) {
        Some((code, agent, text)) => {
            HeaderValue::new(raw, ValueData::Warn { code, agent, text }, Vec::new())
        }
        None => HeaderValue::bad(raw),
    }
}

fn parse_fields(base: &Bytes, seg: &[u8]) -> Option<(u16, Bytes, Bytes)> {
    let (code, rest) = atoi(seg)?;
    if !(100..=999).contains(&code) {
        return None;
    }
    let rest = trim_start(rest);

    let quote = rest.iter().position(|&b| b == b'"')?;
    let agent = trim_end(&rest[..quote]);
    if agent.is_empty() {
        return None;
    }

    let text = &rest[quote + 1..];
    let close = text.iter().position(|&b| b == b'"')?;
    Some((
        u16::try_from(code).ok()?,
        base.slice_ref(agent),
        base.slice_ref(&text[..close]),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::value::ValueState;

    fn parse(input: &'static [u8]) -> ParsedHeader {
        let base = Bytes::from_static(input);
        parse_warning(&base, &base[..])
    }

    #[test]
    fn test_warning() {
        let phdr = parse(b"307 isi.edu \"Session parameter 'foo' not understood\"");
        match phdr.value().unwrap().data() {
            ValueData::Warn { code, agent, text } => {
                assert_eq!(*code, 307);
                assert_eq!(agent.as_ref(), b"isi.edu");
                assert_eq!(text.as_ref(), b"Session parameter 'foo' not understood");
            }
            other => panic!("expected warn, got {:?}", other),
        }
    }

    #[test]
    fn test_code_boundaries() {
        assert_eq!(parse(b"099 a \"t\"").values[0].state(), ValueState::Bad);
        assert_eq!(parse(b"100 a \"t\"").values[0].state(), ValueState::Ok);
        assert_eq!(parse(b"999 a \"t\"").values[0].state(), ValueState::Ok);
        assert_eq!(parse(b"1000 a \"t\"").values[0].state(), ValueState::Bad);
    }

    #[test]
    fn test_bad_value_does_not_stop_the_list() {
        let phdr = parse(b"307 isi.edu, 301 a \"incompatible network address\"");
        assert_eq!(phdr.values[0].state(), ValueState::Bad);
        assert_eq!(phdr.values[1].state(), ValueState::Ok);
    }

    #[test]
    fn test_missing_agent_is_bad() {
        assert_eq!(parse(b"307 \"text\"").values[0].state(), ValueState::Bad);
    }
}
