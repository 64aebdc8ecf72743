//! The five generic value grammars (P1-P5) shared by most registered
//! headers.
//!
//! All of them take the header's value region (bytes after the colon,
//! leading whitespace and trailing CRLF stripped) and produce a
//! [`ParsedHeader`]. A malformed value is marked bad and parsing continues
//! with the next comma-separated value; only structural problems (no colon,
//! empty region on a header that forbids it) fail the whole header, and the
//! dispatcher handles those before calling in here.

use bytes::Bytes;

use crate::parser::params::parse_params;
use crate::parser::scan::{atoi, find_separator, find_unquoted, split_values, trim, trim_end, trim_start};
use crate::parser::token::quoted_string;
use crate::parser::uri::parse_uri;
use crate::parser::whitespace::is_ws;
use crate::types::value::{AddrValue, HeaderValue, Param, ParsedHeader, ValueData, ValueState};

/// P1: `value *( ";" param ) *( "," ... )` where value is a token or, for
/// headers like Accept and Content-Type, a `first sep second` pair.
pub fn parse_token_list(base: &Bytes, region: &[u8], sep: Option<u8>) -> ParsedHeader {
    let values = split_values(region)
        .into_iter()
        .map(|seg| parse_token_value(base, seg, sep))
        .collect();
    ParsedHeader { values }
}

fn parse_token_value(base: &Bytes, seg: &[u8], sep: Option<u8>) -> HeaderValue {
    let raw = base.slice_ref(seg);
    let mut stop_set = [b';', b';'];
    if let Some(sep) = sep {
        stop_set[1] = sep;
    }
    let stops = if sep.is_some() { &stop_set[..] } else { &stop_set[..1] };
    let pos = find_separator(seg, stops);
    if pos == seg.len() {
        return HeaderValue::new(raw.clone(), ValueData::Str(raw), Vec::new());
    }

    let stop = seg[pos];
    if let Some(sep) = sep {
        if stop != sep {
            // A paired header whose value does not have its separator next
            return HeaderValue::bad(raw);
        }
        let first = trim(&seg[..pos]);
        let after = &seg[pos + 1..];
        let second_end = find_separator(after, b";");
        let second = trim(&after[..second_end]);
        let list = parse_params(base, trim_start(&after[second_end..]));
        let value = HeaderValue::new(
            raw,
            ValueData::Pair {
                first: base.slice_ref(first),
                second: base.slice_ref(second),
            },
            list.params,
        );
        if !list.ok {
            value.set_state(ValueState::Bad);
        }
        return value;
    }

    let token = trim(&seg[..pos]);
    let list = parse_params(base, trim_start(&seg[pos..]));
    let value = HeaderValue::new(raw, ValueData::Str(base.slice_ref(token)), list.params);
    if !list.ok {
        value.set_state(ValueState::Bad);
    }
    value
}

/// P2: a single integer. `reject_zero` is the RSeq rule from RFC 3262.
pub fn parse_int(base: &Bytes, region: &[u8], reject_zero: bool) -> ParsedHeader {
    let raw = base.slice_ref(trim_end(region));
    let value = match atoi(region) {
        Some((num, _)) if !(reject_zero && num == 0) => {
            HeaderValue::new(raw, ValueData::Int(num), Vec::new())
        }
        _ => HeaderValue::bad(raw),
    };
    ParsedHeader { values: vec![value] }
}

/// P3: comma-separated angle-quoted URIs; `display` admits an optional
/// (possibly quoted) display name before the `<`.
pub fn parse_addr_list(base: &Bytes, region: &[u8], display: bool) -> ParsedHeader {
    let values = split_values(region)
        .into_iter()
        .map(|seg| parse_angle_value(base, seg, display))
        .collect();
    ParsedHeader { values }
}

fn parse_angle_value(base: &Bytes, seg: &[u8], display: bool) -> HeaderValue {
    let raw = base.slice_ref(seg);
    let Some(lt) = find_unquoted(seg, b'<') else {
        // The URI has to be angle-quoted in these headers
        return HeaderValue::bad(raw);
    };
    let display_name = if display {
        match parse_display_name(&seg[..lt]) {
            Ok(name) => name.map(|n| base.slice_ref(n)),
            Err(()) => return HeaderValue::bad(raw),
        }
    } else {
        None
    };
    let after_lt = &seg[lt + 1..];
    let Some(gt) = after_lt.iter().position(|&b| b == b'>') else {
        return HeaderValue::bad(raw);
    };
    let uri = trim(&after_lt[..gt]);
    let list = parse_params(base, trim_start(&after_lt[gt + 1..]));

    let parsed_uri = parse_uri(base, uri).ok();
    let bad_uri = parsed_uri.is_none();
    let value = HeaderValue::new(
        raw,
        ValueData::Addr(AddrValue {
            display: display_name,
            uri: base.slice_ref(uri),
            parsed_uri,
        }),
        list.params,
    );
    if !list.ok || bad_uri {
        value.set_state(ValueState::Bad);
    }
    value
}

fn parse_display_name(before: &[u8]) -> std::result::Result<Option<&[u8]>, ()> {
    let before = trim(before);
    if before.is_empty() {
        return Ok(None);
    }
    if before[0] == b'"' {
        let (_, content) = quoted_string(before).map_err(|_| ())?;
        return Ok(Some(content));
    }
    Ok(Some(before))
}

/// P4: the whole field is one opaque string up to the final CRLF.
pub fn parse_text(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let raw = base.slice_ref(region);
    let value = HeaderValue::new(raw.clone(), ValueData::Str(raw), Vec::new());
    ParsedHeader { values: vec![value] }
}

/// P5: challenge/credentials. One value: a scheme token followed by a
/// comma-separated parameter list where values may be tokens, quoted
/// strings, or `<uri>`s.
pub fn parse_challenge(base: &Bytes, region: &[u8]) -> ParsedHeader {
    let raw = base.slice_ref(region);
    let Some(ws) = region.iter().position(|&b| is_ws(b)) else {
        return ParsedHeader { values: vec![HeaderValue::bad(raw)] };
    };
    let scheme = base.slice_ref(&region[..ws]);

    let mut params = Vec::new();
    let mut ok = true;
    let mut rest = trim_start(&region[ws..]);
    while !rest.is_empty() {
        let name_end = find_separator(rest, b"=,");
        if name_end == 0 {
            ok = false;
            break;
        }
        let name = base.slice_ref(&rest[..name_end]);
        rest = trim_start(&rest[name_end..]);

        let mut value = None;
        if let Some((&b'=', after)) = rest.split_first() {
            let after = trim_start(after);
            match after.first() {
                Some(&b'"') => {
                    let content = &after[1..];
                    match find_auth_quote(content) {
                        Some(close) => {
                            value = Some(base.slice_ref(&content[..close]));
                            rest = &content[close + 1..];
                        }
                        None => {
                            ok = false;
                            break;
                        }
                    }
                }
                Some(&b'<') => {
                    let content = &after[1..];
                    match content.iter().position(|&b| b == b'>') {
                        Some(close) => {
                            value = Some(base.slice_ref(&content[..close]));
                            rest = &content[close + 1..];
                        }
                        None => {
                            ok = false;
                            break;
                        }
                    }
                }
                Some(_) => {
                    let end = find_separator(after, b",");
                    value = Some(base.slice_ref(&after[..end]));
                    rest = &after[end..];
                }
                None => {
                    ok = false;
                    break;
                }
            }
        }
        params.push(Param { name, value });

        rest = trim_start(rest);
        match rest.split_first() {
            Some((&b',', after)) => rest = trim_start(after),
            Some(_) => {
                ok = false;
                break;
            }
            None => break,
        }
    }

    let value = HeaderValue::new(raw, ValueData::Auth { scheme }, params);
    if !ok {
        value.set_state(ValueState::Bad);
    }
    ParsedHeader { values: vec![value] }
}

fn find_auth_quote(s: &[u8]) -> Option<usize> {
    let mut i = 0;
    while i < s.len() {
        match s[i] {
            b'"' => return Some(i),
            b'\\' => i += 2,
            _ => i += 1,
        }
    }
    None
}
