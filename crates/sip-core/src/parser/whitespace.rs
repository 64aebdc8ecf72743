use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::{opt, recognize},
    multi::{many0, many1},
    sequence::pair,
};

use crate::parser::ParseResult;

/// Parses a single whitespace character (SP or HTAB)
pub fn wsp(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(alt((tag(b" "), tag(b"\t"))))(input)
}

/// Parses optional whitespace (0 or more SP or HTAB)
pub fn owsp(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(many0(wsp))(input)
}

/// Parses CRLF (accepts \r\n or just \n)
/// This is more lenient than strict RFC 3261 but common in practice.
pub fn crlf(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(alt((tag(b"\r\n"), tag(b"\n"))))(input)
}

/// Parses Linear White Space (LWS) according to RFC 3261 Section 25.1:
/// `LWS = [*WSP CRLF] 1*WSP`, covering line folding.
pub fn lws(input: &[u8]) -> ParseResult<&[u8]> {
    alt((
        recognize(pair(pair(owsp, crlf), many1(wsp))),
        recognize(many1(wsp)),
    ))(input)
}

/// Parses optional linear whitespace (SWS = [LWS]).
pub fn sws(input: &[u8]) -> ParseResult<&[u8]> {
    opt(lws)(input).map(|(rem, val)| (rem, val.unwrap_or(&[])))
}

/// Whitespace as the header-value scanners see it: SP, HTAB, CR and LF.
/// Folded continuation lines inside a carved header record are plain
/// whitespace from the grammar's point of view.
pub fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\r' | b'\n')
}
