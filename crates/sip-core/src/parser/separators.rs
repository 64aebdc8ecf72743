use nom::{
    branch::alt,
    bytes::complete::tag,
    combinator::recognize,
    multi::many0,
    sequence::tuple,
};

use super::whitespace::sws;
use crate::parser::ParseResult;

/// HCOLON = *( SP / HTAB ) ":" SWS (RFC 3261 Section 25.1). The opening
/// move of every header grammar: it separates the name from the value
/// region, absorbing folds after the colon.
pub fn hcolon(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(tuple((
        many0(alt((tag(b" "), tag(b"\t")))),
        tag(b":"),
        sws,
    )))(input)
}

/// SEMI = SWS ";" SWS
pub fn semi(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(tuple((sws, tag(b";"), sws)))(input)
}

/// EQUAL = SWS "=" SWS
pub fn equal(input: &[u8]) -> ParseResult<&[u8]> {
    recognize(tuple((sws, tag(b"="), sws)))(input)
}
