//! The parser framework: shared primitives, the five generic kernels, the
//! specialized grammars, and the dispatch that ties a [`HeaderKind`] to its
//! parse function.
//!
//! Parsing is lazy and cached by the owning header record: a grammar runs
//! at most once per header instance.

pub mod headers;
pub mod params;
pub mod scan;
pub mod separators;
pub mod start_line;
pub mod token;
pub mod uri;
pub mod values;
pub mod whitespace;

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::types::header_name::{HeaderKind, ParseStrategy};
use crate::types::value::ParsedHeader;

/// Type alias for nom parser results over byte input.
pub type ParseResult<'a, O> = nom::IResult<&'a [u8], O>;

/// Parses the value part of a carved header record.
///
/// `buf` is the full record (`Name: value CRLF`, folds included). The value
/// region starts after the colon; a missing colon is a structural error.
/// An empty region is an empty parsed header for the kinds that allow it
/// and `BadProtocol` for the rest.
pub(crate) fn parse_header_body(kind: HeaderKind, buf: &Bytes) -> Result<ParsedHeader> {
    let (region, _) = nom::sequence::pair(token::token, separators::hcolon)(buf.as_ref())
        .map_err(|_| Error::bad("header has no name-colon prefix"))?;
    let region = scan::trim_trailing_crlf(region);

    if region.is_empty() {
        if kind.allows_empty() {
            return Ok(ParsedHeader::empty());
        }
        return Err(Error::bad("empty header value"));
    }

    let phdr = match kind.strategy() {
        ParseStrategy::P1 { sep } => values::parse_token_list(buf, region, sep),
        ParseStrategy::P2 { reject_zero } => values::parse_int(buf, region, reject_zero),
        ParseStrategy::P3 { display } => values::parse_addr_list(buf, region, display),
        ParseStrategy::P4 => values::parse_text(buf, region),
        ParseStrategy::P5 => values::parse_challenge(buf, region),
        ParseStrategy::Via => headers::via::parse_via(buf, region),
        ParseStrategy::Cftr => headers::addr::parse_addr(buf, region),
        ParseStrategy::CSeq => headers::cseq::parse_cseq(buf, region),
        ParseStrategy::RAck => headers::rack::parse_rack(buf, region),
        ParseStrategy::Warning => headers::warning::parse_warning(buf, region),
        ParseStrategy::Date => headers::date::parse_date(buf, region),
        ParseStrategy::RetryAfter => headers::retry_after::parse_retry_after(buf, region),
        ParseStrategy::Timestamp => headers::timestamp::parse_timestamp(buf, region),
        ParseStrategy::Allow => headers::allow::parse_allow(buf, region),
        ParseStrategy::None => return Err(Error::InvalidArgument),
    };
    Ok(phdr)
}
