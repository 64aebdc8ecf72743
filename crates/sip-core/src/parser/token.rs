use nom::bytes::complete::{tag, take_while1};
use nom::sequence::delimited;

use crate::parser::ParseResult;

/// RFC 3261 Section 25.1:
/// token = 1*(alphanum / "-" / "." / "!" / "%" / "*" / "_" / "+" / "`" / "'" / "~")
pub fn is_token_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(
            c,
            b'-' | b'.' | b'!' | b'%' | b'*' | b'_' | b'+' | b'`' | b'\'' | b'~'
        )
}

/// Parses one token.
pub fn token(input: &[u8]) -> ParseResult<&[u8]> {
    take_while1(is_token_char)(input)
}

/// Parses a double-quoted string, returning the content without the quotes.
/// A backslash escapes the following byte.
pub fn quoted_string(input: &[u8]) -> ParseResult<&[u8]> {
    delimited(tag(b"\""), quoted_content, tag(b"\""))(input)
}

fn quoted_content(input: &[u8]) -> ParseResult<&[u8]> {
    let mut i = 0;
    while i < input.len() {
        match input[i] {
            b'"' => break,
            b'\\' if i + 1 < input.len() => i += 2,
            _ => i += 1,
        }
    }
    Ok((&input[i..], &input[..i]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token() {
        let (rem, val) = token(b"branch=z9").unwrap();
        assert_eq!(val, b"branch");
        assert_eq!(rem, b"=z9");

        let (rem, val) = token(b"token-._!%*+`'~ rest").unwrap();
        assert_eq!(val, b"token-._!%*+`'~");
        assert_eq!(rem, b" rest");

        assert!(token(b";x").is_err());
    }

    #[test]
    fn test_quoted_string() {
        let (rem, val) = quoted_string(b"\"Bob Smith\" <sip:b@c>").unwrap();
        assert_eq!(val, b"Bob Smith");
        assert_eq!(rem, b" <sip:b@c>");

        // Escaped quote stays inside the string
        let (rem, val) = quoted_string(b"\"a\\\"b\" x").unwrap();
        assert_eq!(val, b"a\\\"b");
        assert_eq!(rem, b" x");

        // Unterminated
        assert!(quoted_string(b"\"oops").is_err());
    }
}
