//! # sipkit-sip-core
//!
//! Zero-copy SIP (RFC 3261) message parsing and mutation.
//!
//! A [`SipMsg`] owns the raw bytes of one message. [`SipMsg::init_headers`]
//! carves the start line, the header records and the body; header values
//! are parsed lazily, at most once per header, into trees of [`Bytes`]
//! windows over the original buffer. Mutation follows a copy-on-modify
//! discipline: additions append fresh records, deletions tombstone existing
//! ones, and every slice handed out earlier stays valid for the message's
//! lifetime.
//!
//! ```
//! use sipkit_sip_core::SipMsg;
//!
//! let msg = SipMsg::new(
//!     &b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
//! From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
//! Call-ID: a84b4c76e66710\r\n\
//! CSeq: 314159 INVITE\r\n\
//! \r\n"[..],
//! );
//! msg.init_headers().unwrap();
//! assert_eq!(msg.cseq_num().unwrap(), 314159);
//! assert_eq!(msg.from_tag().unwrap().unwrap().as_ref(), b"1928301774");
//! ```
//!
//! [`Bytes`]: bytes::Bytes

pub mod error;
pub mod message;
pub mod parser;
pub mod types;

pub use error::{Error, Result};
pub use message::{Header, HeaderState, SipMsg};
pub use parser::start_line::{RequestLine, ResponseLine, StartLine};
pub use parser::uri::parse_uri;
pub use types::{
    AddrValue, DateValue, HeaderKind, HeaderValue, Method, Param, ParsedHeader, SipUri, ValueData,
    ValueState, ViaValue,
};
