//! The header record: a carved `Name: value CRLF` window with a tombstone
//! state and a lazily-filled parse cache.
//!
//! Records are shared (`Arc`) so a handle returned to a caller stays valid
//! after the header is tombstoned; deletion never frees a record's bytes.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::parser;
use crate::parser::scan::{trim, trim_trailing_crlf};
use crate::types::header_name::HeaderKind;
use crate::types::value::{HeaderValue, ParsedHeader, ValueState};

/// Marker for a header record not linked into any message.
pub(crate) const STANDALONE: usize = usize::MAX;

/// Lifecycle of a header record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderState {
    Active,
    /// Tombstoned; skipped by searches, bytes subtracted from the message
    /// length, record kept alive.
    Deleted,
    /// At least one of the record's values is tombstoned.
    ValueDeleted,
}

impl HeaderState {
    fn from_u8(v: u8) -> HeaderState {
        match v {
            1 => HeaderState::Deleted,
            2 => HeaderState::ValueDeleted,
            _ => HeaderState::Active,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            HeaderState::Active => 0,
            HeaderState::Deleted => 1,
            HeaderState::ValueDeleted => 2,
        }
    }
}

/// One header of a message (or a standalone header owned by a dialog).
#[derive(Debug)]
pub struct Header {
    /// The full record: name through trailing CRLF, folds included.
    buf: Bytes,
    /// The name token as it appeared on the wire.
    name: Bytes,
    kind: HeaderKind,
    /// Position in the owning message's record list; `STANDALONE` when the
    /// header is not part of a message.
    pub(crate) index: usize,
    state: AtomicU8,
    parsed: OnceLock<ParsedHeader>,
}

impl Header {
    pub(crate) fn from_record(buf: Bytes, index: usize) -> Arc<Header> {
        let name_end = buf
            .iter()
            .position(|&b| b == b':')
            .unwrap_or(buf.len());
        let name = trim(&buf[..name_end]);
        let kind = HeaderKind::from_name(name);
        Arc::new(Header {
            name: buf.slice_ref(name),
            buf,
            kind,
            index,
            state: AtomicU8::new(HeaderState::Active.as_u8()),
            parsed: OnceLock::new(),
        })
    }

    /// Builds a standalone header from raw record bytes, e.g. when a dialog
    /// stores its own copies of Call-ID, From or Contact.
    pub fn synthesized(bytes: impl Into<Bytes>) -> Arc<Header> {
        Header::from_record(bytes.into(), STANDALONE)
    }

    /// Builds a standalone `Name: value` header.
    pub fn build(name: &str, value: &str) -> Arc<Header> {
        Header::synthesized(format!("{}: {}\r\n", name, value).into_bytes())
    }

    /// Duplicates this record into a standalone header with a fresh parse
    /// cache and an `Active` state.
    pub fn duplicate(&self) -> Arc<Header> {
        Header::from_record(self.buf.clone(), STANDALONE)
    }

    /// The raw record bytes, trailing CRLF included.
    pub fn raw(&self) -> &Bytes {
        &self.buf
    }

    /// The record bytes without the trailing CRLF.
    pub fn raw_trimmed(&self) -> &[u8] {
        trim_trailing_crlf(&self.buf)
    }

    pub fn name(&self) -> &Bytes {
        &self.name
    }

    pub fn kind(&self) -> HeaderKind {
        self.kind
    }

    /// Number of bytes this record contributes to the message length while
    /// live.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn state(&self) -> HeaderState {
        HeaderState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: HeaderState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    /// Whether `query` (long or compact form, case-insensitive) names this
    /// header.
    pub fn matches_name(&self, query: &[u8]) -> bool {
        if self.kind != HeaderKind::Other {
            return HeaderKind::from_name(query) == self.kind;
        }
        self.name.eq_ignore_ascii_case(query)
    }

    /// The parsed tree for this header, running the registered grammar on
    /// first use. Parsing is idempotent: repeated calls return the same
    /// tree.
    pub fn parsed(&self) -> Result<&ParsedHeader> {
        if let Some(parsed) = self.parsed.get() {
            return Ok(parsed);
        }
        let parsed = parser::parse_header_body(self.kind, &self.buf)?;
        Ok(self.parsed.get_or_init(|| parsed))
    }

    /// The first live value. Fails with `InvalidArgument` on a deleted
    /// header, and with `BadProtocol` when the first value is malformed.
    pub fn value(&self) -> Result<&HeaderValue> {
        if self.state() == HeaderState::Deleted {
            return Err(Error::InvalidArgument);
        }
        self.parsed()?.value()
    }

    /// The next live value after `prev`.
    pub fn next_value(&self, prev: &HeaderValue) -> Option<&HeaderValue> {
        self.parsed().ok()?.next_value(prev)
    }

    /// Iterates the live values of a non-deleted header.
    pub fn values(&self) -> Result<impl Iterator<Item = &HeaderValue>> {
        if self.state() == HeaderState::Deleted {
            return Err(Error::InvalidArgument);
        }
        Ok(self.parsed()?.values())
    }

    /// The live value spans, used when reserializing a record with
    /// tombstoned values.
    pub(crate) fn live_value_spans(&self) -> Vec<Bytes> {
        match self.parsed.get() {
            Some(parsed) => parsed
                .values
                .iter()
                .filter(|v| v.state() != ValueState::Deleted)
                .map(|v| v.raw.clone())
                .collect(),
            None => Vec::new(),
        }
    }
}
