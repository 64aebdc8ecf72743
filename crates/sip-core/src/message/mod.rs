//! The SIP message: an immutable byte buffer plus carved header records.
//!
//! [`SipMsg::init_headers`] parses the start line and carves the header
//! and body boundaries. Headers stay raw until a caller asks for their
//! values; parsed trees are windows into the message buffer and stay valid
//! for the message's lifetime, tombstoned records included.

pub mod accessors;
pub mod header;
pub mod mutate;

use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::parser::start_line::{parse_start_line, StartLine};

pub use header::{Header, HeaderState};

pub(crate) struct MsgInner {
    pub(crate) start_line: Option<StartLine>,
    /// Raw bytes of the start line record, CRLF included.
    pub(crate) start_bytes: Option<Bytes>,
    pub(crate) headers: Vec<Arc<Header>>,
    pub(crate) body: Option<Bytes>,
    /// Live byte count: start line + non-deleted headers + body.
    pub(crate) len: usize,
    pub(crate) modifiable: bool,
    initialized: bool,
}

/// A SIP message owning its buffer and header list.
pub struct SipMsg {
    buf: Bytes,
    pub(crate) inner: Mutex<MsgInner>,
}

impl SipMsg {
    /// Wraps a received (or locally built) message buffer. Call
    /// [`SipMsg::init_headers`] before using any accessor.
    pub fn new(buf: impl Into<Bytes>) -> SipMsg {
        let buf = buf.into();
        let len = buf.len();
        SipMsg {
            buf,
            inner: Mutex::new(MsgInner {
                start_line: None,
                start_bytes: None,
                headers: Vec::new(),
                body: None,
                len,
                modifiable: true,
                initialized: false,
            }),
        }
    }

    /// Parses the start line and carves header records and the body.
    /// Folded continuation lines belong to the preceding record. Idempotent.
    pub fn init_headers(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        if inner.initialized {
            return Ok(());
        }

        let data: &[u8] = &self.buf;
        let mut pos = end_of_line(data, 0).ok_or(Error::InvalidStartLine)?;
        let start_bytes = self.buf.slice(0..pos);
        let start_line = parse_start_line(&self.buf, strip_crlf(&data[..pos]))?;

        let mut headers = Vec::new();
        let mut body = None;
        while pos < data.len() {
            // A blank line ends the headers and begins the body
            if data[pos] == b'\n' {
                body = Some(self.buf.slice(pos + 1..));
                break;
            }
            if data[pos] == b'\r' && data.get(pos + 1) == Some(&b'\n') {
                body = Some(self.buf.slice(pos + 2..));
                break;
            }

            let start = pos;
            pos = end_of_line(data, pos).unwrap_or(data.len());
            // Fold: CRLF followed by SP or HTAB continues this record
            while pos < data.len() && (data[pos] == b' ' || data[pos] == b'\t') {
                pos = end_of_line(data, pos).unwrap_or(data.len());
            }
            let record = self.buf.slice(start..pos);
            headers.push(Header::from_record(record, headers.len()));
        }

        debug!(
            headers = headers.len(),
            body = body.as_ref().map(|b| b.len()).unwrap_or(0),
            "carved message"
        );
        inner.start_line = Some(start_line);
        inner.start_bytes = Some(start_bytes);
        inner.headers = headers;
        inner.body = body;
        inner.len = self.buf.len();
        inner.initialized = true;
        Ok(())
    }

    fn check_initialized(inner: &MsgInner) -> Result<()> {
        if !inner.initialized {
            return Err(Error::InvalidArgument);
        }
        Ok(())
    }

    /// The parsed start line.
    pub fn start_line(&self) -> Result<StartLine> {
        let inner = self.inner.lock();
        Self::check_initialized(&inner)?;
        inner.start_line.clone().ok_or(Error::InvalidStartLine)
    }

    pub fn is_request(&self) -> Result<bool> {
        Ok(self.start_line()?.is_request())
    }

    pub fn is_response(&self) -> Result<bool> {
        Ok(!self.start_line()?.is_request())
    }

    /// Total live byte length: start line + non-deleted headers + body.
    pub fn msg_len(&self) -> usize {
        self.inner.lock().len
    }

    /// Whether the message can still be mutated.
    pub fn is_modifiable(&self) -> bool {
        self.inner.lock().modifiable
    }

    /// Latches the message read-only; called when it is handed to the
    /// transport.
    pub fn mark_sent(&self) {
        self.inner.lock().modifiable = false;
    }

    /// Finds the first non-deleted header matching `name` (long or compact
    /// form, case-insensitive).
    pub fn header(&self, name: &[u8]) -> Option<Arc<Header>> {
        self.search(Some(name), 0)
    }

    /// Finds the next matching header after `prev`.
    pub fn next_header(&self, name: &[u8], prev: &Header) -> Option<Arc<Header>> {
        self.search(Some(name), prev.index.saturating_add(1))
    }

    /// The first non-deleted header, in wire order.
    pub fn first_header(&self) -> Option<Arc<Header>> {
        self.search(None, 0)
    }

    /// The next non-deleted header after `prev`, in wire order.
    pub fn next_any_header(&self, prev: &Header) -> Option<Arc<Header>> {
        self.search(None, prev.index.saturating_add(1))
    }

    fn search(&self, name: Option<&[u8]>, from: usize) -> Option<Arc<Header>> {
        let inner = self.inner.lock();
        inner.headers[from.min(inner.headers.len())..]
            .iter()
            .find(|h| {
                h.state() != HeaderState::Deleted
                    && name.map(|n| h.matches_name(n)).unwrap_or(true)
            })
            .cloned()
    }

    /// Snapshot of the live header records, in wire order.
    pub fn headers(&self) -> Vec<Arc<Header>> {
        let inner = self.inner.lock();
        inner
            .headers
            .iter()
            .filter(|h| h.state() != HeaderState::Deleted)
            .cloned()
            .collect()
    }

    /// The message body, bounded by Content-Length when one is present and
    /// smaller than the carved remainder.
    pub fn content(&self) -> Result<Bytes> {
        let body = {
            let inner = self.inner.lock();
            Self::check_initialized(&inner)?;
            inner.body.clone().ok_or(Error::InvalidArgument)?
        };
        match self.header(b"Content-Length") {
            Some(h) => {
                let len = h.value()?.as_int()? as usize;
                if len <= body.len() {
                    Ok(body.slice(..len))
                } else {
                    Ok(body)
                }
            }
            None => Ok(body),
        }
    }

    /// Reserializes the live records for transmission: start line,
    /// non-deleted headers (minus tombstoned values), blank line, body.
    pub fn to_wire(&self) -> Result<Bytes> {
        let inner = self.inner.lock();
        Self::check_initialized(&inner)?;
        let mut out = Vec::with_capacity(inner.len + 2);
        if let Some(start) = &inner.start_bytes {
            out.extend_from_slice(start);
        }
        for h in &inner.headers {
            match h.state() {
                HeaderState::Deleted => {}
                HeaderState::Active => out.extend_from_slice(h.raw()),
                HeaderState::ValueDeleted => {
                    out.extend_from_slice(h.name());
                    out.extend_from_slice(b": ");
                    let spans = h.live_value_spans();
                    for (i, span) in spans.iter().enumerate() {
                        if i > 0 {
                            out.extend_from_slice(b",");
                        }
                        out.extend_from_slice(span);
                    }
                    out.extend_from_slice(b"\r\n");
                }
            }
        }
        out.extend_from_slice(b"\r\n");
        if let Some(body) = &inner.body {
            out.extend_from_slice(body);
        }
        Ok(Bytes::from(out))
    }
}

fn end_of_line(data: &[u8], from: usize) -> Option<usize> {
    data[from..]
        .iter()
        .position(|&b| b == b'\n')
        .map(|p| from + p + 1)
}

fn strip_crlf(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
