//! Typed accessors over the parsed start line and header values.
//!
//! Accessors return owned handles (`Bytes` windows are cheap clones into
//! the message buffer). `MissingHeader` means the header is absent;
//! `BadProtocol` means it is present but malformed, so callers can tell
//! the two apart.

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::message::SipMsg;
use crate::parser::start_line::StartLine;
use crate::types::method::Method;
use crate::types::uri::SipUri;
use crate::types::value::{DateValue, HeaderValue, ValueData};

impl SipMsg {
    fn with_first_value<T>(
        &self,
        name: &[u8],
        f: impl FnOnce(&HeaderValue) -> Result<T>,
    ) -> Result<T> {
        let header = self
            .header(name)
            .ok_or_else(|| Error::missing(String::from_utf8_lossy(name)))?;
        f(header.value()?)
    }

    fn param_of(&self, name: &[u8], param: &[u8]) -> Result<Option<Bytes>> {
        self.with_first_value(name, |v| match v.param(param) {
            Ok(value) => Ok(value.cloned()),
            Err(_) => Ok(None),
        })
    }

    // --- Start line ---

    /// The request method; `InvalidArgument` on a response.
    pub fn request_method(&self) -> Result<Method> {
        match self.start_line()? {
            StartLine::Request(req) => Ok(req.method),
            StartLine::Response(_) => Err(Error::InvalidArgument),
        }
    }

    /// The Request-URI as it appeared on the wire.
    pub fn request_uri_str(&self) -> Result<Bytes> {
        match self.start_line()? {
            StartLine::Request(req) => Ok(req.uri_str),
            StartLine::Response(_) => Err(Error::InvalidArgument),
        }
    }

    /// The parsed Request-URI.
    pub fn request_uri(&self) -> Result<SipUri> {
        match self.start_line()? {
            StartLine::Request(req) => Ok(req.uri),
            StartLine::Response(_) => Err(Error::InvalidArgument),
        }
    }

    /// The status code; `InvalidArgument` on a request.
    pub fn response_code(&self) -> Result<u16> {
        match self.start_line()? {
            StartLine::Response(resp) => Ok(resp.code),
            StartLine::Request(_) => Err(Error::InvalidArgument),
        }
    }

    pub fn response_phrase(&self) -> Result<Option<Bytes>> {
        match self.start_line()? {
            StartLine::Response(resp) => Ok(resp.phrase),
            StartLine::Request(_) => Err(Error::InvalidArgument),
        }
    }

    pub fn sip_version(&self) -> Result<Bytes> {
        match self.start_line()? {
            StartLine::Request(req) => Ok(req.version),
            StartLine::Response(resp) => Ok(resp.version),
        }
    }

    // --- From / To ---

    pub fn from_uri_str(&self) -> Result<Bytes> {
        self.with_first_value(b"From", |v| Ok(v.as_addr()?.uri.clone()))
    }

    pub fn from_display_name(&self) -> Result<Option<Bytes>> {
        self.with_first_value(b"From", |v| Ok(v.as_addr()?.display.clone()))
    }

    /// The `tag` parameter of From; `Ok(None)` when the peer sent none.
    pub fn from_tag(&self) -> Result<Option<Bytes>> {
        self.param_of(b"From", b"tag")
    }

    pub fn to_uri_str(&self) -> Result<Bytes> {
        self.with_first_value(b"To", |v| Ok(v.as_addr()?.uri.clone()))
    }

    pub fn to_display_name(&self) -> Result<Option<Bytes>> {
        self.with_first_value(b"To", |v| Ok(v.as_addr()?.display.clone()))
    }

    pub fn to_tag(&self) -> Result<Option<Bytes>> {
        self.param_of(b"To", b"tag")
    }

    // --- Identification ---

    pub fn callid(&self) -> Result<Bytes> {
        self.with_first_value(b"Call-ID", |v| Ok(v.as_str_val()?.clone()))
    }

    pub fn cseq_num(&self) -> Result<u32> {
        self.with_first_value(b"CSeq", |v| match v.data() {
            ValueData::CSeq { num, .. } => Ok(*num),
            _ => Err(Error::bad("CSeq value")),
        })
    }

    pub fn cseq_method(&self) -> Result<Method> {
        self.with_first_value(b"CSeq", |v| match v.data() {
            ValueData::CSeq { method, .. } => Ok(*method),
            _ => Err(Error::bad("CSeq value")),
        })
    }

    // --- Via ---

    pub fn via_sent_by_host(&self) -> Result<Bytes> {
        self.with_first_value(b"Via", |v| Ok(v.as_via()?.sent_by_host.clone()))
    }

    pub fn via_sent_by_port(&self) -> Result<Option<u16>> {
        self.with_first_value(b"Via", |v| Ok(v.as_via()?.sent_by_port))
    }

    /// The `branch` parameter of the first Via hop.
    pub fn branchid(&self) -> Result<Option<Bytes>> {
        self.param_of(b"Via", b"branch")
    }

    // --- Contact ---

    pub fn contact_uri_str(&self) -> Result<Bytes> {
        self.with_first_value(b"Contact", |v| Ok(v.as_addr()?.uri.clone()))
    }

    // --- Events (RFC 3265) ---

    pub fn event(&self) -> Result<Bytes> {
        self.with_first_value(b"Event", |v| Ok(v.as_str_val()?.clone()))
    }

    /// The `id` parameter of the Event header.
    pub fn event_id_param(&self) -> Result<Option<Bytes>> {
        self.param_of(b"Event", b"id")
    }

    /// The Subscription-State state token (`active`, `pending`,
    /// `terminated`, ...).
    pub fn substate(&self) -> Result<Bytes> {
        self.with_first_value(b"Subscription-State", |v| Ok(v.as_str_val()?.clone()))
    }

    // --- Numeric headers ---

    pub fn expires(&self) -> Result<u32> {
        self.with_first_value(b"Expires", |v| v.as_int())
    }

    pub fn min_expires(&self) -> Result<u32> {
        self.with_first_value(b"Min-Expires", |v| v.as_int())
    }

    pub fn max_forwards(&self) -> Result<u32> {
        self.with_first_value(b"Max-Forwards", |v| v.as_int())
    }

    pub fn content_length(&self) -> Result<u32> {
        self.with_first_value(b"Content-Length", |v| v.as_int())
    }

    pub fn rseq(&self) -> Result<u32> {
        self.with_first_value(b"RSeq", |v| v.as_int())
    }

    // --- Content type ---

    pub fn content_type(&self) -> Result<Bytes> {
        self.with_first_value(b"Content-Type", |v| match v.data() {
            ValueData::Pair { first, .. } => Ok(first.clone()),
            _ => Err(Error::bad("Content-Type value")),
        })
    }

    pub fn content_sub_type(&self) -> Result<Bytes> {
        self.with_first_value(b"Content-Type", |v| match v.data() {
            ValueData::Pair { second, .. } => Ok(second.clone()),
            _ => Err(Error::bad("Content-Type value")),
        })
    }

    // --- Misc specialized headers ---

    /// Every method named by Allow headers, bad values skipped.
    pub fn allow_methods(&self) -> Result<Vec<Method>> {
        let header = self.header(b"Allow").ok_or_else(|| Error::missing("Allow"))?;
        Ok(header
            .values()?
            .filter_map(|v| v.as_method().ok())
            .collect())
    }

    /// Code, agent and text of the first Warning value.
    pub fn warning(&self) -> Result<(u16, Bytes, Bytes)> {
        self.with_first_value(b"Warning", |v| match v.data() {
            ValueData::Warn { code, agent, text } => Ok((*code, agent.clone(), text.clone())),
            _ => Err(Error::bad("Warning value")),
        })
    }

    pub fn date(&self) -> Result<DateValue> {
        self.with_first_value(b"Date", |v| match v.data() {
            ValueData::Date(d) => Ok(d.clone()),
            _ => Err(Error::bad("Date value")),
        })
    }

    /// RAck fields: response number, CSeq number, method.
    pub fn rack(&self) -> Result<(u32, u32, Method)> {
        self.with_first_value(b"RAck", |v| match v.data() {
            ValueData::RAck { resp, cseq, method } => Ok((*resp, *cseq, *method)),
            _ => Err(Error::bad("RAck value")),
        })
    }

    /// Retry-After delta and optional comment.
    pub fn retry_after(&self) -> Result<(u32, Option<Bytes>)> {
        self.with_first_value(b"Retry-After", |v| match v.data() {
            ValueData::IntStr { num, comment } => Ok((*num, comment.clone())),
            _ => Err(Error::bad("Retry-After value")),
        })
    }

    /// Timestamp and optional delay.
    pub fn timestamp(&self) -> Result<(Bytes, Option<Bytes>)> {
        self.with_first_value(b"Timestamp", |v| match v.data() {
            ValueData::Str(s) => Ok((s.clone(), None)),
            ValueData::Pair { first, second } => Ok((first.clone(), Some(second.clone()))),
            _ => Err(Error::bad("Timestamp value")),
        })
    }
}
