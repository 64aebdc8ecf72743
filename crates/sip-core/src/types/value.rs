//! Parsed header trees.
//!
//! A header parses into a [`ParsedHeader`] holding one [`HeaderValue`] per
//! comma-separated value. Every byte field is a [`Bytes`] window into the
//! owning header's buffer; the parser allocates no strings, so a value stays
//! readable for as long as the message (or a standalone header) is alive.

use std::sync::atomic::{AtomicU8, Ordering};

use bytes::Bytes;

use crate::error::{Error, Result};
use crate::types::method::Method;
use crate::types::uri::SipUri;

/// Lifecycle of a single header value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueState {
    /// Parsed cleanly.
    Ok,
    /// Malformed; the surrounding values are still usable.
    Bad,
    /// Tombstoned by `delete_value`.
    Deleted,
}

impl ValueState {
    fn from_u8(v: u8) -> ValueState {
        match v {
            1 => ValueState::Bad,
            2 => ValueState::Deleted,
            _ => ValueState::Ok,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ValueState::Ok => 0,
            ValueState::Bad => 1,
            ValueState::Deleted => 2,
        }
    }
}

/// A `name[=value]` parameter. A quoted value is stored without its quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub name: Bytes,
    pub value: Option<Bytes>,
}

impl Param {
    /// Case-insensitive name match.
    pub fn is_named(&self, name: &[u8]) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

/// Display-name/URI form shared by Contact, From, To, Route and
/// Record-Route values.
#[derive(Debug, Clone, Default)]
pub struct AddrValue {
    /// Display name without surrounding quotes, if one was present.
    pub display: Option<Bytes>,
    /// The URI, without angle brackets.
    pub uri: Bytes,
    /// Result of running the URI grammar over `uri`.
    pub parsed_uri: Option<SipUri>,
}

/// One `SIP/version/transport host [:port]` hop of a Via header.
#[derive(Debug, Clone, Default)]
pub struct ViaValue {
    pub protocol_name: Bytes,
    pub protocol_version: Bytes,
    pub transport: Bytes,
    /// Sent-by host; an IPv6 literal keeps its brackets (`[::1]`).
    pub sent_by_host: Bytes,
    pub sent_by_port: Option<u16>,
}

/// Field slices of a Date header (RFC 3261 Section 20.17).
#[derive(Debug, Clone, Default)]
pub struct DateValue {
    pub weekday: Bytes,
    pub day: u32,
    pub month: Bytes,
    pub year: u32,
    pub time: Bytes,
    pub timezone: Bytes,
}

/// The per-family payload of a header value.
#[derive(Debug, Clone)]
pub enum ValueData {
    /// No payload (empty header).
    None,
    /// Single integer (Expires, Content-Length, Max-Forwards, RSeq).
    Int(u32),
    /// Single byte slice (Event, Call-ID, Subject, token-list entries).
    Str(Bytes),
    /// `a/b` pair (Accept, Content-Type) or timestamp/delay.
    Pair { first: Bytes, second: Bytes },
    /// Contact/From/To/Route/Record-Route address.
    Addr(AddrValue),
    Via(ViaValue),
    /// A bare method token (Allow).
    Method(Method),
    CSeq { num: u32, method: Method },
    RAck { resp: u32, cseq: u32, method: Method },
    Warn { code: u16, agent: Bytes, text: Bytes },
    Date(DateValue),
    /// Integer plus optional parenthesized comment (Retry-After).
    IntStr { num: u32, comment: Option<Bytes> },
    /// Challenge/credentials scheme; the parameters live in the common
    /// param list.
    Auth { scheme: Bytes },
}

/// One comma-separated value of a parsed header.
#[derive(Debug)]
pub struct HeaderValue {
    /// The raw byte range this value was parsed from, trailing CRLF
    /// excluded.
    pub(crate) raw: Bytes,
    state: AtomicU8,
    pub(crate) data: ValueData,
    pub(crate) params: Vec<Param>,
}

impl HeaderValue {
    pub(crate) fn new(raw: Bytes, data: ValueData, params: Vec<Param>) -> Self {
        HeaderValue {
            raw,
            state: AtomicU8::new(ValueState::Ok.as_u8()),
            data,
            params,
        }
    }

    pub(crate) fn bad(raw: Bytes) -> Self {
        let v = HeaderValue::new(raw, ValueData::None, Vec::new());
        v.set_state(ValueState::Bad);
        v
    }

    /// The raw bytes of this value as they appeared on the wire.
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    pub fn state(&self) -> ValueState {
        ValueState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn set_state(&self, state: ValueState) {
        self.state.store(state.as_u8(), Ordering::Release);
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    /// The value's parameter list. Fails on a deleted value.
    pub fn params(&self) -> Result<&[Param]> {
        if self.state() == ValueState::Deleted {
            return Err(Error::InvalidArgument);
        }
        Ok(&self.params)
    }

    /// Looks up a parameter by name, case-insensitively. `Ok(None)` means the
    /// parameter is a flag (present with no value).
    pub fn param(&self, name: &[u8]) -> Result<Option<&Bytes>> {
        let param = self
            .params()?
            .iter()
            .find(|p| p.is_named(name))
            .ok_or(Error::InvalidArgument)?;
        Ok(param.value.as_ref())
    }

    /// Whether a parameter with the given name is present.
    pub fn has_param(&self, name: &[u8]) -> bool {
        self.params.iter().any(|p| p.is_named(name))
    }

    fn check_ok(&self) -> Result<()> {
        match self.state() {
            ValueState::Ok => Ok(()),
            ValueState::Bad => Err(Error::bad("value failed to parse")),
            ValueState::Deleted => Err(Error::InvalidArgument),
        }
    }

    /// The integer payload of an `Int` value.
    pub fn as_int(&self) -> Result<u32> {
        self.check_ok()?;
        match &self.data {
            ValueData::Int(n) => Ok(*n),
            ValueData::IntStr { num, .. } => Ok(*num),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// The slice payload of a `Str` value.
    pub fn as_str_val(&self) -> Result<&Bytes> {
        self.check_ok()?;
        match &self.data {
            ValueData::Str(s) => Ok(s),
            ValueData::Pair { first, .. } => Ok(first),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// The address payload of a CFTR value.
    pub fn as_addr(&self) -> Result<&AddrValue> {
        self.check_ok()?;
        match &self.data {
            ValueData::Addr(a) => Ok(a),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// The method payload of an Allow value.
    pub fn as_method(&self) -> Result<Method> {
        self.check_ok()?;
        match &self.data {
            ValueData::Method(m) => Ok(*m),
            ValueData::CSeq { method, .. } => Ok(*method),
            _ => Err(Error::InvalidArgument),
        }
    }

    /// The Via payload.
    pub fn as_via(&self) -> Result<&ViaValue> {
        self.check_ok()?;
        match &self.data {
            ValueData::Via(v) => Ok(v),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Root of the per-header parse tree.
#[derive(Debug, Default)]
pub struct ParsedHeader {
    pub(crate) values: Vec<HeaderValue>,
}

impl ParsedHeader {
    pub(crate) fn empty() -> Self {
        ParsedHeader { values: Vec::new() }
    }

    /// The first value that is not tombstoned. A bad first value is
    /// surfaced as `BadProtocol` so callers can distinguish malformed from
    /// absent.
    pub fn value(&self) -> Result<&HeaderValue> {
        let value = self
            .values
            .iter()
            .find(|v| v.state() != ValueState::Deleted)
            .ok_or(Error::InvalidArgument)?;
        if value.state() == ValueState::Bad {
            return Err(Error::bad("first header value is malformed"));
        }
        Ok(value)
    }

    /// The next live value after `prev`, identified by position.
    pub fn next_value(&self, prev: &HeaderValue) -> Option<&HeaderValue> {
        let start = self
            .values
            .iter()
            .position(|v| std::ptr::eq(v, prev))?;
        self.values[start + 1..]
            .iter()
            .find(|v| v.state() != ValueState::Deleted)
    }

    /// Iterates every live value, bad ones included.
    pub fn values(&self) -> impl Iterator<Item = &HeaderValue> {
        self.values
            .iter()
            .filter(|v| v.state() != ValueState::Deleted)
    }

    /// Number of values, deleted ones included.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_state_transitions() {
        let v = HeaderValue::new(Bytes::from_static(b"x"), ValueData::Int(5), Vec::new());
        assert_eq!(v.state(), ValueState::Ok);
        assert_eq!(v.as_int().unwrap(), 5);
        v.set_state(ValueState::Bad);
        assert!(matches!(v.as_int(), Err(Error::BadProtocol(_))));
        v.set_state(ValueState::Deleted);
        assert_eq!(v.as_int(), Err(Error::InvalidArgument));
    }

    #[test]
    fn test_first_value_skips_deleted() {
        let a = HeaderValue::new(Bytes::from_static(b"a"), ValueData::Int(1), Vec::new());
        let b = HeaderValue::new(Bytes::from_static(b"b"), ValueData::Int(2), Vec::new());
        a.set_state(ValueState::Deleted);
        let phdr = ParsedHeader { values: vec![a, b] };
        assert_eq!(phdr.value().unwrap().as_int().unwrap(), 2);
    }

    #[test]
    fn test_param_lookup_is_case_insensitive() {
        let params = vec![
            Param { name: Bytes::from_static(b"Tag"), value: Some(Bytes::from_static(b"abc")) },
            Param { name: Bytes::from_static(b"lr"), value: None },
        ];
        let v = HeaderValue::new(Bytes::from_static(b"x"), ValueData::None, params);
        assert_eq!(v.param(b"tag").unwrap().unwrap().as_ref(), b"abc");
        assert_eq!(v.param(b"LR").unwrap(), None);
        assert!(v.has_param(b"lr"));
        assert!(v.param(b"absent").is_err());
    }
}
