//! Message mutation: copy-on-modify with tombstones.
//!
//! Additions append records with fresh buffers; deletions flip a record's
//! state and subtract its bytes from the message length without unlinking
//! it, so outstanding value slices stay valid. All mutation entry points
//! fail with `NotModifiable` once the message has been handed to the
//! transport.

use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::error::{Error, Result};
use crate::message::header::{Header, HeaderState};
use crate::message::{MsgInner, SipMsg};
use crate::parser::scan::trim_trailing_crlf;
use crate::types::value::{HeaderValue, ValueState};

impl SipMsg {
    fn check_modifiable(inner: &MsgInner) -> Result<()> {
        if !inner.modifiable {
            return Err(Error::NotModifiable);
        }
        Ok(())
    }

    fn push_record(inner: &mut MsgInner, bytes: Vec<u8>) -> Arc<Header> {
        let record = Header::from_record(Bytes::from(bytes), inner.headers.len());
        inner.len += record.len();
        inner.headers.push(record.clone());
        record
    }

    /// Appends a new `Name: value` header.
    pub fn add_header(&self, name: &str, value: &str) -> Result<Arc<Header>> {
        let mut inner = self.inner.lock();
        Self::check_modifiable(&inner)?;
        let bytes = format!("{}: {}\r\n", name, value).into_bytes();
        Ok(Self::push_record(&mut inner, bytes))
    }

    /// Appends a copy of `src` (a header of this or another message). The
    /// optional `param` is appended to the copied bytes as `;param`.
    pub fn copy_header(&self, src: &Header, param: Option<&str>) -> Result<Arc<Header>> {
        let mut inner = self.inner.lock();
        Self::check_modifiable(&inner)?;
        let mut bytes = trim_trailing_crlf(src.raw()).to_vec();
        if let Some(param) = param {
            bytes.extend_from_slice(b";");
            bytes.extend_from_slice(param.as_bytes());
        }
        bytes.extend_from_slice(b"\r\n");
        Ok(Self::push_record(&mut inner, bytes))
    }

    /// Finds `name` in `src` and copies it here.
    pub fn copy_header_by_name(
        &self,
        src: &SipMsg,
        name: &[u8],
        param: Option<&str>,
    ) -> Result<Arc<Header>> {
        let header = src
            .header(name)
            .ok_or_else(|| Error::missing(String::from_utf8_lossy(name)))?;
        self.copy_header(&header, param)
    }

    /// Tombstones a header record: the bytes stay valid, searches skip the
    /// record, and the message length drops by the record's size.
    pub fn delete_header(&self, header: &Header) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_modifiable(&inner)?;
        if header.state() == HeaderState::Deleted {
            return Err(Error::InvalidArgument);
        }
        header.set_state(HeaderState::Deleted);
        inner.len -= header.len();
        debug!(name = %String::from_utf8_lossy(header.name()), "deleted header");
        Ok(())
    }

    /// Finds and tombstones the first header matching `name`.
    pub fn delete_header_by_name(&self, name: &[u8]) -> Result<()> {
        let header = self
            .header(name)
            .ok_or(Error::InvalidArgument)?;
        self.delete_header(&header)
    }

    /// Tombstones one value of a multi-value header. The record is marked
    /// `ValueDeleted` and reserializes without the value.
    pub fn delete_value(&self, header: &Header, value: &HeaderValue) -> Result<()> {
        let mut inner = self.inner.lock();
        Self::check_modifiable(&inner)?;
        if header.state() == HeaderState::Deleted || value.state() == ValueState::Deleted {
            return Err(Error::InvalidArgument);
        }
        header.set_state(HeaderState::ValueDeleted);
        value.set_state(ValueState::Deleted);
        inner.len -= value.raw().len();
        Ok(())
    }

    /// Re-issues `header` with ` ;name=value` inserted before the CRLF.
    /// The original record is tombstoned and the replacement returned.
    pub fn add_param(&self, header: &Header, name: &str, value: &str) -> Result<Arc<Header>> {
        let mut inner = self.inner.lock();
        Self::check_modifiable(&inner)?;
        if header.state() == HeaderState::Deleted {
            return Err(Error::InvalidArgument);
        }

        let mut bytes = trim_trailing_crlf(header.raw()).to_vec();
        bytes.extend_from_slice(b" ; ");
        bytes.extend_from_slice(name.as_bytes());
        bytes.extend_from_slice(b"=");
        bytes.extend_from_slice(value.as_bytes());
        bytes.extend_from_slice(b"\r\n");

        header.set_state(HeaderState::Deleted);
        inner.len -= header.len();
        Ok(Self::push_record(&mut inner, bytes))
    }

    /// Adds a `branch` parameter to the first Via header. Fails with
    /// `InvalidArgument` when the Via already carries one.
    pub fn add_branchid_to_via(&self, branch: &str) -> Result<Arc<Header>> {
        let via = self
            .header(b"Via")
            .ok_or_else(|| Error::missing("Via"))?;
        if via.value()?.has_param(b"branch") {
            return Err(Error::InvalidArgument);
        }
        self.add_param(&via, "branch", branch)
    }
}
