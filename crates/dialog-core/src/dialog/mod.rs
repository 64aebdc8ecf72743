//! The SIP dialog object (RFC 3261 Section 12).
//!
//! A [`Dialog`] is shared between the registry tables, the partial-dialog
//! timer, and every handle returned to callers; `Arc` ownership plays the
//! role of the reference count, and the per-dialog mutex serializes state
//! transitions.

pub mod route_set;

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::{Mutex, MutexGuard};
use sipkit_sip_core::{Header, Method};

use crate::digest::DialogId;
use crate::timer::Timer;

/// Dialog lifecycle states. Once `Destroyed`, a dialog never transitions
/// again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogState {
    /// Seeded, no tag-bearing answer matched yet (partial dialog).
    New,
    /// A provisional tag-bearing response arrived.
    Early,
    /// A final 2xx (or matching NOTIFY) established the dialog.
    Confirmed,
    Destroyed,
}

impl fmt::Display for DialogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DialogState::New => "new",
            DialogState::Early => "early",
            DialogState::Confirmed => "confirmed",
            DialogState::Destroyed => "destroyed",
        };
        f.write_str(s)
    }
}

/// Which side of the dialog this object models.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogType {
    Uac,
    Uas,
}

pub(crate) struct DialogInner {
    pub id: DialogId,
    pub state: DialogState,
    pub dlg_type: DialogType,
    pub method: Method,
    pub local_cseq: u32,
    pub remote_cseq: u32,
    /// Owned copy of the Call-ID header.
    pub call_id: Option<Arc<Header>>,
    /// Tag-bearing header for the local party.
    pub local_uri_tag: Option<Arc<Header>>,
    /// Tag-bearing header for the remote party.
    pub remote_uri_tag: Option<Arc<Header>>,
    /// Owned copy of the peer's Contact header.
    pub remote_target: Option<Arc<Header>>,
    /// Owned copy of the Event header (SUBSCRIBE dialogs).
    pub event: Option<Arc<Header>>,
    /// Constructed `Route:` header for mid-dialog requests.
    pub route_set: Option<Arc<Header>>,
    /// Printable comma-joined route set.
    pub rset: Option<String>,
    /// Request-URI override under strict routing.
    pub req_uri: Option<String>,
    pub on_fork: bool,
    pub timer: Option<Timer>,
}

impl DialogInner {
    pub(crate) fn new(dlg_type: DialogType, method: Method) -> DialogInner {
        DialogInner {
            id: DialogId::unset(),
            state: DialogState::New,
            dlg_type,
            method,
            local_cseq: 0,
            remote_cseq: 0,
            call_id: None,
            local_uri_tag: None,
            remote_uri_tag: None,
            remote_target: None,
            event: None,
            route_set: None,
            rset: None,
            req_uri: None,
            on_fork: false,
            timer: None,
        }
    }
}

/// A shared dialog handle.
pub struct Dialog {
    pub(crate) inner: Mutex<DialogInner>,
}

/// Reads the `tag` parameter of a tag-bearing header copy.
pub(crate) fn header_tag(header: &Arc<Header>) -> Option<Bytes> {
    header.value().ok()?.param(b"tag").ok().flatten().cloned()
}

/// Reads the URI of an owned Contact copy.
pub(crate) fn header_addr_uri(header: &Arc<Header>) -> Option<Bytes> {
    Some(header.value().ok()?.as_addr().ok()?.uri.clone())
}

/// Reads the single string value of an owned Call-ID copy.
pub(crate) fn header_str(header: &Arc<Header>) -> Option<Bytes> {
    header.value().ok()?.as_str_val().ok().cloned()
}

impl Dialog {
    pub(crate) fn from_inner(inner: DialogInner) -> Arc<Dialog> {
        Arc::new(Dialog { inner: Mutex::new(inner) })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, DialogInner> {
        self.inner.lock()
    }

    pub fn id(&self) -> DialogId {
        self.lock().id
    }

    pub fn state(&self) -> DialogState {
        self.lock().state
    }

    pub fn dialog_type(&self) -> DialogType {
        self.lock().dlg_type
    }

    /// The dialog-establishing method (INVITE or SUBSCRIBE).
    pub fn method(&self) -> Method {
        self.lock().method
    }

    pub fn local_cseq(&self) -> u32 {
        self.lock().local_cseq
    }

    pub fn remote_cseq(&self) -> u32 {
        self.lock().remote_cseq
    }

    /// Whether this is still a partial dialog.
    pub fn is_incomplete(&self) -> bool {
        self.lock().state == DialogState::New
    }

    pub fn call_id(&self) -> Option<Bytes> {
        self.lock().call_id.as_ref().and_then(header_str)
    }

    pub fn local_tag(&self) -> Option<Bytes> {
        self.lock().local_uri_tag.as_ref().and_then(header_tag)
    }

    pub fn remote_tag(&self) -> Option<Bytes> {
        self.lock().remote_uri_tag.as_ref().and_then(header_tag)
    }

    /// The remote target URI (the peer's Contact).
    pub fn remote_target_uri(&self) -> Option<Bytes> {
        self.lock().remote_target.as_ref().and_then(header_addr_uri)
    }

    /// The Event header copy of a SUBSCRIBE dialog.
    pub fn event_header(&self) -> Option<Arc<Header>> {
        self.lock().event.clone()
    }

    /// The constructed `Route:` header for mid-dialog requests, if the
    /// dialog has a route set.
    pub fn route_header(&self) -> Option<Arc<Header>> {
        self.lock().route_set.clone()
    }

    /// The printable route set (`,`-joined hops).
    pub fn rset_str(&self) -> Option<String> {
        self.lock().rset.clone()
    }

    /// The Request-URI for the next in-dialog request: the strict-routing
    /// first hop when one exists, the remote target otherwise.
    pub fn req_uri(&self) -> Option<String> {
        let inner = self.lock();
        if inner.route_set.is_none() || inner.req_uri.is_none() {
            let target = inner.remote_target.as_ref().and_then(header_addr_uri)?;
            return Some(String::from_utf8_lossy(&target).into_owned());
        }
        inner.req_uri.clone()
    }

    /// Deep copy of a partial dialog, used when a forking proxy delivers
    /// multiple answers to one request. The copy starts unpublished
    /// (`New`, unset id, no timer) and does not fork again.
    pub(crate) fn copy_partial(&self) -> Arc<Dialog> {
        let src = self.lock();
        let mut copy = DialogInner::new(src.dlg_type, src.method);
        copy.local_cseq = src.local_cseq;
        copy.remote_cseq = src.remote_cseq;
        copy.call_id = src.call_id.as_ref().map(|h| h.duplicate());
        copy.local_uri_tag = src.local_uri_tag.as_ref().map(|h| h.duplicate());
        copy.remote_target = src.remote_target.as_ref().map(|h| h.duplicate());
        copy.event = src.event.as_ref().map(|h| h.duplicate());
        copy.route_set = src.route_set.as_ref().map(|h| h.duplicate());
        copy.rset = src.rset.clone();
        copy.req_uri = src.req_uri.clone();
        copy.on_fork = false;
        Dialog::from_inner(copy)
    }
}

impl fmt::Debug for Dialog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("Dialog")
            .field("id", &inner.id)
            .field("state", &inner.state)
            .field("type", &inner.dlg_type)
            .field("method", &inner.method)
            .finish()
    }
}
