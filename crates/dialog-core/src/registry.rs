//! The dialog registry: seeding, completion, lookup and mid-dialog
//! processing over two digest-keyed tables.
//!
//! The *partial* table holds UAC dialogs between the dialog-establishing
//! request and its first tag-bearing answer, keyed by (local tag,
//! Call-ID). The *full* table holds early and confirmed dialogs keyed by
//! (local tag, remote tag, Call-ID). Tables are sharded maps; table
//! membership holds one shared reference to the dialog.

use std::sync::{Arc, Weak};

use dashmap::DashMap;
use sipkit_sip_core::parser::scan::{trim_start, trim_trailing_crlf};
use sipkit_sip_core::{Header, Method, SipMsg};
use tracing::{debug, warn};

use crate::config::{DialogConfig, SipConn};
use crate::dialog::route_set::compute_route_set;
use crate::dialog::{header_str, header_tag, Dialog, DialogInner, DialogState, DialogType};
use crate::digest::DialogId;
use crate::errors::{DialogError, DialogResult};
use crate::timer::Timer;

/// Invoked after every committed state transition, with no lock held:
/// `(dialog, message, previous state, new state)`. The message is `None`
/// for transitions not driven by a message.
pub type StateCallback =
    Box<dyn Fn(&Arc<Dialog>, Option<&SipMsg>, DialogState, DialogState) + Send + Sync>;

/// Per-operation completion callback: `(dialog, message)`. The message is
/// `None` when the partial-dialog timer expired.
pub type DialogCallback = Arc<dyn Fn(&Arc<Dialog>, Option<&SipMsg>) + Send + Sync>;

/// Direction of the From/To label exchange used when a dialog stores one
/// party's identity under the other label.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Xchg {
    /// Copy the From header's value under a `To:` label.
    FromAsTo,
    /// Copy the To header's value under a `From:` label.
    ToAsFrom,
}

/// Builds the relabelled identity header for dialog establishment: a UAS
/// seeds its remote identity from the request's From, stored as a `To:`
/// header for the responses it will send (and symmetrically for To).
fn xchg_from_to(msg: &SipMsg, which: Xchg) -> DialogResult<Arc<Header>> {
    let (src, label): (&[u8], &str) = match which {
        Xchg::FromAsTo => (b"From", "To"),
        Xchg::ToAsFrom => (b"To", "From"),
    };
    let header = msg
        .header(src)
        .ok_or_else(|| DialogError::missing(String::from_utf8_lossy(src)))?;
    let raw = header.raw();
    let colon = raw
        .iter()
        .position(|&b| b == b':')
        .ok_or_else(|| DialogError::invalid("header has no colon"))?;
    let region = trim_trailing_crlf(trim_start(&raw[colon + 1..]));

    let mut bytes = Vec::with_capacity(label.len() + region.len() + 4);
    bytes.extend_from_slice(label.as_bytes());
    bytes.extend_from_slice(b": ");
    bytes.extend_from_slice(region);
    bytes.extend_from_slice(b"\r\n");
    Ok(Header::synthesized(bytes))
}

/// The dialog layer's shared state. Independent registries are fully
/// isolated; tests instantiate their own.
pub struct DialogRegistry {
    config: DialogConfig,
    full: DashMap<DialogId, Arc<Dialog>>,
    partial: DashMap<DialogId, Arc<Dialog>>,
    state_cb: Option<StateCallback>,
    /// Self-reference handed to partial-dialog timers so their callbacks
    /// can reach the tables without keeping the registry alive.
    me: Weak<DialogRegistry>,
}

impl DialogRegistry {
    pub fn new(config: DialogConfig, state_cb: Option<StateCallback>) -> Arc<DialogRegistry> {
        Arc::new_cyclic(|me| DialogRegistry {
            config,
            full: DashMap::new(),
            partial: DashMap::new(),
            state_cb,
            me: me.clone(),
        })
    }

    fn notify(
        &self,
        dialog: &Arc<Dialog>,
        msg: Option<&SipMsg>,
        prev: DialogState,
        new: DialogState,
    ) {
        debug!(id = %dialog.id(), %prev, %new, "dialog state change");
        if let Some(cb) = &self.state_cb {
            cb(dialog, msg, prev, new);
        }
    }

    /// Number of dialogs in the full table.
    pub fn full_count(&self) -> usize {
        self.full.len()
    }

    /// Number of dialogs in the partial table.
    pub fn partial_count(&self) -> usize {
        self.partial.len()
    }

    /// Seeds a dialog from an INVITE or SUBSCRIBE request.
    ///
    /// For a UAC the request is the one just sent: the local identity is
    /// its From, and the partial dialog is published under the
    /// (From tag, Call-ID) digest until an answer completes it. For a UAS
    /// the request is the one just received: the remote identity is its
    /// From, stored relabelled as `To:`.
    ///
    /// The partial dialog self-destructs after `64 * T1` unless completed;
    /// `completion` is then invoked with no message.
    pub fn seed_dialog(
        &self,
        conn: Option<&dyn SipConn>,
        msg: &SipMsg,
        completion: Option<DialogCallback>,
        on_fork: bool,
        dlg_type: DialogType,
    ) -> DialogResult<Arc<Dialog>> {
        if !msg.is_request()? {
            return Err(DialogError::invalid("seed requires a request"));
        }
        let method = msg.request_method()?;
        if method != Method::Invite && method != Method::Subscribe {
            return Err(DialogError::invalid("only INVITE and SUBSCRIBE seed dialogs"));
        }

        let to_labelled_from = match dlg_type {
            DialogType::Uas => Some(xchg_from_to(msg, Xchg::FromAsTo)?),
            DialogType::Uac => None,
        };
        let from_hdr = msg.header(b"From").ok_or_else(|| DialogError::missing("From"))?;
        let call_id_hdr = msg
            .header(b"Call-ID")
            .ok_or_else(|| DialogError::missing("Call-ID"))?;
        let contact_hdr = msg
            .header(b"Contact")
            .ok_or_else(|| DialogError::missing("Contact"))?;
        let event_hdr = if method == Method::Subscribe {
            Some(msg.header(b"Event").ok_or_else(|| DialogError::missing("Event"))?)
        } else {
            None
        };

        // Sanity checks: everything the dialog will serve later must be
        // extractable now.
        let local_tag = msg
            .from_tag()?
            .ok_or_else(|| DialogError::validation("From carries no tag"))?;
        msg.from_uri_str()?;
        msg.to_uri_str()?;
        let cseq = msg.cseq_num()?;
        let call_id = msg.callid()?;
        msg.contact_uri_str()?;

        let mut inner = DialogInner::new(dlg_type, method);
        match dlg_type {
            DialogType::Uas => inner.remote_uri_tag = to_labelled_from,
            DialogType::Uac => inner.local_uri_tag = Some(from_hdr.duplicate()),
        }
        inner.remote_target = Some(contact_hdr.duplicate());
        inner.call_id = Some(call_id_hdr.duplicate());
        inner.event = event_hdr.map(|h| h.duplicate());
        compute_route_set(&mut inner, msg)?;
        match dlg_type {
            DialogType::Uac => inner.local_cseq = cseq,
            DialogType::Uas => inner.remote_cseq = cseq,
        }
        inner.on_fork = on_fork;
        if dlg_type == DialogType::Uac {
            inner.id = DialogId::partial(&local_tag, &call_id);
        }

        let dialog = Dialog::from_inner(inner);

        let t1 = conn
            .and_then(|c| c.timer_t1())
            .unwrap_or(self.config.timer_t1);
        let registry = self.me.clone();
        let timer_dialog = dialog.clone();
        let timer_completion = completion.clone();
        let timer = Timer::schedule(t1 * 64, move || {
            DialogRegistry::self_destruct(registry, timer_dialog, timer_completion);
        });
        dialog.lock().timer = Some(timer);

        if dlg_type == DialogType::Uac {
            self.partial.insert(dialog.id(), dialog.clone());
        }
        debug!(id = %dialog.id(), ?dlg_type, %method, "dialog seeded");
        Ok(dialog)
    }

    /// Timer path: a partial dialog that never completed destroys itself,
    /// leaves the partial table, and reports completion with no message.
    fn self_destruct(
        registry: Weak<DialogRegistry>,
        dialog: Arc<Dialog>,
        completion: Option<DialogCallback>,
    ) {
        {
            let mut inner = dialog.lock();
            if inner.state != DialogState::New {
                // An answer won the race; nothing to destroy.
                return;
            }
            inner.state = DialogState::Destroyed;
        }
        if dialog.dialog_type() == DialogType::Uac {
            if let Some(registry) = registry.upgrade() {
                registry.partial.remove(&dialog.id());
            }
        }
        warn!(id = %dialog.id(), "partial dialog timed out");
        if let Some(f) = completion {
            f(&dialog, None);
        }
    }

    /// Completes a seeded dialog with the answer to its request: a
    /// response for INVITE/SUBSCRIBE, or a NOTIFY for a SUBSCRIBE.
    ///
    /// Provisional answers make the dialog `Early`, 2xx `Confirmed`;
    /// both publish the dialog in the full table under the
    /// (local tag, remote tag, Call-ID) digest. A 3xx-or-higher response
    /// destroys the dialog, reports it, and returns
    /// [`DialogError::Rejected`].
    pub fn complete_dialog(
        &self,
        msg: &SipMsg,
        dialog: &Arc<Dialog>,
        completion: Option<&DialogCallback>,
    ) -> DialogResult<Arc<Dialog>> {
        let is_request = msg.is_request()?;
        let method = if is_request {
            msg.request_method()?
        } else {
            msg.cseq_method()?
        };
        let (dlg_type, dlg_method) = {
            let inner = dialog.lock();
            (inner.dlg_type, inner.method)
        };
        if is_request && (dlg_method == Method::Invite || method != Method::Notify) {
            return Err(DialogError::invalid("only a NOTIFY request can complete a dialog"));
        }

        if method != Method::Notify {
            let cseq = msg.cseq_num()?;
            let expected = {
                let inner = dialog.lock();
                match dlg_type {
                    DialogType::Uac => inner.local_cseq,
                    DialogType::Uas => inner.remote_cseq,
                }
            };
            if cseq != expected {
                return Err(DialogError::validation("CSeq does not match the seeded dialog"));
            }
        }

        let (new_state, tag_header) = if method == Method::Notify {
            self.validate_notify(msg, dialog)?;
            (DialogState::Confirmed, xchg_from_to(msg, Xchg::FromAsTo)?)
        } else {
            if msg.to_tag()?.is_none() {
                return Err(DialogError::validation("answer carries no To tag"));
            }
            let code = msg.response_code()?;
            if code >= 300 {
                return self.reject_partial(msg, dialog, completion, code);
            }
            let state = if code < 200 {
                DialogState::Early
            } else {
                DialogState::Confirmed
            };
            let header = match dlg_type {
                DialogType::Uas => xchg_from_to(msg, Xchg::ToAsFrom)?,
                DialogType::Uac => msg
                    .header(b"To")
                    .ok_or_else(|| DialogError::missing("To"))?
                    .duplicate(),
            };
            (state, header)
        };

        let prev;
        let id;
        {
            let mut inner = dialog.lock();
            if inner.state != DialogState::New {
                return Err(DialogError::WrongState("not a partial dialog"));
            }
            prev = inner.state;
            match dlg_type {
                // The tag-bearing answer names the remote party for a UAC
                // and the local party for a UAS
                DialogType::Uac => inner.remote_uri_tag = Some(tag_header),
                DialogType::Uas => inner.local_uri_tag = Some(tag_header),
            }
            if let Some(timer) = inner.timer.take() {
                timer.cancel();
            }
            // For a UAC the answer comes from the peer: it refreshes the
            // remote target and supplies the route set (RFC 3261 Section
            // 12.1.2). A UAS completes with its own answer and keeps the
            // request-derived target and routes.
            if dlg_type == DialogType::Uac {
                if let Some(contact) = msg.header(b"Contact") {
                    inner.remote_target = Some(contact.duplicate());
                }
                compute_route_set(&mut inner, msg)?;
            }
            let local = inner
                .local_uri_tag
                .as_ref()
                .and_then(header_tag)
                .ok_or_else(|| DialogError::validation("dialog has no local tag"))?;
            let remote = inner
                .remote_uri_tag
                .as_ref()
                .and_then(header_tag)
                .ok_or_else(|| DialogError::validation("dialog has no remote tag"))?;
            let call_id = inner
                .call_id
                .as_ref()
                .and_then(header_str)
                .ok_or_else(|| DialogError::missing("Call-ID"))?;
            inner.id = DialogId::full(&local, &remote, &call_id);
            inner.state = new_state;
            id = inner.id;
        }

        self.full.insert(id, dialog.clone());
        self.notify(dialog, Some(msg), prev, new_state);
        Ok(dialog.clone())
    }

    /// NOTIFY-specific completion checks: Subscription-State must be
    /// `pending` or `active`, and the Event (name and `id` parameter) must
    /// match the seeded subscription byte for byte.
    fn validate_notify(&self, msg: &SipMsg, dialog: &Arc<Dialog>) -> DialogResult<()> {
        if msg.header(b"Event").is_none() {
            return Err(DialogError::missing("Event"));
        }
        if msg.header(b"Subscription-State").is_none() {
            return Err(DialogError::missing("Subscription-State"));
        }
        let substate = msg.substate()?;
        if !substate.eq_ignore_ascii_case(b"pending") && !substate.eq_ignore_ascii_case(b"active") {
            return Err(DialogError::validation("subscription is not pending or active"));
        }
        if msg.from_tag()?.is_none() {
            return Err(DialogError::validation("NOTIFY From carries no tag"));
        }

        let event = msg.event()?;
        let id_param = msg.event_id_param()?;
        let (dlg_event, dlg_id_param) = {
            let inner = dialog.lock();
            let header = inner
                .event
                .as_ref()
                .ok_or_else(|| DialogError::validation("dialog has no event"))?
                .clone();
            drop(inner);
            let value = header.value()?;
            (
                value.as_str_val()?.clone(),
                value.param(b"id").ok().flatten().cloned(),
            )
        };
        if dlg_event != event {
            return Err(DialogError::validation("event does not match the subscription"));
        }
        match (&dlg_id_param, &id_param) {
            (None, None) => {}
            (Some(a), Some(b)) if a.eq_ignore_ascii_case(b) => {}
            _ => return Err(DialogError::validation("event id does not match the subscription")),
        }
        Ok(())
    }

    /// A final non-2xx answer destroys the partial dialog and reports it.
    fn reject_partial(
        &self,
        msg: &SipMsg,
        dialog: &Arc<Dialog>,
        completion: Option<&DialogCallback>,
        code: u16,
    ) -> DialogResult<Arc<Dialog>> {
        let prev;
        let id;
        let dlg_type;
        {
            let mut inner = dialog.lock();
            if inner.state != DialogState::New {
                return Err(DialogError::WrongState("not a partial dialog"));
            }
            prev = inner.state;
            inner.state = DialogState::Destroyed;
            if let Some(timer) = inner.timer.take() {
                timer.cancel();
            }
            id = inner.id;
            dlg_type = inner.dlg_type;
        }
        if dlg_type == DialogType::Uac {
            self.partial.remove(&id);
        }
        self.notify(dialog, Some(msg), prev, DialogState::Destroyed);
        if let Some(f) = completion {
            f(dialog, Some(msg));
        }
        Err(DialogError::Rejected(code))
    }

    /// Builds a complete dialog directly from an answer, without a prior
    /// seed. A UAS additionally needs the original request, whose Contact
    /// is the remote target.
    pub fn dialog_create(
        &self,
        resp: &SipMsg,
        req: Option<&SipMsg>,
        dlg_type: DialogType,
    ) -> DialogResult<Arc<Dialog>> {
        let uas_req = match dlg_type {
            DialogType::Uas => {
                let req = req.ok_or_else(|| {
                    DialogError::invalid("UAS dialog creation requires the original request")
                })?;
                if !req.is_request()? {
                    return Err(DialogError::invalid("original message is not a request"));
                }
                let m = req.request_method()?;
                if m != Method::Invite && m != Method::Subscribe {
                    return Err(DialogError::invalid("request method cannot establish a dialog"));
                }
                Some(req)
            }
            DialogType::Uac => None,
        };

        let is_notify;
        let mut code = None;
        if resp.is_request()? {
            if resp.request_method()? != Method::Notify {
                return Err(DialogError::invalid("only a NOTIFY request can create a dialog"));
            }
            is_notify = true;
        } else {
            let c = resp.response_code()?;
            let m = resp.cseq_method()?;
            if !(100..300).contains(&c) || (m != Method::Invite && m != Method::Subscribe) {
                return Err(DialogError::invalid("answer cannot establish a dialog"));
            }
            is_notify = false;
            code = Some(c);
        }

        // Identity headers by direction. The headers are stored verbatim;
        // only the tags matter for identity.
        let from = resp.header(b"From").ok_or_else(|| DialogError::missing("From"))?;
        let to = resp.header(b"To").ok_or_else(|| DialogError::missing("To"))?;
        let (local_hdr, remote_hdr) = match (dlg_type, is_notify) {
            // We sent the NOTIFY: our identity is its From
            (DialogType::Uas, true) => (from, to),
            // We sent the answer: our identity is its To
            (DialogType::Uas, false) => (to, from),
            // We received the NOTIFY: our identity is its To
            (DialogType::Uac, true) => (to, from),
            // We received the answer: our identity is its From
            (DialogType::Uac, false) => (from, to),
        };
        let contact_hdr = match uas_req {
            Some(req) => req
                .header(b"Contact")
                .ok_or_else(|| DialogError::missing("Contact"))?,
            None => resp
                .header(b"Contact")
                .ok_or_else(|| DialogError::missing("Contact"))?,
        };
        let call_id_hdr = resp
            .header(b"Call-ID")
            .ok_or_else(|| DialogError::missing("Call-ID"))?;

        // Sanity: both tags, both URIs, CSeq and Call-ID must be usable.
        if resp.from_tag()?.is_none() || resp.to_tag()?.is_none() {
            return Err(DialogError::validation("both parties must carry tags"));
        }
        resp.from_uri_str()?;
        resp.to_uri_str()?;
        let cseq = resp.cseq_num()?;
        resp.callid()?;
        contact_hdr.value()?.as_addr()?;

        // A NOTIFY establishes the subscription dialog
        let method = if is_notify {
            Method::Subscribe
        } else {
            resp.cseq_method()?
        };
        let mut inner = DialogInner::new(dlg_type, method);
        inner.local_cseq = cseq;
        inner.local_uri_tag = Some(local_hdr.duplicate());
        inner.remote_uri_tag = Some(remote_hdr.duplicate());
        inner.remote_target = Some(contact_hdr.duplicate());
        inner.call_id = Some(call_id_hdr.duplicate());
        compute_route_set(&mut inner, resp)?;

        let local = inner
            .local_uri_tag
            .as_ref()
            .and_then(header_tag)
            .ok_or_else(|| DialogError::validation("dialog has no local tag"))?;
        let remote = inner
            .remote_uri_tag
            .as_ref()
            .and_then(header_tag)
            .ok_or_else(|| DialogError::validation("dialog has no remote tag"))?;
        let call_id = inner
            .call_id
            .as_ref()
            .and_then(header_str)
            .ok_or_else(|| DialogError::missing("Call-ID"))?;
        inner.id = DialogId::full(&local, &remote, &call_id);
        inner.state = match code {
            Some(c) if c < 200 => DialogState::Early,
            _ => DialogState::Confirmed,
        };

        let new_state = inner.state;
        let id = inner.id;
        let dialog = Dialog::from_inner(inner);
        self.full.insert(id, dialog.clone());
        self.notify(&dialog, Some(resp), DialogState::New, new_state);
        Ok(dialog)
    }

    /// Looks up the dialog an incoming message belongs to.
    ///
    /// Local and remote tags are read direction-sensitively (an incoming
    /// request's To names the local party; an incoming response's From
    /// does). On a full-table miss the UAC partial table is tried under
    /// (local tag, Call-ID); as in the original engine this fallback is
    /// not symmetric for UAS-seeded dialogs, which are not published
    /// until completed.
    pub fn find(&self, msg: &SipMsg) -> Option<Arc<Dialog>> {
        let is_request = msg.is_request().ok()?;
        let (local, remote) = if is_request {
            (msg.to_tag().ok()??, msg.from_tag().ok()??)
        } else {
            (msg.from_tag().ok()??, msg.to_tag().ok()??)
        };
        let call_id = msg.callid().ok()?;

        let full_id = DialogId::full(&local, &remote, &call_id);
        if let Some(dialog) = Self::live_entry(&self.full, &full_id) {
            return Some(dialog);
        }
        let partial_id = DialogId::partial(&local, &call_id);
        Self::live_entry(&self.partial, &partial_id)
    }

    fn live_entry(
        table: &DashMap<DialogId, Arc<Dialog>>,
        id: &DialogId,
    ) -> Option<Arc<Dialog>> {
        let dialog = table.get(id)?.clone();
        if dialog.state() == DialogState::Destroyed {
            return None;
        }
        Some(dialog)
    }

    /// Mid-dialog bookkeeping for a message already matched to `dialog`.
    ///
    /// Requests must not decrease the remote CSeq (`Protocol` error,
    /// dialog untouched). A 2xx response to an INVITE confirms an early
    /// dialog and recomputes the route set from the response.
    pub fn process(&self, msg: &SipMsg, dialog: &Arc<Dialog>) -> DialogResult<()> {
        if msg.is_request()? {
            let cseq = msg.cseq_num()?;
            let mut inner = dialog.lock();
            if inner.remote_cseq != 0 && cseq < inner.remote_cseq {
                return Err(DialogError::protocol("mid-dialog CSeq decreased"));
            }
            inner.remote_cseq = cseq;
            return Ok(());
        }

        let code = msg.response_code()?;
        let method = msg.cseq_method()?;
        let prev;
        {
            let mut inner = dialog.lock();
            if !(200..300).contains(&code)
                || method != Method::Invite
                || inner.state != DialogState::Early
            {
                return Ok(());
            }
            prev = inner.state;
            inner.state = DialogState::Confirmed;
            if inner.dlg_type == DialogType::Uac {
                if let Some(contact) = msg.header(b"Contact") {
                    inner.remote_target = Some(contact.duplicate());
                }
            }
            compute_route_set(&mut inner, msg)?;
        }
        self.notify(dialog, Some(msg), prev, DialogState::Confirmed);
        Ok(())
    }

    /// Drives a dialog with a subsequent message bearing it.
    ///
    /// Confirmed and destroyed dialogs pass through untouched. An early
    /// dialog confirms on 2xx (route set recomputed from the response).
    /// A partial dialog completes: with forking enabled the partial is
    /// deep-copied and the copy completes, leaving the seed to accept
    /// further answers until its timer fires; otherwise the seed leaves
    /// the partial table and completes itself.
    pub fn update_dialog(
        &self,
        dialog: &Arc<Dialog>,
        msg: &SipMsg,
        completion: Option<&DialogCallback>,
    ) -> DialogResult<Arc<Dialog>> {
        let is_request = msg.is_request()?;
        if is_request {
            let method = msg.request_method()?;
            if dialog.method() != Method::Subscribe || method != Method::Notify {
                return Ok(dialog.clone());
            }
        }
        let code = if is_request {
            None
        } else {
            Some(msg.response_code()?)
        };

        match dialog.state() {
            DialogState::Confirmed | DialogState::Destroyed => Ok(dialog.clone()),
            DialogState::Early => {
                let Some(code) = code else { return Ok(dialog.clone()) };
                if !(200..300).contains(&code) {
                    // The caller decides whether to terminate
                    return Ok(dialog.clone());
                }
                let prev;
                {
                    let mut inner = dialog.lock();
                    if inner.state != DialogState::Early {
                        return Ok(dialog.clone());
                    }
                    prev = inner.state;
                    inner.state = DialogState::Confirmed;
                    // The 2xx's Contact and Record-Routes take precedence
                    if inner.dlg_type == DialogType::Uac {
                        if let Some(contact) = msg.header(b"Contact") {
                            inner.remote_target = Some(contact.duplicate());
                        }
                    }
                    compute_route_set(&mut inner, msg)?;
                }
                self.notify(dialog, Some(msg), prev, DialogState::Confirmed);
                Ok(dialog.clone())
            }
            DialogState::New => {
                if let Some(code) = code {
                    // Non-failure answers leave a SUBSCRIBE partial in
                    // place; its NOTIFY establishes the dialog (RFC 3265)
                    if dialog.method() == Method::Subscribe && code < 300 {
                        return Ok(dialog.clone());
                    }
                }

                // Fork handling in one critical section: decide, copy or
                // detach, then complete outside the lock.
                let target = {
                    let mut inner = dialog.lock();
                    if inner.dlg_type == DialogType::Uac {
                        if inner.on_fork {
                            drop(inner);
                            dialog.copy_partial()
                        } else {
                            if let Some(timer) = inner.timer.take() {
                                timer.cancel();
                            }
                            let id = inner.id;
                            drop(inner);
                            self.partial.remove(&id);
                            dialog.clone()
                        }
                    } else {
                        dialog.clone()
                    }
                };
                self.complete_dialog(msg, &target, completion)
            }
        }
    }

    /// Destroys a dialog on caller request. The dialog stays resident
    /// until [`DialogRegistry::delete`] removes it from its table and all
    /// handles are dropped.
    pub fn terminate(&self, dialog: &Arc<Dialog>, msg: Option<&SipMsg>) {
        let prev;
        {
            let mut inner = dialog.lock();
            prev = inner.state;
            inner.state = DialogState::Destroyed;
            if let Some(timer) = inner.timer.take() {
                timer.cancel();
            }
        }
        self.notify(dialog, msg, prev, DialogState::Destroyed);
    }

    /// Removes a destroyed dialog from the full table. Returns `false`
    /// (and leaves the table untouched) while the dialog has not been
    /// destroyed.
    pub fn delete(&self, dialog: &Arc<Dialog>) -> bool {
        let (state, id) = {
            let inner = dialog.lock();
            (inner.state, inner.id)
        };
        if state != DialogState::Destroyed {
            return false;
        }
        self.full.remove(&id).is_some()
    }
}
