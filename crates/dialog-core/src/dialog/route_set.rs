//! Route-set computation (RFC 3261 Section 12.1.1/12.2.1.1).
//!
//! The route set is taken from the Record-Route values of the
//! dialog-establishing message: in order for a UAS, reversed for a UAC.
//! From it the dialog derives a printable form, a constructed `Route:`
//! header for mid-dialog requests, and (under strict routing) the
//! Request-URI override.

use sipkit_sip_core::{Header, SipMsg, ValueState};
use tracing::debug;

use crate::dialog::{header_addr_uri, DialogInner, DialogType};
use crate::errors::{DialogError, DialogResult};

/// One hop of the route set.
pub(crate) struct RouteEntry {
    /// The Record-Route value verbatim, angle brackets and parameters
    /// included.
    raw: String,
    /// The URI inside the brackets.
    uri: String,
    /// Whether the hop is a loose router (`;lr` on the URI).
    lr: bool,
}

/// Walks every Record-Route header of `msg` and builds the route set for
/// the given side. Bad values are skipped.
pub(crate) fn collect_route_set(msg: &SipMsg, dlg_type: DialogType) -> Vec<RouteEntry> {
    let mut entries: Vec<RouteEntry> = Vec::new();
    let mut header = msg.header(b"Record-Route");
    while let Some(h) = header {
        if let Ok(values) = h.values() {
            for value in values {
                if value.state() == ValueState::Bad {
                    continue;
                }
                let Ok(addr) = value.as_addr() else { continue };
                let lr = addr
                    .parsed_uri
                    .as_ref()
                    .map(|u| u.is_loose_router())
                    .unwrap_or(false);
                let entry = RouteEntry {
                    raw: String::from_utf8_lossy(value.raw()).into_owned(),
                    uri: String::from_utf8_lossy(&addr.uri).into_owned(),
                    lr,
                };
                match dlg_type {
                    // UAS: in message order
                    DialogType::Uas => entries.push(entry),
                    // UAC: reversed
                    DialogType::Uac => entries.insert(0, entry),
                }
            }
        }
        header = msg.next_header(b"Record-Route", &h);
    }
    entries
}

/// Derives `rset`, the `Route:` header and the strict-routing Request-URI
/// from the collected hops, and stores them on the dialog.
///
/// The remote target is appended as the last Route entry; with strict
/// routing (first hop without `lr`) the first hop moves into the
/// Request-URI and out of the Route header.
pub(crate) fn set_route_hdr(inner: &mut DialogInner, entries: Vec<RouteEntry>) -> DialogResult<()> {
    debug_assert!(!entries.is_empty());
    let target = inner
        .remote_target
        .as_ref()
        .and_then(header_addr_uri)
        .ok_or_else(|| DialogError::missing("remote target for route set"))?;
    let target = String::from_utf8_lossy(&target).into_owned();

    let rset: Vec<&str> = entries.iter().map(|e| e.raw.as_str()).collect();
    inner.rset = Some(rset.join(","));

    let mut route_vals: Vec<String>;
    if entries[0].lr {
        route_vals = entries.iter().map(|e| e.raw.clone()).collect();
        inner.req_uri = None;
    } else {
        route_vals = entries[1..].iter().map(|e| e.raw.clone()).collect();
        inner.req_uri = Some(entries[0].uri.clone());
    }
    route_vals.push(format!("<{}>", target));

    inner.route_set = Some(Header::build("Route", &route_vals.join(",")));
    debug!(
        rset = inner.rset.as_deref().unwrap_or(""),
        strict = !entries[0].lr,
        "route set computed"
    );
    Ok(())
}

/// Computes the route set from `msg` into `inner`, replacing whatever was
/// there. An empty Record-Route list clears all three artifacts.
pub(crate) fn compute_route_set(inner: &mut DialogInner, msg: &SipMsg) -> DialogResult<()> {
    inner.route_set = None;
    inner.rset = None;
    inner.req_uri = None;

    let entries = collect_route_set(msg, inner.dlg_type);
    if entries.is_empty() {
        return Ok(());
    }
    set_route_hdr(inner, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sipkit_sip_core::Method;

    fn msg(raw: &'static [u8]) -> SipMsg {
        let m = SipMsg::new(raw);
        m.init_headers().unwrap();
        m
    }

    fn inner_with_target(dlg_type: DialogType) -> DialogInner {
        let mut inner = DialogInner::new(dlg_type, Method::Invite);
        inner.remote_target = Some(Header::build("Contact", "<sip:bob@h2>"));
        inner
    }

    const LOOSE: &[u8] = b"SIP/2.0 200 OK\r\n\
Record-Route: <sip:p1@r1;lr>, <sip:p2@r2;lr>\r\n\
CSeq: 1 INVITE\r\n\
\r\n";

    #[test]
    fn test_uac_reverses_loose_routes() {
        let m = msg(LOOSE);
        let mut inner = inner_with_target(DialogType::Uac);
        compute_route_set(&mut inner, &m).unwrap();
        assert_eq!(inner.rset.as_deref(), Some("<sip:p2@r2;lr>,<sip:p1@r1;lr>"));
        // Loose routing keeps the remote target in the request URI
        assert_eq!(inner.req_uri, None);
        let route = inner.route_set.unwrap();
        assert_eq!(
            route.raw().as_ref(),
            b"Route: <sip:p2@r2;lr>,<sip:p1@r1;lr>,<sip:bob@h2>\r\n"
        );
    }

    #[test]
    fn test_uas_keeps_order() {
        let m = msg(LOOSE);
        let mut inner = inner_with_target(DialogType::Uas);
        compute_route_set(&mut inner, &m).unwrap();
        assert_eq!(inner.rset.as_deref(), Some("<sip:p1@r1;lr>,<sip:p2@r2;lr>"));
    }

    #[test]
    fn test_strict_routing_moves_first_hop_to_request_uri() {
        let m = msg(b"SIP/2.0 200 OK\r\n\
Record-Route: <sip:p1@r1>, <sip:p2@r2>\r\n\
CSeq: 1 INVITE\r\n\
\r\n");
        let mut inner = inner_with_target(DialogType::Uac);
        compute_route_set(&mut inner, &m).unwrap();
        // Reversed: p2 first
        assert_eq!(inner.req_uri.as_deref(), Some("sip:p2@r2"));
        let route = inner.route_set.unwrap();
        assert_eq!(route.raw().as_ref(), b"Route: <sip:p1@r1>,<sip:bob@h2>\r\n");
    }

    #[test]
    fn test_empty_record_route_clears_artifacts() {
        let m = msg(b"SIP/2.0 200 OK\r\nCSeq: 1 INVITE\r\n\r\n");
        let mut inner = inner_with_target(DialogType::Uac);
        inner.rset = Some("stale".into());
        compute_route_set(&mut inner, &m).unwrap();
        assert_eq!(inner.rset, None);
        assert!(inner.route_set.is_none());
        assert_eq!(inner.req_uri, None);
    }

    #[test]
    fn test_multiple_record_route_headers_combine() {
        let m = msg(b"SIP/2.0 200 OK\r\n\
Record-Route: <sip:p1@r1;lr>\r\n\
Record-Route: <sip:p2@r2;lr>\r\n\
CSeq: 1 INVITE\r\n\
\r\n");
        let mut inner = inner_with_target(DialogType::Uac);
        compute_route_set(&mut inner, &m).unwrap();
        assert_eq!(inner.rset.as_deref(), Some("<sip:p2@r2;lr>,<sip:p1@r1;lr>"));
    }

    #[test]
    fn test_bad_record_route_value_is_skipped() {
        let m = msg(b"SIP/2.0 200 OK\r\n\
Record-Route: garbage<, <sip:p1@r1;lr>\r\n\
CSeq: 1 INVITE\r\n\
\r\n");
        let mut inner = inner_with_target(DialogType::Uac);
        compute_route_set(&mut inner, &m).unwrap();
        assert_eq!(inner.rset.as_deref(), Some("<sip:p1@r1;lr>"));
    }
}
