//! End-to-end message tests: carving, lazy parsing, the length invariant,
//! tombstone mutation, and the boundary behaviors of the header grammars.

use sipkit_sip_core::{Error, HeaderState, Method, SipMsg, ValueState};

fn msg(raw: &'static [u8]) -> SipMsg {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let m = SipMsg::new(raw);
    m.init_headers().unwrap();
    m
}

const INVITE: &[u8] = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP pc33.atlanta.com;branch=z9hG4bK776asdhds\r\n\
Max-Forwards: 70\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
From: Alice <sip:alice@atlanta.com>;tag=1928301774\r\n\
Call-ID: a84b4c76e66710@pc33.atlanta.com\r\n\
CSeq: 314159 INVITE\r\n\
Contact: <sip:alice@pc33.atlanta.com>\r\n\
Content-Type: application/sdp\r\n\
Content-Length: 8\r\n\
\r\n\
v=0\r\no=a\r\n";

/// Invariant: message length equals start line + live headers + body.
#[test]
fn message_length_tracks_live_records() {
    let m = msg(INVITE);
    assert_eq!(m.msg_len(), INVITE.len());

    let live_bytes = |m: &SipMsg| -> usize {
        let headers: usize = m.headers().iter().map(|h| h.len()).sum();
        // start line + blank-line-free body
        let start = b"INVITE sip:bob@biloxi.com SIP/2.0\r\n".len();
        headers + start + b"v=0\r\no=a\r\n".len()
    };
    assert_eq!(m.msg_len(), live_bytes(&m));

    let mf = m.header(b"Max-Forwards").unwrap();
    m.delete_header(&mf).unwrap();
    assert_eq!(m.msg_len(), live_bytes(&m));

    m.add_header("Expires", "3600").unwrap();
    assert_eq!(m.msg_len(), live_bytes(&m));
}

/// Invariant: every parsed slice points into the owning buffer.
#[test]
fn parsed_slices_are_windows_into_the_message() {
    let m = msg(INVITE);
    let from = m.header(b"From").unwrap();
    let addr = from.value().unwrap().as_addr().unwrap().clone();

    let record: &[u8] = from.raw();
    let uri: &[u8] = &addr.uri;
    let rec_range = record.as_ptr() as usize..record.as_ptr() as usize + record.len();
    assert!(rec_range.contains(&(uri.as_ptr() as usize)));
    assert!(rec_range.contains(&(uri.as_ptr() as usize + uri.len() - 1)));
}

/// Parsing twice returns the identical tree (pointer identity).
#[test]
fn parse_is_idempotent() {
    let m = msg(INVITE);
    let via = m.header(b"Via").unwrap();
    let a = via.parsed().unwrap() as *const _;
    let b = via.parsed().unwrap() as *const _;
    assert_eq!(a, b);
}

/// Tombstoned headers keep their parsed values alive.
#[test]
fn deleted_header_values_stay_valid() {
    let m = msg(INVITE);
    let via = m.header(b"Via").unwrap();
    let host = via.value().unwrap().as_via().unwrap().sent_by_host.clone();
    m.delete_header(&via).unwrap();
    assert_eq!(host.as_ref(), b"pc33.atlanta.com");
    assert!(m.header(b"Via").is_none());
    assert_eq!(via.state(), HeaderState::Deleted);
}

/// copy_header followed by parsing yields a structurally identical tree.
#[test]
fn copied_header_parses_identically() {
    let src = msg(INVITE);
    let dst = msg(b"SIP/2.0 200 OK\r\nCSeq: 314159 INVITE\r\n\r\n");
    let from = src.header(b"From").unwrap();
    let copied = dst.copy_header(&from, None).unwrap();

    let orig = from.value().unwrap().as_addr().unwrap();
    let copy = copied.value().unwrap().as_addr().unwrap();
    assert_eq!(orig.uri, copy.uri);
    assert_eq!(
        orig.display.as_deref(),
        copy.display.as_deref()
    );
    assert_eq!(
        from.value().unwrap().param(b"tag").unwrap(),
        copied.value().unwrap().param(b"tag").unwrap()
    );
}

/// Scenario: add_branchid_to_via rewrites the Via and publishes the branch.
#[test]
fn add_branchid_scenario() {
    let m = msg(b"INVITE sip:b@h SIP/2.0\r\nVia: SIP/2.0/UDP h1\r\nCall-ID: c\r\n\r\n");
    m.add_branchid_to_via("z9hG4bK-xyz").unwrap();

    let wire = m.to_wire().unwrap();
    let text = std::str::from_utf8(&wire).unwrap();
    assert!(text.contains("Via: SIP/2.0/UDP h1 ; branch=z9hG4bK-xyz\r\n"), "{text}");
    assert_eq!(m.branchid().unwrap().unwrap().as_ref(), b"z9hG4bK-xyz");

    assert_eq!(m.add_branchid_to_via("z9hG4bK-2").err(), Some(Error::InvalidArgument));
}

/// Empty headers: allowed kinds parse empty, others are protocol errors.
#[test]
fn empty_header_boundaries() {
    let m = msg(b"INVITE sip:b@h SIP/2.0\r\n\
Subject:\r\n\
Supported:\r\n\
Expires:\r\n\
\r\n");
    let subject = m.header(b"Subject").unwrap();
    assert!(subject.parsed().unwrap().is_empty());
    let supported = m.header(b"k").unwrap();
    assert!(supported.parsed().unwrap().is_empty());
    let expires = m.header(b"Expires").unwrap();
    assert!(matches!(expires.parsed().err(), Some(Error::BadProtocol(_))));
}

/// Via with a bracketed IPv6 sent-by host.
#[test]
fn via_ipv6_boundary() {
    let m = msg(b"INVITE sip:b@h SIP/2.0\r\nVia: SIP/2.0/UDP [::1]:5060\r\n\r\n");
    assert_eq!(m.via_sent_by_host().unwrap().as_ref(), b"[::1]");
    assert_eq!(m.via_sent_by_port().unwrap(), Some(5060));
}

/// One malformed value does not take down its neighbors.
#[test]
fn single_bad_value_tolerance() {
    let m = msg(b"INVITE sip:b@h SIP/2.0\r\n\
Contact: <sip:ok@h1>, garbage<, <sip:ok2@h2>\r\n\
\r\n");
    let contact = m.header(b"Contact").unwrap();
    let states: Vec<ValueState> = contact
        .values()
        .unwrap()
        .map(|v| v.state())
        .collect();
    assert_eq!(states, vec![ValueState::Ok, ValueState::Bad, ValueState::Ok]);
}

/// Unknown headers are carried and reserialized but expose no values.
#[test]
fn unknown_header_passthrough() {
    let m = msg(b"INVITE sip:b@h SIP/2.0\r\nX-Custom-Thing: opaque stuff\r\nCall-ID: c\r\n\r\n");
    let h = m.header(b"X-Custom-Thing").unwrap();
    assert!(h.value().is_err());
    let wire = m.to_wire().unwrap();
    assert!(std::str::from_utf8(&wire).unwrap().contains("X-Custom-Thing: opaque stuff\r\n"));
}

#[test]
fn request_and_response_classification() {
    let req = msg(INVITE);
    assert!(req.is_request().unwrap());
    assert_eq!(req.request_method().unwrap(), Method::Invite);

    let resp = msg(b"SIP/2.0 404 Not Found\r\nCSeq: 1 INVITE\r\n\r\n");
    assert!(resp.is_response().unwrap());
    assert_eq!(resp.response_code().unwrap(), 404);
}

/// Compact-form message parses like its long-form twin.
#[test]
fn compact_form_message() {
    let m = msg(b"INVITE sip:bob@biloxi.com SIP/2.0\r\n\
v: SIP/2.0/UDP h1;branch=z9\r\n\
f: <sip:a@h>;tag=t1\r\n\
t: <sip:b@h>\r\n\
i: c99\r\n\
l: 0\r\n\
\r\n");
    assert_eq!(m.from_tag().unwrap().unwrap().as_ref(), b"t1");
    assert_eq!(m.callid().unwrap().as_ref(), b"c99");
    assert_eq!(m.content_length().unwrap(), 0);
    assert_eq!(m.branchid().unwrap().unwrap().as_ref(), b"z9");
}
