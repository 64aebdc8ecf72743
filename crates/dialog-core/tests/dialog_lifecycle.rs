//! Dialog lifecycle tests: seed → complete, routing, rejection, forking,
//! SUBSCRIBE/NOTIFY, mid-dialog processing and teardown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sipkit_dialog_core::{
    DialogCallback, DialogConfig, DialogError, DialogId, DialogRegistry, DialogState, DialogType,
    StateCallback,
};
use sipkit_sip_core::SipMsg;

fn msg(raw: &str) -> SipMsg {
    let m = SipMsg::new(raw.to_owned().into_bytes());
    m.init_headers().unwrap();
    m
}

fn invite() -> SipMsg {
    msg("INVITE sip:bob@biloxi.com SIP/2.0\r\n\
Via: SIP/2.0/UDP h1;branch=z9hG4bK776\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
Call-ID: c1\r\n\
CSeq: 42 INVITE\r\n\
Contact: <sip:alice@h1>\r\n\
\r\n")
}

fn ok_response(extra_headers: &str) -> SipMsg {
    msg(&format!(
        "SIP/2.0 200 OK\r\n\
Via: SIP/2.0/UDP h1;branch=z9hG4bK776\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
Call-ID: c1\r\n\
CSeq: 42 INVITE\r\n\
Contact: <sip:bob@h2>\r\n\
{extra_headers}\r\n"
    ))
}

type Transition = (DialogState, DialogState);

fn recording_registry() -> (Arc<DialogRegistry>, Arc<Mutex<Vec<Transition>>>) {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let transitions: Arc<Mutex<Vec<Transition>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = transitions.clone();
    let cb: StateCallback = Box::new(move |_dlg, _msg, prev, new| {
        sink.lock().unwrap().push((prev, new));
    });
    (
        DialogRegistry::new(DialogConfig::default(), Some(cb)),
        transitions,
    )
}

/// Scenario: UAC INVITE seeds a partial dialog, the 200 confirms it.
#[test]
fn seed_then_confirm_uac_invite() {
    let (registry, transitions) = recording_registry();
    let req = invite();
    let dialog = registry
        .seed_dialog(None, &req, None, false, DialogType::Uac)
        .unwrap();

    assert_eq!(dialog.state(), DialogState::New);
    assert!(dialog.is_incomplete());
    assert_eq!(dialog.id(), DialogId::partial(b"alice", b"c1"));
    assert_eq!(registry.partial_count(), 1);
    assert_eq!(registry.full_count(), 0);
    assert_eq!(dialog.local_cseq(), 42);

    let resp = ok_response("");
    let confirmed = registry.update_dialog(&dialog, &resp, None).unwrap();

    assert_eq!(confirmed.state(), DialogState::Confirmed);
    assert_eq!(confirmed.id(), DialogId::full(b"alice", b"bob", b"c1"));
    assert_eq!(registry.partial_count(), 0);
    assert_eq!(registry.full_count(), 1);
    // No Record-Route: request URI is the remote target, no Route header
    assert_eq!(confirmed.req_uri().unwrap(), "sip:bob@h2");
    assert!(confirmed.route_header().is_none());
    assert_eq!(confirmed.remote_tag().unwrap().as_ref(), b"bob");
    assert_eq!(confirmed.local_tag().unwrap().as_ref(), b"alice");

    assert_eq!(
        transitions.lock().unwrap().as_slice(),
        &[(DialogState::New, DialogState::Confirmed)]
    );
}

/// Scenario: loose routing. The UAC reverses the Record-Route set and
/// keeps the remote target in the request URI.
#[test]
fn loose_routing_route_set() {
    let (registry, _) = recording_registry();
    let dialog = registry
        .seed_dialog(None, &invite(), None, false, DialogType::Uac)
        .unwrap();
    let resp = ok_response("Record-Route: <sip:p1@r1;lr>, <sip:p2@r2;lr>\r\n");
    let confirmed = registry.update_dialog(&dialog, &resp, None).unwrap();

    assert_eq!(confirmed.rset_str().unwrap(), "<sip:p2@r2;lr>,<sip:p1@r1;lr>");
    assert_eq!(
        confirmed.route_header().unwrap().raw().as_ref(),
        b"Route: <sip:p2@r2;lr>,<sip:p1@r1;lr>,<sip:bob@h2>\r\n"
    );
    assert_eq!(confirmed.req_uri().unwrap(), "sip:bob@h2");
}

/// Scenario: strict routing. The first hop becomes the request URI and
/// leaves the Route header; the remote target is appended last.
#[test]
fn strict_routing_route_set() {
    let (registry, _) = recording_registry();
    let dialog = registry
        .seed_dialog(None, &invite(), None, false, DialogType::Uac)
        .unwrap();
    let resp = ok_response("Record-Route: <sip:p1@r1>, <sip:p2@r2>\r\n");
    let confirmed = registry.update_dialog(&dialog, &resp, None).unwrap();

    assert_eq!(confirmed.req_uri().unwrap(), "sip:p2@r2");
    assert_eq!(
        confirmed.route_header().unwrap().raw().as_ref(),
        b"Route: <sip:p1@r1>,<sip:bob@h2>\r\n"
    );
}

/// Scenario: a 404 destroys the partial dialog and reports the
/// transition.
#[test]
fn rejected_response_destroys_partial() {
    let (registry, transitions) = recording_registry();
    let completions = Arc::new(AtomicUsize::new(0));
    let count = completions.clone();
    let completion: DialogCallback = Arc::new(move |_dlg, msg| {
        assert!(msg.is_some());
        count.fetch_add(1, Ordering::SeqCst);
    });

    let dialog = registry
        .seed_dialog(None, &invite(), Some(completion.clone()), false, DialogType::Uac)
        .unwrap();
    let resp = msg("SIP/2.0 404 Not Found\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
Call-ID: c1\r\n\
CSeq: 42 INVITE\r\n\
\r\n");

    let err = registry
        .update_dialog(&dialog, &resp, Some(&completion))
        .unwrap_err();
    assert!(matches!(err, DialogError::Rejected(404)));
    assert_eq!(dialog.state(), DialogState::Destroyed);
    assert_eq!(registry.partial_count(), 0);
    assert_eq!(registry.full_count(), 0);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
    assert_eq!(
        transitions.lock().unwrap().as_slice(),
        &[(DialogState::New, DialogState::Destroyed)]
    );
}

fn subscribe() -> SipMsg {
    msg("SUBSCRIBE sip:bob@biloxi.com SIP/2.0\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>\r\n\
Call-ID: s1\r\n\
CSeq: 7 SUBSCRIBE\r\n\
Contact: <sip:alice@h1>\r\n\
Event: presence;id=42\r\n\
\r\n")
}

fn notify(substate: &str, event: &str) -> SipMsg {
    msg(&format!(
        "NOTIFY sip:alice@h1 SIP/2.0\r\n\
From: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
To: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
Call-ID: s1\r\n\
CSeq: 1 NOTIFY\r\n\
Contact: <sip:bob@h2>\r\n\
Event: {event}\r\n\
Subscription-State: {substate}\r\n\
\r\n"
    ))
}

/// Scenario: SUBSCRIBE stays partial through its 202; the matching NOTIFY
/// confirms it; a terminating NOTIFY is refused.
#[test]
fn subscribe_notify_completion() {
    let (registry, _) = recording_registry();
    let dialog = registry
        .seed_dialog(None, &subscribe(), None, false, DialogType::Uac)
        .unwrap();
    assert_eq!(registry.partial_count(), 1);

    // 202 Accepted does not complete a subscription dialog
    let accepted = msg("SIP/2.0 202 Accepted\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
Call-ID: s1\r\n\
CSeq: 7 SUBSCRIBE\r\n\
\r\n");
    let still = registry.update_dialog(&dialog, &accepted, None).unwrap();
    assert_eq!(still.state(), DialogState::New);
    assert_eq!(registry.partial_count(), 1);

    // A NOTIFY with an active subscription confirms
    let confirmed = registry
        .update_dialog(&dialog, &notify("active", "presence;id=42"), None)
        .unwrap();
    assert_eq!(confirmed.state(), DialogState::Confirmed);
    assert_eq!(confirmed.remote_tag().unwrap().as_ref(), b"bob");
    assert_eq!(registry.full_count(), 1);
}

#[test]
fn notify_validation_failures() {
    let (registry, _) = recording_registry();

    // Terminated subscription state is refused
    let dialog = registry
        .seed_dialog(None, &subscribe(), None, false, DialogType::Uac)
        .unwrap();
    let err = registry
        .complete_dialog(&notify("terminated", "presence;id=42"), &dialog, None)
        .unwrap_err();
    assert!(matches!(err, DialogError::ValidationFailed(_)));
    assert_eq!(dialog.state(), DialogState::New);

    // Event name mismatch is refused
    let err = registry
        .complete_dialog(&notify("active", "dialog;id=42"), &dialog, None)
        .unwrap_err();
    assert!(matches!(err, DialogError::ValidationFailed(_)));

    // Event id mismatch is refused
    let err = registry
        .complete_dialog(&notify("active", "presence;id=43"), &dialog, None)
        .unwrap_err();
    assert!(matches!(err, DialogError::ValidationFailed(_)));

    // Matching id completes
    registry
        .complete_dialog(&notify("active", "presence;id=42"), &dialog, None)
        .unwrap();
    assert_eq!(dialog.state(), DialogState::Confirmed);
}

/// Scenario: forking. Each 2xx answer completes a fresh copy; the seed
/// stays partial for further forks.
#[test]
fn forking_produces_one_dialog_per_answer() {
    let (registry, _) = recording_registry();
    let seed = registry
        .seed_dialog(None, &invite(), None, true, DialogType::Uac)
        .unwrap();

    let fork1 = ok_response("");
    let resp2 = msg("SIP/2.0 200 OK\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>;tag=bob2\r\n\
Call-ID: c1\r\n\
CSeq: 42 INVITE\r\n\
Contact: <sip:bob@h3>\r\n\
\r\n");

    let d1 = registry.update_dialog(&seed, &fork1, None).unwrap();
    let d2 = registry.update_dialog(&seed, &resp2, None).unwrap();

    assert!(!Arc::ptr_eq(&seed, &d1));
    assert!(!Arc::ptr_eq(&seed, &d2));
    assert!(!Arc::ptr_eq(&d1, &d2));
    assert_eq!(seed.state(), DialogState::New);
    assert_eq!(d1.state(), DialogState::Confirmed);
    assert_eq!(d2.state(), DialogState::Confirmed);
    assert_eq!(d1.id(), DialogId::full(b"alice", b"bob", b"c1"));
    assert_eq!(d2.id(), DialogId::full(b"alice", b"bob2", b"c1"));
    assert_eq!(d2.remote_target_uri().unwrap().as_ref(), b"sip:bob@h3");
    // Seed remains published for further forks
    assert_eq!(registry.partial_count(), 1);
    assert_eq!(registry.full_count(), 2);
}

/// The partial-dialog timer destroys an unanswered seed and reports
/// completion with no message.
#[test]
fn partial_dialog_self_destructs() {
    let config = DialogConfig { timer_t1: Duration::from_millis(2) };
    let completions = Arc::new(AtomicUsize::new(0));
    let count = completions.clone();
    let completion: DialogCallback = Arc::new(move |dlg, msg| {
        assert!(msg.is_none());
        assert_eq!(dlg.state(), DialogState::Destroyed);
        count.fetch_add(1, Ordering::SeqCst);
    });

    let registry = DialogRegistry::new(config, None);
    let dialog = registry
        .seed_dialog(None, &invite(), Some(completion), false, DialogType::Uac)
        .unwrap();
    assert_eq!(registry.partial_count(), 1);

    // 64 * 2ms = 128ms; give the timer thread room
    std::thread::sleep(Duration::from_millis(500));
    assert_eq!(dialog.state(), DialogState::Destroyed);
    assert_eq!(registry.partial_count(), 0);
    assert_eq!(completions.load(Ordering::SeqCst), 1);
}

/// A connection-supplied T1 overrides the registry default.
#[test]
fn connection_t1_overrides_config() {
    struct FastConn;
    impl sipkit_dialog_core::SipConn for FastConn {
        fn timer_t1(&self) -> Option<Duration> {
            Some(Duration::from_millis(1))
        }
    }

    let registry = DialogRegistry::new(DialogConfig::default(), None);
    let dialog = registry
        .seed_dialog(Some(&FastConn), &invite(), None, false, DialogType::Uac)
        .unwrap();
    // 64 * 1ms instead of 64 * 500ms
    std::thread::sleep(Duration::from_millis(400));
    assert_eq!(dialog.state(), DialogState::Destroyed);
}

/// Incoming mid-dialog messages find their dialog through the tables.
#[test]
fn find_matches_mid_dialog_requests() {
    let (registry, _) = recording_registry();
    let dialog = registry
        .seed_dialog(None, &invite(), None, false, DialogType::Uac)
        .unwrap();

    // Before completion the partial digest matches responses
    let early = msg("SIP/2.0 180 Ringing\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
Call-ID: c1\r\n\
CSeq: 42 INVITE\r\n\
\r\n");
    let found = registry.find(&early).unwrap();
    assert!(Arc::ptr_eq(&found, &dialog));

    registry.update_dialog(&dialog, &ok_response(""), None).unwrap();

    // Incoming request: the To names the local party
    let bye = msg("BYE sip:alice@h1 SIP/2.0\r\n\
From: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
To: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
Call-ID: c1\r\n\
CSeq: 2 BYE\r\n\
\r\n");
    let found = registry.find(&bye).unwrap();
    assert!(Arc::ptr_eq(&found, &dialog));

    // A different remote tag does not match
    let other = msg("BYE sip:alice@h1 SIP/2.0\r\n\
From: Bob <sip:bob@biloxi.com>;tag=mallory\r\n\
To: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
Call-ID: c1\r\n\
CSeq: 2 BYE\r\n\
\r\n");
    assert!(registry.find(&other).is_none());
}

/// Scenario: a mid-dialog CSeq decrease is rejected and leaves the dialog
/// untouched.
#[test]
fn cseq_decrease_is_rejected() {
    let (registry, _) = recording_registry();
    let dialog = registry
        .seed_dialog(None, &invite(), None, false, DialogType::Uac)
        .unwrap();
    registry.update_dialog(&dialog, &ok_response(""), None).unwrap();

    let bye = |cseq: u32| {
        msg(&format!(
            "BYE sip:alice@h1 SIP/2.0\r\n\
From: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
To: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
Call-ID: c1\r\n\
CSeq: {cseq} BYE\r\n\
\r\n"
        ))
    };

    registry.process(&bye(10), &dialog).unwrap();
    assert_eq!(dialog.remote_cseq(), 10);

    let err = registry.process(&bye(9), &dialog).unwrap_err();
    assert!(matches!(err, DialogError::Protocol(_)));
    assert_eq!(dialog.remote_cseq(), 10);
}

/// Terminate then delete: state monotonicity and table removal.
#[test]
fn terminate_and_delete() {
    let (registry, transitions) = recording_registry();
    let dialog = registry
        .seed_dialog(None, &invite(), None, false, DialogType::Uac)
        .unwrap();
    let confirmed = registry.update_dialog(&dialog, &ok_response(""), None).unwrap();

    // Deleting a live dialog is refused
    assert!(!registry.delete(&confirmed));

    registry.terminate(&confirmed, None);
    assert_eq!(confirmed.state(), DialogState::Destroyed);
    // Destroyed dialogs are invisible to lookup
    let bye = msg("BYE sip:alice@h1 SIP/2.0\r\n\
From: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
To: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
Call-ID: c1\r\n\
CSeq: 2 BYE\r\n\
\r\n");
    assert!(registry.find(&bye).is_none());

    // Once destroyed, further updates leave the state alone
    let after = registry.update_dialog(&confirmed, &ok_response(""), None).unwrap();
    assert_eq!(after.state(), DialogState::Destroyed);

    assert!(registry.delete(&confirmed));
    assert_eq!(registry.full_count(), 0);
    assert_eq!(
        transitions.lock().unwrap().last().unwrap(),
        &(DialogState::Confirmed, DialogState::Destroyed)
    );
}

/// UAS-side direct creation from a request/response pair.
#[test]
fn uas_dialog_create() {
    let (registry, _) = recording_registry();
    let req = invite();
    let resp = ok_response("");
    let dialog = registry
        .dialog_create(&resp, Some(&req), DialogType::Uas)
        .unwrap();

    assert_eq!(dialog.state(), DialogState::Confirmed);
    // UAS: local identity is the To (tag=bob), remote is the From
    assert_eq!(dialog.local_tag().unwrap().as_ref(), b"bob");
    assert_eq!(dialog.remote_tag().unwrap().as_ref(), b"alice");
    // Remote target comes from the request's Contact
    assert_eq!(dialog.remote_target_uri().unwrap().as_ref(), b"sip:alice@h1");
    assert_eq!(dialog.id(), DialogId::full(b"bob", b"alice", b"c1"));

    // An in-dialog request from the peer finds it: local=To(bob)
    let ack = msg("ACK sip:bob@h2 SIP/2.0\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
Call-ID: c1\r\n\
CSeq: 42 ACK\r\n\
\r\n");
    let found = registry.find(&ack).unwrap();
    assert!(Arc::ptr_eq(&found, &dialog));
}

/// Registries are isolated; one's dialogs are invisible to another.
#[test]
fn registries_are_independent() {
    let (a, _) = recording_registry();
    let (b, _) = recording_registry();
    let dialog = a
        .seed_dialog(None, &invite(), None, false, DialogType::Uac)
        .unwrap();
    a.update_dialog(&dialog, &ok_response(""), None).unwrap();

    let bye = msg("BYE sip:alice@h1 SIP/2.0\r\n\
From: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
To: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
Call-ID: c1\r\n\
CSeq: 2 BYE\r\n\
\r\n");
    assert!(a.find(&bye).is_some());
    assert!(b.find(&bye).is_none());
}

/// An early dialog confirms when the 2xx arrives, taking the 2xx's
/// Record-Route set.
#[test]
fn early_dialog_confirms_on_2xx() {
    let (registry, transitions) = recording_registry();
    let dialog = registry
        .seed_dialog(None, &invite(), None, false, DialogType::Uac)
        .unwrap();

    let ringing = msg("SIP/2.0 180 Ringing\r\n\
From: Alice <sip:alice@atlanta.com>;tag=alice\r\n\
To: Bob <sip:bob@biloxi.com>;tag=bob\r\n\
Call-ID: c1\r\n\
CSeq: 42 INVITE\r\n\
Contact: <sip:bob@h2>\r\n\
\r\n");
    let early = registry.update_dialog(&dialog, &ringing, None).unwrap();
    assert_eq!(early.state(), DialogState::Early);
    assert_eq!(registry.full_count(), 1);

    let resp = ok_response("Record-Route: <sip:p1@r1;lr>\r\n");
    let confirmed = registry.update_dialog(&early, &resp, None).unwrap();
    assert_eq!(confirmed.state(), DialogState::Confirmed);
    // The 2xx's Record-Route takes precedence
    assert_eq!(confirmed.rset_str().unwrap(), "<sip:p1@r1;lr>");
    assert_eq!(
        transitions.lock().unwrap().as_slice(),
        &[
            (DialogState::New, DialogState::Early),
            (DialogState::Early, DialogState::Confirmed)
        ]
    );
}
