//! # sipkit-dialog-core
//!
//! RFC 3261 dialog management over [`sipkit-sip-core`] messages.
//!
//! The entry point is the [`DialogRegistry`]: seed a partial dialog from
//! an outgoing INVITE or SUBSCRIBE, complete it with the answer (or a
//! matching NOTIFY), look up dialogs for incoming messages, and drive
//! mid-dialog state with [`DialogRegistry::process`] and
//! [`DialogRegistry::update_dialog`]. Dialogs are identified by 128-bit
//! digests over their (local tag, remote tag, Call-ID) tuples and held in
//! two sharded tables: one for UAC partial dialogs, one for early and
//! confirmed dialogs.
//!
//! Concurrency model: plain threads and blocking mutexes. State
//! transitions are serialized per dialog; callbacks run with no lock
//! held. A partial dialog self-destructs `64 * T1` after seeding unless
//! an answer completes it first.
//!
//! [`sipkit-sip-core`]: sipkit_sip_core

pub mod config;
pub mod dialog;
pub mod digest;
pub mod errors;
pub mod registry;
pub mod timer;
pub mod utils;

pub use config::{DialogConfig, SipConn, DEFAULT_TIMER_T1};
pub use dialog::{Dialog, DialogState, DialogType};
pub use digest::DialogId;
pub use errors::{DialogError, DialogResult};
pub use registry::{DialogCallback, DialogRegistry, StateCallback};
pub use utils::{generate_branchid, generate_tag};
