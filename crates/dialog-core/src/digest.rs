//! 128-bit dialog identifiers.
//!
//! A dialog is keyed by the MD5 digest of its identity tuple: (local tag,
//! remote tag, Call-ID) once complete, (local tag, Call-ID) for a UAC
//! partial dialog. MD5 is retained for parity with deployments that
//! hash-identify dialogs externally; any deterministic 128-bit function
//! would do.

use std::fmt;

use md5::{Digest, Md5};

/// Digest identity of a dialog.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct DialogId([u8; 16]);

fn digest_of(parts: &[&[u8]]) -> [u8; 16] {
    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part);
    }
    hasher.finalize().into()
}

impl DialogId {
    /// Identity of a complete dialog.
    pub fn full(local_tag: &[u8], remote_tag: &[u8], call_id: &[u8]) -> DialogId {
        DialogId(digest_of(&[local_tag, remote_tag, call_id]))
    }

    /// Identity of a UAC partial dialog (no remote tag yet).
    pub fn partial(local_tag: &[u8], call_id: &[u8]) -> DialogId {
        DialogId(digest_of(&[local_tag, call_id]))
    }

    /// The zero id of a dialog that has not been published to any table.
    pub fn unset() -> DialogId {
        DialogId([0; 16])
    }

    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl fmt::Display for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl fmt::Debug for DialogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DialogId({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let a = DialogId::full(b"alice", b"bob", b"c1");
        let b = DialogId::full(b"alice", b"bob", b"c1");
        assert_eq!(a, b);
    }

    #[test]
    fn test_tuple_order_matters() {
        let a = DialogId::full(b"alice", b"bob", b"c1");
        let b = DialogId::full(b"bob", b"alice", b"c1");
        assert_ne!(a, b);
    }

    #[test]
    fn test_partial_differs_from_full() {
        // A missing part contributes nothing, but the partial form only
        // hashes two parts
        let partial = DialogId::partial(b"alice", b"c1");
        let full = DialogId::full(b"alice", b"", b"c1");
        assert_eq!(partial, full);
        assert_ne!(partial, DialogId::full(b"alice", b"bob", b"c1"));
    }
}
