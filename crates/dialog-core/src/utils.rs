//! Tag and branch generation helpers.

use md5::{Digest, Md5};

/// Generates an opaque dialog tag for From/To headers.
pub fn generate_tag() -> String {
    format!("{:08x}{:08x}", rand::random::<u32>(), rand::random::<u32>())
}

/// Generates an RFC 3261 branch parameter: the `z9hG4bK` magic cookie
/// followed by a digest over fresh random material.
pub fn generate_branchid() -> String {
    let seed: [u8; 16] = rand::random();
    let digest = Md5::digest(seed);
    let mut branch = String::with_capacity(7 + 32);
    branch.push_str("z9hG4bK");
    for byte in digest {
        branch.push_str(&format!("{:02x}", byte));
    }
    branch
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_branchid_has_magic_cookie() {
        let b = generate_branchid();
        assert!(b.starts_with("z9hG4bK"));
        assert_eq!(b.len(), 7 + 32);
    }

    #[test]
    fn test_tags_are_distinct() {
        assert_ne!(generate_tag(), generate_tag());
    }
}
