use sha2::{Digest, Sha256};

/// Compute the SHA-256 digest of `bytes`.
pub fn sha256(bytes: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest[..]);
    out
}

/// SHA-256 of `bytes`, rendered as 64 lowercase hex chars.
pub fn sha256_hex(bytes: &[u8]) -> String {
    to_hex(&sha256(bytes))
}

/// Lowercase hex encoding of a digest (64 chars).
pub fn to_hex(digest: &[u8; 32]) -> String {
    hex::encode(digest)
}

/// Binary encoding of a digest: one '0'/'1' char per bit, 256 chars,
/// leading zeros preserved. Used for the difficulty check on block hashes.
pub fn to_binary(digest: &[u8; 32]) -> String {
    let mut bits = String::with_capacity(256);
    for byte in digest {
        for i in (0..8).rev() {
            bits.push(if byte >> i & 1 == 1 { '1' } else { '0' });
        }
    }
    bits
}
