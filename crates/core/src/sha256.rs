//! SHA-256 Primitive — the final exact verification step.
//!
//! Unlike Adler-32, SHA-256 has no cheap incremental-combine algebra worth
//! exploiting here: every part boundary changes the internal block
//! schedule, so candidates are only ever hashed once, in full, as the
//! final verification step after the Adler-32 filter narrows a Cartesian
//! slot down to a single candidate combination.

/// A 32-byte SHA-256 digest.
pub type Digest = [u8; 32];

/// Hash the full concatenation of a candidate combination in one pass.
///
/// `parts` is the ordered list of byte slices chosen for each part; they
/// are fed to the hasher in order without an intermediate allocation.
pub fn hash_parts<I, B>(parts: I) -> Digest
where
    I: IntoIterator<Item = B>,
    B: AsRef<[u8]>,
{
    use sha2::{Digest as _, Sha256};

    let mut hasher = Sha256::new();
    for part in parts {
        hasher.update(part.as_ref());
    }
    hasher.finalize().into()
}

/// Hash a single contiguous byte string.
pub fn hash(data: &[u8]) -> Digest {
    use sha2::{Digest as _, Sha256};
    Sha256::digest(data).into()
}
