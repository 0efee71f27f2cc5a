//! Target table.
//!
//! A target is the `(Adler32, SHA-256)` pair a reconstructed plaintext
//! must match. Targets are kept in caller insertion order; compiling the
//! suffix index groups them by Adler32 value internally, but that
//! grouping is a property of the compiled index, not of this table.

use crate::sha256::Digest;

/// One target hash pair supplied via `add_hash`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Target {
    pub adler32: u32,
    pub sha256: Digest,
}

/// The ordered set of targets a run searches against.
#[derive(Debug, Default, Clone)]
pub struct TargetTable {
    targets: Vec<Target>,
}

impl TargetTable {
    pub fn new() -> Self {
        TargetTable { targets: Vec::new() }
    }

    pub fn push(&mut self, target: Target) {
        self.targets.push(target);
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    pub fn as_slice(&self) -> &[Target] {
        &self.targets
    }
}
