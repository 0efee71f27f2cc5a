//! Crate-wide error taxonomy.
//!
//! Ingestion errors return immediately with no side effects. `Memory` is
//! fatal and aborts the run. `Cancelled` carries no payload: partial results
//! are returned alongside it by the caller, not inside the error.

use thiserror::Error;

/// Errors raised while candidates/targets are being ingested, before `run`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IngestError {
    /// A candidate string exceeded the 65535-byte Adler32 length limit.
    #[error("candidate length {len} exceeds the 65535-byte limit")]
    CandidateTooLong { len: usize },
    /// `add_string` was called before any `next_part`.
    #[error("add_string called with no open part")]
    NoOpenPart,
}

/// Errors raised by `run`: configuration problems, allocation failure,
/// cancellation, and debug-only internal invariant checks.
#[derive(Debug, Error)]
pub enum ColliderError {
    /// No parts were added before `run`.
    #[error("no parts configured")]
    NoParts,
    /// A part was opened (`next_part`) but never given a candidate.
    #[error("part {index} has no candidates")]
    EmptyPart { index: usize },
    /// No target (Adler32, SHA-256) pairs were added before `run`.
    #[error("no target hashes configured")]
    NoTargets,
    /// A part's candidate count, or a compiled table, exceeds the 2^32
    /// index cap.
    #[error("{what} size {size} exceeds the 2^32 index cap")]
    IndexOverflow { what: &'static str, size: u64 },
    /// The index builder could not allocate the 512 MiB filter or the
    /// suffix table storage.
    #[error("allocation failed while building {what}")]
    Memory { what: &'static str },
    /// The run was cancelled via the run flag; partial results are still
    /// returned by the caller.
    #[error("search cancelled")]
    Cancelled,
    /// A debug-only invariant check failed (bucket monotonicity, a
    /// non-permutation `Indices`, etc). Never raised in release builds.
    #[error("internal invariant violated: {0}")]
    InternalInvariant(&'static str),
}

pub type Result<T> = core::result::Result<T, ColliderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_stable_strings() {
        assert_eq!(
            IngestError::CandidateTooLong { len: 70000 }.to_string(),
            "candidate length 70000 exceeds the 65535-byte limit"
        );
        assert_eq!(ColliderError::NoParts.to_string(), "no parts configured");
        assert_eq!(
            ColliderError::EmptyPart { index: 3 }.to_string(),
            "part 3 has no candidates"
        );
    }
}
