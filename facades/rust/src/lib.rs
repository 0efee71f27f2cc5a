//! `collider`: a safe, handle-based facade over [`collider_core::Collider`].
//!
//! One [`Engine`] coordinates a single search; `stop`/`pause`/`resume` act
//! on a shared control handle so a host application can wire them to a
//! signal handler or a UI button without touching the run loop itself.
//! There is no explicit `destroy` — an `Engine` going out of scope runs
//! `Collider`'s `Drop`, which joins the thread pool.
//!
//! Loading parts and target hashes from files, and parsing CLI arguments,
//! both stay the host's responsibility; this crate only exposes the
//! in-process handle.

use thiserror::Error;

pub use collider_core::ProgressStats;

/// One `(Adler32, SHA-256)` digest pair, as produced by
/// [`collider_core::sha256::hash`] over a plaintext candidate.
pub type Sha256Digest = collider_core::sha256::Digest;

/// Stable error codes for [`EngineError`], flattening both
/// `collider_core::IngestError` (raised before `run`) and
/// `collider_core::ColliderError` (raised by `run`) into one enum a host
/// can match on without depending on the core crate's error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorCode {
    /// A candidate string exceeded the 65535-byte Adler32 length limit.
    CandidateTooLong,
    /// `add_string` was called before any `next_part`.
    NoOpenPart,
    /// `run` was called with no parts configured.
    NoParts,
    /// A part was opened but never given a candidate.
    EmptyPart,
    /// `run` was called with no target hashes configured.
    NoTargets,
    /// A part's candidate count, or a compiled table, exceeded the 2^32
    /// index cap.
    IndexOverflow,
    /// The index builder could not allocate the filter or suffix storage.
    Memory,
    /// The run was cancelled via `stop` before it finished.
    Cancelled,
    /// A debug-only internal invariant failed.
    InternalInvariant,
}

#[derive(Debug, Error)]
#[error("{code:?}: {message}")]
pub struct EngineError {
    pub code: EngineErrorCode,
    pub message: String,
}

pub type Result<T> = std::result::Result<T, EngineError>;

impl From<collider_core::IngestError> for EngineError {
    fn from(err: collider_core::IngestError) -> Self {
        let code = match err {
            collider_core::IngestError::CandidateTooLong { .. } => {
                EngineErrorCode::CandidateTooLong
            }
            collider_core::IngestError::NoOpenPart => EngineErrorCode::NoOpenPart,
        };
        EngineError { code, message: err.to_string() }
    }
}

impl From<collider_core::ColliderError> for EngineError {
    fn from(err: collider_core::ColliderError) -> Self {
        let code = match err {
            collider_core::ColliderError::NoParts => EngineErrorCode::NoParts,
            collider_core::ColliderError::EmptyPart { .. } => EngineErrorCode::EmptyPart,
            collider_core::ColliderError::NoTargets => EngineErrorCode::NoTargets,
            collider_core::ColliderError::IndexOverflow { .. } => EngineErrorCode::IndexOverflow,
            collider_core::ColliderError::Memory { .. } => EngineErrorCode::Memory,
            collider_core::ColliderError::Cancelled => EngineErrorCode::Cancelled,
            collider_core::ColliderError::InternalInvariant(_) => {
                EngineErrorCode::InternalInvariant
            }
        };
        EngineError { code, message: err.to_string() }
    }
}

/// Construction options for [`Engine::new`].
#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Thread Pool worker count; clamped to at least 1.
    pub worker_threads: usize,
    /// Per-side raw-table memory budget override, in bytes. `None` keeps
    /// `collider_core::DEFAULT_SIDE_BUDGET_BYTES` on both sides.
    pub prefix_budget_bytes: Option<u64>,
    pub suffix_budget_bytes: Option<u64>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        EngineOptions {
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            prefix_budget_bytes: None,
            suffix_budget_bytes: None,
        }
    }
}

/// Coordinates one active search; create separate instances for
/// concurrent searches to avoid cross-talk on `stop`/`pause`.
pub struct Engine {
    collider: collider_core::Collider,
    control: collider_core::RunControl,
}

impl Engine {
    pub fn new(opts: EngineOptions) -> Self {
        let mut collider = collider_core::Collider::new(opts.worker_threads);
        if opts.prefix_budget_bytes.is_some() || opts.suffix_budget_bytes.is_some() {
            collider.set_budgets(
                opts.prefix_budget_bytes.unwrap_or(collider_core::DEFAULT_SIDE_BUDGET_BYTES),
                opts.suffix_budget_bytes.unwrap_or(collider_core::DEFAULT_SIDE_BUDGET_BYTES),
            );
        }
        Engine { collider, control: collider_core::RunControl::new() }
    }

    /// Open a new part and make it the current one; returns its index.
    pub fn next_part(&mut self) -> usize {
        self.collider.next_part()
    }

    /// Add a candidate string to the most recently opened part.
    pub fn add_string(&mut self, data: impl AsRef<[u8]>) -> Result<()> {
        self.collider.add_string(data.as_ref()).map_err(EngineError::from)
    }

    /// Add one `(Adler32, SHA-256)` target pair.
    pub fn add_hash(&mut self, adler32: u32, sha256: Sha256Digest) {
        self.collider.add_hash(adler32, sha256);
    }

    /// Add a target from a plaintext string directly, hashing it with
    /// both primitives. A convenience for hosts that already hold the
    /// plaintext rather than precomputed digests.
    pub fn add_target_plaintext(&mut self, data: impl AsRef<[u8]>) {
        let data = data.as_ref();
        self.add_hash(collider_core::adler::adler32(data), collider_core::sha256::hash(data));
    }

    /// Run the search to completion, or until [`Engine::stop`] is called.
    /// Safe to call once per `Engine`.
    pub fn run(&mut self, on_progress: Option<&mut dyn FnMut(ProgressStats)>) -> Result<()> {
        self.collider.run(&self.control, on_progress).map_err(EngineError::from)
    }

    /// Every plaintext reconstructed and SHA-256-verified so far.
    pub fn results(&self) -> &[Vec<u8>] {
        self.collider.results()
    }

    /// Request that the run stop as soon as it next checks in. Already
    /// reconstructed matches are kept.
    pub fn stop(&self) {
        tracing::info!("stop requested");
        self.control.request_stop();
    }

    pub fn pause(&self) {
        self.control.request_pause();
    }

    pub fn resume(&self) {
        self.control.resume();
    }
}
