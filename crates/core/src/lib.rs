//! `collider-core`: the Adler-32/SHA-256 Cartesian-product collision
//! search engine.
//!
//! This crate is the pure algorithmic core — every named component (the
//! Adler-32 Roller, the SHA-256 Primitive, the Thread Pool, the
//! Index/Filter Builder, the Expansion Planner, and the Collider that
//! drives them) lives here with no knowledge of process lifetime, signal
//! handling, or host-language bindings. The `collider` crate layers a
//! handle-based external API over [`Collider`] for host applications.

pub mod adler;
pub mod control;
pub mod error;
pub mod index;
pub mod intern;
pub mod mixedradix;
pub mod part;
pub mod planner;
pub mod sha256;
pub mod table;
pub mod target;
pub mod threadpool;

mod collider;

pub use collider::{Collider, DEFAULT_SIDE_BUDGET_BYTES};
pub use control::{ProgressStats, RunControl};
pub use error::{ColliderError, IngestError, Result};
