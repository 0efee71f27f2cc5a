//! Side tables — the prefix and suffix Cartesian-product tables the
//! Expansion Planner's output splits the parts into.
//!
//! A side table is the Cartesian product of one contiguous run of parts,
//! collapsed to one `u32` packed Adler value per row — never a per-row
//! candidate list. Two tables are built, in the two directions the engine
//! actually needs:
//!
//! - [`build_forward`] grows a prefix-side run left to right from the
//!   Adler seed via [`forward_combine`](crate::adler::forward_combine).
//!   Row `r`'s digits (one candidate index per part, same order as the
//!   part slice) are `mixedradix::decode(r, counts)`.
//! - [`build_reverse`] grows a suffix-side run by peeling candidate bytes
//!   off each target's Adler value, one part at a time, via
//!   [`reverse_combine`](crate::adler::reverse_combine). Because
//!   reverse-combine can only undo the most recently appended bytes, this
//!   *must* process parts in right-to-left plaintext order — the
//!   resulting row digits are therefore in that same right-to-left order
//!   (`parts[0]` is the rightmost part of the run and is the *slowest*
//!   varying digit), the mirror image of the forward table's convention.
//!   `plan.suffix_parts` is built in that same right-to-left order (see
//!   `planner.rs`), so a decoded digit vector already lines up
//!   positionally with it — reconstruction zips the two directly,
//!   with no reversal needed.
//!
//! Each part's expansion fans out across the Thread Pool via
//! `ThreadPool::partition`: since the pool only accepts `'static` jobs
//! (it is a persistent pool, not a scoped one), every grain clones its
//! slice of the input and the candidate list into owned, `Arc`-shared
//! buffers rather than borrowing `hashes`/`part` directly, and writes its
//! piece of the output into a private `Vec` collected under a `Mutex`
//! rather than into disjoint regions of one shared buffer. This costs one
//! lock per grain, not per row, and avoids unsafe code for what is, after
//! the Expansion Planner has already bounded table sizes, the dominant
//! per-row cost in the engine.

use std::sync::{Arc, Mutex};

use crate::adler::{forward_combine, reverse_combine, HashPart};
use crate::intern::InternPool;
use crate::part::Part;
use crate::target::TargetTable;
use crate::threadpool::ThreadPool;

/// Grow a packed-Adler table forward across `parts` (left to right),
/// starting every row from `seed`.
pub fn build_forward(seed: u32, parts: &[&Part], pool: &ThreadPool) -> Vec<u32> {
    let mut hashes = vec![seed];
    for part in parts {
        hashes = forward_expand_part(&hashes, part, pool);
    }
    hashes
}

/// Grow a packed-Adler table backward from each target's Adler value,
/// across `parts_rightmost_first` (already in right-to-left plaintext
/// order). Returns one table per target, aligned with `targets`'
/// iteration order.
pub fn build_reverse(
    targets: &TargetTable,
    parts_rightmost_first: &[&Part],
    intern: &InternPool,
    pool: &ThreadPool,
) -> Vec<Vec<u32>> {
    targets
        .iter()
        .map(|target| {
            let mut hashes = vec![target.adler32];
            for part in parts_rightmost_first {
                hashes = reverse_expand_part(&hashes, part, intern, pool);
            }
            hashes
        })
        .collect()
}

/// Candidate counts, in the same order `build_forward`/`build_reverse`
/// consumed the part slice — the shape `mixedradix::decode` needs.
pub fn candidate_counts(parts: &[&Part]) -> Vec<usize> {
    parts.iter().map(|p| p.len()).collect()
}

/// Collect a `ThreadPool::partition` fan-out's per-grain outputs back
/// into one contiguous, row-ordered buffer.
fn collect_grains(results: Arc<Mutex<Vec<(usize, Vec<u32>)>>>) -> Vec<u32> {
    let mut chunks = Arc::try_unwrap(results)
        .expect("no grain job outlives ThreadPool::partition's wait")
        .into_inner()
        .unwrap();
    chunks.sort_by_key(|(start, _)| *start);
    chunks.into_iter().flat_map(|(_, grain)| grain).collect()
}

/// Append one part's candidates onto every row of `hashes` via
/// forward-combine, candidates as the inner, fast-varying dimension.
fn forward_expand_part(hashes: &[u32], part: &Part, pool: &ThreadPool) -> Vec<u32> {
    let candidates: Arc<Vec<HashPart>> =
        Arc::new(part.candidates().iter().map(|c| c.hash).collect());
    let hashes: Arc<Vec<u32>> = Arc::new(hashes.to_vec());
    let width = candidates.len();
    let results: Arc<Mutex<Vec<(usize, Vec<u32>)>>> = Arc::new(Mutex::new(Vec::new()));

    let candidates_job = Arc::clone(&candidates);
    let hashes_job = Arc::clone(&hashes);
    let results_job = Arc::clone(&results);
    pool.partition(hashes.len(), move |start, end| {
        let mut grain = Vec::with_capacity((end - start) * width);
        for &h in &hashes_job[start..end] {
            for &part_hash in candidates_job.iter() {
                grain.push(forward_combine(h, part_hash));
            }
        }
        results_job.lock().unwrap().push((start, grain));
    });

    collect_grains(results)
}

/// Peel one part's candidate bytes off every row of `hashes`, producing
/// `hashes.len() * candidates.len()` new rows (candidates as the inner,
/// fast-varying dimension, matching `build_reverse`'s convention).
pub fn reverse_expand_part(
    hashes: &[u32],
    part: &Part,
    intern: &InternPool,
    pool: &ThreadPool,
) -> Vec<u32> {
    let candidate_bytes: Arc<Vec<Vec<u8>>> = Arc::new(
        part.candidates()
            .iter()
            .map(|c| intern.get(c.id).to_vec())
            .collect(),
    );
    let hashes: Arc<Vec<u32>> = Arc::new(hashes.to_vec());
    let width = candidate_bytes.len();
    let results: Arc<Mutex<Vec<(usize, Vec<u32>)>>> = Arc::new(Mutex::new(Vec::new()));

    let candidate_bytes_job = Arc::clone(&candidate_bytes);
    let hashes_job = Arc::clone(&hashes);
    let results_job = Arc::clone(&results);
    pool.partition(hashes.len(), move |start, end| {
        let mut grain = Vec::with_capacity((end - start) * width);
        for &h in &hashes_job[start..end] {
            for bytes in candidate_bytes_job.iter() {
                grain.push(reverse_combine(h, bytes));
            }
        }
        results_job.lock().unwrap().push((start, grain));
    });

    collect_grains(results)
}
