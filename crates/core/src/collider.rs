//! Collider — the orchestrator that ties every other component together:
//! ingests parts and targets, asks the Expansion Planner how to split the
//! parts, builds the prefix table and the compiled suffix index, and then
//! drives the outer loop over whatever parts the planner left as
//! residual, probing the compiled index once per `(residual combination,
//! prefix row)` pair and verifying every Adler-32 hit with a full SHA-256
//! before accepting it as a match.
//!
//! The outer loop over residual parts is a flat mixed-radix counter
//! (`mixedradix::decode`) rather than literal recursion, since the
//! residual part count is small and bounded by construction (the planner
//! only leaves parts residual when neither table has budget left) and an
//! iterative counter is the more idiomatic shape in Rust for a depth
//! that isn't known at compile time.

use std::collections::HashSet;

use crate::adler::{forward_combine, hash_part, SEED};
use crate::control::{ProgressStats, RunControl, TeraHashCounter};
use crate::error::{ColliderError, IngestError};
use crate::index::{CompiledIndex, IndexedRow};
use crate::intern::InternPool;
use crate::mixedradix;
use crate::part::Part;
use crate::planner::{self, Plan};
use crate::sha256;
use crate::table;
use crate::target::{Target, TargetTable};
use crate::threadpool::ThreadPool;

/// Default raw-table memory budget per side: roughly equal shares of the
/// configured memory budget, absent an explicit caller override.
pub const DEFAULT_SIDE_BUDGET_BYTES: u64 = 256 * 1024 * 1024;

/// Owns every part, target, and the thread pool across a run. One
/// `Collider` corresponds to one `create`/`destroy` lifetime in the
/// external interface.
pub struct Collider {
    intern: InternPool,
    parts: Vec<Part>,
    targets: TargetTable,
    prefix_budget_bytes: u64,
    suffix_budget_bytes: u64,
    pool: ThreadPool,
    results: Vec<Vec<u8>>,
}

impl Collider {
    pub fn new(worker_count: usize) -> Self {
        Collider {
            intern: InternPool::new(),
            parts: Vec::new(),
            targets: TargetTable::new(),
            prefix_budget_bytes: DEFAULT_SIDE_BUDGET_BYTES,
            suffix_budget_bytes: DEFAULT_SIDE_BUDGET_BYTES,
            pool: ThreadPool::new(worker_count),
            results: Vec::new(),
        }
    }

    /// Override the per-side raw-table memory budgets the Expansion
    /// Planner targets.
    pub fn set_budgets(&mut self, prefix_budget_bytes: u64, suffix_budget_bytes: u64) {
        self.prefix_budget_bytes = prefix_budget_bytes;
        self.suffix_budget_bytes = suffix_budget_bytes;
    }

    /// Open a new part and make it the current one; returns its index.
    pub fn next_part(&mut self) -> usize {
        self.parts.push(Part::new());
        self.parts.len() - 1
    }

    /// Add a candidate string to the most recently opened part.
    pub fn add_string(&mut self, data: &[u8]) -> Result<(), IngestError> {
        let part = self.parts.last_mut().ok_or(IngestError::NoOpenPart)?;
        part.push_candidate(&mut self.intern, data)
    }

    /// Add one `(Adler32, SHA-256)` target pair.
    pub fn add_hash(&mut self, adler32: u32, sha256: sha256::Digest) {
        self.targets.push(Target { adler32, sha256 });
    }

    /// Run the search to completion (or until `control` requests a stop),
    /// recording every verified match. Safe to call once per `Collider`;
    /// the handle API above this calls `run` exactly once between
    /// ingestion and reading back results.
    pub fn run(
        &mut self,
        control: &RunControl,
        mut on_progress: Option<&mut dyn FnMut(ProgressStats)>,
    ) -> Result<(), ColliderError> {
        if self.parts.is_empty() {
            return Err(ColliderError::NoParts);
        }
        for (index, part) in self.parts.iter().enumerate() {
            if part.is_empty() {
                return Err(ColliderError::EmptyPart { index });
            }
        }
        if self.targets.is_empty() {
            return Err(ColliderError::NoTargets);
        }

        let counts: Vec<usize> = self.parts.iter().map(Part::len).collect();
        let plan = planner::plan(&counts, self.prefix_budget_bytes, self.suffix_budget_bytes);

        tracing::info!(
            prefix_parts = plan.prefix_parts.len(),
            suffix_parts = plan.suffix_parts.len(),
            residual_parts = plan.residual_parts.len(),
            "expansion plan computed"
        );

        let prefix_refs: Vec<&Part> = plan.prefix_parts.iter().map(|&i| &self.parts[i]).collect();
        let suffix_refs: Vec<&Part> = plan.suffix_parts.iter().map(|&i| &self.parts[i]).collect();

        let prefix_table = table::build_forward(SEED, &prefix_refs, &self.pool);
        let suffix_tables = table::build_reverse(&self.targets, &suffix_refs, &self.intern, &self.pool);

        let prefix_counts = table::candidate_counts(&prefix_refs);
        let suffix_counts = table::candidate_counts(&suffix_refs);

        let total_suffix_rows: usize = suffix_tables.iter().map(Vec::len).sum();
        let mut entries = Vec::with_capacity(total_suffix_rows);
        for (target_idx, rows) in suffix_tables.iter().enumerate() {
            for (row_idx, &hash) in rows.iter().enumerate() {
                entries.push(IndexedRow { hash, target: target_idx as u32, row: row_idx as u32 });
            }
        }
        let compiled = CompiledIndex::build(&entries);

        tracing::debug!(
            prefix_rows = prefix_table.len(),
            suffix_rows = compiled.row_count(),
            "tables compiled"
        );

        let residual_refs: Vec<&Part> =
            plan.residual_parts.iter().map(|&i| &self.parts[i]).collect();
        let residual_counts = table::candidate_counts(&residual_refs);
        let residual_total = mixedradix::row_count(&residual_counts).unwrap_or(1).max(1);
        let prefix_total = prefix_table.len() as u64;
        let suffix_total_rows = compiled.row_count() as u64;

        let mut seen = HashSet::new();
        let mut matches_found: u64 = 0;
        let mut combinations = TeraHashCounter::new();

        'residual: for residual_row in 0..residual_total {
            if !control.wait_if_paused() {
                break 'residual;
            }

            let residual_digits = if residual_refs.is_empty() {
                Vec::new()
            } else {
                mixedradix::decode(residual_row, &residual_counts)
            };
            let residual_bytes = concat_candidates(&residual_refs, &residual_digits, &self.intern);
            let residual_hash = hash_part(&residual_bytes)
                .map_err(|_| ColliderError::InternalInvariant("residual bytes exceed 65535"))?;

            // Table construction (the dominant cost, see table.rs) already
            // fans out across the Thread Pool. This probe loop stays on the
            // calling thread: `CompiledIndex::probe` is O(bucket size) and
            // cooperative cancellation needs to be checked often, which is
            // simplest to reason about without also splitting `control`,
            // `seen` and `matches_found` across worker closures.
            for row_p in 0..prefix_total {
                if row_p % (1 << 16) == 0 && !control.wait_if_paused() {
                    break 'residual;
                }

                let probe = forward_combine(prefix_table[row_p as usize], residual_hash);
                compiled.probe(probe, |target_idx, row_s| {
                    let prefix_digits = mixedradix::decode(row_p, &prefix_counts);
                    let suffix_digits = mixedradix::decode(row_s as u64, &suffix_counts);

                    let candidate = assemble(
                        &self.parts,
                        &plan,
                        &prefix_digits,
                        &residual_digits,
                        &suffix_digits,
                        &self.intern,
                    );

                    let target = &self.targets.as_slice()[target_idx as usize];
                    if sha256::hash(&candidate) == target.sha256 && seen.insert(candidate.clone()) {
                        matches_found += 1;
                        tracing::info!(target = target_idx, "match found");
                    }
                });
            }

            combinations.add(prefix_total as u128 * suffix_total_rows as u128);

            if let Some(cb) = on_progress.as_deref_mut() {
                cb(ProgressStats {
                    residual_combinations_done: residual_row + 1,
                    residual_combinations_total: residual_total,
                    prefix_rows_scanned: prefix_total,
                    prefix_rows_total: prefix_total,
                    matches_found,
                    tera_hashes: combinations.tera_hashes(),
                    tera_hash_remainder: combinations.remainder(),
                });
            }
        }

        self.results = seen.into_iter().collect();
        self.results.sort();

        if control.is_stopped() {
            tracing::warn!(matches_found, "run cancelled before completion");
        }

        Ok(())
    }

    /// Every plaintext reconstructed and SHA-256-verified so far.
    pub fn results(&self) -> &[Vec<u8>] {
        &self.results
    }
}

fn concat_candidates(parts: &[&Part], digits: &[usize], intern: &InternPool) -> Vec<u8> {
    let mut out = Vec::new();
    for (part, &digit) in parts.iter().zip(digits.iter()) {
        let candidate = &part.candidates()[digit];
        out.extend_from_slice(intern.get(candidate.id));
    }
    out
}

/// Reassemble the full plaintext from the three groups of chosen digits,
/// placing each part's candidate at its original plaintext position.
fn assemble(
    all_parts: &[Part],
    plan: &Plan,
    prefix_digits: &[usize],
    residual_digits: &[usize],
    suffix_digits: &[usize],
    intern: &InternPool,
) -> Vec<u8> {
    let mut chosen: Vec<Option<&[u8]>> = vec![None; all_parts.len()];

    for (&part_idx, &digit) in plan.prefix_parts.iter().zip(prefix_digits.iter()) {
        let candidate = &all_parts[part_idx].candidates()[digit];
        chosen[part_idx] = Some(intern.get(candidate.id));
    }
    for (&part_idx, &digit) in plan.residual_parts.iter().zip(residual_digits.iter()) {
        let candidate = &all_parts[part_idx].candidates()[digit];
        chosen[part_idx] = Some(intern.get(candidate.id));
    }
    for (&part_idx, &digit) in plan.suffix_parts.iter().zip(suffix_digits.iter()) {
        let candidate = &all_parts[part_idx].candidates()[digit];
        chosen[part_idx] = Some(intern.get(candidate.id));
    }

    let mut out = Vec::new();
    for slot in chosen {
        out.extend_from_slice(slot.expect("every part is assigned to exactly one side"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adler::adler32;

    fn build(words_per_part: &[&[&[u8]]]) -> Collider {
        let mut collider = Collider::new(2);
        for words in words_per_part {
            collider.next_part();
            for w in *words {
                collider.add_string(w).unwrap();
            }
        }
        collider
    }

    #[test]
    fn finds_the_single_matching_combination() {
        let parts: &[&[&[u8]]] = &[&[b"ab", b"cd"], &[b"xy", b"zz"]];
        let mut collider = build(parts);
        let target_bytes = b"abxy";
        collider.add_hash(adler32(target_bytes), sha256::hash(target_bytes));

        let control = RunControl::new();
        collider.run(&control, None).unwrap();

        assert_eq!(collider.results(), &[target_bytes.to_vec()]);
    }

    #[test]
    fn progress_reports_tera_hash_count_of_combinations_checked() {
        let parts: &[&[&[u8]]] = &[&[b"a", b"b"], &[b"x", b"y"]];
        let mut collider = build(parts);
        let target_bytes = b"ay";
        collider.add_hash(adler32(target_bytes), sha256::hash(target_bytes));

        let mut last_stats = None;
        let control = RunControl::new();
        collider
            .run(&control, Some(&mut |stats: ProgressStats| last_stats = Some(stats)))
            .unwrap();

        // One residual point, a 2-row prefix table and a 2-row suffix
        // table: 2 * 2 = 4 combinations checked, all within one tera-hash.
        let stats = last_stats.expect("progress callback invoked at least once");
        assert_eq!(stats.tera_hashes, 0);
        assert_eq!(stats.tera_hash_remainder, 4);
    }

    #[test]
    fn finds_match_when_two_parts_land_on_the_suffix_side() {
        // A tiny prefix budget forces only the leftmost part onto the
        // prefix table, leaving two parts for the suffix table — the
        // shape that catches a suffix-side digit misassignment, since a
        // single-part suffix can't distinguish digit order from reversed
        // digit order.
        let parts: &[&[&[u8]]] =
            &[&[b"X", b"Y", b"Z"], &[b"m", b"n"], &[b"p", b"q"]];
        let mut collider = build(parts);
        collider.set_budgets(4, 1 << 30);
        let target_bytes = b"Xnp";
        collider.add_hash(adler32(target_bytes), sha256::hash(target_bytes));

        let control = RunControl::new();
        collider.run(&control, None).unwrap();

        assert_eq!(collider.results(), &[target_bytes.to_vec()]);
    }

    #[test]
    fn finds_every_matching_combination_for_a_shared_target() {
        // Two distinct candidate choices across parts can legitimately
        // produce the same plaintext if candidates repeat; more
        // interestingly, distinct plaintexts can share an Adler-32 value
        // without sharing a SHA-256 — only the latter is a real match.
        let parts: &[&[&[u8]]] = &[&[b"a", b"b"], &[b"1", b"2", b"3"]];
        let mut collider = build(parts);
        collider.add_hash(adler32(b"a1"), sha256::hash(b"a1"));
        collider.add_hash(adler32(b"b3"), sha256::hash(b"b3"));

        let control = RunControl::new();
        collider.run(&control, None).unwrap();

        let mut results = collider.results().to_vec();
        results.sort();
        assert_eq!(results, vec![b"a1".to_vec(), b"b3".to_vec()]);
    }

    #[test]
    fn no_match_yields_empty_results() {
        let parts: &[&[&[u8]]] = &[&[b"a", b"b"]];
        let mut collider = build(parts);
        collider.add_hash(adler32(b"zzzzzz"), [0u8; 32]);

        let control = RunControl::new();
        collider.run(&control, None).unwrap();
        assert!(collider.results().is_empty());
    }

    #[test]
    fn rejects_empty_configuration() {
        let mut collider = Collider::new(1);
        let control = RunControl::new();
        assert!(matches!(collider.run(&control, None), Err(ColliderError::NoParts)));

        collider.next_part();
        assert!(matches!(collider.run(&control, None), Err(ColliderError::EmptyPart { index: 0 })));

        collider.add_string(b"x").unwrap();
        assert!(matches!(collider.run(&control, None), Err(ColliderError::NoTargets)));
    }

    #[test]
    fn add_string_without_open_part_is_an_error() {
        let mut collider = Collider::new(1);
        assert!(matches!(collider.add_string(b"x"), Err(IngestError::NoOpenPart)));
    }

    proptest::proptest! {
        #[test]
        fn finds_every_reachable_plaintext_by_brute_force(
            parts_words in proptest::collection::vec(
                proptest::collection::vec(proptest::collection::vec(proptest::prelude::any::<u8>(), 1..4), 1..8),
                1..4,
            ),
            target_count in 1usize..16,
        ) {
            let mut collider = Collider::new(2);
            for words in &parts_words {
                collider.next_part();
                for w in words {
                    collider.add_string(w).unwrap();
                }
            }

            let mut all_combos: Vec<Vec<u8>> = vec![Vec::new()];
            for words in &parts_words {
                let mut next = Vec::with_capacity(all_combos.len() * words.len());
                for prefix in &all_combos {
                    for w in words {
                        let mut combo = prefix.clone();
                        combo.extend_from_slice(w);
                        next.push(combo);
                    }
                }
                all_combos = next;
            }
            all_combos.sort();
            all_combos.dedup();

            let chosen: Vec<Vec<u8>> =
                all_combos.iter().take(target_count.min(all_combos.len())).cloned().collect();
            proptest::prop_assume!(!chosen.is_empty());
            for c in &chosen {
                collider.add_hash(adler32(c), sha256::hash(c));
            }

            let control = RunControl::new();
            collider.run(&control, None).unwrap();

            let mut results = collider.results().to_vec();
            results.sort();
            let mut expected = chosen;
            expected.sort();
            // Every reachable plaintext chosen as a target is reconstructed
            // byte-for-byte, and nothing else is reported as a match.
            proptest::prop_assert_eq!(results, expected);
        }
    }

    #[test]
    fn cancellation_stops_before_full_completion() {
        let words: Vec<&[u8]> = vec![b"a", b"b", b"c", b"d"];
        let parts: &[&[&[u8]]] = &[&words, &words, &words];
        let mut collider = build(parts);
        collider.add_hash(adler32(b"ddd"), sha256::hash(b"ddd"));

        let control = RunControl::new();
        control.request_stop();
        collider.run(&control, None).unwrap();

        // A pre-stopped run may still find zero-cost matches on its very
        // first probe, but must not be required to find every match.
        assert!(collider.results().len() <= 1);
    }
}
