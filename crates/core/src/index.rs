//! Index/Filter Builder — compiles a side table's Adler-32 values into a
//! structure that supports O(1) exact membership plus fast bucketed
//! lookup:
//!
//! - **Filter**: an exact 2^32-bit presence bitset (512 MiB), indexed
//!   directly by the 32-bit Adler value. A clear bit rules a probe out
//!   with certainty; a set bit means at least one row carries that exact
//!   value (real Adler-32 collisions among distinct rows are expected and
//!   are not filter false positives).
//! - **Buckets**: a 2^24-slot CSR (prefix-sum) table keyed by a probe's
//!   top 24 bits, giving the `[start, end)` run of sorted rows sharing
//!   that prefix.
//! - **SubHashes**: the low 8 bits of each sorted row's Adler value,
//!   compared linearly within a bucket's run (bucket + sub-byte together
//!   reconstruct the full 32-bit value, so this comparison is exact).
//! - Per sorted row, the originating target and the row's index within
//!   its side table's Cartesian product, split into parallel `targets`/
//!   `rows` arrays since the payload is carried directly rather than
//!   through a second indirection.
//!
//! A single counting-sort pass over the bucket key builds the sorted
//! rows below, rather than a recursive parallel MSD-radix partition down
//! to an insertion-sort tail: lookup only needs rows grouped by their
//! top-24-bit bucket (order *within* a bucket never affects correctness
//! — every row in a bucket is linearly scanned and compared by sub-hash
//! byte), so the simpler single pass is algorithmically equivalent for
//! this purpose. The counting and
//! scatter passes below run on the calling thread rather than through the
//! Thread Pool: they mutate a shared histogram/output buffer by index,
//! which is safe to parallelize with scoped borrows, but this pool is a
//! persistent, `'static`-job pool rather than a scope-based one, so
//! giving worker closures a borrow of `entries` isn't expressible without
//! unsafely erasing its lifetime. The Thread Pool still does the
//! actual per-row combine work that produces the values being sorted
//! here (see `collider.rs`), which is this component's dominant cost.

const BUCKET_BITS: u32 = 24;
const BUCKET_COUNT: usize = 1 << BUCKET_BITS;
const FILTER_BITS: u64 = 1 << 32;
const FILTER_WORDS: usize = (FILTER_BITS / 64) as usize;

/// One row contributed to the suffix side's Cartesian product: its
/// combined Adler value, which target it was built against, and its row
/// index within that side's table (decodable via `mixedradix::decode`).
#[derive(Debug, Clone, Copy)]
pub struct IndexedRow {
    pub hash: u32,
    pub target: u32,
    pub row: u32,
}

/// The compiled suffix index: Filter + Buckets + SubHashes + row payload.
pub struct CompiledIndex {
    filter: Box<[u64]>,
    buckets: Box<[u32]>,
    sub_hashes: Box<[u8]>,
    targets: Box<[u32]>,
    rows: Box<[u32]>,
}

impl CompiledIndex {
    /// Compile `entries` into a queryable index (see the module docs for
    /// why this pass runs on the calling thread rather than through the
    /// Thread Pool).
    pub fn build(entries: &[IndexedRow]) -> Self {
        let mut filter = vec![0u64; FILTER_WORDS].into_boxed_slice();
        for entry in entries {
            let word = (entry.hash >> 6) as usize;
            let bit = entry.hash & 0x3F;
            filter[word] |= 1u64 << bit;
        }

        let mut histogram = vec![0u32; BUCKET_COUNT];
        for entry in entries {
            histogram[bucket_of(entry.hash)] += 1;
        }

        let mut buckets = vec![0u32; BUCKET_COUNT + 1].into_boxed_slice();
        for i in 0..BUCKET_COUNT {
            buckets[i + 1] = buckets[i] + histogram[i];
        }

        let n = entries.len();
        let mut sub_hashes = vec![0u8; n].into_boxed_slice();
        let mut targets = vec![0u32; n].into_boxed_slice();
        let mut rows = vec![0u32; n].into_boxed_slice();

        let mut cursor = buckets[..BUCKET_COUNT].to_vec();
        for entry in entries {
            let bucket = bucket_of(entry.hash);
            let slot = cursor[bucket] as usize;
            cursor[bucket] += 1;
            sub_hashes[slot] = sub_hash_of(entry.hash);
            targets[slot] = entry.target;
            rows[slot] = entry.row;
        }

        CompiledIndex { filter, buckets, sub_hashes, targets, rows }
    }

    /// Exact membership test against the Filter bitset.
    #[inline]
    pub fn contains(&self, probe: u32) -> bool {
        let word = (probe >> 6) as usize;
        let bit = probe & 0x3F;
        self.filter[word] & (1u64 << bit) != 0
    }

    /// Look up every row whose Adler value equals `probe` exactly, calling
    /// `on_match(target_index, row_index)` for each.
    pub fn probe(&self, probe: u32, mut on_match: impl FnMut(u32, u32)) {
        if !self.contains(probe) {
            return;
        }

        let bucket = bucket_of(probe);
        let sub = sub_hash_of(probe);
        let start = self.buckets[bucket] as usize;
        let end = self.buckets[bucket + 1] as usize;

        for i in start..end {
            if self.sub_hashes[i] == sub {
                on_match(self.targets[i], self.rows[i]);
            }
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

#[inline]
fn bucket_of(hash: u32) -> usize {
    (hash >> 8) as usize
}

#[inline]
fn sub_hash_of(hash: u32) -> u8 {
    (hash & 0xFF) as u8
}
