//! Mixed-radix row addressing — the index arithmetic a Cartesian
//! product's row number decodes into (and encodes back from).
//!
//! A contiguous run of parts assigned to one side of the meet-in-the-middle
//! split is addressed like an odometer: the rightmost part in plaintext
//! order is the fastest-varying digit, the leftmost the slowest. This
//! lets the table builders store one `u32` per row (the combined Adler
//! value) instead of a per-row candidate list, and lets reconstruction
//! recover exactly which candidate was chosen for each part from nothing
//! but a row index and the parts' candidate counts.

/// The total number of rows a run of parts with these candidate counts
/// produces, i.e. their Cartesian product size. `None` on overflow past
/// `u64`, which in practice means past the engine's `u32` row-index cap
/// long before it means past `u64`.
pub fn row_count(candidate_counts: &[usize]) -> Option<u64> {
    candidate_counts
        .iter()
        .try_fold(1u64, |acc, &c| acc.checked_mul(c as u64))
}

/// Decode a row index into one digit (candidate index) per part, in the
/// same left-to-right order as `candidate_counts`.
pub fn decode(row: u64, candidate_counts: &[usize]) -> Vec<usize> {
    let mut digits = vec![0usize; candidate_counts.len()];
    let mut remaining = row;
    for (i, &count) in candidate_counts.iter().enumerate().rev() {
        let count = count as u64;
        digits[i] = (remaining % count) as usize;
        remaining /= count;
    }
    debug_assert_eq!(remaining, 0, "row index out of range for these candidate counts");
    digits
}

/// Encode a digit vector (one candidate index per part, same order as
/// `candidate_counts`) back into a row index. Inverse of [`decode`].
pub fn encode(digits: &[usize], candidate_counts: &[usize]) -> u64 {
    debug_assert_eq!(digits.len(), candidate_counts.len());
    let mut row = 0u64;
    for (&digit, &count) in digits.iter().zip(candidate_counts.iter()) {
        row = row * count as u64 + digit as u64;
    }
    row
}
