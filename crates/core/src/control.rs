//! Run control — cooperative cancellation and pause: an `AtomicBool`
//! for the fast common-case check, backed by a `Mutex`/`Condvar` pair so
//! a paused run sleeps instead of spinning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex};

/// Shared cancel/pause handle. Polled cooperatively at the top of the
/// Collider's residual-combination loop and from within long `ThreadPool`
/// partitions, never preemptively.
#[derive(Default)]
pub struct RunControl {
    stop: AtomicBool,
    pause: AtomicBool,
    gate: Mutex<()>,
    cv: Condvar,
}

impl RunControl {
    pub fn new() -> Self {
        RunControl {
            stop: AtomicBool::new(false),
            pause: AtomicBool::new(false),
            gate: Mutex::new(()),
            cv: Condvar::new(),
        }
    }

    /// Request that the run stop as soon as it next checks in. Already
    /// reconstructed matches are kept, not discarded.
    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::Release);
        self.cv.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub fn request_pause(&self) {
        self.pause.store(true, Ordering::Release);
    }

    pub fn resume(&self) {
        self.pause.store(false, Ordering::Release);
        self.cv.notify_all();
    }

    /// Block while paused. Returns `false` if the run should stop,
    /// `true` if it should keep going.
    pub fn wait_if_paused(&self) -> bool {
        if self.stop.load(Ordering::Acquire) {
            return false;
        }
        let mut guard = self.gate.lock().unwrap();
        while self.pause.load(Ordering::Acquire) && !self.stop.load(Ordering::Acquire) {
            guard = self.cv.wait(guard).unwrap();
        }
        drop(guard);
        !self.stop.load(Ordering::Acquire)
    }
}

/// 10^12 candidate evaluations: the Tera-hash, the engine's reported
/// throughput unit.
const TERA: u128 = 1_000_000_000_000;

/// Running count of candidate combinations checked, kept as two 64-bit
/// words (whole tera-hashes and a sub-tera remainder) rather than one
/// wide integer, so the count stays exact up to roughly 10^24 checks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeraHashCounter {
    tera_hashes: u64,
    remainder: u64,
}

impl TeraHashCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` combinations to the running total.
    pub fn add(&mut self, count: u128) {
        let total = self.remainder as u128 + count;
        self.tera_hashes += (total / TERA) as u64;
        self.remainder = (total % TERA) as u64;
    }

    /// Whole tera-hashes (10^12 combinations) counted so far.
    pub fn tera_hashes(&self) -> u64 {
        self.tera_hashes
    }

    /// Combinations counted since the last whole tera-hash.
    pub fn remainder(&self) -> u64 {
        self.remainder
    }
}

/// Snapshot reported through a run's progress callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProgressStats {
    pub residual_combinations_done: u64,
    pub residual_combinations_total: u64,
    pub prefix_rows_scanned: u64,
    pub prefix_rows_total: u64,
    pub matches_found: u64,
    /// Whole tera-hashes (10^12 candidate combinations) checked so far.
    pub tera_hashes: u64,
    /// Combinations checked since the last whole tera-hash.
    pub tera_hash_remainder: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn tera_hash_counter_carries_across_boundaries() {
        let mut counter = TeraHashCounter::new();
        counter.add(TERA as u128 - 1);
        assert_eq!((counter.tera_hashes(), counter.remainder()), (0, (TERA - 1) as u64));

        counter.add(1);
        assert_eq!((counter.tera_hashes(), counter.remainder()), (1, 0));

        counter.add(TERA as u128 * 3 + 7);
        assert_eq!((counter.tera_hashes(), counter.remainder()), (4, 7));
    }

    #[test]
    fn tera_hash_counter_handles_a_single_oversized_addend() {
        let mut counter = TeraHashCounter::new();
        counter.add(TERA as u128 * 5 + 250);
        assert_eq!((counter.tera_hashes(), counter.remainder()), (5, 250));
    }

    #[test]
    fn stop_is_observed_immediately() {
        let control = RunControl::new();
        assert!(control.wait_if_paused());
        control.request_stop();
        assert!(control.is_stopped());
        assert!(!control.wait_if_paused());
    }

    #[test]
    fn pause_blocks_until_resumed() {
        let control = Arc::new(RunControl::new());
        control.request_pause();

        let waiter = Arc::clone(&control);
        let handle = thread::spawn(move || waiter.wait_if_paused());

        thread::sleep(Duration::from_millis(20));
        assert!(!handle.is_finished());

        control.resume();
        assert!(handle.join().unwrap());
    }

    #[test]
    fn stop_wakes_a_paused_waiter() {
        let control = Arc::new(RunControl::new());
        control.request_pause();

        let waiter = Arc::clone(&control);
        let handle = thread::spawn(move || waiter.wait_if_paused());

        thread::sleep(Duration::from_millis(20));
        control.request_stop();
        assert!(!handle.join().unwrap());
    }
}
