//! Thread Pool — a fixed-size worker pool with an explicit
//! `partition`/`wait` contract: submit arbitrary work, submit a range
//! split into grains, block until drained, run in a lowered-priority
//! "background" mode. `rayon`'s data-parallel iterators don't expose
//! that shape directly, so this is a dedicated pool instead (see
//! DESIGN.md).

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Shared {
    queue: Mutex<VecDeque<Job>>,
    queue_cv: Condvar,
    inflight: AtomicUsize,
    drained_mutex: Mutex<()>,
    drained_cv: Condvar,
    shutdown: AtomicBool,
    background: AtomicBool,
}

/// A fixed-size worker pool. Jobs are boxed closures; `partition` is the
/// primary entry point, used by side-table expansion to fan each part's
/// Cartesian-product step out over `worker_count()` threads.
pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `worker_count` worker threads. `worker_count` is clamped to
    /// at least 1 (a pool of zero workers can never drain its queue).
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let shared = Arc::new(Shared {
            queue: Mutex::new(VecDeque::new()),
            queue_cv: Condvar::new(),
            inflight: AtomicUsize::new(0),
            drained_mutex: Mutex::new(()),
            drained_cv: Condvar::new(),
            shutdown: AtomicBool::new(false),
            background: AtomicBool::new(false),
        });

        let workers = (0..worker_count)
            .map(|id| {
                let shared = Arc::clone(&shared);
                std::thread::Builder::new()
                    .name(format!("collider-worker-{id}"))
                    .spawn(move || Self::run_worker(shared))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        ThreadPool { shared, workers }
    }

    /// Number of worker threads backing this pool.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    fn run_worker(shared: Arc<Shared>) {
        loop {
            let job = {
                let mut queue = shared.queue.lock().unwrap();
                loop {
                    if let Some(job) = queue.pop_front() {
                        break Some(job);
                    }
                    if shared.shutdown.load(Ordering::Acquire) {
                        break None;
                    }
                    queue = shared.queue_cv.wait(queue).unwrap();
                }
            };

            let Some(job) = job else { break };

            job();

            if shared.inflight.fetch_sub(1, Ordering::AcqRel) == 1 {
                let _guard = shared.drained_mutex.lock().unwrap();
                shared.drained_cv.notify_all();
            }

            if shared.background.load(Ordering::Relaxed) {
                std::thread::yield_now();
            }
        }
    }

    /// Queue a single job. Returns immediately; call [`ThreadPool::wait`]
    /// to block until it (and everything else queued) completes.
    pub fn submit<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.inflight.fetch_add(1, Ordering::AcqRel);
        self.shared.queue.lock().unwrap().push_back(Box::new(job));
        self.shared.queue_cv.notify_one();
    }

    /// Split `[0, count)` into `worker_count()` contiguous grains (the
    /// last grain absorbs the remainder) and submit one job per grain,
    /// each invoking `f(start, end)`. Blocks until every grain completes.
    ///
    /// This is the engine's only fan-out primitive: side-table expansion
    /// expresses its parallelism as a `partition` call over a slice's
    /// index range.
    pub fn partition<F>(&self, count: usize, f: F)
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        if count == 0 {
            return;
        }

        let workers = self.worker_count().max(1);
        let grains = workers.min(count);
        let grain_size = count.div_ceil(grains);
        let f = Arc::new(f);

        let mut start = 0;
        while start < count {
            let end = (start + grain_size).min(count);
            let f = Arc::clone(&f);
            self.submit(move || f(start, end));
            start = end;
        }

        self.wait();
    }

    /// Queue `n` independent jobs, each invoking `f(index)`. Does not wait;
    /// callers that need a barrier should follow with [`ThreadPool::wait`].
    pub fn submit_n<F>(&self, n: usize, f: F)
    where
        F: Fn(usize) + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        for i in 0..n {
            let f = Arc::clone(&f);
            self.submit(move || f(i));
        }
    }

    /// Block until the queue is empty and every submitted job has run.
    pub fn wait(&self) {
        let guard = self.shared.drained_mutex.lock().unwrap();
        let _guard = self
            .shared
            .drained_cv
            .wait_while(guard, |_| self.shared.inflight.load(Ordering::Acquire) != 0)
            .unwrap();
    }

    /// Switch the pool between foreground and background scheduling.
    /// Background mode yields after each job, trading throughput for
    /// responsiveness of the rest of the process — used while a caller
    /// expects to interleave its own work with the pool, running it as a
    /// background, lower-priority pass.
    pub fn set_background(&self, background: bool) {
        self.shared.background.store(background, Ordering::Relaxed);
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shared.shutdown.store(true, Ordering::Release);
        self.shared.queue_cv.notify_all();
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn submit_runs_every_job() {
        let pool = ThreadPool::new(4);
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            pool.submit(move || {
                counter.fetch_add(1, Ordering::Relaxed);
            });
        }
        pool.wait();
        assert_eq!(counter.load(Ordering::Relaxed), 100);
    }

    #[test]
    fn partition_covers_every_index_exactly_once() {
        let pool = ThreadPool::new(4);
        let hits = Arc::new((0..1000).map(|_| AtomicU64::new(0)).collect::<Vec<_>>());
        let hits_clone = Arc::clone(&hits);
        pool.partition(1000, move |start, end| {
            for i in start..end {
                hits_clone[i].fetch_add(1, Ordering::Relaxed);
            }
        });
        for h in hits.iter() {
            assert_eq!(h.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn partition_of_zero_is_a_no_op() {
        let pool = ThreadPool::new(2);
        pool.partition(0, |_, _| panic!("should not be called"));
    }

    #[test]
    fn submit_n_runs_each_index_once() {
        let pool = ThreadPool::new(3);
        let hits = Arc::new((0..50).map(|_| AtomicU64::new(0)).collect::<Vec<_>>());
        let hits_clone = Arc::clone(&hits);
        pool.submit_n(50, move |i| {
            hits_clone[i].fetch_add(1, Ordering::Relaxed);
        });
        pool.wait();
        for h in hits.iter() {
            assert_eq!(h.load(Ordering::Relaxed), 1);
        }
    }

    #[test]
    fn worker_count_is_clamped_to_at_least_one() {
        let pool = ThreadPool::new(0);
        assert_eq!(pool.worker_count(), 1);
    }
}
