//! Job fan-out for the search pipeline
//!
//! The coarse and fine search stages both split a large batch of independent
//! scoring jobs across worker threads and then wait for all of them before
//! reading results back out. `ThreadPool` buffers the jobs and runs them
//! inside a single `rayon::scope` on [`ThreadPool::wait_all`], giving the
//! same fan-out-then-collect shape a flat `par_iter().map()` would, but
//! expressed as explicit `submit`/`wait_all` calls since callers build up a
//! job list incrementally rather than mapping over an iterator in one shot.
//! Each phase that needs a batch of jobs constructs
//! its own short-lived `ThreadPool` rather than sharing one across phases,
//! since the jobs in different phases borrow different locals.

use std::sync::Mutex;

type Job<'a> = Box<dyn FnOnce() + Send + 'a>;

/// A buffer of pending closures, run concurrently on [`ThreadPool::wait_all`].
#[derive(Default)]
pub struct ThreadPool<'a> {
    jobs: Mutex<Vec<Job<'a>>>,
}

impl<'a> ThreadPool<'a> {
    pub fn new() -> Self {
        Self {
            jobs: Mutex::new(Vec::new()),
        }
    }

    /// Buffers `job` for the next [`ThreadPool::wait_all`] call.
    pub fn submit(&self, job: impl FnOnce() + Send + 'a) {
        self.jobs.lock().unwrap().push(Box::new(job));
    }

    /// Runs every buffered job to completion, across as many rayon worker
    /// threads as are available, then clears the buffer.
    pub fn wait_all(&self) {
        let jobs = std::mem::take(&mut *self.jobs.lock().unwrap());
        rayon::scope(|scope| {
            for job in jobs {
                scope.spawn(move |_| job());
            }
        });
    }
}
