//! TaskPool: a fixed set of worker threads draining one FIFO queue.
//!
//! Tasks enter through [`TaskPool::submit`] (or the boxing convenience
//! [`TaskPool::spawn`]) and are handed to workers in admission order;
//! nothing is guaranteed about which worker runs which task or about
//! completion order. [`TaskPool::wait_idle`] blocks until the queue is
//! empty and no task is executing. Dropping the pool stops the workers:
//! in-flight tasks finish, queued-but-unstarted tasks are abandoned
//! (callers that care should `wait_idle` first).
//!
//! The queue is the one internally synchronized container in this
//! crate: a [`DynamicSequence`] of task handles plus an in-flight
//! counter behind a single mutex, with one condvar for "work arrived"
//! and one for "went idle".
//!
//! A task must not unwind out of `run`. A panicking task poisons the
//! queue lock; the pool treats that as fatal rather than limping on.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::thread;

use crate::counted::{Counted, Shared};
use crate::counter::AtomicCount;
use crate::sequence::DynamicSequence;

/// A unit of work. The status code is returned to nobody in particular;
/// the pool does not interpret it (0 conventionally means success).
pub trait Runnable {
    fn run(&self) -> i32;
}

/// Closures are runnable as-is.
impl<F> Runnable for F
where
    F: Fn() -> i32 + Send + Sync,
{
    fn run(&self) -> i32 {
        self()
    }
}

/// Counted handle under which tasks travel into and through the pool.
pub type TaskHandle = Counted<dyn Runnable + Send + Sync, AtomicCount>;

struct PoolState {
    queue: DynamicSequence<TaskHandle>,
    in_flight: usize,
    shutdown: bool,
}

struct PoolShared {
    state: Mutex<PoolState>,
    work_available: Condvar,
    became_idle: Condvar,
}

impl PoolShared {
    fn lock(&self) -> MutexGuard<'_, PoolState> {
        match self.state.lock() {
            Ok(g) => g,
            Err(_) => panic!("task pool lock poisoned: a task unwound inside the pool"),
        }
    }

    fn wait<'a>(
        &self,
        cv: &Condvar,
        guard: MutexGuard<'a, PoolState>,
    ) -> MutexGuard<'a, PoolState> {
        match cv.wait(guard) {
            Ok(g) => g,
            Err(_) => panic!("task pool lock poisoned: a task unwound inside the pool"),
        }
    }

    fn enqueue(&self, task: TaskHandle) {
        let mut state = self.lock();
        state.queue.push(task);
        self.work_available.notify_one();
    }
}

/// Cloneable submission endpoint, detached from the pool's lifetime.
///
/// Lets running tasks enqueue follow-up work without holding a
/// reference to the [`TaskPool`] itself. Tasks submitted after the pool
/// began shutting down are abandoned like any other queued task.
#[derive(Clone)]
pub struct Submitter {
    shared: Shared<PoolShared>,
}

impl Submitter {
    pub fn submit(&self, task: TaskHandle) {
        self.shared.enqueue(task);
    }

    pub fn spawn<R>(&self, task: R)
    where
        R: Runnable + Send + Sync + 'static,
    {
        self.submit(Counted::from_box(
            Box::new(task) as Box<dyn Runnable + Send + Sync>
        ));
    }
}

/// Fixed worker-thread pool over one shared FIFO task queue.
pub struct TaskPool {
    shared: Shared<PoolShared>,
    workers: DynamicSequence<thread::JoinHandle<()>>,
}

impl TaskPool {
    /// Spawns `worker_count` workers (panics if zero), each parked on
    /// the shared queue until work arrives.
    pub fn new(worker_count: usize) -> Self {
        assert!(worker_count >= 1, "TaskPool requires at least one worker");
        let shared: Shared<PoolShared> = Shared::new(PoolShared {
            state: Mutex::new(PoolState {
                queue: DynamicSequence::new(),
                in_flight: 0,
                shutdown: false,
            }),
            work_available: Condvar::new(),
            became_idle: Condvar::new(),
        });
        let mut workers = DynamicSequence::with_capacity(worker_count);
        for index in 0..worker_count {
            let shared = shared.clone();
            let builder = thread::Builder::new().name(format!("corekit-worker-{index}"));
            match builder.spawn(move || worker_loop(index, shared)) {
                Ok(handle) => workers.push(handle),
                Err(e) => panic!("failed to spawn worker thread: {e}"),
            }
        }
        log::debug!("task pool started with {worker_count} worker(s)");
        Self { shared, workers }
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Appends a task to the queue (FIFO admission) and wakes an idle
    /// worker if one exists. Callable from any thread, including from a
    /// task running on this pool.
    pub fn submit(&self, task: TaskHandle) {
        self.shared.enqueue(task);
    }

    /// Boxes `task` into a [`TaskHandle`] and submits it.
    pub fn spawn<R>(&self, task: R)
    where
        R: Runnable + Send + Sync + 'static,
    {
        self.submit(Counted::from_box(
            Box::new(task) as Box<dyn Runnable + Send + Sync>
        ));
    }

    /// Detached submission endpoint for use inside tasks.
    pub fn submitter(&self) -> Submitter {
        Submitter {
            shared: self.shared.clone(),
        }
    }

    /// Blocks until the queue is empty and no task is executing. May be
    /// called repeatedly and concurrently with `submit`; each call
    /// returns at some instant where the pool was fully idle.
    pub fn wait_idle(&self) {
        let mut state = self.shared.lock();
        while !(state.queue.is_empty() && state.in_flight == 0) {
            state = self.shared.wait(&self.shared.became_idle, state);
        }
    }
}

impl Drop for TaskPool {
    /// Signals shutdown, wakes every worker and joins them. Tasks
    /// already dequeued run to completion; tasks still queued are
    /// dropped unexecuted.
    fn drop(&mut self) {
        let abandoned;
        {
            let mut state = self.shared.lock();
            state.shutdown = true;
            abandoned = state.queue.len();
        }
        self.shared.work_available.notify_all();
        while let Some(worker) = self.workers.pop() {
            if worker.join().is_err() {
                log::error!("task pool worker panicked during shutdown");
            }
        }
        if abandoned > 0 {
            log::debug!("task pool shut down abandoning {abandoned} queued task(s)");
        } else {
            log::debug!("task pool shut down");
        }
    }
}

fn worker_loop(index: usize, shared: Shared<PoolShared>) {
    log::trace!("worker {index} up");
    let mut state = shared.lock();
    loop {
        if state.shutdown {
            break;
        }
        if state.queue.is_empty() {
            state = shared.wait(&shared.work_available, state);
            continue;
        }
        // FIFO: dequeue from the front. The task is in-flight, not
        // queued, from here until the decrement below.
        let task = state.queue.remove(0);
        state.in_flight += 1;
        drop(state);

        let status = task.run();
        if status != 0 {
            log::trace!("worker {index}: task returned status {status}");
        }
        drop(task);

        state = shared.lock();
        state.in_flight -= 1;
        if state.in_flight == 0 && state.queue.is_empty() {
            shared.became_idle.notify_all();
        }
    }
    log::trace!("worker {index} down");
}
