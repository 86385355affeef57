// TaskPool suite (consolidated).
//
// Core invariants exercised:
// - Completion barrier: after wait_idle() returns, every task submitted
//   before the call has run to completion (queue empty, nothing
//   in-flight).
// - Admission order: dequeue is FIFO; with a single worker that is also
//   the execution order.
// - Submission is thread-safe, including from inside running tasks.

use corekit::{Runnable, Shared, TaskPool};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct CountTask {
    hits: Arc<AtomicUsize>,
}

impl Runnable for CountTask {
    fn run(&self) -> i32 {
        self.hits.fetch_add(1, Ordering::SeqCst);
        0
    }
}

// Test: the completion-barrier property for several pool widths.
// Verifies: K submitted tasks are all observed after wait_idle(),
// regardless of worker count.
#[test]
fn wait_idle_observes_all_tasks() {
    for workers in [1, 2, 4, 8] {
        let pool = TaskPool::new(workers);
        assert_eq!(pool.worker_count(), workers);
        let hits = Arc::new(AtomicUsize::new(0));
        let k = 200;
        for _ in 0..k {
            pool.spawn(CountTask {
                hits: Arc::clone(&hits),
            });
        }
        pool.wait_idle();
        assert_eq!(hits.load(Ordering::SeqCst), k);
    }
}

// Test: wait_idle on a pool that never saw work returns immediately,
// and repeated waits are fine.
#[test]
fn wait_idle_when_already_idle() {
    let pool = TaskPool::new(2);
    pool.wait_idle();
    pool.wait_idle();
    let hits = Arc::new(AtomicUsize::new(0));
    pool.spawn(CountTask {
        hits: Arc::clone(&hits),
    });
    pool.wait_idle();
    pool.wait_idle();
    assert_eq!(hits.load(Ordering::SeqCst), 1);
}

// Test: FIFO admission equals execution order on a single worker.
#[test]
fn single_worker_runs_fifo() {
    struct OrderTask {
        id: usize,
        seen: Arc<Mutex<Vec<usize>>>,
    }
    impl Runnable for OrderTask {
        fn run(&self) -> i32 {
            self.seen.lock().unwrap().push(self.id);
            0
        }
    }

    let pool = TaskPool::new(1);
    let seen = Arc::new(Mutex::new(Vec::new()));
    for id in 0..50 {
        pool.spawn(OrderTask {
            id,
            seen: Arc::clone(&seen),
        });
    }
    pool.wait_idle();
    let order = seen.lock().unwrap().clone();
    assert_eq!(order, (0..50).collect::<Vec<_>>());
}

// Test: tasks submitted from many producer threads all run.
#[test]
fn concurrent_producers() {
    let pool = Arc::new(TaskPool::new(4));
    let hits = Arc::new(AtomicUsize::new(0));
    let mut joins = Vec::new();
    for _ in 0..4 {
        let pool = Arc::clone(&pool);
        let hits = Arc::clone(&hits);
        joins.push(std::thread::spawn(move || {
            for _ in 0..100 {
                pool.spawn(CountTask {
                    hits: Arc::clone(&hits),
                });
            }
        }));
    }
    for j in joins {
        j.join().unwrap();
    }
    pool.wait_idle();
    assert_eq!(hits.load(Ordering::SeqCst), 400);
}

// Test: a running task enqueues follow-up work through a Submitter.
// Verifies: wait_idle() covers transitively spawned tasks, because the
// parent task is in-flight while it submits the child.
#[test]
fn tasks_submit_follow_up_work() {
    let pool = TaskPool::new(3);
    let hits = Arc::new(AtomicUsize::new(0));
    let submitter = pool.submitter();

    struct FanOut {
        depth: usize,
        hits: Arc<AtomicUsize>,
        submitter: corekit::Submitter,
    }
    impl Runnable for FanOut {
        fn run(&self) -> i32 {
            self.hits.fetch_add(1, Ordering::SeqCst);
            if self.depth > 0 {
                for _ in 0..2 {
                    self.submitter.spawn(FanOut {
                        depth: self.depth - 1,
                        hits: Arc::clone(&self.hits),
                        submitter: self.submitter.clone(),
                    });
                }
            }
            0
        }
    }

    pool.spawn(FanOut {
        depth: 4,
        hits: Arc::clone(&hits),
        submitter,
    });
    pool.wait_idle();
    // 1 + 2 + 4 + 8 + 16 = 31 tasks in the fan-out tree.
    assert_eq!(hits.load(Ordering::SeqCst), 31);
}

// Test: tasks shared by handle may be submitted more than once.
// Verifies: each submission is one execution; the task object itself
// is destroyed only after the pool releases its last handle.
#[test]
fn shared_task_handles() {
    let pool = TaskPool::new(2);
    let hits = Arc::new(AtomicUsize::new(0));
    let task: corekit::TaskHandle = Shared::from_box(Box::new(CountTask {
        hits: Arc::clone(&hits),
    }));
    for _ in 0..10 {
        pool.submit(task.clone());
    }
    pool.wait_idle();
    assert_eq!(hits.load(Ordering::SeqCst), 10);
    assert!(task.is_unique());
}

// Test: pool destruction joins workers after in-flight tasks finish.
// Verifies: dropping the pool while tasks are queued neither hangs nor
// runs anything after drop() returns.
#[test]
fn drop_waits_for_in_flight_only() {
    struct SlowTask {
        hits: Arc<AtomicUsize>,
    }
    impl Runnable for SlowTask {
        fn run(&self) -> i32 {
            std::thread::sleep(Duration::from_millis(20));
            self.hits.fetch_add(1, Ordering::SeqCst);
            0
        }
    }

    let hits = Arc::new(AtomicUsize::new(0));
    {
        let pool = TaskPool::new(1);
        for _ in 0..50 {
            pool.spawn(SlowTask {
                hits: Arc::clone(&hits),
            });
        }
        // Give the worker a moment to pull the first task in-flight.
        std::thread::sleep(Duration::from_millis(5));
    } // drop: the in-flight task finishes, the rest are abandoned
    let done = hits.load(Ordering::SeqCst);
    assert!(done < 50, "most queued tasks should have been abandoned");
    let after_drop = hits.load(Ordering::SeqCst);
    assert_eq!(done, after_drop);
}

// Test: closures are runnable directly.
#[test]
fn closure_tasks() {
    let pool = TaskPool::new(2);
    let hits = Arc::new(AtomicUsize::new(0));
    for _ in 0..25 {
        let hits = Arc::clone(&hits);
        pool.spawn(move || {
            hits.fetch_add(1, Ordering::SeqCst);
            0
        });
    }
    pool.wait_idle();
    assert_eq!(hits.load(Ordering::SeqCst), 25);
}
