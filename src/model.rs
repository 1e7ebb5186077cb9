use std::sync::atomic::{AtomicUsize, Ordering};


/// A unit of work waiting in the queue.
///
/// The pool owns whatever the task captured from submission until the task
/// has run, or until the pool is torn down without dequeuing it.
pub struct Task {
    job: Box<dyn FnOnce() + Send + 'static>,
}

impl Task {
    /// Bind `entry` to an owned `arg`. The argument is dropped right after
    /// `entry` returns (or unwinds), never earlier and never twice.
    pub fn new<A>(entry: fn(&mut A), arg: A) -> Self
    where
        A: Send + 'static,
    {
        Self {
            job: Box::new(move || {
                let mut arg = arg;
                entry(&mut arg);
                drop(arg);
            }),
        }
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self { job: Box::new(f) }
    }

    #[inline]
    pub fn run(self) {
        (self.job)()
    }
}


/// Lifetime counters, informational only.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub submitted: AtomicUsize,
    pub completed: AtomicUsize,
    pub panicked: AtomicUsize,
    pub rejected: AtomicUsize,
}

impl Counters {
    #[inline]
    pub fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}


#[derive(Debug, Clone)]
pub struct PoolMetrics {
    pub min_workers: usize,
    pub max_workers: usize,
    pub live_workers: usize,
    pub busy_workers: usize,
    pub pending_exits: usize,
    pub queued_tasks: usize,
    pub queue_capacity: usize,
    pub submitted_tasks: usize,
    pub completed_tasks: usize,
    pub panicked_tasks: usize,
    pub rejected_tasks: usize,
}

impl PoolMetrics {
    pub(crate) fn load_counters(mut self, counters: &Counters) -> Self {
        self.submitted_tasks = counters.submitted.load(Ordering::Relaxed);
        self.completed_tasks = counters.completed.load(Ordering::Relaxed);
        self.panicked_tasks = counters.panicked.load(Ordering::Relaxed);
        self.rejected_tasks = counters.rejected.load(Ordering::Relaxed);
        self
    }

    /// Busy workers relative to live workers.
    pub fn utilization(&self) -> f64 {
        if self.live_workers == 0 {
            return 0.0;
        }
        self.busy_workers as f64 / self.live_workers as f64
    }

    /// Queue occupancy in `[0, 1]`.
    pub fn queue_pressure(&self) -> f64 {
        if self.queue_capacity == 0 {
            return 0.0;
        }
        self.queued_tasks as f64 / self.queue_capacity as f64
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed_tasks + self.panicked_tasks;
        if total == 0 {
            return 1.0;
        }
        self.completed_tasks as f64 / total as f64
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn argument_dropped_once_after_entry() {
        let drops = Arc::new(AtomicUsize::new(0));
        let task = Task::new(
            |arg: &mut DropCounter| assert_eq!(arg.0.load(Ordering::SeqCst), 0),
            DropCounter(drops.clone()),
        );
        assert_eq!(drops.load(Ordering::SeqCst), 0);
        task.run();
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn unrun_task_drops_argument_once() {
        let drops = Arc::new(AtomicUsize::new(0));
        let task = Task::new(|_: &mut DropCounter| panic!("must not run"), DropCounter(drops.clone()));
        drop(task);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn metrics_ratios() {
        let metrics = PoolMetrics {
            min_workers: 1,
            max_workers: 8,
            live_workers: 4,
            busy_workers: 1,
            pending_exits: 0,
            queued_tasks: 5,
            queue_capacity: 10,
            submitted_tasks: 0,
            completed_tasks: 9,
            panicked_tasks: 1,
            rejected_tasks: 0,
        };
        assert_eq!(metrics.utilization(), 0.25);
        assert_eq!(metrics.queue_pressure(), 0.5);
        assert_eq!(metrics.success_rate(), 0.9);
    }
}
