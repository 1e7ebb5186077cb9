use super::{
    config::Config,
    errors::{CreateError, SpawnError, SubmitError},
    handle::{self, JoinHandle},
    manager::{self, LoadSnapshot},
    model::{Counters, PoolMetrics, Task},
    queue::TaskQueue,
    registry::{WorkerId, WorkerRegistry},
    worker,
};
use std::{
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Condvar, Mutex, MutexGuard, PoisonError,
    },
    thread,
};
use crossbeam::channel::{self, Sender};
use tracing::{debug, error, info};


/// Everything guarded by the pool lock.
pub(crate) struct PoolState {
    pub(crate) queue: TaskQueue<Task>,
    pub(crate) registry: WorkerRegistry,
    /// Join handles of workers that left their slot but were not joined yet.
    pub(crate) retired: Vec<thread::JoinHandle<()>>,
    pub(crate) live_workers: usize,
    pub(crate) pending_exits: usize,
    pub(crate) shutdown: bool,
}

impl PoolState {
    /// Move the calling worker's handle from its slot to `retired`.
    fn retire(&mut self, id: WorkerId) {
        if let Some(handle) = self.registry.release(id) {
            self.retired.push(handle);
        }
    }
}

pub(crate) enum Dequeued {
    Task(Task),
    /// The manager asked this worker to exit; it is already unregistered.
    Exit,
    /// The pool is shutting down; the worker is already unregistered.
    Shutdown,
}


/// State shared by the pool handle, its submitters, workers and the manager.
pub(crate) struct Shared {
    state: Mutex<PoolState>,
    /// Workers wait here for tasks (and for exit requests).
    pub(crate) not_empty: Condvar,
    /// Producers wait here for queue space.
    not_full: Condvar,
    /// Kept apart from the pool lock; the two are never held together.
    busy_workers: Mutex<usize>,
    pub(crate) config: Config,
    pub(crate) counters: Counters,
    next_worker_id: AtomicU64,
}

impl Shared {
    fn new(config: Config) -> Self {
        let state = PoolState {
            queue: TaskQueue::with_capacity(config.queue_capacity),
            registry: WorkerRegistry::new(config.max_workers),
            retired: Vec::new(),
            live_workers: 0,
            pending_exits: 0,
            shutdown: false,
        };
        Self {
            state: Mutex::new(state),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            busy_workers: Mutex::new(0),
            config,
            counters: Counters::default(),
            next_worker_id: AtomicU64::new(1),
        }
    }

    // Tasks run outside the lock and no pool code panics while holding it,
    // so a poisoned lock still guards consistent state.
    #[inline]
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, PoolState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn lock_busy(&self) -> MutexGuard<'_, usize> {
        self.busy_workers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn next_worker_id(&self) -> WorkerId {
        WorkerId::new(self.next_worker_id.fetch_add(1, Ordering::Relaxed))
    }

    fn enqueue(&self, task: Task) -> Result<(), SubmitError> {
        let mut task = task;
        let mut state = self.lock_state();
        loop {
            if state.shutdown {
                drop(state);
                Counters::bump(&self.counters.rejected);
                // Drop the task (and its argument) outside the lock.
                drop(task);
                return Err(SubmitError::Rejected);
            }
            match state.queue.push(task) {
                Ok(()) => break,
                Err(returned) => {
                    task = returned;
                    state = self.not_full.wait(state).unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
        drop(state);
        Counters::bump(&self.counters.submitted);
        self.not_empty.notify_one();
        Ok(())
    }

    /// Block until there is a task for worker `id`, or until it has to stop.
    ///
    /// The exit request is re-checked on every wake-up, whatever woke us.
    pub(crate) fn dequeue(&self, id: WorkerId) -> Dequeued {
        let mut state = self.lock_state();
        loop {
            if state.shutdown {
                state.live_workers = state.live_workers.saturating_sub(1);
                state.retire(id);
                return Dequeued::Shutdown;
            }
            if let Some(task) = state.queue.pop() {
                drop(state);
                self.not_full.notify_one();
                return Dequeued::Task(task);
            }
            if state.pending_exits > 0 && state.live_workers > self.config.min_workers {
                state.pending_exits -= 1;
                state.live_workers -= 1;
                state.retire(id);
                return Dequeued::Exit;
            }
            state = self.not_empty.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn adjust_busy(&self, started: bool) {
        let mut busy = self.lock_busy();
        if started {
            *busy += 1;
        } else {
            *busy -= 1;
        }
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.lock_state().shutdown
    }

    fn busy_count(&self) -> usize {
        *self.lock_busy()
    }

    fn live_count(&self) -> usize {
        self.lock_state().live_workers
    }

    pub(crate) fn load_snapshot(&self) -> LoadSnapshot {
        let (queued_tasks, live_workers) = {
            let state = self.lock_state();
            (state.queue.len(), state.live_workers)
        };
        LoadSnapshot {
            queued_tasks,
            live_workers,
            busy_workers: self.busy_count(),
        }
    }

    fn metrics(&self) -> PoolMetrics {
        let metrics = {
            let state = self.lock_state();
            PoolMetrics {
                min_workers: self.config.min_workers,
                max_workers: self.config.max_workers,
                live_workers: state.live_workers,
                busy_workers: 0,
                pending_exits: state.pending_exits,
                queued_tasks: state.queue.len(),
                queue_capacity: state.queue.capacity(),
                submitted_tasks: 0,
                completed_tasks: 0,
                panicked_tasks: 0,
                rejected_tasks: 0,
            }
        };
        PoolMetrics {
            busy_workers: self.busy_count(),
            ..metrics
        }
        .load_counters(&self.counters)
    }

    /// Join workers that already left electively.
    pub(crate) fn reap_retired(&self) {
        let retired = std::mem::take(&mut self.lock_state().retired);
        for handle in retired {
            if handle.join().is_err() {
                error!("retired worker thread panicked");
            }
        }
    }

    /// Flip the shutdown flag and wake every blocked producer and worker.
    fn begin_shutdown(&self) -> bool {
        let first = {
            let mut state = self.lock_state();
            let first = !state.shutdown;
            state.shutdown = true;
            state.pending_exits = 0;
            first
        };
        self.not_empty.notify_all();
        self.not_full.notify_all();
        first
    }

    /// Take every worker handle out of the registry and the retired list.
    fn take_worker_handles(&self) -> Vec<thread::JoinHandle<()>> {
        let mut state = self.lock_state();
        let mut handles = state.registry.drain();
        handles.append(&mut state.retired);
        handles
    }

    fn drain_queue(&self) -> Vec<Task> {
        self.lock_state().queue.drain()
    }
}


/// Самомасштабируемый пул потоков
///
/// A bounded queue served by `min_workers..=max_workers` threads. A manager
/// thread grows the pool while the backlog outnumbers the workers and asks
/// idle workers to exit while fewer than half of them are busy.
///
/// Dropping the pool is the same as calling [`ThreadPool::destroy`].
pub struct ThreadPool {
    shared: Arc<Shared>,
    manager: Option<thread::JoinHandle<()>>,
    stop_manager: Option<Sender<()>>,
    destroyed: bool,
}

impl ThreadPool {
    pub fn new(min_workers: usize, max_workers: usize, queue_capacity: usize) -> Result<Self, CreateError> {
        Self::with_config(Config::new(min_workers, max_workers, queue_capacity))
    }

    pub fn with_config(config: Config) -> Result<Self, CreateError> {
        config.validate()?;

        let min_workers = config.min_workers;
        let manager_name = format!("{}-manager", config.thread_name);
        let (stop_tx, stop_rx) = channel::bounded::<()>(1);

        // From here on, an early return drops `pool`, which tears down
        // whatever was started.
        let mut pool = ThreadPool {
            shared: Arc::new(Shared::new(config)),
            manager: None,
            stop_manager: Some(stop_tx),
            destroyed: false,
        };

        {
            let mut state = pool.shared.lock_state();
            for _ in 0..min_workers {
                worker::spawn(&pool.shared, &mut state)?;
            }
        }

        let shared = Arc::clone(&pool.shared);
        pool.manager = Some(
            thread::Builder::new()
                .name(manager_name)
                .spawn(move || manager::run(shared, stop_rx))?,
        );

        info!(
            min_workers,
            max_workers = pool.shared.config.max_workers,
            queue_capacity = pool.shared.config.queue_capacity,
            "thread pool created"
        );
        Ok(pool)
    }

    /// Queue `entry(&mut arg)`. Blocks while the queue is full.
    ///
    /// The pool owns `arg` from here on: it is dropped right after `entry`
    /// returns, or without running if the pool shuts down first.
    pub fn submit<A>(&self, entry: fn(&mut A), arg: A) -> Result<(), SubmitError>
    where
        A: Send + 'static,
    {
        self.shared.enqueue(Task::new(entry, arg))
    }

    pub fn execute<F>(&self, f: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.enqueue(Task::from_fn(f))
    }

    pub fn submit_with_handle<T, F>(&self, f: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        submit_with_handle(&self.shared, f)
    }

    /// Number of workers currently running a task.
    pub fn busy_count(&self) -> usize {
        self.shared.busy_count()
    }

    /// Number of live worker threads.
    pub fn live_count(&self) -> usize {
        self.shared.live_count()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.shared.metrics()
    }

    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }

    /// A cloneable producer handle. It stays usable after the pool is
    /// destroyed; submissions then fail with [`SubmitError::Rejected`].
    pub fn submitter(&self) -> Submitter {
        Submitter {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Stop accepting work and wake everyone, without waiting.
    ///
    /// Tasks already running finish; queued tasks are never started.
    pub fn shutdown(&self) {
        if self.shared.begin_shutdown() {
            debug!("thread pool shutdown requested");
        }
        // A full channel means the manager was already told.
        if let Some(stop) = &self.stop_manager {
            let _ = stop.try_send(());
        }
    }

    /// Shut down, join the manager and every worker, then release the queue
    /// and registry. Queued tasks that never started are dropped here.
    pub fn destroy(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        if self.destroyed {
            return;
        }
        self.destroyed = true;

        self.shutdown();
        self.stop_manager.take();

        if let Some(manager) = self.manager.take() {
            if manager.join().is_err() {
                error!("manager thread panicked");
            }
        }

        // The manager was the only thread spawning workers, so this is
        // every worker that was ever started and not yet joined.
        let workers = self.shared.take_worker_handles();
        let joined = workers.len();
        for handle in workers {
            if handle.join().is_err() {
                error!("worker thread panicked");
            }
        }

        let dropped = self.shared.drain_queue();
        info!(joined, dropped_tasks = dropped.len(), "thread pool destroyed");
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.teardown();
    }
}


/// Producer side of a [`ThreadPool`], shareable across threads.
#[derive(Clone)]
pub struct Submitter {
    shared: Arc<Shared>,
}

impl Submitter {
    pub fn submit<A>(&self, entry: fn(&mut A), arg: A) -> Result<(), SubmitError>
    where
        A: Send + 'static,
    {
        self.shared.enqueue(Task::new(entry, arg))
    }

    pub fn execute<F>(&self, f: F) -> Result<(), SubmitError>
    where
        F: FnOnce() + Send + 'static,
    {
        self.shared.enqueue(Task::from_fn(f))
    }

    pub fn submit_with_handle<T, F>(&self, f: F) -> JoinHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        submit_with_handle(&self.shared, f)
    }

    pub fn busy_count(&self) -> usize {
        self.shared.busy_count()
    }

    pub fn live_count(&self) -> usize {
        self.shared.live_count()
    }

    pub fn metrics(&self) -> PoolMetrics {
        self.shared.metrics()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.is_shutdown()
    }
}

fn submit_with_handle<T, F>(shared: &Shared, f: F) -> JoinHandle<T>
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (task, handle) = handle::task_with_handle(f);
    match shared.enqueue(task) {
        Ok(()) => handle,
        Err(SubmitError::Rejected) => JoinHandle::failed(SpawnError::Rejected),
    }
}
