//! Worker threads.
//!
//! A worker blocks on the queue, runs what it gets and loops. It leaves the
//! loop when the manager has asked for exits and the pool is above its
//! minimum, or when the pool shuts down.

use super::{
    model::{Counters, Task},
    pool::{Dequeued, PoolState, Shared},
    registry::WorkerId,
};
use std::{
    any::Any,
    io,
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread,
};
use tracing::{debug, error, trace};


/// Start one worker in the first empty registry slot and count it live.
///
/// Must be called with the pool lock held (`state` is the guarded state).
/// The new thread blocks on that lock until the caller releases it, so it
/// can never observe a registry that does not contain it yet.
/// Returns `Ok(None)` when every slot is taken.
pub(crate) fn spawn(shared: &Arc<Shared>, state: &mut PoolState) -> io::Result<Option<WorkerId>> {
    let Some(index) = state.registry.first_empty() else {
        return Ok(None);
    };
    let id = shared.next_worker_id();
    let worker_shared = Arc::clone(shared);

    let handle = thread::Builder::new()
        .name(format!("{}-{}", shared.config.thread_name, id.as_u64()))
        .spawn(move || run(worker_shared, id))?;

    state.registry.occupy(index, id, handle);
    state.live_workers += 1;
    debug!(worker = %id, slot = index, live = state.live_workers, "worker spawned");
    Ok(Some(id))
}

fn run(shared: Arc<Shared>, id: WorkerId) {
    loop {
        match shared.dequeue(id) {
            Dequeued::Task(task) => execute(&shared, id, task),
            Dequeued::Exit => {
                debug!(worker = %id, "worker retired by manager");
                return;
            }
            Dequeued::Shutdown => {
                trace!(worker = %id, "worker stopped by shutdown");
                return;
            }
        }
    }
}

fn execute(shared: &Shared, id: WorkerId, task: Task) {
    shared.adjust_busy(true);
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| task.run()));
    shared.adjust_busy(false);

    match outcome {
        Ok(()) => Counters::bump(&shared.counters.completed),
        Err(payload) => {
            Counters::bump(&shared.counters.panicked);
            error!(worker = %id, panic = %panic_message(payload.as_ref()), "task panicked");
        }
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
