//! The manager thread: every `monitor_interval` it compares backlog and
//! occupancy against the live worker count and grows or shrinks the pool.
//!
//! Growth: `queued > live && live < max`, up to `scaling_step` new workers.
//! Shrink: `busy * 2 < live && live > min`, asks up to `scaling_step` idle
//! workers to exit. Both are heuristics re-evaluated on every tick.

use super::{
    config::Config,
    pool::Shared,
    worker,
};
use crossbeam::channel::{self, Receiver};
use std::sync::Arc;
use tracing::{debug, trace, warn};


/// Counters sampled at the start of a tick. Queue and live are read under the
/// pool lock, busy under the busy lock, so the two halves may disagree briefly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSnapshot {
    pub queued_tasks: usize,
    pub live_workers: usize,
    pub busy_workers: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScalingPlan {
    /// Workers to spawn.
    pub grow: usize,
    /// Workers to ask to exit.
    pub shrink: usize,
}

impl ScalingPlan {
    pub fn for_load(load: LoadSnapshot, config: &Config) -> Self {
        let LoadSnapshot {
            queued_tasks,
            live_workers,
            busy_workers,
        } = load;

        let grow = if queued_tasks > live_workers && live_workers < config.max_workers {
            config.scaling_step.min(config.max_workers - live_workers)
        } else {
            0
        };

        let shrink = if busy_workers * 2 < live_workers && live_workers > config.min_workers {
            config.scaling_step.min(live_workers - config.min_workers)
        } else {
            0
        };

        Self { grow, shrink }
    }

    pub fn is_idle(&self) -> bool {
        self.grow == 0 && self.shrink == 0
    }
}


/// Run until `stop` is signalled or disconnected.
pub(crate) fn run(shared: Arc<Shared>, stop: Receiver<()>) {
    let ticker = channel::tick(shared.config.monitor_interval);
    debug!(interval = ?shared.config.monitor_interval, "manager started");

    loop {
        let stopped = channel::select! {
            recv(stop) -> _ => true,
            recv(ticker) -> _ => false,
        };
        if stopped || shared.is_shutdown() {
            break;
        }
        tick(&shared);
    }

    debug!("manager stopped");
}

fn tick(shared: &Arc<Shared>) {
    shared.reap_retired();

    let load = shared.load_snapshot();
    let plan = ScalingPlan::for_load(load, &shared.config);
    trace!(?load, ?plan, "manager tick");
    if plan.is_idle() {
        return;
    }

    let mut state = shared.lock_state();
    if state.shutdown {
        return;
    }

    let mut spawned = 0;
    while spawned < plan.grow && state.live_workers < shared.config.max_workers {
        match worker::spawn(shared, &mut state) {
            Ok(Some(_)) => spawned += 1,
            Ok(None) => break,
            Err(e) => {
                warn!(error = %e, live = state.live_workers, "failed to grow worker pool");
                break;
            }
        }
    }
    if spawned > 0 {
        debug!(spawned, live = state.live_workers, queued = load.queued_tasks, "pool grown");
    }

    if plan.shrink > 0 {
        let room = state.live_workers.saturating_sub(shared.config.min_workers);
        state.pending_exits = plan.shrink.min(room);
        if state.pending_exits > 0 {
            debug!(
                pending_exits = state.pending_exits,
                live = state.live_workers,
                busy = load.busy_workers,
                "asking idle workers to exit"
            );
            drop(state);
            // Every idle worker re-checks pending_exits on wake; only that many leave.
            shared.not_empty.notify_all();
        }
    }
}
