//! Slot table of live worker threads.
//!
//! The registry has exactly `max_workers` slots. The manager looks for an
//! empty slot to place a new worker; an exiting worker clears the slot that
//! carries its own [`WorkerId`] and nothing else.

use std::{
    fmt,
    thread::JoinHandle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(u64);

impl WorkerId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "worker-{}", self.0)
    }
}

struct Slot {
    id: WorkerId,
    handle: JoinHandle<()>,
}

pub struct WorkerRegistry {
    slots: Box<[Option<Slot>]>,
    occupied: usize,
}

impl WorkerRegistry {
    pub fn new(max_workers: usize) -> Self {
        Self {
            slots: (0..max_workers).map(|_| None).collect::<Vec<_>>().into_boxed_slice(),
            occupied: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.occupied
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.occupied == 0
    }

    pub fn first_empty(&self) -> Option<usize> {
        self.slots.iter().position(Option::is_none)
    }

    /// Place a worker in slot `index`, which must be empty.
    pub fn occupy(&mut self, index: usize, id: WorkerId, handle: JoinHandle<()>) {
        let slot = &mut self.slots[index];
        debug_assert!(slot.is_none(), "slot {} already occupied", index);
        *slot = Some(Slot { id, handle });
        self.occupied += 1;
    }

    /// Clear the slot whose id equals `id` and hand back its join handle.
    ///
    /// Returns `None` and leaves every slot untouched when no slot matches.
    pub fn release(&mut self, id: WorkerId) -> Option<JoinHandle<()>> {
        let slot = self
            .slots
            .iter_mut()
            .find(|slot| matches!(slot, Some(s) if s.id == id))?;
        let released = slot.take()?;
        self.occupied -= 1;
        Some(released.handle)
    }

    pub fn contains(&self, id: WorkerId) -> bool {
        self.slots.iter().flatten().any(|slot| slot.id == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = WorkerId> + '_ {
        self.slots.iter().flatten().map(|slot| slot.id)
    }

    /// Empty every slot, returning the join handles that were held.
    pub fn drain(&mut self) -> Vec<JoinHandle<()>> {
        self.occupied = 0;
        self.slots
            .iter_mut()
            .filter_map(Option::take)
            .map(|slot| slot.handle)
            .collect()
    }
}
