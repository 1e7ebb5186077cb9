//! Fixed-capacity ring buffer backing the pool's task queue.
//!
//! The queue itself does no locking or blocking; the pool keeps it inside
//! its state mutex and parks producers/consumers on condition variables.

pub struct TaskQueue<T> {
    buffer: Box<[Option<T>]>,
    size: usize,
    head: usize,
    tail: usize,
}

impl<T> TaskQueue<T> {
    /// # Panics
    ///
    /// Panics if `capacity` is zero. The pool validates its configuration
    /// before building a queue.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "task queue capacity must be non-zero");
        let buffer = (0..capacity).map(|_| None).collect::<Vec<_>>().into_boxed_slice();
        Self {
            buffer,
            size: 0,
            head: 0,
            tail: 0,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.size == self.capacity()
    }

    /// Write `item` at the tail. Hands it back when the queue is full.
    pub fn push(&mut self, item: T) -> Result<(), T> {
        if self.is_full() {
            return Err(item);
        }
        debug_assert!(self.buffer[self.tail].is_none());
        self.buffer[self.tail] = Some(item);
        self.tail = (self.tail + 1) % self.capacity();
        self.size += 1;
        Ok(())
    }

    /// Take the item at the head, if any.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }
        let item = self.buffer[self.head].take();
        debug_assert!(item.is_some());
        self.head = (self.head + 1) % self.capacity();
        self.size -= 1;
        item
    }

    /// Take every queued item out, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        let mut items = Vec::with_capacity(self.size);
        while let Some(item) = self.pop() {
            items.push(item);
        }
        items
    }
}
