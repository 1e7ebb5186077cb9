use super::{
    errors::SpawnError,
    model::Task,
    worker::panic_message,
};
use std::{
    future::Future,
    panic::{self, AssertUnwindSafe},
    pin::Pin,
    task::{Context, Poll},
};
use tokio::{
    sync::oneshot,
    time::Duration,
};


pub type SpawnResult<T> = Result<T, SpawnError>;


/// Handle на результат задачи, отправленной в пул
///
/// Awaitable from async code, or [`JoinHandle::join`] from a plain thread.
pub struct JoinHandle<T> {
    receiver: oneshot::Receiver<SpawnResult<T>>,
}

impl<T> JoinHandle<T> {
    pub(crate) fn new(receiver: oneshot::Receiver<SpawnResult<T>>) -> Self {
        Self { receiver }
    }

    /// A handle that resolves to `err` immediately.
    pub(crate) fn failed(err: SpawnError) -> Self {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Err(err));
        Self::new(rx)
    }

    /// Block the current thread until the task finishes.
    ///
    /// # Panics
    ///
    /// Panics when called from inside an async runtime; `.await` the handle
    /// there instead.
    pub fn join(self) -> SpawnResult<T> {
        self.receiver
            .blocking_recv()
            .unwrap_or(Err(SpawnError::ChannelClosed))
    }

    /// Non-blocking poll for the result. `None` while the task is pending.
    pub fn try_result(&mut self) -> Option<SpawnResult<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(oneshot::error::TryRecvError::Empty) => None,
            Err(oneshot::error::TryRecvError::Closed) => Some(Err(SpawnError::ChannelClosed)),
        }
    }

    pub async fn await_timeout(self, timeout: Duration) -> SpawnResult<T> {
        match tokio::time::timeout(timeout, self.receiver).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(SpawnError::ChannelClosed),
            Err(_) => Err(SpawnError::Timeout),
        }
    }
}

impl<T> Future for JoinHandle<T> {
    type Output = SpawnResult<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match Pin::new(&mut this.receiver).poll(cx) {
            Poll::Ready(res) => Poll::Ready(res.unwrap_or(Err(SpawnError::ChannelClosed))),
            Poll::Pending => Poll::Pending,
        }
    }
}


/// Wrap `f` into a task that reports its outcome through a [`JoinHandle`].
///
/// A panic is reported to the handle first and then resumed, so the worker
/// still logs and counts it.
pub(crate) fn task_with_handle<T, F>(f: F) -> (Task, JoinHandle<T>)
where
    T: Send + 'static,
    F: FnOnce() -> T + Send + 'static,
{
    let (tx, rx) = oneshot::channel::<SpawnResult<T>>();

    let task = Task::from_fn(move || {
        match panic::catch_unwind(AssertUnwindSafe(f)) {
            Ok(value) => {
                let _ = tx.send(Ok(value));
            }
            Err(payload) => {
                let _ = tx.send(Err(SpawnError::Panic(panic_message(payload.as_ref()))));
                panic::resume_unwind(payload);
            }
        }
    });

    (task, JoinHandle::new(rx))
}
