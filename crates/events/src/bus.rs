//! Publish/subscribe abstraction (mechanics only).
//!
//! The bus distributes accepted changes to every connected session. It is an
//! **advisory** channel: it drives UI refreshes in other sessions, it is never the
//! source of truth and never a consistency mechanism.
//!
//! - **Transport-agnostic**: in-memory channels here, a hosted change feed in production
//! - **At-least-once**: consumers must tolerate duplicates
//! - **No persistence**: the item store and activity log are authoritative

use std::sync::Arc;
use std::sync::mpsc::Receiver;
use std::time::Duration;

/// A subscription to a change stream.
///
/// Each subscription gets a copy of every message published after it was created
/// (broadcast semantics). Designed for single-threaded consumption.
///
/// ```ignore
/// let subscription = bus.subscribe();
///
/// loop {
///     match subscription.recv_timeout(Duration::from_secs(1)) {
///         Ok(change) => refresh(change),
///         Err(RecvTimeoutError::Timeout) => continue,
///         Err(RecvTimeoutError::Disconnected) => break,
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Block until the next message is available.
    pub fn recv(&self) -> Result<M, std::sync::mpsc::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, std::sync::mpsc::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Block for up to `timeout` waiting for a message.
    pub fn recv_timeout(&self, timeout: Duration) -> Result<M, std::sync::mpsc::RecvTimeoutError> {
        self.receiver.recv_timeout(timeout)
    }
}

/// Domain-agnostic pub/sub bus.
///
/// ```text
/// saveAdjustment → item store write → activity append → EventBus (publish) → other sessions
/// ```
///
/// Messages are published only **after** the write they describe has succeeded, so a
/// failed publish never hides a lost write; it only delays another session's refresh.
///
/// `publish()` can fail (e.g. lock poisoning, network error). The caller decides
/// whether that is worth surfacing; the write itself has already happened.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
