//! Bridges one-shot platform callbacks and platform events into async Rust.

use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task;

use async_broadcast::{InactiveReceiver, Receiver, Sender};
use async_lock::Mutex;
use futures_core::Stream;
use futures_lite::StreamExt;

/// Single-use completion cell shared between a waiting task and the
/// platform callbacks racing to finish it.
///
/// The first [`complete`](Completion::complete) wins; every later call
/// is a no-op. This is the guard that keeps result delivery exactly-once
/// when an update callback and a timeout fire near-simultaneously, no
/// matter which thread the platform dispatches the callback on.
pub struct Completion<T: Send + Clone> {
    done: AtomicBool,
    value: Mutex<Option<T>>,
    waker_tx: Sender<()>,
    #[allow(unused)]
    waker_keeper: InactiveReceiver<()>,
}

impl<T: Send + Clone> Completion<T> {
    /// Creates an open completion cell.
    pub fn new() -> Arc<Self> {
        let (tx, rx) = async_broadcast::broadcast(1);
        Arc::new(Self {
            done: AtomicBool::new(false),
            value: Mutex::new(None),
            waker_tx: tx,
            waker_keeper: rx.deactivate(),
        })
    }

    /// Completes the cell with `value` if it is still open. Returns
    /// whether this call was the one that completed it.
    pub fn complete(&self, value: T) -> bool {
        if self.done.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.value.lock_blocking().replace(value);
        let _ = self.waker_tx.broadcast_blocking(());
        true
    }

    /// Closes the cell without a value, so later `complete` calls are
    /// no-ops. Used to seal a request that was settled by other means
    /// (e.g. a timeout); a task already parked in [`wait`](Self::wait)
    /// will not be woken by this.
    pub fn close(&self) -> bool {
        !self.done.swap(true, Ordering::SeqCst)
    }

    pub fn is_complete(&self) -> bool {
        self.done.load(Ordering::SeqCst)
    }

    /// Waits until the cell is completed with a value and clones it out.
    pub async fn wait(&self) -> T {
        // The receiver must exist before the value check, otherwise a
        // completion between the check and `recv` would be missed.
        let mut waker_rx = self.waker_keeper.activate_cloned();
        loop {
            if let Some(value) = self.value.lock().await.as_ref() {
                return value.clone();
            }
            let _ = waker_rx.recv().await;
        }
    }
}

/// Fan-out of platform events (emergency triggers, status pushes) to
/// any number of application-side listeners.
///
/// Listeners that fall behind lose the oldest events rather than
/// blocking the platform callback that emits them.
pub struct Notifier<T: Send + Clone> {
    tx: Sender<T>,
    #[allow(unused)]
    keeper: InactiveReceiver<T>,
}

impl<T: Send + Clone> Notifier<T> {
    /// Creates a notifier buffering up to `capacity` events per listener.
    pub fn new(capacity: usize) -> Self {
        let (mut tx, rx) = async_broadcast::broadcast(capacity);
        tx.set_overflow(true);
        Self {
            tx,
            keeper: rx.deactivate(),
        }
    }

    /// Registers a new listener. Only events emitted after this call
    /// are observed.
    pub fn subscribe(&self) -> NotifierReceiver<T> {
        NotifierReceiver {
            rx: self.keeper.activate_cloned(),
        }
    }

    /// Delivers `value` to current listeners; with no listeners the
    /// event is dropped.
    pub fn notify(&self, value: T) {
        if self.tx.receiver_count() == 0 {
            return;
        }
        let _ = self.tx.try_broadcast(value);
    }

    pub fn has_listeners(&self) -> bool {
        self.tx.receiver_count() > 0
    }
}

/// Listener end of a [`Notifier`].
pub struct NotifierReceiver<T: Send + Clone> {
    rx: Receiver<T>,
}

impl<T: Send + Clone> NotifierReceiver<T> {
    /// Receives the next event; `None` once the notifier is gone.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.next().await
    }
}

impl<T: Send + Clone> Stream for NotifierReceiver<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> task::Poll<Option<T>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rx.size_hint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_lite::future::block_on;

    #[test]
    fn first_completion_wins() {
        let cell = Completion::new();
        assert!(cell.complete(1));
        assert!(!cell.complete(2));
        assert!(cell.is_complete());
        assert_eq!(block_on(cell.wait()), 1);
        // waiting again still yields the winning value
        assert_eq!(block_on(cell.wait()), 1);
    }

    #[test]
    fn close_seals_the_cell() {
        let cell = Completion::<u32>::new();
        assert!(cell.close());
        assert!(!cell.complete(7));
        assert!(!cell.close());
    }

    #[test]
    fn wait_observes_completion_from_another_thread() {
        let cell = Completion::new();
        let completer = Arc::clone(&cell);
        let handle = std::thread::spawn(move || {
            std::thread::sleep(std::time::Duration::from_millis(20));
            completer.complete(42u32)
        });
        assert_eq!(block_on(cell.wait()), 42);
        assert!(handle.join().unwrap());
    }

    #[test]
    fn notifier_fans_out_to_all_listeners() {
        let notifier = Notifier::new(4);
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();
        notifier.notify(5u8);
        assert_eq!(block_on(a.recv()), Some(5));
        assert_eq!(block_on(b.recv()), Some(5));
    }

    #[test]
    fn notify_without_listeners_is_a_noop() {
        let notifier = Notifier::new(1);
        assert!(!notifier.has_listeners());
        notifier.notify(1u8);
        // a listener registered afterwards sees only newer events
        let mut rx = notifier.subscribe();
        notifier.notify(2u8);
        assert_eq!(block_on(rx.recv()), Some(2));
    }
}
