//! Single-slot handoff between the UI thread and the search worker.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

struct Slot<T> {
    pending: Option<T>,
    closed: bool,
}

/// Holds at most one pending item. A `put` replaces anything not yet
/// taken; `take` blocks until there is an item or the mailbox closes.
pub struct Mailbox<T> {
    slot: Mutex<Slot<T>>,
    ready: Condvar,
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(Slot {
                pending: None,
                closed: false,
            }),
            ready: Condvar::new(),
        }
    }

    /// Store `item`, never blocking on the consumer.
    ///
    /// Returns the unconsumed item it displaced, or `item` itself if the
    /// mailbox is already closed.
    pub fn put(&self, item: T) -> Option<T> {
        let mut slot = self.lock();
        if slot.closed {
            return Some(item);
        }
        let displaced = slot.pending.replace(item);
        drop(slot);
        self.ready.notify_one();
        displaced
    }

    /// Wait for the next item. `None` once the mailbox is closed; a
    /// pending item left at close time is discarded.
    pub fn take(&self) -> Option<T> {
        let mut slot = self.lock();
        loop {
            if slot.closed {
                return None;
            }
            if let Some(item) = slot.pending.take() {
                return Some(item);
            }
            slot = self.ready.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Close the mailbox and wake any waiting consumer.
    pub fn close(&self) {
        let mut slot = self.lock();
        slot.closed = true;
        slot.pending = None;
        drop(slot);
        self.ready.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// True if an item is waiting to be taken.
    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Slot<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn test_put_then_take() {
        let mb = Mailbox::new();
        assert_eq!(mb.put(1), None);
        assert!(mb.has_pending());
        assert_eq!(mb.take(), Some(1));
        assert!(!mb.has_pending());
    }

    #[test]
    fn test_newer_put_replaces_older() {
        let mb = Mailbox::new();
        assert_eq!(mb.put("a"), None);
        assert_eq!(mb.put("b"), Some("a"));
        assert_eq!(mb.put("c"), Some("b"));
        assert_eq!(mb.take(), Some("c"));
    }

    #[test]
    fn test_take_blocks_until_put() {
        let mb = Arc::new(Mailbox::new());
        let consumer = {
            let mb = Arc::clone(&mb);
            thread::spawn(move || mb.take())
        };
        thread::sleep(Duration::from_millis(20));
        mb.put(42);
        assert_eq!(consumer.join().unwrap(), Some(42));
    }

    #[test]
    fn test_close_wakes_consumer() {
        let mb: Arc<Mailbox<u32>> = Arc::new(Mailbox::new());
        let consumer = {
            let mb = Arc::clone(&mb);
            thread::spawn(move || mb.take())
        };
        thread::sleep(Duration::from_millis(20));
        mb.close();
        assert_eq!(consumer.join().unwrap(), None);
    }

    #[test]
    fn test_closed_mailbox_rejects_and_discards() {
        let mb = Mailbox::new();
        mb.put(1);
        mb.close();
        assert!(mb.is_closed());
        assert_eq!(mb.take(), None);
        assert_eq!(mb.put(2), Some(2));
        assert_eq!(mb.take(), None);
    }
}
