//! Runtime-agnostic pieces of the Phoenix socket: ref allocation and
//! pending-reply tracking.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ports::outbound::PushResult;

pub type PendingCallback = Box<dyn FnOnce(PushResult) + Send + 'static>;

/// Lock a std mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Monotonic message refs, rendered as decimal strings starting at "1".
#[derive(Debug, Default)]
pub struct RefCounter {
    last: AtomicU64,
}

impl RefCounter {
    pub fn next(&self) -> String {
        (self.last.fetch_add(1, Ordering::Relaxed) + 1).to_string()
    }
}

/// Tracks reply callbacks keyed by message ref.
#[derive(Default)]
pub struct PendingReplies {
    inner: HashMap<String, PendingCallback>,
}

impl PendingReplies {
    pub fn insert(&mut self, msg_ref: String, callback: PendingCallback) {
        self.inner.insert(msg_ref, callback);
    }

    /// Remove the callback for `msg_ref` so it can be invoked outside the lock.
    pub fn take(&mut self, msg_ref: &str) -> Option<PendingCallback> {
        self.inner.remove(msg_ref)
    }

    /// Remove every pending callback.
    pub fn drain(&mut self) -> Vec<PendingCallback> {
        self.inner.drain().map(|(_, callback)| callback).collect()
    }
}
