//! Poison-tolerant locking.
//!
//! Listener and task panics are caught at the delivery boundary, so a
//! poisoned lock only means a panic happened elsewhere while the guard was
//! held. Every critical section in this crate leaves its data consistent.

use std::sync::{Mutex, MutexGuard, PoisonError};

#[inline]
pub(crate) fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
