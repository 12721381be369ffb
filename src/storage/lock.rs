//! Lock acquisition with poison recovery.
//!
//! If a lock is poisoned (a panic in a previous critical section), the inner
//! value is recovered and a warning logged. Writers only publish state after
//! a successful commit, so the protected data stays consistent.

use std::sync::{Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Acquires a mutex, recovering from poison.
pub fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite mutex was poisoned, recovering");
            metrics::counter!("storage_lock_poison_recovery_total", "lock" => "mutex").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Acquires a read lock, recovering from poison.
pub fn acquire_read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    match lock.read() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Vector cache lock was poisoned, recovering");
            metrics::counter!("storage_lock_poison_recovery_total", "lock" => "read").increment(1);
            poisoned.into_inner()
        },
    }
}

/// Acquires a write lock, recovering from poison.
pub fn acquire_write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    match lock.write() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("Vector cache lock was poisoned, recovering");
            metrics::counter!("storage_lock_poison_recovery_total", "lock" => "write").increment(1);
            poisoned.into_inner()
        },
    }
}
