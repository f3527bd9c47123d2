/// Storage lock helpers to prevent worker thread blocking
use crate::storage::StorageBackend;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const STORAGE_LOCK_TRY_MS: u64 = 50;
const STORAGE_LOCK_SPIN_MS: u64 = 5;

#[derive(Debug)]
pub enum StorageLockError {
    Timeout,
    Other(String),
}

impl std::fmt::Display for StorageLockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageLockError::Timeout => write!(f, "Storage lock timeout"),
            StorageLockError::Other(s) => write!(f, "{}", s),
        }
    }
}

impl std::error::Error for StorageLockError {}

/// Safely acquire the storage lock with a timeout instead of blocking a
/// Tokio worker indefinitely. Generic over storage types that implement
/// StorageBackend.
pub fn with_storage<S, T, F>(
    storage: &Arc<Mutex<S>>,
    label: &str,
    f: F,
) -> Result<T, StorageLockError>
where
    S: StorageBackend,
    F: FnOnce(&S) -> Result<T, Box<dyn std::error::Error>>,
{
    let start = Instant::now();

    // Try quick lock first, then spin with small sleeps to avoid blocking Tokio worker
    for attempt in 0..(STORAGE_LOCK_TRY_MS / STORAGE_LOCK_SPIN_MS) {
        match storage.try_lock() {
            Ok(guard) => {
                let res = f(&guard);
                debug!(%label, total_ms = %(start.elapsed().as_millis()), "storage operation complete");
                return res.map_err(|e| StorageLockError::Other(e.to_string()));
            }
            Err(_) => {
                if attempt % 5 == 0 {
                    debug!(%label, attempt, "storage lock contention, retrying...");
                }
                std::thread::sleep(Duration::from_millis(STORAGE_LOCK_SPIN_MS));
            }
        }
    }

    let waited_ms = start.elapsed().as_millis();
    warn!(%label, waited_ms, "storage lock timeout - returning 503");
    Err(StorageLockError::Timeout)
}

/// Mutable twin of `with_storage` for handlers that write.
pub fn with_storage_mut<S, T, F>(
    storage: &Arc<Mutex<S>>,
    label: &str,
    f: F,
) -> Result<T, StorageLockError>
where
    S: StorageBackend,
    F: FnOnce(&mut S) -> Result<T, Box<dyn std::error::Error>>,
{
    let start = Instant::now();

    for attempt in 0..(STORAGE_LOCK_TRY_MS / STORAGE_LOCK_SPIN_MS) {
        match storage.try_lock() {
            Ok(mut guard) => {
                let res = f(&mut guard);
                debug!(%label, total_ms = %(start.elapsed().as_millis()), "storage operation complete (mut)");
                return res.map_err(|e| StorageLockError::Other(e.to_string()));
            }
            Err(_) => {
                if attempt % 5 == 0 {
                    debug!(%label, attempt, "storage lock contention (mut), retrying...");
                }
                std::thread::sleep(Duration::from_millis(STORAGE_LOCK_SPIN_MS));
            }
        }
    }

    let waited_ms = start.elapsed().as_millis();
    warn!(%label, waited_ms, "storage lock timeout (mut) - returning 503");
    Err(StorageLockError::Timeout)
}
