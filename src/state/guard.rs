// Instrumented mutual-exclusion guard
//
// A tokio Mutex that also counts how many callers currently believe they hold it.
// With a correct mutex that number never exceeds one; the peak is kept so tests and
// the end-of-run summary can check it.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use tokio::sync::{Mutex, MutexGuard};

/// Mutex with holder accounting.
#[derive(Debug)]
pub struct TrackedMutex<T> {
    name: &'static str,
    inner: Mutex<T>,
    holders: AtomicUsize,
    peak_holders: AtomicUsize,
    acquisitions: AtomicU64,
}

impl<T> TrackedMutex<T> {
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            inner: Mutex::new(value),
            holders: AtomicUsize::new(0),
            peak_holders: AtomicUsize::new(0),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Wait until the guard is free and take it. No timeout.
    pub async fn lock(&self) -> TrackedGuard<'_, T> {
        let guard = self.inner.lock().await;
        let now_holding = self.holders.fetch_add(1, Ordering::AcqRel) + 1;
        self.peak_holders.fetch_max(now_holding, Ordering::AcqRel);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(guard = self.name, "acquired");
        TrackedGuard {
            owner: self,
            guard,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Highest number of simultaneous holders ever observed
    pub fn peak_holders(&self) -> usize {
        self.peak_holders.load(Ordering::Acquire)
    }

    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}

/// Held guard; releases and updates the holder count on drop.
pub struct TrackedGuard<'a, T> {
    owner: &'a TrackedMutex<T>,
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for TrackedGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for TrackedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for TrackedGuard<'_, T> {
    fn drop(&mut self) {
        // Runs before the inner MutexGuard field is dropped, so the count is
        // decremented while the lock is still held.
        self.owner.holders.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(guard = self.owner.name, "released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_lock_and_mutate() {
        let mutex = TrackedMutex::new("test", 0u32);
        tokio_test::block_on(async {
            *mutex.lock().await += 5;
            assert_eq!(*mutex.lock().await, 5);
        });
        assert_eq!(mutex.acquisitions(), 2);
        assert_eq!(mutex.peak_holders(), 1);
        assert_eq!(mutex.into_inner(), 5);
    }

    #[test]
    fn test_name() {
        let mutex = TrackedMutex::new("rubric_guard", ());
        assert_eq!(mutex.name(), "rubric_guard");
        assert_eq!(mutex.peak_holders(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_contended_lock_never_overlaps() {
        let mutex = Arc::new(TrackedMutex::new("contended", Vec::new()));
        let mut tasks = Vec::new();

        for worker in 0..8 {
            let mutex = mutex.clone();
            tasks.push(tokio::spawn(async move {
                for step in 0..20 {
                    let mut guard = mutex.lock().await;
                    guard.push((worker, step));
                    tokio::time::sleep(Duration::from_micros(50)).await;
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(mutex.peak_holders(), 1);
        assert_eq!(mutex.acquisitions(), 160);
        assert_eq!(mutex.lock().await.len(), 160);
    }
}
