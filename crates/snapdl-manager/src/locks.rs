//! Mutex acquisition that survives poisoning.

use std::sync::{Mutex, MutexGuard};

/// Locks `mutex`, recovering the guard if a previous holder panicked.
///
/// Job records are only changed through methods that leave them consistent
/// at every step, so the data behind a poisoned lock is still usable.
pub(crate) fn lock_or_recover<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::error!(
                target: "snapdl::locks",
                "registry lock was poisoned by a panicking thread; recovering"
            );
            poisoned.into_inner()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_recovers_poisoned_mutex() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = Arc::clone(&mutex);
        let result = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(result.is_err());
        assert!(mutex.is_poisoned());

        *lock_or_recover(&mutex) += 1;
        assert_eq!(*lock_or_recover(&mutex), 2);
    }
}
