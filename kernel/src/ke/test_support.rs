//! Test-only helpers shared by the `ke` unit tests.
//!
//! The scheduler, PRCB, and preemption gate are process-global
//! singletons (this is a single-CPU kernel, after all), so tests that
//! drive them must not run concurrently with each other. `cargo test`
//! runs `#[test]` functions on separate threads by default; `guard()`
//! serializes access to the shared kernel state for the duration of a
//! test.

#[cfg(test)]
use std::sync::{Mutex, MutexGuard, Once};

#[cfg(test)]
static SERIAL: Mutex<()> = Mutex::new(());

#[cfg(test)]
static LOG_INIT: Once = Once::new();

/// Acquire exclusive access to the process-global kernel state for a test.
///
/// If a previous test panicked while holding the lock, recover anyway:
/// one test's panic shouldn't poison the whole suite.
///
/// Also lazily installs `env_logger`, so `RUST_LOG=trace cargo test --
/// --nocapture` shows contention and handoff traces from `ke::mutex`.
#[cfg(test)]
pub(crate) fn guard() -> MutexGuard<'static, ()> {
    LOG_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
    SERIAL.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
