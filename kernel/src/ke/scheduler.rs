//! Single-CPU cooperative FIFO scheduler
//!
//! The full Nostalgia OS scheduler implements 32 priority levels,
//! quantum-based preemption, priority boost/decay, and real register
//! context switches. None of that is part of KMUTEX's contract — the
//! spec asks only for a minimal reference scheduler surface
//! (`current_task`, `yield`, ready/waiting transitions) sufficient to
//! exercise and test the mutex's blocking behavior. This module keeps
//! exactly that: one FIFO ready queue and cooperative dispatch.
//!
//! There is no real context switch here. "Switching" to a thread means
//! marking it `Running` and recording it as the PRCB's current thread;
//! the kernel is single-CPU and cooperative, so control simply returns
//! to whichever call site is now considered "the current thread" — in
//! this crate that's almost always test code acting on behalf of
//! several simulated tasks in turn.

use super::prcb::PrcbCell;
use super::thread::{KThread, ThreadState};

/// The task presently considered current, or null if none has run yet.
pub fn current_thread() -> *mut KThread {
    PrcbCell::get().current_thread()
}

/// Insert a thread into the ready queue.
///
/// # Safety
/// `thread` must point to a live `KThread` not already linked into
/// any list (ready queue or wait-list).
pub unsafe fn ki_ready_thread(thread: *mut KThread) {
    PrcbCell::get().enqueue_ready(thread);
}

/// Select and switch to the next ready thread, if any.
///
/// Called after the current thread has been moved off the processor
/// (blocked on a wait-object, or yielding). Returns the thread that is
/// now current, or null if the ready queue was empty.
///
/// # Safety
/// Must be called with the preemption gate held.
pub unsafe fn ki_dispatch_next() -> *mut KThread {
    let prcb = PrcbCell::get();
    let next = prcb.dequeue_ready();
    if !next.is_null() {
        (*next).set_state(ThreadState::Running);
    }
    prcb.set_current_thread(next);
    next
}

/// Voluntarily yield the processor.
///
/// The current thread (if any) goes back on the tail of the ready
/// queue and the next ready thread (which may be the same thread, if
/// it is the only one) becomes current.
///
/// # Safety
/// Must be called from thread context with the preemption gate
/// released — KMUTEX never calls this while holding the gate.
pub unsafe fn ki_yield() {
    let prcb = PrcbCell::get();
    let current = prcb.current_thread();
    if !current.is_null() {
        ki_ready_thread(current);
    }
    ki_dispatch_next();
}

#[cfg(test)]
pub(crate) unsafe fn reset_for_test() {
    PrcbCell::get().init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::guard;

    #[test]
    fn yield_rotates_ready_queue_fifo() {
        let _g = guard();
        unsafe { reset_for_test() };

        let a = KThread::new(1);
        let b = KThread::new(2);

        unsafe {
            ki_ready_thread(&a as *const _ as *mut _);
            ki_ready_thread(&b as *const _ as *mut _);

            let first = ki_dispatch_next();
            assert_eq!((*first).thread_id, 1);

            ki_yield();
            let second = current_thread();
            assert_eq!((*second).thread_id, 2);

            ki_yield();
            let third = current_thread();
            assert_eq!((*third).thread_id, 1);
        }
    }

    #[test]
    fn dispatch_next_returns_null_when_queue_empty() {
        let _g = guard();
        unsafe { reset_for_test() };
        unsafe {
            assert!(ki_dispatch_next().is_null());
        }
    }
}
