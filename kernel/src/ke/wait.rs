//! Wait-object binding
//!
//! The full Nostalgia OS wait layer supports waiting on up to
//! `MAXIMUM_WAIT_OBJECTS` dispatcher objects at once (`WaitAny`/
//! `WaitAll`), timeouts via `KTimer`, and per-object-type signal
//! consumption for events, semaphores, timers, and mutexes. KMUTEX
//! only ever needs single-object, untimed waits, so this module keeps
//! just the binding contract: attach a thread to the object it is
//! blocking on, insert it into that object's wait-list, and later
//! detach it. The mutex itself drives the actual blocking
//! (`scheduler::ki_dispatch_next`) and wakeup
//! (`scheduler::ki_ready_thread`) around these two calls.

use super::list::ListEntry;
use super::thread::{KThread, ThreadState};

/// Reason a thread is on a wait-list.
///
/// Only one reason exists in this crate: waiting on a KMUTEX. A full
/// kernel would also have `KEVENT`, `KSEMAPHORE`, `KTIMER`, etc.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WaitReason {
    KMutex = 0,
}

/// Bind `thread` to `object` for `reason`, and insert it at the tail
/// of `list` (the object's wait-list head).
///
/// Marks the thread `Waiting`. Does not touch the ready queue or the
/// processor's current-thread pointer — the caller (KMUTEX) is
/// responsible for dispatching away from the now-blocked thread.
///
/// # Safety
/// - `thread` must point to a live `KThread` not already linked into
///   any list.
/// - `list` must point to an initialized list head.
/// - `object` must outlive the wait.
pub unsafe fn set_wait(thread: *mut KThread, reason: WaitReason, object: *mut (), list: *mut ListEntry) {
    (*thread).wait_reason.set(Some(reason));
    (*thread).wait_object.set(object);
    (*thread).state.set(ThreadState::Waiting);
    let entry = &(*thread).wait_list_entry as *const ListEntry as *mut ListEntry;
    (*list).insert_tail(entry);
}

/// Detach `thread` from whatever wait-list it is on and clear its
/// wait-reason/wait-object. Does not change its scheduling state —
/// the caller sets that (typically `Ready`, via
/// `scheduler::ki_ready_thread`).
///
/// # Safety
/// `thread` must currently be linked into a wait-list (i.e. it was
/// previously passed to [`set_wait`] and has not yet been woken).
pub unsafe fn reset_wait(thread: *mut KThread) {
    let entry = &(*thread).wait_list_entry as *const ListEntry as *mut ListEntry;
    (*entry).remove_entry();
    (*thread).wait_reason.set(None);
    (*thread).wait_object.set(core::ptr::null_mut());
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::guard;

    #[test]
    fn set_wait_links_thread_and_reset_wait_unlinks_it() {
        let _g = guard();

        let mut head = ListEntry::new();
        unsafe { head.init_head() };

        let thread = KThread::new(7);
        let marker: u32 = 0;
        let object = &marker as *const u32 as *mut ();

        unsafe {
            set_wait(&thread as *const _ as *mut _, WaitReason::KMutex, object, &mut head);
        }

        assert_eq!(thread.state(), ThreadState::Waiting);
        assert_eq!(thread.wait_reason.get(), Some(WaitReason::KMutex));
        assert_eq!(thread.wait_object.get(), object);
        assert!(!head.is_empty());

        unsafe { reset_wait(&thread as *const _ as *mut _) };

        assert!(thread.wait_reason.get().is_none());
        assert!(thread.wait_object.get().is_null());
        assert!(head.is_empty());
    }
}
