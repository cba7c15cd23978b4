//! Kernel Thread (KTHREAD) implementation
//!
//! The full Nostalgia OS KTHREAD also carries priority/quantum fields,
//! a saved register context, APC queues, and a process backlink; none
//! of that belongs to KMUTEX's contract, so this trimmed KTHREAD keeps
//! only what the mutex, the wait-object layer, and the cooperative
//! scheduler need: a state, an identity, and a single intrusive list
//! entry used for *either* ready-queue membership *or* wait-list
//! membership (never both — a task sits in at most one such list).

use super::list::ListEntry;
use super::wait::WaitReason;
use core::cell::Cell;
use core::ptr;

/// Thread states relevant to KMUTEX: RUNNABLE, RUNNING, SLEEPING.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ThreadState {
    /// In the ready queue, waiting for the processor.
    Ready = 0,
    /// Currently executing on the (single) processor.
    Running = 1,
    /// Blocked on a wait-object; not in the ready queue.
    Waiting = 2,
}

/// Kernel Thread structure, trimmed to KMUTEX's needs.
#[repr(C)]
pub struct KThread {
    /// Current scheduling state.
    pub state: Cell<ThreadState>,

    /// Entry in the ready queue (while `Ready`/`Running`) or in a
    /// mutex's wait-list (while `Waiting`). A task is a member of at
    /// most one such list at a time.
    pub wait_list_entry: ListEntry,

    /// Set by [`super::wait::set_wait`], cleared by
    /// [`super::wait::reset_wait`]. Only meaningful while `Waiting`.
    pub wait_reason: Cell<Option<WaitReason>>,

    /// The object a `Waiting` thread is blocked on: a `*mut KMutex` in
    /// this crate, stored type-erased to avoid a dependency cycle on
    /// `mutex`. `KMutex` casts it back when it needs to.
    pub wait_object: Cell<*mut ()>,

    /// Stable identity used only for debugging/logging and to let
    /// tests tell tasks apart.
    pub thread_id: u32,
}

// Safety: this kernel is single-CPU and cooperative; every mutation
// of a `KThread` happens with the preemption gate held.
unsafe impl Sync for KThread {}

impl KThread {
    /// Create a new, ready-but-not-enqueued thread.
    pub const fn new(thread_id: u32) -> Self {
        Self {
            state: Cell::new(ThreadState::Ready),
            wait_list_entry: ListEntry::new(),
            wait_reason: Cell::new(None),
            wait_object: Cell::new(ptr::null_mut()),
            thread_id,
        }
    }

    #[inline]
    pub fn state(&self) -> ThreadState {
        self.state.get()
    }

    #[inline]
    pub fn set_state(&self, state: ThreadState) {
        self.state.set(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_thread_starts_ready_and_unbound() {
        let t = KThread::new(1);
        assert_eq!(t.state(), ThreadState::Ready);
        assert!(t.wait_reason.get().is_none());
        assert!(t.wait_object.get().is_null());
    }
}
