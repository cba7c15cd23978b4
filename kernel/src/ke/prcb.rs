//! Kernel Processor Control Block (KPRCB), trimmed to one CPU.
//!
//! The full Nostalgia OS KPRCB carries 32 priority-indexed ready
//! queues, a ready-summary bitmap for O(1) highest-priority lookup,
//! an idle thread, DPC queue, and quantum/context-switch accounting.
//! This crate targets a single-CPU cooperative kernel with no
//! priority scheduling, so `PrcbCell` keeps only what that needs: the
//! currently running task and one FIFO ready queue.

use super::list::ListEntry;
use super::thread::{KThread, ThreadState};
use core::cell::{Cell, UnsafeCell};
use core::ptr;
use crate::containing_record;

/// Single-processor control block: current task plus a FIFO ready queue.
pub struct PrcbCell {
    /// The task presently `Running` on the processor, or null before
    /// the scheduler has been seeded with an initial task.
    current_thread: Cell<*mut KThread>,
    /// List head for the FIFO ready queue. Threads link in via their
    /// own `wait_list_entry`.
    ready_queue: UnsafeCell<ListEntry>,
}

// Safety: single-CPU cooperative kernel; all access happens with the
// preemption gate held or during test setup on one thread.
unsafe impl Sync for PrcbCell {}

impl PrcbCell {
    pub const fn new() -> Self {
        Self {
            current_thread: Cell::new(ptr::null_mut()),
            ready_queue: UnsafeCell::new(ListEntry::new()),
        }
    }

    /// The processor's single control block.
    pub fn get() -> &'static PrcbCell {
        &PRCB
    }

    pub fn current_thread(&self) -> *mut KThread {
        self.current_thread.get()
    }

    pub fn set_current_thread(&self, thread: *mut KThread) {
        self.current_thread.set(thread);
    }

    /// Initialize the ready-queue list head. Must be called once
    /// before any `enqueue_ready`/`dequeue_ready` call; tests call it
    /// via [`super::scheduler::reset_for_test`].
    ///
    /// # Safety
    /// Must not run concurrently with any other ready-queue access.
    pub unsafe fn init(&self) {
        (*self.ready_queue.get()).init_head();
        self.current_thread.set(ptr::null_mut());
    }

    /// Append a thread to the tail of the ready queue and mark it `Ready`.
    ///
    /// # Safety
    /// `thread` must point to a live `KThread` not already linked into
    /// any list.
    pub unsafe fn enqueue_ready(&self, thread: *mut KThread) {
        (*thread).set_state(ThreadState::Ready);
        let entry = &(*thread).wait_list_entry as *const ListEntry as *mut ListEntry;
        (*self.ready_queue.get()).insert_tail(entry);
    }

    /// Remove and return the head of the ready queue, if any.
    ///
    /// # Safety
    /// Caller must not hold a conflicting alias to the returned
    /// thread's `wait_list_entry`.
    pub unsafe fn dequeue_ready(&self) -> *mut KThread {
        let head = self.ready_queue.get();
        if (*head).is_empty() {
            return ptr::null_mut();
        }
        let entry = (*head).remove_head();
        containing_record!(entry, KThread, wait_list_entry)
    }

    pub fn ready_queue_is_empty(&self) -> bool {
        unsafe { (*self.ready_queue.get()).is_empty() }
    }
}

static PRCB: PrcbCell = PrcbCell::new();

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::test_support::guard;

    #[test]
    fn fifo_ready_queue_orders_by_arrival() {
        let _g = guard();
        let prcb = PrcbCell::new();
        unsafe { prcb.init() };

        let a = KThread::new(1);
        let b = KThread::new(2);
        let c = KThread::new(3);

        unsafe {
            prcb.enqueue_ready(&a as *const _ as *mut _);
            prcb.enqueue_ready(&b as *const _ as *mut _);
            prcb.enqueue_ready(&c as *const _ as *mut _);

            assert_eq!((*prcb.dequeue_ready()).thread_id, 1);
            assert_eq!((*prcb.dequeue_ready()).thread_id, 2);
            assert_eq!((*prcb.dequeue_ready()).thread_id, 3);
            assert!(prcb.dequeue_ready().is_null());
        }
    }
}
