//! Kernel Mutex Implementation (KMUTEX)
//!
//! A mutex provides mutual exclusion with the ability to block
//! waiting threads. Unlike a spinlock, it lets the blocked thread
//! leave the processor entirely rather than busy-wait.
//!
//! Features:
//! - Optionally recursive locking (`MutexFlags::RECURSIVE`), tracked
//!   by `lock_count`
//! - Direct ownership handoff to the head of the FIFO wait-list on
//!   release — no signal-and-race, so there is no thundering herd and
//!   no starvation
//!
//! This crate does not perform a real context switch (see the crate
//! root docs): `lock`'s contended path updates the wait-list and
//! scheduler bookkeeping and hands the processor to the next ready
//! task, but resuming the blocked caller's own stack with ownership
//! already transferred is the surrounding kernel's job.
//!
//! # Usage
//! ```
//! use kernel::ke::mutex::{KMutex, MutexFlags};
//! use kernel::ke::prcb::PrcbCell;
//! use kernel::ke::thread::KThread;
//!
//! // A real kernel already has a current task by the time any code
//! // calls into KMUTEX; a doctest has to seed one by hand.
//! let this_task = KThread::new(0);
//! PrcbCell::get().set_current_thread(&this_task as *const KThread as *mut KThread);
//!
//! static MUTEX: KMutex = KMutex::new();
//! MUTEX.init(MutexFlags::empty());
//!
//! MUTEX.lock();
//! // ... critical section ...
//! MUTEX.unlock();
//! ```

use super::irql::{not_in_irq_handler, PreemptionGate};
use super::list::ListEntry;
use super::scheduler;
use super::thread::KThread;
use super::wait::{reset_wait, set_wait, WaitReason};
use crate::containing_record;
use core::cell::UnsafeCell;
use core::ptr;
use log::{debug, trace};

bitflags::bitflags! {
    /// Mutex configuration flags, set at [`KMutex::init`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct MutexFlags: u32 {
        /// The owning task may lock the mutex again without deadlocking.
        /// Each extra lock must be matched by an extra unlock.
        const RECURSIVE = 0b0000_0001;
    }
}

/// Kernel Mutex. Equivalent to NT's KMUTEX/KMUTANT, trimmed to this
/// kernel's single-CPU cooperative model.
#[repr(C)]
pub struct KMutex {
    /// Owning task, or null if unlocked.
    owner: UnsafeCell<*mut KThread>,
    /// Configuration flags fixed at `init` time.
    flags: UnsafeCell<MutexFlags>,
    /// Number of outstanding locks held by `owner` (0 when unlocked).
    lock_count: UnsafeCell<u32>,
    /// FIFO queue of tasks blocked on this mutex.
    wait_list: UnsafeCell<ListEntry>,
}

// Safety: every operation enters the preemption gate before touching
// these cells, and this kernel is single-CPU, so there is never
// concurrent real access — only cooperative reentrancy, which the
// gate and the ownership checks rule out.
unsafe impl Sync for KMutex {}
unsafe impl Send for KMutex {}

impl KMutex {
    /// Construct an unlocked, uninitialized mutex. Call [`init`](Self::init)
    /// before first use.
    pub const fn new() -> Self {
        Self {
            owner: UnsafeCell::new(ptr::null_mut()),
            flags: UnsafeCell::new(MutexFlags::empty()),
            lock_count: UnsafeCell::new(0),
            wait_list: UnsafeCell::new(ListEntry::new()),
        }
    }

    /// Initialize (or reinitialize) the mutex. Must be called before
    /// first use and must not be called while the mutex is in use.
    ///
    /// # Panics
    /// In debug builds, asserts the caller is not in interrupt context
    /// and that `flags` sets no bit outside the recognized set
    /// (currently just `RECURSIVE`).
    pub fn init(&self, flags: MutexFlags) {
        debug_assert!(
            not_in_irq_handler(),
            "KMutex::init: must not be called from interrupt context"
        );
        debug_assert_eq!(
            flags.bits() & !MutexFlags::all().bits(),
            0,
            "KMutex::init: reserved flag bits set"
        );
        unsafe {
            *self.owner.get() = ptr::null_mut();
            *self.flags.get() = flags;
            *self.lock_count.get() = 0;
            (*self.wait_list.get()).init_head();
        }
    }

    /// Tear down the mutex.
    ///
    /// Clears `flags` and un-initializes the wait-list head (rather
    /// than leaving it as a valid empty list), so a destroyed mutex is
    /// left structurally distinct from a freshly-`init`'d one and any
    /// subsequent use without a matching `init` is detectable.
    ///
    /// # Panics
    /// Asserts the mutex is unlocked and has no waiters — destroying a
    /// live mutex is a fatal contract violation, not a recoverable error.
    pub fn destroy(&self) {
        assert!(
            not_in_irq_handler(),
            "KMutex::destroy: must not be called from interrupt context"
        );
        let _gate = PreemptionGate::disable();
        assert!(!self.is_held(), "KMutex::destroy: mutex is still held");
        assert!(
            unsafe { (*self.wait_list.get()).is_empty() },
            "KMutex::destroy: mutex still has waiters"
        );
        unsafe {
            *self.owner.get() = ptr::null_mut();
            *self.flags.get() = MutexFlags::empty();
            *self.lock_count.get() = 0;
            (*self.wait_list.get()).flink = ptr::null_mut();
            (*self.wait_list.get()).blink = ptr::null_mut();
        }
    }

    /// The owning task, or null if the mutex is unlocked.
    #[inline]
    pub fn owner(&self) -> *mut KThread {
        unsafe { *self.owner.get() }
    }

    #[inline]
    fn flags(&self) -> MutexFlags {
        unsafe { *self.flags.get() }
    }

    #[inline]
    fn lock_count(&self) -> u32 {
        unsafe { *self.lock_count.get() }
    }

    /// True if some task currently owns the mutex.
    #[inline]
    pub fn is_held(&self) -> bool {
        !self.owner().is_null()
    }

    /// True if the calling task owns the mutex.
    #[inline]
    pub fn is_held_by_current(&self) -> bool {
        let current = scheduler::current_thread();
        !current.is_null() && self.owner() == current
    }

    /// Acquire the mutex, blocking the calling task if it is held by
    /// another task.
    ///
    /// # Panics
    /// - If called from interrupt context.
    /// - If the calling task already owns the mutex and
    ///   `MutexFlags::RECURSIVE` was not set at `init` — this is a
    ///   self-deadlock and reported as a fatal contract violation
    ///   rather than silently hanging.
    pub fn lock(&self) {
        assert!(
            not_in_irq_handler(),
            "KMutex::lock: must not be called from interrupt context"
        );
        let gate = PreemptionGate::disable();
        let current = scheduler::current_thread();
        assert!(!current.is_null(), "KMutex::lock: no current task");

        if self.owner() == current {
            assert!(
                self.flags().contains(MutexFlags::RECURSIVE),
                "KMutex::lock: self-deadlock — mutex is not recursive"
            );
            unsafe { *self.lock_count.get() += 1 };
            return;
        }

        if !self.is_held() {
            unsafe {
                *self.owner.get() = current;
                *self.lock_count.get() = 1;
            }
            return;
        }

        trace!(
            "KMutex {:p}: contended, task {:p} joining wait-list",
            self,
            current
        );
        unsafe {
            set_wait(
                current,
                WaitReason::KMutex,
                self as *const KMutex as *mut (),
                self.wait_list.get(),
            );
        }
        // Release the gate before handing the processor to another
        // task: the gate guards this mutex's bookkeeping, not the
        // scheduler's.
        drop(gate);
        unsafe { scheduler::ki_dispatch_next() };
    }

    /// Acquire the mutex without blocking.
    ///
    /// Returns `true` in exactly two cases: the mutex was unheld, or it
    /// is recursive and already held by the calling task. Otherwise
    /// returns `false` without touching any state — including a
    /// non-recursive mutex already held by the caller, which `lock`
    /// would treat as a fatal self-deadlock but `try_lock` simply
    /// reports as unavailable.
    pub fn try_lock(&self) -> bool {
        assert!(
            not_in_irq_handler(),
            "KMutex::try_lock: must not be called from interrupt context"
        );
        let _gate = PreemptionGate::disable();
        let current = scheduler::current_thread();
        assert!(!current.is_null(), "KMutex::try_lock: no current task");

        if self.owner() == current && self.flags().contains(MutexFlags::RECURSIVE) {
            unsafe { *self.lock_count.get() += 1 };
            return true;
        }

        if !self.is_held() {
            unsafe {
                *self.owner.get() = current;
                *self.lock_count.get() = 1;
            }
            true
        } else {
            false
        }
    }

    /// Release one level of ownership.
    ///
    /// When the recursion count reaches zero, ownership transfers
    /// directly to the task at the head of the wait-list (if any);
    /// otherwise the mutex becomes unlocked.
    ///
    /// # Panics
    /// - If called from interrupt context.
    /// - If the calling task does not own the mutex.
    pub fn unlock(&self) {
        assert!(
            not_in_irq_handler(),
            "KMutex::unlock: must not be called from interrupt context"
        );
        let _gate = PreemptionGate::disable();
        let current = scheduler::current_thread();
        assert_eq!(
            self.owner(),
            current,
            "KMutex::unlock: called by a non-owner task"
        );

        let count = self.lock_count();
        assert!(count > 0, "KMutex::unlock: recursion underflow");
        let remaining = count - 1;
        unsafe { *self.lock_count.get() = remaining };
        if remaining > 0 {
            return;
        }

        unsafe { *self.owner.get() = ptr::null_mut() };

        if unsafe { !(*self.wait_list.get()).is_empty() } {
            unsafe { self.wake_one_waiter() };
        } else {
            trace!("KMutex {:p}: released, no waiters", self);
        }
    }

    /// Pop the head of the wait-list and transfer ownership to it
    /// directly, skipping the unlocked state entirely.
    ///
    /// # Safety
    /// The wait-list must be non-empty.
    unsafe fn wake_one_waiter(&self) {
        let head = (*self.wait_list.get()).flink;
        let thread = containing_record!(head, KThread, wait_list_entry);
        debug_assert_eq!(
            (*thread).state(),
            super::thread::ThreadState::Waiting,
            "KMutex::wake_one_waiter: wait-list head is not Waiting"
        );
        reset_wait(thread);

        *self.owner.get() = thread;
        *self.lock_count.get() = 1;

        debug!("KMutex {:p}: handed off to task {:p}", self, thread);
        scheduler::ki_ready_thread(thread);
    }
}

impl Default for KMutex {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII guard: acquires on construction, releases on drop.
pub struct MutexGuard<'a> {
    mutex: &'a KMutex,
}

impl<'a> MutexGuard<'a> {
    /// Acquire `mutex` and return a guard that releases it on drop.
    pub fn new(mutex: &'a KMutex) -> Self {
        mutex.lock();
        Self { mutex }
    }
}

impl<'a> Drop for MutexGuard<'a> {
    fn drop(&mut self) {
        self.mutex.unlock();
    }
}
