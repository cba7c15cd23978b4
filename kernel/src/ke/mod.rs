//! Kernel Executive (ke)
//!
//! The slice of the kernel executive needed to implement and exercise
//! KMUTEX:
//!
//! - **Scheduler**: single-CPU cooperative FIFO ready queue
//! - **Dispatcher objects**: KMUTEX only (KEVENT/KSEMAPHORE/KTIMER live
//!   in the rest of Nostalgia OS and are not part of this crate)
//! - **Wait/Unwait**: single-object wait support for KMUTEX
//!
//! # IRQL (Interrupt Request Level)
//!
//! The kernel uses IRQL to tell thread context from interrupt context:
//! - PASSIVE_LEVEL (0): Normal thread execution
//! - DISPATCH_LEVEL (2): scheduler runs, preemption gate closed
//!
//! Higher device/clock IRQLs exist in the full kernel but have no
//! bearing on KMUTEX, which may only be touched from PASSIVE_LEVEL.

pub mod irql;
pub mod list;
pub mod mutex;
pub mod prcb;
pub mod scheduler;
#[cfg(test)]
pub(crate) mod test_support;
pub mod thread;
pub mod wait;

pub use irql::{not_in_irq_handler, PreemptionGate};
pub use list::ListEntry;
pub use mutex::{KMutex, MutexFlags};
pub use prcb::PrcbCell;
pub use thread::{KThread, ThreadState};
pub use wait::{reset_wait, set_wait, WaitReason};
