//! Nostalgia OS Kernel Executive — KMUTEX subsystem
//!
//! This crate implements the kernel executive's blocking mutex object
//! (KMUTEX/KMUTANT in NT terms) for a small single-CPU cooperative
//! hobby kernel, along with the minimal slice of the scheduler,
//! preemption gate, and wait-object machinery that the mutex's
//! contract depends on.
//!
//! # Architecture
//!
//! - **ke::list** — intrusive doubly-linked list (`LIST_ENTRY` equivalent).
//! - **ke::irql** — current-IRQL tracking; backs the preemption gate and
//!   the debug-only "not in an interrupt handler" check.
//! - **ke::thread** — `KThread`: the schedulable unit and its wait-block.
//! - **ke::prcb** — per-processor control block: current task, ready
//!   queue, preemption gate depth (single-CPU only).
//! - **ke::scheduler** — cooperative FIFO dispatch: `ki_ready_thread`,
//!   `ki_yield`.
//! - **ke::wait** — wait-object binding: `set_wait` / `reset_wait`.
//! - **ke::mutex** — `KMutex`: the dispatcher object this crate exists
//!   to provide.
//!
//! Real context switching, priority scheduling, APC/DPC delivery, the
//! EFI bootloader, and multi-object waits belong to the rest of
//! Nostalgia OS and are not part of this crate.

#![cfg_attr(not(test), no_std)]
#![allow(clippy::missing_safety_doc)]

pub mod ke;

pub use ke::{
    irql, KMutex, KThread, ListEntry, MutexFlags, PrcbCell, ThreadState, WaitReason,
};
