//! Preemption gate and interrupt-context tracking
//!
//! This is a deliberately small slice of what NT calls IRQL (Interrupt
//! Request Level) tracking: just enough to (a) let every mutex
//! operation assert it isn't running inside an interrupt handler, and
//! (b) provide a nestable counter that suppresses scheduler-driven
//! task switches without touching the hardware interrupt flag.
//!
//! Unlike spinlock-style locks elsewhere in Nostalgia OS, the
//! preemption gate never executes `cli`/`sti`. Interrupts keep
//! firing (so timers and devices keep working); only the scheduler's
//! voluntary and involuntary dispatch is inhibited while the gate is
//! held. Raising real IRQL to `DISPATCH_LEVEL` the way `ke_raise_irql`
//! does elsewhere is the wrong tool here: it would mask interrupts and
//! could deadlock against interrupt-driven wakeups.

use core::cell::Cell;

/// Interrupt Request Level type (trimmed to the two levels KMUTEX cares about).
pub type Kirql = u8;

/// Thread execution, all interrupts enabled, preemption permitted.
pub const PASSIVE_LEVEL: Kirql = 0;
/// Executing an interrupt handler; KMUTEX may not be touched here.
pub const HIGH_LEVEL: Kirql = 31;

/// Per-CPU interrupt/preemption control state.
///
/// This kernel is single-CPU, so there is exactly one instance. A
/// multiprocessor Nostalgia OS would key this off the current
/// processor number the same way `KPcr`/`KPrcb` do elsewhere.
struct CpuControl {
    /// Nested interrupt-handler depth. Non-zero means we are currently
    /// executing an interrupt handler.
    interrupt_count: Cell<i32>,
    /// Nested preemption-gate depth. Non-zero suppresses
    /// scheduler-initiated task switches.
    preemption_depth: Cell<u32>,
}

// Safety: single-CPU cooperative kernel — all access happens on the
// one thread of execution the kernel runs on.
unsafe impl Sync for CpuControl {}

static CPU: CpuControl = CpuControl {
    interrupt_count: Cell::new(0),
    preemption_depth: Cell::new(0),
};

/// Mark entry into an interrupt handler.
///
/// # Safety
/// Must be paired with [`ki_exit_interrupt`] and called at the true
/// start of an interrupt handler.
pub unsafe fn ki_enter_interrupt() {
    CPU.interrupt_count.set(CPU.interrupt_count.get() + 1);
}

/// Mark exit from an interrupt handler.
///
/// # Safety
/// Must match a prior [`ki_enter_interrupt`].
pub unsafe fn ki_exit_interrupt() {
    CPU.interrupt_count.set(CPU.interrupt_count.get() - 1);
}

/// True if the caller is not currently executing an interrupt handler.
///
/// Every KMUTEX operation asserts this on entry in debug builds; the
/// spec forbids acquiring, releasing, or testing a mutex from
/// interrupt context.
#[inline]
pub fn not_in_irq_handler() -> bool {
    CPU.interrupt_count.get() == 0
}

/// A nestable, CPU-local critical section against task switches.
///
/// `disable()` increments a depth counter; `enable()` decrements it.
/// Preemption (scheduler-initiated dispatch) is only permitted when
/// the counter is zero. Every KMUTEX operation enters the gate on
/// entry and leaves it before returning; `yield` is always called
/// with the gate released (see [`super::scheduler::ki_yield`]).
pub struct PreemptionGate {
    _private: (),
}

impl PreemptionGate {
    /// Enter the gate, incrementing the nesting depth.
    #[inline]
    pub fn disable() -> Self {
        CPU.preemption_depth.set(CPU.preemption_depth.get() + 1);
        Self { _private: () }
    }

    /// Current nesting depth, for gate-balance assertions/tests.
    #[inline]
    pub fn depth() -> u32 {
        CPU.preemption_depth.get()
    }

    /// True if the scheduler is currently permitted to switch tasks.
    #[inline]
    pub fn preemption_allowed() -> bool {
        Self::depth() == 0
    }
}

impl Drop for PreemptionGate {
    /// Leave the gate, decrementing the nesting depth.
    #[inline]
    fn drop(&mut self) {
        let depth = CPU.preemption_depth.get();
        debug_assert!(depth > 0, "PreemptionGate::drop: gate already balanced");
        CPU.preemption_depth.set(depth - 1);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::guard;
    use super::*;

    #[test]
    fn gate_nests_and_balances() {
        let _g = guard();
        assert_eq!(PreemptionGate::depth(), 0);
        assert!(PreemptionGate::preemption_allowed());
        {
            let _outer = PreemptionGate::disable();
            assert_eq!(PreemptionGate::depth(), 1);
            assert!(!PreemptionGate::preemption_allowed());
            {
                let _inner = PreemptionGate::disable();
                assert_eq!(PreemptionGate::depth(), 2);
            }
            assert_eq!(PreemptionGate::depth(), 1);
        }
        assert_eq!(PreemptionGate::depth(), 0);
        assert!(PreemptionGate::preemption_allowed());
    }

    #[test]
    fn interrupt_context_is_detected() {
        let _g = guard();
        assert!(not_in_irq_handler());
        unsafe { ki_enter_interrupt() };
        assert!(!not_in_irq_handler());
        unsafe { ki_exit_interrupt() };
        assert!(not_in_irq_handler());
    }
}
