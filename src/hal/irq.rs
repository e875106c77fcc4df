//! Interrupt enable control for the blocking bridge.
//!
//! Queue mutations use `critical_section::with`, which can only restore the
//! state it found. The blocking calls need more: they must open an interrupt
//! window even when the caller had interrupts disabled, and they must do it in
//! an order that cannot drop a pending interrupt. [`InterruptControl`] exposes
//! exactly the primitives that takes, and [`InterruptGuard`] restores the
//! caller's state on every exit path.

/// Raw interrupt-enable primitives of the CPU running the TWI interrupt.
///
/// None of these may be called from inside a `critical_section::with`
/// closure: enabling interrupts there would break the critical section.
pub trait InterruptControl {
    /// Saved interrupt-enable state
    type State;

    /// Save the current state and disable interrupts
    fn save_and_disable(&self) -> Self::State;

    /// Restore a state returned by [`save_and_disable`](Self::save_and_disable)
    fn restore(&self, state: Self::State);

    /// Enable interrupts.
    ///
    /// The CPU must execute at least one more instruction (see
    /// [`relax`](Self::relax)) before a pending interrupt is taken, as AVR
    /// does after `sei`.
    fn enable(&self);

    /// Disable interrupts
    fn disable(&self);

    /// Execute one instruction in the current interrupt state.
    ///
    /// With interrupts enabled this is the point where pending interrupts
    /// get serviced; it is also the body of every busy-wait loop.
    fn relax(&self);
}

impl<T: InterruptControl + ?Sized> InterruptControl for &T {
    type State = T::State;

    #[inline(always)]
    fn save_and_disable(&self) -> Self::State {
        (**self).save_and_disable()
    }

    #[inline(always)]
    fn restore(&self, state: Self::State) {
        (**self).restore(state);
    }

    #[inline(always)]
    fn enable(&self) {
        (**self).enable();
    }

    #[inline(always)]
    fn disable(&self) {
        (**self).disable();
    }

    #[inline(always)]
    fn relax(&self) {
        (**self).relax();
    }
}

/// Scoped interrupt-disable guard.
///
/// Saves the interrupt state and disables interrupts on creation; restores the
/// saved state when dropped.
#[must_use = "interrupts are restored as soon as the guard is dropped"]
pub struct InterruptGuard<'a, I: InterruptControl> {
    irq: &'a I,
    saved: Option<I::State>,
}

impl<'a, I: InterruptControl> InterruptGuard<'a, I> {
    /// Save the interrupt state and disable interrupts
    #[inline]
    pub fn new(irq: &'a I) -> Self {
        let saved = Some(irq.save_and_disable());
        Self { irq, saved }
    }
}

impl<I: InterruptControl> Drop for InterruptGuard<'_, I> {
    #[inline]
    fn drop(&mut self) {
        if let Some(state) = self.saved.take() {
            self.irq.restore(state);
        }
    }
}

/// AVR interrupt control through SREG's global interrupt flag.
///
/// `sei` guarantees the following instruction executes before any pending
/// interrupt; [`relax`](InterruptControl::relax) is that instruction (`nop`).
#[cfg(feature = "avr")]
#[derive(Debug, Clone, Copy, Default)]
pub struct AvrInterrupts;

#[cfg(feature = "avr")]
impl InterruptControl for AvrInterrupts {
    type State = avr_device::interrupt::IrqFlag;

    #[inline(always)]
    fn save_and_disable(&self) -> Self::State {
        avr_device::interrupt::disable_save()
    }

    #[inline(always)]
    fn restore(&self, state: Self::State) {
        // SAFETY: only called by InterruptGuard, outside any critical section.
        unsafe { avr_device::interrupt::restore(state) }
    }

    #[inline(always)]
    fn enable(&self) {
        // SAFETY: the blocking bridge never enables inside a critical section.
        unsafe { avr_device::interrupt::enable() }
    }

    #[inline(always)]
    fn disable(&self) {
        avr_device::interrupt::disable();
    }

    #[inline(always)]
    fn relax(&self) {
        avr_device::asm::nop();
    }
}
