//! Command queue shared between foreground code and the TWI interrupt.
//!
//! A ring of `N` transaction slots (`N` a power of two) walked by three
//! cursors, all advancing forward modulo `N`:
//!
//! ```text
//!        callback          cmd              free
//!           v               v                 v
//!   ... | done, unreported | queued, not yet dispatched | unused | ...
//! ```
//!
//! - `free`: next slot to allocate. Written only by [`CommandQueue::alloc_free`]
//!   (foreground, inside a critical section).
//! - `cmd`: next slot to dispatch. Written only by the bus engine.
//! - `callback`: next slot whose completion has not been reported. Written
//!   only by the bus engine.
//!
//! One slot always stays unused so that `free == callback` means empty and
//! `next(free) == callback` means full; `N - 1` slots are usable.

use crate::driver::transaction::{AddressRw, Callback, RawBuffer, Transaction};

/// Fixed-capacity transaction ring with allocate/dispatch/complete cursors
pub struct CommandQueue<const N: usize> {
    slots: [Transaction; N],
    free: usize,
    cmd: usize,
    callback: usize,
}

impl<const N: usize> CommandQueue<N> {
    const MASK: usize = N - 1;

    /// Create an empty queue (const, suitable for static initialization).
    pub const fn new() -> Self {
        const {
            assert!(
                N >= 2 && N.is_power_of_two(),
                "command queue depth must be a power of two >= 2"
            );
        }

        Self {
            slots: [Transaction::EMPTY; N],
            free: 0,
            cmd: 0,
            callback: 0,
        }
    }

    /// Total slots, one of which is always kept unused
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slots that can hold outstanding transactions at the same time
    #[inline(always)]
    pub const fn usable(&self) -> usize {
        N - 1
    }

    #[inline(always)]
    const fn next(index: usize) -> usize {
        (index + 1) & Self::MASK
    }

    /// Transactions allocated but not yet reported through their callback
    #[inline]
    pub const fn outstanding(&self) -> usize {
        self.free.wrapping_sub(self.callback) & Self::MASK
    }

    /// Nothing allocated and unreported: the bus engine has no work
    #[inline]
    pub const fn is_idle(&self) -> bool {
        self.free == self.callback
    }

    /// No slot left to allocate
    #[inline]
    pub const fn is_full(&self) -> bool {
        Self::next(self.free) == self.callback
    }

    /// A queued transaction waits for dispatch
    #[inline]
    pub const fn has_command(&self) -> bool {
        self.cmd != self.free
    }

    /// A dispatched transaction waits for its completion report
    #[inline]
    pub const fn has_callback(&self) -> bool {
        self.callback != self.cmd
    }

    /// Cursor positions as `(free, cmd, callback)`
    #[inline]
    pub const fn cursors(&self) -> (usize, usize, usize) {
        (self.free, self.cmd, self.callback)
    }

    // =========================================================================
    // Allocation (foreground, with interrupts disabled)
    // =========================================================================

    /// Claim the next free slot, or `None` when full.
    ///
    /// Must run with exclusive access (inside a critical section): the
    /// interrupt context reads `free` through [`has_command`](Self::has_command).
    pub fn alloc_free(&mut self) -> Option<&mut Transaction> {
        if self.is_full() {
            return None;
        }

        let old = self.free;
        self.free = Self::next(old);
        Some(&mut self.slots[old])
    }

    /// Allocate and populate a slot in one step
    pub(crate) fn push(
        &mut self,
        address: AddressRw,
        buffer: RawBuffer,
        callback: Option<&'static dyn Callback>,
    ) -> bool {
        match self.alloc_free() {
            Some(slot) => {
                slot.populate(address, buffer, callback);
                true
            }
            None => false,
        }
    }

    // =========================================================================
    // Dispatch cursor (bus engine only)
    // =========================================================================

    /// Next transaction to dispatch, `None` unless [`has_command`](Self::has_command)
    #[inline]
    pub fn current_command(&mut self) -> Option<&mut Transaction> {
        if self.has_command() {
            Some(&mut self.slots[self.cmd])
        } else {
            None
        }
    }

    /// Mark the current command as taken over by the bus engine
    ///
    /// No-op without a pending command.
    #[inline]
    pub fn done_command(&mut self) {
        debug_assert!(self.has_command(), "done_command without a pending command");
        if self.has_command() {
            self.cmd = Self::next(self.cmd);
        }
    }

    // =========================================================================
    // Completion cursor (bus engine only)
    // =========================================================================

    /// Oldest dispatched transaction whose outcome is unreported
    #[inline]
    pub fn current_callback(&mut self) -> Option<&mut Transaction> {
        if self.has_callback() {
            Some(&mut self.slots[self.callback])
        } else {
            None
        }
    }

    /// Retire the current completion slot and hand back its record.
    ///
    /// The slot is free for reuse as soon as this returns. The caller fires
    /// the callback with [`Transaction::complete`] outside the critical
    /// section, so the callback can enqueue again. Returns `None` (and
    /// changes nothing) without a dispatched transaction.
    pub(crate) fn done_callback(&mut self) -> Option<Transaction> {
        debug_assert!(self.has_callback(), "done_callback without a dispatched command");
        if !self.has_callback() {
            return None;
        }

        let record = self.slots[self.callback].take();
        self.callback = Self::next(self.callback);
        Some(record)
    }
}

impl<const N: usize> Default for CommandQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Tests
// =============================================================================
