//! TWI master front end: the command queue plus its two audiences.
//!
//! [`TwiMaster`] owns the [`CommandQueue`] and exposes:
//!
//! - to application code: non-blocking `enqueue_*` calls that return at once
//!   (`Ok` or [`EnqueueError::QueueFull`]), and blocking `*_blocking` calls that
//!   return the transaction's final outcome;
//! - to the bus engine (the TWI interrupt handler, not part of this crate): the
//!   dispatch cursor ([`with_command`](TwiMaster::with_command) /
//!   [`done_command`](TwiMaster::done_command)) and the completion cursor
//!   ([`with_callback`](TwiMaster::with_callback) /
//!   [`done_callback`](TwiMaster::done_callback)).
//!
//! # Bus engine contract
//!
//! 1. On [`EngineSignal::start`], and after each finished transaction, the
//!    engine checks [`has_command`](TwiMaster::has_command). If there is one it
//!    reads the address and buffer through `with_command`, issues START, and
//!    calls `done_command` once the transaction is in the hands of the
//!    hardware. `done_command` therefore means "in flight", not "transferred":
//!    the buffer stays borrowed until `done_callback`.
//! 2. A zero-length transaction is a barrier. The engine retires it without
//!    bus activity: `done_command`, then [`finish`](TwiMaster::finish) with
//!    [`Status::SUCCESS`].
//! 3. When the transfer ends (STOP sent, error, or the timeout timer passed
//!    its compare threshold), the engine stores the status on the completion
//!    slot and calls `done_callback` (or both at once with `finish`).
//! 4. With no command left the engine goes idle; the next enqueue onto an
//!    idle queue signals it again.
//!
//! # Example
//!
//! ```ignore
//! use ph_twi_master::{Address, TwiMaster};
//! use ph_twi_master::hal::AvrInterrupts;
//!
//! fn start_twi() {
//!     // Raise TWINT handling: START condition with the interrupt enabled
//! }
//!
//! static TWI: TwiMaster<16, AvrInterrupts, fn()> = TwiMaster::new(AvrInterrupts, start_twi as fn());
//!
//! let sensor = Address::new(0x48)?;
//! let mut reg = [0x00];
//! TWI.write_blocking(sensor, &mut reg, None)?;
//! let mut temp = [0u8; 2];
//! TWI.read_blocking(sensor, &mut temp, None)?;
//! ```

use crate::driver::bridge::BlockingBridge;
use crate::driver::error::{EnqueueError, EnqueueResult, Result};
use crate::driver::queue::CommandQueue;
use crate::driver::transaction::{
    Address, AddressRw, Callback, Direction, RawBuffer, Status, Transaction,
};
use crate::hal::irq::{InterruptControl, InterruptGuard};
use crate::internal::constants::DEFAULT_QUEUE_DEPTH;
use crate::sync::CriticalSectionCell;

// =============================================================================
// Engine Signal
// =============================================================================

/// "Start bus activity" notification to the bus engine.
///
/// Sent from inside the enqueue critical section whenever a transaction lands
/// on an idle queue. May run in interrupt context (callbacks enqueue too), so
/// it must only poke hardware, typically by issuing a START with the TWI
/// interrupt enabled.
pub trait EngineSignal {
    /// Wake the engine up
    fn start(&self);
}

impl EngineSignal for fn() {
    #[inline(always)]
    fn start(&self) {
        self();
    }
}

impl<T: EngineSignal + ?Sized> EngineSignal for &T {
    #[inline(always)]
    fn start(&self) {
        (**self).start();
    }
}

// =============================================================================
// TWI Master
// =============================================================================

/// Interrupt-safe TWI transaction queue.
///
/// `N` is the queue depth (a power of two; `N - 1` transactions can be
/// outstanding). `I` controls the CPU's interrupt enable for the blocking
/// calls, `S` signals the bus engine.
///
/// Meant to live in a `static` (see [`twi_master_static!`](crate::twi_master_static)):
/// the blocking calls need `&'static self`.
pub struct TwiMaster<const N: usize, I, S> {
    queue: CriticalSectionCell<CommandQueue<N>>,
    bridge: BlockingBridge,
    // Nesting depth of `done_callback`
    completing: CriticalSectionCell<u8>,
    irq: I,
    signal: S,
}

impl<const N: usize, I, S> TwiMaster<N, I, S>
where
    I: InterruptControl,
    S: EngineSignal,
{
    /// Create a master with an empty queue (const, suitable for static initialization).
    pub const fn new(irq: I, signal: S) -> Self {
        Self {
            queue: CriticalSectionCell::new(CommandQueue::new()),
            bridge: BlockingBridge::new(),
            completing: CriticalSectionCell::new(0),
            irq,
            signal,
        }
    }

    /// Interrupt control backing the blocking calls
    #[inline]
    pub fn interrupts(&self) -> &I {
        &self.irq
    }

    /// Transactions allocated and not yet reported
    pub fn outstanding(&self) -> usize {
        self.queue.with_ref(CommandQueue::outstanding)
    }

    /// No outstanding transaction
    pub fn is_idle(&self) -> bool {
        self.queue.with_ref(CommandQueue::is_idle)
    }

    // =========================================================================
    // Non-blocking enqueue
    // =========================================================================

    /// Queue a read of `buffer.len()` bytes from `address`.
    ///
    /// Returns [`EnqueueError::QueueFull`] if no slot is free. The buffer is
    /// filled by the bus engine and handed to `callback` on completion, which
    /// can take it back with
    /// [`Completion::into_static_buffer`](crate::Completion::into_static_buffer).
    /// Without a callback the buffer stays with the queue.
    pub fn enqueue_read(
        &self,
        address: Address,
        buffer: &'static mut [u8],
        callback: Option<&'static dyn Callback>,
    ) -> EnqueueResult<()> {
        self.enqueue(AddressRw::new(address, Direction::Read), buffer, callback)
    }

    /// Queue a write of `buffer` to `address`.
    ///
    /// Returns [`EnqueueError::QueueFull`] if no slot is free.
    pub fn enqueue_write(
        &self,
        address: Address,
        buffer: &'static mut [u8],
        callback: Option<&'static dyn Callback>,
    ) -> EnqueueResult<()> {
        self.enqueue(AddressRw::new(address, Direction::Write), buffer, callback)
    }

    /// Queue a transaction with an already encoded address byte
    pub fn enqueue(
        &self,
        address: AddressRw,
        buffer: &'static mut [u8],
        callback: Option<&'static dyn Callback>,
    ) -> EnqueueResult<()> {
        self.submit(address, RawBuffer::from_static(buffer), callback)
    }

    /// Queue a barrier: a zero-length transaction whose callback fires once
    /// every transaction queued before it has been dispatched and reported.
    ///
    /// This is not "wait for an empty queue": callbacks of earlier
    /// transactions may queue more work, which lands behind the barrier.
    pub fn enqueue_barrier(&self, callback: &'static dyn Callback) -> EnqueueResult<()> {
        self.submit(AddressRw::BARRIER, RawBuffer::EMPTY, Some(callback))
    }

    /// Allocate and populate a slot, signalling the engine if it was idle.
    fn submit(
        &self,
        address: AddressRw,
        buffer: RawBuffer,
        callback: Option<&'static dyn Callback>,
    ) -> EnqueueResult<()> {
        self.queue.with(|queue| {
            let was_idle = queue.is_idle();
            if !queue.push(address, buffer, callback) {
                return Err(EnqueueError::QueueFull);
            }
            if was_idle {
                self.signal.start();
            }
            Ok(())
        })
    }

    // =========================================================================
    // Blocking calls
    // =========================================================================

    /// Read `buffer.len()` bytes from `address` and wait for the outcome.
    ///
    /// Never reports a full queue: it waits for a free slot instead.
    /// `forward` additionally receives the completion, from interrupt
    /// context. Interrupts are enabled while waiting and restored to the
    /// caller's state before returning.
    ///
    /// Returns [`EnqueueError::CalledFromCallback`] when called from a
    /// completion callback, and [`EnqueueError::BlockingInProgress`] while
    /// another blocking call is waiting.
    pub fn read_blocking(
        &'static self,
        address: Address,
        buffer: &mut [u8],
        forward: Option<&'static dyn Callback>,
    ) -> Result<()> {
        self.submit_blocking(
            AddressRw::new(address, Direction::Read),
            RawBuffer::new(buffer),
            forward,
        )
    }

    /// Write `buffer` to `address` and wait for the outcome.
    ///
    /// See [`read_blocking`](Self::read_blocking).
    pub fn write_blocking(
        &'static self,
        address: Address,
        buffer: &mut [u8],
        forward: Option<&'static dyn Callback>,
    ) -> Result<()> {
        self.submit_blocking(
            AddressRw::new(address, Direction::Write),
            RawBuffer::new(buffer),
            forward,
        )
    }

    /// Wait until every transaction queued so far has been reported.
    ///
    /// Transactions queued meanwhile by callbacks may still be pending when
    /// this returns.
    pub fn barrier_blocking(&'static self) -> Result<()> {
        self.submit_blocking(AddressRw::BARRIER, RawBuffer::EMPTY, None)
    }

    fn submit_blocking(
        &'static self,
        address: AddressRw,
        buffer: RawBuffer,
        forward: Option<&'static dyn Callback>,
    ) -> Result<()> {
        // The engine cannot make progress while its own callback spins
        if self.completing.with_ref(|depth| *depth > 0) {
            return Err(EnqueueError::CalledFromCallback.into());
        }
        self.bridge.arm(forward)?;
        let guard = InterruptGuard::new(&self.irq);

        let mut waited = false;
        while self.submit(address, buffer, Some(&self.bridge)).is_err() {
            if !waited {
                #[cfg(feature = "defmt")]
                defmt::trace!("TWI queue full, waiting for a free slot");
                waited = true;
            }
            // Let the engine retire a slot. One instruction has to execute
            // after enabling, or a pending interrupt is dropped by the disable.
            self.irq.enable();
            self.irq.relax();
            self.irq.disable();
        }

        self.irq.enable();
        while !self.bridge.fired() {
            self.irq.relax();
        }

        let status = self.bridge.disarm();
        drop(guard);

        // The buffer borrow ended with the bridged callback.
        status.into_result()?;
        Ok(())
    }

    // =========================================================================
    // Bus engine interface
    // =========================================================================

    /// A queued transaction waits for dispatch
    #[inline]
    pub fn has_command(&self) -> bool {
        self.queue.with_ref(CommandQueue::has_command)
    }

    /// Access the next transaction to dispatch; `None` if there is none
    #[inline]
    pub fn with_command<R>(&self, f: impl FnOnce(&mut Transaction) -> R) -> Option<R> {
        self.queue.with(|queue| queue.current_command().map(f))
    }

    /// The current command has been handed to the hardware
    #[inline]
    pub fn done_command(&self) {
        self.queue.with(CommandQueue::done_command);
    }

    /// A dispatched transaction waits for its completion report
    #[inline]
    pub fn has_callback(&self) -> bool {
        self.queue.with_ref(CommandQueue::has_callback)
    }

    /// Access the oldest dispatched, unreported transaction
    #[inline]
    pub fn with_callback<R>(&self, f: impl FnOnce(&mut Transaction) -> R) -> Option<R> {
        self.queue.with(|queue| queue.current_callback().map(f))
    }

    /// Retire the completion slot and fire its callback.
    ///
    /// The status must already be set. The slot is released before the
    /// callback runs, so the callback can enqueue follow-up work; the callback
    /// runs outside the queue's critical section.
    pub fn done_callback(&self) {
        if let Some(record) = self.queue.with(CommandQueue::done_callback) {
            self.completing.with(|depth| *depth += 1);
            record.complete();
            self.completing.with(|depth| *depth -= 1);
        }
    }

    /// Set the status of the completion slot and retire it
    pub fn finish(&self, status: Status) {
        self.with_callback(|txn| txn.set_status(status));
        self.done_callback();
    }
}

/// Master with the default 16-slot queue
pub type TwiMasterDefault<I, S> = TwiMaster<DEFAULT_QUEUE_DEPTH, I, S>;

/// Master with a 4-slot queue for memory-constrained systems
pub type TwiMasterSmall<I, S> = TwiMaster<4, I, S>;
