//! Interrupt-driven TWI (I²C) master command queue
//!
//! A `no_std`, `no_alloc` command queue for the two-wire interface of AVR
//! microcontrollers (ATmega2560 register map). Application code queues read,
//! write and barrier transactions; the TWI interrupt handler (the bus engine,
//! supplied by the application) drives them on the bus byte by byte and
//! reports each outcome through a completion callback.
//!
//! # Architecture
//!
//! 1. **Queue** ([`driver::queue`]): fixed ring of `N` slots walked by three
//!    cursors (allocate, dispatch, complete), shared with the interrupt under
//!    short critical sections
//! 2. **Front end** ([`driver::master`]): non-blocking enqueue, blocking calls
//!    built on a callback-to-flag bridge, and the cursor interface the bus
//!    engine consumes
//! 3. **HAL** ([`hal`]): interrupt enable control, bus timing, and bring-up
//!    of the TWI controller and the Timer/Counter 5 timeout watchdog
//!
//! # Features
//!
//! - `atmega2560` (default): ATmega2560 register backend for bring-up
//! - `avr`: [`hal::AvrInterrupts`], interrupt control through `avr-device`
//! - `defmt`: defmt formatting for public types and bring-up logging
//!
//! # Example
//!
//! ```ignore
//! use ph_twi_master::hal::{self, Atmega2560Registers, AvrInterrupts, TwiConfig};
//! use ph_twi_master::sync::CriticalSectionCell;
//! use ph_twi_master::{Address, Completion};
//!
//! fn start_twi() {
//!     // TWCR = TWINT | TWSTA | TWEN | TWIE
//! }
//!
//! ph_twi_master::twi_master_static!(TWI, irq: AvrInterrupts = AvrInterrupts, signal: fn() = start_twi as fn());
//!
//! let mut regs = unsafe { Atmega2560Registers::steal() };
//! hal::initialize(&mut regs, &TwiConfig::new().with_bit_rate(100_000))?;
//!
//! // The queue owns the buffer while the read is outstanding; the callback
//! // hands it back for the next poll (`static_cell` in the application).
//! static SAMPLE: static_cell::ConstStaticCell<[u8; 2]> = static_cell::ConstStaticCell::new([0; 2]);
//! static SPARE: CriticalSectionCell<Option<&'static mut [u8]>> = CriticalSectionCell::new(None);
//!
//! fn on_sample(done: Completion<'_>) {
//!     if done.status().is_success() { /* use done.buffer() */ }
//!     let buf = done.into_static_buffer();
//!     SPARE.with(|spare| *spare = buf);
//! }
//!
//! let mut config = [0x01, 0x60];
//! TWI.write_blocking(Address::new(0x48)?, &mut config, None)?;
//!
//! let first: &'static mut [u8] = SAMPLE.take();
//! SPARE.with(|spare| *spare = Some(first));
//! loop {
//!     if let Some(buf) = SPARE.with(Option::take) {
//!         TWI.enqueue_read(Address::new(0x48)?, buf, Some(&on_sample))?;
//!     }
//!     // ...
//! }
//! ```
//!
//! # Memory Requirements
//!
//! One slot is a buffer pointer and length, the address byte, the status byte
//! and an optional callback reference. The default 16-slot queue holds 15
//! outstanding transactions.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::error::{
    ConfigError, ConfigResult, EnqueueError, EnqueueResult, Error, Result, TransferError,
    TransferResult,
};
pub use driver::master::{EngineSignal, TwiMaster, TwiMasterDefault, TwiMasterSmall};
pub use driver::transaction::{
    Address, AddressRw, Callback, Completion, Direction, Status, Transaction,
};
pub use hal::{BusTiming, InterruptControl, TwiConfig};

/// Low-level register accessors for bus engines.
///
/// # Safety
///
/// Direct register access bypasses the bring-up sequencing. The bus engine
/// owns TWCR and TWDR once the queue is running.
#[cfg(feature = "atmega2560")]
pub mod unsafe_registers {
    pub use crate::internal::register::timer::TimerRegs;
    pub use crate::internal::register::twi::TwiRegs;
}

/// Shared constants.
pub mod constants {
    pub use crate::internal::constants::{
        // Clocks
        DEFAULT_BIT_RATE_HZ,
        DEFAULT_CPU_HZ,
        // Queue
        DEFAULT_QUEUE_BITS,
        DEFAULT_QUEUE_DEPTH,
        // Timing
        DEFAULT_TIMEOUT_CLOCKS,
        DEFAULT_TIMEOUT_TICKS,
        DEFAULT_TWBR,
        MAX_ADDRESS,
        MAX_BIT_RATE_HZ,
        MIN_TIMEOUT_CLOCKS,
        // Status
        STATUS_SUCCESS_BIT,
        STATUS_TIMEOUT_BIT,
        // Address byte
        TWI_ADR_BITS,
        TWI_READ_BIT,
        TWSR_STATUS_MASK,
    };
    pub use crate::internal::register::twi::{
        TWCR_TWEA, TWCR_TWEN, TWCR_TWIE, TWCR_TWINT, TWCR_TWSTA, TWCR_TWSTO, TWCR_TWWC,
    };
}

// =============================================================================
// Macro Helpers
// =============================================================================

/// Declare a static TWI master.
///
/// The blocking calls take `&'static self`, so the master normally lives in
/// a `static`. The queue depth defaults to 16 slots.
///
/// # Examples
///
/// ```ignore
/// fn start_twi() { /* issue START with TWIE set */ }
///
/// ph_twi_master::twi_master_static!(
///     TWI,
///     irq: AvrInterrupts = AvrInterrupts,
///     signal: fn() = start_twi as fn()
/// );
///
/// ph_twi_master::twi_master_static!(
///     SMALL,
///     depth = 4,
///     irq: AvrInterrupts = AvrInterrupts,
///     signal: fn() = start_twi as fn()
/// );
/// ```
#[macro_export]
macro_rules! twi_master_static {
    ($name:ident, irq: $irq:ty = $irq_init:expr, signal: $signal:ty = $signal_init:expr $(,)?) => {
        $crate::twi_master_static!(
            $name,
            depth = 16,
            irq: $irq = $irq_init,
            signal: $signal = $signal_init
        );
    };
    ($name:ident, depth = $depth:expr, irq: $irq:ty = $irq_init:expr, signal: $signal:ty = $signal_init:expr $(,)?) => {
        static $name: $crate::TwiMaster<{ $depth }, $irq, $signal> =
            $crate::TwiMaster::new($irq_init, $signal_init);
    };
}
