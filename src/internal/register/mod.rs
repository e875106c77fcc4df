//! Memory-mapped register definitions for the ATmega2560 TWI and timer blocks
//!
//! All register access is volatile. Addresses are data-space addresses (the
//! I/O-space address plus `0x20` where applicable), so every register can be
//! reached with plain loads and stores.
//!
//! The bit constants are always available for bring-up; the volatile
//! accessors only exist with the `atmega2560` backend.

pub mod timer;
pub mod twi;

// =============================================================================
// Register Addresses (ATmega2560 data space)
// =============================================================================

/// TWI bit rate register
#[cfg(feature = "atmega2560")]
pub const TWBR: usize = 0xB8;

/// TWI status register (status code + prescaler bits)
#[cfg(feature = "atmega2560")]
pub const TWSR: usize = 0xB9;

/// TWI control register
#[cfg(feature = "atmega2560")]
pub const TWCR: usize = 0xBC;

/// Timer/Counter 5 control register A
#[cfg(feature = "atmega2560")]
pub const TCCR5A: usize = 0x120;

/// Timer/Counter 5 control register B
#[cfg(feature = "atmega2560")]
pub const TCCR5B: usize = 0x121;

/// Timer/Counter 5 counter (low byte; high byte follows)
#[cfg(feature = "atmega2560")]
pub const TCNT5L: usize = 0x124;

/// Timer/Counter 5 output compare A (low byte; high byte follows)
#[cfg(feature = "atmega2560")]
pub const OCR5AL: usize = 0x128;

/// Timer/Counter 5 interrupt mask register
#[cfg(feature = "atmega2560")]
pub const TIMSK5: usize = 0x73;

/// Timer/Counter 5 interrupt flag register
#[cfg(feature = "atmega2560")]
pub const TIFR5: usize = 0x3A;

/// Read an 8-bit register at the given address
///
/// # Safety
/// The caller must ensure the address is a valid register.
#[cfg(feature = "atmega2560")]
#[inline(always)]
pub unsafe fn read_reg(addr: usize) -> u8 {
    unsafe { core::ptr::read_volatile(addr as *const u8) }
}

/// Write an 8-bit value to a register at the given address
///
/// # Safety
/// The caller must ensure the address is a valid register.
#[cfg(feature = "atmega2560")]
#[inline(always)]
pub unsafe fn write_reg(addr: usize, value: u8) {
    unsafe { core::ptr::write_volatile(addr as *mut u8, value) }
}

/// Modify a register using a read-modify-write operation
///
/// # Safety
/// The caller must ensure the address is a valid register.
#[cfg(feature = "atmega2560")]
#[inline(always)]
pub unsafe fn modify_reg<F>(addr: usize, f: F)
where
    F: FnOnce(u8) -> u8,
{
    // SAFETY: caller guarantees address validity
    let value = unsafe { read_reg(addr) };
    unsafe { write_reg(addr, f(value)) }
}

/// Write a 16-bit register pair through the shared TEMP register
///
/// The high byte must be written first; the low byte write latches both.
/// Must not be interleaved with another 16-bit access (run it with
/// interrupts disabled).
///
/// # Safety
/// The caller must ensure `low_addr` is the low byte of a 16-bit register.
#[cfg(feature = "atmega2560")]
#[cfg(feature = "atmega2560")]
#[inline(always)]
pub unsafe fn write_reg16(low_addr: usize, value: u16) {
    let [low, high] = value.to_le_bytes();
    unsafe {
        write_reg(low_addr + 1, high);
        write_reg(low_addr, low);
    }
}

// =============================================================================
// Register Access Macros
// =============================================================================

/// Generate a read accessor for an 8-bit register.
///
/// # Example
/// ```ignore
/// impl TwiRegs {
///     reg_r!(status, TWSR, "TWI status register");
/// }
/// ```
#[cfg(feature = "atmega2560")]
macro_rules! reg_r {
    ($read_fn:ident, $addr:expr, $doc:expr) => {
        #[doc = concat!("Read ", $doc)]
        #[inline(always)]
        pub fn $read_fn() -> u8 {
            unsafe { $crate::internal::register::read_reg($addr) }
        }
    };
}

/// Generate a write accessor for an 8-bit register.
#[cfg(feature = "atmega2560")]
macro_rules! reg_w {
    ($write_fn:ident, $addr:expr, $doc:expr) => {
        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(value: u8) {
            unsafe { $crate::internal::register::write_reg($addr, value) }
        }
    };
}

/// Generate read/write accessor methods for an 8-bit register.
#[cfg(feature = "atmega2560")]
macro_rules! reg_rw {
    ($read_fn:ident, $write_fn:ident, $addr:expr, $doc:expr) => {
        $crate::internal::register::reg_r!($read_fn, $addr, $doc);
        $crate::internal::register::reg_w!($write_fn, $addr, $doc);
    };
}

/// Generate a write accessor for a 16-bit register pair.
#[cfg(feature = "atmega2560")]
macro_rules! reg16_w {
    ($write_fn:ident, $low_addr:expr, $doc:expr) => {
        #[doc = concat!("Write ", $doc)]
        #[inline(always)]
        pub fn $write_fn(value: u16) {
            unsafe { $crate::internal::register::write_reg16($low_addr, value) }
        }
    };
}

#[cfg(feature = "atmega2560")]
pub(crate) use {reg_r, reg_rw, reg_w, reg16_w};
