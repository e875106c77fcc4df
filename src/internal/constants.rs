//! Centralized Constants
//!
//! Single source of truth for the magic numbers used by the TWI master.
//!
//! # Organization
//!
//! - **Clock defaults**: CPU and bus frequencies
//! - **Timing**: SCL period formula terms and timeout bounds
//! - **Queue**: default command queue depth
//! - **Address/status encoding**: layout of the address byte and status flags
//!
//! Register bit definitions live next to the register map in
//! `internal::register`.

// =============================================================================
// Clock Defaults
// =============================================================================

/// Default CPU clock (ATmega2560 on an Arduino Mega board)
pub const DEFAULT_CPU_HZ: u32 = 16_000_000;

/// Default SCL bit rate (fast mode)
pub const DEFAULT_BIT_RATE_HZ: u32 = 400_000;

/// Fastest SCL rate the master supports (fast mode)
pub const MAX_BIT_RATE_HZ: u32 = 400_000;

// =============================================================================
// Timing
// =============================================================================

/// Fixed CPU-cycle term of the SCL period: `F_CPU / (16 + 2 * TWBR * 4^TWPS)`
pub const SCL_FIXED_CYCLES: u32 = 16;

/// Default transaction timeout, in SCL periods
pub const DEFAULT_TIMEOUT_CLOCKS: u16 = 32;

/// TWBR for the default clocks: `(16 MHz / 400 kHz - 16) / 2`
pub const DEFAULT_TWBR: u8 = 0x0C;

/// Timeout timer threshold for the default clocks, in CPU cycles:
/// `(16 + 2 * DEFAULT_TWBR) * DEFAULT_TIMEOUT_CLOCKS + 1`
pub const DEFAULT_TIMEOUT_TICKS: u16 =
    (SCL_FIXED_CYCLES as u16 + 2 * DEFAULT_TWBR as u16) * DEFAULT_TIMEOUT_CLOCKS + 1;

/// Shortest possible single-byte transaction, in SCL periods
///
/// Assumes a slave that answers with zero delay; anything lower would time
/// out healthy transfers.
pub const MIN_TIMEOUT_CLOCKS: u16 = 13;

// =============================================================================
// Queue
// =============================================================================

/// Default command queue depth as a bit width (`2^4 = 16` slots, 15 usable)
pub const DEFAULT_QUEUE_BITS: u32 = 4;

/// Default command queue depth in slots
pub const DEFAULT_QUEUE_DEPTH: usize = 1 << DEFAULT_QUEUE_BITS;

// =============================================================================
// Address and Status Encoding
// =============================================================================

/// Bit position of the R/W flag in the address byte
pub const TWI_READ_BIT: u8 = 0;

/// Bit position of the address LSB in the address byte
pub const TWI_ADR_BITS: u8 = 1;

/// Largest 7-bit slave address
pub const MAX_ADDRESS: u8 = 0x7F;

/// TWSR mask for the status code (the 3 LSBs hold the prescaler)
pub const TWSR_STATUS_MASK: u8 = 0xF8;

/// Transaction status bit: transfer completed without error
pub const STATUS_SUCCESS_BIT: u8 = 0;

/// Transaction status bit: timeout timer expired before completion
pub const STATUS_TIMEOUT_BIT: u8 = 1;
