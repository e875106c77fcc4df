//! Bus timing configuration
//!
//! The TWI clock is derived from the CPU clock:
//!
//! ```text
//! SCL = F_CPU / (16 + 2 * TWBR * 4^TWPS)
//! ```
//!
//! [`TwiConfig::timing`] picks the smallest prescaler whose divisor fits the
//! 8-bit TWBR register, and sizes the timeout timer threshold as a number of
//! SCL periods counted in CPU cycles.

use crate::driver::error::{ConfigError, ConfigResult};
use crate::internal::constants::{
    DEFAULT_BIT_RATE_HZ, DEFAULT_CPU_HZ, DEFAULT_TIMEOUT_CLOCKS, MAX_BIT_RATE_HZ,
    MIN_TIMEOUT_CLOCKS, SCL_FIXED_CYCLES,
};

// =============================================================================
// Prescaler
// =============================================================================

/// TWI bit rate prescaler (TWPS bits of TWSR)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Prescaler {
    /// 4^0
    #[default]
    Div1 = 0,
    /// 4^1
    Div4 = 1,
    /// 4^2
    Div16 = 2,
    /// 4^3
    Div64 = 3,
}

impl Prescaler {
    /// All prescalers, smallest first
    pub const ALL: [Self; 4] = [Self::Div1, Self::Div4, Self::Div16, Self::Div64];

    /// Multiplier applied to `2 * TWBR`
    #[inline(always)]
    pub const fn factor(self) -> u32 {
        1 << (2 * self as u32)
    }

    /// Value for the TWPS bits
    #[inline(always)]
    pub const fn to_reg_value(self) -> u8 {
        self as u8
    }
}

// =============================================================================
// Bus Timing
// =============================================================================

/// Register values derived from a [`TwiConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BusTiming {
    /// TWBR value
    pub divisor: u8,
    /// TWPS value
    pub prescaler: Prescaler,
    /// Timer compare threshold (OCR5A), in CPU cycles
    pub timeout_ticks: u16,
}

impl BusTiming {
    /// CPU cycles per SCL period
    #[inline]
    pub const fn scl_cycles(&self) -> u32 {
        SCL_FIXED_CYCLES + 2 * self.divisor as u32 * self.prescaler.factor()
    }

    /// Actual SCL frequency for the given CPU clock
    #[inline]
    pub const fn bit_rate_hz(&self, cpu_hz: u32) -> u32 {
        cpu_hz / self.scl_cycles()
    }
}

// =============================================================================
// Configuration
// =============================================================================

/// TWI master configuration
///
/// # Example
///
/// ```ignore
/// let config = TwiConfig::new()
///     .with_bit_rate(100_000)
///     .with_timeout_clocks(64);
/// let timing = config.timing()?;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TwiConfig {
    /// CPU clock feeding the TWI block and the timeout timer
    pub cpu_hz: u32,
    /// Requested SCL frequency
    pub bit_rate_hz: u32,
    /// Transaction timeout, in SCL periods
    pub timeout_clocks: u16,
    /// Toggle the OC5A pin on every timeout compare match (scope trigger)
    pub timeout_pin_toggle: bool,
}

impl Default for TwiConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl TwiConfig {
    /// 16 MHz CPU, 400 kHz bus, 32 clock timeout
    pub const fn new() -> Self {
        Self {
            cpu_hz: DEFAULT_CPU_HZ,
            bit_rate_hz: DEFAULT_BIT_RATE_HZ,
            timeout_clocks: DEFAULT_TIMEOUT_CLOCKS,
            timeout_pin_toggle: false,
        }
    }

    /// Set the CPU clock frequency
    #[must_use]
    pub const fn with_cpu_hz(mut self, cpu_hz: u32) -> Self {
        self.cpu_hz = cpu_hz;
        self
    }

    /// Set the SCL frequency
    #[must_use]
    pub const fn with_bit_rate(mut self, bit_rate_hz: u32) -> Self {
        self.bit_rate_hz = bit_rate_hz;
        self
    }

    /// Set the transaction timeout in SCL periods
    #[must_use]
    pub const fn with_timeout_clocks(mut self, clocks: u16) -> Self {
        self.timeout_clocks = clocks;
        self
    }

    /// Toggle OC5A on timeout compare matches
    #[must_use]
    pub const fn with_timeout_pin_toggle(mut self, enabled: bool) -> Self {
        self.timeout_pin_toggle = enabled;
        self
    }

    /// Validate the configuration and compute register values
    ///
    /// # Errors
    ///
    /// - [`ConfigError::BitRateTooHigh`]: above fast mode, or faster than
    ///   the CPU clock allows with `TWBR = 0`
    /// - [`ConfigError::BitRateTooLow`]: no prescaler brings TWBR under 256
    /// - [`ConfigError::TimeoutTooShort`]: fewer clocks than a single-byte
    ///   transaction takes
    /// - [`ConfigError::TimeoutOverflow`]: threshold does not fit 16 bits
    pub const fn timing(&self) -> ConfigResult<BusTiming> {
        if self.bit_rate_hz > MAX_BIT_RATE_HZ {
            return Err(ConfigError::BitRateTooHigh);
        }
        if self.bit_rate_hz == 0 {
            return Err(ConfigError::BitRateTooLow);
        }
        let cycles = self.cpu_hz / self.bit_rate_hz;
        if cycles < SCL_FIXED_CYCLES {
            return Err(ConfigError::BitRateTooHigh);
        }
        if self.timeout_clocks < MIN_TIMEOUT_CLOCKS {
            return Err(ConfigError::TimeoutTooShort);
        }

        let (divisor, prescaler) = match select_divisor(cycles - SCL_FIXED_CYCLES) {
            Some(found) => found,
            None => return Err(ConfigError::BitRateTooLow),
        };

        let period = SCL_FIXED_CYCLES + 2 * divisor as u32 * prescaler.factor();
        let ticks = period * self.timeout_clocks as u32 + 1;
        if ticks > u16::MAX as u32 {
            return Err(ConfigError::TimeoutOverflow);
        }

        Ok(BusTiming {
            divisor,
            prescaler,
            timeout_ticks: ticks as u16,
        })
    }
}

/// Smallest prescaler whose divisor for `variable_cycles` fits in a byte
const fn select_divisor(variable_cycles: u32) -> Option<(u8, Prescaler)> {
    let mut i = 0;
    while i < Prescaler::ALL.len() {
        let prescaler = Prescaler::ALL[i];
        let divisor = variable_cycles / (2 * prescaler.factor());
        if divisor <= u8::MAX as u32 {
            return Some((divisor as u8, prescaler));
        }
        i += 1;
    }
    None
}
