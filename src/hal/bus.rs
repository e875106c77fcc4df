//! TWI bus bring-up
//!
//! [`initialize`] programs the bit rate, enables the TWI controller with its
//! interrupt masked (the bus engine unmasks it when it issues a START), and
//! sets up the timeout timer: CTC mode straight off the CPU clock, compare
//! threshold from [`BusTiming::timeout_ticks`], interrupt masked, flags
//! cleared. Restarting and polling the timer per transaction is left to the
//! bus engine ([`Atmega2560Registers::restart_timeout`],
//! [`Atmega2560Registers::timeout_expired`]).

use crate::driver::error::ConfigResult;
use crate::hal::timing::{BusTiming, TwiConfig};

use crate::internal::register::timer::{TCCR5A_COM5A0, TCCR5B_CS50, TCCR5B_WGM52};
use crate::internal::register::twi::TWCR_TWEN;

#[cfg(feature = "atmega2560")]
use crate::internal::constants::TWSR_STATUS_MASK;
#[cfg(feature = "atmega2560")]
use crate::internal::register::{
    timer::{TIFR5_CLEAR_ALL, TIFR5_OCF5A, TimerRegs},
    twi::TwiRegs,
};

/// TWCR at rest: controller enabled, interrupt masked
pub const TWCR_ENABLED: u8 = TWCR_TWEN;

/// TCCR5A with the debug pin toggle
pub const TCCR5A_TOGGLE_OC5A: u8 = TCCR5A_COM5A0;

/// TCCR5B: CTC mode (TOP = OCR5A), clk/1
pub const TCCR5B_CTC_NO_PRESCALE: u8 = TCCR5B_WGM52 | TCCR5B_CS50;

// =============================================================================
// Register Seam
// =============================================================================

/// Registers touched at bring-up
///
/// Implemented by [`Atmega2560Registers`] for the real chip; tests use a
/// recording mock.
pub trait BusRegisters {
    /// TWBR
    fn write_bit_rate(&mut self, divisor: u8);

    /// TWPS bits of TWSR (the status bits are read-only)
    fn write_prescaler(&mut self, twps: u8);

    /// TWCR
    fn write_twi_control(&mut self, value: u8);

    /// TCCR5A and TCCR5B
    fn write_timer_control(&mut self, control_a: u8, control_b: u8);

    /// TIMSK5
    fn write_timer_int_mask(&mut self, value: u8);

    /// Clear every TIFR5 flag
    fn clear_timer_flags(&mut self);

    /// OCR5A
    fn write_timer_compare(&mut self, ticks: u16);
}

impl<T: BusRegisters + ?Sized> BusRegisters for &mut T {
    fn write_bit_rate(&mut self, divisor: u8) {
        (**self).write_bit_rate(divisor);
    }

    fn write_prescaler(&mut self, twps: u8) {
        (**self).write_prescaler(twps);
    }

    fn write_twi_control(&mut self, value: u8) {
        (**self).write_twi_control(value);
    }

    fn write_timer_control(&mut self, control_a: u8, control_b: u8) {
        (**self).write_timer_control(control_a, control_b);
    }

    fn write_timer_int_mask(&mut self, value: u8) {
        (**self).write_timer_int_mask(value);
    }

    fn clear_timer_flags(&mut self) {
        (**self).clear_timer_flags();
    }

    fn write_timer_compare(&mut self, ticks: u16) {
        (**self).write_timer_compare(ticks);
    }
}

// =============================================================================
// Bring-up
// =============================================================================

/// Configure the TWI controller and the timeout timer
///
/// Call once, before the first transaction is queued.
///
/// # Errors
///
/// Any [`ConfigError`](crate::ConfigError) from [`TwiConfig::timing`]; no
/// register is written in that case.
pub fn initialize<R: BusRegisters>(regs: &mut R, config: &TwiConfig) -> ConfigResult<BusTiming> {
    let timing = config.timing()?;

    regs.write_bit_rate(timing.divisor);
    regs.write_prescaler(timing.prescaler.to_reg_value());
    regs.write_twi_control(TWCR_ENABLED);

    let control_a = if config.timeout_pin_toggle {
        TCCR5A_TOGGLE_OC5A
    } else {
        0
    };
    regs.write_timer_control(control_a, TCCR5B_CTC_NO_PRESCALE);
    regs.write_timer_int_mask(0);
    regs.clear_timer_flags();
    regs.write_timer_compare(timing.timeout_ticks);

    #[cfg(feature = "defmt")]
    defmt::debug!(
        "TWI up: TWBR={=u8} TWPS={} SCL={=u32}Hz timeout={=u16} ticks",
        timing.divisor,
        timing.prescaler,
        timing.bit_rate_hz(config.cpu_hz),
        timing.timeout_ticks
    );

    Ok(timing)
}

// =============================================================================
// ATmega2560 Backend
// =============================================================================

/// Register backend for the ATmega2560 TWI block and Timer/Counter 5
#[cfg(feature = "atmega2560")]
#[derive(Debug)]
pub struct Atmega2560Registers {
    _private: (),
}

#[cfg(feature = "atmega2560")]
impl Atmega2560Registers {
    /// Take the register blocks
    ///
    /// # Safety
    ///
    /// Must only run on an ATmega2560, and only one instance may exist.
    pub const unsafe fn steal() -> Self {
        Self { _private: () }
    }

    /// Restart the timeout window for a new transaction
    ///
    /// Clears the counter and the compare-match flag.
    pub fn restart_timeout(&mut self) {
        critical_section::with(|_| {
            TimerRegs::set_count(0);
            TimerRegs::set_int_flags(TIFR5_OCF5A);
        });
    }

    /// The timer reached its threshold since the last restart
    #[inline]
    pub fn timeout_expired(&self) -> bool {
        TimerRegs::int_flags() & TIFR5_OCF5A != 0
    }

    /// TWI status code (prescaler bits masked off)
    #[inline]
    pub fn twi_status(&self) -> u8 {
        TwiRegs::status() & TWSR_STATUS_MASK
    }
}

#[cfg(feature = "atmega2560")]
impl BusRegisters for Atmega2560Registers {
    fn write_bit_rate(&mut self, divisor: u8) {
        TwiRegs::set_bit_rate(divisor);
    }

    fn write_prescaler(&mut self, twps: u8) {
        TwiRegs::set_prescaler(twps);
    }

    fn write_twi_control(&mut self, value: u8) {
        TwiRegs::set_control(value);
    }

    fn write_timer_control(&mut self, control_a: u8, control_b: u8) {
        TimerRegs::set_control_a(control_a);
        TimerRegs::set_control_b(control_b);
    }

    fn write_timer_int_mask(&mut self, value: u8) {
        TimerRegs::set_int_mask(value);
    }

    fn clear_timer_flags(&mut self) {
        TimerRegs::set_int_flags(TIFR5_CLEAR_ALL);
    }

    fn write_timer_compare(&mut self, ticks: u16) {
        // 16-bit writes go through the shared TEMP register
        critical_section::with(|_| TimerRegs::set_compare_a(ticks));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::error::ConfigError;
    use crate::internal::register::twi::TWCR_TWIE;
    use crate::testing::{BusWrite, MockBusRegisters};

    #[test]
    fn default_bring_up_sequence() {
        let mut regs = MockBusRegisters::new();
        let timing = initialize(&mut regs, &TwiConfig::default()).unwrap();

        assert_eq!(timing.timeout_ticks, 1281);
        assert_eq!(
            regs.writes(),
            [
                BusWrite::BitRate(0x0C),
                BusWrite::Prescaler(0),
                BusWrite::TwiControl(TWCR_ENABLED),
                BusWrite::TimerControl(0, TCCR5B_CTC_NO_PRESCALE),
                BusWrite::TimerIntMask(0),
                BusWrite::TimerFlagsCleared,
                BusWrite::TimerCompare(1281),
            ]
        );
    }

    #[test]
    fn twi_interrupt_stays_masked() {
        let mut regs = MockBusRegisters::new();
        initialize(&mut regs, &TwiConfig::default()).unwrap();
        assert_eq!(regs.twi_control() & TWCR_TWIE, 0);
        assert_ne!(regs.twi_control() & TWCR_ENABLED, 0);
    }

    #[test]
    fn pin_toggle_sets_compare_output_mode() {
        let mut regs = MockBusRegisters::new();
        let config = TwiConfig::new().with_timeout_pin_toggle(true);
        initialize(&mut regs, &config).unwrap();
        assert!(
            regs.writes()
                .contains(&BusWrite::TimerControl(TCCR5A_TOGGLE_OC5A, TCCR5B_CTC_NO_PRESCALE))
        );
    }

    #[test]
    fn invalid_config_writes_nothing() {
        let mut regs = MockBusRegisters::new();
        let config = TwiConfig::new().with_timeout_clocks(1);
        assert_eq!(initialize(&mut regs, &config), Err(ConfigError::TimeoutTooShort));
        assert!(regs.writes().is_empty());
    }

    #[test]
    fn threshold_follows_bit_rate() {
        let mut regs = MockBusRegisters::new();
        let config = TwiConfig::new().with_bit_rate(100_000);
        initialize(&mut regs, &config).unwrap();
        assert!(regs.writes().contains(&BusWrite::BitRate(72)));
        assert!(regs.writes().contains(&BusWrite::TimerCompare(5121)));
    }
}
