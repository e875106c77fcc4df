//! Timer/Counter 5 Register Definitions
//!
//! The 16-bit timer that bounds a single TWI transaction. It runs in CTC mode
//! straight off the CPU clock; the compare match on OCR5A marks a stalled bus.

#[cfg(feature = "atmega2560")]
use super::{OCR5AL, TCCR5A, TCCR5B, TCNT5L, TIFR5, TIMSK5, reg_rw, reg_w, reg16_w};

/// Compare output mode A bit 0: toggle OC5A on compare match
pub const TCCR5A_COM5A0: u8 = 1 << 6;

/// Waveform generation bit 2: CTC mode with TOP = OCR5A
pub const TCCR5B_WGM52: u8 = 1 << 3;
/// Clock select bit 0: clk/1, no prescaling
pub const TCCR5B_CS50: u8 = 1 << 0;

/// Output compare A match flag
pub const TIFR5_OCF5A: u8 = 1 << 1;
/// Writing ones clears every flag
pub const TIFR5_CLEAR_ALL: u8 = 0xFF;

/// Timer 5 register block accessor
#[cfg(feature = "atmega2560")]
pub struct TimerRegs;

#[cfg(feature = "atmega2560")]
impl TimerRegs {
    reg_w!(set_control_a, TCCR5A, "Timer 5 control register A");
    reg_w!(set_control_b, TCCR5B, "Timer 5 control register B");
    reg_w!(set_int_mask, TIMSK5, "Timer 5 interrupt mask register");
    reg_rw!(int_flags, set_int_flags, TIFR5, "Timer 5 interrupt flag register");
    reg16_w!(set_count, TCNT5L, "Timer 5 counter");
    reg16_w!(set_compare_a, OCR5AL, "Timer 5 output compare A");
}
