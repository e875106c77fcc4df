//! TWI Register Definitions
//!
//! Two-wire serial interface block of the ATmega2560:
//! - TWBR: bit rate divisor
//! - TWSR: status code (bits 7:3) and prescaler (bits 1:0)
//! - TWCR: control (enable, interrupt, START/STOP, ACK)

#[cfg(feature = "atmega2560")]
use super::{TWBR, TWCR, TWSR, modify_reg, reg_r, reg_rw, reg_w};

// =============================================================================
// Control Register (TWCR)
// =============================================================================

/// Interrupt flag; written 1 to clear and start the next bus action
pub const TWCR_TWINT: u8 = 1 << 7;
/// Enable acknowledge
pub const TWCR_TWEA: u8 = 1 << 6;
/// Generate START condition
pub const TWCR_TWSTA: u8 = 1 << 5;
/// Generate STOP condition
pub const TWCR_TWSTO: u8 = 1 << 4;
/// Write collision flag
pub const TWCR_TWWC: u8 = 1 << 3;
/// Enable the TWI controller and take over the SDA/SCL pins
pub const TWCR_TWEN: u8 = 1 << 2;
/// TWI interrupt enable
pub const TWCR_TWIE: u8 = 1 << 0;

// =============================================================================
// Status Register (TWSR)
// =============================================================================

/// Prescaler bit 1
pub const TWSR_TWPS1: u8 = 1 << 1;
/// Prescaler bit 0
pub const TWSR_TWPS0: u8 = 1 << 0;
/// Both prescaler bits
pub const TWSR_PRESCALER_MASK: u8 = TWSR_TWPS1 | TWSR_TWPS0;

/// TWI register block accessor
#[cfg(feature = "atmega2560")]
pub struct TwiRegs;

#[cfg(feature = "atmega2560")]
impl TwiRegs {
    reg_w!(set_bit_rate, TWBR, "TWI bit rate register");
    reg_r!(status, TWSR, "TWI status register");
    // The bus engine polls TWINT and issues START/STOP through TWCR
    reg_rw!(control, set_control, TWCR, "TWI control register");

    /// Replace the prescaler bits, leaving the status bits untouched
    #[inline(always)]
    pub fn set_prescaler(twps: u8) {
        // SAFETY: TWSR is a valid register on this chip
        unsafe { modify_reg(TWSR, |v| (v & !TWSR_PRESCALER_MASK) | (twps & TWSR_PRESCALER_MASK)) }
    }
}
