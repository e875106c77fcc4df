//! Hardware Abstraction Layer
//!
//! # Modules
//!
//! - [`irq`]: CPU interrupt enable control for the blocking calls
//! - [`timing`]: bit rate divisor and timeout threshold computation
//! - [`bus`]: bring-up of the TWI controller and the timeout timer

pub mod bus;
pub mod irq;
pub mod timing;

// Re-export commonly used types
#[cfg(feature = "atmega2560")]
pub use bus::Atmega2560Registers;
pub use bus::{BusRegisters, initialize};
#[cfg(feature = "avr")]
pub use irq::AvrInterrupts;
pub use irq::{InterruptControl, InterruptGuard};
pub use timing::{BusTiming, Prescaler, TwiConfig};
