//! Synchronization support
//!
//! Everything the foreground and the TWI interrupt share goes through
//! [`CriticalSectionCell`]: a `critical_section::Mutex<RefCell<T>>` that
//! disables interrupts for the duration of each access.
//!
//! The critical-section implementation itself comes from the application's
//! runtime crate (for AVR, `avr-device` with `critical-section-impl`).

mod primitives;

pub use primitives::CriticalSectionCell;
