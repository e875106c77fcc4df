//! Internal Implementation Details
//!
//! This module contains implementation details that are not part of the public API.
//!
//! # Contents
//!
//! - [`register`]: Raw memory-mapped register definitions (TWI, Timer/Counter 5)
//! - [`constants`]: Internal constants and magic numbers
//!
//! # Stability
//!
//! **WARNING:** This module is `pub(crate)` only. Its contents may change
//! without notice.

pub(crate) mod constants;
pub(crate) mod register;
