//! Core components of the TWI master.
//!
//! - [`error`] - Error types and result aliases
//! - [`transaction`] - Addresses, status flags, transaction records, callbacks
//! - [`queue`] - The three-cursor command ring
//! - [`master`] - The queue front end: enqueue, blocking calls, engine interface
//!
//! # Example
//!
//! ```ignore
//! use ph_twi_master::driver::{Address, Completion, Error};
//!
//! fn on_done(done: Completion<'_>) {
//!     if done.status().is_timeout() { /* ... */ }
//! }
//! ```

// Submodules
mod bridge;
pub mod error;
pub mod master;
pub mod queue;
pub mod transaction;

// Re-exports for convenience
pub use error::{
    ConfigError, ConfigResult, EnqueueError, EnqueueResult, Error, Result, TransferError,
    TransferResult,
};
pub use master::{EngineSignal, TwiMaster, TwiMasterDefault, TwiMasterSmall};
pub use queue::CommandQueue;
pub use transaction::{Address, AddressRw, Callback, Completion, Direction, Status, Transaction};
