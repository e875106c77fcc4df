//! Error types for the TWI master
//!
//! Errors are organized by domain:
//! - [`ConfigError`]: bus timing and address validation at bring-up
//! - [`EnqueueError`]: the command queue refused a transaction
//! - [`TransferError`]: the bus engine reported a failed transaction
//!
//! The unified [`Error`] enum wraps all domain errors and is returned by the
//! blocking calls.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and bring-up errors
///
/// These errors occur while computing the bus clock divisor or the timeout
/// threshold, or when validating a slave address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Requested bit rate needs a divisor below zero
    BitRateTooHigh,
    /// Requested bit rate needs a divisor above 255 even with the largest prescaler
    BitRateTooLow,
    /// Timeout shorter than the shortest possible single-byte transaction
    TimeoutTooShort,
    /// Timeout threshold does not fit the 16-bit timer
    TimeoutOverflow,
    /// Slave address outside the 7-bit range
    InvalidAddress,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::BitRateTooHigh => "bit rate too high for CPU clock",
            ConfigError::BitRateTooLow => "bit rate too low for CPU clock",
            ConfigError::TimeoutTooShort => "timeout shorter than one byte transfer",
            ConfigError::TimeoutOverflow => "timeout overflows 16-bit timer",
            ConfigError::InvalidAddress => "invalid 7-bit address",
        }
    }
}

// =============================================================================
// Enqueue Errors
// =============================================================================

/// Command queue errors
///
/// `QueueFull` and `BlockingInProgress` are transient: retry once the bus
/// engine has retired some work. `CalledFromCallback` is a usage error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EnqueueError {
    /// Every usable slot holds an outstanding transaction
    QueueFull,
    /// A blocking call is already waiting on the bridge
    BlockingInProgress,
    /// Blocking call made from a completion callback
    CalledFromCallback,
}

impl core::fmt::Display for EnqueueError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl EnqueueError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            EnqueueError::QueueFull => "command queue full",
            EnqueueError::BlockingInProgress => "blocking call already in progress",
            EnqueueError::CalledFromCallback => "blocking call from a completion callback",
        }
    }
}

// =============================================================================
// Transfer Errors
// =============================================================================

/// Failed transaction, as reported by the bus engine through the status bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferError {
    /// Timeout timer expired before the transaction completed
    Timeout,
    /// Bus-level failure (NACK, arbitration loss, ...); detail stays with the engine
    BusError,
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransferError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransferError::Timeout => "transaction timed out",
            TransferError::BusError => "bus error",
        }
    }
}

impl embedded_hal::i2c::Error for TransferError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            // The status bits do not tell a NACK from arbitration loss
            TransferError::BusError => embedded_hal::i2c::ErrorKind::Bus,
            TransferError::Timeout => embedded_hal::i2c::ErrorKind::Other,
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match TWI.write_blocking(addr, &mut buf, None) {
///     Err(Error::Transfer(TransferError::Timeout)) => { /* slave stalled */ }
///     Err(Error::Transfer(TransferError::BusError)) => { /* NACK etc. */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// Enqueue error
    Enqueue(EnqueueError),
    /// Transfer error
    Transfer(TransferError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Enqueue(e) => write!(f, "enqueue: {}", e.as_str()),
            Error::Transfer(e) => write!(f, "transfer: {}", e.as_str()),
        }
    }
}

impl embedded_hal::i2c::Error for Error {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        match self {
            Error::Transfer(e) => e.kind(),
            Error::Config(_) | Error::Enqueue(_) => embedded_hal::i2c::ErrorKind::Other,
        }
    }
}

// From impls for automatic conversion
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<EnqueueError> for Error {
    fn from(e: EnqueueError) -> Self {
        Error::Enqueue(e)
    }
}

impl From<TransferError> for Error {
    fn from(e: TransferError) -> Self {
        Error::Transfer(e)
    }
}

/// Result type alias for TWI operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for enqueue operations
pub type EnqueueResult<T> = core::result::Result<T, EnqueueError>;

/// Result type alias for transaction outcomes
pub type TransferResult<T> = core::result::Result<T, TransferError>;

// =============================================================================
// Unit Tests
// =============================================================================
