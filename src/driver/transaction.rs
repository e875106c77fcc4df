//! Transaction records and completion callbacks.
//!
//! A [`Transaction`] is one slot of the command queue: the borrowed data
//! buffer, the address byte (7-bit address plus R/W flag), the status written
//! by the bus engine, and an optional [`Callback`].

use core::ptr::NonNull;

use crate::driver::error::{ConfigError, ConfigResult, TransferError, TransferResult};
use crate::internal::constants::{
    MAX_ADDRESS, STATUS_SUCCESS_BIT, STATUS_TIMEOUT_BIT, TWI_ADR_BITS, TWI_READ_BIT,
};

// =============================================================================
// Addressing
// =============================================================================

/// 7-bit slave address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Address(u8);

impl Address {
    /// Validate a raw 7-bit address
    pub const fn new(raw: u8) -> ConfigResult<Self> {
        if raw > MAX_ADDRESS {
            Err(ConfigError::InvalidAddress)
        } else {
            Ok(Self(raw))
        }
    }

    /// Raw 7-bit value
    #[inline(always)]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Address {
    type Error = ConfigError;

    fn try_from(raw: u8) -> ConfigResult<Self> {
        Self::new(raw)
    }
}

/// Transfer direction, encoded in the R/W bit of the address byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Direction {
    /// Master transmits (SLA+W)
    Write = 0,
    /// Master receives (SLA+R)
    Read = 1,
}

/// Address byte as it goes on the wire: `address << 1 | R/W`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressRw(u8);

impl AddressRw {
    /// Placeholder carried by barriers, never put on the bus
    pub(crate) const BARRIER: Self = Self(0);

    /// Encode an address and direction
    #[inline(always)]
    pub const fn new(address: Address, direction: Direction) -> Self {
        Self((address.0 << TWI_ADR_BITS) | ((direction as u8) << TWI_READ_BIT))
    }

    /// The byte to load into TWDR after the START condition
    #[inline(always)]
    pub const fn to_byte(self) -> u8 {
        self.0
    }

    /// Slave address part
    #[inline(always)]
    pub const fn address(self) -> Address {
        Address(self.0 >> TWI_ADR_BITS)
    }

    /// Direction part
    #[inline(always)]
    pub const fn direction(self) -> Direction {
        if self.0 & (1 << TWI_READ_BIT) != 0 {
            Direction::Read
        } else {
            Direction::Write
        }
    }

    /// True for SLA+R
    #[inline(always)]
    pub const fn is_read(self) -> bool {
        matches!(self.direction(), Direction::Read)
    }
}

// =============================================================================
// Status
// =============================================================================

/// Transaction status flags written by the bus engine
///
/// `SUCCESS` and `TIMEOUT` are the only recognized bits. A finished
/// transaction with neither set failed on the bus (NACK, arbitration loss).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(u8);

impl Status {
    /// Transfer completed without error
    pub const SUCCESS: Self = Self(1 << STATUS_SUCCESS_BIT);
    /// Timeout timer expired before completion
    pub const TIMEOUT: Self = Self(1 << STATUS_TIMEOUT_BIT);
    /// No flags: pending, or failed on the bus once completed
    pub const NONE: Self = Self(0);

    /// Build from raw bits
    #[inline(always)]
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    /// Raw bits
    #[inline(always)]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// True if every flag of `other` is set
    #[inline(always)]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// `SUCCESS` bit set
    #[inline(always)]
    pub const fn is_success(self) -> bool {
        self.contains(Self::SUCCESS)
    }

    /// `TIMEOUT` bit set
    #[inline(always)]
    pub const fn is_timeout(self) -> bool {
        self.contains(Self::TIMEOUT)
    }

    /// Neither `SUCCESS` nor `TIMEOUT`
    #[inline(always)]
    pub const fn is_bus_error(self) -> bool {
        !self.is_success() && !self.is_timeout()
    }

    /// Map the flags onto a transfer outcome
    pub const fn into_result(self) -> TransferResult<()> {
        if self.is_success() {
            Ok(())
        } else if self.is_timeout() {
            Err(TransferError::Timeout)
        } else {
            Err(TransferError::BusError)
        }
    }
}

impl core::ops::BitOr for Status {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// =============================================================================
// Buffer
// =============================================================================

/// Caller-owned buffer held by a queued transaction.
///
/// The queue never dereferences it; only the bus engine (through
/// [`Transaction::buffer_mut`]) and the completion callback do, and only while
/// the transaction is outstanding.
///
/// A buffer built from a `&'static mut` is `returnable`: its completion hands
/// the reference back (see [`Completion::into_static_buffer`]).
#[derive(Debug, Clone, Copy)]
pub(crate) struct RawBuffer {
    ptr: NonNull<u8>,
    len: usize,
    returnable: bool,
}

impl RawBuffer {
    /// Zero-length buffer used by barriers
    pub(crate) const EMPTY: Self = Self {
        ptr: NonNull::dangling(),
        len: 0,
        returnable: false,
    };

    /// Borrowed for the duration of a blocking call
    pub(crate) fn new(buffer: &mut [u8]) -> Self {
        let len = buffer.len();
        Self {
            // A slice pointer is never null, even for empty slices
            ptr: NonNull::from(buffer).cast(),
            len,
            returnable: false,
        }
    }

    /// Moved into the queue until the completion gives it back
    pub(crate) fn from_static(buffer: &'static mut [u8]) -> Self {
        Self {
            returnable: true,
            ..Self::new(buffer)
        }
    }

    pub(crate) const fn len(&self) -> usize {
        self.len
    }

    /// # Safety
    ///
    /// The borrow this buffer was created from must still be live and not
    /// aliased for `'a`.
    pub(crate) unsafe fn as_mut_slice<'a>(self) -> &'a mut [u8] {
        unsafe { core::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

// =============================================================================
// Callbacks
// =============================================================================

/// Completion capability stored with a transaction.
///
/// Invoked exactly once, from the bus engine's interrupt context, when the
/// completion cursor passes the transaction. Implementations must not block.
/// They may enqueue new (non-blocking) transactions.
///
/// Any `Fn(Completion<'_>) + Sync` closure or function is a callback:
///
/// ```ignore
/// fn on_temperature(done: Completion<'_>) {
///     if done.status().is_success() {
///         let raw = u16::from_be_bytes([done.buffer()[0], done.buffer()[1]]);
///         // ...
///     }
/// }
///
/// TWI.enqueue_read(SENSOR, buf, Some(&on_temperature))?;
/// ```
pub trait Callback: Sync {
    /// Called once the transaction's outcome is known
    fn on_complete(&self, completion: Completion<'_>);
}

impl<F> Callback for F
where
    F: Fn(Completion<'_>) + Sync,
{
    fn on_complete(&self, completion: Completion<'_>) {
        self(completion);
    }
}

/// View of a finished transaction handed to its [`Callback`]
///
/// The buffer borrow ends when the callback returns; after that the queue
/// forgets the buffer. A buffer that was queued as `&'static mut` can be
/// taken back with [`into_static_buffer`](Self::into_static_buffer) and
/// queued again:
///
/// ```ignore
/// static SPARE: CriticalSectionCell<Option<&'static mut [u8]>> = CriticalSectionCell::new(None);
///
/// fn on_sample(done: Completion<'_>) {
///     if let Some(buf) = done.into_static_buffer() {
///         SPARE.with(|spare| *spare = Some(buf));
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Completion<'a> {
    address: AddressRw,
    status: Status,
    buffer: &'a mut [u8],
    returnable: bool,
}

impl<'a> Completion<'a> {
    pub(crate) fn new(address: AddressRw, status: Status, buffer: &'a mut [u8]) -> Self {
        Self {
            address,
            status,
            buffer,
            returnable: false,
        }
    }

    fn returning(mut self) -> Self {
        self.returnable = true;
        self
    }

    /// Final status flags
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Address byte the transaction targeted
    #[inline]
    pub fn address(&self) -> AddressRw {
        self.address
    }

    /// Transferred data (received bytes for reads)
    #[inline]
    pub fn buffer(&self) -> &[u8] {
        self.buffer
    }

    /// Mutable access to the transferred data
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        self.buffer
    }

    /// Zero-length barrier transaction
    #[inline]
    pub fn is_barrier(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Take back the buffer of a transaction queued with `&'static mut`.
    ///
    /// `None` for barriers and for the borrowed buffers of blocking calls.
    pub fn into_static_buffer(self) -> Option<&'static mut [u8]> {
        if !self.returnable {
            return None;
        }
        let buffer = self.buffer;
        // SAFETY: the buffer was moved into the queue as `&'static mut` and
        // the record it came from has been consumed, so this is the only
        // reference left.
        Some(unsafe { core::slice::from_raw_parts_mut(buffer.as_mut_ptr(), buffer.len()) })
    }
}

// =============================================================================
// Transaction Record
// =============================================================================

/// One slot of the command queue.
///
/// Records only exist inside the queue; the bus engine reaches them through
/// [`TwiMaster::with_command`](crate::TwiMaster::with_command) and
/// [`TwiMaster::with_callback`](crate::TwiMaster::with_callback).
pub struct Transaction {
    buffer: RawBuffer,
    address: AddressRw,
    status: Status,
    callback: Option<&'static dyn Callback>,
}

impl Transaction {
    /// An unused slot
    pub(crate) const EMPTY: Self = Self {
        buffer: RawBuffer::EMPTY,
        address: AddressRw::BARRIER,
        status: Status::NONE,
        callback: None,
    };

    /// Fill a freshly allocated slot
    pub(crate) fn populate(
        &mut self,
        address: AddressRw,
        buffer: RawBuffer,
        callback: Option<&'static dyn Callback>,
    ) {
        self.buffer = buffer;
        self.address = address;
        self.status = Status::NONE;
        self.callback = callback;
    }

    /// Address byte to send after START
    #[inline]
    pub fn address(&self) -> AddressRw {
        self.address
    }

    /// Number of bytes to transfer
    #[inline]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Zero-length barrier: the engine retires it without touching the bus
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buffer.len() == 0
    }

    /// Status flags (set by the engine before `done_callback`)
    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// Record the outcome of the transaction
    #[inline]
    pub fn set_status(&mut self, status: Status) {
        self.status = status;
    }

    /// Whether a completion callback is attached
    #[inline]
    pub fn has_callback(&self) -> bool {
        self.callback.is_some()
    }

    /// Data buffer: bytes to send for writes, destination for reads
    #[inline]
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        // SAFETY: a record is only reachable through the queue while it is
        // outstanding, and the enqueue contract keeps the caller's borrow
        // alive and untouched until the completion callback has returned.
        unsafe { self.buffer.as_mut_slice() }
    }

    /// Take the record out, leaving the slot empty
    pub(crate) fn take(&mut self) -> Self {
        core::mem::replace(self, Self::EMPTY)
    }

    /// Fire the callback, if any, consuming the record
    pub(crate) fn complete(self) {
        if let Some(callback) = self.callback {
            // SAFETY: see `buffer_mut`; the borrow ends with this call.
            let buffer = unsafe { self.buffer.as_mut_slice() };
            let completion = Completion::new(self.address, self.status, buffer);
            callback.on_complete(if self.buffer.returnable {
                completion.returning()
            } else {
                completion
            });
        }
    }
}

impl core::fmt::Debug for Transaction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Transaction")
            .field("address", &self.address)
            .field("len", &self.len())
            .field("status", &self.status)
            .field("has_callback", &self.has_callback())
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================
