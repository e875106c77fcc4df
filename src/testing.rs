//! Testing utilities and mock implementations
//!
//! Host-side stand-ins for the pieces that live outside this crate on real
//! hardware: the CPU's interrupt enable flag, the TWI interrupt handler (bus
//! engine), and the bring-up registers.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::boxed::Box;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::vec::Vec;

use crate::driver::master::{EngineSignal, TwiMaster};
use crate::driver::transaction::{AddressRw, Callback, Completion, Status, Transaction};
use crate::hal::bus::BusRegisters;
use crate::hal::irq::InterruptControl;
use crate::hal::timing::{BusTiming, TwiConfig};

// =============================================================================
// Simulated CPU
// =============================================================================

type Handler = Box<dyn FnMut() + Send>;

/// Single-core CPU with one interrupt line
///
/// Models the AVR rules the blocking bridge depends on:
/// - after `enable`, one more instruction ([`relax`](InterruptControl::relax))
///   runs before a pending interrupt is taken;
/// - the interrupt handler runs with interrupts disabled;
/// - a `disable` issued before that instruction leaves the interrupt
///   unserviced, which is counted in [`lost`](Self::lost).
///
/// [`EngineSignal::start`] raises the interrupt line, like the bus engine
/// issuing a START with TWIE set.
pub struct SimulatedCpu {
    enabled: AtomicBool,
    shadow: AtomicBool,
    pending: AtomicBool,
    raise_on_enable: AtomicBool,
    serviced: AtomicUsize,
    lost: AtomicUsize,
    kicks: AtomicUsize,
    handler: Mutex<Option<Handler>>,
}

impl Default for SimulatedCpu {
    fn default() -> Self {
        Self::new()
    }
}

impl SimulatedCpu {
    /// Interrupts disabled, nothing pending, no handler
    pub const fn new() -> Self {
        Self {
            enabled: AtomicBool::new(false),
            shadow: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            raise_on_enable: AtomicBool::new(false),
            serviced: AtomicUsize::new(0),
            lost: AtomicUsize::new(0),
            kicks: AtomicUsize::new(0),
            handler: Mutex::new(None),
        }
    }

    pub fn leak() -> &'static Self {
        Box::leak(Box::new(Self::new()))
    }

    /// Install the interrupt handler
    pub fn set_handler(&self, handler: impl FnMut() + Send + 'static) {
        *self.handler.lock().unwrap() = Some(Box::new(handler));
    }

    /// Assert the interrupt line
    pub fn raise(&self) {
        self.pending.store(true, Ordering::SeqCst);
    }

    /// Deassert the interrupt line
    pub fn clear_pending(&self) {
        self.pending.store(false, Ordering::SeqCst);
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::SeqCst)
    }

    /// Make every `enable` coincide with a freshly raised interrupt
    pub fn set_raise_on_enable(&self, on: bool) {
        self.raise_on_enable.store(on, Ordering::SeqCst);
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Interrupts that were pending when disabled inside the post-enable window
    pub fn lost(&self) -> usize {
        self.lost.load(Ordering::SeqCst)
    }

    /// Interrupts taken
    pub fn serviced(&self) -> usize {
        self.serviced.load(Ordering::SeqCst)
    }

    /// Engine start signals received
    pub fn kicks(&self) -> usize {
        self.kicks.load(Ordering::SeqCst)
    }

    /// Take pending interrupts until the line stays low, as foreground code
    /// with interrupts enabled would
    pub fn run_pending(&self) {
        while self.is_pending() {
            self.service();
        }
    }

    fn service(&self) {
        self.pending.store(false, Ordering::SeqCst);
        self.serviced.fetch_add(1, Ordering::SeqCst);

        let was_enabled = self.enabled.swap(false, Ordering::SeqCst);
        let handler = self.handler.lock().unwrap().take();
        if let Some(mut handler) = handler {
            handler();
            let mut slot = self.handler.lock().unwrap();
            if slot.is_none() {
                *slot = Some(handler);
            }
        }
        // reti
        self.enabled.store(was_enabled, Ordering::SeqCst);
    }
}

impl InterruptControl for SimulatedCpu {
    type State = bool;

    fn save_and_disable(&self) -> bool {
        let was = self.is_enabled();
        self.disable();
        was
    }

    fn restore(&self, state: bool) {
        if state {
            self.enable();
        } else {
            self.disable();
        }
    }

    fn enable(&self) {
        if !self.enabled.swap(true, Ordering::SeqCst) {
            self.shadow.store(true, Ordering::SeqCst);
        }
        if self.raise_on_enable.load(Ordering::SeqCst) {
            self.raise();
        }
    }

    fn disable(&self) {
        if self.shadow.swap(false, Ordering::SeqCst) && self.is_pending() {
            self.lost.fetch_add(1, Ordering::SeqCst);
        }
        self.enabled.store(false, Ordering::SeqCst);
    }

    fn relax(&self) {
        self.shadow.store(false, Ordering::SeqCst);
        if self.is_enabled() && self.is_pending() {
            self.service();
        }
    }
}

impl EngineSignal for SimulatedCpu {
    fn start(&self) {
        self.kicks.fetch_add(1, Ordering::SeqCst);
        self.raise();
    }
}

// =============================================================================
// Simulated Bus Engine
// =============================================================================

/// Master wired to a [`SimulatedCpu`] for both interrupt control and signalling
pub type SimMaster<const N: usize> = TwiMaster<N, &'static SimulatedCpu, &'static SimulatedCpu>;

/// Step-wise stand-in for the TWI interrupt handler
///
/// Each [`step`](Self::step) is one interrupt: it either completes the
/// transaction in flight or dispatches the next one, then re-raises the
/// interrupt while work remains. Barriers are retired in a single step.
///
/// A stalled slave keeps the transaction in flight; each step then advances
/// the timeout timer by one SCL period until the threshold from
/// [`BusTiming`] is reached and the transaction reports `TIMEOUT`.
pub struct SimulatedBus {
    cpu: &'static SimulatedCpu,
    timing: BusTiming,
    stalled: AtomicBool,
    elapsed: AtomicU32,
    outcomes: Mutex<VecDeque<Status>>,
    read_data: Mutex<VecDeque<u8>>,
    writes: Mutex<Vec<(AddressRw, Vec<u8>)>>,
    dispatched: Mutex<Vec<AddressRw>>,
}

impl SimulatedBus {
    pub fn leak(cpu: &'static SimulatedCpu, timing: BusTiming) -> &'static Self {
        Box::leak(Box::new(Self {
            cpu,
            timing,
            stalled: AtomicBool::new(false),
            elapsed: AtomicU32::new(0),
            outcomes: Mutex::new(VecDeque::new()),
            read_data: Mutex::new(VecDeque::new()),
            writes: Mutex::new(Vec::new()),
            dispatched: Mutex::new(Vec::new()),
        }))
    }

    pub fn timing(&self) -> BusTiming {
        self.timing
    }

    /// Slave holds the bus: in-flight transactions only end by timeout
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.store(stalled, Ordering::SeqCst);
    }

    /// Timer cycles since the current transaction went in flight
    pub fn elapsed(&self) -> u32 {
        self.elapsed.load(Ordering::SeqCst)
    }

    /// Status for the next completed non-barrier transaction (default `SUCCESS`)
    pub fn push_outcome(&self, status: Status) {
        self.outcomes.lock().unwrap().push_back(status);
    }

    /// Bytes the slave returns to reads (`0xFF` once exhausted)
    pub fn push_read_data(&self, data: &[u8]) {
        self.read_data.lock().unwrap().extend(data.iter().copied());
    }

    /// Completed writes in bus order
    pub fn writes(&self) -> Vec<(AddressRw, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }

    /// Address bytes in dispatch order (barriers included)
    pub fn dispatched(&self) -> Vec<AddressRw> {
        self.dispatched.lock().unwrap().clone()
    }

    /// One TWI interrupt
    pub fn step<const N: usize, I, S>(&self, master: &TwiMaster<N, I, S>)
    where
        I: InterruptControl,
        S: EngineSignal,
    {
        if master.has_callback() {
            self.advance(master);
        } else if let Some(barrier) = master.with_command(|txn| self.transfer(txn)) {
            master.done_command();
            self.elapsed.store(0, Ordering::SeqCst);
            if barrier {
                master.finish(Status::SUCCESS);
            }
        }

        if master.has_command() || master.has_callback() {
            self.cpu.raise();
        }
    }

    fn advance<const N: usize, I, S>(&self, master: &TwiMaster<N, I, S>)
    where
        I: InterruptControl,
        S: EngineSignal,
    {
        if self.stalled.load(Ordering::SeqCst) {
            let elapsed = self
                .elapsed
                .fetch_add(self.timing.scl_cycles(), Ordering::SeqCst)
                + self.timing.scl_cycles();
            if elapsed >= u32::from(self.timing.timeout_ticks) {
                master.finish(Status::TIMEOUT);
            }
            return;
        }

        let status = self
            .outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Status::SUCCESS);
        master.finish(status);
    }

    /// Move the data; returns true for a barrier
    fn transfer(&self, txn: &mut Transaction) -> bool {
        let address = txn.address();
        self.dispatched.lock().unwrap().push(address);
        if txn.is_empty() {
            return true;
        }

        if address.is_read() {
            let mut source = self.read_data.lock().unwrap();
            for byte in txn.buffer_mut() {
                *byte = source.pop_front().unwrap_or(0xFF);
            }
        } else {
            let data = txn.buffer_mut().to_vec();
            self.writes.lock().unwrap().push((address, data));
        }
        false
    }
}

/// CPU, bus engine and master wired together and leaked for `'static` use
pub struct Rig<const N: usize> {
    pub cpu: &'static SimulatedCpu,
    pub bus: &'static SimulatedBus,
    pub master: &'static SimMaster<N>,
}

impl<const N: usize> Default for Rig<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Rig<N> {
    /// Default timing, interrupts initially enabled
    pub fn new() -> Self {
        Self::with_timing(TwiConfig::default().timing().unwrap())
    }

    pub fn with_timing(timing: BusTiming) -> Self {
        let cpu = SimulatedCpu::leak();
        let bus = SimulatedBus::leak(cpu, timing);
        let master: &'static SimMaster<N> = Box::leak(Box::new(SimMaster::<N>::new(cpu, cpu)));
        cpu.set_handler(move || bus.step(master));
        cpu.enable();
        cpu.relax();
        Self { cpu, bus, master }
    }
}

// =============================================================================
// Recording Callback
// =============================================================================

/// A completion as seen by a callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub address: AddressRw,
    pub status: Status,
    pub data: Vec<u8>,
}

/// Callback that records every completion it receives
#[derive(Debug, Default)]
pub struct Recorder {
    records: Mutex<Vec<Record>>,
}

impl Recorder {
    pub fn leak() -> &'static Self {
        Box::leak(Box::new(Self::default()))
    }

    pub fn completions(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

impl Callback for Recorder {
    fn on_complete(&self, completion: Completion<'_>) {
        self.records.lock().unwrap().push(Record {
            address: completion.address(),
            status: completion.status(),
            data: completion.buffer().to_vec(),
        });
    }
}

/// Leak a zeroed buffer for the non-blocking calls
pub fn leak_buffer(len: usize) -> &'static mut [u8] {
    Box::leak(std::vec![0u8; len].into_boxed_slice())
}

/// Leak a buffer holding `data`
pub fn leak_data(data: &[u8]) -> &'static mut [u8] {
    Box::leak(data.to_vec().into_boxed_slice())
}

// =============================================================================
// Mock Bus Registers
// =============================================================================

/// A register write made during bring-up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusWrite {
    BitRate(u8),
    Prescaler(u8),
    TwiControl(u8),
    TimerControl(u8, u8),
    TimerIntMask(u8),
    TimerFlagsCleared,
    TimerCompare(u16),
}

/// Register file that logs every write
#[derive(Debug, Default)]
pub struct MockBusRegisters {
    log: Vec<BusWrite>,
}

impl MockBusRegisters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<BusWrite> {
        self.log.clone()
    }

    /// Last value written to TWCR (0 if never written)
    pub fn twi_control(&self) -> u8 {
        self.log
            .iter()
            .rev()
            .find_map(|write| match write {
                BusWrite::TwiControl(value) => Some(*value),
                _ => None,
            })
            .unwrap_or(0)
    }
}

impl BusRegisters for MockBusRegisters {
    fn write_bit_rate(&mut self, divisor: u8) {
        self.log.push(BusWrite::BitRate(divisor));
    }

    fn write_prescaler(&mut self, twps: u8) {
        self.log.push(BusWrite::Prescaler(twps));
    }

    fn write_twi_control(&mut self, value: u8) {
        self.log.push(BusWrite::TwiControl(value));
    }

    fn write_timer_control(&mut self, control_a: u8, control_b: u8) {
        self.log.push(BusWrite::TimerControl(control_a, control_b));
    }

    fn write_timer_int_mask(&mut self, value: u8) {
        self.log.push(BusWrite::TimerIntMask(value));
    }

    fn clear_timer_flags(&mut self) {
        self.log.push(BusWrite::TimerFlagsCleared);
    }

    fn write_timer_compare(&mut self, ticks: u16) {
        self.log.push(BusWrite::TimerCompare(ticks));
    }
}
