//! Testing utilities and mock implementations
//!
//! Mocks for the serial controller, a DMA channel and a delay source, plus
//! completion sinks, so the transfer engine can be exercised on the host.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::cell::RefCell;
use std::boxed::Box;
use std::collections::VecDeque;
use std::rc::Rc;
use std::sync::Mutex;
use std::vec;
use std::vec::Vec;

use crate::driver::config::{FifoConfig, LineConfig};
use crate::driver::error::{LineError, LineErrors};
use crate::driver::transfer::{
    Callback, Completion, ErrorHandler, ReadBuffer, Termination, WriteBuffer,
};
use crate::hal::{DmaChannel, DmaDirection, DmaMode, DmaSetup, InterruptId, SerialHw};

/// Fake data-register bus address reported by [`MockSerial`]
pub const MOCK_FIFO_ADDRESS: usize = 0x3FF4_0000;

/// Leak a zeroed buffer so it can be handed to the engine as `'static`
pub fn static_buf(len: usize) -> &'static mut [u8] {
    Box::leak(vec![0u8; len].into_boxed_slice())
}

// =============================================================================
// Mock Serial Controller
// =============================================================================

#[derive(Debug, Default)]
struct SerialState {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    rx_int: bool,
    tx_int: bool,
    ls_int: bool,
    timeout: bool,
    line_errors: LineErrors,
    busy_cycles: usize,
    busy_detect: bool,
    busy_clears: usize,
    tx_blocked: bool,
    tx_space: Option<usize>,
    applied: Option<(LineConfig, FifoConfig)>,
    dma_request_clears: usize,
    resets: usize,
}

impl SerialState {
    fn space_ready(&self) -> bool {
        !self.tx_blocked && self.tx_space != Some(0)
    }
}

/// Scripted serial controller.
///
/// Clones share state, so a test keeps one handle while the channel owns
/// another.
///
/// # Example
///
/// ```ignore
/// let serial = MockSerial::new();
/// let channel: Channel<MockSerial> = Channel::new(serial.clone());
/// serial.feed(b"abc");
/// channel.on_interrupt();
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockSerial {
    state: Rc<RefCell<SerialState>>,
}

impl MockSerial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes in the receive FIFO
    pub fn feed(&self, data: &[u8]) {
        self.state.borrow_mut().rx.extend(data.iter().copied());
    }

    /// Bytes still waiting in the receive FIFO
    pub fn pending_rx(&self) -> usize {
        self.state.borrow().rx.len()
    }

    /// Everything written so far
    pub fn sent(&self) -> Vec<u8> {
        self.state.borrow().tx.clone()
    }

    /// Latch a character timeout
    pub fn raise_timeout(&self) {
        self.state.borrow_mut().timeout = true;
    }

    pub fn raise_line_error(&self, error: LineError) {
        let mut state = self.state.borrow_mut();
        state.line_errors = state.line_errors.with(error);
    }

    pub fn raise_busy_detect(&self) {
        self.state.borrow_mut().busy_detect = true;
    }

    pub fn busy_clears(&self) -> usize {
        self.state.borrow().busy_clears
    }

    /// Report busy for the next `polls` calls to `is_busy`
    pub fn set_busy(&self, polls: usize) {
        self.state.borrow_mut().busy_cycles = polls;
    }

    pub fn busy_remaining(&self) -> usize {
        self.state.borrow().busy_cycles
    }

    /// Hold the transmitter full
    pub fn block_tx(&self, blocked: bool) {
        self.state.borrow_mut().tx_blocked = blocked;
    }

    /// Accept only `bytes` more writes before reporting full
    pub fn limit_tx_space(&self, bytes: usize) {
        self.state.borrow_mut().tx_space = Some(bytes);
    }

    pub fn rx_interrupt_enabled(&self) -> bool {
        self.state.borrow().rx_int
    }

    pub fn tx_interrupt_enabled(&self) -> bool {
        self.state.borrow().tx_int
    }

    pub fn line_status_interrupt_enabled(&self) -> bool {
        self.state.borrow().ls_int
    }

    /// Flip the receive enable behind the driver's back
    pub fn force_rx_interrupt(&self, enabled: bool) {
        self.state.borrow_mut().rx_int = enabled;
    }

    pub fn force_tx_interrupt(&self, enabled: bool) {
        self.state.borrow_mut().tx_int = enabled;
    }

    /// Last line settings applied
    pub fn applied(&self) -> Option<(LineConfig, FifoConfig)> {
        self.state.borrow().applied
    }

    pub fn dma_request_clears(&self) -> usize {
        self.state.borrow().dma_request_clears
    }

    pub fn resets(&self) -> usize {
        self.state.borrow().resets
    }

    /// Same value the trait reports, for comparing DMA setups
    pub fn fifo_address(&self) -> usize {
        MOCK_FIFO_ADDRESS
    }
}

impl SerialHw for MockSerial {
    fn byte_ready(&mut self) -> bool {
        !self.state.borrow().rx.is_empty()
    }

    fn space_ready(&mut self) -> bool {
        self.state.borrow().space_ready()
    }

    fn read_byte(&mut self) -> u8 {
        self.state.borrow_mut().rx.pop_front().unwrap_or(0)
    }

    fn write_byte(&mut self, byte: u8) {
        let mut state = self.state.borrow_mut();
        state.tx.push(byte);
        if let Some(space) = state.tx_space.as_mut() {
            *space = space.saturating_sub(1);
        }
    }

    fn is_busy(&mut self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.busy_cycles == 0 {
            return false;
        }
        state.busy_cycles -= 1;
        true
    }

    fn set_rx_interrupt(&mut self, enabled: bool) {
        self.state.borrow_mut().rx_int = enabled;
    }

    fn set_tx_interrupt(&mut self, enabled: bool) {
        self.state.borrow_mut().tx_int = enabled;
    }

    fn set_line_status_interrupt(&mut self, enabled: bool) {
        self.state.borrow_mut().ls_int = enabled;
    }

    fn pending_interrupt(&mut self) -> InterruptId {
        let mut state = self.state.borrow_mut();
        if state.ls_int && !state.line_errors.is_empty() {
            InterruptId::LineStatus
        } else if state.busy_detect {
            InterruptId::BusyDetected
        } else if state.rx_int && state.timeout {
            state.timeout = false;
            InterruptId::RxTimeout
        } else if state.rx_int && !state.rx.is_empty() {
            InterruptId::RxAvailable
        } else if state.tx_int && state.space_ready() {
            InterruptId::TxEmpty
        } else {
            InterruptId::None
        }
    }

    fn line_errors(&mut self) -> LineErrors {
        core::mem::take(&mut self.state.borrow_mut().line_errors)
    }

    fn apply_line_config(&mut self, line: &LineConfig, fifo: &FifoConfig) {
        self.state.borrow_mut().applied = Some((*line, *fifo));
    }

    fn fifo_address(&self) -> usize {
        MOCK_FIFO_ADDRESS
    }

    fn clear_dma_request(&mut self) {
        self.state.borrow_mut().dma_request_clears += 1;
    }

    fn clear_busy(&mut self) {
        let mut state = self.state.borrow_mut();
        state.busy_detect = false;
        state.busy_clears += 1;
    }

    fn reset(&mut self) {
        let mut state = self.state.borrow_mut();
        state.rx.clear();
        state.rx_int = false;
        state.tx_int = false;
        state.ls_int = false;
        state.timeout = false;
        state.line_errors = LineErrors::empty();
        state.resets += 1;
    }
}

// =============================================================================
// Mock DMA Channel
// =============================================================================

#[derive(Debug, Default)]
struct DmaState {
    number: u8,
    setup: Option<DmaSetup>,
    active: bool,
    frozen: bool,
    position: usize,
    trigger: Option<usize>,
    starts: usize,
    stops: usize,
}

/// DMA channel that moves bytes only when the test says so.
///
/// Peripheral-to-memory progress is simulated with [`deliver`](Self::deliver),
/// which writes into the programmed destination exactly as hardware would.
#[derive(Debug, Clone, Default)]
pub struct MockDma {
    state: Rc<RefCell<DmaState>>,
}

impl MockDma {
    pub fn new(number: u8) -> Self {
        let dma = Self::default();
        dma.state.borrow_mut().number = number;
        dma
    }

    /// Write received bytes into the destination.
    ///
    /// Returns true when the transfer finished (one-shot) or the trigger
    /// index was written (circular); the test then calls the channel's DMA
    /// completion entry point.
    pub fn deliver(&self, data: &[u8]) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(setup) = state.setup else {
            return false;
        };
        assert!(state.active, "deliver on a stopped channel");
        assert!(!state.frozen, "deliver while frozen");
        assert_eq!(setup.direction, DmaDirection::PeripheralToMemory);

        let mut fired = false;
        for &byte in data {
            let index = state.position;
            if index >= setup.length {
                break;
            }
            // SAFETY: dest and length come from a leaked test buffer
            // programmed through `configure`.
            unsafe { (setup.dest as *mut u8).add(index).write(byte) };
            match setup.mode {
                DmaMode::Normal => {
                    state.position += 1;
                    if state.position == setup.length {
                        state.active = false;
                        fired = true;
                    }
                }
                DmaMode::Circular => {
                    state.position = (index + 1) % setup.length;
                    if state.trigger == Some(index) {
                        state.trigger = None;
                        fired = true;
                    }
                }
            }
        }
        fired
    }

    /// Run a memory-to-peripheral transfer to the end and return the bytes
    pub fn take_sent(&self) -> Vec<u8> {
        let mut state = self.state.borrow_mut();
        let Some(setup) = state.setup else {
            return Vec::new();
        };
        assert_eq!(setup.direction, DmaDirection::MemoryToPeripheral);
        let start = state.position;
        // SAFETY: source and length come from the write buffer programmed
        // through `configure`.
        let sent = unsafe {
            core::slice::from_raw_parts((setup.source as *const u8).add(start), setup.length - start)
        }
        .to_vec();
        state.position = setup.length;
        state.active = false;
        sent
    }

    pub fn setup(&self) -> Option<DmaSetup> {
        self.state.borrow().setup
    }

    pub fn position(&self) -> usize {
        self.state.borrow().position
    }

    pub fn trigger(&self) -> Option<usize> {
        self.state.borrow().trigger
    }

    pub fn is_frozen(&self) -> bool {
        self.state.borrow().frozen
    }

    pub fn starts(&self) -> usize {
        self.state.borrow().starts
    }

    pub fn stops(&self) -> usize {
        self.state.borrow().stops
    }
}

impl DmaChannel for MockDma {
    fn number(&self) -> u8 {
        self.state.borrow().number
    }

    fn configure(&mut self, setup: &DmaSetup) {
        let mut state = self.state.borrow_mut();
        state.setup = Some(*setup);
        state.position = 0;
        state.trigger = None;
    }

    fn start(&mut self) {
        let mut state = self.state.borrow_mut();
        state.active = true;
        state.starts += 1;
    }

    fn stop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.active = false;
        state.trigger = None;
        state.stops += 1;
    }

    fn is_active(&self) -> bool {
        self.state.borrow().active
    }

    fn transferred_bytes(&self) -> usize {
        self.state.borrow().position
    }

    fn freeze(&mut self) {
        self.state.borrow_mut().frozen = true;
    }

    fn unfreeze(&mut self) {
        self.state.borrow_mut().frozen = false;
    }

    fn set_trigger_index(&mut self, index: usize) {
        self.state.borrow_mut().trigger = Some(index);
    }
}

// =============================================================================
// Mock Delay
// =============================================================================

/// Mock delay for testing without actual timing
///
/// Records delays for verification without actually waiting. An optional
/// hook runs on every delay, standing in for interrupts that would fire
/// while a blocking call waits.
#[derive(Default)]
pub struct MockDelay<'a> {
    /// Total nanoseconds delayed
    total_ns: RefCell<u64>,
    hook: Option<Box<dyn FnMut() + 'a>>,
}

impl<'a> MockDelay<'a> {
    /// Create a new mock delay
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay that runs `hook` after every wait
    pub fn with_hook(hook: Box<dyn FnMut() + 'a>) -> Self {
        Self {
            total_ns: RefCell::new(0),
            hook: Some(hook),
        }
    }

    /// Get total nanoseconds that were "delayed"
    pub fn total_ns(&self) -> u64 {
        *self.total_ns.borrow()
    }
}

impl embedded_hal::delay::DelayNs for MockDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        *self.total_ns.borrow_mut() += u64::from(ns);
        if let Some(hook) = self.hook.as_mut() {
            hook();
        }
    }
}

// =============================================================================
// Completion Sinks
// =============================================================================

/// One delivered completion, with the buffer contents copied out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub data: Vec<u8>,
    pub transferred: usize,
    pub reason: Termination,
}

impl Record {
    fn from_slice(buffer: &[u8], transferred: usize, reason: Termination) -> Self {
        Self {
            data: buffer[..transferred].to_vec(),
            transferred,
            reason,
        }
    }
}

/// Callback sink for both directions
#[derive(Debug, Default)]
pub struct Recorder {
    reads: Mutex<Vec<Record>>,
    writes: Mutex<Vec<Record>>,
}

impl Recorder {
    /// A `'static` recorder to pass as a callback
    pub fn leak() -> &'static Self {
        Box::leak(Box::default())
    }

    pub fn reads(&self) -> Vec<Record> {
        self.reads.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<Record> {
        self.writes.lock().unwrap().clone()
    }
}

impl Callback<ReadBuffer> for Recorder {
    fn complete(&self, completion: Completion<ReadBuffer>) {
        self.reads.lock().unwrap().push(Record::from_slice(
            completion.buffer,
            completion.transferred,
            completion.reason,
        ));
    }
}

impl Callback<WriteBuffer> for Recorder {
    fn complete(&self, completion: Completion<WriteBuffer>) {
        self.writes.lock().unwrap().push(Record::from_slice(
            completion.buffer,
            completion.transferred,
            completion.reason,
        ));
    }
}

/// Line-error sink
#[derive(Debug, Default)]
pub struct ErrorLog {
    errors: Mutex<Vec<LineError>>,
}

impl ErrorLog {
    pub fn leak() -> &'static Self {
        Box::leak(Box::default())
    }

    pub fn errors(&self) -> Vec<LineError> {
        self.errors.lock().unwrap().clone()
    }
}

impl ErrorHandler for ErrorLog {
    fn on_line_error(&self, error: LineError) {
        self.errors.lock().unwrap().push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::config::DmaBurst;

    #[test]
    fn serial_interrupt_priority() {
        let mut serial = MockSerial::new();
        assert_eq!(serial.pending_interrupt(), InterruptId::None);

        serial.set_rx_interrupt(true);
        serial.set_line_status_interrupt(true);
        serial.feed(b"a");
        serial.raise_line_error(LineError::Parity);
        assert_eq!(serial.pending_interrupt(), InterruptId::LineStatus);
        assert_eq!(serial.line_errors(), LineError::Parity.into());
        assert_eq!(serial.pending_interrupt(), InterruptId::RxAvailable);
    }

    #[test]
    fn dma_circular_wraps_and_fires_on_trigger() {
        let ring = static_buf(4);
        let mut dma = MockDma::new(0);
        dma.configure(&DmaSetup {
            direction: DmaDirection::PeripheralToMemory,
            source: MOCK_FIFO_ADDRESS,
            dest: ring.as_mut_ptr() as usize,
            length: 4,
            burst: DmaBurst::Disabled,
            priority: 0,
            mode: DmaMode::Circular,
        });
        dma.start();
        assert!(!dma.deliver(b"abc"));
        dma.set_trigger_index(0);
        assert!(dma.deliver(b"de"));
        assert_eq!(dma.position(), 1);
        assert_eq!(&ring[..], b"ebcd");
    }
}
