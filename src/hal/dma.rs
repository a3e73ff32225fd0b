//! DMA channel abstraction.
//!
//! The engine programs a [`DmaChannel`] for one-shot transfers in either
//! direction and for perpetual circular capture on the receive side.
//! Completion is reported back by the application's DMA interrupt through
//! `Channel::on_dma_rx_complete` / `Channel::on_dma_tx_complete`.

use crate::driver::config::DmaBurst;

/// Transfer direction as seen from the DMA engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaDirection {
    /// Serial data register to memory (receive)
    PeripheralToMemory,
    /// Memory to serial data register (transmit)
    MemoryToPeripheral,
}

/// One-shot or circular operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaMode {
    /// Stop after `length` bytes and raise completion
    Normal,
    /// Wrap to the start of the buffer after `length` bytes, forever
    Circular,
}

/// Channel programming for one transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaSetup {
    /// Transfer direction
    pub direction: DmaDirection,
    /// Source bus address
    pub source: usize,
    /// Destination bus address
    pub dest: usize,
    /// Bytes to move (ring size in circular mode)
    pub length: usize,
    /// Burst width requested by the serial controller
    pub burst: DmaBurst,
    /// Channel priority
    pub priority: u8,
    /// One-shot or circular
    pub mode: DmaMode,
}

/// One DMA channel wired to a serial controller's request lines.
///
/// # Circular mode contract
///
/// While [`freeze`](DmaChannel::freeze) is in effect the hardware write
/// position must not move. Outside of a freeze it only moves forward,
/// wrapping at the configured length. The engine relies on both to compute
/// unread bytes as `(position - head) mod length`; a ring that laps its
/// reader is not detectable.
pub trait DmaChannel {
    /// Hardware channel number, used to validate rx/tx pairing
    fn number(&self) -> u8;

    /// Program addresses, length and mode. The channel stays stopped.
    fn configure(&mut self, setup: &DmaSetup);

    /// Start the programmed transfer
    fn start(&mut self);

    /// Stop the channel; the transferred count stays readable
    fn stop(&mut self);

    /// Channel is running. Aborts only stop a channel that reports active;
    /// a one-shot transfer that already finished is left alone.
    fn is_active(&self) -> bool;

    /// Bytes moved since `start`.
    ///
    /// In circular mode this is the current write index within the ring.
    fn transferred_bytes(&self) -> usize;

    /// Suspend request servicing so the write index is stable
    fn freeze(&mut self);

    /// Resume request servicing
    fn unfreeze(&mut self);

    /// Raise the completion interrupt once the byte at `index` is written
    fn set_trigger_index(&mut self, index: usize);
}

/// Placeholder for channels built without DMA.
///
/// Uninhabited: a `Channel<H, NoDma>` can never hold a DMA channel, so
/// every method body is unreachable.
#[derive(Debug)]
pub enum NoDma {}

impl DmaChannel for NoDma {
    fn number(&self) -> u8 {
        match *self {}
    }

    fn configure(&mut self, _setup: &DmaSetup) {
        match *self {}
    }

    fn start(&mut self) {
        match *self {}
    }

    fn stop(&mut self) {
        match *self {}
    }

    fn is_active(&self) -> bool {
        match *self {}
    }

    fn transferred_bytes(&self) -> usize {
        match *self {}
    }

    fn freeze(&mut self) {
        match *self {}
    }

    fn unfreeze(&mut self) {
        match *self {}
    }

    fn set_trigger_index(&mut self, _index: usize) {
        match *self {}
    }
}

/// Check the rx/tx channel pairing rules.
///
/// Receive must use the even channel of a pair and transmit the odd one of
/// the same pair. A missing direction is only checked for its own parity.
#[must_use]
pub const fn valid_pairing(rx: Option<u8>, tx: Option<u8>) -> bool {
    match (rx, tx) {
        (Some(rx), Some(tx)) => rx % 2 == 0 && tx == rx + 1,
        (Some(rx), None) => rx % 2 == 0,
        (None, Some(tx)) => tx % 2 == 1,
        (None, None) => true,
    }
}
