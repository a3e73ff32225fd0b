//! Serial controller abstraction.
//!
//! [`SerialHw`] is the register-level seam: a board crate implements it for
//! its 16550-style UART and the channel engine drives everything else.

use crate::driver::config::{FifoConfig, LineConfig};
use crate::driver::error::LineErrors;

// =============================================================================
// Interrupt Identification
// =============================================================================

/// Pending interrupt source, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptId {
    /// Nothing pending
    None,
    /// Receiver line status (overrun, parity, framing, break)
    LineStatus,
    /// Received data reached the trigger level
    RxAvailable,
    /// Character timeout: data in the FIFO and the line went idle
    RxTimeout,
    /// Transmit holding register or FIFO below trigger level
    TxEmpty,
    /// Modem status change
    ModemStatus,
    /// Write to the line control register while the controller was busy
    BusyDetected,
}

impl InterruptId {
    /// Decode the 4-bit interrupt identification field of a 16550 IIR.
    ///
    /// Unknown codes decode as [`InterruptId::None`].
    #[must_use]
    pub const fn from_iir(iir: u8) -> Self {
        match iir & 0x0F {
            0x6 => InterruptId::LineStatus,
            0x4 => InterruptId::RxAvailable,
            0xC => InterruptId::RxTimeout,
            0x2 => InterruptId::TxEmpty,
            0x0 => InterruptId::ModemStatus,
            0x7 => InterruptId::BusyDetected,
            _ => InterruptId::None,
        }
    }

    /// Encode as the 4-bit interrupt identification field
    #[must_use]
    pub const fn to_iir(self) -> u8 {
        match self {
            InterruptId::None => 0x1,
            InterruptId::LineStatus => 0x6,
            InterruptId::RxAvailable => 0x4,
            InterruptId::RxTimeout => 0xC,
            InterruptId::TxEmpty => 0x2,
            InterruptId::ModemStatus => 0x0,
            InterruptId::BusyDetected => 0x7,
        }
    }
}

// =============================================================================
// Serial Controller Trait
// =============================================================================

/// Register-level access to one UART controller.
///
/// Every method is called with interrupts masked (inside a critical
/// section), so implementations need no locking of their own.
pub trait SerialHw {
    /// At least one received byte can be read
    fn byte_ready(&mut self) -> bool;

    /// At least one byte can be written without overflowing the transmitter
    fn space_ready(&mut self) -> bool;

    /// Pop one received byte
    fn read_byte(&mut self) -> u8;

    /// Push one byte to the transmitter
    fn write_byte(&mut self, byte: u8);

    /// Transmitter still shifting data out
    fn is_busy(&mut self) -> bool;

    /// Enable or disable the received-data (and character timeout) interrupt
    fn set_rx_interrupt(&mut self, enabled: bool);

    /// Enable or disable the transmit-empty interrupt
    fn set_tx_interrupt(&mut self, enabled: bool);

    /// Enable or disable the receiver line-status interrupt
    fn set_line_status_interrupt(&mut self, enabled: bool);

    /// Identify the highest-priority pending interrupt
    fn pending_interrupt(&mut self) -> InterruptId;

    /// Read (and thereby clear) every latched line-status error
    fn line_errors(&mut self) -> LineErrors;

    /// Program baud rate, framing and FIFO control
    fn apply_line_config(&mut self, line: &LineConfig, fifo: &FifoConfig);

    /// Bus address of the data register, used as DMA source or destination
    fn fifo_address(&self) -> usize;

    /// Drop any DMA request latched before a new transfer is programmed
    fn clear_dma_request(&mut self);

    /// Clear a busy-detect condition
    fn clear_busy(&mut self);

    /// Return the controller to its reset state with all interrupts off
    fn reset(&mut self);
}
