//! The per-channel transfer engine.
//!
//! A [`Channel`] owns one serial controller, optional rx/tx DMA channels,
//! an optional staging FIFO and an optional circular receive ring. Receive
//! and transmit progress independently: each direction has its own state
//! cell, and the controller cell is borrowed alongside it inside one
//! critical section.
//!
//! # Interrupt wiring
//!
//! ```ignore
//! static UART1: Channel<Uart1, DmaCh> = Channel::new(Uart1::new());
//!
//! #[interrupt]
//! fn UART1() {
//!     UART1.on_interrupt();
//! }
//!
//! #[interrupt]
//! fn DMA() {
//!     if let Some(n) = dma_rx_done() {
//!         UART1.on_dma_rx_complete(n);
//!     }
//! }
//! ```

use crate::constants::MIN_STAGING_STORAGE;
use crate::driver::config::{ChannelConfig, LineConfig};
use crate::driver::engine::{DrainStep, RxState, Submitted, TxState};
use crate::driver::error::{ConfigError, DmaError, Error, IoError, Result};
use crate::driver::transfer::{
    Callback, ErrorHandler, ReadBuffer, TransferState, WriteBuffer,
};
use crate::hal::dma::valid_pairing;
use crate::hal::{DmaChannel, DmaDirection, DmaMode, DmaSetup, InterruptId, NoDma, SerialHw};
use crate::internal::circular::CircularRing;
use crate::internal::descriptor::Waiter;
use crate::internal::staging::StagingFifo;
use crate::sync::{CompletionSlot, CriticalSectionCell};

/// Storage handed back by [`Channel::deinit`]
#[derive(Debug, Default)]
pub struct Released {
    /// Staging FIFO storage, if one was attached
    pub staging: Option<&'static mut [u8]>,
    /// Circular receive ring, if circular receive was running
    pub ring: Option<&'static mut [u8]>,
}

/// One serial channel and its transfer engine.
///
/// `D` defaults to [`NoDma`] for interrupt-only channels.
pub struct Channel<H, D = NoDma> {
    pub(crate) hw: CriticalSectionCell<H>,
    pub(crate) rx: CriticalSectionCell<RxState<D>>,
    pub(crate) tx: CriticalSectionCell<TxState<D>>,
    pub(crate) rx_slot: CompletionSlot<ReadBuffer>,
    pub(crate) tx_slot: CompletionSlot<WriteBuffer>,
    error_handler: CriticalSectionCell<Option<&'static dyn ErrorHandler>>,
    config: CriticalSectionCell<ChannelConfig>,
}

impl<H: SerialHw, D: DmaChannel> Channel<H, D> {
    /// Create an unconfigured channel (const, suitable for static initialization).
    pub const fn new(hw: H) -> Self {
        Self {
            hw: CriticalSectionCell::new(hw),
            rx: CriticalSectionCell::new(RxState::new()),
            tx: CriticalSectionCell::new(TxState::new()),
            rx_slot: CompletionSlot::new(),
            tx_slot: CompletionSlot::new(),
            error_handler: CriticalSectionCell::new(None),
            config: CriticalSectionCell::new(ChannelConfig::new()),
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Attach the receive DMA channel (must be the even channel of a pair)
    #[must_use]
    pub fn with_rx_dma(mut self, dma: D) -> Self {
        self.rx.get_mut().dma = Some(dma);
        self
    }

    /// Attach the transmit DMA channel (must be the odd channel of a pair)
    #[must_use]
    pub fn with_tx_dma(mut self, dma: D) -> Self {
        self.tx.get_mut().dma = Some(dma);
        self
    }

    /// Attach staging FIFO storage; checked by [`configure`](Self::configure)
    #[must_use]
    pub fn with_staging_fifo(mut self, storage: &'static mut [u8]) -> Self {
        self.rx.get_mut().staging = Some(StagingFifo::new(storage));
        self
    }

    // =========================================================================
    // Critical Section Helpers
    // =========================================================================

    pub(crate) fn with_rx<R>(&self, f: impl FnOnce(&mut H, &mut RxState<D>) -> R) -> R {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_mut(cs);
            let mut rx = self.rx.borrow_mut(cs);
            f(&mut hw, &mut rx)
        })
    }

    pub(crate) fn with_tx<R>(&self, f: impl FnOnce(&mut H, &mut TxState<D>) -> R) -> R {
        critical_section::with(|cs| {
            let mut hw = self.hw.borrow_mut(cs);
            let mut tx = self.tx.borrow_mut(cs);
            f(&mut hw, &mut tx)
        })
    }

    // =========================================================================
    // Configuration
    // =========================================================================

    /// Validate and apply a configuration.
    ///
    /// # Errors
    ///
    /// - Burst/trigger mismatches from [`ChannelConfig::validate`]
    /// - [`ConfigError::InvalidDmaPairing`], [`ConfigError::StagingDmaConflict`],
    ///   [`ConfigError::StagingTooSmall`] for the attached resources
    /// - [`IoError::Busy`] with a transfer outstanding,
    ///   [`IoError::HardwareBusy`] while the transmitter is shifting
    pub fn configure(&self, config: &ChannelConfig) -> Result<()> {
        if let Err(e) = config.validate() {
            warn!("configuration rejected: {}", e);
            return Err(e.into());
        }

        critical_section::with(|cs| -> Result<()> {
            let mut hw = self.hw.borrow_mut(cs);
            let mut rx = self.rx.borrow_mut(cs);
            let mut tx = self.tx.borrow_mut(cs);

            Self::check_resources(&rx, &tx)?;
            if !rx.desc.is_idle() || !tx.desc.is_idle() {
                return Err(Error::Io(IoError::Busy));
            }
            if hw.is_busy() {
                return Err(Error::Io(IoError::HardwareBusy));
            }

            hw.apply_line_config(&config.line, &config.fifo);
            rx.burst = config.dma.rx_burst;
            rx.priority = config.dma.rx_priority;
            tx.burst = config.dma.tx_burst;
            tx.priority = config.dma.tx_priority;
            if let Some(fifo) = rx.staging.as_mut() {
                fifo.clear();
            }
            hw.set_rx_interrupt(rx.wants_interrupt());
            hw.set_tx_interrupt(false);
            *self.config.borrow_mut(cs) = *config;
            Ok(())
        })
        .inspect_err(|e| warn!("configuration rejected: {}", e))?;

        info!("channel configured at {} baud", config.line.baud_rate);
        Ok(())
    }

    fn check_resources(rx: &RxState<D>, tx: &TxState<D>) -> Result<()> {
        let rx_number = rx.dma.as_ref().map(|dma| dma.number());
        let tx_number = tx.dma.as_ref().map(|dma| dma.number());
        if !valid_pairing(rx_number, tx_number) {
            return Err(ConfigError::InvalidDmaPairing.into());
        }
        if let Some(fifo) = rx.staging.as_ref() {
            if rx.dma.is_some() {
                return Err(ConfigError::StagingDmaConflict.into());
            }
            if fifo.capacity() == 0 {
                return Err(ConfigError::StagingTooSmall.into());
            }
        }
        Ok(())
    }

    /// Re-apply line settings without dropping an interrupt-driven receive.
    ///
    /// # Errors
    ///
    /// [`IoError::HardwareBusy`] while the transmitter is shifting.
    pub fn reconfigure(&self, line: &LineConfig) -> Result<()> {
        let fifo = self.config.with_ref(|config| config.fifo);
        self.with_rx(|hw, rx| {
            if hw.is_busy() {
                return Err(IoError::HardwareBusy);
            }
            hw.apply_line_config(line, &fifo);
            hw.set_rx_interrupt(rx.wants_interrupt());
            Ok(())
        })?;
        self.with_tx(|hw, tx| {
            hw.set_tx_interrupt(tx.desc.state() == TransferState::InterruptDriven);
        });
        self.config.with(|config| config.line = *line);
        debug!("line reconfigured at {} baud", line.baud_rate);
        Ok(())
    }

    /// The configuration last applied
    pub fn config(&self) -> ChannelConfig {
        self.config.with_ref(|config| *config)
    }

    /// Abort both directions, stop circular receive and reset the controller.
    ///
    /// Pending notifications fire with [`Termination::Aborted`](crate::Termination).
    pub fn deinit(&self) -> Released {
        self.abort_read();
        self.abort_write();

        let released = self.with_rx(|hw, rx| {
            if rx.circular.is_some()
                && let Some(dma) = rx.dma.as_mut()
            {
                dma.stop();
            }
            hw.reset();
            Released {
                staging: rx.staging.take().map(StagingFifo::into_storage),
                ring: rx.circular.take().map(CircularRing::into_storage),
            }
        });
        self.error_handler.with(|handler| *handler = None);
        self.config.with(|config| *config = ChannelConfig::new());
        info!("channel deinitialized");
        released
    }

    /// Attach a staging FIFO at runtime and start collecting bytes.
    ///
    /// # Errors
    ///
    /// The storage is handed back with [`ConfigError::StagingTooSmall`],
    /// [`ConfigError::StagingDmaConflict`], [`IoError::Busy`] or
    /// [`IoError::InvalidState`] when a FIFO is already attached.
    pub fn attach_staging_fifo(
        &self,
        storage: &'static mut [u8],
    ) -> core::result::Result<(), (Error, &'static mut [u8])> {
        if storage.len() < MIN_STAGING_STORAGE {
            return Err((ConfigError::StagingTooSmall.into(), storage));
        }
        self.with_rx(|hw, rx| {
            if rx.dma.is_some() {
                return Err((ConfigError::StagingDmaConflict.into(), storage));
            }
            if rx.staging.is_some() {
                return Err((IoError::InvalidState.into(), storage));
            }
            if !rx.desc.is_idle() {
                return Err((IoError::Busy.into(), storage));
            }
            rx.staging = Some(StagingFifo::new(storage));
            hw.set_rx_interrupt(true);
            Ok(())
        })
    }

    /// Detach the staging FIFO, discarding staged bytes.
    ///
    /// # Errors
    ///
    /// [`IoError::Busy`] with a receive outstanding, [`IoError::InvalidState`]
    /// when no FIFO is attached.
    pub fn detach_staging_fifo(&self) -> Result<&'static mut [u8]> {
        self.with_rx(|hw, rx| -> Result<&'static mut [u8]> {
            if !rx.desc.is_idle() {
                return Err(IoError::Busy.into());
            }
            let fifo = rx.staging.take().ok_or(IoError::InvalidState)?;
            hw.set_rx_interrupt(false);
            Ok(fifo.into_storage())
        })
    }

    /// Bytes waiting in the staging FIFO
    pub fn staged_bytes(&self) -> usize {
        self.rx.with_ref(|rx| rx.staging.as_ref().map_or(0, StagingFifo::len))
    }

    /// Start perpetual DMA capture into `ring`.
    ///
    /// Reads are then served from the ring and must be shorter than it.
    ///
    /// # Errors
    ///
    /// The ring is handed back with [`DmaError::NoChannel`],
    /// [`DmaError::RingTooSmall`], [`DmaError::CircularActive`],
    /// [`ConfigError::StagingDmaConflict`] or [`IoError::Busy`].
    pub fn enable_circular_receive(
        &self,
        ring: &'static mut [u8],
    ) -> core::result::Result<(), (Error, &'static mut [u8])> {
        if ring.len() < 2 {
            return Err((DmaError::RingTooSmall.into(), ring));
        }
        self.with_rx(|hw, rx| {
            if rx.staging.is_some() {
                return Err((ConfigError::StagingDmaConflict.into(), ring));
            }
            if rx.circular.is_some() {
                return Err((DmaError::CircularActive.into(), ring));
            }
            if !rx.desc.is_idle() {
                return Err((IoError::Busy.into(), ring));
            }
            let (burst, priority) = (rx.burst, rx.priority);
            let Some(dma) = rx.dma.as_mut() else {
                return Err((DmaError::NoChannel.into(), ring));
            };

            let mut ring = CircularRing::new(ring);
            hw.set_rx_interrupt(false);
            hw.clear_dma_request();
            dma.configure(&DmaSetup {
                direction: DmaDirection::PeripheralToMemory,
                source: hw.fifo_address(),
                dest: ring.address(),
                length: ring.capacity(),
                burst,
                priority,
                mode: DmaMode::Circular,
            });
            dma.start();
            info!("circular rx started, ring {} bytes", ring.capacity());
            rx.circular = Some(ring);
            Ok(())
        })
    }

    /// Stop circular capture and hand the ring back.
    ///
    /// A pending circular read completes as aborted first.
    ///
    /// # Errors
    ///
    /// [`DmaError::CircularInactive`] when circular receive is not running.
    pub fn disable_circular_receive(&self) -> Result<&'static mut [u8]> {
        self.abort_read();
        self.with_rx(|_, rx| -> Result<&'static mut [u8]> {
            if !rx.desc.is_idle() {
                return Err(IoError::Busy.into());
            }
            let ring = rx.circular.take().ok_or(DmaError::CircularInactive)?;
            if let Some(dma) = rx.dma.as_mut() {
                dma.stop();
            }
            info!("circular rx stopped");
            Ok(ring.into_storage())
        })
    }

    /// Install or remove the line-status error handler.
    ///
    /// The line-status interrupt is enabled only while a handler is set.
    pub fn set_error_handler(&self, handler: Option<&'static dyn ErrorHandler>) {
        self.error_handler.with(|slot| *slot = handler);
        self.hw
            .with(|hw| hw.set_line_status_interrupt(handler.is_some()));
    }

    // =========================================================================
    // Asynchronous Transfers
    // =========================================================================

    /// Start a receive; `callback` gets the buffer back on completion.
    ///
    /// The path is chosen from what is attached: circular ring, staging
    /// FIFO, one-shot DMA (more than one byte), else the data interrupt.
    /// Staged bytes are drained before this returns and the callback may
    /// run inline.
    ///
    /// # Errors
    ///
    /// The buffer is handed back with [`IoError::Busy`],
    /// [`ConfigError::RxSizeMisaligned`] or [`DmaError::RequestTooLarge`].
    pub fn read_async(
        &self,
        buffer: ReadBuffer,
        callback: &'static dyn Callback<ReadBuffer>,
    ) -> core::result::Result<(), (Error, ReadBuffer)> {
        self.submit_read(buffer, Waiter::Callback(callback))
    }

    /// Start a transmit; `callback` gets the buffer back on completion.
    ///
    /// # Errors
    ///
    /// The buffer is handed back with [`IoError::Busy`] or
    /// [`ConfigError::TxSizeMisaligned`].
    pub fn write_async(
        &self,
        buffer: WriteBuffer,
        callback: &'static dyn Callback<WriteBuffer>,
    ) -> core::result::Result<(), (Error, WriteBuffer)> {
        self.submit_write(buffer, Waiter::Callback(callback))
    }

    pub(crate) fn submit_read(
        &self,
        buffer: ReadBuffer,
        waiter: Waiter<ReadBuffer>,
    ) -> core::result::Result<(), (Error, ReadBuffer)> {
        let slot_waiter = matches!(waiter, Waiter::Slot);
        let submitted = self.with_rx(|hw, rx| {
            let accepted = rx.submit(hw, buffer, waiter)?;
            if slot_waiter {
                // An abandoned waiter may have left a stale completion
                self.rx_slot.clear();
            }
            Ok(accepted)
        })?;

        match submitted {
            Submitted::Pending => {}
            Submitted::Done(note) => note.deliver(&self.rx_slot),
            Submitted::Drain(seq) => self.drain_staging(seq),
        }
        Ok(())
    }

    pub(crate) fn submit_write(
        &self,
        buffer: WriteBuffer,
        waiter: Waiter<WriteBuffer>,
    ) -> core::result::Result<(), (Error, WriteBuffer)> {
        let slot_waiter = matches!(waiter, Waiter::Slot);
        let submitted = self.with_tx(|hw, tx| {
            let accepted = tx.submit(hw, buffer, waiter)?;
            if slot_waiter {
                self.tx_slot.clear();
            }
            Ok(accepted)
        })?;

        if let Submitted::Done(note) = submitted {
            note.deliver(&self.tx_slot);
        }
        Ok(())
    }

    fn drain_staging(&self, seq: u32) {
        loop {
            match self.with_rx(|hw, rx| rx.drain_chunk(hw, seq)) {
                DrainStep::More => {}
                DrainStep::Handoff | DrainStep::Stale => return,
                DrainStep::Done(note) => {
                    note.deliver(&self.rx_slot);
                    return;
                }
            }
        }
    }

    // =========================================================================
    // Abort / Peek
    // =========================================================================

    /// Force the outstanding receive to complete now.
    ///
    /// Returns the bytes it delivered; 0 when nothing was outstanding, in
    /// which case nothing fires. Circular capture keeps running.
    pub fn abort_read(&self) -> usize {
        let Some(note) = self.with_rx(|hw, rx| rx.abort(hw)) else {
            return 0;
        };
        let count = note.transferred();
        debug!("rx aborted after {} bytes", count);
        note.deliver(&self.rx_slot);
        count
    }

    /// Force the outstanding transmit to complete now.
    pub fn abort_write(&self) -> usize {
        let Some(note) = self.with_tx(|hw, tx| tx.abort(hw)) else {
            return 0;
        };
        let count = note.transferred();
        debug!("tx aborted after {} bytes", count);
        note.deliver(&self.tx_slot);
        count
    }

    /// Bytes received so far by the outstanding request
    pub fn peek_read(&self) -> usize {
        self.rx.with_ref(RxState::peek)
    }

    /// Bytes sent so far by the outstanding request
    pub fn peek_write(&self) -> usize {
        self.tx.with_ref(TxState::peek)
    }

    /// Current receive state
    pub fn rx_state(&self) -> TransferState {
        self.rx.with_ref(|rx| rx.desc.state())
    }

    /// Current transmit state
    pub fn tx_state(&self) -> TransferState {
        self.tx.with_ref(|tx| tx.desc.state())
    }

    // =========================================================================
    // Interrupt Entry Points
    // =========================================================================

    /// Serial controller interrupt handler.
    ///
    /// Services every pending source until the controller reports none.
    pub fn on_interrupt(&self) {
        loop {
            match self.hw.with(|hw| hw.pending_interrupt()) {
                InterruptId::None => return,
                InterruptId::RxAvailable => self.service_rx(false),
                InterruptId::RxTimeout => self.service_rx(true),
                InterruptId::TxEmpty => self.service_tx(),
                InterruptId::LineStatus => self.service_line_status(),
                InterruptId::BusyDetected => self.hw.with(|hw| hw.clear_busy()),
                // Never enabled here
                InterruptId::ModemStatus => {}
            }
        }
    }

    fn service_rx(&self, timeout: bool) {
        if let Some(note) = self.with_rx(|hw, rx| rx.service(hw, timeout)) {
            note.deliver(&self.rx_slot);
        }
    }

    fn service_tx(&self) {
        if let Some(note) = self.with_tx(|hw, tx| tx.service(hw)) {
            note.deliver(&self.tx_slot);
        }
    }

    fn service_line_status(&self) {
        let errors = self.hw.with(|hw| hw.line_errors());
        if errors.is_empty() {
            return;
        }
        let handler = self.error_handler.with_ref(|handler| *handler);
        for error in errors.iter() {
            warn!("line error: {}", error);
            if let Some(handler) = handler {
                handler.on_line_error(error);
            }
        }
    }

    /// Receive DMA completion (one-shot done, or circular trigger reached)
    pub fn on_dma_rx_complete(&self, transferred: usize) {
        if let Some(note) = self.rx.with(|rx| rx.on_dma_complete(transferred)) {
            note.deliver(&self.rx_slot);
        }
    }

    /// Transmit DMA completion
    pub fn on_dma_tx_complete(&self, transferred: usize) {
        if let Some(note) = self.tx.with(|tx| tx.on_dma_complete(transferred)) {
            note.deliver(&self.tx_slot);
        }
    }
}
