//! Per-direction transfer state machines.
//!
//! [`RxState`] and [`TxState`] hold everything one direction owns and are
//! only ever touched inside the channel's critical section, together with
//! the serial controller. Methods return a [`Notification`] instead of
//! firing it so the channel can deliver after interrupts are unmasked.

use crate::constants::{DEFAULT_DMA_PRIORITY, DRAIN_CHUNK};
use crate::driver::config::DmaBurst;
use crate::driver::error::{ConfigError, DmaError, Error, IoError};
use crate::driver::transfer::{ReadBuffer, Termination, TransferState, WriteBuffer};
use crate::hal::{DmaChannel, DmaDirection, DmaMode, DmaSetup, SerialHw};
use crate::internal::circular::CircularRing;
use crate::internal::descriptor::{Notification, TransferDescriptor, Waiter};
use crate::internal::staging::StagingFifo;

/// Result of accepting a request
pub(crate) enum Submitted<B: 'static> {
    /// In flight; completion comes from an interrupt or an abort
    Pending,
    /// Finished inline, deliver now
    Done(Notification<B>),
    /// Staging FIFO must be drained by the submitting task
    Drain(u32),
}

impl<B: 'static> Submitted<B> {
    fn from_finish(note: Option<Notification<B>>) -> Self {
        note.map_or(Submitted::Pending, Submitted::Done)
    }
}

/// One step of a task-side staging drain
pub(crate) enum DrainStep {
    /// Chunk moved, more staged data may follow
    More,
    /// FIFO empty, the interrupt now fills the buffer directly
    Handoff,
    /// Request was aborted or replaced meanwhile
    Stale,
    /// Request satisfied
    Done(Notification<ReadBuffer>),
}

// =============================================================================
// Receive
// =============================================================================

pub(crate) struct RxState<D> {
    pub(crate) desc: TransferDescriptor<ReadBuffer>,
    pub(crate) staging: Option<StagingFifo>,
    pub(crate) circular: Option<CircularRing>,
    pub(crate) dma: Option<D>,
    pub(crate) burst: DmaBurst,
    pub(crate) priority: u8,
    // FifoBacked only: staging drained, interrupt copies straight to the buffer
    passthrough: bool,
}

impl<D: DmaChannel> RxState<D> {
    pub(crate) const fn new() -> Self {
        Self {
            desc: TransferDescriptor::new(),
            staging: None,
            circular: None,
            dma: None,
            burst: DmaBurst::Disabled,
            priority: DEFAULT_DMA_PRIORITY,
            passthrough: false,
        }
    }

    /// Whether the data interrupt should be enabled in the current state
    pub(crate) fn wants_interrupt(&self) -> bool {
        self.staging.is_some()
            || matches!(
                self.desc.state(),
                TransferState::InterruptDriven | TransferState::FifoBacked
            )
    }

    /// Interrupt path delivers bytes into the request buffer
    fn accepts_direct(&self) -> bool {
        match self.desc.state() {
            TransferState::InterruptDriven => true,
            TransferState::FifoBacked => self.passthrough,
            _ => false,
        }
    }

    /// Accept a receive request and pick its path
    pub(crate) fn submit<H: SerialHw>(
        &mut self,
        hw: &mut H,
        buffer: ReadBuffer,
        waiter: Waiter<ReadBuffer>,
    ) -> Result<Submitted<ReadBuffer>, (Error, ReadBuffer)> {
        if !self.desc.is_idle() {
            return Err((IoError::Busy.into(), buffer));
        }
        let len = buffer.len();

        if len == 0 {
            self.desc
                .begin(buffer, 0, waiter, TransferState::InterruptDriven);
            return Ok(Submitted::from_finish(
                self.desc.finish(Termination::Complete),
            ));
        }

        if let Some(ring) = self.circular.as_ref() {
            if len >= ring.capacity() {
                return Err((DmaError::RequestTooLarge.into(), buffer));
            }
            self.desc
                .begin(buffer, len, waiter, TransferState::DmaCircularWaiting);
            return Ok(Submitted::from_finish(self.poll_circular()));
        }

        if self.staging.is_some() {
            let seq = self
                .desc
                .begin(buffer, len, waiter, TransferState::FifoBacked);
            self.passthrough = false;
            trace!("rx {} bytes via staging fifo", len);
            return Ok(Submitted::Drain(seq));
        }

        if len > 1
            && let Some(dma) = self.dma.as_mut()
        {
            if !self.burst.accepts_len(len) {
                return Err((ConfigError::RxSizeMisaligned.into(), buffer));
            }
            hw.set_rx_interrupt(false);
            hw.clear_dma_request();
            dma.configure(&DmaSetup {
                direction: DmaDirection::PeripheralToMemory,
                source: hw.fifo_address(),
                dest: buffer.as_mut_ptr() as usize,
                length: len,
                burst: self.burst,
                priority: self.priority,
                mode: DmaMode::Normal,
            });
            dma.start();
            self.desc
                .begin(buffer, len, waiter, TransferState::DmaOneShot);
            debug!("rx {} bytes via dma", len);
            return Ok(Submitted::Pending);
        }

        self.desc
            .begin(buffer, len, waiter, TransferState::InterruptDriven);
        hw.set_rx_interrupt(true);
        trace!("rx {} bytes via interrupt", len);
        Ok(Submitted::Pending)
    }

    /// Move one chunk of staged bytes into the request buffer.
    ///
    /// The producer keeps running between chunks; bytes it stages meanwhile
    /// are picked up by the next chunk. Once the FIFO is observed empty the
    /// remainder is handed to the interrupt in the same critical section.
    pub(crate) fn drain_chunk<H: SerialHw>(&mut self, hw: &mut H, seq: u32) -> DrainStep {
        if self.desc.seq() != seq
            || self.desc.state() != TransferState::FifoBacked
            || self.passthrough
        {
            return DrainStep::Stale;
        }
        let Some(fifo) = self.staging.as_mut() else {
            return DrainStep::Stale;
        };

        let was_full = fifo.is_full();
        let budget = self.desc.remaining().min(DRAIN_CHUNK);
        let moved = fifo.pop_into(&mut self.desc.unfilled_mut()[..budget]);
        self.desc.record(moved);

        if was_full && moved > 0 {
            // Producer was paused on a full FIFO
            hw.set_rx_interrupt(true);
        }

        if self.desc.is_complete() {
            return self
                .desc
                .finish(Termination::Complete)
                .map_or(DrainStep::Stale, DrainStep::Done);
        }

        if fifo.is_empty() {
            self.passthrough = true;
            hw.set_rx_interrupt(true);
            trace!("staging drained, {} bytes left to interrupt", self.desc.remaining());
            return DrainStep::Handoff;
        }

        DrainStep::More
    }

    /// Received-data or character-timeout interrupt
    pub(crate) fn service<H: SerialHw>(
        &mut self,
        hw: &mut H,
        timeout: bool,
    ) -> Option<Notification<ReadBuffer>> {
        let direct = self.accepts_direct();
        if direct {
            while !self.desc.is_complete() && hw.byte_ready() {
                self.desc.store(hw.read_byte());
            }
        }

        if let Some(fifo) = self.staging.as_mut() {
            loop {
                if fifo.is_full() {
                    hw.set_rx_interrupt(false);
                    warn!("staging fifo full, rx paused");
                    break;
                }
                if !hw.byte_ready() {
                    break;
                }
                fifo.push(hw.read_byte());
            }
        } else if !direct {
            hw.set_rx_interrupt(false);
        }

        if !direct {
            return None;
        }
        if self.desc.is_complete() {
            return self.stop(hw, Termination::Complete);
        }
        if timeout && self.desc.transferred() > 0 {
            debug!("rx timeout after {} bytes", self.desc.transferred());
            return self.stop(hw, Termination::Timeout);
        }
        None
    }

    fn stop<H: SerialHw>(
        &mut self,
        hw: &mut H,
        reason: Termination,
    ) -> Option<Notification<ReadBuffer>> {
        self.passthrough = false;
        let note = self.desc.finish(reason);
        hw.set_rx_interrupt(self.wants_interrupt());
        note
    }

    /// Freeze the ring and either arm the trigger or complete inline
    pub(crate) fn poll_circular(&mut self) -> Option<Notification<ReadBuffer>> {
        if self.desc.state() != TransferState::DmaCircularWaiting {
            return None;
        }
        let (Some(ring), Some(dma)) = (self.circular.as_mut(), self.dma.as_mut()) else {
            return None;
        };

        let wanted = self.desc.remaining();
        dma.freeze();
        let unread = ring.unread(dma.transferred_bytes());
        if unread < wanted {
            let index = ring.trigger_index(wanted);
            dma.set_trigger_index(index);
            dma.unfreeze();
            trace!("circular rx has {} of {}, trigger at {}", unread, wanted, index);
            return None;
        }
        dma.unfreeze();

        ring.copy_out(self.desc.unfilled_mut());
        self.desc.record(wanted);
        self.desc.finish(Termination::Complete)
    }

    /// DMA completion or circular trigger
    pub(crate) fn on_dma_complete(&mut self, transferred: usize) -> Option<Notification<ReadBuffer>> {
        match self.desc.state() {
            TransferState::DmaOneShot => {
                self.desc.set_transferred(transferred);
                let reason = if self.desc.is_complete() {
                    Termination::Complete
                } else {
                    Termination::Timeout
                };
                self.desc.finish(reason)
            }
            TransferState::DmaCircularWaiting => self.poll_circular(),
            _ => {
                trace!("late rx dma event ignored");
                None
            }
        }
    }

    /// Force completion with what has arrived so far
    pub(crate) fn abort<H: SerialHw>(&mut self, hw: &mut H) -> Option<Notification<ReadBuffer>> {
        match self.desc.state() {
            TransferState::Idle | TransferState::Polling => None,
            TransferState::InterruptDriven | TransferState::FifoBacked => {
                self.stop(hw, Termination::Aborted)
            }
            TransferState::DmaOneShot => {
                if let Some(dma) = self.dma.as_mut() {
                    if dma.is_active() {
                        dma.stop();
                    }
                    self.desc.set_transferred(dma.transferred_bytes());
                }
                self.desc.finish(Termination::Aborted)
            }
            TransferState::DmaCircularWaiting => {
                // The ring keeps running; a late trigger finds the
                // descriptor idle and is ignored.
                if let (Some(ring), Some(dma)) = (self.circular.as_mut(), self.dma.as_mut()) {
                    dma.freeze();
                    let available = ring
                        .unread(dma.transferred_bytes())
                        .min(self.desc.remaining());
                    dma.unfreeze();
                    ring.copy_out(&mut self.desc.unfilled_mut()[..available]);
                    self.desc.record(available);
                }
                self.desc.finish(Termination::Aborted)
            }
        }
    }

    /// Bytes received so far, without side effects
    pub(crate) fn peek(&self) -> usize {
        match self.desc.state() {
            TransferState::Idle | TransferState::Polling => 0,
            TransferState::DmaOneShot => self.dma.as_ref().map_or(0, |dma| {
                dma.transferred_bytes().min(self.desc.requested())
            }),
            TransferState::DmaCircularWaiting => match (self.circular.as_ref(), self.dma.as_ref()) {
                (Some(ring), Some(dma)) => ring
                    .unread(dma.transferred_bytes())
                    .min(self.desc.requested()),
                _ => 0,
            },
            TransferState::InterruptDriven | TransferState::FifoBacked => self.desc.transferred(),
        }
    }
}

// =============================================================================
// Transmit
// =============================================================================

pub(crate) struct TxState<D> {
    pub(crate) desc: TransferDescriptor<WriteBuffer>,
    pub(crate) dma: Option<D>,
    pub(crate) burst: DmaBurst,
    pub(crate) priority: u8,
}

impl<D: DmaChannel> TxState<D> {
    pub(crate) const fn new() -> Self {
        Self {
            desc: TransferDescriptor::new(),
            dma: None,
            burst: DmaBurst::Disabled,
            priority: DEFAULT_DMA_PRIORITY,
        }
    }

    /// Accept a transmit request and pick its path
    pub(crate) fn submit<H: SerialHw>(
        &mut self,
        hw: &mut H,
        buffer: WriteBuffer,
        waiter: Waiter<WriteBuffer>,
    ) -> Result<Submitted<WriteBuffer>, (Error, WriteBuffer)> {
        if !self.desc.is_idle() {
            return Err((IoError::Busy.into(), buffer));
        }
        let len = buffer.len();

        if len == 0 {
            self.desc
                .begin(buffer, 0, waiter, TransferState::InterruptDriven);
            return Ok(Submitted::from_finish(
                self.desc.finish(Termination::Complete),
            ));
        }

        if len > 1
            && let Some(dma) = self.dma.as_mut()
        {
            if !self.burst.accepts_len(len) {
                return Err((ConfigError::TxSizeMisaligned.into(), buffer));
            }
            self.desc
                .begin(buffer, len, waiter, TransferState::DmaOneShot);
            dma.configure(&DmaSetup {
                direction: DmaDirection::MemoryToPeripheral,
                source: self.desc.pending_addr(),
                dest: hw.fifo_address(),
                length: len,
                burst: self.burst,
                priority: self.priority,
                mode: DmaMode::Normal,
            });
            dma.start();
            debug!("tx {} bytes via dma", len);
            return Ok(Submitted::Pending);
        }

        self.desc
            .begin(buffer, len, waiter, TransferState::InterruptDriven);
        hw.set_tx_interrupt(true);
        trace!("tx {} bytes via interrupt", len);
        Ok(Submitted::Pending)
    }

    /// Transmit-empty interrupt
    pub(crate) fn service<H: SerialHw>(&mut self, hw: &mut H) -> Option<Notification<WriteBuffer>> {
        if self.desc.state() != TransferState::InterruptDriven {
            hw.set_tx_interrupt(false);
            return None;
        }

        while let Some(byte) = self.desc.next_byte() {
            if !hw.space_ready() {
                break;
            }
            hw.write_byte(byte);
            self.desc.record(1);
        }

        if self.desc.is_complete() {
            hw.set_tx_interrupt(false);
            return self.desc.finish(Termination::Complete);
        }
        None
    }

    pub(crate) fn on_dma_complete(&mut self, transferred: usize) -> Option<Notification<WriteBuffer>> {
        if self.desc.state() != TransferState::DmaOneShot {
            trace!("late tx dma event ignored");
            return None;
        }
        self.desc.set_transferred(transferred);
        let reason = if self.desc.is_complete() {
            Termination::Complete
        } else {
            Termination::Aborted
        };
        self.desc.finish(reason)
    }

    pub(crate) fn abort<H: SerialHw>(&mut self, hw: &mut H) -> Option<Notification<WriteBuffer>> {
        match self.desc.state() {
            TransferState::InterruptDriven => {
                hw.set_tx_interrupt(false);
                self.desc.finish(Termination::Aborted)
            }
            TransferState::DmaOneShot => {
                if let Some(dma) = self.dma.as_mut() {
                    if dma.is_active() {
                        dma.stop();
                    }
                    self.desc.set_transferred(dma.transferred_bytes());
                }
                self.desc.finish(Termination::Aborted)
            }
            _ => None,
        }
    }

    pub(crate) fn peek(&self) -> usize {
        match self.desc.state() {
            TransferState::DmaOneShot => self.dma.as_ref().map_or(0, |dma| {
                dma.transferred_bytes().min(self.desc.requested())
            }),
            TransferState::InterruptDriven => self.desc.transferred(),
            _ => 0,
        }
    }
}
