//! Blocking facade over the transfer engine.
//!
//! Polled helpers claim their direction for the whole call so interrupt
//! paths stay out of the way. The timed [`Channel::read`] instead submits
//! a regular request with the channel's completion slot as the waiter and
//! polls the slot between delays.

use core::hint::spin_loop;

use embedded_hal::delay::DelayNs;

use super::channel::Channel;
use crate::constants::{DRAIN_CHUNK, POLL_INTERVAL_US};
use crate::driver::error::{IoError, Result};
use crate::driver::transfer::ReadBuffer;
use crate::hal::{DmaChannel, SerialHw};
use crate::internal::descriptor::Waiter;

impl<H: SerialHw, D: DmaChannel> Channel<H, D> {
    /// Send `data` by polling the transmitter.
    ///
    /// # Errors
    ///
    /// [`IoError::Busy`] while an asynchronous transmit is outstanding.
    pub fn write(&self, data: &[u8]) -> Result<usize> {
        if !self.tx.with(|tx| tx.desc.claim_polling()) {
            return Err(IoError::Busy.into());
        }

        for &byte in data {
            while !self.hw.with(|hw| put_polled(hw, byte)) {
                spin_loop();
            }
        }

        self.tx.with(|tx| tx.desc.release_polling());
        trace!("polled tx {} bytes", data.len());
        Ok(data.len())
    }

    /// Send one byte by polling.
    ///
    /// # Errors
    ///
    /// See [`write`](Self::write).
    pub fn write_byte(&self, byte: u8) -> Result<()> {
        self.write(&[byte]).map(|_| ())
    }

    /// Spin until the transmitter has shifted out everything
    pub fn flush(&self) {
        while self.hw.with(|hw| hw.is_busy()) {
            spin_loop();
        }
    }

    /// Fill `buffer` by polling, draining staged bytes first.
    ///
    /// The data interrupt is off for the duration and restored afterwards.
    ///
    /// # Errors
    ///
    /// - [`IoError::Busy`] while an asynchronous receive is outstanding
    /// - [`IoError::InvalidState`] while circular receive owns the controller
    pub fn read_blocking(&self, buffer: &mut [u8]) -> Result<usize> {
        self.with_rx(|hw, rx| {
            if rx.circular.is_some() {
                return Err(IoError::InvalidState);
            }
            if !rx.desc.claim_polling() {
                return Err(IoError::Busy);
            }
            hw.set_rx_interrupt(false);
            Ok(())
        })?;

        let len = buffer.len();
        let mut filled = 0;
        while filled < len {
            let moved = self.with_rx(|hw, rx| {
                if let Some(fifo) = rx.staging.as_mut() {
                    let end = (filled + DRAIN_CHUNK).min(len);
                    let n = fifo.pop_into(&mut buffer[filled..end]);
                    if n > 0 {
                        return n;
                    }
                }
                if hw.byte_ready() {
                    buffer[filled] = hw.read_byte();
                    return 1;
                }
                0
            });
            if moved == 0 {
                spin_loop();
            }
            filled += moved;
        }

        self.with_rx(|hw, rx| {
            rx.desc.release_polling();
            hw.set_rx_interrupt(rx.wants_interrupt());
        });
        trace!("polled rx {} bytes", len);
        Ok(len)
    }

    /// Receive one byte by polling.
    ///
    /// # Errors
    ///
    /// See [`read_blocking`](Self::read_blocking).
    pub fn read_byte(&self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.read_blocking(&mut byte)?;
        Ok(byte[0])
    }

    /// Receive into `buffer`, waiting at most `timeout_us` microseconds.
    ///
    /// Uses whatever receive path is attached. On expiry the request is
    /// aborted and the partial count returned; a short count is not an
    /// error. `None` waits until the request completes.
    ///
    /// Only one task may submit receives on a channel at a time. Completions
    /// reach the slot after the critical section ends, so a receive aborted
    /// by another task can land its completion in this call's slot.
    ///
    /// # Errors
    ///
    /// Submission errors from [`read_async`](Self::read_async).
    pub fn read(
        &self,
        buffer: &mut [u8],
        timeout_us: Option<u32>,
        delay: &mut impl DelayNs,
    ) -> Result<usize> {
        // SAFETY: the request is completed or aborted, and its completion
        // taken from the slot, before this function returns, so nothing
        // touches the extended buffer after the borrow ends. Relies on this
        // task being the only receive submitter: a completion still in
        // flight from another task's abort would otherwise be mistaken for
        // this request's and end the wait early.
        let extended: ReadBuffer =
            unsafe { core::slice::from_raw_parts_mut(buffer.as_mut_ptr(), buffer.len()) };
        self.submit_read(extended, Waiter::Slot)
            .map_err(|(error, _)| error)?;

        let mut waited: u32 = 0;
        loop {
            if let Some(done) = self.rx_slot.take() {
                return Ok(done.transferred);
            }
            if let Some(limit) = timeout_us
                && waited >= limit
            {
                let aborted = self.abort_read();
                // Completion may have landed between the take and the abort
                let count = self
                    .rx_slot
                    .take()
                    .map_or(aborted, |done| done.transferred);
                debug!("timed read expired with {} bytes", count);
                return Ok(count);
            }
            delay.delay_us(POLL_INTERVAL_US);
            waited = waited.saturating_add(POLL_INTERVAL_US);
        }
    }
}

fn put_polled<H: SerialHw>(hw: &mut H, byte: u8) -> bool {
    if !hw.space_ready() {
        return false;
    }
    hw.write_byte(byte);
    true
}
