//! Per-direction transfer descriptor.
//!
//! Pure bookkeeping: buffer, requested length, transferred count and the
//! notification target. No hardware access.

use crate::driver::transfer::{
    Callback, Completion, ReadBuffer, Termination, TransferState, WriteBuffer,
};
use crate::sync::CompletionSlot;

/// Where a completion goes
pub(crate) enum Waiter<B: 'static> {
    /// The channel's own slot (blocking and async callers)
    Slot,
    /// A caller-supplied callback
    Callback(&'static dyn Callback<B>),
}

/// A completion detached from its descriptor, ready to fire outside the
/// critical section.
pub(crate) struct Notification<B: 'static> {
    waiter: Waiter<B>,
    completion: Completion<B>,
}

impl<B: 'static> Notification<B> {
    pub(crate) fn transferred(&self) -> usize {
        self.completion.transferred
    }

    pub(crate) fn deliver(self, slot: &CompletionSlot<B>) {
        match self.waiter {
            Waiter::Slot => slot.put(self.completion),
            Waiter::Callback(cb) => cb.complete(self.completion),
        }
    }
}

/// One in-flight request, or none.
pub(crate) struct TransferDescriptor<B: 'static> {
    buffer: Option<B>,
    requested: usize,
    transferred: usize,
    waiter: Option<Waiter<B>>,
    state: TransferState,
    // Bumped on every begin so a task-side drain can detect that its request
    // was aborted and replaced between two critical sections.
    seq: u32,
}

impl<B: 'static> TransferDescriptor<B> {
    pub(crate) const fn new() -> Self {
        Self {
            buffer: None,
            requested: 0,
            transferred: 0,
            waiter: None,
            state: TransferState::Idle,
            seq: 0,
        }
    }

    #[inline(always)]
    pub(crate) fn state(&self) -> TransferState {
        self.state
    }

    #[inline(always)]
    pub(crate) fn is_idle(&self) -> bool {
        self.state == TransferState::Idle
    }

    #[inline(always)]
    pub(crate) fn seq(&self) -> u32 {
        self.seq
    }

    /// Take ownership of a request
    pub(crate) fn begin(
        &mut self,
        buffer: B,
        requested: usize,
        waiter: Waiter<B>,
        state: TransferState,
    ) -> u32 {
        debug_assert!(self.is_idle());
        self.buffer = Some(buffer);
        self.requested = requested;
        self.transferred = 0;
        self.waiter = Some(waiter);
        self.state = state;
        self.seq = self.seq.wrapping_add(1);
        self.seq
    }

    /// Reserve the direction for a polled transfer that has no descriptor
    /// buffer. Fails when anything is outstanding.
    pub(crate) fn claim_polling(&mut self) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.state = TransferState::Polling;
        true
    }

    pub(crate) fn release_polling(&mut self) {
        if self.state == TransferState::Polling {
            self.state = TransferState::Idle;
        }
    }

    #[inline(always)]
    pub(crate) fn requested(&self) -> usize {
        self.requested
    }

    #[inline(always)]
    pub(crate) fn transferred(&self) -> usize {
        self.transferred
    }

    #[inline(always)]
    pub(crate) fn remaining(&self) -> usize {
        self.requested - self.transferred
    }

    /// Account for `n` more bytes
    pub(crate) fn record(&mut self, n: usize) {
        debug_assert!(self.transferred + n <= self.requested);
        self.transferred = (self.transferred + n).min(self.requested);
    }

    /// Overwrite the count with an absolute value (DMA counters)
    pub(crate) fn set_transferred(&mut self, n: usize) {
        self.transferred = n.min(self.requested);
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.buffer.is_some() && self.transferred == self.requested
    }

    /// Close the request and detach its notification.
    ///
    /// Returns `None` when no request is held, so a second finish (late
    /// interrupt after abort) never notifies twice.
    pub(crate) fn finish(&mut self, reason: Termination) -> Option<Notification<B>> {
        let buffer = self.buffer.take();
        let waiter = self.waiter.take();
        let transferred = self.transferred;
        self.requested = 0;
        self.transferred = 0;
        self.state = TransferState::Idle;

        let (buffer, waiter) = (buffer?, waiter?);
        Some(Notification {
            waiter,
            completion: Completion {
                buffer,
                transferred,
                reason,
            },
        })
    }
}

impl TransferDescriptor<ReadBuffer> {
    /// Append one received byte
    pub(crate) fn store(&mut self, byte: u8) {
        if let Some(buffer) = self.buffer.as_deref_mut()
            && self.transferred < self.requested
        {
            buffer[self.transferred] = byte;
            self.transferred += 1;
        }
    }

    /// The part of the buffer still to be filled
    pub(crate) fn unfilled_mut(&mut self) -> &mut [u8] {
        let (start, end) = (self.transferred, self.requested);
        match self.buffer.as_deref_mut() {
            Some(buffer) => &mut buffer[start..end],
            None => &mut [],
        }
    }
}

impl TransferDescriptor<WriteBuffer> {
    /// Next byte to send
    pub(crate) fn next_byte(&self) -> Option<u8> {
        self.buffer
            .and_then(|buffer| buffer.get(self.transferred).copied())
            .filter(|_| self.transferred < self.requested)
    }

    /// Bus address of the first unsent byte
    pub(crate) fn pending_addr(&self) -> usize {
        self.buffer
            .map_or(0, |buffer| buffer.as_ptr() as usize + self.transferred)
    }
}
