//! Async/await support for channel transfers.
//!
//! Enable with the `async` feature flag. A transfer is submitted with the
//! channel's completion slot as its waiter; the slot wakes the registered
//! task when the interrupt (or an abort) delivers the completion.
//!
//! ```ignore
//! async fn collect(channel: &'static Channel<Uart1>, mut buf: &'static mut [u8]) {
//!     loop {
//!         let Ok(pending) = channel.receive(buf) else { return };
//!         let done = pending.await;
//!         process(done.data());
//!         buf = done.buffer;
//!     }
//! }
//! ```
//!
//! Dropping a future does not cancel its transfer. Call
//! [`Channel::abort_read`] / [`Channel::abort_write`] to cancel; the
//! completion is then discarded by the next submission.

use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};

use crate::driver::Channel;
use crate::driver::error::Error;
use crate::driver::transfer::{Completion, ReadBuffer, WriteBuffer};
use crate::hal::{DmaChannel, SerialHw};
use crate::internal::descriptor::Waiter;
use crate::sync::CompletionSlot;

/// Future resolving to one transfer's [`Completion`]
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct CompletionFuture<'a, B> {
    slot: &'a CompletionSlot<B>,
}

impl<B> Future for CompletionFuture<'_, B> {
    type Output = Completion<B>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.slot.poll_take(cx)
    }
}

impl<H: SerialHw, D: DmaChannel> Channel<H, D> {
    /// Start a receive and return a future for its completion.
    ///
    /// # Errors
    ///
    /// Same as [`read_async`](Channel::read_async); the buffer is handed back.
    pub fn receive(
        &self,
        buffer: ReadBuffer,
    ) -> Result<CompletionFuture<'_, ReadBuffer>, (Error, ReadBuffer)> {
        self.submit_read(buffer, Waiter::Slot)?;
        Ok(CompletionFuture {
            slot: &self.rx_slot,
        })
    }

    /// Start a transmit and return a future for its completion.
    ///
    /// # Errors
    ///
    /// Same as [`write_async`](Channel::write_async); the buffer is handed back.
    pub fn transmit(
        &self,
        buffer: WriteBuffer,
    ) -> Result<CompletionFuture<'_, WriteBuffer>, (Error, WriteBuffer)> {
        self.submit_write(buffer, Waiter::Slot)?;
        Ok(CompletionFuture {
            slot: &self.tx_slot,
        })
    }
}
