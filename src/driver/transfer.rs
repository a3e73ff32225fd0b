//! Transfer completion types.
//!
//! Every accepted request ends in exactly one [`Completion`], delivered
//! either to a `'static` [`Callback`] or to the channel's completion slot
//! (blocking and `async` callers). The completion hands the buffer back.

use super::error::LineError;

/// Buffer type of a receive request
pub type ReadBuffer = &'static mut [u8];

/// Buffer type of a transmit request
pub type WriteBuffer = &'static [u8];

/// Why a transfer ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Termination {
    /// All requested bytes moved
    Complete,
    /// Line went idle after a partial receive (short read, not an error)
    Timeout,
    /// Cancelled by `abort_read` / `abort_write`
    Aborted,
}

/// Outcome of one transfer
#[derive(Debug)]
pub struct Completion<B> {
    /// The buffer passed at submit time
    pub buffer: B,
    /// Bytes moved, never more than `buffer.len()`
    pub transferred: usize,
    /// Why the transfer ended
    pub reason: Termination,
}

impl<B> Completion<B> {
    /// All requested bytes moved
    pub fn is_complete(&self) -> bool {
        self.reason == Termination::Complete
    }
}

impl Completion<ReadBuffer> {
    /// The bytes actually received
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.transferred]
    }
}

/// Completion notification target.
///
/// Runs in interrupt context for transfers finished by the hardware, and in
/// the caller's context for inline completions and aborts. Implementations
/// must not block.
pub trait Callback<B>: Sync {
    /// Transfer finished
    fn complete(&self, completion: Completion<B>);
}

impl<B, F> Callback<B> for F
where
    F: Fn(Completion<B>) + Sync,
{
    fn complete(&self, completion: Completion<B>) {
        self(completion);
    }
}

/// Line-status error sink, called from interrupt context
pub trait ErrorHandler: Sync {
    /// A receive line error occurred
    fn on_line_error(&self, error: LineError);
}

impl<F> ErrorHandler for F
where
    F: Fn(LineError) + Sync,
{
    fn on_line_error(&self, error: LineError) {
        self(error);
    }
}

/// Per-direction transfer state.
///
/// Submission and completion each happen inside one critical section, so
/// the intermediate "submitted" and "completing" phases are never observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferState {
    /// No transfer outstanding
    #[default]
    Idle,
    /// A polled blocking transfer owns the direction
    Polling,
    /// Bytes are copied by the data interrupt
    InterruptDriven,
    /// Receive draining the staging FIFO, then fed by the data interrupt
    FifoBacked,
    /// One-shot DMA in flight
    DmaOneShot,
    /// Waiting for the circular ring to reach the requested length
    DmaCircularWaiting,
}
