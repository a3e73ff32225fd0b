//! Single-entry completion mailbox.
//!
//! Blocking and `async` callers submit with the channel's own slot as the
//! notification target and wait for it to fill. Interrupt context only ever
//! calls [`CompletionSlot::put`].
//!
//! With the `async` feature the slot also keeps the waker of the task
//! awaiting it. The completion and the waker share one cell, so a `put`
//! racing a poll either lands before the poll looks (and is returned) or
//! after the waker is stored (and wakes it).

#[cfg(feature = "async")]
use core::task::{Context, Poll, Waker};

use super::primitives::CriticalSectionCell;
use crate::driver::transfer::Completion;

struct Mailbox<B> {
    completion: Option<Completion<B>>,
    #[cfg(feature = "async")]
    waker: Option<Waker>,
}

/// Mailbox holding at most one finished transfer
pub struct CompletionSlot<B> {
    mailbox: CriticalSectionCell<Mailbox<B>>,
}

impl<B> CompletionSlot<B> {
    /// Create an empty slot (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            mailbox: CriticalSectionCell::new(Mailbox {
                completion: None,
                #[cfg(feature = "async")]
                waker: None,
            }),
        }
    }

    /// Store a completion and wake an async waiter
    pub fn put(&self, completion: Completion<B>) {
        #[cfg(feature = "async")]
        {
            let waker = self.mailbox.with(|mailbox| {
                mailbox.completion = Some(completion);
                mailbox.waker.take()
            });
            // Woken outside the critical section
            if let Some(waker) = waker {
                waker.wake();
            }
        }
        #[cfg(not(feature = "async"))]
        self.mailbox
            .with(|mailbox| mailbox.completion = Some(completion));
    }

    /// Take the stored completion, if any
    pub fn take(&self) -> Option<Completion<B>> {
        self.mailbox.with(|mailbox| mailbox.completion.take())
    }

    /// A completion is waiting
    pub fn is_ready(&self) -> bool {
        self.mailbox.with_ref(|mailbox| mailbox.completion.is_some())
    }

    /// Drop a completion nobody waited for
    pub(crate) fn clear(&self) {
        self.mailbox.with(|mailbox| mailbox.completion = None);
    }

    /// Take the completion, or park `cx`'s waker until [`put`](Self::put)
    #[cfg(feature = "async")]
    pub fn poll_take(&self, cx: &mut Context<'_>) -> Poll<Completion<B>> {
        self.mailbox.with(|mailbox| {
            if let Some(completion) = mailbox.completion.take() {
                return Poll::Ready(completion);
            }
            match &mailbox.waker {
                Some(parked) if parked.will_wake(cx.waker()) => {}
                _ => mailbox.waker = Some(cx.waker().clone()),
            }
            Poll::Pending
        })
    }
}

impl<B> Default for CompletionSlot<B> {
    fn default() -> Self {
        Self::new()
    }
}
