//! Synchronization and Concurrency Support
//!
//! - **Primitives** (`primitives`): [`CriticalSectionCell`], ISR-safe
//!   interior mutability for all channel state
//!
//! - **Completion slot** (`slot`): [`CompletionSlot`], the single-entry
//!   mailbox blocking and async callers wait on; it also parks the waker
//!   of an awaiting task
//!
//! - **Async Support** (`asynch`): `receive` / `transmit` futures on
//!   [`Channel`](crate::Channel)
//!
//! # Feature Flags
//!
//! - `async`: Enables `asynch` and the slot's waker

mod primitives;
mod slot;

pub use primitives::CriticalSectionCell;
pub use slot::CompletionSlot;

#[cfg(feature = "async")]
pub mod asynch;

#[cfg(feature = "async")]
pub use asynch::CompletionFuture;
