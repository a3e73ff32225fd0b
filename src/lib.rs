//! UART Transfer Engine
//!
//! A `no_std`, `no_alloc` per-channel transfer engine for 16550-style UART
//! controllers with optional DMA.
//!
//! Every [`Channel`] moves caller buffers between memory and its serial
//! controller along one of four paths, chosen per request from what is
//! attached to the channel:
//!
//! 1. **Interrupt-driven**: the data interrupt copies bytes one at a time
//! 2. **Staging FIFO**: a software ring collects bytes ahead of any read
//! 3. **One-shot DMA**: the DMA channel moves the whole request
//! 4. **Circular DMA**: DMA captures forever into a ring; reads copy out
//!
//! Receive and transmit are independent; each direction holds at most one
//! outstanding request. Completions hand the buffer back through a
//! `'static` [`Callback`] or the channel's [`CompletionSlot`], which the
//! blocking facade and the `async` API wait on.
//!
//! # Features
//!
//! - `defmt`: Log through defmt and derive `defmt::Format` on public types
//! - `log`: Log through the `log` facade
//! - `async`: Enable `receive` / `transmit` futures
//!
//! # Example
//!
//! ```ignore
//! use uart_xfer::{Channel, ChannelConfig, DmaBurst, FifoConfig, RxTrigger, TxTrigger};
//!
//! static UART1: Channel<Uart1, DmaCh> = Channel::new(Uart1::new());
//!
//! let config = ChannelConfig::new()
//!     .with_baud_rate(921_600)
//!     .with_fifo(FifoConfig::enabled(RxTrigger::HalfFull, TxTrigger::HalfFull))
//!     .with_rx_burst(DmaBurst::Burst8);
//! UART1.configure(&config)?;
//!
//! UART1.write(b"hello\r\n")?;
//! let n = UART1.read(&mut line, Some(50_000), &mut delay)?;
//! ```
//!
//! The application routes the serial interrupt to
//! [`Channel::on_interrupt`] and DMA completions to
//! [`Channel::on_dma_rx_complete`] / [`Channel::on_dma_tx_complete`].

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements,
    clippy::let_underscore_future
)]

// Must come first so the logging macros are visible to every module
mod fmt;

// =============================================================================
// Modules
// =============================================================================

pub mod constants;
pub mod driver;
pub mod hal;
pub mod sync;

// Internal implementation details (pub(crate) only)
mod internal;

// Test utilities (only available during testing)
#[cfg(test)]
mod testing;

// =============================================================================
// Re-exports
// =============================================================================

pub use driver::config::{
    ChannelConfig, DataBits, DmaBurst, DmaConfig, FifoConfig, LineConfig, Parity, RxTrigger,
    StopBits, TxTrigger,
};
pub use driver::error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, LineError,
    LineErrors, Result,
};
pub use driver::registry::{ChannelId, ChannelRegistry};
pub use driver::transfer::{
    Callback, Completion, ErrorHandler, ReadBuffer, Termination, TransferState, WriteBuffer,
};
pub use driver::{Channel, Released};
pub use hal::{DmaChannel, DmaDirection, DmaMode, DmaSetup, InterruptId, NoDma, SerialHw};
pub use sync::{CompletionSlot, CriticalSectionCell};

#[cfg(feature = "async")]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use sync::asynch::CompletionFuture;
