//! Core driver components for the UART transfer engine.
//!
//! - [`config`] - Configuration types and builder patterns
//! - [`error`] - Error types and result aliases
//! - [`transfer`] - Completion, callback and state types
//! - [`registry`] - Channel table addressed by [`ChannelId`]
//! - [`Channel`] - The per-channel engine (asynchronous and blocking APIs)
//!
//! # Example
//!
//! ```ignore
//! use uart_xfer::driver::{Channel, ChannelConfig};
//!
//! let config = ChannelConfig::new().with_baud_rate(57_600);
//! channel.configure(&config)?;
//! ```

// Submodules
pub mod config;
pub mod error;
pub mod registry;
pub mod transfer;

mod blocking;
mod channel;
pub(crate) mod engine;

// Re-exports for convenience
pub use channel::{Channel, Released};
pub use config::{
    ChannelConfig, DataBits, DmaBurst, DmaConfig, FifoConfig, LineConfig, Parity, RxTrigger,
    StopBits, TxTrigger,
};
pub use error::{
    ConfigError, ConfigResult, DmaError, DmaResult, Error, IoError, IoResult, LineError,
    LineErrors, Result,
};
pub use registry::{ChannelId, ChannelRegistry};
