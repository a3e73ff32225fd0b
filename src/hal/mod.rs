//! Hardware Abstraction Layer
//!
//! Traits the transfer engine consumes. Register access, DMA channel
//! allocation and clocking stay in the board crate.
//!
//! # Modules
//!
//! - [`serial`]: the UART controller ([`SerialHw`], [`InterruptId`])
//! - [`dma`]: a DMA channel ([`DmaChannel`], [`DmaSetup`], [`NoDma`])
//!
//! # Delay Integration
//!
//! The timed blocking read takes any `embedded_hal::delay::DelayNs`.
//! Pass the delay implementation from your HAL (e.g., `esp_hal::delay::Delay`).

pub mod dma;
pub mod serial;

pub use dma::{DmaChannel, DmaDirection, DmaMode, DmaSetup, NoDma};
pub use serial::{InterruptId, SerialHw};
