//! Centralized Constants
//!
//! Defaults and timing values used across the transfer engine.
//!
//! Hardware bit definitions (interrupt identification codes, line-status
//! bits) stay next to the types that decode them.

// =============================================================================
// Line Defaults
// =============================================================================

/// Default baud rate
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

// =============================================================================
// DMA Defaults
// =============================================================================

/// Default DMA channel priority (0 = lowest, 7 = highest)
pub const DEFAULT_DMA_PRIORITY: u8 = 2;

/// Highest accepted DMA channel priority
pub const MAX_DMA_PRIORITY: u8 = 7;

// =============================================================================
// Staging FIFO
// =============================================================================

/// Bytes moved from the staging FIFO per critical section while draining
///
/// Bounds the time the receive interrupt is masked by a task-side drain.
pub const DRAIN_CHUNK: usize = 16;

/// Smallest usable staging storage (one slot is always kept free)
pub const MIN_STAGING_STORAGE: usize = 2;

// =============================================================================
// Timing Constants
// =============================================================================

/// Poll interval of the timed blocking read, in microseconds
pub const POLL_INTERVAL_US: u32 = 100;
