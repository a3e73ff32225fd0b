//! Internal Implementation Details
//!
//! Engine building blocks that are not part of the public API.
//!
//! - `descriptor`: per-direction request bookkeeping and notifications
//! - `staging`: the software staging FIFO
//! - `circular`: read-side bookkeeping for the circular DMA ring

pub(crate) mod circular;
pub(crate) mod descriptor;
pub(crate) mod staging;
