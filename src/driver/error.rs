//! Error types for the UART transfer engine
//!
//! Errors are organized by domain for better diagnostics:
//! - [`ConfigError`]: Configuration and validation failures
//! - [`DmaError`]: DMA channel and circular ring issues
//! - [`IoError`]: Runtime contention on a transfer direction
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by most channel methods.
//!
//! Line-status errors ([`LineError`], latched together as [`LineErrors`])
//! are different: they are raised by the receiver asynchronously and
//! delivered through the channel's error handler, never through a `Result`.

// =============================================================================
// Configuration Errors
// =============================================================================

/// Configuration and validation errors
///
/// Returned synchronously from `configure`, submit calls whose length does
/// not fit the DMA burst width, and staging/DMA attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Receive trigger level does not match the receive DMA burst width
    RxBurstMismatch,
    /// Transmit trigger level does not match the transmit DMA burst width
    TxBurstMismatch,
    /// Both directions have a trigger/burst mismatch
    RxTxBurstMismatch,
    /// DMA burst requested with the hardware FIFO disabled
    BurstRequiresFifo,
    /// Receive length is not a multiple of the receive burst width
    RxSizeMisaligned,
    /// Transmit length is not a multiple of the transmit burst width
    TxSizeMisaligned,
    /// DMA channels are not an even (rx) / odd (tx) pair
    InvalidDmaPairing,
    /// Staging FIFO and receive DMA cannot be used together
    StagingDmaConflict,
    /// Staging storage must hold at least two bytes
    StagingTooSmall,
    /// No channel registered under this identifier
    InvalidChannel,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConfigError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ConfigError::RxBurstMismatch => "rx trigger level does not match rx burst",
            ConfigError::TxBurstMismatch => "tx trigger level does not match tx burst",
            ConfigError::RxTxBurstMismatch => "rx and tx trigger levels do not match bursts",
            ConfigError::BurstRequiresFifo => "dma burst requires hardware fifo",
            ConfigError::RxSizeMisaligned => "rx length not a multiple of burst",
            ConfigError::TxSizeMisaligned => "tx length not a multiple of burst",
            ConfigError::InvalidDmaPairing => "invalid dma channel pairing",
            ConfigError::StagingDmaConflict => "staging fifo conflicts with rx dma",
            ConfigError::StagingTooSmall => "staging storage too small",
            ConfigError::InvalidChannel => "invalid channel",
        }
    }
}

// =============================================================================
// DMA Errors
// =============================================================================

/// DMA channel and circular ring errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DmaError {
    /// No DMA channel is attached for this direction
    NoChannel,
    /// Circular receive is already running
    CircularActive,
    /// Circular receive is not running
    CircularInactive,
    /// Circular read must be shorter than the ring
    RequestTooLarge,
    /// Circular ring must hold at least two bytes
    RingTooSmall,
}

impl core::fmt::Display for DmaError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl DmaError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            DmaError::NoChannel => "no dma channel",
            DmaError::CircularActive => "circular receive already active",
            DmaError::CircularInactive => "circular receive not active",
            DmaError::RequestTooLarge => "request does not fit circular ring",
            DmaError::RingTooSmall => "circular ring too small",
        }
    }
}

// =============================================================================
// I/O Errors
// =============================================================================

/// Runtime contention errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IoError {
    /// A transfer is already outstanding in this direction
    Busy,
    /// The controller is shifting data and cannot be reconfigured
    HardwareBusy,
    /// Invalid state for operation
    InvalidState,
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl IoError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            IoError::Busy => "transfer already in progress",
            IoError::HardwareBusy => "controller busy",
            IoError::InvalidState => "invalid state for operation",
        }
    }
}

// =============================================================================
// Line Status Errors
// =============================================================================

/// Receive line-status error kinds
///
/// Reported through the error handler; a line error never truncates the
/// transfer it interrupts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Receiver overrun, at least one byte was lost
    Overrun,
    /// Parity mismatch
    Parity,
    /// Missing stop bit
    Framing,
    /// Break condition on the line
    Break,
    /// At least one byte in the receive FIFO carries an error
    RxFifo,
}

impl LineError {
    /// Line-status register bit: overrun
    pub const LSR_OE: u8 = 1 << 1;
    /// Line-status register bit: parity error
    pub const LSR_PE: u8 = 1 << 2;
    /// Line-status register bit: framing error
    pub const LSR_FE: u8 = 1 << 3;
    /// Line-status register bit: break interrupt
    pub const LSR_BI: u8 = 1 << 4;
    /// Line-status register bit: receive FIFO error
    pub const LSR_RFE: u8 = 1 << 7;

    /// Every line error, in the order they are reported
    pub const ALL: [LineError; 5] = [
        LineError::Overrun,
        LineError::Parity,
        LineError::Framing,
        LineError::Break,
        LineError::RxFifo,
    ];

    /// Line-status register bit for this error
    #[must_use]
    pub const fn to_lsr(self) -> u8 {
        match self {
            LineError::Overrun => Self::LSR_OE,
            LineError::Parity => Self::LSR_PE,
            LineError::Framing => Self::LSR_FE,
            LineError::Break => Self::LSR_BI,
            LineError::RxFifo => Self::LSR_RFE,
        }
    }

    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LineError::Overrun => "receiver overrun",
            LineError::Parity => "parity error",
            LineError::Framing => "framing error",
            LineError::Break => "break condition",
            LineError::RxFifo => "receive fifo error",
        }
    }
}

impl core::fmt::Display for LineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Line errors latched by a single line-status read.
///
/// One character can carry several errors at once (an overrun together
/// with a framing error, say); each one is reported to the error handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineErrors(u8);

impl LineErrors {
    const MASK: u8 = LineError::LSR_OE
        | LineError::LSR_PE
        | LineError::LSR_FE
        | LineError::LSR_BI
        | LineError::LSR_RFE;

    /// No error latched
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Keep the error bits of a 16550-style line-status register value
    #[must_use]
    pub const fn from_lsr(lsr: u8) -> Self {
        Self(lsr & Self::MASK)
    }

    /// Raw line-status error bits
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Nothing latched
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// `error` is in the set
    pub const fn contains(self, error: LineError) -> bool {
        self.0 & error.to_lsr() != 0
    }

    /// Add one error to the set
    #[must_use]
    pub const fn with(self, error: LineError) -> Self {
        Self(self.0 | error.to_lsr())
    }

    /// Latched errors, overrun first
    pub fn iter(self) -> impl Iterator<Item = LineError> {
        LineError::ALL
            .into_iter()
            .filter(move |error| self.contains(*error))
    }
}

impl From<LineError> for LineErrors {
    fn from(error: LineError) -> Self {
        Self::empty().with(error)
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// ```ignore
/// match channel.write_async(data, &DONE) {
///     Err((Error::Io(IoError::Busy), data)) => { /* retry later */ }
///     Err((Error::Config(ConfigError::TxSizeMisaligned), data)) => { /* pad */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Configuration error
    Config(ConfigError),
    /// DMA error
    Dma(DmaError),
    /// I/O error
    Io(IoError),
}

impl Error {
    /// Returns a human-readable description of the inner error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::Config(e) => e.as_str(),
            Error::Dma(e) => e.as_str(),
            Error::Io(e) => e.as_str(),
        }
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Config(e) => write!(f, "config: {}", e.as_str()),
            Error::Dma(e) => write!(f, "dma: {}", e.as_str()),
            Error::Io(e) => write!(f, "io: {}", e.as_str()),
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<DmaError> for Error {
    fn from(e: DmaError) -> Self {
        Error::Dma(e)
    }
}

impl From<IoError> for Error {
    fn from(e: IoError) -> Self {
        Error::Io(e)
    }
}

/// Result type alias for channel operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = core::result::Result<T, ConfigError>;

/// Result type alias for DMA operations
pub type DmaResult<T> = core::result::Result<T, DmaError>;

/// Result type alias for I/O operations
pub type IoResult<T> = core::result::Result<T, IoError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;
    use std::format;
    use std::vec::Vec;

    use super::*;

    #[test]
    fn config_error_as_str_non_empty() {
        let variants = [
            ConfigError::RxBurstMismatch,
            ConfigError::TxBurstMismatch,
            ConfigError::RxTxBurstMismatch,
            ConfigError::BurstRequiresFifo,
            ConfigError::RxSizeMisaligned,
            ConfigError::TxSizeMisaligned,
            ConfigError::InvalidDmaPairing,
            ConfigError::StagingDmaConflict,
            ConfigError::StagingTooSmall,
            ConfigError::InvalidChannel,
        ];

        for variant in variants {
            let s = variant.as_str();
            assert!(!s.is_empty(), "ConfigError::{:?} has empty string", variant);
        }
    }

    #[test]
    fn config_error_display() {
        let display = format!("{}", ConfigError::InvalidDmaPairing);
        assert_eq!(display, "invalid dma channel pairing");
    }

    #[test]
    fn dma_error_as_str_non_empty() {
        let variants = [
            DmaError::NoChannel,
            DmaError::CircularActive,
            DmaError::CircularInactive,
            DmaError::RequestTooLarge,
            DmaError::RingTooSmall,
        ];

        for variant in variants {
            assert!(!variant.as_str().is_empty(), "DmaError::{:?}", variant);
        }
    }

    #[test]
    fn io_error_display() {
        let display = format!("{}", IoError::Busy);
        assert_eq!(display, "transfer already in progress");
    }

    #[test]
    fn line_errors_from_lsr_single_bits() {
        assert_eq!(LineErrors::from_lsr(0x02), LineError::Overrun.into());
        assert_eq!(LineErrors::from_lsr(0x04), LineError::Parity.into());
        assert_eq!(LineErrors::from_lsr(0x08), LineError::Framing.into());
        assert_eq!(LineErrors::from_lsr(0x10), LineError::Break.into());
        assert_eq!(LineErrors::from_lsr(0x80), LineError::RxFifo.into());
    }

    #[test]
    fn line_errors_ignore_data_bits() {
        // DR, THRE and TEMT carry no error
        assert!(LineErrors::from_lsr(0x01 | 0x20 | 0x40).is_empty());
        assert!(LineErrors::from_lsr(0).is_empty());
    }

    #[test]
    fn line_errors_keep_every_bit() {
        let lsr = LineError::LSR_OE | LineError::LSR_FE | LineError::LSR_RFE | 0x01;
        let errors = LineErrors::from_lsr(lsr);
        assert_eq!(errors.bits(), lsr & !0x01);
        assert!(errors.contains(LineError::Framing));
        assert!(!errors.contains(LineError::Parity));
        let kinds: Vec<LineError> = errors.iter().collect();
        assert_eq!(
            kinds,
            [LineError::Overrun, LineError::Framing, LineError::RxFifo]
        );
    }

    #[test]
    fn line_errors_iterate_every_kind() {
        let all = LineError::ALL
            .into_iter()
            .fold(LineErrors::empty(), LineErrors::with);
        assert_eq!(all.bits(), 0x9e);
        assert!(all.iter().eq(LineError::ALL));
    }

    #[test]
    fn error_from_domain_errors() {
        let err: Error = ConfigError::RxSizeMisaligned.into();
        assert_eq!(err, Error::Config(ConfigError::RxSizeMisaligned));

        let err: Error = DmaError::NoChannel.into();
        assert_eq!(err, Error::Dma(DmaError::NoChannel));

        let err: Error = IoError::Busy.into();
        assert_eq!(err, Error::Io(IoError::Busy));
    }

    #[test]
    fn error_display_prefixes_domain() {
        let display = format!("{}", Error::Config(ConfigError::RxBurstMismatch));
        assert!(display.starts_with("config: "));
        assert!(display.contains("burst"));

        let display = format!("{}", Error::Dma(DmaError::CircularInactive));
        assert!(display.starts_with("dma: "));

        let display = format!("{}", Error::Io(IoError::HardwareBusy));
        assert_eq!(display, "io: controller busy");
    }

    #[test]
    fn error_as_str_forwards() {
        assert_eq!(Error::Io(IoError::Busy).as_str(), IoError::Busy.as_str());
    }

    #[test]
    fn result_type_works() {
        fn busy() -> Result<u32> {
            Err(IoError::Busy.into())
        }

        assert_eq!(busy(), Err(Error::Io(IoError::Busy)));
    }
}
