//! Channel configuration types.
//!
//! A [`ChannelConfig`] groups three independent pieces:
//!
//! - [`LineConfig`]: baud rate and character framing
//! - [`FifoConfig`]: hardware FIFO enable and trigger levels
//! - [`DmaConfig`]: DMA burst width and priority per direction
//!
//! Burst widths and FIFO trigger levels are coupled: a DMA burst of 4 needs
//! the "quarter full" trigger and a burst of 8 needs "half full" so the
//! controller raises a DMA request exactly when one burst can move.
//! [`ChannelConfig::validate`] enforces this table.

use crate::constants::{DEFAULT_BAUD_RATE, DEFAULT_DMA_PRIORITY, MAX_DMA_PRIORITY};

use super::error::{ConfigError, ConfigResult};

// =============================================================================
// Line Settings
// =============================================================================

/// Number of data bits per character
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataBits {
    /// 5 data bits
    Five = 5,
    /// 6 data bits
    Six = 6,
    /// 7 data bits
    Seven = 7,
    /// 8 data bits
    #[default]
    Eight = 8,
}

/// Parity mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Parity {
    /// No parity bit
    #[default]
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// One stop bit
    #[default]
    One,
    /// Two stop bits (1.5 with 5 data bits)
    Two,
}

/// Baud rate and character framing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineConfig {
    /// Baud rate in bits per second
    pub baud_rate: u32,
    /// Data bits per character
    pub data_bits: DataBits,
    /// Parity mode
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Hardware RTS/CTS flow control
    pub auto_flow_control: bool,
}

impl LineConfig {
    /// 115200 8N1, no flow control
    #[must_use]
    pub const fn new() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
            auto_flow_control: false,
        }
    }

    /// Set the baud rate
    #[must_use]
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Set the data bits
    #[must_use]
    pub const fn with_data_bits(mut self, data_bits: DataBits) -> Self {
        self.data_bits = data_bits;
        self
    }

    /// Set the parity mode
    #[must_use]
    pub const fn with_parity(mut self, parity: Parity) -> Self {
        self.parity = parity;
        self
    }

    /// Set the stop bits
    #[must_use]
    pub const fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Enable or disable hardware flow control
    #[must_use]
    pub const fn with_auto_flow_control(mut self, enabled: bool) -> Self {
        self.auto_flow_control = enabled;
        self
    }
}

impl Default for LineConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Hardware FIFO
// =============================================================================

/// Receive FIFO trigger level (2-bit register encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum RxTrigger {
    /// One character in the FIFO
    #[default]
    OneChar = 0,
    /// FIFO a quarter full
    QuarterFull = 1,
    /// FIFO half full
    HalfFull = 2,
    /// FIFO two characters less than full
    TwoLessThanFull = 3,
}

impl RxTrigger {
    /// Decode the 2-bit register field
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => RxTrigger::OneChar,
            1 => RxTrigger::QuarterFull,
            2 => RxTrigger::HalfFull,
            _ => RxTrigger::TwoLessThanFull,
        }
    }

    /// Register field value
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        self as u8
    }
}

/// Transmit FIFO trigger level (2-bit register encoding)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum TxTrigger {
    /// FIFO empty
    #[default]
    Empty = 0,
    /// Two characters in the FIFO
    TwoChars = 1,
    /// FIFO a quarter full
    QuarterFull = 2,
    /// FIFO half full
    HalfFull = 3,
}

impl TxTrigger {
    /// Decode the 2-bit register field
    #[must_use]
    pub const fn from_bits(bits: u8) -> Self {
        match bits & 0x3 {
            0 => TxTrigger::Empty,
            1 => TxTrigger::TwoChars,
            2 => TxTrigger::QuarterFull,
            _ => TxTrigger::HalfFull,
        }
    }

    /// Register field value
    #[must_use]
    pub const fn to_bits(self) -> u8 {
        self as u8
    }
}

/// Hardware FIFO configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoConfig {
    /// Enable the controller's hardware FIFOs
    pub enabled: bool,
    /// Receive trigger level
    pub rx_trigger: RxTrigger,
    /// Transmit trigger level
    pub tx_trigger: TxTrigger,
}

impl FifoConfig {
    /// Hardware FIFO disabled
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            rx_trigger: RxTrigger::OneChar,
            tx_trigger: TxTrigger::Empty,
        }
    }

    /// Hardware FIFO enabled with the given trigger levels
    #[must_use]
    pub const fn enabled(rx_trigger: RxTrigger, tx_trigger: TxTrigger) -> Self {
        Self {
            enabled: true,
            rx_trigger,
            tx_trigger,
        }
    }
}

// =============================================================================
// DMA
// =============================================================================

/// DMA burst width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DmaBurst {
    /// Single transfers
    #[default]
    Disabled = 1,
    /// 4-byte bursts
    Burst4 = 4,
    /// 8-byte bursts
    Burst8 = 8,
}

impl DmaBurst {
    /// Bytes moved per DMA request
    #[must_use]
    pub const fn width(self) -> usize {
        self as usize
    }

    /// Check that a transfer length is a whole number of bursts
    #[must_use]
    pub const fn accepts_len(self, len: usize) -> bool {
        len % self.width() == 0
    }

    /// Check the receive trigger level pairing
    #[must_use]
    pub const fn matches_rx(self, trigger: RxTrigger) -> bool {
        match self {
            DmaBurst::Disabled => true,
            DmaBurst::Burst4 => matches!(trigger, RxTrigger::QuarterFull),
            DmaBurst::Burst8 => matches!(trigger, RxTrigger::HalfFull),
        }
    }

    /// Check the transmit trigger level pairing
    #[must_use]
    pub const fn matches_tx(self, trigger: TxTrigger) -> bool {
        match self {
            DmaBurst::Disabled => true,
            DmaBurst::Burst4 => matches!(trigger, TxTrigger::QuarterFull),
            DmaBurst::Burst8 => matches!(trigger, TxTrigger::HalfFull),
        }
    }
}

/// DMA configuration for both directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaConfig {
    /// Receive burst width
    pub rx_burst: DmaBurst,
    /// Transmit burst width
    pub tx_burst: DmaBurst,
    /// Receive channel priority
    pub rx_priority: u8,
    /// Transmit channel priority
    pub tx_priority: u8,
}

impl DmaConfig {
    /// No bursts, default priority
    #[must_use]
    pub const fn new() -> Self {
        Self {
            rx_burst: DmaBurst::Disabled,
            tx_burst: DmaBurst::Disabled,
            rx_priority: DEFAULT_DMA_PRIORITY,
            tx_priority: DEFAULT_DMA_PRIORITY,
        }
    }
}

impl Default for DmaConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Channel Configuration
// =============================================================================

/// Complete channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelConfig {
    /// Line settings
    pub line: LineConfig,
    /// Hardware FIFO settings
    pub fifo: FifoConfig,
    /// DMA settings
    pub dma: DmaConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelConfig {
    /// Create a new configuration with defaults (115200 8N1, FIFO off, no bursts)
    #[must_use]
    pub const fn new() -> Self {
        Self {
            line: LineConfig::new(),
            fifo: FifoConfig::disabled(),
            dma: DmaConfig::new(),
        }
    }

    // =========================================================================
    // Builder Methods
    // =========================================================================

    /// Set the line settings
    #[must_use]
    pub const fn with_line(mut self, line: LineConfig) -> Self {
        self.line = line;
        self
    }

    /// Set the baud rate
    #[must_use]
    pub const fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.line.baud_rate = baud_rate;
        self
    }

    /// Set the hardware FIFO settings
    #[must_use]
    pub const fn with_fifo(mut self, fifo: FifoConfig) -> Self {
        self.fifo = fifo;
        self
    }

    /// Set the receive DMA burst width
    #[must_use]
    pub const fn with_rx_burst(mut self, burst: DmaBurst) -> Self {
        self.dma.rx_burst = burst;
        self
    }

    /// Set the transmit DMA burst width
    #[must_use]
    pub const fn with_tx_burst(mut self, burst: DmaBurst) -> Self {
        self.dma.tx_burst = burst;
        self
    }

    /// Set the DMA channel priorities (clamped to the highest level)
    #[must_use]
    pub const fn with_dma_priority(mut self, rx: u8, tx: u8) -> Self {
        self.dma.rx_priority = if rx > MAX_DMA_PRIORITY {
            MAX_DMA_PRIORITY
        } else {
            rx
        };
        self.dma.tx_priority = if tx > MAX_DMA_PRIORITY {
            MAX_DMA_PRIORITY
        } else {
            tx
        };
        self
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Validate the burst/trigger pairing.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::BurstRequiresFifo`] when a burst is set with the
    ///   hardware FIFO disabled
    /// - [`ConfigError::RxBurstMismatch`], [`ConfigError::TxBurstMismatch`]
    ///   or [`ConfigError::RxTxBurstMismatch`] when a trigger level does not
    ///   fit its burst width
    pub const fn validate(&self) -> ConfigResult<()> {
        let bursts_set = !matches!(self.dma.rx_burst, DmaBurst::Disabled)
            || !matches!(self.dma.tx_burst, DmaBurst::Disabled);
        if bursts_set && !self.fifo.enabled {
            return Err(ConfigError::BurstRequiresFifo);
        }

        let rx_ok = self.dma.rx_burst.matches_rx(self.fifo.rx_trigger);
        let tx_ok = self.dma.tx_burst.matches_tx(self.fifo.tx_trigger);
        match (rx_ok, tx_ok) {
            (true, true) => Ok(()),
            (false, true) => Err(ConfigError::RxBurstMismatch),
            (true, false) => Err(ConfigError::TxBurstMismatch),
            (false, false) => Err(ConfigError::RxTxBurstMismatch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RX_TRIGGERS: [RxTrigger; 4] = [
        RxTrigger::OneChar,
        RxTrigger::QuarterFull,
        RxTrigger::HalfFull,
        RxTrigger::TwoLessThanFull,
    ];

    const TX_TRIGGERS: [TxTrigger; 4] = [
        TxTrigger::Empty,
        TxTrigger::TwoChars,
        TxTrigger::QuarterFull,
        TxTrigger::HalfFull,
    ];

    fn with_triggers(rx: RxTrigger, tx: TxTrigger) -> ChannelConfig {
        ChannelConfig::new().with_fifo(FifoConfig::enabled(rx, tx))
    }

    #[test]
    fn default_config_is_valid() {
        let config = ChannelConfig::default();
        assert_eq!(config.line.baud_rate, 115_200);
        assert!(!config.fifo.enabled);
        assert_eq!(config.dma.rx_priority, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn burst_disabled_accepts_any_trigger() {
        for rx in RX_TRIGGERS {
            for tx in TX_TRIGGERS {
                assert!(with_triggers(rx, tx).validate().is_ok());
            }
        }
    }

    #[test]
    fn rx_burst_table() {
        for rx in RX_TRIGGERS {
            let burst4 = with_triggers(rx, TxTrigger::Empty).with_rx_burst(DmaBurst::Burst4);
            let burst8 = with_triggers(rx, TxTrigger::Empty).with_rx_burst(DmaBurst::Burst8);

            if rx == RxTrigger::QuarterFull {
                assert!(burst4.validate().is_ok());
            } else {
                assert_eq!(burst4.validate(), Err(ConfigError::RxBurstMismatch));
            }
            if rx == RxTrigger::HalfFull {
                assert!(burst8.validate().is_ok());
            } else {
                assert_eq!(burst8.validate(), Err(ConfigError::RxBurstMismatch));
            }
        }
    }

    #[test]
    fn tx_burst_table() {
        for tx in TX_TRIGGERS {
            let burst4 = with_triggers(RxTrigger::OneChar, tx).with_tx_burst(DmaBurst::Burst4);
            let burst8 = with_triggers(RxTrigger::OneChar, tx).with_tx_burst(DmaBurst::Burst8);

            if tx == TxTrigger::QuarterFull {
                assert!(burst4.validate().is_ok());
            } else {
                assert_eq!(burst4.validate(), Err(ConfigError::TxBurstMismatch));
            }
            if tx == TxTrigger::HalfFull {
                assert!(burst8.validate().is_ok());
            } else {
                assert_eq!(burst8.validate(), Err(ConfigError::TxBurstMismatch));
            }
        }
    }

    #[test]
    fn both_directions_mismatched() {
        let config = with_triggers(RxTrigger::OneChar, TxTrigger::Empty)
            .with_rx_burst(DmaBurst::Burst8)
            .with_tx_burst(DmaBurst::Burst4);
        assert_eq!(config.validate(), Err(ConfigError::RxTxBurstMismatch));
    }

    #[test]
    fn burst_requires_fifo() {
        let config = ChannelConfig::new().with_rx_burst(DmaBurst::Burst4);
        assert_eq!(config.validate(), Err(ConfigError::BurstRequiresFifo));
    }

    #[test]
    fn burst_len_alignment() {
        assert!(DmaBurst::Disabled.accepts_len(7));
        assert!(DmaBurst::Burst4.accepts_len(12));
        assert!(!DmaBurst::Burst4.accepts_len(10));
        assert!(DmaBurst::Burst8.accepts_len(16));
        assert!(!DmaBurst::Burst8.accepts_len(12));
    }

    #[test]
    fn trigger_bits_roundtrip() {
        for rx in RX_TRIGGERS {
            assert_eq!(RxTrigger::from_bits(rx.to_bits()), rx);
        }
        for tx in TX_TRIGGERS {
            assert_eq!(TxTrigger::from_bits(tx.to_bits()), tx);
        }
        assert_eq!(TxTrigger::from_bits(0b111), TxTrigger::HalfFull);
    }

    #[test]
    fn priority_is_clamped() {
        let config = ChannelConfig::new().with_dma_priority(9, 3);
        assert_eq!(config.dma.rx_priority, 7);
        assert_eq!(config.dma.tx_priority, 3);
    }

    #[test]
    fn line_builder() {
        let line = LineConfig::new()
            .with_baud_rate(9600)
            .with_data_bits(DataBits::Seven)
            .with_parity(Parity::Even)
            .with_stop_bits(StopBits::Two)
            .with_auto_flow_control(true);
        assert_eq!(line.baud_rate, 9600);
        assert_eq!(line.data_bits as u8, 7);
        assert_eq!(line.parity, Parity::Even);
        assert_eq!(line.stop_bits, StopBits::Two);
        assert!(line.auto_flow_control);

        let config = ChannelConfig::new().with_line(line).with_baud_rate(57_600);
        assert_eq!(config.line.baud_rate, 57_600);
        assert_eq!(config.line.parity, Parity::Even);
    }
}
