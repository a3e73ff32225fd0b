//! Owned table of channels addressed by [`ChannelId`].
//!
//! The application creates one registry (usually a `static`) and routes
//! each serial interrupt to it by id.
//!
//! ```ignore
//! static UARTS: ChannelRegistry<Uart, DmaCh, 2> =
//!     ChannelRegistry::new([Channel::new(Uart::new(0)), Channel::new(Uart::new(1))]);
//!
//! #[interrupt]
//! fn UART0() {
//!     UARTS.on_interrupt(ChannelId::new(0));
//! }
//! ```

use super::channel::Channel;
use super::error::{ConfigError, ConfigResult};
use crate::hal::{DmaChannel, NoDma, SerialHw};

/// Index of a channel in a [`ChannelRegistry`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelId(u8);

impl ChannelId {
    /// Wrap a raw channel number
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Raw channel number
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "uart{}", self.0)
    }
}

/// Fixed set of `N` channels
pub struct ChannelRegistry<H, D = NoDma, const N: usize = 1> {
    channels: [Channel<H, D>; N],
}

impl<H: SerialHw, D: DmaChannel, const N: usize> ChannelRegistry<H, D, N> {
    /// Create a registry (const, suitable for static initialization).
    pub const fn new(channels: [Channel<H, D>; N]) -> Self {
        Self { channels }
    }

    /// Look up a channel.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidChannel`] for an id outside the registry.
    pub fn get(&self, id: ChannelId) -> ConfigResult<&Channel<H, D>> {
        self.channels.get(id.index()).ok_or_else(|| {
            warn!("no channel {}", id);
            ConfigError::InvalidChannel
        })
    }

    /// Ids of every channel, in order
    pub fn ids(&self) -> impl Iterator<Item = ChannelId> + use<H, D, N> {
        (0..N).filter_map(|i| u8::try_from(i).ok().map(ChannelId::new))
    }

    /// Number of channels
    #[must_use]
    pub const fn len(&self) -> usize {
        N
    }

    /// Registry holds no channels
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        N == 0
    }

    /// Route a serial interrupt to its channel; unknown ids are ignored.
    pub fn on_interrupt(&self, id: ChannelId) {
        if let Ok(channel) = self.get(id) {
            channel.on_interrupt();
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::driver::config::ChannelConfig;
    use crate::testing::{MockSerial, Recorder, static_buf};
    use std::vec::Vec;

    fn registry() -> (ChannelRegistry<MockSerial, NoDma, 2>, [MockSerial; 2]) {
        let serials = [MockSerial::new(), MockSerial::new()];
        let registry = ChannelRegistry::new([
            Channel::new(serials[0].clone()),
            Channel::new(serials[1].clone()),
        ]);
        for id in registry.ids() {
            registry
                .get(id)
                .unwrap()
                .configure(&ChannelConfig::new())
                .unwrap();
        }
        (registry, serials)
    }

    #[test]
    fn ids_cover_every_channel() {
        let (registry, _) = registry();
        let ids: Vec<_> = registry.ids().collect();
        assert_eq!(ids, [ChannelId::new(0), ChannelId::new(1)]);
        assert_eq!(registry.len(), 2);
        assert!(!registry.is_empty());
    }

    #[test]
    fn unknown_channel_is_rejected() {
        let (registry, _) = registry();
        assert_eq!(
            registry.get(ChannelId::new(2)).err(),
            Some(ConfigError::InvalidChannel)
        );
        // Ignored rather than panicking
        registry.on_interrupt(ChannelId::new(7));
    }

    #[test]
    fn interrupts_route_by_id() {
        let (registry, serials) = registry();
        let rec = Recorder::leak();
        let uart1 = registry.get(ChannelId::new(1)).unwrap();
        uart1.read_async(static_buf(2), rec).unwrap();

        serials[1].feed(b"ok");
        registry.on_interrupt(ChannelId::new(0));
        assert!(rec.reads().is_empty());
        registry.on_interrupt(ChannelId::new(1));
        assert_eq!(rec.reads()[0].data, b"ok");
    }

    #[test]
    fn id_display() {
        assert_eq!(std::format!("{}", ChannelId::new(3)), "uart3");
    }
}
