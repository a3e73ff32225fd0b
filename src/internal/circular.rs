//! Circular DMA receive ring bookkeeping.
//!
//! The DMA engine writes the ring forever; the channel only tracks the
//! consumer `head`. The hardware write position comes from
//! `DmaChannel::transferred_bytes` while the channel is frozen.

/// Receive ring owned by the channel while circular receive runs.
pub(crate) struct CircularRing {
    storage: &'static mut [u8],
    head: usize,
}

impl CircularRing {
    pub(crate) fn new(storage: &'static mut [u8]) -> Self {
        Self { storage, head: 0 }
    }

    /// Ring size in bytes
    #[inline(always)]
    pub(crate) fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Consumer position
    #[cfg(test)]
    pub(crate) fn head(&self) -> usize {
        self.head
    }

    /// Start address handed to the DMA engine
    pub(crate) fn address(&mut self) -> usize {
        self.storage.as_mut_ptr() as usize
    }

    /// Bytes written by hardware and not yet copied out
    pub(crate) fn unread(&self, hw_index: usize) -> usize {
        let cap = self.capacity();
        (hw_index % cap + cap - self.head) % cap
    }

    /// Index whose write means `len` bytes are available from `head`
    pub(crate) fn trigger_index(&self, len: usize) -> usize {
        (self.head + len.max(1) - 1) % self.capacity()
    }

    /// Copy `dst.len()` bytes starting at `head` and advance it.
    ///
    /// The caller has checked availability.
    pub(crate) fn copy_out(&mut self, dst: &mut [u8]) {
        let cap = self.capacity();
        let len = dst.len();
        let first = len.min(cap - self.head);
        dst[..first].copy_from_slice(&self.storage[self.head..self.head + first]);
        if first < len {
            dst[first..].copy_from_slice(&self.storage[..len - first]);
        }
        self.head = (self.head + len) % cap;
    }

    /// Release the storage
    pub(crate) fn into_storage(self) -> &'static mut [u8] {
        self.storage
    }

    #[cfg(test)]
    pub(crate) fn storage_mut(&mut self) -> &mut [u8] {
        &mut *self.storage
    }
}
