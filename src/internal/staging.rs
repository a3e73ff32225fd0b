//! Software staging FIFO between the receive interrupt and task readers.

/// Single-producer single-consumer byte ring.
///
/// The receive interrupt is the only producer (`write` index) and the task
/// side the only consumer (`read` index); both run under the channel's
/// critical section. One slot always stays free, so `storage.len() - 1`
/// bytes fit.
pub(crate) struct StagingFifo {
    storage: &'static mut [u8],
    read: usize,
    write: usize,
}

impl StagingFifo {
    /// Wrap caller storage. Callers check the minimum size.
    pub(crate) fn new(storage: &'static mut [u8]) -> Self {
        Self {
            storage,
            read: 0,
            write: 0,
        }
    }

    #[inline(always)]
    fn next(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.storage.len() { 0 } else { next }
    }

    /// Usable capacity
    pub(crate) fn capacity(&self) -> usize {
        self.storage.len().saturating_sub(1)
    }

    /// Bytes currently staged
    pub(crate) fn len(&self) -> usize {
        if self.write >= self.read {
            self.write - self.read
        } else {
            self.storage.len() - self.read + self.write
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.read == self.write
    }

    pub(crate) fn is_full(&self) -> bool {
        self.next(self.write) == self.read
    }

    /// Stage one byte. Returns `false` (and drops nothing) when full.
    pub(crate) fn push(&mut self, byte: u8) -> bool {
        let next = self.next(self.write);
        if next == self.read {
            return false;
        }
        self.storage[self.write] = byte;
        self.write = next;
        true
    }

    /// Take the oldest staged byte
    pub(crate) fn pop(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.storage[self.read];
        self.read = self.next(self.read);
        Some(byte)
    }

    /// Move up to `dst.len()` staged bytes into `dst`
    pub(crate) fn pop_into(&mut self, dst: &mut [u8]) -> usize {
        let mut count = 0;
        for slot in dst.iter_mut() {
            match self.pop() {
                Some(byte) => *slot = byte,
                None => break,
            }
            count += 1;
        }
        count
    }

    /// Discard all staged bytes
    pub(crate) fn clear(&mut self) {
        self.read = 0;
        self.write = 0;
    }

    /// Release the storage
    pub(crate) fn into_storage(self) -> &'static mut [u8] {
        self.storage
    }
}
