//! Interrupt-safe shared state.
//!
//! Every piece of per-channel state lives in a [`CriticalSectionCell`] so
//! task code and the serial/DMA interrupt handlers can reach it through a
//! shared `&'static Channel`.

use core::cell::{RefCell, RefMut};
use critical_section::{CriticalSection, Mutex};

/// `RefCell` behind a `critical_section::Mutex`.
///
/// Access either opens its own critical section ([`with`](Self::with),
/// [`with_ref`](Self::with_ref)) or joins one the caller holds
/// ([`borrow_mut`](Self::borrow_mut)), which is how the channel locks the
/// controller and one direction together.
pub struct CriticalSectionCell<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> CriticalSectionCell<T> {
    /// Create a new cell (const, suitable for static initialization).
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` on the value inside a fresh critical section
    #[inline]
    pub fn with<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow_ref_mut(cs)))
    }

    /// Shared access inside a fresh critical section
    #[inline]
    pub fn with_ref<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        critical_section::with(|cs| f(&self.inner.borrow_ref(cs)))
    }

    /// Borrow inside a critical section the caller already holds.
    ///
    /// Panics if the same cell is borrowed twice in one section.
    #[inline]
    pub fn borrow_mut<'cs>(&'cs self, cs: CriticalSection<'cs>) -> RefMut<'cs, T> {
        self.inner.borrow_ref_mut(cs)
    }

    /// Builder-time access through `&mut self`; no critical section needed
    #[inline]
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut().get_mut()
    }
}

// SAFETY: the value is only reachable through `critical_section::Mutex`,
// which hands out access only while a critical section is held.
unsafe impl<T> Sync for CriticalSectionCell<T> {}
