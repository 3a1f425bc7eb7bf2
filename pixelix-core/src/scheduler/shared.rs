//! Display manager shared between tasks
//!
//! Every access runs inside one critical section of the blocking mutex, so
//! a provider's `update()` can never overlap a slot-table mutation. The
//! closure must not call back into the same `SharedDisplayManager`.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::manager::DisplayManager;
use crate::traits::ContentProvider;

pub struct SharedDisplayManager<M: RawMutex, P, const N: usize> {
    inner: Mutex<M, RefCell<DisplayManager<P, N>>>,
}

impl<M: RawMutex, P: ContentProvider, const N: usize> SharedDisplayManager<M, P, N> {
    pub fn new(manager: DisplayManager<P, N>) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(manager)),
        }
    }

    /// Run `f` with exclusive access to the display manager
    pub fn lock<R>(&self, f: impl FnOnce(&mut DisplayManager<P, N>) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }

    /// Run one scheduler period
    pub fn tick(&self, now_ms: u32) {
        self.lock(|dm| dm.tick(now_ms));
    }
}
