//! Cross-context message proxy
//!
//! Bounded FIFO that moves owned values from interrupt-side tasks and
//! network callbacks into the cooperative main loop. Producers never block:
//! when the queue is full the newest message is dropped. Ownership of a
//! payload moves into the queue on a successful send and out of it on
//! receive, so every payload is dropped exactly once.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::channel::{Channel, TrySendError};

/// Message envelope with an optional owned payload
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Message<K, P> {
    pub kind: K,
    pub payload: Option<P>,
}

impl<K, P> Message<K, P> {
    /// Message without payload
    pub fn new(kind: K) -> Self {
        Self { kind, payload: None }
    }

    pub fn with_payload(kind: K, payload: P) -> Self {
        Self {
            kind,
            payload: Some(payload),
        }
    }
}

/// Bounded many-producer / single-consumer queue
pub struct MessageProxy<M: RawMutex, T, const N: usize> {
    channel: Channel<M, T, N>,
}

impl<M: RawMutex, T, const N: usize> Default for MessageProxy<M, T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: RawMutex, T, const N: usize> MessageProxy<M, T, N> {
    /// Create an empty proxy (usable in `static` items)
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
        }
    }

    /// Enqueue without blocking
    ///
    /// Returns false if the queue is full; the message is dropped in that
    /// case.
    pub fn send(&self, msg: T) -> bool {
        match self.try_send(msg) {
            Ok(()) => true,
            Err(_rejected) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Message queue full, dropping newest message");
                false
            }
        }
    }

    /// Enqueue without blocking, handing a rejected message back
    pub fn try_send(&self, msg: T) -> Result<(), T> {
        match self.channel.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(msg)) => Err(msg),
        }
    }

    /// Dequeue without blocking
    pub fn receive(&self) -> Option<T> {
        self.channel.try_receive().ok()
    }

    /// Drop every pending message, returns how many were discarded
    pub fn clear(&self) -> usize {
        let mut dropped = 0;
        while self.channel.try_receive().is_ok() {
            dropped += 1;
        }
        dropped
    }

    pub fn len(&self) -> usize {
        self.channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channel.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.channel.is_full()
    }

    pub const fn capacity(&self) -> usize {
        N
    }
}
