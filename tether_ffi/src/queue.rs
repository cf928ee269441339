// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Owning wrapper for engine-allocated queues.

use core::fmt;
use core::ptr::NonNull;

use tether_core::engine::OutgoingQueue;

use crate::abi::{DeallocFn, NativeMessageQueue};

/// One engine-allocated message queue.
///
/// Dropping the queue hands it back to the engine. There is no other way to
/// free it, so each queue is deallocated exactly once.
pub struct FfiQueue {
    raw: NonNull<NativeMessageQueue>,
    dealloc: DeallocFn,
}

impl FfiQueue {
    /// Takes ownership of `raw`.
    ///
    /// # Safety
    ///
    /// `raw` must be a queue returned by the engine's `tick` that has not been
    /// deallocated, and `dealloc` must be that engine's
    /// `dealloc_message_queue`.
    pub(crate) unsafe fn from_raw(raw: NonNull<NativeMessageQueue>, dealloc: DeallocFn) -> Self {
        Self { raw, dealloc }
    }

    /// Number of encoded bytes in the queue.
    #[must_use]
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` if the engine produced no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutgoingQueue for FfiQueue {
    fn as_bytes(&self) -> &[u8] {
        // SAFETY: `raw` is live until drop per the `from_raw` contract.
        let queue = unsafe { self.raw.as_ref() };
        let Ok(len) = usize::try_from(queue.length) else {
            return &[];
        };
        if queue.data_ptr.is_null() || len == 0 {
            return &[];
        }
        // SAFETY: the engine guarantees `data_ptr` addresses `length` bytes
        // that stay untouched until the queue is deallocated.
        unsafe { core::slice::from_raw_parts(queue.data_ptr, len) }
    }
}

impl Drop for FfiQueue {
    fn drop(&mut self) {
        // SAFETY: the queue came from this engine and is freed only here.
        unsafe { (self.dealloc)(self.raw.as_ptr()) };
    }
}

impl fmt::Debug for FfiQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FfiQueue")
            .field("raw", &self.raw)
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}
