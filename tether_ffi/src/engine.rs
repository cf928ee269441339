// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`Engine`] over the C entry points.

use core::ptr::NonNull;

use tether_core::engine::{DrawContext, Engine, EngineBootstrap, EngineError, LogSink};

use crate::abi::{EngineHandle, EngineVTable};
use crate::log;
use crate::queue::FfiQueue;

/// Initializes an engine through its C `init` entry point.
#[derive(Clone, Copy, Debug)]
pub struct FfiBootstrap {
    vtable: EngineVTable,
}

impl FfiBootstrap {
    /// Wraps the engine's entry points.
    ///
    /// # Safety
    ///
    /// Every function in `vtable` must follow the engine ABI: `init` returns
    /// a handle that `tick` and `interrupt` accept, queues returned by `tick`
    /// remain valid until passed to `dealloc_message_queue`, and no entry point
    /// retains pointers passed to it beyond the call.
    #[must_use]
    pub const unsafe fn new(vtable: EngineVTable) -> Self {
        Self { vtable }
    }
}

impl EngineBootstrap for FfiBootstrap {
    type Engine = FfiEngine;

    fn init(self, log: LogSink) -> Result<FfiEngine, EngineError> {
        log::install(log);
        // SAFETY: `vtable` upholds the engine ABI per `FfiBootstrap::new`.
        let raw = unsafe { (self.vtable.init)(log::trampoline) };
        let handle = NonNull::new(raw)
            .ok_or_else(|| EngineError::Init("engine returned a null handle".into()))?;
        tracing::debug!(handle = ?handle, "engine initialized");
        Ok(FfiEngine {
            vtable: self.vtable,
            handle,
        })
    }
}

/// A running engine behind its opaque handle.
#[derive(Debug)]
pub struct FfiEngine {
    vtable: EngineVTable,
    handle: NonNull<EngineHandle>,
}

impl FfiEngine {
    /// Adopts a handle the host obtained from `init` itself.
    ///
    /// Returns [`EngineError::InvalidHandle`] if `handle` is null.
    ///
    /// # Safety
    ///
    /// `vtable` must satisfy the contract of [`FfiBootstrap::new`], and
    /// `handle` must be null or a live handle produced by `vtable.init`.
    pub unsafe fn from_raw_handle(
        vtable: EngineVTable,
        handle: *mut EngineHandle,
    ) -> Result<Self, EngineError> {
        let handle = NonNull::new(handle).ok_or(EngineError::InvalidHandle)?;
        Ok(Self { vtable, handle })
    }

    /// Returns the raw handle.
    #[must_use]
    pub fn as_raw_handle(&self) -> *mut EngineHandle {
        self.handle.as_ptr()
    }
}

impl Engine for FfiEngine {
    type Queue = FfiQueue;

    fn tick(
        &mut self,
        context: DrawContext,
        width: f64,
        height: f64,
    ) -> Result<FfiQueue, EngineError> {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "the ABI carries drawable sizes as single precision"
        )]
        let (width, height) = (width as f32, height as f32);
        // SAFETY: `handle` is live and `vtable` upholds the engine ABI.
        let raw = unsafe {
            (self.vtable.tick)(self.handle.as_ptr(), context.as_raw(), width, height)
        };
        let raw = NonNull::new(raw).ok_or(EngineError::NullQueue)?;
        // SAFETY: `raw` was just returned by this engine's `tick`.
        Ok(unsafe { FfiQueue::from_raw(raw, self.vtable.dealloc_message_queue) })
    }

    fn release(&mut self, queue: FfiQueue) {
        drop(queue);
    }

    fn interrupt(&mut self, buffer: &[u8]) -> Result<(), EngineError> {
        let length = u64::try_from(buffer.len())
            .map_err(|_| EngineError::Call("interrupt buffer too large".into()))?;
        // SAFETY: `buffer` outlives the call and the engine copies what it
        // keeps before returning.
        unsafe { (self.vtable.interrupt)(self.handle.as_ptr(), buffer.as_ptr(), length) };
        Ok(())
    }
}
