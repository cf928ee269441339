// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine contract.
//!
//! The engine is a compiled core with four entry points:
//!
//! - **init** — takes a logging sink and returns an opaque handle. Modeled by
//!   [`EngineBootstrap::init`], which consumes the bootstrap and yields the
//!   [`Engine`] that owns the handle for the lifetime of the surface.
//! - **tick** — advances the scene for one frame and returns the outgoing
//!   message queue. The queue is engine-owned memory transferred to the host
//!   for exactly one consumption.
//! - **release** — returns a queue to the engine. [`Engine::release`] takes the
//!   queue by value, so once released the host cannot reach it again.
//! - **interrupt** — delivers one encoded host event. The call is synchronous:
//!   the engine copies what it needs before returning.
//!
//! `tether_ffi` implements this contract over C function pointers. Pure Rust
//! engines (and test doubles) implement it directly, typically with
//! [`OwnedQueue`] as the queue type.
//!
//! None of these entry points is safe for concurrent use: all calls must
//! happen on the single tick context. [`TickDriver`](crate::driver::TickDriver)
//! is the only caller in practice.

use core::ffi::c_void;
use core::fmt;

use thiserror::Error;

/// Callback the engine uses to emit log lines.
pub type LogSink = fn(&str);

/// Default [`LogSink`]: forwards engine log lines to `tracing` under the
/// `tether::engine` target.
pub fn log_engine_message(message: &str) {
    tracing::info!(target: "tether::engine", "{message}");
}

/// Opaque host drawing context passed through to the engine on each tick.
///
/// The host owns the context (for example a `CGContextRef` on macOS); the core
/// never dereferences it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DrawContext(*mut c_void);

impl DrawContext {
    /// A context for engines that do not draw themselves.
    #[must_use]
    pub const fn null() -> Self {
        Self(core::ptr::null_mut())
    }

    /// Wraps a raw host context pointer.
    #[must_use]
    pub const fn from_raw(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// Returns the raw pointer.
    #[must_use]
    pub const fn as_raw(self) -> *mut c_void {
        self.0
    }

    /// Returns `true` for [`DrawContext::null`].
    #[must_use]
    pub fn is_null(self) -> bool {
        self.0.is_null()
    }
}

impl Default for DrawContext {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Debug for DrawContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DrawContext({:p})", self.0)
    }
}

/// An outgoing message queue borrowed from the engine until released.
pub trait OutgoingQueue {
    /// Returns the encoded queue bytes.
    fn as_bytes(&self) -> &[u8];
}

/// A queue backed by a host-allocated buffer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnedQueue(pub Vec<u8>);

impl OutgoingQueue for OwnedQueue {
    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// A running engine, owning its opaque handle.
pub trait Engine {
    /// Queue type returned by [`tick`](Self::tick).
    type Queue: OutgoingQueue;

    /// Advances one frame at the given drawable size and returns the
    /// outgoing queue.
    fn tick(
        &mut self,
        context: DrawContext,
        width: f64,
        height: f64,
    ) -> Result<Self::Queue, EngineError>;

    /// Returns a queue to the engine. Must be called exactly once per queue
    /// returned by [`tick`](Self::tick).
    fn release(&mut self, queue: Self::Queue);

    /// Delivers one encoded interrupt. `buffer` only needs to stay valid for
    /// the duration of the call.
    fn interrupt(&mut self, buffer: &[u8]) -> Result<(), EngineError>;
}

/// Initialization entry point of an engine.
pub trait EngineBootstrap {
    /// The engine produced by a successful initialization.
    type Engine: Engine;

    /// Initializes the engine, handing it `log` for diagnostics.
    fn init(self, log: LogSink) -> Result<Self::Engine, EngineError>;
}

/// Errors reported across the engine boundary.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The engine handle is null, freed, or otherwise unusable.
    #[error("engine handle is invalid")]
    InvalidHandle,

    /// Initialization did not produce a handle.
    #[error("engine initialization failed: {0}")]
    Init(String),

    /// Tick returned no queue.
    #[error("engine returned no message queue")]
    NullQueue,

    /// A call failed in a way the engine reported.
    #[error("engine call failed: {0}")]
    Call(String),
}

impl EngineError {
    /// Returns `true` if the surface cannot keep ticking after this error.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidHandle | Self::Init(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fatal_classification() {
        assert!(EngineError::InvalidHandle.is_fatal());
        assert!(EngineError::Init("no handle".into()).is_fatal());
        assert!(!EngineError::NullQueue.is_fatal());
        assert!(!EngineError::Call("busy".into()).is_fatal());
    }

    #[test]
    fn null_context() {
        assert!(DrawContext::null().is_null());
        assert_eq!(DrawContext::default(), DrawContext::null());
    }
}
