// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! C ABI binding for tether engines.
//!
//! A compiled engine exposes four C entry points:
//!
//! ```text
//! EngineHandle*       init(void (*log)(const char*));
//! NativeMessageQueue* tick(EngineHandle*, void* ctx, float width, float height);
//! void                interrupt(EngineHandle*, const uint8_t* buffer, uint64_t length);
//! void                dealloc_message_queue(NativeMessageQueue*);
//! ```
//!
//! The host collects them into an [`EngineVTable`] (usually from symbols
//! linked into the binary) and hands an [`FfiBootstrap`] to
//! [`TickDriver`](tether_core::driver::TickDriver). From there on the engine
//! is driven through [`tether_core::engine::Engine`] like any other:
//!
//! - [`FfiEngine`] owns the non-null handle.
//! - [`FfiQueue`] owns one engine-allocated queue and returns it through
//!   `dealloc_message_queue` exactly once, on release or on drop.
//! - Engine log lines arrive through a C trampoline and are forwarded to the
//!   [`LogSink`](tether_core::engine::LogSink) given at init.

#![expect(unsafe_code, reason = "engine entry points are foreign functions")]

mod abi;
mod engine;
mod log;
mod queue;

pub use abi::{
    CLogCallback, DeallocFn, EngineHandle, EngineVTable, InitFn, InterruptFn, NativeMessageQueue,
    TickFn,
};
pub use engine::{FfiBootstrap, FfiEngine};
pub use queue::FfiQueue;
