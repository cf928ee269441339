// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw C types shared with the engine.

use core::ffi::{c_char, c_void};
use core::fmt;
use core::marker::{PhantomData, PhantomPinned};

/// Opaque engine state. Only ever handled by pointer.
#[repr(C)]
pub struct EngineHandle {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

impl fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EngineHandle")
    }
}

/// Encoded message queue allocated by the engine.
///
/// `data_ptr` points at `length` bytes owned by the engine until the queue is
/// passed back to `dealloc_message_queue`.
#[repr(C)]
#[derive(Debug)]
pub struct NativeMessageQueue {
    /// First byte of the encoded queue. May be null when `length` is zero.
    pub data_ptr: *mut u8,
    /// Number of bytes at `data_ptr`.
    pub length: u64,
}

/// Receives one NUL-terminated log line from the engine.
pub type CLogCallback = unsafe extern "C" fn(message: *const c_char);

/// Creates the engine. Returns null on failure.
pub type InitFn = unsafe extern "C" fn(log: CLogCallback) -> *mut EngineHandle;

/// Advances one frame and returns the outgoing queue, or null.
pub type TickFn = unsafe extern "C" fn(
    handle: *mut EngineHandle,
    context: *mut c_void,
    width: f32,
    height: f32,
) -> *mut NativeMessageQueue;

/// Delivers one encoded interrupt. The buffer is only valid during the call.
pub type InterruptFn =
    unsafe extern "C" fn(handle: *mut EngineHandle, buffer: *const u8, length: u64);

/// Returns a queue previously produced by [`TickFn`].
pub type DeallocFn = unsafe extern "C" fn(queue: *mut NativeMessageQueue);

/// The engine's C entry points.
#[derive(Clone, Copy, Debug)]
pub struct EngineVTable {
    /// `init`
    pub init: InitFn,
    /// `tick`
    pub tick: TickFn,
    /// `interrupt`
    pub interrupt: InterruptFn,
    /// `dealloc_message_queue`
    pub dealloc_message_queue: DeallocFn,
}
