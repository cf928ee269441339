// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A C-ABI engine written in Rust, for exercising the binding.

#![allow(dead_code, reason = "each test binary uses a different subset")]
#![allow(unsafe_code, reason = "the mock implements the C entry points")]

use core::ffi::c_void;
use std::cell::{Cell, RefCell};

use tether_core::codec::Codec;
use tether_core::id::IdChain;
use tether_core::message::{AnyCreatePatch, MessageQueue, NativeMessage, TextPatch};
use tether_ffi::{CLogCallback, EngineHandle, EngineVTable, NativeMessageQueue};

thread_local! {
    pub static TICKS: Cell<usize> = const { Cell::new(0) };
    pub static DEALLOCS: Cell<usize> = const { Cell::new(0) };
    pub static SIZES: RefCell<Vec<(f32, f32)>> = const { RefCell::new(Vec::new()) };
    pub static INTERRUPTS: RefCell<Vec<Vec<u8>>> = const { RefCell::new(Vec::new()) };
}

struct MockState {
    frames: u64,
}

unsafe extern "C" fn mock_init(log: CLogCallback) -> *mut EngineHandle {
    // SAFETY: the literal is a valid C string.
    unsafe { log(c"mock engine ready".as_ptr()) };
    Box::into_raw(Box::new(MockState { frames: 0 })).cast()
}

unsafe extern "C" fn null_init(_: CLogCallback) -> *mut EngineHandle {
    core::ptr::null_mut()
}

fn leak_queue(bytes: Vec<u8>) -> *mut NativeMessageQueue {
    let length = bytes.len() as u64;
    let data_ptr = Box::into_raw(bytes.into_boxed_slice()).cast::<u8>();
    Box::into_raw(Box::new(NativeMessageQueue { data_ptr, length }))
}

/// Creates text `[1]` on the first frame and rewrites its content with the
/// drawable size on every frame.
unsafe extern "C" fn mock_tick(
    handle: *mut EngineHandle,
    _: *mut c_void,
    width: f32,
    height: f32,
) -> *mut NativeMessageQueue {
    // SAFETY: the handle came from `mock_init`.
    let state = unsafe { &mut *handle.cast::<MockState>() };
    state.frames += 1;
    TICKS.with(|t| t.set(t.get() + 1));
    SIZES.with(|s| s.borrow_mut().push((width, height)));

    let id = IdChain::from([1]);
    let mut messages = Vec::new();
    if state.frames == 1 {
        messages.push(NativeMessage::TextCreate(AnyCreatePatch {
            id_chain: id.clone(),
            clipping_ids: Vec::new(),
        }));
    }
    messages.push(NativeMessage::TextUpdate(TextPatch {
        content: Some(format!("{width}x{height}")),
        ..TextPatch::new(id)
    }));
    let bytes = Codec::FlexBuffers
        .encode(&MessageQueue::new(messages))
        .unwrap_or_default();
    leak_queue(bytes)
}

unsafe extern "C" fn empty_tick(
    _: *mut EngineHandle,
    _: *mut c_void,
    _: f32,
    _: f32,
) -> *mut NativeMessageQueue {
    TICKS.with(|t| t.set(t.get() + 1));
    Box::into_raw(Box::new(NativeMessageQueue {
        data_ptr: core::ptr::null_mut(),
        length: 0,
    }))
}

unsafe extern "C" fn null_tick(
    _: *mut EngineHandle,
    _: *mut c_void,
    _: f32,
    _: f32,
) -> *mut NativeMessageQueue {
    TICKS.with(|t| t.set(t.get() + 1));
    core::ptr::null_mut()
}

unsafe extern "C" fn mock_interrupt(_: *mut EngineHandle, buffer: *const u8, length: u64) {
    // SAFETY: the host passes a buffer valid for `length` bytes during the call.
    let bytes = unsafe { core::slice::from_raw_parts(buffer, length as usize) };
    INTERRUPTS.with(|i| i.borrow_mut().push(bytes.to_vec()));
}

unsafe extern "C" fn mock_dealloc(queue: *mut NativeMessageQueue) {
    // SAFETY: every queue is produced by `leak_queue` or `empty_tick`.
    let queue = unsafe { Box::from_raw(queue) };
    if !queue.data_ptr.is_null() {
        let slice = core::ptr::slice_from_raw_parts_mut(queue.data_ptr, queue.length as usize);
        // SAFETY: `data_ptr` and `length` came from a leaked boxed slice.
        drop(unsafe { Box::from_raw(slice) });
    }
    DEALLOCS.with(|d| d.set(d.get() + 1));
}

pub fn vtable() -> EngineVTable {
    EngineVTable {
        init: mock_init,
        tick: mock_tick,
        interrupt: mock_interrupt,
        dealloc_message_queue: mock_dealloc,
    }
}

pub fn null_init_vtable() -> EngineVTable {
    EngineVTable {
        init: null_init,
        ..vtable()
    }
}

pub fn null_tick_vtable() -> EngineVTable {
    EngineVTable {
        tick: null_tick,
        ..vtable()
    }
}

pub fn empty_tick_vtable() -> EngineVTable {
    EngineVTable {
        tick: empty_tick,
        ..vtable()
    }
}

pub fn ticks() -> usize {
    TICKS.with(Cell::get)
}

pub fn deallocs() -> usize {
    DEALLOCS.with(Cell::get)
}
