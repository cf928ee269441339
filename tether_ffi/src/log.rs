// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Forwarding of engine log lines into the host's sink.

use core::ffi::{CStr, c_char};
use std::sync::RwLock;

use tether_core::engine::{LogSink, log_engine_message};

// The C callback carries no user data, so the active sink lives here.
static SINK: RwLock<LogSink> = RwLock::new(log_engine_message as LogSink);

/// Routes subsequent engine log lines to `sink`.
pub(crate) fn install(sink: LogSink) {
    match SINK.write() {
        Ok(mut guard) => *guard = sink,
        Err(poisoned) => *poisoned.into_inner() = sink,
    }
}

fn current() -> LogSink {
    match SINK.read() {
        Ok(guard) => *guard,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

/// The [`CLogCallback`](crate::CLogCallback) handed to `init`.
pub(crate) unsafe extern "C" fn trampoline(message: *const c_char) {
    if message.is_null() {
        return;
    }
    // SAFETY: the engine passes a NUL-terminated string that stays valid for
    // the duration of the callback.
    let text = unsafe { CStr::from_ptr(message) }.to_string_lossy();
    current()(&text);
}
