// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each draw becomes a `B`/`E` span on the tick track, opened by its tick and
//! closed by the applied queue or the failure that ended it. Everything else
//! is an instant event.
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use tether_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

const TID_TICK: u32 = 0;
const TID_REDRAW: u32 = 1;
const TID_INTERRUPT: u32 = 2;

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Skipped patches carry no timestamp; they inherit the open span's.
    let mut last_ts = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::Tick(e) => {
                last_ts = to_us(e.now);
                events.push(json!({
                    "ph": "B",
                    "name": "Frame",
                    "cat": "Tick",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_TICK,
                    "args": {
                        "frame_index": e.frame_index,
                        "width": e.width,
                        "height": e.height,
                    }
                }));
            }
            RecordedEvent::QueueApplied(e) => {
                last_ts = to_us(e.now);
                events.push(json!({
                    "ph": "E",
                    "name": "Frame",
                    "cat": "Tick",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_TICK,
                    "args": {
                        "frame_index": e.frame_index,
                        "messages": e.messages,
                        "applied": e.applied,
                        "skipped": e.skipped,
                        "image_loads": e.image_loads,
                        "text_changed": e.text_changed,
                        "frames_changed": e.frames_changed,
                    }
                }));
            }
            RecordedEvent::SkippedPatch { frame_index, patch } => {
                events.push(json!({
                    "ph": "i",
                    "name": "SkippedPatch",
                    "cat": "Apply",
                    "ts": last_ts,
                    "pid": 0,
                    "tid": TID_TICK,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "index": patch.index,
                        "kind": patch.kind.as_str(),
                        "id_chain": patch.id_chain.to_string(),
                    }
                }));
            }
            RecordedEvent::Redraw(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("Redraw{:?}", e.action),
                    "cat": "Pacing",
                    "ts": to_us(e.now),
                    "pid": 0,
                    "tid": TID_REDRAW,
                    "s": "t",
                    "args": {
                        "deadline_us": e.deadline.map(to_us),
                    }
                }));
            }
            RecordedEvent::Interrupt(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": e.kind.as_str(),
                    "cat": "Interrupt",
                    "ts": to_us(e.now),
                    "pid": 0,
                    "tid": TID_INTERRUPT,
                    "s": "t",
                    "args": {
                        "bytes": e.bytes,
                        "delivered": e.delivered,
                    }
                }));
            }
            RecordedEvent::TickFailed(e) => {
                events.push(json!({
                    "ph": "E",
                    "name": "Frame",
                    "cat": "Tick",
                    "ts": to_us(e.now),
                    "pid": 0,
                    "tid": TID_TICK,
                    "args": {
                        "frame_index": e.frame_index,
                        "failure": format!("{:?}", e.failure),
                        "fatal": e.fatal,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn to_us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}
