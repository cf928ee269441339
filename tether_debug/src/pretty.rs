// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use tether_core::apply::{SkipReason, SkippedPatch};
use tether_core::time::HostTime;
use tether_core::trace::{
    InterruptEvent, QueueAppliedEvent, RedrawAction, RedrawEvent, TickEvent, TickFailedEvent,
    TickFailure, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns its writer.
    #[must_use]
    pub fn into_writer(self) -> W {
        self.writer
    }
}

fn us(t: HostTime) -> f64 {
    t.nanos() as f64 / 1000.0
}

fn flag(changed: bool) -> &'static str {
    if changed { "changed" } else { "-" }
}

fn action_name(action: RedrawAction) -> &'static str {
    match action {
        RedrawAction::Scheduled => "scheduled",
        RedrawAction::Cancelled => "cancelled",
        RedrawAction::Fired => "fired",
        RedrawAction::Stale => "stale",
    }
}

fn reason_name(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::MissingTarget => "missing-target",
        SkipReason::UnknownKind => "unknown-kind",
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_tick(&mut self, e: &TickEvent) {
        let _ = writeln!(
            self.writer,
            "[tick] frame={} now={:.1}µs size={}x{}",
            e.frame_index,
            us(e.now),
            e.width,
            e.height,
        );
    }

    fn on_queue_applied(&mut self, e: &QueueAppliedEvent) {
        let _ = writeln!(
            self.writer,
            "[queue] frame={} messages={} applied={} skipped={} images={} text={} frames={}",
            e.frame_index,
            e.messages,
            e.applied,
            e.skipped,
            e.image_loads,
            flag(e.text_changed),
            flag(e.frames_changed),
        );
    }

    fn on_skipped_patch(&mut self, frame_index: u64, patch: &SkippedPatch) {
        let _ = writeln!(
            self.writer,
            "[skip] frame={frame_index} #{} {} {} {}",
            patch.index,
            patch.kind.as_str(),
            patch.id_chain,
            reason_name(patch.reason),
        );
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        match e.deadline {
            Some(deadline) => {
                let _ = writeln!(
                    self.writer,
                    "[redraw] {} now={:.1}µs deadline={:.1}µs",
                    action_name(e.action),
                    us(e.now),
                    us(deadline),
                );
            }
            None => {
                let _ = writeln!(
                    self.writer,
                    "[redraw] {} now={:.1}µs",
                    action_name(e.action),
                    us(e.now),
                );
            }
        }
    }

    fn on_interrupt(&mut self, e: &InterruptEvent) {
        let status = if e.delivered { "delivered" } else { "DROPPED" };
        let _ = writeln!(
            self.writer,
            "[interrupt] {} bytes={} {status} at {:.1}µs",
            e.kind.as_str(),
            e.bytes,
            us(e.now),
        );
    }

    fn on_tick_failed(&mut self, e: &TickFailedEvent) {
        let failure = match e.failure {
            TickFailure::Decode => "decode",
            TickFailure::Engine => "engine",
        };
        let severity = if e.fatal { "FATAL" } else { "skipped" };
        let _ = writeln!(
            self.writer,
            "[tick:failed] frame={} {failure} {severity} at {:.1}µs",
            e.frame_index,
            us(e.now),
        );
    }
}
