// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Frame-loop instrumentation.
//!
//! This module provides a [`TraceSink`] trait with one method per event the
//! [`TickDriver`](crate::driver::TickDriver) emits. All method bodies default
//! to no-ops, so implementing only the events you care about is fine.
//!
//! `tether_debug` provides a pretty printer and a compact binary recorder.

use crate::apply::SkippedPatch;
use crate::interrupt::InterruptKind;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// What happened to the pending redraw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RedrawAction {
    /// A redraw was scheduled.
    Scheduled,
    /// A pending redraw was cancelled by a draw.
    Cancelled,
    /// The pending redraw fired.
    Fired,
    /// A fire arrived for a request that was no longer pending.
    Stale,
}

/// Why a tick was dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TickFailure {
    /// The outgoing queue did not decode.
    Decode,
    /// The engine reported an error.
    Engine,
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted before the engine is ticked.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickEvent {
    /// Monotonic draw counter.
    pub frame_index: u64,
    /// Host time at the start of the draw.
    pub now: HostTime,
    /// Drawable width.
    pub width: f64,
    /// Drawable height.
    pub height: f64,
}

/// Emitted after a queue has been applied to the tables.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QueueAppliedEvent {
    /// Draw this queue belongs to.
    pub frame_index: u64,
    /// Host time after application.
    pub now: HostTime,
    /// Messages in the queue.
    pub messages: usize,
    /// Messages that mutated a table.
    pub applied: usize,
    /// Messages skipped for a missing target.
    pub skipped: usize,
    /// Image loads requested.
    pub image_loads: usize,
    /// Whether the text table changed.
    pub text_changed: bool,
    /// Whether the frame table changed.
    pub frames_changed: bool,
}

/// Emitted when the pending redraw changes state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RedrawEvent {
    /// What happened.
    pub action: RedrawAction,
    /// Host time of the transition.
    pub now: HostTime,
    /// Deadline of the new request, for [`RedrawAction::Scheduled`].
    pub deadline: Option<HostTime>,
}

/// Emitted after an interrupt was delivered or dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterruptEvent {
    /// Interrupt kind.
    pub kind: InterruptKind,
    /// Host time of delivery.
    pub now: HostTime,
    /// Encoded size, zero if encoding failed.
    pub bytes: usize,
    /// Whether the engine accepted it.
    pub delivered: bool,
}

/// Emitted when a draw produced no frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickFailedEvent {
    /// Draw that failed.
    pub frame_index: u64,
    /// Host time of the failure.
    pub now: HostTime,
    /// Failure class.
    pub failure: TickFailure,
    /// Whether the surface halted.
    pub fatal: bool,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives frame-loop events.
pub trait TraceSink {
    /// Called before each engine tick.
    fn on_tick(&mut self, e: &TickEvent) {
        _ = e;
    }

    /// Called after a queue is applied.
    fn on_queue_applied(&mut self, e: &QueueAppliedEvent) {
        _ = e;
    }

    /// Called for each patch skipped during application.
    fn on_skipped_patch(&mut self, frame_index: u64, patch: &SkippedPatch) {
        _ = (frame_index, patch);
    }

    /// Called when the pending redraw changes state.
    fn on_redraw(&mut self, e: &RedrawEvent) {
        _ = e;
    }

    /// Called after an interrupt attempt.
    fn on_interrupt(&mut self, e: &InterruptEvent) {
        _ = e;
    }

    /// Called when a draw fails.
    fn on_tick_failed(&mut self, e: &TickFailedEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CountingSink {
        ticks: usize,
        redraws: usize,
    }

    impl TraceSink for CountingSink {
        fn on_tick(&mut self, _: &TickEvent) {
            self.ticks += 1;
        }

        fn on_redraw(&mut self, _: &RedrawEvent) {
            self.redraws += 1;
        }
    }

    #[test]
    fn default_methods_are_noops() {
        let mut sink = CountingSink::default();
        let dyn_sink: &mut dyn TraceSink = &mut sink;
        dyn_sink.on_tick(&TickEvent {
            frame_index: 0,
            now: HostTime(1),
            width: 10.0,
            height: 10.0,
        });
        dyn_sink.on_tick_failed(&TickFailedEvent {
            frame_index: 0,
            now: HostTime(2),
            failure: TickFailure::Decode,
            fatal: false,
        });
        assert_eq!(sink.ticks, 1);
        assert_eq!(sink.redraws, 0);
    }
}
