// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records. [`decode`] reads them back as an
//! iterator of [`RecordedEvent`].
//!
//! Every record is fixed-size except skipped patches, which carry their
//! identity chain as a length-prefixed run of `u64` segments.

use tether_core::apply::{SkipReason, SkippedPatch};
use tether_core::id::IdChain;
use tether_core::interrupt::InterruptKind;
use tether_core::message::MessageKind;
use tether_core::time::HostTime;
use tether_core::trace::{
    InterruptEvent, QueueAppliedEvent, RedrawAction, RedrawEvent, TickEvent, TickFailedEvent,
    TickFailure, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_TICK: u8 = 1;
const TAG_QUEUE_APPLIED: u8 = 2;
const TAG_SKIPPED_PATCH: u8 = 3;
const TAG_REDRAW: u8 = 4;
const TAG_INTERRUPT: u8 = 5;
const TAG_TICK_FAILED: u8 = 6;

const FLAG_TEXT_CHANGED: u8 = 1 << 0;
const FLAG_FRAMES_CHANGED: u8 = 1 << 1;

const MESSAGE_KINDS: [MessageKind; 8] = [
    MessageKind::TextCreate,
    MessageKind::TextUpdate,
    MessageKind::TextDelete,
    MessageKind::FrameCreate,
    MessageKind::FrameUpdate,
    MessageKind::FrameDelete,
    MessageKind::ImageLoad,
    MessageKind::Unknown,
];

const INTERRUPT_KINDS: [InterruptKind; 4] = [
    InterruptKind::Click,
    InterruptKind::DragEnd,
    InterruptKind::Scroll,
    InterruptKind::Image,
];

const REDRAW_ACTIONS: [RedrawAction; 4] = [
    RedrawAction::Scheduled,
    RedrawAction::Cancelled,
    RedrawAction::Fired,
    RedrawAction::Stale,
];

fn index_of<T: PartialEq>(table: &[T], value: &T) -> u8 {
    table
        .iter()
        .position(|v| v == value)
        .and_then(|i| u8::try_from(i).ok())
        .unwrap_or(u8::MAX)
}

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    /// Counts saturate at `u32::MAX`.
    fn write_count(&mut self, n: usize) {
        self.write_u32(u32::try_from(n).unwrap_or(u32::MAX));
    }

    fn write_option_u64(&mut self, v: Option<u64>) {
        match v {
            Some(val) => {
                self.write_u8(1);
                self.write_u64(val);
            }
            None => {
                self.write_u8(0);
                self.write_u64(0);
            }
        }
    }
}

impl TraceSink for RecorderSink {
    fn on_tick(&mut self, e: &TickEvent) {
        self.write_u8(TAG_TICK);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.nanos());
        self.write_f64(e.width);
        self.write_f64(e.height);
    }

    fn on_queue_applied(&mut self, e: &QueueAppliedEvent) {
        self.write_u8(TAG_QUEUE_APPLIED);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.nanos());
        self.write_count(e.messages);
        self.write_count(e.applied);
        self.write_count(e.skipped);
        self.write_count(e.image_loads);
        let mut flags = 0;
        if e.text_changed {
            flags |= FLAG_TEXT_CHANGED;
        }
        if e.frames_changed {
            flags |= FLAG_FRAMES_CHANGED;
        }
        self.write_u8(flags);
    }

    fn on_skipped_patch(&mut self, frame_index: u64, patch: &SkippedPatch) {
        self.write_u8(TAG_SKIPPED_PATCH);
        self.write_u64(frame_index);
        self.write_count(patch.index);
        self.write_u8(index_of(&MESSAGE_KINDS, &patch.kind));
        self.write_u8(match patch.reason {
            SkipReason::MissingTarget => 0,
            SkipReason::UnknownKind => 1,
        });
        let segments = patch.id_chain.segments();
        self.write_count(segments.len());
        for &segment in segments {
            self.write_u64(segment);
        }
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        self.write_u8(TAG_REDRAW);
        self.write_u8(index_of(&REDRAW_ACTIONS, &e.action));
        self.write_u64(e.now.nanos());
        self.write_option_u64(e.deadline.map(HostTime::nanos));
    }

    fn on_interrupt(&mut self, e: &InterruptEvent) {
        self.write_u8(TAG_INTERRUPT);
        self.write_u8(index_of(&INTERRUPT_KINDS, &e.kind));
        self.write_u64(e.now.nanos());
        self.write_count(e.bytes);
        self.write_u8(u8::from(e.delivered));
    }

    fn on_tick_failed(&mut self, e: &TickFailedEvent) {
        self.write_u8(TAG_TICK_FAILED);
        self.write_u64(e.frame_index);
        self.write_u64(e.now.nanos());
        self.write_u8(match e.failure {
            TickFailure::Decode => 0,
            TickFailure::Engine => 1,
        });
        self.write_u8(u8::from(e.fatal));
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`TickEvent`].
    Tick(TickEvent),
    /// A [`QueueAppliedEvent`].
    QueueApplied(QueueAppliedEvent),
    /// A skipped patch and the draw it belongs to.
    SkippedPatch {
        /// Draw counter.
        frame_index: u64,
        /// The skipped patch.
        patch: SkippedPatch,
    },
    /// A [`RedrawEvent`].
    Redraw(RedrawEvent),
    /// An [`InterruptEvent`].
    Interrupt(InterruptEvent),
    /// A [`TickFailedEvent`].
    TickFailed(TickFailedEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
///
/// Iteration stops at the first truncated record or unknown tag.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_f64(&mut self) -> Option<f64> {
        self.read_u64().map(f64::from_bits)
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u32()?).ok()
    }

    fn read_bool(&mut self) -> Option<bool> {
        Some(self.read_u8()? != 0)
    }

    fn read_time(&mut self) -> Option<HostTime> {
        self.read_u64().map(HostTime)
    }

    fn read_option_u64(&mut self) -> Option<Option<u64>> {
        let present = self.read_u8()?;
        let val = self.read_u64()?;
        Some(if present != 0 { Some(val) } else { None })
    }

    fn read_from<T: Copy>(&mut self, table: &[T]) -> Option<T> {
        table.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_tick(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Tick(TickEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            width: self.read_f64()?,
            height: self.read_f64()?,
        }))
    }

    fn decode_queue_applied(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let now = self.read_time()?;
        let messages = self.read_count()?;
        let applied = self.read_count()?;
        let skipped = self.read_count()?;
        let image_loads = self.read_count()?;
        let flags = self.read_u8()?;
        Some(RecordedEvent::QueueApplied(QueueAppliedEvent {
            frame_index,
            now,
            messages,
            applied,
            skipped,
            image_loads,
            text_changed: flags & FLAG_TEXT_CHANGED != 0,
            frames_changed: flags & FLAG_FRAMES_CHANGED != 0,
        }))
    }

    fn decode_skipped_patch(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let index = self.read_count()?;
        let kind = self.read_from(&MESSAGE_KINDS)?;
        let reason = match self.read_u8()? {
            0 => SkipReason::MissingTarget,
            1 => SkipReason::UnknownKind,
            _ => return None,
        };
        let depth = self.read_count()?;
        // Reject lengths the remaining bytes cannot hold.
        if depth > (self.data.len() - self.pos) / 8 {
            return None;
        }
        let mut segments = Vec::with_capacity(depth);
        for _ in 0..depth {
            segments.push(self.read_u64()?);
        }
        Some(RecordedEvent::SkippedPatch {
            frame_index,
            patch: SkippedPatch {
                index,
                kind,
                id_chain: IdChain::from(segments),
                reason,
            },
        })
    }

    fn decode_redraw(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Redraw(RedrawEvent {
            action: self.read_from(&REDRAW_ACTIONS)?,
            now: self.read_time()?,
            deadline: self.read_option_u64()?.map(HostTime),
        }))
    }

    fn decode_interrupt(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Interrupt(InterruptEvent {
            kind: self.read_from(&INTERRUPT_KINDS)?,
            now: self.read_time()?,
            bytes: self.read_count()?,
            delivered: self.read_bool()?,
        }))
    }

    fn decode_tick_failed(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TickFailed(TickFailedEvent {
            frame_index: self.read_u64()?,
            now: self.read_time()?,
            failure: match self.read_u8()? {
                0 => TickFailure::Decode,
                _ => TickFailure::Engine,
            },
            fatal: self.read_bool()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        match tag {
            TAG_TICK => self.decode_tick(),
            TAG_QUEUE_APPLIED => self.decode_queue_applied(),
            TAG_SKIPPED_PATCH => self.decode_skipped_patch(),
            TAG_REDRAW => self.decode_redraw(),
            TAG_INTERRUPT => self.decode_interrupt(),
            TAG_TICK_FAILED => self.decode_tick_failed(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tick() -> TickEvent {
        TickEvent {
            frame_index: 7,
            now: HostTime(1_000_000),
            width: 1024.5,
            height: 768.0,
        }
    }

    fn sample_applied() -> QueueAppliedEvent {
        QueueAppliedEvent {
            frame_index: 7,
            now: HostTime(1_200_000),
            messages: 12,
            applied: 10,
            skipped: 2,
            image_loads: 1,
            text_changed: true,
            frames_changed: false,
        }
    }

    fn sample_skip() -> SkippedPatch {
        SkippedPatch {
            index: 3,
            kind: MessageKind::TextDelete,
            id_chain: IdChain::from([4, 0, 11]),
            reason: SkipReason::MissingTarget,
        }
    }

    #[test]
    fn round_trip_tick() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&sample_tick());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, vec![RecordedEvent::Tick(sample_tick())]);
    }

    #[test]
    fn round_trip_queue_applied_flags() {
        let mut rec = RecorderSink::new();
        rec.on_queue_applied(&sample_applied());
        let frames_only = QueueAppliedEvent {
            text_changed: false,
            frames_changed: true,
            ..sample_applied()
        };
        rec.on_queue_applied(&frames_only);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            vec![
                RecordedEvent::QueueApplied(sample_applied()),
                RecordedEvent::QueueApplied(frames_only),
            ]
        );
    }

    #[test]
    fn round_trip_skipped_patch() {
        let mut rec = RecorderSink::new();
        rec.on_skipped_patch(42, &sample_skip());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 1);
        match &events[0] {
            RecordedEvent::SkippedPatch { frame_index, patch } => {
                assert_eq!(*frame_index, 42);
                assert_eq!(patch, &sample_skip());
            }
            other => panic!("expected SkippedPatch, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_unknown_kind_skip() {
        let skip = SkippedPatch {
            index: 5,
            kind: MessageKind::Unknown,
            id_chain: IdChain::default(),
            reason: SkipReason::UnknownKind,
        };
        let mut rec = RecorderSink::new();
        rec.on_skipped_patch(9, &skip);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            vec![RecordedEvent::SkippedPatch {
                frame_index: 9,
                patch: skip,
            }]
        );
    }

    #[test]
    fn round_trip_redraw_and_interrupt() {
        let mut rec = RecorderSink::new();
        let scheduled = RedrawEvent {
            action: RedrawAction::Scheduled,
            now: HostTime(10),
            deadline: Some(HostTime(14_285_724)),
        };
        let cancelled = RedrawEvent {
            action: RedrawAction::Cancelled,
            now: HostTime(20),
            deadline: None,
        };
        let interrupt = InterruptEvent {
            kind: InterruptKind::Scroll,
            now: HostTime(30),
            bytes: 57,
            delivered: false,
        };
        rec.on_redraw(&scheduled);
        rec.on_redraw(&cancelled);
        rec.on_interrupt(&interrupt);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(
            events,
            vec![
                RecordedEvent::Redraw(scheduled),
                RecordedEvent::Redraw(cancelled),
                RecordedEvent::Interrupt(interrupt),
            ]
        );
    }

    #[test]
    fn round_trip_tick_failed() {
        let mut rec = RecorderSink::new();
        let failed = TickFailedEvent {
            frame_index: 3,
            now: HostTime(99),
            failure: TickFailure::Decode,
            fatal: false,
        };
        rec.on_tick_failed(&failed);

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events, vec![RecordedEvent::TickFailed(failed)]);
    }

    #[test]
    fn round_trip_multiple_events() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&sample_tick());
        rec.on_skipped_patch(7, &sample_skip());
        rec.on_queue_applied(&sample_applied());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], RecordedEvent::Tick(_)));
        assert!(matches!(events[1], RecordedEvent::SkippedPatch { .. }));
        assert!(matches!(events[2], RecordedEvent::QueueApplied(_)));
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }

    #[test]
    fn truncated_record_stops_iteration() {
        let mut rec = RecorderSink::new();
        rec.on_tick(&sample_tick());
        rec.on_tick(&sample_tick());
        let bytes = rec.into_bytes();

        let events: Vec<_> = decode(&bytes[..bytes.len() - 1]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn oversized_chain_length_is_rejected() {
        let mut bytes = vec![TAG_SKIPPED_PATCH];
        bytes.extend_from_slice(&0_u64.to_le_bytes());
        bytes.extend_from_slice(&0_u32.to_le_bytes());
        bytes.extend_from_slice(&[0, 0]);
        bytes.extend_from_slice(&u32::MAX.to_le_bytes());
        assert_eq!(decode(&bytes).count(), 0);
    }
}
