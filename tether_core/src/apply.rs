// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Applying one tick's message queue to the element tables.
//!
//! [`PatchApplier::apply`] walks the queue in emission order, so later
//! messages observe the effects of earlier ones. The result is a
//! [`QueueChanges`] report in the manner of a frame-changes list: which tables
//! were mutated, which patches were skipped, and which image loads the host
//! must service.
//!
//! Updates and deletes that address a missing element are tolerated: the
//! tables are left untouched and the patch is recorded in
//! [`QueueChanges::skipped`]. Entries of an unknown kind are recorded there
//! too, and the rest of the queue still applies.

use crate::element::{FrameElement, TextElement};
use crate::id::IdChain;
use crate::message::{MessageKind, MessageQueue, NativeMessage, WireMessage};
use crate::message::ImageLoadPatch;
use crate::tables::{ElementTables, TableKind};

/// Why a patch had no effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The update or delete named an element that does not exist.
    MissingTarget,
    /// The entry's kind is not one the host understands.
    UnknownKind,
}

/// A patch that was accepted but had no effect.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedPatch {
    /// Position of the message in its queue.
    pub index: usize,
    /// Kind of the message.
    pub kind: MessageKind,
    /// Target identity. Empty for entries of an unknown kind.
    pub id_chain: IdChain,
    /// Why it was skipped.
    pub reason: SkipReason,
}

/// The set of changes produced by one [`PatchApplier::apply`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueueChanges {
    /// Number of messages that mutated a table.
    pub applied: usize,
    /// Whether the text table received at least one mutation.
    pub text_changed: bool,
    /// Whether the frame table received at least one mutation.
    pub frames_changed: bool,
    /// Patches that addressed missing elements or had an unknown kind.
    pub skipped: Vec<SkippedPatch>,
    /// Image loads requested by the engine, in emission order.
    pub image_loads: Vec<ImageLoadPatch>,
}

impl QueueChanges {
    /// Clears the report for reuse.
    pub fn clear(&mut self) {
        self.applied = 0;
        self.text_changed = false;
        self.frames_changed = false;
        self.skipped.clear();
        self.image_loads.clear();
    }

    /// Returns `true` if any table changed.
    #[must_use]
    pub fn any_table_changed(&self) -> bool {
        self.text_changed || self.frames_changed
    }

    /// Returns the tables that changed, text first.
    pub fn changed_tables(&self) -> impl Iterator<Item = TableKind> {
        let text = self.text_changed.then_some(TableKind::Text);
        let frames = self.frames_changed.then_some(TableKind::Frame);
        text.into_iter().chain(frames)
    }
}

/// Observer notified after a queue has been applied.
///
/// Hosts use this to invalidate their native views; each table is signaled
/// at most once per queue, however many messages touched it.
pub trait ChangeListener {
    /// Called once for each table mutated by the queue.
    fn table_changed(&mut self, table: TableKind);
}

impl<F: FnMut(TableKind)> ChangeListener for F {
    fn table_changed(&mut self, table: TableKind) {
        self(table);
    }
}

/// Applies message queues to [`ElementTables`].
#[derive(Debug, Default)]
pub struct PatchApplier {
    changes: QueueChanges,
}

impl PatchApplier {
    /// Creates an applier.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies `queue` to `tables` in order and returns the change report.
    pub fn apply(&mut self, tables: &mut ElementTables, queue: MessageQueue) -> &QueueChanges {
        self.changes.clear();
        for (index, entry) in queue.messages.into_iter().enumerate() {
            match entry {
                WireMessage::Known(message) => {
                    apply_message(tables, index, message, &mut self.changes);
                }
                WireMessage::Unknown(key) => {
                    tracing::warn!(index, key = %key, "skipping message of unknown kind");
                    self.changes.skipped.push(SkippedPatch {
                        index,
                        kind: MessageKind::Unknown,
                        id_chain: IdChain::default(),
                        reason: SkipReason::UnknownKind,
                    });
                }
            }
        }
        &self.changes
    }

    /// Like [`apply`](Self::apply), then signals `listener` once per changed
    /// table.
    pub fn apply_and_notify(
        &mut self,
        tables: &mut ElementTables,
        queue: MessageQueue,
        listener: &mut dyn ChangeListener,
    ) -> &QueueChanges {
        self.apply(tables, queue);
        for table in self.changes.changed_tables() {
            listener.table_changed(table);
        }
        &self.changes
    }

    /// Returns the report of the most recent queue.
    #[must_use]
    pub fn last_changes(&self) -> &QueueChanges {
        &self.changes
    }

    /// Takes the pending image loads out of the last report.
    pub fn take_image_loads(&mut self) -> Vec<ImageLoadPatch> {
        core::mem::take(&mut self.changes.image_loads)
    }
}

fn apply_message(
    tables: &mut ElementTables,
    index: usize,
    message: NativeMessage,
    changes: &mut QueueChanges,
) {
    let kind = message.kind();
    let hit = match message {
        NativeMessage::TextCreate(patch) => {
            let text = TextElement::new(patch.id_chain.clone(), patch.clipping_ids);
            tables.text.insert(patch.id_chain, text);
            Ok(TableKind::Text)
        }
        NativeMessage::TextUpdate(patch) => {
            if tables.text.update(&patch.id_chain, |t| t.apply_patch(&patch)) {
                Ok(TableKind::Text)
            } else {
                Err(patch.id_chain)
            }
        }
        NativeMessage::TextDelete(patch) => match tables.text.remove(&patch.id_chain) {
            Some(_) => Ok(TableKind::Text),
            None => Err(patch.id_chain),
        },
        NativeMessage::FrameCreate(patch) => {
            if !patch.clipping_ids.is_empty() {
                tracing::debug!(id = %patch.id_chain, "ignoring clip list on frame create");
            }
            let frame = FrameElement::new(patch.id_chain.clone());
            tables.frames.insert(patch.id_chain, frame);
            Ok(TableKind::Frame)
        }
        NativeMessage::FrameUpdate(patch) => {
            if tables.frames.update(&patch.id_chain, |f| f.apply_patch(&patch)) {
                Ok(TableKind::Frame)
            } else {
                Err(patch.id_chain)
            }
        }
        NativeMessage::FrameDelete(patch) => match tables.frames.remove(&patch.id_chain) {
            Some(_) => Ok(TableKind::Frame),
            None => Err(patch.id_chain),
        },
        NativeMessage::ImageLoad(patch) => {
            changes.image_loads.push(patch);
            return;
        }
    };

    match hit {
        Ok(TableKind::Text) => {
            changes.applied += 1;
            changes.text_changed = true;
        }
        Ok(TableKind::Frame) => {
            changes.applied += 1;
            changes.frames_changed = true;
        }
        Err(id_chain) => {
            tracing::debug!(index, kind = kind.as_str(), id = %id_chain, "patch target missing");
            changes.skipped.push(SkippedPatch {
                index,
                kind,
                id_chain,
                reason: SkipReason::MissingTarget,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{AnyCreatePatch, DeletePatch, FramePatch, TextPatch};

    fn create_text(id: &[u64], clips: &[&[u64]]) -> NativeMessage {
        NativeMessage::TextCreate(AnyCreatePatch {
            id_chain: IdChain::from(id),
            clipping_ids: clips.iter().map(|c| IdChain::from(*c)).collect(),
        })
    }

    #[test]
    fn create_update_delete_leaves_no_entry() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        let changes = applier.apply(
            &mut tables,
            MessageQueue::new(vec![
                create_text(&[1], &[]),
                NativeMessage::TextUpdate(TextPatch {
                    content: Some("hi".into()),
                    ..TextPatch::new(IdChain::from([1]))
                }),
                NativeMessage::TextDelete(DeletePatch {
                    id_chain: IdChain::from([1]),
                }),
            ]),
        );

        assert_eq!(changes.applied, 3);
        assert!(changes.text_changed);
        assert!(!changes.frames_changed);
        assert!(changes.skipped.is_empty());
        assert!(tables.text.get(&IdChain::from([1])).is_none());
    }

    #[test]
    fn later_messages_observe_earlier_ones() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        applier.apply(
            &mut tables,
            MessageQueue::new(vec![
                NativeMessage::FrameCreate(AnyCreatePatch {
                    id_chain: IdChain::from([4]),
                    clipping_ids: Vec::new(),
                }),
                NativeMessage::FrameUpdate(FramePatch {
                    size_x: Some(10.0),
                    size_y: Some(20.0),
                    ..FramePatch::new(IdChain::from([4]))
                }),
            ]),
        );
        let frame = tables.frames.get(&IdChain::from([4])).unwrap();
        assert_eq!(frame.size, kurbo::Size::new(10.0, 20.0));
    }

    #[test]
    fn update_before_create_is_flagged() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        let changes = applier.apply(
            &mut tables,
            MessageQueue::new(vec![
                NativeMessage::TextUpdate(TextPatch {
                    content: Some("early".into()),
                    ..TextPatch::new(IdChain::from([7]))
                }),
                create_text(&[7], &[]),
            ]),
        );

        assert_eq!(changes.applied, 1);
        assert_eq!(
            changes.skipped,
            vec![SkippedPatch {
                index: 0,
                kind: MessageKind::TextUpdate,
                id_chain: IdChain::from([7]),
                reason: SkipReason::MissingTarget,
            }]
        );
        assert_eq!(tables.text.get(&IdChain::from([7])).unwrap().content, "");
    }

    #[test]
    fn unknown_entry_is_skipped_and_neighbours_apply() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        let mut queue = MessageQueue::new(vec![
            create_text(&[1], &[]),
            NativeMessage::FrameCreate(AnyCreatePatch {
                id_chain: IdChain::from([3]),
                clipping_ids: Vec::new(),
            }),
        ]);
        queue
            .messages
            .insert(1, WireMessage::Unknown("ScrollerCreate".into()));

        let changes = applier.apply(&mut tables, queue);

        assert_eq!(changes.applied, 2);
        assert!(changes.text_changed);
        assert!(changes.frames_changed);
        assert_eq!(
            changes.skipped,
            vec![SkippedPatch {
                index: 1,
                kind: MessageKind::Unknown,
                id_chain: IdChain::default(),
                reason: SkipReason::UnknownKind,
            }]
        );
        assert_eq!(tables.text.len(), 1);
        assert_eq!(tables.frames.len(), 1);
    }

    #[test]
    fn delete_is_idempotent() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        let delete = || {
            NativeMessage::FrameDelete(DeletePatch {
                id_chain: IdChain::from([2]),
            })
        };
        applier.apply(
            &mut tables,
            MessageQueue::new(vec![
                NativeMessage::FrameCreate(AnyCreatePatch {
                    id_chain: IdChain::from([2]),
                    clipping_ids: Vec::new(),
                }),
                delete(),
            ]),
        );
        let changes = applier.apply(&mut tables, MessageQueue::new(vec![delete()]));

        assert!(tables.frames.is_empty());
        assert_eq!(changes.applied, 0);
        assert!(!changes.frames_changed);
        assert_eq!(changes.skipped.len(), 1);
    }

    #[test]
    fn frame_create_ignores_clip_list() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        applier.apply(
            &mut tables,
            MessageQueue::new(vec![NativeMessage::FrameCreate(AnyCreatePatch {
                id_chain: IdChain::from([5]),
                clipping_ids: vec![IdChain::from([1])],
            })]),
        );
        assert!(tables.frames.contains(&IdChain::from([5])));
    }

    #[test]
    fn image_loads_are_collected_not_applied() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        let load = ImageLoadPatch {
            id_chain: IdChain::from([8]),
            path: "assets/logo.png".into(),
        };
        let changes = applier.apply(
            &mut tables,
            MessageQueue::new(vec![NativeMessage::ImageLoad(load.clone())]),
        );

        assert_eq!(changes.applied, 0);
        assert!(!changes.any_table_changed());
        assert_eq!(changes.image_loads, vec![load.clone()]);
        assert_eq!(applier.take_image_loads(), vec![load]);
        assert!(applier.last_changes().image_loads.is_empty());
    }

    #[test]
    fn listener_signaled_once_per_table() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        let mut signals = Vec::new();
        let mut listener = |table: TableKind| signals.push(table);

        applier.apply_and_notify(
            &mut tables,
            MessageQueue::new(vec![
                create_text(&[1], &[]),
                create_text(&[2], &[]),
                NativeMessage::FrameCreate(AnyCreatePatch {
                    id_chain: IdChain::from([3]),
                    clipping_ids: Vec::new(),
                }),
                create_text(&[4], &[&[3]]),
            ]),
            &mut listener,
        );

        assert_eq!(signals, vec![TableKind::Text, TableKind::Frame]);
    }

    #[test]
    fn skipped_only_queue_signals_nothing() {
        let mut tables = ElementTables::new();
        let mut applier = PatchApplier::new();
        let mut count = 0;
        let mut listener = |_: TableKind| count += 1;

        applier.apply_and_notify(
            &mut tables,
            MessageQueue::new(vec![NativeMessage::TextDelete(DeletePatch {
                id_chain: IdChain::from([1]),
            })]),
            &mut listener,
        );
        assert_eq!(count, 0);
    }
}
