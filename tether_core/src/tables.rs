// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Keyed element storage.
//!
//! [`ElementTables`] holds the host-side mirror of the engine scene: one
//! [`ElementTable`] of [`TextElement`]s and one of [`FrameElement`]s, both
//! keyed structurally by [`IdChain`]. The tables are owned by the surface and
//! written only by the [`PatchApplier`](crate::apply::PatchApplier); readers
//! (the render pass, the clip composer) take shared references.

use hashbrown::HashMap;

use crate::element::{FrameElement, TextElement};
use crate::id::IdChain;

/// Which table an operation touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TableKind {
    /// The text table.
    Text,
    /// The frame table.
    Frame,
}

/// A map from identity chain to element record.
#[derive(Clone, Debug)]
pub struct ElementTable<T> {
    entries: HashMap<IdChain, T>,
}

impl<T> Default for ElementTable<T> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<T> ElementTable<T> {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `value`, returning the record it replaced.
    pub fn insert(&mut self, id: IdChain, value: T) -> Option<T> {
        self.entries.insert(id, value)
    }

    /// Runs `f` on the record for `id`. Returns `false` if there is none.
    pub fn update(&mut self, id: &IdChain, f: impl FnOnce(&mut T)) -> bool {
        match self.entries.get_mut(id) {
            Some(value) => {
                f(value);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the record for `id`.
    pub fn remove(&mut self, id: &IdChain) -> Option<T> {
        self.entries.remove(id)
    }

    /// Returns the record for `id`.
    #[must_use]
    pub fn get(&self, id: &IdChain) -> Option<&T> {
        self.entries.get(id)
    }

    /// Returns `true` if `id` has a record.
    #[must_use]
    pub fn contains(&self, id: &IdChain) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over records in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&IdChain, &T)> {
        self.entries.iter()
    }

    /// Removes every record.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Text and frame tables of one surface.
#[derive(Clone, Debug, Default)]
pub struct ElementTables {
    /// Text elements.
    pub text: ElementTable<TextElement>,
    /// Frame (clip) elements.
    pub frames: ElementTable<FrameElement>,
}

impl ElementTables {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len() + self.frames.len()
    }

    /// Returns `true` if both tables are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.frames.is_empty()
    }

    /// Returns the text elements in paint order: ascending depth, ties
    /// broken by identity chain.
    #[must_use]
    pub fn text_in_paint_order(&self) -> Vec<&TextElement> {
        let mut out: Vec<&TextElement> = self.text.iter().map(|(_, t)| t).collect();
        out.sort_by(|a, b| a.depth.cmp(&b.depth).then_with(|| a.id_chain.cmp(&b.id_chain)));
        out
    }

    /// Returns text elements that list `frame` as a clip.
    pub fn clipped_by<'a>(&'a self, frame: &'a IdChain) -> impl Iterator<Item = &'a TextElement> {
        self.text
            .iter()
            .map(|(_, t)| t)
            .filter(move |t| t.clip_ids.contains(frame))
    }
}
