// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render pass contract.
//!
//! The host draws text elements into its native surface through a [`Canvas`].
//! [`render`] walks the text table in paint order (ascending depth, ties
//! broken by identity chain), composes each element's clip, and hands the
//! element and its [`ClipRegion`] to the canvas.
//!
//! # Frame pseudocode
//!
//! ```rust,ignore
//! fn on_draw(ctx: DrawContext, width: f64, height: f64) {
//!     // Tick: pull and apply this frame's patches.
//!     driver.draw(ctx, width, height)?;
//!
//!     // Render: draw the mirrored scene.
//!     let stats = render(driver.tables(), &mut canvas);
//! }
//! ```

use crate::clip::{ClipComposer, ClipRegion};
use crate::element::TextElement;
use crate::tables::ElementTables;

/// Draws text elements into a host surface.
///
/// Platform views and test doubles implement this trait.
pub trait Canvas {
    /// Draws `text` under `clip`. Not called for fully clipped elements.
    fn draw_text(&mut self, text: &TextElement, clip: &ClipRegion);
}

/// Counters produced by one [`render`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Elements handed to the canvas.
    pub drawn: usize,
    /// Elements whose clip was empty.
    pub fully_clipped: usize,
    /// Clip references with no frame in the table.
    pub skipped_clips: usize,
}

/// Draws every text element of `tables` into `canvas`.
pub fn render(tables: &ElementTables, canvas: &mut dyn Canvas) -> RenderStats {
    let composer = ClipComposer::new(&tables.frames);
    let mut stats = RenderStats::default();
    for text in tables.text_in_paint_order() {
        let clip = composer.compose(&text.clip_ids);
        if !clip.skipped.is_empty() {
            tracing::trace!(id = %text.id_chain, missing = clip.skipped.len(), "clip frames missing");
            stats.skipped_clips += clip.skipped.len();
        }
        if clip.is_empty() {
            stats.fully_clipped += 1;
            continue;
        }
        canvas.draw_text(text, &clip);
        stats.drawn += 1;
    }
    stats
}
