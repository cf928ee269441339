// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side element records.
//!
//! Two kinds of element mirror engine scene nodes:
//!
//! - [`TextElement`] — native text with content, geometry, style, and an
//!   ordered list of clip references.
//! - [`FrameElement`] — a content-free rectangle that other elements clip
//!   against, referenced by [`IdChain`].
//!
//! Records are created with engine defaults by a create patch and refined by
//! update patches that name only the fields that changed
//! ([`TextElement::apply_patch`], [`FrameElement::apply_patch`]).

use kurbo::{Affine, Rect, Size};
use serde::{Deserialize, Serialize};

use crate::id::IdChain;
use crate::message::{FramePatch, TextPatch};

/// Font size applied to text before the engine sends one.
pub const DEFAULT_FONT_SIZE: f64 = 12.0;

/// Font family applied to text before the engine sends one. Hosts map this
/// to their platform UI font.
pub const DEFAULT_FONT_FAMILY: &str = "system";

/// A straight-alpha RGBA color with components in `0.0..=1.0`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: f64,
    /// Green.
    pub g: f64,
    /// Blue.
    pub b: f64,
    /// Alpha.
    pub a: f64,
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgba(0.0, 0.0, 0.0, 1.0);

    /// Creates a color from its components.
    #[must_use]
    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

/// A font reference, resolved against the host's font registry.
///
/// The registry is populated by the host before the first tick; this type
/// only names an entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FontRef {
    /// Registered family name.
    pub family: String,
    /// CSS-style weight (100–900), if the engine specifies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<u16>,
    /// Whether the italic face is requested.
    #[serde(default)]
    pub italic: bool,
}

impl Default for FontRef {
    fn default() -> Self {
        Self {
            family: DEFAULT_FONT_FAMILY.into(),
            weight: None,
            italic: false,
        }
    }
}

/// Horizontal alignment of text inside its box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TextAlign {
    /// Flush with the leading edge.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush with the trailing edge.
    Right,
    /// Stretched to both edges.
    Justify,
}

/// Vertical alignment of text inside its box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerticalAlign {
    /// Top edge.
    #[default]
    Top,
    /// Centered.
    Center,
    /// Bottom edge.
    Bottom,
}

/// Overrides applied to inline links inside rich text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkStyle {
    /// Link color; falls back to the text fill when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    /// Whether links are underlined.
    #[serde(default)]
    pub underline: bool,
}

/// Style attributes of a [`TextElement`].
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Glyph fill color.
    pub fill: Color,
    /// Font registry entry.
    pub font: FontRef,
    /// Font size in surface units.
    pub font_size: f64,
    /// Horizontal alignment.
    pub align: TextAlign,
    /// Vertical alignment.
    pub vertical_align: VerticalAlign,
    /// Link-style override, if any.
    pub link_style: Option<LinkStyle>,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            fill: Color::BLACK,
            font: FontRef::default(),
            font_size: DEFAULT_FONT_SIZE,
            align: TextAlign::Left,
            vertical_align: VerticalAlign::Top,
            link_style: None,
        }
    }
}

/// A native text element.
#[derive(Clone, Debug, PartialEq)]
pub struct TextElement {
    /// Identity of the engine node this element mirrors.
    pub id_chain: IdChain,
    /// Rich-text content (inline emphasis and links as markup).
    pub content: String,
    /// Box size in local units.
    pub size: Size,
    /// Local-to-surface transform.
    pub transform: Affine,
    /// Frames this element is clipped by, outermost first.
    pub clip_ids: Vec<IdChain>,
    /// Style attributes.
    pub style: TextStyle,
    /// Paint order; higher values draw later.
    pub depth: u32,
}

impl TextElement {
    /// Creates an element with engine defaults: empty content, zero size,
    /// identity transform, default style.
    #[must_use]
    pub fn new(id_chain: IdChain, clip_ids: Vec<IdChain>) -> Self {
        Self {
            id_chain,
            content: String::new(),
            size: Size::ZERO,
            transform: Affine::IDENTITY,
            clip_ids,
            style: TextStyle::default(),
            depth: 0,
        }
    }

    /// Applies the fields present in `patch`; absent fields are untouched.
    pub fn apply_patch(&mut self, patch: &TextPatch) {
        if let Some(content) = &patch.content {
            self.content.clone_from(content);
        }
        if let Some(width) = patch.size_x {
            self.size.width = width;
        }
        if let Some(height) = patch.size_y {
            self.size.height = height;
        }
        if let Some(coeffs) = patch.transform {
            self.transform = Affine::new(coeffs);
        }
        if let Some(depth) = patch.depth {
            self.depth = depth;
        }
        if let Some(fill) = patch.fill {
            self.style.fill = fill;
        }
        if let Some(font) = &patch.font {
            self.style.font.clone_from(font);
        }
        if let Some(font_size) = patch.font_size {
            self.style.font_size = font_size;
        }
        if let Some(align) = patch.align {
            self.style.align = align;
        }
        if let Some(vertical_align) = patch.vertical_align {
            self.style.vertical_align = vertical_align;
        }
        if let Some(link_style) = patch.link_style {
            self.style.link_style = Some(link_style);
        }
    }

    /// Returns the element's box in local coordinates.
    #[must_use]
    pub fn local_bounds(&self) -> Rect {
        self.size.to_rect()
    }
}

/// A clip/container rectangle.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameElement {
    /// Identity of the engine node this element mirrors.
    pub id_chain: IdChain,
    /// Rectangle size in local units.
    pub size: Size,
    /// Local-to-surface transform.
    pub transform: Affine,
    /// Paint order reported by the engine.
    pub depth: u32,
}

impl FrameElement {
    /// Creates a frame with engine defaults: zero size, identity transform.
    #[must_use]
    pub fn new(id_chain: IdChain) -> Self {
        Self {
            id_chain,
            size: Size::ZERO,
            transform: Affine::IDENTITY,
            depth: 0,
        }
    }

    /// Applies the fields present in `patch`; absent fields are untouched.
    pub fn apply_patch(&mut self, patch: &FramePatch) {
        if let Some(width) = patch.size_x {
            self.size.width = width;
        }
        if let Some(height) = patch.size_y {
            self.size.height = height;
        }
        if let Some(coeffs) = patch.transform {
            self.transform = Affine::new(coeffs);
        }
        if let Some(depth) = patch.depth {
            self.depth = depth;
        }
    }

    /// Returns the clip rectangle in local coordinates.
    #[must_use]
    pub fn local_bounds(&self) -> Rect {
        self.size.to_rect()
    }
}
