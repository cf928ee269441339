// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Outgoing message protocol (engine → host).
//!
//! Each tick the engine hands the host one [`MessageQueue`]: a map with a
//! `"messages"` vector whose entries are one-key maps naming the message kind.
//! [`NativeMessage`] is the closed set of kinds the host understands.
//!
//! Queue entries decode through [`WireMessage`], which reads the key first.
//! A key outside the known set becomes [`WireMessage::Unknown`] and its
//! payload is skipped, so one entry from a newer engine does not cost the
//! rest of the queue. The applier reports such entries as skipped patches.
//!
//! Update patches carry every field as an `Option`. Absent fields are left
//! out of the encoded map and decode back to `None`, meaning "unchanged".

use core::fmt;

use serde::de::{self, IgnoredAny, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::element::{Color, FontRef, LinkStyle, TextAlign, VerticalAlign};
use crate::id::IdChain;

/// One tick's worth of outgoing messages, in emission order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageQueue {
    /// Messages to apply in order.
    pub messages: Vec<WireMessage>,
}

impl MessageQueue {
    /// Creates a queue from messages in emission order.
    #[must_use]
    pub fn new(messages: Vec<NativeMessage>) -> Self {
        Self {
            messages: messages.into_iter().map(WireMessage::Known).collect(),
        }
    }

    /// Returns `true` if the queue holds no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns the number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }
}

/// One queue entry as it appeared on the wire.
#[derive(Clone, Debug, PartialEq)]
pub enum WireMessage {
    /// A message of a kind the host understands.
    Known(NativeMessage),
    /// An entry whose key names no known kind. Holds the key.
    Unknown(String),
}

impl WireMessage {
    /// Returns the kind of this entry.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::Known(message) => message.kind(),
            Self::Unknown(_) => MessageKind::Unknown,
        }
    }
}

impl From<NativeMessage> for WireMessage {
    fn from(message: NativeMessage) -> Self {
        Self::Known(message)
    }
}

impl Serialize for WireMessage {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(message) => message.serialize(serializer),
            Self::Unknown(key) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(key, &())?;
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for WireMessage {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(WireMessageVisitor)
    }
}

struct WireMessageVisitor;

impl<'de> Visitor<'de> for WireMessageVisitor {
    type Value = WireMessage;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a one-key map naming a message kind")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::invalid_length(0, &self));
        };
        let message = match key.as_str() {
            "TextCreate" => WireMessage::Known(NativeMessage::TextCreate(map.next_value()?)),
            "TextUpdate" => WireMessage::Known(NativeMessage::TextUpdate(map.next_value()?)),
            "TextDelete" => WireMessage::Known(NativeMessage::TextDelete(map.next_value()?)),
            "FrameCreate" => WireMessage::Known(NativeMessage::FrameCreate(map.next_value()?)),
            "FrameUpdate" => WireMessage::Known(NativeMessage::FrameUpdate(map.next_value()?)),
            "FrameDelete" => WireMessage::Known(NativeMessage::FrameDelete(map.next_value()?)),
            "ImageLoad" => WireMessage::Known(NativeMessage::ImageLoad(map.next_value()?)),
            _ => {
                map.next_value::<IgnoredAny>()?;
                WireMessage::Unknown(key)
            }
        };
        if map.next_key::<IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(2, &self));
        }
        Ok(message)
    }
}

/// A single engine-to-host message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NativeMessage {
    /// Create a text element.
    TextCreate(AnyCreatePatch),
    /// Update fields of a text element.
    TextUpdate(TextPatch),
    /// Remove a text element.
    TextDelete(DeletePatch),
    /// Create a frame element. Any clip list on the wire is ignored.
    FrameCreate(AnyCreatePatch),
    /// Update fields of a frame element.
    FrameUpdate(FramePatch),
    /// Remove a frame element.
    FrameDelete(DeletePatch),
    /// Ask the host to resolve an image and reply with an image interrupt.
    ImageLoad(ImageLoadPatch),
}

impl NativeMessage {
    /// Returns the kind tag used on the wire.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            Self::TextCreate(_) => MessageKind::TextCreate,
            Self::TextUpdate(_) => MessageKind::TextUpdate,
            Self::TextDelete(_) => MessageKind::TextDelete,
            Self::FrameCreate(_) => MessageKind::FrameCreate,
            Self::FrameUpdate(_) => MessageKind::FrameUpdate,
            Self::FrameDelete(_) => MessageKind::FrameDelete,
            Self::ImageLoad(_) => MessageKind::ImageLoad,
        }
    }

    /// Returns the identity chain this message targets.
    #[must_use]
    pub fn id_chain(&self) -> &IdChain {
        match self {
            Self::TextCreate(p) | Self::FrameCreate(p) => &p.id_chain,
            Self::TextUpdate(p) => &p.id_chain,
            Self::FrameUpdate(p) => &p.id_chain,
            Self::TextDelete(p) | Self::FrameDelete(p) => &p.id_chain,
            Self::ImageLoad(p) => &p.id_chain,
        }
    }
}

/// Fieldless mirror of [`NativeMessage`] for diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// [`NativeMessage::TextCreate`].
    TextCreate,
    /// [`NativeMessage::TextUpdate`].
    TextUpdate,
    /// [`NativeMessage::TextDelete`].
    TextDelete,
    /// [`NativeMessage::FrameCreate`].
    FrameCreate,
    /// [`NativeMessage::FrameUpdate`].
    FrameUpdate,
    /// [`NativeMessage::FrameDelete`].
    FrameDelete,
    /// [`NativeMessage::ImageLoad`].
    ImageLoad,
    /// [`WireMessage::Unknown`].
    Unknown,
}

impl MessageKind {
    /// Returns the wire key for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TextCreate => "TextCreate",
            Self::TextUpdate => "TextUpdate",
            Self::TextDelete => "TextDelete",
            Self::FrameCreate => "FrameCreate",
            Self::FrameUpdate => "FrameUpdate",
            Self::FrameDelete => "FrameDelete",
            Self::ImageLoad => "ImageLoad",
            Self::Unknown => "Unknown",
        }
    }
}

/// Payload of a create message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnyCreatePatch {
    /// Identity of the new element.
    pub id_chain: IdChain,
    /// Clip frames, outermost first. Empty for frames.
    #[serde(default)]
    pub clipping_ids: Vec<IdChain>,
}

/// Payload of a delete message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePatch {
    /// Identity of the element to remove.
    pub id_chain: IdChain,
}

/// Partial update of a text element.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TextPatch {
    /// Target element.
    pub id_chain: IdChain,
    /// New content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    /// New width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_x: Option<f64>,
    /// New height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_y: Option<f64>,
    /// New affine transform as `[a, b, c, d, tx, ty]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<[f64; 6]>,
    /// New paint order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
    /// New fill color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Color>,
    /// New font reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<FontRef>,
    /// New font size.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,
    /// New horizontal alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<TextAlign>,
    /// New vertical alignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical_align: Option<VerticalAlign>,
    /// New link-style override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_style: Option<LinkStyle>,
}

impl TextPatch {
    /// Creates a patch for `id_chain` with no fields set.
    #[must_use]
    pub fn new(id_chain: IdChain) -> Self {
        Self {
            id_chain,
            ..Self::default()
        }
    }
}

/// Partial update of a frame element.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FramePatch {
    /// Target element.
    pub id_chain: IdChain,
    /// New width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_x: Option<f64>,
    /// New height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_y: Option<f64>,
    /// New affine transform as `[a, b, c, d, tx, ty]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<[f64; 6]>,
    /// New paint order.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u32>,
}

impl FramePatch {
    /// Creates a patch for `id_chain` with no fields set.
    #[must_use]
    pub fn new(id_chain: IdChain) -> Self {
        Self {
            id_chain,
            ..Self::default()
        }
    }
}

/// Request to resolve an image file for an engine node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageLoadPatch {
    /// Node that will receive the decoded pixels.
    pub id_chain: IdChain,
    /// Already-resolved file path.
    pub path: String,
}
