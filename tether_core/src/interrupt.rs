// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host → engine interrupts.
//!
//! An interrupt is one discrete host event delivered outside the tick
//! cadence. [`Interrupt`] is the host-facing form; [`NativeInterrupt`] is the
//! wire form, a one-key map among `Click`, `DragEnd`, `Scroll`, and
//! `Image.Reference`.
//!
//! # Image payloads
//!
//! Pixels are not copied into the encoded buffer. `Image.Reference` carries
//! the address and length of the host's pixel buffer, and the engine copies
//! the bytes out during the synchronous interrupt call. [`ImagePayload`]
//! borrows the buffer, and [`InterruptSender::send`] borrows the payload for
//! the whole call, so the buffer provably outlives the engine's read.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::codec::Codec;
use crate::engine::Engine;
use crate::error::InterruptError;
use crate::id::IdChain;

/// Bytes per pixel of the RGBA8 buffers carried by image payloads.
pub const BYTES_PER_PIXEL: usize = 4;

bitflags! {
    /// Modifier keys held during a pointer event.
    #[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        const SHIFT   = 0b0001;
        const CONTROL = 0b0010;
        const ALT     = 0b0100;
        const COMMAND = 0b1000;
    }
}

/// One modifier key, as encoded on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    /// Shift.
    Shift,
    /// Control.
    Control,
    /// Alt / Option.
    Alt,
    /// Command / Super / Windows.
    Command,
}

impl ModifierKey {
    const ALL: [Self; 4] = [Self::Shift, Self::Control, Self::Alt, Self::Command];

    const fn flag(self) -> Modifiers {
        match self {
            Self::Shift => Modifiers::SHIFT,
            Self::Control => Modifiers::CONTROL,
            Self::Alt => Modifiers::ALT,
            Self::Command => Modifiers::COMMAND,
        }
    }
}

impl Modifiers {
    /// Returns the held keys in canonical order.
    #[must_use]
    pub fn to_keys(self) -> Vec<ModifierKey> {
        ModifierKey::ALL
            .into_iter()
            .filter(|key| self.contains(key.flag()))
            .collect()
    }

    /// Builds a set from wire keys; duplicates collapse.
    #[must_use]
    pub fn from_keys(keys: &[ModifierKey]) -> Self {
        keys.iter()
            .fold(Self::empty(), |acc, key| acc | key.flag())
    }
}

/// Pointer button.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    /// Primary button.
    #[default]
    Left,
    /// Secondary button.
    Right,
    /// Middle button / wheel press.
    Middle,
    /// Any other button, by platform index.
    Other(u8),
}

/// Pixels decoded by the host for an engine node.
///
/// The buffer is RGBA8, row-major, `width * height * 4` bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImagePayload<'a> {
    id_chain: &'a IdChain,
    pixels: &'a [u8],
    width: u32,
    height: u32,
}

impl<'a> ImagePayload<'a> {
    /// Creates a payload, checking the buffer length against the dimensions.
    pub fn new(
        id_chain: &'a IdChain,
        pixels: &'a [u8],
        width: u32,
        height: u32,
    ) -> Result<Self, InterruptError> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(BYTES_PER_PIXEL));
        match expected {
            Some(expected) if expected == pixels.len() => Ok(Self {
                id_chain,
                pixels,
                width,
                height,
            }),
            _ => Err(InterruptError::PixelBufferSize {
                width,
                height,
                actual: pixels.len(),
            }),
        }
    }

    /// Node the pixels belong to.
    #[must_use]
    pub fn id_chain(&self) -> &'a IdChain {
        self.id_chain
    }

    /// The RGBA8 bytes.
    #[must_use]
    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    /// Width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }
}

/// A host event bound for the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Interrupt<'a> {
    /// Pointer click.
    Click {
        /// Surface x.
        x: f64,
        /// Surface y.
        y: f64,
        /// Button pressed.
        button: MouseButton,
        /// Modifiers held.
        modifiers: Modifiers,
    },
    /// A drag gesture ended.
    DragEnd {
        /// Surface x where the drag ended.
        x: f64,
        /// Surface y where the drag ended.
        y: f64,
    },
    /// Scroll wheel or trackpad scroll.
    Scroll {
        /// Surface x of the pointer.
        x: f64,
        /// Surface y of the pointer.
        y: f64,
        /// Horizontal delta.
        delta_x: f64,
        /// Vertical delta.
        delta_y: f64,
    },
    /// Decoded image pixels.
    Image(ImagePayload<'a>),
}

impl Interrupt<'_> {
    /// Returns the fieldless kind, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> InterruptKind {
        match self {
            Self::Click { .. } => InterruptKind::Click,
            Self::DragEnd { .. } => InterruptKind::DragEnd,
            Self::Scroll { .. } => InterruptKind::Scroll,
            Self::Image(_) => InterruptKind::Image,
        }
    }

    /// Converts to the wire form.
    ///
    /// For images, the wire form records the buffer's address; it is only
    /// meaningful while the borrowed buffer is alive.
    #[must_use]
    pub fn to_wire(&self) -> NativeInterrupt {
        match *self {
            Self::Click {
                x,
                y,
                button,
                modifiers,
            } => NativeInterrupt::Click(ClickArgs {
                x,
                y,
                button,
                modifiers: modifiers.to_keys(),
            }),
            Self::DragEnd { x, y } => NativeInterrupt::DragEnd(DragEndArgs { x, y }),
            Self::Scroll {
                x,
                y,
                delta_x,
                delta_y,
            } => NativeInterrupt::Scroll(ScrollArgs {
                x,
                y,
                delta_x,
                delta_y,
            }),
            Self::Image(payload) => {
                NativeInterrupt::Image(ImageInterrupt::Reference(ImageReferenceArgs {
                    id_chain: payload.id_chain.clone(),
                    image_data: payload.pixels.as_ptr().expose_provenance() as u64,
                    image_data_length: payload.pixels.len() as u64,
                    width: payload.width,
                    height: payload.height,
                }))
            }
        }
    }
}

/// Fieldless mirror of [`Interrupt`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum InterruptKind {
    /// [`Interrupt::Click`].
    Click,
    /// [`Interrupt::DragEnd`].
    DragEnd,
    /// [`Interrupt::Scroll`].
    Scroll,
    /// [`Interrupt::Image`].
    Image,
}

impl InterruptKind {
    /// Returns the wire key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "Click",
            Self::DragEnd => "DragEnd",
            Self::Scroll => "Scroll",
            Self::Image => "Image.Reference",
        }
    }
}

/// Wire form of an interrupt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum NativeInterrupt {
    /// Pointer click.
    Click(ClickArgs),
    /// Drag completion.
    DragEnd(DragEndArgs),
    /// Scroll.
    Scroll(ScrollArgs),
    /// Image payload.
    Image(ImageInterrupt),
}

/// Wire arguments of a click.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClickArgs {
    /// Surface x.
    pub x: f64,
    /// Surface y.
    pub y: f64,
    /// Button pressed.
    pub button: MouseButton,
    /// Modifiers held, in canonical order.
    #[serde(default)]
    pub modifiers: Vec<ModifierKey>,
}

/// Wire arguments of a drag completion.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DragEndArgs {
    /// Surface x.
    pub x: f64,
    /// Surface y.
    pub y: f64,
}

/// Wire arguments of a scroll.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollArgs {
    /// Surface x.
    pub x: f64,
    /// Surface y.
    pub y: f64,
    /// Horizontal delta.
    pub delta_x: f64,
    /// Vertical delta.
    pub delta_y: f64,
}

/// Image interrupt variants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ImageInterrupt {
    /// Pixels passed by reference to host memory.
    Reference(ImageReferenceArgs),
}

/// Wire arguments of an image passed by reference.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReferenceArgs {
    /// Node the pixels belong to.
    pub id_chain: IdChain,
    /// Address of the first pixel byte.
    pub image_data: u64,
    /// Buffer length in bytes.
    pub image_data_length: u64,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// Encodes interrupts and delivers them to the engine.
#[derive(Debug, Clone)]
pub struct InterruptSender {
    codec: Codec,
    sent: u64,
}

impl InterruptSender {
    /// Creates a sender using `codec`.
    #[must_use]
    pub fn new(codec: Codec) -> Self {
        Self { codec, sent: 0 }
    }

    /// Encodes `interrupt` and delivers it synchronously.
    ///
    /// Returns the number of bytes handed to the engine.
    pub fn send<E: Engine>(
        &mut self,
        engine: &mut E,
        interrupt: &Interrupt<'_>,
    ) -> Result<usize, InterruptError> {
        let buffer = self.codec.encode_interrupt(&interrupt.to_wire())?;
        engine.interrupt(&buffer)?;
        self.sent += 1;
        tracing::trace!(
            kind = interrupt.kind().as_str(),
            bytes = buffer.len(),
            "interrupt delivered"
        );
        Ok(buffer.len())
    }

    /// Number of interrupts delivered so far.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DrawContext, EngineError, OwnedQueue};

    #[derive(Default)]
    struct CapturingEngine {
        received: Vec<Vec<u8>>,
    }

    impl Engine for CapturingEngine {
        type Queue = OwnedQueue;

        fn tick(&mut self, _: DrawContext, _: f64, _: f64) -> Result<OwnedQueue, EngineError> {
            Ok(OwnedQueue::default())
        }

        fn release(&mut self, _queue: OwnedQueue) {}

        fn interrupt(&mut self, buffer: &[u8]) -> Result<(), EngineError> {
            self.received.push(buffer.to_vec());
            Ok(())
        }
    }

    #[test]
    fn modifiers_round_trip_through_keys() {
        let mods = Modifiers::SHIFT | Modifiers::COMMAND;
        assert_eq!(mods.to_keys(), vec![ModifierKey::Shift, ModifierKey::Command]);
        assert_eq!(Modifiers::from_keys(&mods.to_keys()), mods);
        assert_eq!(
            Modifiers::from_keys(&[ModifierKey::Alt, ModifierKey::Alt]),
            Modifiers::ALT
        );
    }

    #[test]
    fn click_wire_shape() {
        let click = Interrupt::Click {
            x: 10.5,
            y: 20.25,
            button: MouseButton::Right,
            modifiers: Modifiers::CONTROL,
        };
        let json = serde_json::to_value(click.to_wire()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "Click": { "x": 10.5, "y": 20.25, "button": "Right", "modifiers": ["Control"] }
            })
        );
    }

    #[test]
    fn image_wire_shape_is_nested_reference() {
        let id = IdChain::from([5, 1]);
        let pixels = [0_u8; 8];
        let payload = ImagePayload::new(&id, &pixels, 2, 1).unwrap();
        let json = serde_json::to_value(Interrupt::Image(payload).to_wire()).unwrap();
        let args = &json["Image"]["Reference"];
        assert_eq!(args["id_chain"], serde_json::json!([5, 1]));
        assert_eq!(args["image_data_length"], 8);
        assert_eq!(args["width"], 2);
        assert_eq!(args["height"], 1);
        assert_eq!(args["image_data"], pixels.as_ptr().addr() as u64);
    }

    #[test]
    fn payload_rejects_mismatched_buffer() {
        let id = IdChain::from([1]);
        let pixels = [0_u8; 15];
        let err = ImagePayload::new(&id, &pixels, 2, 2).unwrap_err();
        assert_eq!(
            err,
            InterruptError::PixelBufferSize {
                width: 2,
                height: 2,
                actual: 15
            }
        );
    }

    #[test]
    fn sender_delivers_decodable_buffers() {
        let mut engine = CapturingEngine::default();
        let mut sender = InterruptSender::new(Codec::FlexBuffers);

        let scroll = Interrupt::Scroll {
            x: 1.0,
            y: 2.0,
            delta_x: -0.125,
            delta_y: 42.0,
        };
        sender.send(&mut engine, &scroll).unwrap();

        assert_eq!(sender.sent_count(), 1);
        let decoded = Codec::FlexBuffers
            .decode_interrupt(&engine.received[0])
            .unwrap();
        assert_eq!(decoded, scroll.to_wire());
    }
}
