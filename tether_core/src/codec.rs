// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Self-describing message encoding.
//!
//! The engine speaks FlexBuffers: schemaless binary maps and vectors. Both
//! directions of the protocol go through [`Codec`]:
//!
//! - engine → host: [`Codec::decode_queue`] turns a tick's buffer into a
//!   [`MessageQueue`].
//! - host → engine: [`Codec::encode_interrupt`] turns a
//!   [`NativeInterrupt`] into the buffer handed to the interrupt entry point.
//!
//! [`Codec::Json`] carries the same data model as text and exists for
//! recording and debugging engines that are built with a JSON bridge.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interrupt::NativeInterrupt;
use crate::message::MessageQueue;

/// Wire codec.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Codec {
    /// FlexBuffers binary encoding (the engine's native format).
    #[default]
    FlexBuffers,
    /// JSON encoding (human-readable).
    Json,
}

impl Codec {
    /// Encodes a value.
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        match self {
            Self::FlexBuffers => {
                flexbuffers::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
            }
            Self::Json => serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string())),
        }
    }

    /// Decodes a value.
    pub fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, CodecError> {
        if data.is_empty() {
            return Err(CodecError::Empty);
        }
        match self {
            Self::FlexBuffers => {
                flexbuffers::from_slice(data).map_err(|e| CodecError::Decode(e.to_string()))
            }
            Self::Json => serde_json::from_slice(data).map_err(|e| CodecError::Decode(e.to_string())),
        }
    }

    /// Decodes one tick's outgoing message queue.
    pub fn decode_queue(&self, data: &[u8]) -> Result<MessageQueue, CodecError> {
        self.decode(data)
    }

    /// Encodes one interrupt for delivery to the engine.
    pub fn encode_interrupt(&self, interrupt: &NativeInterrupt) -> Result<Vec<u8>, CodecError> {
        self.encode(interrupt)
    }

    /// Decodes an interrupt buffer. Engines do this on their side; the host
    /// uses it for recording and tests.
    pub fn decode_interrupt(&self, data: &[u8]) -> Result<NativeInterrupt, CodecError> {
        self.decode(data)
    }

    /// Returns a short name for logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::FlexBuffers => "flexbuffers",
            Self::Json => "json",
        }
    }
}

/// Codec errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Encoding failed.
    #[error("encoding failed: {0}")]
    Encode(String),

    /// Decoding failed.
    #[error("decoding failed: {0}")]
    Decode(String),

    /// The buffer was empty.
    #[error("decoding failed: empty buffer")]
    Empty,
}
