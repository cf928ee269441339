// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types shared across the surface.
//!
//! Errors follow the failure classes of the surface:
//!
//! - fatal engine errors halt the surface ([`SurfaceError`]);
//! - per-tick errors skip one frame ([`TickError`]);
//! - per-interrupt errors drop one event ([`InterruptError`]);
//! - asset failures are logged and leave the node unchanged ([`ResourceError`]).
//!
//! A patch addressing a missing element is not an error; it is reported as a
//! [`SkippedPatch`](crate::apply::SkippedPatch).

use thiserror::Error;

use crate::codec::CodecError;
use crate::engine::EngineError;

/// Failure of a single tick. The frame is skipped and the surface keeps
/// running unless [`is_fatal`](Self::is_fatal) returns `true`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TickError {
    /// The outgoing queue could not be decoded.
    #[error("tick queue rejected: {0}")]
    Decode(#[from] CodecError),

    /// The engine reported an error.
    #[error(transparent)]
    Engine(#[from] EngineError),
}

impl TickError {
    /// Returns `true` if the surface must stop ticking.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        match self {
            Self::Decode(_) => false,
            Self::Engine(e) => e.is_fatal(),
        }
    }
}

/// Failure that stops the surface.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The engine could not be initialized.
    #[error("engine failed to start: {0}")]
    Init(EngineError),

    /// The surface halted after a fatal error and no longer ticks.
    #[error("surface halted: {0}")]
    Halted(EngineError),
}

/// Failure of a single interrupt. The event is dropped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InterruptError {
    /// Encoding failed.
    #[error("interrupt encoding failed: {0}")]
    Codec(#[from] CodecError),

    /// The engine rejected the interrupt.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The engine is not running (not yet initialized, or halted).
    #[error("engine is not running")]
    NotRunning,

    /// An image buffer does not match its dimensions.
    #[error("pixel buffer of {actual} bytes does not match {width}x{height} RGBA8")]
    PixelBufferSize {
        /// Declared width.
        width: u32,
        /// Declared height.
        height: u32,
        /// Actual buffer length.
        actual: usize,
    },
}

/// Failure to resolve an asset requested by the engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceError {
    /// The file could not be read.
    #[error("cannot read {path}: {reason}")]
    Read {
        /// Requested path.
        path: String,
        /// I/O error text.
        reason: String,
    },

    /// The file could not be decoded as an image.
    #[error("cannot decode {path}: {reason}")]
    Decode {
        /// Requested path.
        path: String,
        /// Decoder error text.
        reason: String,
    },

    /// No image loader is installed on the surface.
    #[error("no image loader installed")]
    NoLoader,

    /// The loader's worker thread could not take the request.
    #[error("image worker unavailable: {0}")]
    Worker(String),
}

/// Invalid surface configuration.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// The target frame rate is not a positive, finite number.
    #[error("target_fps must be positive and finite, got {0}")]
    TargetFps(f64),

    /// The interrupt pump limit is zero.
    #[error("max_interrupts_per_pump must be at least 1")]
    InterruptPumpLimit,

    /// The configuration document could not be parsed.
    #[error("cannot parse surface configuration: {0}")]
    Parse(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_failures_are_not_fatal() {
        let err = TickError::from(CodecError::Empty);
        assert!(!err.is_fatal());
    }

    #[test]
    fn invalid_handle_is_fatal_through_tick_error() {
        assert!(TickError::from(EngineError::InvalidHandle).is_fatal());
        assert!(!TickError::from(EngineError::NullQueue).is_fatal());
    }

    #[test]
    fn messages_name_the_problem() {
        let err = InterruptError::PixelBufferSize {
            width: 3,
            height: 2,
            actual: 20,
        };
        assert_eq!(
            err.to_string(),
            "pixel buffer of 20 bytes does not match 3x2 RGBA8"
        );
    }
}
