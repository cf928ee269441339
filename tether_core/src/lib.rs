// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host-side scene mirror for a compiled rendering engine.
//!
//! `tether_core` keeps a native surface in sync with an opaque engine that
//! owns scene logic. Once per frame the engine hands the host a queue of
//! create/update/delete patches; the host applies them to element tables keyed
//! by identity chains and draws the result. Input and asynchronously produced
//! payloads travel back to the engine as interrupts over the same encoding.
//!
//! # Architecture
//!
//! ```text
//!   RedrawTimer ──► TickDriver::draw()
//!                        │
//!                        ├──► Mailbox ──► InterruptSender ──► Engine::interrupt()
//!                        │
//!                        ▼
//!                 Engine::tick() ──► queue bytes ──► Codec ──► MessageQueue
//!                                                                  │
//!                 ┌────────────────────────────────────────────────┘
//!                 ▼
//!   PatchApplier::apply() ──► ElementTables ──► render() ──► Canvas
//!          │                                       │
//!          ▼                                       ▼
//!   ImageLoader ──► Mailbox                  ClipComposer
//! ```
//!
//! **[`id`]** — [`IdChain`](id::IdChain), the hierarchical node address used
//! as every table key and cross-reference.
//!
//! **[`element`]** and **[`tables`]** — Text and frame records and the keyed
//! tables that hold them.
//!
//! **[`message`]** and **[`codec`]** — The closed set of engine → host
//! messages and the FlexBuffers/JSON codec for both directions.
//!
//! **[`apply`]** — Sequential patch application with per-table change
//! signaling and skipped-patch reporting.
//!
//! **[`clip`]** — Composition of ordered clip lists into convex clip polygons.
//!
//! **[`render`]** — The [`Canvas`](render::Canvas) trait and the paint-order
//! render pass.
//!
//! **[`pacing`]** — [`RedrawPacer`](pacing::RedrawPacer), which keeps at most
//! one redraw scheduled.
//!
//! **[`engine`]** — The engine contract (init, tick, release, interrupt).
//!
//! **[`interrupt`]**, **[`mailbox`]**, **[`assets`]** — Host → engine events,
//! the background hand-off channel, and image loading.
//!
//! **[`driver`]** — [`TickDriver`](driver::TickDriver), which wires the pieces
//! together on the tick context.
//!
//! **[`trace`]** — [`TraceSink`](trace::TraceSink) trait and event types for
//! frame-loop instrumentation.
//!
//! # Crate features
//!
//! - `image` (disabled by default): Enables
//!   [`ThreadedImageLoader`](assets::ThreadedImageLoader), which decodes image
//!   files with the `image` crate on a background worker thread.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod apply;
pub mod assets;
pub mod clip;
pub mod codec;
pub mod config;
pub mod driver;
pub mod element;
pub mod engine;
pub mod error;
pub mod id;
pub mod interrupt;
pub mod mailbox;
pub mod message;
pub mod pacing;
pub mod render;
pub mod tables;
pub mod time;
pub mod trace;
