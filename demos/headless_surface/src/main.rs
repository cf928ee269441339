// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated native surface that exercises the whole host pipeline.
//!
//! An in-process engine scripts a small scene: a clipping frame, a text
//! element that counts frames, a text element clipped by a frame that never
//! arrives, and an image request. The surface paces redraws on a sleeping
//! timer, applies each queue, renders into a logging
//! [`Canvas`](tether_core::render::Canvas), and feeds decoded pixels and
//! synthetic input back to the engine.
//!
//! Events go to a [`PrettyPrintSink`] on stdout and to a [`RecorderSink`],
//! which is exported as `trace.json` at the end.
//!
//! Set `RUST_LOG=debug` for per-element output, and `TETHER_CONFIG` to a JSON
//! surface configuration to override the desktop preset.

use std::cell::RefCell;
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use std::rc::Rc;
use std::time::Instant;

use tether_core::apply::SkippedPatch;
use tether_core::assets::ThreadedImageLoader;
use tether_core::clip::ClipRegion;
use tether_core::codec::Codec;
use tether_core::config::SurfaceConfig;
use tether_core::driver::{DrawOutcome, TickDriver};
use tether_core::element::TextElement;
use tether_core::engine::{
    DrawContext, Engine, EngineBootstrap, EngineError, LogSink, OwnedQueue,
};
use tether_core::id::IdChain;
use tether_core::interrupt::{ImageInterrupt, Interrupt, Modifiers, MouseButton, NativeInterrupt};
use tether_core::message::{
    AnyCreatePatch, FramePatch, ImageLoadPatch, MessageQueue, NativeMessage, TextPatch,
};
use tether_core::pacing::RedrawTimer;
use tether_core::render::{Canvas, render};
use tether_core::tables::TableKind;
use tether_core::time::HostTime;
use tether_core::trace::{
    InterruptEvent, QueueAppliedEvent, RedrawEvent, TickEvent, TickFailedEvent, TraceSink,
};
use tether_debug::pretty::PrettyPrintSink;
use tether_debug::recorder::RecorderSink;
use tracing_subscriber::EnvFilter;

const FRAME_COUNT: u64 = 60;
const WIDTH: f64 = 800.0;
const HEIGHT: f64 = 600.0;
const IMAGE_FILE: &str = "tether_demo_badge.png";

// -- engine ---------------------------------------------------------------

/// Scripted scene logic standing in for a compiled engine.
#[derive(Debug)]
struct DemoEngine {
    codec: Codec,
    frame: u64,
    log: LogSink,
}

impl DemoEngine {
    fn scene(&self, width: f64, height: f64) -> Vec<NativeMessage> {
        let root = IdChain::from([0]);
        let counter = IdChain::from([0, 1]);
        let mut messages = Vec::new();

        match self.frame {
            1 => {
                messages.push(NativeMessage::FrameCreate(AnyCreatePatch {
                    id_chain: root.clone(),
                    clipping_ids: Vec::new(),
                }));
                messages.push(NativeMessage::TextCreate(AnyCreatePatch {
                    id_chain: counter.clone(),
                    clipping_ids: vec![root.clone()],
                }));
                messages.push(NativeMessage::TextUpdate(TextPatch {
                    size_x: Some(240.0),
                    size_y: Some(32.0),
                    transform: Some([1.0, 0.0, 0.0, 1.0, 40.0, 40.0]),
                    font_size: Some(18.0),
                    ..TextPatch::new(counter.clone())
                }));
            }
            20 => {
                messages.push(NativeMessage::TextCreate(AnyCreatePatch {
                    id_chain: IdChain::from([0, 2]),
                    clipping_ids: vec![IdChain::from([9])],
                }));
                messages.push(NativeMessage::ImageLoad(ImageLoadPatch {
                    id_chain: IdChain::from([0, 3]),
                    path: IMAGE_FILE.to_owned(),
                }));
            }
            40 => {
                messages.push(NativeMessage::FrameUpdate(FramePatch::new(IdChain::from([7]))));
            }
            _ => {}
        }

        // The root frame tracks the drawable size, inset by a margin.
        messages.push(NativeMessage::FrameUpdate(FramePatch {
            size_x: Some(width - 80.0),
            size_y: Some(height - 80.0),
            transform: Some([1.0, 0.0, 0.0, 1.0, 40.0, 40.0]),
            ..FramePatch::new(root)
        }));
        messages.push(NativeMessage::TextUpdate(TextPatch {
            content: Some(format!("frame {}", self.frame)),
            ..TextPatch::new(counter)
        }));
        messages
    }
}

impl Engine for DemoEngine {
    type Queue = OwnedQueue;

    fn tick(
        &mut self,
        _: DrawContext,
        width: f64,
        height: f64,
    ) -> Result<OwnedQueue, EngineError> {
        self.frame += 1;
        let queue = MessageQueue::new(self.scene(width, height));
        self.codec
            .encode(&queue)
            .map(OwnedQueue)
            .map_err(|e| EngineError::Call(e.to_string()))
    }

    fn release(&mut self, _: OwnedQueue) {}

    fn interrupt(&mut self, buffer: &[u8]) -> Result<(), EngineError> {
        let interrupt = self
            .codec
            .decode_interrupt(buffer)
            .map_err(|e| EngineError::Call(e.to_string()))?;
        let line = match interrupt {
            NativeInterrupt::Image(ImageInterrupt::Reference(args)) => format!(
                "image for {}: {}x{} ({} bytes)",
                args.id_chain, args.width, args.height, args.image_data_length
            ),
            other => format!("input: {other:?}"),
        };
        (self.log)(&line);
        Ok(())
    }
}

#[derive(Debug)]
struct DemoBootstrap {
    codec: Codec,
}

impl EngineBootstrap for DemoBootstrap {
    type Engine = DemoEngine;

    fn init(self, log: LogSink) -> Result<DemoEngine, EngineError> {
        log("demo engine ready");
        Ok(DemoEngine {
            codec: self.codec,
            frame: 0,
            log,
        })
    }
}

// -- timer ----------------------------------------------------------------

/// Wall-clock timer whose single pending request the main loop sleeps on.
#[derive(Debug)]
struct SleepTimer {
    origin: Instant,
    next: u32,
    pending: Option<(u32, HostTime)>,
}

impl SleepTimer {
    fn new() -> Self {
        Self {
            origin: Instant::now(),
            next: 0,
            pending: None,
        }
    }

    fn take_pending(&mut self) -> Option<(u32, HostTime)> {
        self.pending.take()
    }
}

impl RedrawTimer for SleepTimer {
    type Handle = u32;

    fn now(&self) -> HostTime {
        HostTime(u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX))
    }

    fn schedule_at(&mut self, deadline: HostTime) -> u32 {
        self.next += 1;
        self.pending = Some((self.next, deadline));
        self.next
    }

    fn cancel(&mut self, handle: u32) {
        if self.pending.is_some_and(|(pending, _)| pending == handle) {
            self.pending = None;
        }
    }
}

// -- sinks ----------------------------------------------------------------

/// Forwards every event to the pretty printer and the shared recorder.
struct Tee {
    pretty: PrettyPrintSink,
    recorder: Rc<RefCell<RecorderSink>>,
}

impl TraceSink for Tee {
    fn on_tick(&mut self, e: &TickEvent) {
        self.pretty.on_tick(e);
        self.recorder.borrow_mut().on_tick(e);
    }

    fn on_queue_applied(&mut self, e: &QueueAppliedEvent) {
        self.pretty.on_queue_applied(e);
        self.recorder.borrow_mut().on_queue_applied(e);
    }

    fn on_skipped_patch(&mut self, frame_index: u64, patch: &SkippedPatch) {
        self.pretty.on_skipped_patch(frame_index, patch);
        self.recorder.borrow_mut().on_skipped_patch(frame_index, patch);
    }

    fn on_redraw(&mut self, e: &RedrawEvent) {
        self.pretty.on_redraw(e);
        self.recorder.borrow_mut().on_redraw(e);
    }

    fn on_interrupt(&mut self, e: &InterruptEvent) {
        self.pretty.on_interrupt(e);
        self.recorder.borrow_mut().on_interrupt(e);
    }

    fn on_tick_failed(&mut self, e: &TickFailedEvent) {
        self.pretty.on_tick_failed(e);
        self.recorder.borrow_mut().on_tick_failed(e);
    }
}

// -- canvas ---------------------------------------------------------------

#[derive(Debug, Default)]
struct LogCanvas;

impl Canvas for LogCanvas {
    fn draw_text(&mut self, text: &TextElement, clip: &ClipRegion) {
        let clip = clip
            .bounding_box()
            .map_or_else(|| "none".to_owned(), |rect| format!("{rect:?}"));
        tracing::debug!(id = %text.id_chain, clip = %clip, "draw {:?}", text.content);
    }
}

// -- main -----------------------------------------------------------------

fn write_demo_image(dir: &Path) -> Result<(), Box<dyn Error>> {
    let badge = image::RgbaImage::from_fn(16, 16, |x, y| {
        if (x + y) % 2 == 0 {
            image::Rgba([0x20, 0x80, 0xe0, 0xff])
        } else {
            image::Rgba([0xff, 0xff, 0xff, 0xff])
        }
    });
    badge.save(dir.join(IMAGE_FILE))?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match std::env::var("TETHER_CONFIG") {
        Ok(text) => SurfaceConfig::from_json_str(&text)?,
        Err(_) => SurfaceConfig::desktop(),
    };

    let asset_dir = std::env::temp_dir();
    write_demo_image(&asset_dir)?;

    let recorder = Rc::new(RefCell::new(RecorderSink::new()));
    let tee = Tee {
        pretty: PrettyPrintSink::new(Box::new(std::io::stdout())),
        recorder: Rc::clone(&recorder),
    };

    let bootstrap = DemoBootstrap {
        codec: config.codec,
    };
    let mut driver = TickDriver::new(bootstrap, SleepTimer::new(), config)?
        .with_image_loader(ThreadedImageLoader::with_root(&asset_dir))
        .with_change_listener(|table: TableKind| {
            tracing::trace!(?table, "table changed");
        })
        .with_trace_sink(tee);

    let ctx = DrawContext::null();
    let mut canvas = LogCanvas;

    // The host's first drawing opportunity; every later one is paced.
    driver.draw(ctx, WIDTH, HEIGHT)?;

    while driver.frame_index() < FRAME_COUNT {
        let Some((handle, deadline)) = driver.pacer_mut().timer_mut().take_pending() else {
            break;
        };
        let wait = deadline.saturating_duration_since(driver.pacer().now());
        std::thread::sleep(wait.to_std());

        match driver.redraw_fired(handle, ctx, WIDTH, HEIGHT)? {
            Some(DrawOutcome::Ticked(report)) => {
                let stats = render(driver.tables(), &mut canvas);
                if !report.pump.failures.is_empty() {
                    tracing::warn!(failures = ?report.pump.failures, "mailbox items dropped");
                }
                tracing::debug!(
                    frame = report.frame_index,
                    drawn = stats.drawn,
                    fully_clipped = stats.fully_clipped,
                    skipped_clips = stats.skipped_clips,
                    "rendered"
                );
            }
            Some(DrawOutcome::Skipped(e)) => tracing::warn!("frame skipped: {e}"),
            Some(DrawOutcome::Initialized) | None => {}
        }

        match driver.frame_index() {
            10 => {
                driver.send_interrupt(&Interrupt::Click {
                    x: 120.0,
                    y: 56.0,
                    button: MouseButton::Left,
                    modifiers: Modifiers::SHIFT,
                })?;
            }
            30 => {
                driver.send_interrupt(&Interrupt::Scroll {
                    x: 400.0,
                    y: 300.0,
                    delta_x: 0.0,
                    delta_y: -12.0,
                })?;
            }
            _ => {}
        }
    }
    driver.pacer_mut().cancel();

    let path = "trace.json";
    let mut writer = BufWriter::new(File::create(path)?);
    tether_debug::chrome::export(recorder.borrow().as_bytes(), &mut writer)?;

    println!(
        "Wrote {path} ({} frames, {} text elements)",
        driver.frame_index(),
        driver.tables().text.len()
    );
    Ok(())
}
