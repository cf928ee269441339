// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The tick driver: frame cadence, engine lifecycle, and interrupt delivery.
//!
//! [`TickDriver`] owns everything a surface needs on its tick context: the
//! engine, the element tables, the redraw pacer, the interrupt sender, and
//! the mailbox that background loaders reply through.
//!
//! # Draw sequence
//!
//! Every drawing opportunity goes through [`TickDriver::draw`]:
//!
//! 1. Cancel the pending redraw, if any (the draw may have been triggered
//!    from outside the paced loop).
//! 2. On the very first draw, initialize the engine and stop there.
//! 3. Otherwise forward completed background results (decoded images) to
//!    the engine, then tick it, decode the queue, release the queue, and
//!    apply the patches.
//! 4. Schedule exactly one redraw one interval out.
//!
//! A draw that fails to decode or that the engine rejects is skipped; the
//! tables keep their state and the next redraw is still scheduled. A fatal
//! engine error halts the driver: the pending redraw is cancelled and every
//! later call returns the error.

use core::fmt;

use crate::apply::{ChangeListener, PatchApplier, QueueChanges};
use crate::assets::ImageLoader;
use crate::codec::Codec;
use crate::config::SurfaceConfig;
use crate::engine::{
    DrawContext, Engine, EngineBootstrap, EngineError, LogSink, OutgoingQueue, log_engine_message,
};
use crate::error::{ConfigError, InterruptError, ResourceError, SurfaceError, TickError};
use crate::id::IdChain;
use crate::interrupt::{ImagePayload, Interrupt, InterruptSender};
use crate::mailbox::{Mailbox, MailboxItem, MailboxSender};
use crate::pacing::{RedrawPacer, RedrawTimer};
use crate::tables::ElementTables;
use crate::time::HostTime;
use crate::trace::{
    InterruptEvent, QueueAppliedEvent, RedrawAction, RedrawEvent, TickEvent, TickFailedEvent,
    TickFailure, TraceSink,
};

enum EngineState<B: EngineBootstrap> {
    Uninit(B),
    Running(B::Engine),
    Halted(EngineError),
}

/// What a successful [`TickDriver::draw`] did.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOutcome {
    /// The engine was initialized; nothing was ticked.
    Initialized,
    /// A queue was applied.
    Ticked(FrameReport),
    /// The tick failed and the frame was skipped.
    Skipped(TickError),
}

/// Summary of one applied frame.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameReport {
    /// Draw counter.
    pub frame_index: u64,
    /// Messages in the queue.
    pub messages: usize,
    /// Table changes.
    pub changes: QueueChanges,
    /// Background results forwarded before the tick.
    pub pump: PumpReport,
}

/// Result of forwarding mailbox items to the engine.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PumpReport {
    /// Image interrupts accepted by the engine.
    pub delivered: usize,
    /// Items that could not be delivered, with the reason.
    pub failures: Vec<PumpFailure>,
}

/// One mailbox item that did not reach the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum PumpFailure {
    /// The asset could not be loaded.
    Resource {
        /// Node the asset was for.
        id_chain: IdChain,
        /// Why.
        error: ResourceError,
    },
    /// The image interrupt was rejected.
    Interrupt {
        /// Node the pixels were for.
        id_chain: IdChain,
        /// Why.
        error: InterruptError,
    },
}

/// Drives one engine-backed surface.
pub struct TickDriver<B: EngineBootstrap, T: RedrawTimer> {
    state: EngineState<B>,
    tables: ElementTables,
    applier: PatchApplier,
    pacer: RedrawPacer<T>,
    codec: Codec,
    sender: InterruptSender,
    mailbox: Mailbox,
    max_interrupts_per_pump: usize,
    log: LogSink,
    loader: Option<Box<dyn ImageLoader>>,
    listener: Option<Box<dyn ChangeListener>>,
    trace: Option<Box<dyn TraceSink>>,
    frame_index: u64,
}

impl<B: EngineBootstrap, T: RedrawTimer> fmt::Debug for TickDriver<B, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            EngineState::Uninit(_) => "uninit",
            EngineState::Running(_) => "running",
            EngineState::Halted(_) => "halted",
        };
        f.debug_struct("TickDriver")
            .field("state", &state)
            .field("frame_index", &self.frame_index)
            .field("text", &self.tables.text.len())
            .field("frames", &self.tables.frames.len())
            .field("codec", &self.codec)
            .finish_non_exhaustive()
    }
}

impl<B: EngineBootstrap, T: RedrawTimer> TickDriver<B, T> {
    /// Creates a driver. The engine is initialized on the first draw.
    pub fn new(bootstrap: B, timer: T, config: SurfaceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let interval = config.frame_interval()?;
        Ok(Self {
            state: EngineState::Uninit(bootstrap),
            tables: ElementTables::new(),
            applier: PatchApplier::new(),
            pacer: RedrawPacer::new(timer, interval),
            codec: config.codec,
            sender: InterruptSender::new(config.codec),
            mailbox: Mailbox::new(),
            max_interrupts_per_pump: config.max_interrupts_per_pump,
            log: log_engine_message,
            loader: None,
            listener: None,
            trace: None,
            frame_index: 0,
        })
    }

    /// Installs the loader used for `ImageLoad` requests.
    #[must_use]
    pub fn with_image_loader(mut self, loader: impl ImageLoader + 'static) -> Self {
        self.loader = Some(Box::new(loader));
        self
    }

    /// Installs a listener signaled once per changed table per frame.
    #[must_use]
    pub fn with_change_listener(mut self, listener: impl ChangeListener + 'static) -> Self {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Installs a trace sink.
    #[must_use]
    pub fn with_trace_sink(mut self, sink: impl TraceSink + 'static) -> Self {
        self.trace = Some(Box::new(sink));
        self
    }

    /// Replaces the log sink handed to the engine at initialization.
    #[must_use]
    pub fn with_log_sink(mut self, log: LogSink) -> Self {
        self.log = log;
        self
    }

    /// Handles one drawing opportunity at the given drawable size.
    pub fn draw(
        &mut self,
        context: DrawContext,
        width: f64,
        height: f64,
    ) -> Result<DrawOutcome, SurfaceError> {
        if let EngineState::Halted(e) = &self.state {
            return Err(SurfaceError::Halted(e.clone()));
        }
        if self.pacer.begin_draw().is_some() {
            self.emit_redraw(RedrawAction::Cancelled, None);
        }

        let state = core::mem::replace(
            &mut self.state,
            EngineState::Halted(EngineError::InvalidHandle),
        );
        let outcome = match state {
            EngineState::Uninit(bootstrap) => match bootstrap.init(self.log) {
                Ok(engine) => {
                    tracing::debug!("engine initialized");
                    self.state = EngineState::Running(engine);
                    DrawOutcome::Initialized
                }
                Err(e) => {
                    tracing::error!("engine initialization failed: {e}");
                    self.state = EngineState::Halted(e.clone());
                    return Err(SurfaceError::Init(e));
                }
            },
            EngineState::Running(engine) => {
                self.state = EngineState::Running(engine);
                match self.tick(context, width, height) {
                    Ok(report) => DrawOutcome::Ticked(report),
                    Err(TickError::Engine(e)) if e.is_fatal() => return Err(self.halt(e)),
                    Err(e) => DrawOutcome::Skipped(e),
                }
            }
            EngineState::Halted(e) => {
                self.state = EngineState::Halted(e.clone());
                return Err(SurfaceError::Halted(e));
            }
        };

        let scheduled = self.pacer.end_draw();
        if scheduled.replaced.is_some() {
            self.emit_redraw(RedrawAction::Cancelled, None);
        }
        self.emit_redraw(RedrawAction::Scheduled, Some(scheduled.deadline));
        Ok(outcome)
    }

    /// Handles a redraw timer fire. Stale fires are ignored and return
    /// `Ok(None)`.
    pub fn redraw_fired(
        &mut self,
        handle: T::Handle,
        context: DrawContext,
        width: f64,
        height: f64,
    ) -> Result<Option<DrawOutcome>, SurfaceError> {
        if !self.pacer.fire(handle) {
            self.emit_redraw(RedrawAction::Stale, None);
            return Ok(None);
        }
        self.emit_redraw(RedrawAction::Fired, None);
        self.draw(context, width, height).map(Some)
    }

    /// Delivers one host event to the engine synchronously.
    ///
    /// Returns the encoded size.
    pub fn send_interrupt(&mut self, interrupt: &Interrupt<'_>) -> Result<usize, InterruptError> {
        let engine = match &mut self.state {
            EngineState::Running(engine) => engine,
            EngineState::Uninit(_) => return Err(InterruptError::NotRunning),
            EngineState::Halted(e) => return Err(InterruptError::Engine(e.clone())),
        };
        let result = self.sender.send(engine, interrupt);

        let event = InterruptEvent {
            kind: interrupt.kind(),
            now: self.pacer.now(),
            bytes: *result.as_ref().unwrap_or(&0),
            delivered: result.is_ok(),
        };
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_interrupt(&event);
        }

        match result {
            Err(InterruptError::Engine(e)) if e.is_fatal() => {
                self.halt(e.clone());
                Err(InterruptError::Engine(e))
            }
            Err(e) => {
                tracing::warn!(kind = interrupt.kind().as_str(), "interrupt dropped: {e}");
                Err(e)
            }
            ok => ok,
        }
    }

    /// Forwards up to `max_interrupts_per_pump` mailbox items to the engine.
    ///
    /// Called automatically at the start of every tick; hosts may also call
    /// it between draws.
    pub fn pump_interrupts(&mut self) -> PumpReport {
        let mut report = PumpReport::default();
        if !self.is_running() {
            return report;
        }
        for item in self.mailbox.drain(self.max_interrupts_per_pump) {
            match item {
                MailboxItem::Decoded {
                    id_chain,
                    pixels,
                    width,
                    height,
                } => {
                    let result = ImagePayload::new(&id_chain, &pixels, width, height)
                        .and_then(|payload| self.send_interrupt(&Interrupt::Image(payload)));
                    match result {
                        Ok(_) => report.delivered += 1,
                        Err(error) => {
                            report
                                .failures
                                .push(PumpFailure::Interrupt { id_chain, error });
                        }
                    }
                }
                MailboxItem::Failed { id_chain, error } => {
                    tracing::warn!(id = %id_chain, "image load failed: {error}");
                    report.failures.push(PumpFailure::Resource { id_chain, error });
                }
            }
            if !self.is_running() {
                break;
            }
        }
        report
    }

    fn tick(
        &mut self,
        context: DrawContext,
        width: f64,
        height: f64,
    ) -> Result<FrameReport, TickError> {
        let pump = self.pump_interrupts();
        let EngineState::Running(engine) = &mut self.state else {
            let reason = self
                .halt_reason()
                .cloned()
                .unwrap_or(EngineError::InvalidHandle);
            return Err(TickError::Engine(reason));
        };

        let frame_index = self.frame_index;
        self.frame_index += 1;
        let tick_event = TickEvent {
            frame_index,
            now: self.pacer.now(),
            width,
            height,
        };
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_tick(&tick_event);
        }

        let decoded = engine
            .tick(context, width, height)
            .map_err(TickError::from)
            .and_then(|queue| {
                let decoded = self.codec.decode_queue(queue.as_bytes());
                engine.release(queue);
                decoded.map_err(TickError::from)
            });
        let queue = match decoded {
            Ok(queue) => queue,
            Err(e) => {
                self.report_tick_failure(frame_index, &e);
                return Err(e);
            }
        };
        let messages = queue.len();

        match self.listener.as_deref_mut() {
            Some(listener) => self.applier.apply_and_notify(&mut self.tables, queue, listener),
            None => self.applier.apply(&mut self.tables, queue),
        };
        let changes = self.applier.last_changes().clone();
        self.dispatch_image_loads();

        let applied_event = QueueAppliedEvent {
            frame_index,
            now: self.pacer.now(),
            messages,
            applied: changes.applied,
            skipped: changes.skipped.len(),
            image_loads: changes.image_loads.len(),
            text_changed: changes.text_changed,
            frames_changed: changes.frames_changed,
        };
        if let Some(sink) = self.trace.as_deref_mut() {
            for skipped in &changes.skipped {
                sink.on_skipped_patch(frame_index, skipped);
            }
            sink.on_queue_applied(&applied_event);
        }

        Ok(FrameReport {
            frame_index,
            messages,
            changes,
            pump,
        })
    }

    /// Hands image loads to the loader. Without one, each request fails with
    /// [`ResourceError::NoLoader`] through the mailbox, so the next pump
    /// reports it like any other resource failure.
    fn dispatch_image_loads(&mut self) {
        for request in self.applier.take_image_loads() {
            let reply = self.mailbox.sender();
            match self.loader.as_deref_mut() {
                Some(loader) => loader.load(request, reply),
                None => {
                    tracing::debug!(id = %request.id_chain, path = %request.path, "no image loader");
                    reply.post(MailboxItem::Failed {
                        id_chain: request.id_chain,
                        error: ResourceError::NoLoader,
                    });
                }
            }
        }
    }

    fn report_tick_failure(&mut self, frame_index: u64, error: &TickError) {
        let failure = match error {
            TickError::Decode(_) => TickFailure::Decode,
            TickError::Engine(_) => TickFailure::Engine,
        };
        if error.is_fatal() {
            tracing::error!(frame_index, "tick failed: {error}");
        } else {
            tracing::warn!(frame_index, "frame skipped: {error}");
        }
        let event = TickFailedEvent {
            frame_index,
            now: self.pacer.now(),
            failure,
            fatal: error.is_fatal(),
        };
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_tick_failed(&event);
        }
    }

    fn halt(&mut self, error: EngineError) -> SurfaceError {
        tracing::error!("halting surface: {error}");
        self.state = EngineState::Halted(error.clone());
        if self.pacer.cancel().is_some() {
            self.emit_redraw(RedrawAction::Cancelled, None);
        }
        SurfaceError::Halted(error)
    }

    fn emit_redraw(&mut self, action: RedrawAction, deadline: Option<HostTime>) {
        let event = RedrawEvent {
            action,
            now: self.pacer.now(),
            deadline,
        };
        if let Some(sink) = self.trace.as_deref_mut() {
            sink.on_redraw(&event);
        }
    }

    /// The mirrored scene.
    #[must_use]
    pub fn tables(&self) -> &ElementTables {
        &self.tables
    }

    /// The redraw pacer.
    #[must_use]
    pub fn pacer(&self) -> &RedrawPacer<T> {
        &self.pacer
    }

    /// The redraw pacer, mutably (for driving the timer in hosts and tests).
    pub fn pacer_mut(&mut self) -> &mut RedrawPacer<T> {
        &mut self.pacer
    }

    /// A handle for posting background results.
    #[must_use]
    pub fn mailbox_sender(&self) -> MailboxSender {
        self.mailbox.sender()
    }

    /// The running engine, if any.
    pub fn engine_mut(&mut self) -> Option<&mut B::Engine> {
        match &mut self.state {
            EngineState::Running(engine) => Some(engine),
            _ => None,
        }
    }

    /// Returns `true` once the engine is initialized and not halted.
    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self.state, EngineState::Running(_))
    }

    /// The error that halted the driver, if any.
    #[must_use]
    pub fn halt_reason(&self) -> Option<&EngineError> {
        match &self.state {
            EngineState::Halted(e) => Some(e),
            _ => None,
        }
    }

    /// Number of ticks attempted so far.
    #[must_use]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }
}
