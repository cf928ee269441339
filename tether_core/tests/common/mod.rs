// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Test doubles shared by the integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::collections::VecDeque;

use tether_core::codec::Codec;
use tether_core::engine::{DrawContext, Engine, EngineBootstrap, EngineError, LogSink, OwnedQueue};
use tether_core::message::{MessageQueue, NativeMessage};
use tether_core::pacing::RedrawTimer;
use tether_core::time::HostTime;

/// A timer whose clock only moves when told to.
#[derive(Debug, Default)]
pub struct ManualTimer {
    pub now: u64,
    next: u32,
    pub pending: Vec<(u32, HostTime)>,
    pub max_pending: usize,
    pub scheduled_total: usize,
}

impl ManualTimer {
    pub fn advance(&mut self, nanos: u64) {
        self.now += nanos;
    }

    /// Returns the handle of the earliest pending request that is due.
    pub fn due(&self) -> Option<u32> {
        self.pending
            .iter()
            .filter(|(_, deadline)| deadline.nanos() <= self.now)
            .min_by_key(|(_, deadline)| *deadline)
            .map(|(h, _)| *h)
    }
}

impl RedrawTimer for ManualTimer {
    type Handle = u32;

    fn now(&self) -> HostTime {
        HostTime(self.now)
    }

    fn schedule_at(&mut self, deadline: HostTime) -> u32 {
        self.next += 1;
        self.pending.push((self.next, deadline));
        self.scheduled_total += 1;
        self.max_pending = self.max_pending.max(self.pending.len());
        self.next
    }

    fn cancel(&mut self, handle: u32) {
        self.pending.retain(|(h, _)| *h != handle);
    }
}

/// One scripted tick result.
#[derive(Clone, Debug)]
pub enum Step {
    Queue(MessageQueue),
    Raw(Vec<u8>),
    Fail(EngineError),
}

/// An engine that replays scripted queues and records what it receives.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    pub codec: Codec,
    pub script: VecDeque<Step>,
    pub ticks: usize,
    pub released: usize,
    pub sizes: Vec<(f64, f64)>,
    pub interrupts: Vec<Vec<u8>>,
    /// Pixel bytes copied out of image interrupts.
    pub copied_pixels: Vec<Vec<u8>>,
    pub interrupt_error: Option<EngineError>,
}

impl ScriptedEngine {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            script: steps.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn outstanding_queues(&self) -> usize {
        self.ticks - self.released
    }
}

impl Engine for ScriptedEngine {
    type Queue = OwnedQueue;

    fn tick(
        &mut self,
        _: DrawContext,
        width: f64,
        height: f64,
    ) -> Result<OwnedQueue, EngineError> {
        self.sizes.push((width, height));
        let step = self
            .script
            .pop_front()
            .unwrap_or(Step::Queue(MessageQueue::default()));
        let bytes = match step {
            Step::Queue(queue) => self
                .codec
                .encode(&queue)
                .map_err(|e| EngineError::Call(e.to_string()))?,
            Step::Raw(bytes) => bytes,
            Step::Fail(e) => return Err(e),
        };
        self.ticks += 1;
        Ok(OwnedQueue(bytes))
    }

    fn release(&mut self, _queue: OwnedQueue) {
        self.released += 1;
    }

    fn interrupt(&mut self, buffer: &[u8]) -> Result<(), EngineError> {
        if let Some(e) = &self.interrupt_error {
            return Err(e.clone());
        }
        self.interrupts.push(buffer.to_vec());
        if let Ok(tether_core::interrupt::NativeInterrupt::Image(
            tether_core::interrupt::ImageInterrupt::Reference(args),
        )) = self.codec.decode_interrupt(buffer)
        {
            let len = usize::try_from(args.image_data_length).unwrap();
            let addr = usize::try_from(args.image_data).unwrap();
            let ptr = std::ptr::with_exposed_provenance::<u8>(addr);
            #[allow(unsafe_code, reason = "mirrors what a native engine does with the reference")]
            // SAFETY: `ptr` and `len` describe the payload the sender borrowed
            // for this synchronous call.
            let pixels = unsafe { std::slice::from_raw_parts(ptr, len) };
            self.copied_pixels.push(pixels.to_vec());
        }
        Ok(())
    }
}

/// Bootstraps a [`ScriptedEngine`], or fails if `engine` is `None`.
#[derive(Debug)]
pub struct ScriptedBootstrap(pub Option<ScriptedEngine>);

impl EngineBootstrap for ScriptedBootstrap {
    type Engine = ScriptedEngine;

    fn init(self, log: LogSink) -> Result<ScriptedEngine, EngineError> {
        log("scripted engine starting");
        self.0
            .ok_or_else(|| EngineError::Init("no engine scripted".into()))
    }
}

pub fn queue(messages: Vec<NativeMessage>) -> Step {
    Step::Queue(MessageQueue::new(messages))
}
