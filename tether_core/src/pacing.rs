// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Redraw pacing.
//!
//! After every draw the surface asks for one more draw no sooner than the
//! pacing interval (by default the 70 Hz ceiling). Draws can also arrive from
//! outside (window resize, expose events), so a request may still be pending
//! when the next draw happens. [`RedrawPacer`] keeps the invariant that **at
//! most one redraw is scheduled at any time**:
//!
//! ```text
//!            begin_draw (cancel)          fire (matching handle)
//!   Scheduled ───────────────────► Idle ◄─────────────────────── Scheduled
//!       ▲                           │
//!       └───────── end_draw ────────┘
//! ```
//!
//! The platform timer is abstracted by [`RedrawTimer`]. A fire whose handle
//! no longer matches the pending one is stale (it raced a cancel) and is
//! ignored.

use core::fmt::Debug;

use crate::time::{Duration, HostTime};

/// Platform timer used to schedule redraws.
pub trait RedrawTimer {
    /// Identifies one scheduled request.
    type Handle: Copy + Eq + Debug;

    /// Returns the current host time.
    fn now(&self) -> HostTime;

    /// Schedules a redraw at `deadline`.
    fn schedule_at(&mut self, deadline: HostTime) -> Self::Handle;

    /// Cancels a previously scheduled request. Cancelling a request that
    /// already fired must be harmless.
    fn cancel(&mut self, handle: Self::Handle);
}

/// Pacer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacerState<H> {
    /// Nothing scheduled.
    Idle,
    /// One redraw scheduled.
    Scheduled {
        /// Timer handle of the request.
        handle: H,
        /// When it is due.
        deadline: HostTime,
    },
}

/// Result of [`RedrawPacer::end_draw`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Scheduled<H> {
    /// Handle of the new request.
    pub handle: H,
    /// When it is due.
    pub deadline: HostTime,
    /// Request that was replaced, if one was still pending.
    pub replaced: Option<H>,
}

/// Keeps at most one redraw request outstanding.
#[derive(Debug)]
pub struct RedrawPacer<T: RedrawTimer> {
    timer: T,
    interval: Duration,
    state: PacerState<T::Handle>,
}

impl<T: RedrawTimer> RedrawPacer<T> {
    /// Creates an idle pacer.
    #[must_use]
    pub fn new(timer: T, interval: Duration) -> Self {
        Self {
            timer,
            interval,
            state: PacerState::Idle,
        }
    }

    /// Minimum interval between paced draws.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> PacerState<T::Handle> {
        self.state
    }

    /// Returns `true` if a redraw is scheduled.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        matches!(self.state, PacerState::Scheduled { .. })
    }

    /// Returns the timer.
    #[must_use]
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Returns the timer mutably.
    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Current host time according to the timer.
    #[must_use]
    pub fn now(&self) -> HostTime {
        self.timer.now()
    }

    /// Called when a draw starts. Cancels the pending request, if any, and
    /// returns its handle.
    pub fn begin_draw(&mut self) -> Option<T::Handle> {
        self.cancel()
    }

    /// Called when a draw finishes. Schedules the next redraw at
    /// `now + interval`, replacing any request still pending.
    pub fn end_draw(&mut self) -> Scheduled<T::Handle> {
        let replaced = self.cancel();
        let deadline = self.timer.now().saturating_add(self.interval);
        let handle = self.timer.schedule_at(deadline);
        self.state = PacerState::Scheduled { handle, deadline };
        Scheduled {
            handle,
            deadline,
            replaced,
        }
    }

    /// Called when the timer fires. Returns `true` if `handle` is the pending
    /// request, which is then consumed; `false` for a stale fire.
    pub fn fire(&mut self, handle: T::Handle) -> bool {
        match self.state {
            PacerState::Scheduled { handle: pending, .. } if pending == handle => {
                self.state = PacerState::Idle;
                true
            }
            _ => false,
        }
    }

    /// Cancels the pending request, if any, and returns its handle.
    pub fn cancel(&mut self) -> Option<T::Handle> {
        match core::mem::replace(&mut self.state, PacerState::Idle) {
            PacerState::Idle => None,
            PacerState::Scheduled { handle, .. } => {
                self.timer.cancel(handle);
                Some(handle)
            }
        }
    }
}
