// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Hand-off from background producers to the tick context.
//!
//! The engine may only be called from the tick context, but image decoding
//! runs on worker threads. Workers post results through a [`MailboxSender`];
//! the surface drains the [`Mailbox`] on the tick context and forwards each
//! result to the engine as an interrupt.
//!
//! [`Mailbox`] owns the receiving end and produces [`MailboxSender`] handles,
//! which are `Send` and cheap to clone.

use core::fmt;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use crate::error::ResourceError;
use crate::id::IdChain;

/// A completed background job.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MailboxItem {
    /// An image was decoded to RGBA8.
    Decoded {
        /// Node the pixels belong to.
        id_chain: IdChain,
        /// RGBA8 pixels, `width * height * 4` bytes.
        pixels: Vec<u8>,
        /// Width in pixels.
        width: u32,
        /// Height in pixels.
        height: u32,
    },
    /// The job failed.
    Failed {
        /// Node the job was for.
        id_chain: IdChain,
        /// What went wrong.
        error: ResourceError,
    },
}

impl MailboxItem {
    /// Returns the node the item is for.
    #[must_use]
    pub fn id_chain(&self) -> &IdChain {
        match self {
            Self::Decoded { id_chain, .. } | Self::Failed { id_chain, .. } => id_chain,
        }
    }
}

/// Receiving end, drained on the tick context.
pub struct Mailbox {
    tx: Sender<MailboxItem>,
    rx: Receiver<MailboxItem>,
}

impl fmt::Debug for Mailbox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mailbox").finish_non_exhaustive()
    }
}

impl Default for Mailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Mailbox {
    /// Creates an empty mailbox.
    #[must_use]
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    /// Returns a handle that background threads use to post results.
    #[must_use]
    pub fn sender(&self) -> MailboxSender {
        MailboxSender {
            tx: self.tx.clone(),
        }
    }

    /// Takes the next item without blocking.
    pub fn try_next(&self) -> Option<MailboxItem> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            // The mailbox holds a sender itself, so the channel never
            // disconnects while `self` is alive.
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Takes up to `limit` items without blocking, in posting order.
    pub fn drain(&self, limit: usize) -> Vec<MailboxItem> {
        core::iter::from_fn(|| self.try_next()).take(limit).collect()
    }
}

/// Posts background results to a [`Mailbox`].
#[derive(Clone)]
pub struct MailboxSender {
    tx: Sender<MailboxItem>,
}

impl fmt::Debug for MailboxSender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailboxSender").finish_non_exhaustive()
    }
}

impl MailboxSender {
    /// Posts `item`. Returns `false` if the mailbox has been dropped.
    pub fn post(&self, item: MailboxItem) -> bool {
        match self.tx.send(item) {
            Ok(()) => true,
            Err(mpsc::SendError(item)) => {
                tracing::debug!(id = %item.id_chain(), "mailbox closed, dropping result");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decoded(id: u64) -> MailboxItem {
        MailboxItem::Decoded {
            id_chain: IdChain::from([id]),
            pixels: vec![0; 4],
            width: 1,
            height: 1,
        }
    }

    #[test]
    fn items_arrive_in_order_across_threads() {
        let mailbox = Mailbox::new();
        let sender = mailbox.sender();
        std::thread::spawn(move || {
            for id in 0..5 {
                assert!(sender.post(decoded(id)));
            }
        })
        .join()
        .unwrap();

        let ids: Vec<_> = mailbox
            .drain(usize::MAX)
            .iter()
            .map(|item| item.id_chain().clone())
            .collect();
        assert_eq!(ids, (0..5).map(|id| IdChain::from([id])).collect::<Vec<_>>());
    }

    #[test]
    fn drain_respects_limit() {
        let mailbox = Mailbox::new();
        let sender = mailbox.sender();
        for id in 0..4 {
            sender.post(decoded(id));
        }
        assert_eq!(mailbox.drain(3).len(), 3);
        assert_eq!(mailbox.drain(3).len(), 1);
        assert!(mailbox.try_next().is_none());
    }

    #[test]
    fn post_after_drop_reports_closed() {
        let mailbox = Mailbox::new();
        let sender = mailbox.sender();
        drop(mailbox);
        assert!(!sender.post(decoded(1)));
    }
}
