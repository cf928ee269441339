// Copyright 2026 the Tether Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Image asset resolution.
//!
//! When the engine emits an `ImageLoad` message, the surface passes the
//! request to its [`ImageLoader`] along with a [`MailboxSender`]. The loader
//! may work synchronously or on another thread; either way it posts exactly
//! one [`MailboxItem`] per request. The surface later drains the mailbox on
//! the tick context and forwards decoded pixels to the engine.
//!
//! # Crate features
//!
//! - `image` — enables [`ThreadedImageLoader`], which reads and decodes files
//!   with the `image` crate on a single background worker thread.

use crate::mailbox::MailboxSender;
use crate::message::ImageLoadPatch;

/// Resolves image load requests.
pub trait ImageLoader {
    /// Starts loading `request` and arranges for one result to be posted to
    /// `reply`.
    fn load(&mut self, request: ImageLoadPatch, reply: MailboxSender);
}

#[cfg(feature = "image")]
pub use threaded::{ThreadedImageLoader, decode_rgba8};

#[cfg(feature = "image")]
mod threaded {
    use std::path::PathBuf;
    use std::sync::mpsc::{self, Sender};
    use std::thread;

    use super::ImageLoader;
    use crate::error::ResourceError;
    use crate::id::IdChain;
    use crate::mailbox::{MailboxItem, MailboxSender};
    use crate::message::ImageLoadPatch;

    /// Decodes `bytes` to RGBA8, returning `(pixels, width, height)`.
    pub fn decode_rgba8(bytes: &[u8], path: &str) -> Result<(Vec<u8>, u32, u32), ResourceError> {
        let image = image::load_from_memory(bytes).map_err(|e| ResourceError::Decode {
            path: path.to_owned(),
            reason: e.to_string(),
        })?;
        let rgba = image.to_rgba8();
        let (width, height) = rgba.dimensions();
        Ok((rgba.into_raw(), width, height))
    }

    /// Loads images on one background worker thread fed by a channel.
    ///
    /// The worker starts on the first request and serves requests in order;
    /// it exits when the loader is dropped. A worker that has died is
    /// replaced; if none can take a request, that request fails with
    /// [`ResourceError::Worker`].
    ///
    /// Relative paths are resolved against an optional root directory.
    #[derive(Debug, Default)]
    pub struct ThreadedImageLoader {
        root: Option<PathBuf>,
        worker: Option<Sender<Job>>,
    }

    struct Job {
        request: ImageLoadPatch,
        resolved: PathBuf,
        reply: MailboxSender,
    }

    impl Job {
        fn run(self) {
            let item = load_file(self.request.id_chain, &self.request.path, &self.resolved);
            self.reply.post(item);
        }

        fn fail(self, error: ResourceError) {
            tracing::error!(id = %self.request.id_chain, "{error}");
            self.reply.post(MailboxItem::Failed {
                id_chain: self.request.id_chain,
                error,
            });
        }
    }

    impl ThreadedImageLoader {
        /// Creates a loader that uses paths as given.
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// Creates a loader resolving relative paths against `root`.
        #[must_use]
        pub fn with_root(root: impl Into<PathBuf>) -> Self {
            Self {
                root: Some(root.into()),
                worker: None,
            }
        }

        fn resolve(&self, path: &str) -> PathBuf {
            match &self.root {
                Some(root) => root.join(path),
                None => PathBuf::from(path),
            }
        }

        fn worker(&mut self) -> Result<&Sender<Job>, ResourceError> {
            if self.worker.is_none() {
                let (tx, rx) = mpsc::channel::<Job>();
                thread::Builder::new()
                    .name("tether-image".into())
                    .spawn(move || {
                        for job in rx {
                            job.run();
                        }
                    })
                    .map_err(|e| ResourceError::Worker(e.to_string()))?;
                self.worker = Some(tx);
            }
            self.worker
                .as_ref()
                .ok_or_else(|| ResourceError::Worker("not started".into()))
        }
    }

    impl ImageLoader for ThreadedImageLoader {
        fn load(&mut self, request: ImageLoadPatch, reply: MailboxSender) {
            let resolved = self.resolve(&request.path);
            let mut job = Job {
                request,
                resolved,
                reply,
            };
            // A worker that died is replaced once before the request fails.
            for _ in 0..2 {
                let worker = match self.worker() {
                    Ok(worker) => worker,
                    Err(error) => {
                        job.fail(error);
                        return;
                    }
                };
                match worker.send(job) {
                    Ok(()) => return,
                    Err(mpsc::SendError(returned)) => {
                        self.worker = None;
                        job = returned;
                    }
                }
            }
            job.fail(ResourceError::Worker("worker exited".into()));
        }
    }

    fn load_file(id_chain: IdChain, path: &str, resolved: &std::path::Path) -> MailboxItem {
        let result = std::fs::read(resolved)
            .map_err(|e| ResourceError::Read {
                path: path.to_owned(),
                reason: e.to_string(),
            })
            .and_then(|bytes| decode_rgba8(&bytes, path));
        match result {
            Ok((pixels, width, height)) => MailboxItem::Decoded {
                id_chain,
                pixels,
                width,
                height,
            },
            Err(error) => MailboxItem::Failed { id_chain, error },
        }
    }

    #[cfg(test)]
    mod tests {
        use std::io::Cursor;
        use std::time::{Duration, Instant};

        use super::*;
        use crate::mailbox::Mailbox;

        fn wait_for(mailbox: &Mailbox) -> MailboxItem {
            let deadline = Instant::now() + Duration::from_secs(10);
            loop {
                if let Some(item) = mailbox.try_next() {
                    return item;
                }
                assert!(Instant::now() < deadline, "loader never replied");
                thread::sleep(Duration::from_millis(5));
            }
        }

        fn png_bytes() -> Vec<u8> {
            let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, image::ImageFormat::Png).unwrap();
            out.into_inner()
        }

        #[test]
        fn decodes_png_to_rgba8() {
            let (pixels, w, h) = decode_rgba8(&png_bytes(), "mem.png").unwrap();
            assert_eq!((w, h), (3, 2));
            assert_eq!(pixels.len(), 3 * 2 * 4);
            assert_eq!(&pixels[..4], &[10, 20, 30, 255]);
        }

        #[test]
        fn garbage_is_a_decode_error() {
            let err = decode_rgba8(b"not an image", "bad.png").unwrap_err();
            assert!(matches!(err, ResourceError::Decode { .. }));
        }

        #[test]
        fn threaded_loader_posts_decoded_pixels() {
            let dir = std::env::temp_dir().join(format!("tether-assets-{}", std::process::id()));
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("dot.png"), png_bytes()).unwrap();

            let mailbox = Mailbox::new();
            let mut loader = ThreadedImageLoader::with_root(&dir);
            loader.load(
                ImageLoadPatch {
                    id_chain: IdChain::from([4, 2]),
                    path: "dot.png".into(),
                },
                mailbox.sender(),
            );

            match wait_for(&mailbox) {
                MailboxItem::Decoded {
                    id_chain,
                    width,
                    height,
                    ..
                } => {
                    assert_eq!(id_chain, IdChain::from([4, 2]));
                    assert_eq!((width, height), (3, 2));
                }
                other => panic!("unexpected {other:?}"),
            }
            let _ = std::fs::remove_dir_all(&dir);
        }

        fn missing(id: u64) -> ImageLoadPatch {
            ImageLoadPatch {
                id_chain: IdChain::from([id]),
                path: format!("/definitely/not/here-{id}.png"),
            }
        }

        #[test]
        fn many_requests_share_one_worker_in_order() {
            let mailbox = Mailbox::new();
            let mut loader = ThreadedImageLoader::new();
            for id in 0..64 {
                loader.load(missing(id), mailbox.sender());
            }

            let replies: Vec<_> = (0..64).map(|_| wait_for(&mailbox)).collect();
            let ids: Vec<_> = replies.iter().map(|item| item.id_chain().clone()).collect();
            let expected: Vec<_> = (0..64).map(|id| IdChain::from([id])).collect();
            assert_eq!(ids, expected);
            assert!(mailbox.try_next().is_none());
        }

        #[test]
        fn dead_worker_is_replaced() {
            let (tx, rx) = mpsc::channel();
            drop(rx);
            let mailbox = Mailbox::new();
            let mut loader = ThreadedImageLoader {
                root: None,
                worker: Some(tx),
            };
            loader.load(missing(3), mailbox.sender());

            assert!(matches!(
                wait_for(&mailbox),
                MailboxItem::Failed {
                    error: ResourceError::Read { .. },
                    ..
                }
            ));
        }

        #[test]
        fn failed_job_still_replies() {
            let mailbox = Mailbox::new();
            Job {
                request: missing(5),
                resolved: PathBuf::from("unused.png"),
                reply: mailbox.sender(),
            }
            .fail(ResourceError::Worker("resource temporarily unavailable".into()));

            assert_eq!(
                mailbox.try_next(),
                Some(MailboxItem::Failed {
                    id_chain: IdChain::from([5]),
                    error: ResourceError::Worker("resource temporarily unavailable".into()),
                })
            );
        }

        #[test]
        fn missing_file_posts_failure() {
            let mailbox = Mailbox::new();
            let mut loader = ThreadedImageLoader::new();
            loader.load(
                ImageLoadPatch {
                    id_chain: IdChain::from([1]),
                    path: "/definitely/not/here.png".into(),
                },
                mailbox.sender(),
            );
            assert!(matches!(
                wait_for(&mailbox),
                MailboxItem::Failed {
                    error: ResourceError::Read { .. },
                    ..
                }
            ));
        }
    }
}
