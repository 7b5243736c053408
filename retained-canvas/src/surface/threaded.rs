//! Run any surface on a dedicated worker thread.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use futures::channel::{mpsc, oneshot};
use futures::StreamExt;

use super::{DrawCommand, Surface, SurfaceType};
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::Size;
use crate::image::Image;

/// Default number of queued commands before `is_full` reports true.
pub const DEFAULT_QUEUE_CAPACITY: usize = 4096;

enum SurfaceCommand {
    Submit(DrawCommand),
    Flush,
    Finish,
    Sync,
    Wait {
        responder: oneshot::Sender<CanvasResult<()>>,
    },
    Snapshot {
        responder: oneshot::Sender<Option<Image>>,
    },
}

/// Forwards commands to an inner surface executed on a worker thread.
///
/// `submit`, `flush`, `finish` and `sync` enqueue and return immediately;
/// `wait` blocks until the worker has executed everything queued before it.
/// The first error the inner surface reports is returned by the next `wait`.
pub struct ThreadedSurface {
    size: Size,
    surface_type: SurfaceType,
    sender: mpsc::UnboundedSender<SurfaceCommand>,
    pending: Arc<AtomicUsize>,
    capacity: usize,
    error: Arc<Mutex<Option<CanvasError>>>,
    handle: Option<JoinHandle<()>>,
}

impl fmt::Debug for ThreadedSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadedSurface")
            .field("size", &self.size)
            .field("pending", &self.pending.load(Ordering::Relaxed))
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl ThreadedSurface {
    pub fn new(inner: Arc<dyn Surface>) -> CanvasResult<Self> {
        Self::with_capacity(inner, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity(inner: Arc<dyn Surface>, capacity: usize) -> CanvasResult<Self> {
        let size = inner.size();
        let surface_type = inner.surface_type();
        let (sender, mut receiver) = mpsc::unbounded::<SurfaceCommand>();
        let pending = Arc::new(AtomicUsize::new(0));
        let error = Arc::new(Mutex::new(None));

        let worker_pending = Arc::clone(&pending);
        let worker_error = Arc::clone(&error);
        let handle = thread::Builder::new()
            .name("retained-canvas-surface".to_string())
            .spawn(move || {
                let record = |result: CanvasResult<()>| {
                    if let Err(err) = result {
                        log::warn!(target: "surface", "worker command failed: {err}");
                        let mut slot = worker_error.lock().unwrap_or_else(|e| e.into_inner());
                        slot.get_or_insert(err);
                    }
                };

                while let Some(cmd) = futures::executor::block_on(receiver.next()) {
                    match cmd {
                        SurfaceCommand::Submit(command) => {
                            record(inner.submit(command));
                            worker_pending.fetch_sub(1, Ordering::AcqRel);
                        }
                        SurfaceCommand::Flush => record(inner.flush()),
                        SurfaceCommand::Finish => record(inner.finish()),
                        SurfaceCommand::Sync => record(inner.sync()),
                        SurfaceCommand::Wait { responder } => {
                            let result = inner.wait().and_then(|_| {
                                let mut slot =
                                    worker_error.lock().unwrap_or_else(|e| e.into_inner());
                                match slot.take() {
                                    Some(err) => Err(err),
                                    None => Ok(()),
                                }
                            });
                            responder.send(result).ok();
                        }
                        SurfaceCommand::Snapshot { responder } => {
                            responder.send(inner.snapshot()).ok();
                        }
                    }
                }
                log::debug!(target: "surface", "worker exiting");
            })
            .map_err(|e| CanvasError::DriverError(format!("failed to spawn worker: {e}")))?;

        Ok(Self {
            size,
            surface_type,
            sender,
            pending,
            capacity,
            error,
            handle: Some(handle),
        })
    }

    fn send(&self, cmd: SurfaceCommand) -> CanvasResult<()> {
        self.sender
            .unbounded_send(cmd)
            .map_err(|_| CanvasError::DeviceLost)
    }

    /// Commands queued but not yet executed.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// The first worker error not yet reported by `wait`, without clearing it.
    pub fn last_error(&self) -> Option<CanvasError> {
        self.error
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Surface for ThreadedSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn surface_type(&self) -> SurfaceType {
        self.surface_type
    }

    fn is_full(&self) -> bool {
        self.pending() >= self.capacity
    }

    fn submit(&self, command: DrawCommand) -> CanvasResult<()> {
        self.pending.fetch_add(1, Ordering::AcqRel);
        self.send(SurfaceCommand::Submit(command)).inspect_err(|_| {
            self.pending.fetch_sub(1, Ordering::AcqRel);
        })
    }

    fn flush(&self) -> CanvasResult<()> {
        self.send(SurfaceCommand::Flush)
    }

    fn finish(&self) -> CanvasResult<()> {
        self.send(SurfaceCommand::Finish)
    }

    fn sync(&self) -> CanvasResult<()> {
        self.send(SurfaceCommand::Sync)
    }

    fn wait(&self) -> CanvasResult<()> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(SurfaceCommand::Wait { responder: resp_tx })?;
        match futures::executor::block_on(resp_rx) {
            Ok(result) => result,
            Err(_) => Err(CanvasError::DeviceLost),
        }
    }

    /// Blocks until every queued command has executed, then copies the pixels.
    fn snapshot(&self) -> Option<Image> {
        let (resp_tx, resp_rx) = oneshot::channel();
        self.send(SurfaceCommand::Snapshot { responder: resp_tx }).ok()?;
        futures::executor::block_on(resp_rx).ok().flatten()
    }
}

impl Drop for ThreadedSurface {
    fn drop(&mut self) {
        self.sender.close_channel();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::warn!(target: "surface", "surface worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Clip;
    use crate::geometry::Color;
    use crate::surface::recording::{RecordedEvent, RecordingSurface};
    use crate::surface::ClearCall;

    fn clear() -> DrawCommand {
        DrawCommand::Clear(ClearCall {
            color: Color::WHITE,
            rect: None,
            clip: Clip::unbounded(),
        })
    }

    #[test]
    fn test_wait_drains_queue_in_order() {
        let recording = Arc::new(RecordingSurface::new(Size::new(8.0, 8.0)));
        let threaded = ThreadedSurface::new(recording.clone()).unwrap();

        for _ in 0..10 {
            threaded.submit(clear()).unwrap();
        }
        threaded.flush().unwrap();
        threaded.wait().unwrap();

        assert_eq!(threaded.pending(), 0);
        let events = recording.events();
        assert_eq!(events.len(), 12);
        assert!(matches!(events[10], RecordedEvent::Flush));
        assert!(matches!(events[11], RecordedEvent::Wait));
    }

    #[test]
    fn test_worker_error_reported_by_wait() {
        let recording = Arc::new(RecordingSurface::with_capacity(Size::new(8.0, 8.0), 1));
        let threaded = ThreadedSurface::new(recording).unwrap();

        threaded.submit(clear()).unwrap();
        threaded.submit(clear()).unwrap();
        let err = threaded.wait().unwrap_err();
        assert!(matches!(err, CanvasError::InvalidOperation(_)));

        // Reported once.
        threaded.wait().unwrap();
    }

    #[test]
    fn test_size_forwarded() {
        let recording = Arc::new(RecordingSurface::new(Size::new(3.0, 4.0)));
        let threaded = ThreadedSurface::new(recording).unwrap();
        assert_eq!(threaded.size(), Size::new(3.0, 4.0));
        assert!(!threaded.is_full());
    }
}
