//! A surface that records what it is asked to do.

use std::sync::{Mutex, MutexGuard};

use super::{DrawCall, DrawCommand, Surface, SurfaceType};
use crate::error::{CanvasError, CanvasResult};
use crate::geometry::Size;

/// One call received by a [`RecordingSurface`].
#[derive(Debug, Clone)]
pub enum RecordedEvent {
    Command(DrawCommand),
    Flush,
    Finish,
    Sync,
    Wait,
}

/// Keeps every submitted command and completion request in order.
///
/// Useful for inspecting exactly what a canvas forwards, and as a display
/// list that can be replayed onto another surface.
#[derive(Debug)]
pub struct RecordingSurface {
    size: Size,
    events: Mutex<Vec<RecordedEvent>>,
    /// Pending command count at which `is_full` reports true.
    capacity: Option<usize>,
}

impl RecordingSurface {
    pub fn new(size: Size) -> Self {
        Self {
            size,
            events: Mutex::new(Vec::new()),
            capacity: None,
        }
    }

    /// Report full once `capacity` commands are pending since the last flush.
    pub fn with_capacity(size: Size, capacity: usize) -> Self {
        Self {
            capacity: Some(capacity),
            ..Self::new(size)
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<RecordedEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: RecordedEvent) {
        self.lock().push(event);
    }

    pub fn events(&self) -> Vec<RecordedEvent> {
        self.lock().clone()
    }

    pub fn commands(&self) -> Vec<DrawCommand> {
        self.lock()
            .iter()
            .filter_map(|e| match e {
                RecordedEvent::Command(cmd) => Some(cmd.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn draw_calls(&self) -> Vec<DrawCall> {
        self.commands()
            .into_iter()
            .filter_map(|cmd| match cmd {
                DrawCommand::Draw(call) => Some(call),
                _ => None,
            })
            .collect()
    }

    /// Commands submitted since the last flush, finish or sync.
    pub fn pending_count(&self) -> usize {
        self.lock()
            .iter()
            .rev()
            .take_while(|e| matches!(e, RecordedEvent::Command(_)))
            .count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Submit every recorded command to `target`, in order.
    pub fn replay(&self, target: &dyn Surface) -> CanvasResult<()> {
        for command in self.commands() {
            target.submit(command)?;
        }
        target.flush()
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> Size {
        self.size
    }

    fn surface_type(&self) -> SurfaceType {
        SurfaceType::Offscreen
    }

    fn is_full(&self) -> bool {
        self.capacity
            .is_some_and(|capacity| self.pending_count() >= capacity)
    }

    fn submit(&self, command: DrawCommand) -> CanvasResult<()> {
        if self.is_full() {
            return Err(CanvasError::InvalidOperation(
                "recording surface is full; flush before submitting more".to_string(),
            ));
        }
        log::trace!(target: "surface", "record {}", command.name());
        self.record(RecordedEvent::Command(command));
        Ok(())
    }

    fn flush(&self) -> CanvasResult<()> {
        self.record(RecordedEvent::Flush);
        Ok(())
    }

    fn finish(&self) -> CanvasResult<()> {
        self.record(RecordedEvent::Finish);
        Ok(())
    }

    fn sync(&self) -> CanvasResult<()> {
        self.record(RecordedEvent::Sync);
        Ok(())
    }

    fn wait(&self) -> CanvasResult<()> {
        self.record(RecordedEvent::Wait);
        Ok(())
    }
}
