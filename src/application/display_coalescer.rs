// Display coalescer - Turns bursts of accepted points into one redraw per chart
use crate::application::render_sink::RenderSink;
use crate::application::series_store::SeriesStore;
use crate::domain::series::{DisplayPoint, SeriesKind};

pub const DEFAULT_COALESCE_BUFFER: usize = 10;

/// Buffers accepted points and notifies the render sink once the buffer fills.
///
/// Points are already committed to the store when they arrive here; only the
/// render notification is deferred.
#[derive(Debug, Clone)]
pub struct DisplayCoalescer {
    pending: Vec<(SeriesKind, DisplayPoint)>,
    buffer_size: usize,
    flushes: u64,
}

impl DisplayCoalescer {
    pub fn new(buffer_size: usize) -> Self {
        let buffer_size = buffer_size.max(1);
        Self {
            pending: Vec::with_capacity(buffer_size),
            buffer_size,
            flushes: 0,
        }
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn flushes(&self) -> u64 {
        self.flushes
    }

    /// Record an accepted point. Returns the number of notifications sent.
    pub fn push(
        &mut self,
        kind: SeriesKind,
        point: DisplayPoint,
        store: &SeriesStore,
        sink: &mut dyn RenderSink,
    ) -> usize {
        self.pending.push((kind, point));
        if self.pending.len() >= self.buffer_size {
            self.flush_pending(store, sink)
        } else {
            0
        }
    }

    /// Notify every chart touched by the buffered points, once each, then clear.
    pub fn flush_pending(&mut self, store: &SeriesStore, sink: &mut dyn RenderSink) -> usize {
        if self.pending.is_empty() {
            return 0;
        }

        let mut touched: Vec<SeriesKind> = Vec::with_capacity(SeriesKind::ALL.len());
        for (kind, _) in &self.pending {
            if !touched.contains(kind) {
                touched.push(*kind);
            }
        }

        for kind in &touched {
            sink.notify(*kind, store.window_snapshot(*kind));
        }

        tracing::debug!(
            "Flushed {} buffered points into {} chart notifications",
            self.pending.len(),
            touched.len()
        );

        self.pending.clear();
        self.flushes += 1;
        touched.len()
    }
}

impl Default for DisplayCoalescer {
    fn default() -> Self {
        Self::new(DEFAULT_COALESCE_BUFFER)
    }
}
