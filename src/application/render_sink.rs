// Render sink trait for chart consumers
use crate::domain::series::{DisplayPoint, SeriesKind};

pub trait RenderSink: Send {
    /// Called with the full, ordered display window of `kind` after it changed.
    fn notify(&mut self, kind: SeriesKind, snapshot: Vec<DisplayPoint>);
}
