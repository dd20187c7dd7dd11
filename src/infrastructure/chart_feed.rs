// Chart feed - Render sink publishing the latest frame per chart
use crate::application::render_sink::RenderSink;
use crate::domain::series::{DisplayPoint, SeriesKind};
use futures::stream::{self, BoxStream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub kind: SeriesKind,
    pub sequence: u64,
    pub points: Vec<DisplayPoint>,
}

impl ChartFrame {
    fn empty(kind: SeriesKind) -> Self {
        Self {
            kind,
            sequence: 0,
            points: Vec::new(),
        }
    }
}

/// One watch channel per chart: an unread frame is replaced by a newer one, so at
/// most one redraw is ever pending for a chart.
#[derive(Clone)]
pub struct ChartFeed {
    channels: Arc<[watch::Sender<ChartFrame>; 3]>,
}

impl ChartFeed {
    pub fn new() -> Self {
        let channels = std::array::from_fn(|i| watch::channel(ChartFrame::empty(SeriesKind::ALL[i])).0);
        Self {
            channels: Arc::new(channels),
        }
    }

    pub fn watch(&self, kind: SeriesKind) -> watch::Receiver<ChartFrame> {
        self.channels[kind.index()].subscribe()
    }

    /// Current frame of every chart, then each new frame as it is published.
    pub fn frames(&self) -> BoxStream<'static, ChartFrame> {
        stream::select_all(
            SeriesKind::ALL
                .iter()
                .map(|kind| WatchStream::new(self.watch(*kind))),
        )
        .boxed()
    }
}

impl Default for ChartFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSink for ChartFeed {
    fn notify(&mut self, kind: SeriesKind, snapshot: Vec<DisplayPoint>) {
        self.channels[kind.index()].send_modify(|frame| {
            frame.sequence += 1;
            frame.points = snapshot;
        });
    }
}
