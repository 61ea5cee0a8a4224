use std::sync::{mpsc, Arc};

use crate::EngineEvent;

/// One reporting level of a multi-level progress display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressChannel {
    pub depth: usize,
    pub message: String,
    pub completed: u64,
    pub total: u64,
    pub visible: bool,
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<EngineEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Fixed-depth stack of progress channels.
///
/// Advancing depth `d` hides every channel deeper than `d`, so finer-grained
/// progress left over from a previous step never lingers. Each mutation is
/// pushed to the sink as a full snapshot.
pub struct ProgressTree {
    channels: Vec<ProgressChannel>,
    sink: Option<Arc<dyn ProgressSink>>,
}

impl ProgressTree {
    pub fn new(depths: usize) -> Self {
        let channels = (0..depths)
            .map(|depth| ProgressChannel {
                depth,
                message: String::new(),
                completed: 0,
                total: 0,
                visible: false,
            })
            .collect();
        Self {
            channels,
            sink: None,
        }
    }

    pub fn with_sink(depths: usize, sink: Arc<dyn ProgressSink>) -> Self {
        let mut tree = Self::new(depths);
        tree.sink = Some(sink);
        tree
    }

    pub fn depths(&self) -> usize {
        self.channels.len()
    }

    /// Shows `depth` with the given values and hides everything below it.
    ///
    /// # Panics
    /// When `depth` is outside the configured range.
    pub fn update(&mut self, depth: usize, message: impl Into<String>, completed: u64, total: u64) {
        self.check_depth(depth);
        let channel = &mut self.channels[depth];
        channel.message = message.into();
        channel.completed = completed;
        channel.total = total;
        channel.visible = true;
        self.hide_deeper_than(depth);
        self.publish();
    }

    /// # Panics
    /// When `depth` is outside the configured range.
    pub fn hide_below(&mut self, depth: usize) {
        self.check_depth(depth);
        self.hide_deeper_than(depth);
        self.publish();
    }

    pub fn channels(&self) -> &[ProgressChannel] {
        &self.channels
    }

    pub fn channel(&self, depth: usize) -> &ProgressChannel {
        self.check_depth(depth);
        &self.channels[depth]
    }

    pub fn visible_depths(&self) -> Vec<usize> {
        self.channels
            .iter()
            .filter(|channel| channel.visible)
            .map(|channel| channel.depth)
            .collect()
    }

    fn check_depth(&self, depth: usize) {
        assert!(
            depth < self.channels.len(),
            "progress depth {depth} out of range for a tree with {} levels",
            self.channels.len()
        );
    }

    fn hide_deeper_than(&mut self, depth: usize) {
        for channel in &mut self.channels[depth + 1..] {
            channel.visible = false;
        }
    }

    fn publish(&self) {
        if let Some(sink) = &self.sink {
            sink.emit(EngineEvent::Progress(self.channels.clone()));
        }
    }
}
