use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use parking_lot::Mutex;
use vecprobe_engine::{ProgressMode, RunSummary, Snapshot};

pub mod reporter;
pub use reporter::ResultsReporter;

/// Receives per-query progress from the runner.
pub trait ProgressSink: Send {
    fn on_start(&mut self, _total: usize) {}

    /// Called after query `index` (0-based) has been folded into the stats.
    fn on_query(&mut self, index: usize, snapshot: &Snapshot);

    fn on_finish(&mut self, _summary: &RunSummary) {}
}

pub fn create_progress(mode: ProgressMode) -> Box<dyn ProgressSink> {
    match mode {
        ProgressMode::Lines => Box::new(LineProgress),
        ProgressMode::Bar => Box::new(BarProgress::default()),
        ProgressMode::Quiet => Box::new(QuietProgress),
    }
}

/// One `info!` line per query with running recall and throughput.
pub struct LineProgress;

impl ProgressSink for LineProgress {
    fn on_query(&mut self, index: usize, snapshot: &Snapshot) {
        tracing::info!(
            query = index,
            count = snapshot.count,
            recall = snapshot.recall,
            qps = snapshot.qps,
            "progress"
        );
    }
}

#[derive(Default)]
pub struct BarProgress {
    bar: Option<ProgressBar>,
}

impl ProgressSink for BarProgress {
    fn on_start(&mut self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}",
        ) {
            bar.set_style(style.progress_chars("#>-"));
        }
        self.bar = Some(bar);
    }

    fn on_query(&mut self, _index: usize, snapshot: &Snapshot) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("recall {:.4} qps {:.1}", snapshot.recall, snapshot.qps));
            bar.inc(1);
        }
    }

    fn on_finish(&mut self, _summary: &RunSummary) {
        if let Some(bar) = self.bar.take() {
            bar.finish_with_message("done");
        }
    }
}

pub struct QuietProgress;

impl ProgressSink for QuietProgress {
    fn on_query(&mut self, _index: usize, _snapshot: &Snapshot) {}
}

/// Keeps every update in memory; handy for embedding the runner.
#[derive(Clone, Default)]
pub struct RecordingProgress {
    updates: Arc<Mutex<Vec<(usize, Snapshot)>>>,
    total: Arc<Mutex<Option<usize>>>,
}

impl RecordingProgress {
    pub fn updates(&self) -> Vec<(usize, Snapshot)> {
        self.updates.lock().clone()
    }

    pub fn total(&self) -> Option<usize> {
        *self.total.lock()
    }
}

impl ProgressSink for RecordingProgress {
    fn on_start(&mut self, total: usize) {
        *self.total.lock() = Some(total);
    }

    fn on_query(&mut self, index: usize, snapshot: &Snapshot) {
        self.updates.lock().push((index, *snapshot));
    }
}
