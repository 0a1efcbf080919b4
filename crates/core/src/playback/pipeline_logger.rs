use std::collections::HashMap;
use std::time::Instant;

/// Observer for playback events: progress, per-stage timings and metrics.
///
/// Keeps the loop free of any particular output mechanism.
pub trait PipelineLogger {
    /// Report frame-level progress. `total` is 0 for streams of unknown length.
    fn progress(&mut self, current: usize, total: usize);

    /// Record how long a named stage took for one frame.
    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Record a point-in-time metric (e.g. detections per frame).
    fn metric(&mut self, name: &str, value: f64);

    /// Log a human-readable status message.
    fn info(&mut self, message: &str);

    /// Emit an end-of-playback summary. Default: no-op.
    fn summary(&self) {}
}

/// Silent logger that discards all events.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

/// Running totals for one timed stage.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub count: usize,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    fn record(&mut self, duration_ms: f64) {
        self.count += 1;
        self.total_ms += duration_ms;
        self.max_ms = self.max_ms.max(duration_ms);
    }

    pub fn avg_ms(&self) -> f64 {
        self.total_ms / self.count.max(1) as f64
    }
}

/// Running sum for one metric.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricStats {
    pub count: usize,
    pub sum: f64,
}

impl MetricStats {
    fn record(&mut self, value: f64) {
        self.count += 1;
        self.sum += value;
    }

    pub fn avg(&self) -> f64 {
        self.sum / self.count.max(1) as f64
    }
}

/// Logger for the command line: aggregates per-stage timing and metrics and
/// logs a summary at the end.
///
/// Only running totals are kept, so memory stays flat however long the
/// stream plays. Progress output is throttled to every `throttle_frames`
/// frames.
pub struct StdoutPipelineLogger {
    throttle_frames: usize,
    timings: HashMap<String, StageStats>,
    metrics: HashMap<String, MetricStats>,
    start_time: Instant,
    frames_seen: usize,
}

impl StdoutPipelineLogger {
    pub fn new(throttle_frames: usize) -> Self {
        Self {
            throttle_frames: throttle_frames.max(1),
            timings: HashMap::new(),
            metrics: HashMap::new(),
            start_time: Instant::now(),
            frames_seen: 0,
        }
    }

    /// Returns the formatted summary string, or `None` if no data recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.timings.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_ms = self.start_time.elapsed().as_secs_f64() * 1000.0;
        let frames = self.frames_seen;
        let mut lines = Vec::new();

        lines.push(format!(
            "Playback summary ({frames} frames, {:.1}s total):",
            elapsed_ms / 1000.0
        ));

        let mut stages: Vec<_> = self.timings.iter().collect();
        stages.sort_by(|a, b| a.0.cmp(b.0));
        for (stage, stats) in stages {
            lines.push(format!(
                "  {stage:10}: avg {:6.1}ms  max {:6.1}ms  total {:7.0}ms",
                stats.avg_ms(),
                stats.max_ms,
                stats.total_ms
            ));
        }

        let mut metrics: Vec<_> = self.metrics.iter().collect();
        metrics.sort_by(|a, b| a.0.cmp(b.0));
        for (name, stats) in metrics {
            lines.push(format!("  {name}: avg {:.1}", stats.avg()));
        }

        if frames > 0 && elapsed_ms > 0.0 {
            let fps = frames as f64 / (elapsed_ms / 1000.0);
            lines.push(format!("  Throughput: {fps:.1} fps"));
        }

        Some(lines.join("\n"))
    }

    pub fn timings_for(&self, stage: &str) -> Option<StageStats> {
        self.timings.get(stage).copied()
    }

    pub fn metrics_for(&self, name: &str) -> Option<MetricStats> {
        self.metrics.get(name).copied()
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.frames_seen = self.frames_seen.max(current);
        if current % self.throttle_frames != 0 && current != total {
            return;
        }
        if total > 0 {
            let pct = current as f64 / total as f64 * 100.0;
            log::info!("Playing: {current}/{total} frames ({pct:.1}%)");
        } else {
            log::info!("Playing: {current} frames");
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        // Stage names repeat every frame; only allocate a key the first time.
        match self.timings.get_mut(stage) {
            Some(stats) => stats.record(duration_ms),
            None => {
                let mut stats = StageStats::default();
                stats.record(duration_ms);
                self.timings.insert(stage.to_string(), stats);
            }
        }
    }

    fn metric(&mut self, name: &str, value: f64) {
        match self.metrics.get_mut(name) {
            Some(stats) => stats.record(value),
            None => {
                let mut stats = MetricStats::default();
                stats.record(value);
                self.metrics.insert(name.to_string(), stats);
            }
        }
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n\n{text}");
        }
    }
}
