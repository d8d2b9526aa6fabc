use std::collections::BTreeMap;
use std::time::Instant;

/// Receives progress and timing events from a sort run.
pub trait PipelineLogger: Send {
    /// `current` images of `total` have been scanned.
    fn progress(&mut self, current: usize, total: usize);

    fn timing(&mut self, stage: &str, duration_ms: f64);

    /// Point-in-time value such as faces per image or group count.
    fn metric(&mut self, name: &str, value: f64);

    fn info(&mut self, message: &str);

    /// Called once when the run completes.
    fn summary(&self) {}
}

/// Discards every event.
pub struct NullPipelineLogger;

impl PipelineLogger for NullPipelineLogger {
    fn progress(&mut self, _current: usize, _total: usize) {}
    fn timing(&mut self, _stage: &str, _duration_ms: f64) {}
    fn metric(&mut self, _name: &str, _value: f64) {}
    fn info(&mut self, _message: &str) {}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StageStats {
    pub calls: usize,
    pub total_ms: f64,
    pub max_ms: f64,
}

impl StageStats {
    fn record(&mut self, duration_ms: f64) {
        self.calls += 1;
        self.total_ms += duration_ms;
        self.max_ms = self.max_ms.max(duration_ms);
    }

    pub fn mean_ms(&self) -> f64 {
        if self.calls == 0 {
            0.0
        } else {
            self.total_ms / self.calls as f64
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MetricStats {
    pub samples: usize,
    pub last: f64,
    pub sum: f64,
    pub peak: f64,
}

impl MetricStats {
    fn record(&mut self, value: f64) {
        self.peak = if self.samples == 0 { value } else { self.peak.max(value) };
        self.samples += 1;
        self.last = value;
        self.sum += value;
    }
}

/// Terminal logger for `facesort sort`. Scan progress is throttled; stage
/// timings are folded into an end-of-run summary.
pub struct StdoutPipelineLogger {
    progress_every: Option<usize>,
    stages: BTreeMap<String, StageStats>,
    metrics: BTreeMap<String, MetricStats>,
    started: Instant,
    images_total: usize,
    messages: Vec<String>,
}

impl StdoutPipelineLogger {
    /// Logs scan progress every `progress_every` images and on the last one.
    pub fn new(progress_every: usize) -> Self {
        Self {
            progress_every: Some(progress_every.max(1)),
            stages: BTreeMap::new(),
            metrics: BTreeMap::new(),
            started: Instant::now(),
            images_total: 0,
            messages: Vec::new(),
        }
    }

    /// Tracks the image total but leaves progress display to the caller's
    /// progress callback.
    pub fn without_progress(mut self) -> Self {
        self.progress_every = None;
        self
    }

    fn reports_progress_at(&self, current: usize, total: usize) -> bool {
        match self.progress_every {
            Some(every) => total > 0 && (current % every == 0 || current == total),
            None => false,
        }
    }

    pub fn stage(&self, name: &str) -> Option<&StageStats> {
        self.stages.get(name)
    }

    pub fn metric_stats(&self, name: &str) -> Option<&MetricStats> {
        self.metrics.get(name)
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// `None` until a stage or metric has been recorded.
    pub fn summary_string(&self) -> Option<String> {
        if self.stages.is_empty() && self.metrics.is_empty() {
            return None;
        }

        let elapsed_s = self.started.elapsed().as_secs_f64();
        let mut out = format!(
            "Sort summary ({} images, {elapsed_s:.1}s total):",
            self.images_total
        );

        for (name, stage) in &self.stages {
            out.push_str(&format!(
                "\n  {name:12} {:>6} calls  mean {:7.1}ms  max {:7.1}ms  total {:8.0}ms",
                stage.calls,
                stage.mean_ms(),
                stage.max_ms,
                stage.total_ms
            ));
        }

        for (name, metric) in &self.metrics {
            if metric.samples > 1 {
                out.push_str(&format!(
                    "\n  {name}: {} (mean {:.2}, max {})",
                    metric.last,
                    metric.sum / metric.samples as f64,
                    metric.peak
                ));
            } else {
                out.push_str(&format!("\n  {name}: {}", metric.last));
            }
        }

        if self.images_total > 0 && elapsed_s > 0.0 {
            out.push_str(&format!(
                "\n  Throughput: {:.1} images/s",
                self.images_total as f64 / elapsed_s
            ));
        }

        Some(out)
    }
}

impl Default for StdoutPipelineLogger {
    fn default() -> Self {
        Self::new(10)
    }
}

impl PipelineLogger for StdoutPipelineLogger {
    fn progress(&mut self, current: usize, total: usize) {
        self.images_total = total;
        if self.reports_progress_at(current, total) {
            log::info!(
                "Scanned {current}/{total} images ({:.0}%)",
                current as f64 / total as f64 * 100.0
            );
        }
    }

    fn timing(&mut self, stage: &str, duration_ms: f64) {
        self.stages
            .entry(stage.to_string())
            .or_default()
            .record(duration_ms);
    }

    fn metric(&mut self, name: &str, value: f64) {
        self.metrics.entry(name.to_string()).or_default().record(value);
    }

    fn info(&mut self, message: &str) {
        log::info!("{message}");
        self.messages.push(message.to_string());
    }

    fn summary(&self) {
        if let Some(text) = self.summary_string() {
            log::info!("\n{text}");
        }
    }
}
