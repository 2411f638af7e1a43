//! Progress coordination for a multi-file archive run.
//!
//! Byte-count events flow one way, from the worker doing the writing to
//! the caller-supplied sink. The tracker owns the only mutable state, so
//! no locking is involved, and the callback is invoked synchronously on
//! the worker context; it is expected to be cheap.

/// Caller-supplied progress sink.
pub type ProgressFn = Box<dyn FnMut(f32) + Send>;

/// Minimum number of processed bytes between two emitted samples, so one
/// huge file still yields updates without flooding the sink.
pub const DEFAULT_EMIT_INTERVAL: u64 = 256 * 1024;

/// Converts per-entry byte progress into a single monotonic fraction.
///
/// The total is fixed before the first byte is written (every input is
/// stat-ed up front), so each entry's contribution to overall progress is
/// stable for the whole run. Emitted values never leave [0, 1] and never
/// decrease; a successful run ends with exactly 1.0.
pub struct ProgressTracker {
    callback: ProgressFn,
    total: u64,
    processed: u64,
    emitted_at: u64,
    last_fraction: f32,
    interval: u64,
    completed: bool,
}

impl ProgressTracker {
    pub fn new(total: u64, callback: ProgressFn) -> Self {
        Self::with_interval(total, DEFAULT_EMIT_INTERVAL, callback)
    }

    pub fn with_interval(total: u64, interval: u64, callback: ProgressFn) -> Self {
        Self {
            callback,
            total,
            processed: 0,
            emitted_at: 0,
            last_fraction: 0.0,
            interval,
            completed: false,
        }
    }

    /// Record `bytes` more input bytes as processed, emitting a sample if
    /// the emit interval has elapsed.
    pub fn add(&mut self, bytes: u64) {
        self.processed += bytes;
        if self.processed - self.emitted_at >= self.interval {
            self.emit();
        }
    }

    /// Force a sample out, used at every entry boundary.
    pub fn checkpoint(&mut self) {
        self.emit();
    }

    /// Emit the final 1.0 sample. Called exactly once, on success only.
    pub fn complete(&mut self) {
        if !self.completed {
            self.completed = true;
            self.last_fraction = 1.0;
            (self.callback)(1.0);
        }
    }

    fn emit(&mut self) {
        self.emitted_at = self.processed;
        let fraction = if self.total == 0 {
            // All-empty inputs: nothing to count, complete() reports 1.0.
            0.0
        } else {
            ((self.processed as f64 / self.total as f64) as f32).min(1.0)
        };
        // Monotonicity guard: a stat-race can shrink the effective total,
        // but emitted samples never go backwards. Entry-boundary
        // checkpoints coalesce with the previous sample when the fraction
        // has not advanced (e.g. an empty entry), so the sink only ever
        // sees strictly increasing values until the final 1.0.
        if fraction > self.last_fraction {
            self.last_fraction = fraction;
            (self.callback)(fraction);
        }
    }
}
