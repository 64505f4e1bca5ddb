use std::time::{Duration, Instant};

/// Number of lap samples retained for on-screen instrumentation.
const MAX_SAMPLES: usize = 120;

/// Lap timer used by the compositor HUD.
///
/// A lap is normally bracketed by [`start`](Stopwatch::start) /
/// [`stop`](Stopwatch::stop) on the measuring thread. When the measurement
/// happened somewhere else (the UI thread times layer-tree construction and
/// ships the result with the tree), the caller injects it with
/// [`set_lap_time`](Stopwatch::set_lap_time).
#[derive(Debug)]
pub struct Stopwatch {
    start: Instant,
    laps: Vec<Duration>,
    current_sample: usize,
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}

impl Stopwatch {
    /// Create a stopwatch with an empty lap history.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            laps: vec![Duration::ZERO; 1],
            current_sample: 0,
        }
    }

    /// The most recently completed lap.
    pub fn last_lap(&self) -> Duration {
        let prev = (self.current_sample + self.laps.len() - 1) % self.laps.len();
        self.laps[prev]
    }

    /// Time elapsed in the lap currently being measured.
    pub fn current_lap(&self) -> Duration {
        self.start.elapsed()
    }

    /// Longest lap in the retained history.
    pub fn max_lap(&self) -> Duration {
        self.laps.iter().copied().max().unwrap_or(Duration::ZERO)
    }

    /// Begin a new lap.
    pub fn start(&mut self) {
        self.start = Instant::now();
    }

    /// End the current lap and record its duration.
    pub fn stop(&mut self) {
        self.record(self.start.elapsed());
    }

    /// Record an externally measured lap without starting the timer.
    pub fn set_lap_time(&mut self, lap: Duration) {
        self.record(lap);
    }

    fn record(&mut self, lap: Duration) {
        let i = self.current_sample % self.laps.len();
        self.laps[i] = lap;
        self.current_sample = (self.current_sample + 1) % MAX_SAMPLES;
        if self.current_sample >= self.laps.len() && self.laps.len() < MAX_SAMPLES {
            self.laps.push(Duration::ZERO);
        }
    }
}

/// Monotonic event counter for on-screen instrumentation.
#[derive(Debug, Default)]
pub struct Counter {
    count: usize,
}

impl Counter {
    /// Create a counter at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current count.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Reset the counter to `count`.
    pub fn reset(&mut self, count: usize) {
        self.count = count;
    }

    /// Add `n` to the counter.
    pub fn increment(&mut self, n: usize) {
        self.count += n;
    }
}
