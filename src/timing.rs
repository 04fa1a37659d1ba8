//! Per-phase wall-clock instrumentation for convolution kernels.
//!
//! A [`PhaseTimers`] registry holds one accumulator per [`Phase`]. Kernels
//! bracket a sub-step with [`PhaseTimers::start`] and [`PhaseTimers::update`];
//! the orchestrator resets the registry before each convolution and renders the
//! accumulated values as a CSV row afterwards.
//!
//! Phases are independent. Nesting one inside another (for example
//! `ConvTiling` inside `TotalConv`) yields overlapping intervals that are
//! accumulated separately; nothing is subtracted or derived between phases.

use log::warn;
use std::fmt::Write as _;
use std::time::Instant;

/// Number of instrumented phases.
pub const PHASE_COUNT: usize = 8;

/// A named sub-interval of a convolution invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Whole kernel call, timed by the orchestrator.
    TotalOperation,
    /// Whole convolution body, timed by the kernel itself.
    TotalConv,
    PreconvPacking,
    ConvTiling,
    ConvPacking,
    ConvMicrokernel,
    ConvUnpacking,
    PostconvUnpacking,
}

impl Phase {
    /// All phases in CSV column order.
    pub const ALL: [Phase; PHASE_COUNT] = [
        Phase::TotalOperation,
        Phase::TotalConv,
        Phase::PreconvPacking,
        Phase::ConvTiling,
        Phase::ConvPacking,
        Phase::ConvMicrokernel,
        Phase::ConvUnpacking,
        Phase::PostconvUnpacking,
    ];

    /// Column prefix used in the CSV header.
    pub fn name(self) -> &'static str {
        match self {
            Phase::TotalOperation => "total_operation",
            Phase::TotalConv => "total_conv",
            Phase::PreconvPacking => "preconv_packing",
            Phase::ConvTiling => "conv_tiling",
            Phase::ConvPacking => "conv_packing",
            Phase::ConvMicrokernel => "conv_microkernel",
            Phase::ConvUnpacking => "conv_unpacking",
            Phase::PostconvUnpacking => "postconv_unpacking",
        }
    }

    #[inline(always)]
    fn index(self) -> usize {
        self as usize
    }
}

/// Accumulated duration and invocation count of a single phase.
#[derive(Debug, Clone, Default)]
pub struct PhaseTimer {
    elapsed_us: f64,
    count: u64,
    started_at: Option<Instant>,
}

impl PhaseTimer {
    #[inline]
    fn start(&mut self) {
        self.started_at = Some(Instant::now());
    }

    /// Returns false when the phase was idle and nothing was recorded.
    #[inline]
    fn update(&mut self, count: bool) -> bool {
        let Some(started_at) = self.started_at.take() else {
            return false;
        };
        self.elapsed_us += started_at.elapsed().as_secs_f64() * 1_000_000.0;
        if count {
            self.count += 1;
        }
        true
    }

    fn reset(&mut self) {
        *self = PhaseTimer::default();
    }

    /// Cumulative duration in microseconds.
    pub fn elapsed_us(&self) -> f64 {
        self.elapsed_us
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn is_running(&self) -> bool {
        self.started_at.is_some()
    }
}

/// Read-only copy of one phase's accumulated values.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PhaseReading {
    pub elapsed_us: f64,
    pub count: u64,
}

/// Values of every phase captured at one point in time, in column order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimingSnapshot {
    readings: [PhaseReading; PHASE_COUNT],
}

impl TimingSnapshot {
    pub fn get(&self, phase: Phase) -> PhaseReading {
        self.readings[phase.index()]
    }

    /// Renders the 16 values as one CSV row (no trailing newline).
    pub fn render_row(&self) -> String {
        let mut row = String::with_capacity(PHASE_COUNT * 16);
        for (i, reading) in self.readings.iter().enumerate() {
            if i > 0 {
                row.push(',');
            }
            // Writing into a String cannot fail.
            let _ = write!(row, "{:.5},{}", reading.elapsed_us, reading.count);
        }
        row
    }
}

/// Registry of phase timers driven by kernels and read by the orchestrator.
#[derive(Debug, Clone)]
pub struct PhaseTimers {
    timers: [PhaseTimer; PHASE_COUNT],
    enabled: bool,
}

impl Default for PhaseTimers {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTimers {
    /// Creates an enabled registry with every phase zeroed.
    pub fn new() -> Self {
        Self::with_enabled(true)
    }

    /// Creates a registry whose `start`/`update` calls record nothing.
    pub fn disabled() -> Self {
        Self::with_enabled(false)
    }

    pub fn with_enabled(enabled: bool) -> Self {
        Self {
            timers: Default::default(),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Records the current monotonic timestamp for `phase`.
    ///
    /// Starting a phase that is already running restarts its interval.
    #[inline]
    pub fn start(&mut self, phase: Phase) {
        if self.enabled {
            self.timers[phase.index()].start();
        }
    }

    /// Adds the time elapsed since the matching [`start`](Self::start) to
    /// `phase` and, when `count` is true, increments its invocation count.
    ///
    /// Updating an idle phase records nothing.
    #[inline]
    pub fn update(&mut self, phase: Phase, count: bool) {
        if self.enabled && !self.timers[phase.index()].update(count) {
            warn!("phase '{}' updated without a matching start", phase.name());
        }
    }

    /// Times `f` as one counted invocation of `phase`.
    #[inline]
    pub fn time<R, F>(&mut self, phase: Phase, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.start(phase);
        let result = f();
        self.update(phase, true);
        result
    }

    /// Zeroes every phase's duration and count and drops running intervals.
    pub fn reset(&mut self) {
        for timer in self.timers.iter_mut() {
            timer.reset();
        }
    }

    pub fn timer(&self, phase: Phase) -> &PhaseTimer {
        &self.timers[phase.index()]
    }

    pub fn reading(&self, phase: Phase) -> PhaseReading {
        let timer = self.timer(phase);
        PhaseReading {
            elapsed_us: timer.elapsed_us,
            count: timer.count,
        }
    }

    pub fn snapshot(&self) -> TimingSnapshot {
        let mut readings = [PhaseReading::default(); PHASE_COUNT];
        for phase in Phase::ALL {
            readings[phase.index()] = self.reading(phase);
        }
        TimingSnapshot { readings }
    }

    /// CSV header: `<phase>(us),<phase>(count)` for every phase (no trailing newline).
    pub fn render_header() -> String {
        Phase::ALL
            .iter()
            .map(|phase| format!("{0}(us),{0}(count)", phase.name()))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Current values as one CSV row matching [`render_header`](Self::render_header).
    pub fn render_row(&self) -> String {
        self.snapshot().render_row()
    }
}
