/*
MIT License

Copyright (c) 2024 Philipp Schuster

Permission is hereby granted, free of charge, to any person obtaining a copy
of this software and associated documentation files (the "Software"), to deal
in the Software without restriction, including without limitation the rights
to use, copy, modify, merge, publish, distribute, sublicense, and/or sell
copies of the Software, and to permit persons to whom the Software is
furnished to do so, subject to the following conditions:

The above copyright notice and this permission notice shall be included in all
copies or substantial portions of the Software.

THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,
FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE
AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER
LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,
OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE
SOFTWARE.
*/

//! Dual-cadence diagnostics: a line per read cycle plus a cumulative summary
//! per fixed wall-clock window.
//!
//! The two cadences track different counters and reset on different
//! triggers. Per-cycle state resets on every loop iteration; window counters
//! reset only when a [`REPORT_WINDOW`] has elapsed on the monotonic clock,
//! independent of how read cycles happen to align with that boundary.

use crate::config::CHANNEL_COUNT;
use core::time::Duration;

/// Monotonic time source driving the reporting cadences.
///
/// Only differences of returned values are meaningful; the origin is
/// arbitrary but fixed.
pub trait MonotonicClock {
    fn now(&self) -> Duration;
}

impl<T: MonotonicClock + ?Sized> MonotonicClock for &T {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Length of the cumulative reporting window.
pub const REPORT_WINDOW: Duration = Duration::from_millis(100);

/// Snapshot of one read cycle. Emitted on every loop iteration; read-only
/// once emitted.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CycleReport {
    /// Time since the previous cycle completed.
    pub elapsed: Duration,
    /// Bytes the source reported valid for this read.
    pub bytes: usize,
    /// Complete records walked this cycle, valid or not.
    pub records: usize,
    /// Conditioned samples per channel lane this cycle.
    pub counts: [u32; CHANNEL_COUNT],
    /// Mean conditioned value per channel lane this cycle.
    pub means: [Option<u16>; CHANNEL_COUNT],
    /// Cumulative count of records with an unrecognized channel tag.
    pub demux_errors: u64,
    /// Cumulative count of transient driver-busy reads.
    pub busy_retries: u64,
    /// Cumulative count of samples dropped at the sink boundary.
    pub sink_drops: u64,
}

/// Cumulative summary of one closed reporting window.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WindowSummary {
    /// Wall-clock length of the window that just closed. At least
    /// [`REPORT_WINDOW`]; longer when the loop stalled across the boundary.
    pub elapsed: Duration,
    /// Read cycles completed within the window.
    pub cycles: u32,
    /// Records processed within the window.
    pub records: u64,
    /// Cumulative unrecognized-record count at window close.
    pub demux_errors: u64,
    /// Cumulative driver-busy count at window close.
    pub busy_retries: u64,
    /// Cumulative sink-drop count at window close.
    pub sink_drops: u64,
}

impl WindowSummary {
    /// Throughput over the closed window.
    pub fn records_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            self.records as f64 / secs
        }
    }
}

/// Tracks both reporting cadences for the acquisition loop.
///
/// The window boundary is checked at cycle granularity: a loop that stalls
/// past the boundary stretches the window instead of emitting make-up
/// summaries, mirroring how the device behaves under load.
#[derive(Clone, Debug)]
pub struct Reporter {
    last_cycle_at: Duration,
    window_started_at: Duration,
    window_cycles: u32,
    window_records: u64,
}

impl Reporter {
    pub const fn new(now: Duration) -> Self {
        Self {
            last_cycle_at: now,
            window_started_at: now,
            window_cycles: 0,
            window_records: 0,
        }
    }

    /// Elapsed time since the previous cycle completed, advancing the
    /// per-cycle marker.
    pub fn cycle_elapsed(&mut self, now: Duration) -> Duration {
        let elapsed = now.saturating_sub(self.last_cycle_at);
        self.last_cycle_at = now;
        elapsed
    }

    /// Records one completed cycle: logs the per-cycle line and, when a full
    /// [`REPORT_WINDOW`] has elapsed, closes the window and returns its
    /// summary.
    pub fn on_cycle(&mut self, now: Duration, report: &CycleReport) -> Option<WindowSummary> {
        log::trace!(
            "cycle: elapsed {:?}; bytes {}; records {}; counts {:?}; means {:?}; err {}/{}/{}",
            report.elapsed,
            report.bytes,
            report.records,
            report.counts,
            report.means,
            report.demux_errors,
            report.busy_retries,
            report.sink_drops,
        );

        self.window_cycles += 1;
        self.window_records += report.records as u64;

        let elapsed = now.saturating_sub(self.window_started_at);
        if elapsed < REPORT_WINDOW {
            return None;
        }

        let summary = WindowSummary {
            elapsed,
            cycles: self.window_cycles,
            records: self.window_records,
            demux_errors: report.demux_errors,
            busy_retries: report.busy_retries,
            sink_drops: report.sink_drops,
        };
        log::debug!(
            "window: elapsed {:?}; cycles {}; records {}; err {}/{}/{}",
            summary.elapsed,
            summary.cycles,
            summary.records,
            summary.demux_errors,
            summary.busy_retries,
            summary.sink_drops,
        );

        self.window_started_at = now;
        self.window_cycles = 0;
        self.window_records = 0;
        Some(summary)
    }
}
