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

//! Module for [`AcquisitionTask`], the single owner of the whole pipeline.

use crate::accumulator::CycleAccumulator;
use crate::config::AcquisitionConfig;
use crate::demux::Demultiplexer;
use crate::reporter::{CycleReport, MonotonicClock, Reporter, WindowSummary};
use crate::sink::{FilteredSample, SampleSink};
use crate::source::{ReadError, SampleSource, FRAME_BYTES};
use core::time::Duration;

/// Upper bound for one blocking read. This bounds worst-case loop latency;
/// it is not a cancellation mechanism.
pub const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Cumulative diagnostic counters, split by failure class so the diagnostics
/// show *which* class is occurring.
///
/// None of these classes ever halts the task; they surface solely through
/// the reporting cadences.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Records processed since start.
    pub records: u64,
    /// Records with an unrecognized channel tag, or truncated tails.
    pub demux_errors: u64,
    /// Transient driver-busy reads.
    pub busy_retries: u64,
    /// Reads that saw no frame within [`READ_TIMEOUT`].
    pub read_timeouts: u64,
    /// Conditioned samples dropped because the sink was full.
    pub sink_drops: u64,
}

/// What one call to [`AcquisitionTask::run_cycle`] did.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// A frame was drained and processed end to end.
    Processed {
        /// Records handled this cycle.
        records: usize,
        /// Present when this cycle closed a reporting window.
        window: Option<WindowSummary>,
    },
    /// The driver could not serve the read. Yield one scheduler tick, then
    /// retry.
    Busy,
    /// No frame within [`READ_TIMEOUT`]. Safe to retry immediately.
    TimedOut,
}

/// Owns the acquisition pipeline end to end: the sample source, one median
/// filter per channel, per-cycle aggregation, the split diagnostic counters
/// and the outbound sample sink.
///
/// The task is driven by calling [`Self::run_cycle`] in a tight loop from a
/// single dedicated thread; there is no parallelism inside. The only
/// suspension point is the source's blocking read. The loop has no terminal
/// state: every failure class is either fatal at construction time (and then
/// the task never exists) or transient and counted.
#[derive(Debug)]
pub struct AcquisitionTask<S, K, C> {
    source: S,
    sink: K,
    clock: C,
    demux: Demultiplexer,
    cycle: CycleAccumulator,
    reporter: Reporter,
    stats: PipelineStats,
    buf: [u8; FRAME_BYTES],
    running: bool,
}

impl<S, K, C> AcquisitionTask<S, K, C>
where
    S: SampleSource,
    K: SampleSink,
    C: MonotonicClock,
{
    /// Builds the pipeline around an already configured source.
    ///
    /// Hardware resource allocation happens in the source's own constructor
    /// and is the fatal failure class; from here on, nothing is.
    pub fn new(config: &AcquisitionConfig, source: S, sink: K, clock: C) -> Self {
        let now = clock.now();
        Self {
            source,
            sink,
            clock,
            demux: Demultiplexer::new(config),
            cycle: CycleAccumulator::new(),
            reporter: Reporter::new(now),
            stats: PipelineStats::default(),
            buf: [0; FRAME_BYTES],
            running: false,
        }
    }

    /// Starts continuous conversion on the source.
    pub fn start(&mut self) {
        self.source.start();
        self.running = true;
        log::debug!("acquisition started");
    }

    /// Stops continuous conversion. The pipeline state (filters, counters)
    /// is kept; acquisition can be resumed with [`Self::start`].
    pub fn stop(&mut self) {
        self.source.stop();
        self.running = false;
        log::debug!("acquisition stopped");
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub const fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Aggregate of the most recent completed cycle.
    pub const fn last_cycle(&self) -> &CycleAccumulator {
        &self.cycle
    }

    /// Runs one pipeline iteration: drain a frame from the source,
    /// demultiplex and condition it, aggregate, hand each conditioned sample
    /// to the sink best-effort, and report on both cadences.
    ///
    /// Records within one read are processed in the order the hardware
    /// delivered them. The sink push never blocks; a full sink costs the
    /// sample and bumps a counter.
    pub fn run_cycle(&mut self) -> CycleOutcome {
        let filled = match self.source.read(&mut self.buf, READ_TIMEOUT) {
            Ok(filled) => filled,
            Err(ReadError::Busy) => {
                self.stats.busy_retries += 1;
                log::trace!("driver busy ({} total)", self.stats.busy_retries);
                return CycleOutcome::Busy;
            }
            Err(ReadError::TimedOut) => {
                self.stats.read_timeouts += 1;
                log::trace!("read timed out ({} total)", self.stats.read_timeouts);
                return CycleOutcome::TimedOut;
            }
        };

        self.cycle.reset();

        let cycle = &mut self.cycle;
        let sink = &mut self.sink;
        let stats = &mut self.stats;
        let summary = self.demux.process(&self.buf[..filled], |lane, channel, value| {
            cycle.add(lane, value);
            if sink.try_send(FilteredSample { channel, value }).is_err() {
                stats.sink_drops += 1;
            }
        });

        self.stats.records += summary.records as u64;
        self.stats.demux_errors += summary.rejected;

        let now = self.clock.now();
        let report = CycleReport {
            elapsed: self.reporter.cycle_elapsed(now),
            bytes: filled,
            records: summary.records,
            counts: self.cycle.counts(),
            means: self.cycle.means(),
            demux_errors: self.stats.demux_errors,
            busy_retries: self.stats.busy_retries,
            sink_drops: self.stats.sink_drops,
        };
        let window = self.reporter.on_cycle(now, &report);

        CycleOutcome::Processed {
            records: summary.records,
            window,
        }
    }
}
