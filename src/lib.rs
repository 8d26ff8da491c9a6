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

//! Acquisition core of a dual-channel continuity / resistance measurement
//! probe.
//!
//! The conversion hardware continuously samples two channels (the
//! measurement "current" channel and the range-selection "setup" channel)
//! into a double-buffered store, decoupled from consumer timing. A single
//! dedicated task drains that store, demultiplexes the packed record stream
//! by channel tag, conditions each channel through its own 3-tap running
//! median filter, aggregates per cycle and reports diagnostics on a dual
//! cadence: one line per read cycle, one cumulative summary per 100 ms.
//!
//! ```text
//! SampleSource ──frames──▶ AcquisitionTask
//!                            ├─ Demultiplexer ─▶ MedianFilter (per channel)
//!                            ├─ CycleAccumulator
//!                            ├─ Reporter (per cycle + per 100 ms)
//!                            └─ SampleSink (best-effort, never blocks)
//! ```
//!
//! A consumer task that stalls loses the oldest samples in the store; this
//! is a property of the device, surfaced through the diagnostic counters
//! rather than treated as an error. Conversely, a slow consumer of the
//! *output* never stalls acquisition: the sink handoff is strictly
//! non-blocking and drops are counted.
//!
//! The core is `no_std`-compatible and doesn't need `alloc`. The `std`
//! feature (on by default) adds [`stdlib::SimulatedProbe`], the threaded
//! runner [`stdlib::spawn_acquisition`] and the [`stdlib::StdClock`].
//!
//! # Example
//!
//! ```
//! use continuity_sampler::{
//!     AcquisitionConfig, Attenuation, BitWidth, ChannelConfig, ChannelId,
//!     ConversionRecord, Demultiplexer,
//! };
//!
//! let channel = |tag| ChannelId::new(tag).unwrap();
//! let config = AcquisitionConfig::new(
//!     [
//!         ChannelConfig {
//!             id: channel(0),
//!             attenuation: Attenuation::Db12,
//!             bit_width: BitWidth::Bits12,
//!         },
//!         ChannelConfig {
//!             id: channel(1),
//!             attenuation: Attenuation::Db12,
//!             bit_width: BitWidth::Bits12,
//!         },
//!     ],
//!     60_000,
//! )
//! .unwrap();
//!
//! // Three records as the hardware would deliver them.
//! let raw = [(0, 100), (1, 42), (0, 4095)]
//!     .map(|(tag, value)| {
//!         ConversionRecord {
//!             channel: channel(tag),
//!             attenuation: Attenuation::Db12,
//!             value,
//!         }
//!         .encode()
//!     })
//!     .concat();
//!
//! let mut demux = Demultiplexer::new(&config);
//! let mut conditioned = Vec::new();
//! let summary = demux.process(&raw, |_lane, channel, value| {
//!     conditioned.push((channel, value));
//! });
//! assert_eq!(summary.records, 3);
//! assert_eq!(conditioned.len(), 3);
//! ```

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

mod accumulator;
mod acquisition;
mod config;
mod demux;
mod median_filter;
mod record;
mod reporter;
mod sink;
mod source;

#[cfg(feature = "std")]
pub mod stdlib;

#[cfg(test)]
pub(crate) mod test_utils;

pub use accumulator::{ChannelAccumulator, CycleAccumulator};
pub use acquisition::{AcquisitionTask, CycleOutcome, PipelineStats, READ_TIMEOUT};
pub use config::{
    AcquisitionConfig, Attenuation, BitWidth, ChannelConfig, ChannelId, ConfigError,
    CHANNEL_COUNT, SAMPLE_RATE_MAX_HZ, SAMPLE_RATE_MIN_HZ,
};
pub use demux::{Demultiplexer, DemuxSummary};
pub use median_filter::MedianFilter;
pub use record::{ConversionRecord, RecordIter, RECORD_BYTES, SAMPLE_MAX};
pub use reporter::{
    CycleReport, MonotonicClock, Reporter, WindowSummary, REPORT_WINDOW,
};
pub use sink::{FilteredSample, NullSink, SampleSink, SinkFull};
pub use source::{
    ReadError, SampleSource, FRAME_BYTES, RECORDS_PER_FRAME, STORE_BYTES,
};
