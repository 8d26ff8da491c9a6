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

//! Best-effort handoff of conditioned samples to external consumers
//! (UI, network collaborators).

use crate::config::ChannelId;
use thiserror::Error;

/// One conditioned sample leaving the pipeline.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FilteredSample {
    pub channel: ChannelId,
    pub value: u16,
}

/// The sink cannot accept a sample right now.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
#[error("sample sink full")]
pub struct SinkFull;

/// Bounded handoff consumed by a different task.
///
/// `try_send` must return immediately. Losing UI updates is acceptable;
/// stalling acquisition behind a slow consumer is not. Dropped samples are
/// counted by the pipeline, not by the sink.
pub trait SampleSink {
    fn try_send(&mut self, sample: FilteredSample) -> Result<(), SinkFull>;
}

/// Discards every sample. For setups that only need the diagnostics.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullSink;

impl SampleSink for NullSink {
    fn try_send(&mut self, _sample: FilteredSample) -> Result<(), SinkFull> {
        Ok(())
    }
}

#[cfg(feature = "std")]
impl SampleSink for std::sync::mpsc::SyncSender<FilteredSample> {
    /// Non-blocking send. Both a full queue and a hung-up consumer drop the
    /// sample; acquisition must not stall in either case.
    fn try_send(&mut self, sample: FilteredSample) -> Result<(), SinkFull> {
        std::sync::mpsc::SyncSender::try_send(self, sample).map_err(|_| SinkFull)
    }
}
