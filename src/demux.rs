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

//! Module for [`Demultiplexer`].

use crate::config::{AcquisitionConfig, ChannelId, CHANNEL_COUNT};
use crate::median_filter::MedianFilter;
use crate::record::{RecordIter, RECORD_BYTES};

/// Outcome of demultiplexing one read buffer.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DemuxSummary {
    /// Complete records walked, valid or not.
    pub records: usize,
    /// Records rejected in this call: unknown channel tag, or a truncated
    /// tail.
    pub rejected: u64,
}

/// One configured channel plus its own filter state.
#[derive(Debug)]
struct Lane {
    channel: ChannelId,
    filter: MedianFilter,
}

/// Classifies raw conversion records by channel tag and conditions each
/// channel's stream through its own [`MedianFilter`].
///
/// Records are processed strictly in delivered order, so each channel's
/// conditioned stream is sequential across read cycles. One corrupt record
/// never fails the surrounding read: unknown tags are counted and skipped,
/// leaving every lane's filter state untouched.
#[derive(Debug)]
pub struct Demultiplexer {
    lanes: [Lane; CHANNEL_COUNT],
    rejected_total: u64,
}

impl Demultiplexer {
    pub fn new(config: &AcquisitionConfig) -> Self {
        let channels = config.channels();
        Self {
            lanes: [
                Lane {
                    channel: channels[0].id,
                    filter: MedianFilter::new(),
                },
                Lane {
                    channel: channels[1].id,
                    filter: MedianFilter::new(),
                },
            ],
            rejected_total: 0,
        }
    }

    /// Cumulative count of rejected records since construction.
    pub const fn rejected_total(&self) -> u64 {
        self.rejected_total
    }

    /// Walks all complete records in `buf` in delivered order. Every record
    /// carrying a configured tag runs through that channel's filter and is
    /// handed to `emit` as `(lane, channel, conditioned_value)`.
    ///
    /// `buf` must span exactly the bytes the source reported valid. A length
    /// that is no multiple of [`RECORD_BYTES`] means the reported length and
    /// the record stream disagree; the dangling bytes count as one rejected
    /// record.
    pub fn process(
        &mut self,
        buf: &[u8],
        mut emit: impl FnMut(usize, ChannelId, u16),
    ) -> DemuxSummary {
        let mut summary = DemuxSummary::default();

        for record in RecordIter::new(buf) {
            summary.records += 1;
            let lane = self
                .lanes
                .iter()
                .position(|lane| lane.channel == record.channel);
            match lane {
                Some(lane) => {
                    let conditioned = self.lanes[lane].filter.filter(record.value);
                    emit(lane, record.channel, conditioned);
                }
                None => summary.rejected += 1,
            }
        }

        if buf.len() % RECORD_BYTES != 0 {
            summary.rejected += 1;
        }

        self.rejected_total += summary.rejected;
        summary
    }
}
