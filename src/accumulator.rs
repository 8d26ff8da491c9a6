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

//! Per-cycle aggregation of conditioned samples.

use crate::config::CHANNEL_COUNT;

/// Running sum and count of conditioned samples for one channel, mutated
/// only by the acquisition task that owns it.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct ChannelAccumulator {
    sum: u64,
    count: u32,
}

impl ChannelAccumulator {
    pub const fn new() -> Self {
        Self { sum: 0, count: 0 }
    }

    #[inline]
    pub fn add(&mut self, value: u16) {
        self.sum += value as u64;
        self.count += 1;
    }

    pub const fn sum(&self) -> u64 {
        self.sum
    }

    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Integer mean of the accumulated values, `None` while empty.
    pub fn mean(&self) -> Option<u16> {
        if self.count == 0 {
            None
        } else {
            Some((self.sum / self.count as u64) as u16)
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// One accumulator per configured channel lane, reset at the start of every
/// read cycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleAccumulator {
    lanes: [ChannelAccumulator; CHANNEL_COUNT],
}

impl CycleAccumulator {
    pub const fn new() -> Self {
        Self {
            lanes: [ChannelAccumulator::new(); CHANNEL_COUNT],
        }
    }

    #[inline]
    pub fn add(&mut self, lane: usize, value: u16) {
        self.lanes[lane].add(value);
    }

    pub const fn lane(&self, lane: usize) -> &ChannelAccumulator {
        &self.lanes[lane]
    }

    pub fn counts(&self) -> [u32; CHANNEL_COUNT] {
        core::array::from_fn(|lane| self.lanes[lane].count())
    }

    pub fn means(&self) -> [Option<u16>; CHANNEL_COUNT] {
        core::array::from_fn(|lane| self.lanes[lane].mean())
    }

    pub fn reset(&mut self) {
        for lane in &mut self.lanes {
            lane.reset();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;

    #[test]
    fn accumulates_sum_and_count() {
        let mut acc = ChannelAccumulator::new();
        check!(acc.mean() == None);

        acc.add(10);
        acc.add(20);
        acc.add(31);
        check!(acc.sum() == 61);
        check!(acc.count() == 3);
        check!(acc.mean() == Some(20));

        acc.reset();
        check!(acc == ChannelAccumulator::new());
    }

    #[test]
    fn lanes_are_independent() {
        let mut cycle = CycleAccumulator::new();
        cycle.add(0, 100);
        cycle.add(0, 200);
        cycle.add(1, 7);

        check!(cycle.counts() == [2, 1]);
        check!(cycle.means() == [Some(150), Some(7)]);

        cycle.reset();
        check!(cycle.counts() == [0, 0]);
        check!(cycle.means() == [None, None]);
    }
}
