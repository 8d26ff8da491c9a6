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

//! Module for [`MedianFilter`].

/// Number of taps of the sliding window.
const TAPS: usize = 3;

/// Fill counter value at which the window is primed.
const PRIMED: u8 = TAPS as u8;

/// Fill counter value at which the counter folds back to [`PRIMED`].
const FILL_WRAP: u8 = 2 * PRIMED;

/// 3-tap running median filter over one channel's raw sample stream.
///
/// This is an edge-preserving point filter that suppresses single-sample
/// spikes (impulse noise from the probe contacts) without the smearing a
/// moving average would introduce. It operates on the count of samples seen,
/// not on a time window.
///
/// While fewer than three samples have been consumed, the raw value passes
/// through unfiltered. From the third sample on, every output is the median
/// of exactly the three most recent raw values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MedianFilter {
    window: [u16; TAPS],
    fill: u8,
}

impl MedianFilter {
    pub const fn new() -> Self {
        Self {
            window: [0; TAPS],
            fill: 0,
        }
    }

    /// Consumes one raw sample and returns the conditioned output.
    #[inline]
    pub fn filter(&mut self, raw: u16) -> u16 {
        self.window[(self.fill % PRIMED) as usize] = raw;
        self.fill += 1;

        if self.fill < PRIMED {
            // Not primed yet: unfiltered passthrough.
            return raw;
        }

        let out = median3(self.window[0], self.window[1], self.window[2]);
        // Counter values PRIMED..FILL_WRAP index the window exactly like
        // 0..PRIMED, so folding back keeps the window phase intact while the
        // counter stays bounded.
        if self.fill >= FILL_WRAP {
            self.fill = PRIMED;
        }
        out
    }

    /// Whether the window holds three samples, i.e. outputs are medians.
    pub const fn is_primed(&self) -> bool {
        self.fill >= PRIMED
    }
}

/// Median of three values in O(1) via pairwise max/min comparison, no
/// sorting.
const fn median3(a: u16, b: u16, c: u16) -> u16 {
    if max(a, b) == max(b, c) {
        max(a, c)
    } else {
        max(b, min(a, c))
    }
}

// `Ord::max`/`Ord::min` are not const fns.
const fn max(a: u16, b: u16) -> u16 {
    if a > b {
        a
    } else {
        b
    }
}

const fn min(a: u16, b: u16) -> u16 {
    if a < b {
        a
    } else {
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::vec::Vec;

    /// Reference implementation with an unbounded fill counter, to pin down
    /// the wraparound arithmetic of the real filter.
    #[derive(Default)]
    struct UnboundedMedianFilter {
        window: [u16; TAPS],
        fill: u64,
    }

    impl UnboundedMedianFilter {
        fn filter(&mut self, raw: u16) -> u16 {
            self.window[(self.fill % TAPS as u64) as usize] = raw;
            self.fill += 1;
            if self.fill < TAPS as u64 {
                raw
            } else {
                median3(self.window[0], self.window[1], self.window[2])
            }
        }
    }

    #[test]
    fn median3_of_all_orderings() {
        for (a, b, c) in [
            (1, 2, 3),
            (1, 3, 2),
            (2, 1, 3),
            (2, 3, 1),
            (3, 1, 2),
            (3, 2, 1),
        ] {
            check!(median3(a, b, c) == 2);
        }
        check!(median3(5, 5, 1) == 5);
        check!(median3(7, 7, 7) == 7);
    }

    #[test]
    fn passes_through_while_priming() {
        let mut filter = MedianFilter::new();
        check!(!filter.is_primed());
        check!(filter.filter(4000) == 4000);
        check!(filter.filter(0) == 0);
        check!(!filter.is_primed());
    }

    #[test]
    fn outputs_median_of_last_three_once_primed() {
        let mut filter = MedianFilter::new();
        let input = [10, 20, 15, 12, 9];
        let output = input
            .iter()
            .map(|&raw| filter.filter(raw))
            .collect::<Vec<_>>();
        // First two pass through, then median(10,20,15), median(20,15,12),
        // median(15,12,9).
        check!(output == [10, 20, 15, 15, 12]);
        check!(filter.is_primed());
    }

    #[test]
    fn suppresses_single_sample_spike() {
        let mut filter = MedianFilter::new();
        for raw in [100, 100, 100] {
            filter.filter(raw);
        }
        check!(filter.filter(4095) == 100);
        check!(filter.filter(100) == 100);
    }

    #[test]
    fn wraparound_matches_unbounded_counter() {
        let mut rng = StdRng::seed_from_u64(0x1157);
        let input = (0..1000)
            .map(|_| rng.random_range(0..=0xfff))
            .collect::<Vec<u16>>();

        let mut filter = MedianFilter::new();
        let mut reference = UnboundedMedianFilter::default();
        for &raw in &input {
            assert_eq!(filter.filter(raw), reference.filter(raw));
        }
    }
}
