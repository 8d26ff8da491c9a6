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

//! The hardware boundary of the acquisition pipeline.
//!
//! A [`SampleSource`] runs continuous hardware-triggered conversion on its
//! own (DMA/interrupt driven) and hands frames of packed conversion records
//! to the single consumer task through a blocking pull API. This handoff is
//! the one concurrent boundary of the design: the source fills one frame
//! while the consumer drains the other, and a consumer that stalls long
//! enough loses the oldest samples. That loss is an operating constraint of
//! the device, surfaced through diagnostic counters, not a failure.

use crate::record::RECORD_BYTES;
use core::time::Duration;
use thiserror::Error;

/// Conversion records per frame. A frame is the granularity at which the
/// hardware completes conversions and wakes the consumer.
pub const RECORDS_PER_FRAME: usize = 256;

/// Size in bytes of one conversion frame.
pub const FRAME_BYTES: usize = RECORDS_PER_FRAME * RECORD_BYTES;

/// Capacity in bytes of the driver-side sample store: two frames, so the
/// hardware can fill one while a read drains the other.
pub const STORE_BYTES: usize = FRAME_BYTES * 2;

/// Transient failure of [`SampleSource::read`]. Neither variant is fatal;
/// the acquisition loop counts the event and retries.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum ReadError {
    /// The conversion driver holds no complete frame and cannot serve the
    /// read right now. Retry after yielding one scheduler tick.
    #[error("conversion driver busy")]
    Busy,
    /// No frame became available within the timeout. The timeout only bounds
    /// worst-case loop latency; retrying immediately is safe.
    #[error("no conversion frame within timeout")]
    TimedOut,
}

/// Continuous conversion source for the two configured channels.
///
/// Implementations are configured at construction; resource allocation
/// failures there are fatal and must abort startup. `start`/`stop` merely
/// toggle conversion.
pub trait SampleSource {
    /// Starts continuous conversion.
    fn start(&mut self);

    /// Stops continuous conversion. Frames already captured remain readable.
    fn stop(&mut self);

    /// Blocks until at least one conversion frame is available or `timeout`
    /// expires, then drains up to `buf.len()` valid bytes into `buf`.
    ///
    /// Returns the number of valid bytes; the caller must not read past that
    /// count. Partial drains are legal, whole frames are typical.
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, ReadError>;
}
