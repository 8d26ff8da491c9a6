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

//! Module for [`SimulatedProbe`], a software stand-in for the conversion
//! hardware.

use crate::config::{AcquisitionConfig, Attenuation, ChannelId, CHANNEL_COUNT};
use crate::record::{ConversionRecord, RECORD_BYTES};
use crate::source::{ReadError, SampleSource, FRAME_BYTES, RECORDS_PER_FRAME, STORE_BYTES};
use core::time::Duration;
use ringbuffer::{ConstGenericRingBuffer, RingBuffer};
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Every this many records, the measurement lane takes a full-scale spike,
/// the impulse noise the median filter exists for.
const SPIKE_EVERY: u64 = 97;

/// Every this many records, a record carries an unconfigured channel tag,
/// like a glitched conversion on the real bus.
const CORRUPT_EVERY: u64 = 1013;

#[derive(Debug)]
struct Store {
    buf: ConstGenericRingBuffer<u8, STORE_BYTES>,
    overflow_records: u64,
}

#[derive(Debug)]
struct Shared {
    store: Mutex<Store>,
    available: Condvar,
    running: AtomicBool,
    alive: AtomicBool,
}

/// Emulation of the continuous conversion hardware: a producer thread
/// synthesizes packed dual-channel frames at the configured aggregate rate
/// and writes them into a bounded store, overwriting the oldest records when
/// the consumer stalls, exactly the loss behavior the real DMA engine has.
///
/// The producer thread plays the role of the DMA engine and is the only
/// writer; the acquisition task is the only reader. The store is never
/// written while a read drains it (the lock spans the whole drain).
#[derive(Debug)]
pub struct SimulatedProbe {
    shared: Arc<Shared>,
    producer: Option<JoinHandle<()>>,
}

impl SimulatedProbe {
    /// Allocates the store and spawns the producer thread (paused until
    /// [`SampleSource::start`]). A spawn failure is the fatal
    /// resource-allocation class: abort startup.
    pub fn new(config: &AcquisitionConfig) -> io::Result<Self> {
        let shared = Arc::new(Shared {
            store: Mutex::new(Store {
                buf: ConstGenericRingBuffer::new(),
                overflow_records: 0,
            }),
            available: Condvar::new(),
            running: AtomicBool::new(false),
            alive: AtomicBool::new(true),
        });

        let frame_period = Duration::from_micros(
            RECORDS_PER_FRAME as u64 * 1_000_000 / config.sample_rate_hz() as u64,
        );
        let mut synth = FrameSynth::new(config);

        let producer = thread::Builder::new().name("adc-dma".into()).spawn({
            let shared = Arc::clone(&shared);
            move || producer_loop(&shared, &mut synth, frame_period)
        })?;

        Ok(Self {
            shared,
            producer: Some(producer),
        })
    }

    /// Conversion records lost to store overflow so far.
    pub fn overflow_records(&self) -> u64 {
        self.shared
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .overflow_records
    }
}

impl SampleSource for SimulatedProbe {
    fn start(&mut self) {
        self.shared.running.store(true, Ordering::SeqCst);
    }

    fn stop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize, ReadError> {
        let running = &self.shared.running;
        let store = self
            .shared
            .store
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let (mut store, wait) = self
            .shared
            .available
            .wait_timeout_while(store, timeout, |store| {
                store.buf.len() < RECORD_BYTES && running.load(Ordering::SeqCst)
            })
            .unwrap_or_else(PoisonError::into_inner);

        if store.buf.len() < RECORD_BYTES {
            return Err(if wait.timed_out() {
                ReadError::TimedOut
            } else {
                // Not running and nothing buffered.
                ReadError::Busy
            });
        }

        // Whole records only, so the stream stays aligned for the caller.
        let take = buf.len().min(store.buf.len());
        let take = take - take % RECORD_BYTES;
        let mut filled = 0;
        while filled < take {
            match store.buf.dequeue() {
                Some(byte) => {
                    buf[filled] = byte;
                    filled += 1;
                }
                None => break,
            }
        }
        Ok(filled)
    }
}

impl Drop for SimulatedProbe {
    fn drop(&mut self) {
        self.shared.alive.store(false, Ordering::SeqCst);
        if let Some(producer) = self.producer.take() {
            let _ = producer.join();
        }
    }
}

fn producer_loop(shared: &Shared, synth: &mut FrameSynth, frame_period: Duration) {
    while shared.alive.load(Ordering::SeqCst) {
        if !shared.running.load(Ordering::SeqCst) {
            thread::sleep(frame_period);
            continue;
        }

        let mut frame = [0; FRAME_BYTES];
        for record in frame.chunks_exact_mut(RECORD_BYTES) {
            record.copy_from_slice(&synth.next_word());
        }

        {
            let mut store = shared
                .store
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let free = STORE_BYTES - store.buf.len();
            if free < FRAME_BYTES {
                // The consumer stalled. The oldest records are overwritten,
                // silently from the consumer's point of view; only this
                // counter sees it. Whole records, to keep alignment.
                let mut deficit = FRAME_BYTES - free;
                deficit += (RECORD_BYTES - deficit % RECORD_BYTES) % RECORD_BYTES;
                for _ in 0..deficit {
                    store.buf.dequeue();
                }
                let lost = (deficit / RECORD_BYTES) as u64;
                store.overflow_records += lost;
                log::warn!(
                    "sample store overflow: {} records lost ({} total)",
                    lost,
                    store.overflow_records
                );
            }
            for &byte in frame.iter() {
                store.buf.push(byte);
            }
        }
        shared.available.notify_one();

        thread::sleep(frame_period);
    }
}

/// Synthesizes the conversion stream: both lanes in the hardware's
/// round-robin pattern order, a noisy plateau per lane, plus the occasional
/// spike and corrupt tag.
#[derive(Debug)]
struct FrameSynth {
    lanes: [SynthLane; CHANNEL_COUNT],
    tick: u64,
    lcg: u64,
}

#[derive(Debug)]
struct SynthLane {
    channel: ChannelId,
    attenuation: Attenuation,
    base: u16,
    max: u16,
}

impl FrameSynth {
    fn new(config: &AcquisitionConfig) -> Self {
        let channels = config.channels();
        // Plateaus for the measurement and setup lanes; arbitrary but
        // distinct, so the two streams are tellable apart in the demo.
        let bases = [2000, 800];
        Self {
            lanes: core::array::from_fn(|lane| SynthLane {
                channel: channels[lane].id,
                attenuation: channels[lane].attenuation,
                base: bases[lane].min(channels[lane].bit_width.max_value()),
                max: channels[lane].bit_width.max_value(),
            }),
            tick: 0,
            lcg: 0x243f_6a88_85a3_08d3,
        }
    }

    fn next_word(&mut self) -> [u8; RECORD_BYTES] {
        let tick = self.tick;
        self.tick += 1;

        let lane = &self.lanes[(tick % CHANNEL_COUNT as u64) as usize];
        let lane_channel = lane.channel;
        let lane_attenuation = lane.attenuation;
        let lane_base = lane.base;
        let lane_max = lane.max;

        if tick > 0 && tick % CORRUPT_EVERY == 0 {
            return ConversionRecord {
                channel: ChannelId::from_wire(0xe),
                attenuation: lane_attenuation,
                value: 0,
            }
            .encode();
        }

        let value = if tick > 0 && tick % SPIKE_EVERY == 0 {
            lane_max
        } else {
            let jitter = self.jitter();
            (lane_base as i32 + jitter).clamp(0, lane_max as i32) as u16
        };

        ConversionRecord {
            channel: lane_channel,
            attenuation: lane_attenuation,
            value,
        }
        .encode()
    }

    /// Small deterministic jitter in `-8..=8`.
    fn jitter(&mut self) -> i32 {
        self.lcg = self
            .lcg
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.lcg >> 33) % 17) as i32 - 8
    }
}
