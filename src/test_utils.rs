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

//! Shared fixtures for the unit tests.

use crate::config::{
    AcquisitionConfig, Attenuation, BitWidth, ChannelConfig, ChannelId,
};
use crate::record::ConversionRecord;
use crate::reporter::MonotonicClock;
use crate::sink::{FilteredSample, SampleSink, SinkFull};
use crate::source::{ReadError, SampleSource};
use core::cell::{Cell, RefCell};
use core::time::Duration;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

/// The probe's standard configuration: measurement channel on tag 0, setup
/// channel on tag 1, 60 kHz aggregate.
pub fn test_config() -> AcquisitionConfig {
    let current = ChannelConfig {
        id: ChannelId::new(0).unwrap(),
        attenuation: Attenuation::Db12,
        bit_width: BitWidth::Bits12,
    };
    let setup = ChannelConfig {
        id: ChannelId::new(1).unwrap(),
        attenuation: Attenuation::Db12,
        bit_width: BitWidth::Bits12,
    };
    AcquisitionConfig::new([current, setup], 60_000).unwrap()
}

/// Packs `(tag, value)` pairs into the wire form a conversion frame carries.
pub fn pack_records(records: &[(u8, u16)]) -> Vec<u8> {
    records
        .iter()
        .flat_map(|&(tag, value)| {
            ConversionRecord {
                channel: ChannelId::new(tag).unwrap(),
                attenuation: Attenuation::Db12,
                value,
            }
            .encode()
        })
        .collect()
}

/// Plays back a script of read outcomes, then times out forever.
#[derive(Debug)]
pub struct ScriptedSource {
    script: VecDeque<Result<Vec<u8>, ReadError>>,
    started: bool,
}

impl ScriptedSource {
    pub fn new(script: impl IntoIterator<Item = Result<Vec<u8>, ReadError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            started: false,
        }
    }
}

impl SampleSource for ScriptedSource {
    fn start(&mut self) {
        self.started = true;
    }

    fn stop(&mut self) {
        self.started = false;
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize, ReadError> {
        match self.script.pop_front() {
            Some(Ok(bytes)) => {
                let filled = bytes.len().min(buf.len());
                buf[..filled].copy_from_slice(&bytes[..filled]);
                Ok(filled)
            }
            Some(Err(err)) => Err(err),
            None => Err(ReadError::TimedOut),
        }
    }
}

/// Sink that accepts and collects everything. Clone the handle to inspect
/// the collected samples while the pipeline owns the sink.
#[derive(Clone, Debug, Default)]
pub struct CollectingSink(Rc<RefCell<Vec<FilteredSample>>>);

impl CollectingSink {
    pub fn samples(&self) -> Vec<FilteredSample> {
        self.0.borrow().clone()
    }
}

impl SampleSink for CollectingSink {
    fn try_send(&mut self, sample: FilteredSample) -> Result<(), SinkFull> {
        self.0.borrow_mut().push(sample);
        Ok(())
    }
}

/// Hand-driven monotonic clock. Pass it by reference into the code under
/// test and advance it from the outside.
#[derive(Debug, Default)]
pub struct ManualClock(Cell<Duration>);

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        self.0.set(self.0.get() + by);
    }
}

impl MonotonicClock for ManualClock {
    fn now(&self) -> Duration {
        self.0.get()
    }
}
