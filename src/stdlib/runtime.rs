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

//! Module for running an [`AcquisitionTask`] on a dedicated thread.

use crate::acquisition::{AcquisitionTask, CycleOutcome, PipelineStats};
use crate::reporter::{MonotonicClock, WindowSummary};
use crate::sink::SampleSink;
use crate::source::SampleSource;
use core::time::Duration;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// One cooperative scheduler tick: how long the loop yields after a
/// driver-busy read before retrying.
pub const SCHEDULER_TICK: Duration = Duration::from_millis(1);

/// Handle to a running acquisition thread.
#[derive(Debug)]
pub struct AcquisitionHandle {
    stop: Arc<AtomicBool>,
    thread: JoinHandle<PipelineStats>,
}

impl AcquisitionHandle {
    /// Signals the loop to finish its current cycle, joins the thread and
    /// returns the final counters.
    pub fn stop(self) -> PipelineStats {
        self.stop.store(true, Ordering::SeqCst);
        self.thread.join().expect("acquisition thread panicked")
    }
}

/// Moves `task` onto a dedicated thread and drives it in a tight loop until
/// the returned handle is stopped. The loop itself never terminates on its
/// own; every failure class inside a cycle is transient and counted.
///
/// `on_window` runs on the acquisition thread whenever a reporting window
/// closes. Keep it cheap; it runs between read cycles.
pub fn spawn_acquisition<S, K, C>(
    mut task: AcquisitionTask<S, K, C>,
    mut on_window: impl FnMut(WindowSummary) + Send + 'static,
) -> io::Result<AcquisitionHandle>
where
    S: SampleSource + Send + 'static,
    K: SampleSink + Send + 'static,
    C: MonotonicClock + Send + 'static,
{
    let stop = Arc::new(AtomicBool::new(false));
    let thread = thread::Builder::new().name("acquisition".into()).spawn({
        let stop = Arc::clone(&stop);
        move || {
            task.start();
            while !stop.load(Ordering::SeqCst) {
                match task.run_cycle() {
                    CycleOutcome::Processed {
                        window: Some(summary),
                        ..
                    } => on_window(summary),
                    CycleOutcome::Processed { .. } => {}
                    // Transient driver-busy: yield one tick, then retry.
                    CycleOutcome::Busy => thread::sleep(SCHEDULER_TICK),
                    // The timeout only bounds loop latency; retry at once.
                    CycleOutcome::TimedOut => {}
                }
            }
            task.stop();
            *task.stats()
        }
    })?;

    Ok(AcquisitionHandle { stop, thread })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SAMPLE_MAX;
    use crate::stdlib::{SimulatedProbe, StdClock};
    use crate::test_utils::test_config;
    use std::collections::BTreeSet;
    use std::sync::atomic::AtomicU64;
    use std::sync::mpsc;
    use std::time::Instant;
    use std::vec::Vec;

    #[test]
    fn pipeline_runs_end_to_end_on_the_simulated_probe() {
        let config = test_config();
        let probe = SimulatedProbe::new(&config).unwrap();
        let (tx, rx) = mpsc::sync_channel(4096);
        let task = AcquisitionTask::new(&config, probe, tx, StdClock::new());

        let windows = Arc::new(AtomicU64::new(0));
        let handle = spawn_acquisition(task, {
            let windows = Arc::clone(&windows);
            move |_summary| {
                windows.fetch_add(1, Ordering::SeqCst);
            }
        })
        .unwrap();

        // At 60 kHz aggregate this takes a handful of frames; the deadline
        // only guards against a pathologically slow machine.
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut samples = Vec::new();
        while samples.len() < 1000 && Instant::now() < deadline {
            match rx.recv_timeout(Duration::from_millis(100)) {
                Ok(sample) => samples.push(sample),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }
        let stats = handle.stop();

        assert!(samples.len() >= 1000, "got only {} samples", samples.len());
        assert!(stats.records >= 1000);

        // Both configured channels flow through, every value is 12 bit.
        let tags = samples
            .iter()
            .map(|sample| sample.channel.tag())
            .collect::<BTreeSet<_>>();
        assert!(tags.contains(&0));
        assert!(tags.contains(&1));
        assert!(samples.iter().all(|sample| sample.value <= SAMPLE_MAX));
    }

    #[test]
    fn stop_terminates_the_loop_and_returns_final_stats() {
        let config = test_config();
        let probe = SimulatedProbe::new(&config).unwrap();
        let (tx, rx) = mpsc::sync_channel(16);
        let task = AcquisitionTask::new(&config, probe, tx, StdClock::new());
        let handle = spawn_acquisition(task, |_summary| {}).unwrap();

        // Give the loop a moment; the tiny sink bound guarantees drops.
        thread::sleep(Duration::from_millis(200));
        let stats = handle.stop();
        drop(rx);

        assert!(stats.records > 0);
        assert!(stats.sink_drops > 0);
    }
}
