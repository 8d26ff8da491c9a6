//! Runs the full acquisition pipeline against the simulated probe and prints
//! the 100 ms window summaries plus a rolling view of both channels.

use continuity_sampler::stdlib::{spawn_acquisition, SimulatedProbe, StdClock};
use continuity_sampler::{
    AcquisitionConfig, AcquisitionTask, Attenuation, BitWidth, ChannelConfig, ChannelId,
    FilteredSample,
};
use log::LevelFilter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

fn init_logger() {
    simple_logger::SimpleLogger::new()
        .with_level(LevelFilter::Debug)
        .with_colors(true)
        .with_utc_timestamps()
        .init()
        .unwrap();
}

fn main() {
    init_logger();

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            stop.store(true, Ordering::SeqCst);
        })
        .unwrap();
    }

    let channel = |tag| ChannelId::new(tag).unwrap();
    let config = AcquisitionConfig::new(
        [
            // Measurement ("current") channel.
            ChannelConfig {
                id: channel(0),
                attenuation: Attenuation::Db12,
                bit_width: BitWidth::Bits12,
            },
            // Range-selection ("setup") channel.
            ChannelConfig {
                id: channel(1),
                attenuation: Attenuation::Db12,
                bit_width: BitWidth::Bits12,
            },
        ],
        60_000,
    )
    .unwrap();

    let probe = SimulatedProbe::new(&config).unwrap();
    let (tx, rx) = mpsc::sync_channel::<FilteredSample>(4096);
    let task = AcquisitionTask::new(&config, probe, tx, StdClock::new());

    let handle = spawn_acquisition(task, |window| {
        println!(
            "window: {:>6.1?} | cycles {:>3} | records {:>5} ({:>6.0}/s) | err {}/{}/{}",
            window.elapsed,
            window.cycles,
            window.records,
            window.records_per_second(),
            window.demux_errors,
            window.busy_retries,
            window.sink_drops,
        );
    })
    .unwrap();

    log::info!("acquisition running, ctrl-c to stop");

    let mut received = [0u64; 2];
    let mut latest = [0u16; 2];
    while !stop.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(sample) => {
                let lane = (sample.channel.tag() as usize).min(1);
                received[lane] += 1;
                latest[lane] = sample.value;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let stats = handle.stop();
    println!(
        "received current/setup: {}/{} (latest {}/{})",
        received[0], received[1], latest[0], latest[1]
    );
    println!("final stats: {stats:?}");
}
