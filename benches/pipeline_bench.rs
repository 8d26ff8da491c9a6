use continuity_sampler::{
    AcquisitionConfig, Attenuation, BitWidth, ChannelConfig, ChannelId, ConversionRecord,
    Demultiplexer, MedianFilter, RECORDS_PER_FRAME,
};
use criterion::{criterion_group, criterion_main, Criterion};
use std::hint::black_box;

fn criterion_benchmark(c: &mut Criterion) {
    let config = helpers::probe_config();
    let frame = helpers::synthetic_frame(RECORDS_PER_FRAME);

    let mut demux = Demultiplexer::new(&config);
    c.bench_function(
        "demultiplex + condition one 256-record frame",
        |b| {
            b.iter(|| {
                // The emitted samples are irrelevant here; this measures the
                // per-frame walk, the filter and the routing.
                let mut emitted = 0u32;
                let _ = demux.process(black_box(&frame), |_lane, _channel, _value| {
                    emitted += 1;
                });
                black_box(emitted);
            })
        },
    );

    let mut filter = MedianFilter::new();
    let values = helpers::synthetic_values(4096);
    c.bench_function("median filter over 4096 samples", |b| {
        b.iter(|| {
            for &value in &values {
                black_box(filter.filter(black_box(value)));
            }
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

mod helpers {
    use super::*;

    pub fn probe_config() -> AcquisitionConfig {
        AcquisitionConfig::new(
            [
                ChannelConfig {
                    id: ChannelId::new(0).unwrap(),
                    attenuation: Attenuation::Db12,
                    bit_width: BitWidth::Bits12,
                },
                ChannelConfig {
                    id: ChannelId::new(1).unwrap(),
                    attenuation: Attenuation::Db12,
                    bit_width: BitWidth::Bits12,
                },
            ],
            60_000,
        )
        .unwrap()
    }

    /// A frame in the hardware's round-robin pattern order with a spread of
    /// values, so the median comparisons take both branches.
    pub fn synthetic_frame(records: usize) -> Vec<u8> {
        (0..records)
            .flat_map(|i| {
                ConversionRecord {
                    channel: ChannelId::new((i % 2) as u8).unwrap(),
                    attenuation: Attenuation::Db12,
                    value: ((i * 37) % 4096) as u16,
                }
                .encode()
            })
            .collect()
    }

    pub fn synthetic_values(count: usize) -> Vec<u16> {
        (0..count).map(|i| ((i * 53) % 4096) as u16).collect()
    }
}
