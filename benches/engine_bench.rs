//! Criterion benchmarks for engine throughput and the frame codec

use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use udpmux::frame;
use udpmux::{current_timestamp, EngineConfig, ReliabilityEngine};

/// Perfect transfer: all packets from src delivered to dst.
fn transfer(src: &mut ReliabilityEngine, dst: &mut ReliabilityEngine) {
    for packet in src.drain_output() {
        let _ = dst.input(packet);
    }
}

/// Run bidirectional update/transfer rounds, draining the receiver each
/// round to keep the receive window open.
fn run_rounds(a: &mut ReliabilityEngine, b: &mut ReliabilityEngine, rounds: usize) -> usize {
    let mut received = 0;
    let mut now = current_timestamp();

    for _ in 0..rounds {
        let _ = a.update(now);
        transfer(a, b);

        while b.recv().ok().flatten().is_some() {
            received += 1;
        }

        let _ = b.update(now);
        transfer(b, a);

        now = now.wrapping_add(10);
    }
    received
}

fn drain_recv(engine: &mut ReliabilityEngine) -> usize {
    let mut count = 0;
    while let Ok(Some(_)) = engine.recv() {
        count += 1;
    }
    count
}

fn engine_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_throughput");

    for &msg_count in &[10, 100, 500] {
        let msg_size = 1024;
        group.throughput(Throughput::Bytes((msg_count * msg_size) as u64));

        group.bench_with_input(
            BenchmarkId::new("1KB_messages", msg_count),
            &msg_count,
            |bench, &count| {
                bench.iter(|| {
                    let config = EngineConfig::new().window_size(128, 128);
                    let mut a = ReliabilityEngine::new(0xBEEF0001, config.clone());
                    let mut b = ReliabilityEngine::new(0xBEEF0001, config);

                    let payload = Bytes::from(vec![0xABu8; msg_size]);
                    for _ in 0..count {
                        a.send(payload.clone()).unwrap();
                    }

                    let mut received = run_rounds(&mut a, &mut b, count * 2);
                    received += drain_recv(&mut b);
                    assert_eq!(received, count);
                });
            },
        );
    }

    group.finish();
}

fn engine_large_message(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_large_message");

    for &size_kb in &[16, 64] {
        let size = size_kb * 1024;
        group.throughput(Throughput::Bytes(size as u64));

        group.bench_with_input(
            BenchmarkId::new("single_message", format!("{}KB", size_kb)),
            &size,
            |bench, &sz| {
                bench.iter(|| {
                    let config = EngineConfig::new().window_size(256, 256);
                    let mut a = ReliabilityEngine::new(0xBEEF0002, config.clone());
                    let mut b = ReliabilityEngine::new(0xBEEF0002, config);

                    let payload: Vec<u8> = (0..sz).map(|i| (i % 256) as u8).collect();
                    a.send(Bytes::from(payload)).unwrap();

                    let mut received = run_rounds(&mut a, &mut b, 200);
                    received += drain_recv(&mut b);
                    assert_eq!(received, 1);
                });
            },
        );
    }

    group.finish();
}

fn frame_codec(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame_codec");
    let payload = vec![0xCDu8; 1024];
    group.throughput(Throughput::Bytes(payload.len() as u64));

    group.bench_function("encode_decode_1KB", |bench| {
        let mut buf = vec![0u8; frame::HEADER_LEN + payload.len()];
        bench.iter(|| {
            let written = frame::encode(&mut buf, 0x1300, &payload).unwrap();
            let (command, body) = frame::decode(written).unwrap();
            assert_eq!(command, 0x1300);
            assert_eq!(body.len(), payload.len());
        });
    });

    group.finish();
}

criterion_group!(benches, engine_throughput, engine_large_message, frame_codec);
criterion_main!(benches);
