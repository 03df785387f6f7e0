//! Wire codec benchmark suite.
//!
//! Benchmarks the three framing layers at different batch sizes:
//! - Batch sizes: 1, 16, 256 messages
//! - Message arguments: small JSON objects
//!
//! Run with: cargo bench --bench codec
//! Results saved to: target/criterion/

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::hint::black_box;

use notify_client::{AppMessage, JsonCodec, OpCode, ServiceFrame, decode_batch, encode_batch};

// ============================================================================
// Benchmark Parameters
// ============================================================================

const BATCH_SIZES: &[usize] = &[1, 16, 256];

fn sample_args() -> Vec<Value> {
    vec![
        json!({ "user": "alice", "room": 42 }),
        json!("hello, world"),
        json!([1, 2, 3, 4, 5]),
    ]
}

fn sample_batch(size: usize) -> Vec<u8> {
    let messages: Vec<Vec<u8>> = (0..size)
        .map(|_| {
            AppMessage::encode_parts("chat.message", &sample_args(), &JsonCodec)
                .expect("sample message encodes")
        })
        .collect();
    encode_batch(&messages).expect("sample batch encodes")
}

// ============================================================================
// Benchmark: Application Message
// ============================================================================

fn bench_app_message(c: &mut Criterion) {
    let args = sample_args();
    let encoded = AppMessage::encode_parts("chat.message", &args, &JsonCodec)
        .expect("sample message encodes");

    let mut group = c.benchmark_group("app_message");
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    group.bench_function("encode", |b| {
        b.iter(|| AppMessage::encode_parts(black_box("chat.message"), black_box(&args), &JsonCodec))
    });

    group.bench_function("decode", |b| {
        b.iter(|| AppMessage::decode(black_box(&encoded), &JsonCodec))
    });

    group.finish();
}

// ============================================================================
// Benchmark: Batch Envelope
// ============================================================================

fn bench_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");

    for &size in BATCH_SIZES {
        let batch = sample_batch(size);
        group.throughput(Throughput::Bytes(batch.len() as u64));

        group.bench_with_input(BenchmarkId::new("split", size), &batch, |b, batch| {
            b.iter(|| decode_batch(black_box(batch)).count())
        });

        group.bench_with_input(BenchmarkId::new("split_and_decode", size), &batch, |b, batch| {
            b.iter(|| {
                decode_batch(black_box(batch))
                    .filter_map(|bytes| AppMessage::decode(bytes, &JsonCodec).ok())
                    .count()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Service Frame
// ============================================================================

fn bench_service_frame(c: &mut Criterion) {
    let batch = sample_batch(16);
    let frame = ServiceFrame::encode(OpCode::Message, &batch);

    let mut group = c.benchmark_group("service_frame");

    group.bench_function("encode", |b| {
        b.iter(|| ServiceFrame::encode(OpCode::Message, black_box(&batch)))
    });

    group.bench_function("decode", |b| b.iter(|| ServiceFrame::decode(black_box(&frame))));

    group.finish();
}

criterion_group!(benches, bench_app_message, bench_batch, bench_service_frame);
criterion_main!(benches);
