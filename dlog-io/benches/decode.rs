use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dlog_io::{decode_ndjson, encode_ndjson, inspect, DecodeOpts, EncodeOpts};
use serde_json::json;
use std::io::{Cursor, Write};

fn generate_test_data(count: usize) -> Vec<u8> {
    let mut buf = Vec::new();
    let users = ["alice", "bob", "carol", "dave", "eve"];

    for i in 0..count {
        let record = json!({
            "id": i,
            "user": users[i % users.len()],
            "timestamp": 1600000000 + i,
            "value": i * 2,
            "level": if i % 2 == 0 { "info" } else { "warn" },
            "message": format!("Message {}", i % 100),
        });
        writeln!(&mut buf, "{}", record).unwrap();
    }

    buf
}

fn encode_data(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    encode_ndjson(Cursor::new(data), &mut out, EncodeOpts::default()).unwrap();
    out
}

fn bench_ndjson_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("ndjson_encode");

    for count in [10_000, 50_000] {
        let data = generate_test_data(count);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &data, |b, data| {
            b.iter(|| black_box(encode_data(data)));
        });
    }

    group.finish();
}

fn bench_ndjson_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("ndjson_decode");

    for count in [10_000, 50_000] {
        let encoded = encode_data(&generate_test_data(count));
        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &encoded, |b, encoded| {
            b.iter(|| {
                let mut out = Vec::with_capacity(encoded.len() * 4);
                black_box(decode_ndjson(Cursor::new(encoded), &mut out, DecodeOpts::default()).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_inspect(c: &mut Criterion) {
    let mut group = c.benchmark_group("inspect");
    let encoded = encode_data(&generate_test_data(50_000));
    group.throughput(Throughput::Bytes(encoded.len() as u64));

    for skip_values in [false, true] {
        let label = if skip_values { "skip_values" } else { "full" };
        group.bench_function(label, |b| {
            b.iter(|| {
                black_box(
                    inspect(Cursor::new(&encoded), DecodeOpts::default(), skip_values, |_| Ok(()))
                        .unwrap(),
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_ndjson_encode, bench_ndjson_decode, bench_inspect);
criterion_main!(benches);
