use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use kfcount::builder::CounterBuilder;
use kfcount::codec::KmerCodec;
use kfcount::counter::{Counter, Width};
use kfcount::tally::Strategy;
use std::io::Write;

const SEQUENCE: &str = "ACGTTGCAGGATTACACCGTAGCTAGGCTTAACGATCGATCGGATCCTAGAGTC";

fn sequence(len: usize) -> Vec<u8> {
    SEQUENCE.as_bytes().iter().copied().cycle().take(len).collect()
}

fn bench_ss_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("KmerCodec::ss_encode_into");
    let seq = sequence(10_000);

    for k in [5, 11, 21, 31] {
        let codec = KmerCodec::<u64>::new(k, true).unwrap();
        let mut keys = Vec::with_capacity(seq.len());

        group.bench_with_input(BenchmarkId::from_parameter(k), &seq, |b, seq| {
            b.iter(|| {
                codec.ss_encode_into(black_box(seq), &mut keys);
                black_box(keys.len())
            })
        });
    }

    group.finish();
}

fn bench_ds_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("KmerCodec::ds_encode_into");
    let seq = sequence(10_000);

    for k in [5, 11, 21, 31] {
        let codec = KmerCodec::<u64>::new(k, false).unwrap();
        let mut keys = Vec::with_capacity(seq.len());

        group.bench_with_input(BenchmarkId::from_parameter(k), &seq, |b, seq| {
            b.iter(|| {
                codec.ds_encode_into(black_box(seq), &mut keys);
                black_box(keys.len())
            })
        });
    }

    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("KmerCodec::decode");

    for k in [5, 11, 21, 31] {
        let codec = KmerCodec::<u64>::new(k, false).unwrap();
        let key = codec.encode_one(&sequence(k));

        group.bench_with_input(BenchmarkId::from_parameter(k), &key, |b, &key| {
            b.iter(|| codec.decode(black_box(key)))
        });
    }

    group.finish();
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("Counter::process");
    let seq = sequence(100_000);

    for strategy in [Strategy::Vector, Strategy::Map, Strategy::List] {
        group.bench_with_input(
            BenchmarkId::from_parameter(strategy),
            &strategy,
            |b, &strategy| {
                b.iter(|| {
                    let counter =
                        Counter::new(11, false, strategy, Width::Bits32, Width::Bits32, 100_000)
                            .unwrap();
                    counter.process(black_box(&seq)).unwrap();
                    counter.finish().unwrap()
                })
            },
        );
    }

    group.finish();
}

fn bench_count_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("CounterBuilder::count");

    let mut file = tempfile::Builder::new().suffix(".fa").tempfile().unwrap();
    for i in 0..100 {
        writeln!(file, ">seq{i}").unwrap();
        file.write_all(&sequence(320)).unwrap();
        writeln!(file).unwrap();
    }
    let path = file.path().to_path_buf();

    for k in [5, 11, 21] {
        let builder = CounterBuilder::new().k(k).unwrap().max_mbp(1);
        group.bench_with_input(BenchmarkId::from_parameter(k), &path, |b, path| {
            b.iter(|| builder.count([black_box(path)]).unwrap())
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ss_encode,
    bench_ds_encode,
    bench_decode,
    bench_strategies,
    bench_count_file,
);

criterion_main!(benches);
