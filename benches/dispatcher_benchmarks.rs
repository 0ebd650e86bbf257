use std::{hint::black_box, sync::Arc};

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use mqbroker::{protocol, BrokerState, Dispatcher};
use uuid::Uuid;

fn bench_parse_request(c: &mut Criterion) {
    let app = Uuid::new_v4();
    let sender = Uuid::new_v4();
    let lines = [
        ("subscribe", format!("SUBSCRIBE|{app}|news")),
        ("publish", format!("PUBLISH|{app}|news|hello world")),
        ("publish_sender", format!("PUBLISH|{app}|news|hello world|{sender}")),
        ("malformed", "PUBLISH|not-a-uuid|news|x".to_string()),
    ];

    let mut group = c.benchmark_group("parse_request");
    for (name, line) in &lines {
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| black_box(protocol::parse_request(black_box(line))))
        });
    }
    group.finish();
}

fn bench_publish_receive_cycle(c: &mut Criterion) {
    let dispatcher = Dispatcher::new(Arc::new(BrokerState::new()));
    let app = Uuid::new_v4();
    dispatcher.handle_line(&format!("SUBSCRIBE|{app}|news"));
    let publish = format!("PUBLISH|{app}|news|payload");
    let receive = format!("RECEIVE|{app}|news");

    c.bench_function("dispatcher_publish_receive", |b| {
        b.iter(|| {
            black_box(dispatcher.handle_line(&publish));
            black_box(dispatcher.handle_line(&receive));
        })
    });
}

fn bench_subscribe_existing(c: &mut Criterion) {
    let dispatcher = Dispatcher::new(Arc::new(BrokerState::new()));
    let line = format!("SUBSCRIBE|{}|news", Uuid::new_v4());
    dispatcher.handle_line(&line);

    c.bench_function("dispatcher_subscribe_idempotent", |b| {
        b.iter(|| black_box(dispatcher.handle_line(black_box(&line))))
    });
}

criterion_group!(
    benches,
    bench_parse_request,
    bench_publish_receive_cycle,
    bench_subscribe_existing
);
criterion_main!(benches);
