use bytes::Bytes;
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use echo6::ReliableEchoChannel;
use echo6::mock::MockStream;
use tokio::runtime::Runtime;

fn bench_receive_fragmented(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("receive_exact");
    let data = vec![b'x'; 16384];

    // Fragment sizes from one byte up to a full chunk
    for fragment in [1usize, 16, 128, 500] {
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::new("fragment", fragment), &fragment, |b, &fragment| {
            b.iter(|| {
                rt.block_on(async {
                    let (stream, _handle) = MockStream::builder().read_fragments(&data, &[fragment]).build();
                    let mut channel = ReliableEchoChannel::new(stream);
                    let reply = channel.receive_exact(black_box(data.len()), None).await.unwrap();
                    assert_eq!(reply.len(), data.len());
                    reply
                })
            });
        });
    }

    group.finish();
}

fn bench_send_partial_writes(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();

    let mut group = c.benchmark_group("send_all");
    let payload = Bytes::from(vec![b'x'; 16384]);

    for limit in [4usize, 512, 16384] {
        group.throughput(Throughput::Bytes(payload.len() as u64));
        group.bench_with_input(BenchmarkId::new("max_write", limit), &limit, |b, &limit| {
            b.iter(|| {
                rt.block_on(async {
                    let (stream, _handle) = MockStream::builder().max_write(limit).build();
                    let mut channel = ReliableEchoChannel::new(stream);
                    channel.send_all(black_box(payload.clone())).await.unwrap();
                })
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_receive_fragmented, bench_send_partial_writes);
criterion_main!(benches);
