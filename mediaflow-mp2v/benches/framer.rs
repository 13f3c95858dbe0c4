//! Framer throughput benchmark

use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use mediaflow_attr::DictMgr;
use mediaflow_mp2v::Mp2vFramer;
use mediaflow_stream::event::NullProbe;
use mediaflow_stream::Uref;

fn build_stream(frames: usize) -> Vec<u8> {
    let seq = [
        0x00u8, 0x00, 0x01, 0xb3, 0x78, 0x04, 0x38, 0x33, 0x0b, 0xb8, 0x23, 0x80,
    ];
    let ext = [0x00u8, 0x00, 0x01, 0xb5, 0x14, 0x8a, 0x00, 0x01, 0x00, 0x00];
    let mut stream = Vec::new();
    stream.extend_from_slice(&seq);
    stream.extend_from_slice(&ext);
    for index in 0..frames {
        let tr = (index % 1024) as u16;
        stream.extend_from_slice(&[
            0x00,
            0x00,
            0x01,
            0x00,
            (tr >> 2) as u8,
            ((tr & 0x3) as u8) << 6 | 1 << 3 | 0x7,
            0xff,
            0xf8,
        ]);
        // A handful of slices of payload per picture.
        for slice in 1u8..=4 {
            stream.extend_from_slice(&[0x00, 0x00, 0x01, slice]);
            stream.extend_from_slice(&[0x42; 184]);
        }
    }
    stream.extend_from_slice(&[0x00, 0x00, 0x01, 0xb7]);
    stream
}

fn bench_framer(c: &mut Criterion) {
    let stream = build_stream(50);
    let mgr = DictMgr::new(16);

    let mut group = c.benchmark_group("framer");
    group.throughput(Throughput::Bytes(stream.len() as u64));
    group.bench_function("parse_50_frames", |b| {
        b.iter(|| {
            let mut framer = Mp2vFramer::new(Box::new(NullProbe));
            let mut flow_def = Uref::new(&mgr);
            flow_def.set_flow_def("block.mpeg2video.");
            framer.input(flow_def);

            let mut uref = Uref::new(&mgr);
            uref.set_block(Bytes::copy_from_slice(&stream));
            framer.input(black_box(uref));
        })
    });
    group.finish();
}

criterion_group!(benches, bench_framer);
criterion_main!(benches);
