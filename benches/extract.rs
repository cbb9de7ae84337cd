use criterion::{black_box, criterion_group, criterion_main, Criterion};
use unityfs_tools::bundle::Bundle;

// Synthetic bundle: `block_count` lz4 blocks of 64 KiB each, one node per
// block plus one node spanning the whole address space.
fn synthetic_bundle(block_count: usize) -> Vec<u8> {
    const BLOCK_SIZE: usize = 64 * 1024;

    let payloads: Vec<Vec<u8>> = (0..block_count)
        .map(|i| {
            (0..BLOCK_SIZE)
                .map(|j| ((i * 31 + j * 7) % 251) as u8)
                .collect()
        })
        .collect();
    let stored: Vec<Vec<u8>> = payloads
        .iter()
        .map(|p| lz4_flex::block::compress(p))
        .collect();

    let mut info = vec![0u8; 16];
    info.extend_from_slice(&(block_count as u32).to_be_bytes());
    for (payload, bytes) in payloads.iter().zip(&stored) {
        info.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        info.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
        info.extend_from_slice(&2u16.to_be_bytes());
    }
    info.extend_from_slice(&((block_count + 1) as u32).to_be_bytes());
    for i in 0..block_count {
        info.extend_from_slice(&((i * BLOCK_SIZE) as u64).to_be_bytes());
        info.extend_from_slice(&(BLOCK_SIZE as u64).to_be_bytes());
        info.extend_from_slice(&0u32.to_be_bytes());
        info.extend_from_slice(format!("assets/chunk_{i:03}.bin").as_bytes());
        info.push(0);
    }
    info.extend_from_slice(&0u64.to_be_bytes());
    info.extend_from_slice(&((block_count * BLOCK_SIZE) as u64).to_be_bytes());
    info.extend_from_slice(&0u32.to_be_bytes());
    info.extend_from_slice(b"assets/all.bin\x00");

    let mut out = vec![];
    out.extend_from_slice(b"UnityFS\x00");
    out.extend_from_slice(&6u32.to_be_bytes());
    out.extend_from_slice(b"5.x.x\x00");
    out.extend_from_slice(b"2020.3.1f1\x00");
    let size_at = out.len();
    out.extend_from_slice(&0u64.to_be_bytes());
    out.extend_from_slice(&(info.len() as u32).to_be_bytes());
    out.extend_from_slice(&(info.len() as u32).to_be_bytes());
    out.extend_from_slice(&0u32.to_be_bytes());
    out.extend_from_slice(&info);
    for bytes in &stored {
        out.extend_from_slice(bytes);
    }
    let total = out.len() as u64;
    out[size_at..size_at + 8].copy_from_slice(&total.to_be_bytes());
    out
}

fn parse_benchmark(c: &mut Criterion) {
    let raw = synthetic_bundle(32);

    c.bench_function("parse_bundle", |b| {
        b.iter(|| Bundle::parse(black_box(raw.clone().into())).unwrap())
    });
}

fn extract_benchmark(c: &mut Criterion) {
    let bundle = Bundle::parse(synthetic_bundle(32).into()).unwrap();

    c.bench_function("extract_single_block_node", |b| {
        let node = bundle.node("assets/chunk_007.bin").unwrap();
        b.iter(|| black_box(bundle.extract(node).unwrap()))
    });

    c.bench_function("extract_spanning_node", |b| {
        let node = bundle.node("assets/all.bin").unwrap();
        b.iter(|| black_box(bundle.extract(node).unwrap()))
    });
}

criterion_group!(benches, parse_benchmark, extract_benchmark);
criterion_main!(benches);
