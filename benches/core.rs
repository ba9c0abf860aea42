use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use hashlife::{Cells, DenseSet, Universe};
use std::hint::black_box;

fn bench_cell_kernel(c: &mut Criterion) {
    let blocks: Vec<Cells> = (0..1024).map(|i| Cells::random(Some(i))).collect();

    let mut group = c.benchmark_group("cell_kernel");
    group.throughput(Throughput::Elements(blocks.len() as u64));
    group.bench_function("step", |b| {
        b.iter(|| {
            for block in &blocks {
                black_box(block.step());
            }
        })
    });
    group.bench_function("next", |b| {
        b.iter(|| {
            for block in &blocks {
                black_box(block.next());
            }
        })
    });
    group.finish();
}

fn bench_dense_set(c: &mut Criterion) {
    let blocks: Vec<Cells> = (0..4096).map(|i| Cells::random(Some(i))).collect();

    c.bench_function("dense_set_emplace_find", |b| {
        b.iter(|| {
            let mut set = DenseSet::<Cells>::new(1 << 14);
            for block in &blocks {
                black_box(set.emplace(*block));
            }
            for block in &blocks {
                black_box(set.find(block));
            }
        })
    });
}

fn bench_universe_next(c: &mut Criterion) {
    c.bench_function("universe_tier1_next", |b| {
        b.iter(|| {
            let mut universe = Universe::new(1, 1 << 14);
            let blocks: Vec<_> = (0..256)
                .map(|i| universe.intern_cells(Cells::random(Some(i))).unwrap())
                .collect();
            for chunk in blocks.chunks_exact(4) {
                let node = universe.intern(1, chunk[0], chunk[1], chunk[2], chunk[3]).unwrap();
                black_box(universe.next(1, node).unwrap());
            }
        })
    });
}

criterion_group!(benches, bench_cell_kernel, bench_dense_set, bench_universe_next);
criterion_main!(benches);
