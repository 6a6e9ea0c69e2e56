//! Criterion micro-benchmarks for the tile-parallel particle phases.

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use tilepic_bench::{reference_profile, thermal_store};
use tilepic_grid::Field1d;
use tilepic_kernels::{deposit, push, Charge, Current, DepositScratch, PushFields, PushParams};
use tilepic_tiles::{census, reorder, DepartureTable, TransferBuffer};

fn bench_census(c: &mut Criterion) {
    let config = reference_profile(42);
    let (_, particles, store) = thermal_store(&config).unwrap();
    let partition = *store.partition();

    c.bench_function("census_18k", |b| {
        b.iter(|| black_box(census(&particles, &partition).unwrap()));
    });
}

fn bench_deposit(c: &mut Criterion) {
    let config = reference_profile(42);
    let (grid, _, store) = thermal_store(&config).unwrap();
    let mut charge = DepositScratch::<1>::new(store.partition());
    let mut current = DepositScratch::<2>::new(store.partition());
    let mut qe: Field1d<1> = Field1d::zeros(&grid);
    let mut cue: Field1d<2> = Field1d::zeros(&grid);

    c.bench_function("deposit_charge_18k", |b| {
        b.iter(|| {
            qe.zero();
            deposit(&store, &Charge, -1.0, &mut charge, &mut qe);
            black_box(&qe);
        });
    });
    c.bench_function("deposit_current_18k", |b| {
        b.iter(|| {
            cue.zero();
            deposit(&store, &Current, -1.0, &mut current, &mut cue);
            black_box(&cue);
        });
    });
}

/// Push and reorder in zero field, each iteration on a fresh copy of the
/// initial store.
fn bench_push_and_reorder(c: &mut Criterion) {
    let config = reference_profile(42);
    let (grid, _, store) = thermal_store(&config).unwrap();
    let layout = *store.layout();
    let tiles = store.tiles();
    let exyze: Field1d<3> = Field1d::zeros(&grid);
    let byze: Field1d<2> = Field1d::zeros(&grid);
    let fields = PushFields::new(&exyze, &byze);
    let params = PushParams::new(config.qme, config.dt, config.omx);

    c.bench_function("push_18k", |b| {
        b.iter_batched(
            || (store.clone(), DepartureTable::new(tiles, layout.ntmax)),
            |(mut s, mut d)| black_box(push(&mut s, &mut d, &grid, &fields, &params).unwrap()),
            BatchSize::LargeInput,
        );
    });

    c.bench_function("reorder_18k", |b| {
        b.iter_batched(
            || {
                let mut s = store.clone();
                let mut d = DepartureTable::new(tiles, layout.ntmax);
                push(&mut s, &mut d, &grid, &fields, &params).unwrap();
                (s, d, TransferBuffer::new(tiles, layout.npbmx))
            },
            |(mut s, mut d, mut t)| black_box(reorder(&mut s, &mut d, &mut t).unwrap()),
            BatchSize::LargeInput,
        );
    });
}

criterion_group!(benches, bench_census, bench_deposit, bench_push_and_reorder);
criterion_main!(benches);
