//! Benchmarks for the hot admission path and the whitelist codec.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use warden_core::{Identity, Role};
use warden_store::{codec, Membership, MembershipStore};

fn make_membership(listed: i64) -> Membership {
    let mut m = Membership::new();
    for i in 0..listed {
        let role = if i % 10 == 0 { Role::Admin } else { Role::User };
        m.add(role, Identity::new(i));
    }
    m
}

fn bench_is_allowed(c: &mut Criterion) {
    let mut group = c.benchmark_group("is_allowed");
    for listed in [10i64, 1_000, 100_000] {
        let store = MembershipStore::with_membership("bench.json", make_membership(listed));

        group.bench_with_input(BenchmarkId::new("listed", listed), &store, |b, store| {
            b.iter(|| black_box(store.is_allowed(Some(Identity::new(listed / 2)))));
        });
        group.bench_with_input(BenchmarkId::new("unlisted", listed), &store, |b, store| {
            b.iter(|| black_box(store.is_allowed(Some(Identity::new(-1)))));
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    for listed in [100i64, 10_000] {
        let text = String::from_utf8(codec::encode(&make_membership(listed).snapshot()).unwrap())
            .unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(listed), &text, |b, text| {
            b.iter(|| black_box(codec::decode(text, "bench").unwrap()));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_is_allowed, bench_decode);
criterion_main!(benches);
