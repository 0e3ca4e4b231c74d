//! Benchmarks for archive version detection

#![allow(clippy::unwrap_used)]

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use wz_crypto::{VersionHash, WzVariant};
use wz_formats::{WzArchive, WzReader, detect};
use wz_test_utils::ArchiveFixture;

fn benchmark_version_hash(c: &mut Criterion) {
    c.bench_function("hash_all_candidates", |b| {
        b.iter(|| {
            let matched = VersionHash::candidates()
                .filter(|c| c.matches(black_box(0x60)))
                .count();
            black_box(matched);
        });
    });
}

fn benchmark_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");

    // Later versions need more rejected trials before the match
    for version in [1u16, 83, 230, 4000] {
        let bytes = ArchiveFixture::new(WzVariant::Gms, true)
            .version(version)
            .directory("Map")
            .image("Item.img")
            .build()
            .bytes;

        group.bench_with_input(BenchmarkId::new("gms_encrypted", version), &bytes, |b, bytes| {
            b.iter(|| {
                let mut reader = WzReader::new(bytes.as_slice(), WzVariant::Gms, true);
                let detection = detect(&mut reader).unwrap();
                black_box(detection.version_hash);
            });
        });
    }

    let classic = ArchiveFixture::new(WzVariant::Classic, false)
        .version(83)
        .image("a.img")
        .build()
        .bytes;
    group.bench_function("open_classic_unencrypted", |b| {
        b.iter(|| {
            let archive =
                WzArchive::from_bytes(black_box(classic.clone()), WzVariant::Classic, false).unwrap();
            black_box(archive.version());
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_version_hash, benchmark_detection);
criterion_main!(benches);
