// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Splitting and piece generation benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use nalgebra::Vector3;
use shardplate::{
    generate_piece, generator_for, split_object_for_plate, BuildPlate, DetailLevel, DimensionTable, MeshBackend,
    PieceKind, PieceOptions, Primitive, Scene,
};

fn bench_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("split");

    for plate in [256.0, 128.0, 64.0] {
        group.bench_with_input(BenchmarkId::new("box_600x300x200", plate), &plate, |b, &edge| {
            b.iter(|| {
                let mut scene = Scene::new();
                let mesh = scene
                    .create_primitive(&Primitive::cube(Vector3::new(600.0, 300.0, 200.0)), "box")
                    .unwrap();
                split_object_for_plate(&mut scene, mesh, black_box(&BuildPlate::cube(edge)), "box").unwrap()
            });
        });
    }

    group.bench_function("sphere_shell", |b| {
        b.iter(|| {
            let mut scene = Scene::new();
            let outer = scene.create_primitive(&Primitive::sphere(200.0, 24, 12), "shell").unwrap();
            let inner = scene.create_primitive(&Primitive::sphere(196.0, 24, 12), "hollow").unwrap();
            let shell = scene.difference(outer, inner).unwrap();
            split_object_for_plate(&mut scene, shell, black_box(&BuildPlate::cube(256.0)), "shell").unwrap()
        });
    });

    group.finish();
}

fn bench_pieces(c: &mut Criterion) {
    let mut group = c.benchmark_group("pieces");
    group.sample_size(10);
    let table = DimensionTable::standard();

    for kind in [PieceKind::Vambrace, PieceKind::Gauntlet, PieceKind::Helmet] {
        for detail in [DetailLevel::Minimal, DetailLevel::Standard] {
            let options = PieceOptions {
                detail,
                ..PieceOptions::default()
            };
            group.bench_with_input(BenchmarkId::new(kind.as_str(), detail), &options, |b, options| {
                b.iter(|| {
                    let mut scene = Scene::new();
                    let generator = generator_for(kind);
                    generate_piece(&mut scene, generator.as_ref(), &table, black_box(options)).unwrap()
                });
            });
        }
    }

    group.finish();
}

criterion_group!(benches, bench_split, bench_pieces);
criterion_main!(benches);
