// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Build-plate splitting scenarios

use ahash::AHashSet;
use anyhow::Result;
use approx::assert_relative_eq;
use nalgebra::Vector3;
use shardplate::connectors::{ConnectorKind, PIN_CLEARANCE, PIN_HEIGHT};
use shardplate::{
    split_object_for_plate, BuildPlate, MeshBackend, MeshHandle, Primitive, Scene, Segment, Transform, MAX_SPLIT_DEPTH,
};

fn block(scene: &mut Scene, x: f64, y: f64, z: f64) -> Result<MeshHandle> {
    Ok(scene.create_primitive(&Primitive::cube(Vector3::new(x, y, z)), "block")?)
}

fn names(leaves: &[Segment]) -> Vec<&str> {
    leaves.iter().map(|s| s.name()).collect()
}

#[test]
fn test_fitting_object_is_returned_unchanged() -> Result<()> {
    let mut scene = Scene::new();
    let mesh = block(&mut scene, 100.0, 100.0, 100.0)?;
    let before = scene.mesh(&mesh)?.volume();
    let id = mesh.id();

    let leaves = split_object_for_plate(&mut scene, mesh, &BuildPlate::cube(256.0), "block")?;
    assert_eq!(names(&leaves), vec!["block"]);
    assert_eq!(leaves[0].mesh().id(), id);
    assert_eq!(leaves[0].depth(), 0);
    assert!(leaves[0].connectors().is_empty());
    assert_relative_eq!(scene.mesh(leaves[0].mesh())?.volume(), before, epsilon = 1e-9);
    assert_eq!(scene.mesh_count(), 1);
    Ok(())
}

#[test]
fn test_wide_box_splits_once_along_x() -> Result<()> {
    let mut scene = Scene::new();
    let plate = BuildPlate::cube(256.0);
    let mesh = block(&mut scene, 300.0, 200.0, 100.0)?;

    let leaves = split_object_for_plate(&mut scene, mesh, &plate, "box")?;
    assert_eq!(names(&leaves), vec!["box_sec1", "box_sec2"]);
    for leaf in &leaves {
        assert_eq!(leaf.depth(), 1);
        assert!(plate.fits(&scene.dimensions(leaf.mesh())?));
    }

    let lower = scene.bounding_box(leaves[0].mesh())?;
    let upper = scene.bounding_box(leaves[1].mesh())?;
    assert_relative_eq!(lower.min.x, -150.0, epsilon = 1e-6);
    assert_relative_eq!(lower.max.x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(upper.max.x, 150.0, epsilon = 1e-6);
    // The posts stand half their height proud of the cut face.
    assert_relative_eq!(upper.min.x, -PIN_HEIGHT / 2.0, epsilon = 1e-6);
    assert_eq!(scene.mesh_count(), 2);
    Ok(())
}

#[test]
fn test_every_cut_gets_two_mated_pins() -> Result<()> {
    let mut scene = Scene::new();
    let mesh = block(&mut scene, 300.0, 200.0, 100.0)?;
    let leaves = split_object_for_plate(&mut scene, mesh, &BuildPlate::cube(256.0), "box")?;

    let holes: Vec<_> = leaves[0].connectors_of(ConnectorKind::Hole).collect();
    let posts: Vec<_> = leaves[1].connectors_of(ConnectorKind::Post).collect();
    assert_eq!(holes.len(), 2);
    assert_eq!(posts.len(), 2);
    assert_eq!(leaves[0].connectors_of(ConnectorKind::Post).count(), 0);

    for (hole, post) in holes.iter().zip(&posts) {
        assert_eq!(hole.mate.as_deref(), Some("box_sec2"));
        assert_eq!(post.mate.as_deref(), Some("box_sec1"));
        assert_relative_eq!(hole.location, post.location, epsilon = 1e-9);
        assert_relative_eq!(hole.direction, -post.direction, epsilon = 1e-12);
        assert_relative_eq!(hole.location.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(hole.diameter - post.diameter, 2.0 * PIN_CLEARANCE, epsilon = 1e-12);
    }
    // Offsets sit symmetrically about the cut centre.
    assert_relative_eq!(holes[0].location.y, -holes[1].location.y, epsilon = 1e-9);
    assert_relative_eq!(holes[0].location.y.abs(), 30.0, epsilon = 1e-9);
    assert_relative_eq!(holes[0].location.z.abs(), 15.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_cut_axis_follows_largest_oversize() -> Result<()> {
    let mut scene = Scene::new();
    let mesh = block(&mut scene, 120.0, 400.0, 80.0)?;
    let leaves = split_object_for_plate(&mut scene, mesh, &BuildPlate::new(200.0, 250.0, 100.0), "plank")?;
    assert_eq!(leaves.len(), 2);
    let lower = scene.bounding_box(leaves[0].mesh())?;
    assert_relative_eq!(lower.max.y, 0.0, epsilon = 1e-6);
    assert_relative_eq!(lower.size().x, 120.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn test_resplitting_leaves_is_idempotent() -> Result<()> {
    let mut scene = Scene::new();
    let plate = BuildPlate::cube(256.0);
    let mesh = block(&mut scene, 600.0, 300.0, 100.0)?;
    let leaves = split_object_for_plate(&mut scene, mesh, &plate, "slab")?;
    let first: Vec<String> = leaves.iter().map(|s| s.name().to_string()).collect();

    let mut again = Vec::new();
    for leaf in leaves {
        again.extend(shardplate::split_segment_for_plate(&mut scene, leaf, &plate)?);
    }
    let second: Vec<String> = again.iter().map(|s| s.name().to_string()).collect();
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn test_splitting_is_deterministic() -> Result<()> {
    let run = || -> Result<Vec<(String, Vector3<f64>)>> {
        let mut scene = Scene::new();
        let mesh = block(&mut scene, 520.0, 300.0, 270.0)?;
        let mesh = scene.transform(mesh, &Transform::translate(12.0, -7.0, 3.0))?;
        let leaves = split_object_for_plate(&mut scene, mesh, &BuildPlate::cube(256.0), "part")?;
        leaves
            .iter()
            .map(|s| Ok((s.name().to_string(), scene.dimensions(s.mesh())?)))
            .collect()
    };
    let a = run()?;
    let b = run()?;
    assert_eq!(a.len(), b.len());
    for ((name_a, size_a), (name_b, size_b)) in a.iter().zip(&b) {
        assert_eq!(name_a, name_b);
        assert_relative_eq!(*size_a, *size_b, epsilon = 1e-12);
    }
    Ok(())
}

#[test]
fn test_leaf_names_are_unique() -> Result<()> {
    let mut scene = Scene::new();
    let plate = BuildPlate::cube(100.0);
    let mesh = block(&mut scene, 350.0, 220.0, 150.0)?;
    let leaves = split_object_for_plate(&mut scene, mesh, &plate, "hull")?;

    let unique: AHashSet<&str> = leaves.iter().map(|s| s.name()).collect();
    assert_eq!(unique.len(), leaves.len());
    for leaf in &leaves {
        assert!(leaf.name().starts_with("hull_sec"));
        assert!(plate.fits(&scene.dimensions(leaf.mesh())?), "{} does not fit", leaf.name());
    }
    assert_eq!(scene.mesh_count(), leaves.len());
    Ok(())
}

#[test]
fn test_mates_follow_recursive_splits() -> Result<()> {
    let mut scene = Scene::new();
    let mesh = block(&mut scene, 350.0, 220.0, 150.0)?;
    let leaves = split_object_for_plate(&mut scene, mesh, &BuildPlate::cube(100.0), "hull")?;
    let by_name = |name: &str| leaves.iter().find(|s| s.name() == name);

    let mut pins = 0;
    for leaf in &leaves {
        for connector in leaf.connectors() {
            let mate = connector.mate.as_deref().unwrap_or_default();
            let other = by_name(mate).unwrap_or_else(|| panic!("{} names missing mate {:?}", leaf.name(), mate));
            let counterpart: Vec<_> = other.connectors().iter().filter(|c| c.pairs_with(connector)).collect();
            assert_eq!(counterpart.len(), 1, "{} -> {}", leaf.name(), mate);
            assert_eq!(counterpart[0].mate.as_deref(), Some(leaf.name()));
            pins += 1;
        }
    }
    // Two pins per cut, two records per pin.
    assert_eq!(pins, 4 * (leaves.len() - 1));
    Ok(())
}

#[test]
fn test_depth_cap_stops_recursion() -> Result<()> {
    let mut scene = Scene::new();
    let plate = BuildPlate::cube(10.0);
    let mesh = block(&mut scene, 2000.0, 2000.0, 2000.0)?;
    let leaves = split_object_for_plate(&mut scene, mesh, &plate, "cube")?;

    assert_eq!(leaves.len(), 1 << MAX_SPLIT_DEPTH);
    for leaf in &leaves {
        assert_eq!(leaf.depth(), MAX_SPLIT_DEPTH);
        assert!(!plate.fits(&scene.dimensions(leaf.mesh())?));
    }
    Ok(())
}
