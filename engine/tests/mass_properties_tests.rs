//! Mass property integration against analytic solids

use std::f32::consts::PI;

use cinder_engine::physics::{Mat3, PhysicsError, Polyhedron, RigidBody, Vec3, compute_mass_properties};

// ============================================================================
// Helpers
// ============================================================================

/// UV sphere with poles on ±Z. Faces wind counter-clockwise from outside.
fn uv_sphere(radius: f32, stacks: usize, slices: usize) -> Polyhedron {
    let mut vertices = vec![Vec3::new(0.0, 0.0, radius)];
    for i in 1..stacks {
        let theta = PI * i as f32 / stacks as f32;
        for j in 0..slices {
            let phi = 2.0 * PI * j as f32 / slices as f32;
            vertices.push(radius * Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos()));
        }
    }
    let south = vertices.len();
    vertices.push(Vec3::new(0.0, 0.0, -radius));

    let ring = |i: usize, j: usize| 1 + (i - 1) * slices + (j % slices);
    let mut faces = Vec::new();
    for j in 0..slices {
        faces.push(vec![0, ring(1, j), ring(1, j + 1)]);
    }
    for i in 1..stacks - 1 {
        for j in 0..slices {
            faces.push(vec![ring(i, j), ring(i + 1, j), ring(i + 1, j + 1), ring(i, j + 1)]);
        }
    }
    for j in 0..slices {
        faces.push(vec![south, ring(stacks - 1, j + 1), ring(stacks - 1, j)]);
    }

    Polyhedron::new(vertices, faces).expect("sphere mesh is valid")
}

/// Right-triangle prism: legs of length 1 along X and Y, depth 1 along Z.
fn wedge() -> Polyhedron {
    Polyhedron::new(
        vec![
            Vec3::new(-0.5, -0.5, -0.5),
            Vec3::new(0.5, -0.5, -0.5),
            Vec3::new(-0.5, 0.5, -0.5),
            Vec3::new(-0.5, -0.5, 0.5),
            Vec3::new(0.5, -0.5, 0.5),
            Vec3::new(-0.5, 0.5, 0.5),
        ],
        vec![
            vec![0, 2, 1],
            vec![3, 4, 5],
            vec![0, 1, 4, 3],
            vec![0, 3, 5, 2],
            vec![1, 2, 5, 4],
        ],
    )
    .expect("wedge mesh is valid")
}

fn assert_mat3_close(a: Mat3, b: Mat3, tolerance: f32) {
    let (a, b) = (a.to_cols_array(), b.to_cols_array());
    for (x, y) in a.iter().zip(b.iter()) {
        assert!((x - y).abs() <= tolerance, "{a:?} vs {b:?}");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_cube_matches_closed_form() {
    let props = compute_mass_properties(&Polyhedron::cuboid(Vec3::ONE).unwrap(), 3.0).unwrap();

    assert!((props.volume - 8.0).abs() < 1e-5);
    assert!(props.center_of_mass.length() < 1e-6);
    // Side 2: m/12 * (2² + 2²) = 2
    assert_mat3_close(props.inertia_tensor, Mat3::from_diagonal(Vec3::splat(2.0)), 1e-5);
}

#[test]
fn test_sphere_approximation_converges_to_analytic() {
    let props = uv_sphere(1.0, 24, 48).mass_properties(1.0).unwrap();

    let analytic_volume = 4.0 / 3.0 * PI;
    assert!(((props.volume - analytic_volume) / analytic_volume).abs() < 0.02, "volume {}", props.volume);
    assert!(props.center_of_mass.length() < 1e-4);

    // Solid sphere: 2/5 m r²
    let i = props.inertia_tensor;
    for moment in [i.x_axis.x, i.y_axis.y, i.z_axis.z] {
        assert!(((moment - 0.4) / 0.4).abs() < 0.02, "moment {moment}");
    }
    for product in [i.x_axis.y, i.y_axis.z, i.z_axis.x] {
        assert!(product.abs() < 1e-4, "product {product}");
    }
}

#[test]
fn test_finer_sphere_is_closer() {
    let coarse = uv_sphere(1.0, 8, 16).mass_properties(1.0).unwrap();
    let fine = uv_sphere(1.0, 24, 48).mass_properties(1.0).unwrap();
    let analytic_volume = 4.0 / 3.0 * PI;

    assert!((fine.volume - analytic_volume).abs() < (coarse.volume - analytic_volume).abs());
    // Inscribed meshes always underestimate
    assert!(coarse.volume < fine.volume && fine.volume < analytic_volume);
}

#[test]
fn test_wedge_centroid_and_volume() {
    let props = wedge().mass_properties(300.0).unwrap();

    assert!((props.volume - 0.5).abs() < 1e-6);
    assert!((props.center_of_mass - Vec3::new(-1.0 / 6.0, -1.0 / 6.0, 0.0)).length() < 1e-6);
    assert!((props.density() - 600.0).abs() < 1e-3);

    // Symmetric across the slope: equal X and Y moments, a nonzero XY product
    let i = props.inertia_tensor;
    assert!((i.x_axis.x - i.y_axis.y).abs() < 1e-3);
    assert!(i.x_axis.y.abs() > 1e-3);
    assert!(i.y_axis.z.abs() < 1e-4 && i.z_axis.x.abs() < 1e-4);
}

#[test]
fn test_large_mesh_keeps_precision() {
    let props = Polyhedron::cuboid(Vec3::splat(50.0)).unwrap().mass_properties(1.0).unwrap();

    assert!(((props.volume - 1.0e6) / 1.0e6).abs() < 1e-6);
    let expected = 100.0 * 100.0 * 2.0 / 12.0;
    assert!(((props.inertia_tensor.x_axis.x - expected) / expected).abs() < 1e-5);
}

#[test]
fn test_far_from_origin_mesh() {
    let offset = Vec3::new(1000.0, -250.0, 40.0);
    let near = Polyhedron::cuboid(Vec3::new(1.0, 2.0, 0.5)).unwrap().mass_properties(6.0).unwrap();
    let far = Polyhedron::cuboid(Vec3::new(1.0, 2.0, 0.5))
        .unwrap()
        .translated(offset)
        .mass_properties(6.0)
        .unwrap();

    assert!((far.center_of_mass - offset).length() < 1e-2);
    assert_mat3_close(far.inertia_tensor, near.inertia_tensor, 1e-2);
}

#[test]
fn test_rigid_body_from_mesh_matches_cuboid_constructor() {
    let half_extents = Vec3::new(1.0, 0.5, 0.25);
    let props = Polyhedron::cuboid(half_extents).unwrap().mass_properties(12.0).unwrap();

    let from_mesh = RigidBody::from_mass_properties(&props, Vec3::ZERO).unwrap();
    let closed_form = RigidBody::cuboid(12.0, half_extents, Vec3::ZERO).unwrap();

    assert_mat3_close(
        from_mesh.inverse_inertia_tensor(),
        closed_form.inverse_inertia_tensor(),
        1e-4,
    );
}

#[test]
fn test_flat_mesh_is_degenerate() {
    // Two back-to-back triangles: closed, but no volume
    let flat = Polyhedron::new(
        vec![Vec3::ZERO, Vec3::X, Vec3::Y],
        vec![vec![0, 1, 2], vec![0, 2, 1]],
    )
    .unwrap();
    assert!(matches!(flat.mass_properties(1.0), Err(PhysicsError::DegenerateVolume(_))));
}

#[test]
fn test_hand_edited_mesh_is_rejected_not_panicking() {
    let mut cube = Polyhedron::cuboid(Vec3::ONE).unwrap();
    cube.faces[0].indices[0] = 99;
    assert!(matches!(compute_mass_properties(&cube, 1.0), Err(PhysicsError::InvalidInput(_))));

    let mut cube = Polyhedron::cuboid(Vec3::ONE).unwrap();
    cube.faces[2].indices.truncate(2);
    assert!(matches!(cube.mass_properties(1.0), Err(PhysicsError::InvalidInput(_))));

    let mut cube = Polyhedron::cuboid(Vec3::ONE).unwrap();
    cube.vertices[3] = Vec3::new(f32::NAN, 0.0, 0.0);
    assert!(matches!(cube.mass_properties(1.0), Err(PhysicsError::InvalidInput(_))));
}
