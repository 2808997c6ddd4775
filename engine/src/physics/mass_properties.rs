//! Mass properties of closed polyhedra
//!
//! Computes volume, center of mass and inertia tensor of a closed polyhedral
//! mesh using Mirtich's method ("Fast and Accurate Computation of Polyhedral
//! Mass Properties", 1996). The divergence theorem turns the volume integrals
//! into sums of per-face surface integrals, and each face integral is reduced
//! to a line integral around the face projected onto its dominant plane.
//!
//! The pipeline per face:
//!
//! 1. pick the projection axis `C` as the largest normal component, with `A`
//!    and `B` following it cyclically
//! 2. projection integrals `P1, Pa, Pb, Paa, ...` by walking the face edges
//! 3. face integrals `Fa, Fb, Fc, Faa, ...` lifted with the plane equation
//! 4. volume integrals `T0, T1, T2, TP` accumulated with normal weights
//!
//! All sums run in `f64`; meshes with many small faces would otherwise lose
//! most of their precision to cancellation.
//!
//! # Example
//!
//! ```ignore
//! use cinder_engine::physics::{Polyhedron, Vec3};
//!
//! let crate_mesh = Polyhedron::cuboid(Vec3::new(0.5, 0.5, 1.0))?;
//! let props = crate_mesh.mass_properties(20.0)?;
//! let body = RigidBody::from_mass_properties(&props, Vec3::new(0.0, 3.0, 0.0))?;
//! ```

use glam::{DMat3, DVec3, Mat3, Vec3};

use super::error::{PhysicsError, Result, validate_mass};

/// One planar face of a polyhedron.
///
/// Vertices are listed counter-clockwise when viewed from outside, so the
/// normal points out of the solid. The plane is `normal · p + offset = 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub indices: Vec<usize>,
    pub normal: Vec3,
    pub offset: f32,
}

/// A closed polyhedral mesh.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Polyhedron {
    pub vertices: Vec<Vec3>,
    pub faces: Vec<Face>,
}

/// Integrated mass properties of a solid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MassProperties {
    /// Total mass (kilograms)
    pub mass: f32,
    /// Enclosed volume (cubic meters)
    pub volume: f32,
    /// Center of mass in mesh space
    pub center_of_mass: Vec3,
    /// Inertia tensor about the center of mass, mesh axes
    pub inertia_tensor: Mat3,
}

impl MassProperties {
    pub fn density(&self) -> f32 {
        self.mass / self.volume
    }

    /// Inverse of the inertia tensor, or `SingularInertia`.
    pub fn inverse_inertia_tensor(&self) -> Result<Mat3> {
        let inverse = self.inertia_tensor.inverse();
        if self.inertia_tensor.determinant() == 0.0 || !inverse.is_finite() {
            return Err(PhysicsError::SingularInertia);
        }
        Ok(inverse)
    }
}

impl Polyhedron {
    /// Builds a polyhedron from vertices and per-face vertex index loops.
    ///
    /// Face planes are computed with Newell's method, which is robust for
    /// any planar polygon regardless of which vertices are collinear.
    ///
    /// # Errors
    ///
    /// `InvalidInput` for faces with fewer than 3 vertices, out-of-range
    /// indices, non-finite vertices or zero-area faces.
    pub fn new(vertices: Vec<Vec3>, face_indices: Vec<Vec<usize>>) -> Result<Self> {
        if let Some(bad) = vertices.iter().position(|v| !v.is_finite()) {
            return Err(PhysicsError::invalid(format!("vertex {bad} is not finite")));
        }

        let mut faces = Vec::with_capacity(face_indices.len());
        for (face_index, indices) in face_indices.into_iter().enumerate() {
            if indices.len() < 3 {
                return Err(PhysicsError::invalid(format!(
                    "face {face_index} has {} vertices, need at least 3",
                    indices.len()
                )));
            }
            if let Some(&bad) = indices.iter().find(|&&i| i >= vertices.len()) {
                return Err(PhysicsError::invalid(format!(
                    "face {face_index} references vertex {bad} of {}",
                    vertices.len()
                )));
            }

            let (normal, offset) = face_plane(&vertices, &indices).ok_or_else(|| {
                PhysicsError::invalid(format!("face {face_index} has zero area"))
            })?;
            faces.push(Face {
                indices,
                normal,
                offset,
            });
        }

        Ok(Self { vertices, faces })
    }

    /// Axis-aligned box centered on the origin.
    pub fn cuboid(half_extents: Vec3) -> Result<Self> {
        let h = half_extents;
        let vertices = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 4 != 0 { h.x } else { -h.x },
                    if i & 2 != 0 { h.y } else { -h.y },
                    if i & 1 != 0 { h.z } else { -h.z },
                )
            })
            .collect();
        let faces = vec![
            vec![0, 1, 3, 2], // -X
            vec![4, 6, 7, 5], // +X
            vec![0, 4, 5, 1], // -Y
            vec![2, 3, 7, 6], // +Y
            vec![0, 2, 6, 4], // -Z
            vec![1, 5, 7, 3], // +Z
        ];
        Self::new(vertices, faces)
    }

    /// Returns a copy with every vertex offset by `offset`.
    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            vertices: self.vertices.iter().map(|v| *v + offset).collect(),
            faces: self
                .faces
                .iter()
                .map(|face| Face {
                    indices: face.indices.clone(),
                    normal: face.normal,
                    offset: face.offset - face.normal.dot(offset),
                })
                .collect(),
        }
    }

    /// Shorthand for [`compute_mass_properties`].
    pub fn mass_properties(&self, mass: f32) -> Result<MassProperties> {
        compute_mass_properties(self, mass)
    }
}

/// Newell normal and plane offset of a face, `None` if it has no area.
fn face_plane(vertices: &[Vec3], indices: &[usize]) -> Option<(Vec3, f32)> {
    let mut normal = DVec3::ZERO;
    let mut centroid = DVec3::ZERO;
    for (i, &index) in indices.iter().enumerate() {
        let current = vertices[index].as_dvec3();
        let next = vertices[indices[(i + 1) % indices.len()]].as_dvec3();
        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
        centroid += current;
    }
    centroid /= indices.len() as f64;

    let length = normal.length();
    if length <= f64::EPSILON {
        return None;
    }
    let normal = normal / length;
    Some((normal.as_vec3(), (-normal.dot(centroid)) as f32))
}

/// Projection integrals over a face projected onto the A-B plane.
#[derive(Debug, Default)]
struct ProjectionIntegrals {
    p1: f64,
    pa: f64,
    pb: f64,
    paa: f64,
    pab: f64,
    pbb: f64,
    paaa: f64,
    paab: f64,
    pabb: f64,
    pbbb: f64,
}

impl ProjectionIntegrals {
    fn compute(points: &[DVec3], a: usize, b: usize) -> Self {
        let mut p = Self::default();

        for (i, current) in points.iter().enumerate() {
            let next = points[(i + 1) % points.len()];
            let (a0, b0) = (current[a], current[b]);
            let (a1, b1) = (next[a], next[b]);
            let da = a1 - a0;
            let db = b1 - b0;

            let a0_2 = a0 * a0;
            let a0_3 = a0_2 * a0;
            let a0_4 = a0_3 * a0;
            let b0_2 = b0 * b0;
            let b0_3 = b0_2 * b0;
            let b0_4 = b0_3 * b0;
            let a1_2 = a1 * a1;
            let a1_3 = a1_2 * a1;
            let b1_2 = b1 * b1;
            let b1_3 = b1_2 * b1;

            let c1 = a1 + a0;
            let ca = a1 * c1 + a0_2;
            let caa = a1 * ca + a0_3;
            let caaa = a1 * caa + a0_4;
            let cb = b1 * (b1 + b0) + b0_2;
            let cbb = b1 * cb + b0_3;
            let cbbb = b1 * cbb + b0_4;
            let cab = 3.0 * a1_2 + 2.0 * a1 * a0 + a0_2;
            let kab = a1_2 + 2.0 * a1 * a0 + 3.0 * a0_2;
            let caab = a0 * cab + 4.0 * a1_3;
            let kaab = a1 * kab + 4.0 * a0_3;
            let cabb = 4.0 * b1_3 + 3.0 * b1_2 * b0 + 2.0 * b1 * b0_2 + b0_3;
            let kabb = b1_3 + 2.0 * b1_2 * b0 + 3.0 * b1 * b0_2 + 4.0 * b0_3;

            p.p1 += db * c1;
            p.pa += db * ca;
            p.paa += db * caa;
            p.paaa += db * caaa;
            p.pb += da * cb;
            p.pbb += da * cbb;
            p.pbbb += da * cbbb;
            p.pab += db * (b1 * cab + b0 * kab);
            p.paab += db * (b1 * caab + b0 * kaab);
            p.pabb += da * (a1 * cabb + a0 * kabb);
        }

        p.p1 /= 2.0;
        p.pa /= 6.0;
        p.paa /= 12.0;
        p.paaa /= 20.0;
        p.pb /= -6.0;
        p.pbb /= -12.0;
        p.pbbb /= -20.0;
        p.pab /= 24.0;
        p.paab /= 60.0;
        p.pabb /= -60.0;
        p
    }
}

/// Surface integrals over one face, in the face's (A, B, C) axes.
#[derive(Debug)]
struct FaceIntegrals {
    fa: f64,
    fb: f64,
    fc: f64,
    faa: f64,
    fbb: f64,
    fcc: f64,
    faaa: f64,
    fbbb: f64,
    fccc: f64,
    faab: f64,
    fbbc: f64,
    fcca: f64,
}

impl FaceIntegrals {
    fn compute(points: &[DVec3], normal: DVec3, w: f64, axes: [usize; 3]) -> Self {
        let [a, b, c] = axes;
        let p = ProjectionIntegrals::compute(points, a, b);
        let (na, nb) = (normal[a], normal[b]);

        let k1 = 1.0 / normal[c];
        let k2 = k1 * k1;
        let k3 = k2 * k1;
        let k4 = k3 * k1;

        let quadratic = na * na * p.paa + 2.0 * na * nb * p.pab + nb * nb * p.pbb;

        Self {
            fa: k1 * p.pa,
            fb: k1 * p.pb,
            fc: -k2 * (na * p.pa + nb * p.pb + w * p.p1),
            faa: k1 * p.paa,
            fbb: k1 * p.pbb,
            fcc: k3 * (quadratic + w * (2.0 * (na * p.pa + nb * p.pb) + w * p.p1)),
            faaa: k1 * p.paaa,
            fbbb: k1 * p.pbbb,
            fccc: -k4
                * (na * na * na * p.paaa
                    + 3.0 * na * na * nb * p.paab
                    + 3.0 * na * nb * nb * p.pabb
                    + nb * nb * nb * p.pbbb
                    + 3.0 * w * quadratic
                    + w * w * (3.0 * (na * p.pa + nb * p.pb) + w * p.p1)),
            faab: k1 * p.paab,
            fbbc: -k2 * (na * p.pabb + nb * p.pbbb + w * p.pbb),
            fcca: k3
                * (na * na * p.paaa
                    + 2.0 * na * nb * p.paab
                    + nb * nb * p.pabb
                    + w * (2.0 * (na * p.paa + nb * p.pab) + w * p.pa)),
        }
    }
}

/// Volume integrals of 1, x, y, z, x², y², z², xy, yz, zx over the solid.
#[derive(Debug, Default)]
struct VolumeIntegrals {
    /// Volume
    t0: f64,
    /// First moments
    t1: DVec3,
    /// Second moments
    t2: DVec3,
    /// Products xy, yz, zx
    tp: DVec3,
}

impl VolumeIntegrals {
    fn compute(polyhedron: &Polyhedron) -> Self {
        let mut t = Self::default();
        let mut points = Vec::new();

        for face in &polyhedron.faces {
            let normal = face.normal.as_dvec3();
            let abs = normal.abs();
            let c = if abs.x > abs.y && abs.x > abs.z {
                0
            } else if abs.y > abs.z {
                1
            } else {
                2
            };
            let a = (c + 1) % 3;
            let b = (a + 1) % 3;

            points.clear();
            points.extend(face.indices.iter().map(|&i| polyhedron.vertices[i].as_dvec3()));
            let f = FaceIntegrals::compute(&points, normal, face.offset as f64, [a, b, c]);

            t.t0 += normal.x
                * if a == 0 {
                    f.fa
                } else if b == 0 {
                    f.fb
                } else {
                    f.fc
                };

            t.t1[a] += normal[a] * f.faa;
            t.t1[b] += normal[b] * f.fbb;
            t.t1[c] += normal[c] * f.fcc;
            t.t2[a] += normal[a] * f.faaa;
            t.t2[b] += normal[b] * f.fbbb;
            t.t2[c] += normal[c] * f.fccc;
            t.tp[a] += normal[a] * f.faab;
            t.tp[b] += normal[b] * f.fbbc;
            t.tp[c] += normal[c] * f.fcca;
        }

        t.t1 /= 2.0;
        t.t2 /= 3.0;
        t.tp /= 2.0;
        t
    }
}

/// Face topology check for meshes assembled without [`Polyhedron::new`].
fn validate_faces(polyhedron: &Polyhedron) -> Result<()> {
    let count = polyhedron.vertices.len();
    if let Some(bad) = polyhedron.vertices.iter().position(|v| !v.is_finite()) {
        return Err(PhysicsError::invalid(format!("vertex {bad} is not finite")));
    }
    for (face_index, face) in polyhedron.faces.iter().enumerate() {
        if face.indices.len() < 3 {
            return Err(PhysicsError::invalid(format!(
                "face {face_index} has {} vertices, need at least 3",
                face.indices.len()
            )));
        }
        if let Some(&bad) = face.indices.iter().find(|&&i| i >= count) {
            return Err(PhysicsError::invalid(format!(
                "face {face_index} references vertex {bad} of {count}"
            )));
        }
    }
    Ok(())
}

/// Computes volume, center of mass and inertia tensor for a solid of uniform
/// density whose total mass is `mass`.
///
/// # Errors
///
/// - `InvalidInput` if `mass` is not finite and positive, or if a face has
///   fewer than 3 vertices or references a vertex that does not exist
/// - `DegenerateVolume` if the mesh encloses no positive volume, which also
///   catches meshes wound inside-out
pub fn compute_mass_properties(polyhedron: &Polyhedron, mass: f32) -> Result<MassProperties> {
    validate_mass(mass)?;
    validate_faces(polyhedron)?;

    let t = VolumeIntegrals::compute(polyhedron);
    if !(t.t0.is_finite() && t.t0 > f64::EPSILON) {
        return Err(PhysicsError::DegenerateVolume(t.t0));
    }

    let mass_d = mass as f64;
    let density = mass_d / t.t0;
    let r = t.t1 / t.t0;

    // Inertia about the mesh origin
    let mut ixx = density * (t.t2.y + t.t2.z);
    let mut iyy = density * (t.t2.z + t.t2.x);
    let mut izz = density * (t.t2.x + t.t2.y);
    let mut ixy = -density * t.tp.x;
    let mut iyz = -density * t.tp.y;
    let mut izx = -density * t.tp.z;

    // Parallel axis shift to the center of mass. Products of inertia carry
    // the opposite sign of the moments: I_xy = -∫xy dm.
    ixx -= mass_d * (r.y * r.y + r.z * r.z);
    iyy -= mass_d * (r.z * r.z + r.x * r.x);
    izz -= mass_d * (r.x * r.x + r.y * r.y);
    ixy += mass_d * r.x * r.y;
    iyz += mass_d * r.y * r.z;
    izx += mass_d * r.z * r.x;

    let inertia = DMat3::from_cols(
        DVec3::new(ixx, ixy, izx),
        DVec3::new(ixy, iyy, iyz),
        DVec3::new(izx, iyz, izz),
    );

    Ok(MassProperties {
        mass,
        volume: t.t0 as f32,
        center_of_mass: r.as_vec3(),
        inertia_tensor: inertia.as_mat3(),
    })
}
