//! Physics type re-exports from glam
//!
//! Single-precision types carry body state; the double-precision variants are
//! used where long summations need the headroom (mass property integrals).

pub use glam::{DMat3, DVec3, Mat3, Mat4, Quat, Vec3};

/// Tolerance below which a length is treated as zero.
pub const EPSILON: f32 = 1e-6;
