//! Contact generators
//!
//! A [`ContactGenerator`] inspects the bodies once per step and writes
//! [`ParticleContact`]s for whatever constraint it enforces. This is how a
//! collision-detection stage plugs into the scene, and how simple
//! constraints are expressed as contacts the resolver already understands:
//!
//! - [`Cable`] - maximum separation between two bodies, with bounce
//! - [`Rod`] - fixed separation between two bodies
//! - [`GroundPlane`] - keeps point bodies above a horizontal plane
//!
//! # Example
//!
//! ```ignore
//! use cinder_engine::physics::{Cable, PhysicsScene, Particle};
//!
//! let mut scene = PhysicsScene::<Particle>::default();
//! let a = scene.spawn(Particle::new(1.0, Vec3::ZERO)?);
//! let b = scene.spawn(Particle::new(1.0, Vec3::X)?);
//! scene.add_contact_generator(Box::new(Cable::new([a, b], 2.0, 0.3)));
//! ```

use glam::Vec3;

use super::arena::{BodyHandle, BodySet};
use super::contact::ParticleContact;
use super::dynamics::Dynamics;
use super::types::EPSILON;

/// Writes contacts for the current body state.
pub trait ContactGenerator<B>: Send + Sync {
    /// Appends at most `limit` contacts to `out`.
    ///
    /// # Returns
    ///
    /// The number of contacts written
    fn add_contact(&self, bodies: &BodySet<B>, out: &mut Vec<ParticleContact>, limit: usize) -> usize;
}

/// Current separation between two linked bodies.
///
/// `None` when either body is gone or the two coincide, since no contact
/// direction exists then.
fn link_state<B: Dynamics>(bodies: &BodySet<B>, link: [BodyHandle; 2]) -> Option<(Vec3, f32)> {
    let first = bodies.get(link[0])?.position();
    let second = bodies.get(link[1])?.position();
    let offset = second - first;
    let length = offset.length();
    if length <= EPSILON {
        return None;
    }
    Some((offset / length, length))
}

// ============================================================================
// CABLE
// ============================================================================

/// Inextensible but slack link. Produces a contact only when overstretched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cable {
    pub bodies: [BodyHandle; 2],
    /// Length beyond which the cable goes taut (meters)
    pub max_length: f32,
    /// Bounce when the cable snaps taut
    pub restitution: f32,
}

impl Cable {
    pub fn new(bodies: [BodyHandle; 2], max_length: f32, restitution: f32) -> Self {
        Self {
            bodies,
            max_length,
            restitution,
        }
    }
}

impl<B: Dynamics> ContactGenerator<B> for Cable {
    fn add_contact(&self, bodies: &BodySet<B>, out: &mut Vec<ParticleContact>, limit: usize) -> usize {
        if limit == 0 {
            return 0;
        }
        let Some((direction, length)) = link_state(bodies, self.bodies) else {
            return 0;
        };
        if length < self.max_length {
            return 0;
        }

        // Normal points from the first body toward the second: pulling them together
        match ParticleContact::new(
            self.bodies[0],
            Some(self.bodies[1]),
            direction,
            length - self.max_length,
            self.restitution,
        ) {
            Ok(contact) => {
                out.push(contact);
                1
            }
            Err(_) => 0,
        }
    }
}

// ============================================================================
// ROD
// ============================================================================

/// Rigid link that keeps two bodies exactly `length` apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rod {
    pub bodies: [BodyHandle; 2],
    pub length: f32,
}

impl Rod {
    pub fn new(bodies: [BodyHandle; 2], length: f32) -> Self {
        Self { bodies, length }
    }
}

impl<B: Dynamics> ContactGenerator<B> for Rod {
    fn add_contact(&self, bodies: &BodySet<B>, out: &mut Vec<ParticleContact>, limit: usize) -> usize {
        if limit == 0 {
            return 0;
        }
        let Some((direction, current)) = link_state(bodies, self.bodies) else {
            return 0;
        };
        if (current - self.length).abs() <= EPSILON {
            return 0;
        }

        // Too long: pull together. Too short: push apart.
        let (normal, penetration) = if current > self.length {
            (direction, current - self.length)
        } else {
            (-direction, self.length - current)
        };

        match ParticleContact::new(self.bodies[0], Some(self.bodies[1]), normal, penetration, 0.0) {
            Ok(contact) => {
                out.push(contact);
                1
            }
            Err(_) => 0,
        }
    }
}

// ============================================================================
// GROUND PLANE
// ============================================================================

/// Horizontal floor at `y = height` for every movable body in the set.
///
/// Bodies are treated as points at their center of mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundPlane {
    pub height: f32,
    pub restitution: f32,
}

impl GroundPlane {
    pub fn new(height: f32, restitution: f32) -> Self {
        Self { height, restitution }
    }
}

impl Default for GroundPlane {
    fn default() -> Self {
        Self::new(0.0, 0.2)
    }
}

impl<B: Dynamics> ContactGenerator<B> for GroundPlane {
    fn add_contact(&self, bodies: &BodySet<B>, out: &mut Vec<ParticleContact>, limit: usize) -> usize {
        let mut written = 0;
        for (handle, body) in bodies.iter() {
            if written >= limit {
                break;
            }
            if !body.has_finite_mass() {
                continue;
            }
            let depth = self.height - body.position().y;
            if depth <= 0.0 {
                continue;
            }
            if let Ok(contact) = ParticleContact::new(handle, None, Vec3::Y, depth, self.restitution) {
                out.push(contact);
                written += 1;
            }
        }
        written
    }
}
