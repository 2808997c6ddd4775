//! Force generators
//!
//! A [`ForceGenerator`] computes one force contribution for one body at one
//! instant and adds it to that body's accumulators. Generators are shared
//! trait objects so the same spring constant or drag profile can act on many
//! bodies, and games can add their own kinds (thrusters, wind, explosions)
//! without touching the engine.
//!
//! Built-in generators:
//!
//! - [`Gravity`] - constant acceleration, force proportional to mass
//! - [`Drag`] - opposes velocity, linear plus quadratic in speed
//! - [`Spring`] - Hooke spring between anchor points on two bodies
//! - [`AnchoredSpring`] - Hooke spring to a fixed world point
//! - [`Buoyancy`] - lift from a horizontal liquid plane
//!
//! Degenerate configurations (zero-length springs, bodies at rest under drag,
//! removed partner bodies) contribute nothing rather than producing NaN.

use glam::Vec3;

use super::arena::{BodyHandle, BodySet};
use super::dynamics::Dynamics;
use super::types::EPSILON;

/// Adds a force (and possibly torque) to a body.
pub trait ForceGenerator<B>: Send + Sync {
    /// Adds this generator's contribution to `target` for a step of `dt`.
    ///
    /// Generators that depend on other bodies read them through `bodies`.
    /// A stale `target` is ignored.
    fn update_force(&self, target: BodyHandle, bodies: &mut BodySet<B>, dt: f32);
}

/// Uniform gravitational field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gravity {
    /// Acceleration vector (m/s²)
    pub acceleration: Vec3,
}

impl Gravity {
    pub fn new(acceleration: Vec3) -> Self {
        Self { acceleration }
    }
}

impl Default for Gravity {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -9.81, 0.0))
    }
}

impl<B: Dynamics> ForceGenerator<B> for Gravity {
    fn update_force(&self, target: BodyHandle, bodies: &mut BodySet<B>, _dt: f32) {
        let Some(body) = bodies.get_mut(target) else {
            return;
        };
        if !body.has_finite_mass() {
            return;
        }
        let force = self.acceleration * body.mass();
        body.add_force(force);
    }
}

/// Velocity-dependent drag: `F = -v̂ (k1 |v| + k2 |v|²)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drag {
    /// Linear coefficient
    pub k1: f32,
    /// Quadratic coefficient
    pub k2: f32,
}

impl Drag {
    pub fn new(k1: f32, k2: f32) -> Self {
        Self { k1, k2 }
    }

    /// Drag force for a given velocity, zero when at rest.
    pub fn force_for(&self, velocity: Vec3) -> Vec3 {
        let speed = velocity.length();
        if speed <= EPSILON {
            return Vec3::ZERO;
        }
        let magnitude = self.k1 * speed + self.k2 * speed * speed;
        -velocity / speed * magnitude
    }
}

impl<B: Dynamics> ForceGenerator<B> for Drag {
    fn update_force(&self, target: BodyHandle, bodies: &mut BodySet<B>, _dt: f32) {
        let Some(body) = bodies.get_mut(target) else {
            return;
        };
        let force = self.force_for(body.velocity());
        body.add_force(force);
    }
}

/// Hooke force on the end at `anchor`, pulled toward `other_end`.
///
/// The magnitude is proportional to the signed deviation from rest length,
/// so a compressed spring pushes and a stretched one pulls.
fn spring_force(anchor: Vec3, other_end: Vec3, spring_constant: f32, rest_length: f32) -> Option<Vec3> {
    let offset = anchor - other_end;
    let length = offset.length();
    if length <= EPSILON {
        return None;
    }
    let magnitude = -spring_constant * (length - rest_length);
    Some(offset / length * magnitude)
}

/// Spring connecting a point on the target body to a point on another body.
///
/// Register it against the target only; add a mirrored spring for the other
/// body if both ends should feel the force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    /// Attachment point on the target, body space
    pub local_anchor: Vec3,
    /// The body at the other end
    pub other: BodyHandle,
    /// Attachment point on the other body, body space
    pub other_anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl Spring {
    pub fn new(
        local_anchor: Vec3,
        other: BodyHandle,
        other_anchor: Vec3,
        spring_constant: f32,
        rest_length: f32,
    ) -> Self {
        Self {
            local_anchor,
            other,
            other_anchor,
            spring_constant,
            rest_length,
        }
    }
}

impl<B: Dynamics> ForceGenerator<B> for Spring {
    fn update_force(&self, target: BodyHandle, bodies: &mut BodySet<B>, _dt: f32) {
        let Some(other) = bodies.get(self.other) else {
            return;
        };
        let other_end = other.point_in_world_space(self.other_anchor);

        let Some(body) = bodies.get_mut(target) else {
            return;
        };
        let anchor = body.point_in_world_space(self.local_anchor);
        if let Some(force) = spring_force(anchor, other_end, self.spring_constant, self.rest_length) {
            body.add_force_at_point(force, anchor);
        }
    }
}

/// Spring connecting a point on the target body to a fixed world point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchoredSpring {
    /// Attachment point on the target, body space
    pub local_anchor: Vec3,
    /// Fixed end in world space
    pub world_anchor: Vec3,
    pub spring_constant: f32,
    pub rest_length: f32,
}

impl AnchoredSpring {
    pub fn new(local_anchor: Vec3, world_anchor: Vec3, spring_constant: f32, rest_length: f32) -> Self {
        Self {
            local_anchor,
            world_anchor,
            spring_constant,
            rest_length,
        }
    }
}

impl<B: Dynamics> ForceGenerator<B> for AnchoredSpring {
    fn update_force(&self, target: BodyHandle, bodies: &mut BodySet<B>, _dt: f32) {
        let Some(body) = bodies.get_mut(target) else {
            return;
        };
        let anchor = body.point_in_world_space(self.local_anchor);
        if let Some(force) =
            spring_force(anchor, self.world_anchor, self.spring_constant, self.rest_length)
        {
            body.add_force_at_point(force, anchor);
        }
    }
}

/// Buoyant lift from a liquid whose surface is the plane `y = liquid_height`.
///
/// The submerged fraction ramps linearly from 0 when the centre of buoyancy
/// is `max_depth` above the surface to 1 when it is `max_depth` below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Buoyancy {
    /// Point where lift is applied, body space
    pub centre_of_buoyancy: Vec3,
    /// Depth over which the body goes from dry to fully submerged (meters)
    pub max_depth: f32,
    /// Displaced volume when fully submerged (m³)
    pub volume: f32,
    /// Height of the liquid surface (meters)
    pub liquid_height: f32,
    /// Liquid density (kg/m³); water is 1000
    pub liquid_density: f32,
    /// Gravitational acceleration magnitude (m/s²)
    pub gravity: f32,
}

impl Buoyancy {
    pub fn new(centre_of_buoyancy: Vec3, max_depth: f32, volume: f32, liquid_height: f32) -> Self {
        Self {
            centre_of_buoyancy,
            max_depth,
            volume,
            liquid_height,
            liquid_density: 1000.0,
            gravity: 9.81,
        }
    }

    /// Fraction of the volume below the surface for a given height.
    pub fn submerged_fraction(&self, height: f32) -> f32 {
        if self.max_depth <= EPSILON {
            return if height < self.liquid_height { 1.0 } else { 0.0 };
        }
        let depth = self.liquid_height + self.max_depth - height;
        (depth / (2.0 * self.max_depth)).clamp(0.0, 1.0)
    }
}

impl<B: Dynamics> ForceGenerator<B> for Buoyancy {
    fn update_force(&self, target: BodyHandle, bodies: &mut BodySet<B>, _dt: f32) {
        let Some(body) = bodies.get_mut(target) else {
            return;
        };
        let centre = body.point_in_world_space(self.centre_of_buoyancy);
        let fraction = self.submerged_fraction(centre.y);
        if fraction <= 0.0 {
            return;
        }
        let lift = self.liquid_density * self.volume * self.gravity * fraction;
        body.add_force_at_point(Vec3::new(0.0, lift, 0.0), centre);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::particle::Particle;
    use crate::physics::rigid_body::RigidBody;
    use glam::Quat;

    #[test]
    fn test_gravity_scales_with_mass() {
        let mut bodies = BodySet::new();
        let heavy = bodies.insert(Particle::new(5.0, Vec3::ZERO).unwrap());
        let wall = bodies.insert(Particle::immovable(Vec3::ZERO));

        let gravity = Gravity::default();
        gravity.update_force(heavy, &mut bodies, 0.01);
        gravity.update_force(wall, &mut bodies, 0.01);

        let force = bodies.get(heavy).unwrap().accumulated_force();
        assert!((force.y + 49.05).abs() < 1e-4);
        assert_eq!(bodies.get(wall).unwrap().accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn test_drag_opposes_velocity() {
        let drag = Drag::new(0.5, 0.1);
        let force = drag.force_for(Vec3::new(0.0, 0.0, 10.0));
        // 0.5 * 10 + 0.1 * 100 = 15
        assert!((force - Vec3::new(0.0, 0.0, -15.0)).length() < 1e-4);
        assert_eq!(drag.force_for(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn test_spring_pulls_when_stretched_and_pushes_when_compressed() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::new(3.0, 0.0, 0.0)).unwrap());
        let b = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());

        let spring = Spring::new(Vec3::ZERO, b, Vec3::ZERO, 2.0, 1.0);
        spring.update_force(a, &mut bodies, 0.01);
        // Stretched by 2: pulled toward b with 4 N
        let force = bodies.get(a).unwrap().accumulated_force();
        assert!((force - Vec3::new(-4.0, 0.0, 0.0)).length() < 1e-5);

        bodies.get_mut(a).unwrap().clear_forces();
        bodies.get_mut(a).unwrap().position = Vec3::new(0.5, 0.0, 0.0);
        spring.update_force(a, &mut bodies, 0.01);
        // Compressed by 0.5: pushed away with 1 N
        let force = bodies.get(a).unwrap().accumulated_force();
        assert!((force - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_zero_length_spring_is_skipped() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::ONE).unwrap());
        let spring = AnchoredSpring::new(Vec3::ZERO, Vec3::ONE, 10.0, 1.0);
        spring.update_force(a, &mut bodies, 0.01);
        assert_eq!(bodies.get(a).unwrap().accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn test_spring_with_removed_partner_is_skipped() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::X * 5.0).unwrap());
        let b = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        bodies.remove(b);

        Spring::new(Vec3::ZERO, b, Vec3::ZERO, 1.0, 1.0).update_force(a, &mut bodies, 0.01);
        assert_eq!(bodies.get(a).unwrap().accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn test_spring_at_offset_anchor_applies_torque() {
        let mut bodies = BodySet::new();
        let body = RigidBody::cuboid(1.0, Vec3::splat(0.5), Vec3::ZERO)
            .unwrap()
            .with_orientation(Quat::IDENTITY);
        let handle = bodies.insert(body);

        // Anchor on the +X face, pulled straight up
        let spring = AnchoredSpring::new(Vec3::new(0.5, 0.0, 0.0), Vec3::new(0.5, 2.0, 0.0), 1.0, 0.0);
        spring.update_force(handle, &mut bodies, 0.01);

        let body = bodies.get(handle).unwrap();
        assert!((body.accumulated_force() - Vec3::new(0.0, 2.0, 0.0)).length() < 1e-5);
        // r × F = (0.5, 0, 0) × (0, 2, 0) = (0, 0, 1)
        assert!((body.accumulated_torque() - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_buoyancy_fraction() {
        let buoyancy = Buoyancy::new(Vec3::ZERO, 0.5, 0.1, 0.0);
        assert_eq!(buoyancy.submerged_fraction(1.0), 0.0);
        assert_eq!(buoyancy.submerged_fraction(-1.0), 1.0);
        assert!((buoyancy.submerged_fraction(0.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_buoyancy_lifts_submerged_body() {
        let mut bodies = BodySet::new();
        let p = bodies.insert(Particle::new(50.0, Vec3::new(0.0, -2.0, 0.0)).unwrap());
        Buoyancy::new(Vec3::ZERO, 0.5, 0.1, 0.0).update_force(p, &mut bodies, 0.01);

        let force = bodies.get(p).unwrap().accumulated_force();
        assert!((force.y - 1000.0 * 0.1 * 9.81).abs() < 1e-2);
    }
}
