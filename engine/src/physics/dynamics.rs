//! The body contract shared by rigid bodies and particles
//!
//! Force generators, the force registry, the contact resolver and the scene
//! are all written against [`Dynamics`], so the same pipeline drives a world
//! of [`RigidBody`](super::rigid_body::RigidBody) or of plain
//! [`Particle`](super::particle::Particle)s.

use glam::{Quat, Vec3};

use super::error::Result;

/// State and operations every simulated body provides.
pub trait Dynamics {
    /// Center of mass in world space.
    fn position(&self) -> Vec3;
    fn set_position(&mut self, position: Vec3);

    /// Linear velocity in world space.
    fn velocity(&self) -> Vec3;
    fn set_velocity(&mut self, velocity: Vec3);

    /// Linear acceleration the body experienced over the last integration.
    ///
    /// Used to tell resting contacts apart from real collisions.
    fn acceleration(&self) -> Vec3;

    /// World orientation. Point masses have none.
    fn orientation(&self) -> Quat {
        Quat::IDENTITY
    }

    /// Inverse mass; zero means immovable.
    fn inverse_mass(&self) -> f32;

    fn has_finite_mass(&self) -> bool {
        self.inverse_mass() > 0.0
    }

    /// Mass, or infinity for immovable bodies.
    fn mass(&self) -> f32 {
        let inverse_mass = self.inverse_mass();
        if inverse_mass > 0.0 {
            1.0 / inverse_mass
        } else {
            f32::INFINITY
        }
    }

    /// Sets the fraction of linear and angular velocity kept per second.
    fn set_damping(&mut self, linear: f32, angular: f32);

    /// Converts a body-space point to world space.
    fn point_in_world_space(&self, local_point: Vec3) -> Vec3;

    /// Adds a force through the center of mass.
    fn add_force(&mut self, force: Vec3);

    /// Adds a world-space force applied at a world-space point.
    fn add_force_at_point(&mut self, force: Vec3, world_point: Vec3);

    /// Adds a world-space force applied at a body-space point.
    fn add_world_force_at_local_point(&mut self, force: Vec3, local_point: Vec3) {
        let world_point = self.point_in_world_space(local_point);
        self.add_force_at_point(force, world_point);
    }

    /// Zeroes the force (and torque) accumulators.
    fn clear_forces(&mut self);

    /// Refreshes cached world-space data from position and orientation.
    fn calculate_derived_data(&mut self) {}

    /// Advances the body by `dt` seconds using the accumulated forces.
    fn integrate(&mut self, dt: f32) -> Result<()>;
}
