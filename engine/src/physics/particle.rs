//! Point masses
//!
//! A [`Particle`] has position and velocity but no orientation. Particles are
//! what the contact resolver was designed around; rope and chain simulations
//! built from cables and rods use them directly.

use glam::Vec3;

use super::dynamics::Dynamics;
use super::error::{PhysicsError, Result, validate_mass};

/// A point mass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    /// Current position in world space (meters)
    pub position: Vec3,
    /// Current velocity (meters/second)
    pub velocity: Vec3,
    /// Constant acceleration applied every step (m/s²), e.g. gravity
    pub acceleration: Vec3,
    /// Fraction of velocity kept per second (1.0 = no damping)
    pub damping: f32,
    inverse_mass: f32,
    force_accum: Vec3,
    last_acceleration: Vec3,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            damping: 1.0,
            inverse_mass: 1.0,
            force_accum: Vec3::ZERO,
            last_acceleration: Vec3::ZERO,
        }
    }
}

impl Particle {
    /// Creates a particle at rest.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `mass` is not finite and positive.
    pub fn new(mass: f32, position: Vec3) -> Result<Self> {
        validate_mass(mass)?;
        Ok(Self {
            position,
            inverse_mass: 1.0 / mass,
            ..Self::default()
        })
    }

    /// Creates a particle that no force or impulse can move.
    pub fn immovable(position: Vec3) -> Self {
        Self {
            position,
            inverse_mass: 0.0,
            ..Self::default()
        }
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        validate_mass(mass)?;
        self.inverse_mass = 1.0 / mass;
        Ok(())
    }

    pub fn set_infinite_mass(&mut self) {
        self.inverse_mass = 0.0;
    }

    /// Force accumulated so far this step.
    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accum
    }

    pub fn kinetic_energy(&self) -> f32 {
        if self.inverse_mass <= 0.0 {
            return 0.0;
        }
        0.5 * self.velocity.length_squared() / self.inverse_mass
    }
}

impl Dynamics for Particle {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn acceleration(&self) -> Vec3 {
        self.last_acceleration
    }

    fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    fn set_damping(&mut self, linear: f32, _angular: f32) {
        self.damping = linear;
    }

    fn point_in_world_space(&self, local_point: Vec3) -> Vec3 {
        self.position + local_point
    }

    fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    fn add_force_at_point(&mut self, force: Vec3, _world_point: Vec3) {
        self.force_accum += force;
    }

    fn clear_forces(&mut self) {
        self.force_accum = Vec3::ZERO;
    }

    /// Semi-implicit Euler: velocity first, then position from the new velocity.
    fn integrate(&mut self, dt: f32) -> Result<()> {
        if self.inverse_mass <= 0.0 {
            return Ok(());
        }

        let previous = *self;

        self.last_acceleration = self.acceleration + self.force_accum * self.inverse_mass;
        self.velocity += self.last_acceleration * dt;
        self.velocity *= self.damping.powf(dt);
        self.position += self.velocity * dt;

        if !self.velocity.is_finite() || !self.position.is_finite() {
            let what = if self.velocity.is_finite() { "position" } else { "velocity" };
            *self = previous;
            self.velocity = Vec3::ZERO;
            return Err(PhysicsError::NonFiniteState { what });
        }
        Ok(())
    }
}
