//! Rigid body dynamics
//!
//! A [`RigidBody`] carries mass, an inertia tensor, a transform and linear and
//! angular velocity. Forces accumulate over a step and are consumed by
//! [`Dynamics::integrate`], which uses semi-implicit Euler:
//!
//! - linear acceleration = constant acceleration + force * inverse mass
//! - angular acceleration = world inverse inertia * torque
//! - velocity += acceleration * dt, then damped by `damping^dt`
//! - position += velocity * dt, orientation += ½ ω q dt (renormalized)
//!
//! The world-space inverse inertia tensor and the world transform are derived
//! data. [`Dynamics::calculate_derived_data`] rebuilds them from position and
//! orientation and must run before anything reads world-space geometry in a
//! step; the scene does this in `begin_frame`.

use glam::{Mat3, Mat4, Quat, Vec3};

use super::dynamics::Dynamics;
use super::error::{PhysicsError, Result, validate_mass};
use super::mass_properties::MassProperties;

/// A simulated rigid body.
///
/// `position` and `orientation` are open for reading and for bulk edits, but
/// the cached transform and world inertia only follow them after
/// [`Dynamics::calculate_derived_data`]. Use [`Dynamics::set_position`] and
/// [`RigidBody::set_orientation`] to move a body outside the step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidBody {
    inverse_mass: f32,
    inverse_inertia_tensor: Mat3,
    inverse_inertia_tensor_world: Mat3,
    /// Center of mass in world space (meters)
    pub position: Vec3,
    /// World orientation
    pub orientation: Quat,
    /// Linear velocity (meters/second)
    pub velocity: Vec3,
    /// Angular velocity (radians/second, world axes)
    pub angular_velocity: Vec3,
    /// Constant acceleration applied every step (m/s²)
    pub acceleration: Vec3,
    /// Fraction of linear velocity kept per second (1.0 = no damping)
    pub linear_damping: f32,
    /// Fraction of angular velocity kept per second (1.0 = no damping)
    pub angular_damping: f32,
    force_accum: Vec3,
    torque_accum: Vec3,
    last_frame_acceleration: Vec3,
    transform: Mat4,
}

impl RigidBody {
    /// Creates a body at rest with the given mass and body-space inertia tensor.
    ///
    /// # Errors
    ///
    /// - `InvalidInput` if `mass` is not finite and positive
    /// - `SingularInertia` if the tensor is non-finite or cannot be inverted
    pub fn new(mass: f32, inertia_tensor: Mat3, position: Vec3) -> Result<Self> {
        validate_mass(mass)?;
        let mut body = Self::immovable(position);
        body.inverse_mass = 1.0 / mass;
        body.set_inertia_tensor(inertia_tensor)?;
        Ok(body)
    }

    /// Creates a body with infinite mass and inertia, such as static scenery.
    pub fn immovable(position: Vec3) -> Self {
        let mut body = Self {
            inverse_mass: 0.0,
            inverse_inertia_tensor: Mat3::ZERO,
            inverse_inertia_tensor_world: Mat3::ZERO,
            position,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            linear_damping: 1.0,
            angular_damping: 1.0,
            force_accum: Vec3::ZERO,
            torque_accum: Vec3::ZERO,
            last_frame_acceleration: Vec3::ZERO,
            transform: Mat4::IDENTITY,
        };
        body.calculate_derived_data();
        body
    }

    /// Creates a body from integrated mass properties.
    ///
    /// `position` is where the center of mass is placed in the world; the
    /// tensor is already about the center of mass.
    pub fn from_mass_properties(properties: &MassProperties, position: Vec3) -> Result<Self> {
        Self::new(properties.mass, properties.inertia_tensor, position)
    }

    /// Uniform solid box with the given half extents.
    pub fn cuboid(mass: f32, half_extents: Vec3, position: Vec3) -> Result<Self> {
        validate_mass(mass)?;
        let size_sq = (half_extents * 2.0) * (half_extents * 2.0);
        let k = mass / 12.0;
        let inertia = Mat3::from_diagonal(Vec3::new(
            k * (size_sq.y + size_sq.z),
            k * (size_sq.x + size_sq.z),
            k * (size_sq.x + size_sq.y),
        ));
        Self::new(mass, inertia, position)
    }

    /// Uniform solid sphere.
    pub fn sphere(mass: f32, radius: f32, position: Vec3) -> Result<Self> {
        validate_mass(mass)?;
        let moment = 0.4 * mass * radius * radius;
        Self::new(mass, Mat3::from_diagonal(Vec3::splat(moment)), position)
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self.calculate_derived_data();
        self
    }

    /// Sets the orientation and refreshes derived data.
    pub fn set_orientation(&mut self, orientation: Quat) {
        self.orientation = orientation;
        self.calculate_derived_data();
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_damping(mut self, linear: f32, angular: f32) -> Self {
        self.linear_damping = linear;
        self.angular_damping = angular;
        self
    }

    pub fn with_acceleration(mut self, acceleration: Vec3) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        validate_mass(mass)?;
        self.inverse_mass = 1.0 / mass;
        Ok(())
    }

    pub fn set_infinite_mass(&mut self) {
        self.inverse_mass = 0.0;
        self.inverse_inertia_tensor = Mat3::ZERO;
        self.inverse_inertia_tensor_world = Mat3::ZERO;
    }

    /// Sets the body-space inertia tensor and refreshes the world tensor.
    pub fn set_inertia_tensor(&mut self, inertia_tensor: Mat3) -> Result<()> {
        let determinant = inertia_tensor.determinant();
        if !inertia_tensor.is_finite() || !determinant.is_finite() || determinant == 0.0 {
            return Err(PhysicsError::SingularInertia);
        }
        let inverse = inertia_tensor.inverse();
        if !inverse.is_finite() {
            return Err(PhysicsError::SingularInertia);
        }
        self.inverse_inertia_tensor = inverse;
        self.calculate_derived_data();
        Ok(())
    }

    /// Body-space inertia tensor (zero for immovable bodies).
    pub fn inertia_tensor(&self) -> Mat3 {
        if self.inverse_inertia_tensor == Mat3::ZERO {
            return Mat3::ZERO;
        }
        self.inverse_inertia_tensor.inverse()
    }

    pub fn inverse_inertia_tensor(&self) -> Mat3 {
        self.inverse_inertia_tensor
    }

    /// World-space inverse inertia tensor as of the last derived-data update.
    pub fn inverse_inertia_tensor_world(&self) -> Mat3 {
        self.inverse_inertia_tensor_world
    }

    /// Cached body-to-world transform.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn accumulated_force(&self) -> Vec3 {
        self.force_accum
    }

    pub fn accumulated_torque(&self) -> Vec3 {
        self.torque_accum
    }

    /// Adds a world-space torque.
    pub fn add_torque(&mut self, torque: Vec3) {
        self.torque_accum += torque;
    }

    /// Converts a body-space point into world space.
    pub fn local_to_world(&self, local_point: Vec3) -> Vec3 {
        self.transform.transform_point3(local_point)
    }

    /// Converts a world-space point into body space.
    pub fn world_to_local(&self, world_point: Vec3) -> Vec3 {
        self.transform.inverse().transform_point3(world_point)
    }

    /// Rotates a body-space direction into world space.
    pub fn direction_to_world(&self, local_direction: Vec3) -> Vec3 {
        self.orientation * local_direction
    }

    /// Velocity of a world-space point rigidly attached to the body.
    pub fn velocity_at_point(&self, world_point: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(world_point - self.position)
    }

    /// Linear plus rotational kinetic energy.
    pub fn kinetic_energy(&self) -> f32 {
        if self.inverse_mass <= 0.0 {
            return 0.0;
        }
        let linear = 0.5 * self.velocity.length_squared() / self.inverse_mass;
        let rotation = Mat3::from_quat(self.orientation);
        let inertia_world = rotation * self.inertia_tensor() * rotation.transpose();
        let angular = 0.5 * self.angular_velocity.dot(inertia_world * self.angular_velocity);
        linear + angular
    }

    fn non_finite_field(&self) -> Option<&'static str> {
        if !self.velocity.is_finite() {
            Some("velocity")
        } else if !self.angular_velocity.is_finite() {
            Some("angular velocity")
        } else if !self.position.is_finite() {
            Some("position")
        } else if !self.orientation.is_finite() {
            Some("orientation")
        } else {
            None
        }
    }
}

impl Dynamics for RigidBody {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
        self.calculate_derived_data();
    }

    fn velocity(&self) -> Vec3 {
        self.velocity
    }

    fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }

    fn acceleration(&self) -> Vec3 {
        self.last_frame_acceleration
    }

    fn orientation(&self) -> Quat {
        self.orientation
    }

    fn inverse_mass(&self) -> f32 {
        self.inverse_mass
    }

    fn set_damping(&mut self, linear: f32, angular: f32) {
        self.linear_damping = linear;
        self.angular_damping = angular;
    }

    fn point_in_world_space(&self, local_point: Vec3) -> Vec3 {
        self.transform.transform_point3(local_point)
    }

    fn add_force(&mut self, force: Vec3) {
        self.force_accum += force;
    }

    fn add_force_at_point(&mut self, force: Vec3, world_point: Vec3) {
        let offset = world_point - self.position;
        self.force_accum += force;
        self.torque_accum += offset.cross(force);
    }

    fn clear_forces(&mut self) {
        self.force_accum = Vec3::ZERO;
        self.torque_accum = Vec3::ZERO;
    }

    fn calculate_derived_data(&mut self) {
        self.orientation = self.orientation.normalize();
        self.transform = Mat4::from_rotation_translation(self.orientation, self.position);

        // I_world^-1 = R * I_body^-1 * R^T
        let rotation = Mat3::from_quat(self.orientation);
        self.inverse_inertia_tensor_world =
            rotation * self.inverse_inertia_tensor * rotation.transpose();
    }

    fn integrate(&mut self, dt: f32) -> Result<()> {
        if self.inverse_mass <= 0.0 {
            return Ok(());
        }

        let previous = *self;

        self.last_frame_acceleration = self.acceleration + self.force_accum * self.inverse_mass;
        let angular_acceleration = self.inverse_inertia_tensor_world * self.torque_accum;

        self.velocity += self.last_frame_acceleration * dt;
        self.angular_velocity += angular_acceleration * dt;

        self.velocity *= self.linear_damping.powf(dt);
        self.angular_velocity *= self.angular_damping.powf(dt);

        self.position += self.velocity * dt;

        // dq/dt = ½ ω q
        let w = self.angular_velocity;
        let spin = Quat::from_xyzw(w.x, w.y, w.z, 0.0) * self.orientation;
        self.orientation = self.orientation + spin * (0.5 * dt);

        if let Some(what) = self.non_finite_field() {
            *self = previous;
            self.velocity = Vec3::ZERO;
            self.angular_velocity = Vec3::ZERO;
            return Err(PhysicsError::NonFiniteState { what });
        }

        self.calculate_derived_data();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn unit_cube() -> RigidBody {
        RigidBody::cuboid(1.0, Vec3::splat(0.5), Vec3::ZERO).unwrap()
    }

    fn assert_mat3_near(a: Mat3, b: Mat3, tolerance: f32) {
        for (x, y) in a.to_cols_array().iter().zip(b.to_cols_array().iter()) {
            assert!((x - y).abs() < tolerance, "{a:?} != {b:?}");
        }
    }

    #[test]
    fn test_new_validates_inputs() {
        assert!(RigidBody::new(0.0, Mat3::IDENTITY, Vec3::ZERO).is_err());
        assert!(matches!(
            RigidBody::new(1.0, Mat3::ZERO, Vec3::ZERO),
            Err(PhysicsError::SingularInertia)
        ));
        assert!(matches!(
            RigidBody::new(1.0, Mat3::from_diagonal(Vec3::new(1.0, f32::NAN, 1.0)), Vec3::ZERO),
            Err(PhysicsError::SingularInertia)
        ));
    }

    #[test]
    fn test_cuboid_inertia() {
        let body = RigidBody::cuboid(12.0, Vec3::new(0.5, 1.0, 1.5), Vec3::ZERO).unwrap();
        let inertia = body.inertia_tensor();
        // m/12 * (h² + d²) with sizes 1, 2, 3
        assert!((inertia.x_axis.x - 13.0).abs() < 1e-4);
        assert!((inertia.y_axis.y - 10.0).abs() < 1e-4);
        assert!((inertia.z_axis.z - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_world_inertia_follows_orientation() {
        let body = RigidBody::cuboid(12.0, Vec3::new(0.5, 1.0, 1.5), Vec3::ZERO)
            .unwrap()
            .with_orientation(Quat::from_rotation_z(FRAC_PI_2));

        let rotation = Mat3::from_quat(body.orientation);
        let expected = rotation * body.inverse_inertia_tensor() * rotation.transpose();
        assert_mat3_near(body.inverse_inertia_tensor_world(), expected, 1e-6);

        // A quarter turn about Z swaps the X and Y moments
        let world = body.inverse_inertia_tensor_world();
        assert!((world.x_axis.x - 1.0 / 10.0).abs() < 1e-5);
        assert!((world.y_axis.y - 1.0 / 13.0).abs() < 1e-5);
    }

    #[test]
    fn test_force_at_local_point_creates_torque() {
        let mut body = unit_cube().with_orientation(Quat::from_rotation_y(FRAC_PI_2));
        body.add_world_force_at_local_point(Vec3::Y, Vec3::new(1.0, 0.0, 0.0));

        // Local +X maps to world -Z after a quarter turn about Y
        assert_eq!(body.accumulated_force(), Vec3::Y);
        let torque = body.accumulated_torque();
        let expected = Vec3::new(0.0, 0.0, -1.0).cross(Vec3::Y);
        assert!((torque - expected).length() < 1e-5, "torque {torque:?}");
    }

    #[test]
    fn test_integrate_without_forces_is_identity() {
        let mut body = unit_cube().with_orientation(Quat::from_rotation_x(0.3));
        let position = body.position;
        let orientation = body.orientation;

        for _ in 0..100 {
            body.integrate(0.016).unwrap();
        }
        assert_eq!(body.position, position);
        assert!((body.orientation - orientation).length() < 1e-5);
    }

    #[test]
    fn test_torque_spins_body() {
        let mut body = unit_cube();
        body.add_torque(Vec3::new(0.0, 1.0, 0.0));
        body.integrate(0.1).unwrap();

        // I = 1/6 for a unit cube of mass 1
        assert!((body.angular_velocity.y - 0.6).abs() < 1e-4);
        assert!(body.orientation.angle_between(Quat::IDENTITY) > 0.01);
        assert!((body.orientation.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_immovable_body_does_not_integrate() {
        let mut floor = RigidBody::immovable(Vec3::ZERO);
        floor.add_force(Vec3::new(0.0, -100.0, 0.0));
        floor.integrate(1.0).unwrap();
        assert_eq!(floor.position, Vec3::ZERO);
        assert_eq!(floor.kinetic_energy(), 0.0);
    }

    #[test]
    fn test_non_finite_state_is_rolled_back() {
        let mut body = unit_cube().with_velocity(Vec3::X);
        body.add_force(Vec3::new(f32::NAN, 0.0, 0.0));
        let result = body.integrate(0.1);

        assert!(matches!(result, Err(PhysicsError::NonFiniteState { what: "velocity" })));
        assert_eq!(body.position, Vec3::ZERO);
        assert_eq!(body.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_point_conversions() {
        let mut body = unit_cube().with_orientation(Quat::from_rotation_z(FRAC_PI_2));
        body.set_position(Vec3::new(1.0, 2.0, 3.0));

        let world = body.point_in_world_space(Vec3::X);
        assert!((world - Vec3::new(1.0, 3.0, 3.0)).length() < 1e-5);
        assert_eq!(body.local_to_world(Vec3::X), world);
        let local = body.world_to_local(world);
        assert!((local - Vec3::X).length() < 1e-5);
        assert!((body.direction_to_world(Vec3::X) - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_angular_damping_per_second() {
        let mut body = unit_cube()
            .with_angular_velocity(Vec3::new(0.0, 2.0, 0.0))
            .with_velocity(Vec3::X)
            .with_damping(1.0, 0.5);

        body.integrate(0.5).unwrap();
        // 2 * 0.5^0.5
        assert!((body.angular_velocity.y - 2.0 * 0.5_f32.sqrt()).abs() < 1e-5);
        assert_eq!(body.velocity, Vec3::X);

        body.integrate(0.5).unwrap();
        assert!((body.angular_velocity.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_setters_refresh_derived_data() {
        let box_body = || RigidBody::cuboid(1.0, Vec3::new(1.0, 0.5, 0.25), Vec3::ZERO).unwrap();
        let rotation = Quat::from_rotation_z(FRAC_PI_2);

        let mut body = box_body();
        body.set_orientation(rotation);
        body.set_position(Vec3::new(0.0, 4.0, 0.0));
        let expected = box_body().with_orientation(rotation);

        assert_mat3_near(body.inverse_inertia_tensor_world(), expected.inverse_inertia_tensor_world(), 1e-5);
        assert!((body.local_to_world(Vec3::X) - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-5);

        // A direct field write waits for the explicit refresh
        body.position = Vec3::ZERO;
        assert!((body.local_to_world(Vec3::X) - Vec3::new(0.0, 5.0, 0.0)).length() < 1e-5);
        body.calculate_derived_data();
        assert!((body.local_to_world(Vec3::X) - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_kinetic_energy() {
        let body = RigidBody::sphere(2.0, 1.0, Vec3::ZERO)
            .unwrap()
            .with_velocity(Vec3::new(3.0, 0.0, 0.0))
            .with_angular_velocity(Vec3::new(0.0, 0.0, 5.0));
        // ½ m v² + ½ I ω² with I = 0.8
        let expected = 0.5 * 2.0 * 9.0 + 0.5 * 0.8 * 25.0;
        assert!((body.kinetic_energy() - expected).abs() < 1e-3);
    }
}
