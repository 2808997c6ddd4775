//! Cinder Engine Library
//!
//! The simulation core of the Cinder hobby engine. Everything here is
//! headless: the renderer, UI and asset pipeline sit on top and read body
//! transforms back after each step.
//!
//! # Modules
//!
//! - [`physics`] - Rigid bodies, particles, forces, contacts and mass properties
//!
//! # Example
//!
//! ```ignore
//! use cinder_engine::physics::{GroundPlane, PhysicsConfig, PhysicsScene, Polyhedron, RigidBody, Vec3};
//!
//! let mut scene = PhysicsScene::new(PhysicsConfig::default())?;
//!
//! // Mass properties straight from the collision hull
//! let hull = Polyhedron::cuboid(Vec3::new(1.0, 0.5, 0.5))?;
//! let props = hull.mass_properties(20.0)?;
//! let body = scene.spawn(RigidBody::from_mass_properties(&props, Vec3::Y * 3.0)?);
//! scene.add_gravity(body)?;
//! scene.add_contact_generator(Box::new(GroundPlane::default()));
//!
//! for _ in 0..60 {
//!     scene.do_physics_step(1.0 / 60.0)?;
//! }
//! let instances = scene.transforms();
//! ```

pub mod physics;

// Re-export the most used physics types at crate level
pub use physics::{
    BodyHandle, BodyTransform, Dynamics, Particle, PhysicsConfig, PhysicsError, PhysicsScene,
    RigidBody, StepReport,
};
