//! Physics core for the Cinder engine
//!
//! Rigid-body and particle simulation with force generators, an iterative
//! contact resolver, and polyhedral mass properties. Rendering, collision
//! detection between arbitrary shapes and asset loading live elsewhere; the
//! core consumes bodies and contacts and hands back world transforms.
//!
//! # Unit System
//!
//! **1 unit = 1 meter** (SI units throughout)
//!
//! - Distances in meters
//! - Velocities in m/s
//! - Accelerations in m/s²
//! - Mass in kg
//! - Damping as the fraction of velocity kept per second
//!
//! # Submodules
//!
//! - [`types`] - Core mathematical types re-exported from glam
//! - [`arena`] - Generational body storage and handles
//! - [`dynamics`] - The body contract shared by rigid bodies and particles
//! - [`rigid_body`] - Rigid bodies: mass, inertia, integration
//! - [`particle`] - Point masses
//! - [`force`] - Force generators (gravity, drag, springs, buoyancy)
//! - [`registry`] - Body/force-generator registrations
//! - [`contact`] - Particle contacts and the worst-first resolver
//! - [`links`] - Contact generators (cables, rods, ground plane)
//! - [`mass_properties`] - Volume, center of mass and inertia of polyhedra
//! - [`scene`] - The step pipeline and transform read-back
//! - [`config`] - Scene configuration
//! - [`error`] - Error type

pub mod arena;
pub mod config;
pub mod contact;
pub mod dynamics;
pub mod error;
pub mod force;
pub mod links;
pub mod mass_properties;
pub mod particle;
pub mod registry;
pub mod rigid_body;
pub mod scene;
pub mod types;

// Re-export commonly used types at the physics module level
pub use arena::{BodyHandle, BodySet};
pub use config::PhysicsConfig;
pub use contact::{ParticleContact, ParticleContactResolver, ResolutionReport};
pub use dynamics::Dynamics;
pub use error::{PhysicsError, Result};
pub use force::{AnchoredSpring, Buoyancy, Drag, ForceGenerator, Gravity, Spring};
pub use links::{Cable, ContactGenerator, GroundPlane, Rod};
pub use mass_properties::{Face, MassProperties, Polyhedron, compute_mass_properties};
pub use particle::Particle;
pub use registry::{ForceRegistration, ForceRegistry};
pub use rigid_body::RigidBody;
pub use scene::{BodyTransform, PhysicsScene, StepReport};
pub use types::{Mat3, Mat4, Quat, Vec3};
