//! Physics scene: owns the bodies and runs the step pipeline
//!
//! One call to [`PhysicsScene::do_physics_step`] runs, in order:
//!
//! 1. `begin_frame` - clear force accumulators, refresh derived data
//! 2. force generation through the [`ForceRegistry`]
//! 3. integration of every body
//! 4. contact generation by every registered [`ContactGenerator`]
//! 5. contact resolution, velocity pass then position pass
//!
//! Each phase finishes for all bodies before the next begins. Bodies,
//! registrations and generators are changed only between steps.
//!
//! # Example
//!
//! ```ignore
//! use cinder_engine::physics::{PhysicsConfig, PhysicsScene, RigidBody, Vec3};
//!
//! let mut scene = PhysicsScene::new(PhysicsConfig::default())?;
//! let crate_body = scene.spawn(RigidBody::cuboid(10.0, Vec3::splat(0.5), Vec3::Y * 5.0)?);
//! scene.add_gravity(crate_body)?;
//!
//! let report = scene.do_physics_step(1.0 / 60.0)?;
//! let gpu_records = scene.transforms();
//! ```

use std::fmt;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};
use serde::Serialize;
use tracing::{debug, warn};

use super::arena::{BodyHandle, BodySet};
use super::config::PhysicsConfig;
use super::contact::{ParticleContact, ParticleContactResolver, ResolutionReport};
use super::dynamics::Dynamics;
use super::error::{PhysicsError, Result};
use super::force::{ForceGenerator, Gravity};
use super::links::ContactGenerator;
use super::registry::ForceRegistry;
use super::rigid_body::RigidBody;

// ============================================================================
// TRANSFORM RECORD
// ============================================================================

/// World transform of one body, laid out for direct GPU upload.
///
/// Layout (32 bytes): `position` (12) + `_pad` (4) + `rotation` xyzw (16).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BodyTransform {
    /// World position of the center of mass.
    pub position: [f32; 3],
    /// Keeps `rotation` 16-byte aligned on the GPU side; always zero.
    pub _pad: u32,
    /// Unit quaternion, xyzw.
    pub rotation: [f32; 4],
}

static_assertions::assert_eq_size!(BodyTransform, [u8; 32]);

impl BodyTransform {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self {
            position: position.to_array(),
            _pad: 0,
            rotation: rotation.to_array(),
        }
    }

    fn of<B: Dynamics>(body: &B) -> Self {
        Self::new(body.position(), body.orientation())
    }

    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_array(self.rotation)
    }

    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation(), self.position())
    }
}

// ============================================================================
// STEP REPORT
// ============================================================================

/// Summary of one simulation step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StepReport {
    /// Frame number of the step just completed, starting at 1
    pub frame: u64,
    pub contacts_generated: usize,
    pub velocity_iterations: usize,
    pub position_iterations: usize,
    /// Contacts ignored for stale handles or zero total inverse mass
    pub skipped_contacts: usize,
    /// Bodies whose integration produced non-finite state and was rolled back
    pub integration_failures: usize,
}

// ============================================================================
// SCENE
// ============================================================================

/// The simulation world.
///
/// Generic over the body type so the same pipeline drives rigid bodies
/// (the default) or plain particles.
pub struct PhysicsScene<B = RigidBody> {
    bodies: BodySet<B>,
    registry: ForceRegistry<B>,
    contact_generators: Vec<Box<dyn ContactGenerator<B>>>,
    resolver: ParticleContactResolver,
    contacts: Vec<ParticleContact>,
    config: PhysicsConfig,
    gravity: Arc<Gravity>,
    frame: u64,
}

impl<B: Dynamics> Default for PhysicsScene<B> {
    fn default() -> Self {
        Self::from_valid_config(PhysicsConfig::default())
    }
}

impl<B> fmt::Debug for PhysicsScene<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhysicsScene")
            .field("frame", &self.frame)
            .field("bodies", &self.bodies.len())
            .field("registrations", &self.registry.len())
            .field("contact_generators", &self.contact_generators.len())
            .field("config", &self.config)
            .finish()
    }
}

impl<B: Dynamics> PhysicsScene<B> {
    /// Creates an empty scene.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if the config fails validation.
    pub fn new(config: PhysicsConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: PhysicsConfig) -> Self {
        Self {
            bodies: BodySet::new(),
            registry: ForceRegistry::new(),
            contact_generators: Vec::new(),
            resolver: ParticleContactResolver::default(),
            contacts: Vec::with_capacity(config.max_contacts),
            gravity: Arc::new(Gravity::new(config.gravity)),
            config,
            frame: 0,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    /// Number of steps completed so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    /// Adds a body as-is.
    pub fn add_body(&mut self, body: B) -> BodyHandle {
        self.bodies.insert(body)
    }

    /// Adds a body with the scene's configured damping.
    pub fn spawn(&mut self, mut body: B) -> BodyHandle {
        body.set_damping(self.config.linear_damping, self.config.angular_damping);
        self.bodies.insert(body)
    }

    /// Removes a body along with its force registrations and any contacts
    /// that mention it.
    pub fn remove_body(&mut self, handle: BodyHandle) -> Option<B> {
        let body = self.bodies.remove(handle)?;
        self.registry.remove_body(handle);
        self.contacts.retain(|contact| !contact.involves(handle));
        Some(body)
    }

    pub fn body(&self, handle: BodyHandle) -> Option<&B> {
        self.bodies.get(handle)
    }

    pub fn body_mut(&mut self, handle: BodyHandle) -> Option<&mut B> {
        self.bodies.get_mut(handle)
    }

    pub fn bodies(&self) -> &BodySet<B> {
        &self.bodies
    }

    pub fn bodies_mut(&mut self) -> &mut BodySet<B> {
        &mut self.bodies
    }

    // ------------------------------------------------------------------
    // Forces
    // ------------------------------------------------------------------

    /// Registers a force generator on a body.
    ///
    /// # Errors
    ///
    /// `StaleHandle` if the body is not in the scene.
    pub fn add_force_generator(
        &mut self,
        handle: BodyHandle,
        generator: Arc<dyn ForceGenerator<B>>,
    ) -> Result<()> {
        if !self.bodies.contains(handle) {
            return Err(PhysicsError::StaleHandle(handle));
        }
        self.registry.add(handle, generator);
        Ok(())
    }

    /// Registers the scene's gravity on a body.
    ///
    /// Every body shares one gravity generator built from the config.
    pub fn add_gravity(&mut self, handle: BodyHandle) -> Result<()> {
        let gravity: Arc<dyn ForceGenerator<B>> = self.gravity.clone();
        self.add_force_generator(handle, gravity)
    }

    pub fn registry(&self) -> &ForceRegistry<B> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ForceRegistry<B> {
        &mut self.registry
    }

    // ------------------------------------------------------------------
    // Contacts
    // ------------------------------------------------------------------

    /// Adds a contact source, queried in insertion order each step.
    pub fn add_contact_generator(&mut self, generator: Box<dyn ContactGenerator<B>>) {
        self.contact_generators.push(generator);
    }

    /// Contacts produced during the last step, after resolution.
    pub fn contacts(&self) -> &[ParticleContact] {
        &self.contacts
    }

    // ------------------------------------------------------------------
    // Stepping
    // ------------------------------------------------------------------

    /// Clears every accumulator and refreshes derived data.
    pub fn begin_frame(&mut self) {
        for (_, body) in self.bodies.iter_mut() {
            body.clear_forces();
            body.calculate_derived_data();
        }
    }

    /// Advances the simulation by `dt` seconds.
    ///
    /// A body whose integration goes non-finite is rolled back and logged;
    /// the step carries on for everything else.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `dt` is not finite and positive.
    pub fn do_physics_step(&mut self, dt: f32) -> Result<StepReport> {
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PhysicsError::invalid(format!(
                "time step must be finite and positive, got {dt}"
            )));
        }

        self.begin_frame();
        self.registry.update_forces(&mut self.bodies, dt);

        let mut integration_failures = 0;
        for (handle, body) in self.bodies.iter_mut() {
            if let Err(err) = body.integrate(dt) {
                warn!(?handle, %err, "integration failed; body rolled back");
                integration_failures += 1;
            }
        }

        let contacts_generated = self.generate_contacts();
        let resolution = if contacts_generated == 0 {
            ResolutionReport::default()
        } else {
            let iterations = self
                .config
                .resolver_iterations
                .unwrap_or(contacts_generated * 2);
            self.resolver.set_max_iterations(iterations);
            self.resolver
                .resolve_contacts(&mut self.contacts, &mut self.bodies, dt)
        };

        self.frame += 1;
        let report = StepReport {
            frame: self.frame,
            contacts_generated,
            velocity_iterations: resolution.velocity_iterations,
            position_iterations: resolution.position_iterations,
            skipped_contacts: resolution.skipped,
            integration_failures,
        };
        debug!(
            frame = report.frame,
            dt,
            bodies = self.bodies.len(),
            contacts = report.contacts_generated,
            velocity_iterations = report.velocity_iterations,
            position_iterations = report.position_iterations,
            "physics step"
        );
        Ok(report)
    }

    fn generate_contacts(&mut self) -> usize {
        self.contacts.clear();
        let cap = self.config.max_contacts;
        for generator in &self.contact_generators {
            let remaining = cap.saturating_sub(self.contacts.len());
            if remaining == 0 {
                break;
            }
            // Count what actually landed; the reported number is advisory
            generator.add_contact(&self.bodies, &mut self.contacts, remaining);
        }
        if self.contacts.len() > cap {
            warn!(
                generated = self.contacts.len(),
                max_contacts = cap,
                "contact generators overran the limit, truncating"
            );
            self.contacts.truncate(cap);
        }
        self.contacts.len()
    }

    // ------------------------------------------------------------------
    // Outbound
    // ------------------------------------------------------------------

    /// World transforms of every body, in the same order as
    /// [`BodySet::handles`].
    pub fn transforms(&self) -> Vec<BodyTransform> {
        self.bodies.iter().map(|(_, body)| BodyTransform::of(body)).collect()
    }

    pub fn transform_of(&self, handle: BodyHandle) -> Option<BodyTransform> {
        self.bodies.get(handle).map(BodyTransform::of)
    }
}
