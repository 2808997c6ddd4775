//! Particle contacts and the iterative contact resolver
//!
//! A [`ParticleContact`] describes one pairwise constraint violation: two
//! bodies (or a body and an immovable obstacle) that are approaching along a
//! contact normal, overlapping along it, or both. Contacts are produced fresh
//! each step by collision detection or by constraint generators and
//! discarded after resolution.
//!
//! [`ParticleContactResolver`] fixes a batch of contacts in two independent
//! passes, each greedy worst-first:
//!
//! 1. **Velocity**: resolve the most strongly closing contact, re-scan, repeat
//! 2. **Position**: resolve the deepest interpenetration, update the depth of
//!    every contact sharing a moved body, re-scan, repeat
//!
//! Each pass stops early once nothing violates, and always stops after the
//! iteration budget is spent. This is a relaxation, not an exact solver.
//!
//! # Example
//!
//! ```ignore
//! use cinder_engine::physics::{ParticleContact, ParticleContactResolver};
//!
//! let contact = ParticleContact::new(a, Some(b), Vec3::X, 0.0, 0.5)?;
//! let mut contacts = vec![contact];
//! let resolver = ParticleContactResolver::new(2);
//! let report = resolver.resolve_contacts(&mut contacts, &mut bodies, 1.0 / 60.0);
//! ```

use glam::Vec3;
use tracing::{trace, warn};

use super::arena::{BodyHandle, BodySet};
use super::dynamics::Dynamics;
use super::error::{PhysicsError, Result};
use super::types::EPSILON;

// ============================================================================
// CONTACT
// ============================================================================

/// A single contact between two bodies, or between a body and the world.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParticleContact {
    /// The body the normal points toward
    pub first: BodyHandle,
    /// The other body, or `None` for an immovable obstacle
    pub second: Option<BodyHandle>,
    /// Overlap along the normal; positive means interpenetrating
    pub penetration: f32,
    normal: Vec3,
    restitution: f32,
}

impl ParticleContact {
    /// Creates a validated contact.
    ///
    /// # Arguments
    ///
    /// * `first` - Body on the side the normal points toward
    /// * `second` - Other body, `None` for an immovable obstacle
    /// * `normal` - Contact direction from `second` toward `first`; normalised here
    /// * `penetration` - Signed overlap depth
    /// * `restitution` - Bounciness in `[0, 1]`
    ///
    /// # Errors
    ///
    /// `InvalidInput` for a zero-length or non-finite normal, a restitution
    /// outside `[0, 1]`, a non-finite penetration, or a body in contact
    /// with itself.
    pub fn new(
        first: BodyHandle,
        second: Option<BodyHandle>,
        normal: Vec3,
        penetration: f32,
        restitution: f32,
    ) -> Result<Self> {
        if !normal.is_finite() || normal.length() <= EPSILON {
            return Err(PhysicsError::invalid(format!("contact normal {normal} is degenerate")));
        }
        if !(0.0..=1.0).contains(&restitution) {
            return Err(PhysicsError::invalid(format!("restitution {restitution} outside [0, 1]")));
        }
        if !penetration.is_finite() {
            return Err(PhysicsError::invalid("contact penetration must be finite"));
        }
        if second == Some(first) {
            return Err(PhysicsError::invalid("a body cannot be in contact with itself"));
        }
        Ok(Self {
            first,
            second,
            penetration,
            normal: normal.normalize(),
            restitution,
        })
    }

    /// Unit normal, pointing from the second body toward the first.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    pub fn restitution(&self) -> f32 {
        self.restitution
    }

    /// Returns true if the contact names `handle` on either side.
    pub fn involves(&self, handle: BodyHandle) -> bool {
        self.first == handle || self.second == Some(handle)
    }

    /// Inverse masses of both sides. An absent second body counts as zero.
    fn inverse_masses<B: Dynamics>(&self, bodies: &BodySet<B>) -> Result<(f32, f32)> {
        let first = bodies
            .get(self.first)
            .ok_or(PhysicsError::StaleHandle(self.first))?;
        let second = match self.second {
            Some(handle) => bodies
                .get(handle)
                .ok_or(PhysicsError::StaleHandle(handle))?
                .inverse_mass(),
            None => 0.0,
        };
        Ok((first.inverse_mass(), second))
    }

    /// Sum of the inverse masses; zero means neither side can move.
    pub fn total_inverse_mass<B: Dynamics>(&self, bodies: &BodySet<B>) -> Result<f32> {
        let (first, second) = self.inverse_masses(bodies)?;
        Ok(first + second)
    }

    /// Relative velocity along the normal. Negative means closing.
    pub fn separating_velocity<B: Dynamics>(&self, bodies: &BodySet<B>) -> Result<f32> {
        Ok(self.relative(bodies, |b| b.velocity())?.dot(self.normal))
    }

    /// First body's quantity minus the second body's (if any).
    fn relative<B: Dynamics>(&self, bodies: &BodySet<B>, quantity: impl Fn(&B) -> Vec3) -> Result<Vec3> {
        let first = bodies
            .get(self.first)
            .ok_or(PhysicsError::StaleHandle(self.first))?;
        let mut value = quantity(first);
        if let Some(handle) = self.second {
            let second = bodies.get(handle).ok_or(PhysicsError::StaleHandle(handle))?;
            value -= quantity(second);
        }
        Ok(value)
    }

    /// Applies the bounce impulse for this contact.
    ///
    /// The closing velocity is reversed and scaled by restitution, and the
    /// impulse is shared in proportion to inverse mass. Closing velocity that
    /// built up from acceleration during this frame alone is not bounced, so
    /// bodies resting on each other under gravity stay at rest instead of
    /// jittering.
    ///
    /// Separating contacts and contacts where neither side can move are left
    /// alone.
    pub fn resolve_velocity<B: Dynamics>(&self, bodies: &mut BodySet<B>, dt: f32) -> Result<()> {
        let separating = self.separating_velocity(bodies)?;
        if separating > 0.0 {
            return Ok(());
        }

        let mut new_separating = -separating * self.restitution;

        let acc_caused = self.relative(bodies, |b| b.acceleration())?.dot(self.normal) * dt;
        if acc_caused < 0.0 {
            new_separating = (new_separating + self.restitution * acc_caused).max(0.0);
        }

        let (first_im, second_im) = self.inverse_masses(bodies)?;
        let total_inverse_mass = first_im + second_im;
        if total_inverse_mass <= 0.0 {
            return Ok(());
        }

        let impulse = (new_separating - separating) / total_inverse_mass;
        let impulse_per_im = self.normal * impulse;
        self.apply(bodies, |first, second| {
            first.set_velocity(first.velocity() + impulse_per_im * first_im);
            if let Some(second) = second {
                second.set_velocity(second.velocity() - impulse_per_im * second_im);
            }
        })
    }

    /// Pushes the bodies apart along the normal until they just touch.
    ///
    /// Each side moves in proportion to its inverse mass. Velocities are not
    /// touched and `self.penetration` is not updated; the resolver does that.
    ///
    /// # Returns
    ///
    /// The displacement applied to the first and second body
    pub fn resolve_interpenetration<B: Dynamics>(&self, bodies: &mut BodySet<B>) -> Result<(Vec3, Vec3)> {
        if self.penetration <= 0.0 {
            return Ok((Vec3::ZERO, Vec3::ZERO));
        }

        let (first_im, second_im) = self.inverse_masses(bodies)?;
        let total_inverse_mass = first_im + second_im;
        if total_inverse_mass <= 0.0 {
            return Ok((Vec3::ZERO, Vec3::ZERO));
        }

        let move_per_im = self.normal * (self.penetration / total_inverse_mass);
        let first_move = move_per_im * first_im;
        let second_move = -move_per_im * second_im;

        self.apply(bodies, |first, second| {
            first.set_position(first.position() + first_move);
            if let Some(second) = second {
                second.set_position(second.position() + second_move);
            }
        })?;
        Ok((first_move, second_move))
    }

    fn apply<B, F>(&self, bodies: &mut BodySet<B>, f: F) -> Result<()>
    where
        F: FnOnce(&mut B, Option<&mut B>),
    {
        match self.second {
            Some(handle) => {
                let (first, second) = bodies
                    .get_pair_mut(self.first, handle)
                    .ok_or(PhysicsError::StaleHandle(handle))?;
                f(first, Some(second));
            }
            None => {
                let first = bodies
                    .get_mut(self.first)
                    .ok_or(PhysicsError::StaleHandle(self.first))?;
                f(first, None);
            }
        }
        Ok(())
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// What one call to [`ParticleContactResolver::resolve_contacts`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolutionReport {
    /// Contacts whose velocity was resolved
    pub velocity_iterations: usize,
    /// Contacts whose interpenetration was resolved
    pub position_iterations: usize,
    /// Contacts ignored for stale handles or zero total inverse mass
    pub skipped: usize,
}

/// Worst-first Gauss-Seidel resolver for particle contacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParticleContactResolver {
    max_iterations: usize,
}

impl Default for ParticleContactResolver {
    fn default() -> Self {
        Self::new(0)
    }
}

impl ParticleContactResolver {
    /// Creates a resolver that performs at most `max_iterations`
    /// resolutions in each pass.
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn set_max_iterations(&mut self, max_iterations: usize) {
        self.max_iterations = max_iterations;
    }

    /// Resolves a batch of contacts, velocity first then position.
    ///
    /// Contacts that name a removed body or that join two immovable bodies
    /// are skipped with a warning. Penetration depths in `contacts` are
    /// updated as bodies move.
    ///
    /// # Arguments
    ///
    /// * `contacts` - The batch to resolve
    /// * `bodies` - Body storage the contacts refer into
    /// * `dt` - Length of the step that produced the contacts
    ///
    /// # Returns
    ///
    /// Iteration counts for both passes and the number of skipped contacts
    pub fn resolve_contacts<B: Dynamics>(
        &self,
        contacts: &mut [ParticleContact],
        bodies: &mut BodySet<B>,
        dt: f32,
    ) -> ResolutionReport {
        let mut report = ResolutionReport::default();

        let mut active: Vec<bool> = contacts
            .iter()
            .map(|contact| match contact.total_inverse_mass(bodies) {
                Ok(total) if total > 0.0 => true,
                Ok(_) => {
                    warn!(first = ?contact.first, second = ?contact.second, "skipping contact between immovable bodies");
                    false
                }
                Err(err) => {
                    warn!(%err, "skipping contact");
                    false
                }
            })
            .collect();
        report.skipped = active.iter().filter(|a| !**a).count();

        report.velocity_iterations = self.velocity_pass(contacts, &mut active, bodies, dt);
        report.position_iterations = self.position_pass(contacts, &active, bodies);
        report
    }

    fn velocity_pass<B: Dynamics>(
        &self,
        contacts: &[ParticleContact],
        active: &mut [bool],
        bodies: &mut BodySet<B>,
        dt: f32,
    ) -> usize {
        let mut iterations = 0;
        while iterations < self.max_iterations {
            // Strict comparison keeps the first contact on ties
            let mut worst = 0.0;
            let mut worst_index = None;
            for (index, contact) in contacts.iter().enumerate() {
                if !active[index] {
                    continue;
                }
                if let Ok(separating) = contact.separating_velocity(bodies) {
                    if separating < worst {
                        worst = separating;
                        worst_index = Some(index);
                    }
                }
            }
            let Some(index) = worst_index else {
                break;
            };

            if let Err(err) = contacts[index].resolve_velocity(bodies, dt) {
                warn!(%err, index, "dropping contact from velocity pass");
                active[index] = false;
            } else {
                trace!(index, separating = worst, "resolved contact velocity");
            }
            iterations += 1;
        }
        iterations
    }

    fn position_pass<B: Dynamics>(
        &self,
        contacts: &mut [ParticleContact],
        active: &[bool],
        bodies: &mut BodySet<B>,
    ) -> usize {
        let mut iterations = 0;
        while iterations < self.max_iterations {
            let mut deepest = 0.0;
            let mut deepest_index = None;
            for (index, contact) in contacts.iter().enumerate() {
                if active[index] && contact.penetration > deepest {
                    deepest = contact.penetration;
                    deepest_index = Some(index);
                }
            }
            let Some(index) = deepest_index else {
                break;
            };

            let resolved = contacts[index];
            let (first_move, second_move) = match resolved.resolve_interpenetration(bodies) {
                Ok(moves) => moves,
                Err(err) => {
                    warn!(%err, index, "contact vanished during position pass");
                    contacts[index].penetration = 0.0;
                    iterations += 1;
                    continue;
                }
            };

            for contact in contacts.iter_mut() {
                update_penetration(contact, &resolved, first_move, second_move);
            }
            contacts[index].penetration = 0.0;

            trace!(index, penetration = deepest, "resolved interpenetration");
            iterations += 1;
        }
        iterations
    }
}

/// Adjusts `contact`'s depth for bodies that `resolved` just moved.
fn update_penetration(contact: &mut ParticleContact, resolved: &ParticleContact, first_move: Vec3, second_move: Vec3) {
    let moved = |handle: BodyHandle| -> Option<Vec3> {
        if handle == resolved.first {
            Some(first_move)
        } else if Some(handle) == resolved.second {
            Some(second_move)
        } else {
            None
        }
    };

    if let Some(displacement) = moved(contact.first) {
        contact.penetration -= displacement.dot(contact.normal);
    }
    if let Some(displacement) = contact.second.and_then(moved) {
        contact.penetration += displacement.dot(contact.normal);
    }
}
