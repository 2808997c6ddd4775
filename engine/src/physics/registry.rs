//! Force registry
//!
//! Keeps the many-to-many pairing between bodies and the force generators
//! acting on them. The registry owns neither side: bodies live in the
//! scene's [`BodySet`] and generators are shared through `Arc`.
//!
//! Registering the same pair twice is allowed and applies the force twice.
//! Use [`ForceRegistry::contains`] to check first when that is not wanted.

use std::fmt;
use std::sync::Arc;

use super::arena::{BodyHandle, BodySet};
use super::force::ForceGenerator;

/// A single (body, generator) pairing.
pub struct ForceRegistration<B> {
    pub body: BodyHandle,
    pub generator: Arc<dyn ForceGenerator<B>>,
}

impl<B> Clone for ForceRegistration<B> {
    fn clone(&self) -> Self {
        Self {
            body: self.body,
            generator: Arc::clone(&self.generator),
        }
    }
}

impl<B> fmt::Debug for ForceRegistration<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForceRegistration")
            .field("body", &self.body)
            .field("generator", &Arc::as_ptr(&self.generator).cast::<()>())
            .finish()
    }
}

/// Registered (body, generator) pairs, applied once per step.
pub struct ForceRegistry<B> {
    registrations: Vec<ForceRegistration<B>>,
}

impl<B> Default for ForceRegistry<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B> fmt::Debug for ForceRegistry<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.registrations.iter()).finish()
    }
}

impl<B> ForceRegistry<B> {
    pub fn new() -> Self {
        Self {
            registrations: Vec::new(),
        }
    }

    /// Registers `generator` to act on `body`. Duplicates are not checked.
    pub fn add(&mut self, body: BodyHandle, generator: Arc<dyn ForceGenerator<B>>) {
        self.registrations.push(ForceRegistration { body, generator });
    }

    /// Removes every registration of this exact generator on `body`.
    ///
    /// Generators are compared by identity, not by value.
    ///
    /// # Returns
    ///
    /// The number of registrations removed
    pub fn remove(&mut self, body: BodyHandle, generator: &Arc<dyn ForceGenerator<B>>) -> usize {
        let before = self.registrations.len();
        self.registrations
            .retain(|r| !(r.body == body && same_generator(&r.generator, generator)));
        before - self.registrations.len()
    }

    /// Drops every registration that targets `body`.
    pub fn remove_body(&mut self, body: BodyHandle) -> usize {
        let before = self.registrations.len();
        self.registrations.retain(|r| r.body != body);
        before - self.registrations.len()
    }

    /// Returns true if this exact generator is registered on `body`.
    pub fn contains(&self, body: BodyHandle, generator: &Arc<dyn ForceGenerator<B>>) -> bool {
        self.registrations
            .iter()
            .any(|r| r.body == body && same_generator(&r.generator, generator))
    }

    /// Removes all registrations. Bodies and generators are untouched.
    pub fn clear(&mut self) {
        self.registrations.clear();
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ForceRegistration<B>> {
        self.registrations.iter()
    }

    /// Asks every registered generator to add its force to its body.
    pub fn update_forces(&self, bodies: &mut BodySet<B>, dt: f32) {
        for registration in &self.registrations {
            registration.generator.update_force(registration.body, bodies, dt);
        }
    }
}

fn same_generator<B>(a: &Arc<dyn ForceGenerator<B>>, b: &Arc<dyn ForceGenerator<B>>) -> bool {
    // Compare data pointers only; vtable pointers are not guaranteed unique.
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::dynamics::Dynamics;
    use crate::physics::force::Gravity;
    use crate::physics::particle::Particle;
    use glam::Vec3;

    fn gravity() -> Arc<dyn ForceGenerator<Particle>> {
        Arc::new(Gravity::new(Vec3::new(0.0, -10.0, 0.0)))
    }

    #[test]
    fn test_update_with_no_registrations_leaves_forces_zero() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        let registry = ForceRegistry::new();

        bodies.get_mut(a).unwrap().clear_forces();
        registry.update_forces(&mut bodies, 0.01);
        assert_eq!(bodies.get(a).unwrap().accumulated_force(), Vec3::ZERO);
    }

    #[test]
    fn test_shared_generator_acts_on_each_body() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        let b = bodies.insert(Particle::new(2.0, Vec3::ZERO).unwrap());
        let g = gravity();

        let mut registry = ForceRegistry::new();
        registry.add(a, Arc::clone(&g));
        registry.add(b, Arc::clone(&g));
        registry.update_forces(&mut bodies, 0.01);

        assert_eq!(bodies.get(a).unwrap().accumulated_force().y, -10.0);
        assert_eq!(bodies.get(b).unwrap().accumulated_force().y, -20.0);
    }

    #[test]
    fn test_duplicate_registration_applies_twice() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        let g = gravity();

        let mut registry = ForceRegistry::new();
        registry.add(a, Arc::clone(&g));
        registry.add(a, Arc::clone(&g));
        assert_eq!(registry.len(), 2);

        registry.update_forces(&mut bodies, 0.01);
        assert_eq!(bodies.get(a).unwrap().accumulated_force().y, -20.0);
    }

    #[test]
    fn test_remove_by_identity() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        let g1 = gravity();
        let g2 = gravity();

        let mut registry = ForceRegistry::new();
        registry.add(a, Arc::clone(&g1));
        registry.add(a, Arc::clone(&g1));
        registry.add(a, Arc::clone(&g2));

        assert!(registry.contains(a, &g2));
        assert_eq!(registry.remove(a, &g1), 2);
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(a, &g1));
        assert!(registry.contains(a, &g2));
    }

    #[test]
    fn test_remove_body_and_clear() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        let b = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        let g = gravity();

        let mut registry = ForceRegistry::new();
        registry.add(a, Arc::clone(&g));
        registry.add(b, Arc::clone(&g));
        assert_eq!(registry.remove_body(a), 1);
        assert_eq!(registry.iter().next().unwrap().body, b);

        registry.clear();
        assert!(registry.is_empty());
        // The generator itself is still alive and usable
        assert_eq!(Arc::strong_count(&g), 1);
    }

    #[test]
    fn test_stale_handle_is_ignored() {
        let mut bodies = BodySet::new();
        let a = bodies.insert(Particle::new(1.0, Vec3::ZERO).unwrap());
        let mut registry = ForceRegistry::new();
        registry.add(a, gravity());
        bodies.remove(a);

        registry.update_forces(&mut bodies, 0.01);
        assert!(bodies.is_empty());
    }
}
