//! Simulation configuration
//!
//! Global parameters for a [`PhysicsScene`](super::scene::PhysicsScene).
//! Configs are plain JSON documents; missing fields take their defaults.
//!
//! ```json
//! {
//!     "gravity": [0.0, -9.81, 0.0],
//!     "resolver_iterations": 16,
//!     "max_contacts": 128
//! }
//! ```

use std::path::Path;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::error::{PhysicsError, Result};

/// Configuration for the simulation environment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Gravity acceleration vector (m/s²).
    /// Earth default: Vec3::new(0.0, -9.81, 0.0)
    pub gravity: Vec3,
    /// Iteration cap for each resolver pass.
    /// `None` uses twice the number of contacts generated that step.
    pub resolver_iterations: Option<usize>,
    /// Upper bound on contacts gathered per step.
    pub max_contacts: usize,
    /// Fraction of linear velocity kept per second for spawned bodies.
    pub linear_damping: f32,
    /// Fraction of angular velocity kept per second for spawned bodies.
    pub angular_damping: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.81, 0.0),
            resolver_iterations: None,
            max_contacts: 256,
            linear_damping: 0.99,
            angular_damping: 0.8,
        }
    }
}

impl PhysicsConfig {
    /// Create a config with no gravity and no damping
    pub fn vacuum() -> Self {
        Self {
            gravity: Vec3::ZERO,
            linear_damping: 1.0,
            angular_damping: 1.0,
            ..Self::default()
        }
    }

    /// Create a config with custom gravity and default everything else
    pub fn with_gravity(gravity: Vec3) -> Self {
        Self {
            gravity,
            ..Self::default()
        }
    }

    /// Parses and validates a JSON config document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: PhysicsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and validates a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks that every parameter is usable.
    pub fn validate(&self) -> Result<()> {
        if !self.gravity.is_finite() {
            return Err(PhysicsError::invalid("gravity must be finite"));
        }
        if self.resolver_iterations == Some(0) {
            return Err(PhysicsError::invalid("resolver_iterations must be at least 1"));
        }
        if self.max_contacts == 0 {
            return Err(PhysicsError::invalid("max_contacts must be at least 1"));
        }
        for (name, damping) in [
            ("linear_damping", self.linear_damping),
            ("angular_damping", self.angular_damping),
        ] {
            if !(0.0..=1.0).contains(&damping) {
                return Err(PhysicsError::invalid(format!(
                    "{name} must be within [0, 1], got {damping}"
                )));
            }
        }
        Ok(())
    }
}
