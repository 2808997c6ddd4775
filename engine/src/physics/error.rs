//! Error type shared by the physics core.

use thiserror::Error;

use super::arena::BodyHandle;

/// Errors surfaced by the physics core.
///
/// Precondition violations are reported at the API boundary where they are
/// made; numerical trouble inside a step is recovered from locally and only
/// reported through logs and the step report.
#[derive(Debug, Error)]
pub enum PhysicsError {
    /// A caller-supplied value is out of range or malformed.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A polyhedron enclosed no positive volume (empty, flat, or inward-wound).
    #[error("polyhedron has non-positive volume {0}")]
    DegenerateVolume(f64),
    /// An inertia tensor could not be inverted.
    #[error("inertia tensor is singular or non-finite")]
    SingularInertia,
    /// Integration produced NaN or infinite state; the step was rolled back.
    #[error("non-finite {what} after integration")]
    NonFiniteState { what: &'static str },
    /// The handle refers to a body that has been removed.
    #[error("stale body handle {0:?}")]
    StaleHandle(BodyHandle),
    /// Reading a config file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// A config document failed to parse.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PhysicsError>;

impl PhysicsError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        PhysicsError::InvalidInput(message.into())
    }
}

/// Checks that a mass is usable for a dynamic body.
pub(crate) fn validate_mass(mass: f32) -> Result<()> {
    if !mass.is_finite() || mass <= 0.0 {
        return Err(PhysicsError::invalid(format!(
            "mass must be finite and positive, got {mass}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_mass() {
        assert!(validate_mass(1.0).is_ok());
        assert!(validate_mass(0.0).is_err());
        assert!(validate_mass(-2.0).is_err());
        assert!(validate_mass(f32::NAN).is_err());
        assert!(validate_mass(f32::INFINITY).is_err());
    }

    #[test]
    fn test_error_display() {
        let err = PhysicsError::invalid("bad normal");
        assert_eq!(err.to_string(), "invalid input: bad normal");

        let err = PhysicsError::NonFiniteState { what: "velocity" };
        assert_eq!(err.to_string(), "non-finite velocity after integration");
    }
}
