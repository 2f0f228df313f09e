//! # ECS Error Types
//!
//! Every way a caller can break the ECS contract, plus configuration errors.
//!
//! Contract violations are programmer errors. The panicking API (the one the
//! [`World`](crate::World) exposes) routes them through [`violation`], which
//! logs the error and aborts the current call with its message. The `try_*`
//! variants on the registries hand the same values back as [`EcsResult`].

use thiserror::Error;

/// Errors that can occur in the ECS core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Entity id is the null sentinel or larger than the pool capacity.
    #[error("entity {entity} out of range (valid ids are 1..={capacity})")]
    EntityOutOfRange {
        /// The offending raw id.
        entity: u32,
        /// Capacity of the entity pool.
        capacity: u32,
    },

    /// Every entity id is currently allocated.
    #[error("too many entities: all {capacity} ids are in use")]
    EntityPoolExhausted {
        /// Capacity of the entity pool.
        capacity: u32,
    },

    /// Entity id is in range but is sitting in the recycling pool.
    #[error("entity {0} is not allocated")]
    EntityNotAllocated(u32),

    /// Component type registered a second time.
    #[error("component type {0} registered more than once")]
    DuplicateComponentType(&'static str),

    /// Component type used before `register_component`.
    #[error("component type {0} not registered before use")]
    UnregisteredComponentType(&'static str),

    /// Every signature bit is already assigned.
    #[error("component type limit reached: signatures hold at most {0} types")]
    ComponentLimitReached(usize),

    /// Entity already holds a component of this type.
    #[error("entity {entity} already has a {component} component")]
    DuplicateComponent {
        /// The entity id.
        entity: u32,
        /// Component type name.
        component: &'static str,
    },

    /// Entity holds no component of this type.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The entity id.
        entity: u32,
        /// Component type name.
        component: &'static str,
    },

    /// A system with this name already exists.
    #[error("system {0:?} registered more than once")]
    DuplicateSystem(String),

    /// A system handle that does not point at a system of its type here.
    #[error("system handle {0} was not issued by this world")]
    ForeignSystemHandle(usize),

    /// Configuration values are out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text is not valid TOML for the expected schema.
    #[error("failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration file {path}: {reason}")]
    ConfigIo {
        /// Path that was read.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },
}

/// Result type for ECS operations.
pub type EcsResult<T> = Result<T, EcsError>;

/// Reports a broken ECS contract and panics at the caller's location.
///
/// # Panics
///
/// Always.
#[cold]
#[inline(never)]
#[track_caller]
pub fn violation(err: EcsError) -> ! {
    tracing::error!(error = %err, "ECS contract violation");
    panic!("ECS contract violation: {err}");
}

/// Unwraps an [`EcsResult`], treating the error as a contract violation.
pub(crate) trait OrViolation<T> {
    /// Returns the value or panics through [`violation`].
    fn or_violation(self) -> T;
}

impl<T> OrViolation<T> for EcsResult<T> {
    #[inline]
    #[track_caller]
    fn or_violation(self) -> T {
        match self {
            Ok(value) => value,
            Err(err) => violation(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_fault() {
        let err = EcsError::MissingComponent {
            entity: 7,
            component: "Velocity",
        };
        assert_eq!(err.to_string(), "entity 7 has no Velocity component");

        let err = EcsError::EntityOutOfRange {
            entity: 0,
            capacity: 4096,
        };
        assert_eq!(
            err.to_string(),
            "entity 0 out of range (valid ids are 1..=4096)"
        );
    }

    #[test]
    fn test_ok_passes_through() {
        let result: EcsResult<u32> = Ok(3);
        assert_eq!(result.or_violation(), 3);
    }

    #[test]
    #[should_panic(expected = "ECS contract violation: too many entities")]
    fn test_err_panics_with_display_text() {
        let result: EcsResult<u32> = Err(EcsError::EntityPoolExhausted { capacity: 1 });
        let _ = result.or_violation();
    }
}
