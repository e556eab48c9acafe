use alloc::string::String;
use core::any::TypeId;

use crate::any::ModuleKey;

/// Why a module was reported unhealthy
#[derive(thiserror::Error, Debug)]
pub enum HealthErrorKind {
    #[error("module not found")]
    NotFound,
    #[error("depends on unhealthy module {dependency}")]
    Dependency { dependency: ModuleKey },
    #[error(transparent)]
    Probe(#[from] anyhow::Error),
    #[error("check health panic: {message}")]
    Panicked { message: String },
    #[error("Incorrect module instance type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: ModuleKey, actual: TypeId },
}

impl HealthErrorKind {
    /// Whether the probe of the module was skipped because of one of its dependencies
    #[inline]
    #[must_use]
    pub const fn is_dependency_failure(&self) -> bool {
        matches!(self, Self::Dependency { .. })
    }
}
