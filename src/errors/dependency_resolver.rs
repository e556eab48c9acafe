use alloc::{boxed::Box, string::String};
use core::{
    any::TypeId,
    fmt::{self, Display, Formatter},
};

use super::instantiate::InstantiateErrorKind;
use crate::any::ModuleKey;

/// Failure of an injection pass, always naming the module that failed
#[derive(thiserror::Error, Debug)]
pub enum ResolveErrorKind {
    #[error("can't find module {key}{}", RequestedBy(.requested_by))]
    NoProvider {
        key: ModuleKey,
        requested_by: Option<ModuleKey>,
    },
    #[error("creating with module {key}: {source}")]
    Instantiator {
        key: ModuleKey,
        #[source]
        source: InstantiateErrorKind,
    },
    #[error("creating with module {key} panicked: {message}")]
    Panicked { key: ModuleKey, message: String },
    #[error("Cyclic dependency detected: {}", DependencyPath(.path))]
    CyclicDependency { key: ModuleKey, path: Box<[ModuleKey]> },
    #[error("Incorrect module provides type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: ModuleKey, actual: TypeId },
}

impl ResolveErrorKind {
    /// Module the failure is reported against.
    /// For a cycle it's the module that was requested again while being built.
    #[must_use]
    pub fn key(&self) -> ModuleKey {
        match self {
            Self::NoProvider { key, .. }
            | Self::Instantiator { key, .. }
            | Self::Panicked { key, .. }
            | Self::CyclicDependency { key, .. } => *key,
            Self::IncorrectType { expected, .. } => *expected,
        }
    }

    /// Error returned by the failed constructor, if the failure came from one
    #[must_use]
    pub fn instantiate_error(&self) -> Option<&InstantiateErrorKind> {
        match self {
            Self::Instantiator { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Displays modules of a dependency chain as `A -> B -> A`
pub struct DependencyPath<'a>(pub &'a [ModuleKey]);

impl Display for DependencyPath<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (index, key) in self.0.iter().enumerate() {
            if index != 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{key}")?;
        }
        Ok(())
    }
}

struct RequestedBy<'a>(&'a Option<ModuleKey>);

impl Display for RequestedBy<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(key) => write!(f, " (requested by {key})"),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResolveErrorKind;
    use crate::any::ModuleKey;

    use alloc::{string::ToString as _, vec};

    struct A;
    struct B;

    #[test]
    fn test_messages() {
        let a = ModuleKey::named::<A>("A");
        let b = ModuleKey::named::<B>("B");

        let err = ResolveErrorKind::NoProvider { key: b, requested_by: Some(a) };
        assert_eq!(err.to_string(), "can't find module B (requested by A)");
        assert_eq!(err.key(), b);

        let err = ResolveErrorKind::NoProvider { key: b, requested_by: None };
        assert_eq!(err.to_string(), "can't find module B");

        let err = ResolveErrorKind::CyclicDependency {
            key: a,
            path: vec![a, b, a].into_boxed_slice(),
        };
        assert_eq!(err.to_string(), "Cyclic dependency detected: A -> B -> A");
        assert_eq!(err.key(), a);
    }
}
