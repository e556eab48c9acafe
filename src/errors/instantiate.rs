use crate::any::ModuleKey;

/// Error returned by a constructor.
///
/// Constructors usually return [`InstantiateErrorKind::Custom`] for their own failures
/// and propagate [`InstantiateErrorKind::Dependency`] with `?` when a dependency can't be resolved.
#[derive(thiserror::Error, Debug)]
pub enum InstantiateErrorKind {
    #[error("dependency {0} failed to build")]
    Dependency(ModuleKey),
    #[error("value {0} not found in context")]
    NoContextValue(&'static str),
    #[error(transparent)]
    Custom(#[from] anyhow::Error),
}

impl InstantiateErrorKind {
    /// Wraps any error as [`InstantiateErrorKind::Custom`]
    #[inline]
    #[must_use]
    pub fn custom<E>(err: E) -> Self
    where
        E: core::error::Error + Send + Sync + 'static,
    {
        Self::Custom(anyhow::Error::new(err))
    }

    /// Returns the custom error if it's of type `E`
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: core::fmt::Display + core::fmt::Debug + Send + Sync + 'static,
    {
        match self {
            Self::Custom(err) => err.downcast_ref(),
            Self::Dependency(_) | Self::NoContextValue(_) => None,
        }
    }
}
