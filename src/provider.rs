use core::{any::Any as _, fmt, panic::Location};
use tracing::debug;

use crate::{
    any::ModuleKey,
    build_context::BuildContext,
    context::Context,
    errors::{HealthErrorKind, InstantiateErrorKind},
    utils::thread_safety::{downcast, RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
};

pub(crate) type BoxedInstantiator =
    RcThreadSafety<dyn Fn(&BuildContext) -> Result<RcAnyThreadSafety, InstantiateErrorKind> + Send + Sync>;

pub(crate) type BoxedHealthProbe = RcThreadSafety<dyn Fn(&RcAnyThreadSafety, &Context) -> Result<(), HealthErrorKind> + Send + Sync>;

/// Constructor bound to the key of the type it provides.
///
/// Providers are created with [`crate::Module::provide`] and friends and registered with [`crate::Repo::add`].
/// Nothing is constructed until the repo injects.
#[derive(Clone)]
pub struct Provider {
    pub(crate) key: ModuleKey,
    pub(crate) instantiator: BoxedInstantiator,
    pub(crate) probe: Option<BoxedHealthProbe>,
    pub(crate) location: &'static Location<'static>,
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("has_probe", &self.probe.is_some())
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Provider {
    /// Creates a provider of `T` from a constructor.
    /// The constructor looks its dependencies up from the passed [`BuildContext`].
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn new<T, F, E>(ctor: F) -> Self
    where
        T: SendSafety + SyncSafety + 'static,
        F: Fn(&BuildContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<InstantiateErrorKind>,
    {
        Self::from_boxed(ModuleKey::of::<T>(), boxed_instantiator(ctor))
    }

    #[inline]
    #[must_use]
    #[track_caller]
    pub(crate) fn from_boxed(key: ModuleKey, instantiator: BoxedInstantiator) -> Self {
        Self {
            key,
            instantiator,
            probe: None,
            location: Location::caller(),
        }
    }

    #[inline]
    #[must_use]
    pub const fn key(&self) -> ModuleKey {
        self.key
    }

    /// Source location the provider was created at
    #[inline]
    #[must_use]
    pub const fn location(&self) -> &'static Location<'static> {
        self.location
    }

    /// Substitutes the constructor of the provider, keeping its key and health probe.
    ///
    /// # Panics
    /// Panics if `T` isn't the type the provider was created for.
    #[must_use]
    #[track_caller]
    pub fn substitute<T, F, E>(self, ctor: F) -> Self
    where
        T: SendSafety + SyncSafety + 'static,
        F: Fn(&BuildContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<InstantiateErrorKind>,
    {
        let key = ModuleKey::of::<T>();
        assert!(
            key == self.key,
            "can't substitute a constructor of {} for a provider of {}",
            key.name,
            self.key.name
        );

        Self {
            key: self.key,
            instantiator: boxed_instantiator(ctor),
            probe: self.probe,
            location: Location::caller(),
        }
    }

    /// Attaches a health probe, run by [`crate::check_health`] against the built instance.
    ///
    /// If `T` isn't the provided type the probe reports [`HealthErrorKind::IncorrectType`].
    #[must_use]
    pub fn with_health_check<T, F>(mut self, probe: F) -> Self
    where
        T: SendSafety + SyncSafety + 'static,
        F: Fn(&T, &Context) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.probe = Some(boxed_health_probe(probe));
        self
    }
}

#[must_use]
pub(crate) fn boxed_instantiator<T, F, E>(ctor: F) -> BoxedInstantiator
where
    T: SendSafety + SyncSafety + 'static,
    F: Fn(&BuildContext) -> Result<T, E> + Send + Sync + 'static,
    E: Into<InstantiateErrorKind>,
{
    RcThreadSafety::new(move |context: &BuildContext| -> Result<RcAnyThreadSafety, InstantiateErrorKind> {
        let instance = match ctor(context) {
            Ok(instance) => instance,
            Err(err) => return Err(err.into()),
        };

        debug!("Created");

        Ok(RcThreadSafety::new(instance))
    })
}

#[must_use]
fn boxed_health_probe<T, F>(probe: F) -> BoxedHealthProbe
where
    T: SendSafety + SyncSafety + 'static,
    F: Fn(&T, &Context) -> anyhow::Result<()> + Send + Sync + 'static,
{
    RcThreadSafety::new(move |instance: &RcAnyThreadSafety, context: &Context| -> Result<(), HealthErrorKind> {
        match downcast::<T>(instance.clone()) {
            Ok(instance) => probe(&instance, context).map_err(HealthErrorKind::Probe),
            Err(instance) => Err(HealthErrorKind::IncorrectType {
                expected: ModuleKey::of::<T>(),
                actual: (*instance).type_id(),
            }),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::Provider;
    use crate::{any::ModuleKey, errors::InstantiateErrorKind};

    struct Db(&'static str);
    struct Cache;

    #[test]
    fn test_key_and_location() {
        let provider = Provider::new(|_| Ok::<_, InstantiateErrorKind>(Db("localhost.db")));

        assert_eq!(provider.key(), ModuleKey::of::<Db>());
        assert_eq!(provider.location().file(), file!());
        assert!(provider.probe.is_none());
    }

    #[test]
    fn test_substitute_keeps_key_and_probe() {
        let provider = Provider::new(|_| Ok::<_, InstantiateErrorKind>(Db("localhost.db")))
            .with_health_check(|_: &Db, _| Ok(()))
            .substitute(|_| Ok::<_, InstantiateErrorKind>(Db("mock.db")));

        assert_eq!(provider.key(), ModuleKey::of::<Db>());
        assert!(provider.probe.is_some());
    }

    #[test]
    #[should_panic(expected = "can't substitute a constructor")]
    fn test_substitute_other_type() {
        let _ = Provider::new(|_| Ok::<_, InstantiateErrorKind>(Db("localhost.db"))).substitute(|_| Ok::<_, InstantiateErrorKind>(Cache));
    }
}
