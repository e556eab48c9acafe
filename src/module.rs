use core::{fmt, marker::PhantomData};

use crate::{
    any::ModuleKey,
    build_context::BuildContext,
    context::{Context, ModuleSource},
    dependency_resolver::DependencyResolver,
    errors::InstantiateErrorKind,
    health::CheckHealth,
    instantiator::{boxed_instantiator_factory, instance, Instantiator},
    provider::{boxed_instantiator, Provider},
    utils::thread_safety::{RcThreadSafety, SendSafety, SyncSafety},
};

/// Typed handle over the [`ModuleKey`] of `T`.
///
/// Looks the instance up from a carrier and creates providers of `T`:
/// ```
/// use modwire::{BuildContext, InstantiateErrorKind, Module, Repo};
///
/// struct Db(&'static str);
/// struct Cache(&'static str);
///
/// const DB: Module<Db> = Module::new();
/// const CACHE: Module<Cache> = Module::new();
///
/// let repo = Repo::new()
///     .provide(DB.provide(|_| Ok::<_, InstantiateErrorKind>(Db("localhost.db"))))
///     .provide(CACHE.provide(|ctx: &BuildContext| {
///         let db = DB.get(ctx)?;
///         Ok::<_, InstantiateErrorKind>(Cache(db.0))
///     }));
///
/// let context = repo.build().unwrap();
/// assert_eq!(CACHE.value(&context).unwrap().0, "localhost.db");
/// ```
pub struct Module<T> {
    name: Option<&'static str>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Module<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Module<T> {}

impl<T: 'static> fmt::Debug for Module<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Module").field(&self.key().name).finish()
    }
}

impl<T: 'static> Default for Module<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> Module<T> {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            name: None,
            _marker: PhantomData,
        }
    }

    /// Same identity as [`Module::new`] with a custom display name used in errors and logs
    #[inline]
    #[must_use]
    pub const fn named(name: &'static str) -> Self {
        Self {
            name: Some(name),
            _marker: PhantomData,
        }
    }

    #[inline]
    #[must_use]
    pub fn key(&self) -> ModuleKey {
        match self.name {
            Some(name) => ModuleKey::named::<T>(name),
            None => ModuleKey::of::<T>(),
        }
    }
}

impl<T: SendSafety + SyncSafety + 'static> Module<T> {
    /// Returns the instance from the carrier, `None` if it can't be provided
    #[inline]
    #[must_use]
    pub fn value<S: ModuleSource>(&self, source: &S) -> Option<RcThreadSafety<T>> {
        source.module::<T>()
    }

    /// Same as [`Module::value`] during an injection pass, propagating why the module is missing
    ///
    /// # Errors
    /// Returns [`InstantiateErrorKind::Dependency`] naming the module that failed to build
    #[inline]
    pub fn get(&self, context: &BuildContext) -> Result<RcThreadSafety<T>, InstantiateErrorKind> {
        context.get::<T>()
    }

    /// Returns `true` if the context carries a built instance of `T`
    #[inline]
    #[must_use]
    pub fn is_injected(&self, context: &Context) -> bool {
        context.contains(&self.key())
    }

    /// Creates a provider of `T` from a constructor looking its dependencies up from the [`BuildContext`]
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn provide<F, E>(&self, ctor: F) -> Provider
    where
        F: Fn(&BuildContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<InstantiateErrorKind>,
    {
        Provider::from_boxed(self.key(), boxed_instantiator(ctor))
    }

    /// Creates a provider of `T` from a constructor taking its dependencies as arguments
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn provide_with<Inst, Deps>(&self, instantiator: Inst) -> Provider
    where
        Inst: Instantiator<Deps, Provides = T> + Send + Sync,
        Deps: DependencyResolver,
    {
        Provider::from_boxed(self.key(), boxed_instantiator_factory(instantiator))
    }

    /// Creates a provider of `T` returning a value created outside the repo
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn provide_instance(&self, value: T) -> Provider
    where
        T: Clone,
    {
        self.provide_with(instance(value))
    }

    /// Same as [`Module::provide`] with the health check of `T` attached
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn provide_checked<F, E>(&self, ctor: F) -> Provider
    where
        T: CheckHealth,
        F: Fn(&BuildContext) -> Result<T, E> + Send + Sync + 'static,
        E: Into<InstantiateErrorKind>,
    {
        self.provide(ctor).with_health_check(T::check_health)
    }
}
