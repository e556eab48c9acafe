use alloc::collections::{BTreeMap, BTreeSet};
use core::fmt;

use crate::{
    any::{self, ModuleKey},
    cache::Cache,
    provider::BoxedHealthProbe,
    utils::thread_safety::{downcast, RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
};

/// Something modules can be looked up from: an injected [`Context`] or a [`crate::BuildContext`] during an injection pass
pub trait ModuleSource {
    /// Returns the instance of `T` or `None` if it can't be provided
    fn module<T: SendSafety + SyncSafety + 'static>(&self) -> Option<RcThreadSafety<T>>;
}

/// Snapshot of a successful injection pass shared by every context the repo injected into
pub(crate) struct Modules {
    pub(crate) cache: Cache,
    pub(crate) probes: BTreeMap<ModuleKey, BoxedHealthProbe>,
}

/// Carrier passed from the host framework to the repo and back.
///
/// Holds host values inserted with [`Context::insert`] and, after [`crate::Repo::inject_to`], the repo modules.
/// Cloning is cheap, modules are shared.
#[derive(Clone)]
pub struct Context {
    pub(crate) map: any::Map,
    pub(crate) modules: Option<RcThreadSafety<Modules>>,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").finish_non_exhaustive()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            map: any::Map::new(),
            modules: None,
        }
    }

    #[inline]
    pub fn insert<T: SendSafety + SyncSafety + 'static>(&mut self, value: T) -> Option<RcThreadSafety<T>> {
        self.insert_rc(RcThreadSafety::new(value))
    }

    #[inline]
    pub fn insert_rc<T: SendSafety + SyncSafety + 'static>(&mut self, value: RcThreadSafety<T>) -> Option<RcThreadSafety<T>> {
        self.map
            .insert(ModuleKey::of::<T>(), value)
            .and_then(|prev| downcast(prev).ok())
    }

    /// Builder-style [`Context::insert`]
    #[inline]
    #[must_use]
    pub fn with<T: SendSafety + SyncSafety + 'static>(mut self, value: T) -> Self {
        self.insert(value);
        self
    }

    /// Gets a host value inserted with [`Context::insert`]
    #[inline]
    #[must_use]
    pub fn get<T: SendSafety + SyncSafety + 'static>(&self) -> Option<RcThreadSafety<T>> {
        self.map.get(&ModuleKey::of::<T>()).and_then(|value| downcast(value.clone()).ok())
    }

    /// Gets an injected module.
    /// Returns `None` if the context wasn't injected or the module isn't registered.
    #[inline]
    #[must_use]
    pub fn module<T: SendSafety + SyncSafety + 'static>(&self) -> Option<RcThreadSafety<T>> {
        self.instance(&ModuleKey::of::<T>()).and_then(|instance| downcast(instance).ok())
    }

    /// Whether the context carries modules of a successful injection pass
    #[inline]
    #[must_use]
    pub fn is_injected(&self) -> bool {
        self.modules.is_some()
    }

    /// Keys of all injected modules
    pub fn modules(&self) -> impl Iterator<Item = ModuleKey> + '_ {
        self.modules.iter().flat_map(|modules| modules.cache.map.keys().copied())
    }

    /// Dependencies discovered for the module while it was built
    #[inline]
    #[must_use]
    pub fn dependencies(&self, key: &ModuleKey) -> Option<&BTreeSet<ModuleKey>> {
        self.modules.as_ref().and_then(|modules| modules.cache.dependencies(key))
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, key: &ModuleKey) -> bool {
        self.modules.as_ref().is_some_and(|modules| modules.cache.contains(key))
    }

    #[inline]
    pub(crate) fn instance(&self, key: &ModuleKey) -> Option<RcAnyThreadSafety> {
        self.modules.as_ref().and_then(|modules| modules.cache.get(key))
    }

    #[inline]
    #[must_use]
    pub(crate) fn with_modules(mut self, modules: RcThreadSafety<Modules>) -> Self {
        self.modules = Some(modules);
        self
    }
}

impl ModuleSource for Context {
    #[inline]
    fn module<T: SendSafety + SyncSafety + 'static>(&self) -> Option<RcThreadSafety<T>> {
        Context::module(self)
    }
}

#[cfg(test)]
mod tests {
    use super::Context;
    use crate::utils::thread_safety::RcThreadSafety;

    struct Target(&'static str);

    #[test]
    fn test_values() {
        let mut context = Context::new();
        assert!(context.get::<Target>().is_none());
        assert!(context.insert(Target("localhost.db")).is_none());

        let prev = context.insert(Target("target.db")).unwrap();
        assert_eq!(prev.0, "localhost.db");
        assert_eq!(context.get::<Target>().unwrap().0, "target.db");

        let cloned = context.clone();
        assert!(RcThreadSafety::ptr_eq(&cloned.get::<Target>().unwrap(), &context.get::<Target>().unwrap()));
    }

    #[test]
    fn test_soft_miss_without_modules() {
        let context = Context::new().with(Target("target.db"));

        assert!(!context.is_injected());
        assert!(context.module::<Target>().is_none());
        assert_eq!(context.modules().count(), 0);
    }
}
