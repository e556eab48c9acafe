use alloc::collections::{BTreeMap, BTreeSet};

use crate::{
    any::{self, ModuleKey},
    utils::thread_safety::RcAnyThreadSafety,
};

/// Dependencies discovered for every successfully built module
pub(crate) type DependencyGraph = BTreeMap<ModuleKey, BTreeSet<ModuleKey>>;

/// Built instances of a repo together with the edges discovered while building them.
/// Both only grow: an entry is added once a module is built and is never removed.
#[derive(Default, Clone)]
pub(crate) struct Cache {
    pub(crate) map: any::Map,
    pub(crate) graph: DependencyGraph,
}

impl Cache {
    #[inline]
    #[must_use]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub(crate) fn get(&self, key: &ModuleKey) -> Option<RcAnyThreadSafety> {
        self.map.get(key).cloned()
    }

    #[inline]
    #[must_use]
    pub(crate) fn contains(&self, key: &ModuleKey) -> bool {
        self.map.contains_key(key)
    }

    #[inline]
    pub(crate) fn insert(&mut self, key: ModuleKey, instance: RcAnyThreadSafety, dependencies: BTreeSet<ModuleKey>) {
        self.map.insert(key, instance);
        self.graph.insert(key, dependencies);
    }

    #[inline]
    #[must_use]
    pub(crate) fn dependencies(&self, key: &ModuleKey) -> Option<&BTreeSet<ModuleKey>> {
        self.graph.get(key)
    }
}
