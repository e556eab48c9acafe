use alloc::collections::BTreeMap;
use core::{
    any::{type_name, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
    hash::{Hash, Hasher},
};

use crate::utils::thread_safety::RcAnyThreadSafety;

/// Identity of one injectable type.
///
/// Two keys are equal iff they were derived from the same declared type, the display name doesn't take part in comparison.
#[derive(Debug, Clone, Copy)]
pub struct ModuleKey {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for ModuleKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ModuleKey {}

impl PartialOrd for ModuleKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ModuleKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Hash for ModuleKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Display for ModuleKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl ModuleKey {
    /// Creates a key of `T` with a caller supplied display name
    #[inline]
    #[must_use]
    #[cfg(const_type_id)]
    pub const fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            id: TypeId::of::<T>(),
        }
    }

    /// Creates a key of `T` with a caller supplied display name
    #[inline]
    #[must_use]
    #[cfg(not(const_type_id))]
    pub fn named<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

pub(crate) type Map = BTreeMap<ModuleKey, RcAnyThreadSafety>;

#[cfg(test)]
mod tests {
    use super::ModuleKey;

    struct Db;
    struct Cache;

    #[test]
    fn test_identity_by_type() {
        assert_eq!(ModuleKey::of::<Db>(), ModuleKey::of::<Db>());
        assert_ne!(ModuleKey::of::<Db>(), ModuleKey::of::<Cache>());
        assert_eq!(ModuleKey::of::<Db>(), ModuleKey::named::<Db>("db"));
    }

    #[test]
    fn test_names() {
        let key = ModuleKey::of::<Db>();
        assert!(key.name.ends_with("::Db"));
        assert_eq!(key.short_name(), "Db");
        assert_eq!(ModuleKey::named::<Cache>("cache").short_name(), "cache");
    }
}
