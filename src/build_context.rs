use alloc::{collections::BTreeSet, rc::Rc, vec::Vec};
use core::{any::Any as _, cell::RefCell, mem};
use tracing::{debug, debug_span, error, warn};

use crate::{
    any::ModuleKey,
    cache::Cache,
    config::Config,
    context::{Context, ModuleSource},
    dependency_resolver::DependencyResolver,
    errors::{InstantiateErrorKind, ResolveErrorKind},
    repo::Providers,
    utils::{
        panic::call_guarded,
        thread_safety::{downcast, RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
    },
};

#[derive(Default)]
struct BuildState {
    cache: Cache,
    building: Vec<ModuleKey>,
    failure: Option<ResolveErrorKind>,
}

struct Shared {
    context: Context,
    providers: RcThreadSafety<Providers>,
    config: Config,
    state: RefCell<BuildState>,
}

/// Carrier passed to constructors during an injection pass.
///
/// Looking a module up builds it on first use and memoizes it for the rest of the pass,
/// every looked up key is recorded as a dependency of the module being built.
/// Host values of the injected context stay reachable through [`BuildContext::context`].
pub struct BuildContext {
    shared: Rc<Shared>,
    current: Option<ModuleKey>,
    touched: RefCell<BTreeSet<ModuleKey>>,
}

impl BuildContext {
    #[must_use]
    pub(crate) fn new(context: Context, providers: RcThreadSafety<Providers>, config: Config, cache: Cache) -> Self {
        Self {
            shared: Rc::new(Shared {
                context,
                providers,
                config,
                state: RefCell::new(BuildState {
                    cache,
                    building: Vec::new(),
                    failure: None,
                }),
            }),
            current: None,
            touched: RefCell::new(BTreeSet::new()),
        }
    }

    #[inline]
    #[must_use]
    fn child(&self, key: ModuleKey) -> Self {
        Self {
            shared: self.shared.clone(),
            current: Some(key),
            touched: RefCell::new(BTreeSet::new()),
        }
    }

    /// Context the repo injects into
    #[inline]
    #[must_use]
    pub fn context(&self) -> &Context {
        &self.shared.context
    }

    /// Module whose constructor received this context, `None` outside of constructors
    #[inline]
    #[must_use]
    pub const fn current(&self) -> Option<ModuleKey> {
        self.current
    }

    /// Gets a module, building it first if needed.
    ///
    /// # Errors
    /// Returns [`InstantiateErrorKind::Dependency`] naming the module that failed to build.
    /// The failure itself is reported by [`crate::Repo::inject_to`], even if the caller ignores this error.
    pub fn get<T: SendSafety + SyncSafety + 'static>(&self) -> Result<RcThreadSafety<T>, InstantiateErrorKind> {
        let key = ModuleKey::of::<T>();
        let instance = self.resolve_key(key)?;

        match downcast::<T>(instance) {
            Ok(instance) => Ok(instance),
            Err(instance) => Err(self.fail(ResolveErrorKind::IncorrectType {
                expected: key,
                actual: (*instance).type_id(),
            })),
        }
    }

    /// Resolves dependencies declared as a type, e.g. `(Inject<Db>, InjectValue<Target>)`
    ///
    /// # Errors
    /// Returns the error of the first dependency that can't be resolved
    #[inline]
    pub fn resolve<Deps: DependencyResolver>(&self) -> Result<Deps, Deps::Error> {
        Deps::resolve(self)
    }

    pub(crate) fn resolve_key(&self, key: ModuleKey) -> Result<RcAnyThreadSafety, InstantiateErrorKind> {
        let span = debug_span!("resolve", module = key.name);
        let _guard = span.enter();

        self.touched.borrow_mut().insert(key);

        {
            let state = self.shared.state.borrow();
            if let Some(failure) = &state.failure {
                debug!("Injection pass already failed");
                return Err(InstantiateErrorKind::Dependency(failure.key()));
            }
            if let Some(instance) = state.cache.get(&key) {
                debug!("Found in cache");
                return Ok(instance);
            }
        }
        debug!("Not found in cache");

        let Some((key, provider)) = self
            .shared
            .providers
            .get_key_value(&key)
            .map(|(key, registration)| (*key, registration.provider.clone()))
        else {
            let err = ResolveErrorKind::NoProvider {
                key,
                requested_by: self.current,
            };
            warn!("{}", err);
            return Err(self.fail(err));
        };

        let cycle = {
            let state = self.shared.state.borrow();
            state.building.iter().position(|building| *building == key).map(|start| {
                let mut path = state.building[start..].to_vec();
                path.push(key);
                path.into_boxed_slice()
            })
        };
        if let Some(path) = cycle {
            return Err(self.fail(ResolveErrorKind::CyclicDependency { key, path }));
        }

        let child = self.child(key);
        self.shared.state.borrow_mut().building.push(key);
        let result = call_guarded(self.shared.config.catch_panics, || (*provider.instantiator)(&child));
        self.shared.state.borrow_mut().building.pop();

        // Nested failure is already recorded, the constructor result is irrelevant even if it's `Ok`
        let failed = self.shared.state.borrow().failure.as_ref().map(ResolveErrorKind::key);
        if let Some(failed) = failed {
            return Err(InstantiateErrorKind::Dependency(failed));
        }

        match result {
            Ok(Ok(instance)) => {
                let dependencies = child.touched.into_inner();
                debug!(dependencies = dependencies.len(), "Cached");
                self.shared.state.borrow_mut().cache.insert(key, instance.clone(), dependencies);
                Ok(instance)
            }
            Ok(Err(err)) => Err(self.fail(ResolveErrorKind::Instantiator { key, source: err })),
            Err(message) => Err(self.fail(ResolveErrorKind::Panicked { key, message })),
        }
    }

    /// Records the first failure of the pass and returns the error seen by constructors
    fn fail(&self, err: ResolveErrorKind) -> InstantiateErrorKind {
        error!("{}", err);

        let key = err.key();
        let mut state = self.shared.state.borrow_mut();
        if state.failure.is_none() {
            state.failure = Some(err);
        }
        InstantiateErrorKind::Dependency(key)
    }

    /// Ends the pass, returning what was built and the failure if there was one
    pub(crate) fn finish(self) -> (Cache, Option<ResolveErrorKind>) {
        let mut state = self.shared.state.borrow_mut();
        (mem::take(&mut state.cache), state.failure.take())
    }
}

impl ModuleSource for BuildContext {
    #[inline]
    fn module<T: SendSafety + SyncSafety + 'static>(&self) -> Option<RcThreadSafety<T>> {
        self.get().ok()
    }
}
