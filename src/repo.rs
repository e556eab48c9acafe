use alloc::collections::BTreeMap;
use core::{mem, panic::Location};
use parking_lot::Mutex;
use tracing::{debug, error, info_span, warn};

use crate::{
    any::ModuleKey,
    build_context::BuildContext,
    cache::Cache,
    config::Config,
    context::{Context, Modules},
    errors::ResolveErrorKind,
    provider::Provider,
    utils::thread_safety::RcThreadSafety,
};

#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) provider: Provider,
    pub(crate) added_at: &'static Location<'static>,
}

pub(crate) type Providers = BTreeMap<ModuleKey, Registration>;

struct RepoState {
    cache: Cache,
    modules: Option<RcThreadSafety<Modules>>,
}

/// Injection pass over the repo state.
/// The modules built by the pass are returned to the state even if a constructor unwinds through it.
struct Pass<'a> {
    state: &'a mut RepoState,
    build_context: Option<BuildContext>,
}

impl Pass<'_> {
    fn resolve(&self, keys: impl Iterator<Item = ModuleKey>) {
        let Some(build_context) = &self.build_context else {
            return;
        };
        for key in keys {
            if build_context.resolve_key(key).is_err() {
                break;
            }
        }
    }

    fn finish(mut self) -> Option<ResolveErrorKind> {
        self.restore()
    }

    fn restore(&mut self) -> Option<ResolveErrorKind> {
        let (cache, failure) = self.build_context.take()?.finish();
        self.state.cache = cache;
        failure
    }
}

impl Drop for Pass<'_> {
    fn drop(&mut self) {
        if self.build_context.is_some() {
            warn!("Injection pass interrupted, keeping built modules");
            self.restore();
        }
    }
}

/// Registry of providers building every module once and sharing the result with every context it injects into.
///
/// ```
/// use modwire::{BuildContext, Context, InstantiateErrorKind, Module, Repo};
///
/// struct Target(&'static str);
/// struct Db(&'static str);
///
/// let repo = Repo::new().provide(Module::<Db>::new().provide(|ctx: &BuildContext| {
///     let target = ctx.context().get::<Target>().ok_or(InstantiateErrorKind::NoContextValue("Target"))?;
///     Ok::<_, InstantiateErrorKind>(Db(target.0))
/// }));
///
/// let context = repo.inject_to(Context::new().with(Target("localhost.db"))).unwrap();
/// assert_eq!(context.module::<Db>().unwrap().0, "localhost.db");
/// ```
pub struct Repo {
    providers: RcThreadSafety<Providers>,
    config: Config,
    state: Mutex<RepoState>,
}

impl Default for Repo {
    fn default() -> Self {
        Self::new()
    }
}

impl Repo {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    #[inline]
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            providers: RcThreadSafety::new(Providers::new()),
            config,
            state: Mutex::new(RepoState {
                cache: Cache::new(),
                modules: None,
            }),
        }
    }

    /// Registers a provider. Nothing is built until [`Repo::inject_to`].
    ///
    /// # Panics
    /// Panics if a provider for the same type is already registered.
    /// Use [`Repo::replace`] to swap it deliberately.
    #[track_caller]
    pub fn add(&mut self, provider: Provider) {
        let key = provider.key();
        let added_at = Location::caller();

        if let Some(registration) = self.providers.get(&key) {
            panic!(
                "already have a provider with type \"{}\", added at {}, adding again at {}",
                key.name, registration.added_at, added_at
            );
        }

        debug!(module = key.name, "Provider added");
        RcThreadSafety::make_mut(&mut self.providers).insert(key, Registration { provider, added_at });
        self.invalidate();
    }

    /// Builder-style [`Repo::add`]
    ///
    /// # Panics
    /// Panics if a provider for the same type is already registered.
    #[inline]
    #[must_use]
    #[track_caller]
    pub fn provide(mut self, provider: Provider) -> Self {
        self.add(provider);
        self
    }

    /// Registers a provider, returning the provider it replaced.
    ///
    /// # Warning
    /// A module that is already built keeps its instance, only the health probe of the new provider is used for it.
    #[track_caller]
    pub fn replace(&mut self, provider: Provider) -> Option<Provider> {
        let key = provider.key();
        let added_at = Location::caller();

        debug!(module = key.name, "Provider replaced");
        let prev = RcThreadSafety::make_mut(&mut self.providers)
            .insert(key, Registration { provider, added_at })
            .map(|registration| registration.provider);
        self.invalidate();
        prev
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.providers.contains_key(key)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Keys of all registered providers
    pub fn keys(&self) -> impl Iterator<Item = ModuleKey> + '_ {
        self.providers.keys().copied()
    }

    /// Builds every module not built yet and attaches all modules to the context.
    ///
    /// Modules are built once per repo: after the first successful call every context shares the same modules
    /// and constructors are not called again until a provider is added.
    ///
    /// # Errors
    /// Returns the first failure of the pass.
    /// Modules built before the failure are kept and are not built again by the next call.
    pub fn inject_to(&self, context: Context) -> Result<Context, ResolveErrorKind> {
        let span = info_span!("inject_to", providers = self.providers.len());
        let _guard = span.enter();

        let mut state = self.state.lock();
        if let Some(modules) = &state.modules {
            debug!("Modules already built");
            return Ok(context.with_modules(modules.clone()));
        }

        let failure = {
            let cache = mem::take(&mut state.cache);
            let pass = Pass {
                state: &mut *state,
                build_context: Some(BuildContext::new(context.clone(), self.providers.clone(), self.config, cache)),
            };
            pass.resolve(self.providers.keys().copied());
            pass.finish()
        };
        if let Some(err) = failure {
            error!("Injection failed: {}", err);
            return Err(err);
        }

        let probes = self
            .providers
            .iter()
            .filter_map(|(key, registration)| registration.provider.probe.clone().map(|probe| (*key, probe)))
            .collect();
        let modules = RcThreadSafety::new(Modules {
            cache: state.cache.clone(),
            probes,
        });
        state.modules = Some(modules.clone());

        debug!(modules = state.cache.map.len(), "Injected");
        Ok(context.with_modules(modules))
    }

    /// [`Repo::inject_to`] an empty context
    ///
    /// # Errors
    /// Returns the first failure of the pass
    #[inline]
    pub fn build(&self) -> Result<Context, ResolveErrorKind> {
        self.inject_to(Context::new())
    }

    #[inline]
    fn invalidate(&mut self) {
        self.state.get_mut().modules = None;
    }
}
