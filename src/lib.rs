#![no_std]

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[macro_use]
pub(crate) mod macros;

pub(crate) mod any;
pub(crate) mod build_context;
pub(crate) mod cache;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod dependency_resolver;
pub(crate) mod errors;
pub(crate) mod health;
pub(crate) mod inject;
pub(crate) mod instantiator;
pub(crate) mod module;
pub(crate) mod provider;
pub(crate) mod repo;

pub mod utils;

pub use any::ModuleKey;
pub use build_context::BuildContext;
pub use config::Config;
pub use context::{Context, ModuleSource};
pub use dependency_resolver::DependencyResolver;
pub use errors::{DependencyPath, HealthErrorKind, InstantiateErrorKind, ResolveErrorKind};
pub use health::{check_health, CheckHealth, HealthReport};
pub use inject::{Inject, InjectValue};
pub use instantiator::{instance, Instantiator};
pub use module::Module;
pub use provider::Provider;
pub use repo::Repo;
