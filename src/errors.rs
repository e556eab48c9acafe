mod dependency_resolver;
mod health;
mod instantiate;

pub use dependency_resolver::{DependencyPath, ResolveErrorKind};
pub use health::HealthErrorKind;
pub use instantiate::InstantiateErrorKind;
