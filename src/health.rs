use alloc::collections::BTreeMap;
use tracing::{debug, error, info_span, warn};

use crate::{
    any::ModuleKey,
    context::Context,
    errors::HealthErrorKind,
    utils::{
        panic::call_guarded,
        thread_safety::{SendSafety, SyncSafety},
    },
};

/// Health state of every visited module, dependencies included
pub type HealthReport = BTreeMap<ModuleKey, Result<(), HealthErrorKind>>;

/// Health check of a module, attached to its provider with [`crate::Module::provide_checked`]
pub trait CheckHealth: SendSafety + SyncSafety + 'static {
    /// # Errors
    /// Returns why the module is unhealthy
    fn check_health(&self, context: &Context) -> anyhow::Result<()>;
}

/// Checks health of the modules and all their dependencies.
///
/// Dependencies are checked first. If one of them is unhealthy or not found,
/// the module is reported as [`HealthErrorKind::Dependency`] without running its own probe.
/// Every module is probed at most once per call, modules without a probe are healthy.
#[must_use]
pub fn check_health(context: &Context, roots: &[ModuleKey]) -> HealthReport {
    let span = info_span!("check_health", roots = roots.len());
    let _guard = span.enter();

    let mut report = HealthReport::new();
    for key in roots {
        visit(context, *key, &mut report);
    }

    debug!(visited = report.len(), "Health checked");
    report
}

fn visit(context: &Context, key: ModuleKey, report: &mut HealthReport) -> bool {
    if let Some(result) = report.get(&key) {
        return result.is_ok();
    }

    let Some(modules) = context.modules.as_ref() else {
        warn!(module = key.name, "Context isn't injected");
        report.insert(key, Err(HealthErrorKind::NotFound));
        return false;
    };
    let (Some(instance), Some(dependencies)) = (modules.cache.get(&key), modules.cache.dependencies(&key)) else {
        warn!(module = key.name, "Module not found");
        report.insert(key, Err(HealthErrorKind::NotFound));
        return false;
    };

    // Visited
    report.insert(key, Ok(()));

    let mut failed_dependency = None;
    for dependency in dependencies {
        if !visit(context, *dependency, report) && failed_dependency.is_none() {
            failed_dependency = Some(*dependency);
        }
    }

    let result = match failed_dependency {
        Some(dependency) => Err(HealthErrorKind::Dependency { dependency }),
        None => match modules.probes.get(&key) {
            Some(probe) => {
                call_guarded(true, || (**probe)(&instance, context)).unwrap_or_else(|message| Err(HealthErrorKind::Panicked { message }))
            }
            None => Ok(()),
        },
    };

    match &result {
        Ok(()) => debug!(module = key.name, "Healthy"),
        Err(err) => error!(module = key.name, "Unhealthy: {}", err),
    }

    let healthy = result.is_ok();
    report.insert(key, result);
    healthy
}

impl Context {
    /// See [`check_health`]
    #[inline]
    #[must_use]
    pub fn check_health(&self, roots: &[ModuleKey]) -> HealthReport {
        check_health(self, roots)
    }

    /// Checks health of every injected module
    #[must_use]
    pub fn check_all_health(&self) -> HealthReport {
        let roots: alloc::vec::Vec<_> = self.modules().collect();
        check_health(self, &roots)
    }
}
