use core::any::type_name;

use crate::{
    build_context::BuildContext,
    dependency_resolver::DependencyResolver,
    errors::InstantiateErrorKind,
    utils::thread_safety::{RcThreadSafety, SendSafety, SyncSafety},
};

/// Module of the repo, built first if needed
pub struct Inject<Dep>(pub RcThreadSafety<Dep>);

impl<Dep: SendSafety + SyncSafety + 'static> DependencyResolver for Inject<Dep> {
    type Error = InstantiateErrorKind;

    fn resolve(context: &BuildContext) -> Result<Self, Self::Error> {
        context.get().map(Self)
    }
}

/// Host value inserted into the context before injection
pub struct InjectValue<Value>(pub RcThreadSafety<Value>);

impl<Value: SendSafety + SyncSafety + 'static> DependencyResolver for InjectValue<Value> {
    type Error = InstantiateErrorKind;

    fn resolve(context: &BuildContext) -> Result<Self, Self::Error> {
        context
            .context()
            .get()
            .map(Self)
            .ok_or(InstantiateErrorKind::NoContextValue(type_name::<Value>()))
    }
}
