use crate::{
    build_context::BuildContext,
    dependency_resolver::DependencyResolver,
    errors::InstantiateErrorKind,
    provider::BoxedInstantiator,
    utils::thread_safety::{RcAnyThreadSafety, RcThreadSafety, SendSafety, SyncSafety},
};
use tracing::debug;

/// Constructor taking its dependencies as arguments, see [`crate::Module::provide_with`]
pub trait Instantiator<Deps>: Clone + 'static
where
    Deps: DependencyResolver,
{
    type Provides: 'static;
    type Error: Into<InstantiateErrorKind>;

    fn instantiate(&mut self, dependencies: Deps) -> Result<Self::Provides, Self::Error>;
}

#[must_use]
pub(crate) fn boxed_instantiator_factory<Inst, Deps>(instantiator: Inst) -> BoxedInstantiator
where
    Inst: Instantiator<Deps> + Send + Sync,
    Inst::Provides: SendSafety + SyncSafety,
    Deps: DependencyResolver,
{
    RcThreadSafety::new(move |context: &BuildContext| -> Result<RcAnyThreadSafety, InstantiateErrorKind> {
        let dependencies = match Deps::resolve(context) {
            Ok(dependencies) => dependencies,
            Err(err) => return Err(err.into()),
        };
        let instance = match instantiator.clone().instantiate(dependencies) {
            Ok(instance) => instance,
            Err(err) => return Err(err.into()),
        };

        debug!("Created");

        Ok(RcThreadSafety::new(instance))
    })
}

macro_rules! impl_instantiator {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case)]
        impl<F, Response, Err, $($ty,)*> Instantiator<($($ty,)*)> for F
        where
            F: FnMut($($ty,)*) -> Result<Response, Err> + Clone + 'static,
            Response: 'static,
            Err: Into<InstantiateErrorKind>,
            $( $ty: DependencyResolver + SendSafety, )*
        {
            type Provides = Response;
            type Error = Err;

            fn instantiate(&mut self, ($($ty,)*): ($($ty,)*)) -> Result<Self::Provides, Self::Error> {
                self($($ty,)*)
            }
        }
    };
}

all_the_tuples!(impl_instantiator);

/// Wrapper to create an instantiator that just returns passed value.
/// It can be used when the value was created outside the repo.
#[inline]
#[must_use]
pub const fn instance<T: Clone + 'static>(val: T) -> impl Instantiator<(), Provides = T, Error = InstantiateErrorKind> {
    move || Ok(val.clone())
}

#[cfg(test)]
mod tests {
    extern crate std;
    #[allow(unused_imports)]
    use std::prelude::rust_2021::*;

    use super::{instance, DependencyResolver, InstantiateErrorKind, Instantiator};
    use crate::{
        inject::{Inject, InjectValue},
        utils::thread_safety::RcThreadSafety,
        Context, Module, Repo,
    };

    use core::sync::atomic::{AtomicU8, Ordering};
    use tracing::debug;
    use tracing_test::traced_test;

    struct Request(bool);
    struct Response(bool);
    struct Target(&'static str);

    #[derive(Clone)]
    struct Settings(&'static str);

    #[test]
    #[allow(dead_code)]
    fn test_factory_helper() {
        fn resolver<Deps: DependencyResolver, F: Instantiator<Deps>>(_f: F) {}
        fn resolver_with_dep<Deps: DependencyResolver>() {
            resolver(|| Ok::<_, InstantiateErrorKind>(()));
            resolver(|Inject(_): Inject<Request>| Ok::<_, InstantiateErrorKind>(()));
            resolver(instance(Settings("")));
        }
    }

    #[test]
    #[traced_test]
    fn test_argument_injection() {
        let instantiator_request_call_count = RcThreadSafety::new(AtomicU8::new(0));
        let instantiator_response_call_count = RcThreadSafety::new(AtomicU8::new(0));

        let repo = Repo::new()
            .provide(Module::<Request>::new().provide_with({
                let instantiator_request_call_count = instantiator_request_call_count.clone();
                move || {
                    instantiator_request_call_count.fetch_add(1, Ordering::SeqCst);

                    debug!("Call instantiator request");
                    Ok::<_, InstantiateErrorKind>(Request(true))
                }
            }))
            .provide(Module::<Response>::new().provide_with({
                let instantiator_response_call_count = instantiator_response_call_count.clone();
                move |val_1: Inject<Request>, val_2: Inject<Request>, InjectValue(target): InjectValue<Target>| {
                    assert_eq!(val_1.0 .0, val_2.0 .0);
                    assert_eq!(target.0, "target.db");

                    instantiator_response_call_count.fetch_add(1, Ordering::SeqCst);

                    debug!("Call instantiator response");
                    Ok::<_, InstantiateErrorKind>(Response(val_1.0 .0))
                }
            }));

        let context_1 = repo.inject_to(Context::new().with(Target("target.db"))).unwrap();
        let context_2 = repo.inject_to(Context::new().with(Target("target.db"))).unwrap();

        assert!(context_1.module::<Response>().unwrap().0);
        assert!(RcThreadSafety::ptr_eq(
            &context_1.module::<Response>().unwrap(),
            &context_2.module::<Response>().unwrap()
        ));
        assert_eq!(instantiator_request_call_count.load(Ordering::SeqCst), 1);
        assert_eq!(instantiator_response_call_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[traced_test]
    fn test_instance() {
        let repo = Repo::new().provide(Module::<Settings>::new().provide_with(instance(Settings("localhost"))));

        let context = repo.build().unwrap();
        assert_eq!(context.module::<Settings>().unwrap().0, "localhost");
    }
}
