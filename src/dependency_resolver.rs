use crate::{build_context::BuildContext, errors::InstantiateErrorKind, utils::thread_safety::SendSafety};

/// Dependency that can be resolved from a [`BuildContext`], used as an argument of constructors
/// passed to [`crate::Module::provide_with`]
pub trait DependencyResolver: Sized {
    type Error: Into<InstantiateErrorKind>;

    fn resolve(context: &BuildContext) -> Result<Self, Self::Error>;
}

macro_rules! impl_dependency_resolver {
    (
        [$($ty:ident),*]
    ) => {
        #[allow(non_snake_case, unused_mut)]
        impl<$($ty,)*> DependencyResolver for ($($ty,)*)
        where
            $( $ty: DependencyResolver + SendSafety, )*
        {
            type Error = InstantiateErrorKind;

            #[inline]
            #[allow(unused_variables)]
            fn resolve(context: &BuildContext) -> Result<Self, Self::Error> {
                Ok(($($ty::resolve(context).map_err(Into::into)?,)*))
            }
        }
    };
}

all_the_tuples!(impl_dependency_resolver);
