//! Pointer and marker aliases that switch between `Arc` and `Rc` with the `thread_safe` feature.
//!
//! Instances produced by providers are stored type-erased behind [`RcThreadSafety`] and shared between every carrier of a repo,
//! so with the feature enabled they have to be `Send + Sync`.

#[cfg(feature = "thread_safe")]
mod imp {
    use alloc::sync::Arc;
    use core::any::Any;

    pub trait SendSafety: Send {}
    pub trait SyncSafety: Sync {}

    impl<T: Send> SendSafety for T {}
    impl<T: Sync> SyncSafety for T {}

    pub type RcThreadSafety<T> = Arc<T>;
    pub type RcAnyThreadSafety = RcThreadSafety<dyn Any + Send + Sync>;

    #[inline]
    pub(crate) fn downcast<T: SendSafety + SyncSafety + 'static>(value: RcAnyThreadSafety) -> Result<RcThreadSafety<T>, RcAnyThreadSafety> {
        value.downcast()
    }
}

#[cfg(not(feature = "thread_safe"))]
mod imp {
    use alloc::rc::Rc;
    use core::any::Any;

    pub trait SendSafety {}
    pub trait SyncSafety {}

    impl<T> SendSafety for T {}
    impl<T> SyncSafety for T {}

    pub type RcThreadSafety<T> = Rc<T>;
    pub type RcAnyThreadSafety = RcThreadSafety<dyn Any>;

    #[inline]
    pub(crate) fn downcast<T: 'static>(value: RcAnyThreadSafety) -> Result<RcThreadSafety<T>, RcAnyThreadSafety> {
        value.downcast()
    }
}

pub use imp::{RcThreadSafety, SendSafety, SyncSafety};
pub(crate) use imp::{downcast, RcAnyThreadSafety};
