pub(crate) mod panic;
pub mod thread_safety;
