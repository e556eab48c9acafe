use alloc::string::String;

/// Calls `f`, converting a panic inside it into its message when `catch` is set.
///
/// Without the `std` feature panics can't be caught and always unwind to the caller.
#[cfg(feature = "std")]
pub(crate) fn call_guarded<R>(catch: bool, f: impl FnOnce() -> R) -> Result<R, String> {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    if !catch {
        return Ok(f());
    }

    catch_unwind(AssertUnwindSafe(f)).map_err(|payload| panic_message(&*payload))
}

#[cfg(not(feature = "std"))]
pub(crate) fn call_guarded<R>(_catch: bool, f: impl FnOnce() -> R) -> Result<R, String> {
    Ok(f())
}

#[cfg(feature = "std")]
fn panic_message(payload: &(dyn core::any::Any + Send)) -> String {
    use alloc::string::ToString as _;

    if let Some(message) = payload.downcast_ref::<&'static str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    String::from("Box<dyn Any>")
}

#[cfg(all(test, feature = "std"))]
mod tests {
    use super::call_guarded;

    use alloc::format;

    #[test]
    fn test_returns_value() {
        assert_eq!(call_guarded(true, || 1), Ok(1));
        assert_eq!(call_guarded(false, || 2), Ok(2));
    }

    #[test]
    fn test_converts_panic_messages() {
        assert_eq!(call_guarded(true, || -> u8 { panic!("static message") }).unwrap_err(), "static message");

        let value = 42;
        assert_eq!(
            call_guarded(true, || -> u8 { panic!("formatted {value}") }).unwrap_err(),
            format!("formatted {value}")
        );
    }
}
