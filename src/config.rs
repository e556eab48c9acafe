/// Config for a repo
/// ## Fields
/// - `catch_panics`:
///   If `true`, a panic inside a constructor or a health probe is caught and reported as an error naming the module.
///
///   If `false`, the panic unwinds through [`crate::Repo::inject_to`] to the caller.
///   Without the `std` feature panics are never caught.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub catch_panics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self { catch_panics: true }
    }
}
