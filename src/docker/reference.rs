//! Image references

use std::fmt;

/// A fully-qualified `name:tag` image reference
///
/// Registries reject upper-case references, so composition always folds
/// case. Callers expand macros first; expanded values may reintroduce
/// upper case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageReference(String);

impl ImageReference {
    /// Composes `name:tag`, lower-cased
    #[must_use]
    pub fn compose(name: &str, tag: &str) -> Self {
        Self(format!("{name}:{tag}").to_lowercase())
    }

    /// Returns the reference as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<ImageReference> for String {
    fn from(reference: ImageReference) -> Self {
        reference.0
    }
}
