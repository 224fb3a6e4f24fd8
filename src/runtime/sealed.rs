// ABOUTME: Sealed trait pattern for compose dialect strategies.
// ABOUTME: New dialects are added inside the crate, next to the existing ones.

/// Only dialect strategies defined in this crate implement `Sealed`.
pub trait Sealed {}
