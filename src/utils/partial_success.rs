//! Type alias for operations that support partial success.

/// A batch operation where some items failed without preventing the rest from
/// completing. The `Vec<E>` holds the failures of the items that were skipped.
pub type PartialSuccess<T, E> = ( T, Vec<E> );
