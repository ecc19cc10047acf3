//! Common ID Types
//!
//! Type-safe wrappers around database-assigned integer primary keys.
//!
//! Usage:
//! ```
//! use kernel::id::Id;
//!
//! struct UserMarker;
//! type UserId = Id<UserMarker>;
//!
//! let id = UserId::from_raw(42);
//! assert_eq!(id.as_i32(), 42);
//! ```

use std::fmt;
use std::marker::PhantomData;

/// Generic typed ID wrapper
///
/// Rows are keyed by `SERIAL` columns, so the value is assigned by the
/// database; construct with [`Id::from_raw`] when mapping a row.
pub struct Id<T> {
    value: i32,
    _marker: PhantomData<T>,
}

impl<T> Id<T> {
    /// Wrap an existing database key
    pub const fn from_raw(value: i32) -> Self {
        Self {
            value,
            _marker: PhantomData,
        }
    }

    /// Get the underlying key
    pub const fn as_i32(&self) -> i32 {
        self.value
    }
}

// Manual impls: derived ones would put a `T: Clone` etc. bound on the marker.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> std::hash::Hash for Id<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.value)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<i32> for Id<T> {
    fn from(value: i32) -> Self {
        Self::from_raw(value)
    }
}

impl<T> From<Id<T>> for i32 {
    fn from(id: Id<T>) -> Self {
        id.value
    }
}
