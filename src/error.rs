//! Recoverable failures of views and cursors.

use thiserror::Error;

/// A specialized result type for fallible view and cursor operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors reported by restricted views and by cursors.
///
/// All variants leave the map exactly as it was before the failing call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The mutation would place a pair outside a restricted view, or would
    /// implicitly evict a pair the view cannot see.
    #[error("value change not allowed through this view")]
    ValueChangeNotAllowed,

    /// The map changed structurally after the cursor last observed it.
    /// The cursor must be `reset` before further use.
    #[error("map structurally modified while a cursor was outstanding")]
    ConcurrentModification,

    /// A cursor accessor or mutator was called while the cursor has no
    /// current entry.
    #[error("cursor has no current entry")]
    IllegalState,
}
