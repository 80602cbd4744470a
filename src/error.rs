//! Crate-wide error type.
//!
//! Every fallible operation in the engine returns [`Result`]; errors are never
//! swallowed mid-algorithm and unwind to the facade boundary, carrying the
//! offending value where one exists.

use crate::alloc::AllocError;

/// Errors surfaced by containers, the matrix, the reducers and the facade.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An index argument lies outside `[0, len)`.
    #[error("index {index} is out of range for length {len}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the collection or node set it was checked against.
        len: usize,
    },

    /// A structurally invalid argument: non-ascending row addition, a zero
    /// block or section size, a shrink below the current length, or an
    /// unknown reduction-method name.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An insert into a fixed-capacity container at full occupancy.
    #[error("capacity exhausted: all {capacity} slots are occupied")]
    CapacityExhausted {
        /// The fixed capacity of the container.
        capacity: usize,
    },

    /// The backing allocator refused an allocation.
    #[error("allocation failure")]
    Allocation(#[from] AllocError),

    /// An operation was issued in the wrong facade state: `add_row` after
    /// `finalize`, `finalize` twice, `run_reducing` before `finalize`.
    #[error("state violation: {0}")]
    StateViolation(&'static str),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    /// Builds an [`Error::OutOfRange`] for `index` checked against `len`.
    #[inline]
    #[must_use]
    pub fn out_of_range(index: usize, len: usize) -> Self {
        Error::OutOfRange { index, len }
    }
}
