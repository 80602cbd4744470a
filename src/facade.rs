//! The host-facing facade: build a matrix row by row, finalize, reduce.
//!
//! [`SpeciesGraph`] wraps a [`CsrMatrix`] in an explicit build state machine
//! (*empty* → *building* → *finalized* → *reduced*) so the protocol the CSR
//! layout depends on — rows in strictly ascending order, finalize exactly
//! once, reduce only after finalize — is enforced by construction rather
//! than by convention.

use tracing::debug;

use crate::alloc::{default_allocator, SystemAlloc};
use crate::error::{Error, Result};
use crate::graph::CsrMatrix;
use crate::reduce::{run_reduction, ReductionMethod};

/// Build progress of a [`SpeciesGraph`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BuildState {
    /// No rows added yet.
    Empty,
    /// Rows `0..next_row` have been added.
    Building {
        /// The only row index `add_row` will accept next.
        next_row: usize,
    },
    /// Row offsets are prefix sums; the matrix is ready to reduce.
    Finalized,
    /// At least one reduction has run.
    Reduced,
}

/// A species-coupling graph being assembled and reduced on behalf of a host.
#[derive(Debug)]
pub struct SpeciesGraph {
    matrix: CsrMatrix<'static, SystemAlloc>,
    state: BuildState,
}

impl SpeciesGraph {
    /// Creates a graph over `size` species.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `size` is zero.
    pub fn new(size: usize) -> Result<Self> {
        Ok(Self {
            matrix: CsrMatrix::with_size(size, default_allocator())?,
            state: BuildState::Empty,
        })
    }

    /// Number of species.
    #[must_use]
    pub fn size(&self) -> usize {
        self.matrix.size()
    }

    /// Adds one dense row of coupling coefficients.
    ///
    /// `row` must have exactly `size` entries and `row_idx` must be the
    /// previously added index plus one (the first row is 0) — strictly
    /// ascending, no gaps. Rows left unadded at finalize time stay empty.
    ///
    /// # Errors
    /// [`Error::StateViolation`] after `finalize`;
    /// [`Error::OutOfRange`] if `row_idx >= size`;
    /// [`Error::InvalidArgument`] for a gap, a repeat or a missized row.
    pub fn add_row(&mut self, row: &[f64], row_idx: usize) -> Result<()> {
        let expected = match self.state {
            BuildState::Empty => 0,
            BuildState::Building { next_row } => next_row,
            BuildState::Finalized | BuildState::Reduced => {
                return Err(Error::StateViolation("add_row after finalize"))
            }
        };
        if row_idx >= self.size() {
            return Err(Error::out_of_range(row_idx, self.size()));
        }
        if row_idx != expected {
            return Err(Error::InvalidArgument(format!(
                "rows must be added in ascending order without gaps: got {row_idx}, expected {expected}"
            )));
        }
        self.matrix.append_row(row_idx, row)?;
        self.state = BuildState::Building {
            next_row: row_idx + 1,
        };
        Ok(())
    }

    /// Converts the per-row counts to prefix sums, sealing the build phase.
    ///
    /// # Errors
    /// [`Error::StateViolation`] on a second call.
    pub fn finalize(&mut self) -> Result<()> {
        match self.state {
            BuildState::Empty | BuildState::Building { .. } => {
                self.matrix.finalize();
                self.state = BuildState::Finalized;
                Ok(())
            }
            BuildState::Finalized | BuildState::Reduced => {
                Err(Error::StateViolation("finalize called twice"))
            }
        }
    }

    /// Runs a reduction and returns the kept species indices, ascending.
    ///
    /// Re-running with identical arguments returns identical output; note
    /// that DRG tombstones pruned edges in place, so mixing methods or
    /// thresholds on one graph after a DRG run operates on the pruned
    /// matrix.
    ///
    /// # Errors
    /// [`Error::StateViolation`] before `finalize`;
    /// [`Error::InvalidArgument`] if more sources than species are given;
    /// [`Error::OutOfRange`] for a source index `>= size`.
    pub fn run_reducing(
        &mut self,
        method: ReductionMethod,
        threshold: f64,
        sources: &[usize],
    ) -> Result<Vec<usize>> {
        match self.state {
            BuildState::Finalized | BuildState::Reduced => {}
            BuildState::Empty | BuildState::Building { .. } => {
                return Err(Error::StateViolation("run_reducing before finalize"))
            }
        }
        if sources.len() > self.size() {
            return Err(Error::InvalidArgument(format!(
                "{} sources for a graph of {} species",
                sources.len(),
                self.size()
            )));
        }

        debug!(%method, threshold, sources = sources.len(), "running reduction");
        let kept_mask = run_reduction(
            &mut self.matrix,
            method,
            threshold,
            sources,
            default_allocator(),
        )?;
        self.state = BuildState::Reduced;

        let kept: Vec<usize> = kept_mask.iter_ones().collect();
        debug_assert_eq!(kept.len(), kept_mask.count(true));
        debug!(kept = kept.len(), "reduction finished");
        Ok(kept)
    }
}
