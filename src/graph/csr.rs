//! Compressed-sparse-row adjacency matrix with a mutating neighbor cursor.
//!
//! Three aligned sequences back the matrix: `rows` holds one entry per node
//! (a per-row non-zero count while building, an inclusive prefix sum after
//! [`finalize`](CsrMatrix::finalize)), `cols` the column indices partitioned
//! by row and strictly ascending within each partition, `coefs` the matching
//! coefficients. A zero coefficient means "no edge"; the build path never
//! stores one, but reducers may zero an entry in place to delete the edge
//! without shifting every downstream index — the cursor's advance semantics
//! make later walks skip such tombstones.
//!
//! Cursors are detached position tokens rather than borrowing iterators:
//! every operation takes the matrix explicitly (`&` to read, `&mut` to
//! write), which is what lets a DFS stack hold one cursor per frame over the
//! same matrix.

use crate::alloc::{RawAlloc, SystemAlloc};
use crate::collections::search::bsearch_right_to_insert;
use crate::collections::{FixedVec, SectionedVec};
use crate::error::{Error, Result};

/// A square sparse adjacency matrix over `n` nodes, CSR layout.
pub struct CsrMatrix<'a, A: RawAlloc + ?Sized = SystemAlloc> {
    rows: FixedVec<'a, usize, A>,
    cols: SectionedVec<'a, usize, A>,
    coefs: SectionedVec<'a, f64, A>,
}

impl<'a, A: RawAlloc + ?Sized> CsrMatrix<'a, A> {
    /// Creates an empty matrix over `size` nodes.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `size` is zero; [`Error::Allocation`]
    /// if the row table cannot be obtained.
    pub fn with_size(size: usize, alloc: &'a A) -> Result<Self> {
        if size == 0 {
            return Err(Error::InvalidArgument(
                "matrix size must be at least 1".into(),
            ));
        }
        Ok(Self {
            rows: FixedVec::from_elem(size, 0, alloc)?,
            cols: SectionedVec::new_in(alloc),
            coefs: SectionedVec::new_in(alloc),
        })
    }

    /// Number of nodes.
    #[inline]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Number of stored entries (zeroed tombstones included).
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.cols.len()
    }

    /// Appends the non-zero entries of one dense row during the build phase.
    ///
    /// Rows must arrive in ascending index order with no gaps; enforcing
    /// that protocol is the caller's job (the facade state machine does it),
    /// this method only records the row.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if `row_idx >= size`; [`Error::InvalidArgument`]
    /// if the dense row length differs from the matrix size.
    pub fn append_row(&mut self, row_idx: usize, dense: &[f64]) -> Result<()> {
        let n = self.size();
        if row_idx >= n {
            return Err(Error::out_of_range(row_idx, n));
        }
        if dense.len() != n {
            return Err(Error::InvalidArgument(format!(
                "row length {} does not match matrix size {n}",
                dense.len()
            )));
        }
        let mut non_zero = 0usize;
        for (col, &coef) in dense.iter().enumerate() {
            if coef != 0.0 {
                self.cols.push(col)?;
                self.coefs.push(coef)?;
                non_zero += 1;
            }
        }
        self.rows[row_idx] = non_zero;
        Ok(())
    }

    /// Converts `rows` from per-row counts to inclusive prefix sums.
    ///
    /// Must be called exactly once, after the last `append_row`; the facade
    /// guards the once-ness.
    pub fn finalize(&mut self) {
        let mut accumulated = 0usize;
        for row in self.rows.as_mut_slice() {
            accumulated += *row;
            *row = accumulated;
        }
    }

    /// The half-open range of entry indices belonging to `from`'s row.
    #[inline]
    pub fn row_span(&self, from: usize) -> core::ops::Range<usize> {
        let start = if from == 0 { 0 } else { self.rows[from - 1] };
        start..self.rows[from]
    }

    /// The coefficient of edge `(from, to)`, or `0.0` when absent.
    ///
    /// Both indices must be in range; use [`coef_checked`] at trust
    /// boundaries.
    ///
    /// [`coef_checked`]: CsrMatrix::coef_checked
    #[must_use]
    pub fn coef(&self, from: usize, to: usize) -> f64 {
        match self.locate(from, to) {
            Ok(idx) => self.coefs[idx],
            Err(_) => 0.0,
        }
    }

    /// Bounds-checked [`coef`](CsrMatrix::coef).
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if either index is `>= size`.
    pub fn coef_checked(&self, from: usize, to: usize) -> Result<f64> {
        self.check_node(from)?;
        self.check_node(to)?;
        Ok(self.coef(from, to))
    }

    /// Sets the coefficient of edge `(from, to)`, returning the old value.
    ///
    /// An existing entry is replaced in place — including with zero, which
    /// is how reducers tombstone an edge. A missing entry is created only
    /// for a non-zero coefficient: the column and coefficient are spliced in
    /// at the sorted position and every row offset from `from` on is bumped.
    /// Setting zero on a missing entry is a no-op, not an error.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if either index is `>= size`.
    pub fn set(&mut self, from: usize, to: usize, coef: f64) -> Result<f64> {
        self.check_node(from)?;
        self.check_node(to)?;

        match self.locate(from, to) {
            Ok(idx) => self.coefs.replace(idx, coef),
            Err(insert_at) => {
                if coef != 0.0 {
                    self.cols.insert(insert_at, to)?;
                    self.coefs.insert(insert_at, coef)?;
                    for row in self.rows.as_mut_slice()[from..].iter_mut() {
                        *row += 1;
                    }
                }
                Ok(0.0)
            }
        }
    }

    /// Creates a cursor over `from`'s row, positioned at the first live
    /// entry whose column is `>= to`.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if either index is `>= size`.
    pub fn neighbor_cursor(&self, from: usize, to: usize) -> Result<NeighborCursor> {
        self.check_node(from)?;
        self.check_node(to)?;
        Ok(NeighborCursor::Csr(CsrCursor::new(self, from, to)))
    }

    /// Re-aims an existing cursor, reusing its slot instead of allocating.
    ///
    /// # Errors
    /// [`Error::OutOfRange`] if either index is `>= size`.
    pub fn replace_neighbor_cursor(
        &self,
        from: usize,
        to: usize,
        cursor: &mut NeighborCursor,
    ) -> Result<()> {
        self.check_node(from)?;
        self.check_node(to)?;
        let NeighborCursor::Csr(inner) = cursor;
        *inner = CsrCursor::new(self, from, to);
        Ok(())
    }

    /// Entry index of `(from, to)`, or the insertion index keeping the row's
    /// columns ascending.
    fn locate(&self, from: usize, to: usize) -> core::result::Result<usize, usize> {
        let span = self.row_span(from);
        let idx = bsearch_right_to_insert(span.start, span.end, |i| self.cols[i] <= to);
        if idx > span.start && self.cols[idx - 1] == to {
            Ok(idx - 1)
        } else {
            Err(idx)
        }
    }

    #[inline]
    fn check_node(&self, idx: usize) -> Result<()> {
        if idx >= self.size() {
            return Err(Error::out_of_range(idx, self.size()));
        }
        Ok(())
    }
}

impl<A: RawAlloc + ?Sized> core::fmt::Debug for CsrMatrix<'_, A> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CsrMatrix")
            .field("size", &self.size())
            .field("entries", &self.entry_count())
            .finish()
    }
}

/// A cursor over one row of some matrix layout.
///
/// One variant per layout; callers match on none of them, they go through
/// the delegating methods, so adding a second layout later is a local
/// change.
#[derive(Debug, Clone)]
pub enum NeighborCursor {
    /// Cursor over a [`CsrMatrix`] row.
    Csr(CsrCursor),
}

impl NeighborCursor {
    /// Whether the cursor has run off the live entries of its row.
    #[inline]
    #[must_use]
    pub fn is_stopped(&self) -> bool {
        match self {
            NeighborCursor::Csr(c) => c.is_stopped(),
        }
    }

    /// The row this cursor walks.
    #[inline]
    #[must_use]
    pub fn from_node(&self) -> usize {
        match self {
            NeighborCursor::Csr(c) => c.from,
        }
    }

    /// Column of the current entry. The cursor must be live.
    #[inline]
    pub fn to<A: RawAlloc + ?Sized>(&self, matrix: &CsrMatrix<'_, A>) -> usize {
        match self {
            NeighborCursor::Csr(c) => c.to(matrix),
        }
    }

    /// Coefficient of the current entry. The cursor must be live.
    #[inline]
    pub fn coef<A: RawAlloc + ?Sized>(&self, matrix: &CsrMatrix<'_, A>) -> f64 {
        match self {
            NeighborCursor::Csr(c) => c.coef(matrix),
        }
    }

    /// Overwrites the current entry's coefficient in place, returning the
    /// old value. Writing zero deletes the edge and stops the cursor.
    #[inline]
    pub fn set_coef<A: RawAlloc + ?Sized>(&mut self, matrix: &mut CsrMatrix<'_, A>, coef: f64) -> f64 {
        match self {
            NeighborCursor::Csr(c) => c.set_coef(matrix, coef),
        }
    }

    /// Advances to the next live entry of the row.
    #[inline]
    pub fn advance<A: RawAlloc + ?Sized>(&mut self, matrix: &CsrMatrix<'_, A>) {
        match self {
            NeighborCursor::Csr(c) => c.advance(matrix),
        }
    }

    /// Steps back to the previous live entry of the row.
    #[inline]
    pub fn retreat<A: RawAlloc + ?Sized>(&mut self, matrix: &CsrMatrix<'_, A>) {
        match self {
            NeighborCursor::Csr(c) => c.retreat(matrix),
        }
    }
}

/// The CSR-layout cursor: a row, a position inside the row's entry span and
/// a stopped flag.
#[derive(Debug, Clone)]
pub struct CsrCursor {
    from: usize,
    pos: usize,
    stopped: bool,
}

impl CsrCursor {
    fn new<A: RawAlloc + ?Sized>(matrix: &CsrMatrix<'_, A>, from: usize, to: usize) -> Self {
        let span = matrix.row_span(from);
        let mut pos = span.start;
        // Seek the first live entry with column >= to.
        while pos < span.end && (matrix.cols[pos] < to || matrix.coefs[pos] == 0.0) {
            pos += 1;
        }
        Self {
            from,
            pos,
            stopped: pos == span.end,
        }
    }

    #[inline]
    fn is_stopped(&self) -> bool {
        self.stopped
    }

    #[inline]
    fn to<A: RawAlloc + ?Sized>(&self, matrix: &CsrMatrix<'_, A>) -> usize {
        debug_assert!(!self.stopped, "cursor read past the end of its row");
        matrix.cols[self.pos]
    }

    #[inline]
    fn coef<A: RawAlloc + ?Sized>(&self, matrix: &CsrMatrix<'_, A>) -> f64 {
        debug_assert!(!self.stopped, "cursor read past the end of its row");
        matrix.coefs[self.pos]
    }

    fn set_coef<A: RawAlloc + ?Sized>(&mut self, matrix: &mut CsrMatrix<'_, A>, coef: f64) -> f64 {
        debug_assert!(!self.stopped, "cursor write past the end of its row");
        let old = matrix.coefs[self.pos];
        matrix.coefs[self.pos] = coef;
        if coef == 0.0 {
            self.stopped = true;
        }
        old
    }

    fn advance<A: RawAlloc + ?Sized>(&mut self, matrix: &CsrMatrix<'_, A>) {
        let span = matrix.row_span(self.from);
        if self.pos >= span.end {
            return;
        }
        // A cursor stopped by `retreat` at the row head resumes in place if
        // its entry is still live.
        if self.pos == span.start && self.stopped && matrix.coefs[self.pos] != 0.0 {
            self.stopped = false;
            return;
        }
        while self.pos + 1 < span.end {
            self.pos += 1;
            if matrix.coefs[self.pos] != 0.0 {
                self.stopped = false;
                return;
            }
        }
        self.pos = span.end;
        self.stopped = true;
    }

    fn retreat<A: RawAlloc + ?Sized>(&mut self, matrix: &CsrMatrix<'_, A>) {
        let span = matrix.row_span(self.from);
        while self.pos > span.start {
            self.pos -= 1;
            if matrix.coefs[self.pos] != 0.0 {
                self.stopped = false;
                return;
            }
        }
        self.stopped = true;
    }
}
