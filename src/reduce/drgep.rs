//! Directly Related Graph with Error Propagation.
//!
//! For each source the reducer computes, per node, the maximum product of
//! edge coefficients over any path from the source that stays at or above
//! the threshold. With coefficients in `(0, 1]` the product only shrinks
//! along a path, so draining the ordered queue largest-key-first makes every
//! popped value final — no node is ever re-expanded with a better product.
//! A node is kept once its best path value reaches the threshold under any
//! source.

use tracing::debug;

use crate::alloc::RawAlloc;
use crate::collections::{Bitmap, FixedVec};
use crate::error::{Error, Result};
use crate::graph::CsrMatrix;

use super::queue::OrderedQueue;

/// Runs DRGEP over `matrix` for the given sources and threshold.
///
/// # Errors
/// [`Error::OutOfRange`] if a source index is `>= size`;
/// [`Error::Allocation`] if scratch or the result bitmap cannot be obtained.
pub fn run<'r, MA, RA>(
    matrix: &CsrMatrix<'_, MA>,
    sources: &[usize],
    threshold: f64,
    alloc: &'r RA,
) -> Result<Bitmap<'r, RA>>
where
    MA: RawAlloc + ?Sized,
    RA: RawAlloc + ?Sized,
{
    let n = matrix.size();
    let mut result = Bitmap::new_in(n, false, alloc)?;
    let mut paths: FixedVec<'_, f64, RA> = FixedVec::from_elem(n, 0.0, alloc)?;
    let mut queue = OrderedQueue::with_capacity(n, alloc)?;
    let mut cursor = matrix.neighbor_cursor(0, 0)?;

    for (run_idx, &source) in sources.iter().enumerate() {
        if source >= n {
            return Err(Error::out_of_range(source, n));
        }
        if run_idx > 0 {
            // Block zero between runs; the queue is already drained but a
            // defensive clear keeps the invariant local.
            paths.as_mut_slice().fill(0.0);
            queue.clear();
        }

        paths[source] = 1.0;
        queue.insert(source, paths.as_slice())?;

        while let Some(current) = queue.pop_max() {
            let current_path = paths[current];
            matrix.replace_neighbor_cursor(current, 0, &mut cursor)?;
            while !cursor.is_stopped() {
                let neighbor = cursor.to(matrix);
                let candidate = cursor.coef(matrix) * current_path;
                if candidate > paths[neighbor] && candidate >= threshold {
                    let old = paths.replace(neighbor, candidate)?;
                    if old == 0.0 {
                        queue.insert(neighbor, paths.as_slice())?;
                    } else {
                        queue.reposition(neighbor, old, paths.as_slice())?;
                    }
                }
                cursor.advance(matrix);
            }
        }

        for (node, &path) in paths.iter().enumerate() {
            if path >= threshold {
                result.set(node, true)?;
            }
        }
    }

    debug!(kept = result.count(true), nodes = n, "drgep done");
    Ok(result)
}
