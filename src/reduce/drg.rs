//! Directly Related Graph reduction.
//!
//! Two phases. Edge pruning walks every row with a reused cursor and zeroes
//! each coefficient below the threshold in place — no column shifting, the
//! cursor's skip-zero advance hides the tombstones from everything that
//! follows. Reachability then runs an iterative depth-first search from each
//! source over the surviving edges; the search is stack-based by design so a
//! deep mechanism cannot overflow the call stack. Each frame's cursor lives
//! in a slot of a [`SlotPool`] sized to the node count, so the whole
//! traversal costs one arena allocation however deep it goes.

use tracing::{debug, trace};

use crate::alloc::{PoolBox, RawAlloc, SlotPool};
use crate::collections::{Bitmap, FixedVec};
use crate::error::{Error, Result};
use crate::graph::{CsrMatrix, NeighborCursor};

/// One DFS stack entry: a discovered node and the cursor walking its row.
struct Frame<'p, 'a, A: RawAlloc + ?Sized> {
    node: usize,
    cursor: PoolBox<'p, NeighborCursor, SlotPool<'a, A>>,
}

/// Runs DRG over `matrix`, keeping every node reachable from `sources`
/// through edges with coefficient `>= threshold`.
///
/// The matrix is consumed in the sense that its below-threshold edges are
/// zeroed in place; it must not be reused for a different threshold.
///
/// # Errors
/// [`Error::OutOfRange`] if a source index is `>= size`;
/// [`Error::Allocation`] if scratch or the result bitmap cannot be obtained.
pub fn run<'r, MA, RA>(
    matrix: &mut CsrMatrix<'_, MA>,
    sources: &[usize],
    threshold: f64,
    alloc: &'r RA,
) -> Result<Bitmap<'r, RA>>
where
    MA: RawAlloc + ?Sized,
    RA: RawAlloc + ?Sized,
{
    let n = matrix.size();
    prune_edges(matrix, threshold)?;

    let matrix = &*matrix;
    let mut achievables = Bitmap::new_in(n, false, alloc)?;

    // Declared before the stack so the frames' pool slots outlive them.
    let pool = SlotPool::new(alloc, n).map_err(Error::Allocation)?;
    let mut stack: FixedVec<'_, Frame<'_, '_, RA>, _> = FixedVec::with_capacity(n, alloc)?;

    for &source in sources {
        if source >= n {
            return Err(Error::out_of_range(source, n));
        }
        if achievables.get(source)? {
            continue;
        }
        achievables.set(source, true)?;
        stack.push(Frame {
            node: source,
            cursor: PoolBox::new_in(matrix.neighbor_cursor(source, 0)?, &pool)
                .map_err(Error::Allocation)?,
        })?;

        while !stack.is_empty() {
            // Scan the top frame's row for the first neighbor not yet
            // reached.
            let mut discovered = None;
            let top = stack.len() - 1;
            {
                let frame = &mut stack[top];
                while !frame.cursor.is_stopped() {
                    let neighbor = frame.cursor.to(matrix);
                    if achievables.get(neighbor)? {
                        frame.cursor.advance(matrix);
                        continue;
                    }
                    discovered = Some(neighbor);
                    break;
                }
            }

            match discovered {
                Some(neighbor) => {
                    // Depth never exceeds n: every node is pushed at most
                    // once, guarded by the achievables bit set here.
                    achievables.set(neighbor, true)?;
                    let cursor = PoolBox::new_in(matrix.neighbor_cursor(neighbor, 0)?, &pool)
                        .map_err(Error::Allocation)?;
                    stack.push(Frame {
                        node: neighbor,
                        cursor,
                    })?;
                }
                None => {
                    if let Some(finished) = stack.pop() {
                        trace!(node = finished.node, "row exhausted");
                    }
                }
            }
        }
    }

    debug!(kept = achievables.count(true), nodes = n, "drg reachability done");
    Ok(achievables)
}

/// Zeroes every edge with a coefficient below `threshold`, in place.
fn prune_edges<MA: RawAlloc + ?Sized>(matrix: &mut CsrMatrix<'_, MA>, threshold: f64) -> Result<()> {
    let n = matrix.size();
    let mut pruned = 0usize;
    let mut cursor = matrix.neighbor_cursor(0, 0)?;
    for from in 0..n {
        matrix.replace_neighbor_cursor(from, 0, &mut cursor)?;
        while !cursor.is_stopped() {
            if cursor.coef(matrix) < threshold {
                cursor.set_coef(matrix, 0.0);
                pruned += 1;
            }
            // Advancing a cursor stopped by the zero-write resumes at the
            // next live entry of the same row.
            cursor.advance(matrix);
        }
    }
    trace!(pruned, threshold, "edges below threshold removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::default_allocator;

    fn matrix(n: usize, edges: &[(usize, usize, f64)]) -> CsrMatrix<'static, crate::alloc::SystemAlloc> {
        let mut dense = vec![vec![0.0; n]; n];
        for &(from, to, coef) in edges {
            dense[from][to] = coef;
        }
        let mut m = CsrMatrix::with_size(n, default_allocator()).unwrap();
        for (i, row) in dense.iter().enumerate() {
            m.append_row(i, row).unwrap();
        }
        m.finalize();
        m
    }

    fn kept(bitmap: &Bitmap<'_, crate::alloc::SystemAlloc>) -> Vec<usize> {
        bitmap.iter_ones().collect()
    }

    #[test]
    fn chain_fully_reachable() {
        let mut m = matrix(3, &[(0, 1, 0.9), (1, 2, 0.9)]);
        let result = run(&mut m, &[0], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 1, 2]);
    }

    #[test]
    fn weak_edge_cuts_the_chain() {
        let mut m = matrix(3, &[(0, 1, 0.9), (1, 2, 0.3)]);
        let result = run(&mut m, &[0], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 1]);
    }

    #[test]
    fn disconnected_component_dropped() {
        let mut m = matrix(4, &[(0, 1, 1.0), (2, 3, 1.0)]);
        let result = run(&mut m, &[0], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 1]);
    }

    #[test]
    fn threshold_equal_keeps_edge() {
        let mut m = matrix(2, &[(0, 1, 0.5)]);
        let result = run(&mut m, &[0], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 1]);
    }

    #[test]
    fn cycle_terminates() {
        let mut m = matrix(3, &[(0, 1, 0.9), (1, 2, 0.9), (2, 0, 0.9)]);
        let result = run(&mut m, &[0], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 1, 2]);
    }

    #[test]
    fn multi_source_union() {
        let mut m = matrix(5, &[(0, 1, 1.0), (2, 3, 1.0), (3, 4, 1.0)]);
        let result = run(&mut m, &[0, 2], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn empty_sources_keep_nothing() {
        let mut m = matrix(3, &[(0, 1, 1.0)]);
        let result = run(&mut m, &[], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), Vec::<usize>::new());
    }

    #[test]
    fn out_of_range_source_is_fatal() {
        let mut m = matrix(2, &[(0, 1, 1.0)]);
        assert!(matches!(
            run(&mut m, &[2], 0.5, default_allocator()),
            Err(Error::OutOfRange { .. })
        ));
    }

    #[test]
    fn last_node_as_source() {
        let mut m = matrix(3, &[(2, 0, 0.9)]);
        let result = run(&mut m, &[2], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 2]);
    }

    #[test]
    fn discovery_follows_ascending_columns() {
        // Diamond: 0 -> {1, 2}, both -> 3. DFS goes deep through 1 first.
        let mut m = matrix(4, &[(0, 1, 1.0), (0, 2, 1.0), (1, 3, 1.0), (2, 3, 1.0)]);
        let result = run(&mut m, &[0], 0.5, default_allocator()).unwrap();
        assert_eq!(kept(&result), vec![0, 1, 2, 3]);
    }
}
