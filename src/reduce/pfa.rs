//! Path Flux Analysis.
//!
//! Shares the DRGEP queue machinery wholesale; the divergences are the
//! combinator and the starting value. PFA matrices carry two-hop aggregated
//! coupling coefficients (first- plus second-generation flux ratios,
//! assembled by the host), path values accumulate additively along a path,
//! and the walk starts from zero at the source. Because an additive value
//! can only grow around a cycle, each node is expanded at most once per
//! source; its stored value keeps improving for the inclusion test, but it
//! never re-enters the queue after popping.
//!
//! Sources are always kept: a reduction that dropped the very species it was
//! asked to preserve would be useless to the host.

use tracing::debug;

use crate::alloc::RawAlloc;
use crate::collections::{Bitmap, FixedVec};
use crate::error::{Error, Result};
use crate::graph::CsrMatrix;

use super::queue::OrderedQueue;

/// Runs PFA over `matrix` for the given sources and threshold.
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
    let mut expanded = Bitmap::new_in(n, false, alloc)?;
    let mut queue = OrderedQueue::with_capacity(n, alloc)?;
    let mut cursor = matrix.neighbor_cursor(0, 0)?;

    for (run_idx, &source) in sources.iter().enumerate() {
        if source >= n {
            return Err(Error::out_of_range(source, n));
        }
        if run_idx > 0 {
            paths.as_mut_slice().fill(0.0);
            for node in 0..n {
                expanded.set(node, false)?;
            }
            queue.clear();
        }

        queue.insert(source, paths.as_slice())?;

        while let Some(current) = queue.pop_max() {
            if expanded.set(current, true)? {
                continue;
            }
            let current_path = paths[current];
            matrix.replace_neighbor_cursor(current, 0, &mut cursor)?;
            while !cursor.is_stopped() {
                let neighbor = cursor.to(matrix);
                let candidate = current_path + cursor.coef(matrix);
                // No threshold gate here: an additive sum below the cutoff
                // can still grow past it further along the path, so the
                // cutoff applies at node inclusion only.
                if candidate > paths[neighbor] {
                    let old = paths.replace(neighbor, candidate)?;
                    if !expanded.get(neighbor)? {
                        if old == 0.0 {
                            queue.insert(neighbor, paths.as_slice())?;
                        } else {
                            queue.reposition(neighbor, old, paths.as_slice())?;
                        }
                    }
                }
                cursor.advance(matrix);
            }
        }

        result.set(source, true)?;
        for (node, &path) in paths.iter().enumerate() {
            if path >= threshold {
                result.set(node, true)?;
            }
        }
    }

    debug!(kept = result.count(true), nodes = n, "pfa done");
    Ok(result)
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

    fn kept(n: usize, edges: &[(usize, usize, f64)], sources: &[usize], threshold: f64) -> Vec<usize> {
        let m = matrix(n, edges);
        run(&m, sources, threshold, default_allocator())
            .unwrap()
            .iter_ones()
            .collect()
    }

    #[test]
    fn additive_accumulation_keeps_strong_paths() {
        // Path sums from 0: node 1 -> 0.4, node 2 -> 0.4 + 0.4 = 0.8.
        let result = kept(3, &[(0, 1, 0.4), (1, 2, 0.4)], &[0], 0.5);
        assert_eq!(result, vec![0, 2]);
    }

    #[test]
    fn below_threshold_nodes_dropped() {
        let result = kept(3, &[(0, 1, 0.2), (1, 2, 0.1)], &[0], 0.5);
        assert_eq!(result, vec![0]);
    }

    #[test]
    fn source_always_kept() {
        let result = kept(2, &[], &[1], 0.9);
        assert_eq!(result, vec![1]);
    }

    #[test]
    fn larger_sum_wins() {
        // Two routes to 3: direct 0.3 and via 1 with 0.5 + 0.5 = 1.0.
        let result = kept(4, &[(0, 3, 0.3), (0, 1, 0.5), (1, 3, 0.5)], &[0], 0.9);
        assert!(result.contains(&3));
    }

    #[test]
    fn cycle_terminates() {
        let result = kept(3, &[(0, 1, 0.6), (1, 2, 0.6), (2, 0, 0.6)], &[0], 0.5);
        assert_eq!(result, vec![0, 1, 2]);
    }

    #[test]
    fn threshold_equality_keeps_node() {
        let result = kept(2, &[(0, 1, 0.5)], &[0], 0.5);
        assert_eq!(result, vec![0, 1]);
    }

    #[test]
    fn multi_source_accumulates() {
        let result = kept(4, &[(0, 1, 0.9), (2, 3, 0.9)], &[0, 2], 0.5);
        assert_eq!(result, vec![0, 1, 2, 3]);
    }

    #[test]
    fn out_of_range_source_is_fatal() {
        let m = matrix(2, &[(0, 1, 1.0)]);
        assert!(matches!(
            run(&m, &[7], 0.5, default_allocator()),
            Err(Error::OutOfRange { .. })
        ));
    }
}
