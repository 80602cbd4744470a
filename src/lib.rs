//! # `mechreduce` — graph reduction for chemical-kinetic mechanisms
//!
//! Reduces a directed weighted graph of species couplings to the subset of
//! species reachable, under a coupling-strength threshold, from a set of
//! source species. Three algorithms are offered — Directly Related Graph
//! (DRG), DRG with Error Propagation (DRGEP) and Path Flux Analysis (PFA) —
//! each producing a kept-mask over the species set.
//!
//! ## Architecture
//!
//! The crate is layered bottom-up:
//!
//! 1. **Allocation** ([`alloc`]): a raw allocator trait with a process-wide
//!    default, plus a fixed-slot pool that recycles cursor allocations
//!    during graph traversals.
//! 2. **Containers** ([`collections`]): a fixed-capacity buffer, a
//!    block-growing dynamic array, a sectioned sequence with bounded
//!    worst-case relocation, and a packed bitmap whose shift-insert and
//!    shift-remove preserve bit order across word boundaries.
//! 3. **Storage** ([`graph`]): a compressed-sparse-row adjacency matrix
//!    with a mutating neighbor cursor; reducers delete edges by zeroing
//!    coefficients in place and the cursor skips the tombstones.
//! 4. **Algorithms** ([`reduce`]): DRG's prune-then-DFS, and the shared
//!    ordered-queue drain behind DRGEP's multiplicative and PFA's additive
//!    path accumulation.
//! 5. **Facade** ([`facade`]): the build → finalize → reduce state machine
//!    hosts drive, returning kept species indices in ascending order.
//!
//! ## Example
//!
//! ```rust
//! use mechreduce::{ReductionMethod, SpeciesGraph};
//!
//! # fn main() -> mechreduce::Result<()> {
//! let mut graph = SpeciesGraph::new(3)?;
//! graph.add_row(&[0.0, 0.9, 0.0], 0)?;
//! graph.add_row(&[0.0, 0.0, 0.3], 1)?;
//! graph.add_row(&[0.0, 0.0, 0.0], 2)?;
//! graph.finalize()?;
//!
//! let kept = graph.run_reducing(ReductionMethod::Drg, 0.5, &[0])?;
//! assert_eq!(kept, vec![0, 1]);
//! # Ok(())
//! # }
//! ```
//!
//! The engine is single-threaded and synchronous; a matrix and any cursors
//! derived from it form one ownership group, which the borrow checker
//! enforces where the original design only documented it.

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

pub mod alloc;
pub mod collections;
pub mod error;
pub mod facade;
pub mod graph;
pub mod logging;
pub mod reduce;

pub use alloc::{default_allocator, PoolBox, RawAlloc, SlotPool, SystemAlloc};
pub use collections::{BitRef, Bitmap, BlockVec, FixedVec, SectionedVec};
pub use error::{Error, Result};
pub use facade::SpeciesGraph;
pub use graph::{CsrMatrix, NeighborCursor};
pub use reduce::ReductionMethod;
