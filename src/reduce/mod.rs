//! The three reduction algorithms and their shared machinery.

pub mod drg;
pub mod drgep;
pub mod pfa;
mod queue;

use core::fmt;
use core::str::FromStr;

use crate::alloc::RawAlloc;
use crate::collections::Bitmap;
use crate::error::{Error, Result};
use crate::graph::CsrMatrix;

/// Which reduction algorithm to run.
///
/// The string forms are the wire names `"DRG"`, `"DRGEP"` and `"PFA"`; an
/// unknown name is an [`Error::InvalidArgument`], never a silent fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionMethod {
    /// Directly Related Graph: threshold pruning plus reachability.
    Drg,
    /// DRG with Error Propagation: maximum product of path coefficients.
    Drgep,
    /// Path Flux Analysis: additive accumulation of two-hop flux couplings.
    Pfa,
}

impl FromStr for ReductionMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "DRG" => Ok(ReductionMethod::Drg),
            "DRGEP" => Ok(ReductionMethod::Drgep),
            "PFA" => Ok(ReductionMethod::Pfa),
            other => Err(Error::InvalidArgument(format!(
                "unknown reduction method {other:?}, expected DRG, DRGEP or PFA"
            ))),
        }
    }
}

impl fmt::Display for ReductionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReductionMethod::Drg => "DRG",
            ReductionMethod::Drgep => "DRGEP",
            ReductionMethod::Pfa => "PFA",
        })
    }
}

/// Dispatches to the chosen reducer.
///
/// DRG borrows the matrix mutably (it tombstones pruned edges in place);
/// DRGEP and PFA read it. The returned bitmap has one bit per node, set for
/// every kept node.
///
/// # Errors
/// Whatever the chosen reducer surfaces; see [`drg::run`], [`drgep::run`]
/// and [`pfa::run`].
pub fn run_reduction<'r, MA, RA>(
    matrix: &mut CsrMatrix<'_, MA>,
    method: ReductionMethod,
    threshold: f64,
    sources: &[usize],
    alloc: &'r RA,
) -> Result<Bitmap<'r, RA>>
where
    MA: RawAlloc + ?Sized,
    RA: RawAlloc + ?Sized,
{
    match method {
        ReductionMethod::Drg => drg::run(matrix, sources, threshold, alloc),
        ReductionMethod::Drgep => drgep::run(matrix, sources, threshold, alloc),
        ReductionMethod::Pfa => pfa::run(matrix, sources, threshold, alloc),
    }
}
