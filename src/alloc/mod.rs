//! Allocation primitives.
//!
//! Every container in this crate takes its allocator as a first-class
//! parameter and holds it by shared borrow. The process-wide default is a
//! single [`SystemAlloc`] instance installed for the lifetime of the process
//! (see [`default_allocator`]); per-operation scratch goes through whatever
//! allocator the caller supplies, most notably the [`SlotPool`] decorator
//! that recycles cursor slots during a DFS traversal.

mod boxed;
mod pool;
mod system;

pub use boxed::PoolBox;
pub use pool::SlotPool;
pub use system::{default_allocator, SystemAlloc};

use core::alloc::Layout;
use core::ptr::NonNull;

/// A raw, untyped allocator.
///
/// Mirrors the shape of `std::alloc::Allocator` but stays on stable Rust and
/// keeps the surface down to the two operations the engine needs, plus an
/// advisory locality hint.
pub trait RawAlloc {
    /// Allocates a block of memory described by `layout`.
    ///
    /// # Errors
    /// Returns [`AllocError`] if the allocator refuses the request. `layout`
    /// must have a non-zero size; callers are expected to special-case
    /// zero-sized requests themselves.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Allocates with a locality hint.
    ///
    /// The hint names an address the caller would like the new block to sit
    /// near. It is advisory; the default implementation ignores it.
    ///
    /// # Errors
    /// Same contract as [`RawAlloc::allocate`].
    fn allocate_with_hint(
        &self,
        layout: Layout,
        hint: Option<NonNull<u8>>,
    ) -> Result<NonNull<u8>, AllocError> {
        let _ = hint;
        self.allocate(layout)
    }

    /// Deallocates a block previously returned by this allocator.
    ///
    /// # Safety
    /// `ptr` must denote a block currently allocated by this allocator, and
    /// `layout` must be the layout it was allocated with.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

/// The error type for allocation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocError;

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("memory allocation failed")
    }
}

impl std::error::Error for AllocError {}
