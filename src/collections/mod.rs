//! Allocator-aware containers.
//!
//! Three storage shapes build on each other: [`FixedVec`] (one buffer, fixed
//! capacity), [`BlockVec`] (grows and shrinks in block multiples) and
//! [`SectionedVec`] (fixed-size sections behind a flat index). [`Bitmap`]
//! packs booleans into words on top of the sectioned layout, and [`search`]
//! holds the binary searches the matrix and the ordered queue share.

pub mod bitmap;
pub mod block;
pub mod fixed;
pub mod search;
pub mod sectioned;

pub use bitmap::{BitRef, Bitmap};
pub use block::BlockVec;
pub use fixed::FixedVec;
pub use sectioned::SectionedVec;
