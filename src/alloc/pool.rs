//! `SlotPool` — a fixed-slot allocator decorating a backing allocator.
//!
//! A DRG traversal pushes up to `n` DFS frames, each holding one neighbor
//! cursor; allocating every cursor individually would hit the backing
//! allocator `n` times. The pool instead carves one arena of `n` equal slots
//! on first use, tracks slot freeness in a [`Bitmap`], and recycles slots as
//! frames pop. Requests that do not match the established slot size, and
//! requests arriving once the pool is full, fall through to the backing
//! allocator; pointers outside the arena are likewise forwarded on release,
//! so overflow is graceful rather than fatal.

use core::alloc::Layout;
use core::cell::RefCell;
use core::ptr::NonNull;

use crate::collections::Bitmap;

use super::{AllocError, RawAlloc};

struct PoolState<'a, A: RawAlloc + ?Sized> {
    /// Arena pointer and its layout, carved lazily on the first request.
    arena: Option<(NonNull<u8>, Layout)>,
    /// Size of the requests this pool serves; fixed by the first one.
    request_size: usize,
    /// Stride between slots (request size rounded up to the alignment).
    stride: usize,
    /// One bit per slot; set means free.
    free: Bitmap<'a, A>,
}

/// A pool of `slots` equally sized allocations over a backing allocator.
pub struct SlotPool<'a, A: RawAlloc + ?Sized> {
    backing: &'a A,
    slots: usize,
    state: RefCell<PoolState<'a, A>>,
}

impl<'a, A: RawAlloc + ?Sized> SlotPool<'a, A> {
    /// Creates a pool of `slots` slots; the slot size is established by the
    /// first allocation.
    ///
    /// # Errors
    /// Returns [`AllocError`] if the freeness bitmap cannot be allocated.
    pub fn new(backing: &'a A, slots: usize) -> Result<Self, AllocError> {
        let free = Bitmap::new_in(slots, true, backing).map_err(|_| AllocError)?;
        Ok(Self {
            backing,
            slots,
            state: RefCell::new(PoolState {
                arena: None,
                request_size: 0,
                stride: 0,
                free,
            }),
        })
    }

    /// Number of slots currently handed out.
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.state.borrow().free.count(false)
    }

    /// Total number of slots.
    #[must_use]
    pub const fn slots(&self) -> usize {
        self.slots
    }
}

impl<A: RawAlloc + ?Sized> RawAlloc for SlotPool<'_, A> {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        if self.slots == 0 {
            return self.backing.allocate(layout);
        }
        let mut state = self.state.borrow_mut();

        if state.arena.is_none() {
            let stride = layout.size().next_multiple_of(layout.align().max(1));
            let arena_layout = Layout::from_size_align(
                stride.checked_mul(self.slots).ok_or(AllocError)?,
                layout.align(),
            )
            .map_err(|_| AllocError)?;
            let arena = self.backing.allocate(arena_layout)?;
            state.arena = Some((arena, arena_layout));
            state.request_size = layout.size();
            state.stride = stride;
        } else if layout.size() != state.request_size {
            return self.backing.allocate(layout);
        }

        let slot = state.free.iter_ones().next();
        match slot {
            Some(idx) => {
                let _ = state.free.set(idx, false);
                let (arena, _) = state.arena.expect("arena initialised above");
                // SAFETY: `idx < slots`, so the offset stays inside the arena.
                Ok(unsafe { NonNull::new_unchecked(arena.as_ptr().add(idx * state.stride)) })
            }
            // Pool exhausted: graceful overflow to the backing allocator.
            None => self.backing.allocate(layout),
        }
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        let mut state = self.state.borrow_mut();
        if let Some((arena, arena_layout)) = state.arena {
            let base = arena.as_ptr() as usize;
            let addr = ptr.as_ptr() as usize;
            if addr >= base && addr < base + arena_layout.size() {
                let idx = (addr - base) / state.stride;
                let _ = state.free.set(idx, true);
                return;
            }
        }
        drop(state);
        // SAFETY: the pointer was not ours, so it came from the backing
        // allocator with this exact layout.
        unsafe { self.backing.deallocate(ptr, layout) };
    }
}

impl<A: RawAlloc + ?Sized> Drop for SlotPool<'_, A> {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let Some((arena, arena_layout)) = state.arena.take() {
            // SAFETY: the arena came from `backing` with this layout.
            unsafe { self.backing.deallocate(arena, arena_layout) };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::alloc::default_allocator;

    fn cursor_layout() -> Layout {
        Layout::from_size_align(24, 8).unwrap()
    }

    #[test]
    fn recycles_slots() {
        let pool = SlotPool::new(default_allocator(), 4).unwrap();
        let layout = cursor_layout();

        let a = pool.allocate(layout).unwrap();
        let b = pool.allocate(layout).unwrap();
        assert_eq!(pool.occupied(), 2);

        unsafe { pool.deallocate(a, layout) };
        assert_eq!(pool.occupied(), 1);

        // The freed slot is handed out again, first-free first.
        let c = pool.allocate(layout).unwrap();
        assert_eq!(c, a);
        assert_ne!(c, b);
    }

    #[test]
    fn overflow_falls_back_to_backing() {
        let pool = SlotPool::new(default_allocator(), 2).unwrap();
        let layout = cursor_layout();

        let a = pool.allocate(layout).unwrap();
        let b = pool.allocate(layout).unwrap();
        let overflow = pool.allocate(layout).unwrap();
        assert_eq!(pool.occupied(), 2);

        unsafe {
            pool.deallocate(overflow, layout);
            pool.deallocate(b, layout);
            pool.deallocate(a, layout);
        }
        assert_eq!(pool.occupied(), 0);
    }

    #[test]
    fn mismatched_size_bypasses_pool() {
        let pool = SlotPool::new(default_allocator(), 4).unwrap();
        let layout = cursor_layout();
        let a = pool.allocate(layout).unwrap();

        let other = Layout::from_size_align(128, 8).unwrap();
        let b = pool.allocate(other).unwrap();
        assert_eq!(pool.occupied(), 1);

        unsafe {
            pool.deallocate(b, other);
            pool.deallocate(a, layout);
        }
    }

    #[test]
    fn zero_slot_pool_forwards_everything() {
        let pool = SlotPool::new(default_allocator(), 0).unwrap();
        let layout = cursor_layout();
        let a = pool.allocate(layout).unwrap();
        unsafe { pool.deallocate(a, layout) };
    }
}
