//! Fixed linear allocator.
//!
//! Packs a heterogeneous sequence of typed sub-allocations (structs, arrays,
//! name strings) into one contiguous block. Usage is two-phase:
//!
//! 1. declare every sub-allocation with [`FixedLinearAllocator::add_space`]
//!    (or the typed/string variants),
//! 2. call [`FixedLinearAllocator::reserve`], then replay the *identical*
//!    sequence of `allocate`/`copy_*` calls.
//!
//! Offsets are re-derived deterministically on the second pass, so the two
//! phases agree on the final layout. Violating the replay sequence is a
//! caller bug: debug builds record every declaration and panic on the first
//! divergence. The finished block is detached with
//! [`FixedLinearAllocator::release`] and owned by an [`ArenaBlock`], which
//! frees it through the original allocator on drop.

use std::alloc::{alloc, dealloc, handle_alloc_error, Layout};
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::slice;
use std::str;

//--------------------------------------------------------------------------------------------------

/// Raw memory source for [`FixedLinearAllocator`].
///
/// The embedding device may supply its own allocator; [`GlobalAllocator`]
/// forwards to the global heap.
pub trait RawAllocator: Send + Sync {
    fn allocate(&self, layout: Layout) -> NonNull<u8>;

    /// # Safety
    ///
    /// `ptr` must originate from `allocate` on the same allocator with the
    /// same `layout`.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);
}

#[derive(Copy, Clone, Debug, Default)]
pub struct GlobalAllocator;

impl RawAllocator for GlobalAllocator {
    fn allocate(&self, layout: Layout) -> NonNull<u8> {
        // SAFETY: callers never pass a zero-size layout
        let ptr = unsafe { alloc(layout) };
        NonNull::new(ptr).unwrap_or_else(|| handle_alloc_error(layout))
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        dealloc(ptr.as_ptr(), layout);
    }
}

//--------------------------------------------------------------------------------------------------

/// Handle to a NUL-terminated string stored in an arena block.
///
/// `len` excludes the terminator.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ArenaStr {
    off: usize,
    len: usize,
}

impl ArenaStr {
    pub fn offset(self) -> usize {
        self.off
    }

    pub fn len(self) -> usize {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Handle to a `[T]` stored in an arena block.
pub struct ArenaSlice<T> {
    off: usize,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ArenaSlice<T> {
    pub fn offset(self) -> usize {
        self.off
    }

    pub fn len(self) -> usize {
        self.len
    }

    pub fn is_empty(self) -> bool {
        self.len == 0
    }
}

impl<T> Copy for ArenaSlice<T> {}

impl<T> Clone for ArenaSlice<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> fmt::Debug for ArenaSlice<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArenaSlice")
            .field("off", &self.off)
            .field("len", &self.len)
            .finish()
    }
}

//--------------------------------------------------------------------------------------------------

#[cfg(debug_assertions)]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
struct Record {
    size: usize,
    align: usize,
    offset: usize,
}

fn align_up(value: usize, align: usize) -> usize {
    (value + align - 1) & !(align - 1)
}

struct Block {
    ptr: NonNull<u8>,
    layout: Layout,
}

pub struct FixedLinearAllocator {
    alloc: Option<Box<dyn RawAllocator>>,
    block: Option<Block>,
    reserved_size: usize,
    max_align: usize,
    cursor: usize,
    #[cfg(debug_assertions)]
    records: Vec<Record>,
    #[cfg(debug_assertions)]
    replay_index: usize,
}

impl FixedLinearAllocator {
    pub fn new() -> FixedLinearAllocator {
        FixedLinearAllocator::with_allocator(Box::new(GlobalAllocator))
    }

    pub fn with_allocator(alloc: Box<dyn RawAllocator>) -> FixedLinearAllocator {
        FixedLinearAllocator {
            alloc: Some(alloc),
            block: None,
            reserved_size: 0,
            max_align: 0,
            cursor: 0,
            #[cfg(debug_assertions)]
            records: Vec::new(),
            #[cfg(debug_assertions)]
            replay_index: 0,
        }
    }

    /// Declares a sub-allocation of `size` bytes at `align`.
    ///
    /// Zero-size requests are no-ops and do not perturb the layout.
    pub fn add_space(&mut self, size: usize, align: usize) {
        assert!(self.block.is_none(), "memory has already been reserved");
        assert!(align.is_power_of_two(), "alignment must be a power of two");
        if size == 0 {
            return;
        }
        let offset = align_up(self.reserved_size, align);
        #[cfg(debug_assertions)]
        self.records.push(Record { size, align, offset });
        self.reserved_size = offset + size;
        self.max_align = self.max_align.max(align);
    }

    pub fn add_slice<T>(&mut self, len: usize) {
        self.add_space(mem::size_of::<T>() * len, mem::align_of::<T>());
    }

    /// Declares space for `s` plus a NUL terminator.
    pub fn add_str(&mut self, s: &str) {
        self.add_space(s.len() + 1, 1);
    }

    /// Obtains the backing block. Total size is rounded up to pointer-size
    /// alignment; the block satisfies the strictest declared alignment.
    pub fn reserve(&mut self) {
        assert!(self.block.is_none(), "memory has already been reserved");
        let align = self.max_align.max(mem::align_of::<usize>());
        let size = align_up(self.reserved_size, mem::align_of::<usize>());
        let layout = Layout::from_size_align(size, align).expect("invalid arena layout");
        let ptr = if size > 0 {
            self.alloc.as_ref().map(|a| a.allocate(layout)).unwrap_or_else(NonNull::dangling)
        } else {
            NonNull::dangling()
        };
        self.reserved_size = size;
        self.block = Some(Block { ptr, layout });
    }

    /// Replays one declaration and returns the offset of the sub-allocation.
    pub fn allocate(&mut self, size: usize, align: usize) -> usize {
        let block_off = {
            let block = self.block.as_ref().expect("allocate called before reserve");
            assert!(align.is_power_of_two(), "alignment must be a power of two");
            if size == 0 {
                return self.cursor;
            }
            let offset = align_up(self.cursor, align);
            assert!(
                offset + size <= block.layout.size(),
                "allocation exceeds the reserved size; \
                 the replay sequence diverged from the declaration sequence"
            );
            offset
        };
        #[cfg(debug_assertions)]
        {
            let rec = self
                .records
                .get(self.replay_index)
                .copied()
                .expect("more allocations than declarations");
            assert!(
                rec == Record { size, align, offset: block_off },
                "replay mismatch at call {}: declared ({}, {}) at offset {}, \
                 replayed ({}, {}) at offset {}",
                self.replay_index,
                rec.size,
                rec.align,
                rec.offset,
                size,
                align,
                block_off
            );
            self.replay_index += 1;
        }
        self.cursor = block_off + size;
        block_off
    }

    pub fn allocate_slice<T: Copy>(&mut self, len: usize) -> ArenaSlice<T> {
        let off = self.allocate(mem::size_of::<T>() * len, mem::align_of::<T>());
        ArenaSlice { off, len, _marker: PhantomData }
    }

    /// Allocates and fills a slice in one step.
    pub fn copy_slice<T: Copy>(&mut self, src: &[T]) -> ArenaSlice<T> {
        let handle = self.allocate_slice::<T>(src.len());
        if !src.is_empty() {
            let base = self.base_ptr();
            unsafe {
                let dst = base.as_ptr().add(handle.off) as *mut T;
                std::ptr::copy_nonoverlapping(src.as_ptr(), dst, src.len());
            }
        }
        handle
    }

    /// Copies `s` into the arena, appending a NUL terminator. The handle's
    /// length excludes the terminator.
    pub fn copy_str(&mut self, s: &str) -> ArenaStr {
        let off = self.allocate(s.len() + 1, 1);
        let base = self.base_ptr();
        unsafe {
            let dst = base.as_ptr().add(off);
            std::ptr::copy_nonoverlapping(s.as_ptr(), dst, s.len());
            *dst.add(s.len()) = 0;
        }
        ArenaStr { off, len: s.len() }
    }

    /// Detaches the filled block; the returned [`ArenaBlock`] frees it
    /// through the original allocator on drop.
    pub fn release(mut self) -> ArenaBlock {
        let block = self.block.take().expect("release called before reserve");
        ArenaBlock {
            ptr: block.ptr,
            layout: block.layout,
            alloc: self.alloc.take(),
        }
    }

    /// Detaches the block without retaining deallocation responsibility; the
    /// caller becomes the owner of the raw memory.
    pub fn release_ownership(mut self) -> (NonNull<u8>, Layout) {
        let block = self.block.take().expect("release_ownership called before reserve");
        (block.ptr, block.layout)
    }

    fn base_ptr(&self) -> NonNull<u8> {
        self.block
            .as_ref()
            .expect("memory has not been reserved")
            .ptr
    }
}

impl Default for FixedLinearAllocator {
    fn default() -> Self {
        FixedLinearAllocator::new()
    }
}

impl Drop for FixedLinearAllocator {
    fn drop(&mut self) {
        if let (Some(block), Some(alloc)) = (self.block.take(), self.alloc.as_ref()) {
            if block.layout.size() > 0 {
                unsafe { alloc.deallocate(block.ptr, block.layout) };
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------

/// Owner of a finished arena block.
///
/// The block is immutable once released from the allocator; handles resolve
/// against it for the rest of the owning object's lifetime.
pub struct ArenaBlock {
    ptr: NonNull<u8>,
    layout: Layout,
    alloc: Option<Box<dyn RawAllocator>>,
}

// The block is exclusively owned and never mutated after release.
unsafe impl Send for ArenaBlock {}
unsafe impl Sync for ArenaBlock {}

impl ArenaBlock {
    pub fn size(&self) -> usize {
        self.layout.size()
    }

    pub fn bytes(&self) -> &[u8] {
        if self.layout.size() == 0 {
            return &[];
        }
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.layout.size()) }
    }

    pub fn str_at(&self, handle: ArenaStr) -> &str {
        if handle.len == 0 {
            return "";
        }
        assert!(handle.off + handle.len <= self.layout.size(), "stale arena handle");
        unsafe {
            let bytes = slice::from_raw_parts(self.ptr.as_ptr().add(handle.off), handle.len);
            // arena strings are only ever copied from &str
            str::from_utf8_unchecked(bytes)
        }
    }

    pub fn slice_at<T: Copy>(&self, handle: ArenaSlice<T>) -> &[T] {
        if handle.len == 0 {
            return &[];
        }
        assert!(
            handle.off + handle.len * mem::size_of::<T>() <= self.layout.size(),
            "stale arena handle"
        );
        unsafe { slice::from_raw_parts(self.ptr.as_ptr().add(handle.off) as *const T, handle.len) }
    }
}

impl fmt::Debug for ArenaBlock {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("ArenaBlock")
            .field("size", &self.layout.size())
            .field("align", &self.layout.align())
            .finish()
    }
}

impl Drop for ArenaBlock {
    fn drop(&mut self) {
        if let Some(alloc) = self.alloc.as_ref() {
            if self.layout.size() > 0 {
                unsafe { alloc.deallocate(self.ptr, self.layout) };
            }
        }
    }
}

//--------------------------------------------------------------------------------------------------
