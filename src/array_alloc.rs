//! Fallible boxed-slice allocation through an explicit allocator.
//!
//! `allocator-api2`'s `Box` has fallible constructors for sized values but
//! not for slices, so the bucket arrays and the growth-schedule copy go
//! through this helper. The returned `Box<[T], A>` deallocates through the
//! same allocator on drop, which gives construction its unwind-on-failure
//! behavior for free.

use allocator_api2::alloc::{AllocError, Allocator};
use allocator_api2::boxed::Box;
use core::alloc::Layout;
use core::ptr::NonNull;

/// Allocates a slice of `len` elements through `alloc`, filling slot `i`
/// with `init(i)`. The allocator's failure is reported as-is and nothing is
/// retained on the error path.
///
/// `init` must not panic: slots are written in order and a panic midway
/// would leak the allocation.
pub(crate) fn try_boxed_slice<T, A, F>(
    alloc: &A,
    len: usize,
    mut init: F,
) -> Result<Box<[T], A>, AllocError>
where
    A: Allocator + Clone,
    F: FnMut(usize) -> T,
{
    let layout = Layout::array::<T>(len).map_err(|_| AllocError)?;
    let ptr: NonNull<T> = alloc.allocate(layout)?.cast();
    unsafe {
        for i in 0..len {
            ptr.as_ptr().add(i).write(init(i));
        }
        let slice = core::ptr::slice_from_raw_parts_mut(ptr.as_ptr(), len);
        // Safety: `slice` was allocated through `alloc` with the layout of
        // `[T; len]` and every element is initialized.
        Ok(Box::from_raw_in(slice, alloc.clone()))
    }
}
