use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::fmt;

thread_local! {
    // Const-initialized and without a destructor, so touching it from inside the allocator
    // never allocates.
    static HEAP_OPERATIONS: Cell<u64> = const { Cell::new(0) };
}

fn record_heap_operation() {
    // Fails only during thread teardown, when nobody is measuring anymore.
    _ = HEAP_OPERATIONS.try_with(|count| count.set(count.get().wrapping_add(1)));
}

fn heap_operations() -> u64 {
    HEAP_OPERATIONS.with(Cell::get)
}

/// A global allocator that counts, per thread, every allocation, reallocation and
/// deallocation it forwards to the wrapped allocator.
///
/// Install it in a test binary and measure code with [`heap_operations_during()`].
///
/// # Example
///
/// ```rust
/// use std::alloc::System;
///
/// use testing::{CountingAllocator, heap_operations_during};
///
/// #[global_allocator]
/// static ALLOCATOR: CountingAllocator<System> = CountingAllocator::system();
///
/// fn main() {
///     let (values, operations) = heap_operations_during(|| vec![1, 2, 3]);
///     assert_eq!(values.len(), 3);
///     assert_eq!(operations, 1);
/// }
/// ```
pub struct CountingAllocator<A: GlobalAlloc> {
    inner: A,
}

impl CountingAllocator<System> {
    /// Creates a counting allocator on top of the system allocator.
    #[must_use]
    pub const fn system() -> Self {
        Self { inner: System }
    }
}

impl<A: GlobalAlloc> fmt::Debug for CountingAllocator<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CountingAllocator")
            .field("inner", &"<allocator>")
            .finish()
    }
}

// SAFETY: Every call is forwarded unchanged to the wrapped allocator, which upholds the
// GlobalAlloc contract. Counting only touches a const-initialized thread-local.
unsafe impl<A: GlobalAlloc> GlobalAlloc for CountingAllocator<A> {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        record_heap_operation();

        // SAFETY: Forwarded with the caller's guarantees.
        unsafe { self.inner.alloc(layout) }
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        record_heap_operation();

        // SAFETY: Forwarded with the caller's guarantees.
        unsafe { self.inner.dealloc(ptr, layout) }
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        record_heap_operation();

        // SAFETY: Forwarded with the caller's guarantees.
        unsafe { self.inner.alloc_zeroed(layout) }
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        record_heap_operation();

        // SAFETY: Forwarded with the caller's guarantees.
        unsafe { self.inner.realloc(ptr, layout, new_size) }
    }
}

/// Runs `body` and returns its result together with the number of heap operations it
/// performed on the current thread.
///
/// Only meaningful in a binary that installs [`CountingAllocator`] as its global allocator;
/// otherwise the count is always zero. Dropping the returned value happens outside the
/// measurement.
pub fn heap_operations_during<R>(body: impl FnOnce() -> R) -> (R, u64) {
    let before = heap_operations();
    let result = body();
    let after = heap_operations();

    (result, after.wrapping_sub(before))
}
