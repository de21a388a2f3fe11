use std::sync::atomic::{AtomicU64, Ordering};

// Process-wide: collections are a property of the process, not of one manager.
static COLLECTIONS: AtomicU64 = AtomicU64::new(0);

/// Number of reclamation cycles run so far in this process.
pub(crate) fn collection_count() -> u64 {
    COLLECTIONS.load(Ordering::Acquire)
}

/// Run one reclamation cycle and return the updated cycle count.
///
/// Freed heap pages are handed back to the OS where the allocator supports it.
pub(crate) fn collect() -> u64 {
    let released = release_free_heap();
    let count = COLLECTIONS.fetch_add(1, Ordering::AcqRel) + 1;
    tracing::debug!(
        target = "fanws.memory",
        collections = count,
        released_to_os = released,
        "reclamation cycle complete"
    );
    count
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
fn release_free_heap() -> bool {
    // SAFETY: `malloc_trim` only inspects allocator state and has no preconditions.
    unsafe { libc::malloc_trim(0) != 0 }
}

#[cfg(not(all(target_os = "linux", target_env = "gnu")))]
fn release_free_heap() -> bool {
    false
}
