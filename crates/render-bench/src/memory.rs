//! Memory counters sampled around each render call
//!
//! Two counters are tracked:
//!
//! - **heap bytes**: bytes currently allocated through Rust's global allocator.
//!   Only populated when [`TrackingAllocator`] is installed as the
//!   `#[global_allocator]` (the `render-bench` binary does this); otherwise it
//!   reads as zero.
//! - **native bytes**: resident set size of the whole process as reported by
//!   the OS through `sysinfo`. This covers allocations made by C libraries and
//!   anything else outside the Rust heap.
//!
//! Child processes spawned by subprocess backends are not part of either counter.

use crate::types::MemoryDelta;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::alloc::{GlobalAlloc, Layout, System};
use std::sync::atomic::{AtomicI64, Ordering};
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate};

static LIVE_HEAP_BYTES: AtomicI64 = AtomicI64::new(0);

/// Global allocator wrapper that counts live heap bytes
///
/// ```rust,ignore
/// #[global_allocator]
/// static GLOBAL: render_bench::TrackingAllocator = render_bench::TrackingAllocator;
/// ```
pub struct TrackingAllocator;

unsafe impl GlobalAlloc for TrackingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc(layout) };
        if !ptr.is_null() {
            LIVE_HEAP_BYTES.fetch_add(layout.size() as i64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn alloc_zeroed(&self, layout: Layout) -> *mut u8 {
        let ptr = unsafe { System.alloc_zeroed(layout) };
        if !ptr.is_null() {
            LIVE_HEAP_BYTES.fetch_add(layout.size() as i64, Ordering::Relaxed);
        }
        ptr
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        unsafe { System.dealloc(ptr, layout) };
        LIVE_HEAP_BYTES.fetch_sub(layout.size() as i64, Ordering::Relaxed);
    }

    unsafe fn realloc(&self, ptr: *mut u8, layout: Layout, new_size: usize) -> *mut u8 {
        let new_ptr = unsafe { System.realloc(ptr, layout, new_size) };
        if !new_ptr.is_null() {
            LIVE_HEAP_BYTES.fetch_add(new_size as i64 - layout.size() as i64, Ordering::Relaxed);
        }
        new_ptr
    }
}

/// Bytes currently live on the tracked heap (0 when the allocator is not installed)
pub fn live_heap_bytes() -> i64 {
    LIVE_HEAP_BYTES.load(Ordering::Relaxed)
}

/// Point-in-time memory counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub heap_bytes: i64,
    pub native_bytes: i64,
}

impl MemorySnapshot {
    /// Signed difference `self - earlier`; negative values are kept as-is
    pub fn delta_since(&self, earlier: &MemorySnapshot) -> MemoryDelta {
        MemoryDelta {
            heap_bytes: self.heap_bytes - earlier.heap_bytes,
            native_bytes: self.native_bytes - earlier.native_bytes,
        }
    }
}

/// Source of memory snapshots
pub trait MemoryProbe: Send + Sync {
    fn snapshot(&self) -> MemorySnapshot;
}

/// Reads the tracked heap and the process RSS
pub struct ProcessMemoryProbe {
    system: Mutex<sysinfo::System>,
    pid: Option<Pid>,
}

impl ProcessMemoryProbe {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                tracing::warn!("Cannot resolve current pid, native memory will read as 0: {}", e);
                None
            }
        };

        let probe = Self {
            system: Mutex::new(sysinfo::System::new()),
            pid,
        };
        // The first refresh allocates the process table; keep that out of the first delta.
        probe.resident_bytes();
        probe
    }

    fn resident_bytes(&self) -> i64 {
        let Some(pid) = self.pid else {
            return 0;
        };

        let mut system = self.system.lock();
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        system
            .process(pid)
            .map(|process| i64::try_from(process.memory()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn snapshot(&self) -> MemorySnapshot {
        // RSS first: the refresh allocates, and those bytes must be freed before the heap is read.
        let native_bytes = self.resident_bytes();
        MemorySnapshot {
            heap_bytes: live_heap_bytes(),
            native_bytes,
        }
    }
}
