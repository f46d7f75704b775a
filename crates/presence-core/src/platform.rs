//! Platform services the core reads but does not own

/// Reports free heap for `STATUS` and the periodic memory check
pub trait HeapMonitor {
    fn free_heap_bytes(&self) -> u32;
}

/// Heap monitor returning a constant, for hosts and tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedHeapMonitor(pub u32);

impl Default for FixedHeapMonitor {
    fn default() -> Self {
        Self(200_000)
    }
}

impl HeapMonitor for FixedHeapMonitor {
    fn free_heap_bytes(&self) -> u32 {
        self.0
    }
}

impl<H: HeapMonitor + ?Sized> HeapMonitor for &H {
    fn free_heap_bytes(&self) -> u32 {
        (**self).free_heap_bytes()
    }
}
