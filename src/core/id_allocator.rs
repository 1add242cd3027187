//! Entry ID allocation

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

/// Allocates IDs that are unique within one log stream
pub trait IdAllocator: Send + Sync {
    fn allocate(&self) -> String;
}

/// Random v4 UUIDs
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidAllocator;

impl IdAllocator for UuidAllocator {
    fn allocate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}

/// Decimal counter starting at "0"
#[derive(Debug, Default)]
pub struct SequentialIdAllocator {
    next: AtomicU64,
}

impl SequentialIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdAllocator for SequentialIdAllocator {
    fn allocate(&self) -> String {
        self.next.fetch_add(1, Ordering::SeqCst).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_sequential_ids() {
        let allocator = SequentialIdAllocator::new();
        assert_eq!(allocator.allocate(), "0");
        assert_eq!(allocator.allocate(), "1");
        assert_eq!(allocator.allocate(), "2");
    }

    #[test]
    fn test_uuid_ids_unique() {
        let allocator = UuidAllocator;
        let ids: HashSet<_> = (0..100).map(|_| allocator.allocate()).collect();
        assert_eq!(ids.len(), 100);
    }
}
