//! Task ID generation

use std::sync::atomic::{self, AtomicU64};

use crate::TaskId;

/// Thread-safe monotonic task ID generator
pub struct IdGenerator {
    next_id: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(0),
        }
    }

    /// Get the next available ID
    pub fn get_available_id(&self) -> TaskId {
        TaskId::new(self.next_id.fetch_add(1, atomic::Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_generation() {
        let gen = IdGenerator::new();
        let id1 = gen.get_available_id();
        let id2 = gen.get_available_id();
        assert_ne!(id1, id2);
    }
}
