// ID Generator - Snowflake-like document identifiers
// 64-bit ID format: [timestamp:42][node_id:10][sequence:12]

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::core::ObjectId;

/// Allows 1024 nodes and 4096 IDs per millisecond per node
#[derive(Debug)]
pub struct IdGenerator {
    node_id: u16,
    state: AtomicU64,
}

/// Node IDs must stay below this to fit in 10 bits
pub const MAX_NODES: u16 = 1024;

const SEQUENCE_BITS: u64 = 12;
const SEQUENCE_MASK: u64 = 0xFFF;

impl IdGenerator {
    pub fn new(node_id: u16) -> Self {
        assert!(node_id < MAX_NODES, "Node ID must be less than 1024");

        Self {
            node_id,
            state: AtomicU64::new(0),
        }
    }

    /// Generate the next unique ID. IDs from one generator are strictly increasing.
    pub fn next_id(&self) -> ObjectId {
        // state packs [timestamp:52][sequence:12] so a single CAS advances both
        let mut current = self.state.load(Ordering::Relaxed);
        loop {
            let now = current_millis();
            let last_ts = current >> SEQUENCE_BITS;
            let next = if now > last_ts {
                now << SEQUENCE_BITS
            } else if current & SEQUENCE_MASK < SEQUENCE_MASK {
                current + 1
            } else {
                // Sequence exhausted for this millisecond, borrow the next one
                (last_ts + 1) << SEQUENCE_BITS
            };

            match self
                .state
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return self.compose(next >> SEQUENCE_BITS, next & SEQUENCE_MASK),
                Err(observed) => current = observed,
            }
        }
    }

    fn compose(&self, timestamp: u64, sequence: u64) -> ObjectId {
        let id = ((timestamp & 0x3FFFFFFFFFF) << 22)
            | ((self.node_id as u64) << 12)
            | (sequence & SEQUENCE_MASK);
        ObjectId::new(id as i64)
    }

    pub fn extract_node_id(id: ObjectId) -> u16 {
        ((id.value() as u64) >> 12 & 0x3FF) as u16
    }

    pub fn extract_timestamp(id: ObjectId) -> u64 {
        (id.value() as u64) >> 22
    }

    pub fn node_id(&self) -> u16 {
        self.node_id
    }
}

fn current_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[test]
    fn test_id_generation() {
        let generator = IdGenerator::new(123);

        let id1 = generator.next_id();
        let id2 = generator.next_id();
        let id3 = generator.next_id();

        assert!(id1 < id2);
        assert!(id2 < id3);

        assert_eq!(IdGenerator::extract_node_id(id1), 123);
        assert_eq!(IdGenerator::extract_node_id(id2), 123);
        assert_eq!(IdGenerator::extract_node_id(id3), 123);
    }

    #[test]
    fn test_node_extraction() {
        let generator = IdGenerator::new(500);
        let id = generator.next_id();

        assert_eq!(IdGenerator::extract_node_id(id), 500);
        assert_eq!(generator.node_id(), 500);
        assert!(IdGenerator::extract_timestamp(id) > 0);
    }

    #[test]
    fn test_unique_across_threads() {
        let generator = Arc::new(IdGenerator::new(1));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let generator = generator.clone();
                std::thread::spawn(move || (0..2000).map(|_| generator.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate id {}", id);
            }
        }
        assert_eq!(seen.len(), 8000);
    }
}
