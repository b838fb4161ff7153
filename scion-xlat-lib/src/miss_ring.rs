//! Miss ring buffer (component F) consume-side abstraction.
//!
//! The real ring is `scion_xlat_ebpf::attachment::MissRingHandle`,
//! backed by a BPF ringbuf map the kernel programs publish into. This
//! trait is the seam that lets the path service (component G) be
//! exercised without a kernel.

use std::collections::VecDeque;
use std::time::Duration;

use scion_xlat_common::MapKey;

/// Single-consumer drain over the lossy miss ring. `drain` calls
/// `handler` for each record currently available and may keep polling
/// up to `timeout`, mirroring `ring_buffer__poll(ring, timeout_ms)`.
#[allow(async_fn_in_trait)]
pub trait MissSource: Send {
    async fn drain<F: FnMut(MapKey) + Send>(&mut self, timeout: Duration, handler: F) -> usize;
}

/// In-process stand-in for the BPF ring: a bounded FIFO queue with
/// oldest-drop on overflow, matching component F's contract exactly
/// (used by this crate's own unit tests).
#[derive(Debug)]
pub struct InMemoryMissRing {
    queue: VecDeque<MapKey>,
    capacity: usize,
    dropped: u64,
}

impl InMemoryMissRing {
    pub fn new(capacity: usize) -> Self {
        Self { queue: VecDeque::with_capacity(capacity), capacity, dropped: 0 }
    }

    /// Non-blocking publish (the fast path's side of the contract).
    /// Returns `true` if the record was accepted, `false` if dropped.
    pub fn publish(&mut self, key: MapKey) -> bool {
        if self.queue.len() >= self.capacity {
            self.queue.pop_front();
            self.dropped += 1;
        }
        self.queue.push_back(key);
        true
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped
    }
}

impl MissSource for InMemoryMissRing {
    async fn drain<F: FnMut(MapKey) + Send>(&mut self, _timeout: Duration, mut handler: F) -> usize {
        let mut count = 0;
        while let Some(key) = self.queue.pop_front() {
            handler(key);
            count += 1;
        }
        count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drains_all_published_keys_in_fifo_order() {
        let mut ring = InMemoryMissRing::new(1024);
        ring.publish(MapKey::new(1, 1));
        ring.publish(MapKey::new(1, 2));

        let mut seen = Vec::new();
        ring.drain(Duration::from_millis(10), |k| seen.push(k)).await;
        assert_eq!(seen, vec![MapKey::new(1, 1), MapKey::new(1, 2)]);
    }

    #[test]
    fn overflow_drops_oldest() {
        let mut ring = InMemoryMissRing::new(2);
        ring.publish(MapKey::new(1, 1));
        ring.publish(MapKey::new(1, 2));
        ring.publish(MapKey::new(1, 3));
        assert_eq!(ring.dropped_count(), 1);
        assert_eq!(ring.queue.front().copied(), Some(MapKey::new(1, 2)));
    }
}
