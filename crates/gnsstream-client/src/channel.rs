use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Default number of messages held before the oldest is evicted.
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Fixed-capacity FIFO that favors freshness over completeness.
///
/// `put` never blocks: when the queue is full the oldest item is evicted to
/// make room. `get` parks the caller on a condition variable until an item
/// arrives or the timeout elapses.
pub struct BoundedChannel<T> {
    queue: Mutex<VecDeque<T>>,
    available: Condvar,
    capacity: usize,
    evicted: AtomicU64,
}

impl<T> BoundedChannel<T> {
    /// Create a channel holding at most `capacity` items (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            available: Condvar::new(),
            capacity,
            evicted: AtomicU64::new(0),
        }
    }

    /// Enqueue `item`, returning the evicted oldest item if the queue was full.
    pub fn put(&self, item: T) -> Option<T> {
        let evicted = {
            let mut queue = self.queue.lock();
            let evicted = if queue.len() >= self.capacity {
                queue.pop_front()
            } else {
                None
            };
            queue.push_back(item);
            evicted
        };

        if evicted.is_some() {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        self.available.notify_one();
        evicted
    }

    /// Dequeue the oldest item.
    ///
    /// - `block == false`: return immediately.
    /// - `block == true`, `timeout == None`: wait until an item arrives.
    /// - `block == true`, `timeout == Some(t)`: wait at most `t`.
    pub fn get(&self, block: bool, timeout: Option<Duration>) -> Option<T> {
        let mut queue = self.queue.lock();
        if let Some(item) = queue.pop_front() {
            return Some(item);
        }
        if !block {
            return None;
        }

        match timeout {
            None => loop {
                self.available.wait(&mut queue);
                if let Some(item) = queue.pop_front() {
                    return Some(item);
                }
            },
            Some(timeout) => {
                let deadline = Instant::now().checked_add(timeout);
                loop {
                    let timed_out = match deadline {
                        Some(deadline) => self
                            .available
                            .wait_until(&mut queue, deadline)
                            .timed_out(),
                        // Timeout too large to represent; treat as unbounded.
                        None => {
                            self.available.wait(&mut queue);
                            false
                        }
                    };
                    if let Some(item) = queue.pop_front() {
                        return Some(item);
                    }
                    if timed_out {
                        return None;
                    }
                }
            }
        }
    }

    /// Non-blocking dequeue.
    pub fn try_get(&self) -> Option<T> {
        self.get(false, None)
    }

    /// Drop every pending item, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut queue = self.queue.lock();
        let n = queue.len();
        queue.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items dropped by overflow since construction.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}

impl<T> std::fmt::Debug for BoundedChannel<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedChannel")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("evicted", &self.evicted())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn overflow_evicts_oldest() {
        let channel = BoundedChannel::new(3);
        assert_eq!(channel.put('A'), None);
        assert_eq!(channel.put('B'), None);
        assert_eq!(channel.put('C'), None);
        assert_eq!(channel.put('D'), Some('A'));

        assert_eq!(channel.len(), 3);
        assert_eq!(channel.evicted(), 1);
        assert_eq!(channel.try_get(), Some('B'));
        assert_eq!(channel.try_get(), Some('C'));
        assert_eq!(channel.try_get(), Some('D'));
        assert_eq!(channel.try_get(), None);
    }

    #[test]
    fn keeps_most_recent_window() {
        let channel = BoundedChannel::new(5);
        for i in 0..1000 {
            channel.put(i);
        }
        let drained: Vec<_> = std::iter::from_fn(|| channel.try_get()).collect();
        assert_eq!(drained, vec![995, 996, 997, 998, 999]);
        assert_eq!(channel.evicted(), 995);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let channel = BoundedChannel::new(0);
        assert_eq!(channel.capacity(), 1);
        channel.put(1);
        assert_eq!(channel.put(2), Some(1));
    }

    #[test]
    fn non_blocking_get_on_empty() {
        let channel: BoundedChannel<u8> = BoundedChannel::new(4);
        let started = Instant::now();
        assert_eq!(channel.get(false, Some(Duration::from_secs(5))), None);
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(channel.is_empty());
    }

    #[test]
    fn blocking_get_times_out() {
        let channel: BoundedChannel<u8> = BoundedChannel::new(4);
        let started = Instant::now();
        assert_eq!(channel.get(true, Some(Duration::from_millis(50))), None);
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[test]
    fn blocking_get_wakes_on_put() {
        let channel = Arc::new(BoundedChannel::new(4));
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.get(true, Some(Duration::from_secs(5))))
        };

        thread::sleep(Duration::from_millis(20));
        channel.put("fix");
        assert_eq!(consumer.join().unwrap(), Some("fix"));
    }

    #[test]
    fn unbounded_get_wakes_on_put() {
        let channel = Arc::new(BoundedChannel::new(4));
        let consumer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || channel.get(true, None))
        };

        thread::sleep(Duration::from_millis(20));
        channel.put(7u32);
        assert_eq!(consumer.join().unwrap(), Some(7));
    }

    #[test]
    fn put_never_blocks_when_full() {
        let channel = BoundedChannel::new(2);
        let started = Instant::now();
        for i in 0..100_000u32 {
            channel.put(i);
        }
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(channel.len(), 2);
    }

    #[test]
    fn producer_consumer_preserves_order() {
        let channel = Arc::new(BoundedChannel::new(1024));
        let producer = {
            let channel = Arc::clone(&channel);
            thread::spawn(move || {
                for i in 0..500u32 {
                    channel.put(i);
                }
            })
        };

        let mut received = Vec::new();
        while received.len() < 500 {
            if let Some(i) = channel.get(true, Some(Duration::from_secs(5))) {
                received.push(i);
            } else {
                break;
            }
        }
        producer.join().unwrap();
        assert_eq!(received, (0..500).collect::<Vec<_>>());
    }

    #[test]
    fn clear_drains() {
        let channel = BoundedChannel::new(4);
        channel.put(1);
        channel.put(2);
        assert_eq!(channel.clear(), 2);
        assert!(channel.is_empty());
    }
}
