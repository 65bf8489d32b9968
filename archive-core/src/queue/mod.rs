//! # Bounded message queue (C8)
//!
//! A FIFO with an optional max depth, the backpressure boundary the
//! walker/writer and reader/consumer threads sit on (spec §4.8, §5). Built
//! on `std::sync::{Mutex, Condvar}` rather than a channel crate: the queue
//! needs `count`/`clear`/`wait` introspection a plain `mpsc::Receiver`
//! doesn't expose, and the corpus reaches for the standard condvar pattern
//! wherever it needs a bounded, inspectable queue.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

struct State<T> {
    items: VecDeque<T>,
    end_of_stream: bool,
}

/// A bounded (or unbounded, when `max == 0`) FIFO queue with end-of-stream
/// signaling, shared between a producer and consumer thread.
pub struct MessageQueue<T> {
    max: usize,
    state: Mutex<State<T>>,
    modified: Condvar,
}

impl<T> MessageQueue<T> {
    /// `max == 0` means unbounded.
    pub fn init(max: usize) -> Self {
        Self { max, state: Mutex::new(State { items: VecDeque::new(), end_of_stream: false }), modified: Condvar::new() }
    }

    /// Consumes the queue, optionally running `free_fn` over whatever is
    /// still queued (mirrors the C API's destructor callback; in Rust the
    /// items are simply dropped unless the caller wants custom cleanup).
    pub fn done(self, free_fn: Option<impl Fn(T)>) {
        let items = self.state.into_inner().unwrap().items;
        if let Some(f) = free_fn {
            for item in items {
                f(item);
            }
        }
    }

    /// Appends `item`, blocking while the queue is at capacity. Returns
    /// `false` without enqueuing once `set_end_of_stream` has been called.
    pub fn put(&self, item: T) -> bool {
        let mut state = self.state.lock().unwrap();
        loop {
            if state.end_of_stream {
                return false;
            }
            if self.max == 0 || state.items.len() < self.max {
                state.items.push_back(item);
                self.modified.notify_all();
                return true;
            }
            state = self.modified.wait(state).unwrap();
        }
    }

    /// Pops the oldest item, blocking until one arrives, `timeout` expires,
    /// or the stream ends with nothing left. Returns `None` on timeout or
    /// end-of-stream-and-empty, matching the C API's boolean return folded
    /// into the popped value.
    pub fn get(&self, timeout: Option<Duration>) -> Option<T> {
        let mut state = self.state.lock().unwrap();
        let deadline = timeout.map(|d| Instant::now() + d);
        loop {
            if let Some(item) = state.items.pop_front() {
                self.modified.notify_all();
                return Some(item);
            }
            if state.end_of_stream {
                return None;
            }
            match deadline {
                None => state = self.modified.wait(state).unwrap(),
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return None;
                    }
                    let (guard, result) = self.modified.wait_timeout(state, remaining).unwrap();
                    state = guard;
                    if result.timed_out() && state.items.is_empty() && !state.end_of_stream {
                        return None;
                    }
                }
            }
        }
    }

    /// Marks the stream ended: no more `put`s will succeed, and `get`
    /// drains whatever remains before reporting empty.
    pub fn set_end_of_stream(&self) {
        let mut state = self.state.lock().unwrap();
        state.end_of_stream = true;
        self.modified.notify_all();
    }

    pub fn count(&self) -> usize {
        self.state.lock().unwrap().items.len()
    }

    /// Blocks until the queue is non-empty or has ended.
    pub fn wait(&self) {
        let mut state = self.state.lock().unwrap();
        while state.items.is_empty() && !state.end_of_stream {
            state = self.modified.wait(state).unwrap();
        }
    }

    /// Drops every queued item, optionally running `free_fn` over each one.
    pub fn clear(&self, free_fn: Option<impl Fn(T)>) {
        let mut state = self.state.lock().unwrap();
        let drained: Vec<T> = state.items.drain(..).collect();
        drop(state);
        if let Some(f) = free_fn {
            for item in drained {
                f(item);
            }
        }
    }

    pub fn is_end_of_stream(&self) -> bool {
        self.state.lock().unwrap().end_of_stream
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn fifo_order_preserved() {
        let q = MessageQueue::init(0);
        q.put(1);
        q.put(2);
        q.put(3);
        assert_eq!(q.get(None), Some(1));
        assert_eq!(q.get(None), Some(2));
        assert_eq!(q.get(None), Some(3));
    }

    #[test]
    fn get_after_end_of_stream_drains_then_returns_none() {
        let q = MessageQueue::init(0);
        q.put(42);
        q.set_end_of_stream();
        assert_eq!(q.get(None), Some(42));
        assert_eq!(q.get(None), None);
        assert!(!q.put(1));
    }

    #[test]
    fn bounded_queue_never_exceeds_max() {
        let q = Arc::new(MessageQueue::init(2));
        assert!(q.put(1));
        assert!(q.put(2));
        let q2 = Arc::clone(&q);
        let handle = thread::spawn(move || {
            q2.put(3);
        });
        thread::sleep(Duration::from_millis(50));
        assert_eq!(q.count(), 2);
        q.get(None);
        handle.join().unwrap();
        assert_eq!(q.count(), 2);
    }

    #[test]
    fn get_times_out_when_empty() {
        let q: MessageQueue<i32> = MessageQueue::init(0);
        let start = Instant::now();
        assert_eq!(q.get(Some(Duration::from_millis(30))), None);
        assert!(start.elapsed() >= Duration::from_millis(30));
    }
}
