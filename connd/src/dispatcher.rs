//! A bounded FIFO queue and fixed-size worker pool that decouples an accept
//! loop from per-connection handlers.
//!
//! Producer (the accept loop) and consumers (workers) share one mutex and
//! two condition variables, `not_empty` and `not_full`, mirroring the
//! `queue_mutex`/`queue_not_empty`/`queue_not_full` triplet in the source
//! this was distilled from.

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::thread;

struct Queue<T> {
	items: Mutex<VecDeque<T>>,
	not_empty: Condvar,
	not_full: Condvar,
	capacity: usize,
}

impl<T> Queue<T> {
	fn new(capacity: usize) -> Self {
		Self {
			items: Mutex::new(VecDeque::new()),
			not_empty: Condvar::new(),
			not_full: Condvar::new(),
			capacity,
		}
	}

	fn push(&self, item: T) {
		let mut items = self.items.lock().unwrap();
		while items.len() >= self.capacity {
			items = self.not_full.wait(items).unwrap();
		}
		items.push_back(item);
		self.not_empty.notify_one();
	}

	fn pop(&self) -> T {
		let mut items = self.items.lock().unwrap();
		while items.is_empty() {
			items = self.not_empty.wait(items).unwrap();
		}
		let item = items.pop_front().unwrap();
		self.not_full.notify_one();
		item
	}
}

/// Owns the bounded queue and the pool of worker threads draining it.
///
/// Workers run for the process lifetime and are never joined; the process
/// exits to terminate them, matching the source's `dthread_detach` workers.
pub struct Dispatcher<T: Send + 'static> {
	queue: Arc<Queue<T>>,
}

impl<T: Send + 'static> Dispatcher<T> {
	/// Spawns `pool_size` worker threads, each looping: pop a connection,
	/// run `handle` on it outside the lock, repeat.
	pub fn new<F>(pool_size: usize, buffer_size: usize, handle: F) -> Self
	where
		F: Fn(T) + Send + Sync + 'static,
	{
		let queue = Arc::new(Queue::new(buffer_size));
		let handle = Arc::new(handle);
		for _ in 0..pool_size {
			let queue = Arc::clone(&queue);
			let handle = Arc::clone(&handle);
			thread::spawn(move || loop {
				let item = queue.pop();
				handle(item);
			});
		}
		Self { queue }
	}

	/// Enqueues a connection, blocking the caller while the queue is at
	/// capacity.
	pub fn dispatch(&self, item: T) {
		self.queue.push(item);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::sync::atomic::{AtomicUsize, Ordering};
	use std::time::Duration;

	// P8: every enqueued item is eventually dequeued.
	#[test]
	fn liveness_drains_all_items() {
		let handled = Arc::new(AtomicUsize::new(0));
		let handled_clone = Arc::clone(&handled);
		let dispatcher = Dispatcher::new(2, 1, move |_: u32| {
			handled_clone.fetch_add(1, Ordering::SeqCst);
		});

		for i in 0..20 {
			dispatcher.dispatch(i);
		}

		let mut waited = Duration::ZERO;
		while handled.load(Ordering::SeqCst) < 20 && waited < Duration::from_secs(5) {
			thread::sleep(Duration::from_millis(10));
			waited += Duration::from_millis(10);
		}
		assert_eq!(handled.load(Ordering::SeqCst), 20);
	}

	// P8: queue length never exceeds buffer_size. Workers that never return
	// (simulated with a long sleep) force the producer to block once full.
	#[test]
	fn producer_blocks_when_queue_full() {
		let started = Arc::new(AtomicUsize::new(0));
		let started_clone = Arc::clone(&started);
		let dispatcher = Dispatcher::new(1, 1, move |_: u32| {
			started_clone.fetch_add(1, Ordering::SeqCst);
			thread::sleep(Duration::from_millis(200));
		});

		dispatcher.dispatch(1);
		// Give the sole worker time to pick up item 1 before pushing more.
		thread::sleep(Duration::from_millis(20));

		let queue = Arc::clone(&dispatcher.queue);
		let pushed = Arc::new(AtomicUsize::new(0));
		let pushed_clone = Arc::clone(&pushed);
		let handle = thread::spawn(move || {
			queue.push(2);
			pushed_clone.fetch_add(1, Ordering::SeqCst);
		});

		// The producer should still be blocked shortly after, since the
		// worker is asleep and the queue (capacity 1) is not yet empty.
		thread::sleep(Duration::from_millis(20));
		assert_eq!(pushed.load(Ordering::SeqCst), 0);

		handle.join().unwrap();
		assert_eq!(pushed.load(Ordering::SeqCst), 1);
		let _ = started;
	}
}
