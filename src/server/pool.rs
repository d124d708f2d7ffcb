use std::{panic::{AssertUnwindSafe, catch_unwind}, thread::{Builder, JoinHandle}};

use crossbeam::channel::{Sender, bounded};
use tracing::{debug, error};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of threads fed from a bounded queue.
///
/// Submitting blocks while the queue is full. Dropping the pool closes the
/// queue and joins every thread once the queued jobs are done.
pub struct WorkerPool {
	sender:  Option<Sender<Job>>,
	threads: Vec<JoinHandle<()>>,
}

impl WorkerPool {
	pub fn new(size: usize) -> std::io::Result<Self> {
		let (sender, receiver) = bounded::<Job>(size * 4);
		let mut threads = Vec::with_capacity(size);
		for id in 0..size {
			let receiver = receiver.clone();
			let thread = Builder::new().name(format!("smartserver-worker-{id}")).spawn(move || {
				for job in receiver {
					if catch_unwind(AssertUnwindSafe(job)).is_err() {
						error!(worker = id, "job panicked");
					}
				}
				debug!(worker = id, "worker stopped");
			})?;
			threads.push(thread);
		}
		Ok(Self { sender: Some(sender), threads })
	}

	/// Queue a job. Returns `false` if the pool is shut down.
	pub fn execute<F>(&self, job: F) -> bool
	where
		F: FnOnce() + Send + 'static,
	{
		match &self.sender {
			Some(sender) => sender.send(Box::new(job)).is_ok(),
			None => false,
		}
	}

	pub fn size(&self) -> usize { self.threads.len() }

	pub fn shutdown(&mut self) {
		self.sender.take();
		for thread in self.threads.drain(..) {
			if thread.join().is_err() {
				error!("worker thread panicked");
			}
		}
	}
}

impl Drop for WorkerPool {
	fn drop(&mut self) { self.shutdown(); }
}
