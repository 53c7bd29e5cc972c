use crate::error::NriError;
use crate::platform::Nri;

/// Identifies a submission for [`CommandQueue::wait`].
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct SubmitKey(u64);

impl SubmitKey {
	pub const fn new(sequence: u64) -> Self {
		Self(sequence)
	}

	pub const fn sequence(&self) -> u64 {
		self.0
	}
}

/// How a queue implements [`CommandQueue::wait`].
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum SubmissionTracking {
	/// Waiting on any key waits until the whole queue is idle.
	#[default]
	QueueIdle,
	/// Every submission gets its own fence and waiting only blocks on that submission.
	Fences,
}

pub trait CommandBuffer {
	/// Starts recording. Does nothing if already recording.
	fn begin(&mut self) -> Result<(), NriError>;

	/// Stops recording. Does nothing if not recording.
	fn end(&mut self) -> Result<(), NriError>;

	fn is_recording(&self) -> bool;
}

pub trait CommandQueue<N: Nri> {
	/// Ends `command_buffer` and submits it without any semaphores.
	fn submit(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<SubmitKey, NriError>;

	/// Blocks until the submission `key` has finished executing.
	fn wait(&mut self, key: SubmitKey) -> Result<(), NriError>;

	/// Submits and waits, the pattern every one-off upload uses.
	fn submit_and_wait(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<(), NriError> {
		let key = self.submit(command_buffer)?;
		self.wait(key)
	}
}
