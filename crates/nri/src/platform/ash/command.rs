use crate::command::{CommandBuffer, CommandQueue, SubmissionTracking, SubmitKey};
use crate::error::NriError;
use crate::owned::OwnedOrBorrowed;
use crate::platform::ash::init::AshDevice;
use crate::platform::ash::nri::AshNri;
use crate::platform::ash::raii::{CommandPoolGuard, FenceGuard};
use ash::vk::{
	CommandBufferAllocateInfo, CommandBufferBeginInfo, CommandBufferLevel, CommandBufferResetFlags,
	CommandBufferUsageFlags, CommandPoolCreateFlags, CommandPoolCreateInfo, Fence, FenceCreateInfo,
	PipelineStageFlags, Semaphore, SubmitInfo,
};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::rc::Rc;

/// A pool whose command buffers can be reset individually.
#[derive(Clone)]
pub struct AshCommandPool {
	pool: Rc<CommandPoolGuard>,
}

impl AshCommandPool {
	pub fn new(device: &Rc<AshDevice>) -> Result<Self, NriError> {
		unsafe {
			let pool = device.device.create_command_pool(
				&CommandPoolCreateInfo::default()
					.flags(CommandPoolCreateFlags::RESET_COMMAND_BUFFER)
					.queue_family_index(device.queue_family_index),
				None,
			)?;
			Ok(Self {
				pool: Rc::new(CommandPoolGuard::new(device, pool)),
			})
		}
	}

	pub fn handle(&self) -> ash::vk::CommandPool {
		**self.pool
	}
}

/// A primary command buffer. Keeps its pool alive and returns itself to it on drop.
pub struct AshCommandBuffer {
	pool: Rc<CommandPoolGuard>,
	buffer: ash::vk::CommandBuffer,
	recording: bool,
}

impl AshCommandBuffer {
	pub fn new(pool: &AshCommandPool) -> Result<Self, NriError> {
		unsafe {
			let device = &pool.pool.device().device;
			let buffer = device.allocate_command_buffers(
				&CommandBufferAllocateInfo::default()
					.command_pool(pool.handle())
					.level(CommandBufferLevel::PRIMARY)
					.command_buffer_count(1),
			)?[0];
			Ok(Self {
				pool: pool.pool.clone(),
				buffer,
				recording: false,
			})
		}
	}

	pub fn handle(&self) -> ash::vk::CommandBuffer {
		self.buffer
	}

	pub fn device(&self) -> &ash::Device {
		&self.pool.device().device
	}

	/// Discards everything recorded. The buffer must not be pending execution.
	pub fn reset(&mut self) -> Result<(), NriError> {
		unsafe {
			self.device()
				.reset_command_buffer(self.buffer, CommandBufferResetFlags::empty())?;
		}
		self.recording = false;
		Ok(())
	}
}

impl CommandBuffer for AshCommandBuffer {
	fn begin(&mut self) -> Result<(), NriError> {
		if self.recording {
			return Ok(());
		}
		unsafe {
			self.device().begin_command_buffer(
				self.buffer,
				&CommandBufferBeginInfo::default().flags(CommandBufferUsageFlags::ONE_TIME_SUBMIT),
			)?;
		}
		self.recording = true;
		Ok(())
	}

	fn end(&mut self) -> Result<(), NriError> {
		if !self.recording {
			return Ok(());
		}
		unsafe {
			self.device().end_command_buffer(self.buffer)?;
		}
		self.recording = false;
		Ok(())
	}

	fn is_recording(&self) -> bool {
		self.recording
	}
}

impl Drop for AshCommandBuffer {
	fn drop(&mut self) {
		unsafe {
			self.device().free_command_buffers(**self.pool, &[self.buffer]);
		}
	}
}

/// The graphics queue. Submissions are numbered in order, see [`SubmissionTracking`] for how waiting works.
pub struct AshCommandQueue {
	device: Rc<AshDevice>,
	tracking: SubmissionTracking,
	next_key: u64,
	fences: FxHashMap<SubmitKey, OwnedOrBorrowed<FenceGuard, Fence>>,
}

impl AshCommandQueue {
	pub fn new(device: &Rc<AshDevice>, tracking: SubmissionTracking) -> Self {
		Self {
			device: device.clone(),
			tracking,
			next_key: 0,
			fences: FxHashMap::default(),
		}
	}

	pub fn tracking(&self) -> SubmissionTracking {
		self.tracking
	}

	/// Ends and submits `command_buffer`, waiting on `wait_semaphores` and signaling `signal_semaphores` and
	/// `fence`, which may be null.
	pub fn submit_with(
		&mut self,
		command_buffer: &mut AshCommandBuffer,
		wait_semaphores: &[(Semaphore, PipelineStageFlags)],
		signal_semaphores: &[Semaphore],
		fence: Fence,
	) -> Result<SubmitKey, NriError> {
		profiling::scope!("AshCommandQueue::submit");
		command_buffer.end()?;
		let key = SubmitKey::new(self.next_key);
		self.next_key += 1;

		unsafe {
			let tracked = match self.tracking {
				SubmissionTracking::QueueIdle => None,
				SubmissionTracking::Fences => {
					self.reap_signaled()?;
					Some(if fence == Fence::null() {
						let fence = self.device.device.create_fence(&FenceCreateInfo::default(), None)?;
						OwnedOrBorrowed::Owned(FenceGuard::new(&self.device, fence))
					} else {
						// a caller's fence is reset and reused, only its latest submission is tracked
						self.fences.retain(|_, tracked| tracked.get() != fence);
						OwnedOrBorrowed::Borrowed(fence)
					})
				}
			};

			let (wait, stages): (SmallVec<[_; 2]>, SmallVec<[_; 2]>) = wait_semaphores.iter().copied().unzip();
			self.device.device.queue_submit(
				self.device.queue,
				&[SubmitInfo::default()
					.command_buffers(&[command_buffer.handle()])
					.wait_semaphores(&wait)
					.wait_dst_stage_mask(&stages)
					.signal_semaphores(signal_semaphores)],
				tracked.as_ref().map_or(fence, |f| f.get()),
			)?;

			if let Some(tracked) = tracked {
				self.fences.insert(key, tracked);
			}
		}
		Ok(key)
	}

	/// Drops the fences of submissions that already finished but were never waited on.
	fn reap_signaled(&mut self) -> Result<(), NriError> {
		let device = &self.device.device;
		let mut finished = SmallVec::<[SubmitKey; 8]>::new();
		for (key, fence) in &self.fences {
			if unsafe { device.get_fence_status(fence.get())? } {
				finished.push(*key);
			}
		}
		for key in finished {
			self.fences.remove(&key);
		}
		Ok(())
	}

	pub fn pending(&self) -> usize {
		self.fences.len()
	}
}

impl CommandQueue<AshNri> for AshCommandQueue {
	fn submit(&mut self, command_buffer: &mut AshCommandBuffer) -> Result<SubmitKey, NriError> {
		self.submit_with(command_buffer, &[], &[], Fence::null())
	}

	fn wait(&mut self, key: SubmitKey) -> Result<(), NriError> {
		profiling::scope!("AshCommandQueue::wait");
		unsafe {
			match self.tracking {
				SubmissionTracking::QueueIdle => self.device.device.queue_wait_idle(self.device.queue)?,
				SubmissionTracking::Fences => {
					// an unknown key was already waited on or reaped
					if let Some(fence) = self.fences.remove(&key) {
						self.device.device.wait_for_fences(&[fence.get()], true, u64::MAX)?;
					}
				}
			}
		}
		Ok(())
	}
}
