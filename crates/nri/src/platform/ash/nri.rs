use crate::command::SubmissionTracking;
use crate::error::NriError;
use crate::factory::{NriCreateInfo, NriFactory};
use crate::format::{BufferUsage, Format, ImageUsage};
use crate::memory::{MemoryAllocator, MemoryRequirements};
use crate::platform::ash::accel::{AshBlas, AshTlas};
use crate::platform::ash::buffer::AshBuffer;
use crate::platform::ash::command::{AshCommandBuffer, AshCommandPool, AshCommandQueue};
use crate::platform::ash::descriptor::AshDescriptorTable;
use crate::platform::ash::image::{AshImage2d, AshImageView};
use crate::platform::ash::init::{ash_init, AshDevice};
use crate::platform::ash::memory::AshAllocation;
use crate::platform::ash::program::AshProgramBuilder;
use crate::platform::ash::window::AshWindow;
use crate::platform::{BlasCreateInfo, Nri, WindowCreateInfo};
use crate::shader::ShaderSource;
use glam::Affine3A;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::cell::RefCell;
use std::rc::Rc;

/// Everything resources need from their device, shared by all of them.
pub struct AshContext {
	pub descriptors: RefCell<AshDescriptorTable>,
	pub shaders: ShaderSource,
	pub submission_tracking: SubmissionTracking,
	pub device: Rc<AshDevice>,
}

/// The Vulkan backend. Single threaded, cloning it is cheap and shares the device.
#[derive(Clone)]
pub struct AshNri {
	ctx: Rc<AshContext>,
	default_pool: AshCommandPool,
}

impl AshNri {
	pub const NAME: &'static str = "Vulkan";

	pub fn new(info: &NriCreateInfo) -> Result<Self, NriError> {
		profiling::scope!("AshNri::new");
		let device = Rc::new(ash_init(info)?);
		let descriptors = AshDescriptorTable::new(&device, info.descriptor_counts)?;
		let default_pool = AshCommandPool::new(&device)?;
		Ok(Self {
			ctx: Rc::new(AshContext {
				descriptors: RefCell::new(descriptors),
				shaders: info.shaders.clone(),
				submission_tracking: info.submission_tracking,
				device,
			}),
			default_pool,
		})
	}

	pub fn ctx(&self) -> &Rc<AshContext> {
		&self.ctx
	}

	pub fn device(&self) -> &Rc<AshDevice> {
		&self.ctx.device
	}
}

impl NriFactory<AshNri> {
	/// A factory with every backend this crate ships registered.
	pub fn with_default_backends() -> Self {
		let mut factory = Self::empty();
		factory.register(AshNri::NAME, AshNri::new);
		factory
	}
}

impl MemoryAllocator for AshNri {
	type Allocation = AshAllocation;

	fn allocate_memory(&self, requirements: MemoryRequirements) -> Result<AshAllocation, NriError> {
		AshAllocation::new(&self.ctx.device, requirements)
	}
}

impl Nri for AshNri {
	type Buffer = AshBuffer;
	type Image2d = AshImage2d;
	type ImageView = AshImageView;
	type CommandPool = AshCommandPool;
	type CommandBuffer = AshCommandBuffer;
	type CommandQueue = AshCommandQueue;
	type ProgramBuilder = AshProgramBuilder;
	type Window = AshWindow;
	type Blas = AshBlas;
	type Tlas = AshTlas;

	fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<AshBuffer, NriError> {
		AshBuffer::new(&self.ctx, size, usage)
	}

	fn create_image_2d(
		&self,
		width: u32,
		height: u32,
		format: Format,
		usage: ImageUsage,
	) -> Result<AshImage2d, NriError> {
		AshImage2d::new(&self.ctx, width, height, format, usage)
	}

	fn create_command_queue(&self) -> Result<AshCommandQueue, NriError> {
		Ok(AshCommandQueue::new(&self.ctx.device, self.ctx.submission_tracking))
	}

	fn create_command_pool(&self) -> Result<AshCommandPool, NriError> {
		AshCommandPool::new(&self.ctx.device)
	}

	fn create_command_buffer(&self, pool: &AshCommandPool) -> Result<AshCommandBuffer, NriError> {
		AshCommandBuffer::new(pool)
	}

	fn default_command_pool(&self) -> &AshCommandPool {
		&self.default_pool
	}

	fn create_program_builder(&self) -> AshProgramBuilder {
		AshProgramBuilder::new(&self.ctx)
	}

	unsafe fn create_window(
		&self,
		display_handle: RawDisplayHandle,
		window_handle: RawWindowHandle,
		info: &WindowCreateInfo,
	) -> Result<AshWindow, NriError> {
		unsafe { AshWindow::new(self, &self.default_pool, display_handle, window_handle, info) }
	}

	fn create_blas(&self, _: &BlasCreateInfo<'_, Self>) -> Result<AshBlas, NriError> {
		Err(NriError::NotImplemented("Bottom level acceleration structure creation"))
	}

	fn create_tlas(&self, _: &[&AshBlas], _: &[Affine3A]) -> Result<AshTlas, NriError> {
		Err(NriError::NotImplemented("Top level acceleration structure creation"))
	}

	fn should_flip_y(&self) -> bool {
		true
	}

	fn supports_ray_tracing(&self) -> bool {
		false
	}

	fn supports_textures(&self) -> bool {
		true
	}

	fn synchronize(&self) -> Result<(), NriError> {
		unsafe {
			self.ctx.device.device.device_wait_idle()?;
		}
		Ok(())
	}
}
