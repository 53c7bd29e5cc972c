use crate::barrier::ImageLayout;
use crate::command::{CommandBuffer, CommandQueue};
use crate::error::NriError;
use crate::format::{BufferUsage, Format, ImageUsage, IndexType};
use crate::handle::ResourceHandle;
use crate::memory::{BindMemory, MappedMemory, MemoryAllocator};
use crate::program::ProgramBuilder;
use glam::{Affine3A, Vec4};
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};

/// A native rendering backend. Each object kind is an associated type, so code written against `N: Nri` works with
/// any backend without naming it.
pub trait Nri: MemoryAllocator + Sized {
	type Buffer: Buffer<Self>;
	type Image2d: Image2d<Self>;
	type ImageView: ImageView;
	type CommandPool;
	type CommandBuffer: CommandBuffer;
	type CommandQueue: CommandQueue<Self>;
	type ProgramBuilder: ProgramBuilder<Self>;
	type Window: Window<Self>;
	type Blas: Blas<Self>;
	type Tlas: Tlas<Self>;

	/// Creates a buffer without memory, see [`BindMemory`].
	fn create_buffer(&self, size: u64, usage: BufferUsage) -> Result<Self::Buffer, NriError>;

	/// Creates an image without memory, see [`BindMemory`].
	fn create_image_2d(
		&self,
		width: u32,
		height: u32,
		format: Format,
		usage: ImageUsage,
	) -> Result<Self::Image2d, NriError>;

	fn create_command_queue(&self) -> Result<Self::CommandQueue, NriError>;

	fn create_command_pool(&self) -> Result<Self::CommandPool, NriError>;

	fn create_command_buffer(&self, pool: &Self::CommandPool) -> Result<Self::CommandBuffer, NriError>;

	fn default_command_pool(&self) -> &Self::CommandPool;

	fn create_program_builder(&self) -> Self::ProgramBuilder;

	/// Creates a surface and swapchain for a window of the windowing toolkit.
	///
	/// # Safety
	/// The handles must stay valid for as long as the returned window exists.
	unsafe fn create_window(
		&self,
		display_handle: RawDisplayHandle,
		window_handle: RawWindowHandle,
		info: &WindowCreateInfo,
	) -> Result<Self::Window, NriError>;

	fn create_blas(&self, info: &BlasCreateInfo<'_, Self>) -> Result<Self::Blas, NriError>;

	fn create_tlas(&self, blases: &[&Self::Blas], transforms: &[Affine3A]) -> Result<Self::Tlas, NriError>;

	fn should_flip_y(&self) -> bool;

	fn supports_ray_tracing(&self) -> bool;

	fn supports_textures(&self) -> bool;

	/// Blocks until the device is idle.
	fn synchronize(&self) -> Result<(), NriError>;
}

pub trait Buffer<N: Nri>: BindMemory<N::Allocation> {
	fn size(&self) -> u64;

	/// Offset within the bound allocation, 0 if unbound.
	fn offset(&self) -> u64;

	fn usage(&self) -> BufferUsage;

	/// The bindless handle of this buffer as a storage buffer. Created on first access, [`ResourceHandle::INVALID`]
	/// if that failed.
	fn handle(&self) -> ResourceHandle;

	/// Maps `size` bytes starting at `offset`. Requires the buffer to be bound to upload or readback memory.
	fn map(&mut self, offset: u64, size: u64) -> Result<MappedMemory<'_>, NriError>;

	fn unmap(&mut self);

	/// Records a copy of `size` bytes from `src` and a barrier making it visible. Begins `command_buffer` if needed.
	fn copy_from(
		&self,
		command_buffer: &mut N::CommandBuffer,
		src: &N::Buffer,
		src_offset: u64,
		dst_offset: u64,
		size: u64,
	) -> Result<(), NriError>;

	fn bind_as_vertex_buffer(&self, command_buffer: &mut N::CommandBuffer, binding: u32, offset: u64);

	fn bind_as_index_buffer(&self, command_buffer: &mut N::CommandBuffer, offset: u64, index_type: IndexType);

	fn device_address(&self) -> u64;
}

pub trait Image2d<N: Nri>: BindMemory<N::Allocation> {
	fn width(&self) -> u32;

	fn height(&self) -> u32;

	fn format(&self) -> Format;

	/// The layout this image was last transitioned to.
	fn layout(&self) -> ImageLayout;

	fn clear(&mut self, command_buffer: &mut N::CommandBuffer, color: Vec4) -> Result<(), NriError>;

	fn prepare_for_present(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<(), NriError>;

	fn prepare_for_storage(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<(), NriError>;

	fn prepare_for_texture(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<(), NriError>;

	/// Copies the whole image from `src`, reading rows of `row_pitch` texels starting at `src_offset`. A `row_pitch`
	/// of 0 means tightly packed.
	fn copy_from(
		&mut self,
		command_buffer: &mut N::CommandBuffer,
		src: &N::Buffer,
		src_offset: u64,
		row_pitch: u32,
	) -> Result<(), NriError>;

	fn create_render_target_view(&self) -> Result<N::ImageView, NriError>;

	fn create_texture_view(&self) -> Result<N::ImageView, NriError>;

	fn create_storage_view(&self) -> Result<N::ImageView, NriError>;
}

pub trait ImageView {
	/// The bindless handle of this view. Created on first access, [`ResourceHandle::INVALID`] if that failed or the
	/// view kind has no descriptor.
	fn handle(&self) -> ResourceHandle;
}

/// The image and view a frame renders to.
pub struct RenderTarget<'a, N: Nri> {
	pub image: &'a mut N::Image2d,
	pub view: &'a N::ImageView,
}

/// Everything needed to record commands for the current frame.
pub struct FrameContext<'a, N: Nri> {
	pub command_buffer: &'a mut N::CommandBuffer,
	pub render_target: RenderTarget<'a, N>,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct WindowCreateInfo {
	/// size used when the surface does not dictate one
	pub extent: [u32; 2],
	pub clear_color: Vec4,
	/// creates a depth buffer matching the swapchain
	pub depth: bool,
}

impl Default for WindowCreateInfo {
	fn default() -> Self {
		Self {
			extent: [800, 600],
			clear_color: Vec4::new(0.0, 0.0, 0.0, 1.0),
			depth: false,
		}
	}
}

/// A presentable surface driven by the single-frame-in-flight protocol
/// `begin_frame` → record → `end_frame`.
pub trait Window<N: Nri> {
	/// Waits for the previous frame, acquires the next swapchain image and prepares it for rendering.
	fn begin_frame(&mut self) -> Result<(), NriError>;

	/// Prepares the render target for presentation, submits the frame and presents it. Recreates the swapchain if it
	/// became out of date or suboptimal. Fails with [`FrameError::NotBegun`](crate::frame::FrameError::NotBegun) if
	/// no frame was begun.
	fn end_frame(&mut self) -> Result<(), NriError>;

	/// The command buffer and render target of the frame being recorded.
	fn current_frame(&mut self) -> Result<FrameContext<'_, N>, NriError>;

	/// Begins rendering to the current render target, clearing it to [`Self::clear_color`].
	fn begin_rendering(&mut self) -> Result<(), NriError>;

	fn end_rendering(&mut self) -> Result<(), NriError>;

	fn main_queue(&mut self) -> &mut N::CommandQueue;

	fn clear_color(&self) -> Vec4;

	fn set_clear_color(&mut self, color: Vec4);

	/// Tells the window about a new size, used the next time the swapchain is recreated.
	fn resize(&mut self, extent: [u32; 2]);
}

pub struct BlasCreateInfo<'a, N: Nri> {
	pub vertex_buffer: &'a N::Buffer,
	pub vertex_format: Format,
	pub vertex_offset: u64,
	pub vertex_count: u32,
	pub vertex_stride: u64,
	pub index_buffer: &'a N::Buffer,
	pub index_type: IndexType,
	pub index_offset: u64,
}

pub trait Blas<N: Nri> {
	fn build(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<(), NriError>;

	/// Releases build-time scratch memory once the build has executed.
	fn build_finished(&mut self) {}
}

pub trait Tlas<N: Nri> {
	fn build(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<(), NriError>;

	fn build_finished(&mut self) {}

	fn handle(&self) -> ResourceHandle;
}
