use crate::barrier::{ImageLayout, Transition};
use crate::command::{CommandBuffer, CommandQueue};
use crate::error::NriError;
use crate::format::{Format, ImageUsage};
use crate::frame::{FrameError, FrameState, FrameTracker};
use crate::memory::{allocate_and_bind, BindMemory, MemoryTypeRequest};
use crate::platform::ash::command::{AshCommandBuffer, AshCommandPool, AshCommandQueue};
use crate::platform::ash::image::{AshImage2d, AshImageView};
use crate::platform::ash::memory::AshAllocation;
use crate::platform::ash::nri::{AshContext, AshNri};
use crate::platform::ash::raii::{FenceGuard, SemaphoreGuard, SurfaceGuard};
use crate::platform::ash::swapchain::AshSwapchain;
use crate::platform::{FrameContext, Image2d, RenderTarget, Window, WindowCreateInfo};
use ash::vk::{
	AttachmentLoadOp, AttachmentStoreOp, ClearColorValue, ClearDepthStencilValue, ClearValue, Extent2D, Fence,
	FenceCreateFlags, FenceCreateInfo, Offset2D, PipelineStageFlags, PresentInfoKHR, Rect2D,
	RenderingAttachmentInfo, RenderingInfo, SemaphoreCreateInfo, Viewport,
};
use glam::Vec4;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::rc::Rc;

/// How often acquiring is retried after recreating an out of date swapchain.
const ACQUIRE_ATTEMPTS: u32 = 3;

struct DepthBuffer {
	view: AshImageView,
	image: AshImage2d,
	_allocation: AshAllocation,
}

impl DepthBuffer {
	fn new(ctx: &Rc<AshContext>, nri: &AshNri, extent: [u32; 2]) -> Result<Self, NriError> {
		let mut image = AshImage2d::new(
			ctx,
			extent[0],
			extent[1],
			Format::D32Sfloat,
			ImageUsage::DEPTH_STENCIL_ATTACHMENT,
		)?;
		let allocation = allocate_and_bind(
			nri,
			&mut [&mut image as &mut dyn BindMemory<AshAllocation>],
			MemoryTypeRequest::Device,
		)?;
		Ok(Self {
			view: image.create_render_target_view()?,
			image,
			_allocation: allocation,
		})
	}
}

/// A window surface with a FIFO swapchain and a single frame in flight.
pub struct AshWindow {
	ctx: Rc<AshContext>,
	nri: AshNri,
	command_buffer: AshCommandBuffer,
	queue: AshCommandQueue,
	frame: FrameTracker,
	image_index: u32,
	image_available: SemaphoreGuard,
	in_flight: FenceGuard,
	depth: Option<DepthBuffer>,
	wants_depth: bool,
	extent: [u32; 2],
	resized: bool,
	clear_color: Vec4,
	// swapchain must be destroyed before its surface
	swapchain: AshSwapchain,
	surface: SurfaceGuard,
}

impl AshWindow {
	/// # Safety
	/// The handles must stay valid for as long as the returned window exists.
	pub unsafe fn new(
		nri: &AshNri,
		pool: &AshCommandPool,
		display_handle: RawDisplayHandle,
		window_handle: RawWindowHandle,
		info: &WindowCreateInfo,
	) -> Result<Self, NriError> {
		unsafe {
			let ctx = nri.ctx();
			let device = &ctx.device;
			let surface = SurfaceGuard::new(
				device,
				ash_window::create_surface(&device.entry, &device.instance, display_handle, window_handle, None)?,
			);
			let mut command_buffer = AshCommandBuffer::new(pool)?;
			let mut queue = AshCommandQueue::new(device, ctx.submission_tracking);
			let image_available = SemaphoreGuard::new(
				device,
				device.device.create_semaphore(&SemaphoreCreateInfo::default(), None)?,
			);
			let in_flight = FenceGuard::new(
				device,
				device
					.device
					.create_fence(&FenceCreateInfo::default().flags(FenceCreateFlags::SIGNALED), None)?,
			);

			let mut swapchain = AshSwapchain::new(ctx, *surface, info.extent, None)?;
			swapchain.init_images(&mut command_buffer)?;
			queue.submit_and_wait(&mut command_buffer)?;
			let depth = info
				.depth
				.then(|| DepthBuffer::new(ctx, nri, swapchain.extent()))
				.transpose()?;

			Ok(Self {
				ctx: ctx.clone(),
				nri: nri.clone(),
				command_buffer,
				queue,
				frame: FrameTracker::default(),
				image_index: 0,
				image_available,
				in_flight,
				depth,
				wants_depth: info.depth,
				extent: info.extent,
				resized: false,
				clear_color: info.clear_color,
				swapchain,
				surface,
			})
		}
	}

	pub fn frame(&self) -> &FrameTracker {
		&self.frame
	}

	pub fn extent(&self) -> [u32; 2] {
		self.swapchain.extent()
	}

	pub fn format(&self) -> Format {
		self.swapchain.format()
	}

	/// Replaces the swapchain and depth buffer. The device must be idle.
	fn recreate_swapchain(&mut self) -> Result<(), NriError> {
		profiling::scope!("recreate_swapchain");
		let mut swapchain = AshSwapchain::new(&self.ctx, *self.surface, self.extent, Some(&self.swapchain))?;
		self.command_buffer.reset()?;
		swapchain.init_images(&mut self.command_buffer)?;
		self.queue.submit_and_wait(&mut self.command_buffer)?;
		self.swapchain = swapchain;
		self.depth = None;
		if self.wants_depth {
			self.depth = Some(DepthBuffer::new(&self.ctx, &self.nri, self.swapchain.extent())?);
		}
		self.resized = false;
		Ok(())
	}

	fn wait_idle_and_recreate(&mut self) -> Result<(), NriError> {
		unsafe {
			self.ctx.device.device.device_wait_idle()?;
		}
		self.recreate_swapchain()
	}

	fn acquire(&mut self) -> Result<u32, NriError> {
		let swapchain_ext = self
			.ctx
			.device
			.swapchain
			.clone()
			.ok_or(NriError::Swapchain("surface support was not enabled"))?;
		for _ in 0..ACQUIRE_ATTEMPTS {
			let result = unsafe {
				swapchain_ext.acquire_next_image(
					self.swapchain.handle(),
					u64::MAX,
					*self.image_available,
					Fence::null(),
				)
			};
			match result {
				// suboptimal still acquired an image, it is recreated after presenting
				Ok((index, _suboptimal)) => return Ok(index),
				Err(ash::vk::Result::ERROR_OUT_OF_DATE_KHR) => {
					log::warn!("Swapchain out of date while acquiring, recreating");
					self.wait_idle_and_recreate()?;
				}
				Err(e) => return Err(e.into()),
			}
		}
		Err(FrameError::NoRenderTarget.into())
	}

	/// Records the render target transitions of the acquired image, then resets the in-flight fence. The fence is
	/// reset last so that no failure can leave it unsignaled for the next frame to wait on.
	fn start_recording(&mut self) -> Result<(), NriError> {
		self.command_buffer.reset()?;
		self.command_buffer.begin()?;
		let (image, _) = self
			.swapchain
			.image_mut(self.image_index)
			.ok_or(FrameError::NoRenderTarget)?;
		image.transition(&mut self.command_buffer, Transition::RenderTarget)?;
		if let Some(depth) = &mut self.depth {
			if depth.image.layout() != ImageLayout::DepthAttachment {
				depth.image.transition(&mut self.command_buffer, Transition::DepthAttachment)?;
			}
		}
		unsafe {
			self.ctx.device.device.reset_fences(&[*self.in_flight])?;
		}
		Ok(())
	}

	fn present(&mut self) -> Result<(), NriError> {
		let device = &self.ctx.device;
		let swapchain_ext = device
			.swapchain
			.as_ref()
			.ok_or(NriError::Swapchain("surface support was not enabled"))?;
		let wait = [self
			.swapchain
			.render_finished(self.image_index)
			.ok_or(FrameError::NoRenderTarget)?];
		let result = unsafe {
			swapchain_ext.queue_present(
				device.queue,
				&PresentInfoKHR::default()
					.wait_semaphores(&wait)
					.swapchains(&[self.swapchain.handle()])
					.image_indices(&[self.image_index]),
			)
		};
		match result {
			Ok(false) if !self.resized => Ok(()),
			Ok(false) => self.wait_idle_and_recreate(),
			Ok(true) | Err(ash::vk::Result::ERROR_OUT_OF_DATE_KHR) => {
				log::warn!("Swapchain out of date or suboptimal, recreating");
				self.wait_idle_and_recreate()
			}
			Err(ash::vk::Result::ERROR_SURFACE_LOST_KHR) => {
				log::warn!("Surface lost while presenting");
				Ok(())
			}
			Err(e) => Err(e.into()),
		}
	}
}

impl Window<AshNri> for AshWindow {
	fn begin_frame(&mut self) -> Result<(), NriError> {
		profiling::scope!("begin_frame");
		if let state @ (FrameState::Acquired | FrameState::Recording) = self.frame.state() {
			return Err(FrameError::AlreadyBegun(state).into());
		}
		unsafe {
			self.ctx
				.device
				.device
				.wait_for_fences(&[*self.in_flight], true, u64::MAX)?;
		}
		if self.resized {
			self.wait_idle_and_recreate()?;
		}
		self.image_index = self.acquire()?;
		self.frame.acquired()?;
		let started = self.start_recording();
		self.frame.start_recording(started)
	}

	fn end_frame(&mut self) -> Result<(), NriError> {
		profiling::scope!("end_frame");
		self.frame.ensure_recording()?;
		let (image, _) = self
			.swapchain
			.image_mut(self.image_index)
			.ok_or(FrameError::NoRenderTarget)?;
		image.prepare_for_present(&mut self.command_buffer)?;
		let render_finished = self
			.swapchain
			.render_finished(self.image_index)
			.ok_or(FrameError::NoRenderTarget)?;
		self.queue.submit_with(
			&mut self.command_buffer,
			&[(*self.image_available, PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT)],
			&[render_finished],
			*self.in_flight,
		)?;
		self.frame.presented()?;
		let result = self.present();
		self.frame.finish();
		result
	}

	fn current_frame(&mut self) -> Result<FrameContext<'_, AshNri>, NriError> {
		self.frame.ensure_recording()?;
		let (image, view) = self
			.swapchain
			.image_mut(self.image_index)
			.ok_or(FrameError::NoRenderTarget)?;
		Ok(FrameContext {
			command_buffer: &mut self.command_buffer,
			render_target: RenderTarget { image, view },
		})
	}

	fn begin_rendering(&mut self) -> Result<(), NriError> {
		self.frame.ensure_recording()?;
		let [width, height] = self.swapchain.extent();
		let (_, view) = self
			.swapchain
			.image_mut(self.image_index)
			.ok_or(FrameError::NoRenderTarget)?;
		let color = [RenderingAttachmentInfo::default()
			.image_view(view.handle_ash())
			.image_layout(ash::vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL)
			.load_op(AttachmentLoadOp::CLEAR)
			.store_op(AttachmentStoreOp::STORE)
			.clear_value(ClearValue {
				color: ClearColorValue {
					float32: self.clear_color.to_array(),
				},
			})];
		let depth = self.depth.as_ref().map(|depth| {
			RenderingAttachmentInfo::default()
				.image_view(depth.view.handle_ash())
				.image_layout(ash::vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL)
				.load_op(AttachmentLoadOp::CLEAR)
				.store_op(AttachmentStoreOp::DONT_CARE)
				.clear_value(ClearValue {
					depth_stencil: ClearDepthStencilValue {
						depth: 1.0,
						stencil: 0,
					},
				})
		});
		let area = Rect2D {
			offset: Offset2D { x: 0, y: 0 },
			extent: Extent2D { width, height },
		};
		let mut rendering_info = RenderingInfo::default()
			.render_area(area)
			.layer_count(1)
			.color_attachments(&color);
		if let Some(depth) = &depth {
			rendering_info = rendering_info.depth_attachment(depth);
		}

		unsafe {
			let device = self.command_buffer.device();
			let cmd = self.command_buffer.handle();
			device.cmd_begin_rendering(cmd, &rendering_info);
			device.cmd_set_viewport(
				cmd,
				0,
				&[Viewport {
					x: 0.0,
					y: 0.0,
					width: width as f32,
					height: height as f32,
					min_depth: 0.0,
					max_depth: 1.0,
				}],
			);
			device.cmd_set_scissor(cmd, 0, &[area]);
		}
		Ok(())
	}

	fn end_rendering(&mut self) -> Result<(), NriError> {
		self.frame.ensure_recording()?;
		unsafe {
			self.command_buffer
				.device()
				.cmd_end_rendering(self.command_buffer.handle());
		}
		Ok(())
	}

	fn main_queue(&mut self) -> &mut AshCommandQueue {
		&mut self.queue
	}

	fn clear_color(&self) -> Vec4 {
		self.clear_color
	}

	fn set_clear_color(&mut self, color: Vec4) {
		self.clear_color = color;
	}

	fn resize(&mut self, extent: [u32; 2]) {
		if extent != self.extent {
			self.extent = extent;
			self.resized = true;
		}
	}
}

impl Drop for AshWindow {
	fn drop(&mut self) {
		unsafe {
			// the last frame may still be executing or presenting
			self.ctx.device.device.device_wait_idle().ok();
		}
	}
}
