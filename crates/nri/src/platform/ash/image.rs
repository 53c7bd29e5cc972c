use crate::barrier::{ImageLayout, ImageLayoutState, Transition};
use crate::command::CommandBuffer;
use crate::error::NriError;
use crate::format::{Format, ImageUsage};
use crate::handle::ResourceHandle;
use crate::memory::{Allocation, BindMemory, MemoryRequirements, MemoryTypeRequest};
use crate::owned::OwnedOrBorrowed;
use crate::platform::ash::buffer::AshBuffer;
use crate::platform::ash::command::AshCommandBuffer;
use crate::platform::ash::memory::AshAllocation;
use crate::platform::ash::nri::{AshContext, AshNri};
use crate::platform::ash::raii::{ImageGuard, ImageViewGuard, SamplerGuard};
use crate::platform::{Buffer, Image2d, ImageView};
use ash::vk::{
	BufferImageCopy, ClearColorValue, ClearDepthStencilValue, ComponentMapping, DependencyFlags, Extent3D, Filter,
	ImageCreateInfo, ImageSubresourceLayers, ImageTiling, ImageType, ImageViewCreateInfo, ImageViewType, Offset3D,
	SampleCountFlags, SamplerAddressMode, SamplerCreateInfo, SamplerMipmapMode, SharingMode,
};
use glam::Vec4;
use once_cell::unsync::OnceCell;
use std::rc::Rc;

pub struct AshImage2d {
	ctx: Rc<AshContext>,
	image: OwnedOrBorrowed<ImageGuard, ash::vk::Image>,
	width: u32,
	height: u32,
	format: Format,
	usage: ImageUsage,
	layout: ImageLayoutState,
	binding: Option<(AshAllocation, u64)>,
}

impl AshImage2d {
	pub fn new(
		ctx: &Rc<AshContext>,
		width: u32,
		height: u32,
		format: Format,
		usage: ImageUsage,
	) -> Result<Self, NriError> {
		unsafe {
			let device = &ctx.device;
			let image = device.device.create_image(
				&ImageCreateInfo::default()
					.image_type(ImageType::TYPE_2D)
					.format(format.to_ash_format())
					.extent(Extent3D {
						width,
						height,
						depth: 1,
					})
					.mip_levels(1)
					.array_layers(1)
					.samples(SampleCountFlags::TYPE_1)
					.tiling(ImageTiling::OPTIMAL)
					.usage(usage.to_ash_image_usage_flags())
					.sharing_mode(SharingMode::EXCLUSIVE)
					.initial_layout(ash::vk::ImageLayout::UNDEFINED),
				None,
			)?;
			Ok(Self {
				ctx: ctx.clone(),
				image: OwnedOrBorrowed::Owned(ImageGuard::new(device, image)),
				width,
				height,
				format,
				usage,
				layout: ImageLayoutState::default(),
				binding: None,
			})
		}
	}

	/// Wraps an image owned by a swapchain. It is never destroyed through this wrapper and cannot be bound.
	pub fn from_swapchain(ctx: &Rc<AshContext>, image: ash::vk::Image, width: u32, height: u32, format: Format) -> Self {
		Self {
			ctx: ctx.clone(),
			image: OwnedOrBorrowed::Borrowed(image),
			width,
			height,
			format,
			usage: ImageUsage::COLOR_ATTACHMENT | ImageUsage::TRANSFER_DST,
			layout: ImageLayoutState::default(),
			binding: None,
		}
	}

	pub fn handle_ash(&self) -> ash::vk::Image {
		self.image.get()
	}

	pub fn usage(&self) -> ImageUsage {
		self.usage
	}

	/// Records the barrier of `transition`, beginning `command_buffer` if needed.
	pub fn transition(&mut self, command_buffer: &mut AshCommandBuffer, transition: Transition) -> Result<(), NriError> {
		command_buffer.begin()?;
		let barrier = self.layout.transition(transition);
		unsafe {
			command_buffer.device().cmd_pipeline_barrier(
				command_buffer.handle(),
				barrier.src_stage,
				barrier.dst_stage,
				DependencyFlags::empty(),
				&[],
				&[],
				&[barrier.to_ash_image_barrier(self.image.get(), self.format)],
			);
		}
		Ok(())
	}

	fn create_view(&self, kind: AshImageViewKind) -> Result<AshImageView, NriError> {
		// swapchain images come with their memory
		if self.image.is_owned() && self.binding.is_none() {
			return Err(NriError::MemoryNotBound);
		}
		AshImageView::new(&self.ctx, self.image.get(), self.format, self.usage, kind)
	}
}

impl BindMemory<AshAllocation> for AshImage2d {
	fn memory_requirements(&self) -> MemoryRequirements {
		match &self.image {
			OwnedOrBorrowed::Owned(image) => unsafe {
				let req = self.ctx.device.device.get_image_memory_requirements(**image);
				MemoryRequirements::new(req.size, req.alignment, MemoryTypeRequest::Device)
					.with_memory_type_bits(req.memory_type_bits)
			},
			OwnedOrBorrowed::Borrowed(_) => MemoryRequirements::default(),
		}
	}

	fn bind_memory(&mut self, allocation: &AshAllocation, offset: u64) -> Result<(), NriError> {
		if !self.image.is_owned() {
			return Err(NriError::NotImplemented("Binding memory to swapchain images"));
		}
		if self.binding.is_some() {
			return Err(NriError::MemoryAlreadyBound);
		}
		let size = self.memory_requirements().size;
		if offset + size > allocation.size() {
			return Err(NriError::OutOfBounds {
				offset,
				end: offset + size,
				size: allocation.size(),
			});
		}
		unsafe {
			self.ctx
				.device
				.device
				.bind_image_memory(self.image.get(), allocation.memory(), offset)?;
		}
		self.binding = Some((allocation.clone(), offset));
		Ok(())
	}
}

impl Image2d<AshNri> for AshImage2d {
	fn width(&self) -> u32 {
		self.width
	}

	fn height(&self) -> u32 {
		self.height
	}

	fn format(&self) -> Format {
		self.format
	}

	fn layout(&self) -> ImageLayout {
		self.layout.layout()
	}

	fn clear(&mut self, command_buffer: &mut AshCommandBuffer, color: Vec4) -> Result<(), NriError> {
		self.transition(command_buffer, Transition::TransferDst)?;
		let range = self.format.to_ash_full_subresource();
		unsafe {
			let device = command_buffer.device();
			if self.format.is_depth() || self.format.has_stencil() {
				device.cmd_clear_depth_stencil_image(
					command_buffer.handle(),
					self.image.get(),
					ash::vk::ImageLayout::TRANSFER_DST_OPTIMAL,
					&ClearDepthStencilValue {
						depth: color.x,
						stencil: color.y as u32,
					},
					&[range],
				);
			} else {
				device.cmd_clear_color_image(
					command_buffer.handle(),
					self.image.get(),
					ash::vk::ImageLayout::TRANSFER_DST_OPTIMAL,
					&ClearColorValue {
						float32: color.to_array(),
					},
					&[range],
				);
			}
		}
		Ok(())
	}

	fn prepare_for_present(&mut self, command_buffer: &mut AshCommandBuffer) -> Result<(), NriError> {
		self.transition(command_buffer, Transition::Present)
	}

	fn prepare_for_storage(&mut self, command_buffer: &mut AshCommandBuffer) -> Result<(), NriError> {
		self.transition(command_buffer, Transition::Storage)
	}

	fn prepare_for_texture(&mut self, command_buffer: &mut AshCommandBuffer) -> Result<(), NriError> {
		self.transition(command_buffer, Transition::Texture)
	}

	fn copy_from(
		&mut self,
		command_buffer: &mut AshCommandBuffer,
		src: &AshBuffer,
		src_offset: u64,
		row_pitch: u32,
	) -> Result<(), NriError> {
		let pitch = if row_pitch == 0 { self.width } else { row_pitch.max(self.width) };
		let texels = u64::from(pitch) * u64::from(self.height.saturating_sub(1)) + u64::from(self.width);
		let end = src_offset.saturating_add(texels * u64::from(self.format.bytes_per_pixel()));
		if end > src.size() {
			return Err(NriError::OutOfBounds {
				offset: src_offset,
				end,
				size: src.size(),
			});
		}
		self.transition(command_buffer, Transition::TransferDst)?;
		unsafe {
			command_buffer.device().cmd_copy_buffer_to_image(
				command_buffer.handle(),
				src.handle_ash(),
				self.image.get(),
				ash::vk::ImageLayout::TRANSFER_DST_OPTIMAL,
				&[BufferImageCopy {
					buffer_offset: src_offset,
					buffer_row_length: row_pitch,
					buffer_image_height: 0,
					image_subresource: ImageSubresourceLayers {
						aspect_mask: self.format.to_ash_aspect(),
						mip_level: 0,
						base_array_layer: 0,
						layer_count: 1,
					},
					image_offset: Offset3D::default(),
					image_extent: Extent3D {
						width: self.width,
						height: self.height,
						depth: 1,
					},
				}],
			);
		}
		Ok(())
	}

	fn create_render_target_view(&self) -> Result<AshImageView, NriError> {
		self.create_view(AshImageViewKind::RenderTarget)
	}

	fn create_texture_view(&self) -> Result<AshImageView, NriError> {
		self.create_view(AshImageViewKind::Texture)
	}

	fn create_storage_view(&self) -> Result<AshImageView, NriError> {
		self.create_view(AshImageViewKind::Storage)
	}
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AshImageViewKind {
	RenderTarget,
	/// sampled through a nearest, clamp to edge sampler
	Texture,
	Storage,
}

pub struct AshImageView {
	ctx: Rc<AshContext>,
	kind: AshImageViewKind,
	/// usage of the viewed image
	usage: ImageUsage,
	sampler: Option<SamplerGuard>,
	view: ImageViewGuard,
	handle: OnceCell<ResourceHandle>,
}

impl AshImageView {
	pub fn new(
		ctx: &Rc<AshContext>,
		image: ash::vk::Image,
		format: Format,
		usage: ImageUsage,
		kind: AshImageViewKind,
	) -> Result<Self, NriError> {
		unsafe {
			let device = &ctx.device;
			let view = ImageViewGuard::new(
				device,
				device.device.create_image_view(
					&ImageViewCreateInfo::default()
						.image(image)
						.view_type(ImageViewType::TYPE_2D)
						.format(format.to_ash_format())
						.components(ComponentMapping::default())
						.subresource_range(format.to_ash_full_subresource()),
					None,
				)?,
			);
			let sampler = match kind {
				AshImageViewKind::Texture => Some(SamplerGuard::new(
					device,
					device.device.create_sampler(
						&SamplerCreateInfo::default()
							.mag_filter(Filter::NEAREST)
							.min_filter(Filter::NEAREST)
							.mipmap_mode(SamplerMipmapMode::NEAREST)
							.address_mode_u(SamplerAddressMode::CLAMP_TO_EDGE)
							.address_mode_v(SamplerAddressMode::CLAMP_TO_EDGE)
							.address_mode_w(SamplerAddressMode::CLAMP_TO_EDGE)
							.max_lod(1.),
						None,
					)?,
				)),
				AshImageViewKind::RenderTarget | AshImageViewKind::Storage => None,
			};
			Ok(Self {
				ctx: ctx.clone(),
				kind,
				usage,
				sampler,
				view,
				handle: OnceCell::new(),
			})
		}
	}

	pub fn handle_ash(&self) -> ash::vk::ImageView {
		*self.view
	}

	pub fn kind(&self) -> AshImageViewKind {
		self.kind
	}

	fn create_handle(&self) -> ResourceHandle {
		let required = match self.kind {
			AshImageViewKind::Texture => ImageUsage::SAMPLED,
			AshImageViewKind::Storage => ImageUsage::STORAGE,
			AshImageViewKind::RenderTarget => ImageUsage::empty(),
		};
		if !self.usage.contains(required) {
			log::error!(
				"{:?} view of an image without {:?} usage cannot have a handle, usage is {:?}",
				self.kind,
				required,
				self.usage
			);
			return ResourceHandle::INVALID;
		}
		let mut descriptors = self.ctx.descriptors.borrow_mut();
		let result = match (self.kind, &self.sampler) {
			(AshImageViewKind::Texture, Some(sampler)) => descriptors.add_sampled_image(*self.view, **sampler),
			(AshImageViewKind::Storage, _) => descriptors.add_storage_image(*self.view),
			_ => Err(NriError::NotImplemented("Render target view handle")),
		};
		result.unwrap_or_else(|e| {
			log::error!("Failed to create image view handle: {}", e);
			ResourceHandle::INVALID
		})
	}
}

impl ImageView for AshImageView {
	fn handle(&self) -> ResourceHandle {
		*self.handle.get_or_init(|| self.create_handle())
	}
}
