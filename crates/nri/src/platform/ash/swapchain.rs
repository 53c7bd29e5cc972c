use crate::barrier::Transition;
use crate::error::NriError;
use crate::format::Format;
use crate::platform::ash::command::AshCommandBuffer;
use crate::platform::ash::image::{AshImage2d, AshImageView};
use crate::platform::ash::nri::AshContext;
use crate::platform::ash::raii::{SemaphoreGuard, SwapchainGuard};
use crate::platform::Image2d;
use ash::vk::{
	ColorSpaceKHR, CompositeAlphaFlagsKHR, Extent2D, ImageUsageFlags, PresentModeKHR, SemaphoreCreateInfo,
	SharingMode, SurfaceCapabilitiesKHR, SurfaceFormatKHR, SurfaceKHR, SurfaceTransformFlagsKHR,
	SwapchainCreateInfoKHR, SwapchainKHR,
};
use std::rc::Rc;

const PREFERRED_FORMAT: SurfaceFormatKHR = SurfaceFormatKHR {
	format: ash::vk::Format::B8G8R8A8_UNORM,
	color_space: ColorSpaceKHR::SRGB_NONLINEAR,
};

/// A single `UNDEFINED` entry means the surface has no preference. Otherwise `B8G8R8A8_UNORM` with sRGB nonlinear
/// color space is preferred, falling back to the first format reported.
pub fn choose_surface_format(formats: &[SurfaceFormatKHR]) -> Option<SurfaceFormatKHR> {
	match formats {
		[] => None,
		[only] if only.format == ash::vk::Format::UNDEFINED => Some(PREFERRED_FORMAT),
		formats => formats
			.iter()
			.find(|f| f.format == PREFERRED_FORMAT.format && f.color_space == PREFERRED_FORMAT.color_space)
			.or(formats.first())
			.copied(),
	}
}

/// The surface's current extent, or `requested` clamped to the supported range if the surface lets the swapchain
/// decide.
pub fn choose_extent(capabilities: &SurfaceCapabilitiesKHR, requested: [u32; 2]) -> Extent2D {
	if capabilities.current_extent.width != u32::MAX {
		capabilities.current_extent
	} else {
		let (min, max) = (capabilities.min_image_extent, capabilities.max_image_extent);
		Extent2D {
			width: requested[0].clamp(min.width, max.width),
			height: requested[1].clamp(min.height, max.height),
		}
	}
}

/// One more than the minimum, a `max_image_count` of 0 means unlimited.
pub fn choose_image_count(capabilities: &SurfaceCapabilitiesKHR) -> u32 {
	let count = capabilities.min_image_count + 1;
	if capabilities.max_image_count > 0 {
		count.min(capabilities.max_image_count)
	} else {
		count
	}
}

pub struct AshSwapchain {
	views: Vec<AshImageView>,
	images: Vec<AshImage2d>,
	/// one per image, an image's semaphore may still be in use by the presentation engine while others are acquired
	render_finished: Vec<SemaphoreGuard>,
	format: Format,
	extent: Extent2D,
	swapchain: SwapchainGuard,
}

impl AshSwapchain {
	/// Creates a FIFO swapchain for `surface`, retiring `old` if given. The images start out `Undefined`, see
	/// [`Self::init_images`].
	pub fn new(
		ctx: &Rc<AshContext>,
		surface: SurfaceKHR,
		requested_extent: [u32; 2],
		old: Option<&AshSwapchain>,
	) -> Result<Self, NriError> {
		profiling::scope!("AshSwapchain::new");
		let device = &ctx.device;
		let surface_ext = device
			.surface
			.as_ref()
			.ok_or(NriError::Swapchain("surface support was not enabled"))?;
		let swapchain_ext = device
			.swapchain
			.as_ref()
			.ok_or(NriError::Swapchain("surface support was not enabled"))?;

		unsafe {
			if !surface_ext.get_physical_device_surface_support(
				device.physical_device,
				device.queue_family_index,
				surface,
			)? {
				return Err(NriError::Swapchain("queue family cannot present to the surface"));
			}
			let capabilities = surface_ext.get_physical_device_surface_capabilities(device.physical_device, surface)?;
			let formats = surface_ext.get_physical_device_surface_formats(device.physical_device, surface)?;

			let surface_format =
				choose_surface_format(&formats).ok_or(NriError::Swapchain("surface reports no formats"))?;
			let format =
				Format::from_ash_format(surface_format.format).ok_or(NriError::Swapchain("unsupported surface format"))?;
			let extent = choose_extent(&capabilities, requested_extent);
			if extent.width == 0 || extent.height == 0 {
				return Err(NriError::Swapchain("surface has zero size"));
			}
			let pre_transform = if capabilities
				.supported_transforms
				.contains(SurfaceTransformFlagsKHR::IDENTITY)
			{
				SurfaceTransformFlagsKHR::IDENTITY
			} else {
				capabilities.current_transform
			};

			let swapchain = SwapchainGuard::new(
				device,
				swapchain_ext.create_swapchain(
					&SwapchainCreateInfoKHR::default()
						.surface(surface)
						.min_image_count(choose_image_count(&capabilities))
						.image_format(surface_format.format)
						.image_color_space(surface_format.color_space)
						.image_extent(extent)
						.image_array_layers(1)
						.image_usage(ImageUsageFlags::COLOR_ATTACHMENT | ImageUsageFlags::TRANSFER_DST)
						.image_sharing_mode(SharingMode::EXCLUSIVE)
						.pre_transform(pre_transform)
						.composite_alpha(CompositeAlphaFlagsKHR::OPAQUE)
						.present_mode(PresentModeKHR::FIFO)
						.clipped(true)
						.old_swapchain(old.map_or(SwapchainKHR::null(), |old| *old.swapchain)),
					None,
				)?,
			);

			let images = swapchain_ext
				.get_swapchain_images(*swapchain)?
				.into_iter()
				.map(|image| AshImage2d::from_swapchain(ctx, image, extent.width, extent.height, format))
				.collect::<Vec<_>>();
			let views = images
				.iter()
				.map(|image| image.create_render_target_view())
				.collect::<Result<Vec<_>, _>>()?;
			let render_finished = images
				.iter()
				.map(|_| {
					let semaphore = device.device.create_semaphore(&SemaphoreCreateInfo::default(), None)?;
					Ok(SemaphoreGuard::new(device, semaphore))
				})
				.collect::<Result<Vec<_>, NriError>>()?;

			log::debug!(
				"Created swapchain {}x{} with {} images of {:?}",
				extent.width,
				extent.height,
				images.len(),
				format
			);
			Ok(Self {
				views,
				images,
				render_finished,
				format,
				extent,
				swapchain,
			})
		}
	}

	/// Hands every image to the presentation engine once, so each frame can start from `PresentSrc`.
	pub fn init_images(&mut self, command_buffer: &mut AshCommandBuffer) -> Result<(), NriError> {
		for image in &mut self.images {
			image.transition(command_buffer, Transition::SwapchainInit)?;
		}
		Ok(())
	}

	pub fn handle(&self) -> SwapchainKHR {
		*self.swapchain
	}

	pub fn format(&self) -> Format {
		self.format
	}

	pub fn extent(&self) -> [u32; 2] {
		[self.extent.width, self.extent.height]
	}

	pub fn image_count(&self) -> usize {
		self.images.len()
	}

	pub fn image_mut(&mut self, index: u32) -> Option<(&mut AshImage2d, &AshImageView)> {
		let index = index as usize;
		Some((self.images.get_mut(index)?, self.views.get(index)?))
	}

	pub fn render_finished(&self, index: u32) -> Option<ash::vk::Semaphore> {
		self.render_finished.get(index as usize).map(|s| **s)
	}
}
