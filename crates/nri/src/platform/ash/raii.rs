//! Owning wrappers of native objects. Each guard keeps the [`AshDevice`] alive and destroys its object on drop.

use crate::platform::ash::init::AshDevice;
use ash::vk;
use std::fmt::{Debug, Formatter};
use std::ops::Deref;
use std::rc::Rc;

macro_rules! vk_guard {
	($name:ident, $ty:ty, $destroy:ident) => {
		pub struct $name {
			device: Rc<AshDevice>,
			handle: $ty,
		}

		impl $name {
			/// # Safety
			/// `handle` must have been created from `device` and must not be destroyed by anyone else.
			pub unsafe fn new(device: &Rc<AshDevice>, handle: $ty) -> Self {
				Self {
					device: device.clone(),
					handle,
				}
			}

			pub fn device(&self) -> &Rc<AshDevice> {
				&self.device
			}
		}

		impl Deref for $name {
			type Target = $ty;

			fn deref(&self) -> &Self::Target {
				&self.handle
			}
		}

		impl Debug for $name {
			fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
				f.debug_tuple(stringify!($name)).field(&self.handle).finish()
			}
		}

		impl Drop for $name {
			fn drop(&mut self) {
				unsafe {
					self.device.device.$destroy(self.handle, None);
				}
			}
		}
	};
}

vk_guard!(BufferGuard, vk::Buffer, destroy_buffer);
vk_guard!(ImageGuard, vk::Image, destroy_image);
vk_guard!(ImageViewGuard, vk::ImageView, destroy_image_view);
vk_guard!(SamplerGuard, vk::Sampler, destroy_sampler);
vk_guard!(DeviceMemoryGuard, vk::DeviceMemory, free_memory);
vk_guard!(CommandPoolGuard, vk::CommandPool, destroy_command_pool);
vk_guard!(SemaphoreGuard, vk::Semaphore, destroy_semaphore);
vk_guard!(FenceGuard, vk::Fence, destroy_fence);
vk_guard!(ShaderModuleGuard, vk::ShaderModule, destroy_shader_module);
vk_guard!(PipelineGuard, vk::Pipeline, destroy_pipeline);
vk_guard!(PipelineLayoutGuard, vk::PipelineLayout, destroy_pipeline_layout);
vk_guard!(DescriptorPoolGuard, vk::DescriptorPool, destroy_descriptor_pool);
vk_guard!(DescriptorSetLayoutGuard, vk::DescriptorSetLayout, destroy_descriptor_set_layout);

pub struct SurfaceGuard {
	device: Rc<AshDevice>,
	handle: vk::SurfaceKHR,
}

impl SurfaceGuard {
	/// # Safety
	/// `handle` must have been created from the instance of `device`, which must have surface support.
	pub unsafe fn new(device: &Rc<AshDevice>, handle: vk::SurfaceKHR) -> Self {
		Self {
			device: device.clone(),
			handle,
		}
	}
}

impl Deref for SurfaceGuard {
	type Target = vk::SurfaceKHR;

	fn deref(&self) -> &Self::Target {
		&self.handle
	}
}

impl Drop for SurfaceGuard {
	fn drop(&mut self) {
		if let Some(surface) = &self.device.surface {
			unsafe { surface.destroy_surface(self.handle, None) }
		}
	}
}

pub struct SwapchainGuard {
	device: Rc<AshDevice>,
	handle: vk::SwapchainKHR,
}

impl SwapchainGuard {
	/// # Safety
	/// `handle` must have been created from `device`, which must have swapchain support.
	pub unsafe fn new(device: &Rc<AshDevice>, handle: vk::SwapchainKHR) -> Self {
		Self {
			device: device.clone(),
			handle,
		}
	}
}

impl Deref for SwapchainGuard {
	type Target = vk::SwapchainKHR;

	fn deref(&self) -> &Self::Target {
		&self.handle
	}
}

impl Drop for SwapchainGuard {
	fn drop(&mut self) {
		if let Some(swapchain) = &self.device.swapchain {
			unsafe { swapchain.destroy_swapchain(self.handle, None) }
		}
	}
}
