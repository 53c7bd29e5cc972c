use crate::descriptor::DescriptorCounts;
use crate::factory::{Debuggers, NriCreateInfo};
use anyhow::{anyhow, Context};
use ash::ext::debug_utils;
use ash::khr::{surface, swapchain};
use ash::vk::{
	ApplicationInfo, Bool32, DebugUtilsMessageSeverityFlagsEXT, DebugUtilsMessageTypeFlagsEXT,
	DebugUtilsMessengerCallbackDataEXT, DebugUtilsMessengerCreateInfoEXT, DebugUtilsMessengerEXT, DeviceCreateInfo,
	DeviceQueueCreateInfo, InstanceCreateInfo, PhysicalDevice, PhysicalDeviceFeatures, PhysicalDeviceMemoryProperties,
	PhysicalDeviceProperties, PhysicalDeviceType, PhysicalDeviceVulkan12Features, PhysicalDeviceVulkan13Features,
	Queue, QueueFlags,
};
use ash::{Device, Entry, Instance};
use smallvec::SmallVec;
use std::borrow::Cow;
use std::ffi::{c_void, CStr, CString};

pub const LAYER_VALIDATION: &CStr = c"VK_LAYER_KHRONOS_validation";

pub const API_VERSION: u32 = ash::vk::make_api_version(0, 1, 3, 0);

pub fn required_features() -> PhysicalDeviceFeatures {
	PhysicalDeviceFeatures::default()
		.shader_storage_buffer_array_dynamic_indexing(true)
		.shader_uniform_buffer_array_dynamic_indexing(true)
		.shader_storage_image_array_dynamic_indexing(true)
		.shader_sampled_image_array_dynamic_indexing(true)
}

pub fn required_features_vk12() -> PhysicalDeviceVulkan12Features<'static> {
	PhysicalDeviceVulkan12Features::default()
		.buffer_device_address(true)
		.runtime_descriptor_array(true)
		.descriptor_indexing(true)
		.descriptor_binding_partially_bound(true)
		.shader_storage_buffer_array_non_uniform_indexing(true)
		.shader_uniform_buffer_array_non_uniform_indexing(true)
		.shader_storage_image_array_non_uniform_indexing(true)
		.shader_sampled_image_array_non_uniform_indexing(true)
}

pub fn required_features_vk13() -> PhysicalDeviceVulkan13Features<'static> {
	PhysicalDeviceVulkan13Features::default().dynamic_rendering(true)
}

/// The instance, device and single graphics queue everything else is created from. Destroyed last, as every
/// native object holds on to it.
pub struct AshDevice {
	pub entry: Entry,
	pub instance: Instance,
	pub physical_device: PhysicalDevice,
	pub properties: PhysicalDeviceProperties,
	pub memory_properties: PhysicalDeviceMemoryProperties,
	pub device: Device,
	pub queue_family_index: u32,
	pub queue: Queue,
	pub surface: Option<surface::Instance>,
	pub swapchain: Option<swapchain::Device>,
	debug: Option<(debug_utils::Instance, DebugUtilsMessengerEXT)>,
}

impl AshDevice {
	/// Device limits of each descriptor category.
	pub fn descriptor_limits(&self) -> DescriptorCounts {
		let limits = &self.properties.limits;
		DescriptorCounts {
			sampled_images: limits
				.max_per_stage_descriptor_sampled_images
				.min(limits.max_per_stage_descriptor_samplers),
			storage_images: limits.max_per_stage_descriptor_storage_images,
			uniform_buffers: limits.max_per_stage_descriptor_uniform_buffers,
			storage_buffers: limits.max_per_stage_descriptor_storage_buffers,
			// the acceleration structure extension is never enabled
			acceleration_structures: 0,
		}
	}

	pub fn device_name(&self) -> Cow<'_, str> {
		self.properties
			.device_name_as_c_str()
			.map_or(Cow::Borrowed("Unknown"), CStr::to_string_lossy)
	}
}

impl Drop for AshDevice {
	fn drop(&mut self) {
		unsafe {
			// errors are irrelevant, the device is destroyed either way
			self.device.device_wait_idle().ok();
			self.device.destroy_device(None);
			if let Some((debug_instance, messenger)) = self.debug.take() {
				debug_instance.destroy_debug_utils_messenger(messenger, None);
			}
			self.instance.destroy_instance(None);
		}
	}
}

fn device_type_priority(device_type: PhysicalDeviceType) -> u32 {
	match device_type {
		PhysicalDeviceType::DISCRETE_GPU => 1,
		PhysicalDeviceType::VIRTUAL_GPU => 2,
		PhysicalDeviceType::INTEGRATED_GPU => 3,
		PhysicalDeviceType::CPU => 4,
		_ => 5,
	}
}

/// Creates an instance and a device with a single graphics and compute queue, preferring dedicated GPUs. Surface
/// support is enabled if `create_info.bits` asks for a windowing toolkit.
pub fn ash_init(create_info: &NriCreateInfo) -> anyhow::Result<AshDevice> {
	unsafe {
		let entry = Entry::load().context("Failed to load the Vulkan library")?;

		let wants_surface = create_info.bits.wants_surface();
		let instance = {
			let mut layers = SmallVec::<[_; 1]>::new();
			let mut extensions = SmallVec::<[_; 8]>::new();
			if create_info.debug == Debuggers::Validation {
				layers.push(LAYER_VALIDATION.as_ptr());
				extensions.push(debug_utils::NAME.as_ptr());
			}
			if wants_surface {
				let display_handle = create_info
					.display_handle
					.ok_or(anyhow!("{:?} requires a display handle", create_info.bits))?;
				extensions.extend_from_slice(ash_window::enumerate_required_extensions(display_handle)?);
			}

			let app_name = CString::new(create_info.app_name.as_str())?;
			entry
				.create_instance(
					&InstanceCreateInfo::default()
						.application_info(
							&ApplicationInfo::default()
								.application_name(&app_name)
								.application_version(0)
								.engine_name(c"fxed-nri")
								.engine_version(1)
								.api_version(API_VERSION),
						)
						.enabled_extension_names(&extensions)
						.enabled_layer_names(&layers),
					None,
				)
				.context("Failed to create Vulkan instance")?
		};

		let debug = if create_info.debug == Debuggers::Validation {
			let debug_instance = debug_utils::Instance::new(&entry, &instance);
			let messenger = debug_instance.create_debug_utils_messenger(
				&DebugUtilsMessengerCreateInfoEXT::default()
					.message_severity(
						DebugUtilsMessageSeverityFlagsEXT::ERROR
							| DebugUtilsMessageSeverityFlagsEXT::WARNING
							| DebugUtilsMessageSeverityFlagsEXT::INFO,
					)
					.message_type(
						DebugUtilsMessageTypeFlagsEXT::GENERAL
							| DebugUtilsMessageTypeFlagsEXT::VALIDATION
							| DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
					)
					.pfn_user_callback(Some(default_debug_callback)),
				None,
			)?;
			Some((debug_instance, messenger))
		} else {
			None
		};

		let (physical_device, queue_family_index) = instance
			.enumerate_physical_devices()?
			.into_iter()
			.filter(|phy| instance.get_physical_device_properties(*phy).api_version >= API_VERSION)
			.filter_map(|phy| {
				instance
					.get_physical_device_queue_family_properties(phy)
					.into_iter()
					.position(|prop| prop.queue_flags.contains(QueueFlags::GRAPHICS | QueueFlags::COMPUTE))
					.map(|family| (phy, family as u32))
			})
			.min_by_key(|(phy, _)| device_type_priority(instance.get_physical_device_properties(*phy).device_type))
			.ok_or(anyhow!("No suitable physical device found"))?;
		let properties = instance.get_physical_device_properties(physical_device);
		let memory_properties = instance.get_physical_device_memory_properties(physical_device);

		let device = {
			let mut extensions = SmallVec::<[_; 1]>::new();
			if wants_surface {
				extensions.push(swapchain::NAME.as_ptr());
			}
			let features = required_features();
			let mut features_vk12 = required_features_vk12();
			let mut features_vk13 = required_features_vk13();
			instance
				.create_device(
					physical_device,
					&DeviceCreateInfo::default()
						.enabled_features(&features)
						.enabled_extension_names(&extensions)
						.push_next(&mut features_vk12)
						.push_next(&mut features_vk13)
						.queue_create_infos(&[DeviceQueueCreateInfo::default()
							.queue_family_index(queue_family_index)
							.queue_priorities(&[1.])]),
					None,
				)
				.context("Failed to create Vulkan device")?
		};
		let queue = device.get_device_queue(queue_family_index, 0);

		let surface = wants_surface.then(|| surface::Instance::new(&entry, &instance));
		let swapchain = wants_surface.then(|| swapchain::Device::new(&instance, &device));

		let ash_device = AshDevice {
			entry,
			instance,
			physical_device,
			properties,
			memory_properties,
			device,
			queue_family_index,
			queue,
			surface,
			swapchain,
			debug,
		};
		log::info!("Using device {}", ash_device.device_name());
		Ok(ash_device)
	}
}

/// All child objects created on device must have been destroyed prior to destroying device
/// https://vulkan.lunarg.com/doc/view/1.3.296.0/linux/1.3-extensions/vkspec.html#VUID-vkDestroyDevice-device-05137
const VUID_VK_DESTROY_DEVICE_DEVICE_05137: i32 = 0x4872eaa0;

const IGNORED_MSG_IDS: &[i32] = &[VUID_VK_DESTROY_DEVICE_DEVICE_05137];

unsafe extern "system" fn default_debug_callback(
	message_severity: DebugUtilsMessageSeverityFlagsEXT,
	message_type: DebugUtilsMessageTypeFlagsEXT,
	callback_data: *const DebugUtilsMessengerCallbackDataEXT<'_>,
	_p_user_data: *mut c_void,
) -> Bool32 {
	unsafe {
		let callback_data = *callback_data;
		let message_id_number = callback_data.message_id_number;
		if IGNORED_MSG_IDS.contains(&message_id_number) {
			return false.into();
		}
		let message_id_name = callback_data
			.message_id_name_as_c_str()
			.map_or(Cow::Borrowed(""), CStr::to_string_lossy);
		let message = callback_data
			.message_as_c_str()
			.map_or(Cow::Borrowed("No message"), CStr::to_string_lossy);

		let level = if message_severity.contains(DebugUtilsMessageSeverityFlagsEXT::ERROR) {
			log::Level::Error
		} else if message_severity.contains(DebugUtilsMessageSeverityFlagsEXT::WARNING) {
			log::Level::Warn
		} else if message_severity.contains(DebugUtilsMessageSeverityFlagsEXT::INFO) {
			log::Level::Info
		} else {
			log::Level::Debug
		};
		log::log!(
			target: "vulkan",
			level,
			"{message_type:?} [{message_id_name} ({message_id_number:#x})]: {message}"
		);

		false.into()
	}
}
