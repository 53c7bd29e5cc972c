use crate::descriptor::{DescriptorCategory, DescriptorCounts, DescriptorIndexAllocator};
use crate::error::NriError;
use crate::handle::ResourceHandle;
use crate::platform::ash::init::AshDevice;
use crate::platform::ash::raii::{DescriptorPoolGuard, DescriptorSetLayoutGuard};
use ash::vk::{
	DescriptorBindingFlags, DescriptorBufferInfo, DescriptorImageInfo, DescriptorPoolCreateFlags,
	DescriptorPoolCreateInfo, DescriptorPoolSize, DescriptorSet, DescriptorSetAllocateInfo, DescriptorSetLayout,
	DescriptorSetLayoutBinding, DescriptorSetLayoutBindingFlagsCreateInfo, DescriptorSetLayoutCreateInfo,
	DescriptorType, ImageLayout, ShaderStageFlags, WriteDescriptorSet, WHOLE_SIZE,
};
use smallvec::SmallVec;
use std::rc::Rc;

impl DescriptorCategory {
	pub fn to_ash_descriptor_type(&self) -> DescriptorType {
		match self {
			DescriptorCategory::SampledImage => DescriptorType::COMBINED_IMAGE_SAMPLER,
			DescriptorCategory::StorageImage => DescriptorType::STORAGE_IMAGE,
			DescriptorCategory::UniformBuffer => DescriptorType::UNIFORM_BUFFER,
			DescriptorCategory::StorageBuffer => DescriptorType::STORAGE_BUFFER,
			DescriptorCategory::AccelerationStructure => DescriptorType::ACCELERATION_STRUCTURE_KHR,
		}
	}
}

/// The categories and counts the bindless set is laid out with. Categories without any descriptors are left out.
pub fn bindless_bindings(counts: DescriptorCounts) -> SmallVec<[DescriptorSetLayoutBinding<'static>; 5]> {
	DescriptorCategory::ALL
		.iter()
		.filter(|category| counts.get(**category) > 0)
		.map(|category| {
			DescriptorSetLayoutBinding::default()
				.binding(category.binding())
				.descriptor_type(category.to_ash_descriptor_type())
				.descriptor_count(counts.get(*category))
				.stage_flags(ShaderStageFlags::ALL)
		})
		.collect()
}

/// The single bindless descriptor set every program binds at set 0.
pub struct AshDescriptorTable {
	indices: DescriptorIndexAllocator,
	device: Rc<AshDevice>,
	set: DescriptorSet,
	// destroying the pool frees the set
	_pool: DescriptorPoolGuard,
	layout: DescriptorSetLayoutGuard,
}

impl AshDescriptorTable {
	/// Creates the table with `requested` descriptors per category, clamped to what the device supports.
	pub fn new(device: &Rc<AshDevice>, requested: DescriptorCounts) -> Result<Self, NriError> {
		let counts = requested.min(device.descriptor_limits());
		if counts != requested {
			log::warn!("Descriptor counts {:?} clamped to device limits {:?}", requested, counts);
		}

		unsafe {
			let bindings = bindless_bindings(counts);
			let binding_flags = bindings
				.iter()
				.map(|_| DescriptorBindingFlags::PARTIALLY_BOUND)
				.collect::<SmallVec<[_; 5]>>();
			let layout = DescriptorSetLayoutGuard::new(
				device,
				device.device.create_descriptor_set_layout(
					&DescriptorSetLayoutCreateInfo::default()
						.bindings(&bindings)
						.push_next(&mut DescriptorSetLayoutBindingFlagsCreateInfo::default().binding_flags(&binding_flags)),
					None,
				)?,
			);

			let pool_sizes = bindings
				.iter()
				.map(|binding| DescriptorPoolSize {
					ty: binding.descriptor_type,
					descriptor_count: binding.descriptor_count,
				})
				.collect::<SmallVec<[_; 5]>>();
			let pool = DescriptorPoolGuard::new(
				device,
				device.device.create_descriptor_pool(
					&DescriptorPoolCreateInfo::default()
						.flags(DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
						.pool_sizes(&pool_sizes)
						.max_sets(1),
					None,
				)?,
			);

			let set = device.device.allocate_descriptor_sets(
				&DescriptorSetAllocateInfo::default()
					.descriptor_pool(*pool)
					.set_layouts(&[*layout]),
			)?[0];

			Ok(Self {
				indices: DescriptorIndexAllocator::new(counts),
				device: device.clone(),
				set,
				_pool: pool,
				layout,
			})
		}
	}

	pub fn layout(&self) -> DescriptorSetLayout {
		*self.layout
	}

	pub fn set(&self) -> DescriptorSet {
		self.set
	}

	pub fn counts(&self) -> DescriptorCounts {
		self.indices.capacity()
	}

	pub fn allocated(&self, category: DescriptorCategory) -> u32 {
		self.indices.allocated(category)
	}

	fn write<'a>(
		&mut self,
		category: DescriptorCategory,
		write: impl FnOnce(WriteDescriptorSet<'a>) -> WriteDescriptorSet<'a>,
	) -> Result<ResourceHandle, NriError> {
		let handle = self.indices.allocate(category)?;
		let base = WriteDescriptorSet::default()
			.dst_set(self.set)
			.dst_binding(category.binding())
			.dst_array_element(handle.index())
			.descriptor_type(category.to_ash_descriptor_type());
		unsafe {
			self.device.device.update_descriptor_sets(&[write(base)], &[]);
		}
		log::info!("Added {} descriptor at index {}", category.name(), handle.index());
		Ok(handle)
	}

	fn write_buffer(&mut self, category: DescriptorCategory, buffer: ash::vk::Buffer) -> Result<ResourceHandle, NriError> {
		let info = [DescriptorBufferInfo {
			buffer,
			offset: 0,
			range: WHOLE_SIZE,
		}];
		self.write(category, |w| w.buffer_info(&info))
	}

	pub fn add_storage_buffer(&mut self, buffer: ash::vk::Buffer) -> Result<ResourceHandle, NriError> {
		self.write_buffer(DescriptorCategory::StorageBuffer, buffer)
	}

	pub fn add_uniform_buffer(&mut self, buffer: ash::vk::Buffer) -> Result<ResourceHandle, NriError> {
		self.write_buffer(DescriptorCategory::UniformBuffer, buffer)
	}

	pub fn add_sampled_image(
		&mut self,
		view: ash::vk::ImageView,
		sampler: ash::vk::Sampler,
	) -> Result<ResourceHandle, NriError> {
		let info = [DescriptorImageInfo {
			sampler,
			image_view: view,
			image_layout: ImageLayout::SHADER_READ_ONLY_OPTIMAL,
		}];
		self.write(DescriptorCategory::SampledImage, |w| w.image_info(&info))
	}

	pub fn add_storage_image(&mut self, view: ash::vk::ImageView) -> Result<ResourceHandle, NriError> {
		let info = [DescriptorImageInfo {
			sampler: ash::vk::Sampler::null(),
			image_view: view,
			image_layout: ImageLayout::GENERAL,
		}];
		self.write(DescriptorCategory::StorageImage, |w| w.image_info(&info))
	}

	pub fn free(&mut self, handle: ResourceHandle) -> Result<(), NriError> {
		Ok(self.indices.free(handle)?)
	}
}
