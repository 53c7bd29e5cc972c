use super::DescriptorCategory;

/// Capacity of each category of the bindless descriptor table.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DescriptorCounts {
	pub sampled_images: u32,
	pub storage_images: u32,
	pub uniform_buffers: u32,
	pub storage_buffers: u32,
	pub acceleration_structures: u32,
}

impl DescriptorCounts {
	pub const REASONABLE_DEFAULTS: Self = DescriptorCounts {
		sampled_images: 500,
		storage_images: 500,
		uniform_buffers: 500,
		storage_buffers: 500,
		acceleration_structures: 500,
	};

	pub const ZERO: Self = DescriptorCounts {
		sampled_images: 0,
		storage_images: 0,
		uniform_buffers: 0,
		storage_buffers: 0,
		acceleration_structures: 0,
	};

	pub fn get(&self, category: DescriptorCategory) -> u32 {
		match category {
			DescriptorCategory::SampledImage => self.sampled_images,
			DescriptorCategory::StorageImage => self.storage_images,
			DescriptorCategory::UniformBuffer => self.uniform_buffers,
			DescriptorCategory::StorageBuffer => self.storage_buffers,
			DescriptorCategory::AccelerationStructure => self.acceleration_structures,
		}
	}

	/// Sum of all categories, the size of the whole table.
	pub fn total(&self) -> u32 {
		DescriptorCategory::ALL.iter().map(|c| self.get(*c)).sum()
	}

	pub fn is_within_limit(&self, limit: Self) -> bool {
		DescriptorCategory::ALL.iter().all(|c| self.get(*c) <= limit.get(*c))
	}

	pub fn min(self, other: Self) -> Self {
		Self {
			sampled_images: self.sampled_images.min(other.sampled_images),
			storage_images: self.storage_images.min(other.storage_images),
			uniform_buffers: self.uniform_buffers.min(other.uniform_buffers),
			storage_buffers: self.storage_buffers.min(other.storage_buffers),
			acceleration_structures: self.acceleration_structures.min(other.acceleration_structures),
		}
	}
}

impl Default for DescriptorCounts {
	fn default() -> Self {
		Self::REASONABLE_DEFAULTS
	}
}
