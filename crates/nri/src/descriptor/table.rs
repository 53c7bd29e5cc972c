use crate::descriptor::DescriptorCounts;
use crate::handle::{HandleError, ResourceHandle, ResourceType};
use std::fmt::{Debug, Formatter};
use thiserror::Error;

/// A category of the bindless descriptor table. Each category has its own binding slot and index space.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum DescriptorCategory {
	SampledImage,
	StorageImage,
	UniformBuffer,
	StorageBuffer,
	/// No descriptor is ever written to this category on the Vulkan backend: its `Tlas` cannot be created and the
	/// category's capacity is 0.
	AccelerationStructure,
}

impl DescriptorCategory {
	pub const ALL: [DescriptorCategory; 5] = [
		DescriptorCategory::SampledImage,
		DescriptorCategory::StorageImage,
		DescriptorCategory::UniformBuffer,
		DescriptorCategory::StorageBuffer,
		DescriptorCategory::AccelerationStructure,
	];

	/// Binding slot within the bindless descriptor set. Shaders hardcode these.
	pub const fn binding(&self) -> u32 {
		match self {
			DescriptorCategory::SampledImage => 0,
			DescriptorCategory::StorageImage => 1,
			DescriptorCategory::UniformBuffer => 2,
			DescriptorCategory::StorageBuffer => 3,
			DescriptorCategory::AccelerationStructure => 4,
		}
	}

	pub const fn resource_type(&self) -> ResourceType {
		match self {
			DescriptorCategory::SampledImage => ResourceType::ImageSampler,
			DescriptorCategory::StorageImage => ResourceType::StorageImage,
			DescriptorCategory::UniformBuffer | DescriptorCategory::StorageBuffer => ResourceType::Buffer,
			DescriptorCategory::AccelerationStructure => ResourceType::Tlas,
		}
	}

	pub const fn writable(&self) -> bool {
		matches!(
			self,
			DescriptorCategory::StorageImage | DescriptorCategory::StorageBuffer
		)
	}

	pub const fn name(&self) -> &'static str {
		match self {
			DescriptorCategory::SampledImage => "sampler image",
			DescriptorCategory::StorageImage => "storage image",
			DescriptorCategory::UniformBuffer => "uniform buffer",
			DescriptorCategory::StorageBuffer => "storage buffer",
			DescriptorCategory::AccelerationStructure => "acceleration structure",
		}
	}

	const fn slot(&self) -> usize {
		self.binding() as usize
	}
}

#[derive(Error)]
pub enum DescriptorError {
	#[error("{} descriptor table is full, capacity {capacity}", .category.name())]
	TableFull {
		category: DescriptorCategory,
		capacity: u32,
	},
	#[error("Descriptor freeing is not implemented")]
	FreeNotImplemented,
	#[error(transparent)]
	Handle(#[from] HandleError),
}

impl Debug for DescriptorError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(self, f)
	}
}

/// Hands out descriptor indices of the bindless table. Indices of a category are assigned in order starting at 0
/// and are never reused. Not synchronized, the table is owned by a single thread.
#[derive(Debug)]
pub struct DescriptorIndexAllocator {
	capacity: DescriptorCounts,
	next: [u32; 5],
}

impl DescriptorIndexAllocator {
	pub fn new(capacity: DescriptorCounts) -> Self {
		Self {
			capacity,
			next: [0; 5],
		}
	}

	pub fn capacity(&self) -> DescriptorCounts {
		self.capacity
	}

	/// Number of indices handed out for `category` so far.
	pub fn allocated(&self, category: DescriptorCategory) -> u32 {
		self.next[category.slot()]
	}

	/// Takes the next free index of `category` and returns the handle shaders use to reach it.
	pub fn allocate(&mut self, category: DescriptorCategory) -> Result<ResourceHandle, DescriptorError> {
		let capacity = self.capacity.get(category);
		let next = &mut self.next[category.slot()];
		if *next >= capacity {
			return Err(DescriptorError::TableFull { category, capacity });
		}
		let handle = ResourceHandle::new(category.resource_type(), category.writable(), *next)?;
		*next += 1;
		Ok(handle)
	}

	/// Releasing descriptors is not supported, every index lives as long as the table.
	pub fn free(&mut self, _handle: ResourceHandle) -> Result<(), DescriptorError> {
		Err(DescriptorError::FreeNotImplemented)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_storage_buffer_indices_monotonic() {
		let mut alloc = DescriptorIndexAllocator::new(DescriptorCounts::REASONABLE_DEFAULTS);
		for i in 0..DescriptorCounts::REASONABLE_DEFAULTS.storage_buffers {
			let handle = alloc.allocate(DescriptorCategory::StorageBuffer).unwrap();
			assert_eq!(handle.index(), i);
			assert_eq!(handle.resource_type(), ResourceType::Buffer);
			assert!(handle.is_writable());
		}
		assert_eq!(alloc.allocated(DescriptorCategory::StorageBuffer), 500);
	}

	#[test]
	fn test_exceeding_capacity_fails() {
		let mut alloc = DescriptorIndexAllocator::new(DescriptorCounts {
			storage_buffers: 2,
			..DescriptorCounts::ZERO
		});
		alloc.allocate(DescriptorCategory::StorageBuffer).unwrap();
		alloc.allocate(DescriptorCategory::StorageBuffer).unwrap();
		let err = alloc.allocate(DescriptorCategory::StorageBuffer).unwrap_err();
		assert!(matches!(
			err,
			DescriptorError::TableFull {
				category: DescriptorCategory::StorageBuffer,
				capacity: 2
			}
		));
		assert_eq!(err.to_string(), "storage buffer descriptor table is full, capacity 2");
		// failed attempts do not consume indices
		assert_eq!(alloc.allocated(DescriptorCategory::StorageBuffer), 2);
		assert!(alloc.allocate(DescriptorCategory::UniformBuffer).is_err());
	}

	#[test]
	fn test_categories_are_independent() {
		let mut alloc = DescriptorIndexAllocator::new(DescriptorCounts::REASONABLE_DEFAULTS);
		let ub = alloc.allocate(DescriptorCategory::UniformBuffer).unwrap();
		let sb = alloc.allocate(DescriptorCategory::StorageBuffer).unwrap();
		let si = alloc.allocate(DescriptorCategory::SampledImage).unwrap();
		let st = alloc.allocate(DescriptorCategory::StorageImage).unwrap();
		let ub2 = alloc.allocate(DescriptorCategory::UniformBuffer).unwrap();

		assert_eq!((ub.index(), ub.is_writable()), (0, false));
		assert_eq!((sb.index(), sb.is_writable()), (0, true));
		assert_eq!(ub.resource_type(), sb.resource_type());
		assert_ne!(ub, sb);
		assert_eq!(si.resource_type(), ResourceType::ImageSampler);
		assert_eq!(st.resource_type(), ResourceType::StorageImage);
		assert_eq!(ub2.index(), 1);
	}

	#[test]
	fn test_binding_slots() {
		let bindings: Vec<_> = DescriptorCategory::ALL.iter().map(|c| c.binding()).collect();
		assert_eq!(bindings, vec![0, 1, 2, 3, 4]);
	}

	#[test]
	fn test_free_not_implemented() {
		let mut alloc = DescriptorIndexAllocator::new(DescriptorCounts::REASONABLE_DEFAULTS);
		let handle = alloc.allocate(DescriptorCategory::SampledImage).unwrap();
		assert!(matches!(alloc.free(handle), Err(DescriptorError::FreeNotImplemented)));
	}
}
