use crate::error::NriError;
use crate::memory::{Allocation, MemoryRequirements, MemoryTypeRequest};
use crate::platform::ash::init::AshDevice;
use crate::platform::ash::raii::DeviceMemoryGuard;
use ash::vk::{
	MemoryAllocateFlags, MemoryAllocateFlagsInfo, MemoryAllocateInfo, MemoryMapFlags, MemoryPropertyFlags,
	PhysicalDeviceMemoryProperties, WHOLE_SIZE,
};
use std::cell::Cell;
use std::ptr::NonNull;
use std::rc::Rc;

impl MemoryTypeRequest {
	pub fn to_ash_memory_property_flags(&self) -> MemoryPropertyFlags {
		match self {
			MemoryTypeRequest::Upload | MemoryTypeRequest::Readback => {
				MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT
			}
			MemoryTypeRequest::Device => MemoryPropertyFlags::DEVICE_LOCAL,
		}
	}
}

/// The index of the first memory type allowed by `memory_type_bits` that has all the properties `request` needs.
pub fn find_memory_type(
	properties: &PhysicalDeviceMemoryProperties,
	memory_type_bits: u32,
	request: MemoryTypeRequest,
) -> Option<u32> {
	let flags = request.to_ash_memory_property_flags();
	properties.memory_types[..properties.memory_type_count as usize]
		.iter()
		.enumerate()
		.find(|(i, ty)| memory_type_bits & (1 << i) != 0 && ty.property_flags.contains(flags))
		.map(|(i, _)| i as u32)
}

struct AshAllocationInner {
	memory: DeviceMemoryGuard,
	size: u64,
	type_request: MemoryTypeRequest,
	mapped: Cell<Option<NonNull<u8>>>,
}

/// A dedicated block of device memory. Cheap to clone, the memory is freed once the last clone and the last
/// resource bound to it are gone.
#[derive(Clone)]
pub struct AshAllocation {
	inner: Rc<AshAllocationInner>,
}

impl AshAllocation {
	pub fn new(device: &Rc<AshDevice>, requirements: MemoryRequirements) -> Result<Self, NriError> {
		let memory_type_index = find_memory_type(
			&device.memory_properties,
			requirements.memory_type_bits,
			requirements.type_request,
		)
		.ok_or(NriError::NoSuitableMemoryType)?;

		unsafe {
			let mut flags_info = MemoryAllocateFlagsInfo::default().flags(MemoryAllocateFlags::DEVICE_ADDRESS);
			let memory = device.device.allocate_memory(
				&MemoryAllocateInfo::default()
					// zero sized allocations are invalid
					.allocation_size(requirements.size.max(1))
					.memory_type_index(memory_type_index)
					.push_next(&mut flags_info),
				None,
			)?;
			Ok(Self {
				inner: Rc::new(AshAllocationInner {
					memory: DeviceMemoryGuard::new(device, memory),
					size: requirements.size,
					type_request: requirements.type_request,
					mapped: Cell::new(None),
				}),
			})
		}
	}

	pub fn memory(&self) -> ash::vk::DeviceMemory {
		*self.inner.memory
	}

	/// Pointer to the start of the whole block, mapped on first use and kept mapped until the memory is freed.
	pub fn mapped_ptr(&self) -> Result<NonNull<u8>, NriError> {
		if let Some(ptr) = self.inner.mapped.get() {
			return Ok(ptr);
		}
		if !self.inner.type_request.is_host_visible() {
			return Err(NriError::NotImplemented("Mapping device local memory"));
		}
		unsafe {
			let device = &self.inner.memory.device().device;
			let ptr = device.map_memory(self.memory(), 0, WHOLE_SIZE, MemoryMapFlags::empty())?;
			let ptr = NonNull::new(ptr.cast::<u8>()).ok_or(NriError::Vk(ash::vk::Result::ERROR_MEMORY_MAP_FAILED))?;
			self.inner.mapped.set(Some(ptr));
			Ok(ptr)
		}
	}
}

impl Allocation for AshAllocation {
	fn size(&self) -> u64 {
		self.inner.size
	}

	fn type_request(&self) -> MemoryTypeRequest {
		self.inner.type_request
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use ash::vk::MemoryType;

	fn properties(types: &[MemoryPropertyFlags]) -> PhysicalDeviceMemoryProperties {
		let mut props = PhysicalDeviceMemoryProperties {
			memory_type_count: types.len() as u32,
			..Default::default()
		};
		for (i, flags) in types.iter().enumerate() {
			props.memory_types[i] = MemoryType {
				property_flags: *flags,
				heap_index: 0,
			};
		}
		props
	}

	#[test]
	fn test_find_memory_type() {
		let props = properties(&[
			MemoryPropertyFlags::DEVICE_LOCAL,
			MemoryPropertyFlags::HOST_VISIBLE,
			MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT,
			MemoryPropertyFlags::DEVICE_LOCAL | MemoryPropertyFlags::HOST_VISIBLE | MemoryPropertyFlags::HOST_COHERENT,
		]);
		assert_eq!(find_memory_type(&props, !0, MemoryTypeRequest::Device), Some(0));
		assert_eq!(find_memory_type(&props, !0, MemoryTypeRequest::Upload), Some(2));
		assert_eq!(find_memory_type(&props, !0, MemoryTypeRequest::Readback), Some(2));
		// type 2 not allowed by the resource
		assert_eq!(find_memory_type(&props, 0b1011, MemoryTypeRequest::Upload), Some(3));
		assert_eq!(find_memory_type(&props, 0b0010, MemoryTypeRequest::Upload), None);
	}

	#[test]
	fn test_ignores_types_past_count() {
		let mut props = properties(&[MemoryPropertyFlags::HOST_VISIBLE]);
		props.memory_types[1].property_flags = MemoryPropertyFlags::DEVICE_LOCAL;
		assert_eq!(find_memory_type(&props, !0, MemoryTypeRequest::Device), None);
	}
}
