//! Memory requirements, allocations and packing of multiple resources into a single allocation.

use crate::error::NriError;
use bytemuck::Pod;
use presser::Slab;
use smallvec::SmallVec;
use std::marker::PhantomData;
use std::mem::{size_of, size_of_val};

/// Which kind of memory an allocation should come from.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum MemoryTypeRequest {
	/// Host visible and coherent, for CPU to GPU transfers.
	Upload = 0,
	/// Host visible and coherent, for GPU to CPU transfers.
	Readback = 1,
	/// Device local, not mappable.
	#[default]
	Device = 2,
}

impl MemoryTypeRequest {
	pub fn is_host_visible(&self) -> bool {
		matches!(self, MemoryTypeRequest::Upload | MemoryTypeRequest::Readback)
	}
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct MemoryRequirements {
	pub size: u64,
	pub alignment: u64,
	pub type_request: MemoryTypeRequest,
	/// Bit `i` is set if native memory type `i` may back the resource.
	pub memory_type_bits: u32,
}

impl MemoryRequirements {
	pub const fn new(size: u64, alignment: u64, type_request: MemoryTypeRequest) -> Self {
		Self {
			size,
			alignment,
			type_request,
			memory_type_bits: !0,
		}
	}

	pub const fn with_memory_type_bits(self, memory_type_bits: u32) -> Self {
		Self {
			memory_type_bits,
			..self
		}
	}

	pub const fn with_type_request(self, type_request: MemoryTypeRequest) -> Self {
		Self { type_request, ..self }
	}
}

/// One block of memory that any number of buffers and images may be bound into at distinct offsets.
pub trait Allocation {
	fn size(&self) -> u64;
	fn type_request(&self) -> MemoryTypeRequest;
}

/// Something that can hand out [`Allocation`]s.
pub trait MemoryAllocator {
	type Allocation: Allocation;

	fn allocate_memory(&self, requirements: MemoryRequirements) -> Result<Self::Allocation, NriError>;
}

/// A resource that is created without memory and must be bound to an [`Allocation`] before use.
pub trait BindMemory<A> {
	fn memory_requirements(&self) -> MemoryRequirements;

	/// Binds this resource to `allocation` at byte `offset`. The resource keeps `allocation` alive from here on.
	fn bind_memory(&mut self, allocation: &A, offset: u64) -> Result<(), NriError>;
}

/// Rounds `value` up to the next multiple of `alignment`. An alignment of 0 or 1 leaves `value` unchanged.
pub const fn align_up(value: u64, alignment: u64) -> u64 {
	if alignment <= 1 {
		value
	} else {
		value.div_ceil(alignment) * alignment
	}
}

/// The result of packing resources into one allocation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PackedLayout {
	/// Byte offset of each resource, in input order.
	pub offsets: SmallVec<[u64; 4]>,
	/// Requirements of the combined allocation. `alignment` is always 0, the allocation itself starts at the
	/// beginning of a dedicated memory block.
	pub requirements: MemoryRequirements,
}

impl Default for MemoryRequirements {
	fn default() -> Self {
		Self::new(0, 0, MemoryTypeRequest::Device)
	}
}

/// Places each requirement at the smallest offset past the previous one that satisfies its alignment.
/// The memory types the combined allocation may use are the ones every input allows.
pub fn compute_offsets(requirements: impl IntoIterator<Item = MemoryRequirements>) -> PackedLayout {
	let mut total = 0;
	let mut memory_type_bits = !0;
	let offsets = requirements
		.into_iter()
		.map(|req| {
			let offset = align_up(total, req.alignment);
			total = offset + req.size;
			memory_type_bits &= req.memory_type_bits;
			offset
		})
		.collect();
	PackedLayout {
		offsets,
		requirements: MemoryRequirements::new(total, 0, MemoryTypeRequest::Device).with_memory_type_bits(memory_type_bits),
	}
}

/// [`compute_offsets`] for the requirements of `resources`.
pub fn resource_offsets<A>(resources: &[&mut dyn BindMemory<A>]) -> PackedLayout {
	compute_offsets(resources.iter().map(|r| r.memory_requirements()))
}

/// Allocates one block of `type_request` memory large enough for all `resources` and binds each of them at its
/// packed offset. Returns the allocation, which every bound resource keeps alive.
pub fn allocate_and_bind<M: MemoryAllocator>(
	allocator: &M,
	resources: &mut [&mut dyn BindMemory<M::Allocation>],
	type_request: MemoryTypeRequest,
) -> Result<M::Allocation, NriError> {
	profiling::scope!("allocate_and_bind");
	let layout = resource_offsets(resources);
	let allocation = allocator.allocate_memory(layout.requirements.with_type_request(type_request))?;
	for (resource, offset) in resources.iter_mut().zip(layout.offsets.iter().copied()) {
		resource.bind_memory(&allocation, offset)?;
	}
	Ok(allocation)
}

/// A host visible range of a buffer. Writes go through [`presser`], which checks bounds and alignment.
pub struct MappedMemory<'a> {
	ptr: *mut u8,
	len: usize,
	_phantom: PhantomData<&'a mut [u8]>,
}

impl<'a> MappedMemory<'a> {
	/// # Safety
	/// `ptr` must point to `len` bytes of host visible memory that stay mapped and are not accessed by anyone else
	/// for `'a`.
	pub unsafe fn new(ptr: *mut u8, len: usize) -> Self {
		Self {
			ptr,
			len,
			_phantom: PhantomData,
		}
	}

	pub fn len(&self) -> usize {
		self.len
	}

	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Copies `data` to byte `offset` of the mapped range.
	pub fn write<T: Pod>(&mut self, offset: usize, data: &[T]) -> Result<(), NriError> {
		presser::copy_from_slice_to_offset(data, self, offset).map_err(|_| NriError::OutOfBounds {
			offset: offset as u64,
			end: offset.saturating_add(size_of_val(data)) as u64,
			size: self.len as u64,
		})?;
		Ok(())
	}

	/// The mapped bytes. Any GPU work writing to this memory must have completed.
	pub fn as_bytes(&self) -> &[u8] {
		// SAFETY: see Self::new
		unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
	}

	/// Reads the mapped range as a sequence of `T`, ignoring trailing bytes.
	pub fn read<T: Pod>(&self) -> Vec<T> {
		let bytes = self.as_bytes();
		let len = bytes.len() - bytes.len() % size_of::<T>();
		bytemuck::pod_collect_to_vec(&bytes[..len])
	}

	/// Ends the mapping. Dropping has the same effect.
	pub fn unmap(self) {}
}

unsafe impl Slab for MappedMemory<'_> {
	fn base_ptr(&self) -> *const u8 {
		self.ptr
	}

	fn base_ptr_mut(&mut self) -> *mut u8 {
		self.ptr
	}

	fn size(&self) -> usize {
		self.len
	}
}
