use crate::command::CommandBuffer;
use crate::error::NriError;
use crate::format::{BufferUsage, IndexType};
use crate::handle::ResourceHandle;
use crate::memory::{Allocation, BindMemory, MappedMemory, MemoryRequirements, MemoryTypeRequest};
use crate::platform::ash::command::AshCommandBuffer;
use crate::platform::ash::memory::AshAllocation;
use crate::platform::ash::nri::{AshContext, AshNri};
use crate::platform::ash::raii::BufferGuard;
use crate::platform::Buffer;
use ash::vk::{
	AccessFlags, BufferCopy, BufferCreateInfo, BufferDeviceAddressInfo, BufferMemoryBarrier, DependencyFlags,
	PipelineStageFlags, SharingMode, QUEUE_FAMILY_IGNORED,
};
use once_cell::unsync::OnceCell;
use std::rc::Rc;

pub struct AshBuffer {
	ctx: Rc<AshContext>,
	buffer: BufferGuard,
	size: u64,
	usage: BufferUsage,
	requirements: MemoryRequirements,
	/// allocation and offset within it
	binding: Option<(AshAllocation, u64)>,
	handle: OnceCell<ResourceHandle>,
}

impl AshBuffer {
	pub fn new(ctx: &Rc<AshContext>, size: u64, usage: BufferUsage) -> Result<Self, NriError> {
		unsafe {
			let device = &ctx.device;
			let buffer = BufferGuard::new(
				device,
				device.device.create_buffer(
					&BufferCreateInfo::default()
						.size(size)
						.usage(usage.to_ash_buffer_usage_flags())
						.sharing_mode(SharingMode::EXCLUSIVE),
					None,
				)?,
			);
			let req = device.device.get_buffer_memory_requirements(*buffer);
			Ok(Self {
				ctx: ctx.clone(),
				buffer,
				size,
				usage,
				requirements: MemoryRequirements::new(req.size, req.alignment, MemoryTypeRequest::Device)
					.with_memory_type_bits(req.memory_type_bits),
				binding: None,
				handle: OnceCell::new(),
			})
		}
	}

	pub fn handle_ash(&self) -> ash::vk::Buffer {
		*self.buffer
	}

	pub fn is_bound(&self) -> bool {
		self.binding.is_some()
	}

	fn check_range(&self, offset: u64, size: u64) -> Result<(), NriError> {
		match offset.checked_add(size) {
			Some(end) if end <= self.size => Ok(()),
			_ => Err(NriError::OutOfBounds {
				offset,
				end: offset.saturating_add(size),
				size: self.size,
			}),
		}
	}

	fn create_handle(&self) -> ResourceHandle {
		if !self.usage.contains(BufferUsage::STORAGE) {
			log::error!("Buffer without STORAGE usage cannot have a handle, usage is {:?}", self.usage);
			return ResourceHandle::INVALID;
		}
		match self.ctx.descriptors.borrow_mut().add_storage_buffer(*self.buffer) {
			Ok(handle) => handle,
			Err(e) => {
				log::error!("Failed to create buffer handle: {}", e);
				ResourceHandle::INVALID
			}
		}
	}
}

impl BindMemory<AshAllocation> for AshBuffer {
	fn memory_requirements(&self) -> MemoryRequirements {
		self.requirements
	}

	fn bind_memory(&mut self, allocation: &AshAllocation, offset: u64) -> Result<(), NriError> {
		if self.binding.is_some() {
			return Err(NriError::MemoryAlreadyBound);
		}
		if offset + self.requirements.size > allocation.size() {
			return Err(NriError::OutOfBounds {
				offset,
				end: offset + self.requirements.size,
				size: allocation.size(),
			});
		}
		unsafe {
			self.ctx
				.device
				.device
				.bind_buffer_memory(*self.buffer, allocation.memory(), offset)?;
		}
		self.binding = Some((allocation.clone(), offset));
		Ok(())
	}
}

impl Buffer<AshNri> for AshBuffer {
	fn size(&self) -> u64 {
		self.size
	}

	fn offset(&self) -> u64 {
		self.binding.as_ref().map_or(0, |(_, offset)| *offset)
	}

	fn usage(&self) -> BufferUsage {
		self.usage
	}

	fn handle(&self) -> ResourceHandle {
		// descriptors may only point at bound buffers, so the handle is created once memory is bound
		if self.binding.is_none() {
			log::error!("Buffer handle requested before memory was bound");
			return ResourceHandle::INVALID;
		}
		*self.handle.get_or_init(|| self.create_handle())
	}

	fn map(&mut self, offset: u64, size: u64) -> Result<MappedMemory<'_>, NriError> {
		self.check_range(offset, size)?;
		let (allocation, base) = self.binding.as_ref().ok_or(NriError::MemoryNotBound)?;
		let ptr = allocation.mapped_ptr()?;
		unsafe { Ok(MappedMemory::new(ptr.as_ptr().add((base + offset) as usize), size as usize)) }
	}

	fn unmap(&mut self) {
		// host coherent memory stays mapped for the lifetime of the allocation
	}

	fn copy_from(
		&self,
		command_buffer: &mut AshCommandBuffer,
		src: &AshBuffer,
		src_offset: u64,
		dst_offset: u64,
		size: u64,
	) -> Result<(), NriError> {
		src.check_range(src_offset, size)?;
		self.check_range(dst_offset, size)?;
		command_buffer.begin()?;
		unsafe {
			let device = command_buffer.device();
			device.cmd_copy_buffer(
				command_buffer.handle(),
				*src.buffer,
				*self.buffer,
				&[BufferCopy {
					src_offset,
					dst_offset,
					size,
				}],
			);
			device.cmd_pipeline_barrier(
				command_buffer.handle(),
				PipelineStageFlags::TRANSFER,
				PipelineStageFlags::ALL_COMMANDS,
				DependencyFlags::empty(),
				&[],
				&[BufferMemoryBarrier::default()
					.buffer(*self.buffer)
					.offset(dst_offset)
					.size(size)
					.src_access_mask(AccessFlags::TRANSFER_WRITE)
					.dst_access_mask(AccessFlags::MEMORY_READ)
					.src_queue_family_index(QUEUE_FAMILY_IGNORED)
					.dst_queue_family_index(QUEUE_FAMILY_IGNORED)],
				&[],
			);
		}
		Ok(())
	}

	fn bind_as_vertex_buffer(&self, command_buffer: &mut AshCommandBuffer, binding: u32, offset: u64) {
		unsafe {
			command_buffer
				.device()
				.cmd_bind_vertex_buffers(command_buffer.handle(), binding, &[*self.buffer], &[offset]);
		}
	}

	fn bind_as_index_buffer(&self, command_buffer: &mut AshCommandBuffer, offset: u64, index_type: IndexType) {
		unsafe {
			command_buffer.device().cmd_bind_index_buffer(
				command_buffer.handle(),
				*self.buffer,
				offset,
				index_type.to_ash_index_type(),
			);
		}
	}

	fn device_address(&self) -> u64 {
		if self.binding.is_none() || !self.usage.needs_device_address() {
			return 0;
		}
		unsafe {
			self.ctx
				.device
				.device
				.get_buffer_device_address(&BufferDeviceAddressInfo::default().buffer(*self.buffer))
		}
	}
}
