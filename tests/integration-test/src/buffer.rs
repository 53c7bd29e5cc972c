#![cfg(test)]

use crate::nri;
use approx::assert_relative_eq;
use fxed_nri::command::CommandQueue;
use fxed_nri::error::NriError;
use fxed_nri::format::BufferUsage;
use fxed_nri::handle::{ResourceHandle, ResourceType};
use fxed_nri::memory::{allocate_and_bind, Allocation, BindMemory, MemoryTypeRequest};
use fxed_nri::platform::ash::{AshAllocation, AshBuffer, AshNri};
use fxed_nri::platform::{Buffer, Nri};
use fxed_nri::upload::upload_to_buffer;

fn bind_all(
	nri: &AshNri,
	buffers: &mut [&mut AshBuffer],
	type_request: MemoryTypeRequest,
) -> anyhow::Result<AshAllocation> {
	let mut resources = buffers
		.iter_mut()
		.map(|b| &mut **b as &mut dyn BindMemory<AshAllocation>)
		.collect::<Vec<_>>();
	Ok(allocate_and_bind(nri, &mut resources, type_request)?)
}

#[test]
fn test_upload_and_readback() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let data = (0..256).map(|i| i as f32 * 0.5).collect::<Vec<f32>>();
	let bytes = bytemuck::cast_slice::<f32, u8>(&data);
	let size = bytes.len() as u64;

	let mut device_buffer = nri.create_buffer(
		size,
		BufferUsage::STORAGE | BufferUsage::TRANSFER_DST | BufferUsage::TRANSFER_SRC,
	)?;
	let _device_memory = bind_all(&nri, &mut [&mut device_buffer], MemoryTypeRequest::Device)?;
	let mut readback = nri.create_buffer(size, BufferUsage::TRANSFER_DST)?;
	let _readback_memory = bind_all(&nri, &mut [&mut readback], MemoryTypeRequest::Readback)?;

	let mut queue = nri.create_command_queue()?;
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;
	upload_to_buffer(&nri, &mut queue, &mut cmd, &device_buffer, 0, bytes)?;
	readback.copy_from(&mut cmd, &device_buffer, 0, 0, size)?;
	queue.submit_and_wait(&mut cmd)?;

	let result = readback.map(0, size)?.read::<f32>();
	readback.unmap();
	assert_eq!(result.len(), data.len());
	for (a, b) in result.iter().zip(&data) {
		assert_relative_eq!(a, b);
	}
	Ok(())
}

#[test]
fn test_packed_buffers_are_disjoint() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut a = nri.create_buffer(100, BufferUsage::TRANSFER_SRC)?;
	let mut b = nri.create_buffer(200, BufferUsage::TRANSFER_SRC)?;
	let mut c = nri.create_buffer(300, BufferUsage::TRANSFER_SRC)?;
	let allocation = bind_all(&nri, &mut [&mut a, &mut b, &mut c], MemoryTypeRequest::Upload)?;

	assert_eq!(a.offset(), 0);
	assert!(b.offset() >= a.offset() + 100);
	assert!(c.offset() >= b.offset() + 200);
	assert!(allocation.size() >= c.offset() + 300);
	assert_eq!(allocation.type_request(), MemoryTypeRequest::Upload);

	// writes through one mapping never show up in another buffer of the same allocation
	a.map(0, 100)?.write(0, &[1u8; 100])?;
	b.map(0, 200)?.write(0, &[2u8; 200])?;
	c.map(0, 300)?.write(0, &[3u8; 300])?;
	assert!(a.map(0, 100)?.as_bytes().iter().all(|x| *x == 1));
	assert!(b.map(0, 200)?.as_bytes().iter().all(|x| *x == 2));
	assert!(c.map(0, 300)?.as_bytes().iter().all(|x| *x == 3));
	Ok(())
}

#[test]
fn test_allocation_outlives_handle() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut buffer = nri.create_buffer(64, BufferUsage::TRANSFER_SRC)?;
	// the returned allocation is dropped right away, the buffer keeps it alive
	drop(bind_all(&nri, &mut [&mut buffer], MemoryTypeRequest::Upload)?);
	buffer.map(0, 64)?.write(0, &[7u32; 16])?;
	assert_eq!(buffer.map(0, 64)?.read::<u32>(), vec![7; 16]);
	Ok(())
}

#[test]
fn test_map_errors() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut unbound = nri.create_buffer(64, BufferUsage::TRANSFER_SRC)?;
	assert!(matches!(unbound.map(0, 64), Err(NriError::MemoryNotBound)));

	let mut buffer = nri.create_buffer(64, BufferUsage::TRANSFER_SRC)?;
	let allocation = bind_all(&nri, &mut [&mut buffer], MemoryTypeRequest::Upload)?;
	assert!(matches!(
		buffer.map(32, 64),
		Err(NriError::OutOfBounds {
			offset: 32,
			end: 96,
			size: 64
		})
	));
	assert!(matches!(
		buffer.bind_memory(&allocation, 0),
		Err(NriError::MemoryAlreadyBound)
	));
	Ok(())
}

#[test]
fn test_buffer_handle() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut storage = nri.create_buffer(256, BufferUsage::STORAGE)?;
	assert_eq!(storage.handle(), ResourceHandle::INVALID);
	let _memory = bind_all(&nri, &mut [&mut storage], MemoryTypeRequest::Device)?;

	let handle = storage.handle();
	assert!(handle.is_valid());
	assert_eq!(handle.resource_type(), ResourceType::Buffer);
	assert!(handle.is_writable());
	// memoized, no second descriptor
	assert_eq!(storage.handle(), handle);
	assert_ne!(storage.device_address(), 0);

	let mut vertex = nri.create_buffer(256, BufferUsage::VERTEX)?;
	let _vertex_memory = bind_all(&nri, &mut [&mut vertex], MemoryTypeRequest::Device)?;
	assert_eq!(vertex.handle(), ResourceHandle::INVALID);
	Ok(())
}
