//! Synchronous uploads through a temporary staging buffer. Each call submits and waits before returning.

use crate::command::CommandQueue;
use crate::error::NriError;
use crate::format::BufferUsage;
use crate::memory::{allocate_and_bind, BindMemory, MemoryTypeRequest};
use crate::platform::{Buffer, Image2d, Nri};

fn staging_buffer<N: Nri>(nri: &N, data: &[u8]) -> Result<(N::Buffer, N::Allocation), NriError> {
	let len = data.len() as u64;
	let mut staging = nri.create_buffer(len, BufferUsage::TRANSFER_SRC)?;
	let allocation = allocate_and_bind(
		nri,
		&mut [&mut staging as &mut dyn BindMemory<N::Allocation>],
		MemoryTypeRequest::Upload,
	)?;
	staging.map(0, len)?.write(0, data)?;
	staging.unmap();
	Ok((staging, allocation))
}

/// Copies `data` into `dst` at `dst_offset`.
#[profiling::function]
pub fn upload_to_buffer<N: Nri>(
	nri: &N,
	queue: &mut N::CommandQueue,
	command_buffer: &mut N::CommandBuffer,
	dst: &N::Buffer,
	dst_offset: u64,
	data: &[u8],
) -> Result<(), NriError> {
	if data.is_empty() {
		return Ok(());
	}
	let (staging, _allocation) = staging_buffer(nri, data)?;
	dst.copy_from(command_buffer, &staging, 0, dst_offset, data.len() as u64)?;
	queue.submit_and_wait(command_buffer)
}

/// Fills the whole of `image` with `data`, rows of `row_pitch` texels (0 for tightly packed), and leaves it ready
/// for sampling.
#[profiling::function]
pub fn upload_to_image<N: Nri>(
	nri: &N,
	queue: &mut N::CommandQueue,
	command_buffer: &mut N::CommandBuffer,
	image: &mut N::Image2d,
	data: &[u8],
	row_pitch: u32,
) -> Result<(), NriError> {
	if data.is_empty() {
		return Ok(());
	}
	let (staging, _allocation) = staging_buffer(nri, data)?;
	image.copy_from(command_buffer, &staging, 0, row_pitch)?;
	image.prepare_for_texture(command_buffer)?;
	queue.submit_and_wait(command_buffer)
}
