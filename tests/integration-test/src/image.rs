#![cfg(test)]

use crate::nri;
use fxed_nri::barrier::ImageLayout;
use fxed_nri::command::CommandQueue;
use fxed_nri::error::NriError;
use fxed_nri::format::{BufferUsage, Format, ImageUsage};
use fxed_nri::handle::{ResourceHandle, ResourceType};
use fxed_nri::memory::{allocate_and_bind, resource_offsets, BindMemory, MemoryTypeRequest};
use fxed_nri::platform::ash::{AshAllocation, AshImage2d, AshNri};
use fxed_nri::platform::{Buffer, Image2d, ImageView, Nri};
use fxed_nri::upload::upload_to_image;
use glam::Vec4;

fn create_image(nri: &AshNri, usage: ImageUsage) -> anyhow::Result<(AshImage2d, AshAllocation)> {
	let mut image = nri.create_image_2d(4, 4, Format::R8G8B8A8Unorm, usage)?;
	let allocation = allocate_and_bind(
		nri,
		&mut [&mut image as &mut dyn BindMemory<AshAllocation>],
		MemoryTypeRequest::Device,
	)?;
	Ok((image, allocation))
}

#[test]
fn test_clear_and_present_layout() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let (mut image, _memory) = create_image(&nri, ImageUsage::TRANSFER_DST | ImageUsage::COLOR_ATTACHMENT)?;
	assert_eq!(image.layout(), ImageLayout::Undefined);

	let mut queue = nri.create_command_queue()?;
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;
	image.clear(&mut cmd, Vec4::new(1., 0., 1., 1.))?;
	assert_eq!(image.layout(), ImageLayout::TransferDst);
	image.prepare_for_present(&mut cmd)?;
	queue.submit_and_wait(&mut cmd)?;
	assert_eq!(image.layout(), ImageLayout::PresentSrc);
	Ok(())
}

#[test]
fn test_upload_leaves_texture_layout() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let (mut image, _memory) = create_image(&nri, ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED)?;
	let texels = (0..16u32).flat_map(|i| [i as u8 * 16, 0, 255 - i as u8, 255]).collect::<Vec<u8>>();

	let mut queue = nri.create_command_queue()?;
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;
	upload_to_image(&nri, &mut queue, &mut cmd, &mut image, &texels, 0)?;
	assert_eq!(image.layout(), ImageLayout::ShaderReadOnly);
	Ok(())
}

#[test]
fn test_view_handles() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let (image, _memory) = create_image(
		&nri,
		ImageUsage::SAMPLED | ImageUsage::STORAGE | ImageUsage::COLOR_ATTACHMENT,
	)?;

	let texture = image.create_texture_view()?;
	let texture_handle = texture.handle();
	assert!(texture_handle.is_valid());
	assert_eq!(texture_handle.resource_type(), ResourceType::ImageSampler);
	assert!(!texture_handle.is_writable());
	assert_eq!(texture.handle(), texture_handle);

	let storage = image.create_storage_view()?;
	let storage_handle = storage.handle();
	assert_eq!(storage_handle.resource_type(), ResourceType::StorageImage);
	assert!(storage_handle.is_writable());

	let render_target = image.create_render_target_view()?;
	assert_eq!(render_target.handle(), ResourceHandle::INVALID);
	Ok(())
}

#[test]
fn test_depth_image_clear() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut depth = nri.create_image_2d(
		8,
		8,
		Format::D32Sfloat,
		ImageUsage::TRANSFER_DST | ImageUsage::DEPTH_STENCIL_ATTACHMENT,
	)?;
	let _memory = allocate_and_bind(
		&nri,
		&mut [&mut depth as &mut dyn BindMemory<AshAllocation>],
		MemoryTypeRequest::Device,
	)?;
	assert!(depth.format().is_depth());

	let mut queue = nri.create_command_queue()?;
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;
	depth.clear(&mut cmd, Vec4::ONE)?;
	queue.submit_and_wait(&mut cmd)?;
	assert_eq!(depth.layout(), ImageLayout::TransferDst);
	Ok(())
}

#[test]
fn test_buffer_and_image_share_allocation() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut buffer = nri.create_buffer(256, BufferUsage::TRANSFER_DST | BufferUsage::TRANSFER_SRC)?;
	let mut image = nri.create_image_2d(
		64,
		64,
		Format::R32G32B32A32Sfloat,
		ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED,
	)?;
	let image_requirements = image.memory_requirements();
	{
		let resources: [&mut dyn BindMemory<AshAllocation>; 2] = [&mut buffer, &mut image];
		let layout = resource_offsets(&resources);
		assert_eq!(layout.offsets[0], 0);
		assert!(layout.offsets[1] >= 256);
		assert_eq!(layout.offsets[1] % image_requirements.alignment.max(1), 0);
	}
	let _memory = allocate_and_bind(
		&nri,
		&mut [
			&mut buffer as &mut dyn BindMemory<AshAllocation>,
			&mut image as &mut dyn BindMemory<AshAllocation>,
		],
		MemoryTypeRequest::Device,
	)?;

	let mut staging = nri.create_buffer(256, BufferUsage::TRANSFER_SRC)?;
	let _staging_memory = allocate_and_bind(
		&nri,
		&mut [&mut staging as &mut dyn BindMemory<AshAllocation>],
		MemoryTypeRequest::Upload,
	)?;
	staging.map(0, 256)?.write(0, &[0.25f32; 64])?;

	let mut queue = nri.create_command_queue()?;
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;
	buffer.copy_from(&mut cmd, &staging, 0, 0, 256)?;
	image.clear(&mut cmd, Vec4::new(0., 0.5, 1., 1.))?;
	image.prepare_for_present(&mut cmd)?;
	queue.submit_and_wait(&mut cmd)?;
	assert_eq!(image.layout(), ImageLayout::PresentSrc);
	Ok(())
}

#[test]
fn test_view_requires_bound_memory() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let image = nri.create_image_2d(4, 4, Format::R8G8B8A8Unorm, ImageUsage::SAMPLED)?;
	assert!(matches!(image.create_texture_view(), Err(NriError::MemoryNotBound)));
	assert!(matches!(image.create_render_target_view(), Err(NriError::MemoryNotBound)));
	Ok(())
}

#[test]
fn test_view_handle_requires_matching_usage() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let (image, _memory) = create_image(&nri, ImageUsage::TRANSFER_DST | ImageUsage::COLOR_ATTACHMENT)?;
	let texture = image.create_texture_view()?;
	assert_eq!(texture.handle(), ResourceHandle::INVALID);
	let storage = image.create_storage_view()?;
	assert_eq!(storage.handle(), ResourceHandle::INVALID);

	// nothing was written to the table for either view
	let (sampled, _sampled_memory) = create_image(&nri, ImageUsage::SAMPLED)?;
	assert_eq!(sampled.create_texture_view()?.handle().index(), 0);
	Ok(())
}

#[test]
fn test_upload_too_short_for_image() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let (mut image, _memory) = create_image(&nri, ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED)?;
	let mut queue = nri.create_command_queue()?;
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;

	// 4x4 RGBA8 needs 64 bytes
	assert!(matches!(
		upload_to_image(&nri, &mut queue, &mut cmd, &mut image, &[0u8; 8], 0),
		Err(NriError::OutOfBounds { end: 64, size: 8, .. })
	));
	// a row pitch of 8 texels needs 3 padded rows and one tight row
	assert!(matches!(
		upload_to_image(&nri, &mut queue, &mut cmd, &mut image, &[0u8; 64], 8),
		Err(NriError::OutOfBounds { end: 112, size: 64, .. })
	));
	assert_eq!(image.layout(), ImageLayout::Undefined);
	Ok(())
}
