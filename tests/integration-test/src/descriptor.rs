#![cfg(test)]

use crate::nri_with_counts;
use fxed_nri::descriptor::{DescriptorCategory, DescriptorCounts};
use fxed_nri::format::BufferUsage;
use fxed_nri::handle::ResourceHandle;
use fxed_nri::memory::{allocate_and_bind, BindMemory, MemoryTypeRequest};
use fxed_nri::platform::ash::AshAllocation;
use fxed_nri::platform::{Buffer, Nri};

#[test]
fn test_indices_increase_until_full() -> anyhow::Result<()> {
	let counts = DescriptorCounts {
		storage_buffers: 3,
		..DescriptorCounts::REASONABLE_DEFAULTS
	};
	let Some(nri) = nri_with_counts(counts) else { return Ok(()) };
	assert_eq!(nri.ctx().descriptors.borrow().counts().storage_buffers, 3);

	let mut buffers = (0..4)
		.map(|_| nri.create_buffer(16, BufferUsage::STORAGE))
		.collect::<Result<Vec<_>, _>>()?;
	let mut resources = buffers
		.iter_mut()
		.map(|b| b as &mut dyn BindMemory<AshAllocation>)
		.collect::<Vec<_>>();
	let _memory = allocate_and_bind(&nri, &mut resources, MemoryTypeRequest::Device)?;

	let handles = buffers.iter().map(|b| b.handle()).collect::<Vec<_>>();
	assert_eq!(
		handles[..3].iter().map(|h| h.index()).collect::<Vec<_>>(),
		vec![0, 1, 2]
	);
	// the table is full, which degrades to an invalid handle
	assert_eq!(handles[3], ResourceHandle::INVALID);
	assert_eq!(
		nri.ctx().descriptors.borrow().allocated(DescriptorCategory::StorageBuffer),
		3
	);
	Ok(())
}

#[test]
fn test_no_acceleration_structures() -> anyhow::Result<()> {
	let Some(nri) = nri_with_counts(DescriptorCounts::REASONABLE_DEFAULTS) else {
		return Ok(());
	};
	let counts = nri.ctx().descriptors.borrow().counts();
	assert_eq!(counts.acceleration_structures, 0);
	assert!(counts.is_within_limit(DescriptorCounts::REASONABLE_DEFAULTS));
	Ok(())
}
