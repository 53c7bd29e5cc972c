#![cfg(test)]

use crate::{nri, nri_with_fences};
use fxed_nri::ash::vk::FenceCreateInfo;
use fxed_nri::command::{CommandBuffer, CommandQueue, SubmissionTracking};
use fxed_nri::platform::ash::FenceGuard;
use fxed_nri::platform::Nri;

#[test]
fn test_fence_tracking() -> anyhow::Result<()> {
	let Some(nri) = nri_with_fences() else { return Ok(()) };
	let mut queue = nri.create_command_queue()?;
	assert_eq!(queue.tracking(), SubmissionTracking::Fences);

	let mut first = nri.create_command_buffer(nri.default_command_pool())?;
	let mut second = nri.create_command_buffer(nri.default_command_pool())?;
	first.begin()?;
	second.begin()?;
	let a = queue.submit(&mut first)?;
	assert!(!first.is_recording());
	let b = queue.submit(&mut second)?;
	assert!(a < b);
	assert!(queue.pending() >= 1);

	queue.wait(b)?;
	queue.wait(a)?;
	assert_eq!(queue.pending(), 0);
	// waiting again on a finished submission returns immediately
	queue.wait(a)?;
	Ok(())
}

#[test]
fn test_queue_idle_tracking() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut queue = nri.create_command_queue()?;
	assert_eq!(queue.tracking(), SubmissionTracking::QueueIdle);

	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;
	for _ in 0..3 {
		cmd.begin()?;
		queue.submit_and_wait(&mut cmd)?;
	}
	assert_eq!(queue.pending(), 0);
	nri.synchronize()?;
	Ok(())
}

#[test]
fn test_reused_external_fence_is_tracked_once() -> anyhow::Result<()> {
	let Some(nri) = nri_with_fences() else { return Ok(()) };
	let device = nri.device();
	let fence = unsafe { FenceGuard::new(device, device.device.create_fence(&FenceCreateInfo::default(), None)?) };
	let mut queue = nri.create_command_queue()?;
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;

	// the same pattern as the frame loop: submit with the fence, wait on it, reset it, repeat
	for _ in 0..8 {
		cmd.begin()?;
		queue.submit_with(&mut cmd, &[], &[], *fence)?;
		unsafe {
			device.device.wait_for_fences(&[*fence], true, u64::MAX)?;
			device.device.reset_fences(&[*fence])?;
		}
		assert!(queue.pending() <= 1);
	}
	Ok(())
}
