use fxed_nri::command::SubmissionTracking;
use fxed_nri::descriptor::DescriptorCounts;
use fxed_nri::factory::{Debuggers, NriCreateInfo, NriFactory};
use fxed_nri::platform::ash::AshNri;

pub mod buffer;
pub mod descriptor;
pub mod image;
pub mod program;
pub mod queue;

/// the global setting on which debugger to use for integration tests
pub fn debugger() -> Debuggers {
	Debuggers::Validation
}

pub fn create_info() -> NriCreateInfo {
	NriCreateInfo {
		app_name: String::from("integration-test"),
		debug: debugger(),
		..NriCreateInfo::default()
	}
}

/// Creates the Vulkan backend, or returns `None` if this machine has no usable Vulkan driver.
pub fn try_create_nri(info: &NriCreateInfo) -> Option<AshNri> {
	let _ = env_logger::builder().is_test(true).try_init();
	let factory = NriFactory::<AshNri>::with_default_backends();
	let result = factory.create(AshNri::NAME, info).or_else(|e| {
		if info.debug == Debuggers::None {
			return Err(e);
		}
		log::warn!("Retrying without validation layers: {}", e);
		factory.create(
			AshNri::NAME,
			&NriCreateInfo {
				debug: Debuggers::None,
				..info.clone()
			},
		)
	});
	match result {
		Ok(nri) => Some(nri),
		Err(e) => {
			log::warn!("Skipping test, Vulkan is not available: {}", e);
			None
		}
	}
}

pub fn nri() -> Option<AshNri> {
	try_create_nri(&create_info())
}

pub fn nri_with_counts(descriptor_counts: DescriptorCounts) -> Option<AshNri> {
	try_create_nri(&NriCreateInfo {
		descriptor_counts,
		..create_info()
	})
}

pub fn nri_with_fences() -> Option<AshNri> {
	try_create_nri(&NriCreateInfo {
		submission_tracking: SubmissionTracking::Fences,
		..create_info()
	})
}
