#![cfg(test)]

use crate::{create_info, nri, try_create_nri};
use fxed_nri::error::NriError;
use fxed_nri::factory::NriCreateInfo;
use fxed_nri::platform::Nri;
use fxed_nri::program::ProgramBuilder;
use fxed_nri::shader::{ShaderCreateInfo, ShaderError, ShaderRegistry, ShaderSource, ShaderStage};

fn nri_with_empty_registry() -> Option<fxed_nri::platform::ash::AshNri> {
	try_create_nri(&NriCreateInfo {
		shaders: ShaderSource::Registry(&ShaderRegistry::EMPTY),
		..create_info()
	})
}

#[test]
fn test_compute_requires_one_stage() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	let mut builder = nri.create_program_builder();
	assert!(matches!(
		builder.build_compute_program(),
		Err(NriError::ComputeStageCount(0))
	));

	builder
		.add_shader_module(ShaderCreateInfo::new("shaders/a.hlsl", "csMain", ShaderStage::Compute))
		.add_shader_module(ShaderCreateInfo::new("shaders/b.hlsl", "csMain", ShaderStage::Compute));
	assert!(matches!(
		builder.build_compute_program(),
		Err(NriError::ComputeStageCount(2))
	));
	Ok(())
}

#[test]
fn test_missing_registry_entry() -> anyhow::Result<()> {
	let Some(nri) = nri_with_empty_registry() else { return Ok(()) };
	let mut builder = nri.create_program_builder();
	builder.add_shader_module(ShaderCreateInfo::new("shaders/blur.hlsl", "csMain", ShaderStage::Compute));
	match builder.build_compute_program() {
		Err(NriError::Shader(ShaderError::NotInRegistry(key))) => assert_eq!(key, "blur_hlsl_csMain.spv"),
		Err(e) => panic!("unexpected error: {}", e),
		Ok(_) => panic!("built a program without SPIR-V"),
	}
	Ok(())
}

#[test]
fn test_unsupported_stage() -> anyhow::Result<()> {
	let Some(nri) = nri_with_empty_registry() else { return Ok(()) };
	let mut builder = nri.create_program_builder();
	builder
		.add_shader_module(ShaderCreateInfo::new("shaders/grass.hlsl", "vsMain", ShaderStage::Vertex))
		.add_shader_module(ShaderCreateInfo::new("shaders/grass.hlsl", "gsMain", ShaderStage::Geometry));
	assert!(matches!(
		builder.build_graphics_program(),
		Err(NriError::Shader(ShaderError::NotInRegistry(_) | ShaderError::UnsupportedStage(_)))
	));
	Ok(())
}

#[test]
fn test_ray_tracing_not_supported() -> anyhow::Result<()> {
	let Some(nri) = nri() else { return Ok(()) };
	assert!(!nri.supports_ray_tracing());
	let mut cmd = nri.create_command_buffer(nri.default_command_pool())?;
	let mut builder = nri.create_program_builder();
	builder.add_shader_module(ShaderCreateInfo::new("shaders/rt.hlsl", "rayGen", ShaderStage::Raygen));
	assert!(matches!(
		builder.build_ray_tracing_program(&mut cmd),
		Err(NriError::NotImplemented(_))
	));
	assert!(matches!(nri.create_tlas(&[], &[]), Err(NriError::NotImplemented(_))));
	Ok(())
}
