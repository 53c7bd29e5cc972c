use crate::descriptor::DescriptorError;
use crate::frame::FrameError;
use crate::handle::HandleError;
use crate::shader::ShaderError;
use std::fmt::{Debug, Formatter};
use thiserror::Error;

#[derive(Error)]
pub enum NriError {
	#[error("Vk Error: {0}")]
	Vk(#[from] ash::vk::Result),
	#[error("Failed to find suitable memory type!")]
	NoSuitableMemoryType,
	#[error("Native Rendering Interface not found: {0}")]
	BackendNotFound(String),
	#[error("{0} is not implemented yet!")]
	NotImplemented(&'static str),
	#[error("Resource has no memory bound")]
	MemoryNotBound,
	#[error("Resource already has memory bound")]
	MemoryAlreadyBound,
	#[error("Range {offset}..{end} is out of bounds for a resource of size {size}")]
	OutOfBounds { offset: u64, end: u64, size: u64 },
	#[error("Compute program must have exactly one shader stage, got {0}")]
	ComputeStageCount(usize),
	#[error("Swapchain creation failed: {0}")]
	Swapchain(&'static str),
	#[error("Initialization failed: {0:#}")]
	Init(#[from] anyhow::Error),
	#[error(transparent)]
	Handle(#[from] HandleError),
	#[error(transparent)]
	Descriptor(#[from] DescriptorError),
	#[error(transparent)]
	Frame(#[from] FrameError),
	#[error(transparent)]
	Shader(#[from] ShaderError),
}

impl Debug for NriError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(self, f)
	}
}
