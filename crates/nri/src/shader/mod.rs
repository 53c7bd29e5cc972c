//! Obtaining SPIR-V for a `(source file, entry point, stage)` triple, either by running the `dxc` compiler or by
//! looking the binary up in a registry embedded at build time.

mod compiler;
mod registry;

pub use compiler::*;
pub use registry::*;

use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum ShaderStage {
	Vertex,
	Fragment,
	Compute,
	Geometry,
	TessellationControl,
	TessellationEvaluation,
	Raygen,
	AnyHit,
	ClosestHit,
	Miss,
	Intersection,
	Mesh,
	Task,
}

impl ShaderStage {
	/// The `dxc` target profile, `None` for stages this layer does not build pipelines for.
	pub fn target_profile(&self) -> Option<&'static str> {
		match self {
			ShaderStage::Vertex => Some("vs_6_6"),
			ShaderStage::Fragment => Some("ps_6_6"),
			ShaderStage::Compute => Some("cs_6_6"),
			ShaderStage::Raygen | ShaderStage::ClosestHit | ShaderStage::AnyHit | ShaderStage::Miss => Some("lib_6_6"),
			_ => None,
		}
	}

	pub fn is_supported(&self) -> bool {
		self.target_profile().is_some()
	}
}

/// One shader stage of a program.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ShaderCreateInfo {
	pub source_file: PathBuf,
	pub entry_point: String,
	pub stage: ShaderStage,
}

impl ShaderCreateInfo {
	pub fn new(source_file: impl Into<PathBuf>, entry_point: impl Into<String>, stage: ShaderStage) -> Self {
		Self {
			source_file: source_file.into(),
			entry_point: entry_point.into(),
			stage,
		}
	}

	pub fn cache_key(&self) -> String {
		shader_cache_key(&self.source_file, &self.entry_point)
	}
}

/// The name compiled shaders are stored under, both in the `shadercache` directory and in the embedded registry:
/// the source file name with every `.` replaced by `_`, then `_`, the entry point and `.spv`.
pub fn shader_cache_key(source_file: &Path, entry_point: &str) -> String {
	let file_name = source_file
		.file_name()
		.map(|name| name.to_string_lossy().replace('.', "_"))
		.unwrap_or_default();
	format!("{}_{}.spv", file_name, entry_point)
}

#[derive(Error)]
pub enum ShaderError {
	#[error("Unsupported shader stage {0:?}")]
	UnsupportedStage(ShaderStage),
	#[error("Failed to load shader source file: {0}")]
	SourceNotFound(PathBuf),
	#[error("Failed to compile shader: {source_file}\n{message}")]
	CompileFailed { source_file: PathBuf, message: String },
	#[error("Entry point {0:?} contains a nul byte")]
	InvalidEntryPoint(String),
	#[error("Shader cache not found for: {0}")]
	NotInRegistry(String),
	#[error("Shader binary {0} is not valid SPIR-V: {1}")]
	InvalidSpirv(String, std::io::Error),
	#[error("Shader IO Error: {0}")]
	Io(#[from] std::io::Error),
}

impl Debug for ShaderError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(self, f)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_cache_key() {
		assert_eq!(shader_cache_key(Path::new("shaders/text.hlsl"), "vsMain"), "text_hlsl_vsMain.spv");
		assert_eq!(
			shader_cache_key(Path::new("./shaders/sub/font.glyph.hlsl"), "main"),
			"font_glyph_hlsl_main.spv"
		);
		assert_eq!(shader_cache_key(Path::new("plain"), "cs"), "plain_cs.spv");
	}

	#[test]
	fn test_cache_key_from_create_info() {
		let info = ShaderCreateInfo::new("shaders/rect.hlsl", "psMain", ShaderStage::Fragment);
		assert_eq!(info.cache_key(), "rect_hlsl_psMain.spv");
	}

	#[test]
	fn test_target_profiles() {
		assert_eq!(ShaderStage::Vertex.target_profile(), Some("vs_6_6"));
		assert_eq!(ShaderStage::Fragment.target_profile(), Some("ps_6_6"));
		assert_eq!(ShaderStage::Compute.target_profile(), Some("cs_6_6"));
		assert_eq!(ShaderStage::Miss.target_profile(), Some("lib_6_6"));
		assert!(!ShaderStage::Geometry.is_supported());
		assert!(!ShaderStage::Mesh.is_supported());
	}
}
