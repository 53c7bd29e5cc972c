//! Build script helper compiling shaders into the `shadercache` directory and generating a Rust source file that
//! embeds every cached binary into a `fxed_nri::shader::ShaderRegistry`.
//!
//! ```no_run
//! // build.rs
//! use fxed_nri::shader::{ShaderCreateInfo, ShaderStage};
//! use fxed_nri_shader_builder::ShaderRegistryBuilder;
//!
//! fn main() -> anyhow::Result<()> {
//! 	ShaderRegistryBuilder::new()?
//! 		.shader(ShaderCreateInfo::new("shaders/rect.hlsl", "vsMain", ShaderStage::Vertex))
//! 		.build()?;
//! 	Ok(())
//! }
//! ```
//! and then `include!(concat!(env!("OUT_DIR"), "/shader_registry.rs"));` in the crate.

use crate::codegen::{codegen_shader_registry, find_spv_files, CodegenOptions};
use anyhow::Context;
use fxed_nri::shader::{DxcCompiler, ShaderCreateInfo};
use std::env;
use std::path::{Path, PathBuf};

pub mod codegen;

pub use fxed_nri;

pub struct ShaderRegistryBuilder {
	pub compiler: DxcCompiler,
	pub shaders: Vec<ShaderCreateInfo>,
	pub codegen: Option<CodegenOptions>,
}

impl ShaderRegistryBuilder {
	/// Compiles shaders from `shaders/` into `shadercache/`, both relative to your `Cargo.toml`.
	pub fn new() -> anyhow::Result<Self> {
		let manifest_dir = env::var("CARGO_MANIFEST_DIR").context("CARGO_MANIFEST_DIR not set, not in a build script?")?;
		Ok(Self::new_absolute_path(manifest_dir))
	}

	/// Compiles shaders from `{crate_dir}/shaders/` into `{crate_dir}/shadercache/`.
	pub fn new_absolute_path(crate_dir: impl AsRef<Path>) -> Self {
		let crate_dir = crate_dir.as_ref();
		Self {
			compiler: DxcCompiler {
				include_dir: crate_dir.join("shaders"),
				cache_dir: crate_dir.join("shadercache"),
				..DxcCompiler::default()
			},
			shaders: Vec::new(),
			codegen: Some(CodegenOptions::default()),
		}
	}

	/// Compiles `info` as part of [`Self::build`]. Relative source paths are resolved against the working directory
	/// of the build script, which is the crate directory.
	pub fn shader(mut self, info: ShaderCreateInfo) -> Self {
		self.shaders.push(info);
		self
	}

	pub fn with_compiler<F>(self, f: F) -> Self
	where
		F: FnOnce(DxcCompiler) -> DxcCompiler,
	{
		Self {
			compiler: f(self.compiler),
			..self
		}
	}

	pub fn set_codegen_options(self, codegen: Option<CodegenOptions>) -> Self {
		Self { codegen, ..self }
	}

	pub fn build(self) -> anyhow::Result<ShaderRegistryResult> {
		for shader in &self.shaders {
			println!("cargo:rerun-if-changed={}", shader.source_file.display());
			self.compiler
				.compile(shader)
				.with_context(|| format!("Failed to compile {}", shader.source_file.display()))?;
		}

		let cache_dir = &self.compiler.cache_dir;
		println!("cargo:rerun-if-changed={}", cache_dir.display());
		let spv_files = find_spv_files(cache_dir)?;

		let codegen_out_path = if let Some(codegen) = &self.codegen {
			let out_dir = env::var("OUT_DIR").context("OUT_DIR not set, not in a build script?")?;
			let out_path = Path::new(&out_dir).join(&codegen.registry_path);
			codegen_shader_registry(
				spv_files.iter().map(|(name, path)| (name.as_str(), path.as_path())),
				&out_path,
				codegen,
			)?;
			Some(out_path)
		} else {
			None
		};
		Ok(ShaderRegistryResult {
			spv_files: spv_files.into_iter().map(|(_, path)| path).collect(),
			codegen_out_path,
		})
	}
}

pub struct ShaderRegistryResult {
	pub spv_files: Vec<PathBuf>,
	pub codegen_out_path: Option<PathBuf>,
}
