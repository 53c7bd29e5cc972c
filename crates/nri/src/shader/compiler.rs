use crate::shader::{ShaderCreateInfo, ShaderError, ShaderRegistry};
use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;
use std::process::Command;

/// Compiles HLSL to SPIR-V by running the `dxc` executable. Every compiled binary is also written to
/// [`Self::cache_dir`] so release builds can embed it.
#[derive(Clone, Debug)]
pub struct DxcCompiler {
	pub executable: PathBuf,
	pub include_dir: PathBuf,
	pub cache_dir: PathBuf,
}

impl Default for DxcCompiler {
	fn default() -> Self {
		Self {
			executable: PathBuf::from("dxc"),
			include_dir: PathBuf::from("./shaders/"),
			cache_dir: PathBuf::from("shadercache"),
		}
	}
}

impl DxcCompiler {
	/// Command line arguments for `info`, without the output file and source file.
	pub fn arguments(&self, info: &ShaderCreateInfo) -> Result<Vec<OsString>, ShaderError> {
		let profile = info
			.stage
			.target_profile()
			.ok_or(ShaderError::UnsupportedStage(info.stage))?;
		let mut args: Vec<OsString> = vec!["-E".into(), info.entry_point.as_str().into(), "-T".into(), profile.into()];
		args.extend(["-spirv", "-D", "VULKAN", "-D", "SHADER", "-I"].map(OsString::from));
		args.push(self.include_dir.clone().into_os_string());
		args.extend(["-fvk-use-dx-layout", "-fspv-target-env=vulkan1.2", "-HV", "2021"].map(OsString::from));
		Ok(args)
	}

	pub fn cache_path(&self, info: &ShaderCreateInfo) -> PathBuf {
		self.cache_dir.join(info.cache_key())
	}

	/// Compiles `info`, stores the result in the cache directory and returns the SPIR-V bytes.
	pub fn compile(&self, info: &ShaderCreateInfo) -> Result<Vec<u8>, ShaderError> {
		profiling::scope!("DxcCompiler::compile");
		let args = self.arguments(info)?;
		if !info.source_file.is_file() {
			log::error!("Failed to load shader source file: {}", info.source_file.display());
			return Err(ShaderError::SourceNotFound(info.source_file.clone()));
		}
		fs::create_dir_all(&self.cache_dir)?;
		let out_path = self.cache_path(info);

		log::debug!(
			"Compiling shader: {} entry point: {}",
			info.source_file.display(),
			info.entry_point
		);
		let output = Command::new(&self.executable)
			.args(args)
			.arg("-Fo")
			.arg(&out_path)
			.arg(&info.source_file)
			.output()?;

		let stderr = String::from_utf8_lossy(&output.stderr);
		if !output.status.success() {
			return Err(ShaderError::CompileFailed {
				source_file: info.source_file.clone(),
				message: stderr.into_owned(),
			});
		}
		if !stderr.trim().is_empty() {
			log::warn!("Shader compilation warnings/errors: {}", stderr);
		}
		Ok(fs::read(&out_path)?)
	}
}

/// Where the program builder gets shader binaries from.
#[derive(Clone, Debug)]
pub enum ShaderSource {
	Compile(DxcCompiler),
	Registry(&'static ShaderRegistry),
}

impl ShaderSource {
	/// Debug builds compile with `dxc`, release builds look up `registry`.
	pub fn for_build(registry: &'static ShaderRegistry) -> Self {
		if cfg!(debug_assertions) {
			ShaderSource::Compile(DxcCompiler::default())
		} else {
			ShaderSource::Registry(registry)
		}
	}

	pub fn load(&self, info: &ShaderCreateInfo) -> Result<Vec<u32>, ShaderError> {
		if !info.stage.is_supported() {
			log::error!("Unsupported shader type: {:?}", info.stage);
			return Err(ShaderError::UnsupportedStage(info.stage));
		}
		match self {
			ShaderSource::Compile(dxc) => {
				let bytes = dxc.compile(info)?;
				ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| ShaderError::InvalidSpirv(info.cache_key(), e))
			}
			ShaderSource::Registry(registry) => registry.load(&info.cache_key()),
		}
	}
}

impl Default for ShaderSource {
	fn default() -> Self {
		Self::for_build(&ShaderRegistry::EMPTY)
	}
}
