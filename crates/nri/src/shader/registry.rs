use crate::shader::ShaderError;
use std::io::Cursor;

/// Precompiled SPIR-V binaries keyed by [`shader_cache_key`](super::shader_cache_key). Usually generated by
/// `fxed-nri-shader-builder` from the `shadercache` directory and included into the application.
#[derive(Copy, Clone, Debug)]
pub struct ShaderRegistry {
	entries: &'static [(&'static str, &'static [u8])],
}

impl ShaderRegistry {
	pub const EMPTY: ShaderRegistry = ShaderRegistry { entries: &[] };

	pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
		Self { entries }
	}

	pub fn get(&self, key: &str) -> Option<&'static [u8]> {
		self.entries.iter().find(|(name, _)| *name == key).map(|(_, spv)| *spv)
	}

	/// The SPIR-V words stored under `key`.
	pub fn load(&self, key: &str) -> Result<Vec<u32>, ShaderError> {
		let bytes = self.get(key).ok_or_else(|| {
			log::error!("Shader cache not found for: {}", key);
			ShaderError::NotInRegistry(key.to_string())
		})?;
		ash::util::read_spv(&mut Cursor::new(bytes)).map_err(|e| ShaderError::InvalidSpirv(key.to_string(), e))
	}

	pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.entries.iter().map(|(name, _)| *name)
	}

	pub fn len(&self) -> usize {
		self.entries.len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}
}
