use crate::command::SubmissionTracking;
use crate::descriptor::DescriptorCounts;
use crate::error::NriError;
use crate::shader::ShaderSource;
use bitflags::bitflags;
use raw_window_handle::RawDisplayHandle;
use rustc_hash::FxHashMap;

bitflags! {
	/// Which windowing toolkit a backend should integrate with.
	#[repr(transparent)]
	#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
	pub struct CreateBits: u32 {
		const DEFAULT = 0;
		const GLFW = 1;
		const QT = 2;
		const WINIT = 4;
	}
}

impl CreateBits {
	/// Any windowing toolkit requested, so surface support is required.
	pub fn wants_surface(&self) -> bool {
		self.intersects(CreateBits::GLFW | CreateBits::QT | CreateBits::WINIT)
	}
}

#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum Debuggers {
	#[default]
	None,
	/// Enables the validation layers and routes their messages into `log`.
	Validation,
}

impl Debuggers {
	/// Validation in debug builds, nothing in release builds.
	pub fn for_build() -> Self {
		if cfg!(debug_assertions) {
			Debuggers::Validation
		} else {
			Debuggers::None
		}
	}
}

#[derive(Clone, Debug)]
pub struct NriCreateInfo {
	pub bits: CreateBits,
	pub app_name: String,
	pub debug: Debuggers,
	pub descriptor_counts: DescriptorCounts,
	/// Display of the windowing toolkit, required when `bits` asks for a surface.
	pub display_handle: Option<RawDisplayHandle>,
	pub shaders: ShaderSource,
	pub submission_tracking: SubmissionTracking,
}

impl Default for NriCreateInfo {
	fn default() -> Self {
		Self {
			bits: CreateBits::DEFAULT,
			app_name: String::from("fxed"),
			debug: Debuggers::for_build(),
			descriptor_counts: DescriptorCounts::REASONABLE_DEFAULTS,
			display_handle: None,
			shaders: ShaderSource::default(),
			submission_tracking: SubmissionTracking::default(),
		}
	}
}

pub type CreateNriFn<N> = fn(&NriCreateInfo) -> Result<N, NriError>;

/// Name keyed constructors of rendering backends.
pub struct NriFactory<N> {
	backends: FxHashMap<String, CreateNriFn<N>>,
}

impl<N> NriFactory<N> {
	/// A factory without any backends.
	pub fn empty() -> Self {
		Self {
			backends: FxHashMap::default(),
		}
	}

	/// Registers `create` under `name`, replacing any previous registration.
	pub fn register(&mut self, name: impl Into<String>, create: CreateNriFn<N>) {
		self.backends.insert(name.into(), create);
	}

	pub fn create(&self, name: &str, info: &NriCreateInfo) -> Result<N, NriError> {
		let create = self
			.backends
			.get(name)
			.ok_or_else(|| NriError::BackendNotFound(name.to_string()))?;
		log::info!("Creating Native Rendering Interface {}", name);
		create(info)
	}

	/// Names of all registered backends, sorted.
	pub fn available(&self) -> Vec<&str> {
		let mut names: Vec<_> = self.backends.keys().map(String::as_str).collect();
		names.sort_unstable();
		names
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn create_one(_: &NriCreateInfo) -> Result<u32, NriError> {
		Ok(1)
	}

	fn create_two(info: &NriCreateInfo) -> Result<u32, NriError> {
		Ok(2 + info.bits.bits())
	}

	#[test]
	fn test_register_and_create() {
		let mut factory = NriFactory::<u32>::empty();
		factory.register("Vulkan", create_one);
		factory.register("Other", create_two);
		assert_eq!(factory.available(), vec!["Other", "Vulkan"]);
		assert_eq!(factory.create("Vulkan", &NriCreateInfo::default()).unwrap(), 1);
		let info = NriCreateInfo {
			bits: CreateBits::GLFW,
			..NriCreateInfo::default()
		};
		assert_eq!(factory.create("Other", &info).unwrap(), 3);
	}

	#[test]
	fn test_unknown_backend() {
		let factory = NriFactory::<u32>::empty();
		let err = factory.create("Metal", &NriCreateInfo::default()).unwrap_err();
		assert_eq!(err.to_string(), "Native Rendering Interface not found: Metal");
	}

	#[test]
	fn test_create_bits() {
		assert!(!CreateBits::DEFAULT.wants_surface());
		assert!(CreateBits::GLFW.wants_surface());
		assert!((CreateBits::QT | CreateBits::WINIT).wants_surface());
		assert_eq!(CreateBits::QT.bits(), 2);
	}
}
