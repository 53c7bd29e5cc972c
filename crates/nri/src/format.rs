use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

/// Texel and vertex attribute formats. Discriminants equal the native Vulkan format numbers.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, IntoPrimitive, TryFromPrimitive)]
pub enum Format {
	Undefined = 0,
	R8Unorm = 9,
	R8Uint = 13,
	R8G8Unorm = 16,
	R8G8B8A8Unorm = 37,
	R8G8B8A8Snorm = 38,
	R8G8B8A8Uint = 41,
	R8G8B8A8Srgb = 43,
	B8G8R8A8Unorm = 44,
	B8G8R8A8Srgb = 50,
	A2B10G10R10UnormPack32 = 64,
	R16Uint = 74,
	R16Sfloat = 76,
	R16G16Sfloat = 83,
	R16G16B16A16Unorm = 91,
	R16G16B16A16Sfloat = 97,
	R32Uint = 98,
	R32Sint = 99,
	R32Sfloat = 100,
	R32G32Uint = 101,
	R32G32Sfloat = 103,
	R32G32B32Uint = 104,
	R32G32B32Sfloat = 106,
	R32G32B32A32Uint = 107,
	R32G32B32A32Sfloat = 109,
	D16Unorm = 124,
	X8D24UnormPack32 = 125,
	D32Sfloat = 126,
	S8Uint = 127,
	D16UnormS8Uint = 128,
	D24UnormS8Uint = 129,
	D32SfloatS8Uint = 130,
}

impl Format {
	/// Has a depth component.
	pub fn is_depth(&self) -> bool {
		matches!(
			self,
			Format::D16Unorm
				| Format::X8D24UnormPack32
				| Format::D32Sfloat
				| Format::D16UnormS8Uint
				| Format::D24UnormS8Uint
				| Format::D32SfloatS8Uint
		)
	}

	/// Has a stencil component.
	pub fn has_stencil(&self) -> bool {
		matches!(
			self,
			Format::S8Uint | Format::D16UnormS8Uint | Format::D24UnormS8Uint | Format::D32SfloatS8Uint
		)
	}

	/// Size of one texel or vertex attribute in bytes, 0 for [`Format::Undefined`].
	pub fn bytes_per_pixel(&self) -> u32 {
		match self {
			Format::Undefined => 0,
			Format::R8Unorm | Format::R8Uint | Format::S8Uint => 1,
			Format::R8G8Unorm | Format::R16Uint | Format::R16Sfloat | Format::D16Unorm => 2,
			Format::D16UnormS8Uint => 3,
			Format::R8G8B8A8Unorm
			| Format::R8G8B8A8Snorm
			| Format::R8G8B8A8Uint
			| Format::R8G8B8A8Srgb
			| Format::B8G8R8A8Unorm
			| Format::B8G8R8A8Srgb
			| Format::A2B10G10R10UnormPack32
			| Format::R16G16Sfloat
			| Format::R32Uint
			| Format::R32Sint
			| Format::R32Sfloat
			| Format::X8D24UnormPack32
			| Format::D32Sfloat
			| Format::D24UnormS8Uint => 4,
			Format::D32SfloatS8Uint => 5,
			Format::R16G16B16A16Unorm | Format::R16G16B16A16Sfloat | Format::R32G32Uint | Format::R32G32Sfloat => 8,
			Format::R32G32B32Uint | Format::R32G32B32Sfloat => 12,
			Format::R32G32B32A32Uint | Format::R32G32B32A32Sfloat => 16,
		}
	}
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum IndexType {
	U16,
	U32,
}

impl IndexType {
	pub fn size(&self) -> u64 {
		match self {
			IndexType::U16 => 2,
			IndexType::U32 => 4,
		}
	}
}

bitflags! {
	#[repr(transparent)]
	#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
	pub struct BufferUsage: u32 {
		const VERTEX = 1;
		const INDEX = 2;
		const UNIFORM = 4;
		const STORAGE = 8;
		const TRANSFER_SRC = 16;
		const TRANSFER_DST = 32;
		const ACCELERATION_STRUCTURE = 64;
		const SHADER_BINDING_TABLE = 128;
	}
}

impl BufferUsage {
	/// Usages that need the buffer's device address to be queryable.
	pub fn needs_device_address(&self) -> bool {
		self.intersects(
			BufferUsage::VERTEX
				| BufferUsage::INDEX
				| BufferUsage::STORAGE
				| BufferUsage::ACCELERATION_STRUCTURE
				| BufferUsage::SHADER_BINDING_TABLE,
		)
	}
}

bitflags! {
	/// Bits match the native image usage bits.
	#[repr(transparent)]
	#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
	pub struct ImageUsage: u32 {
		const TRANSFER_SRC = 1;
		const TRANSFER_DST = 2;
		const SAMPLED = 4;
		const STORAGE = 8;
		const COLOR_ATTACHMENT = 16;
		const DEPTH_STENCIL_ATTACHMENT = 32;
		const TRANSIENT = 64;
		const INPUT = 128;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_depth_stencil_classification() {
		assert!(Format::D32Sfloat.is_depth() && !Format::D32Sfloat.has_stencil());
		assert!(Format::D24UnormS8Uint.is_depth() && Format::D24UnormS8Uint.has_stencil());
		assert!(!Format::S8Uint.is_depth() && Format::S8Uint.has_stencil());
		assert!(!Format::R32G32B32A32Sfloat.is_depth() && !Format::R32G32B32A32Sfloat.has_stencil());
	}

	#[test]
	fn test_native_numbering() {
		assert_eq!(u32::from(Format::R32G32B32A32Sfloat), 109);
		assert_eq!(u32::from(Format::B8G8R8A8Unorm), 44);
		assert_eq!(Format::try_from(37), Ok(Format::R8G8B8A8Unorm));
		assert!(Format::try_from(2).is_err());
		assert_eq!(Format::R32G32B32A32Sfloat.bytes_per_pixel(), 16);
	}

	#[test]
	fn test_device_address_usage() {
		assert!(BufferUsage::STORAGE.needs_device_address());
		assert!((BufferUsage::VERTEX | BufferUsage::TRANSFER_DST).needs_device_address());
		assert!(!(BufferUsage::UNIFORM | BufferUsage::TRANSFER_SRC).needs_device_address());
	}
}
