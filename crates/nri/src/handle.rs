use static_assertions::const_assert_eq;
use std::fmt::{Debug, Formatter};
use std::mem;
use thiserror::Error;

pub const HANDLE_INDEX_BITS: u32 = 29;
pub const HANDLE_WRITABLE_BITS: u32 = 1;
pub const HANDLE_TYPE_BITS: u32 = 2;

const HANDLE_INDEX_MASK: u32 = (1 << HANDLE_INDEX_BITS) - 1;
const HANDLE_WRITABLE_MASK: u32 = (1 << HANDLE_WRITABLE_BITS) - 1;
const HANDLE_TYPE_MASK: u32 = (1 << HANDLE_TYPE_BITS) - 1;

const HANDLE_INDEX_SHIFT: u32 = 0;
const HANDLE_WRITABLE_SHIFT: u32 = HANDLE_INDEX_BITS;
const HANDLE_TYPE_SHIFT: u32 = HANDLE_INDEX_BITS + HANDLE_WRITABLE_BITS;

// uses all 32 bits
const_assert_eq!(HANDLE_INDEX_BITS + HANDLE_WRITABLE_BITS + HANDLE_TYPE_BITS, 32);
// masks use entire 32 bit range
const_assert_eq!(
	HANDLE_INDEX_MASK << HANDLE_INDEX_SHIFT
		| HANDLE_WRITABLE_MASK << HANDLE_WRITABLE_SHIFT
		| HANDLE_TYPE_MASK << HANDLE_TYPE_SHIFT,
	!0
);
// masks do not overlap
const_assert_eq!(HANDLE_INDEX_MASK << HANDLE_INDEX_SHIFT & HANDLE_WRITABLE_MASK << HANDLE_WRITABLE_SHIFT, 0);
const_assert_eq!(HANDLE_INDEX_MASK << HANDLE_INDEX_SHIFT & HANDLE_TYPE_MASK << HANDLE_TYPE_SHIFT, 0);
const_assert_eq!(HANDLE_WRITABLE_MASK << HANDLE_WRITABLE_SHIFT & HANDLE_TYPE_MASK << HANDLE_TYPE_SHIFT, 0);

/// The largest index a [`ResourceHandle`] can carry.
pub const MAX_HANDLE_INDEX: u32 = HANDLE_INDEX_MASK;

/// Which bindless table a [`ResourceHandle`] points into. The discriminants are part of the shader ABI.
#[repr(u32)]
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum ResourceType {
	ImageSampler = 0,
	StorageImage = 1,
	Buffer = 2,
	Tlas = 3,
}

impl ResourceType {
	pub const ALL: [ResourceType; 4] = [
		ResourceType::ImageSampler,
		ResourceType::StorageImage,
		ResourceType::Buffer,
		ResourceType::Tlas,
	];

	const fn from_bits(bits: u32) -> Self {
		match bits & HANDLE_TYPE_MASK {
			0 => ResourceType::ImageSampler,
			1 => ResourceType::StorageImage,
			2 => ResourceType::Buffer,
			_ => ResourceType::Tlas,
		}
	}
}

#[derive(Copy, Clone, Error, Eq, PartialEq)]
pub enum HandleError {
	#[error("handle index {0} does not fit into 29 bits")]
	IndexOverflow(u32),
	#[error("writable Tlas handle at the maximum index would alias the invalid handle")]
	AliasesInvalid,
}

impl Debug for HandleError {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		std::fmt::Display::fmt(self, f)
	}
}

/// A bit packed u32 that shaders use to index into the bindless descriptor table. The top 2 bits hold the
/// [`ResourceType`], the next bit whether the resource is writable and the low 29 bits the index within the table.
#[repr(transparent)]
#[derive(Copy, Clone, Hash, Eq, PartialEq)]
pub struct ResourceHandle(u32);
const_assert_eq!(mem::size_of::<ResourceHandle>(), 4);

impl ResourceHandle {
	/// The handle of a resource that has no descriptor. All bits are set.
	pub const INVALID: ResourceHandle = ResourceHandle(!0);

	/// Packs `ty`, `writable` and `index`. Fails if `index` does not fit into [`HANDLE_INDEX_BITS`] bits or if the
	/// encoding would equal [`Self::INVALID`].
	pub const fn new(ty: ResourceType, writable: bool, index: u32) -> Result<Self, HandleError> {
		if index & !HANDLE_INDEX_MASK != 0 {
			return Err(HandleError::IndexOverflow(index));
		}
		let handle = Self::new_unchecked(ty, writable, index);
		if handle.0 == Self::INVALID.0 {
			return Err(HandleError::AliasesInvalid);
		}
		Ok(handle)
	}

	/// Packs without range checks, excess index bits are masked off.
	pub const fn new_unchecked(ty: ResourceType, writable: bool, index: u32) -> Self {
		let mut value = 0;
		value |= ((ty as u32) & HANDLE_TYPE_MASK) << HANDLE_TYPE_SHIFT;
		value |= ((writable as u32) & HANDLE_WRITABLE_MASK) << HANDLE_WRITABLE_SHIFT;
		value |= (index & HANDLE_INDEX_MASK) << HANDLE_INDEX_SHIFT;
		Self(value)
	}

	pub const fn from_raw(raw: u32) -> Self {
		Self(raw)
	}

	pub const fn to_raw(&self) -> u32 {
		self.0
	}

	pub const fn resource_type(&self) -> ResourceType {
		ResourceType::from_bits(self.0 >> HANDLE_TYPE_SHIFT)
	}

	pub const fn is_writable(&self) -> bool {
		(self.0 >> HANDLE_WRITABLE_SHIFT) & HANDLE_WRITABLE_MASK != 0
	}

	pub const fn index(&self) -> u32 {
		(self.0 >> HANDLE_INDEX_SHIFT) & HANDLE_INDEX_MASK
	}

	pub const fn is_valid(&self) -> bool {
		self.0 != Self::INVALID.0
	}
}

impl Default for ResourceHandle {
	fn default() -> Self {
		Self::INVALID
	}
}

impl Debug for ResourceHandle {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		if self.is_valid() {
			f.debug_struct("ResourceHandle")
				.field("type", &self.resource_type())
				.field("writable", &self.is_writable())
				.field("index", &self.index())
				.finish()
		} else {
			f.write_str("ResourceHandle::INVALID")
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const SAMPLE_INDICES: [u32; 8] = [0, 1, 2, 499, 1000, 1 << 20, (1 << 28) + 7, MAX_HANDLE_INDEX - 1];

	#[test]
	fn test_round_trip() {
		for ty in ResourceType::ALL {
			for writable in [false, true] {
				for index in SAMPLE_INDICES {
					let handle = ResourceHandle::new(ty, writable, index).unwrap();
					assert_eq!(handle.resource_type(), ty);
					assert_eq!(handle.is_writable(), writable);
					assert_eq!(handle.index(), index);
				}
			}
		}
	}

	#[test]
	fn test_max_index() {
		for ty in ResourceType::ALL {
			for writable in [false, true] {
				match ResourceHandle::new(ty, writable, MAX_HANDLE_INDEX) {
					Ok(handle) => {
						assert_eq!((handle.resource_type(), handle.is_writable()), (ty, writable));
						assert_eq!(handle.index(), MAX_HANDLE_INDEX);
					}
					Err(e) => {
						assert_eq!((ty, writable), (ResourceType::Tlas, true));
						assert_eq!(e, HandleError::AliasesInvalid);
					}
				}
			}
		}
	}

	#[test]
	fn test_invalid_never_produced() {
		for ty in ResourceType::ALL {
			for writable in [false, true] {
				for index in SAMPLE_INDICES.into_iter().chain([MAX_HANDLE_INDEX]) {
					if let Ok(handle) = ResourceHandle::new(ty, writable, index) {
						assert_ne!(handle, ResourceHandle::INVALID);
						assert!(handle.is_valid());
					}
				}
			}
		}
		assert!(!ResourceHandle::default().is_valid());
	}

	#[test]
	fn test_index_overflow_rejected() {
		assert_eq!(
			ResourceHandle::new(ResourceType::Buffer, false, MAX_HANDLE_INDEX + 1),
			Err(HandleError::IndexOverflow(MAX_HANDLE_INDEX + 1))
		);
		assert_eq!(
			ResourceHandle::new(ResourceType::Buffer, true, u32::MAX),
			Err(HandleError::IndexOverflow(u32::MAX))
		);
	}

	#[test]
	fn test_bit_layout() {
		let handle = ResourceHandle::new(ResourceType::Buffer, true, 5).unwrap();
		assert_eq!(handle.to_raw(), (2 << 30) | (1 << 29) | 5);
		let handle = ResourceHandle::new(ResourceType::ImageSampler, false, 3).unwrap();
		assert_eq!(handle.to_raw(), 3);
		assert_eq!(ResourceHandle::from_raw(handle.to_raw()), handle);
	}
}
