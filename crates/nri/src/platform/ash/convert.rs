use crate::barrier::{ImageLayout, LayoutTransition};
use crate::format::{BufferUsage, Format, ImageUsage, IndexType};
use crate::program::{PrimitiveType, VertexInputRate};
use crate::shader::ShaderStage;
use ash::vk::{
	BufferUsageFlags, ImageAspectFlags, ImageMemoryBarrier, ImageSubresourceRange, ImageUsageFlags, PrimitiveTopology,
	ShaderStageFlags, QUEUE_FAMILY_IGNORED, REMAINING_ARRAY_LAYERS, REMAINING_MIP_LEVELS,
};

impl Format {
	pub fn to_ash_format(&self) -> ash::vk::Format {
		ash::vk::Format::from_raw(u32::from(*self) as i32)
	}

	pub fn from_ash_format(format: ash::vk::Format) -> Option<Self> {
		Format::try_from(format.as_raw() as u32).ok()
	}

	pub fn to_ash_aspect(&self) -> ImageAspectFlags {
		if self.is_depth() && self.has_stencil() {
			ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL
		} else if self.is_depth() {
			ImageAspectFlags::DEPTH
		} else if self.has_stencil() {
			ImageAspectFlags::STENCIL
		} else {
			ImageAspectFlags::COLOR
		}
	}

	pub fn to_ash_full_subresource(&self) -> ImageSubresourceRange {
		ImageSubresourceRange {
			aspect_mask: self.to_ash_aspect(),
			base_mip_level: 0,
			level_count: REMAINING_MIP_LEVELS,
			base_array_layer: 0,
			layer_count: REMAINING_ARRAY_LAYERS,
		}
	}
}

impl BufferUsage {
	pub fn to_ash_buffer_usage_flags(&self) -> BufferUsageFlags {
		let mut out = BufferUsageFlags::empty();
		if self.contains(BufferUsage::VERTEX) {
			out |= BufferUsageFlags::VERTEX_BUFFER;
		}
		if self.contains(BufferUsage::INDEX) {
			out |= BufferUsageFlags::INDEX_BUFFER;
		}
		if self.contains(BufferUsage::UNIFORM) {
			out |= BufferUsageFlags::UNIFORM_BUFFER;
		}
		if self.contains(BufferUsage::STORAGE) {
			out |= BufferUsageFlags::STORAGE_BUFFER;
		}
		if self.contains(BufferUsage::TRANSFER_SRC) {
			out |= BufferUsageFlags::TRANSFER_SRC;
		}
		if self.contains(BufferUsage::TRANSFER_DST) {
			out |= BufferUsageFlags::TRANSFER_DST;
		}
		if self.contains(BufferUsage::ACCELERATION_STRUCTURE) {
			out |= BufferUsageFlags::ACCELERATION_STRUCTURE_STORAGE_KHR;
		}
		if self.contains(BufferUsage::SHADER_BINDING_TABLE) {
			out |= BufferUsageFlags::SHADER_BINDING_TABLE_KHR;
		}
		if self.needs_device_address() {
			out |= BufferUsageFlags::SHADER_DEVICE_ADDRESS;
		}
		// empty flags are invalid in vulkan
		if out.is_empty() {
			BufferUsageFlags::TRANSFER_SRC
		} else {
			out
		}
	}
}

impl ImageUsage {
	pub fn to_ash_image_usage_flags(&self) -> ImageUsageFlags {
		// bits are identical
		ImageUsageFlags::from_raw(self.bits())
	}
}

impl ImageLayout {
	pub fn to_ash_image_layout(&self) -> ash::vk::ImageLayout {
		match self {
			ImageLayout::Undefined => ash::vk::ImageLayout::UNDEFINED,
			ImageLayout::TransferDst => ash::vk::ImageLayout::TRANSFER_DST_OPTIMAL,
			ImageLayout::General => ash::vk::ImageLayout::GENERAL,
			ImageLayout::ShaderReadOnly => ash::vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
			ImageLayout::ColorAttachment => ash::vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
			ImageLayout::DepthAttachment => ash::vk::ImageLayout::DEPTH_ATTACHMENT_OPTIMAL,
			ImageLayout::PresentSrc => ash::vk::ImageLayout::PRESENT_SRC_KHR,
		}
	}
}

impl LayoutTransition {
	/// The barrier covering every mip level and array layer of `image`.
	pub fn to_ash_image_barrier(&self, image: ash::vk::Image, format: Format) -> ImageMemoryBarrier<'static> {
		ImageMemoryBarrier::default()
			.image(image)
			.old_layout(self.old_layout.to_ash_image_layout())
			.new_layout(self.new_layout.to_ash_image_layout())
			.src_access_mask(self.src_access)
			.dst_access_mask(self.dst_access)
			.src_queue_family_index(QUEUE_FAMILY_IGNORED)
			.dst_queue_family_index(QUEUE_FAMILY_IGNORED)
			.subresource_range(format.to_ash_full_subresource())
	}
}

impl IndexType {
	pub fn to_ash_index_type(&self) -> ash::vk::IndexType {
		match self {
			IndexType::U16 => ash::vk::IndexType::UINT16,
			IndexType::U32 => ash::vk::IndexType::UINT32,
		}
	}
}

impl PrimitiveType {
	pub fn to_ash_topology(&self) -> PrimitiveTopology {
		match self {
			PrimitiveType::Triangles => PrimitiveTopology::TRIANGLE_LIST,
			PrimitiveType::TriangleStrip => PrimitiveTopology::TRIANGLE_STRIP,
			PrimitiveType::Lines => PrimitiveTopology::LINE_LIST,
			PrimitiveType::LineStrip => PrimitiveTopology::LINE_STRIP,
			PrimitiveType::Points => PrimitiveTopology::POINT_LIST,
		}
	}
}

impl VertexInputRate {
	pub fn to_ash_input_rate(&self) -> ash::vk::VertexInputRate {
		match self {
			VertexInputRate::Vertex => ash::vk::VertexInputRate::VERTEX,
			VertexInputRate::Instance => ash::vk::VertexInputRate::INSTANCE,
		}
	}
}

impl ShaderStage {
	pub fn to_ash_stage_flags(&self) -> ShaderStageFlags {
		match self {
			ShaderStage::Vertex => ShaderStageFlags::VERTEX,
			ShaderStage::Fragment => ShaderStageFlags::FRAGMENT,
			ShaderStage::Compute => ShaderStageFlags::COMPUTE,
			ShaderStage::Geometry => ShaderStageFlags::GEOMETRY,
			ShaderStage::TessellationControl => ShaderStageFlags::TESSELLATION_CONTROL,
			ShaderStage::TessellationEvaluation => ShaderStageFlags::TESSELLATION_EVALUATION,
			ShaderStage::Raygen => ShaderStageFlags::RAYGEN_KHR,
			ShaderStage::AnyHit => ShaderStageFlags::ANY_HIT_KHR,
			ShaderStage::ClosestHit => ShaderStageFlags::CLOSEST_HIT_KHR,
			ShaderStage::Miss => ShaderStageFlags::MISS_KHR,
			ShaderStage::Intersection => ShaderStageFlags::INTERSECTION_KHR,
			ShaderStage::Mesh => ShaderStageFlags::MESH_EXT,
			ShaderStage::Task => ShaderStageFlags::TASK_EXT,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::barrier::{ImageLayoutState, Transition};

	#[test]
	fn test_format_roundtrip() {
		assert_eq!(Format::B8G8R8A8Unorm.to_ash_format(), ash::vk::Format::B8G8R8A8_UNORM);
		assert_eq!(Format::D32Sfloat.to_ash_format(), ash::vk::Format::D32_SFLOAT);
		assert_eq!(Format::R32G32B32A32Sfloat.to_ash_format(), ash::vk::Format::R32G32B32A32_SFLOAT);
		assert_eq!(
			Format::from_ash_format(ash::vk::Format::R8G8B8A8_SRGB),
			Some(Format::R8G8B8A8Srgb)
		);
		assert_eq!(Format::from_ash_format(ash::vk::Format::BC7_UNORM_BLOCK), None);
	}

	#[test]
	fn test_aspect() {
		assert_eq!(Format::R8G8B8A8Unorm.to_ash_aspect(), ImageAspectFlags::COLOR);
		assert_eq!(Format::D32Sfloat.to_ash_aspect(), ImageAspectFlags::DEPTH);
		assert_eq!(
			Format::D24UnormS8Uint.to_ash_aspect(),
			ImageAspectFlags::DEPTH | ImageAspectFlags::STENCIL
		);
	}

	#[test]
	fn test_buffer_usage() {
		assert_eq!(
			BufferUsage::TRANSFER_SRC.to_ash_buffer_usage_flags(),
			BufferUsageFlags::TRANSFER_SRC
		);
		assert_eq!(
			(BufferUsage::STORAGE | BufferUsage::TRANSFER_DST).to_ash_buffer_usage_flags(),
			BufferUsageFlags::STORAGE_BUFFER | BufferUsageFlags::TRANSFER_DST | BufferUsageFlags::SHADER_DEVICE_ADDRESS
		);
		assert_eq!(
			BufferUsage::empty().to_ash_buffer_usage_flags(),
			BufferUsageFlags::TRANSFER_SRC
		);
	}

	#[test]
	fn test_image_usage_bits() {
		assert_eq!(
			(ImageUsage::TRANSFER_DST | ImageUsage::SAMPLED).to_ash_image_usage_flags(),
			ImageUsageFlags::TRANSFER_DST | ImageUsageFlags::SAMPLED
		);
		assert_eq!(
			ImageUsage::all().to_ash_image_usage_flags(),
			ImageUsageFlags::TRANSFER_SRC
				| ImageUsageFlags::TRANSFER_DST
				| ImageUsageFlags::SAMPLED
				| ImageUsageFlags::STORAGE
				| ImageUsageFlags::COLOR_ATTACHMENT
				| ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
				| ImageUsageFlags::TRANSIENT_ATTACHMENT
				| ImageUsageFlags::INPUT_ATTACHMENT
		);
	}

	#[test]
	fn test_barrier() {
		let mut state = ImageLayoutState::default();
		let barrier = state
			.transition(Transition::TransferDst)
			.to_ash_image_barrier(ash::vk::Image::null(), Format::R8G8B8A8Unorm);
		assert_eq!(barrier.old_layout, ash::vk::ImageLayout::UNDEFINED);
		assert_eq!(barrier.new_layout, ash::vk::ImageLayout::TRANSFER_DST_OPTIMAL);
		assert_eq!(barrier.dst_access_mask, ash::vk::AccessFlags::TRANSFER_WRITE);
		assert_eq!(barrier.subresource_range.aspect_mask, ImageAspectFlags::COLOR);
		assert_eq!(barrier.subresource_range.level_count, REMAINING_MIP_LEVELS);
	}
}
