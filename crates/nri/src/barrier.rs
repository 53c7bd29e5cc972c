//! Explicit image layout tracking. Every image records the layout it was last transitioned to, and each resource
//! operation requests exactly one [`Transition`] to a fixed target layout with a fixed access and stage mask pair.
//! Nothing is inferred: callers issue operations in the order the image is used.

use ash::vk::{AccessFlags, PipelineStageFlags};

#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum ImageLayout {
	#[default]
	Undefined,
	TransferDst,
	/// storage image access
	General,
	/// sampled texture access
	ShaderReadOnly,
	ColorAttachment,
	DepthAttachment,
	PresentSrc,
}

/// The operation an image is being prepared for.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub enum Transition {
	/// clears and uploads
	TransferDst,
	Storage,
	Texture,
	Present,
	/// a freshly acquired swapchain image about to be rendered to
	RenderTarget,
	DepthAttachment,
	/// a newly created swapchain image handed to the presentation engine
	SwapchainInit,
}

impl Transition {
	pub const fn target_layout(&self) -> ImageLayout {
		match self {
			Transition::TransferDst => ImageLayout::TransferDst,
			Transition::Storage => ImageLayout::General,
			Transition::Texture => ImageLayout::ShaderReadOnly,
			Transition::Present | Transition::SwapchainInit => ImageLayout::PresentSrc,
			Transition::RenderTarget => ImageLayout::ColorAttachment,
			Transition::DepthAttachment => ImageLayout::DepthAttachment,
		}
	}

	/// `(src_access, dst_access, src_stage, dst_stage)`
	pub fn masks(&self) -> (AccessFlags, AccessFlags, PipelineStageFlags, PipelineStageFlags) {
		let written_access = AccessFlags::TRANSFER_WRITE | AccessFlags::COLOR_ATTACHMENT_WRITE;
		let written_stage = PipelineStageFlags::TRANSFER | PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT;
		match self {
			Transition::TransferDst => (
				AccessFlags::NONE,
				AccessFlags::TRANSFER_WRITE,
				PipelineStageFlags::TOP_OF_PIPE,
				PipelineStageFlags::TRANSFER,
			),
			Transition::Storage => (
				written_access,
				AccessFlags::SHADER_READ | AccessFlags::SHADER_WRITE,
				written_stage,
				PipelineStageFlags::COMPUTE_SHADER
					| PipelineStageFlags::FRAGMENT_SHADER
					| PipelineStageFlags::VERTEX_SHADER,
			),
			Transition::Texture => (
				written_access,
				AccessFlags::SHADER_READ,
				written_stage,
				PipelineStageFlags::FRAGMENT_SHADER
					| PipelineStageFlags::VERTEX_SHADER
					| PipelineStageFlags::COMPUTE_SHADER,
			),
			Transition::Present => (
				written_access,
				AccessFlags::MEMORY_READ,
				written_stage,
				PipelineStageFlags::BOTTOM_OF_PIPE,
			),
			Transition::RenderTarget => (
				AccessFlags::MEMORY_READ,
				AccessFlags::COLOR_ATTACHMENT_WRITE,
				PipelineStageFlags::BOTTOM_OF_PIPE,
				PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
			),
			Transition::DepthAttachment => (
				AccessFlags::NONE,
				AccessFlags::DEPTH_STENCIL_ATTACHMENT_READ | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
				PipelineStageFlags::TOP_OF_PIPE,
				PipelineStageFlags::EARLY_FRAGMENT_TESTS | PipelineStageFlags::LATE_FRAGMENT_TESTS,
			),
			Transition::SwapchainInit => (
				AccessFlags::NONE,
				AccessFlags::MEMORY_READ,
				PipelineStageFlags::TOP_OF_PIPE,
				PipelineStageFlags::BOTTOM_OF_PIPE,
			),
		}
	}
}

/// One layout transition to be recorded as an image memory barrier.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LayoutTransition {
	pub old_layout: ImageLayout,
	pub new_layout: ImageLayout,
	pub src_access: AccessFlags,
	pub dst_access: AccessFlags,
	pub src_stage: PipelineStageFlags,
	pub dst_stage: PipelineStageFlags,
}

/// The layout an image was last transitioned to.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ImageLayoutState {
	layout: ImageLayout,
}

impl ImageLayoutState {
	pub const fn new(layout: ImageLayout) -> Self {
		Self { layout }
	}

	pub const fn layout(&self) -> ImageLayout {
		self.layout
	}

	/// Records `transition` and returns the barrier to emit. The recorded layout always becomes the target layout,
	/// whether or not the barrier is actually submitted.
	pub fn transition(&mut self, transition: Transition) -> LayoutTransition {
		let old_layout = self.layout;
		if cfg!(debug_assertions) {
			if let Some(warning) = sequence_warning(old_layout, transition) {
				log::warn!("{:?} -> {:?}: {}", old_layout, transition, warning);
			}
		}
		let (src_access, dst_access, src_stage, dst_stage) = transition.masks();
		self.layout = transition.target_layout();
		LayoutTransition {
			old_layout,
			new_layout: self.layout,
			src_access,
			dst_access,
			src_stage,
			dst_stage,
		}
	}
}

/// Debug builds check each transition against the layout it starts from and warn about sequences that read
/// contents that were never written.
pub fn sequence_warning(old: ImageLayout, transition: Transition) -> Option<&'static str> {
	match (old, transition) {
		(ImageLayout::Undefined, Transition::Texture) => Some("sampling an image that was never written"),
		(ImageLayout::Undefined, Transition::Present) => Some("presenting an image that was never written"),
		(ImageLayout::PresentSrc, Transition::SwapchainInit) => Some("swapchain image initialized twice"),
		_ => None,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_starts_undefined() {
		assert_eq!(ImageLayoutState::default().layout(), ImageLayout::Undefined);
	}

	#[test]
	fn test_texture_idempotent() {
		let mut once = ImageLayoutState::default();
		once.transition(Transition::TransferDst);
		once.transition(Transition::Texture);

		let mut twice = ImageLayoutState::default();
		twice.transition(Transition::TransferDst);
		twice.transition(Transition::Texture);
		let second = twice.transition(Transition::Texture);

		assert_eq!(once, twice);
		assert_eq!(twice.layout(), ImageLayout::ShaderReadOnly);
		assert_eq!(second.old_layout, ImageLayout::ShaderReadOnly);
		assert_eq!(second.new_layout, ImageLayout::ShaderReadOnly);
	}

	#[test]
	fn test_transfer_to_texture_masks() {
		let mut state = ImageLayoutState::default();
		state.transition(Transition::TransferDst);
		let barrier = state.transition(Transition::Texture);
		assert_eq!(barrier.old_layout, ImageLayout::TransferDst);
		assert!(barrier.src_access.contains(AccessFlags::TRANSFER_WRITE));
		assert_eq!(barrier.dst_access, AccessFlags::SHADER_READ);
		assert!(barrier.src_stage.contains(PipelineStageFlags::TRANSFER));
		assert_eq!(
			barrier.dst_stage,
			PipelineStageFlags::FRAGMENT_SHADER | PipelineStageFlags::VERTEX_SHADER | PipelineStageFlags::COMPUTE_SHADER
		);
	}

	#[test]
	fn test_full_sequence() {
		let mut state = ImageLayoutState::default();
		let steps = [
			(Transition::TransferDst, ImageLayout::TransferDst),
			(Transition::Storage, ImageLayout::General),
			(Transition::Texture, ImageLayout::ShaderReadOnly),
			(Transition::Present, ImageLayout::PresentSrc),
			(Transition::RenderTarget, ImageLayout::ColorAttachment),
			(Transition::Present, ImageLayout::PresentSrc),
		];
		let mut previous = ImageLayout::Undefined;
		for (transition, expected) in steps {
			let barrier = state.transition(transition);
			assert_eq!(barrier.old_layout, previous);
			assert_eq!(barrier.new_layout, expected);
			assert_eq!(state.layout(), expected);
			previous = expected;
		}
	}

	#[test]
	fn test_out_of_order_is_recorded_anyway() {
		let mut state = ImageLayoutState::default();
		let barrier = state.transition(Transition::Present);
		assert_eq!(barrier.old_layout, ImageLayout::Undefined);
		assert_eq!(state.layout(), ImageLayout::PresentSrc);
	}

	#[test]
	fn test_sequence_warnings() {
		assert!(sequence_warning(ImageLayout::Undefined, Transition::Texture).is_some());
		assert!(sequence_warning(ImageLayout::Undefined, Transition::Present).is_some());
		assert!(sequence_warning(ImageLayout::Undefined, Transition::SwapchainInit).is_none());
		assert!(sequence_warning(ImageLayout::TransferDst, Transition::Texture).is_none());
		assert!(sequence_warning(ImageLayout::ColorAttachment, Transition::Present).is_none());
	}
}
