use crate::error::NriError;
use crate::program::{ComputeProgram, GraphicsProgram, Program, ProgramBuilder, ProgramDesc, RayTracingProgram};
use crate::platform::ash::command::AshCommandBuffer;
use crate::platform::ash::nri::{AshContext, AshNri};
use crate::platform::ash::raii::{PipelineGuard, PipelineLayoutGuard, ShaderModuleGuard};
use crate::shader::{ShaderCreateInfo, ShaderError};
use ash::vk::{
	BlendFactor, BlendOp, ColorComponentFlags, CompareOp, ComputePipelineCreateInfo, CullModeFlags, DynamicState,
	FrontFace, GraphicsPipelineCreateInfo, PipelineBindPoint, PipelineCache, PipelineColorBlendAttachmentState,
	PipelineColorBlendStateCreateInfo, PipelineDepthStencilStateCreateInfo, PipelineDynamicStateCreateInfo,
	PipelineInputAssemblyStateCreateInfo, PipelineLayoutCreateInfo, PipelineMultisampleStateCreateInfo,
	PipelineRasterizationStateCreateInfo, PipelineRenderingCreateInfo, PipelineShaderStageCreateInfo,
	PipelineVertexInputStateCreateInfo, PipelineViewportStateCreateInfo, PolygonMode, SampleCountFlags,
	ShaderModuleCreateInfo, ShaderStageFlags, VertexInputAttributeDescription, VertexInputBindingDescription,
};
use smallvec::SmallVec;
use std::ffi::CString;
use std::rc::Rc;

/// A compiled shader stage together with its entry point.
struct AshShaderModule {
	module: ShaderModuleGuard,
	entry_point: CString,
	stage: ShaderStageFlags,
}

impl AshShaderModule {
	fn new(ctx: &AshContext, info: &ShaderCreateInfo) -> Result<Self, NriError> {
		let code = ctx.shaders.load(info)?;
		let entry_point = CString::new(info.entry_point.as_str())
			.map_err(|_| ShaderError::InvalidEntryPoint(info.entry_point.clone()))?;
		unsafe {
			let device = &ctx.device;
			let module = device
				.device
				.create_shader_module(&ShaderModuleCreateInfo::default().code(&code), None)?;
			Ok(Self {
				module: ShaderModuleGuard::new(device, module),
				entry_point,
				stage: info.stage.to_ash_stage_flags(),
			})
		}
	}

	fn to_shader_stage_create_info(&self) -> PipelineShaderStageCreateInfo<'_> {
		PipelineShaderStageCreateInfo::default()
			.module(*self.module)
			.name(&self.entry_point)
			.stage(self.stage)
	}
}

pub struct AshProgramBuilder {
	ctx: Rc<AshContext>,
	desc: ProgramDesc,
}

impl AshProgramBuilder {
	pub fn new(ctx: &Rc<AshContext>) -> Self {
		Self {
			ctx: ctx.clone(),
			desc: ProgramDesc::default(),
		}
	}

	pub fn desc(&self) -> &ProgramDesc {
		&self.desc
	}

	fn create_pipeline_layout(&self) -> Result<PipelineLayoutGuard, NriError> {
		let push_constant_ranges = self
			.desc
			.push_constant_ranges
			.iter()
			.map(|range| ash::vk::PushConstantRange {
				stage_flags: ShaderStageFlags::ALL,
				offset: range.offset,
				size: range.size,
			})
			.collect::<SmallVec<[_; 2]>>();
		unsafe {
			let device = &self.ctx.device;
			let layout = device.device.create_pipeline_layout(
				&PipelineLayoutCreateInfo::default()
					.set_layouts(&[self.ctx.descriptors.borrow().layout()])
					.push_constant_ranges(&push_constant_ranges),
				None,
			)?;
			Ok(PipelineLayoutGuard::new(device, layout))
		}
	}
}

impl ProgramBuilder<AshNri> for AshProgramBuilder {
	type Graphics = AshGraphicsProgram;
	type Compute = AshComputeProgram;
	type RayTracing = AshRayTracingProgram;

	fn desc_mut(&mut self) -> &mut ProgramDesc {
		&mut self.desc
	}

	fn build_graphics_program(&mut self) -> Result<AshGraphicsProgram, NriError> {
		profiling::scope!("build_graphics_program");
		let modules = self
			.desc
			.stages
			.iter()
			.map(|info| AshShaderModule::new(&self.ctx, info))
			.collect::<Result<SmallVec<[_; 2]>, _>>()?;
		let stages = modules
			.iter()
			.map(AshShaderModule::to_shader_stage_create_info)
			.collect::<SmallVec<[_; 2]>>();
		let layout = self.create_pipeline_layout()?;

		let bindings = self
			.desc
			.vertex_bindings
			.iter()
			.map(|binding| VertexInputBindingDescription {
				binding: binding.binding,
				stride: binding.stride,
				input_rate: binding.input_rate.to_ash_input_rate(),
			})
			.collect::<SmallVec<[_; 2]>>();
		let attributes = self
			.desc
			.vertex_bindings
			.iter()
			.flat_map(|binding| {
				binding.attributes.iter().map(|attr| VertexInputAttributeDescription {
					location: attr.location,
					binding: binding.binding,
					format: attr.format.to_ash_format(),
					offset: attr.offset,
				})
			})
			.collect::<SmallVec<[_; 4]>>();

		let depth_test = self.desc.depth_format.is_some();
		let color_formats = [self.desc.color_format.to_ash_format()];
		let depth_format = self
			.desc
			.depth_format
			.map_or(ash::vk::Format::UNDEFINED, |format| format.to_ash_format());

		unsafe {
			let device = &self.ctx.device;
			let pipelines = device
				.device
				.create_graphics_pipelines(
					PipelineCache::null(),
					&[GraphicsPipelineCreateInfo::default()
						.layout(*layout)
						.stages(&stages)
						.vertex_input_state(
							&PipelineVertexInputStateCreateInfo::default()
								.vertex_binding_descriptions(&bindings)
								.vertex_attribute_descriptions(&attributes),
						)
						.input_assembly_state(
							&PipelineInputAssemblyStateCreateInfo::default()
								.topology(self.desc.primitive_type.to_ash_topology()),
						)
						// both set dynamically
						.viewport_state(
							&PipelineViewportStateCreateInfo::default()
								.viewport_count(1)
								.scissor_count(1),
						)
						.rasterization_state(
							&PipelineRasterizationStateCreateInfo::default()
								.polygon_mode(PolygonMode::FILL)
								.cull_mode(CullModeFlags::NONE)
								.front_face(FrontFace::CLOCKWISE)
								.line_width(1.0),
						)
						.multisample_state(
							&PipelineMultisampleStateCreateInfo::default()
								.rasterization_samples(SampleCountFlags::TYPE_1),
						)
						.depth_stencil_state(
							&PipelineDepthStencilStateCreateInfo::default()
								.depth_test_enable(depth_test)
								.depth_write_enable(depth_test)
								.depth_compare_op(CompareOp::LESS),
						)
						.color_blend_state(
							&PipelineColorBlendStateCreateInfo::default().attachments(&[
								PipelineColorBlendAttachmentState::default()
									.blend_enable(true)
									.src_color_blend_factor(BlendFactor::ONE)
									.dst_color_blend_factor(BlendFactor::ONE_MINUS_SRC_ALPHA)
									.color_blend_op(BlendOp::ADD)
									.src_alpha_blend_factor(BlendFactor::ONE)
									.dst_alpha_blend_factor(BlendFactor::ZERO)
									.alpha_blend_op(BlendOp::ADD)
									.color_write_mask(ColorComponentFlags::RGBA),
							]),
						)
						.dynamic_state(&PipelineDynamicStateCreateInfo::default().dynamic_states(&[
							DynamicState::VIEWPORT,
							DynamicState::SCISSOR,
							DynamicState::BLEND_CONSTANTS,
						]))
						.push_next(
							&mut PipelineRenderingCreateInfo::default()
								.color_attachment_formats(&color_formats)
								.depth_attachment_format(depth_format),
						)],
					None,
				)
				// as we only alloc one pipeline, `e.0.len() == 0` and we don't need to write drop logic
				.map_err(|e| e.1)?;
			Ok(AshGraphicsProgram(AshProgram {
				ctx: self.ctx.clone(),
				pipeline: PipelineGuard::new(device, pipelines[0]),
				layout,
				bind_point: PipelineBindPoint::GRAPHICS,
			}))
		}
	}

	fn build_compute_program(&mut self) -> Result<AshComputeProgram, NriError> {
		profiling::scope!("build_compute_program");
		let module = AshShaderModule::new(&self.ctx, self.desc.compute_stage()?)?;
		let layout = self.create_pipeline_layout()?;
		unsafe {
			let device = &self.ctx.device;
			let pipelines = device
				.device
				.create_compute_pipelines(
					PipelineCache::null(),
					&[ComputePipelineCreateInfo::default()
						.layout(*layout)
						.stage(module.to_shader_stage_create_info())],
					None,
				)
				.map_err(|e| e.1)?;
			Ok(AshComputeProgram(AshProgram {
				ctx: self.ctx.clone(),
				pipeline: PipelineGuard::new(device, pipelines[0]),
				layout,
				bind_point: PipelineBindPoint::COMPUTE,
			}))
		}
	}

	fn build_ray_tracing_program(&mut self, _: &mut AshCommandBuffer) -> Result<AshRayTracingProgram, NriError> {
		Err(NriError::NotImplemented("Ray tracing pipeline creation"))
	}
}

/// A pipeline and its layout, which includes the bindless set at set 0.
pub struct AshProgram {
	ctx: Rc<AshContext>,
	// destroyed before its layout
	pipeline: PipelineGuard,
	layout: PipelineLayoutGuard,
	bind_point: PipelineBindPoint,
}

impl AshProgram {
	pub fn pipeline(&self) -> ash::vk::Pipeline {
		*self.pipeline
	}

	pub fn layout(&self) -> ash::vk::PipelineLayout {
		*self.layout
	}
}

impl Program<AshNri> for AshProgram {
	fn bind(&self, command_buffer: &mut AshCommandBuffer) {
		unsafe {
			let device = command_buffer.device();
			device.cmd_bind_pipeline(command_buffer.handle(), self.bind_point, *self.pipeline);
			device.cmd_bind_descriptor_sets(
				command_buffer.handle(),
				self.bind_point,
				*self.layout,
				0,
				&[self.ctx.descriptors.borrow().set()],
				&[],
			);
		}
	}

	fn unbind(&self, _: &mut AshCommandBuffer) {}

	fn set_push_constants(&self, command_buffer: &mut AshCommandBuffer, data: &[u8], offset: u32) {
		unsafe {
			command_buffer.device().cmd_push_constants(
				command_buffer.handle(),
				*self.layout,
				ShaderStageFlags::ALL,
				offset,
				data,
			);
		}
	}
}

macro_rules! delegate_program {
	($name:ident) => {
		impl Program<AshNri> for $name {
			fn bind(&self, command_buffer: &mut AshCommandBuffer) {
				self.0.bind(command_buffer)
			}

			fn unbind(&self, command_buffer: &mut AshCommandBuffer) {
				self.0.unbind(command_buffer)
			}

			fn set_push_constants(&self, command_buffer: &mut AshCommandBuffer, data: &[u8], offset: u32) {
				self.0.set_push_constants(command_buffer, data, offset)
			}
		}
	};
}

pub struct AshGraphicsProgram(pub AshProgram);
delegate_program!(AshGraphicsProgram);

impl GraphicsProgram<AshNri> for AshGraphicsProgram {
	fn draw(
		&self,
		command_buffer: &mut AshCommandBuffer,
		vertex_count: u32,
		instance_count: u32,
		first_vertex: u32,
		first_instance: u32,
	) {
		unsafe {
			command_buffer.device().cmd_draw(
				command_buffer.handle(),
				vertex_count,
				instance_count,
				first_vertex,
				first_instance,
			);
		}
	}

	fn draw_indexed(
		&self,
		command_buffer: &mut AshCommandBuffer,
		index_count: u32,
		instance_count: u32,
		first_index: u32,
		vertex_offset: i32,
		first_instance: u32,
	) {
		unsafe {
			command_buffer.device().cmd_draw_indexed(
				command_buffer.handle(),
				index_count,
				instance_count,
				first_index,
				vertex_offset,
				first_instance,
			);
		}
	}
}

pub struct AshComputeProgram(pub AshProgram);
delegate_program!(AshComputeProgram);

impl ComputeProgram<AshNri> for AshComputeProgram {
	fn dispatch(&self, command_buffer: &mut AshCommandBuffer, x: u32, y: u32, z: u32) {
		unsafe {
			command_buffer.device().cmd_dispatch(command_buffer.handle(), x, y, z);
		}
	}
}

/// Ray tracing programs cannot be built on this backend.
pub enum AshRayTracingProgram {}

impl Program<AshNri> for AshRayTracingProgram {
	fn bind(&self, _: &mut AshCommandBuffer) {
		match *self {}
	}

	fn unbind(&self, _: &mut AshCommandBuffer) {
		match *self {}
	}

	fn set_push_constants(&self, _: &mut AshCommandBuffer, _: &[u8], _: u32) {
		match *self {}
	}
}

impl RayTracingProgram<AshNri> for AshRayTracingProgram {
	fn trace_rays(&self, _: &mut AshCommandBuffer, _: u32, _: u32, _: u32) -> Result<(), NriError> {
		match *self {}
	}
}
