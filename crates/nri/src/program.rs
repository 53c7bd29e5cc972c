use crate::error::NriError;
use crate::format::Format;
use crate::platform::Nri;
use crate::shader::ShaderCreateInfo;
use bytemuck::Pod;

#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum VertexInputRate {
	#[default]
	Vertex,
	Instance,
}

#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct VertexAttribute {
	pub location: u32,
	pub format: Format,
	pub offset: u32,
}

#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct VertexBinding {
	pub binding: u32,
	/// size of one element
	pub stride: u32,
	pub input_rate: VertexInputRate,
	pub attributes: Vec<VertexAttribute>,
}

#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq)]
pub enum PrimitiveType {
	#[default]
	Triangles,
	TriangleStrip,
	Lines,
	LineStrip,
	Points,
}

/// A push constant range, visible to all stages.
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq)]
pub struct PushConstantRange {
	pub offset: u32,
	pub size: u32,
}

/// Everything a [`ProgramBuilder`] collects before building a program.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct ProgramDesc {
	pub stages: Vec<ShaderCreateInfo>,
	pub vertex_bindings: Vec<VertexBinding>,
	pub primitive_type: PrimitiveType,
	pub push_constant_ranges: Vec<PushConstantRange>,
	/// format of the single color attachment graphics programs render to
	pub color_format: Format,
	/// depth attachment format, enables depth testing
	pub depth_format: Option<Format>,
}

impl Default for ProgramDesc {
	fn default() -> Self {
		Self {
			stages: Vec::new(),
			vertex_bindings: Vec::new(),
			primitive_type: PrimitiveType::default(),
			push_constant_ranges: Vec::new(),
			color_format: Format::B8G8R8A8Unorm,
			depth_format: None,
		}
	}
}

impl ProgramDesc {
	/// The only stage of a compute program.
	pub fn compute_stage(&self) -> Result<&ShaderCreateInfo, NriError> {
		match self.stages.as_slice() {
			[stage] => Ok(stage),
			stages => Err(NriError::ComputeStageCount(stages.len())),
		}
	}
}

pub trait ProgramBuilder<N: Nri> {
	type Graphics: GraphicsProgram<N>;
	type Compute: ComputeProgram<N>;
	type RayTracing: RayTracingProgram<N>;

	fn desc_mut(&mut self) -> &mut ProgramDesc;

	fn add_shader_module(&mut self, info: ShaderCreateInfo) -> &mut Self {
		self.desc_mut().stages.push(info);
		self
	}

	fn set_vertex_bindings(&mut self, bindings: Vec<VertexBinding>) -> &mut Self {
		self.desc_mut().vertex_bindings = bindings;
		self
	}

	fn set_primitive_type(&mut self, primitive_type: PrimitiveType) -> &mut Self {
		self.desc_mut().primitive_type = primitive_type;
		self
	}

	fn set_push_constant_ranges(&mut self, ranges: Vec<PushConstantRange>) -> &mut Self {
		self.desc_mut().push_constant_ranges = ranges;
		self
	}

	fn set_color_format(&mut self, format: Format) -> &mut Self {
		self.desc_mut().color_format = format;
		self
	}

	fn set_depth_format(&mut self, format: Option<Format>) -> &mut Self {
		self.desc_mut().depth_format = format;
		self
	}

	fn build_graphics_program(&mut self) -> Result<Self::Graphics, NriError>;

	/// Requires exactly one compute stage.
	fn build_compute_program(&mut self) -> Result<Self::Compute, NriError>;

	fn build_ray_tracing_program(&mut self, command_buffer: &mut N::CommandBuffer) -> Result<Self::RayTracing, NriError>;
}

pub trait Program<N: Nri> {
	/// Binds the pipeline and the bindless descriptor set.
	fn bind(&self, command_buffer: &mut N::CommandBuffer);

	fn unbind(&self, command_buffer: &mut N::CommandBuffer);

	fn set_push_constants(&self, command_buffer: &mut N::CommandBuffer, data: &[u8], offset: u32);

	fn push<T: Pod>(&self, command_buffer: &mut N::CommandBuffer, value: &T) {
		self.set_push_constants(command_buffer, bytemuck::bytes_of(value), 0);
	}
}

pub trait GraphicsProgram<N: Nri>: Program<N> {
	fn draw(
		&self,
		command_buffer: &mut N::CommandBuffer,
		vertex_count: u32,
		instance_count: u32,
		first_vertex: u32,
		first_instance: u32,
	);

	fn draw_indexed(
		&self,
		command_buffer: &mut N::CommandBuffer,
		index_count: u32,
		instance_count: u32,
		first_index: u32,
		vertex_offset: i32,
		first_instance: u32,
	);
}

pub trait ComputeProgram<N: Nri>: Program<N> {
	fn dispatch(&self, command_buffer: &mut N::CommandBuffer, x: u32, y: u32, z: u32);
}

pub trait RayTracingProgram<N: Nri>: Program<N> {
	fn trace_rays(&self, command_buffer: &mut N::CommandBuffer, width: u32, height: u32, depth: u32)
		-> Result<(), NriError>;
}
