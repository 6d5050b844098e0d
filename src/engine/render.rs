// GPU plumbing shared by the scene pipelines: uniform block, instance layouts,
// depth target, pipeline construction and the ribbon geometry upload.

use glam::{Mat4, Vec3};
use super::effect::RibbonSink;
use super::ribbon::RibbonVertex;
use super::shaders;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

// ============================================================================
// UNIFORM DATA
// ============================================================================

/// Mirrors `SceneUniforms` in shaders::PRELUDE.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniforms {
    pub view_proj:  [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    pub fog:        [f32; 4],
    pub light_dir:  [f32; 4],
    pub wind:       [f32; 4],
}

impl SceneUniforms {
    pub fn new() -> Self {
        Self {
            view_proj:  Mat4::IDENTITY.to_cols_array_2d(),
            camera_pos: [0.0; 4],
            fog:        [0.0; 4],
            light_dir:  [0.0, -1.0, 0.0, 0.0],
            wind:       [0.0; 4],
        }
    }
}

// ============================================================================
// INSTANCE DATA
// ============================================================================

/// Placement for a lit mesh draw (@location(3)): translation + uniform scale.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MeshInstance {
    pub offset: [f32; 3],
    pub scale:  f32,
}

impl MeshInstance {
    pub fn at(offset: Vec3) -> Self {
        Self { offset: offset.to_array(), scale: 1.0 }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 3,
                format: wgpu::VertexFormat::Float32x4,
            }],
        }
    }
}

/// Per swarm member: centre and emissive colour (alpha = pulse phase).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SwarmInstance {
    pub position: [f32; 3],
    pub _padding: f32,  // Align to 16 bytes
    pub color:    [f32; 4],
}

impl SwarmInstance {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SwarmInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

/// Swarm cube corner (@location(0)).
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CubeVertex {
    pub position: [f32; 3],
}

impl CubeVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<CubeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            }],
        }
    }
}

pub const CUBE_VERTICES: &[CubeVertex] = &[
    CubeVertex { position: [-0.05, -0.05,  0.05] },
    CubeVertex { position: [ 0.05, -0.05,  0.05] },
    CubeVertex { position: [ 0.05,  0.05,  0.05] },
    CubeVertex { position: [-0.05,  0.05,  0.05] },
    CubeVertex { position: [-0.05, -0.05, -0.05] },
    CubeVertex { position: [ 0.05, -0.05, -0.05] },
    CubeVertex { position: [ 0.05,  0.05, -0.05] },
    CubeVertex { position: [-0.05,  0.05, -0.05] },
];

pub const CUBE_INDICES: &[u16] = &[
    0, 1, 2,  0, 2, 3,  // Front
    5, 4, 7,  5, 7, 6,  // Back
    4, 0, 3,  4, 3, 7,  // Left
    1, 5, 6,  1, 6, 2,  // Right
    3, 2, 6,  3, 6, 7,  // Top
    4, 5, 1,  4, 1, 0,  // Bottom
];

// ============================================================================
// TARGETS + PIPELINES
// ============================================================================

pub fn create_depth_view(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width.max(1),
            height: config.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

/// Opaque geometry writes depth; glowing geometry adds light on top without occluding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Opaque,
    Additive,
}

pub struct PipelineSpec<'a> {
    pub label: &'a str,
    pub body: &'a str,
    pub buffers: &'a [wgpu::VertexBufferLayout<'a>],
    pub kind: PipelineKind,
    pub cull_mode: Option<wgpu::Face>,
}

const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::Zero,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

pub fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    surface_format: wgpu::TextureFormat,
    spec: &PipelineSpec,
) -> wgpu::RenderPipeline {
    let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(spec.label),
        source: wgpu::ShaderSource::Wgsl(shaders::compose(spec.body).into()),
    });

    let (blend, depth_write) = match spec.kind {
        PipelineKind::Opaque => (wgpu::BlendState::REPLACE, true),
        PipelineKind::Additive => (ADDITIVE, false),
    };

    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(spec.label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            buffers: spec.buffers,
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: surface_format,
                blend: Some(blend),
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: spec.cull_mode,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DEPTH_FORMAT,
            depth_write_enabled: depth_write,
            depth_compare: wgpu::CompareFunction::Less,
            stencil: wgpu::StencilState::default(),
            bias: wgpu::DepthBiasState::default(),
        }),
        multisample: wgpu::MultisampleState {
            count: 1,
            mask: !0,
            alpha_to_coverage_enabled: false,
        },
        multiview: None,
        cache: None,
    })
}

// ============================================================================
// RIBBON GEOMETRY
// ============================================================================

/// Dynamic vertex/index buffers for the trail ribbons.
/// Sized once for a segment capacity; each upload writes only the valid prefix
/// and the draw covers `0..index_count`.
pub struct RibbonRenderer {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer:  wgpu::Buffer,
    segment_capacity: usize,
    index_count: u32,
}

impl RibbonRenderer {
    pub fn new(device: &wgpu::Device, segment_capacity: usize) -> Self {
        let segment_capacity = segment_capacity.max(1);
        let vertex_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ribbon Vertex Buffer"),
            size: (segment_capacity * 4 * std::mem::size_of::<RibbonVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let index_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Ribbon Index Buffer"),
            size: (segment_capacity * 6 * std::mem::size_of::<u32>()) as u64,
            usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self { vertex_buffer, index_buffer, segment_capacity, index_count: 0 }
    }

    pub fn segment_capacity(&self) -> usize { self.segment_capacity }
    pub fn index_count(&self) -> u32 { self.index_count }

    /// Sink bound to the queue for this frame's upload.
    pub fn sink<'a>(&'a mut self, queue: &'a wgpu::Queue) -> RibbonUpload<'a> {
        RibbonUpload { queue, target: self }
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.index_count == 0 {
            return;
        }
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
        pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..self.index_count, 0, 0..1);
    }
}

/// Whole segments that fit both the incoming geometry and the GPU buffers.
/// Indices past the cut would reference vertices that were never written.
fn uploadable_segments(vertex_count: usize, index_count: usize, segment_capacity: usize) -> usize {
    (vertex_count / 4).min(index_count / 6).min(segment_capacity)
}

pub struct RibbonUpload<'a> {
    queue:  &'a wgpu::Queue,
    target: &'a mut RibbonRenderer,
}

impl RibbonSink for RibbonUpload<'_> {
    fn upload(&mut self, vertices: &[RibbonVertex], indices: &[u32]) {
        let segments = uploadable_segments(vertices.len(), indices.len(), self.target.segment_capacity);
        if segments == 0 {
            self.target.index_count = 0;
            return;
        }
        self.queue.write_buffer(&self.target.vertex_buffer, 0, bytemuck::cast_slice(&vertices[..segments * 4]));
        self.queue.write_buffer(&self.target.index_buffer, 0, bytemuck::cast_slice(&indices[..segments * 6]));
        self.target.index_count = (segments * 6) as u32;
    }

    fn clear(&mut self) {
        self.target.index_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_fits_within_capacity() {
        assert_eq!(uploadable_segments(16, 24, 10), 4);
        assert_eq!(uploadable_segments(0, 0, 10), 0);
    }

    #[test]
    fn test_upload_over_capacity_cuts_whole_segments() {
        // 12 segments offered to a buffer holding 5
        assert_eq!(uploadable_segments(48, 72, 5), 5);
    }

    #[test]
    fn test_upload_never_indexes_missing_vertices() {
        // Partial trailing segment in either stream is dropped
        assert_eq!(uploadable_segments(10, 24, 100), 2);
        assert_eq!(uploadable_segments(16, 13, 100), 2);
    }

    #[test]
    fn test_uniform_block_matches_prelude_size() {
        // mat4 + four vec4 rows
        assert_eq!(std::mem::size_of::<SceneUniforms>(), 64 + 4 * 16);
    }
}
