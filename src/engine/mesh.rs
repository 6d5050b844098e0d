// Procedural mesh types and triangulation.
//
//   Heightfield / uv_sphere() → PolyMesh → triangulate_smooth() → RenderMesh → GPU

use std::f32::consts::{PI, TAU};
use glam::Vec3;

// ============================================================================
// GPU VERTEX
// ============================================================================

/// GPU-ready vertex for lit scene geometry:
///   @location(0) position: vec3<f32>
///   @location(1) normal:   vec3<f32>
///   @location(2) color:    vec3<f32>
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],
    pub normal:   [f32; 3],
    pub color:    [f32; 3],
}

impl GpuVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GpuVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

// ============================================================================
// POLY MESH
// ============================================================================

/// Intermediate polygon mesh for procedural construction.
/// Faces are CCW-ordered vertex index lists of any length ≥ 3.
/// Only built at startup; heap allocation per face is acceptable.
pub struct PolyMesh {
    pub positions: Vec<Vec3>,
    pub faces:     Vec<Vec<usize>>,
}

impl PolyMesh {
    pub fn new() -> Self {
        Self {
            positions: Vec::new(),
            faces:     Vec::new(),
        }
    }

    /// Add a vertex and return its index.
    pub fn add_vertex(&mut self, pos: Vec3) -> usize {
        let idx = self.positions.len();
        self.positions.push(pos);
        idx
    }

    /// Add a face by vertex indices (CCW order).
    pub fn add_face(&mut self, indices: Vec<usize>) {
        debug_assert!(indices.len() >= 3, "Face must have at least 3 vertices");
        self.faces.push(indices);
    }

    pub fn vertex_count(&self) -> usize { self.positions.len() }
}

// ============================================================================
// RENDER MESH
// ============================================================================

/// GPU-ready triangulated mesh with per-vertex normals.
pub struct RenderMesh {
    pub vertices: Vec<GpuVertex>,
    pub indices:  Vec<u32>,
}

impl RenderMesh {
    /// Cast vertex slice to raw bytes for wgpu buffer upload.
    pub fn vertex_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// Cast index slice to raw bytes for wgpu buffer upload.
    pub fn index_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.indices)
    }

    pub fn index_count(&self) -> usize { self.indices.len() }
}

// ============================================================================
// TRIANGULATION + SMOOTH NORMALS
// ============================================================================

/// Convert a PolyMesh to a RenderMesh with area-weighted smooth normals.
/// `color` is evaluated once per vertex from its position and final normal.
///
/// The un-normalized cross product of each fan triangle has magnitude 2×area,
/// so summing them per vertex weights larger faces more.
pub fn triangulate_smooth(poly: &PolyMesh, color: impl Fn(Vec3, Vec3) -> [f32; 3]) -> RenderMesh {
    let mut normal_accum: Vec<Vec3> = vec![Vec3::ZERO; poly.vertex_count()];
    let mut indices: Vec<u32> = Vec::new();

    for face in &poly.faces {
        for i in 1..(face.len() - 1) {
            let (a, b, c) = (face[0], face[i], face[i + 1]);
            let n = (poly.positions[b] - poly.positions[a]).cross(poly.positions[c] - poly.positions[a]);
            normal_accum[a] += n;
            normal_accum[b] += n;
            normal_accum[c] += n;
            indices.extend([a as u32, b as u32, c as u32]);
        }
    }

    let vertices = poly.positions.iter()
        .zip(normal_accum.iter())
        .map(|(&pos, n)| {
            let normal = n.normalize_or_zero();
            GpuVertex {
                position: pos.to_array(),
                normal:   normal.to_array(),
                color:    color(pos, normal),
            }
        })
        .collect();

    RenderMesh { vertices, indices }
}

// ============================================================================
// PRIMITIVES
// ============================================================================

/// Latitude/longitude sphere centred on the origin.
/// Poles are single vertices; the caps are triangle fans and the body is quads.
pub fn uv_sphere(radius: f32, rings: usize, segments: usize) -> PolyMesh {
    let rings = rings.max(2);
    let segments = segments.max(3);
    let mut mesh = PolyMesh::new();

    let north = mesh.add_vertex(Vec3::Y * radius);
    // ring r (1..rings) sits at polar angle PI * r / rings
    for r in 1..rings {
        let theta = PI * r as f32 / rings as f32;
        for s in 0..segments {
            let phi = TAU * s as f32 / segments as f32;
            mesh.add_vertex(Vec3::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            ) * radius);
        }
    }
    let south = mesh.add_vertex(-Vec3::Y * radius);

    let ring_vertex = |r: usize, s: usize| 1 + (r - 1) * segments + s % segments;

    for s in 0..segments {
        mesh.add_face(vec![north, ring_vertex(1, s + 1), ring_vertex(1, s)]);
    }
    for r in 1..(rings - 1) {
        for s in 0..segments {
            mesh.add_face(vec![
                ring_vertex(r, s),
                ring_vertex(r, s + 1),
                ring_vertex(r + 1, s + 1),
                ring_vertex(r + 1, s),
            ]);
        }
    }
    for s in 0..segments {
        mesh.add_face(vec![south, ring_vertex(rings - 1, s), ring_vertex(rings - 1, s + 1)]);
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uv_sphere_counts() {
        let sphere = uv_sphere(1.0, 8, 12);
        // two poles plus (rings - 1) rings of `segments`
        assert_eq!(sphere.vertex_count(), 2 + 7 * 12);
        assert_eq!(sphere.faces.len(), 12 * 8);
    }

    #[test]
    fn test_uv_sphere_vertices_on_radius() {
        let sphere = uv_sphere(2.5, 6, 10);
        for p in &sphere.positions {
            assert!((p.length() - 2.5).abs() < 1e-4);
        }
    }

    #[test]
    fn test_sphere_normals_point_outward() {
        let mesh = triangulate_smooth(&uv_sphere(1.0, 10, 16), |_, _| [1.0; 3]);
        for v in &mesh.vertices {
            let p = Vec3::from_array(v.position);
            let n = Vec3::from_array(v.normal);
            assert!(p.dot(n) > 0.9, "inward normal at {p:?}");
        }
    }

    #[test]
    fn test_triangulate_fans_quads() {
        let mut quad = PolyMesh::new();
        let a = quad.add_vertex(Vec3::ZERO);
        let b = quad.add_vertex(Vec3::X);
        let c = quad.add_vertex(Vec3::new(1.0, 0.0, -1.0));
        let d = quad.add_vertex(Vec3::new(0.0, 0.0, -1.0));
        quad.add_face(vec![a, b, c, d]);

        let mesh = triangulate_smooth(&quad, |p, _| [p.x, 0.0, 0.0]);
        assert_eq!(mesh.indices, vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.index_count(), 6);
        for v in &mesh.vertices {
            assert_eq!(v.normal, [0.0, 1.0, 0.0]);
        }
        assert_eq!(mesh.vertices[1].color, [1.0, 0.0, 0.0]);
    }
}
