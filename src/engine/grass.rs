// Grass field: thousands of blade instances scattered on the heightfield,
// drawn with one instanced draw call. Wind sway happens in the vertex shader
// from the per-instance phase, the blade height and the scene time.

use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use super::ground::Heightfield;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrassConfig {
    pub count: usize,
    pub seed: u64,
    pub blade_height: f32,
    pub wind_strength: f32,
    pub wind_speed: f32,
}

impl Default for GrassConfig {
    fn default() -> Self {
        Self {
            count: 20_000,
            seed: 7,
            blade_height: 0.6,
            wind_strength: 0.25,
            wind_speed: 1.4,
        }
    }
}

// ============================================================================
// BLADE GEOMETRY (shared by every instance)
// ============================================================================

/// Blade vertex: xy across/up the blade in [-1,1]×[0,1], scaled per instance in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BladeVertex {
    pub position: [f32; 2],
}

impl BladeVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<BladeVertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x2,
            }],
        }
    }
}

/// Tapered blade: three stacked quads narrowing to a tip.
pub const BLADE_VERTICES: &[BladeVertex] = &[
    BladeVertex { position: [-1.0, 0.0] },
    BladeVertex { position: [ 1.0, 0.0] },
    BladeVertex { position: [-0.8, 0.35] },
    BladeVertex { position: [ 0.8, 0.35] },
    BladeVertex { position: [-0.5, 0.7] },
    BladeVertex { position: [ 0.5, 0.7] },
    BladeVertex { position: [ 0.0, 1.0] },
];

pub const BLADE_INDICES: &[u16] = &[
    0, 1, 2,  2, 1, 3,
    2, 3, 4,  4, 3, 5,
    4, 5, 6,
];

// ============================================================================
// INSTANCE DATA (per blade)
// ============================================================================

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GrassInstance {
    /// Root of the blade on the ground.
    pub position: [f32; 3],
    /// Facing angle around Y in radians.
    pub rotation: f32,
    pub color:    [f32; 3],
    pub height:   f32,
    /// Wind phase offset in radians.
    pub phase:    f32,
    pub width:    f32,
}

impl GrassInstance {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<GrassInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &[
                // position + rotation
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // color + height
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 4]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
                // phase + width
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 8]>() as wgpu::BufferAddress,
                    shader_location: 3,
                    format: wgpu::VertexFormat::Float32x2,
                },
            ],
        }
    }
}

pub struct GrassField {
    pub instances: Vec<GrassInstance>,
}

impl GrassField {
    /// Scatter `config.count` blades uniformly over the ground. Deterministic for a given seed.
    pub fn scatter(ground: &Heightfield, config: &GrassConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let half = ground.half_extent();
        let base = Vec3::new(0.22, 0.5, 0.14);
        let tip_tint = Vec3::new(0.5, 0.6, 0.2);

        let instances = (0..config.count)
            .map(|_| {
                let x = rng.gen_range(-half..half);
                let z = rng.gen_range(-half..half);
                // Steeper ground grows drier grass
                let slope = 1.0 - ground.normal_at(x, z).y;
                let tint = (rng.gen_range(0.0..1.0) + slope * 2.0).min(1.0);
                GrassInstance {
                    position: [x, ground.height_at(x, z), z],
                    rotation: rng.gen_range(0.0..std::f32::consts::TAU),
                    color:    base.lerp(tip_tint, tint * 0.6).to_array(),
                    height:   config.blade_height * rng.gen_range(0.6..1.4),
                    phase:    rng.gen_range(0.0..std::f32::consts::TAU),
                    width:    rng.gen_range(0.03..0.06),
                }
            })
            .collect();

        Self { instances }
    }

    pub fn len(&self) -> usize { self.instances.len() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ground() -> Heightfield {
        Heightfield::from_fn(20.0, 20, |x, z| (x * 0.3).sin() + z * 0.1)
    }

    #[test]
    fn test_scatter_count_and_bounds() {
        let config = GrassConfig { count: 500, ..GrassConfig::default() };
        let field = GrassField::scatter(&ground(), &config);
        assert_eq!(field.len(), 500);
        for blade in &field.instances {
            assert!(blade.position[0].abs() <= 10.0);
            assert!(blade.position[2].abs() <= 10.0);
            assert!(blade.height > 0.0);
        }
    }

    #[test]
    fn test_blades_rooted_on_ground() {
        let g = ground();
        let field = GrassField::scatter(&g, &GrassConfig { count: 200, ..GrassConfig::default() });
        for blade in &field.instances {
            let [x, y, z] = blade.position;
            assert!((y - g.height_at(x, z)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_scatter_is_deterministic_per_seed() {
        let config = GrassConfig { count: 50, ..GrassConfig::default() };
        let a = GrassField::scatter(&ground(), &config);
        let b = GrassField::scatter(&ground(), &config);
        let c = GrassField::scatter(&ground(), &GrassConfig { seed: 99, ..config });
        assert_eq!(a.instances[10].position, b.instances[10].position);
        assert_ne!(a.instances[10].position, c.instances[10].position);
    }

    #[test]
    fn test_blade_indices_in_range() {
        assert_eq!(BLADE_INDICES.len() % 3, 0);
        assert!(BLADE_INDICES.iter().all(|&i| (i as usize) < BLADE_VERTICES.len()));
    }
}
