// Ground heightfield.
//
// A square grid of heights centred on the origin. Everything that must stay
// glued to the ground (player, grass, swarm floor) is handed a &Heightfield
// and queries height_at() directly instead of raycasting scene geometry.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use super::mesh::{PolyMesh, RenderMesh, triangulate_smooth};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundConfig {
    /// Edge length of the square ground in world units.
    pub size: f32,
    /// Grid cells per edge.
    pub resolution: u32,
    /// Peak height of the rolling hills.
    pub amplitude: f32,
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            size: 80.0,
            resolution: 128,
            amplitude: 1.6,
        }
    }
}

pub struct Heightfield {
    /// (resolution + 1)² samples, row-major along X then Z.
    heights: Vec<f32>,
    resolution: u32,
    size: f32,
}

impl Heightfield {
    /// Rolling hills from a few summed sine waves.
    pub fn generate(config: &GroundConfig) -> Self {
        let resolution = config.resolution.max(1);
        let amplitude = config.amplitude;
        Self::from_fn(config.size, resolution, |x, z| {
            let hills = (x * 0.11).sin() * (z * 0.09).cos() * 0.6
                + (x * 0.05 + z * 0.07).sin() * 0.3
                + ((x - z) * 0.23).sin() * 0.1;
            hills * amplitude
        })
    }

    pub fn from_fn(size: f32, resolution: u32, height: impl Fn(f32, f32) -> f32) -> Self {
        let samples = resolution + 1;
        let mut heights = Vec::with_capacity((samples * samples) as usize);
        let half = size * 0.5;
        let step = size / resolution as f32;
        for iz in 0..samples {
            for ix in 0..samples {
                heights.push(height(ix as f32 * step - half, iz as f32 * step - half));
            }
        }
        Self { heights, resolution, size }
    }

    pub fn half_extent(&self) -> f32 { self.size * 0.5 }

    /// Clamp an XZ position to the ground bounds.
    pub fn clamp_xz(&self, xz: Vec2) -> Vec2 {
        let h = self.half_extent();
        xz.clamp(Vec2::splat(-h), Vec2::splat(h))
    }

    fn sample(&self, ix: u32, iz: u32) -> f32 {
        let samples = self.resolution + 1;
        self.heights[(iz.min(self.resolution) * samples + ix.min(self.resolution)) as usize]
    }

    /// Bilinear height at a world XZ position. Positions outside the grid use the edge.
    pub fn height_at(&self, x: f32, z: f32) -> f32 {
        let step = self.size / self.resolution as f32;
        let gx = ((x + self.half_extent()) / step).clamp(0.0, self.resolution as f32);
        let gz = ((z + self.half_extent()) / step).clamp(0.0, self.resolution as f32);

        let ix = (gx.floor() as u32).min(self.resolution - 1);
        let iz = (gz.floor() as u32).min(self.resolution - 1);
        let fx = gx - ix as f32;
        let fz = gz - iz as f32;

        let h00 = self.sample(ix, iz);
        let h10 = self.sample(ix + 1, iz);
        let h01 = self.sample(ix, iz + 1);
        let h11 = self.sample(ix + 1, iz + 1);

        let near = h00 + (h10 - h00) * fx;
        let far = h01 + (h11 - h01) * fx;
        near + (far - near) * fz
    }

    /// Surface normal from central differences.
    pub fn normal_at(&self, x: f32, z: f32) -> Vec3 {
        let e = self.size / self.resolution as f32 * 0.5;
        let dx = self.height_at(x + e, z) - self.height_at(x - e, z);
        let dz = self.height_at(x, z + e) - self.height_at(x, z - e);
        Vec3::new(-dx, 2.0 * e, -dz).normalize()
    }

    /// Grid quads with CCW winding seen from above.
    pub fn to_poly_mesh(&self) -> PolyMesh {
        let mut mesh = PolyMesh::new();
        let samples = self.resolution + 1;
        let step = self.size / self.resolution as f32;
        let half = self.half_extent();

        for iz in 0..samples {
            for ix in 0..samples {
                mesh.add_vertex(Vec3::new(
                    ix as f32 * step - half,
                    self.sample(ix, iz),
                    iz as f32 * step - half,
                ));
            }
        }

        let idx = |ix: u32, iz: u32| (iz * samples + ix) as usize;
        for iz in 0..self.resolution {
            for ix in 0..self.resolution {
                mesh.add_face(vec![idx(ix, iz), idx(ix, iz + 1), idx(ix + 1, iz + 1), idx(ix + 1, iz)]);
            }
        }
        mesh
    }

    /// Ground render mesh: grass green in the hollows fading to dry yellow on the crests.
    pub fn build_mesh(&self, amplitude: f32) -> RenderMesh {
        let low = Vec3::new(0.16, 0.32, 0.12);
        let high = Vec3::new(0.45, 0.48, 0.22);
        let range = amplitude.max(1e-3);
        triangulate_smooth(&self.to_poly_mesh(), |p, _| {
            let t = ((p.y / range) * 0.5 + 0.5).clamp(0.0, 1.0);
            low.lerp(high, t).to_array()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slope() -> Heightfield {
        // h = x + 2z, exactly representable by bilinear interpolation
        Heightfield::from_fn(10.0, 10, |x, z| x + 2.0 * z)
    }

    #[test]
    fn test_height_at_grid_points() {
        let ground = slope();
        assert!((ground.height_at(-5.0, -5.0) - -15.0).abs() < 1e-4);
        assert!((ground.height_at(5.0, 5.0) - 15.0).abs() < 1e-4);
        assert!(ground.height_at(0.0, 0.0).abs() < 1e-4);
    }

    #[test]
    fn test_height_at_interpolates() {
        let ground = slope();
        assert!((ground.height_at(0.3, -1.7) - (0.3 - 3.4)).abs() < 1e-4);
    }

    #[test]
    fn test_height_outside_bounds_uses_edge() {
        let ground = slope();
        assert!((ground.height_at(50.0, 0.0) - ground.height_at(5.0, 0.0)).abs() < 1e-4);
        assert!((ground.height_at(0.0, -50.0) - ground.height_at(0.0, -5.0)).abs() < 1e-4);
    }

    #[test]
    fn test_flat_ground_normal_is_up() {
        let ground = Heightfield::from_fn(10.0, 4, |_, _| 2.0);
        let n = ground.normal_at(1.0, 1.0);
        assert!((n - Vec3::Y).length() < 1e-5);
    }

    #[test]
    fn test_mesh_faces_up() {
        let ground = Heightfield::from_fn(4.0, 2, |_, _| 0.0);
        let mesh = ground.build_mesh(1.0);
        assert_eq!(mesh.vertices.len(), 9);
        assert_eq!(mesh.index_count(), 4 * 6);
        for v in &mesh.vertices {
            assert!(v.normal[1] > 0.99);
        }
    }

    #[test]
    fn test_generated_heights_bounded_by_amplitude() {
        let config = GroundConfig { size: 40.0, resolution: 32, amplitude: 2.0 };
        let ground = Heightfield::generate(&config);
        for &h in &ground.heights {
            assert!(h.abs() <= 2.0 + 1e-4);
        }
    }
}
