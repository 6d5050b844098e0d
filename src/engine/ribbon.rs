// Ribbon mesh builder: turns a trail of anchor points into a tapered quad strip
// with per-vertex fade.
//
//   TrailHistory → SpawnPattern::project() → RibbonPoint[] → build_ribbon() → RibbonOutput
//
// Each pair of consecutive surviving points becomes one segment:
// 4 vertices, 2 triangles, 6 indices. Segments own their vertices (not shared
// with neighbours) so every segment can carry its own width vector.
//
// Two outputs:
//   RibbonMesh   → fresh Vecs per rebuild
//   RibbonBuffer → fixed capacity reused across rebuilds, only the valid prefix is uploaded

use glam::Vec3;
use super::spawn::SpawnPattern;
use super::trail::TrailHistory;

/// Points fading below this alpha are dropped instead of emitted as invisible geometry.
pub const ALPHA_CUTOFF: f32 = 0.01;

/// Segments shorter than this have no usable direction and are skipped.
const MIN_SEGMENT_LENGTH: f32 = 1e-5;

// ============================================================================
// GPU VERTEX
// ============================================================================

///   @location(0) position: vec3<f32>
///   @location(1) color:    vec4<f32>  (rgb premultiplied by alpha)
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RibbonVertex {
    pub position: [f32; 3],
    pub color:    [f32; 4],
}

impl RibbonVertex {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RibbonVertex>() as wgpu::BufferAddress,
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
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}

// ============================================================================
// STYLE + INPUT
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonStyle {
    /// Edge-to-edge width at the newest end.
    pub width: f32,
    pub color: [f32; 3],
    /// Lower bound of the position fade, so the tail never vanishes from position alone.
    pub fade_floor: f32,
    /// How quickly alpha falls off along the trail (1.0 = reaches the floor at the tail).
    pub fade_rate: f32,
    /// Fraction of the width lost at the oldest end.
    pub taper: f32,
}

impl Default for RibbonStyle {
    fn default() -> Self {
        Self {
            width: 0.3,
            color: [0.4, 0.8, 1.0],
            fade_floor: 0.1,
            fade_rate: 0.8,
            taper: 0.5,
        }
    }
}

/// One cross-section anchor of a ribbon, newest first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RibbonPoint {
    pub position:  Vec3,
    pub timestamp: f32,
}

/// Combined age × position fade for a point at `progress` (0 = newest, 1 = oldest).
pub fn fade_alpha(age: f32, lifetime: f32, progress: f32, style: &RibbonStyle) -> f32 {
    let age_fade = if lifetime > 0.0 { (1.0 - age / lifetime).max(0.0) } else { 0.0 };
    let position_fade = (1.0 - progress * style.fade_rate).max(style.fade_floor);
    age_fade * position_fade
}

// ============================================================================
// OUTPUTS
// ============================================================================

/// Destination for ribbon quads.
pub trait RibbonOutput {
    /// Discard everything written by the previous rebuild.
    fn reset(&mut self);
    /// Append one segment. Returns false when the output is full.
    fn push_quad(&mut self, quad: [RibbonVertex; 4]) -> bool;
}

/// Segment quad winding: v0/v1 at the newer end, v2/v3 at the older end.
const QUAD_INDICES: [u32; 6] = [0, 1, 2, 1, 3, 2];

/// Owned output: fresh Vecs per build. The frame loop streams through the
/// pooled `RibbonBuffer` instead, so only one-off builds and tests use this.
#[cfg_attr(not(test), allow(dead_code))]
#[derive(Debug, Default, Clone)]
pub struct RibbonMesh {
    pub vertices: Vec<RibbonVertex>,
    pub indices:  Vec<u32>,
}

#[cfg_attr(not(test), allow(dead_code))]
impl RibbonMesh {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segment_count(&self) -> usize { self.indices.len() / 6 }
    pub fn triangle_count(&self) -> usize { self.indices.len() / 3 }
}

impl RibbonOutput for RibbonMesh {
    fn reset(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    fn push_quad(&mut self, quad: [RibbonVertex; 4]) -> bool {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&quad);
        self.indices.extend(QUAD_INDICES.iter().map(|i| base + i));
        true
    }
}

/// Fixed-capacity ribbon storage. Allocated once; rebuilds overwrite the prefix
/// and `vertex_count` / `index_count` say how much of it is valid.
pub struct RibbonBuffer {
    vertices: Vec<RibbonVertex>,
    indices:  Vec<u32>,
    vertex_count: usize,
    index_count:  usize,
}

impl RibbonBuffer {
    /// Capacity is rounded down to whole segments (4 vertices each).
    pub fn with_segment_capacity(segments: usize) -> Self {
        Self {
            vertices: vec![RibbonVertex::default(); segments * 4],
            indices:  vec![0; segments * 6],
            vertex_count: 0,
            index_count:  0,
        }
    }

    pub fn vertex_count(&self) -> usize { self.vertex_count }
    pub fn index_count(&self) -> usize { self.index_count }

    /// Valid vertex prefix.
    pub fn vertices(&self) -> &[RibbonVertex] {
        &self.vertices[..self.vertex_count]
    }

    /// Valid index prefix.
    pub fn indices(&self) -> &[u32] {
        &self.indices[..self.index_count]
    }
}

impl RibbonOutput for RibbonBuffer {
    fn reset(&mut self) {
        self.vertex_count = 0;
        self.index_count = 0;
    }

    fn push_quad(&mut self, quad: [RibbonVertex; 4]) -> bool {
        if self.vertex_count + 4 > self.vertices.len() {
            return false;
        }
        let base = self.vertex_count;
        self.vertices[base..base + 4].copy_from_slice(&quad);
        for (slot, i) in self.indices[self.index_count..self.index_count + 6]
            .iter_mut()
            .zip(QUAD_INDICES)
        {
            *slot = base as u32 + i;
        }
        self.vertex_count += 4;
        self.index_count += 6;
        true
    }
}

// ============================================================================
// BUILDER
// ============================================================================

struct Anchor {
    position:   Vec3,
    half_width: f32,
    color:      [f32; 4],
}

/// Append one ribbon built from `points` (newest first) to `out`.
/// Returns false if `out` ran out of room part way through.
pub fn build_ribbon(
    points: &[RibbonPoint],
    now: f32,
    lifetime: f32,
    style: &RibbonStyle,
    out: &mut impl RibbonOutput,
) -> bool {
    if points.len() < 2 {
        return true;
    }

    let last = (points.len() - 1) as f32;
    let mut prev: Option<Anchor> = None;

    for (i, point) in points.iter().enumerate() {
        let progress = i as f32 / last;
        let alpha = fade_alpha(now - point.timestamp, lifetime, progress, style);
        if alpha < ALPHA_CUTOFF {
            continue;
        }

        let anchor = Anchor {
            position: point.position,
            half_width: style.width * 0.5 * (1.0 - progress * style.taper).max(0.0),
            color: [
                style.color[0] * alpha,
                style.color[1] * alpha,
                style.color[2] * alpha,
                alpha,
            ],
        };

        if let Some(newer) = &prev {
            let segment = anchor.position - newer.position;
            let length = segment.length();
            if length < MIN_SEGMENT_LENGTH {
                continue;
            }
            if !out.push_quad(segment_quad(newer, &anchor, segment / length)) {
                return false;
            }
        }
        prev = Some(anchor);
    }
    true
}

fn segment_quad(newer: &Anchor, older: &Anchor, direction: Vec3) -> [RibbonVertex; 4] {
    let side = direction.cross(Vec3::Y);
    let side = if side.length_squared() > 1e-8 { side.normalize() } else { Vec3::X };

    let vertex = |anchor: &Anchor, sign: f32| RibbonVertex {
        position: (anchor.position + side * anchor.half_width * sign).to_array(),
        color: anchor.color,
    };

    [vertex(newer, 1.0), vertex(newer, -1.0), vertex(older, 1.0), vertex(older, -1.0)]
}

/// Builds every ribbon of a multi-ribbon trail into a single output.
/// Keeps a scratch list so steady-state rebuilds do not allocate.
#[derive(Default)]
pub struct RibbonBuilder {
    scratch: Vec<RibbonPoint>,
}

impl RibbonBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn build(
        &mut self,
        history: &TrailHistory,
        pattern: SpawnPattern,
        ribbon_count: usize,
        spawn_radius: f32,
        now: f32,
        style: &RibbonStyle,
        out: &mut impl RibbonOutput,
    ) {
        out.reset();
        if history.is_empty() {
            return;
        }
        for ribbon in 0..ribbon_count {
            self.scratch.clear();
            self.scratch.extend(history.iter().map(|p| RibbonPoint {
                position: pattern.project(p.position, p.velocity, ribbon, ribbon_count, spawn_radius),
                timestamp: p.timestamp,
            }));
            if !build_ribbon(&self.scratch, now, history.lifetime, style, out) {
                log::trace!("ribbon output full after {} of {} ribbons", ribbon, ribbon_count);
                return;
            }
        }
    }
}
