// Spawn-point projection: where each ribbon of a multi-ribbon trail is anchored
// relative to a trail sample.
//
//   Center       → the sample position itself (single ribbon)
//   StaticRing   → fixed angles on a horizontal ring, ignores velocity
//   VelocityRing → ring trailing behind the direction of travel
//
// A zero-length vector is never normalized. VelocityRing drops to the
// StaticRing placement when the sample is (nearly) at rest.

use std::f32::consts::TAU;
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Below this speed the travel direction is considered undefined.
pub const VELOCITY_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpawnPattern {
    #[default]
    Center,
    StaticRing,
    VelocityRing,
}

impl SpawnPattern {
    /// Offset point for ribbon `index` out of `count` around a sample.
    pub fn project(&self, position: Vec3, velocity: Vec3, index: usize, count: usize, radius: f32) -> Vec3 {
        match self {
            SpawnPattern::Center => position,
            SpawnPattern::StaticRing => position + static_ring_offset(index, count, radius),
            SpawnPattern::VelocityRing => {
                let speed = velocity.length();
                if speed <= VELOCITY_EPSILON {
                    return position + static_ring_offset(index, count, radius);
                }
                let back = -velocity / speed;
                let (side, up) = ring_basis(back);
                let angle = ring_angle(index, count);
                position + back * radius + (side * angle.cos() + up * angle.sin()) * radius
            }
        }
    }
}

fn ring_angle(index: usize, count: usize) -> f32 {
    if count == 0 {
        return 0.0;
    }
    TAU * index as f32 / count as f32
}

fn static_ring_offset(index: usize, count: usize, radius: f32) -> Vec3 {
    let angle = ring_angle(index, count);
    Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
}

/// Orthonormal side/up pair perpendicular to a unit `back` direction.
/// `back` parallel to world up (vertical travel) uses world X as the side axis.
fn ring_basis(back: Vec3) -> (Vec3, Vec3) {
    let side = back.cross(Vec3::Y);
    let side = if side.length_squared() > 1e-6 { side.normalize() } else { Vec3::X };
    let up = side.cross(back).normalize();
    (side, up)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-4;

    #[test]
    fn test_center_returns_position() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(SpawnPattern::Center.project(p, Vec3::X, 2, 4, 0.5), p);
    }

    #[test]
    fn test_static_ring_ignores_velocity() {
        let p = Vec3::new(1.0, 0.0, 0.0);
        let a = SpawnPattern::StaticRing.project(p, Vec3::ZERO, 1, 4, 2.0);
        let b = SpawnPattern::StaticRing.project(p, Vec3::new(5.0, 0.0, -3.0), 1, 4, 2.0);
        assert!(a.distance(b) < EPS);
        // index 1 of 4 sits a quarter turn round: +Z
        assert!(a.distance(Vec3::new(1.0, 0.0, 2.0)) < EPS);
    }

    #[test]
    fn test_zero_velocity_falls_back_deterministically() {
        let p = Vec3::new(0.0, 1.0, 0.0);
        let first = SpawnPattern::VelocityRing.project(p, Vec3::ZERO, 2, 6, 0.3);
        for _ in 0..10 {
            let again = SpawnPattern::VelocityRing.project(p, Vec3::ZERO, 2, 6, 0.3);
            assert_eq!(first, again);
        }
        assert!(first.is_finite());
        let ring = SpawnPattern::StaticRing.project(p, Vec3::ZERO, 2, 6, 0.3);
        assert!(first.distance(ring) < EPS);
    }

    #[test]
    fn test_velocity_ring_trails_behind() {
        let p = Vec3::ZERO;
        let v = Vec3::new(0.0, 0.0, -4.0);
        for i in 0..8 {
            let s = SpawnPattern::VelocityRing.project(p, v, i, 8, 0.5);
            // Moving toward -Z, every ring point lies at +Z (behind)
            assert!((s.z - 0.5).abs() < EPS, "ring point {i} at {s:?}");
            // Ring radius around the back axis
            let radial = Vec3::new(s.x, s.y, 0.0).length();
            assert!((radial - 0.5).abs() < EPS);
        }
    }

    #[test]
    fn test_vertical_velocity_does_not_produce_nan() {
        let s = SpawnPattern::VelocityRing.project(Vec3::ZERO, Vec3::Y * 3.0, 0, 4, 1.0);
        assert!(s.is_finite());
        assert!((s.y + 1.0).abs() < EPS);
    }

    #[test]
    fn test_zero_count_is_guarded() {
        let s = SpawnPattern::StaticRing.project(Vec3::ZERO, Vec3::ZERO, 0, 0, 1.0);
        assert!(s.distance(Vec3::X) < EPS);
    }
}
