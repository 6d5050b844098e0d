// ECS components for the ambient swarm.
// Each firefly is an entity with Transform + Velocity + Color + SwarmMember.

use bevy_ecs::prelude::*;
use glam::Vec3;

/// Position of an entity in 3D space
#[derive(Component, Debug, Clone, Copy)]
pub struct Transform {
    pub position: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
        }
    }
}

impl Transform {
    pub fn from_position(position: Vec3) -> Self {
        Self { position }
    }
}

/// Velocity of an entity in 3D space (units per second)
#[derive(Component, Debug, Clone, Copy)]
pub struct Velocity {
    pub linear: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self { linear }
    }
}

/// Emissive RGB color, also used as the glow intensity
#[derive(Component, Debug, Clone, Copy)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// Swarm steering state.
///
/// `anchor`: point the member loosely circles. Fixed, except that
///           bounds_system moves it when the member wraps at the ground edge
///           and keeps it inside the anchor square.
/// `phase`:  per-member offset so the swarm does not pulse in lockstep.
/// `hover`:  preferred height above the ground.
#[derive(Component, Debug, Clone, Copy)]
pub struct SwarmMember {
    pub anchor: Vec3,
    pub phase:  f32,
    pub hover:  f32,
}
