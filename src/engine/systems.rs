// ECS systems for the ambient swarm
// Each runs once per frame over every entity with the matching components

use bevy_ecs::prelude::*;
use glam::Vec3;
use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use super::components::*;
use super::ground::Heightfield;

/// Members never sink closer than this to the ground surface.
const MIN_CLEARANCE: f32 = 0.2;

/// Extra inset past the orbit radius, covering steering overshoot.
const EDGE_MARGIN: f32 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    pub count: usize,
    pub seed: u64,
    /// Radius of the loose circle each member flies around its anchor.
    pub orbit_radius: f32,
    pub max_speed: f32,
    /// Steering gain toward the orbit point (1/s²).
    pub steering: f32,
    /// Velocity lost per second, so members settle onto their orbit.
    pub damping: f32,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            count: 600,
            seed: 42,
            orbit_radius: 2.5,
            max_speed: 3.0,
            steering: 2.0,
            damping: 1.5,
        }
    }
}

/// Half extent of the square anchors may occupy: a full orbit around any
/// anchor in it stays on the ground.
fn anchor_extent(ground: &Heightfield, config: &SwarmConfig) -> f32 {
    (ground.half_extent() - config.orbit_radius - EDGE_MARGIN).max(0.0)
}

/// Scatter swarm members over the ground with random warm colours.
pub fn spawn_swarm(world: &mut World, ground: &Heightfield, config: &SwarmConfig) {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let inner = anchor_extent(ground, config);

    for _ in 0..config.count {
        let (x, z) = if inner > 0.0 {
            (rng.gen_range(-inner..inner), rng.gen_range(-inner..inner))
        } else {
            (0.0, 0.0)
        };
        let hover = rng.gen_range(0.6..3.5);
        let position = Vec3::new(x, ground.height_at(x, z) + hover, z);

        world.spawn((
            Transform::from_position(position),
            Velocity::new(Vec3::ZERO),
            Color {
                r: rng.gen_range(0.8..1.0),
                g: rng.gen_range(0.5..0.9),
                b: rng.gen_range(0.1..0.4),
            },
            SwarmMember {
                anchor: position,
                phase: rng.gen_range(0.0..std::f32::consts::TAU),
                hover,
            },
        ));
    }

    log::info!("Spawned {} swarm members", config.count);
}

/// Steer each member toward a point circling its anchor.
pub fn swarm_steer_system(world: &mut World, config: &SwarmConfig, time: f32, dt: f32) {
    let mut query = world.query::<(&Transform, &mut Velocity, &SwarmMember)>();
    for (transform, mut velocity, member) in query.iter_mut(world) {
        let t = time * 0.4 + member.phase;
        let orbit = Vec3::new(
            t.cos() * config.orbit_radius,
            (t * 1.7).sin() * 0.4,
            t.sin() * config.orbit_radius,
        );
        let goal = member.anchor + orbit;
        let pull = (goal - transform.position) * config.steering - velocity.linear * config.damping;
        velocity.linear += pull * dt;
        velocity.linear = velocity.linear.clamp_length_max(config.max_speed);
    }
}

/// Update entity positions based on velocity
/// Applies velocity * delta_time to position
pub fn movement_system(world: &mut World, dt: f32) {
    let mut query = world.query::<(&mut Transform, &Velocity)>();
    for (mut transform, velocity) in query.iter_mut(world) {
        transform.position += velocity.linear * dt;
    }
}

/// Wrap around the ground edges on X/Z and keep members above the surface.
/// Anchors wrap with their member, then are pulled back inside the anchor
/// square so the orbit never crosses the edge again.
pub fn bounds_system(world: &mut World, ground: &Heightfield, config: &SwarmConfig) {
    let half = ground.half_extent();
    let inner = anchor_extent(ground, config);
    let mut query = world.query::<(&mut Transform, &mut SwarmMember)>();
    for (mut transform, mut member) in query.iter_mut(world) {
        let p = &mut transform.position;
        let shift_x = if p.x > half { -2.0 * half } else if p.x < -half { 2.0 * half } else { 0.0 };
        let shift_z = if p.z > half { -2.0 * half } else if p.z < -half { 2.0 * half } else { 0.0 };
        if shift_x != 0.0 || shift_z != 0.0 {
            p.x += shift_x;
            p.z += shift_z;
            member.anchor.x += shift_x;
            member.anchor.z += shift_z;
        }

        let ax = member.anchor.x.clamp(-inner, inner);
        let az = member.anchor.z.clamp(-inner, inner);
        if ax != member.anchor.x || az != member.anchor.z {
            member.anchor = Vec3::new(ax, ground.height_at(ax, az) + member.hover, az);
        }

        let floor = ground.height_at(p.x, p.z) + MIN_CLEARANCE;
        if p.y < floor {
            p.y = floor;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> Heightfield {
        Heightfield::from_fn(20.0, 10, |_, _| 0.0)
    }

    #[test]
    fn test_spawn_swarm_count() {
        let mut world = World::new();
        let config = SwarmConfig { count: 25, ..SwarmConfig::default() };
        spawn_swarm(&mut world, &flat(), &config);
        let count = world.query::<&SwarmMember>().iter(&world).count();
        assert_eq!(count, 25);
    }

    #[test]
    fn test_movement_applies_velocity() {
        let mut world = World::new();
        let e = world.spawn((Transform::from_position(Vec3::ZERO), Velocity::new(Vec3::new(1.0, 2.0, 3.0)))).id();
        movement_system(&mut world, 0.5);
        let t = world.get::<Transform>(e).map(|t| t.position);
        assert_eq!(t, Some(Vec3::new(0.5, 1.0, 1.5)));
    }

    #[test]
    fn test_bounds_wrap_and_floor() {
        let mut world = World::new();
        let config = SwarmConfig::default();
        let member = SwarmMember { anchor: Vec3::new(5.0, 1.0, 0.0), phase: 0.0, hover: 1.0 };
        let e = world.spawn((Transform::from_position(Vec3::new(11.0, -3.0, 0.0)), member)).id();
        bounds_system(&mut world, &flat(), &config);

        let p = world.get::<Transform>(e).map(|t| t.position).unwrap_or(Vec3::NAN);
        assert!((p.x - -9.0).abs() < 1e-5);
        assert!((p.y - MIN_CLEARANCE).abs() < 1e-5);
        // Shifted to -15, then pulled back to the anchor square (10 - 2.5 - 1)
        let anchor = world.get::<SwarmMember>(e).map(|m| m.anchor).unwrap_or(Vec3::NAN);
        assert!((anchor.x - -6.5).abs() < 1e-5);
        assert!((anchor.y - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_spawned_anchors_leave_room_to_orbit() {
        let mut world = World::new();
        let config = SwarmConfig { count: 200, ..SwarmConfig::default() };
        spawn_swarm(&mut world, &flat(), &config);
        let inner = 10.0 - config.orbit_radius;
        for member in world.query::<&SwarmMember>().iter(&world) {
            assert!(member.anchor.x.abs() < inner && member.anchor.z.abs() < inner);
        }
    }

    #[test]
    fn test_member_near_edge_does_not_keep_wrapping() {
        // 80-unit ground, anchored one unit from the +X edge
        let ground = Heightfield::from_fn(80.0, 16, |_, _| 0.0);
        let config = SwarmConfig::default();
        let mut world = World::new();
        let start = Vec3::new(39.0, 1.0, 0.0);
        let member = SwarmMember { anchor: start, phase: 0.0, hover: 1.0 };
        let e = world.spawn((Transform::from_position(start), Velocity::new(Vec3::ZERO), member)).id();

        let dt = 1.0 / 60.0;
        let mut wraps = 0;
        let mut last_x = start.x;
        for i in 0..3600 {
            swarm_steer_system(&mut world, &config, i as f32 * dt, dt);
            movement_system(&mut world, dt);
            bounds_system(&mut world, &ground, &config);
            let x = world.get::<Transform>(e).map(|t| t.position.x).unwrap_or(f32::NAN);
            if (x - last_x).abs() > 40.0 {
                wraps += 1;
            }
            last_x = x;
        }

        assert!(wraps <= 1, "wrapped {wraps} times");
        let anchor = world.get::<SwarmMember>(e).map(|m| m.anchor).unwrap_or(Vec3::NAN);
        assert!(anchor.x.abs() <= 40.0 - config.orbit_radius);
    }

    #[test]
    fn test_steering_respects_max_speed() {
        let mut world = World::new();
        let config = SwarmConfig::default();
        let member = SwarmMember { anchor: Vec3::new(100.0, 0.0, 0.0), phase: 0.0, hover: 1.0 };
        let e = world.spawn((Transform::default(), Velocity::new(Vec3::ZERO), member)).id();
        for i in 0..50 {
            swarm_steer_system(&mut world, &config, i as f32 * 0.1, 0.1);
        }
        let v = world.get::<Velocity>(e).map(|v| v.linear).unwrap_or(Vec3::NAN);
        assert!(v.length() <= config.max_speed + 1e-4);
        assert!(v.x > 0.0);
    }
}
