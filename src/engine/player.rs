// Player sphere: the moving point every trail follows.
// WASD accelerates it on the XZ plane relative to the camera; it rolls to a
// stop when released and always rests on the ground surface.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use winit::keyboard::KeyCode;
use super::camera::FollowCamera;
use super::ground::Heightfield;
use super::input::InputState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub radius: f32,
    /// Top speed in world units per second (doubled while Shift is held).
    pub speed: f32,
    pub acceleration: f32,
    /// Fraction of velocity lost per second with no input.
    pub damping: f32,
    pub color: [f32; 3],
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            radius: 0.5,
            speed: 8.0,
            acceleration: 30.0,
            damping: 4.0,
            color: [0.95, 0.95, 1.0],
        }
    }
}

pub struct Player {
    pub position: Vec3,
    pub velocity: Vec3,
    pub config: PlayerConfig,
}

impl Player {
    pub fn spawn(ground: &Heightfield, config: PlayerConfig) -> Self {
        let position = Vec3::new(0.0, ground.height_at(0.0, 0.0) + config.radius, 0.0);
        Self { position, velocity: Vec3::ZERO, config }
    }

    /// WASD intent as a unit (or zero) vector in world XZ.
    pub fn steering(input: &InputState, camera: &FollowCamera) -> Vec2 {
        let mut dir = Vec2::ZERO;
        if input.is_key_held(KeyCode::KeyW) { dir += camera.forward_xz(); }
        if input.is_key_held(KeyCode::KeyS) { dir -= camera.forward_xz(); }
        if input.is_key_held(KeyCode::KeyD) { dir += camera.right_xz(); }
        if input.is_key_held(KeyCode::KeyA) { dir -= camera.right_xz(); }
        dir.normalize_or_zero()
    }

    /// Integrate one frame of movement. `boost` doubles the top speed.
    pub fn update(&mut self, steering: Vec2, boost: bool, ground: &Heightfield, dt: f32) {
        let top_speed = if boost { self.config.speed * 2.0 } else { self.config.speed };
        let mut planar = Vec2::new(self.velocity.x, self.velocity.z);

        if steering != Vec2::ZERO {
            planar += steering * self.config.acceleration * dt;
            planar = planar.clamp_length_max(top_speed);
        } else {
            planar *= (1.0 - self.config.damping * dt).max(0.0);
            if planar.length_squared() < 1e-6 {
                planar = Vec2::ZERO;
            }
        }

        let previous = self.position;
        let xz = ground.clamp_xz(Vec2::new(previous.x, previous.z) + planar * dt);
        let y = ground.height_at(xz.x, xz.y) + self.config.radius;
        self.position = Vec3::new(xz.x, y, xz.y);

        // Velocity follows the ground, so the vertical part comes from the height change
        self.velocity = if dt > 0.0 { (self.position - previous) / dt } else { Vec3::ZERO };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat() -> Heightfield {
        Heightfield::from_fn(20.0, 10, |_, _| 1.0)
    }

    #[test]
    fn test_spawn_rests_on_ground() {
        let player = Player::spawn(&flat(), PlayerConfig::default());
        assert!((player.position.y - 1.5).abs() < 1e-5);
    }

    #[test]
    fn test_accelerates_to_top_speed() {
        let ground = flat();
        let mut player = Player::spawn(&ground, PlayerConfig::default());
        for _ in 0..60 {
            player.update(Vec2::new(1.0, 0.0), false, &ground, 1.0 / 60.0);
        }
        assert!((player.velocity.length() - player.config.speed).abs() < 1e-2);
        assert!(player.position.x > 0.0);
    }

    #[test]
    fn test_boost_doubles_speed() {
        let ground = flat();
        let mut player = Player::spawn(&ground, PlayerConfig::default());
        for _ in 0..40 {
            player.update(Vec2::new(0.0, -1.0), true, &ground, 1.0 / 60.0);
        }
        assert!(player.velocity.length() > player.config.speed * 1.5);
    }

    #[test]
    fn test_damping_stops_player() {
        let ground = flat();
        let mut player = Player::spawn(&ground, PlayerConfig::default());
        player.update(Vec2::new(1.0, 0.0), false, &ground, 0.1);
        for _ in 0..300 {
            player.update(Vec2::ZERO, false, &ground, 1.0 / 60.0);
        }
        assert_eq!(player.velocity, Vec3::ZERO);
    }

    #[test]
    fn test_follows_slope_and_stays_in_bounds() {
        let ground = Heightfield::from_fn(20.0, 20, |x, _| x * 0.5);
        let mut player = Player::spawn(&ground, PlayerConfig::default());
        for _ in 0..600 {
            player.update(Vec2::new(1.0, 0.0), false, &ground, 1.0 / 60.0);
            let expected = ground.height_at(player.position.x, player.position.z) + player.config.radius;
            assert!((player.position.y - expected).abs() < 1e-4);
        }
        assert!(player.position.x <= 10.0);
    }
}
