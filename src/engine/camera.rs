// Follow camera
//
// Camera model:
//   - A target point (the player) the camera looks at, eased toward every frame
//   - Fixed pitch, yaw rotated with Q/E or right-mouse drag
//   - Zoom by adjusting distance along the look vector (mouse wheel)
//   - Exposes the camera-relative XZ basis so WASD moves the player "forward"
//     as seen on screen

use glam::{Mat4, Vec2, Vec3};
use super::input::InputState;
use winit::keyboard::KeyCode;

pub struct FollowCamera {
    /// Point the camera looks at. Eased toward the follow target in update().
    target: Vec3,

    /// Distance from target along the look direction.
    /// Private: always clamped to [min_distance, max_distance] in update(). Use distance() to read.
    distance: f32,
    pub min_distance: f32,
    pub max_distance: f32,

    /// Elevation angle in radians (0 = horizontal, PI/2 = straight down)
    pub pitch: f32,

    /// Horizontal rotation in radians (0 = looking along -Z axis)
    pub yaw: f32,

    /// Vertical field of view in radians
    pub fov: f32,
    pub near: f32,
    pub far: f32,

    /// Q/E rotation speed in radians per second
    pub yaw_speed: f32,

    /// Radians of yaw per pixel of right-drag
    pub drag_sensitivity: f32,

    /// Zoom change (in distance units) per scroll line
    pub zoom_speed: f32,

    /// How quickly the target catches up with the player (1/s)
    pub follow_rate: f32,
}

impl FollowCamera {
    pub fn new(target: Vec3) -> Self {
        Self {
            target,
            distance: 9.0,
            min_distance: 3.0,
            max_distance: 30.0,
            pitch: 28.0_f32.to_radians(),
            yaw: 0.0,
            fov: 55.0_f32.to_radians(),
            near: 0.1,
            far: 300.0,
            yaw_speed: 1.8,
            drag_sensitivity: 0.006,
            zoom_speed: 1.0,
            follow_rate: 6.0,
        }
    }

    /// Update camera from input and ease toward `follow`. Call once per frame before rendering.
    pub fn update(&mut self, input: &InputState, follow: Vec3, dt: f32) {
        if input.is_key_held(KeyCode::KeyQ) { self.yaw -= self.yaw_speed * dt; }
        if input.is_key_held(KeyCode::KeyE) { self.yaw += self.yaw_speed * dt; }
        if input.orbit_held {
            self.yaw -= input.mouse_delta.0 * self.drag_sensitivity;
        }

        // Zoom: scroll up (positive delta) zooms in (decreases distance)
        self.distance -= input.scroll_delta * self.zoom_speed;
        self.distance = self.distance.clamp(self.min_distance, self.max_distance);

        // Frame-rate independent exponential ease
        let t = 1.0 - (-self.follow_rate * dt).exp();
        self.target = self.target.lerp(follow, t);
    }

    /// Forward direction on the XZ plane (X, Z), as seen on screen.
    /// yaw=0 means camera faces along -Z, so forward is (0, -1).
    pub fn forward_xz(&self) -> Vec2 {
        Vec2::new(-self.yaw.sin(), -self.yaw.cos())
    }

    /// Right direction on the XZ plane (X, Z).
    pub fn right_xz(&self) -> Vec2 {
        Vec2::new(self.yaw.cos(), -self.yaw.sin())
    }

    /// World-space position of the camera eye.
    pub fn camera_position(&self) -> Vec3 {
        self.target + self.eye_offset()
    }

    /// View matrix: looks from the camera eye toward the target.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.camera_position(), self.target, Vec3::Y)
    }

    /// Perspective projection matrix.
    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov, aspect, self.near, self.far)
    }

    /// Combined view-projection matrix ready to upload to the GPU.
    pub fn view_projection(&self, aspect: f32) -> Mat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    pub fn distance(&self) -> f32 { self.distance }

    // Offset from target to camera eye based on pitch, yaw, and distance.
    fn eye_offset(&self) -> Vec3 {
        Vec3::new(
            self.yaw.sin() * self.pitch.cos() * self.distance,
            self.pitch.sin() * self.distance,
            self.yaw.cos() * self.pitch.cos() * self.distance,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = FollowCamera::new(Vec3::ZERO);
        let mut input = InputState::new();
        input.scroll_delta = 1000.0;
        camera.update(&input, Vec3::ZERO, 0.016);
        assert_eq!(camera.distance(), camera.min_distance);
        input.scroll_delta = -1000.0;
        camera.update(&input, Vec3::ZERO, 0.016);
        assert_eq!(camera.distance(), camera.max_distance);
    }

    #[test]
    fn test_target_eases_toward_follow_point() {
        let mut camera = FollowCamera::new(Vec3::ZERO);
        let input = InputState::new();
        let goal = Vec3::new(10.0, 0.0, 0.0);
        camera.update(&input, goal, 0.05);
        let first = camera.target.x;
        assert!(first > 0.0 && first < 10.0);
        for _ in 0..200 {
            camera.update(&input, goal, 0.05);
        }
        assert!((camera.target - goal).length() < 1e-3);
    }

    #[test]
    fn test_forward_points_away_from_eye() {
        let mut camera = FollowCamera::new(Vec3::ZERO);
        for yaw in [0.0_f32, 0.7, 2.0, -1.3] {
            camera.yaw = yaw;
            let eye = camera.camera_position();
            let f = camera.forward_xz();
            // Eye sits behind the target, forward points past it
            assert!(Vec2::new(eye.x, eye.z).dot(f) < 0.0);
            assert!(f.dot(camera.right_xz()).abs() < 1e-6);
        }
    }
}
