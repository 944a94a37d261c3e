use std::collections::HashSet;

use glam::{Mat4, Vec3};
use winit::keyboard::KeyCode;

const MOVE_SPEED: f32 = 30.0;
const SLOW_MOVE_SPEED: f32 = 8.0;
const ROTATE_SPEED: f32 = 1.7;

/// Free-fly camera described by a position and a view direction.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    position: Vec3,
    forward: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self {
            position,
            forward: forward.normalize_or(Vec3::Z),
            ..Self::default()
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn set_forward(&mut self, forward: Vec3) {
        self.forward = forward.normalize_or(self.forward);
    }

    pub fn right(&self) -> Vec3 {
        self.forward.cross(self.up)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_to_rh(self.position, self.forward, self.up)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y_radians, aspect, self.near, self.far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
            up: Vec3::Y,
            fov_y_radians: 45f32.to_radians(),
            near: 0.1,
            far: 300.0,
        }
    }
}

/// Keyboard fly controls: WASD to move, Space/LShift for up/down, arrows to
/// look around, hold F to move slowly.
#[derive(Debug, Default)]
pub struct CameraController {
    pressed: HashSet<KeyCode>,
}

impl CameraController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_key(&mut self, key: KeyCode, pressed: bool) {
        if pressed {
            self.pressed.insert(key);
        } else {
            self.pressed.remove(&key);
        }
    }

    fn held(&self, key: KeyCode) -> bool {
        self.pressed.contains(&key)
    }

    fn axis(&self, positive: KeyCode, negative: KeyCode) -> f32 {
        (self.held(positive) as i32 - self.held(negative) as i32) as f32
    }

    pub fn update(&self, camera: &mut Camera, dt: f32) {
        let up = camera.up;
        let right = camera.right();
        let flat_forward = (camera.forward() * Vec3::new(1.0, 0.0, 1.0)).normalize_or_zero();

        let offset = flat_forward * self.axis(KeyCode::KeyW, KeyCode::KeyS)
            + right * self.axis(KeyCode::KeyD, KeyCode::KeyA)
            + up * self.axis(KeyCode::Space, KeyCode::ShiftLeft);

        let speed = if self.held(KeyCode::KeyF) {
            SLOW_MOVE_SPEED
        } else {
            MOVE_SPEED
        };
        camera.set_position(camera.position() + offset.normalize_or_zero() * speed * dt);

        let yaw = self.axis(KeyCode::ArrowRight, KeyCode::ArrowLeft);
        let pitch = self.axis(KeyCode::ArrowUp, KeyCode::ArrowDown);
        if yaw != 0.0 || pitch != 0.0 {
            let step = ROTATE_SPEED * dt;
            camera.set_forward(camera.forward() + (right * yaw + up * pitch) * step);
        }
    }
}
