use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};

use crate::error::Result;
use crate::input::{DirectionsInput, MouseRelativeMovement};

const DEFAULT_FORWARD: Vec3 = Vec3::Z;
const DEFAULT_RIGHT: Vec3 = Vec3::X;
const DEFAULT_UP: Vec3 = Vec3::Y;

/// Pitch is kept strictly inside the open (-PI/2, PI/2) interval so the
/// look-at construction never degenerates.
const PITCH_LIMIT: f32 = FRAC_PI_2 - 1e-6;

/// First-person fly camera.
///
/// Input handling only accumulates intent (movement deltas, yaw/pitch);
/// `update` turns the accumulated intent into a new eye position and view
/// matrix once per frame and resets the deltas.
pub struct Camera {
    eye: Vec3,
    at: Vec3,
    up: Vec3,
    yaw: f32,
    pitch: f32,
    move_left_right: f32,
    move_back_forward: f32,
    move_up_down: f32,
    travel_speed: f32,
    rotation_speed: f32,
    view: Mat4,
    buffer: Option<wgpu::Buffer>,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            eye: position,
            at: position + DEFAULT_FORWARD,
            up: DEFAULT_UP,
            yaw: 0.0,
            pitch: 0.0,
            move_left_right: 0.0,
            move_back_forward: 0.0,
            move_up_down: 0.0,
            travel_speed: 5.0,
            rotation_speed: 5.0,
            view: Mat4::IDENTITY,
            buffer: None,
        }
    }

    /// Accumulates movement and rotation intent for this frame.
    ///
    /// Opposing directional flags cancel out. Pitch is clamped after
    /// accumulation so a single large mouse delta cannot flip the camera.
    /// Never touches the GPU.
    pub fn handle_input(
        &mut self,
        directions: &DirectionsInput,
        mouse: &MouseRelativeMovement,
        delta_time: f32,
    ) {
        let step = self.travel_speed * delta_time;
        if directions.back {
            self.move_back_forward -= step;
        }
        if directions.front {
            self.move_back_forward += step;
        }
        if directions.left {
            self.move_left_right -= step;
        }
        if directions.right {
            self.move_left_right += step;
        }
        if directions.up {
            self.move_up_down += step;
        }
        if directions.down {
            self.move_up_down -= step;
        }

        self.yaw += mouse.x * self.rotation_speed * delta_time;
        self.pitch += mouse.y * self.rotation_speed * delta_time;
        self.pitch = self.pitch.clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Applies the accumulated intent and rebuilds the view matrix.
    ///
    /// The look direction uses the full pitch+yaw rotation, but the movement
    /// basis is derived from a yaw-only rotation: looking up or down must not
    /// strafe the player off the horizontal plane.
    pub fn update(&mut self, _delta_time: f32) {
        let rotation = Mat4::from_rotation_y(self.yaw) * Mat4::from_rotation_x(self.pitch);
        let forward = rotation.transform_vector3(DEFAULT_FORWARD).normalize();

        let yaw_rotation = Mat4::from_rotation_y(self.yaw);
        let right = yaw_rotation.transform_vector3(DEFAULT_RIGHT);
        let level_up = yaw_rotation.transform_vector3(DEFAULT_UP);
        let level_forward = yaw_rotation.transform_vector3(DEFAULT_FORWARD);

        self.eye += self.move_left_right * right;
        self.eye += self.move_back_forward * level_forward;
        self.eye += self.move_up_down * level_up;
        self.at = self.eye + forward;

        self.move_left_right = 0.0;
        self.move_back_forward = 0.0;
        self.move_up_down = 0.0;

        self.view = Mat4::look_at_lh(self.eye, self.at, self.up);
    }

    /// Allocates the camera's GPU-visible uniform buffer (slot 0).
    pub fn initialize(&mut self, device: &wgpu::Device) -> Result<()> {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("camera-uniform"),
            size: std::mem::size_of::<crate::render::uniforms::CameraUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        self.buffer = Some(buffer);
        Ok(())
    }

    pub fn eye(&self) -> Vec3 {
        self.eye
    }

    pub fn at(&self) -> Vec3 {
        self.at
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }

    #[cfg(test)]
    pub(crate) fn pitch(&self) -> f32 {
        self.pitch
    }

    #[cfg(test)]
    pub(crate) fn pending_movement(&self) -> (f32, f32, f32) {
        (
            self.move_left_right,
            self.move_back_forward,
            self.move_up_down,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forward_only() -> DirectionsInput {
        DirectionsInput {
            front: true,
            ..DirectionsInput::default()
        }
    }

    #[test]
    fn pitch_stays_inside_open_interval() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.handle_input(
            &DirectionsInput::default(),
            &MouseRelativeMovement::new(0.0, 1.0e9),
            1.0,
        );
        assert!(camera.pitch() < FRAC_PI_2);
        camera.handle_input(
            &DirectionsInput::default(),
            &MouseRelativeMovement::new(0.0, -1.0e9),
            1.0,
        );
        assert!(camera.pitch() > -FRAC_PI_2);
    }

    #[test]
    fn opposing_flags_cancel() {
        let mut camera = Camera::new(Vec3::ZERO);
        let both = DirectionsInput {
            front: true,
            back: true,
            left: true,
            right: true,
            up: true,
            down: true,
        };
        camera.handle_input(&both, &MouseRelativeMovement::default(), 0.16);
        assert_eq!(camera.pending_movement(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn movement_deltas_reset_after_update() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.handle_input(&forward_only(), &MouseRelativeMovement::new(3.0, 1.0), 0.25);
        assert_ne!(camera.pending_movement(), (0.0, 0.0, 0.0));
        camera.update(0.25);
        assert_eq!(camera.pending_movement(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn forward_intent_moves_eye_along_look_axis() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.handle_input(&forward_only(), &MouseRelativeMovement::default(), 1.0);
        camera.update(1.0);
        assert!(camera.eye().z > 0.0);
        assert_eq!(camera.eye().x, 0.0);
        assert_eq!(camera.eye().y, 0.0);
    }

    #[test]
    fn vertical_look_does_not_strafe() {
        let mut camera = Camera::new(Vec3::ZERO);
        // Pitch hard toward vertical, then move forward.
        camera.handle_input(
            &DirectionsInput::default(),
            &MouseRelativeMovement::new(0.0, -100.0),
            1.0,
        );
        camera.handle_input(&forward_only(), &MouseRelativeMovement::default(), 1.0);
        camera.update(1.0);
        // Movement stays on the horizontal plane regardless of pitch.
        assert_eq!(camera.eye().y, 0.0);
        assert!(camera.eye().z > 0.0);
    }

    #[test]
    fn at_tracks_eye_plus_forward() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        camera.update(0.016);
        let forward = (camera.at() - camera.eye()).normalize();
        assert!((forward - Vec3::Z).length() < 1e-5);
    }
}
