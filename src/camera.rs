//! Free camera
//!
//! Arrow keys move the view along where it looks, PageUp/PageDown raise and
//! lower it, and dragging with the right mouse button looks around. The left
//! button stays free for driving.

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;

/// Plugin for moving the main camera
pub struct CameraControlPlugin;

impl Plugin for CameraControlPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraSettings>()
            .add_systems(Update, (camera_look, camera_movement).chain());
    }
}

/// Pitch limit, just short of straight up or down.
const MAX_PITCH: f32 = 1.54;

#[derive(Resource, Debug, Clone)]
pub struct CameraSettings {
    /// Movement speed in units per second.
    pub speed: f32,
    /// Speed multiplier while Shift is held.
    pub boost_multiplier: f32,
    /// Radians of turn per pixel of mouse motion.
    pub mouse_sensitivity: f32,
    /// The camera never sinks below this height.
    pub min_height: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            speed: 10.0,
            boost_multiplier: 3.0,
            mouse_sensitivity: 0.003,
            min_height: 0.5,
        }
    }
}

/// Yaw and pitch of a user-steered camera.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FreeCamera {
    pub yaw: f32,
    pub pitch: f32,
}

impl FreeCamera {
    /// Pick up the orientation an already placed camera has.
    pub fn from_transform(transform: &Transform) -> Self {
        let (yaw, pitch, _) = transform.rotation.to_euler(EulerRot::YXZ);
        Self { yaw, pitch }
    }

    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::YXZ, self.yaw, self.pitch, 0.0)
    }

    /// Turn by a mouse delta. Dragging right turns right, dragging up looks up.
    pub fn turn(&mut self, delta: Vec2, sensitivity: f32) {
        self.yaw -= delta.x * sensitivity;
        self.pitch = (self.pitch - delta.y * sensitivity).clamp(-MAX_PITCH, MAX_PITCH);
    }
}

/// Camera-local movement requested by the keyboard, not normalized.
fn movement_input(keyboard: &ButtonInput<KeyCode>) -> Vec3 {
    let mut movement = Vec3::ZERO;
    if keyboard.pressed(KeyCode::ArrowUp) {
        movement.z -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        movement.z += 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowLeft) {
        movement.x -= 1.0;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        movement.x += 1.0;
    }
    if keyboard.pressed(KeyCode::PageUp) {
        movement.y += 1.0;
    }
    if keyboard.pressed(KeyCode::PageDown) {
        movement.y -= 1.0;
    }
    movement
}

/// Look around while the right mouse button is held
fn camera_look(
    mouse: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: MessageReader<MouseMotion>,
    settings: Res<CameraSettings>,
    mut cameras: Query<(&mut FreeCamera, &mut Transform)>,
) {
    let delta: Vec2 = mouse_motion.read().map(|motion| motion.delta).sum();
    if !mouse.pressed(MouseButton::Right) || delta == Vec2::ZERO {
        return;
    }

    for (mut camera, mut transform) in &mut cameras {
        camera.turn(delta, settings.mouse_sensitivity);
        transform.rotation = camera.rotation();
    }
}

/// Fly along the view direction with the arrow keys
fn camera_movement(
    time: Res<Time>,
    keyboard: Res<ButtonInput<KeyCode>>,
    settings: Res<CameraSettings>,
    mut cameras: Query<(&FreeCamera, &mut Transform)>,
) {
    let input = movement_input(&keyboard);
    if input == Vec3::ZERO {
        return;
    }

    let mut speed = settings.speed;
    if keyboard.pressed(KeyCode::ShiftLeft) || keyboard.pressed(KeyCode::ShiftRight) {
        speed *= settings.boost_multiplier;
    }

    for (camera, mut transform) in &mut cameras {
        // Horizontal input follows the view; vertical input is world up.
        let planar = camera.rotation() * Vec3::new(input.x, 0.0, input.z);
        let movement = (planar + Vec3::Y * input.y).normalize_or_zero();
        transform.translation += movement * speed * time.delta_secs();
        transform.translation.y = transform.translation.y.max(settings.min_height);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn camera_app() -> App {
        let mut app = App::new();
        app.init_resource::<CameraSettings>()
            .init_resource::<Time>()
            .init_resource::<ButtonInput<KeyCode>>()
            .init_resource::<ButtonInput<MouseButton>>()
            .add_message::<MouseMotion>()
            .add_systems(Update, (camera_look, camera_movement).chain());
        app
    }

    fn spawn_camera(app: &mut App, transform: Transform) -> Entity {
        let camera = FreeCamera::from_transform(&transform);
        app.world_mut().spawn((camera, transform)).id()
    }

    fn step(app: &mut App, seconds: f32) {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(seconds));
        app.update();
    }

    #[test]
    fn orientation_round_trips_through_yaw_and_pitch() {
        let transform = Transform::from_xyz(8.0, 14.0, 14.0).looking_at(Vec3::ZERO, Vec3::Y);
        let camera = FreeCamera::from_transform(&transform);

        assert!(camera.rotation().abs_diff_eq(transform.rotation, 1e-4));
        assert!(camera.pitch < 0.0, "the camera looks down at the field");
    }

    #[test]
    fn arrow_up_moves_along_the_view() {
        let mut app = camera_app();
        let camera = spawn_camera(&mut app, Transform::from_xyz(0.0, 2.0, 0.0));
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::ArrowUp);

        step(&mut app, 0.1);

        let translation = app.world().get::<Transform>(camera).unwrap().translation;
        assert!(translation.abs_diff_eq(Vec3::new(0.0, 2.0, -1.0), 1e-4));
    }

    #[test]
    fn camera_stays_above_the_ground() {
        let mut app = camera_app();
        let camera = spawn_camera(&mut app, Transform::from_xyz(0.0, 1.0, 0.0));
        app.world_mut()
            .resource_mut::<ButtonInput<KeyCode>>()
            .press(KeyCode::PageDown);

        step(&mut app, 1.0);

        let y = app.world().get::<Transform>(camera).unwrap().translation.y;
        assert_eq!(y, CameraSettings::default().min_height);
    }

    #[test]
    fn looking_needs_the_right_button() {
        let mut app = camera_app();
        let camera = spawn_camera(&mut app, Transform::default());

        app.world_mut().write_message(MouseMotion {
            delta: Vec2::new(100.0, 0.0),
        });
        step(&mut app, 0.016);
        assert_eq!(app.world().get::<FreeCamera>(camera).unwrap().yaw, 0.0);

        app.world_mut()
            .resource_mut::<ButtonInput<MouseButton>>()
            .press(MouseButton::Right);
        app.world_mut().write_message(MouseMotion {
            delta: Vec2::new(100.0, 0.0),
        });
        step(&mut app, 0.016);

        let yaw = app.world().get::<FreeCamera>(camera).unwrap().yaw;
        assert!((yaw + 0.3).abs() < 1e-5, "dragging right turns right, yaw {yaw}");
        let rotation = app.world().get::<Transform>(camera).unwrap().rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(-0.3), 1e-5));
    }
}
