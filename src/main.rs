//! ClickDrive - a small physics driving toy
//!
//! This game allows the user to:
//! 1. Click the ground to drive a car to that spot
//! 2. Knock boxes and spheres around with it
//! 3. Add or remove props from the keyboard
//! 4. Fly the camera around with the arrow keys and right mouse drag
//!
//! Driving off the edge, or running out of props, reloads the scene.

use bevy::prelude::*;

mod audio;
mod camera;
mod car;
mod config;
mod controls;
mod drive;
mod environment;
mod ground_plane;
mod lighting;
mod loading_screen;
mod physics;
mod props;
mod scene;

use audio::SoundPlugin;
use camera::CameraControlPlugin;
use car::CarPlugin;
use controls::ControlsPlugin;
use drive::DrivePlugin;
use environment::EnvironmentPlugin;
use ground_plane::GroundPlanePlugin;
use lighting::LightingPlugin;
use loading_screen::LoadingScreenPlugin;
use scene::ScenePlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "ClickDrive".into(),
                resolution: (1280, 720).into(),
                ..default()
            }),
            ..default()
        }))
        .insert_resource(config::from_cli_args())
        .add_plugins((
            EnvironmentPlugin,
            LightingPlugin,
            GroundPlanePlugin,
            ScenePlugin,
            CarPlugin,
            DrivePlugin,
            SoundPlugin,
            ControlsPlugin,
            CameraControlPlugin,
            LoadingScreenPlugin,
        ))
        .add_systems(Startup, config::log_drive_config)
        .run();
}
