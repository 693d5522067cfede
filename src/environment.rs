//! Sky, reflections, camera and physics activation

use bevy::core_pipeline::Skybox;
use bevy::light::EnvironmentMapLight;
use bevy::prelude::*;

use crate::camera::FreeCamera;
use crate::physics::PhysicsIntegrationPlugin;
use crate::scene::SceneEntity;

/// Plugin for global scene settings
pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ClearColor(SKY_COLOR))
            .add_plugins(PhysicsIntegrationPlugin)
            .add_systems(Startup, spawn_main_camera);
    }
}

/// Clear colour shown until the skybox has loaded.
const SKY_COLOR: Color = Color::srgb(0.62, 0.74, 0.86);

/// Where the camera watches the field from.
const CAMERA_POSITION: Vec3 = Vec3::new(8.0, 14.0, 14.0);

/// Specular environment cubemap, also drawn as the skybox.
const SPECULAR_MAP: &str = "environment/street_specular.ktx2";

/// Spawn the camera looking at the middle of the ground.
///
/// The prefiltered street environment map lights and reflects off every
/// material, and its specular cubemap doubles as the sky.
fn spawn_main_camera(mut commands: Commands, asset_server: Res<AssetServer>) {
    let transform = Transform::from_translation(CAMERA_POSITION).looking_at(Vec3::ZERO, Vec3::Y);
    let specular_map: Handle<Image> = asset_server.load(SPECULAR_MAP);

    commands.spawn((
        Name::new("main camera"),
        Camera3d::default(),
        FreeCamera::from_transform(&transform),
        transform,
        Projection::Perspective(PerspectiveProjection {
            near: 0.3,
            ..default()
        }),
        Skybox {
            image: specular_map.clone(),
            brightness: 1000.0,
            rotation: Quat::IDENTITY,
        },
        EnvironmentMapLight {
            diffuse_map: asset_server.load("environment/street_diffuse.ktx2"),
            specular_map,
            intensity: 900.0,
            ..default()
        },
        AmbientLight {
            color: Color::WHITE,
            brightness: 200.0,
            affects_lightmapped_meshes: true,
        },
        SceneEntity,
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn camera_watches_the_field_under_a_skybox() {
        let mut app = App::new();
        app.add_plugins((MinimalPlugins, AssetPlugin::default()))
            .init_asset::<Image>()
            .add_systems(Startup, spawn_main_camera);
        app.update();

        let world = app.world_mut();
        let (transform, camera, skybox, environment) = world
            .query::<(&Transform, &FreeCamera, &Skybox, &EnvironmentMapLight)>()
            .single(world)
            .unwrap();
        assert_eq!(transform.translation, CAMERA_POSITION);
        assert!(camera.rotation().abs_diff_eq(transform.rotation, 1e-4));
        assert_eq!(skybox.image, environment.specular_map);
    }
}
