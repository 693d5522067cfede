//! Ground plane and pointer picking
//!
//! The ground is the only surface a click can send the car to. Every mouse press
//! is resolved to the first surface under the cursor and published as a
//! [`PointerPick`].

use avian3d::prelude::*;
use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::props::textured_material;
use crate::scene::SceneEntity;

/// Plugin for the ground plane and pointer picking
pub struct GroundPlanePlugin;

impl Plugin for GroundPlanePlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<PointerPick>()
            .add_systems(Startup, spawn_ground)
            .add_systems(Update, pick_on_press);
    }
}

/// Farthest a pointer ray looks for a surface.
const MAX_PICK_DISTANCE: f32 = 500.0;

/// Component marking the ground plane
#[derive(Component, Debug, Clone, Copy)]
pub struct Ground {
    /// Edge length of the square plane.
    pub size: f32,
}

impl Default for Ground {
    fn default() -> Self {
        Self { size: 24.0 }
    }
}

/// What the pointer landed on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PickedSurface {
    /// The ground, at the given world point.
    Ground(Vec3),
    /// Some other collider.
    Other(Entity),
    /// Empty sky.
    Nothing,
}

/// A mouse press resolved against the scene.
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct PointerPick {
    pub button: MouseButton,
    pub surface: PickedSurface,
}

/// Spawn the textured ground plane at the origin.
fn spawn_ground(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    let ground = Ground::default();
    let mesh = Plane3d::default()
        .mesh()
        .size(ground.size, ground.size)
        .build()
        .with_generated_tangents()?;
    // Tile the floor texture ten times across the plane.
    let material = textured_material(&asset_server, "textures/floor/floor_klinkers_04", 10.0);

    commands.spawn((
        Name::new("ground"),
        ground,
        Mesh3d(meshes.add(mesh)),
        MeshMaterial3d(materials.add(material)),
        Transform::from_translation(Vec3::ZERO),
        NotShadowCaster,
        SceneEntity,
    ));
    Ok(())
}

/// Resolve the first collider hit along a ray.
pub fn classify_hit(
    ray: Ray3d,
    hit: Option<(Entity, f32)>,
    is_ground: impl Fn(Entity) -> bool,
) -> PickedSurface {
    match hit {
        Some((entity, distance)) if is_ground(entity) => {
            PickedSurface::Ground(ray.origin + *ray.direction * distance)
        }
        Some((entity, _)) => PickedSurface::Other(entity),
        None => PickedSurface::Nothing,
    }
}

/// Cast a ray through the cursor for every mouse button pressed this frame.
fn pick_on_press(
    mouse_button: Res<ButtonInput<MouseButton>>,
    camera_query: Query<(&Camera, &GlobalTransform)>,
    windows: Query<&Window, With<PrimaryWindow>>,
    spatial_query: SpatialQuery,
    grounds: Query<(), With<Ground>>,
    mut picks: MessageWriter<PointerPick>,
) {
    if mouse_button.get_just_pressed().next().is_none() {
        return;
    }

    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(window) = windows.single() else {
        return;
    };
    let Some(cursor_pos) = window.cursor_position() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor_pos) else {
        return;
    };

    let hit = spatial_query
        .cast_ray(
            ray.origin,
            ray.direction,
            MAX_PICK_DISTANCE,
            true,
            &SpatialQueryFilter::default(),
        )
        .map(|hit| (hit.entity, hit.distance));
    let surface = classify_hit(ray, hit, |entity| grounds.contains(entity));

    for button in mouse_button.get_just_pressed() {
        debug!("Pointer {:?} picked {:?}", button, surface);
        picks.write(PointerPick {
            button: *button,
            surface,
        });
    }
}
