//! Boxes and spheres
//!
//! Props are plain entities composing a [`Prop`] with a mesh and material. They
//! start out static; once registered against the car they carry a
//! [`HitTrigger`] that fires when the car drives into them.

use bevy::image::{ImageAddressMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor};
use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::math::Affine2;
use bevy::prelude::*;
use rand::Rng;

use crate::config::DriveConfig;
use crate::scene::SceneEntity;

/// Edge length of a box prop.
const BOX_SIZE: f32 = 2.0;

/// Diameter of a sphere prop.
const SPHERE_DIAMETER: f32 = 1.5;

/// The two kinds of prop the scene manages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKind {
    Box,
    Sphere,
}

impl PropKind {
    /// Lowercase name used for entity names and logs.
    pub fn label(self) -> &'static str {
        match self {
            PropKind::Box => "box",
            PropKind::Sphere => "sphere",
        }
    }

    /// Where a prop lands when no position is given.
    pub fn default_position(self) -> Vec3 {
        match self {
            PropKind::Box => Vec3::new(4.0, 1.0, -2.0),
            PropKind::Sphere => Vec3::new(-5.0, 1.0, 1.0),
        }
    }

    /// Full extents of the prop's shape.
    pub fn extents(self) -> Vec3 {
        match self {
            PropKind::Box => Vec3::splat(BOX_SIZE),
            PropKind::Sphere => Vec3::splat(SPHERE_DIAMETER),
        }
    }
}

/// A box or sphere in the scene.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Prop {
    pub kind: PropKind,
    /// Whether the prop takes part in collision detection at all.
    pub collidable: bool,
}

impl Prop {
    pub fn new(kind: PropKind) -> Self {
        Self {
            kind,
            collidable: true,
        }
    }
}

/// One-shot hit guard registered against the car.
///
/// Fires once when a contact with the car begins and stays quiet until that
/// contact ends.
#[derive(Component, Debug, Default)]
pub struct HitTrigger {
    in_contact: bool,
    hits: u32,
}

impl HitTrigger {
    /// Record a contact start. Returns `true` if the trigger fired.
    pub fn enter(&mut self) -> bool {
        if self.in_contact {
            return false;
        }
        self.in_contact = true;
        self.hits += 1;
        true
    }

    /// Record the end of the current contact, re-arming the trigger.
    pub fn exit(&mut self) {
        self.in_contact = false;
    }

    /// How many times the trigger has fired.
    pub fn hits(&self) -> u32 {
        self.hits
    }
}

/// Shared meshes and materials for props.
#[derive(Resource, Default)]
pub struct PropAssets {
    box_mesh: Handle<Mesh>,
    box_material: Handle<StandardMaterial>,
    sphere_mesh: Handle<Mesh>,
    sphere_material: Handle<StandardMaterial>,
}

impl PropAssets {
    fn mesh(&self, kind: PropKind) -> Handle<Mesh> {
        match kind {
            PropKind::Box => self.box_mesh.clone(),
            PropKind::Sphere => self.sphere_mesh.clone(),
        }
    }

    fn material(&self, kind: PropKind) -> Handle<StandardMaterial> {
        match kind {
            PropKind::Box => self.box_material.clone(),
            PropKind::Sphere => self.sphere_material.clone(),
        }
    }
}

/// Build the prop meshes and start loading their textures.
pub fn prepare_prop_assets(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) -> Result {
    // Normal maps need tangents.
    let box_mesh = Mesh::from(Cuboid::from_length(BOX_SIZE)).with_generated_tangents()?;
    let sphere_mesh = Sphere::new(SPHERE_DIAMETER / 2.0)
        .mesh()
        .uv(32, 18)
        .with_generated_tangents()?;

    commands.insert_resource(PropAssets {
        box_mesh: meshes.add(box_mesh),
        box_material: materials.add(textured_material(
            &asset_server,
            "textures/box/rusty_metal_02",
            1.0,
        )),
        sphere_mesh: meshes.add(sphere_mesh),
        sphere_material: materials.add(textured_material(
            &asset_server,
            "textures/sphere/metal_plate",
            1.0,
        )),
    });
    Ok(())
}

/// A material from a `<stem>_diff_1k.jpg` / `_ao_1k.jpg` / `_nor_gl_1k.jpg` texture set.
///
/// A `uv_scale` other than one tiles the textures, which needs a repeating sampler.
pub fn textured_material(asset_server: &AssetServer, stem: &str, uv_scale: f32) -> StandardMaterial {
    let load = |suffix: &str| -> Handle<Image> {
        let path = format!("{stem}_{suffix}_1k.jpg");
        if uv_scale == 1.0 {
            return asset_server.load(path);
        }
        asset_server.load_with_settings(path, |settings: &mut ImageLoaderSettings| {
            settings.sampler = ImageSampler::Descriptor(ImageSamplerDescriptor {
                address_mode_u: ImageAddressMode::Repeat,
                address_mode_v: ImageAddressMode::Repeat,
                ..ImageSamplerDescriptor::linear()
            });
        })
    };

    StandardMaterial {
        base_color_texture: Some(load("diff")),
        occlusion_texture: Some(load("ao")),
        normal_map_texture: Some(load("nor_gl")),
        perceptual_roughness: 0.6,
        uv_transform: Affine2::from_scale(Vec2::splat(uv_scale)),
        ..default()
    }
}

/// Spawn a prop of the given kind.
///
/// Props start without shadows; the lighting setup registers them as casters.
pub fn spawn_prop(
    commands: &mut Commands,
    assets: &PropAssets,
    kind: PropKind,
    name: String,
    position: Option<Vec3>,
) -> Entity {
    let position = position.unwrap_or_else(|| kind.default_position());
    commands
        .spawn((
            Name::new(name),
            Prop::new(kind),
            Mesh3d(assets.mesh(kind)),
            MeshMaterial3d(assets.material(kind)),
            Transform::from_translation(position),
            NotShadowCaster,
            NotShadowReceiver,
            SceneEntity,
        ))
        .id()
}

/// Spawn a 2×2×2 box.
pub fn spawn_box(
    commands: &mut Commands,
    assets: &PropAssets,
    name: String,
    position: Option<Vec3>,
) -> Entity {
    spawn_prop(commands, assets, PropKind::Box, name, position)
}

/// Spawn a sphere of diameter 1.5.
pub fn spawn_sphere(
    commands: &mut Commands,
    assets: &PropAssets,
    name: String,
    position: Option<Vec3>,
) -> Entity {
    spawn_prop(commands, assets, PropKind::Sphere, name, position)
}

/// Pick a random spawn point on the integer grid inside the spawn square.
pub fn random_position(rng: &mut impl Rng, config: &DriveConfig) -> Vec3 {
    let range = config.spawn_range;
    let x = rng.random_range(-range..range);
    let z = rng.random_range(-range..range);
    Vec3::new(x as f32, config.spawn_height, z as f32)
}
