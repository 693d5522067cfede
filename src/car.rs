//! The car
//!
//! The car model is a glTF scene parented to an invisible box. The model's own
//! bounds sit off-centre from its drivetrain, so the box is the only thing the
//! physics engine sees. Once the scene instance is ready, the root and the four
//! wheels are looked up by name.

use std::error::Error;
use std::f32::consts::PI;
use std::fmt;

use bevy::asset::LoadState;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;

use crate::config::DriveConfig;
use crate::drive::Steering;
use crate::lighting::register_shadow_casters;
use crate::props::HitTrigger;
use crate::scene::{PropCollections, SceneEntity};

/// Plugin for loading, assembling and animating the car
pub struct CarPlugin;

impl Plugin for CarPlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<CarLoadState>()
            .add_systems(Startup, (load_car_asset, spawn_initial_car).chain())
            .add_systems(
                Update,
                (
                    spin_wheels,
                    check_car_asset_loaded.run_if(in_state(CarLoadState::Loading)),
                ),
            )
            .add_observer(assemble_car);
    }
}

/// Full extents of the collision proxy box.
pub const CAR_BODY_EXTENTS: Vec3 = Vec3::new(1.7, 1.7, 5.0);

/// Where a fresh car is placed.
pub const CAR_SPAWN_POSITION: Vec3 = Vec3::new(4.0, 1.0, 7.0);

/// Model offset inside the proxy, putting the wheels on the ground.
const MODEL_OFFSET: Vec3 = Vec3::new(0.0, -0.8, 0.0);

/// Name given to the model's scene root.
pub const ROOT_PART: &str = "__root__";

/// Wheel node names: front left, front right, back left, back right.
pub const WHEEL_PARTS: [&str; 4] = ["wheel.Ft.L", "wheel.Ft.R", "wheel.Bk.L", "wheel.Bk.R"];

/// Represents the state of car asset loading
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum CarLoadState {
    #[default]
    Loading,
    Ready,
    Failed,
}

/// Component marking the car's collision proxy
#[derive(Component, Debug, Default)]
#[require(Steering)]
pub struct Car {
    wheels_spinning: bool,
    /// Wheels go back to their rest pose on the next animation frame.
    repose_wheels: bool,
}

impl Car {
    /// Start the per-frame wheel rotation.
    pub fn start_wheel_spin(&mut self) {
        self.wheels_spinning = true;
        self.repose_wheels = true;
    }

    /// Stop the wheel rotation and put the wheels back at rest.
    pub fn stop_wheel_spin(&mut self) {
        self.wheels_spinning = false;
        self.repose_wheels = true;
    }

    pub fn wheels_spinning(&self) -> bool {
        self.wheels_spinning
    }
}

/// Marks the glTF scene root under the car proxy.
#[derive(Component)]
pub struct CarModel;

/// Handles to the named parts of a loaded car.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarParts {
    pub root: Entity,
    pub wheels: [Entity; 4],
}

impl CarParts {
    /// Find the root and wheel parts among named entities.
    pub fn resolve<'a>(
        named: impl IntoIterator<Item = (Entity, &'a str)>,
    ) -> Result<Self, CarAssemblyError> {
        let mut root = None;
        let mut wheels = [None; 4];

        for (entity, name) in named {
            if name == ROOT_PART {
                root = Some(entity);
            } else if let Some(slot) = WHEEL_PARTS.iter().position(|part| *part == name) {
                wheels[slot] = Some(entity);
            }
        }

        let root = root.ok_or(CarAssemblyError::MissingPart(ROOT_PART))?;
        let mut found = [Entity::PLACEHOLDER; 4];
        for (slot, wheel) in wheels.into_iter().enumerate() {
            found[slot] = wheel.ok_or(CarAssemblyError::MissingPart(WHEEL_PARTS[slot]))?;
        }

        Ok(Self {
            root,
            wheels: found,
        })
    }
}

/// The car asset does not have the shape the scene relies on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CarAssemblyError {
    /// A named part is absent from the loaded model.
    MissingPart(&'static str),
}

impl fmt::Display for CarAssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CarAssemblyError::MissingPart(name) => {
                write!(f, "car model has no part named '{name}'")
            }
        }
    }
}

impl Error for CarAssemblyError {}

/// Handle to the car's glTF scene.
#[derive(Resource, Default)]
pub struct CarAsset {
    scene: Handle<Scene>,
}

/// Start loading the car model.
fn load_car_asset(mut commands: Commands, asset_server: Res<AssetServer>, config: Res<DriveConfig>) {
    let scene = asset_server.load(GltfAssetLabel::Scene(0).from_asset(config.car_asset.clone()));
    commands.insert_resource(CarAsset { scene });
    info!("Loading car from: {}", config.car_asset);
}

fn spawn_initial_car(mut commands: Commands, car_asset: Res<CarAsset>) {
    spawn_car(&mut commands, &car_asset);
}

/// Spawn the car proxy with the model scene as its child.
///
/// The parts become available once the scene instance is ready.
pub fn spawn_car(commands: &mut Commands, car_asset: &CarAsset) -> Entity {
    commands
        .spawn((
            Name::new("car"),
            Car::default(),
            Transform::from_translation(CAR_SPAWN_POSITION),
            Visibility::default(),
            SceneEntity,
        ))
        .with_children(|parent| {
            parent.spawn((
                Name::new(ROOT_PART),
                CarModel,
                SceneRoot(car_asset.scene.clone()),
                Transform::from_translation(MODEL_OFFSET),
            ));
        })
        .id()
}

/// Everything needed to finish a car once its model scene has spawned.
#[derive(SystemParam)]
pub struct CarAssembly<'w, 's> {
    commands: Commands<'w, 's>,
    models: Query<'w, 's, &'static ChildOf, With<CarModel>>,
    cars: Query<'w, 's, (), With<Car>>,
    children: Query<'w, 's, &'static Children>,
    names: Query<'w, 's, &'static Name>,
    collections: Res<'w, PropCollections>,
    next_state: ResMut<'w, NextState<CarLoadState>>,
}

impl CarAssembly<'_, '_> {
    /// Resolve the parts under `model` and hand the car over to the scene.
    ///
    /// Anything that is not a live car's model is ignored. A model missing any
    /// expected part is a fatal asset error.
    pub fn assemble(&mut self, model: Entity) -> Result {
        let Ok(child_of) = self.models.get(model) else {
            return Ok(());
        };
        let body = child_of.parent();
        if !self.cars.contains(body) {
            debug!("Car model finished loading after its car was removed");
            return Ok(());
        }

        let names = &self.names;
        let named = self
            .children
            .iter_descendants(body)
            .filter_map(|entity| names.get(entity).ok().map(|name| (entity, name.as_str())));
        let parts = CarParts::resolve(named)?;
        self.commands.entity(body).insert(parts);

        // Whatever is on the field when the car arrives casts shadows and reacts to hits.
        let props: Vec<Entity> = self.collections.iter().collect();
        register_shadow_casters(&mut self.commands, props.iter().copied().chain([parts.root]));
        for prop in props {
            self.commands.entity(prop).try_insert(HitTrigger::default());
        }

        self.next_state.set(CarLoadState::Ready);
        info!("Car ready! Click the ground to drive.");
        Ok(())
    }
}

/// Observer that assembles the car once its model has spawned.
fn assemble_car(trigger: On<SceneInstanceReady>, mut assembly: CarAssembly) -> Result {
    assembly.assemble(trigger.event_target())
}

/// Check whether the car model failed to load
fn check_car_asset_loaded(
    asset_server: Res<AssetServer>,
    car_asset: Res<CarAsset>,
    mut next_state: ResMut<NextState<CarLoadState>>,
) {
    if let Some(LoadState::Failed(err)) = asset_server.get_load_state(car_asset.scene.id()) {
        error!("Failed to load car model: {}", err);
        next_state.set(CarLoadState::Failed);
    }
}

/// Advance wheel rotation for spinning cars
fn spin_wheels(
    config: Res<DriveConfig>,
    mut cars: Query<(&mut Car, &CarParts)>,
    mut transforms: Query<&mut Transform, Without<Car>>,
) {
    for (mut car, parts) in &mut cars {
        if !car.wheels_spinning && !car.repose_wheels {
            continue;
        }
        let repose = std::mem::take(&mut car.repose_wheels);

        for wheel in parts.wheels {
            let Ok(mut transform) = transforms.get_mut(wheel) else {
                continue;
            };
            if repose {
                // Outer side of the wheel faces out.
                transform.rotation = Quat::from_rotation_y(PI);
            }
            if car.wheels_spinning {
                transform.rotate_local_x(config.wheel_spin_step);
            }
        }
    }
}
