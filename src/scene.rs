//! Scene controller
//!
//! Owns the prop collections and the game-over flag. Props are added and
//! removed through [`PropRequest`] messages, hits between the car and props are
//! answered here, and a fall off the world rebuilds the field from scratch.

use avian3d::prelude::{CollisionEnd, CollisionStart};
use bevy::prelude::*;

use crate::audio::SoundCue;
use crate::car::{spawn_car, Car, CarAsset, CarLoadState};
use crate::config::DriveConfig;
use crate::drive::drive_car;
use crate::physics::release_prop;
use crate::props::{
    prepare_prop_assets, random_position, spawn_box, spawn_prop, spawn_sphere, HitTrigger, Prop,
    PropAssets, PropKind,
};

/// Plugin for the prop pool, hit response, game over and teardown
pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PropCollections>()
            .init_resource::<GameOver>()
            .init_resource::<SceneLifecycle>()
            .add_message::<PropRequest>()
            .add_message::<PropCountChanged>()
            .add_message::<TeardownRequest>()
            .add_systems(Startup, (prepare_prop_assets, seed_props).chain())
            .add_systems(Update, (apply_prop_requests, respond_to_hits, teardown_scene))
            .add_systems(
                FixedUpdate,
                (check_game_over, handle_game_over)
                    .chain()
                    .after(drive_car)
                    .run_if(
                        in_state(CarLoadState::Ready)
                            .and(resource_equals(SceneLifecycle::Running)),
                    ),
            );
    }
}

/// Marker for every entity that belongs to the scene and goes away on teardown.
#[derive(Component, Default)]
pub struct SceneEntity;

/// Boxes and spheres on the field, oldest first.
#[derive(Resource, Debug, Default)]
pub struct PropCollections {
    boxes: Vec<Entity>,
    spheres: Vec<Entity>,
    spawned: u32,
}

impl PropCollections {
    fn list(&self, kind: PropKind) -> &Vec<Entity> {
        match kind {
            PropKind::Box => &self.boxes,
            PropKind::Sphere => &self.spheres,
        }
    }

    fn list_mut(&mut self, kind: PropKind) -> &mut Vec<Entity> {
        match kind {
            PropKind::Box => &mut self.boxes,
            PropKind::Sphere => &mut self.spheres,
        }
    }

    pub fn count(&self, kind: PropKind) -> usize {
        self.list(kind).len()
    }

    /// Append a prop and return the new count.
    pub fn push(&mut self, kind: PropKind, prop: Entity) -> usize {
        let list = self.list_mut(kind);
        list.push(prop);
        list.len()
    }

    /// Take the newest prop, unless that would leave fewer than `keep`.
    pub fn pop(&mut self, kind: PropKind, keep: usize) -> Option<Entity> {
        let list = self.list_mut(kind);
        if list.len() <= keep {
            return None;
        }
        list.pop()
    }

    /// True when neither kind has any props left.
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty() && self.spheres.is_empty()
    }

    /// All props, boxes first.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.boxes.iter().chain(self.spheres.iter()).copied()
    }

    /// Empty both collections, returning what they held.
    pub fn drain(&mut self) -> Vec<Entity> {
        let mut all = std::mem::take(&mut self.boxes);
        all.append(&mut self.spheres);
        all
    }

    fn next_name(&mut self, kind: PropKind) -> String {
        self.spawned += 1;
        format!("{}-{}", kind.label(), self.spawned)
    }
}

/// Set when the round is lost; consumed by the next tick.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GameOver(pub bool);

/// Whether the scene is still alive.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SceneLifecycle {
    #[default]
    Running,
    TornDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropAction {
    Add,
    Remove,
}

/// Ask the scene to add or remove a prop.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropRequest {
    pub kind: PropKind,
    pub action: PropAction,
}

/// Count of a prop kind after a request was applied.
#[derive(Message, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropCountChanged {
    pub kind: PropKind,
    pub count: usize,
}

/// Ask the scene to release everything and shut down.
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct TeardownRequest;

/// Add a prop at a random spot and register it against the car.
///
/// Does nothing until the car has loaded. Returns the count of `kind`.
pub fn add_prop(
    commands: &mut Commands,
    collections: &mut PropCollections,
    assets: &PropAssets,
    config: &DriveConfig,
    kind: PropKind,
    car_ready: bool,
) -> usize {
    if !car_ready {
        debug!("Car still loading, not adding a {}", kind.label());
        return collections.count(kind);
    }

    let position = random_position(&mut rand::rng(), config);
    let name = collections.next_name(kind);
    let prop = spawn_prop(commands, assets, kind, name, Some(position));
    commands.entity(prop).insert(HitTrigger::default());
    collections.push(kind, prop)
}

/// Remove the newest prop of `kind`, keeping at least the configured minimum.
///
/// Returns the count of `kind`.
pub fn remove_prop(
    commands: &mut Commands,
    collections: &mut PropCollections,
    config: &DriveConfig,
    kind: PropKind,
) -> usize {
    match collections.pop(kind, config.min_props) {
        Some(prop) => commands.entity(prop).despawn(),
        None => debug!("Keeping the last {}", kind.label()),
    }
    collections.count(kind)
}

/// Place one box and one sphere at random spots.
fn spawn_starting_props(
    commands: &mut Commands,
    collections: &mut PropCollections,
    assets: &PropAssets,
    config: &DriveConfig,
) {
    let mut rng = rand::rng();

    let name = collections.next_name(PropKind::Box);
    let position = random_position(&mut rng, config);
    let prop = spawn_box(commands, assets, name, Some(position));
    collections.push(PropKind::Box, prop);

    let name = collections.next_name(PropKind::Sphere);
    let position = random_position(&mut rng, config);
    let prop = spawn_sphere(commands, assets, name, Some(position));
    collections.push(PropKind::Sphere, prop);
}

fn seed_props(
    mut commands: Commands,
    mut collections: ResMut<PropCollections>,
    assets: Res<PropAssets>,
    config: Res<DriveConfig>,
) {
    spawn_starting_props(&mut commands, &mut collections, &assets, &config);
}

/// Apply add/remove requests and report the resulting counts
#[allow(clippy::too_many_arguments)]
fn apply_prop_requests(
    mut commands: Commands,
    mut requests: MessageReader<PropRequest>,
    mut counts: MessageWriter<PropCountChanged>,
    mut collections: ResMut<PropCollections>,
    assets: Res<PropAssets>,
    config: Res<DriveConfig>,
    car_state: Res<State<CarLoadState>>,
    lifecycle: Res<SceneLifecycle>,
) {
    if *lifecycle == SceneLifecycle::TornDown {
        for request in requests.read() {
            debug!("Scene torn down, dropping {:?}", request);
        }
        return;
    }
    let car_ready = *car_state.get() == CarLoadState::Ready;

    for request in requests.read() {
        let count = match request.action {
            PropAction::Add => add_prop(
                &mut commands,
                &mut collections,
                &assets,
                &config,
                request.kind,
                car_ready,
            ),
            PropAction::Remove => {
                remove_prop(&mut commands, &mut collections, &config, request.kind)
            }
        };
        counts.write(PropCountChanged {
            kind: request.kind,
            count,
        });
    }
}

/// Of two colliding entities, the one that is not the car.
fn struck_by_car(a: Entity, b: Entity, cars: &Query<(), With<Car>>) -> Option<Entity> {
    if cars.contains(a) {
        Some(b)
    } else if cars.contains(b) {
        Some(a)
    } else {
        None
    }
}

/// Knock props loose when the car runs into them
fn respond_to_hits(
    mut commands: Commands,
    mut started: MessageReader<CollisionStart>,
    mut ended: MessageReader<CollisionEnd>,
    mut sounds: MessageWriter<SoundCue>,
    config: Res<DriveConfig>,
    cars: Query<(), With<Car>>,
    mut props: Query<(&Prop, &mut HitTrigger, &mut Transform)>,
) {
    for event in started.read() {
        let Some(entity) = struck_by_car(event.collider1, event.collider2, &cars) else {
            continue;
        };
        let Ok((prop, mut trigger, mut transform)) = props.get_mut(entity) else {
            continue;
        };
        if !trigger.enter() {
            continue;
        }

        release_prop(&mut commands, entity);
        transform.translation.z -= config.hit_nudge;
        sounds.write(SoundCue::Bump);
        debug!("Car hit a {} ({} hits)", prop.kind.label(), trigger.hits());
    }

    for event in ended.read() {
        let Some(entity) = struck_by_car(event.collider1, event.collider2, &cars) else {
            continue;
        };
        if let Ok((_, mut trigger, _)) = props.get_mut(entity) {
            trigger.exit();
        }
    }
}

/// Flag the round as lost when the car falls or the field is empty
pub fn check_game_over(
    config: Res<DriveConfig>,
    cars: Query<&Transform, With<Car>>,
    collections: Res<PropCollections>,
    mut game_over: ResMut<GameOver>,
) {
    let fell = cars
        .iter()
        .any(|transform| transform.translation.y < config.drop_height);
    if (fell || collections.is_empty()) && !game_over.0 {
        info!("Game over: {}", if fell { "the car fell" } else { "no props left" });
        game_over.0 = true;
    }
}

/// Rebuild the field after a lost round
#[allow(clippy::too_many_arguments)]
pub fn handle_game_over(
    mut commands: Commands,
    mut game_over: ResMut<GameOver>,
    mut collections: ResMut<PropCollections>,
    mut next_state: ResMut<NextState<CarLoadState>>,
    mut sounds: MessageWriter<SoundCue>,
    prop_assets: Res<PropAssets>,
    car_asset: Res<CarAsset>,
    config: Res<DriveConfig>,
    cars: Query<Entity, With<Car>>,
) {
    if !game_over.0 {
        return;
    }

    sounds.write(SoundCue::Fall);

    for car in &cars {
        commands.entity(car).despawn();
    }
    for prop in collections.drain() {
        commands.entity(prop).try_despawn();
    }

    spawn_starting_props(&mut commands, &mut collections, &prop_assets, &config);
    spawn_car(&mut commands, &car_asset);
    // Driving stays off until the new car is assembled.
    next_state.set(CarLoadState::Loading);
    game_over.0 = false;
    info!("Scene reloaded");
}

/// Release every scene entity and request exit
fn teardown_scene(
    mut commands: Commands,
    mut requests: MessageReader<TeardownRequest>,
    mut lifecycle: ResMut<SceneLifecycle>,
    mut collections: ResMut<PropCollections>,
    entities: Query<Entity, With<SceneEntity>>,
    mut exit: MessageWriter<AppExit>,
) {
    if requests.read().count() == 0 {
        return;
    }
    if *lifecycle == SceneLifecycle::TornDown {
        debug!("Scene already torn down");
        return;
    }

    for entity in &entities {
        commands.entity(entity).try_despawn();
    }
    collections.drain();
    *lifecycle = SceneLifecycle::TornDown;
    exit.write(AppExit::Success);
    info!("Scene torn down");
}
