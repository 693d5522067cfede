//! Physics integration using Avian 3D
//!
//! Domain entities never build their own rigid bodies. Observers here attach
//! bodies and colliders when a [`Ground`], [`Prop`] or [`Car`] is added, so the
//! rest of the crate stays free of physics setup.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::car::{Car, CAR_BODY_EXTENTS};
use crate::ground_plane::Ground;
use crate::props::{Prop, PropKind};

/// Gravitational acceleration in m/s².
pub const GRAVITY: f32 = 9.81;

/// Thickness of the ground's collision slab.
const GROUND_THICKNESS: f32 = 0.2;

/// Mass of the car's collision proxy.
const CAR_MASS: f32 = 1000.0;

/// Mass a prop gets once the car knocks it loose.
const STRUCK_PROP_MASS: f32 = 1.0;

/// Plugin enabling the physics engine and wiring bodies onto scene entities.
pub struct PhysicsIntegrationPlugin;

impl Plugin for PhysicsIntegrationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default())
            .insert_resource(Gravity(Vec3::NEG_Y * GRAVITY))
            .add_observer(attach_ground_body)
            .add_observer(attach_prop_body)
            .add_observer(attach_car_body);
    }
}

/// The ground is an immovable slab matching the plane's footprint.
fn attach_ground_body(trigger: On<Add, Ground>, mut commands: Commands, grounds: Query<&Ground>) {
    let entity = trigger.event_target();
    let Ok(ground) = grounds.get(entity) else {
        return;
    };

    commands.entity(entity).insert((
        RigidBody::Static,
        Collider::cuboid(ground.size, GROUND_THICKNESS, ground.size),
        Restitution::new(0.0),
    ));
}

/// Props stay put until struck.
fn attach_prop_body(trigger: On<Add, Prop>, mut commands: Commands, props: Query<&Prop>) {
    let entity = trigger.event_target();
    let Ok(prop) = props.get(entity) else {
        return;
    };
    if !prop.collidable {
        return;
    }

    commands.entity(entity).insert((
        RigidBody::Static,
        prop_collider(prop),
        Restitution::new(0.0),
        CollisionEventsEnabled,
    ));
}

/// The car body is a heavy upright box.
fn attach_car_body(trigger: On<Add, Car>, mut commands: Commands) {
    commands.entity(trigger.event_target()).insert((
        RigidBody::Dynamic,
        Collider::cuboid(CAR_BODY_EXTENTS.x, CAR_BODY_EXTENTS.y, CAR_BODY_EXTENTS.z),
        Mass(CAR_MASS),
        Restitution::new(0.0),
        LockedAxes::ROTATION_LOCKED,
        CollisionEventsEnabled,
    ));
}

fn prop_collider(prop: &Prop) -> Collider {
    let extents = prop.kind.extents();
    match prop.kind {
        PropKind::Box => Collider::cuboid(extents.x, extents.y, extents.z),
        PropKind::Sphere => Collider::sphere(extents.x / 2.0),
    }
}

/// Turn a static prop into an independently simulated body.
pub fn release_prop(commands: &mut Commands, prop: Entity) {
    commands
        .entity(prop)
        .insert((RigidBody::Dynamic, Mass(STRUCK_PROP_MASS)));
}
