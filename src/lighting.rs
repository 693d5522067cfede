//! Main light and shadow casters

use bevy::light::light_consts::lux;
use bevy::light::{
    CascadeShadowConfigBuilder, DirectionalLightShadowMap, NotShadowCaster, NotShadowReceiver,
};
use bevy::prelude::*;

use crate::scene::SceneEntity;

/// Plugin for the scene's single directional light
pub struct LightingPlugin;

impl Plugin for LightingPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DirectionalLightShadowMap { size: 2048 })
            .add_systems(Startup, spawn_main_light);
    }
}

/// Spawn the directional light. Call once per scene; every call adds a light.
fn spawn_main_light(mut commands: Commands) {
    commands.spawn((
        Name::new("main light"),
        DirectionalLight {
            color: Color::WHITE,
            illuminance: lux::AMBIENT_DAYLIGHT,
            shadows_enabled: true,
            ..default()
        },
        Transform::default().looking_to(Vec3::new(-1.0, -1.0, -1.0), Vec3::Y),
        CascadeShadowConfigBuilder {
            minimum_distance: 1.0,
            first_cascade_far_bound: 10.0,
            maximum_distance: 40.0,
            ..default()
        }
        .build(),
        SceneEntity,
    ));
}

/// Let the given entities cast and receive shadows from the main light.
pub fn register_shadow_casters(commands: &mut Commands, entities: impl IntoIterator<Item = Entity>) {
    for entity in entities {
        commands
            .entity(entity)
            .try_remove::<(NotShadowCaster, NotShadowReceiver)>();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_entities_lose_shadow_opt_outs() {
        let mut app = App::new();
        let world = app.world_mut();
        let registered = world.spawn((NotShadowCaster, NotShadowReceiver)).id();
        let untouched = world.spawn((NotShadowCaster, NotShadowReceiver)).id();

        app.add_systems(Update, move |mut commands: Commands| {
            register_shadow_casters(&mut commands, [registered]);
        });
        app.update();

        let world = app.world();
        assert!(world.get::<NotShadowCaster>(registered).is_none());
        assert!(world.get::<NotShadowReceiver>(registered).is_none());
        assert!(world.get::<NotShadowCaster>(untouched).is_some());
    }

    #[test]
    fn one_light_per_setup() {
        let mut app = App::new();
        app.add_systems(Startup, spawn_main_light);
        app.update();

        let world = app.world_mut();
        let lights = world
            .query_filtered::<&DirectionalLight, With<SceneEntity>>()
            .iter(world)
            .filter(|light| light.shadows_enabled)
            .count();
        assert_eq!(lights, 1);
    }
}
