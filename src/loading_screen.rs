//! Overlay shown while the car loads

use bevy::prelude::*;

use crate::car::CarLoadState;
use crate::scene::SceneEntity;

/// Plugin for the loading and load-failure overlays
pub struct LoadingScreenPlugin;

impl Plugin for LoadingScreenPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(OnEnter(CarLoadState::Loading), show_loading_screen)
            .add_systems(OnExit(CarLoadState::Loading), hide_loading_screen)
            .add_systems(OnEnter(CarLoadState::Failed), show_load_failure);
    }
}

/// Marker for the overlay root.
#[derive(Component)]
pub struct LoadingScreen;

fn show_loading_screen(mut commands: Commands) {
    spawn_overlay(&mut commands, "Loading car...");
}

fn show_load_failure(mut commands: Commands) {
    spawn_overlay(&mut commands, "The car failed to load. See the log for details.");
}

/// Dim the whole window and center a message on it.
fn spawn_overlay(commands: &mut Commands, message: &str) {
    commands
        .spawn((
            Name::new("loading screen"),
            LoadingScreen,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
            SceneEntity,
        ))
        .with_children(|parent| {
            parent.spawn((
                Text::new(message),
                TextFont {
                    font_size: 32.0,
                    ..default()
                },
                TextColor(Color::WHITE),
            ));
        });
}

fn hide_loading_screen(mut commands: Commands, screens: Query<Entity, With<LoadingScreen>>) {
    for screen in &screens {
        commands.entity(screen).despawn();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::state::app::StatesPlugin;

    fn set_state(app: &mut App, state: CarLoadState) {
        app.world_mut()
            .resource_mut::<NextState<CarLoadState>>()
            .set(state);
        app.update();
    }

    fn overlay_text(app: &mut App) -> Vec<String> {
        let world = app.world_mut();
        world
            .query::<&Text>()
            .iter(world)
            .map(|text| text.0.clone())
            .collect()
    }

    #[test]
    fn overlay_follows_the_car_load_state() {
        let mut app = App::new();
        app.add_plugins((StatesPlugin, LoadingScreenPlugin))
            .insert_state(CarLoadState::Loading);
        app.update();
        assert_eq!(overlay_text(&mut app), vec!["Loading car...".to_string()]);

        set_state(&mut app, CarLoadState::Ready);
        assert!(overlay_text(&mut app).is_empty());

        // A reload brings it back.
        set_state(&mut app, CarLoadState::Loading);
        assert_eq!(overlay_text(&mut app).len(), 1);
    }

    #[test]
    fn failed_load_replaces_the_overlay() {
        let mut app = App::new();
        app.add_plugins((StatesPlugin, LoadingScreenPlugin))
            .insert_state(CarLoadState::Loading);
        app.update();

        set_state(&mut app, CarLoadState::Failed);

        let text = overlay_text(&mut app);
        assert_eq!(text.len(), 1);
        assert!(text[0].contains("failed"));
    }
}
