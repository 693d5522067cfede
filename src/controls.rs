//! Keyboard controls for the prop counts

use bevy::prelude::*;

use crate::config::DriveConfig;
use crate::props::PropKind;
use crate::scene::{PropAction, PropCollections, PropCountChanged, PropRequest, TeardownRequest};

/// Plugin mapping keys to prop requests
pub struct ControlsPlugin;

impl Plugin for ControlsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, print_controls)
            .add_systems(Update, (request_prop_changes, request_teardown, report_counts));
    }
}

/// Key bindings: key, prop kind, action.
const BINDINGS: [(KeyCode, PropKind, PropAction); 4] = [
    (KeyCode::Digit1, PropKind::Sphere, PropAction::Add),
    (KeyCode::Digit2, PropKind::Sphere, PropAction::Remove),
    (KeyCode::Digit3, PropKind::Box, PropAction::Add),
    (KeyCode::Digit4, PropKind::Box, PropAction::Remove),
];

/// Whether the controls may ask for `action` with `count` props of a kind on the field.
pub fn allowed(action: PropAction, count: usize, config: &DriveConfig) -> bool {
    match action {
        PropAction::Add => count < config.max_props,
        PropAction::Remove => count > config.min_props,
    }
}

fn print_controls(config: Res<DriveConfig>) {
    info!("Left click the ground to drive");
    info!(
        "[1]/[2] add/remove a sphere, [3]/[4] add/remove a box ({}..={} each)",
        config.min_props, config.max_props
    );
    info!("Arrow keys and PageUp/PageDown move the camera; hold the right button to look");
    info!("[Esc] quit");
}

fn request_prop_changes(
    keyboard: Res<ButtonInput<KeyCode>>,
    config: Res<DriveConfig>,
    collections: Res<PropCollections>,
    mut requests: MessageWriter<PropRequest>,
) {
    for (key, kind, action) in BINDINGS {
        if !keyboard.just_pressed(key) {
            continue;
        }
        if allowed(action, collections.count(kind), &config) {
            requests.write(PropRequest { kind, action });
        } else {
            debug!("Ignoring {:?} {}: limit reached", action, kind.label());
        }
    }
}

fn request_teardown(keyboard: Res<ButtonInput<KeyCode>>, mut requests: MessageWriter<TeardownRequest>) {
    if keyboard.just_pressed(KeyCode::Escape) {
        requests.write(TeardownRequest);
    }
}

fn report_counts(mut counts: MessageReader<PropCountChanged>) {
    for change in counts.read() {
        info!("{}s: {}", change.kind.label(), change.count);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controls_app(boxes: usize) -> App {
        let mut app = App::new();
        let mut collections = PropCollections::default();
        let mut world = World::new();
        for _ in 0..boxes {
            collections.push(PropKind::Box, world.spawn_empty().id());
        }
        app.insert_resource(DriveConfig::default())
            .insert_resource(collections)
            .init_resource::<ButtonInput<KeyCode>>()
            .add_message::<PropRequest>()
            .add_message::<TeardownRequest>()
            .add_systems(Update, (request_prop_changes, request_teardown));
        app
    }

    fn press(app: &mut App, key: KeyCode) {
        let mut keyboard = app.world_mut().resource_mut::<ButtonInput<KeyCode>>();
        keyboard.reset_all();
        keyboard.press(key);
        app.update();
    }

    fn drain_requests(app: &mut App) -> Vec<PropRequest> {
        app.world_mut()
            .resource_mut::<Messages<PropRequest>>()
            .drain()
            .collect()
    }

    #[test]
    fn limits_follow_config() {
        let config = DriveConfig::default();
        assert!(allowed(PropAction::Add, 4, &config));
        assert!(!allowed(PropAction::Add, 5, &config));
        assert!(allowed(PropAction::Remove, 2, &config));
        assert!(!allowed(PropAction::Remove, 1, &config));
    }

    #[test]
    fn keys_request_box_changes() {
        let mut app = controls_app(2);

        press(&mut app, KeyCode::Digit3);
        assert_eq!(
            drain_requests(&mut app),
            vec![PropRequest {
                kind: PropKind::Box,
                action: PropAction::Add
            }]
        );

        press(&mut app, KeyCode::Digit4);
        assert_eq!(
            drain_requests(&mut app),
            vec![PropRequest {
                kind: PropKind::Box,
                action: PropAction::Remove
            }]
        );
    }

    #[test]
    fn keys_past_the_limits_send_nothing() {
        let mut app = controls_app(5);
        press(&mut app, KeyCode::Digit3);
        assert!(drain_requests(&mut app).is_empty());

        let mut app = controls_app(1);
        press(&mut app, KeyCode::Digit4);
        assert!(drain_requests(&mut app).is_empty());
    }

    #[test]
    fn escape_requests_teardown() {
        let mut app = controls_app(1);
        press(&mut app, KeyCode::Escape);
        let requests = app.world().resource::<Messages<TeardownRequest>>().len();
        assert_eq!(requests, 1);
    }
}
