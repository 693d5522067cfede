//! Click-to-drive steering
//!
//! A left click on the ground sets a target: the remaining distance and a unit
//! heading. Each fixed tick the car rolls along the heading and the distance
//! shrinks by a constant step until it falls inside the arrival tolerance.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::car::{Car, CarLoadState};
use crate::config::DriveConfig;
use crate::ground_plane::{PickedSurface, PointerPick};

/// Plugin for steering and moving the car
pub struct DrivePlugin;

impl Plugin for DrivePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            steer_on_pick.run_if(in_state(CarLoadState::Ready)),
        )
        .add_systems(
            FixedUpdate,
            drive_car.run_if(in_state(CarLoadState::Ready)),
        );
    }
}

/// Whether the car currently has somewhere to go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrivePhase {
    Idle,
    Driving,
}

/// Outcome of one drive tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriveTick {
    /// Nothing to do.
    Idle,
    /// Still on the way.
    Moving,
    /// Reached the tolerance band this tick.
    Arrived,
}

/// Steering target of the car
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Steering {
    distance: f32,
    heading: Vec3,
}

impl Steering {
    /// Distance left to the target.
    pub fn distance(&self) -> f32 {
        self.distance
    }

    /// Unit vector from the car's position at click time toward the target.
    pub fn heading(&self) -> Vec3 {
        self.heading
    }

    pub fn phase(&self, tolerance: f32) -> DrivePhase {
        if self.distance > tolerance {
            DrivePhase::Driving
        } else {
            DrivePhase::Idle
        }
    }

    /// Aim from `from` at `target`.
    pub fn set_target(&mut self, from: Vec3, target: Vec3) {
        self.distance = from.distance(target);
        self.heading = (target - from).normalize_or_zero();
    }

    /// Apply a pointer press. Only a primary click on the ground sets a target.
    ///
    /// Returns `true` if the target changed.
    pub fn handle_pick(&mut self, pick: &PointerPick, car_position: Vec3) -> bool {
        if pick.button != MouseButton::Left {
            return false;
        }
        let PickedSurface::Ground(point) = pick.surface else {
            return false;
        };
        self.set_target(car_position, point);
        true
    }

    /// Consume one step of distance.
    pub fn advance(&mut self, step: f32, tolerance: f32) -> DriveTick {
        if self.distance <= tolerance {
            return DriveTick::Idle;
        }
        self.distance = (self.distance - step).max(0.0);
        if self.distance <= tolerance {
            DriveTick::Arrived
        } else {
            DriveTick::Moving
        }
    }

    /// The heading flattened onto the ground; zero for a target straight above or below.
    pub fn ground_heading(&self) -> Vec3 {
        Vec3::new(self.heading.x, 0.0, self.heading.z).normalize_or_zero()
    }
}

/// Turn ground clicks into a new steering target
fn steer_on_pick(
    mut picks: MessageReader<PointerPick>,
    config: Res<DriveConfig>,
    mut cars: Query<(&mut Steering, &mut Car, &mut Transform)>,
) {
    let Ok((mut steering, mut car, mut transform)) = cars.single_mut() else {
        return;
    };

    for pick in picks.read() {
        if !steering.handle_pick(pick, transform.translation) {
            continue;
        }
        car.start_wheel_spin();

        // The model's nose is +Z, so look away from the target.
        let facing = steering.ground_heading();
        if facing != Vec3::ZERO {
            transform.look_to(-facing, Vec3::Y);
        }

        if steering.phase(config.arrival_tolerance) == DrivePhase::Driving {
            info!(
                "Driving {:.1} units along {:?}",
                steering.distance(),
                steering.heading()
            );
        }
    }
}

/// Horizontal speed that covers `step` in one fixed tick.
pub fn drive_speed(step: f32, time: &Time<Fixed>) -> f32 {
    step / time.timestep().as_secs_f32()
}

/// Move the car one tick toward its target
pub fn drive_car(
    config: Res<DriveConfig>,
    time: Res<Time<Fixed>>,
    mut cars: Query<(&mut Steering, &mut Car, &mut LinearVelocity)>,
) {
    let speed = drive_speed(config.distance_step, &time);
    for (mut steering, mut car, mut velocity) in &mut cars {
        match steering.advance(config.distance_step, config.arrival_tolerance) {
            DriveTick::Moving => {
                // Gravity keeps its say over the vertical axis.
                let horizontal = steering.ground_heading() * speed;
                velocity.0.x = horizontal.x;
                velocity.0.z = horizontal.z;
            }
            DriveTick::Arrived => {
                velocity.0.x = 0.0;
                velocity.0.z = 0.0;
                car.stop_wheel_spin();
                debug!("Car arrived");
            }
            DriveTick::Idle => {
                if car.wheels_spinning() {
                    car.stop_wheel_spin();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(button: MouseButton, surface: PickedSurface) -> PointerPick {
        PointerPick { button, surface }
    }

    #[test]
    fn ground_click_sets_distance_and_heading() {
        let mut steering = Steering::default();
        let car = Vec3::new(1.0, 0.0, 1.0);
        let target = Vec3::new(4.0, 0.0, 5.0);

        assert!(steering.handle_pick(&click(MouseButton::Left, PickedSurface::Ground(target)), car));
        assert!((steering.distance() - 5.0).abs() < 1e-5);
        assert!(steering.heading().abs_diff_eq(Vec3::new(0.6, 0.0, 0.8), 1e-5));
        assert_eq!(steering.phase(0.1), DrivePhase::Driving);
    }

    #[test]
    fn heading_includes_height_difference() {
        let mut steering = Steering::default();
        let car = Vec3::new(0.0, 1.0, 0.0);
        let target = Vec3::new(0.0, 0.0, 2.0);
        steering.set_target(car, target);

        assert!((steering.distance() - 5.0_f32.sqrt()).abs() < 1e-5);
        assert!((steering.heading().length() - 1.0).abs() < 1e-5);
        assert!(steering.ground_heading().abs_diff_eq(Vec3::Z, 1e-5));
    }

    #[test]
    fn non_ground_click_leaves_steering_alone() {
        let mut world = World::new();
        let prop = world.spawn_empty().id();
        let mut steering = Steering::default();
        steering.set_target(Vec3::ZERO, Vec3::new(0.0, 0.0, 3.0));
        let before = steering;

        let car = Vec3::ZERO;
        assert!(!steering.handle_pick(&click(MouseButton::Left, PickedSurface::Other(prop)), car));
        assert!(!steering.handle_pick(&click(MouseButton::Left, PickedSurface::Nothing), car));
        assert!(!steering.handle_pick(
            &click(MouseButton::Right, PickedSurface::Ground(Vec3::X)),
            car
        ));
        assert_eq!(steering, before);
    }

    #[test]
    fn distance_decays_until_arrival() {
        let mut steering = Steering::default();
        steering.set_target(Vec3::ZERO, Vec3::new(3.0, 0.0, 4.0));

        let mut ticks = 0;
        loop {
            ticks += 1;
            match steering.advance(0.1, 0.1) {
                DriveTick::Moving => assert!(steering.distance() > 0.1),
                DriveTick::Arrived => break,
                DriveTick::Idle => panic!("went idle without arriving"),
            }
            assert!(ticks < 100, "never arrived");
        }

        assert!((49..=50).contains(&ticks), "arrived after {ticks} ticks");
        assert_eq!(steering.phase(0.1), DrivePhase::Idle);
        assert_eq!(steering.advance(0.1, 0.1), DriveTick::Idle);
    }

    #[test]
    fn drive_tick_moves_then_stops_wheels() {
        let mut app = App::new();
        app.insert_resource(DriveConfig::default())
            .insert_resource(Time::<Fixed>::from_hz(64.0));
        app.add_systems(Update, drive_car);

        let mut steering = Steering::default();
        steering.set_target(Vec3::ZERO, Vec3::new(0.0, 0.0, 0.25));
        let mut car = Car::default();
        car.start_wheel_spin();
        let entity = app
            .world_mut()
            .spawn((car, steering, LinearVelocity(Vec3::new(0.0, -2.0, 0.0))))
            .id();

        app.update();
        let velocity = app.world().get::<LinearVelocity>(entity).unwrap().0;
        assert!(velocity.abs_diff_eq(Vec3::new(0.0, -2.0, 6.4), 1e-4));
        assert!(app.world().get::<Car>(entity).unwrap().wheels_spinning());

        app.update();
        let velocity = app.world().get::<LinearVelocity>(entity).unwrap().0;
        assert!(velocity.abs_diff_eq(Vec3::new(0.0, -2.0, 0.0), 1e-4));
        assert!(!app.world().get::<Car>(entity).unwrap().wheels_spinning());
        assert_eq!(
            app.world().get::<Steering>(entity).unwrap().phase(0.1),
            DrivePhase::Idle
        );
    }

    #[test]
    fn speed_follows_the_fixed_timestep() {
        let default_rate = Time::<Fixed>::from_hz(64.0);
        assert!((drive_speed(0.1, &default_rate) - 6.4).abs() < 1e-4);

        // Half the tick rate, half the speed for the same step.
        let slow = Time::<Fixed>::from_hz(32.0);
        assert!((drive_speed(0.1, &slow) - 3.2).abs() < 1e-4);

        let fast = Time::<Fixed>::from_hz(128.0);
        let per_tick = drive_speed(0.1, &fast) * fast.timestep().as_secs_f32();
        assert!((per_tick - 0.1).abs() < 1e-5);
    }
}
