//! Tunables for the driving toy
//!
//! Every constant the scene depends on lives in [`DriveConfig`]. The defaults
//! reproduce the classic feel; a handful can be overridden from the command line.

use bevy::prelude::*;
use clap::Parser;

/// Default car asset path, relative to the `assets/` directory.
const DEFAULT_CAR_ASSET: &str = "car/BuickRiviera.glb";

/// Scene-wide tunables.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct DriveConfig {
    /// glTF file holding the car model.
    pub car_asset: String,
    /// Car height below which the round is over.
    pub drop_height: f32,
    /// Random props land on integer x/z coordinates in `[-spawn_range, spawn_range)`.
    pub spawn_range: i32,
    /// Height random props are placed at.
    pub spawn_height: f32,
    /// Distance consumed from the steering target every fixed tick. The car
    /// covers the same distance, so its speed follows the fixed timestep.
    pub distance_step: f32,
    /// Remaining distance at which the car counts as arrived.
    pub arrival_tolerance: f32,
    /// Wheel rotation per rendered frame while spinning, in radians.
    pub wheel_spin_step: f32,
    /// How far a struck prop is pushed along -Z.
    pub hit_nudge: f32,
    /// Fewest props of one kind the scene keeps.
    pub min_props: usize,
    /// Most props of one kind the controls will ask for.
    pub max_props: usize,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            car_asset: DEFAULT_CAR_ASSET.to_string(),
            drop_height: -5.0,
            spawn_range: 10,
            spawn_height: 1.0,
            distance_step: 0.1,
            arrival_tolerance: 0.1,
            wheel_spin_step: 1.0,
            hit_nudge: 0.1,
            min_props: 1,
            max_props: 5,
        }
    }
}

/// Command-line overrides.
#[derive(Parser, Debug)]
#[command(about = "Click the ground to drive; knock the boxes and spheres around")]
pub struct CliArgs {
    /// Car model to load, relative to the assets directory.
    #[arg(long)]
    car_asset: Option<String>,

    /// Height below which the car is considered fallen.
    #[arg(long, allow_hyphen_values = true)]
    drop_height: Option<f32>,

    /// Half-width of the square random props are placed in.
    #[arg(long)]
    spawn_range: Option<i32>,

    /// Distance the car drives per fixed tick.
    #[arg(long)]
    distance_step: Option<f32>,

    /// Upper bound on props of each kind.
    #[arg(long)]
    max_props: Option<usize>,
}

impl CliArgs {
    /// Apply the given overrides on top of the defaults.
    pub fn into_config(self) -> DriveConfig {
        let mut config = DriveConfig::default();
        if let Some(car_asset) = self.car_asset {
            config.car_asset = car_asset;
        }
        if let Some(drop_height) = self.drop_height {
            config.drop_height = drop_height;
        }
        if let Some(spawn_range) = self.spawn_range {
            config.spawn_range = spawn_range.max(1);
        }
        if let Some(distance_step) = self.distance_step {
            config.distance_step = distance_step.max(f32::EPSILON);
        }
        if let Some(max_props) = self.max_props {
            config.max_props = max_props.max(config.min_props);
        }
        config
    }
}

/// Parse the process arguments into a config.
pub fn from_cli_args() -> DriveConfig {
    CliArgs::parse().into_config()
}

/// Log the active config once logging is up.
pub fn log_drive_config(config: Res<DriveConfig>) {
    info!("Drive config: {:?}", *config);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_arguments_keep_defaults() {
        let args = CliArgs::try_parse_from(["clickdrive"]).unwrap();
        assert_eq!(args.into_config(), DriveConfig::default());
    }

    #[test]
    fn arguments_override_defaults() {
        let args = CliArgs::try_parse_from([
            "clickdrive",
            "--car-asset",
            "car/Other.glb",
            "--drop-height",
            "-8",
            "--spawn-range",
            "6",
            "--distance-step",
            "0.25",
        ])
        .unwrap();
        let config = args.into_config();

        assert_eq!(config.car_asset, "car/Other.glb");
        assert_eq!(config.drop_height, -8.0);
        assert_eq!(config.spawn_range, 6);
        assert_eq!(config.distance_step, 0.25);
        assert_eq!(config.max_props, 5);
    }

    #[test]
    fn max_props_never_drops_below_min() {
        let args = CliArgs::try_parse_from(["clickdrive", "--max-props", "0"]).unwrap();
        let config = args.into_config();
        assert_eq!(config.max_props, config.min_props);
    }
}
