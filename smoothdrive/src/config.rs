use crate::cruise::CruiseTuning;
use crate::error::ConfigError;
use crate::fuel::RefuelTuning;
use crate::gearbox::GearboxTuning;
use crate::result::ConfigResult;
use crate::steering::SteeringTuning;
use crate::throttle::PedalTuning;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub enable_advanced_gearbox: bool,
    pub use_manual_gearbox: bool,
    pub enable_smooth_steering: bool,
    pub enable_traction_control: bool,
    pub enable_fuel_script: bool,
    pub enable_auto_follow: bool,
    pub enable_engine_control: bool,
    pub enable_key_turn_animation: bool,
    pub show_gearbox_configuration_notification: bool,

    pub target_rpm_fall_rate: f32,
    pub target_rpm_rise_rate: f32,
    pub shift_delay: f32,
    pub standard_shift_duration: f32,

    /// m/s
    pub cruise_minimum_speed: f32,
    pub cruise_target_acceleration_multiplier: f32,
    pub cruise_maximum_acceleration: f32,
    pub cruise_acceleration_correction: f32,
    pub cruise_following_distance: f32,
    /// Display units per second.
    pub cruise_speed_increment: f32,

    pub traction_control_delay: f32,
    pub min_forward_acceleration: f32,
    pub max_forward_acceleration: f32,
    pub target_brake_deceleration: f32,

    pub fuel_consumption_modifier: f32,
    pub fuel_pump_rate: f32,
    pub jerry_can_drain_rate: f32,

    pub throttle_change_delay: f32,
    pub double_tap_max_delay: f32,
    pub max_ai_gearbox_calculations_per_frame: usize,

    pub steering_sensitivity: f32,
    pub steering_input_rise: f32,
    pub steering_input_fall: f32,
    pub steering_speed_compensation: f32,
    pub steering_input_smoothing: f32,
    pub steering_centering: f32,

    pub indicator_cutoff_arm_threshold: f32,
    pub indicator_cutoff_threshold: f32,

    pub enable_ui: bool,
    pub speed_unit: String,
    pub speed_unit_multiplier: f32,
    pub use_wheel_speed: bool,
    pub speed_smoothing: f32,

    pub gearbox_profile_directory: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enable_advanced_gearbox: true,
            use_manual_gearbox: false,
            enable_smooth_steering: true,
            enable_traction_control: true,
            enable_fuel_script: true,
            enable_auto_follow: true,
            enable_engine_control: true,
            enable_key_turn_animation: true,
            show_gearbox_configuration_notification: false,
            target_rpm_fall_rate: 0.15,
            target_rpm_rise_rate: 0.05,
            shift_delay: 1.5,
            standard_shift_duration: 1.2,
            cruise_minimum_speed: 5.56,
            cruise_target_acceleration_multiplier: 0.5,
            cruise_maximum_acceleration: 5.0,
            cruise_acceleration_correction: 1.0,
            cruise_following_distance: 1.2,
            cruise_speed_increment: 15.0,
            traction_control_delay: 0.2,
            min_forward_acceleration: 2.0,
            max_forward_acceleration: 2.8,
            target_brake_deceleration: 2.5,
            fuel_consumption_modifier: 0.00038,
            fuel_pump_rate: 0.83333,
            jerry_can_drain_rate: 225.0,
            throttle_change_delay: 2.5,
            double_tap_max_delay: 0.2,
            max_ai_gearbox_calculations_per_frame: 20,
            steering_sensitivity: 1.4,
            steering_input_rise: 10.0,
            steering_input_fall: 25.0,
            steering_speed_compensation: 0.036,
            steering_input_smoothing: 0.04,
            steering_centering: 0.16,
            indicator_cutoff_arm_threshold: 0.5,
            indicator_cutoff_threshold: 0.15,
            enable_ui: true,
            speed_unit: "MPH".to_string(),
            speed_unit_multiplier: 2.236936,
            use_wheel_speed: false,
            speed_smoothing: 0.2,
            gearbox_profile_directory: PathBuf::from("./gearbox"),
        }
    }
}

impl Config {
    /// Never fails: a missing file is created with defaults, anything
    /// unreadable falls back to defaults with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            info!("No config at {}, writing defaults", path.display());
            if let Err(e) = create_default_config(path) {
                warn!("{}: {}", e, path.display());
            }
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(config) => config.sanitized(),
            Err(e) => {
                warn!("{} ({}), using defaults", e, path.display());
                Self::default()
            }
        }
    }

    pub fn try_load(path: &Path) -> ConfigResult<Self> {
        let config_file = std::fs::File::open(path).map_err(ConfigError::Open)?;
        let reader = std::io::BufReader::new(config_file);
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn from_json(data: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(data)?;
        Ok(config.sanitized())
    }

    /// Replaces non-finite numbers with their defaults.
    fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        macro_rules! finite {
            ($($field:ident),*) => {
                $(
                    if !self.$field.is_finite() {
                        warn!("{} is not a finite number, using {}", stringify!($field), defaults.$field);
                        self.$field = defaults.$field;
                    }
                )*
            };
        }
        finite!(
            target_rpm_fall_rate,
            target_rpm_rise_rate,
            shift_delay,
            standard_shift_duration,
            cruise_minimum_speed,
            cruise_target_acceleration_multiplier,
            cruise_maximum_acceleration,
            cruise_acceleration_correction,
            cruise_following_distance,
            cruise_speed_increment,
            traction_control_delay,
            min_forward_acceleration,
            max_forward_acceleration,
            target_brake_deceleration,
            fuel_consumption_modifier,
            fuel_pump_rate,
            jerry_can_drain_rate,
            throttle_change_delay,
            double_tap_max_delay,
            steering_sensitivity,
            steering_input_rise,
            steering_input_fall,
            steering_speed_compensation,
            steering_input_smoothing,
            steering_centering,
            indicator_cutoff_arm_threshold,
            indicator_cutoff_threshold,
            speed_unit_multiplier,
            speed_smoothing
        );
        if self.speed_unit_multiplier == 0.0 {
            warn!("speed_unit_multiplier is zero, using {}", defaults.speed_unit_multiplier);
            self.speed_unit_multiplier = defaults.speed_unit_multiplier;
        }
        self
    }
}

impl Config {
    pub fn gearbox_tuning(&self) -> GearboxTuning {
        GearboxTuning {
            target_rpm_fall_rate: self.target_rpm_fall_rate,
            target_rpm_rise_rate: self.target_rpm_rise_rate,
            shift_delay: self.shift_delay,
        }
    }

    pub fn pedal_tuning(&self) -> PedalTuning {
        PedalTuning {
            min_forward_acceleration: self.min_forward_acceleration,
            max_forward_acceleration: self.max_forward_acceleration,
            target_brake_deceleration: self.target_brake_deceleration,
            throttle_change_delay: self.throttle_change_delay,
        }
    }

    pub fn cruise_tuning(&self) -> CruiseTuning {
        CruiseTuning {
            minimum_speed: self.cruise_minimum_speed,
            target_acceleration_multiplier: self.cruise_target_acceleration_multiplier,
            maximum_acceleration: self.cruise_maximum_acceleration,
            acceleration_correction: self.cruise_acceleration_correction,
            following_distance: self.cruise_following_distance,
            speed_increment: self.cruise_speed_increment / self.speed_unit_multiplier,
        }
    }

    pub fn steering_tuning(&self) -> SteeringTuning {
        SteeringTuning {
            sensitivity: self.steering_sensitivity,
            input_rise: self.steering_input_rise,
            input_fall: self.steering_input_fall,
            speed_compensation: self.steering_speed_compensation,
            input_smoothing: self.steering_input_smoothing,
            centering: self.steering_centering,
        }
    }

    pub fn refuel_tuning(&self) -> RefuelTuning {
        RefuelTuning {
            pump_rate: self.fuel_pump_rate,
            jerry_can_drain_rate: self.jerry_can_drain_rate,
        }
    }
}

pub fn create_default_config(path: &Path) -> ConfigResult<()> {
    use std::io::prelude::*;
    let mut config_file = std::fs::File::create(path).map_err(ConfigError::Write)?;
    let config = Config::default();
    let config_str = serde_json::to_vec_pretty(&config)?;
    config_file.write_all(&config_str).map_err(ConfigError::Write)?;
    Ok(())
}
