extern crate pretty_env_logger;

pub mod controls;
pub mod vehicle;

use chrono::Local;
pub use controls::*;
pub use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::io::Write;
use vehicle::*;

pub const VERSION: (u32, u32) = (0, 3);
pub const VERSION_STR: &str = "0.3.0";

/// One simulation frame as seen by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub dt: f32,
    /// Present while the player sits in a vehicle.
    pub vehicle: Option<VehicleTelemetry>,
    pub player_controlled: bool,
    pub controls: Controls,
    pub nearby: Vec<NearbyVehicle>,
    pub traffic: Vec<TrafficVehicle>,
    pub refuel: Option<RefuelContext>,
}

impl TickInput {
    pub fn from_bytes(data: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::decode::from_read_ref(data)
    }
    pub fn to_bytes(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::encode::to_vec(self)
    }
}

/// Writes back into the controlled vehicle. `None` leaves the host value alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VehicleCommand {
    pub vehicle_id: u32,
    pub gear: Option<i32>,
    pub throttle_power: f32,
    pub brake_power: f32,
    pub clutch: Option<f32>,
    pub steering_scale: Option<f32>,
    pub engine_on: Option<bool>,
    pub play_key_turn_animation: bool,
    pub left_indicator: bool,
    pub right_indicator: bool,
    pub force_brake_lights: bool,
    pub fuel_level: Option<f32>,
    pub torque_multiplier: f32,
    pub gear_ratios: Option<Vec<f32>>,
    pub drive_max_flat_velocity: Option<f32>,
    pub top_gear: Option<i32>,
    /// Accelerate/brake are swallowed while the direction switch is held.
    pub suppress_pedals: bool,
}

/// Sent once when a driving session ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleRestore {
    pub vehicle_id: u32,
    pub gear_ratios: Vec<f32>,
    pub engine_on: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RefuelStatus {
    EngineRunning,
    FuelCanEmpty,
    /// Fraction of the tank, shown with a refuel prompt.
    Refuelling(f32),
    Full(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RefuelCommand {
    pub vehicle_id: u32,
    pub status: RefuelStatus,
    pub fuel_level: Option<f32>,
    pub fuel_can_ammo_used: i32,
    pub suppress_pickup: bool,
    pub play_finish_sound: bool,
}

/// Native override groups the core needs the platform layer to keep active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeOverrides {
    pub runtime: bool,
    pub vehicle: bool,
    pub gearbox: bool,
    pub steering: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorState {
    Off,
    Left,
    Right,
    Hazard,
}

impl Default for IndicatorState {
    fn default() -> Self {
        IndicatorState::Off
    }
}

impl IndicatorState {
    pub fn from_lights(bits: u8) -> Self {
        match bits & 3 {
            1 => IndicatorState::Left,
            2 => IndicatorState::Right,
            3 => IndicatorState::Hazard,
            _ => IndicatorState::Off,
        }
    }
    pub fn left_on(&self) -> bool {
        matches!(self, IndicatorState::Left | IndicatorState::Hazard)
    }
    pub fn right_on(&self) -> bool {
        matches!(self, IndicatorState::Right | IndicatorState::Hazard)
    }
}

/// Dashboard values; the renderer lives elsewhere.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Display {
    pub engine_on: bool,
    /// m/s, smoothed.
    pub speed: f32,
    pub speed_unit: String,
    pub speed_in_units: f32,
    pub rpm: f32,
    pub fuel: f32,
    pub gear_label: String,
    pub cruise_active: bool,
    pub cruise_speed_in_units: f32,
    pub race_mode: bool,
    pub indicator: IndicatorState,
    pub indicator_flash: bool,
    pub headlights: bool,
    pub high_beams: bool,
    pub near_speed_limit: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notice {
    GearboxProfileLoaded(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickOutput {
    pub vehicle: Option<VehicleCommand>,
    pub restore: Option<VehicleRestore>,
    pub refuel: Option<RefuelCommand>,
    pub traffic: Vec<TrafficGearCommand>,
    pub overrides: NativeOverrides,
    pub display: Option<Display>,
    pub notices: Vec<Notice>,
}

impl TickOutput {
    pub fn from_bytes(data: &[u8]) -> Result<Self, rmp_serde::decode::Error> {
        rmp_serde::decode::from_read_ref(data)
    }
    pub fn to_bytes(&self) -> Result<Vec<u8>, rmp_serde::encode::Error> {
        rmp_serde::encode::to_vec(self)
    }
}

pub fn init_logging() {
    // pretty_env_logger doesn't appear to print anything without using
    // a filter in the builder.
    let filter = match std::env::var("RUST_LOG") {
        Ok(f) => f,
        Err(_e) => "info".to_owned(),
    };

    let _ = pretty_env_logger::formatted_builder()
        .parse_filters(&filter)
        .format(|buf, record| {
            let level = buf.default_styled_level(record.level());
            // Keep only the crate name (smoothdrive::gearbox -> smoothdrive)
            let module_path = record
                .module_path()
                .and_then(|path| path.split(':').next())
                .unwrap_or("unknown");

            writeln!(
                buf,
                "[{}] [{}] [{}]: {}",
                Local::now().format("%H:%M:%S%.3f"),
                module_path,
                format_args!("{:>5}", level),
                record.args()
            )
        })
        .try_init();
}
