pub mod electrics;
pub mod gearbox;
pub mod transform;
pub mod wheel;

pub use electrics::*;
pub use gearbox::*;
pub use transform::*;
pub use wheel::*;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum VehicleClass {
    Car,
    Bike,
    QuadBike,
    Tank,
    Other,
}

impl VehicleClass {
    pub fn is_driveable(&self) -> bool {
        matches!(self, VehicleClass::Car | VehicleClass::Bike | VehicleClass::QuadBike)
    }
}

impl Default for VehicleClass {
    fn default() -> Self {
        VehicleClass::Car
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct VehicleModel {
    pub hash: u32,
    pub class: VehicleClass,
    pub electric: bool,
}

/// Everything the core reads from the controlled vehicle in one tick.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VehicleTelemetry {
    pub vehicle_id: u32,
    pub model: VehicleModel,
    pub transform: Transform,
    pub wheels: Vec<Wheel>,
    /// Host's own body-relative wheel speed scalar.
    pub wheel_speed: f32,
    pub speed: f32,
    pub gearbox: Gearbox,
    pub electrics: Electrics,
    pub handling: Handling,
}

// Traffic around the player, used by cruise auto-follow.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct NearbyVehicle {
    pub vehicle_id: u32,
    pub position: [f32; 3],
    pub rear_position: [f32; 3],
    pub heading: f32,
    pub forward_speed: f32,
    pub has_driver: bool,
}

/// Background vehicle handed to the AI gearbox pass.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TrafficVehicle {
    pub vehicle_id: u32,
    pub wheels: Vec<Wheel>,
    pub wheel_speed: f32,
    pub speed: f32,
    pub throttle_power: f32,
    pub gearbox: Gearbox,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct TrafficGearCommand {
    pub vehicle_id: u32,
    pub gear: Option<i32>,
    pub clutch: f32,
}

/// Player on foot near the vehicle they last drove.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct RefuelContext {
    pub vehicle_id: u32,
    pub distance_to_vehicle: f32,
    pub near_fuel_pump: bool,
    pub holding_fuel_can: bool,
    pub fuel_can_ammo: i32,
    pub fuel_can_clip_size: i32,
    pub fuel_level: f32,
    pub tank_volume: f32,
    pub engine_running: bool,
}
