use serde::{Deserialize, Serialize};

/// Host-side electrics as read at the start of a tick.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Electrics {
    /// Normalised, 1.0 is redline.
    pub rpm: f32,
    pub throttle_power: f32,
    pub steering_scale: f32,
    /// Degrees.
    pub steering_angle: f32,
    pub engine_running: bool,
    pub fuel_level: f32,
    /// Bit 0 left, bit 1 right.
    pub indicator_lights: u8,
    pub indicator_flash: bool,
    pub headlights: bool,
    pub high_beams: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize, Serialize)]
pub struct Handling {
    pub clutch_change_rate_scale_up_shift: f32,
    pub clutch_change_rate_scale_down_shift: f32,
    pub petrol_tank_volume: f32,
}
