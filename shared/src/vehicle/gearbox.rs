use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Gearbox {
    pub current_gear: i32,
    pub top_gear: i32,
    /// Indexed by gear, `gear_ratios[0]` is reverse.
    pub gear_ratios: Vec<f32>,
    pub drive_max_flat_velocity: f32,
}
