use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: [f32; 3],
    /// Quaternion, `[x, y, z, w]`.
    pub rotation: [f32; 4],
    pub velocity: [f32; 3],
    /// Degrees, counter-clockwise from north (+Y).
    pub heading: f32,
    pub front_position: [f32; 3],
}
