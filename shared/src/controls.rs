use serde::{Deserialize, Serialize};

/// Held state of the bound keys this tick. Edges are derived by the core.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Keys {
    pub engine: bool,
    pub cruise: bool,
    pub cruise_resume: bool,
    pub cruise_faster: bool,
    pub cruise_slower: bool,
    pub left_indicator: bool,
    pub right_indicator: bool,
    pub hazard: bool,
    pub race_mode: bool,
    pub direction_switch: bool,
    pub up_shift: bool,
    pub down_shift: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Controls {
    pub accelerate: bool,
    pub brake: bool,
    pub steer_left: bool,
    pub steer_right: bool,
    pub mouse_steering: bool,
    pub refuel: bool,
    pub keys: Keys,
}
