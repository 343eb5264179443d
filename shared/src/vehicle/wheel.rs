use serde::{Deserialize, Serialize};

pub const WHEEL_FLAG_STEERED: u16 = 8;
pub const WHEEL_FLAG_POWERED: u16 = 16;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Wheel {
    pub angular_velocity: f32,
    pub radius: f32,
    pub flags: u16,
}

impl Wheel {
    pub fn new(angular_velocity: f32, radius: f32, powered: bool, steered: bool) -> Self {
        let mut flags = 0;
        if powered {
            flags |= WHEEL_FLAG_POWERED;
        }
        if steered {
            flags |= WHEEL_FLAG_STEERED;
        }
        Self {
            angular_velocity,
            radius,
            flags,
        }
    }
    pub fn forward_speed(&self) -> f32 {
        self.radius * self.angular_velocity
    }
    pub fn is_powered(&self) -> bool {
        self.flags & WHEEL_FLAG_POWERED == WHEEL_FLAG_POWERED
    }
    pub fn is_steered(&self) -> bool {
        self.flags & WHEEL_FLAG_STEERED == WHEEL_FLAG_STEERED
    }
}
