//! Fuel burn while driving and the on-foot refuel interaction.

use crate::math::{clamp, finite_or};
use shared::vehicle::RefuelContext;
use shared::{RefuelCommand, RefuelStatus};

pub const IDLE_RPM: f32 = 0.2;
pub const IDLE_THROTTLE: f32 = 0.1;
/// Retries before giving up on a decrement too small to register.
pub const MAX_BURN_RETRIES: usize = 100;
pub const BURN_RETRY_GROWTH: f32 = 1.05;
pub const REFUEL_RANGE: f32 = 5.0;

/// Fraction of the tank burned per second.
pub fn consumption(modifier: f32, throttle_power: f32, rpm: f32, torque_multiplier: f32) -> f32 {
    let throttle = if rpm > IDLE_RPM {
        throttle_power.abs()
    } else {
        IDLE_THROTTLE
    };
    finite_or(
        modifier * throttle * rpm * torque_multiplier * clamp(1.7 - rpm, 0.0, 1.0),
        0.0,
    )
}

/// New fuel level after one tick of burning `rate`. When the decrement is
/// lost to float precision the rate is grown until the level moves.
pub fn burn(level: f32, tank_volume: f32, rate: f32, dt: f32) -> f32 {
    let level = clamp(finite_or(level, 0.0), 0.0, tank_volume.max(0.0));
    if rate <= 0.0 || !rate.is_finite() {
        return level;
    }
    let mut rate = rate;
    for _ in 0..MAX_BURN_RETRIES {
        let next = clamp(level - tank_volume * dt * rate, 0.0, tank_volume.max(0.0));
        if next != level {
            return next;
        }
        rate *= BURN_RETRY_GROWTH;
    }
    level
}

#[derive(Debug, Clone, Copy)]
pub struct RefuelTuning {
    pub pump_rate: f32,
    pub jerry_can_drain_rate: f32,
}

/// Refuel state that outlives a single tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct Refueller {
    pub drain_timer: f32,
    pub played_finish_sound: bool,
}

impl Refueller {
    pub fn reset(&mut self) {
        self.drain_timer = 0.0;
    }

    pub fn update(
        &mut self,
        context: &RefuelContext,
        pressed: bool,
        tuning: &RefuelTuning,
        dt: f32,
    ) -> Option<RefuelCommand> {
        let jerry_can = !context.near_fuel_pump && context.holding_fuel_can;
        if !(context.near_fuel_pump || jerry_can) || context.distance_to_vehicle >= REFUEL_RANGE {
            return None;
        }
        let tank = context.tank_volume.max(0.0);
        let fraction = if tank > 0.0 {
            finite_or(context.fuel_level / tank, 1.0)
        } else {
            1.0
        };
        let mut command = RefuelCommand {
            vehicle_id: context.vehicle_id,
            status: RefuelStatus::Full(fraction),
            fuel_level: None,
            fuel_can_ammo_used: 0,
            suppress_pickup: false,
            play_finish_sound: false,
        };

        if context.engine_running {
            command.status = RefuelStatus::EngineRunning;
        } else if jerry_can && context.fuel_can_ammo <= 0 {
            command.status = RefuelStatus::FuelCanEmpty;
        } else if fraction < 1.0 {
            command.suppress_pickup = true;
            command.status = RefuelStatus::Refuelling(fraction);
            if pressed {
                if jerry_can {
                    self.drain_timer += dt * tuning.jerry_can_drain_rate * tuning.pump_rate;
                    if self.drain_timer > 1.0 {
                        let clip = context.fuel_can_clip_size.max(1) as f32;
                        command.fuel_can_ammo_used = (self.drain_timer % clip + 0.5) as i32;
                        self.drain_timer = 0.0;
                    }
                }
                command.fuel_level = Some(clamp(context.fuel_level + dt * tuning.pump_rate, 0.0, tank));
                self.played_finish_sound = false;
            }
        } else if !self.played_finish_sound {
            command.play_finish_sound = true;
            self.played_finish_sound = true;
        }
        Some(command)
    }
}
