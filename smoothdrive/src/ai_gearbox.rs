//! Lightweight gear selection for traffic, amortised over ticks.

use crate::gearbox::{scan_target_gear, DownshiftGuard, MIN_SCAN_SPEED};
use crate::kinematics::average_drive_wheel_speed;
use shared::vehicle::{TrafficGearCommand, TrafficVehicle};

/// Round-robin cursor over the traffic list.
#[derive(Debug, Clone, Default)]
pub struct AiGearboxManager {
    cursor: usize,
}

impl AiGearboxManager {
    /// Visits at most `budget` vehicles (0 = all) starting where the last
    /// tick stopped, skipping the player's vehicle.
    pub fn tick(&mut self, traffic: &[TrafficVehicle], player: Option<u32>, budget: usize) -> Vec<TrafficGearCommand> {
        if budget == 0 || self.cursor >= traffic.len() {
            self.cursor = 0;
        }
        let start = self.cursor;
        let mut commands = Vec::new();
        while self.cursor < traffic.len() {
            if budget > 0 && self.cursor - start >= budget {
                break;
            }
            let vehicle = &traffic[self.cursor];
            self.cursor += 1;
            if Some(vehicle.vehicle_id) == player {
                continue;
            }
            commands.push(select_gear(vehicle));
        }
        commands
    }
}

pub fn target_gear(vehicle: &TrafficVehicle) -> i32 {
    let drive = average_drive_wheel_speed(&vehicle.wheels, vehicle.wheel_speed, vehicle.speed);
    if drive <= MIN_SCAN_SPEED {
        return 1;
    }
    let gearbox = &vehicle.gearbox;
    let throttle = vehicle.throttle_power;
    let target_ratio = (0.25 + throttle * throttle * 0.7) * gearbox.drive_max_flat_velocity / drive;
    scan_target_gear(
        &gearbox.gear_ratios,
        gearbox.current_gear,
        gearbox.top_gear,
        target_ratio,
        drive,
        gearbox.drive_max_flat_velocity,
        DownshiftGuard::RpmOnly,
    )
}

fn select_gear(vehicle: &TrafficVehicle) -> TrafficGearCommand {
    let target = target_gear(vehicle);
    TrafficGearCommand {
        vehicle_id: vehicle.vehicle_id,
        gear: if target != vehicle.gearbox.current_gear {
            Some(target)
        } else {
            None
        },
        clutch: 1.0,
    }
}
