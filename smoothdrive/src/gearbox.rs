//! Gear selection for the player vehicle: automatic target-RPM tracking,
//! manual key shifting and the ratio blend applied while a shift is in
//! progress.

use crate::math::{clamp, finite_or};
use log::debug;

/// Target RPM the automatic box settles to when idling.
pub const IDLE_TARGET_RPM: f32 = 0.4;
/// Target RPM held while coasting before decel mode expires.
pub const COAST_TARGET_RPM: f32 = 0.6;
pub const FULL_THROTTLE_TARGET_RPM: f32 = 0.99;
pub const DECEL_UP_SHIFT_HOLD: f32 = 5.0;
/// A downshift is only considered when the lower gear would stay under this RPM.
pub const DOWNSHIFT_MAX_RPM: f32 = 0.8;
pub const MIN_TIME_TO_REDLINE: f32 = 1.5;
pub const MIN_SCAN_SPEED: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

impl Default for Direction {
    fn default() -> Self {
        Direction::Forward
    }
}

/// S-curve shift weight, exactly 0 at `t = 0` and exactly 1 at `t = duration`.
pub fn shift_weight(timer: f32, duration: f32) -> f32 {
    let progress = if duration > 0.0 {
        clamp(timer / duration, 0.0, 1.0)
    } else {
        1.0
    };
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }
    0.5 * ((std::f32::consts::PI * (progress - 0.5)).sin() + 1.0)
}

/// Fresh copy of `base` with the ratio of `current` blended from the ratio of
/// `last` by `weight`. Boundary weights reproduce the endpoint ratios exactly.
pub fn blend_ratios(base: &[f32], last: i32, current: i32, weight: f32) -> Vec<f32> {
    let mut ratios = base.to_vec();
    let from = ratio_at(base, last);
    let to = ratio_at(base, current);
    if let (Some(from), Some(to), Some(slot)) = (from, to, index(current).and_then(|i| ratios.get_mut(i))) {
        *slot = if weight <= 0.0 {
            from
        } else if weight >= 1.0 {
            to
        } else {
            from * (1.0 - weight) + to * weight
        };
    }
    ratios
}

fn index(gear: i32) -> Option<usize> {
    if gear < 0 {
        None
    } else {
        Some(gear as usize)
    }
}

pub fn ratio_at(ratios: &[f32], gear: i32) -> Option<f32> {
    index(gear).and_then(|i| ratios.get(i)).copied()
}

/// How the scan treats a downshift candidate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DownshiftGuard {
    /// Only the lower gear's RPM is checked.
    RpmOnly,
    /// Also refuse while the engine would hit redline within
    /// [`MIN_TIME_TO_REDLINE`] at the current RPM trend.
    RedlineTrend { rpm_delta: f32 },
}

/// Scans gears upward from 1 for the first ratio at or below
/// `target_ratio`. Returns `top_gear` when nothing qualifies.
pub fn scan_target_gear(
    ratios: &[f32],
    current_gear: i32,
    top_gear: i32,
    target_ratio: f32,
    drive_speed: f32,
    drive_max_flat_velocity: f32,
    guard: DownshiftGuard,
) -> i32 {
    let mut gear = 1;
    while gear < top_gear {
        let ratio = match ratio_at(ratios, gear) {
            Some(r) => r,
            None => return gear,
        };
        if ratio <= target_ratio {
            if gear >= current_gear {
                return gear;
            }
            let gear_rpm = finite_or(drive_speed * ratio / drive_max_flat_velocity, f32::MAX);
            let accept = match guard {
                DownshiftGuard::RpmOnly => gear_rpm < DOWNSHIFT_MAX_RPM,
                DownshiftGuard::RedlineTrend { rpm_delta } => {
                    let ratio_ratio = ratio_at(ratios, current_gear).unwrap_or(ratio) / ratio;
                    let time_to_redline = if rpm_delta > 0.0 {
                        finite_or((1.0 - gear_rpm) / (rpm_delta * ratio_ratio), 0.0)
                    } else {
                        -1.0
                    };
                    gear_rpm < DOWNSHIFT_MAX_RPM
                        && (time_to_redline >= MIN_TIME_TO_REDLINE || time_to_redline == -1.0)
                }
            };
            if accept {
                return gear;
            }
        }
        gear += 1;
    }
    gear
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ShiftInputs {
    pub throttle: f32,
    pub brake: f32,
    pub brake_held: bool,
    pub rpm: f32,
    pub rpm_delta: f32,
    pub drive_speed: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct GearboxTuning {
    pub target_rpm_fall_rate: f32,
    pub target_rpm_rise_rate: f32,
    pub shift_delay: f32,
}

/// Gearbox state for one driving session.
#[derive(Debug, Clone, Default)]
pub struct GearboxSession {
    pub direction: Direction,
    pub current_gear: i32,
    pub last_gear: i32,
    pub top_gear: i32,
    pub base_ratios: Vec<f32>,
    pub drive_max_flat_velocity: f32,
    pub shifting: bool,
    pub shift_timer: f32,
    pub shift_wait_timer: f32,
    pub up_shift_duration: f32,
    pub down_shift_duration: f32,
    pub target_rpm: f32,
    pub decel_mode: bool,
    pub decel_up_shift_timer: f32,
}

impl GearboxSession {
    pub fn new(current_gear: i32, standard_duration: f32, up_scale: f32, down_scale: f32) -> Self {
        let duration = |scale: f32| {
            if scale > 0.0 {
                finite_or(standard_duration / scale, standard_duration)
            } else {
                standard_duration
            }
        };
        Self {
            current_gear,
            last_gear: current_gear,
            up_shift_duration: duration(up_scale),
            down_shift_duration: duration(down_scale),
            ..Default::default()
        }
    }

    /// Refreshes the base ratios from the host, except mid-shift when the
    /// host holds the blended set.
    pub fn observe(&mut self, ratios: &[f32], top_gear: i32, drive_max_flat_velocity: f32) {
        if !self.shifting {
            self.base_ratios.clear();
            self.base_ratios.extend_from_slice(ratios);
            self.top_gear = top_gear;
        }
        self.drive_max_flat_velocity = drive_max_flat_velocity;
    }

    /// Drops any shift in progress; the host gets the base ratios back.
    pub fn cancel_shift(&mut self) -> Vec<f32> {
        self.shifting = false;
        self.shift_timer = 0.0;
        self.shift_wait_timer = 0.0;
        self.base_ratios.clone()
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        self.current_gear = match direction {
            Direction::Forward => 1,
            Direction::Reverse => 0,
        };
    }

    pub fn clamp_forward_gear(&mut self) {
        if self.current_gear < 1 {
            self.current_gear = 1;
        }
        if self.current_gear > self.top_gear {
            self.current_gear = self.top_gear;
        }
    }

    pub fn manual_shift(&mut self, up: bool, down: bool) {
        if down && self.current_gear > 1 {
            self.begin_shift(self.current_gear - 1);
        }
        if up && self.current_gear < self.top_gear {
            self.begin_shift(self.current_gear + 1);
        }
    }

    fn begin_shift(&mut self, gear: i32) {
        self.last_gear = self.current_gear;
        self.current_gear = gear;
        self.shifting = true;
        self.shift_timer = 0.0;
    }

    pub fn update_target_rpm(&mut self, inputs: &ShiftInputs, tuning: &GearboxTuning, dt: f32) {
        let ramp = clamp((inputs.throttle - 0.2) / 0.6, 0.0, 1.0);
        if inputs.brake_held {
            self.target_rpm += clamp(
                IDLE_TARGET_RPM - self.target_rpm,
                -tuning.target_rpm_fall_rate * (1.0 + inputs.brake) * dt,
                0.0,
            );
            self.decel_up_shift_timer = DECEL_UP_SHIFT_HOLD;
            self.decel_mode = false;
        } else if inputs.throttle == 0.0 {
            if self.target_rpm >= COAST_TARGET_RPM {
                self.target_rpm = COAST_TARGET_RPM;
                if self.decel_up_shift_timer < DECEL_UP_SHIFT_HOLD {
                    self.decel_mode = true;
                    self.decel_up_shift_timer += dt;
                } else {
                    self.decel_mode = false;
                }
            } else {
                self.target_rpm = IDLE_TARGET_RPM;
                self.decel_up_shift_timer = DECEL_UP_SHIFT_HOLD;
                self.decel_mode = false;
            }
        } else if ramp < 1.0 {
            self.target_rpm += clamp(
                IDLE_TARGET_RPM + ramp * ramp * 0.6 - self.target_rpm,
                -tuning.target_rpm_fall_rate * dt * (1.0 - ramp),
                tuning.target_rpm_rise_rate * dt * ramp,
            );
            self.decel_up_shift_timer = DECEL_UP_SHIFT_HOLD;
            self.decel_mode = false;
        } else {
            self.target_rpm = FULL_THROTTLE_TARGET_RPM;
            self.decel_up_shift_timer = 0.0;
            self.decel_mode = false;
        }
    }

    pub fn target_gear(&self, inputs: &ShiftInputs) -> i32 {
        if inputs.drive_speed <= MIN_SCAN_SPEED {
            return 1;
        }
        let target_ratio = self.target_rpm * self.drive_max_flat_velocity / inputs.drive_speed;
        scan_target_gear(
            &self.base_ratios,
            self.current_gear,
            self.top_gear,
            target_ratio,
            inputs.drive_speed,
            self.drive_max_flat_velocity,
            DownshiftGuard::RedlineTrend {
                rpm_delta: inputs.rpm_delta,
            },
        )
    }

    /// Commits `target` once the shift gates open. Returns true on commit.
    pub fn commit(&mut self, target: i32, inputs: &ShiftInputs, tuning: &GearboxTuning, dt: f32) -> bool {
        if self.shifting || self.current_gear == target {
            if self.shift_wait_timer > 0.0 {
                self.shift_wait_timer = 0.0;
            }
            return false;
        }
        self.shift_wait_timer += dt;
        let downshift = target < self.current_gear;
        let gate_open = self.shift_wait_timer >= tuning.shift_delay
            || inputs.rpm < 0.3
            || (inputs.rpm >= 0.9 && inputs.rpm_delta < 0.01)
            || inputs.rpm > 0.99
            || (downshift && inputs.throttle >= 0.9);
        if gate_open && (!self.decel_mode || downshift) {
            debug!("Shifting {} -> {}", self.current_gear, target);
            self.begin_shift(target);
            self.shift_wait_timer = 0.0;
            return true;
        }
        false
    }

    /// Runs the automatic box for one tick. Returns true when a shift was
    /// committed.
    pub fn automatic(&mut self, inputs: &ShiftInputs, tuning: &GearboxTuning, dt: f32) -> bool {
        self.update_target_rpm(inputs, tuning, dt);
        let target = self.target_gear(inputs);
        self.commit(target, inputs, tuning, dt)
    }

    /// Advances the shift blend. Returns the ratio set the host should use
    /// this tick, or `None` when no shift is running.
    pub fn blend(&mut self, dt: f32) -> Option<Vec<f32>> {
        if !self.shifting {
            return None;
        }
        if self.last_gear == self.current_gear {
            return Some(self.cancel_shift());
        }
        let duration = if self.last_gear < self.current_gear {
            self.up_shift_duration
        } else {
            self.down_shift_duration
        };
        let weight = shift_weight(self.shift_timer, duration);
        self.shift_timer += dt;
        if self.shift_timer > duration {
            self.shifting = false;
            self.shift_timer = 0.0;
            return Some(self.base_ratios.clone());
        }
        Some(blend_ratios(&self.base_ratios, self.last_gear, self.current_gear, weight))
    }
}
