//! Pedal shaping: ramped light throttle and brake, double-tap full pedal,
//! reverse pedals, traction control and the speed limiter.

use crate::math::{clamp, finite_or};

pub const THROTTLE_GAIN: f32 = 0.25;
pub const BRAKE_GAIN: f32 = 10.0;
/// Below this forward speed the throttle ramp skips the settle delay.
pub const LOW_SPEED: f32 = 2.5;
pub const LIMITER_GAIN: f32 = 4.0;

/// Detects two presses of one control within the configured window.
#[derive(Debug, Clone, Copy)]
pub struct DoubleTap {
    pub active: bool,
    /// Seconds since the control was last pressed.
    pub timer: f32,
}

impl Default for DoubleTap {
    fn default() -> Self {
        Self {
            active: false,
            timer: f32::MAX,
        }
    }
}

impl DoubleTap {
    /// `forced` makes any press count, as in race mode.
    pub fn update(&mut self, just_pressed: bool, held: bool, forced: bool, threshold: f32, dt: f32) {
        if just_pressed {
            if self.timer < threshold || forced {
                self.active = true;
            }
            self.timer = 0.0;
        } else if !held {
            self.active = false;
            self.timer += dt;
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PedalTuning {
    pub min_forward_acceleration: f32,
    pub max_forward_acceleration: f32,
    pub target_brake_deceleration: f32,
    pub throttle_change_delay: f32,
}

impl PedalTuning {
    pub fn target_forward_acceleration(&self) -> f32 {
        (self.min_forward_acceleration + self.max_forward_acceleration) * 0.5
    }
}

/// Pedal positions carried across ticks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pedals {
    pub throttle: f32,
    pub brake: f32,
    pub light_throttle: bool,
    pub light_brake: bool,
    pub throttle_change_timer: f32,
}

impl Pedals {
    /// Forward throttle. A held pedal without a double tap chases the
    /// acceleration band, a double tap floors it.
    pub fn forward_throttle(
        &mut self,
        held: bool,
        double_tap: bool,
        forward_speed: f32,
        forward_acceleration: f32,
        tuning: &PedalTuning,
        dt: f32,
    ) {
        if held && !double_tap {
            if !self.light_throttle {
                self.throttle = 0.0;
                self.light_throttle = true;
                self.throttle_change_timer = tuning.throttle_change_delay;
            }
            if self.throttle_change_timer >= tuning.throttle_change_delay
                || forward_acceleration < 0.0
                || forward_speed < LOW_SPEED
            {
                if forward_acceleration < tuning.min_forward_acceleration
                    || forward_acceleration > tuning.max_forward_acceleration
                {
                    let error = tuning.target_forward_acceleration() - forward_acceleration;
                    self.throttle = clamp(self.throttle + THROTTLE_GAIN * dt * error, 0.0, 1.0);
                }
            } else {
                self.throttle_change_timer += dt;
            }
        } else {
            self.light_throttle = false;
            self.throttle = if held { 1.0 } else { 0.0 };
        }
    }

    /// Forward brake. Returns true when the light brake is applied.
    pub fn forward_brake(
        &mut self,
        held: bool,
        double_tap: bool,
        forward_acceleration: f32,
        tuning: &PedalTuning,
        dt: f32,
    ) -> bool {
        if held && !double_tap {
            if !self.light_brake {
                self.brake = 0.0;
                self.light_brake = true;
            }
            let error = -tuning.target_brake_deceleration - forward_acceleration;
            self.brake = clamp(self.brake - BRAKE_GAIN * dt * error, 0.0, 1.0);
            self.brake > 0.0
        } else {
            self.light_brake = false;
            self.brake = if held { 1.0 } else { 0.0 };
            false
        }
    }

    /// Reverse pedals: brake key drives the throttle, accelerate key brakes.
    pub fn reverse(&mut self, brake_held: bool, brake_tap: bool, accel_held: bool, accel_tap: bool, dt: f32) {
        self.throttle = reverse_ramp(self.throttle, brake_held, brake_tap, dt);
        self.brake = reverse_ramp(self.brake, accel_held, accel_tap, dt);
    }
}

fn reverse_ramp(value: f32, held: bool, double_tap: bool, dt: f32) -> f32 {
    match (held, double_tap) {
        (true, false) => clamp(value + dt * 0.5, 0.0, 0.3),
        (true, true) => clamp(value + dt * 5.0, 0.0, 1.0),
        _ => clamp(value - dt * 15.0, 0.0, 1.0),
    }
}

pub fn torque_multiplier(electric: bool, burnout: bool, rpm: f32) -> f32 {
    if electric || burnout {
        1.0
    } else {
        clamp(100.0 * (1.0 - rpm), 0.0, 1.0)
    }
}

/// Keeps the reverse lights lit by fading torque with the throttle.
pub fn reverse_torque_scale(throttle: f32) -> f32 {
    clamp(throttle / 0.1, 0.0, 1.0)
}

/// Cuts throttle once the wheels pass `limiter` (m/s, 0 disables).
pub fn apply_speed_limiter(throttle: f32, limiter: f32, average_wheel_speed: f32, drive_speed: f32) -> f32 {
    if limiter > 0.0 && average_wheel_speed > limiter {
        clamp(throttle - LIMITER_GAIN * (drive_speed - limiter), 0.0, 1.0)
    } else {
        throttle
    }
}

pub mod traction {
    //! Slip thresholds, tuned by hand for cars in the forward case.

    pub const FORWARD_ACCEL_FACTOR: f32 = 1.3;
    pub const FORWARD_OVERSPEED_LIMIT: f32 = 0.5;
    pub const FORWARD_OVERSPEED_MIN_SPEED: f32 = 2.0;
    pub const FORWARD_OVERSPEED_DECAY: f32 = 50.0;
    pub const FORWARD_ACCEL_DECAY: f32 = 25.0;
    pub const FORWARD_RECOVERY: f32 = 2.0;

    pub const REVERSE_ACCEL_FACTOR: f32 = -1.75;
    pub const REVERSE_OVERSPEED_LIMIT: f32 = 0.3;
    pub const REVERSE_OVERSPEED_MIN_SPEED: f32 = 0.1;
    pub const REVERSE_ACCEL_DECAY: f32 = 10.0;
    pub const REVERSE_RECOVERY: f32 = 5.0;
    /// Reverse power never drops below this magnitude.
    pub const REVERSE_MIN_POWER: f32 = -0.1;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SlipInputs {
    pub throttle: f32,
    pub velocity_acceleration: f32,
    pub forward_drive_acceleration: f32,
    pub drive_speed: f32,
    pub steer_speed: f32,
}

#[derive(Debug, Clone, Copy)]
pub struct TractionControl {
    pub factor: f32,
    pub timer: f32,
}

impl Default for TractionControl {
    fn default() -> Self {
        Self {
            factor: 1.0,
            timer: 0.0,
        }
    }
}

impl TractionControl {
    /// Returns the forward throttle power after slip attenuation.
    pub fn forward(&mut self, slip: &SlipInputs, delay: f32, dt: f32) -> f32 {
        use traction::*;
        let threshold = FORWARD_ACCEL_FACTOR * slip.velocity_acceleration;
        let over_acceleration = slip.forward_drive_acceleration - threshold;
        let overspeed = if slip.steer_speed > 0.0 {
            slip.drive_speed / slip.steer_speed - 1.0
        } else {
            slip.drive_speed
        };
        let accel_slip = slip.throttle > 0.0 && threshold > 0.0 && over_acceleration > 0.0;
        let overspeed_slip = slip.throttle > 0.0 && overspeed > FORWARD_OVERSPEED_LIMIT;

        if accel_slip || overspeed_slip {
            self.timer += dt;
            if overspeed_slip && slip.drive_speed.abs() > FORWARD_OVERSPEED_MIN_SPEED {
                self.decay(FORWARD_OVERSPEED_DECAY * dt * overspeed);
            } else if self.timer >= delay && accel_slip {
                self.decay(FORWARD_ACCEL_DECAY * dt * over_acceleration / slip.velocity_acceleration);
            }
        } else {
            self.recover(FORWARD_RECOVERY * dt);
        }
        finite_or(slip.throttle * self.factor, 0.0)
    }

    /// Returns the (negative) reverse throttle power after slip attenuation.
    pub fn reverse(&mut self, slip: &SlipInputs, delay: f32, dt: f32) -> f32 {
        use traction::*;
        let threshold = REVERSE_ACCEL_FACTOR * slip.velocity_acceleration;
        let over_acceleration = threshold - slip.forward_drive_acceleration;
        let overspeed = if slip.steer_speed < 0.0 {
            slip.drive_speed / slip.steer_speed - 1.0
        } else {
            slip.drive_speed
        };
        let accel_slip = slip.throttle > 0.0 && threshold < 0.0 && over_acceleration > 0.0;
        let overspeed_slip = slip.throttle > 0.0 && overspeed > REVERSE_OVERSPEED_LIMIT;

        if accel_slip || overspeed_slip {
            self.timer += dt;
            if overspeed_slip && slip.drive_speed.abs() > REVERSE_OVERSPEED_MIN_SPEED {
                self.factor = 0.0;
            } else if self.timer >= delay {
                self.decay(REVERSE_ACCEL_DECAY * dt * over_acceleration / slip.velocity_acceleration);
            }
        } else {
            self.recover(REVERSE_RECOVERY * dt);
        }
        reverse_power(slip.throttle * self.factor)
    }

    fn decay(&mut self, amount: f32) {
        // A NaN amount (zero body acceleration) leaves the factor alone.
        if amount.is_finite() {
            self.factor = clamp(self.factor - amount, 0.0, 1.0);
        }
    }

    fn recover(&mut self, amount: f32) {
        self.timer = 0.0;
        self.factor = clamp(self.factor + amount, 0.0, 1.0);
    }
}

pub fn reverse_power(throttle: f32) -> f32 {
    finite_or((-throttle).min(traction::REVERSE_MIN_POWER), traction::REVERSE_MIN_POWER)
}
