//! Keyboard steering smoother.

use crate::math::{clamp, finite_or, smoothing_weight};

pub const INPUT_DEADZONE: f32 = 0.01;
/// Above this input magnitude self-centering is off.
pub const CENTERING_CUTOFF: f32 = 0.95;

#[derive(Debug, Clone, Copy)]
pub struct SteeringTuning {
    pub sensitivity: f32,
    pub input_rise: f32,
    pub input_fall: f32,
    pub speed_compensation: f32,
    pub input_smoothing: f32,
    pub centering: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SteeringSmoother {
    /// Accumulated key input in [-1, 1], positive is left.
    pub input: f32,
    /// Integrated steering in [-1, 1].
    pub steering: f32,
}

impl SteeringSmoother {
    pub fn new(host_steering: f32) -> Self {
        Self {
            input: 0.0,
            steering: host_steering,
        }
    }

    /// Mouse steering owns the wheel; mirror the host value.
    pub fn mirror(&mut self, host_steering: f32) -> f32 {
        self.steering = host_steering;
        self.input = 0.0;
        host_steering
    }

    /// Returns the steering scale to write back to the host.
    pub fn update(
        &mut self,
        left: bool,
        right: bool,
        steer_speed: f32,
        host_steering: f32,
        tuning: &SteeringTuning,
        dt: f32,
    ) -> f32 {
        let compensation = 1.0 + tuning.speed_compensation * steer_speed.abs();

        if left && !right {
            if self.input < 0.0 {
                self.input = -self.input;
            }
            self.input = (self.input + compensation * dt * tuning.input_rise).min(1.0);
        } else if right && !left {
            if self.input > 0.0 {
                self.input = -self.input;
            }
            self.input = (self.input - compensation * dt * tuning.input_rise).max(-1.0);
        } else {
            let step = compensation * dt * tuning.input_fall;
            if self.input > step {
                self.input -= step;
            } else if self.input < -step {
                self.input += step;
            } else {
                self.input = 0.0;
            }
        }

        let magnitude = self.input.abs();
        if magnitude < INPUT_DEADZONE {
            self.input = 0.0;
        }
        self.steering = clamp(
            self.steering + dt * tuning.sensitivity * self.input * compensation,
            -1.0,
            1.0,
        );

        if magnitude < CENTERING_CUTOFF {
            let base = 1.0 / (tuning.centering * steer_speed * steer_speed + 1.0);
            let rate = (1.0 - magnitude) * smoothing_weight(base, dt);
            self.steering -= self.steering * rate;
        }
        self.steering = finite_or(self.steering, 0.0);

        let output = host_steering + (self.steering - host_steering) * smoothing_weight(tuning.input_smoothing, dt);
        clamp(finite_or(output, self.steering), -1.0, 1.0)
    }
}
