//! Dashboard values derived each tick. Nothing here feeds back into the
//! dynamics except the smoothed speed cruise captures on engage.

use crate::math::{clamp, finite_or, smoothing_weight};
use shared::{Display, IndicatorState};

pub const NEAR_LIMIT_FRACTION: f32 = 0.95;

#[derive(Debug, Clone, Copy, Default)]
pub struct SpeedSmoother {
    pub speed: f32,
}

impl SpeedSmoother {
    pub fn reset(&mut self) {
        self.speed = 0.0;
    }

    pub fn update(&mut self, raw_speed: f32, smoothing: f32, dt: f32) -> f32 {
        let weight = smoothing_weight(smoothing, dt * 5.0);
        self.speed = finite_or(self.speed + (raw_speed - self.speed) * weight, 0.0);
        self.speed
    }
}

pub fn display_rpm(rpm: f32) -> f32 {
    clamp(rpm / 0.99, 0.2, 1.0)
}

pub fn gear_label(gear: i32, electric: bool) -> String {
    if electric && gear != 0 {
        return "Forward".to_string();
    }
    if gear <= 0 {
        return "Reverse".to_string();
    }
    let suffix = match (gear % 10, gear % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{} Gear", gear, suffix)
}

pub fn near_speed_limit(speed: f32, limiter: f32) -> bool {
    limiter > 0.0 && speed / limiter >= NEAR_LIMIT_FRACTION
}

#[derive(Debug, Clone, Default)]
pub struct DisplayInputs {
    pub engine_on: bool,
    pub speed: f32,
    pub rpm: f32,
    pub fuel_fraction: f32,
    pub gear: i32,
    pub electric: bool,
    pub cruise_active: bool,
    pub cruise_speed: f32,
    pub race_mode: bool,
    pub indicator: IndicatorState,
    pub indicator_flash: bool,
    pub headlights: bool,
    pub high_beams: bool,
    pub speed_limiter: f32,
}

pub fn build(inputs: &DisplayInputs, unit: &str, unit_multiplier: f32) -> Display {
    Display {
        engine_on: inputs.engine_on,
        speed: inputs.speed,
        speed_unit: unit.to_string(),
        speed_in_units: inputs.speed * unit_multiplier,
        rpm: display_rpm(inputs.rpm),
        fuel: clamp(finite_or(inputs.fuel_fraction, 1.0), 0.0, 1.0),
        gear_label: gear_label(inputs.gear, inputs.electric),
        cruise_active: inputs.cruise_active,
        cruise_speed_in_units: inputs.cruise_speed * unit_multiplier,
        race_mode: inputs.race_mode,
        indicator: inputs.indicator,
        indicator_flash: inputs.indicator_flash,
        headlights: inputs.headlights,
        high_beams: inputs.high_beams,
        near_speed_limit: near_speed_limit(inputs.speed, inputs.speed_limiter),
    }
}
