//! Per-tick speed and acceleration aggregates derived from raw telemetry.

use crate::math::{finite_or, length, rate, rotate_inverse};
use shared::vehicle::{VehicleTelemetry, Wheel};

/// Mean forward speed over the wheels `select` accepts. Falls back to the
/// host's wheel speed scalar, then to body speed when that is exactly zero.
pub fn average_wheel_speed<F>(wheels: &[Wheel], wheel_speed: f32, speed: f32, select: F) -> f32
where
    F: Fn(&Wheel) -> bool,
{
    let mut sum = 0.0;
    let mut count = 0;
    for wheel in wheels.iter().filter(|w| select(*w)) {
        sum += wheel.forward_speed();
        count += 1;
    }
    if count > 0 {
        return finite_or(sum / count as f32, 0.0);
    }
    if wheel_speed != 0.0 {
        wheel_speed
    } else {
        speed
    }
}

pub fn average_drive_wheel_speed(wheels: &[Wheel], wheel_speed: f32, speed: f32) -> f32 {
    average_wheel_speed(wheels, wheel_speed, speed, Wheel::is_powered)
}

pub fn average_steer_wheel_speed(wheels: &[Wheel], wheel_speed: f32, speed: f32) -> f32 {
    average_wheel_speed(wheels, wheel_speed, speed, Wheel::is_steered)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameState {
    pub velocity: f32,
    pub velocity_acceleration: f32,
    pub forward_speed: f32,
    pub forward_acceleration: f32,
    pub average_drive_wheel_speed: f32,
    pub average_steer_wheel_speed: f32,
    pub average_wheel_speed: f32,
    pub forward_drive_acceleration: f32,
    pub rpm: f32,
    pub rpm_delta: f32,
}

/// Holds the previous frame so derivatives can be taken.
#[derive(Debug, Clone, Default)]
pub struct KinematicsSampler {
    last: Option<FrameState>,
}

impl KinematicsSampler {
    pub fn sample(&mut self, telemetry: &VehicleTelemetry, dt: f32) -> FrameState {
        let wheels = &telemetry.wheels;
        let velocity = finite_or(length(telemetry.transform.velocity), 0.0);
        let local = rotate_inverse(telemetry.transform.rotation, telemetry.transform.velocity);
        let drive = average_drive_wheel_speed(wheels, telemetry.wheel_speed, telemetry.speed);
        let steer = average_steer_wheel_speed(wheels, telemetry.wheel_speed, telemetry.speed);
        let all = if wheels.is_empty() {
            0.0
        } else {
            wheels.iter().map(Wheel::forward_speed).sum::<f32>() / wheels.len() as f32
        };

        let mut frame = FrameState {
            velocity,
            forward_speed: finite_or(local[1], 0.0),
            average_drive_wheel_speed: finite_or(drive, 0.0),
            average_steer_wheel_speed: finite_or(steer, 0.0),
            average_wheel_speed: finite_or(all, 0.0),
            rpm: finite_or(telemetry.electrics.rpm, 0.0),
            ..Default::default()
        };

        // The first frame of a session has nothing to differentiate against.
        let last = self.last.unwrap_or(frame);
        frame.velocity_acceleration = rate(frame.velocity, last.velocity, dt);
        frame.forward_acceleration = rate(frame.forward_speed, last.forward_speed, dt);
        frame.forward_drive_acceleration =
            rate(frame.average_drive_wheel_speed, last.average_drive_wheel_speed, dt);
        frame.rpm_delta = rate(frame.rpm, last.rpm, dt);

        self.last = Some(frame);
        frame
    }
}
