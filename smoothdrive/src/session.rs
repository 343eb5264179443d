//! State of one driving session in one vehicle and the per-tick update
//! that runs while the player drives it.

use crate::config::Config;
use crate::controls::Edges;
use crate::cruise::{find_lead, CruiseControl, CruiseFrame, LeadSearch};
use crate::display::{self, DisplayInputs, SpeedSmoother};
use crate::fuel::{burn, consumption};
use crate::gear_profiles::GearProfiles;
use crate::gearbox::{Direction, GearboxSession, ShiftInputs};
use crate::indicators::Indicators;
use crate::kinematics::KinematicsSampler;
use crate::math::{clamp, finite_or};
use crate::steering::SteeringSmoother;
use crate::throttle::{
    apply_speed_limiter, reverse_power, reverse_torque_scale, torque_multiplier, DoubleTap, Pedals, SlipInputs,
    TractionControl,
};
use log::{debug, info};
use shared::vehicle::{NearbyVehicle, VehicleTelemetry};
use shared::{Controls, Display, IndicatorState, Notice, VehicleCommand, VehicleRestore};

/// What a tick of driving hands back to the driver.
#[derive(Debug, Clone, Default)]
pub struct SessionOutput {
    pub command: VehicleCommand,
    pub display: Option<Display>,
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone)]
pub struct Session {
    pub vehicle_id: u32,
    pub electric: bool,
    pub engine_on: bool,
    /// m/s, 0 when the vehicle has no profile.
    pub speed_limiter: f32,
    pub tank_volume: f32,
    pub race_mode: bool,
    pub burnout: bool,
    pub gearbox: GearboxSession,
    pub pedals: Pedals,
    pub accelerate_tap: DoubleTap,
    pub brake_tap: DoubleTap,
    pub cruise: CruiseControl,
    pub traction: TractionControl,
    pub steering: SteeringSmoother,
    pub indicators: Indicators,
    kinematics: KinematicsSampler,
    /// Entry writes come back in the next tick's telemetry; until then the
    /// host ratios are stale.
    fresh: bool,
    entry: Option<SessionOutput>,
}

impl Session {
    pub fn enter(telemetry: &VehicleTelemetry, config: &Config, profiles: &GearProfiles) -> Self {
        let handling = &telemetry.handling;
        let mut gearbox = GearboxSession::new(
            telemetry.gearbox.current_gear,
            config.standard_shift_duration,
            handling.clutch_change_rate_scale_up_shift,
            handling.clutch_change_rate_scale_down_shift,
        );
        gearbox.direction = Direction::Forward;
        gearbox.observe(
            &telemetry.gearbox.gear_ratios,
            telemetry.gearbox.top_gear,
            telemetry.gearbox.drive_max_flat_velocity,
        );

        let mut entry = SessionOutput::default();
        let engine_on = telemetry.electrics.engine_running;
        if config.enable_engine_control {
            entry.command.engine_on = Some(engine_on);
        }

        let mut speed_limiter = 0.0;
        if let Some(profile) = profiles.find(telemetry.model.hash) {
            info!("Applying gearbox profile {} to vehicle {}", profile.name, telemetry.vehicle_id);
            speed_limiter = profile.speed_limiter;
            gearbox.base_ratios = profile.gear_ratios.clone();
            gearbox.top_gear = profile.top_gear();
            gearbox.drive_max_flat_velocity = profile.drive_max_flat_velocity_ms();
            entry.command.gear_ratios = Some(profile.gear_ratios.clone());
            entry.command.top_gear = Some(profile.top_gear());
            entry.command.drive_max_flat_velocity = Some(profile.drive_max_flat_velocity_ms());
            if config.show_gearbox_configuration_notification {
                entry.notices.push(Notice::GearboxProfileLoaded(profile.summary()));
            }
        }

        info!(
            "Entered vehicle {} (gear {}, top gear {}, electric: {})",
            telemetry.vehicle_id, gearbox.current_gear, gearbox.top_gear, telemetry.model.electric
        );

        Self {
            vehicle_id: telemetry.vehicle_id,
            electric: telemetry.model.electric,
            engine_on,
            speed_limiter,
            tank_volume: handling.petrol_tank_volume,
            race_mode: false,
            burnout: false,
            gearbox,
            pedals: Pedals::default(),
            accelerate_tap: DoubleTap::default(),
            brake_tap: DoubleTap::default(),
            cruise: CruiseControl::default(),
            traction: TractionControl::default(),
            steering: SteeringSmoother::new(telemetry.electrics.steering_scale),
            indicators: Indicators::new(IndicatorState::from_lights(telemetry.electrics.indicator_lights)),
            kinematics: KinematicsSampler::default(),
            fresh: true,
            entry: Some(entry),
        }
    }

    /// Undoes what the session wrote into the vehicle.
    pub fn restore(&self) -> VehicleRestore {
        VehicleRestore {
            vehicle_id: self.vehicle_id,
            gear_ratios: self.gearbox.base_ratios.clone(),
            engine_on: self.engine_on,
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn tick(
        &mut self,
        telemetry: &VehicleTelemetry,
        controls: &Controls,
        edges: &Edges,
        nearby: &[NearbyVehicle],
        speedometer: &mut SpeedSmoother,
        config: &Config,
        dt: f32,
    ) -> SessionOutput {
        let mut out = self.entry.take().unwrap_or_default();
        let command = &mut out.command;
        command.vehicle_id = telemetry.vehicle_id;

        let frame = self.kinematics.sample(telemetry, dt);
        if !self.fresh && !self.gearbox.shifting {
            self.gearbox.observe(
                &telemetry.gearbox.gear_ratios,
                telemetry.gearbox.top_gear,
                telemetry.gearbox.drive_max_flat_velocity,
            );
        }
        self.fresh = false;
        if !config.enable_engine_control {
            self.engine_on = telemetry.electrics.engine_running;
        }

        if config.enable_engine_control && edges.keys.engine && telemetry.speed < 1.0 {
            self.engine_on = !self.engine_on;
            command.engine_on = Some(self.engine_on);
            command.play_key_turn_animation = config.enable_key_turn_animation;
            info!("Engine {}", if self.engine_on { "on" } else { "off" });
            if !self.engine_on {
                self.cruise.cancel();
            }
        }

        self.indicators
            .toggle(edges.keys.left_indicator, edges.keys.right_indicator, edges.keys.hazard);
        if edges.keys.race_mode {
            self.race_mode = !self.race_mode;
            debug!("Race mode {}", self.race_mode);
        }

        let accelerate = controls.accelerate;
        let mut brake = controls.brake;
        let burnout = accelerate && brake;
        let mut torque = torque_multiplier(self.electric, burnout, frame.rpm);
        let advanced = config.enable_advanced_gearbox;
        let threshold = config.double_tap_max_delay;

        self.accelerate_tap
            .update(edges.accelerate, accelerate, burnout || self.race_mode, threshold, dt);
        self.brake_tap.update(edges.brake, brake, self.race_mode, threshold, dt);

        if burnout && !self.burnout {
            self.gearbox.set_direction(Direction::Forward);
            command.gear_ratios = Some(self.gearbox.cancel_shift());
            self.pedals.throttle_change_timer = 0.0;
        }
        self.burnout = burnout;
        if burnout {
            brake = false;
        }

        if !burnout
            && controls.keys.direction_switch
            && (frame.forward_speed < 1.0 || self.gearbox.direction == Direction::Reverse)
        {
            command.suppress_pedals = true;
            let wanted = if accelerate && !brake {
                Some(Direction::Forward)
            } else if brake && !accelerate {
                Some(Direction::Reverse)
            } else {
                None
            };
            if let Some(direction) = wanted {
                if direction != self.gearbox.direction {
                    debug!("Direction {:?}", direction);
                    self.cruise.cancel();
                }
                self.gearbox.set_direction(direction);
                self.pedals.throttle_change_timer = 0.0;
                if advanced {
                    command.gear_ratios = Some(self.gearbox.cancel_shift());
                }
            }
        }

        let mut brake_lights = false;
        let power;
        if burnout {
            power = 1.0;
            command.clutch = Some(1.0);
            self.cruise.cancel();
        } else if self.gearbox.direction == Direction::Forward {
            let cruise_tuning = config.cruise_tuning();
            let pedal_tuning = config.pedal_tuning();
            let raw_speed = if config.use_wheel_speed {
                frame.average_wheel_speed.abs()
            } else {
                frame.velocity
            };

            if edges.keys.cruise {
                let capture = if config.enable_ui { speedometer.speed } else { raw_speed };
                self.cruise.toggle(frame.forward_speed, capture, &cruise_tuning);
            }
            if edges.keys.cruise_resume {
                self.cruise.resume(&cruise_tuning);
            }
            if self.cruise.active && (edges.accelerate || edges.brake) {
                debug!("Cruise cancelled by pedal");
                self.cruise.cancel();
            }

            self.pedals.forward_throttle(
                accelerate,
                self.accelerate_tap.active,
                frame.forward_speed,
                frame.forward_acceleration,
                &pedal_tuning,
                dt,
            );
            brake_lights |= self.pedals.forward_brake(
                brake,
                self.brake_tap.active,
                frame.forward_acceleration,
                &pedal_tuning,
                dt,
            );
            if self.brake_tap.timer <= threshold {
                brake_lights = true;
            }

            if self.cruise.active && !accelerate && !brake {
                self.cruise.adjust(
                    controls.keys.cruise_faster,
                    controls.keys.cruise_slower,
                    &cruise_tuning,
                    dt,
                );
                let lead = if config.enable_auto_follow {
                    let search = LeadSearch {
                        vehicle_id: telemetry.vehicle_id,
                        position: telemetry.transform.position,
                        front_position: telemetry.transform.front_position,
                        heading: telemetry.transform.heading,
                        steering_angle: telemetry.electrics.steering_angle,
                    };
                    find_lead(&search, nearby)
                } else {
                    None
                };
                let cruise_frame = CruiseFrame {
                    forward_speed: frame.forward_speed,
                    forward_acceleration: frame.forward_acceleration,
                    display_speed: raw_speed,
                    dt,
                };
                let cruise = self.cruise.drive(&cruise_frame, lead.as_ref(), &cruise_tuning);
                self.pedals.throttle = clamp(self.pedals.throttle + cruise.throttle_boost, 0.0, 1.0);
                if let Some(b) = cruise.brake {
                    self.pedals.brake = b;
                }
                brake_lights |= cruise.brake_lights;
            }

            if !self.electric && advanced {
                self.gearbox.clamp_forward_gear();
                if config.use_manual_gearbox {
                    self.gearbox.manual_shift(edges.keys.up_shift, edges.keys.down_shift);
                } else {
                    let inputs = ShiftInputs {
                        throttle: self.pedals.throttle,
                        brake: self.pedals.brake,
                        brake_held: brake,
                        rpm: frame.rpm,
                        rpm_delta: frame.rpm_delta,
                        drive_speed: frame.average_drive_wheel_speed,
                    };
                    if self.gearbox.automatic(&inputs, &config.gearbox_tuning(), dt) {
                        self.pedals.throttle_change_timer = 0.0;
                    }
                }
                if let Some(ratios) = self.gearbox.blend(dt) {
                    command.gear_ratios = Some(ratios);
                }
                command.clutch = Some(1.0);
            }

            self.pedals.throttle = apply_speed_limiter(
                self.pedals.throttle,
                self.speed_limiter,
                frame.average_wheel_speed,
                frame.average_drive_wheel_speed,
            );
            power = if config.enable_traction_control {
                let slip = self.slip(&frame);
                self.traction.forward(&slip, config.traction_control_delay, dt)
            } else {
                self.pedals.throttle
            };
        } else {
            self.pedals
                .reverse(brake, self.brake_tap.active, accelerate, self.accelerate_tap.active, dt);
            if !self.electric && advanced {
                command.clutch = Some(1.0);
                self.gearbox.current_gear = 0;
            }
            power = if config.enable_traction_control {
                let slip = self.slip(&frame);
                self.traction.reverse(&slip, config.traction_control_delay, dt)
            } else {
                reverse_power(self.pedals.throttle)
            };
            torque *= reverse_torque_scale(self.pedals.throttle);
        }

        if advanced && telemetry.gearbox.current_gear != self.gearbox.current_gear {
            command.gear = Some(self.gearbox.current_gear);
        }
        command.throttle_power = power;
        command.brake_power = if burnout { 1.0 } else { self.pedals.brake };
        command.torque_multiplier = torque;
        command.force_brake_lights = brake_lights || (!burnout && self.pedals.brake > 0.0);

        let host_steering = telemetry.electrics.steering_scale;
        let steering = if config.enable_smooth_steering {
            if controls.mouse_steering {
                self.steering.mirror(host_steering)
            } else {
                command.steering_scale = Some(self.steering.update(
                    controls.steer_left,
                    controls.steer_right,
                    frame.average_steer_wheel_speed,
                    host_steering,
                    &config.steering_tuning(),
                    dt,
                ));
                self.steering.steering
            }
        } else {
            host_steering
        };

        self.indicators.auto_cancel(
            steering,
            config.indicator_cutoff_arm_threshold,
            config.indicator_cutoff_threshold,
        );
        command.left_indicator = self.indicators.state.left_on();
        command.right_indicator = self.indicators.state.right_on();

        let mut fuel_level = telemetry.electrics.fuel_level;
        if config.enable_fuel_script && self.engine_on {
            let rate = consumption(config.fuel_consumption_modifier, power, frame.rpm, torque);
            let next = burn(fuel_level, self.tank_volume, rate, dt);
            if next != fuel_level {
                command.fuel_level = Some(next);
                fuel_level = next;
            }
        }

        if config.enable_ui {
            let raw_speed = if config.use_wheel_speed {
                frame.average_wheel_speed.abs()
            } else {
                frame.velocity
            };
            let speed = speedometer.update(raw_speed, config.speed_smoothing, dt);
            let fuel_fraction = if config.enable_fuel_script && self.tank_volume > 0.0 {
                fuel_level / self.tank_volume
            } else {
                1.0
            };
            let gear = if advanced {
                self.gearbox.current_gear
            } else {
                telemetry.gearbox.current_gear
            };
            let inputs = DisplayInputs {
                engine_on: self.engine_on,
                speed,
                rpm: frame.rpm,
                fuel_fraction,
                gear,
                electric: self.electric,
                cruise_active: self.cruise.active,
                cruise_speed: self.cruise.target_speed,
                race_mode: self.race_mode,
                indicator: self.indicators.state,
                indicator_flash: telemetry.electrics.indicator_flash,
                headlights: telemetry.electrics.headlights,
                high_beams: telemetry.electrics.high_beams,
                speed_limiter: self.speed_limiter,
            };
            out.display = Some(display::build(&inputs, &config.speed_unit, config.speed_unit_multiplier));
        }

        sanitize(&mut out.command);
        out
    }

    fn slip(&self, frame: &crate::kinematics::FrameState) -> SlipInputs {
        SlipInputs {
            throttle: self.pedals.throttle,
            velocity_acceleration: frame.velocity_acceleration,
            forward_drive_acceleration: frame.forward_drive_acceleration,
            drive_speed: frame.average_drive_wheel_speed,
            steer_speed: frame.average_steer_wheel_speed,
        }
    }
}

/// Nothing non-finite leaves the core.
pub fn sanitize(command: &mut VehicleCommand) {
    command.throttle_power = clamp(finite_or(command.throttle_power, 0.0), -1.0, 1.0);
    command.brake_power = clamp(finite_or(command.brake_power, 0.0), 0.0, 1.0);
    command.torque_multiplier = finite_or(command.torque_multiplier, 1.0);
    command.clutch = command.clutch.map(|c| finite_or(c, 1.0));
    command.steering_scale = command.steering_scale.map(|s| clamp(finite_or(s, 0.0), -1.0, 1.0));
    command.fuel_level = command.fuel_level.map(|f| finite_or(f, 0.0));
    command.drive_max_flat_velocity = command.drive_max_flat_velocity.map(|v| finite_or(v, 0.0));
    if let Some(ratios) = command.gear_ratios.as_mut() {
        for ratio in ratios.iter_mut() {
            *ratio = finite_or(*ratio, 0.0);
        }
    }
}
