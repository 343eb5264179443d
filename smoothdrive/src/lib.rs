pub mod ai_gearbox;
pub mod bridge;
pub mod config;
pub mod controls;
pub mod cruise;
pub mod display;
pub mod error;
pub mod fuel;
pub mod gear_profiles;
pub mod gearbox;
pub mod indicators;
pub mod kinematics;
pub mod math;
pub mod patches;
pub mod result;
pub mod session;
pub mod steering;
pub mod throttle;

use ai_gearbox::AiGearboxManager;
use config::Config;
use controls::EdgeDetector;
use display::SpeedSmoother;
use fuel::Refueller;
use gear_profiles::GearProfiles;
use log::info;
use session::Session;
use shared::{TickInput, TickOutput};

/// Owns every piece of state that survives between ticks.
pub struct Driver {
    config: Config,
    profiles: GearProfiles,
    session: Option<Session>,
    edges: EdgeDetector,
    speedometer: SpeedSmoother,
    refueller: Refueller,
    ai_gearbox: AiGearboxManager,
}

impl Driver {
    pub fn new(config: Config, profiles: GearProfiles) -> Self {
        Self {
            config,
            profiles,
            session: None,
            edges: EdgeDetector::default(),
            speedometer: SpeedSmoother::default(),
            refueller: Refueller::default(),
            ai_gearbox: AiGearboxManager::default(),
        }
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// Runs one frame. Never fails; degenerate input ends up as neutral
    /// output.
    pub fn tick(&mut self, input: &TickInput) -> TickOutput {
        let dt = if input.dt.is_finite() && input.dt > 0.0 { input.dt } else { 0.0 };
        let edges = self.edges.update(&input.controls);
        let mut output = TickOutput::default();
        output.overrides.runtime = true;

        let driving = input
            .vehicle
            .as_ref()
            .filter(|v| input.player_controlled && v.model.class.is_driveable());

        match driving {
            Some(telemetry) => {
                let swapped = self.session.as_ref().map_or(true, |s| s.vehicle_id != telemetry.vehicle_id);
                if swapped {
                    if let Some(previous) = self.session.take() {
                        info!("Left vehicle {} for {}", previous.vehicle_id, telemetry.vehicle_id);
                        output.restore = Some(previous.restore());
                    }
                    self.speedometer.reset();
                    self.refueller.reset();
                    self.refueller.played_finish_sound = false;
                    self.session = Some(Session::enter(telemetry, &self.config, &self.profiles));
                }
                if let Some(session) = self.session.as_mut() {
                    let driven = session.tick(
                        telemetry,
                        &input.controls,
                        &edges,
                        &input.nearby,
                        &mut self.speedometer,
                        &self.config,
                        dt,
                    );
                    output.vehicle = Some(driven.command);
                    output.display = driven.display;
                    output.notices = driven.notices;
                }
                output.overrides.vehicle = true;
                output.overrides.gearbox = self.config.enable_advanced_gearbox;
                output.overrides.steering =
                    self.config.enable_smooth_steering && !input.controls.mouse_steering;
            }
            None => {
                if let Some(previous) = self.session.take() {
                    info!("Left vehicle {}", previous.vehicle_id);
                    output.restore = Some(previous.restore());
                    self.speedometer.reset();
                    self.refueller.reset();
                }
                if self.config.enable_fuel_script {
                    if let Some(context) = input.refuel.as_ref() {
                        output.refuel =
                            self.refueller
                                .update(context, input.controls.refuel, &self.config.refuel_tuning(), dt);
                    }
                }
            }
        }

        if self.config.enable_advanced_gearbox {
            let player = input.vehicle.as_ref().map(|v| v.vehicle_id);
            output.traffic = self.ai_gearbox.tick(
                &input.traffic,
                player,
                self.config.max_ai_gearbox_calculations_per_frame,
            );
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::vehicle::{Gearbox, VehicleTelemetry};

    fn telemetry(id: u32) -> VehicleTelemetry {
        VehicleTelemetry {
            vehicle_id: id,
            gearbox: Gearbox {
                current_gear: 1,
                top_gear: 3,
                gear_ratios: vec![-3.0, 3.0, 2.0, 1.0],
                drive_max_flat_velocity: 40.0,
            },
            ..Default::default()
        }
    }

    fn seated(id: u32) -> TickInput {
        TickInput {
            dt: 1.0 / 60.0,
            vehicle: Some(telemetry(id)),
            player_controlled: true,
            ..Default::default()
        }
    }

    #[test]
    fn on_foot_needs_only_runtime_overrides() {
        let mut driver = Driver::new(Config::default(), GearProfiles::default());
        let output = driver.tick(&TickInput::default());
        assert!(output.overrides.runtime);
        assert!(!output.overrides.vehicle);
        assert!(output.vehicle.is_none() && output.restore.is_none());
    }

    #[test]
    fn swap_restores_previous_vehicle() {
        let mut driver = Driver::new(Config::default(), GearProfiles::default());
        assert!(driver.tick(&seated(1)).restore.is_none());
        assert!(driver.tick(&seated(1)).restore.is_none());

        let output = driver.tick(&seated(2));
        let restore = output.restore.unwrap();
        assert_eq!(restore.vehicle_id, 1);
        assert_eq!(restore.gear_ratios, vec![-3.0, 3.0, 2.0, 1.0]);
        assert_eq!(output.vehicle.unwrap().vehicle_id, 2);
        assert_eq!(driver.session().unwrap().vehicle_id, 2);
    }

    #[test]
    fn swap_clears_refuel_state() {
        let mut driver = Driver::new(Config::default(), GearProfiles::default());
        driver.tick(&seated(1));
        driver.refueller.drain_timer = 0.7;
        driver.refueller.played_finish_sound = true;

        driver.tick(&seated(2));
        assert_eq!(driver.refueller.drain_timer, 0.0);
        assert!(!driver.refueller.played_finish_sound);
    }

    #[test]
    fn passenger_is_not_driving() {
        let mut driver = Driver::new(Config::default(), GearProfiles::default());
        let mut input = seated(1);
        input.player_controlled = false;
        let output = driver.tick(&input);
        assert!(output.vehicle.is_none());
        assert!(driver.session().is_none());
    }

    #[test]
    fn bad_dt_is_treated_as_zero() {
        let mut driver = Driver::new(Config::default(), GearProfiles::default());
        let mut input = seated(1);
        input.dt = f32::NAN;
        let command = driver.tick(&input).vehicle.unwrap();
        assert!(command.throttle_power.is_finite());
        assert!(command.steering_scale.map_or(true, f32::is_finite));
    }
}
