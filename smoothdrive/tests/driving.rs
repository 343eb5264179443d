use shared::vehicle::*;
use shared::*;
use smoothdrive::config::Config;
use smoothdrive::gear_profiles::{joaat, GearProfile, GearProfiles};
use smoothdrive::Driver;

const DT: f32 = 1.0 / 60.0;

fn car(id: u32, speed: f32) -> VehicleTelemetry {
    VehicleTelemetry {
        vehicle_id: id,
        model: VehicleModel {
            hash: joaat("sultan"),
            class: VehicleClass::Car,
            electric: false,
        },
        transform: Transform {
            rotation: [0.0, 0.0, 0.0, 1.0],
            velocity: [0.0, speed, 0.0],
            ..Default::default()
        },
        wheels: vec![
            Wheel::new(speed / 0.5, 0.5, false, true),
            Wheel::new(speed / 0.5, 0.5, false, true),
            Wheel::new(speed / 0.5, 0.5, true, false),
            Wheel::new(speed / 0.5, 0.5, true, false),
        ],
        speed,
        gearbox: Gearbox {
            current_gear: 1,
            top_gear: 4,
            gear_ratios: vec![-3.2, 3.2, 2.1, 1.4, 1.0],
            drive_max_flat_velocity: 45.0,
        },
        electrics: Electrics {
            rpm: 0.2,
            engine_running: true,
            fuel_level: 40.0,
            ..Default::default()
        },
        handling: Handling {
            clutch_change_rate_scale_up_shift: 1.0,
            clutch_change_rate_scale_down_shift: 1.0,
            petrol_tank_volume: 65.0,
        },
        ..Default::default()
    }
}

fn driving(vehicle: VehicleTelemetry, controls: Controls) -> TickInput {
    TickInput {
        dt: DT,
        vehicle: Some(vehicle),
        player_controlled: true,
        controls,
        ..Default::default()
    }
}

fn accelerate() -> Controls {
    Controls {
        accelerate: true,
        ..Default::default()
    }
}

fn driver() -> Driver {
    Driver::new(Config::default(), GearProfiles::default())
}

#[test]
fn enter_drive_exit_restores_vehicle() {
    let mut driver = driver();
    let output = driver.tick(&driving(car(9, 0.0), Controls::default()));
    let command = output.vehicle.unwrap();
    assert_eq!(command.vehicle_id, 9);
    assert_eq!(command.engine_on, Some(true));
    assert!(output.display.is_some());
    assert!(output.overrides.vehicle && output.overrides.gearbox && output.overrides.steering);

    for _ in 0..10 {
        driver.tick(&driving(car(9, 0.0), accelerate()));
    }

    let output = driver.tick(&TickInput {
        dt: DT,
        ..Default::default()
    });
    let restore = output.restore.unwrap();
    assert_eq!(restore.vehicle_id, 9);
    assert_eq!(restore.gear_ratios, vec![-3.2, 3.2, 2.1, 1.4, 1.0]);
    assert!(restore.engine_on);
    assert!(output.vehicle.is_none() && output.display.is_none());
    assert!(!output.overrides.vehicle);
    assert!(driver.session().is_none());
}

#[test]
fn mouse_steering_releases_steering_override() {
    let mut driver = driver();
    let controls = Controls {
        mouse_steering: true,
        ..Default::default()
    };
    let output = driver.tick(&driving(car(1, 0.0), controls));
    assert!(!output.overrides.steering);
    assert_eq!(output.vehicle.unwrap().steering_scale, None);
}

#[test]
fn profile_is_applied_on_entry() {
    let profile = GearProfile::from_json(
        "sultan",
        r#"{ "vehicle_models": ["sultan"], "drive_max_flat_velocity": 162.0,
             "speed_limiter": 0, "gear_ratios": [3.4, 3.4, 2.2, 1.5, 1.1, 0.9] }"#,
    )
    .unwrap();
    let mut config = Config::default();
    config.show_gearbox_configuration_notification = true;
    let mut driver = Driver::new(config, GearProfiles::new(vec![profile]));

    let output = driver.tick(&driving(car(3, 0.0), Controls::default()));
    let command = output.vehicle.unwrap();
    assert_eq!(command.gear_ratios, Some(vec![-3.4, 3.4, 2.2, 1.5, 1.1, 0.9]));
    assert_eq!(command.top_gear, Some(5));
    assert_eq!(command.drive_max_flat_velocity, Some(45.0));
    match &output.notices[..] {
        [Notice::GearboxProfileLoaded(text)] => assert!(text.contains("sultan")),
        other => panic!("unexpected notices {:?}", other),
    }

    // Entry writes happen once.
    let output = driver.tick(&driving(car(3, 0.0), Controls::default()));
    assert!(output.notices.is_empty());
    assert_eq!(output.vehicle.unwrap().top_gear, None);
}

#[test]
fn unknown_model_keeps_host_ratios() {
    let mut driver = driver();
    let command = driver.tick(&driving(car(3, 0.0), Controls::default())).vehicle.unwrap();
    assert_eq!(command.gear_ratios, None);
    assert_eq!(command.top_gear, None);
    assert_eq!(driver.session().unwrap().speed_limiter, 0.0);
}

#[test]
fn double_tap_floors_throttle() {
    let mut driver = driver();
    let first = driver.tick(&driving(car(1, 0.0), accelerate())).vehicle.unwrap();
    assert!(first.throttle_power < 1.0);
    driver.tick(&driving(car(1, 0.0), Controls::default()));
    let second = driver.tick(&driving(car(1, 0.0), accelerate())).vehicle.unwrap();
    assert_eq!(second.throttle_power, 1.0);
}

#[test]
fn slow_second_press_is_gentle() {
    let mut driver = driver();
    driver.tick(&driving(car(1, 0.0), accelerate()));
    for _ in 0..30 {
        driver.tick(&driving(car(1, 0.0), Controls::default()));
    }
    let command = driver.tick(&driving(car(1, 0.0), accelerate())).vehicle.unwrap();
    assert!(command.throttle_power < 1.0);
}

#[test]
fn race_mode_makes_every_press_a_double_tap() {
    let mut driver = driver();
    let mut controls = Controls::default();
    controls.keys.race_mode = true;
    driver.tick(&driving(car(1, 0.0), controls));
    let command = driver.tick(&driving(car(1, 0.0), accelerate())).vehicle.unwrap();
    assert_eq!(command.throttle_power, 1.0);
    assert!(driver.session().unwrap().race_mode);
}

#[test]
fn direction_switch_restarts_throttle_settle() {
    let mut driver = driver();
    for _ in 0..3 {
        driver.tick(&driving(car(1, 0.0), accelerate()));
    }
    assert_eq!(driver.session().unwrap().pedals.throttle_change_timer, 2.5);

    let mut controls = Controls {
        brake: true,
        ..Default::default()
    };
    controls.keys.direction_switch = true;
    driver.tick(&driving(car(1, 0.0), controls));
    let session = driver.session().unwrap();
    assert_eq!(session.gearbox.direction, smoothdrive::gearbox::Direction::Reverse);
    assert_eq!(session.pedals.throttle_change_timer, 0.0);
}

#[test]
fn committed_upshift_restarts_throttle_settle() {
    let mut driver = driver();
    driver.tick(&driving(car(1, 0.0), accelerate()));
    assert_eq!(driver.session().unwrap().pedals.throttle_change_timer, 2.5);
    assert!(!driver.session().unwrap().gearbox.shifting);

    // Low RPM at speed opens the shift gate on the first tick.
    driver.tick(&driving(car(1, 20.0), accelerate()));
    let session = driver.session().unwrap();
    assert!(session.gearbox.shifting);
    assert!(session.gearbox.current_gear > 1);
    assert_eq!(session.pedals.throttle_change_timer, 0.0);
}

#[test]
fn auto_follow_brakes_for_close_lead() {
    let mut driver = driver();
    let mut controls = Controls::default();
    controls.keys.cruise = true;
    let mut input = driving(car(1, 20.0), controls);
    input.nearby = vec![NearbyVehicle {
        vehicle_id: 2,
        position: [0.0, 10.0, 0.0],
        rear_position: [0.0, 8.0, 0.0],
        heading: 0.0,
        forward_speed: 0.0,
        has_driver: true,
    }];
    let command = driver.tick(&input).vehicle.unwrap();
    assert!(driver.session().unwrap().cruise.active);
    assert_eq!(command.brake_power, 1.0);
    assert!(command.force_brake_lights);
}

#[test]
fn cruise_refuses_to_engage_when_slow() {
    let mut driver = driver();
    let mut controls = Controls::default();
    controls.keys.cruise = true;
    driver.tick(&driving(car(1, 2.0), controls));
    assert!(!driver.session().unwrap().cruise.active);
}

#[test]
fn ai_gearbox_respects_budget() {
    let traffic: Vec<TrafficVehicle> = (0..30)
        .map(|id| TrafficVehicle {
            vehicle_id: id + 100,
            wheels: vec![Wheel::new(20.0, 0.5, true, false)],
            throttle_power: 0.5,
            gearbox: Gearbox {
                current_gear: 1,
                top_gear: 4,
                gear_ratios: vec![-3.2, 3.2, 2.1, 1.4, 1.0],
                drive_max_flat_velocity: 45.0,
            },
            ..Default::default()
        })
        .collect();
    let mut driver = driver();
    let input = TickInput {
        dt: DT,
        traffic,
        ..Default::default()
    };
    assert_eq!(driver.tick(&input).traffic.len(), 20);
    assert_eq!(driver.tick(&input).traffic.len(), 10);
    assert_eq!(driver.tick(&input).traffic.len(), 20);

    let mut config = Config::default();
    config.enable_advanced_gearbox = false;
    let mut driver = Driver::new(config, GearProfiles::default());
    assert!(driver.tick(&input).traffic.is_empty());
}

#[test]
fn refuel_at_pump_after_leaving() {
    let mut driver = driver();
    driver.tick(&driving(car(5, 0.0), Controls::default()));
    let context = RefuelContext {
        vehicle_id: 5,
        distance_to_vehicle: 2.0,
        near_fuel_pump: true,
        fuel_level: 10.0,
        tank_volume: 65.0,
        ..Default::default()
    };
    let input = TickInput {
        dt: DT,
        refuel: Some(context),
        controls: Controls {
            refuel: true,
            ..Default::default()
        },
        ..Default::default()
    };
    let output = driver.tick(&input);
    assert!(output.restore.is_some());
    let refuel = output.refuel.unwrap();
    assert_eq!(refuel.vehicle_id, 5);
    assert!(refuel.fuel_level.unwrap() > 10.0);
    assert!(matches!(refuel.status, RefuelStatus::Refuelling(_)));
}

#[test]
fn random_telemetry_never_leaks_nan() {
    let mut driver = driver();
    for i in 0..500 {
        let mut vehicle = car(1, rand::random::<f32>() * 60.0 - 10.0);
        vehicle.electrics.rpm = rand::random::<f32>() * 1.2;
        vehicle.electrics.steering_scale = rand::random::<f32>() * 2.0 - 1.0;
        vehicle.wheels[2].angular_velocity = rand::random::<f32>() * 200.0;
        let controls = Controls {
            accelerate: rand::random::<bool>(),
            brake: rand::random::<bool>(),
            steer_left: rand::random::<bool>(),
            steer_right: rand::random::<bool>(),
            ..Default::default()
        };
        let mut input = driving(vehicle, controls);
        if i % 50 == 0 {
            input.dt = 0.0;
        }
        let output = driver.tick(&input);
        let command = output.vehicle.unwrap();
        assert!(command.throttle_power.is_finite() && command.throttle_power.abs() <= 1.0);
        assert!(command.brake_power >= 0.0 && command.brake_power <= 1.0);
        assert!(command.torque_multiplier.is_finite());
        if let Some(steering) = command.steering_scale {
            assert!(steering.abs() <= 1.0);
        }
        if let Some(ratios) = command.gear_ratios {
            assert!(ratios.iter().all(|r| r.is_finite()));
        }
        let display = output.display.unwrap();
        assert!(display.speed.is_finite() && display.rpm >= 0.2 && display.rpm <= 1.0);
    }
}
