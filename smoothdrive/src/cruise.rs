//! Cruise control with optional auto-follow of a lead vehicle.

use crate::math::{clamp, distance, finite_or, heading_direction, wrap_degrees};
use log::debug;
use shared::vehicle::NearbyVehicle;

pub const LOOKAHEAD: f32 = 60.0;
pub const MAX_HEADING_DIFFERENCE: f32 = 45.0;
pub const MAX_LATERAL_OFFSET: f32 = 3.0;
/// Seconds of closing speed budgeted into the predicted gap.
pub const CLOSING_HORIZON: f32 = 1.2;
pub const STOPPED_LEAD_SPEED: f32 = 0.1;
pub const STOPPED_LEAD_GAP: f32 = 1.5;
pub const STOPPED_LEAD_BRAKE: f32 = 0.25;

#[derive(Debug, Clone, Copy)]
pub struct CruiseTuning {
    pub minimum_speed: f32,
    pub target_acceleration_multiplier: f32,
    pub maximum_acceleration: f32,
    pub acceleration_correction: f32,
    pub following_distance: f32,
    /// m/s per second
    pub speed_increment: f32,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CruiseControl {
    pub active: bool,
    pub target_speed: f32,
    pub throttle: f32,
    /// Set on engage so the held key does not immediately retune the
    /// target; cleared once both speed keys are up.
    pub prevent_speed_change: bool,
}

impl CruiseControl {
    /// Cruise key edge. Engages at `display_speed` when fast enough.
    pub fn toggle(&mut self, forward_speed: f32, display_speed: f32, tuning: &CruiseTuning) {
        if self.active {
            self.active = false;
            self.prevent_speed_change = false;
        } else if forward_speed >= tuning.minimum_speed {
            self.prevent_speed_change = true;
            self.target_speed = display_speed;
            self.active = true;
            self.throttle = 0.0;
            debug!("Cruise engaged at {:.1} m/s", display_speed);
        }
    }

    pub fn resume(&mut self, tuning: &CruiseTuning) {
        if !self.active && self.target_speed > tuning.minimum_speed {
            self.prevent_speed_change = true;
            self.active = true;
            self.throttle = 0.0;
        }
    }

    pub fn cancel(&mut self) {
        self.active = false;
    }

    pub fn adjust(&mut self, faster: bool, slower: bool, tuning: &CruiseTuning, dt: f32) {
        if !self.prevent_speed_change {
            if faster {
                self.target_speed += tuning.speed_increment * dt;
            } else if slower {
                self.target_speed = (self.target_speed - tuning.speed_increment * dt).max(0.0);
            }
        } else if !faster && !slower {
            self.prevent_speed_change = false;
        }
    }

    /// Integrates the cruise throttle toward `target_speed`.
    fn chase(&mut self, target_speed: f32, frame: &CruiseFrame, tuning: &CruiseTuning) {
        let acceleration = clamp(
            (target_speed - frame.display_speed) * tuning.target_acceleration_multiplier,
            -tuning.maximum_acceleration,
            tuning.maximum_acceleration,
        );
        let correction = (acceleration - frame.forward_acceleration) * tuning.acceleration_correction * frame.dt;
        self.throttle = clamp(finite_or(self.throttle + correction, 0.0), 0.0, 1.0);
    }

    /// Runs one tick of cruise while no pedal is held and returns the
    /// pedal adjustment.
    pub fn drive(&mut self, frame: &CruiseFrame, lead: Option<&Lead>, tuning: &CruiseTuning) -> CruiseOutput {
        let mut output = CruiseOutput::default();
        match lead {
            Some(lead) => {
                if lead.speed.abs() < STOPPED_LEAD_SPEED && lead.gap < STOPPED_LEAD_GAP {
                    output.brake = Some(STOPPED_LEAD_BRAKE);
                    output.brake_lights = true;
                    self.throttle = 0.0;
                } else {
                    let relative_speed = frame.forward_speed - lead.speed;
                    let target_gap = (frame.forward_speed * tuning.following_distance).max(0.0);
                    let predicted = lead.gap - relative_speed * CLOSING_HORIZON - target_gap;
                    let brake = if target_gap > 0.0 {
                        clamp(finite_or(-predicted / target_gap, 0.0), 0.0, 1.0)
                    } else if predicted < 0.0 {
                        1.0
                    } else {
                        0.0
                    };
                    output.brake = Some(brake);
                    if brake > 0.0 {
                        output.brake_lights = true;
                        self.throttle = 0.0;
                    } else {
                        let target_speed = (frame.forward_speed + (5.0 * (predicted - 1.0)).min(15.0))
                            .min(self.target_speed);
                        self.chase(target_speed, frame, tuning);
                    }
                }
            }
            None => {
                let target = self.target_speed;
                self.chase(target, frame, tuning);
            }
        }
        output.throttle_boost = self.throttle;
        output
    }
}

/// Per-tick quantities cruise reads.
#[derive(Debug, Clone, Copy, Default)]
pub struct CruiseFrame {
    pub forward_speed: f32,
    pub forward_acceleration: f32,
    pub display_speed: f32,
    pub dt: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CruiseOutput {
    /// Added to the throttle pedal, clamped to [0, 1].
    pub throttle_boost: f32,
    /// Replaces the brake pedal when set.
    pub brake: Option<f32>,
    pub brake_lights: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lead {
    pub vehicle_id: u32,
    /// Front of the player to rear of the lead, metres.
    pub gap: f32,
    pub speed: f32,
}

/// Where the player vehicle is pointing this tick.
#[derive(Debug, Clone, Copy)]
pub struct LeadSearch {
    pub vehicle_id: u32,
    /// Body centre; the lane axis runs through it.
    pub position: [f32; 3],
    pub front_position: [f32; 3],
    pub heading: f32,
    pub steering_angle: f32,
}

/// Nearest same-direction vehicle ahead whose position lies within
/// [`MAX_LATERAL_OFFSET`] of the steered axis through the body centre.
/// Candidates are ordered and the gap measured from the front bumper.
pub fn find_lead(search: &LeadSearch, nearby: &[NearbyVehicle]) -> Option<Lead> {
    let forward = heading_direction(search.heading);
    let axis = heading_direction(search.heading + search.steering_angle);
    let front = search.front_position;
    let centre = [
        front[0] + forward[0] * LOOKAHEAD,
        front[1] + forward[1] * LOOKAHEAD,
        front[2],
    ];

    let mut candidates: Vec<&NearbyVehicle> = nearby
        .iter()
        .filter(|v| v.vehicle_id != search.vehicle_id && v.has_driver)
        .filter(|v| distance(v.position, centre) <= LOOKAHEAD)
        .collect();
    candidates.sort_by(|a, b| {
        distance(a.position, front)
            .partial_cmp(&distance(b.position, front))
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    candidates
        .into_iter()
        .filter(|v| wrap_degrees(v.heading - search.heading).abs() < MAX_HEADING_DIFFERENCE)
        .find(|v| {
            let dx = v.position[0] - search.position[0];
            let dy = v.position[1] - search.position[1];
            (dx * axis[1] - dy * axis[0]).abs() < MAX_LATERAL_OFFSET
        })
        .map(|v| Lead {
            vehicle_id: v.vehicle_id,
            gap: distance(front, v.rear_position),
            speed: v.forward_speed,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuning() -> CruiseTuning {
        CruiseTuning {
            minimum_speed: 5.56,
            target_acceleration_multiplier: 0.5,
            maximum_acceleration: 5.0,
            acceleration_correction: 1.0,
            following_distance: 1.2,
            speed_increment: 6.7,
        }
    }

    fn car(id: u32, y: f32, heading: f32) -> NearbyVehicle {
        NearbyVehicle {
            vehicle_id: id,
            position: [0.0, y, 0.0],
            rear_position: [0.0, y - 2.0, 0.0],
            heading,
            forward_speed: 15.0,
            has_driver: true,
        }
    }

    fn search() -> LeadSearch {
        LeadSearch {
            vehicle_id: 1,
            position: [0.0, 0.0, 0.0],
            front_position: [0.0, 0.0, 0.0],
            heading: 0.0,
            steering_angle: 0.0,
        }
    }

    #[test]
    fn engages_only_above_minimum_speed() {
        let mut cruise = CruiseControl::default();
        cruise.toggle(3.0, 3.0, &tuning());
        assert!(!cruise.active);
        cruise.toggle(20.0, 19.5, &tuning());
        assert!(cruise.active);
        assert_eq!(cruise.target_speed, 19.5);
        assert!(cruise.prevent_speed_change);
        cruise.toggle(20.0, 19.5, &tuning());
        assert!(!cruise.active);

        cruise.resume(&tuning());
        assert!(cruise.active);
        assert_eq!(cruise.target_speed, 19.5);
    }

    #[test]
    fn speed_keys_latch_until_released() {
        let mut cruise = CruiseControl::default();
        cruise.toggle(20.0, 20.0, &tuning());
        cruise.adjust(true, false, &tuning(), 1.0);
        assert_eq!(cruise.target_speed, 20.0);
        cruise.adjust(false, false, &tuning(), 1.0);
        cruise.adjust(true, false, &tuning(), 1.0);
        assert!((cruise.target_speed - 26.7).abs() < 1e-4);
        for _ in 0..10 {
            cruise.adjust(false, true, &tuning(), 1.0);
        }
        assert_eq!(cruise.target_speed, 0.0);
    }

    #[test]
    fn picks_nearest_car_in_lane() {
        let nearby = vec![
            car(2, 40.0, 0.0),
            car(3, 20.0, 0.0),
            // Oncoming.
            car(4, 10.0, 180.0),
            // Next lane over.
            NearbyVehicle {
                position: [5.0, 8.0, 0.0],
                ..car(5, 0.0, 0.0)
            },
            // Parked, no driver.
            NearbyVehicle {
                has_driver: false,
                ..car(6, 5.0, 0.0)
            },
            // Self.
            car(1, 3.0, 0.0),
        ];
        let lead = find_lead(&search(), &nearby).unwrap();
        assert_eq!(lead.vehicle_id, 3);
        assert!((lead.gap - 18.0).abs() < 1e-4);
    }

    #[test]
    fn nothing_beyond_lookahead() {
        assert!(find_lead(&search(), &[car(2, 130.0, 0.0)]).is_none());
        assert!(find_lead(&search(), &[car(2, -10.0, 0.0)]).is_none());
    }

    #[test]
    fn heading_wraps_around_north() {
        let mut p = search();
        p.heading = 350.0;
        let ahead = heading_direction(350.0);
        let mut lead = car(2, 0.0, 5.0);
        lead.position = [ahead[0] * 20.0, ahead[1] * 20.0, 0.0];
        assert!(find_lead(&p, &[lead]).is_some());
    }

    #[test]
    fn lane_axis_runs_through_the_body() {
        // Long vehicle steering 20 degrees: the lead sits on the steered axis
        // from the body centre but over 3 m off the same axis from the front.
        let mut p = search();
        p.position = [0.0, -10.0, 0.0];
        p.steering_angle = 20.0;
        let axis = heading_direction(20.0);
        let mut lead = car(2, 0.0, 0.0);
        lead.position = [axis[0] * 30.0, -10.0 + axis[1] * 30.0, 0.0];
        assert_eq!(find_lead(&p, &[lead.clone()]).map(|l| l.vehicle_id), Some(2));

        p.position = p.front_position;
        assert!(find_lead(&p, &[lead]).is_none());
    }

    #[test]
    fn closing_on_lead_brakes_harder_as_gap_shrinks() {
        let t = tuning();
        let frame = CruiseFrame {
            forward_speed: 20.0,
            forward_acceleration: 0.0,
            display_speed: 20.0,
            dt: 1.0 / 60.0,
        };
        let mut cruise = CruiseControl::default();
        cruise.toggle(20.0, 20.0, &t);
        cruise.throttle = 0.4;

        let mut last_brake = 0.0;
        for gap in [10.0f32, 8.0, 6.0, 4.0].iter() {
            let lead = Lead {
                vehicle_id: 2,
                gap: *gap,
                speed: 18.0,
            };
            let out = cruise.drive(&frame, Some(&lead), &t);
            let brake = out.brake.unwrap();
            assert!(brake > last_brake, "{} at gap {}", brake, gap);
            assert!(out.brake_lights);
            assert_eq!(out.throttle_boost, 0.0);
            last_brake = brake;
        }
    }

    #[test]
    fn open_road_follows_with_throttle() {
        let t = tuning();
        let frame = CruiseFrame {
            forward_speed: 20.0,
            forward_acceleration: 0.0,
            display_speed: 20.0,
            dt: 0.1,
        };
        let mut cruise = CruiseControl::default();
        cruise.toggle(20.0, 20.0, &t);
        cruise.target_speed = 25.0;
        let lead = Lead {
            vehicle_id: 2,
            gap: 80.0,
            speed: 20.0,
        };
        let out = cruise.drive(&frame, Some(&lead), &t);
        assert_eq!(out.brake, Some(0.0));
        assert!((out.throttle_boost - 0.25).abs() < 1e-5);

        let out = cruise.drive(&frame, None, &t);
        assert_eq!(out.brake, None);
        assert!((out.throttle_boost - 0.5).abs() < 1e-5);
    }

    #[test]
    fn stopped_lead_holds_brake() {
        let t = tuning();
        let mut cruise = CruiseControl::default();
        let lead = Lead {
            vehicle_id: 2,
            gap: 1.0,
            speed: 0.0,
        };
        cruise.throttle = 0.6;
        let out = cruise.drive(&CruiseFrame::default(), Some(&lead), &t);
        assert_eq!(out.brake, Some(STOPPED_LEAD_BRAKE));
        assert!(out.brake_lights);
        assert_eq!(out.throttle_boost, 0.0);
        assert_eq!(cruise.throttle, 0.0);
    }
}
