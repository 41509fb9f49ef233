use crate::core::collision::{self, Contact, ContactKind};
use crate::core::input::InputState;
use crate::core::track::Track;
use helpers::general::wrap_angle;
use serde::Deserialize;

/// * `max_speed` - (m/s) Forward speed cap
/// * `max_reverse_speed` - (m/s) Reverse speed cap (stored positive)
/// * `accel` - (m/s2) Acceleration while the throttle is held
/// * `brake_decel` - (m/s2) Deceleration while the brake is held (also pulls into reverse)
/// * `drag_per_s` - (-) Per-second speed retention factor while coasting
/// * `steer_response` - (1/s) Low-pass rate of the steering angle toward the raw command
/// * `max_steer_angle` - (rad) Full-lock steering angle
/// * `turn_rate` - (rad/m) Yaw response per meter travelled at full lock
/// * `turn_falloff_speed` - (m/s) Speed at which the yaw response is halved
/// * `crash_speed` - (m/s) Impact speed at and above which a hard obstacle wrecks the car
/// * `bounce_damping` - (-) Speed retention of a soft bounce off a hard obstacle
/// * `post_damping` - (-) Speed retention when mowing down a post
/// * `bounds_damping` - (-) Speed retention when scraping the world boundary
/// * `gravity` - (m/s2) Downward acceleration while airborne
/// * `jump_velocity_factor` - (-) Upward launch velocity per unit of forward speed
/// * `takeoff_min_speed` - (m/s) Minimum speed to leave a ramp top airborne
/// * `takeoff_min_height` - (m) Minimum ramp height for a takeoff
/// * `half_extent` - (m) Collision half extent of the car body
/// * `color` - CSS color of the car body
#[derive(Debug, Deserialize, Clone)]
pub struct VehiclePars {
    pub max_speed: f64,
    pub max_reverse_speed: f64,
    pub accel: f64,
    pub brake_decel: f64,
    pub drag_per_s: f64,
    pub steer_response: f64,
    pub max_steer_angle: f64,
    pub turn_rate: f64,
    pub turn_falloff_speed: f64,
    pub crash_speed: f64,
    pub bounce_damping: f64,
    pub post_damping: f64,
    pub bounds_damping: f64,
    pub gravity: f64,
    pub jump_velocity_factor: f64,
    pub takeoff_min_speed: f64,
    pub takeoff_min_height: f64,
    pub half_extent: f64,
    pub color: String,
}

/// StepResult reports what happened during one integration step so the caller can apply the
/// stateful consequences (knock-over, crash bookkeeping, jump scoring).
#[derive(Debug, Clone, Copy, Default)]
pub struct StepResult {
    pub contact: Option<Contact>,
    pub crashed: bool,
    pub took_off: bool,
    pub landed: bool,
    pub hit_bounds: bool,
}

#[derive(Debug)]
pub struct Vehicle {
    // parameters
    pub max_speed: f64,
    pub max_reverse_speed: f64,
    pub accel: f64,
    pub brake_decel: f64,
    pub drag_per_s: f64,
    pub steer_response: f64,
    pub max_steer_angle: f64,
    pub turn_rate: f64,
    pub turn_falloff_speed: f64,
    pub crash_speed: f64,
    pub bounce_damping: f64,
    pub post_damping: f64,
    pub bounds_damping: f64,
    pub gravity: f64,
    pub jump_velocity_factor: f64,
    pub takeoff_min_speed: f64,
    pub takeoff_min_height: f64,
    pub half_extent: f64,
    pub color: String,
    // state
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub heading: f64,
    pub speed: f64,
    pub v_y: f64,
    pub airborne: bool,
    pub steer_angle: f64,
    ground_height_prev: f64,
}

impl Vehicle {
    pub fn new(vehicle_pars: &VehiclePars, start_pose: (f64, f64, f64)) -> Vehicle {
        let (x, z, heading) = start_pose;

        Vehicle {
            max_speed: vehicle_pars.max_speed,
            max_reverse_speed: vehicle_pars.max_reverse_speed,
            accel: vehicle_pars.accel,
            brake_decel: vehicle_pars.brake_decel,
            drag_per_s: vehicle_pars.drag_per_s,
            steer_response: vehicle_pars.steer_response,
            max_steer_angle: vehicle_pars.max_steer_angle,
            turn_rate: vehicle_pars.turn_rate,
            turn_falloff_speed: vehicle_pars.turn_falloff_speed,
            crash_speed: vehicle_pars.crash_speed,
            bounce_damping: vehicle_pars.bounce_damping,
            post_damping: vehicle_pars.post_damping,
            bounds_damping: vehicle_pars.bounds_damping,
            gravity: vehicle_pars.gravity,
            jump_velocity_factor: vehicle_pars.jump_velocity_factor,
            takeoff_min_speed: vehicle_pars.takeoff_min_speed,
            takeoff_min_height: vehicle_pars.takeoff_min_height,
            half_extent: vehicle_pars.half_extent,
            color: vehicle_pars.color.to_owned(),
            x,
            y: 0.0,
            z,
            heading,
            speed: 0.0,
            v_y: 0.0,
            airborne: false,
            steer_angle: 0.0,
            ground_height_prev: 0.0,
        }
    }

    /// reset_pose puts the vehicle back at a spawn pose at rest.
    pub fn reset_pose(&mut self, start_pose: (f64, f64, f64)) {
        let (x, z, heading) = start_pose;
        self.x = x;
        self.y = 0.0;
        self.z = z;
        self.heading = heading;
        self.speed = 0.0;
        self.v_y = 0.0;
        self.airborne = false;
        self.steer_angle = 0.0;
        self.ground_height_prev = 0.0;
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed.abs() * 3.6
    }

    /// advance integrates one step of the arcade model: longitudinal dynamics, filtered steering,
    /// collision response at the candidate position, world bounds, and vertical motion. The caller
    /// clamps dt and decides whether the car is allowed to integrate at all (crash freeze).
    pub fn advance(&mut self, input: &InputState, dt: f64, track: &Track) -> StepResult {
        let mut result = StepResult::default();

        // longitudinal dynamics: throttle toward the cap, brake toward (and past) zero into a
        // smaller reverse range, multiplicative drag when coasting
        if input.accelerate {
            self.speed = (self.speed + self.accel * dt).min(self.max_speed);
        } else if input.brake {
            self.speed = (self.speed - self.brake_decel * dt).max(-self.max_reverse_speed);
        } else {
            self.speed *= self.drag_per_s.powf(dt);
        }

        // steering: low-pass the raw command, then yaw proportionally to the signed speed with a
        // response that falls off at high speed; the signed speed flips the turn in reverse
        let steer_target = input.steer_target() * self.max_steer_angle;
        let steer_blend = 1.0 - (-self.steer_response * dt).exp();
        self.steer_angle += (steer_target - self.steer_angle) * steer_blend;

        let turn_response = self.turn_rate / (1.0 + self.speed.abs() / self.turn_falloff_speed);
        self.heading = wrap_angle(self.heading + self.steer_angle * turn_response * self.speed * dt);

        // candidate position along the heading
        let cand_x = self.x + self.heading.sin() * self.speed * dt;
        let cand_z = self.z + self.heading.cos() * self.speed * dt;

        match collision::query(track, cand_x, cand_z, self.y, self.half_extent) {
            None => {
                self.x = cand_x;
                self.z = cand_z;
            }
            Some(contact) => {
                result.contact = Some(contact);

                match contact.kind {
                    ContactKind::Post => {
                        // posts barely slow the car; the knock-over is applied by the caller
                        self.speed *= self.post_damping;
                        self.x = cand_x;
                        self.z = cand_z;
                    }
                    ContactKind::Rock | ContactKind::Wall | ContactKind::RampBack => {
                        if self.speed.abs() >= self.crash_speed {
                            // hard stop, the wreck stays where it is
                            self.speed = 0.0;
                            result.crashed = true;
                        } else {
                            // bounce backward and push out along the contact normal
                            self.speed = -self.speed * self.bounce_damping;
                            self.x += contact.push_x * (contact.overlap + 0.1);
                            self.z += contact.push_z * (contact.overlap + 0.1);
                        }
                    }
                }
            }
        }

        // square world boundary
        let bound = track.bound_half - self.half_extent;
        if self.x.abs() > bound || self.z.abs() > bound {
            self.x = self.x.clamp(-bound, bound);
            self.z = self.z.clamp(-bound, bound);
            self.speed *= self.bounds_damping;
            result.hit_bounds = true;
        }

        // vertical motion: follow the ramp surface while grounded, ballistic while airborne
        let ground = track.ground_height(self.x, self.z);

        if self.airborne {
            self.v_y -= self.gravity * dt;
            self.y += self.v_y * dt;

            if self.y <= ground {
                self.y = ground;
                self.v_y = 0.0;
                self.airborne = false;
                result.landed = true;
            }
        } else if self.ground_height_prev >= self.takeoff_min_height
            && ground + 1e-6 < self.ground_height_prev
            && self.speed >= self.takeoff_min_speed
        {
            // left the top of a ramp at speed
            self.airborne = true;
            self.v_y = self.speed * self.jump_velocity_factor;
            self.y = self.ground_height_prev + self.v_y * dt;
            result.took_off = true;
        } else {
            self.y = ground;
        }

        self.ground_height_prev = ground;

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::{RampPars, RockPars, TrackPars, WallPars};
    use approx::assert_relative_eq;

    const DT: f64 = 1.0 / 60.0;

    fn test_vehicle_pars() -> VehiclePars {
        VehiclePars {
            max_speed: 40.0,
            max_reverse_speed: 8.0,
            accel: 14.0,
            brake_decel: 24.0,
            drag_per_s: 0.4,
            steer_response: 6.0,
            max_steer_angle: 0.55,
            turn_rate: 0.12,
            turn_falloff_speed: 25.0,
            crash_speed: 16.0,
            bounce_damping: 0.35,
            post_damping: 0.88,
            bounds_damping: 0.5,
            gravity: 14.0,
            jump_velocity_factor: 0.22,
            takeoff_min_speed: 10.0,
            takeoff_min_height: 0.8,
            half_extent: 1.6,
            color: String::from("#d62828"),
        }
    }

    fn empty_track() -> Track {
        Track::new(&TrackPars {
            name: String::from("empty"),
            inner_radius: 70.0,
            outer_radius: 110.0,
            bound_half: 500.0,
            post_count: 0,
            post_radius: 0.6,
            extra_posts: vec![],
            rocks: vec![],
            walls: vec![],
            ramps: vec![],
        })
    }

    fn track_with(pars_edit: impl FnOnce(&mut TrackPars)) -> Track {
        let mut track_pars = TrackPars {
            name: String::from("test"),
            inner_radius: 70.0,
            outer_radius: 110.0,
            bound_half: 500.0,
            post_count: 0,
            post_radius: 0.6,
            extra_posts: vec![],
            rocks: vec![],
            walls: vec![],
            ramps: vec![],
        };
        pars_edit(&mut track_pars);
        Track::new(&track_pars)
    }

    #[test]
    fn test_acceleration_is_monotonic_up_to_the_cap() {
        let track = empty_track();
        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, 0.0, 0.0));
        let input = InputState {
            accelerate: true,
            ..InputState::default()
        };

        let mut speed_prev = 0.0;
        for _ in 0..300 {
            vehicle.advance(&input, DT, &track);
            assert!(vehicle.speed >= speed_prev);
            assert!(vehicle.speed <= vehicle.max_speed);
            speed_prev = vehicle.speed;
        }

        assert_relative_eq!(vehicle.speed, vehicle.max_speed);
    }

    #[test]
    fn test_drag_decays_geometrically_and_never_flips_sign() {
        let track = empty_track();
        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, 0.0, 0.0));
        vehicle.speed = 30.0;
        let input = InputState::default();

        let mut speed_prev = vehicle.speed;
        for _ in 0..600 {
            vehicle.advance(&input, DT, &track);
            assert!(vehicle.speed > 0.0);
            assert!(vehicle.speed < speed_prev);
            speed_prev = vehicle.speed;
        }

        // one simulated second of coasting retains roughly drag_per_s of the speed
        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, 0.0, 0.0));
        vehicle.speed = 30.0;
        for _ in 0..60 {
            vehicle.advance(&input, DT, &track);
        }
        assert_relative_eq!(vehicle.speed, 30.0 * 0.4, epsilon = 1e-6);
    }

    #[test]
    fn test_braking_goes_into_the_reverse_range() {
        let track = empty_track();
        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, 0.0, 0.0));
        let input = InputState {
            brake: true,
            ..InputState::default()
        };

        for _ in 0..600 {
            vehicle.advance(&input, DT, &track);
        }

        assert_relative_eq!(vehicle.speed, -vehicle.max_reverse_speed);
    }

    #[test]
    fn test_turn_direction_flips_in_reverse() {
        let track = empty_track();

        let mut forward = Vehicle::new(&test_vehicle_pars(), (0.0, 0.0, 0.0));
        forward.speed = 10.0;
        let mut reverse = Vehicle::new(&test_vehicle_pars(), (0.0, 0.0, 0.0));
        reverse.speed = -5.0;

        let input = InputState {
            steer_right: true,
            ..InputState::default()
        };
        for _ in 0..30 {
            forward.advance(&input, DT, &track);
            reverse.advance(&input, DT, &track);
        }

        assert!(forward.heading > 0.0);
        assert!(reverse.heading < 0.0);
    }

    #[test]
    fn test_low_speed_impact_bounces_backward() {
        let track = track_with(|track_pars| {
            track_pars.walls.push(WallPars {
                x: 0.0,
                z: 20.0,
                half_width: 10.0,
                half_depth: 1.0,
                rotation: 0.0,
            })
        });

        // rolling toward the wall below crash speed, heading +z
        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, 17.3, 0.0));
        vehicle.speed = 8.0;

        let result = vehicle.advance(&InputState::default(), DT, &track);

        assert!(result.contact.is_some());
        assert!(!result.crashed);
        assert!(vehicle.speed < 0.0);
        assert!(vehicle.z < 17.4);
    }

    #[test]
    fn test_high_speed_impact_is_a_crash() {
        let track = track_with(|track_pars| {
            track_pars.rocks.push(RockPars {
                x: 0.0,
                z: 20.0,
                radius: 2.0,
            })
        });

        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, 16.5, 0.0));
        vehicle.speed = 25.0;

        let result = vehicle.advance(&InputState::default(), DT, &track);

        assert!(result.crashed);
        assert_relative_eq!(vehicle.speed, 0.0);
    }

    #[test]
    fn test_ramp_launch_and_landing() {
        let track = track_with(|track_pars| {
            track_pars.ramps.push(RampPars {
                x: 0.0,
                z: 0.0,
                width: 10.0,
                length: 14.0,
                height: 2.5,
                rotation: 0.0,
            })
        });

        // start at the foot of the ramp heading up it
        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, -10.0, 0.0));
        vehicle.speed = 20.0;
        let input = InputState {
            accelerate: true,
            ..InputState::default()
        };

        let mut took_off = false;
        let mut landed = false;
        for _ in 0..240 {
            let result = vehicle.advance(&input, DT, &track);
            took_off |= result.took_off;
            landed |= result.landed;
            if landed {
                break;
            }
            if took_off {
                assert!(vehicle.airborne);
                assert!(vehicle.y > 0.0);
            }
        }

        assert!(took_off, "Vehicle never left the ramp top!");
        assert!(landed, "Vehicle never landed!");
        assert!(!vehicle.airborne);
        assert_relative_eq!(vehicle.y, 0.0);
    }

    #[test]
    fn test_world_boundary_clamps_and_damps() {
        let track = empty_track();
        let mut vehicle = Vehicle::new(&test_vehicle_pars(), (0.0, 497.0, 0.0));
        vehicle.speed = 30.0;

        let mut hit = false;
        for _ in 0..60 {
            let result = vehicle.advance(&InputState::default(), DT, &track);
            hit |= result.hit_bounds;
        }

        assert!(hit);
        assert!(vehicle.z <= 500.0 - vehicle.half_extent + 1e-9);
    }
}
