use crate::core::camera::ChaseCamera;
use crate::core::collision::ContactKind;
use crate::core::hud::HudModel;
use crate::core::input::InputState;
use crate::core::scoring::ScoreBoard;
use crate::core::track::Track;
use crate::core::vehicle::Vehicle;
use crate::post::drive_result::{DriveResult, SessionEvent};
use crate::pre::read_sim_pars::SimPars;
use helpers::general::max;

/// Physics steps are clamped to this bound so slow frames cannot destabilize the integration.
pub const MAX_TIMESTEP: f64 = 0.05;

// Telemetry sampling interval of the speed trace.
const TRACE_INTERVAL: f64 = 0.1;

/// Game is the explicit context object holding all mutable gameplay state of one session. One
/// `advance` call is one frame: input -> vehicle -> lap/score -> camera -> HUD, in that order.
#[derive(Debug)]
pub struct Game {
    pub track: Track,
    pub vehicle: Vehicle,
    pub scores: ScoreBoard,
    pub camera: ChaseCamera,
    pub hud: HudModel,
    pub sim_time: f64,
    pub events: Vec<SessionEvent>,
    speed_trace: Vec<[f64; 2]>,
    next_trace_time: f64,
}

impl Game {
    pub fn new(sim_pars: &SimPars) -> Game {
        let track = Track::new(&sim_pars.track_pars);
        let vehicle = Vehicle::new(&sim_pars.vehicle_pars, track.start_pose());
        let scores = ScoreBoard::new(&sim_pars.scoring_pars, track.start_line_z);
        let camera = ChaseCamera::new(&sim_pars.camera_pars);

        Game {
            track,
            vehicle,
            scores,
            camera,
            hud: HudModel::new(),
            sim_time: 0.0,
            events: Vec::new(),
            speed_trace: Vec::new(),
            next_trace_time: 0.0,
        }
    }

    // ---------------------------------------------------------------------------------------------
    // MAIN METHOD ---------------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    /// advance simulates one frame with the given input state and elapsed time.
    pub fn advance(&mut self, input: &InputState, dt: f64) {
        let dt = dt.clamp(0.0, MAX_TIMESTEP);
        self.sim_time += dt;

        if self.scores.is_broken() {
            if input.restart {
                self.respawn();
            } else {
                // the wreck stays frozen; camera and HUD keep updating so the overlay renders
                self.update_camera_and_hud(dt);
                return;
            }
        }

        let prev_x = self.vehicle.x;
        let step = self.vehicle.advance(input, dt, &self.track);

        // apply the stateful collision consequences the vehicle only reported
        if let Some(contact) = step.contact {
            if contact.kind == ContactKind::Post {
                self.track
                    .knock_over_post(contact.obstacle_idx, contact.push_x, contact.push_z);
            }
        }

        if step.crashed {
            self.scores.record_crash();
            self.events.push(SessionEvent {
                kind: String::from("Crash"),
                lap: self.scores.current_lap(),
                time_s: self.sim_time,
                points: 0,
            });
        }

        if step.took_off {
            self.scores.begin_jump(self.sim_time);
        }

        if step.landed {
            let points = self.scores.end_jump(self.sim_time);
            if points > 0 {
                self.hud.show_jump_bonus(points);
                self.events.push(SessionEvent {
                    kind: String::from("JumpBonus"),
                    lap: self.scores.current_lap(),
                    time_s: self.sim_time,
                    points,
                });
            }
        }

        if self
            .scores
            .check_start_line(prev_x, self.vehicle.x, self.vehicle.z, self.sim_time)
            .is_some()
        {
            self.events.push(SessionEvent {
                kind: String::from("LapComplete"),
                lap: self.scores.current_lap() - 1,
                time_s: self.sim_time,
                points: self.scores.lap_bonus(),
            });
        }

        self.update_camera_and_hud(dt);

        if self.sim_time >= self.next_trace_time {
            self.speed_trace
                .push([self.sim_time, self.vehicle.speed_kmh()]);
            self.next_trace_time = self.sim_time + TRACE_INTERVAL;
        }
    }

    // ---------------------------------------------------------------------------------------------
    // METHODS (HELPERS) ---------------------------------------------------------------------------
    // ---------------------------------------------------------------------------------------------

    fn update_camera_and_hud(&mut self, dt: f64) {
        self.camera.update(
            self.vehicle.x,
            self.vehicle.y,
            self.vehicle.z,
            self.vehicle.heading,
            dt,
        );
        self.hud
            .refresh(&self.vehicle, &self.scores, self.sim_time, dt);
    }

    /// respawn puts the session back to its initial state after a crash (the "R" handler).
    fn respawn(&mut self) {
        self.vehicle.reset_pose(self.track.start_pose());
        self.scores.reset(self.sim_time);
        self.camera.reset();
        self.hud.clear();
        self.events.push(SessionEvent {
            kind: String::from("Restart"),
            lap: 1,
            time_s: self.sim_time,
            points: 0,
        });
    }

    /// result snapshots the session for post-processing.
    pub fn result(&self) -> DriveResult {
        let top_speed_kmh = if self.speed_trace.is_empty() {
            0.0
        } else {
            let speeds: Vec<f64> = self.speed_trace.iter().map(|sample| sample[1]).collect();
            max(&speeds)
        };

        DriveResult {
            laps_completed: self.scores.lap_times().len() as u32,
            lap_times: self.scores.lap_times().to_vec(),
            best_lap_time: self.scores.best_lap_time(),
            score: self.scores.score(),
            top_speed_kmh,
            events: self.events.to_owned(),
            speed_trace: self.speed_trace.to_owned(),
        }
    }
}
