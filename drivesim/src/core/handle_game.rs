use crate::core::game::Game;
use crate::core::input::InputState;
use crate::core::track::Obstacle;
use crate::interfaces::gui_interface::{
    CameraView, GameState, PostView, RgbColor, VehicleView, MAX_GUI_UPDATE_FREQUENCY,
};
use crate::post::drive_result::DriveResult;
use crate::pre::read_sim_pars::SimPars;
use anyhow::Context;
use flume::{Receiver, Sender};
use helpers::general::wrap_angle;
use std::thread::sleep;
use std::time::{Duration, Instant};

// Duration used for scripted runs when the caller did not set one.
const FALLBACK_SCRIPTED_DURATION: f64 = 90.0;
// Fraction of the speed cap the scripted pilot cruises at with factor 1.0.
const PILOT_CRUISE_FRAC: f64 = 0.45;
// Heading correction per meter of radial offset from the centerline.
const PILOT_RADIUS_GAIN: f64 = 0.04;

/// handle_session creates a game from the inserted parameters and drives it: scripted at full
/// speed in non-GUI mode, or in real-time against the GUI channels. Returns the session result
/// for post-processing.
#[allow(clippy::too_many_arguments)]
pub fn handle_session(
    sim_pars: &SimPars,
    timestep_size: f64,
    duration: f64,
    print_debug: bool,
    tx: Option<&Sender<GameState>>,
    rx_input: Option<&Receiver<InputState>>,
    realtime_factor: f64,
    cruise_factor: f64,
) -> anyhow::Result<DriveResult> {
    let mut game = Game::new(sim_pars);

    // check if a sender was inserted -> in that case use real-time simulation for the GUI
    let sim_realtime = tx.is_some();
    if !sim_realtime {
        let duration = if duration > 0.0 {
            duration
        } else {
            FALLBACK_SCRIPTED_DURATION
        };

        let mut t_update_print = 0.0;
        while game.sim_time < duration {
            let input = scripted_input(&game, cruise_factor);
            game.advance(&input, timestep_size);

            if print_debug && game.sim_time > t_update_print + 0.9999 {
                println!(
                    "INFO: Simulating... Current session time is {:.3}s, current lap is {}, speed is {:.1} km/h",
                    game.sim_time,
                    game.scores.current_lap(),
                    game.vehicle.speed_kmh()
                );
                t_update_print = game.sim_time;
            }
        }

        return Ok(game.result());
    }

    let tx = tx.unwrap();
    let rx_input = rx_input.expect("Real-time simulation requires an input receiver!");

    // parse the vehicle color once for the GUI snapshots
    let color = sim_pars
        .vehicle_pars
        .color
        .parse::<css_color_parser::Color>()
        .context("Could not parse vehicle color!")?;
    let color = RgbColor {
        r: color.r,
        g: color.g,
        b: color.b,
    };

    let mut input = InputState::default();
    let mut t_update_gui = -1.0;

    loop {
        let t_start = Instant::now();

        // the freshest input state received before this tick wins
        if let Some(latest) = rx_input.try_iter().last() {
            input = latest;
        }

        game.advance(&input, timestep_size);

        let session_over = duration > 0.0 && game.sim_time >= duration;

        if session_over || game.sim_time > t_update_gui + 1.0 / MAX_GUI_UPDATE_FREQUENCY - 0.001 {
            let final_result = if session_over {
                Some(game.result())
            } else {
                None
            };

            if tx.send(build_game_state(&game, color, final_result)).is_err() {
                // the GUI closed the window; end the session
                return Ok(game.result());
            }
            t_update_gui = game.sim_time;
        }

        if session_over {
            return Ok(game.result());
        }

        // sleep until the time step is finished in real-time as well (calculation in ms)
        let t_sleep = (timestep_size * 1000.0 / realtime_factor) as i64
            - t_start.elapsed().as_millis() as i64;

        if t_sleep > 0 {
            sleep(Duration::from_millis(t_sleep as u64));
        } else {
            println!("WARNING: Could not keep up with real-time!")
        }
    }
}

/// scripted_input stands in for the keyboard when no player is attached: proportional steering
/// toward the track centerline along the travel tangent, throttle up to a cruise speed scaled by
/// `cruise_factor`, and a restart as soon as a crash freezes the car.
fn scripted_input(game: &Game, cruise_factor: f64) -> InputState {
    if game.scores.is_broken() {
        return InputState {
            restart: true,
            ..InputState::default()
        };
    }

    let vehicle = &game.vehicle;
    let radius = (vehicle.x * vehicle.x + vehicle.z * vehicle.z).sqrt().max(1.0);

    // travel tangent of the clockwise racing line, corrected back toward the centerline
    let tangent_heading = (vehicle.z / radius).atan2(-vehicle.x / radius);
    let radius_correction =
        (PILOT_RADIUS_GAIN * (radius - game.track.mid_radius)).clamp(-0.5, 0.5);
    let heading_err = wrap_angle(tangent_heading + radius_correction - vehicle.heading);

    let mut input = InputState::default();
    if heading_err > 0.04 {
        input.steer_right = true;
    } else if heading_err < -0.04 {
        input.steer_left = true;
    }

    let cruise_speed = vehicle.max_speed * PILOT_CRUISE_FRAC * cruise_factor;
    if vehicle.speed < cruise_speed {
        input.accelerate = true;
    } else if vehicle.speed > cruise_speed + 3.0 {
        input.brake = true;
    }

    input
}

fn build_game_state(game: &Game, color: RgbColor, final_result: Option<DriveResult>) -> GameState {
    let vehicle = VehicleView {
        x: game.vehicle.x,
        y: game.vehicle.y,
        z: game.vehicle.z,
        heading: game.vehicle.heading,
        speed_kmh: game.vehicle.speed_kmh(),
        airborne: game.vehicle.airborne,
        color,
    };

    let camera = match game.camera.pose() {
        Some((position, look_at)) => CameraView { position, look_at },
        None => CameraView::default(),
    };

    let posts = game
        .track
        .obstacles
        .iter()
        .filter_map(|obstacle| match obstacle {
            Obstacle::Post {
                x, z, knocked, yaw, ..
            } => Some(PostView {
                x: *x,
                z: *z,
                knocked: *knocked,
                yaw: *yaw,
            }),
            _ => None,
        })
        .collect();

    GameState {
        vehicle,
        camera,
        hud: game.hud.clone(),
        posts,
        final_result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pre::read_sim_pars::default_sim_pars;

    #[test]
    fn test_scripted_session_completes_laps() {
        let sim_pars = default_sim_pars();

        let result = handle_session(&sim_pars, 1.0 / 60.0, 180.0, false, None, None, 1.0, 1.0)
            .expect("Scripted session failed!");

        // at 18 m/s on a 565 m circle, three minutes are good for several laps
        assert!(
            result.laps_completed >= 2,
            "Expected at least 2 laps, got {}",
            result.laps_completed
        );
        assert!(result.score >= 200);
        assert!(result.best_lap_time.is_some());
        assert!(!result.speed_trace.is_empty());
    }

    #[test]
    fn test_scripted_pilot_steers_toward_centerline() {
        let sim_pars = default_sim_pars();
        let mut game = Game::new(&sim_pars);

        // drifted outside the centerline, heading along the tangent
        game.vehicle.x = 0.0;
        game.vehicle.z = -105.0;
        game.vehicle.speed = 15.0;

        let input = scripted_input(&game, 1.0);
        // at (0, -105) the tangent heading matches the spawn heading, so only the radius
        // correction is active and it must steer right (inward, toward positive heading error)
        assert!(input.steer_right);
        assert!(!input.steer_left);
    }
}
