use crate::core::camera::CameraPars;
use crate::core::scoring::ScoringPars;
use crate::core::track::{PostPars, RampPars, RockPars, TrackPars, WallPars};
use crate::core::vehicle::VehiclePars;
use anyhow::Context;
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI};
use std::fs::OpenOptions;
use std::path::Path;

/// SimPars is used to store all other parameter structs.
#[derive(Debug, Deserialize, Clone)]
pub struct SimPars {
    pub track_pars: TrackPars,
    pub vehicle_pars: VehiclePars,
    pub scoring_pars: ScoringPars,
    pub camera_pars: CameraPars,
}

/// read_sim_pars reads the JSON file and decodes the JSON string into the simulation parameters
/// struct.
pub fn read_sim_pars(filepath: &Path) -> anyhow::Result<SimPars> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open parameter file {}!",
            filepath.to_str().unwrap_or("unknown")
        ))?;
    let pars = serde_json::from_reader(&fh).context(format!(
        "Failed to parse parameter file {}!",
        filepath.to_str().unwrap_or("unknown")
    ))?;
    Ok(pars)
}

/// default_sim_pars returns the built-in circuit used when no parameter file is given: a circular
/// track band with marker posts on both edges, one jump ramp per x-axis crossing, a few rocks
/// just off the racing line and solid walls along the world boundary.
pub fn default_sim_pars() -> SimPars {
    SimPars {
        track_pars: TrackPars {
            name: String::from("ring-90"),
            inner_radius: 70.0,
            outer_radius: 110.0,
            bound_half: 200.0,
            post_count: 24,
            post_radius: 0.6,
            extra_posts: vec![],
            rocks: vec![
                RockPars {
                    x: 52.0,
                    z: 62.0,
                    radius: 2.2,
                },
                RockPars {
                    x: -62.0,
                    z: -78.0,
                    radius: 1.8,
                },
                RockPars {
                    x: 80.0,
                    z: -60.0,
                    radius: 2.5,
                },
                RockPars {
                    x: -21.0,
                    z: 97.0,
                    radius: 2.0,
                },
            ],
            walls: vec![
                WallPars {
                    x: 0.0,
                    z: 195.0,
                    half_width: 195.0,
                    half_depth: 1.0,
                    rotation: 0.0,
                },
                WallPars {
                    x: 0.0,
                    z: -195.0,
                    half_width: 195.0,
                    half_depth: 1.0,
                    rotation: 0.0,
                },
                WallPars {
                    x: 195.0,
                    z: 0.0,
                    half_width: 195.0,
                    half_depth: 1.0,
                    rotation: FRAC_PI_2,
                },
                WallPars {
                    x: -195.0,
                    z: 0.0,
                    half_width: 195.0,
                    half_depth: 1.0,
                    rotation: FRAC_PI_2,
                },
            ],
            // one ramp per track crossing of the x axis, climbing in the travel direction
            ramps: vec![
                RampPars {
                    x: 90.0,
                    z: 0.0,
                    width: 10.0,
                    length: 14.0,
                    height: 2.5,
                    rotation: PI,
                },
                RampPars {
                    x: -90.0,
                    z: 0.0,
                    width: 10.0,
                    length: 14.0,
                    height: 2.5,
                    rotation: 0.0,
                },
            ],
        },
        vehicle_pars: VehiclePars {
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
        },
        scoring_pars: ScoringPars {
            lap_bonus: 100,
            start_window: 6.0,
            rearm_distance: 10.0,
            jump_min_airtime: 0.2,
            jump_airtime_step: 0.1,
            jump_points_per_step: 10,
        },
        camera_pars: CameraPars {
            back: 9.0,
            up: 4.5,
            look_ahead: 6.0,
            look_up: 1.5,
            stiffness: 5.0,
        },
    }
}

/// LayoutEntry is one row of an obstacle layout CSV. The parameter columns are interpreted per
/// kind: post/rock use p1 as the radius; wall uses p1/p2/p3 as half width/half depth/rotation;
/// ramp uses p1/p2/p3/p4 as width/length/height/rotation.
#[derive(Debug, Deserialize, Clone)]
pub struct LayoutEntry {
    pub kind: String,
    pub x: f64,
    pub z: f64,
    pub p1: f64,
    pub p2: f64,
    pub p3: f64,
    pub p4: f64,
}

/// read_obstacle_layout reads an obstacle layout CSV.
pub fn read_obstacle_layout(filepath: &Path) -> anyhow::Result<Vec<LayoutEntry>> {
    let fh = OpenOptions::new()
        .read(true)
        .open(filepath)
        .context(format!(
            "Failed to open layout file {}!",
            filepath.to_str().unwrap_or("unknown")
        ))?;

    let mut csv_reader = csv::Reader::from_reader(&fh);
    let mut entries: Vec<LayoutEntry> = vec![];

    for result in csv_reader.deserialize() {
        let entry: LayoutEntry = result.context(format!(
            "Failed to parse layout file {}!",
            filepath.to_str().unwrap_or("unknown")
        ))?;
        entries.push(entry);
    }

    Ok(entries)
}

/// merge_obstacle_layout appends the layout entries to the matching track parameter lists.
pub fn merge_obstacle_layout(
    track_pars: &mut TrackPars,
    entries: &[LayoutEntry],
) -> anyhow::Result<()> {
    for entry in entries.iter() {
        match entry.kind.as_str() {
            "post" => track_pars.extra_posts.push(PostPars {
                x: entry.x,
                z: entry.z,
                radius: entry.p1,
            }),
            "rock" => track_pars.rocks.push(RockPars {
                x: entry.x,
                z: entry.z,
                radius: entry.p1,
            }),
            "wall" => track_pars.walls.push(WallPars {
                x: entry.x,
                z: entry.z,
                half_width: entry.p1,
                half_depth: entry.p2,
                rotation: entry.p3,
            }),
            "ramp" => track_pars.ramps.push(RampPars {
                x: entry.x,
                z: entry.z,
                width: entry.p1,
                length: entry.p2,
                height: entry.p3,
                rotation: entry.p4,
            }),
            other => anyhow::bail!("Unknown obstacle kind {} in layout file!", other),
        }
    }

    Ok(())
}
