use helpers::general::lin_interp;
use rand::Rng;
use serde::Deserialize;
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// * `x`, `z` - (m) Post center
/// * `radius` - (m) Post radius
#[derive(Debug, Deserialize, Clone)]
pub struct PostPars {
    pub x: f64,
    pub z: f64,
    pub radius: f64,
}

/// * `x`, `z` - (m) Rock center
/// * `radius` - (m) Rock radius
#[derive(Debug, Deserialize, Clone)]
pub struct RockPars {
    pub x: f64,
    pub z: f64,
    pub radius: f64,
}

/// * `x`, `z` - (m) Wall center
/// * `half_width` - (m) Half extent across the wall's local x axis
/// * `half_depth` - (m) Half extent along the wall's local z axis
/// * `rotation` - (rad) Yaw of the wall's local z axis
#[derive(Debug, Deserialize, Clone)]
pub struct WallPars {
    pub x: f64,
    pub z: f64,
    pub half_width: f64,
    pub half_depth: f64,
    pub rotation: f64,
}

/// * `x`, `z` - (m) Center of the ramp footprint
/// * `width` - (m) Full extent across the climbing direction
/// * `length` - (m) Full extent along the climbing direction
/// * `height` - (m) Surface height at the top edge
/// * `rotation` - (rad) Yaw of the climbing direction
#[derive(Debug, Deserialize, Clone)]
pub struct RampPars {
    pub x: f64,
    pub z: f64,
    pub width: f64,
    pub length: f64,
    pub height: f64,
    pub rotation: f64,
}

/// * `name` - Track name
/// * `inner_radius` - (m) Inner edge of the circular track band
/// * `outer_radius` - (m) Outer edge of the circular track band
/// * `bound_half` - (m) Half extent of the square world boundary
/// * `post_count` - Number of marker posts per track edge ring
/// * `post_radius` - (m) Radius of the marker posts
/// * `extra_posts` - Additional free-standing posts
/// * `rocks` - Rock obstacles
/// * `walls` - Wall obstacles
/// * `ramps` - Jump ramps
#[derive(Debug, Deserialize, Clone)]
pub struct TrackPars {
    pub name: String,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub bound_half: f64,
    pub post_count: u32,
    pub post_radius: f64,
    #[serde(default)]
    pub extra_posts: Vec<PostPars>,
    pub rocks: Vec<RockPars>,
    pub walls: Vec<WallPars>,
    pub ramps: Vec<RampPars>,
}

/// Obstacle is the tagged shape descriptor stored in the registry. All obstacles are created once
/// at track construction; posts are additionally mutated in place when knocked over.
#[derive(Debug, Clone)]
pub enum Obstacle {
    Post {
        x: f64,
        z: f64,
        radius: f64,
        knocked: bool,
        lean: f64,
        yaw: f64,
    },
    Rock {
        x: f64,
        z: f64,
        radius: f64,
    },
    Wall {
        x: f64,
        z: f64,
        half_width: f64,
        half_depth: f64,
        rotation: f64,
    },
    Ramp {
        x: f64,
        z: f64,
        width: f64,
        length: f64,
        height: f64,
        rotation: f64,
    },
}

// Displacement of a post center when it is knocked over and tilt it ends up with.
const POST_KNOCK_DISTANCE: f64 = 1.5;
const POST_KNOCK_LEAN: f64 = 1.35;

#[derive(Debug)]
pub struct Track {
    pub name: String,
    pub inner_radius: f64,
    pub outer_radius: f64,
    pub mid_radius: f64,
    pub bound_half: f64,
    pub start_line_z: f64,
    pub obstacles: Vec<Obstacle>,
}

impl Track {
    pub fn new(track_pars: &TrackPars) -> Track {
        let mid_radius = (track_pars.inner_radius + track_pars.outer_radius) / 2.0;

        // build the obstacle registry; solid shapes come first so they win the first-hit query
        let mut obstacles = Vec::new();

        for wall_pars in track_pars.walls.iter() {
            obstacles.push(Obstacle::Wall {
                x: wall_pars.x,
                z: wall_pars.z,
                half_width: wall_pars.half_width,
                half_depth: wall_pars.half_depth,
                rotation: wall_pars.rotation,
            });
        }

        for rock_pars in track_pars.rocks.iter() {
            obstacles.push(Obstacle::Rock {
                x: rock_pars.x,
                z: rock_pars.z,
                radius: rock_pars.radius,
            });
        }

        for ramp_pars in track_pars.ramps.iter() {
            obstacles.push(Obstacle::Ramp {
                x: ramp_pars.x,
                z: ramp_pars.z,
                width: ramp_pars.width,
                length: ramp_pars.length,
                height: ramp_pars.height,
                rotation: ramp_pars.rotation,
            });
        }

        // marker posts on both track edges
        for ring_radius in [track_pars.inner_radius, track_pars.outer_radius].iter() {
            for i in 0..track_pars.post_count {
                let angle = TAU * i as f64 / track_pars.post_count as f64;
                obstacles.push(Obstacle::Post {
                    x: ring_radius * angle.sin(),
                    z: ring_radius * angle.cos(),
                    radius: track_pars.post_radius,
                    knocked: false,
                    lean: 0.0,
                    yaw: 0.0,
                });
            }
        }

        for post_pars in track_pars.extra_posts.iter() {
            obstacles.push(Obstacle::Post {
                x: post_pars.x,
                z: post_pars.z,
                radius: post_pars.radius,
                knocked: false,
                lean: 0.0,
                yaw: 0.0,
            });
        }

        Track {
            name: track_pars.name.to_owned(),
            inner_radius: track_pars.inner_radius,
            outer_radius: track_pars.outer_radius,
            mid_radius,
            bound_half: track_pars.bound_half,
            start_line_z: -mid_radius,
            obstacles,
        }
    }

    /// start_pose returns the spawn position and heading: on the centerline at the start line,
    /// facing the direction of travel (negative x).
    pub fn start_pose(&self) -> (f64, f64, f64) {
        (0.0, self.start_line_z, -FRAC_PI_2)
    }

    /// ground_height returns the drivable surface height at (x, z): the highest ramp surface
    /// below the point, or zero on flat ground.
    pub fn ground_height(&self, x: f64, z: f64) -> f64 {
        let mut height_max = 0.0;

        for obstacle in self.obstacles.iter() {
            if let Obstacle::Ramp {
                x: ramp_x,
                z: ramp_z,
                width,
                length,
                height,
                rotation,
            } = obstacle
            {
                let (local_x, local_z) = to_local_frame(x - ramp_x, z - ramp_z, *rotation);

                if local_x.abs() <= width / 2.0 && local_z.abs() <= length / 2.0 {
                    let surface = lin_interp(
                        local_z,
                        &[-length / 2.0, length / 2.0],
                        &[0.0, *height],
                    );

                    if surface > height_max {
                        height_max = surface;
                    }
                }
            }
        }

        height_max
    }

    /// knock_over_post tips the post at the given registry index: the post is pushed away from
    /// the vehicle and laid down with a random yaw. Knocked posts are skipped by the collision
    /// query, so a post is only ever knocked over once.
    pub fn knock_over_post(&mut self, idx: usize, push_x: f64, push_z: f64) {
        match &mut self.obstacles[idx] {
            Obstacle::Post {
                x,
                z,
                knocked,
                lean,
                yaw,
                ..
            } => {
                if *knocked {
                    return;
                }

                let mut rng = rand::thread_rng();
                *x += push_x * POST_KNOCK_DISTANCE;
                *z += push_z * POST_KNOCK_DISTANCE;
                *knocked = true;
                *lean = POST_KNOCK_LEAN;
                *yaw = rng.gen_range(-PI..PI);
            }
            _ => panic!("Tried to knock over an obstacle that is not a post!"),
        }
    }
}

/// to_local_frame rotates a relative position into an obstacle's local frame (yaw `rotation`).
pub fn to_local_frame(dx: f64, dz: f64, rotation: f64) -> (f64, f64) {
    let (sin_r, cos_r) = rotation.sin_cos();
    (dx * cos_r - dz * sin_r, dx * sin_r + dz * cos_r)
}

/// to_world_frame is the inverse of `to_local_frame`.
pub fn to_world_frame(lx: f64, lz: f64, rotation: f64) -> (f64, f64) {
    let (sin_r, cos_r) = rotation.sin_cos();
    (lx * cos_r + lz * sin_r, -lx * sin_r + lz * cos_r)
}
