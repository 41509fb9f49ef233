use crate::core::track::{to_local_frame, to_world_frame, Obstacle, Track};

// A ramp's back face is only solid for vehicles below this fraction of the ramp height, i.e. for
// vehicles that are not already on the ramp surface.
const RAMP_BACK_FACE_HEIGHT_FRAC: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    Post,
    Rock,
    Wall,
    RampBack,
}

/// Contact describes one obstacle interaction at a candidate position: the obstacle hit and the
/// normalized push direction (from the obstacle toward the vehicle) with its penetration depth.
#[derive(Debug, Clone, Copy)]
pub struct Contact {
    pub kind: ContactKind,
    pub obstacle_idx: usize,
    pub push_x: f64,
    pub push_z: f64,
    pub overlap: f64,
}

/// query checks the candidate position (x, z) against every obstacle in the registry and returns
/// the first contact in iteration order, or None. The obstacle list is small, so a linear scan per
/// frame is acceptable. The query is read-only; applying a response is the caller's job.
pub fn query(track: &Track, x: f64, z: f64, height: f64, half_extent: f64) -> Option<Contact> {
    for (idx, obstacle) in track.obstacles.iter().enumerate() {
        let contact = match obstacle {
            Obstacle::Post {
                x: post_x,
                z: post_z,
                radius,
                knocked,
                ..
            } => {
                if *knocked {
                    // a post lying on its side no longer obstructs the car
                    None
                } else {
                    circle_contact(x - post_x, z - post_z, radius + half_extent)
                        .map(|(push_x, push_z, overlap)| Contact {
                            kind: ContactKind::Post,
                            obstacle_idx: idx,
                            push_x,
                            push_z,
                            overlap,
                        })
                }
            }

            Obstacle::Rock {
                x: rock_x,
                z: rock_z,
                radius,
            } => circle_contact(x - rock_x, z - rock_z, radius + half_extent).map(
                |(push_x, push_z, overlap)| Contact {
                    kind: ContactKind::Rock,
                    obstacle_idx: idx,
                    push_x,
                    push_z,
                    overlap,
                },
            ),

            Obstacle::Wall {
                x: wall_x,
                z: wall_z,
                half_width,
                half_depth,
                rotation,
            } => rect_contact(
                x - wall_x,
                z - wall_z,
                *rotation,
                half_width + half_extent,
                half_depth + half_extent,
            )
            .map(|(push_x, push_z, overlap)| Contact {
                kind: ContactKind::Wall,
                obstacle_idx: idx,
                push_x,
                push_z,
                overlap,
            }),

            Obstacle::Ramp {
                x: ramp_x,
                z: ramp_z,
                width,
                length,
                height: ramp_height,
                rotation,
            } => {
                // the back face behaves like a round wall at the top edge, but only for vehicles
                // on the ground approaching from behind the ramp
                if height >= ramp_height * RAMP_BACK_FACE_HEIGHT_FRAC {
                    None
                } else {
                    let (_, local_z) = to_local_frame(x - ramp_x, z - ramp_z, *rotation);
                    if local_z <= length / 2.0 {
                        None
                    } else {
                        let (top_x, top_z) = to_world_frame(0.0, length / 2.0, *rotation);
                        circle_contact(
                            x - (ramp_x + top_x),
                            z - (ramp_z + top_z),
                            width / 2.0 + half_extent,
                        )
                        .map(|(push_x, push_z, overlap)| Contact {
                            kind: ContactKind::RampBack,
                            obstacle_idx: idx,
                            push_x,
                            push_z,
                            overlap,
                        })
                    }
                }
            }
        };

        if contact.is_some() {
            return contact;
        }
    }

    None
}

/// circle_contact tests a relative position against a circle of radius `min_dist` around the
/// origin and returns the normalized push direction and penetration depth on overlap.
fn circle_contact(dx: f64, dz: f64, min_dist: f64) -> Option<(f64, f64, f64)> {
    let dist_sq = dx * dx + dz * dz;
    if dist_sq >= min_dist * min_dist {
        return None;
    }

    let dist = dist_sq.sqrt();
    if dist < 1e-9 {
        // degenerate dead-center overlap, push along +x
        return Some((1.0, 0.0, min_dist));
    }

    Some((dx / dist, dz / dist, min_dist - dist))
}

/// rect_contact tests a relative position against an oriented rectangle with the given half
/// extents. The push direction is taken from the axis with the smaller penetration, rotated back
/// into the world frame.
fn rect_contact(
    dx: f64,
    dz: f64,
    rotation: f64,
    half_width: f64,
    half_depth: f64,
) -> Option<(f64, f64, f64)> {
    let (local_x, local_z) = to_local_frame(dx, dz, rotation);

    if local_x.abs() >= half_width || local_z.abs() >= half_depth {
        return None;
    }

    let pen_x = half_width - local_x.abs();
    let pen_z = half_depth - local_z.abs();

    let (local_push_x, local_push_z, overlap) = if pen_x < pen_z {
        (local_x.signum(), 0.0, pen_x)
    } else {
        (0.0, local_z.signum(), pen_z)
    };

    let (push_x, push_z) = to_world_frame(local_push_x, local_push_z, rotation);
    Some((push_x, push_z, overlap))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::track::{PostPars, RampPars, RockPars, TrackPars, WallPars};
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn track_with(pars_edit: impl FnOnce(&mut TrackPars)) -> Track {
        let mut track_pars = TrackPars {
            name: String::from("test"),
            inner_radius: 70.0,
            outer_radius: 110.0,
            bound_half: 200.0,
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
    fn test_miss_returns_none() {
        let track = track_with(|track_pars| {
            track_pars.rocks.push(RockPars {
                x: 0.0,
                z: 0.0,
                radius: 2.0,
            })
        });

        assert!(query(&track, 10.0, 0.0, 0.0, 1.5).is_none());
    }

    #[test]
    fn test_rock_contact_push_direction() {
        let track = track_with(|track_pars| {
            track_pars.rocks.push(RockPars {
                x: 0.0,
                z: 0.0,
                radius: 2.0,
            })
        });

        let contact = query(&track, 3.0, 0.0, 0.0, 1.5).expect("Expected a rock contact!");
        assert_eq!(contact.kind, ContactKind::Rock);
        assert_relative_eq!(contact.push_x, 1.0);
        assert_relative_eq!(contact.push_z, 0.0);
        assert_relative_eq!(contact.overlap, 0.5);
    }

    #[test]
    fn test_knocked_post_is_not_solid() {
        let mut track = track_with(|track_pars| {
            track_pars.extra_posts.push(PostPars {
                x: 0.0,
                z: 0.0,
                radius: 0.6,
            })
        });

        assert!(query(&track, 1.0, 0.0, 0.0, 1.5).is_some());
        track.knock_over_post(0, 1.0, 0.0);
        assert!(query(&track, 1.0, 0.0, 0.0, 1.5).is_none());
    }

    #[test]
    fn test_wall_contact_in_rotated_frame() {
        // wall rotated 90 degrees: its width now spans the world z axis
        let track = track_with(|track_pars| {
            track_pars.walls.push(WallPars {
                x: 0.0,
                z: 0.0,
                half_width: 6.0,
                half_depth: 0.8,
                rotation: FRAC_PI_2,
            })
        });

        // approach along the world x axis hits the rotated face
        let contact = query(&track, 1.5, 0.0, 0.0, 1.0).expect("Expected a wall contact!");
        assert_eq!(contact.kind, ContactKind::Wall);
        assert_relative_eq!(contact.push_x, 1.0, epsilon = 1e-9);
        assert_relative_eq!(contact.push_z, 0.0, epsilon = 1e-9);

        // beyond the rotated half width there is no contact
        assert!(query(&track, 1.5, 8.0, 0.0, 1.0).is_none());
    }

    #[test]
    fn test_ramp_back_face_only_when_low_and_behind() {
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

        // on the ground just behind the top edge: solid
        let contact = query(&track, 0.0, 8.0, 0.0, 1.5).expect("Expected a back-face contact!");
        assert_eq!(contact.kind, ContactKind::RampBack);
        assert!(contact.push_z > 0.0);

        // same position but already at ramp height: passable
        assert!(query(&track, 0.0, 8.0, 2.0, 1.5).is_none());

        // in front of the top edge (on the surface): passable
        assert!(query(&track, 0.0, 6.0, 2.0, 1.5).is_none());
    }

    #[test]
    fn test_first_hit_in_iteration_order_wins() {
        let track = track_with(|track_pars| {
            // wall and rock overlap; walls are registered first
            track_pars.walls.push(WallPars {
                x: 0.0,
                z: 0.0,
                half_width: 3.0,
                half_depth: 3.0,
                rotation: 0.0,
            });
            track_pars.rocks.push(RockPars {
                x: 0.0,
                z: 0.0,
                radius: 3.0,
            });
        });

        let contact = query(&track, 1.0, 0.0, 0.0, 1.0).expect("Expected a contact!");
        assert_eq!(contact.kind, ContactKind::Wall);
    }
}
