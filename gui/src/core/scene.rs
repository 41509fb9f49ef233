use drivesim::core::track::{to_world_frame, TrackPars};
use std::f64::consts::TAU;

// Polyline resolution of the track edge rings.
const RING_SEGMENTS: usize = 96;

/// Scene holds the static world-space geometry of the track, precomputed once so it must not be
/// rebuilt in every frame. Posts are not part of the scene; they move when knocked over and are
/// drawn from the per-frame game state instead.
#[derive(Debug)]
pub struct Scene {
    pub inner_ring: Vec<(f64, f64)>,
    pub outer_ring: Vec<(f64, f64)>,
    pub start_line: [(f64, f64); 2],
    /// (x, z, radius)
    pub rocks: Vec<(f64, f64, f64)>,
    /// closed outlines
    pub walls: Vec<Vec<(f64, f64)>>,
    /// closed outlines, first two points form the top edge
    pub ramps: Vec<Vec<(f64, f64)>>,
}

impl Scene {
    pub fn from_track_pars(track_pars: &TrackPars) -> Scene {
        let inner_ring = ring_polyline(track_pars.inner_radius);
        let outer_ring = ring_polyline(track_pars.outer_radius);

        let start_line = [
            (0.0, -track_pars.inner_radius),
            (0.0, -track_pars.outer_radius),
        ];

        let rocks = track_pars
            .rocks
            .iter()
            .map(|rock| (rock.x, rock.z, rock.radius))
            .collect();

        let walls = track_pars
            .walls
            .iter()
            .map(|wall| {
                rect_outline(
                    wall.x,
                    wall.z,
                    wall.half_width,
                    wall.half_depth,
                    wall.rotation,
                )
            })
            .collect();

        let ramps = track_pars
            .ramps
            .iter()
            .map(|ramp| {
                rect_outline(
                    ramp.x,
                    ramp.z,
                    ramp.width / 2.0,
                    ramp.length / 2.0,
                    ramp.rotation,
                )
            })
            .collect();

        Scene {
            inner_ring,
            outer_ring,
            start_line,
            rocks,
            walls,
            ramps,
        }
    }
}

fn ring_polyline(radius: f64) -> Vec<(f64, f64)> {
    let mut points = Vec::with_capacity(RING_SEGMENTS + 1);
    for i in 0..=RING_SEGMENTS {
        let angle = TAU * i as f64 / RING_SEGMENTS as f64;
        points.push((radius * angle.sin(), radius * angle.cos()));
    }
    points
}

/// rect_outline returns the closed outline of an oriented rectangle. The first two points form
/// the edge at positive local z (a ramp's top edge).
fn rect_outline(x: f64, z: f64, half_width: f64, half_depth: f64, rotation: f64) -> Vec<(f64, f64)> {
    let corners = [
        (-half_width, half_depth),
        (half_width, half_depth),
        (half_width, -half_depth),
        (-half_width, -half_depth),
        (-half_width, half_depth),
    ];

    corners
        .iter()
        .map(|&(local_x, local_z)| {
            let (dx, dz) = to_world_frame(local_x, local_z, rotation);
            (x + dx, z + dz)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use drivesim::pre::read_sim_pars::default_sim_pars;

    #[test]
    fn test_scene_matches_track_pars() {
        let track_pars = default_sim_pars().track_pars;
        let scene = Scene::from_track_pars(&track_pars);

        assert_eq!(scene.inner_ring.len(), RING_SEGMENTS + 1);
        assert_eq!(scene.rocks.len(), track_pars.rocks.len());
        assert_eq!(scene.walls.len(), track_pars.walls.len());
        assert_eq!(scene.ramps.len(), track_pars.ramps.len());

        // the start line spans the band at negative z
        assert!(scene.start_line[0].1 < 0.0);
        assert!(scene.start_line[1].1 < scene.start_line[0].1);
    }

    #[test]
    fn test_rect_outline_is_closed() {
        let outline = rect_outline(10.0, -5.0, 3.0, 1.0, 0.8);
        assert_eq!(outline.len(), 5);
        assert!((outline[0].0 - outline[4].0).abs() < 1e-12);
        assert!((outline[0].1 - outline[4].1).abs() < 1e-12);
    }
}
