use serde::Deserialize;

/// * `back` - (m) Chase offset behind the vehicle
/// * `up` - (m) Chase offset above the vehicle
/// * `look_ahead` - (m) Look-at offset in front of the vehicle
/// * `look_up` - (m) Look-at offset above the vehicle
/// * `stiffness` - (1/s) Exponential smoothing rate toward the desired pose
#[derive(Debug, Deserialize, Clone)]
pub struct CameraPars {
    pub back: f64,
    pub up: f64,
    pub look_ahead: f64,
    pub look_up: f64,
    pub stiffness: f64,
}

/// ChaseCamera trails the vehicle with exponential smoothing. The smoothed pose is initialized
/// lazily: the first update snaps straight to the desired pose so there is no startup lerp.
#[derive(Debug)]
pub struct ChaseCamera {
    back: f64,
    up: f64,
    look_ahead: f64,
    look_up: f64,
    stiffness: f64,
    smoothed: Option<([f64; 3], [f64; 3])>,
}

impl ChaseCamera {
    pub fn new(camera_pars: &CameraPars) -> ChaseCamera {
        ChaseCamera {
            back: camera_pars.back,
            up: camera_pars.up,
            look_ahead: camera_pars.look_ahead,
            look_up: camera_pars.look_up,
            stiffness: camera_pars.stiffness,
            smoothed: None,
        }
    }

    /// reset drops the smoothed pose; the next update snaps again (used after a respawn so the
    /// camera does not swoosh across the map).
    pub fn reset(&mut self) {
        self.smoothed = None;
    }

    fn desired(&self, x: f64, y: f64, z: f64, heading: f64) -> ([f64; 3], [f64; 3]) {
        let (sin_h, cos_h) = heading.sin_cos();

        let position = [x - self.back * sin_h, y + self.up, z - self.back * cos_h];
        let look_at = [
            x + self.look_ahead * sin_h,
            y + self.look_up,
            z + self.look_ahead * cos_h,
        ];

        (position, look_at)
    }

    /// update blends the smoothed pose toward the desired pose with factor 1 - e^(-stiffness*dt),
    /// applied independently to position and look-at.
    pub fn update(&mut self, x: f64, y: f64, z: f64, heading: f64, dt: f64) {
        let (desired_pos, desired_look) = self.desired(x, y, z, heading);

        match &mut self.smoothed {
            None => self.smoothed = Some((desired_pos, desired_look)),
            Some((position, look_at)) => {
                let blend = 1.0 - (-self.stiffness * dt).exp();
                for i in 0..3 {
                    position[i] += (desired_pos[i] - position[i]) * blend;
                    look_at[i] += (desired_look[i] - look_at[i]) * blend;
                }
            }
        }
    }

    /// pose returns the smoothed (position, look_at) pair, or None before the first update.
    pub fn pose(&self) -> Option<([f64; 3], [f64; 3])> {
        self.smoothed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f64::consts::FRAC_PI_2;

    fn test_camera_pars() -> CameraPars {
        CameraPars {
            back: 9.0,
            up: 4.5,
            look_ahead: 6.0,
            look_up: 1.5,
            stiffness: 5.0,
        }
    }

    #[test]
    fn test_first_update_snaps_to_desired_pose() {
        let mut camera = ChaseCamera::new(&test_camera_pars());
        assert!(camera.pose().is_none());

        // heading +x: the camera sits back along -x
        camera.update(10.0, 0.0, -5.0, FRAC_PI_2, 1.0 / 60.0);

        let (position, look_at) = camera.pose().unwrap();
        assert_relative_eq!(position[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(position[1], 4.5);
        assert_relative_eq!(position[2], -5.0, epsilon = 1e-9);
        assert_relative_eq!(look_at[0], 16.0, epsilon = 1e-9);
        assert_relative_eq!(look_at[1], 1.5);
        assert_relative_eq!(look_at[2], -5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_subsequent_updates_converge_without_jumping() {
        let mut camera = ChaseCamera::new(&test_camera_pars());
        camera.update(0.0, 0.0, 0.0, 0.0, 1.0 / 60.0);

        // teleport the target; the camera must approach, not snap
        camera.update(20.0, 0.0, 0.0, 0.0, 1.0 / 60.0);
        let (position, _) = camera.pose().unwrap();
        let (desired_pos, _) = camera.desired(20.0, 0.0, 0.0, 0.0);

        let err_first = (desired_pos[0] - position[0]).abs();
        assert!(err_first > 1e-6, "Camera must not snap after the first update!");
        assert!(err_first < 20.0);

        // repeated updates monotonically shrink the error
        let mut err_prev = err_first;
        for _ in 0..120 {
            camera.update(20.0, 0.0, 0.0, 0.0, 1.0 / 60.0);
            let (position, _) = camera.pose().unwrap();
            let err = (desired_pos[0] - position[0]).abs();
            assert!(err < err_prev);
            err_prev = err;
        }
        assert!(err_prev < 0.05);
    }

    #[test]
    fn test_reset_snaps_again() {
        let mut camera = ChaseCamera::new(&test_camera_pars());
        camera.update(0.0, 0.0, 0.0, 0.0, 1.0 / 60.0);
        camera.reset();
        camera.update(50.0, 0.0, 0.0, 0.0, 1.0 / 60.0);

        let (position, _) = camera.pose().unwrap();
        let (desired_pos, _) = camera.desired(50.0, 0.0, 0.0, 0.0);
        assert_relative_eq!(position[0], desired_pos[0]);
    }
}
