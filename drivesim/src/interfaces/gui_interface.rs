use crate::core::hud::HudModel;
use crate::post::drive_result::DriveResult;

pub const MAX_GUI_UPDATE_FREQUENCY: f64 = 60.0;

#[derive(Debug, Clone, Copy, Default)]
pub struct RgbColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Default)]
pub struct VehicleView {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub heading: f64,
    pub speed_kmh: f64,
    pub airborne: bool,
    pub color: RgbColor,
}

#[derive(Debug, Clone, Default)]
pub struct CameraView {
    pub position: [f64; 3],
    pub look_at: [f64; 3],
}

/// PostView mirrors the mutable part of the post obstacles (they move when knocked over).
#[derive(Debug, Clone, Default)]
pub struct PostView {
    pub x: f64,
    pub z: f64,
    pub knocked: bool,
    pub yaw: f64,
}

#[derive(Debug, Clone, Default)]
pub struct GameState {
    pub vehicle: VehicleView,
    pub camera: CameraView,
    pub hud: HudModel,
    pub posts: Vec<PostView>,

    // final results payload (sent once when the session finishes)
    pub final_result: Option<DriveResult>,
}
