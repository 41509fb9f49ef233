use crate::core::scoring::ScoreBoard;
use crate::core::vehicle::Vehicle;

// Display thresholds of the speed readout color bands.
const BAND_MID_KMH: f64 = 60.0;
const BAND_HIGH_KMH: f64 = 110.0;
// How long a jump bonus popup stays on screen.
const POPUP_DURATION: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeedBand {
    Low,
    Mid,
    High,
}

impl Default for SpeedBand {
    fn default() -> Self {
        SpeedBand::Low
    }
}

/// speed_band maps a km/h readout to its display band.
pub fn speed_band(speed_kmh: f64) -> SpeedBand {
    if speed_kmh >= BAND_HIGH_KMH {
        SpeedBand::High
    } else if speed_kmh >= BAND_MID_KMH {
        SpeedBand::Mid
    } else {
        SpeedBand::Low
    }
}

/// format_laptime renders a duration as `M:SS.ss`.
pub fn format_laptime(seconds: f64) -> String {
    let total_cs = (seconds.max(0.0) * 100.0).round() as u64;
    let minutes = total_cs / 6000;
    let secs = (total_cs % 6000) / 100;
    let centis = total_cs % 100;
    format!("{}:{:02}.{:02}", minutes, secs, centis)
}

#[derive(Debug, Clone, Copy)]
pub struct JumpPopup {
    pub points: u64,
    pub remaining: f64,
}

/// HudModel is the per-frame view model read by the front end. It is a one-way projection of
/// vehicle and lap state and makes no game-logic decisions of its own; the only state it keeps is
/// the popup countdown.
#[derive(Debug, Clone, Default)]
pub struct HudModel {
    pub speed_kmh: f64,
    pub band: SpeedBand,
    pub score: u64,
    pub current_lap: u32,
    pub current_lap_time: f64,
    pub best_lap_time: Option<f64>,
    pub crash_visible: bool,
    pub jump_popup: Option<JumpPopup>,
}

impl HudModel {
    pub fn new() -> HudModel {
        HudModel::default()
    }

    /// clear drops transient display state (popup) after a session reset.
    pub fn clear(&mut self) {
        self.jump_popup = None;
    }

    /// show_jump_bonus (re)starts the popup. A pending countdown is restarted, never stacked.
    pub fn show_jump_bonus(&mut self, points: u64) {
        self.jump_popup = Some(JumpPopup {
            points,
            remaining: POPUP_DURATION,
        });
    }

    /// refresh pulls the displayable state for this frame and advances the popup countdown.
    pub fn refresh(&mut self, vehicle: &Vehicle, scores: &ScoreBoard, now: f64, dt: f64) {
        self.speed_kmh = vehicle.speed_kmh();
        self.band = speed_band(self.speed_kmh);
        self.score = scores.score();
        self.current_lap = scores.current_lap();
        self.current_lap_time = scores.current_lap_time(now);
        self.best_lap_time = scores.best_lap_time();
        self.crash_visible = scores.is_broken();

        if let Some(popup) = &mut self.jump_popup {
            popup.remaining -= dt;
            if popup.remaining <= 0.0 {
                self.jump_popup = None;
            }
        }
    }

    /// lap_line renders the lap readout.
    pub fn lap_line(&self) -> String {
        format!("Lap {}", self.current_lap)
    }

    /// time_line renders current and best lap time.
    pub fn time_line(&self) -> String {
        match self.best_lap_time {
            Some(best) => format!(
                "{}  (best {})",
                format_laptime(self.current_lap_time),
                format_laptime(best)
            ),
            None => format_laptime(self.current_lap_time),
        }
    }
}
