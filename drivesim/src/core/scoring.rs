use serde::Deserialize;

/// * `lap_bonus` - Points awarded per completed lap
/// * `start_window` - (m) Half width of the start-line crossing window along z
/// * `rearm_distance` - (m) Distance from the line (|x|) that re-arms the crossing gate
/// * `jump_min_airtime` - (s) Airtime below or at which a jump scores nothing
/// * `jump_airtime_step` - (s) Airtime granularity of the jump bonus
/// * `jump_points_per_step` - Points per full airtime step
#[derive(Debug, Deserialize, Clone)]
pub struct ScoringPars {
    pub lap_bonus: u64,
    pub start_window: f64,
    pub rearm_distance: f64,
    pub jump_min_airtime: f64,
    pub jump_airtime_step: f64,
    pub jump_points_per_step: u64,
}

/// StartGate is the start-line debounce state machine:
/// Armed --(forward crossing inside the window)--> Crossed (lap counted),
/// Crossed --(|x| > rearm_distance)--> Armed.
/// The gate starts out Crossed because the car spawns on the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartGate {
    Armed,
    Crossed,
}

/// ScoreBoard tracks lap progress, jump bonuses and the crash state of one session. All times are
/// simulation-clock seconds. The score is monotonic; only `reset` clears it.
#[derive(Debug)]
pub struct ScoreBoard {
    // parameters
    lap_bonus: u64,
    start_window: f64,
    rearm_distance: f64,
    jump_min_airtime: f64,
    jump_airtime_step: f64,
    jump_points_per_step: u64,
    start_line_z: f64,
    // state
    score: u64,
    current_lap: u32,
    lap_times: Vec<f64>,
    best_lap_time: Option<f64>,
    lap_start_time: f64,
    gate: StartGate,
    broken: bool,
    jump_started_at: Option<f64>,
    last_jump_points: u64,
}

impl ScoreBoard {
    pub fn new(scoring_pars: &ScoringPars, start_line_z: f64) -> ScoreBoard {
        ScoreBoard {
            lap_bonus: scoring_pars.lap_bonus,
            start_window: scoring_pars.start_window,
            rearm_distance: scoring_pars.rearm_distance,
            jump_min_airtime: scoring_pars.jump_min_airtime,
            jump_airtime_step: scoring_pars.jump_airtime_step,
            jump_points_per_step: scoring_pars.jump_points_per_step,
            start_line_z,
            score: 0,
            current_lap: 1,
            lap_times: Vec::new(),
            best_lap_time: None,
            lap_start_time: 0.0,
            gate: StartGate::Crossed,
            broken: false,
            jump_started_at: None,
            last_jump_points: 0,
        }
    }

    /// reset restores the initial state: score 0, lap 1, empty history, no best time, gate
    /// disarmed (the car respawns on the line), not broken, no jump pending.
    pub fn reset(&mut self, now: f64) {
        self.score = 0;
        self.current_lap = 1;
        self.lap_times.clear();
        self.best_lap_time = None;
        self.lap_start_time = now;
        self.gate = StartGate::Crossed;
        self.broken = false;
        self.jump_started_at = None;
        self.last_jump_points = 0;
    }

    /// check_start_line advances the crossing gate from the vehicle's x movement this frame and
    /// returns the completed lap time when a debounced forward crossing is counted.
    pub fn check_start_line(&mut self, prev_x: f64, x: f64, z: f64, now: f64) -> Option<f64> {
        match self.gate {
            StartGate::Crossed => {
                if x.abs() > self.rearm_distance {
                    self.gate = StartGate::Armed;
                }
                None
            }
            StartGate::Armed => {
                let in_window = (z - self.start_line_z).abs() <= self.start_window;
                if in_window && prev_x > 0.0 && x <= 0.0 {
                    let lap_time = now - self.lap_start_time;
                    self.lap_times.push(lap_time);

                    if self.best_lap_time.map_or(true, |best| lap_time < best) {
                        self.best_lap_time = Some(lap_time);
                    }

                    self.score += self.lap_bonus;
                    self.current_lap += 1;
                    self.lap_start_time = now;
                    self.gate = StartGate::Crossed;
                    Some(lap_time)
                } else {
                    None
                }
            }
        }
    }

    /// begin_jump stamps the takeoff time.
    pub fn begin_jump(&mut self, now: f64) {
        if self.jump_started_at.is_some() {
            panic!("Tried to begin a jump while one is already in progress!")
        }
        self.jump_started_at = Some(now);
    }

    /// end_jump scores the landing: airtime above the threshold awards points in whole airtime
    /// steps, shorter hops score nothing. Returns the awarded points.
    pub fn end_jump(&mut self, now: f64) -> u64 {
        let started_at = self
            .jump_started_at
            .take()
            .expect("Tried to end a jump that never began!");

        let airtime = now - started_at;
        let points = if airtime > self.jump_min_airtime {
            (airtime / self.jump_airtime_step).floor() as u64 * self.jump_points_per_step
        } else {
            0
        };

        self.score += points;
        self.last_jump_points = points;
        points
    }

    pub fn record_crash(&mut self) {
        self.broken = true;
    }

    pub fn is_broken(&self) -> bool {
        self.broken
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lap_bonus(&self) -> u64 {
        self.lap_bonus
    }

    pub fn current_lap(&self) -> u32 {
        self.current_lap
    }

    pub fn lap_times(&self) -> &[f64] {
        &self.lap_times
    }

    pub fn best_lap_time(&self) -> Option<f64> {
        self.best_lap_time
    }

    pub fn current_lap_time(&self, now: f64) -> f64 {
        now - self.lap_start_time
    }

    pub fn last_jump_points(&self) -> u64 {
        self.last_jump_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_scoring_pars() -> ScoringPars {
        ScoringPars {
            lap_bonus: 100,
            start_window: 6.0,
            rearm_distance: 10.0,
            jump_min_airtime: 0.2,
            jump_airtime_step: 0.1,
            jump_points_per_step: 10,
        }
    }

    fn armed_board() -> ScoreBoard {
        let mut board = ScoreBoard::new(&test_scoring_pars(), -90.0);
        // drive away from the line to arm the gate
        board.check_start_line(-12.0, -12.0, -90.0, 1.0);
        assert_eq!(board.gate, StartGate::Armed);
        board
    }

    #[test]
    fn test_crossing_counts_one_lap() {
        let mut board = armed_board();

        let lap_time = board.check_start_line(0.5, -0.5, -91.0, 62.0);
        assert!(lap_time.is_some());
        assert_relative_eq!(lap_time.unwrap(), 62.0);
        assert_eq!(board.current_lap(), 2);
        assert_eq!(board.score(), 100);
        assert_eq!(board.lap_times().len(), 1);
    }

    #[test]
    fn test_double_crossing_is_debounced() {
        let mut board = armed_board();

        assert!(board.check_start_line(0.5, -0.5, -90.0, 60.0).is_some());
        // jitter back and forth on the line without leaving the rearm distance
        assert!(board.check_start_line(-0.5, 0.5, -90.0, 60.1).is_none());
        assert!(board.check_start_line(0.5, -0.5, -90.0, 60.2).is_none());
        assert_eq!(board.current_lap(), 2);
        assert_eq!(board.lap_times().len(), 1);

        // after re-arming, the next forward crossing counts again
        assert!(board.check_start_line(-12.0, -12.0, -90.0, 80.0).is_none());
        assert!(board.check_start_line(0.5, -0.5, -90.0, 120.0).is_some());
        assert_eq!(board.current_lap(), 3);
    }

    #[test]
    fn test_crossing_outside_window_is_ignored() {
        let mut board = armed_board();

        // x sign change far away from the line's z coordinate
        assert!(board.check_start_line(0.5, -0.5, -70.0, 60.0).is_none());
        assert_eq!(board.current_lap(), 1);
    }

    #[test]
    fn test_backward_crossing_is_ignored() {
        let mut board = armed_board();

        assert!(board.check_start_line(-0.5, 0.5, -90.0, 60.0).is_none());
        assert_eq!(board.current_lap(), 1);
    }

    #[test]
    fn test_best_lap_never_worsens() {
        let mut board = armed_board();

        board.check_start_line(0.5, -0.5, -90.0, 60.0);
        board.check_start_line(-12.0, -12.0, -90.0, 80.0);
        board.check_start_line(0.5, -0.5, -90.0, 115.0); // 55 s lap, new best
        board.check_start_line(-12.0, -12.0, -90.0, 130.0);
        board.check_start_line(0.5, -0.5, -90.0, 173.0); // 58 s lap, not a best

        assert_eq!(board.lap_times().len(), 3);
        assert_relative_eq!(board.best_lap_time().unwrap(), 55.0);
        assert_eq!(board.score(), 300);
    }

    #[test]
    fn test_jump_scoring_thresholds() {
        let mut board = ScoreBoard::new(&test_scoring_pars(), -90.0);

        // 250 ms of airtime: two full steps
        board.begin_jump(10.0);
        assert_eq!(board.end_jump(10.25), 20);
        assert_eq!(board.score(), 20);

        // 150 ms is below the threshold
        board.begin_jump(20.0);
        assert_eq!(board.end_jump(20.15), 0);
        assert_eq!(board.score(), 20);
        assert_eq!(board.last_jump_points(), 0);
    }

    #[test]
    #[should_panic(expected = "never began")]
    fn test_end_jump_without_takeoff_panics() {
        let mut board = ScoreBoard::new(&test_scoring_pars(), -90.0);
        board.end_jump(1.0);
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let mut board = armed_board();
        board.check_start_line(0.5, -0.5, -90.0, 60.0);
        board.begin_jump(61.0);
        board.end_jump(61.5);
        board.record_crash();

        board.reset(100.0);

        assert_eq!(board.score(), 0);
        assert_eq!(board.current_lap(), 1);
        assert!(board.lap_times().is_empty());
        assert!(board.best_lap_time().is_none());
        assert!(!board.is_broken());
        assert_eq!(board.gate, StartGate::Crossed);
        assert_relative_eq!(board.current_lap_time(100.0), 0.0);
    }

    #[test]
    fn test_score_is_monotonic() {
        let mut board = armed_board();
        let mut score_prev = board.score();

        board.check_start_line(0.5, -0.5, -90.0, 60.0);
        assert!(board.score() >= score_prev);
        score_prev = board.score();

        board.begin_jump(61.0);
        board.end_jump(61.05); // too short, no points
        assert!(board.score() >= score_prev);
    }
}
