use crate::core::hud::format_laptime;
use helpers::general::{argsort, SortOrder};
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io::Write as IoWrite;

/// SessionEvent records one noteworthy moment of a session for post-processing and plotting.
/// `kind` is one of "LapComplete", "JumpBonus", "Crash", "Restart".
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionEvent {
    pub kind: String,
    pub lap: u32,
    pub time_s: f64,
    pub points: u64,
}

/// DriveResult contains all session information that is required for post-processing the results.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DriveResult {
    pub laps_completed: u32,
    pub lap_times: Vec<f64>,
    pub best_lap_time: Option<f64>,
    pub score: u64,
    pub top_speed_kmh: f64,
    pub events: Vec<SessionEvent>,
    pub speed_trace: Vec<[f64; 2]>,
}

impl DriveResult {
    fn format_summary(&self) -> String {
        let mut content = String::new();

        writeln!(&mut content, "RESULT: Session summary").unwrap();
        writeln!(
            &mut content,
            "score: {}, laps completed: {}, top speed: {:.1} km/h",
            self.score, self.laps_completed, self.top_speed_kmh
        )
        .unwrap();
        match self.best_lap_time {
            Some(best) => writeln!(&mut content, "best lap: {}", format_laptime(best)).unwrap(),
            None => writeln!(&mut content, "best lap: -").unwrap(),
        }

        if !self.lap_times.is_empty() {
            writeln!(&mut content, "RESULT: Lap times").unwrap();
            for (i, lap_time) in self.lap_times.iter().enumerate() {
                writeln!(&mut content, "{:3}, {}", i + 1, format_laptime(*lap_time)).unwrap();
            }

            writeln!(&mut content, "RESULT: Lap ranking").unwrap();
            for (rank, &idx) in argsort(&self.lap_times, SortOrder::Ascending)
                .iter()
                .enumerate()
            {
                writeln!(
                    &mut content,
                    "{:3}, lap {:3}, {}",
                    rank + 1,
                    idx + 1,
                    format_laptime(self.lap_times[idx])
                )
                .unwrap();
            }
        }

        if !self.events.is_empty() {
            writeln!(&mut content, "RESULT: Events").unwrap();
            for event in self.events.iter() {
                if event.points > 0 {
                    writeln!(
                        &mut content,
                        "{:12} lap {:3}, t={:8.3}s, +{} points",
                        event.kind, event.lap, event.time_s, event.points
                    )
                    .unwrap();
                } else {
                    writeln!(
                        &mut content,
                        "{:12} lap {:3}, t={:8.3}s",
                        event.kind, event.lap, event.time_s
                    )
                    .unwrap();
                }
            }
        }

        content
    }

    /// print_summary prints the session summary to the console output.
    pub fn print_summary(&self) {
        print!("{}", self.format_summary());
    }

    /// write_summary_to_file writes the session summary to a text file in output/. Returns the
    /// path to the written file.
    pub fn write_summary_to_file(
        &self,
        path: Option<&std::path::Path>,
    ) -> anyhow::Result<String> {
        let out_dir = std::path::Path::new("output");
        std::fs::create_dir_all(out_dir)?;
        let out_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            out_dir.join("last_session.txt")
        };

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .truncate(true)
            .write(true)
            .open(&out_path)?;
        file.write_all(self.format_summary().as_bytes())?;
        file.flush()?;

        Ok(out_path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_contains_ranking_and_events() {
        let result = DriveResult {
            laps_completed: 2,
            lap_times: vec![61.2, 58.7],
            best_lap_time: Some(58.7),
            score: 220,
            top_speed_kmh: 131.0,
            events: vec![SessionEvent {
                kind: String::from("JumpBonus"),
                lap: 1,
                time_s: 12.5,
                points: 20,
            }],
            speed_trace: vec![[0.0, 0.0], [0.1, 3.1]],
        };

        let summary = result.format_summary();
        assert!(summary.contains("score: 220"));
        assert!(summary.contains("best lap: 0:58.70"));
        // fastest lap ranked first
        assert!(summary.contains("  1, lap   2, 0:58.70"));
        assert!(summary.contains("JumpBonus"));
    }

    #[test]
    fn test_serde_round_trip() {
        let result = DriveResult {
            laps_completed: 0,
            lap_times: vec![],
            best_lap_time: None,
            score: 0,
            top_speed_kmh: 0.0,
            events: vec![],
            speed_trace: vec![],
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: DriveResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.laps_completed, 0);
        assert!(back.best_lap_time.is_none());
    }
}
