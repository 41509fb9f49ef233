use crate::core::scene::Scene;
use crate::interfaces::drivesim_interface::DrivesimInterface;
use drivesim::core::hud::SpeedBand;
use drivesim::core::input::InputState;
use drivesim::core::track::to_local_frame;
use drivesim::interfaces::gui_interface::GameState;
use drivesim::pre::read_sim_pars::SimPars;
use eframe::{egui, epi};
use flume::{Receiver, Sender};
use helpers::buffer::RingBuffer;
use plotters::prelude::*;
use std::fmt::Write;
use std::time::Instant;

// Meters of world depth mapped onto the viewport height.
const VIEW_DEPTH: f64 = 110.0;

/// ViewTransform maps world coordinates into viewport pixels: the view is centered behind the
/// chase camera and rotated so the camera's look direction points up the screen.
struct ViewTransform {
    cam_x: f64,
    cam_z: f64,
    yaw: f64,
    scale: f64,
    center: egui::Pos2,
}

impl ViewTransform {
    fn apply(&self, x: f64, z: f64) -> egui::Pos2 {
        let (local_x, local_z) = to_local_frame(x - self.cam_x, z - self.cam_z, self.yaw);
        egui::Pos2 {
            x: self.center.x + (local_x * self.scale) as f32,
            y: self.center.y - (local_z * self.scale) as f32,
        }
    }
}

#[derive(Debug)]
pub struct GamePlot {
    pub drivesim_interface: DrivesimInterface,
    pub scene: Scene,
    pub vehicle_half_extent: f64,
    pub prev_update: Instant,
    pub prev_update_durations: RingBuffer<u32>,
    pub export_done: bool,
    pub export_path: Option<String>,
}

impl GamePlot {
    pub fn new(
        rx: Receiver<GameState>,
        tx_input: Sender<InputState>,
        sim_pars: &SimPars,
    ) -> GamePlot {
        // set up interface
        let drivesim_interface = DrivesimInterface {
            rx,
            tx_input,
            game_state: Default::default(),
        };

        // precompute the static track geometry
        let scene = Scene::from_track_pars(&sim_pars.track_pars);

        GamePlot {
            drivesim_interface,
            scene,
            vehicle_half_extent: sim_pars.vehicle_pars.half_extent,
            prev_update: Instant::now(),
            prev_update_durations: RingBuffer::new(10),
            export_done: false,
            export_path: None,
        }
    }

    fn export_results_plot(
        &self,
        result: &drivesim::post::drive_result::DriveResult,
    ) -> anyhow::Result<String> {
        // Prepare output path
        let out_dir = std::path::Path::new("output");
        std::fs::create_dir_all(out_dir)?;
        let ts = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_secs();
        let filename = format!("session_plot_{}.png", ts);
        let out_path = out_dir.join(filename);

        // Gather y-range over the lap times
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for lap_time in result.lap_times.iter() {
            if lap_time.is_finite() && *lap_time > 0.0 {
                if *lap_time < y_min {
                    y_min = *lap_time;
                }
                if *lap_time > y_max {
                    y_max = *lap_time;
                }
            }
        }
        if !y_min.is_finite() || !y_max.is_finite() {
            y_min = 0.0;
            y_max = 1.0;
        }
        let margin = ((y_max - y_min) * 0.05).max(0.5);
        y_min -= margin;
        y_max += margin;

        let x_max = (result.lap_times.len() as u32).max(2);

        let root = BitMapBackend::new(out_path.to_str().unwrap(), (1280, 720)).into_drawing_area();
        root.fill(&WHITE)?;
        let mut chart = ChartBuilder::on(&root)
            .caption("Lap times", ("sans-serif", 24).into_font())
            .margin(20)
            .x_label_area_size(40)
            .y_label_area_size(60)
            .build_cartesian_2d(1u32..x_max, y_min..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Lap")
            .y_desc("s")
            .label_style(("sans-serif", 16))
            .axis_desc_style(("sans-serif", 16))
            .draw()?;

        let series: Vec<(u32, f64)> = result
            .lap_times
            .iter()
            .enumerate()
            .map(|(i, lap_time)| (i as u32 + 1, *lap_time))
            .collect();
        chart
            .draw_series(LineSeries::new(series.into_iter(), &BLUE))?
            .label("lap time")
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

        // Event markers: crashes red, jump bonuses green
        for event in result.events.iter() {
            let x = event.lap.min(x_max);
            let (color, width) = match event.kind.as_str() {
                "Crash" => (RED, 2),
                "JumpBonus" => (GREEN, 1),
                _ => (BLACK, 1),
            };
            chart.draw_series(std::iter::once(PathElement::new(
                vec![(x, y_min), (x, y_max)],
                color.stroke_width(width),
            )))?;
        }

        chart
            .configure_series_labels()
            .border_style(&BLACK)
            .background_style(&WHITE.mix(0.8))
            .label_font(("sans-serif", 16))
            .position(plotters::chart::SeriesLabelPosition::UpperRight)
            .draw()?;

        root.present()?;
        Ok(out_path.to_string_lossy().into_owned())
    }

    pub fn set_ui_content(&mut self, ui: &mut egui::Ui) -> egui::Response {
        // PREPARATIONS ----------------------------------------------------------------------------
        // get UI handles
        let (response, painter) =
            ui.allocate_painter(ui.available_size_before_wrap_finite(), egui::Sense::drag());

        let game_state = &self.drivesim_interface.game_state;

        // chase-camera driven view: centered behind the camera, look direction up the screen
        let cam = &game_state.camera;
        let look_dx = cam.look_at[0] - cam.position[0];
        let look_dz = cam.look_at[2] - cam.position[2];
        let yaw = look_dx.atan2(look_dz);

        let to_screen = ViewTransform {
            cam_x: cam.position[0],
            cam_z: cam.position[2],
            yaw,
            scale: response.rect.height() as f64 / VIEW_DEPTH,
            center: egui::Pos2 {
                x: response.rect.center().x,
                y: response.rect.center().y + response.rect.height() * 0.25,
            },
        };

        // create vector for drawn shapes
        let mut shapes = vec![];

        // TRACK DRAWING ---------------------------------------------------------------------------
        // track edge rings
        for ring in [&self.scene.inner_ring, &self.scene.outer_ring].iter() {
            let points: Vec<egui::Pos2> = ring
                .iter()
                .map(|&(x, z)| to_screen.apply(x, z))
                .collect();
            shapes.push(egui::Shape::line(
                points,
                egui::Stroke::new(2.0, egui::Color32::WHITE),
            ));
        }

        // start line
        shapes.push(egui::Shape::line_segment(
            [
                to_screen.apply(self.scene.start_line[0].0, self.scene.start_line[0].1),
                to_screen.apply(self.scene.start_line[1].0, self.scene.start_line[1].1),
            ],
            egui::Stroke::new(4.0, egui::Color32::from_rgb(230, 230, 230)),
        ));

        // walls
        for wall in self.scene.walls.iter() {
            let points: Vec<egui::Pos2> = wall
                .iter()
                .map(|&(x, z)| to_screen.apply(x, z))
                .collect();
            shapes.push(egui::Shape::line(
                points,
                egui::Stroke::new(3.0, egui::Color32::from_rgb(200, 80, 80)),
            ));
        }

        // ramps
        for ramp in self.scene.ramps.iter() {
            let points: Vec<egui::Pos2> = ramp
                .iter()
                .map(|&(x, z)| to_screen.apply(x, z))
                .collect();
            shapes.push(egui::Shape::line(
                points,
                egui::Stroke::new(3.0, egui::Color32::from_rgb(120, 160, 255)),
            ));
        }

        // rocks
        for &(x, z, radius) in self.scene.rocks.iter() {
            shapes.push(egui::Shape::circle_filled(
                to_screen.apply(x, z),
                (radius * to_screen.scale) as f32,
                egui::Color32::from_gray(120),
            ));
        }

        // posts (dynamic: knocked ones lie tinted on the ground)
        for post in game_state.posts.iter() {
            let color = if post.knocked {
                egui::Color32::from_gray(90)
            } else {
                egui::Color32::from_rgb(255, 140, 0)
            };
            shapes.push(egui::Shape::circle_filled(
                to_screen.apply(post.x, post.z),
                (0.6 * to_screen.scale) as f32,
                color,
            ));
        }

        // VEHICLE DRAWING -------------------------------------------------------------------------
        let vehicle = &game_state.vehicle;
        let vehicle_pos = to_screen.apply(vehicle.x, vehicle.z);

        // airborne cars cast a separate shadow ring while the body scales up slightly
        if vehicle.airborne {
            shapes.push(egui::Shape::circle_filled(
                vehicle_pos,
                (self.vehicle_half_extent * to_screen.scale) as f32,
                egui::Color32::from_black_alpha(100),
            ));
        }

        let body_scale = 1.0 + vehicle.y * 0.05;
        shapes.push(egui::Shape::circle_filled(
            vehicle_pos,
            (self.vehicle_half_extent * to_screen.scale * body_scale) as f32,
            egui::Color32::from_rgb(vehicle.color.r, vehicle.color.g, vehicle.color.b),
        ));

        // heading tick
        let nose = to_screen.apply(
            vehicle.x + 3.0 * vehicle.heading.sin(),
            vehicle.z + 3.0 * vehicle.heading.cos(),
        );
        shapes.push(egui::Shape::line_segment(
            [vehicle_pos, nose],
            egui::Stroke::new(2.0, egui::Color32::WHITE),
        ));

        // HUD DRAWING -----------------------------------------------------------------------------
        let hud = &game_state.hud;

        let speed_color = match hud.band {
            SpeedBand::Low => egui::Color32::WHITE,
            SpeedBand::Mid => egui::Color32::YELLOW,
            SpeedBand::High => egui::Color32::RED,
        };
        shapes.push(egui::Shape::text(
            ui.fonts(),
            egui::Pos2 {
                x: response.rect.min.x + 10.0,
                y: response.rect.min.y + 10.0,
            },
            egui::Align2::LEFT_TOP,
            format!("{:3.0} km/h", hud.speed_kmh),
            egui::TextStyle::Heading,
            speed_color,
        ));

        let mut info_text = String::new();
        writeln!(&mut info_text, "Score: {}", hud.score).unwrap();
        writeln!(&mut info_text, "{}", hud.lap_line()).unwrap();
        writeln!(&mut info_text, "{}", hud.time_line()).unwrap();
        if let Some(avg) = self.prev_update_durations.get_avg() {
            if avg > 0.0 {
                writeln!(&mut info_text, "GUI update frequency: {:.0} Hz", 1000.0 / avg).unwrap();
            }
        }
        shapes.push(egui::Shape::text(
            ui.fonts(),
            egui::Pos2 {
                x: response.rect.min.x + 10.0,
                y: response.rect.min.y + 44.0,
            },
            egui::Align2::LEFT_TOP,
            &info_text,
            egui::TextStyle::Body,
            egui::Color32::WHITE,
        ));

        // transient jump bonus popup
        if let Some(popup) = &hud.jump_popup {
            let alpha = (popup.remaining / 1.5).clamp(0.2, 1.0);
            shapes.push(egui::Shape::text(
                ui.fonts(),
                egui::Pos2 {
                    x: response.rect.center().x,
                    y: response.rect.min.y + response.rect.height() * 0.25,
                },
                egui::Align2::CENTER_CENTER,
                format!("JUMP BONUS +{}", popup.points),
                egui::TextStyle::Heading,
                egui::Color32::from_rgba_unmultiplied(120, 255, 120, (alpha * 255.0) as u8),
            ));
        }

        // crash overlay
        if hud.crash_visible {
            shapes.push(egui::Shape::rect_filled(
                response.rect,
                0.0,
                egui::Color32::from_black_alpha(160),
            ));
            shapes.push(egui::Shape::text(
                ui.fonts(),
                response.rect.center(),
                egui::Align2::CENTER_CENTER,
                "WRECKED - press R to restart",
                egui::TextStyle::Heading,
                egui::Color32::RED,
            ));
        }

        // calculate current UI update duration, append it to the buffer, and set update time
        self.prev_update_durations
            .push(self.prev_update.elapsed().as_millis() as u32);
        self.prev_update = Instant::now();

        // DRAWING ---------------------------------------------------------------------------------
        // update shapes in UI painter and return response
        painter.extend(shapes);
        response
    }
}

/// read_input polls the held keys into the simulation's input flags.
fn read_input(ctx: &egui::CtxRef) -> InputState {
    let input = ctx.input();
    InputState {
        accelerate: input.key_down(egui::Key::ArrowUp) || input.key_down(egui::Key::W),
        brake: input.key_down(egui::Key::ArrowDown) || input.key_down(egui::Key::S),
        steer_left: input.key_down(egui::Key::ArrowLeft) || input.key_down(egui::Key::A),
        steer_right: input.key_down(egui::Key::ArrowRight) || input.key_down(egui::Key::D),
        restart: input.key_down(egui::Key::R),
    }
}

impl epi::App for GamePlot {
    /// Called each time the UI needs repainting, which may be many times per second.
    fn update(&mut self, ctx: &egui::CtxRef, _frame: &mut epi::Frame) {
        // forward the polled input flags to the simulation thread
        self.drivesim_interface.send_input(read_input(ctx));

        // update game interface
        self.drivesim_interface.update();

        // If we have final results, export to PNG once and show the summary screen
        if let Some(result) = &self.drivesim_interface.game_state.final_result {
            if !self.export_done {
                match self.export_results_plot(result) {
                    Ok(path) => {
                        self.export_done = true;
                        self.export_path = Some(path);
                    }
                    Err(err) => {
                        self.export_done = true;
                        self.export_path = Some(format!("Failed to export plot: {}", err));
                    }
                }
            }
            let score = result.score;
            let laps_completed = result.laps_completed;
            egui::CentralPanel::default().show(ctx, |ui| {
                egui::Frame::dark_canvas(ui.style()).show(ui, |ui| {
                    ui.heading("Session over");
                    ui.label(format!("Score: {}", score));
                    ui.label(format!("Laps completed: {}", laps_completed));
                    if let Some(path) = &self.export_path {
                        ui.label(format!("Lap plot: {}", path));
                    }
                });
            });
        } else {
            // update UI content (live view)
            egui::CentralPanel::default().show(ctx, |ui| {
                let frame = egui::Frame::dark_canvas(ui.style());
                frame.show(ui, |ui| {
                    self.set_ui_content(ui);
                });
            });
        }

        // request repaint of the UI
        ctx.request_repaint();
    }

    fn name(&self) -> &str {
        "Drive View"
    }
}
