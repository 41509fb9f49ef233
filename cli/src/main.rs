use clap::Parser;
use drivesim::core::handle_game::handle_session;
use drivesim::core::hud::format_laptime;
use drivesim::post::drive_result::DriveResult;
use drivesim::pre::read_sim_pars::{
    default_sim_pars, merge_obstacle_layout, read_obstacle_layout, read_sim_pars,
};
use drivesim::pre::sim_opts::SimOpts;
use gui::core::gui::GamePlot;
use helpers::general::argmin;
use plotters::prelude::*;
use rayon::prelude::*;
use std::thread;
use std::time::Instant;

fn export_speed_plot(result: &DriveResult) -> anyhow::Result<String> {
    let out_dir = std::path::Path::new("output");
    std::fs::create_dir_all(out_dir)?;
    let ts = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_secs();
    let filename = format!("speed_plot_{}.png", ts);
    let out_path = out_dir.join(filename);

    let t_max = result
        .speed_trace
        .last()
        .map(|sample| sample[0])
        .unwrap_or(1.0);
    let v_max = result
        .speed_trace
        .iter()
        .map(|sample| sample[1])
        .fold(1.0f64, f64::max);

    let root = BitMapBackend::new(out_path.to_str().unwrap(), (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption("Speed over session time", ("sans-serif", 24).into_font())
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, 0.0..v_max * 1.1)?;

    chart
        .configure_mesh()
        .x_desc("s")
        .y_desc("km/h")
        .label_style(("sans-serif", 16))
        .axis_desc_style(("sans-serif", 16))
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            result.speed_trace.iter().map(|sample| (sample[0], sample[1])),
            &BLUE,
        ))?
        .label("speed")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    // Event markers
    // Laps: gray, jump bonuses: green, crashes: red
    for event in result.events.iter() {
        let (color, width) = match event.kind.as_str() {
            "Crash" => (RED, 2),
            "JumpBonus" => (GREEN, 1),
            "LapComplete" => (RGBColor(150, 150, 150), 1),
            _ => (BLACK, 1),
        };
        chart.draw_series(std::iter::once(PathElement::new(
            vec![(event.time_s, 0.0), (event.time_s, v_max * 1.1)],
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

fn main() -> anyhow::Result<()> {
    // PRE-PROCESSING ------------------------------------------------------------------------------
    // get simulation options from the command line arguments
    let sim_opts: SimOpts = SimOpts::parse();

    // get simulation parameters
    let mut sim_pars = if let Some(parfile_path) = &sim_opts.parfile_path {
        println!("INFO: Reading simulation parameters from {:?}", parfile_path);
        read_sim_pars(parfile_path)?
    } else {
        println!("INFO: No parameter file provided, using the built-in circuit");
        default_sim_pars()
    };

    // merge an extra obstacle layout if provided
    if let Some(layout_path) = &sim_opts.layout_path {
        println!("INFO: Reading obstacle layout from {:?}", layout_path);
        let entries = read_obstacle_layout(layout_path)?;
        merge_obstacle_layout(&mut sim_pars.track_pars, &entries)?;
    }

    // print session details
    println!(
        "INFO: Simulating track {} with a time step size of {:.4}s",
        sim_pars.track_pars.name, sim_opts.timestep_size
    );

    // EXECUTION -----------------------------------------------------------------------------------
    if !sim_opts.gui {
        // NON-GUI CASE - scripted session(s) without visualization
        let t_start = Instant::now();

        let result = if sim_opts.no_sim_runs <= 1 {
            handle_session(
                &sim_pars,
                sim_opts.timestep_size,
                sim_opts.duration,
                sim_opts.debug,
                None,
                None,
                1.0,
                1.0,
            )?
        } else {
            // sweep the scripted pilot's cruise factor across the runs and keep the best session
            println!(
                "INFO: Running a sweep over {} cruise factors...",
                sim_opts.no_sim_runs
            );

            let results: Vec<(f64, DriveResult)> = (0..sim_opts.no_sim_runs)
                .into_par_iter()
                .map(|i| {
                    let cruise_factor = 0.7 + 0.1 * i as f64;
                    handle_session(
                        &sim_pars,
                        sim_opts.timestep_size,
                        sim_opts.duration,
                        false,
                        None,
                        None,
                        1.0,
                        cruise_factor,
                    )
                    .map(|result| (cruise_factor, result))
                })
                .collect::<Result<Vec<_>, _>>()?;

            let best_times: Vec<f64> = results
                .iter()
                .map(|(_, result)| result.best_lap_time.unwrap_or(f64::INFINITY))
                .collect();

            for (cruise_factor, result) in results.iter() {
                println!(
                    "INFO: cruise factor {:.2} -> best lap {}, score {}",
                    cruise_factor,
                    result
                        .best_lap_time
                        .map(format_laptime)
                        .unwrap_or_else(|| String::from("-")),
                    result.score
                );
            }

            let best_idx = argmin(&best_times);
            let (cruise_factor, result) = results.into_iter().nth(best_idx).unwrap();
            println!("INFO: Best session at cruise factor {:.2}", cruise_factor);
            result
        };

        println!("INFO: Execution time: {}ms", t_start.elapsed().as_millis());

        // print and persist the results
        result.print_summary();
        let summary_path = result.write_summary_to_file(None)?;
        println!("INFO: Summary written to {}", summary_path);

        match export_speed_plot(&result) {
            Ok(path) => println!("INFO: Speed plot written to {}", path),
            Err(err) => eprintln!("WARNING: Failed to export speed plot: {}", err),
        }
    } else {
        // GUI CASE - real-time session with keyboard control
        println!("INFO: Starting GUI session...");

        // state snapshots flow sim -> GUI, input flags flow GUI -> sim
        let (tx, rx) = flume::unbounded();
        let (tx_input, rx_input) = flume::unbounded();

        let sim_opts_thread = sim_opts.clone();
        let sim_pars_thread = sim_pars.clone();

        let _ = thread::spawn(move || {
            handle_session(
                &sim_pars_thread,
                sim_opts_thread.timestep_size,
                sim_opts_thread.duration,
                false,
                Some(&tx),
                Some(&rx_input),
                sim_opts_thread.realtime_factor,
                1.0,
            )
        });

        // run the GUI (must be on the main thread)
        let game_plot = GamePlot::new(rx, tx_input, &sim_pars);
        let native_options = eframe::NativeOptions {
            initial_window_size: Some(eframe::egui::Vec2::new(1280.0, 720.0)),
            ..eframe::NativeOptions::default()
        };
        eframe::run_native(Box::new(game_plot), native_options);
    }

    Ok(())
}
