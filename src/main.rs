use anyhow::Result;
use std::time::{Duration, Instant};
use std::fs::File;
use std::io::Write;
use log::{info, warn, error, debug};

use automata_common::{AutomatonConfig, PmfReport, RunMode, SeriesReport};
use cancer_automata::{pdf, pdf_rolling, AutomatonSimulation, Pmf, RollingSchedule};

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Cancer Automata Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args().nth(1).unwrap_or_else(|| "config.toml".to_string());
    let config = AutomatonConfig::load(&config_path)?;
    debug!("Configuration: {:#?}", config);
    info!("Using {} Rayon threads.", rayon::current_num_threads());

    let start_time = Instant::now();
    match config.run.mode {
        RunMode::Pdf => {
            let pmf = pdf(
                config.grid.size,
                config.grid.initial_cancer,
                config.run.steps,
                config.run.runs,
                config.model.variant,
                &config.params(),
                config.run.seed,
            )?;
            report_pmf(&config, "pdf", config.run.runs, pmf)?;
        }
        RunMode::Rolling => {
            let schedule = RollingSchedule {
                init_steps: config.run.init_steps,
                samples: config.run.samples,
                sample_gap: config.run.sample_gap,
            };
            let pmf = pdf_rolling(
                config.grid.size,
                config.grid.initial_cancer,
                schedule,
                config.run.runs,
                config.model.variant,
                &config.params(),
                config.run.seed,
            )?;
            report_pmf(&config, "rolling", config.run.runs * config.run.samples, pmf)?;
        }
        RunMode::Series => run_series(&config)?,
        RunMode::Display => {
            let mut sim = AutomatonSimulation::new(config.clone())?;
            let delay = Duration::from_millis(config.run.display_delay_ms);
            sim.display(config.run.steps, delay, &mut std::io::stdout().lock())?;
            let counts = sim.record_counts();
            info!(
                "Final counts: normal {} | cancer {} | effector {} | dead {}",
                counts.normal(), counts.cancer(), counts.effector(), counts.dead()
            );
        }
    }

    info!(
        "Simulation finished in {:.3} seconds ({:.3} minutes).",
        start_time.elapsed().as_secs_f64(),
        start_time.elapsed().as_secs_f64() / 60.0
    );
    Ok(())
}

/// Steps a single realization, logging and recording counts after every step.
fn run_series(config: &AutomatonConfig) -> Result<()> {
    let mut sim = AutomatonSimulation::new(config.clone())?;
    let total_steps = config.run.steps;
    let mut previous_print_time = Instant::now();

    sim.record_counts();
    for step in 0..total_steps {
        let step_start_time = Instant::now();
        if let Err(e) = sim.step() {
            error!("Error during step {}: {}", step + 1, e);
            anyhow::bail!("Automaton step failed.");
        }
        let counts = sim.record_counts();

        // Print status periodically
        let is_last_step = step + 1 == total_steps;
        if previous_print_time.elapsed().as_secs_f64() >= 5.0 || is_last_step {
            info!(
                "Step [{}/{}] | Normal: {} | Cancer: {} | Effector: {} | Dead: {} | Step Time: {:6.2} ms",
                step + 1,
                total_steps,
                counts.normal(),
                counts.cancer(),
                counts.effector(),
                counts.dead(),
                step_start_time.elapsed().as_secs_f64() * 1000.0
            );
            previous_print_time = Instant::now();
        }
    }

    if !config.output.save_report {
        info!("Skipping saving the count series as per config (save_report is false).");
        return Ok(());
    }
    let report = SeriesReport {
        grid_size: config.grid.size,
        initial_cancer: config.grid.initial_cancer,
        records: sim.recorded_counts().to_vec(),
    };
    match output_format(config) {
        "csv" => {
            let filename = format!("{}_series.csv", config.output.base_filename);
            let mut writer = csv::Writer::from_path(&filename)?;
            writer.write_record(["step", "normal", "cancer", "effector", "dead"])?;
            for record in &report.records {
                let mut row = vec![record.step.to_string()];
                row.extend(record.counts.iter().map(|c| c.to_string()));
                writer.write_record(&row)?;
            }
            writer.flush()?;
            info!("Count series saved to {}", filename);
        }
        _ => {
            let filename = format!("{}_series.json", config.output.base_filename);
            write_json(&filename, &report)?;
        }
    }
    Ok(())
}

/// Logs a PMF summary and writes it out if requested.
fn report_pmf(config: &AutomatonConfig, estimator: &str, samples: usize, pmf: Pmf) -> Result<()> {
    info!(
        "{} over {} samples: mean cancer cells {:.3}, mode {}, total mass {:.9}",
        estimator, samples, pmf.mean(), pmf.mode(), pmf.total()
    );

    if !config.output.save_report {
        info!("Skipping saving the distribution as per config (save_report is false).");
        return Ok(());
    }
    let report = PmfReport {
        estimator: estimator.to_string(),
        grid_size: config.grid.size,
        initial_cancer: config.grid.initial_cancer,
        runs: config.run.runs,
        samples,
        mean: pmf.mean(),
        mode: pmf.mode(),
        probabilities: pmf.into_probabilities(),
    };
    match output_format(config) {
        "csv" => {
            let filename = format!("{}_{}.csv", config.output.base_filename, estimator);
            let mut writer = csv::Writer::from_path(&filename)?;
            writer.write_record(["cancer_cells", "probability"])?;
            for (k, p) in report.probabilities.iter().enumerate() {
                writer.write_record(&[k.to_string(), format!("{:.12}", p)])?;
            }
            writer.flush()?;
            info!("Distribution saved to {}", filename);
        }
        _ => {
            let filename = format!("{}_{}.json", config.output.base_filename, estimator);
            write_json(&filename, &report)?;
        }
    }
    Ok(())
}

fn output_format(config: &AutomatonConfig) -> &str {
    match config.output.format.as_deref().unwrap_or("json") {
        format @ ("json" | "csv") => format,
        other => {
            warn!("Unknown output format: {}. Using JSON instead.", other);
            "json"
        }
    }
}

fn write_json<T: serde::Serialize>(filename: &str, value: &T) -> Result<()> {
    let json_string = serde_json::to_string(value)?;
    let mut file = File::create(filename)
        .map_err(|e| anyhow::anyhow!("Error creating report file '{}': {}", filename, e))?;
    file.write_all(json_string.as_bytes())?;
    info!("Report saved to {} ({} bytes)", filename, json_string.len());
    Ok(())
}
