use anyhow::Result;
use clap::Parser;
use log::{info, error, debug};
use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use compression_simulator::experiment::{run_trials, TrialOutput};
use compsim_common::{OutputConfig, SimulationConfig, Snapshot};

/// Command-line arguments for the simulator
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config.toml file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the number of independent trials from the config
    #[arg(long)]
    trials: Option<u32>,
}

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();
    let args = Args::parse();

    info!("Starting Compression Simulator...");

    // --- Load Configuration ---
    let config = SimulationConfig::load(&args.config)?;
    let params = config.get_sim_params();
    let trials = args.trials.unwrap_or(config.simulation.trials);
    if trials == 0 {
        anyhow::bail!("--trials must be greater than 0.");
    }
    debug!("Simulation Parameters: {:#?}", params);

    // --- Run ---
    let start_time = Instant::now();
    let outputs = run_trials(&params, trials)?;
    let total_duration = start_time.elapsed();
    info!(
        "{} trial(s) finished in {:.3} seconds.",
        outputs.len(),
        total_duration.as_secs_f64()
    );

    for output in &outputs {
        for metric in &output.metrics {
            info!("[trial {}] {}", output.trial, metric);
        }
    }
    log_perimeter_trend(&outputs);

    // --- Save Recorded Data ---
    info!("Saving recorded data...");
    for output in &outputs {
        let base = trial_filename(&config.output, output.trial, trials);
        if config.output.save_stats {
            save_snapshots(&base, config.output.format.as_deref().unwrap_or("json"), &output.snapshots);
        }
        if config.output.save_probabilities {
            save_probabilities(&base, &output.probability_series)?;
        }
        if config.output.save_positions {
            save_final_positions(&base, &output.final_positions)?;
        }
    }
    if !config.output.save_stats {
        info!("Skipping saving snapshots as per config (save_stats is false).");
    }

    info!("Simulation Complete.");
    Ok(())
}

fn trial_filename(output: &OutputConfig, trial: u32, trials: u32) -> String {
    if trials == 1 {
        output.base_filename.clone()
    } else {
        format!("{}_trial{}", output.base_filename, trial)
    }
}

/// Mean perimeter across trials at the first and last snapshot.
fn log_perimeter_trend(outputs: &[TrialOutput]) {
    let initial = mean_perimeter(outputs.iter().filter_map(|o| o.snapshots.first()));
    let last = mean_perimeter(outputs.iter().filter_map(|o| o.snapshots.last()));
    info!("Mean perimeter: {:.2} at start, {:.2} at end.", initial, last);
}

fn mean_perimeter<'a>(snapshots: impl Iterator<Item = &'a Snapshot>) -> f64 {
    let (sum, count) = snapshots.fold((0.0, 0usize), |(sum, count), s| (sum + s.perimeter as f64, count + 1));
    if count == 0 { 0.0 } else { sum / count as f64 }
}

fn save_snapshots(base: &str, format: &str, snapshots: &[Snapshot]) {
    match format {
        "json" => save_json(base, snapshots),
        "bincode" => {
            // Binary format (much more compact)
            let filename = format!("{}_snapshots.bin", base);
            match File::create(&filename) {
                Ok(file) => match bincode::serialize_into(file, snapshots) {
                    Ok(_) => info!("Snapshots saved to {} (binary format)", filename),
                    Err(e) => error!("Error serializing snapshots to bincode: {}", e),
                },
                Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
            }
        }
        "messagepack" => {
            let filename = format!("{}_snapshots.msgpack", base);
            match &mut File::create(&filename) {
                Ok(file) => match rmp_serde::encode::write(file, snapshots) {
                    Ok(_) => info!("Snapshots saved to {} (MessagePack format)", filename),
                    Err(e) => error!("Error serializing snapshots to MessagePack: {}", e),
                },
                Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
            }
        }
        _ => {
            error!("Unknown output format: {}. Using JSON instead.", format);
            save_json(base, snapshots);
        }
    }
}

fn save_json(base: &str, snapshots: &[Snapshot]) {
    let filename = format!("{}_snapshots.json", base);
    match File::create(&filename) {
        Ok(mut file) => match serde_json::to_string(snapshots) {
            Ok(json_string) => {
                if let Err(e) = file.write_all(json_string.as_bytes()) {
                    error!("Error writing snapshot JSON to file '{}': {}", filename, e);
                } else {
                    info!("Snapshots saved to {}", filename);
                }
            }
            Err(e) => error!("Error serializing snapshots to JSON: {}", e),
        },
        Err(e) => error!("Error creating snapshot file '{}': {}", filename, e),
    }
}

fn save_probabilities(base: &str, series: &[f64]) -> Result<()> {
    let filename = format!("{}_probabilities.csv", base);
    match csv::Writer::from_path(&filename) {
        Ok(mut writer) => {
            writer.write_record(["index", "probability"])?;
            for (i, p) in series.iter().enumerate() {
                writer.write_record(&[i.to_string(), format!("{:.6}", p)])?;
            }
            writer.flush()?;
            info!("Probability series ({} values) saved to {}", series.len(), filename);
        }
        Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
    }
    Ok(())
}

fn save_final_positions(base: &str, positions: &[(i32, i32, u16)]) -> Result<()> {
    let filename = format!("{}_final_positions.csv", base);
    match csv::Writer::from_path(&filename) {
        Ok(mut writer) => {
            writer.write_record(["q", "r", "class"])?;
            for (q, r, class) in positions {
                writer.write_record(&[q.to_string(), r.to_string(), class.to_string()])?;
            }
            writer.flush()?;
            info!("Final positions saved to {}", filename);
        }
        Err(e) => error!("Error saving CSV file '{}': {}", filename, e),
    }
    Ok(())
}
