use anyhow::{Context, Result};
use compsim_common::{SimParams, Snapshot};
use log::{debug, info, trace, warn};
use rand::prelude::*;
use rayon::prelude::*;

use crate::grid::{HexGrid, LatticeGrid};
use crate::particle::ClassFilter;
use crate::shapes::build_initial_grid;
use crate::simulation::{CompressionSimulator, Metric};

/// Everything one independent trial produced.
#[derive(Debug, Clone)]
pub struct TrialOutput {
    pub trial: u32,
    pub snapshots: Vec<Snapshot>,
    pub probability_series: Vec<f64>,
    /// (q, r, class) of every particle at the end of the run.
    pub final_positions: Vec<(i32, i32, u16)>,
    pub metrics: Vec<Metric>,
}

/// Runs `trials` independent trials in parallel. Each task owns its own grid
/// and simulator; nothing is shared. Results come back ordered by trial index.
pub fn run_trials(params: &SimParams, trials: u32) -> Result<Vec<TrialOutput>> {
    info!("Running {} trial(s) on {} Rayon threads.", trials, rayon::current_num_threads());
    (0..trials)
        .into_par_iter()
        .map(|trial| run_trial(params, trial))
        .collect()
}

/// Runs one trial: builds the initial shape, then spends the iteration budget
/// in chunks of `record_interval_iterations`, recording a snapshot at t=0 and
/// after every chunk.
pub fn run_trial(params: &SimParams, trial: u32) -> Result<TrialOutput> {
    if params.record_interval_iterations == 0 && params.iterations > 0 {
        anyhow::bail!("record_interval_iterations must be greater than 0 when iterations are requested.");
    }

    let mut placement_rng = StdRng::seed_from_u64(params.placement_seed.wrapping_add(trial as u64));
    let grid = build_initial_grid(
        params.grid_width,
        params.grid_height,
        params.shape,
        params.num_particles,
        params.num_classes,
        &mut placement_rng,
    )
    .with_context(|| format!("Failed to build initial shape for trial {}", trial))?;

    let mut sim = CompressionSimulator::new(grid, params.bias)
        .with_context(|| format!("Trial {} rejected its initial configuration", trial))?;
    let mut rng = StdRng::seed_from_u64(params.seed.wrapping_add(trial as u64));
    let classes_to_move = ClassFilter::from_classes(&params.classes_to_move);

    info!(
        "Trial {}: {} particles, bias {:.2}, {} iterations.",
        trial,
        sim.grid().particle_count(),
        params.bias,
        params.iterations
    );

    let mut snapshots = vec![record_snapshot(&sim, &classes_to_move, params.save_positions_in_snapshot)];

    let mut remaining = params.iterations;
    while remaining > 0 {
        let chunk = remaining.min(params.record_interval_iterations);
        let rounds_before = sim.rounds();
        let moved = sim.run_iterations(chunk, &classes_to_move, &mut rng)?;
        remaining -= chunk;

        trace!(
            "Trial {}: chunk of {} attempts, {} accepted, rounds {} -> {}.",
            trial,
            chunk,
            moved,
            rounds_before,
            sim.rounds()
        );
        snapshots.push(record_snapshot(&sim, &classes_to_move, params.save_positions_in_snapshot));
    }

    if !sim.grid().particles_connected() {
        warn!("Trial {}: particles are no longer connected after the run.", trial);
    }

    let metrics = sim.get_metrics(&classes_to_move);
    info!(
        "Trial {} finished in {:.3} s: {} movements, {} rounds.",
        trial,
        sim.elapsed().as_secs_f64(),
        sim.movements(),
        sim.rounds()
    );

    let probability_series = sim.probability_series().to_vec();
    let final_positions = sim
        .grid()
        .particles()
        .iter()
        .map(|p| (p.position.q, p.position.r, p.class.0))
        .collect();

    Ok(TrialOutput {
        trial,
        snapshots,
        probability_series,
        final_positions,
        metrics,
    })
}

/// Captures counters and shape metrics of the current state.
pub fn record_snapshot(
    sim: &CompressionSimulator<HexGrid>,
    classes_to_move: &ClassFilter,
    with_positions: bool,
) -> Snapshot {
    let grid = sim.grid();
    let snapshot = Snapshot {
        iteration: sim.iterations_run(),
        movements: sim.movements(),
        rounds: sim.rounds(),
        perimeter: grid.calculate_perimeter(classes_to_move),
        center_of_mass: grid.find_center_of_mass(classes_to_move),
        property1_count: sim.property1_count(),
        property2_count: sim.property2_count(),
        probabilities_recorded: sim.probability_series().len(),
        positions: with_positions.then(|| {
            grid.particles()
                .iter()
                .map(|p| (p.position.q, p.position.r))
                .collect()
        }),
    };
    debug!(
        "Snapshot at iteration {}: perimeter {}, rounds {}.",
        snapshot.iteration, snapshot.perimeter, snapshot.rounds
    );
    snapshot
}
