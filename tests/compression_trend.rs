use compression_simulator::experiment::run_trials;
use compression_simulator::ClassFilter;
use compression_simulator::{CompressionSimulator, LatticeGrid};
use compression_simulator::shapes::build_initial_grid;
use compsim_common::{ShapeKind, SimParams};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn line_params(bias: f64) -> SimParams {
    SimParams {
        grid_width: 40,
        grid_height: 40,
        shape: ShapeKind::Line,
        num_particles: 20,
        num_classes: 1,
        placement_seed: 1,
        bias,
        iterations: 60_000,
        record_interval_iterations: 5_000,
        seed: 2024,
        classes_to_move: Vec::new(),
        save_positions_in_snapshot: false,
    }
}

#[test]
fn test_strong_bias_shrinks_perimeter_on_average() {
    let outputs = run_trials(&line_params(4.0), 3).unwrap();
    let initial = outputs[0].snapshots[0].perimeter as f64;
    let final_mean = outputs
        .iter()
        .map(|o| o.snapshots.last().unwrap().perimeter as f64)
        .sum::<f64>()
        / outputs.len() as f64;
    assert_eq!(initial, 38.0);
    assert!(final_mean < initial, "mean final perimeter {} not below {}", final_mean, initial);
}

#[test]
fn test_rounds_clear_visited_set() {
    let mut rng = StdRng::seed_from_u64(8);
    let grid = build_initial_grid(30, 30, ShapeKind::Line, 6, 1, &mut rng).unwrap();
    let mut sim = CompressionSimulator::new(grid, 2.0).unwrap();

    let mut last_rounds = 0;
    for _ in 0..2_000 {
        sim.run_iterations(1, &ClassFilter::All, &mut rng).unwrap();
        if sim.rounds() > last_rounds {
            assert_eq!(sim.rounds(), last_rounds + 1);
            assert_eq!(sim.visited_count(), 0);
            last_rounds = sim.rounds();
        }
        assert!(sim.visited_count() < 6);
    }
    assert!(last_rounds > 0);
    assert!(sim.grid().particles_connected());
}

/// Perimeter at t=0 followed by its value at every round boundary.
fn perimeter_at_round_boundaries(seed: u64, bias: f64, iterations: u64) -> Vec<u32> {
    let mut rng = StdRng::seed_from_u64(seed);
    let grid = build_initial_grid(40, 40, ShapeKind::Tree, 30, 1, &mut rng).unwrap();
    let mut sim = CompressionSimulator::new(grid, bias).unwrap();

    let mut samples = vec![sim.grid().calculate_perimeter(&ClassFilter::All)];
    let mut last_rounds = sim.rounds();
    for _ in 0..iterations {
        sim.run_iterations(1, &ClassFilter::All, &mut rng).unwrap();
        if sim.rounds() > last_rounds {
            last_rounds = sim.rounds();
            samples.push(sim.grid().calculate_perimeter(&ClassFilter::All));
        }
    }
    assert!(sim.grid().particles_connected(), "seed {}", seed);
    samples
}

fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    sum / count as f64
}

#[test]
fn test_moderate_bias_tree_perimeter_trends_down_across_seeds() {
    let runs: Vec<Vec<u32>> = (0..10).map(|seed| perimeter_at_round_boundaries(seed, 2.0, 20_000)).collect();

    // A 30-particle tree has 29 bonds: 3 * 30 - 29 - 3.
    assert!(runs.iter().all(|samples| samples[0] == 58));
    assert!(runs.iter().any(|samples| samples.len() > 1), "no round completed in any seed");

    let initial = mean(runs.iter().map(|s| s[0] as f64));
    let last = mean(runs.iter().map(|s| *s.last().unwrap() as f64));
    assert!(last <= initial, "mean perimeter rose from {} to {}", initial, last);

    // Early half of each run's samples against its late half.
    let (early, late): (Vec<f64>, Vec<f64>) = runs
        .iter()
        .filter(|s| s.len() > 1)
        .map(|s| {
            let (head, tail) = s.split_at(s.len() / 2);
            (
                mean(head.iter().map(|&p| p as f64)),
                mean(tail.iter().map(|&p| p as f64)),
            )
        })
        .unzip();
    let (early, late) = (mean(early.into_iter()), mean(late.into_iter()));
    assert!(late <= early, "late rounds average {} above early rounds {}", late, early);
}
