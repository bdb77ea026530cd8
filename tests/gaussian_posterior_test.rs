use approx::assert_abs_diff_eq;
use mcmc_driver::position::Position;
use mcmc_driver::random_walk::{window_adaptation, LogDensity, RandomWalkKernel};
use mcmc_driver::stats::{max_rhat, StepStats};
use mcmc_driver::{core::run_chains, stats::PosteriorSummary};
use ndarray::{arr1, arr2, Array2, Axis};
use ndarray_stats::CorrelationExt;

/// A correlated 2D Gaussian with mean `[0, 1]` and covariance
/// `[[4, 2], [2, 3]]`.
#[derive(Clone)]
struct Gaussian2D;

const MEAN: [f64; 2] = [0.0, 1.0];

impl LogDensity for Gaussian2D {
    fn logprob(&self, position: &Position) -> f64 {
        let dx = position.scalar("x").unwrap() - MEAN[0];
        let dy = position.scalar("y").unwrap() - MEAN[1];
        // Inverse covariance of [[4, 2], [2, 3]] (determinant 8).
        let (a, b, d) = (3.0 / 8.0, -2.0 / 8.0, 4.0 / 8.0);
        -0.5 * (a * dx * dx + 2.0 * b * dx * dy + d * dy * dy)
    }
}

/// Recovers the target's mean and covariance from 4 parallel chains, and
/// checks the chains agree with each other.
#[test]
fn test_recovers_2d_gaussian() {
    const N_CHAINS: usize = 4;
    const N_WARMUP: usize = 5_000;
    const N_STEPS: usize = 50_000;
    const SEED: u64 = 42;

    let (_, kernel) = window_adaptation(
        Gaussian2D,
        Position::new().with("x", 0.0).with("y", 0.0),
        N_WARMUP,
        0.3,
        SEED,
    )
    .unwrap();

    // Overdispersed starts so R-hat is a meaningful check.
    let starts = [(-4.0, -3.0), (4.0, 5.0), (-4.0, 5.0), (4.0, -3.0)];
    let initial_states: Vec<_> = starts
        .iter()
        .map(|&(x, y)| kernel.init(Position::new().with("x", x).with("y", y)))
        .collect();

    let traces = run_chains(&kernel, &initial_states, SEED + 1, N_STEPS).unwrap();
    assert_eq!(traces.len(), N_CHAINS);

    // Stack all retained draws into a [n_samples, 2] array.
    let mut stacked = Array2::<f64>::zeros((N_CHAINS * N_STEPS, 2));
    for (c, (states, infos)) in traces.iter().enumerate() {
        assert_eq!(states.len(), N_STEPS);
        assert_eq!(infos.len(), N_STEPS);
        for (i, state) in states.iter().enumerate() {
            stacked
                .row_mut(c * N_STEPS + i)
                .assign(&state.position.coords());
        }
    }

    let mean = stacked.mean_axis(Axis(0)).unwrap();
    let cov = stacked.t().cov(1.0).unwrap();
    assert_abs_diff_eq!(mean, arr1(&MEAN), epsilon = 0.3);
    assert_abs_diff_eq!(cov, arr2(&[[4.0, 2.0], [2.0, 3.0]]), epsilon = 0.5);

    let chains: Vec<_> = traces.iter().map(|(states, _)| states.clone()).collect();
    assert!(max_rhat(&chains).unwrap() < 1.1);
}

/// The tuned kernel's realized acceptance rate should sit near the target.
#[test]
fn test_adapted_acceptance_rate() {
    let target_accept = 0.3;
    let (state, kernel) = window_adaptation(
        Gaussian2D,
        Position::new().with("x", 0.0).with("y", 0.0),
        5_000,
        target_accept,
        7,
    )
    .unwrap();

    let seeds = mcmc_driver::seeds::split_seeds(8, 10_000);
    let (_, infos) = mcmc_driver::core::run_chain(&kernel, &state, &seeds, 10_000).unwrap();
    let stats = StepStats::from_infos(&infos);
    assert!((stats.mean_accept_prob - target_accept).abs() < 0.1);
    assert_eq!(stats.n_divergent, 0);
}

/// A fixed-step kernel (no adaptation) still recovers the mean.
#[test]
fn test_fixed_step_kernel() {
    let kernel = RandomWalkKernel::new(Gaussian2D, 1.5);
    let initial = kernel.init(Position::new().with("x", 0.0).with("y", 1.0));
    let seeds = mcmc_driver::seeds::split_seeds(3, 100_000);
    let (states, _) = mcmc_driver::core::run_chain(&kernel, &initial, &seeds, 100_000).unwrap();

    let summary = PosteriorSummary::from_states(&states).unwrap();
    assert_eq!(summary.names, vec!["x", "y"]);
    assert_abs_diff_eq!(summary.mean[0], MEAN[0], epsilon = 0.3);
    assert_abs_diff_eq!(summary.mean[1], MEAN[1], epsilon = 0.3);
    assert_abs_diff_eq!(summary.sd[0], 2.0, epsilon = 0.3);
}
