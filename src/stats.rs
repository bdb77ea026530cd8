//! Summary statistics over collected traces.
//!
//! Everything here is simple arithmetic over the driver's outputs: scalar
//! aggregates of the per-step diagnostics, per-coordinate posterior
//! summaries, and the potential scale reduction factor across chains, see
//! [Stan Reference Manual.][1]
//!
//! [1]: https://mc-stan.org/docs/2_18/reference-manual/notation-for-samples-chains-and-draws.html

use crate::core::{ChainState, StepInfo};
use ndarray::prelude::*;
use ndarray_stats::QuantileExt;

/// Scalar aggregates of a diagnostic sequence.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StepStats {
    pub n: usize,
    pub mean_accept_prob: f64,
    pub n_divergent: usize,
    pub divergence_rate: f64,
    pub total_steps: u64,
}

impl StepStats {
    pub fn from_infos(infos: &[StepInfo]) -> Self {
        if infos.is_empty() {
            return Self::default();
        }
        let n = infos.len();
        let n_divergent = infos.iter().filter(|info| info.is_divergent).count();
        Self {
            n,
            mean_accept_prob: infos.iter().map(|info| info.acceptance_prob).sum::<f64>()
                / n as f64,
            n_divergent,
            divergence_rate: n_divergent as f64 / n as f64,
            total_steps: infos.iter().map(|info| info.n_steps).sum(),
        }
    }
}

/// Per-coordinate mean and standard deviation over one trace.
#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorSummary {
    /// Flattened coordinate names, `theta[0]`, `theta[1]`, ...
    pub names: Vec<String>,
    pub mean: Array1<f64>,
    pub sd: Array1<f64>,
}

impl PosteriorSummary {
    /// Returns `None` for an empty trace. The standard deviation uses one
    /// delta degree of freedom.
    pub fn from_states(states: &[ChainState]) -> Option<Self> {
        let first = states.first()?;
        let names = first.position.coord_names();
        let draws = stack_coords(states, names.len());
        let mean = draws.mean_axis(Axis(0))?;
        let sd = draws.std_axis(Axis(0), 1.0);
        Some(Self { names, mean, sd })
    }
}

/// Potential scale reduction factor for one coordinate.
///
/// `draws` holds one row per chain and one column per retained draw.
/// Returns `None` with fewer than two chains or fewer than two draws.
pub fn potential_scale_reduction(draws: &ArrayView2<f64>) -> Option<f64> {
    let (m, n) = draws.dim();
    if m < 2 || n < 2 {
        return None;
    }
    let nf = n as f64;
    let chain_means = draws.mean_axis(Axis(1))?;
    let within = draws.var_axis(Axis(1), 1.0).mean()?;
    let grand = chain_means.mean()?;
    let between = chain_means.mapv(|x| (x - grand).powi(2)).sum() * nf / (m as f64 - 1.0);
    let var = within * ((nf - 1.0) / nf) + between / nf;
    Some((var / within).sqrt())
}

/// Per-coordinate potential scale reduction across parallel chains.
///
/// All chains must share the initial schema and length; returns `None`
/// otherwise, or when there are too few chains or draws.
pub fn collect_rhat<C: AsRef<[ChainState]>>(chains: &[C]) -> Option<Array1<f64>> {
    let first = chains.first()?.as_ref();
    let n = first.len();
    let dim = first.first()?.position.n_coords();
    if chains
        .iter()
        .any(|c| c.as_ref().len() != n || c.as_ref()[0].position.n_coords() != dim)
    {
        return None;
    }

    // One (chains x draws) matrix per coordinate.
    let per_chain: Vec<Array2<f64>> = chains
        .iter()
        .map(|c| stack_coords(c.as_ref(), dim))
        .collect();

    let mut rhat = Array1::<f64>::zeros(dim);
    for j in 0..dim {
        let mut coord = Array2::<f64>::zeros((chains.len(), n));
        for (i, draws) in per_chain.iter().enumerate() {
            coord.row_mut(i).assign(&draws.column(j));
        }
        rhat[j] = potential_scale_reduction(&coord.view())?;
    }
    Some(rhat)
}

/// The worst (largest) R-hat across all coordinates.
pub fn max_rhat<C: AsRef<[ChainState]>>(chains: &[C]) -> Option<f64> {
    let rhat = collect_rhat(chains)?;
    rhat.max().ok().copied()
}

fn stack_coords(states: &[ChainState], dim: usize) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros((states.len(), dim));
    for (i, state) in states.iter().enumerate() {
        out.row_mut(i).assign(&state.position.coords());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::Position;
    use approx::assert_abs_diff_eq;

    fn info(acceptance_prob: f64, is_divergent: bool, n_steps: u64) -> StepInfo {
        StepInfo {
            acceptance_prob,
            is_divergent,
            n_steps,
        }
    }

    fn state(coords: &[f64]) -> ChainState {
        ChainState::new(Position::new().with("theta", coords), 0.0)
    }

    #[test]
    fn test_step_stats() {
        let infos = [
            info(1.0, false, 3),
            info(0.5, true, 7),
            info(0.0, false, 1),
            info(0.5, true, 5),
        ];
        let stats = StepStats::from_infos(&infos);
        assert_eq!(stats.n, 4);
        assert_abs_diff_eq!(stats.mean_accept_prob, 0.5);
        assert_eq!(stats.n_divergent, 2);
        assert_abs_diff_eq!(stats.divergence_rate, 0.5);
        assert_eq!(stats.total_steps, 16);
    }

    #[test]
    fn test_step_stats_empty() {
        assert_eq!(StepStats::from_infos(&[]), StepStats::default());
    }

    #[test]
    fn test_posterior_summary() {
        let states = vec![state(&[1.0, 10.0]), state(&[2.0, 20.0]), state(&[3.0, 30.0])];
        let summary = PosteriorSummary::from_states(&states).unwrap();
        assert_eq!(summary.names, vec!["theta[0]", "theta[1]"]);
        assert_abs_diff_eq!(summary.mean[0], 2.0);
        assert_abs_diff_eq!(summary.mean[1], 20.0);
        assert_abs_diff_eq!(summary.sd[0], 1.0);
        assert_abs_diff_eq!(summary.sd[1], 10.0);
    }

    #[test]
    fn test_posterior_summary_empty() {
        assert!(PosteriorSummary::from_states(&[]).is_none());
    }

    #[test]
    fn test_potential_scale_reduction_fixture() {
        // 3 chains, 2 draws each, for a single coordinate.
        let draws = arr2(&[[0.0, 1.0], [1.0, 1.0], [0.0, 0.0]]);
        let rhat = potential_scale_reduction(&draws.view()).unwrap();
        assert_abs_diff_eq!(rhat, std::f64::consts::SQRT_2, epsilon = 1e-12);
    }

    #[test]
    fn test_collect_rhat() {
        // Same fixture laid out as 3 chains of 2 states over 4 coordinates.
        let chains = vec![
            vec![state(&[0.0, 1.0, 0.0, 1.0]), state(&[1.0, 2.0, 2.0, 0.0])],
            vec![state(&[1.0, 2.0, 0.0, 2.0]), state(&[1.0, 1.0, 1.0, 1.0])],
            vec![state(&[0.0, 0.0, 0.0, 2.0]), state(&[0.0, 1.0, 0.0, 0.0])],
        ];
        let rhat = collect_rhat(&chains).unwrap();
        let expected = array![std::f64::consts::SQRT_2, 1.08012345, 0.89442719, 0.8660254];
        for (got, want) in rhat.iter().zip(expected.iter()) {
            assert_abs_diff_eq!(*got, *want, epsilon = 1e-7);
        }
        assert_abs_diff_eq!(
            max_rhat(&chains).unwrap(),
            std::f64::consts::SQRT_2,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_collect_rhat_rejects_ragged_chains() {
        let chains = vec![
            vec![state(&[0.0]), state(&[1.0])],
            vec![state(&[0.0])],
        ];
        assert!(collect_rhat(&chains).is_none());
    }
}
