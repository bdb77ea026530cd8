/*!
A Gaussian random-walk Metropolis kernel and a small acceptance-rate tuner.

This is the crate's reference [`TransitionKernel`]: it exercises the whole
driver contract (seed-per-step randomness, immutable state threading,
per-step diagnostics) against any target implementing [`LogDensity`], with
no gradients required. The tuner in [`window_adaptation`] plays the role of
a kernel factory: given a log-density, a warm-up length, and a target
acceptance rate it returns a warmed-up initial state plus a frozen kernel.

# Examples

```rust
use mcmc_driver::core::run_chain;
use mcmc_driver::position::Position;
use mcmc_driver::random_walk::{window_adaptation, LogDensity};
use mcmc_driver::seeds::split_seeds;

struct StdNormal;

impl LogDensity for StdNormal {
    fn logprob(&self, position: &Position) -> f64 {
        let x = position.scalar("x").unwrap_or(f64::NAN);
        -0.5 * x * x
    }
}

let init = Position::new().with("x", 0.0);
let (state, kernel) = window_adaptation(StdNormal, init, 200, 0.4, 42).unwrap();
let seeds = split_seeds(43, 100);
let (states, infos) = run_chain(&kernel, &state, &seeds, 100).unwrap();
assert_eq!(states.len(), infos.len());
```
*/

use crate::core::{ChainState, KernelError, StepInfo, TransitionKernel};
use crate::error::DriverError;
use crate::position::Position;
use crate::seeds::SeedStream;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

/// An unnormalized target log-density over [`Position`]s.
///
/// Implementations must be pure: same position, same value. Values of
/// negative infinity mark positions outside the support.
pub trait LogDensity {
    fn logprob(&self, position: &Position) -> f64;
}

impl<D: LogDensity + ?Sized> LogDensity for &D {
    fn logprob(&self, position: &Position) -> f64 {
        (**self).logprob(position)
    }
}

/// Gaussian random-walk Metropolis.
///
/// Each step perturbs every coordinate with `Normal(0, step_size)` noise
/// drawn from an RNG seeded by the per-step seed, then accepts or rejects
/// in log space. Steps are pure functions of `(seed, state)`.
#[derive(Debug, Clone)]
pub struct RandomWalkKernel<D> {
    pub target: D,
    pub step_size: f64,
}

impl<D: LogDensity> RandomWalkKernel<D> {
    pub fn new(target: D, step_size: f64) -> Self {
        Self { target, step_size }
    }

    /// Builds the chain state for `position`, evaluating the target once.
    pub fn init(&self, position: Position) -> ChainState {
        let logprob = self.target.logprob(&position);
        ChainState::new(position, logprob)
    }
}

impl<D: LogDensity> TransitionKernel for RandomWalkKernel<D> {
    fn step(&self, seed: u64, state: &ChainState) -> Result<(ChainState, StepInfo), KernelError> {
        let mut rng = SmallRng::seed_from_u64(seed);
        let noise = Normal::new(0.0, self.step_size).map_err(|e| KernelError::from(e.to_string()))?;

        let proposed = state.position.map(|x| x + noise.sample(&mut rng));
        let proposed_lp = self.target.logprob(&proposed);
        let log_ratio = proposed_lp - state.logprob;

        let is_divergent = !proposed_lp.is_finite();
        let acceptance_prob = if log_ratio.is_nan() {
            0.0
        } else {
            log_ratio.exp().min(1.0)
        };

        let u: f64 = rng.gen();
        let next = if !is_divergent && log_ratio > u.ln() {
            ChainState::new(proposed, proposed_lp)
        } else {
            state.clone()
        };

        Ok((
            next,
            StepInfo {
                acceptance_prob,
                is_divergent,
                n_steps: 1,
            },
        ))
    }
}

/// Tunes a random-walk kernel toward `target_accept` over `n_warmup` steps.
///
/// The step size starts at 1 and is rescaled after each warm-up step by
/// `exp(eta_i * (p_accept - target_accept))` with a decaying gain `eta_i`,
/// the usual stochastic-approximation schedule. Returns the warmed-up
/// state and the kernel with its step size frozen; warm-up draws are
/// discarded.
///
/// `target_accept` must lie in `(0, 1)`. Warm-up consumes its own seed
/// stream derived from `seed`, so the main run should use a different
/// master seed.
pub fn window_adaptation<D: LogDensity>(
    target: D,
    initial_position: Position,
    n_warmup: usize,
    target_accept: f64,
    seed: u64,
) -> Result<(ChainState, RandomWalkKernel<D>), DriverError> {
    if !(target_accept > 0.0 && target_accept < 1.0) {
        return Err(DriverError::InvalidTargetAccept(target_accept));
    }

    let mut kernel = RandomWalkKernel::new(target, 1.0);
    let mut state = kernel.init(initial_position);

    for (i, step_seed) in SeedStream::new(seed).take(n_warmup).enumerate() {
        let (next, info) = kernel.step(step_seed, &state).map_err(DriverError::Kernel)?;
        let eta = (i as f64 + 1.0).powf(-0.6);
        kernel.step_size *= (eta * (info.acceptance_prob - target_accept)).exp();
        state = next;
    }

    Ok((state, kernel))
}
