/*!
The sampling driver: advance an opaque transition kernel a fixed number of
times and materialize the full trajectory of states and diagnostics.

A [`TransitionKernel`] is a single-method capability `(seed, state) ->
(state, info)`. The driver knows nothing about what happens inside a step;
it threads the state through `n_steps` successive calls, checks that every
returned position keeps the initial schema, and collects the outputs in
order. Anything the kernel raises aborts the run and propagates unchanged.

# Examples

```rust
use mcmc_driver::core::{run_chain, ChainState, KernelFn, StepInfo};
use mcmc_driver::position::Position;
use mcmc_driver::seeds::split_seeds;

// A stub kernel that shifts `x` by one per step.
let kernel = KernelFn(|_seed, state: &ChainState| {
    let position = state.position.map(|x| x + 1.0);
    Ok((
        ChainState::new(position, 0.0),
        StepInfo { acceptance_prob: 1.0, is_divergent: false, n_steps: 1 },
    ))
});

let initial = ChainState::new(Position::new().with("x", 0.0), 0.0);
let seeds = split_seeds(42, 10);
let (states, infos) = run_chain(&kernel, &initial, &seeds, 10).unwrap();
assert_eq!(states[9].position.scalar("x"), Some(10.0));
assert_eq!(infos.len(), 10);
```
*/

use crate::error::DriverError;
use crate::position::Position;
use crate::seeds::split_seeds;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::collections::VecDeque;
use std::error::Error;

/// The error type kernels raise. The driver never interprets these; they
/// abort the run and surface verbatim as [`DriverError::Kernel`].
pub type KernelError = Box<dyn Error + Send + Sync>;

/// The state of one Markov chain between steps: the current position plus
/// the sampler's bookkeeping (here, the log-density at that position).
///
/// States are replaced, never mutated: each step builds a new `ChainState`
/// from the previous one plus fresh randomness, so retained references to
/// earlier states stay valid.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainState {
    pub position: Position,
    pub logprob: f64,
}

impl ChainState {
    pub fn new(position: Position, logprob: f64) -> Self {
        Self { position, logprob }
    }
}

/// Per-step diagnostics emitted alongside each new state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepInfo {
    /// Acceptance probability of the step, in `[0, 1]`.
    pub acceptance_prob: f64,
    /// True if the step's numerical integration failed to remain stable.
    pub is_divergent: bool,
    /// Number of integration substeps the kernel took.
    pub n_steps: u64,
}

/// A one-step Markov transition: fresh randomness plus the previous state
/// in, the next state plus diagnostics out.
///
/// Kernels take `&self` and draw randomness only from the seed, so a
/// well-formed kernel is a pure function of its two arguments. Anything
/// satisfying the signature is interchangeable; closures are wrapped via
/// [`KernelFn`].
pub trait TransitionKernel {
    fn step(&self, seed: u64, state: &ChainState) -> Result<(ChainState, StepInfo), KernelError>;
}

/// Adapter turning a closure `(seed, &state) -> Result<(state, info), _>`
/// into a [`TransitionKernel`].
#[derive(Debug, Clone)]
pub struct KernelFn<F>(pub F);

impl<F> TransitionKernel for KernelFn<F>
where
    F: Fn(u64, &ChainState) -> Result<(ChainState, StepInfo), KernelError>,
{
    fn step(&self, seed: u64, state: &ChainState) -> Result<(ChainState, StepInfo), KernelError> {
        (self.0)(seed, state)
    }
}

impl<K: TransitionKernel + ?Sized> TransitionKernel for &K {
    fn step(&self, seed: u64, state: &ChainState) -> Result<(ChainState, StepInfo), KernelError> {
        (**self).step(seed, state)
    }
}

/// Runs one chain for exactly `n_steps` steps.
///
/// Step `i` calls `kernel.step(seeds[i], state_{i-1})`, with `state_0 =
/// initial_state`. Returns the states and diagnostics as two index-aligned
/// sequences of length `n_steps`, in chain order. The initial state is not
/// included in the output; callers that need it record it themselves.
///
/// Fails with [`DriverError::InsufficientRandomness`] if `seeds` holds
/// fewer than `n_steps` entries (checked before the first step), and with
/// [`DriverError::ShapeMismatch`] if the kernel ever returns a position
/// whose schema differs from `initial_state`'s. Kernel errors abort the
/// run immediately; no partial trace is returned.
pub fn run_chain<K: TransitionKernel>(
    kernel: &K,
    initial_state: &ChainState,
    seeds: &[u64],
    n_steps: usize,
) -> Result<(Vec<ChainState>, Vec<StepInfo>), DriverError> {
    if seeds.len() < n_steps {
        return Err(DriverError::InsufficientRandomness {
            requested: n_steps,
            supplied: seeds.len(),
        });
    }

    let mut states = Vec::with_capacity(n_steps);
    let mut infos = Vec::with_capacity(n_steps);
    let mut state = initial_state.clone();

    for (i, &seed) in seeds[..n_steps].iter().enumerate() {
        let (next, info) = kernel.step(seed, &state).map_err(DriverError::Kernel)?;
        if !next.position.same_schema(&initial_state.position) {
            return Err(DriverError::ShapeMismatch {
                step: i,
                expected: initial_state.position.schema_signature(),
                got: next.position.schema_signature(),
            });
        }
        states.push(next.clone());
        infos.push(info);
        state = next;
    }

    Ok((states, infos))
}

/// Like [`run_chain`], updating `pb` once per step with a sliding-window
/// acceptance rate and a running divergence count.
pub fn run_chain_with_progress<K: TransitionKernel>(
    kernel: &K,
    initial_state: &ChainState,
    seeds: &[u64],
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<(Vec<ChainState>, Vec<StepInfo>), DriverError> {
    if seeds.len() < n_steps {
        return Err(DriverError::InsufficientRandomness {
            requested: n_steps,
            supplied: seeds.len(),
        });
    }

    pb.set_length(n_steps as u64);

    // Sliding window of 100 iterations for the displayed acceptance rate.
    let window_size = 100;
    let mut accept_window: VecDeque<f64> = VecDeque::with_capacity(window_size);
    let mut n_divergent: usize = 0;

    let mut states = Vec::with_capacity(n_steps);
    let mut infos = Vec::with_capacity(n_steps);
    let mut state = initial_state.clone();

    for (i, &seed) in seeds[..n_steps].iter().enumerate() {
        let (next, info) = kernel.step(seed, &state).map_err(DriverError::Kernel)?;
        if !next.position.same_schema(&initial_state.position) {
            return Err(DriverError::ShapeMismatch {
                step: i,
                expected: initial_state.position.schema_signature(),
                got: next.position.schema_signature(),
            });
        }

        accept_window.push_front(info.acceptance_prob);
        if accept_window.len() > window_size {
            accept_window.pop_back();
        }
        n_divergent += info.is_divergent as usize;

        states.push(next.clone());
        infos.push(info);
        state = next;

        let avg_accept: f64 = accept_window.iter().sum::<f64>() / accept_window.len() as f64;
        pb.set_message(format!(
            "p(accept)≈{:.2} divergences={}",
            avg_accept, n_divergent
        ));
        pb.inc(1);
    }

    Ok((states, infos))
}

/// Runs independent chains in parallel, one per entry of `initial_states`.
///
/// Chain `i` draws its seeds from `master_seed + i`, so the chains' seed
/// streams are disjoint and no state is shared between them. Returns one
/// `(states, infos)` pair per chain, in input order; the first failing
/// chain aborts the whole call.
pub fn run_chains<K>(
    kernel: &K,
    initial_states: &[ChainState],
    master_seed: u64,
    n_steps: usize,
) -> Result<Vec<(Vec<ChainState>, Vec<StepInfo>)>, DriverError>
where
    K: TransitionKernel + Sync,
{
    initial_states
        .par_iter()
        .enumerate()
        .map(|(i, initial)| {
            let seeds = split_seeds(master_seed.wrapping_add(i as u64), n_steps);
            run_chain(kernel, initial, &seeds, n_steps)
        })
        .collect()
}

/// [`run_chains`] with one progress bar per chain.
pub fn run_chains_with_progress<K>(
    kernel: &K,
    initial_states: &[ChainState],
    master_seed: u64,
    n_steps: usize,
) -> Result<Vec<(Vec<ChainState>, Vec<StepInfo>)>, DriverError>
where
    K: TransitionKernel + Sync,
{
    let multi = MultiProgress::new();
    let pb_style = ProgressStyle::default_bar()
        .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap()
        .progress_chars("##-");

    initial_states
        .par_iter()
        .enumerate()
        .map(|(i, initial)| {
            let pb = multi.add(ProgressBar::new(n_steps as u64));
            pb.set_prefix(format!("Chain {i}"));
            pb.set_style(pb_style.clone());

            let seeds = split_seeds(master_seed.wrapping_add(i as u64), n_steps);
            let trace = run_chain_with_progress(kernel, initial, &seeds, n_steps, &pb)?;

            pb.finish_with_message("Done!");
            Ok(trace)
        })
        .collect()
}
