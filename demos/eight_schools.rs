//! The eight-schools hierarchical model: a global treatment effect `mu`, a
//! between-school scale `tau` (sampled on the log scale), and one latent
//! effect per school, conditioned on the classic observed effects and
//! standard errors.

use indicatif::{ProgressBar, ProgressStyle};
use mcmc_driver::core::run_chain_with_progress;
use mcmc_driver::position::Position;
use mcmc_driver::random_walk::{window_adaptation, LogDensity};
use mcmc_driver::seeds::split_seeds;
use mcmc_driver::stats::{PosteriorSummary, StepStats};
use std::f64::consts::PI;

struct EightSchools {
    y: [f64; 8],
    sigma: [f64; 8],
}

fn normal_logpdf(x: f64, mean: f64, sd: f64) -> f64 {
    -0.5 * (2.0 * PI).ln() - sd.ln() - 0.5 * ((x - mean) / sd).powi(2)
}

impl LogDensity for EightSchools {
    fn logprob(&self, position: &Position) -> f64 {
        let mu = position.scalar("mu").unwrap();
        let log_tau = position.scalar("log_tau").unwrap();
        let theta = position.vector("theta").unwrap();
        let tau = log_tau.exp();

        // mu ~ Normal(0, 5); tau ~ HalfCauchy(5), with the log-scale Jacobian.
        let mut lp = normal_logpdf(mu, 0.0, 5.0);
        lp += (2.0 / (PI * 5.0 * (1.0 + (tau / 5.0).powi(2)))).ln() + log_tau;

        for (t, (y, s)) in theta.iter().zip(self.y.iter().zip(self.sigma.iter())) {
            lp += normal_logpdf(*t, mu, tau);
            lp += normal_logpdf(*y, *t, *s);
        }
        lp
    }
}

fn main() {
    let model = EightSchools {
        y: [28.0, 8.0, -3.0, 7.0, -1.0, 1.0, 18.0, 12.0],
        sigma: [15.0, 10.0, 16.0, 11.0, 9.0, 11.0, 10.0, 18.0],
    };
    let init = Position::new()
        .with("mu", 0.0)
        .with("log_tau", 0.0)
        .with("theta", vec![0.0; 8]);

    let (state, kernel) =
        window_adaptation(model, init, 5_000, 0.3, 42).expect("adaptation failed");
    println!("Adapted step size: {:.4}", kernel.step_size);

    let n_steps = 50_000;
    let pb = ProgressBar::new(n_steps as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:8} {bar:40.white} ETA {eta:3} | {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_prefix("RWM");

    let seeds = split_seeds(43, n_steps);
    let (states, infos) =
        run_chain_with_progress(&kernel, &state, &seeds, n_steps, &pb).expect("sampling failed");
    pb.finish_with_message("Done!");

    let stats = StepStats::from_infos(&infos);
    println!(
        "mean p(accept) = {:.3}, divergences = {}",
        stats.mean_accept_prob, stats.n_divergent
    );

    let summary = PosteriorSummary::from_states(&states).expect("empty trace");
    println!("{:>12}  {:>8}  {:>8}", "parameter", "mean", "sd");
    for ((name, mean), sd) in summary
        .names
        .iter()
        .zip(summary.mean.iter())
        .zip(summary.sd.iter())
    {
        println!("{name:>12}  {mean:8.3}  {sd:8.3}");
    }
}
