use mcmc_driver::core::run_chain;
use mcmc_driver::position::Position;
use mcmc_driver::random_walk::{LogDensity, RandomWalkKernel};
use mcmc_driver::seeds::split_seeds;

struct StdNormal2;

impl LogDensity for StdNormal2 {
    fn logprob(&self, position: &Position) -> f64 {
        let x = position.scalar("x").unwrap();
        let y = position.scalar("y").unwrap();
        -0.5 * (x * x + y * y)
    }
}

fn main() {
    let kernel = RandomWalkKernel::new(StdNormal2, 0.8);
    let initial = kernel.init(Position::new().with("x", 0.0).with("y", 0.0));

    // Run the chain for 1,000 steps, one seed per step
    let seeds = split_seeds(42, 1000);
    let (states, infos) = run_chain(&kernel, &initial, &seeds, 1000).unwrap();

    assert_eq!(states.len(), 1000);
    assert_eq!(infos.len(), 1000);
    println!("last position: {:?}", states.last().unwrap().position);
}
