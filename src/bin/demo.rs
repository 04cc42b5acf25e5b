//! Samples a 2D Gaussian with HMC, using burn autodiff for the gradients, and prints summary
//! statistics of the draws.

use burn::backend::{Autodiff, NdArray};
use leapfrog_hmc::chain::HamiltonianChain;
use leapfrog_hmc::distributions::DiagonalGaussian;
use leapfrog_hmc::leapfrog::{LeapfrogProposer, Proposer};
use leapfrog_hmc::oracle::BurnGradient;
use ndarray::{array, Axis};
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Use the CPU backend (NdArray) wrapped in Autodiff.
    type BackendType = Autodiff<NdArray>;

    const N_COLLECT: usize = 2_000;
    const N_DISCARD: usize = 200;
    const SEED: u64 = 42;

    let target = DiagonalGaussian::new(array![1.0_f32, -2.0], array![1.0, 0.5])?;
    let oracle = BurnGradient::<f32, BackendType, _>::new(target);

    // step_size must resolve the narrowest direction (std = 0.5).
    let proposer = LeapfrogProposer::new(&oracle, 0.1_f32, 1.0)?;

    // A single proposal, and its reverse.
    let (q, p) = proposer.propose(&array![0.0_f32, 0.0], &array![1.0, 1.0])?;
    let (q_back, _) = proposer.propose(&q, &p)?;
    println!("proposal: q={q} p={p}; reversed back to {q_back}");

    let mut chain =
        HamiltonianChain::new(proposer, &oracle, array![5.0_f32, 5.0])?.set_seed(SEED);
    let draws = chain.run_progress(N_COLLECT, N_DISCARD)?;

    let mean = draws
        .mean_axis(Axis(0))
        .ok_or("no draws were collected")?;
    let std = draws.std_axis(Axis(0), 1.0);
    println!("Generated {} draws", draws.nrows());
    println!("Mean: {mean} (expected [1, -2])");
    println!("Std:  {std} (expected [1, 0.5])");
    println!(
        "Acceptance rate: {:.3}, divergent transitions: {}",
        chain.acceptance_rate(),
        chain.n_divergent()
    );
    Ok(())
}
