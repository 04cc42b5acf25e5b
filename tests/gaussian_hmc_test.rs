//! End-to-end check that an HMC chain built from the leapfrog proposer and the burn autodiff
//! oracle recovers the moments of a 2D Gaussian.

use approx::assert_abs_diff_eq;
use burn::backend::{Autodiff, NdArray};
use leapfrog_hmc::chain::HamiltonianChain;
use leapfrog_hmc::distributions::DiagonalGaussian;
use leapfrog_hmc::leapfrog::{LeapfrogConfig, LeapfrogProposer, Proposer};
use leapfrog_hmc::oracle::BurnGradient;
use ndarray::{array, Array1, Axis};

#[cfg(test)]
mod tests {
    use super::*;

    type BackendType = Autodiff<NdArray>;

    #[test]
    fn test_two_d_gaussian_moments() {
        const SAMPLE_SIZE: usize = 1_500;
        const BURNIN: usize = 100;
        const SEED: u64 = 42;

        let target = DiagonalGaussian::new(array![1.0_f32, -2.0], array![1.0, 0.5]).unwrap();
        let oracle = BurnGradient::<f32, BackendType, _>::new(target);
        let config = LeapfrogConfig {
            step_size: 0.1_f32,
            path_len: 1.0,
        };
        let proposer = LeapfrogProposer::from_config(&oracle, &config).unwrap();
        let mut chain = HamiltonianChain::new(proposer, &oracle, array![4.0_f32, 4.0])
            .unwrap()
            .set_seed(SEED);

        let samples = chain.run(SAMPLE_SIZE, BURNIN).unwrap();
        assert_eq!(samples.shape(), &[SAMPLE_SIZE, 2]);
        assert!(
            !samples.iter().any(|x| x.is_nan() || x.is_infinite()),
            "Found infinite/NaN in samples."
        );

        let mean = samples.mean_axis(Axis(0)).unwrap();
        let std = samples.std_axis(Axis(0), 1.0);
        assert_abs_diff_eq!(mean, array![1.0, -2.0], epsilon = 0.2);
        assert_abs_diff_eq!(std, array![1.0, 0.5], epsilon = 0.15);
        assert!(chain.acceptance_rate() > 0.8);
        assert_eq!(chain.n_divergent(), 0);
    }

    #[test]
    fn test_boxed_proposer_drives_chain() {
        let target = DiagonalGaussian::new(array![0.0_f64, 0.0], array![1.0, 1.0]).unwrap();
        let proposer: Box<dyn Proposer<Array1<f64>>> =
            Box::new(LeapfrogProposer::new(target.clone(), 0.2, 1.0).unwrap());
        let mut chain = HamiltonianChain::new(proposer, target, array![0.0, 0.0])
            .unwrap()
            .set_seed(3);
        let samples = chain.run(200, 0).unwrap();
        assert_eq!(samples.nrows(), 200);
        assert!(chain.acceptance_rate() > 0.5);
    }
}
