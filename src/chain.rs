//! A single-chain Hamiltonian Monte Carlo driver.
//!
//! Each iteration draws a fresh momentum `p ~ N(0, I)`, asks a [`Proposer`] for `(q', p')` and
//! accepts the move with probability `min(1, exp(H(q, p) − H(q', p')))`.
//!
//! The proposer is only reached through the [`Proposer`] trait, so any integrator can be
//! plugged in. The driver is also the one place where a failed proposal is given a policy:
//! if the proposal leaves the support of the density ([`HmcError::NumericalDomain`]) the
//! transition is recorded as divergent and rejected, and the chain stays where it is. Every
//! other error is returned to the caller.
//!
//! # Example
//!
//! ```rust
//! use leapfrog_hmc::chain::HamiltonianChain;
//! use leapfrog_hmc::distributions::StandardGaussian;
//! use leapfrog_hmc::leapfrog::LeapfrogProposer;
//! use ndarray::array;
//!
//! let target = StandardGaussian::new(2);
//! let proposer = LeapfrogProposer::new(&target, 0.25, 1.5).unwrap();
//! let mut chain = HamiltonianChain::new(proposer, &target, array![3.0, -3.0])
//!     .unwrap()
//!     .set_seed(42);
//!
//! let draws = chain.run(100, 10).unwrap();
//! assert_eq!(draws.shape(), &[100, 2]);
//! ```

use crate::energy::hamiltonian;
use crate::error::{HmcError, Result};
use crate::euclidean::EuclideanVector;
use crate::leapfrog::Proposer;
use crate::oracle::Potential;
use indicatif::{ProgressBar, ProgressStyle};
use ndarray::{Array2, ArrayView1};
use num_traits::{Float, ToPrimitive};
use rand::distributions::Standard;
use rand::rngs::SmallRng;
use rand::{thread_rng, Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use std::collections::VecDeque;

/// Outcome of one call to [`HamiltonianChain::step`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition<T> {
    /// Whether the chain moved to the proposal.
    pub accepted: bool,
    /// Whether the proposal left the support of the density or had a non-finite energy.
    pub divergent: bool,
    /// `H(q', p') − H(q, p)`, when it could be computed.
    pub energy_error: Option<T>,
}

impl<T> Transition<T> {
    fn divergent() -> Self {
        Self {
            accepted: false,
            divergent: true,
            energy_error: None,
        }
    }
}

/// A Markov chain driven by Hamiltonian proposals and a Metropolis correction.
///
/// # Type Parameters
///
/// * `V`: The position/momentum vector type.
/// * `P`: The proposer, e.g. a [`crate::leapfrog::LeapfrogProposer`].
/// * `U`: The potential energy used for the Metropolis test.
#[derive(Clone)]
pub struct HamiltonianChain<V, P, U>
where
    V: EuclideanVector,
{
    proposer: P,
    potential: U,
    position: V,
    rng: SmallRng,
    n_steps: u64,
    n_accepted: u64,
    n_divergent: u64,
}

impl<V, P, U> HamiltonianChain<V, P, U>
where
    V: EuclideanVector,
    P: Proposer<V>,
    U: Potential<V>,
    StandardNormal: Distribution<V::Scalar>,
    Standard: Distribution<V::Scalar>,
{
    /// Creates a chain starting at `initial_position`.
    ///
    /// The starting point must be non-empty, finite, and inside the support of `potential`.
    pub fn new(proposer: P, potential: U, initial_position: V) -> Result<Self> {
        if initial_position.is_empty() {
            return Err(HmcError::Configuration(
                "initial position must not be empty".to_string(),
            ));
        }
        if !initial_position.is_finite() {
            return Err(HmcError::Configuration(
                "initial position must be finite".to_string(),
            ));
        }
        potential.potential(&initial_position)?;
        let rng = SmallRng::seed_from_u64(thread_rng().gen::<u64>());
        Ok(Self {
            proposer,
            potential,
            position: initial_position,
            rng,
            n_steps: 0,
            n_accepted: 0,
            n_divergent: 0,
        })
    }

    /// Sets a new random seed.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn position(&self) -> &V {
        &self.position
    }

    /// Potential energy at the current position.
    pub fn potential_energy(&self) -> Result<V::Scalar> {
        self.potential.potential(&self.position)
    }

    pub fn proposer(&self) -> &P {
        &self.proposer
    }

    /// Fraction of steps so far that moved the chain.
    pub fn acceptance_rate(&self) -> f64 {
        if self.n_steps == 0 {
            0.0
        } else {
            self.n_accepted as f64 / self.n_steps as f64
        }
    }

    pub fn n_divergent(&self) -> u64 {
        self.n_divergent
    }

    /// Performs one HMC update.
    ///
    /// 1) Sample a momentum from a standard normal distribution.
    /// 2) Run the proposer from the current position.
    /// 3) Accept or reject the proposal with the Metropolis rule.
    pub fn step(&mut self) -> Result<Transition<V::Scalar>> {
        self.n_steps += 1;

        let mut momentum = self.position.zeros_like();
        momentum.fill_standard_normal(&mut self.rng);
        let h_current = hamiltonian(&self.potential, &self.position, &momentum)?;

        let proposal = self
            .proposer
            .propose(&self.position, &momentum)
            .and_then(|(q, p)| Ok((hamiltonian(&self.potential, &q, &p)?, q)));
        let (h_proposed, q_proposed) = match proposal {
            Ok(proposal) => proposal,
            Err(err) if err.is_numerical_domain() => {
                self.n_divergent += 1;
                log::warn!("divergent transition at step {}: {}", self.n_steps, err);
                return Ok(Transition::divergent());
            }
            Err(err) => return Err(err),
        };

        let energy_error = h_proposed - h_current;
        if !energy_error.is_finite() {
            self.n_divergent += 1;
            log::warn!(
                "divergent transition at step {}: non-finite energy",
                self.n_steps
            );
            return Ok(Transition::divergent());
        }

        let ln_u = self.rng.gen::<V::Scalar>().ln();
        let accepted = ln_u <= -energy_error;
        if accepted {
            self.position = q_proposed;
            self.n_accepted += 1;
        }
        Ok(Transition {
            accepted,
            divergent: false,
            energy_error: Some(energy_error),
        })
    }

    /// Runs `n_discard` burn-in steps, then collects `n_collect` draws.
    ///
    /// # Returns
    ///
    /// An array of shape `[n_collect, D]`, one draw per row.
    pub fn run(&mut self, n_collect: usize, n_discard: usize) -> Result<Array2<V::Scalar>> {
        for _ in 0..n_discard {
            self.step()?;
        }

        let mut out = Array2::<V::Scalar>::zeros((n_collect, self.position.len()));
        for i in 0..n_collect {
            self.step()?;
            self.write_row(&mut out, i);
        }
        self.log_summary(n_collect);
        Ok(out)
    }

    /// Like [`HamiltonianChain::run`], but displays a progress bar with the acceptance rate
    /// over a sliding window of 100 iterations.
    pub fn run_progress(
        &mut self,
        n_collect: usize,
        n_discard: usize,
    ) -> Result<Array2<V::Scalar>> {
        for _ in 0..n_discard {
            self.step()?;
        }

        let pb = ProgressBar::new(n_collect as u64);
        if let Ok(style) =
            ProgressStyle::default_bar().template("{prefix:8} {bar:40.white} ETA {eta:3} | {msg}")
        {
            pb.set_style(style.progress_chars("=>-"));
        }
        pb.set_prefix("HMC");

        let window_size = 100;
        let mut accept_window: VecDeque<bool> = VecDeque::with_capacity(window_size);

        let mut out = Array2::<V::Scalar>::zeros((n_collect, self.position.len()));
        for i in 0..n_collect {
            let transition = self.step()?;
            self.write_row(&mut out, i);

            accept_window.push_front(transition.accepted);
            if accept_window.len() > window_size {
                accept_window.pop_back();
            }
            let p_accept = accept_window.iter().filter(|&&a| a).count() as f64
                / accept_window.len() as f64;
            pb.set_message(format!(
                "p(accept)≈{:.2} divergent={}",
                p_accept, self.n_divergent
            ));
            pb.inc(1);
        }
        pb.finish_with_message("Done!");
        self.log_summary(n_collect);
        Ok(out)
    }

    fn write_row(&self, out: &mut Array2<V::Scalar>, row: usize) {
        let state = self.position.to_vec();
        out.row_mut(row).assign(&ArrayView1::from(&state));
    }

    fn log_summary(&self, n_collect: usize) {
        log::debug!(
            "collected {} draws: acceptance {:.3}, {} divergent, final potential {:.4}",
            n_collect,
            self.acceptance_rate(),
            self.n_divergent,
            self.potential_energy()
                .ok()
                .and_then(|u| u.to_f64())
                .unwrap_or(f64::NAN)
        );
    }
}
