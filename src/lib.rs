//! # leapfrog-hmc
//!
//! Hamiltonian Monte Carlo proposals built on a symplectic leapfrog integrator.
//!
//! - [`oracle`]: gradients of the potential energy `V(q) = -log π(q)`, via `burn` autodiff,
//!   hand-coded closures, or central finite differences.
//! - [`leapfrog`]: the [`leapfrog::Proposer`] interface and the [`leapfrog::LeapfrogProposer`].
//! - [`chain`]: a single-chain Metropolis driver around any proposer.
//! - [`distributions`]: a few targets with closed-form gradients.
//!
//! ## Example
//!
//! ```rust
//! use burn::backend::{Autodiff, NdArray};
//! use leapfrog_hmc::chain::HamiltonianChain;
//! use leapfrog_hmc::distributions::Rosenbrock;
//! use leapfrog_hmc::leapfrog::LeapfrogProposer;
//! use leapfrog_hmc::oracle::BurnGradient;
//! use ndarray::array;
//!
//! type BackendType = Autodiff<NdArray>;
//!
//! let oracle = BurnGradient::<f32, BackendType, _>::new(Rosenbrock::new(1.0, 100.0));
//! let proposer = LeapfrogProposer::new(&oracle, 0.01_f32, 0.1).unwrap();
//! let mut chain = HamiltonianChain::new(proposer, &oracle, array![1.0_f32, 1.0])
//!     .unwrap()
//!     .set_seed(42);
//! let draws = chain.run(20, 0).unwrap();
//! assert_eq!(draws.nrows(), 20);
//! ```

pub mod chain;
pub mod distributions;
pub mod energy;
pub mod error;
pub mod euclidean;
pub mod leapfrog;
pub mod oracle;

pub use error::{HmcError, Result};
