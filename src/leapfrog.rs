//! Leapfrog (Störmer–Verlet) proposals for Hamiltonian Monte Carlo.
//!
//! Given a position `q` and momentum `p`, [`LeapfrogProposer::propose`] simulates
//! Hamiltonian dynamics for a total time `path_len` with step `step_size`:
//!
//! ```text
//! p ← p − (ε/2)·∇V(q)
//! repeat floor(L/ε) − 1 times:
//!     q ← q + ε·p
//!     p ← p − ε·∇V(q)
//! q ← q + ε·p
//! p ← p − (ε/2)·∇V(q)
//! return (q, −p)
//! ```
//!
//! The ordering above is what makes the map volume-preserving and time-reversible, and the
//! final momentum flip makes it an involution: proposing again from the output returns to the
//! starting position. The Metropolis correction in [`crate::chain`] relies on both.
//!
//! # Example
//!
//! ```rust
//! use leapfrog_hmc::leapfrog::{LeapfrogProposer, Proposer};
//! use leapfrog_hmc::oracle::AnalyticGradient;
//! use ndarray::{array, Array1};
//!
//! // Harmonic oscillator: V(q) = q²/2, ∇V(q) = q.
//! let oracle = AnalyticGradient::new(
//!     |q: &Array1<f64>| 0.5 * q.dot(q),
//!     |q: &Array1<f64>| q.clone(),
//! );
//! let proposer = LeapfrogProposer::new(oracle, 0.1, 1.0).unwrap();
//!
//! let (q, p) = proposer.propose(&array![0.0], &array![1.0]).unwrap();
//! assert!((q[0] - 1.0_f64.sin()).abs() < 0.01);
//! assert!((p[0] + 1.0_f64.cos()).abs() < 0.01);
//! ```

use crate::error::{HmcError, Result};
use crate::euclidean::EuclideanVector;
use crate::oracle::{check_dim, GradientOracle};
use num_traits::{Float, One};

/// Anything that maps a phase-space point `(q, p)` to a proposed point `(q', p')`.
///
/// Implementations must not touch the caller's vectors; the proposal is returned as new,
/// owned vectors.
pub trait Proposer<V: EuclideanVector> {
    fn propose(&self, position: &V, momentum: &V) -> Result<(V, V)>;
}

impl<V, P> Proposer<V> for &P
where
    V: EuclideanVector,
    P: Proposer<V> + ?Sized,
{
    fn propose(&self, position: &V, momentum: &V) -> Result<(V, V)> {
        (**self).propose(position, momentum)
    }
}

impl<V, P> Proposer<V> for Box<P>
where
    V: EuclideanVector,
    P: Proposer<V> + ?Sized,
{
    fn propose(&self, position: &V, momentum: &V) -> Result<(V, V)> {
        (**self).propose(position, momentum)
    }
}

fn as_f64<T: Float>(x: T) -> f64 {
    x.to_f64().unwrap_or(f64::NAN)
}

/// Integration settings for a [`LeapfrogProposer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeapfrogConfig<T> {
    /// The step size `ε` of the integrator.
    pub step_size: T,
    /// The total simulated time `L`; the integrator takes `floor(L/ε)` position updates.
    pub path_len: T,
}

impl<T: Float> Default for LeapfrogConfig<T> {
    fn default() -> Self {
        Self {
            step_size: T::one() / (T::one() + T::one()),
            path_len: T::one(),
        }
    }
}

impl<T: Float> LeapfrogConfig<T> {
    /// Checks that both parameters are finite and strictly positive.
    pub fn validate(&self) -> Result<()> {
        if !(self.step_size.is_finite() && self.step_size > T::zero()) {
            return Err(HmcError::Configuration(format!(
                "step_size must be finite and > 0, got {}",
                as_f64(self.step_size)
            )));
        }
        if !(self.path_len.is_finite() && self.path_len > T::zero()) {
            return Err(HmcError::Configuration(format!(
                "path_len must be finite and > 0, got {}",
                as_f64(self.path_len)
            )));
        }
        Ok(())
    }

    /// Number of position updates, `floor(path_len / step_size)`.
    pub fn n_steps(&self) -> Result<usize> {
        self.validate()?;
        (self.path_len / self.step_size)
            .floor()
            .to_usize()
            .ok_or_else(|| {
                HmcError::Configuration("path_len / step_size does not fit in usize".to_string())
            })
    }
}

/// Proposes new states by leapfrog integration of Hamiltonian dynamics.
///
/// The step size and path length are fixed at construction; build a new proposer to re-tune.
/// `propose` takes `&self` and only allocates per-call working copies, so one proposer can be
/// shared across threads whenever its oracle can.
///
/// # Type Parameters
///
/// * `T`: Floating-point type of the step size and path length.
/// * `O`: The gradient oracle of the potential energy.
#[derive(Debug, Clone)]
pub struct LeapfrogProposer<T, O> {
    oracle: O,
    step_size: T,
    path_len: T,
    n_whole_steps: usize,
}

impl<T: Float, O> LeapfrogProposer<T, O> {
    /// Creates a proposer with step size `step_size` and path length `path_len`.
    ///
    /// Fails with [`HmcError::Configuration`] unless both are finite and positive. A path
    /// shorter than two steps is allowed: the integrator then performs a single
    /// half-kick/drift/half-kick.
    pub fn new(oracle: O, step_size: T, path_len: T) -> Result<Self> {
        Self::from_config(
            oracle,
            &LeapfrogConfig {
                step_size,
                path_len,
            },
        )
    }

    pub fn from_config(oracle: O, config: &LeapfrogConfig<T>) -> Result<Self> {
        let n_steps = config.n_steps()?;
        let n_whole_steps = n_steps.saturating_sub(1);
        log::debug!(
            "leapfrog proposer: step_size={} path_len={} whole_steps={}",
            as_f64(config.step_size),
            as_f64(config.path_len),
            n_whole_steps
        );
        Ok(Self {
            oracle,
            step_size: config.step_size,
            path_len: config.path_len,
            n_whole_steps,
        })
    }

    pub fn step_size(&self) -> T {
        self.step_size
    }

    pub fn path_len(&self) -> T {
        self.path_len
    }

    /// Iterations of the drift/kick loop between the two half-kicks.
    pub fn n_whole_steps(&self) -> usize {
        self.n_whole_steps
    }

    /// Gradient evaluations per call to `propose`.
    pub fn n_gradient_evals(&self) -> usize {
        self.n_whole_steps + 2
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn config(&self) -> LeapfrogConfig<T> {
        LeapfrogConfig {
            step_size: self.step_size,
            path_len: self.path_len,
        }
    }
}

/// `momentum -= scale * ∇V(position)`.
fn kick<V, O>(oracle: &O, position: &V, momentum: &mut V, scale: V::Scalar) -> Result<()>
where
    V: EuclideanVector,
    O: GradientOracle<V>,
{
    let grad = oracle.gradient(position)?;
    if grad.len() != momentum.len() {
        return Err(HmcError::OracleDimension {
            expected: momentum.len(),
            found: grad.len(),
        });
    }
    momentum.add_scaled_assign(&grad, -scale);
    Ok(())
}

impl<V, O> Proposer<V> for LeapfrogProposer<V::Scalar, O>
where
    V: EuclideanVector,
    O: GradientOracle<V>,
{
    fn propose(&self, position: &V, momentum: &V) -> Result<(V, V)> {
        if position.len() != momentum.len() {
            return Err(HmcError::DimensionMismatch {
                position: position.len(),
                momentum: momentum.len(),
            });
        }
        check_dim(self.oracle.dim(), position)?;

        let step = self.step_size;
        let half_step = step / (V::Scalar::one() + V::Scalar::one());
        let mut q = position.clone();
        let mut p = momentum.clone();

        kick(&self.oracle, &q, &mut p, half_step)?;
        for _ in 0..self.n_whole_steps {
            q.add_scaled_assign(&p, step);
            kick(&self.oracle, &q, &mut p, step)?;
        }
        q.add_scaled_assign(&p, step);
        kick(&self.oracle, &q, &mut p, half_step)?;

        p.scale_assign(-V::Scalar::one());
        Ok((q, p))
    }
}
