//! Hamiltonian bookkeeping: Gaussian momenta and the energies used by the Metropolis test.

use crate::error::Result;
use crate::euclidean::EuclideanVector;
use crate::oracle::Potential;
use ndarray::{Array1, LinalgScalar};
use num_traits::{Float, One};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Kinetic energy `½ pᵀp` of a unit-mass momentum.
pub fn kinetic_energy<V: EuclideanVector>(momentum: &V) -> V::Scalar {
    let half = V::Scalar::one() / (V::Scalar::one() + V::Scalar::one());
    momentum.dot(momentum) * half
}

/// Total energy `H(q, p) = V(q) + ½ pᵀp`.
pub fn hamiltonian<V, U>(potential: &U, position: &V, momentum: &V) -> Result<V::Scalar>
where
    V: EuclideanVector,
    U: Potential<V> + ?Sized,
{
    Ok(potential.potential(position)? + kinetic_energy(momentum))
}

/// Draws a momentum from N(0, I) of dimension `dim`.
pub fn sample_momentum<T, R>(rng: &mut R, dim: usize) -> Array1<T>
where
    T: Float + LinalgScalar,
    R: Rng,
    StandardNormal: Distribution<T>,
{
    let mut momentum = Array1::<T>::zeros(dim);
    momentum.fill_standard_normal(rng);
    momentum
}
