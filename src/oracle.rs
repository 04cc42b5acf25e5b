//! Gradient oracles for the potential energy `V(q) = -log π(q)`.
//!
//! The leapfrog integrator only ever asks one question of the target density: "what is
//! ∇V at this point?". That question is captured by [`GradientOracle`]. The chain driver
//! additionally needs the value of `V` itself for the Metropolis test, which is the
//! [`Potential`] extension.
//!
//! Three backends are provided:
//!
//! - [`BurnGradient`]: reverse-mode automatic differentiation of a [`NegLogProb`] written
//!   with `burn` tensors.
//! - [`AnalyticGradient`]: hand-coded closures for `V` and `∇V`.
//! - [`FiniteDifference`]: central differences of a closure for `V`.
//!
//! Every backend refuses to return non-finite values: a NaN or infinite potential or
//! gradient becomes [`HmcError::NumericalDomain`].

use crate::error::{HmcError, Result};
use crate::euclidean::EuclideanVector;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use burn::tensor::{Element, ElementConversion};
use ndarray::{Array1, LinalgScalar};
use num_traits::Float;
use std::marker::PhantomData;
use std::sync::Arc;

/// Computes the gradient of the potential energy at a given position.
pub trait GradientOracle<V: EuclideanVector> {
    /// Returns `∇V(position)`, or [`HmcError::NumericalDomain`] if it is not finite.
    fn gradient(&self, position: &V) -> Result<V>;

    /// The dimension the density expects, if it has a fixed one.
    fn dim(&self) -> Option<usize> {
        None
    }
}

/// A gradient oracle that can also evaluate the potential energy itself.
pub trait Potential<V: EuclideanVector>: GradientOracle<V> {
    /// Returns `V(position)`, or [`HmcError::NumericalDomain`] if it is not finite.
    fn potential(&self, position: &V) -> Result<V::Scalar>;
}

impl<V, O> GradientOracle<V> for &O
where
    V: EuclideanVector,
    O: GradientOracle<V> + ?Sized,
{
    fn gradient(&self, position: &V) -> Result<V> {
        (**self).gradient(position)
    }

    fn dim(&self) -> Option<usize> {
        (**self).dim()
    }
}

impl<V, O> Potential<V> for &O
where
    V: EuclideanVector,
    O: Potential<V> + ?Sized,
{
    fn potential(&self, position: &V) -> Result<V::Scalar> {
        (**self).potential(position)
    }
}

impl<V, O> GradientOracle<V> for Arc<O>
where
    V: EuclideanVector,
    O: GradientOracle<V> + ?Sized,
{
    fn gradient(&self, position: &V) -> Result<V> {
        (**self).gradient(position)
    }

    fn dim(&self) -> Option<usize> {
        (**self).dim()
    }
}

impl<V, O> Potential<V> for Arc<O>
where
    V: EuclideanVector,
    O: Potential<V> + ?Sized,
{
    fn potential(&self, position: &V) -> Result<V::Scalar> {
        (**self).potential(position)
    }
}

/// Fails with `OracleDimension` when `position` does not have `expected` components.
pub(crate) fn check_dim<V: EuclideanVector>(expected: Option<usize>, position: &V) -> Result<()> {
    match expected {
        Some(expected) if expected != position.len() => Err(HmcError::OracleDimension {
            expected,
            found: position.len(),
        }),
        _ => Ok(()),
    }
}

pub(crate) fn check_gradient<V: EuclideanVector>(position: &V, grad: V) -> Result<V> {
    if grad.len() != position.len() {
        return Err(HmcError::OracleDimension {
            expected: position.len(),
            found: grad.len(),
        });
    }
    if !grad.is_finite() {
        return Err(HmcError::domain("gradient", &position.to_vec()));
    }
    Ok(grad)
}

pub(crate) fn check_potential<V: EuclideanVector>(
    position: &V,
    value: V::Scalar,
) -> Result<V::Scalar> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(HmcError::domain("potential", &position.to_vec()))
    }
}

/// A target density written with `burn` tensors.
///
/// Implement this for your model to get gradients through [`BurnGradient`].
pub trait NegLogProb<B: Backend> {
    /// Computes the negative (unnormalized) log density of a single position.
    ///
    /// # Parameters
    ///
    /// * `position`: A tensor of shape `[D]`.
    ///
    /// # Returns
    ///
    /// A tensor of shape `[1]` holding `V(position)`.
    fn neg_log_prob(&self, position: Tensor<B, 1>) -> Tensor<B, 1>;

    /// The dimension the density expects, if it has a fixed one.
    fn dim(&self) -> Option<usize> {
        None
    }
}

/// Gradient oracle backed by `burn`'s reverse-mode automatic differentiation.
///
/// Each call builds a fresh autodiff graph, so the oracle holds no per-call state and can be
/// shared freely between proposers and threads.
///
/// # Type Parameters
///
/// * `T`: Floating-point type of the `ndarray` positions.
/// * `B`: Autodiff backend from the `burn` crate.
/// * `Target`: The density, implementing [`NegLogProb`].
#[derive(Debug, Clone)]
pub struct BurnGradient<T, B, Target>
where
    B: AutodiffBackend,
{
    target: Target,
    device: B::Device,
    _marker: PhantomData<T>,
}

impl<T, B, Target> BurnGradient<T, B, Target>
where
    T: Float + Element,
    B: AutodiffBackend,
    Target: NegLogProb<B>,
{
    /// Wraps `target`, placing tensors on the backend's default device.
    pub fn new(target: Target) -> Self {
        Self::with_device(target, B::Device::default())
    }

    pub fn with_device(target: Target, device: B::Device) -> Self {
        Self {
            target,
            device,
            _marker: PhantomData,
        }
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    fn to_tensor(&self, position: &Array1<T>) -> Tensor<B, 1> {
        let len = position.len();
        let data = TensorData::new(position.iter().copied().collect::<Vec<T>>(), [len]);
        Tensor::<B, 1>::from_data(data, &self.device)
    }
}

impl<T, B, Target> GradientOracle<Array1<T>> for BurnGradient<T, B, Target>
where
    T: Float + Element + LinalgScalar,
    B: AutodiffBackend,
    Target: NegLogProb<B>,
{
    fn gradient(&self, position: &Array1<T>) -> Result<Array1<T>> {
        check_dim(self.target.dim(), position)?;
        let x = self.to_tensor(position).require_grad();
        let value = self.target.neg_log_prob(x.clone());
        let v: T = value.clone().into_scalar().elem();
        check_potential(position, v)?;

        let grads = value.backward();
        let grad = match x.grad(&grads) {
            Some(grad) => grad
                .into_data()
                .convert::<T>()
                .to_vec::<T>()
                .map_err(|e| HmcError::Backend(format!("{e:?}")))?,
            // The output does not depend on the position at all.
            None => vec![T::zero(); position.len()],
        };
        check_gradient(position, Array1::from(grad))
    }

    fn dim(&self) -> Option<usize> {
        self.target.dim()
    }
}

impl<T, B, Target> Potential<Array1<T>> for BurnGradient<T, B, Target>
where
    T: Float + Element + LinalgScalar,
    B: AutodiffBackend,
    Target: NegLogProb<B>,
{
    fn potential(&self, position: &Array1<T>) -> Result<T> {
        check_dim(self.target.dim(), position)?;
        let value = self.target.neg_log_prob(self.to_tensor(position));
        check_potential(position, value.into_scalar().elem())
    }
}

/// Gradient oracle built from hand-coded closures for `V` and `∇V`.
///
/// Mostly useful for densities with a known closed form, e.g. the harmonic oscillator
/// `V(q) = qᵀq / 2` whose gradient is `q`.
#[derive(Debug, Clone)]
pub struct AnalyticGradient<F, G> {
    potential: F,
    gradient: G,
    dim: Option<usize>,
}

impl<F, G> AnalyticGradient<F, G> {
    pub fn new(potential: F, gradient: G) -> Self {
        Self {
            potential,
            gradient,
            dim: None,
        }
    }

    /// Restricts the oracle to positions of length `dim`.
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }
}

impl<V, F, G> GradientOracle<V> for AnalyticGradient<F, G>
where
    V: EuclideanVector,
    F: Fn(&V) -> V::Scalar,
    G: Fn(&V) -> V,
{
    fn gradient(&self, position: &V) -> Result<V> {
        check_dim(self.dim, position)?;
        check_potential(position, (self.potential)(position))?;
        check_gradient(position, (self.gradient)(position))
    }

    fn dim(&self) -> Option<usize> {
        self.dim
    }
}

impl<V, F, G> Potential<V> for AnalyticGradient<F, G>
where
    V: EuclideanVector,
    F: Fn(&V) -> V::Scalar,
    G: Fn(&V) -> V,
{
    fn potential(&self, position: &V) -> Result<V::Scalar> {
        check_dim(self.dim, position)?;
        check_potential(position, (self.potential)(position))
    }
}

/// Gradient oracle using central finite differences of a closure for `V`.
///
/// Component `k` uses the step `h * max(1, |q_k|)`, where `h` defaults to the cube root of
/// machine epsilon.
#[derive(Debug, Clone)]
pub struct FiniteDifference<T, F> {
    potential: F,
    h: T,
    dim: Option<usize>,
}

impl<T, F> FiniteDifference<T, F>
where
    T: Float,
    F: Fn(&Array1<T>) -> T,
{
    pub fn new(potential: F) -> Self {
        Self {
            potential,
            h: T::epsilon().cbrt(),
            dim: None,
        }
    }

    /// Overrides the relative perturbation size.
    pub fn with_step(mut self, h: T) -> Self {
        self.h = h;
        self
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = Some(dim);
        self
    }
}

impl<T, F> GradientOracle<Array1<T>> for FiniteDifference<T, F>
where
    T: Float + LinalgScalar,
    F: Fn(&Array1<T>) -> T,
{
    fn gradient(&self, position: &Array1<T>) -> Result<Array1<T>> {
        check_dim(self.dim, position)?;
        check_potential(position, (self.potential)(position))?;

        let two = T::one() + T::one();
        let mut x = position.clone();
        let mut grad = Array1::<T>::zeros(position.len());
        for k in 0..position.len() {
            let x0 = position[k];
            let h = self.h * x0.abs().max(T::one());
            x[k] = x0 + h;
            let forward = check_potential(&x, (self.potential)(&x))?;
            x[k] = x0 - h;
            let backward = check_potential(&x, (self.potential)(&x))?;
            x[k] = x0;
            grad[k] = (forward - backward) / (two * h);
        }
        check_gradient(position, grad)
    }

    fn dim(&self) -> Option<usize> {
        self.dim
    }
}

impl<T, F> Potential<Array1<T>> for FiniteDifference<T, F>
where
    T: Float + LinalgScalar,
    F: Fn(&Array1<T>) -> T,
{
    fn potential(&self, position: &Array1<T>) -> Result<T> {
        check_dim(self.dim, position)?;
        check_potential(position, (self.potential)(position))
    }
}
